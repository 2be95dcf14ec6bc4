//! Due and upcoming review queues

use super::models::{Category, Item, QueueEntry, ReviewStats, SectionState, DUE_NEVER};
use super::resolver::ContentResolver;
use super::scheduler::Scheduler;

/// Upcoming queue length for callers without a preference
pub const DEFAULT_UPCOMING_LIMIT: usize = 50;

impl<R: ContentResolver> Scheduler<R> {
    /// Sections whose review is due at `now`
    ///
    /// Only sections rated at least once qualify: first exposure of a never
    /// rated section belongs to new-section intake, not to this queue.
    pub fn collect_due(&self, items: &mut [Item], now: i64) -> Vec<QueueEntry> {
        let mut due = self.collect(items, now, |state| state.due_at <= now);
        sort_by_due(&mut due);
        due
    }

    /// Sections that will become due after `now`, soonest first
    pub fn collect_upcoming(&self, items: &mut [Item], now: i64, limit: usize) -> Vec<QueueEntry> {
        let mut upcoming = self.collect(items, now, |state| state.due_at != DUE_NEVER && state.due_at > now);
        sort_by_due(&mut upcoming);
        upcoming.truncate(limit);
        upcoming
    }

    fn collect<F>(&self, items: &mut [Item], now: i64, include: F) -> Vec<QueueEntry>
    where
        F: Fn(&SectionState) -> bool,
    {
        let mut entries = Vec::new();
        for item in items.iter_mut() {
            for section in self.resolver().sections(item) {
                let Some(state) = self.snapshot(item, &section.key, now) else {
                    continue;
                };
                if !state.is_active() || !state.has_review_history() || !include(&state) {
                    continue;
                }
                entries.push(QueueEntry {
                    item_id: item.id,
                    section_key: section.key,
                    due_at: state.due_at,
                    phase: state.phase,
                    category: Category::derive(state.phase, state.last_rating),
                    state,
                });
            }
        }
        entries
    }

    /// Section counts across a set of items
    pub fn stats(&self, items: &mut [Item], now: i64) -> ReviewStats {
        let mut stats = ReviewStats::default();

        for item in items.iter_mut() {
            for section in self.resolver().sections(item) {
                let Some(state) = self.snapshot(item, &section.key, now) else {
                    continue;
                };
                stats.total_sections += 1;
                stats.total_lapses += u64::from(state.lapses);

                if state.retired {
                    stats.retired_sections += 1;
                    continue;
                }
                if state.suspended {
                    stats.suspended_sections += 1;
                    continue;
                }

                match Category::derive(state.phase, state.last_rating) {
                    Category::New => stats.new_sections += 1,
                    Category::Learning => stats.learning_sections += 1,
                    Category::Review => stats.review_sections += 1,
                }

                if state.has_review_history() && state.due_at <= now {
                    stats.due_sections += 1;
                }
            }
        }

        stats
    }
}

fn sort_by_due(entries: &mut [QueueEntry]) {
    entries.sort_by_key(|entry| entry.due_at);
}
