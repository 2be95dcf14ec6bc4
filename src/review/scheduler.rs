//! Item-level scheduling operations
//!
//! A `Scheduler` pairs a content resolver with one normalized configuration.
//! Stored section records are only ever read through `live_state` /
//! `snapshot`, which normalize them and apply content/scope invalidation.

use super::algorithm;
use super::config::SchedulingConfig;
use super::invalidation::{content_digest, lecture_scope, refresh};
use super::models::{Item, Rating, RatingPreview, SectionState};
use super::resolver::ContentResolver;

pub struct Scheduler<R: ContentResolver> {
    resolver: R,
    config: SchedulingConfig,
}

impl<R: ContentResolver> Scheduler<R> {
    pub fn new(resolver: R, config: SchedulingConfig) -> Self {
        Self { resolver, config }
    }

    pub fn config(&self) -> &SchedulingConfig {
        &self.config
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Whether the resolver lists `key` as a reviewable section of the item
    pub fn has_section(&self, item: &Item, key: &str) -> bool {
        self.resolver.sections(item).iter().any(|section| section.key == key)
    }

    /// Current state of a section without touching the item
    pub fn live_state(&self, item: &Item, key: &str, now: i64) -> Option<SectionState> {
        if key.is_empty() {
            return None;
        }

        let stored = item
            .sr
            .as_ref()
            .and_then(|record| record.sections.get(key))
            .map(|value| SectionState::from_value(value, &self.config))
            .unwrap_or_else(|| SectionState::new(&self.config));

        let digest = self
            .resolver
            .section_content(item, key)
            .map(|content| content_digest(&content));

        Some(refresh(stored, digest, lecture_scope(item), &self.config, now))
    }

    /// Current state of a section, written back into the item
    pub fn snapshot(&self, item: &mut Item, key: &str, now: i64) -> Option<SectionState> {
        let state = self.live_state(item, key, now)?;
        store_state(item, key, &state);
        Some(state)
    }

    /// Rate a section and record the result on the item
    ///
    /// The caller is responsible for persisting the item afterwards.
    pub fn apply_rating(&self, item: &mut Item, key: &str, rating: Rating, now: i64) -> Option<SectionState> {
        let current = self.live_state(item, key, now)?;
        let next = algorithm::transition(&current, rating, &self.config, now);
        store_state(item, key, &next);
        log::debug!(
            "Rated section {}/{} {}: {} -> {}, due {}",
            item.id,
            key,
            rating,
            current.phase,
            next.phase,
            next.due_at
        );
        Some(next)
    }

    /// What a rating would do, leaving the item untouched
    pub fn project_rating(&self, item: &Item, key: &str, rating: Rating, now: i64) -> Option<SectionState> {
        let current = self.live_state(item, key, now)?;
        Some(algorithm::transition(&current, rating, &self.config, now))
    }

    /// Projected outcome of every answer button
    pub fn preview(&self, item: &Item, key: &str, now: i64) -> Option<RatingPreview> {
        let current = self.live_state(item, key, now)?;
        let project = |rating| algorithm::transition(&current, rating, &self.config, now);
        Some(RatingPreview {
            again: project(Rating::Again),
            hard: project(Rating::Hard),
            good: project(Rating::Good),
            easy: project(Rating::Easy),
        })
    }

    pub fn suspend(&self, item: &mut Item, key: &str, now: i64) -> Option<SectionState> {
        let current = self.live_state(item, key, now)?;
        let next = algorithm::suspend(&current, now);
        store_state(item, key, &next);
        Some(next)
    }

    pub fn resume(&self, item: &mut Item, key: &str, now: i64) -> Option<SectionState> {
        let current = self.live_state(item, key, now)?;
        let next = algorithm::resume(&current, now);
        store_state(item, key, &next);
        Some(next)
    }
}

fn store_state(item: &mut Item, key: &str, state: &SectionState) {
    match serde_json::to_value(state) {
        Ok(value) => {
            item.sr_record_mut().sections.insert(key.to_string(), value);
        }
        Err(e) => log::warn!("Failed to record state for section {}/{}: {}", item.id, key, e),
    }
}
