//! Content and lecture-scope invalidation
//!
//! Scheduling history only makes sense for the content it was earned on.
//! When a section's rendered content changes, or the section is pulled out
//! of a lecture it used to belong to, its progress is discarded.

use std::collections::BTreeSet;

use sha2::{Digest, Sha256};

use super::config::SchedulingConfig;
use super::models::{Item, Phase, SectionState};

/// Scope token used for items not attached to any lecture
pub const UNASSIGNED_SCOPE: &str = "__unassigned__";

/// Deterministic fingerprint of rendered section content
pub fn content_digest(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("sha256:{:x}", hasher.finalize())
}

/// Sorted, distinct lecture scope tokens of an item
pub fn lecture_scope(item: &Item) -> Vec<String> {
    let tokens: BTreeSet<String> = item
        .lectures
        .iter()
        .filter(|l| !l.block_id.is_empty() || !l.lecture_id.is_empty())
        .map(|l| l.scope_token())
        .collect();

    if tokens.is_empty() {
        vec![UNASSIGNED_SCOPE.to_string()]
    } else {
        tokens.into_iter().collect()
    }
}

/// Whether stored progress must be discarded for the current content/scope
pub fn needs_reset(state: &SectionState, digest: Option<&str>, scope: &[String]) -> bool {
    let content_changed = match state.content_digest.as_deref() {
        Some(stored) => Some(stored) != digest,
        None => false,
    };
    // Growing the scope is fine; losing a lecture is not. The unassigned
    // placeholder is not a lecture, so assigning a loose item keeps progress.
    let scope_shrunk = state
        .lecture_scope
        .iter()
        .filter(|token| token.as_str() != UNASSIGNED_SCOPE)
        .any(|token| !scope.contains(token));

    content_changed || scope_shrunk
}

/// Clear all scheduling progress, keeping the section eligible for intake
pub fn reset_progress(state: &mut SectionState, config: &SchedulingConfig, now: i64) {
    state.streak = 0;
    state.last_rating = None;
    state.lapses = 0;
    state.learning_step = 0;
    state.interval = 0;
    state.pending_interval = 0;
    state.ease = config.starting_ease;
    state.phase = Phase::New;
    state.retired = false;
    state.suspended = false;
    state.last_reviewed_at = Some(now);
    state.due_at = now;
}

/// Bring a stored state in line with the section's current content and scope
///
/// Resets progress when needed and always records the current digest and
/// scope on the returned state.
pub fn refresh(
    mut state: SectionState,
    digest: Option<String>,
    scope: Vec<String>,
    config: &SchedulingConfig,
    now: i64,
) -> SectionState {
    if needs_reset(&state, digest.as_deref(), &scope) {
        log::debug!(
            "Resetting section progress (digest {:?} -> {:?}, scope {:?} -> {:?})",
            state.content_digest,
            digest,
            state.lecture_scope,
            scope
        );
        reset_progress(&mut state, config, now);
    }
    state.content_digest = digest;
    state.lecture_scope = scope;
    state
}
