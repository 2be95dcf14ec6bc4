//! Untrusted-to-canonical constructors for stored scheduling records

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use super::config::SchedulingConfig;
use super::models::{ItemSrRecord, Phase, Rating, SectionState, DUE_NEVER, SR_RECORD_VERSION};

impl SectionState {
    /// The zero-value state of a section that has never been touched
    pub fn new(config: &SchedulingConfig) -> Self {
        Self {
            streak: 0,
            last_rating: None,
            last_reviewed_at: None,
            due_at: 0,
            retired: false,
            suspended: false,
            content_digest: None,
            lecture_scope: Vec::new(),
            interval: 0,
            ease: config.starting_ease,
            lapses: 0,
            learning_step: 0,
            phase: Phase::New,
            pending_interval: 0,
        }
    }

    /// Build a state from whatever was stored; never fails
    ///
    /// Well-typed, in-range fields are kept and everything else falls back to
    /// the default state.
    pub fn from_value(value: &Value, config: &SchedulingConfig) -> Self {
        let mut state = Self::new(config);
        let Some(obj) = value.as_object() else {
            return state;
        };

        if let Some(streak) = count(obj, "streak") {
            state.streak = streak;
        }
        state.last_rating = obj
            .get("lastRating")
            .and_then(Value::as_str)
            .and_then(Rating::from_name);
        state.last_reviewed_at = obj
            .get("lastReviewedAt")
            .and_then(timestamp)
            .filter(|ts| *ts > 0);
        if let Some(due) = obj.get("due").and_then(timestamp) {
            state.due_at = due;
        }
        state.retired = flag(obj, "retired");
        state.suspended = flag(obj, "suspended");
        state.content_digest = obj
            .get("contentDigest")
            .and_then(Value::as_str)
            .map(str::to_string);
        state.lecture_scope = obj
            .get("lectureScope")
            .map(normalize_scope)
            .unwrap_or_default();
        if let Some(interval) = minutes(obj, "interval") {
            state.interval = interval;
        }
        if let Some(ease) = obj
            .get("ease")
            .and_then(Value::as_f64)
            .filter(|e| e.is_finite() && *e > 0.0)
        {
            state.ease = ease.max(config.minimum_ease);
        }
        if let Some(lapses) = count(obj, "lapses") {
            state.lapses = lapses;
        }
        if let Some(step) = minutes(obj, "learningStep") {
            state.learning_step = usize::try_from(step).unwrap_or(usize::MAX);
        }
        if let Some(phase) = obj.get("phase").and_then(Value::as_str).and_then(Phase::from_name) {
            state.phase = phase;
        }
        if let Some(pending) = minutes(obj, "pendingInterval") {
            state.pending_interval = pending;
        }

        let steps = match state.phase {
            Phase::Relearning => &config.relearning_steps,
            _ => &config.learning_steps,
        };
        state.learning_step = state.learning_step.min(steps.len().saturating_sub(1));

        if state.retired {
            state.due_at = DUE_NEVER;
        }
        state
    }
}

fn flag(obj: &Map<String, Value>, key: &str) -> bool {
    obj.get(key).and_then(Value::as_bool).unwrap_or(false)
}

/// Non-negative whole number; fractional values are truncated
fn minutes(obj: &Map<String, Value>, key: &str) -> Option<u64> {
    let value = obj.get(key)?;
    if let Some(n) = value.as_u64() {
        return Some(n);
    }
    let n = value.as_f64()?;
    (n.is_finite() && n >= 0.0).then(|| n.trunc() as u64)
}

fn count(obj: &Map<String, Value>, key: &str) -> Option<u32> {
    minutes(obj, key).map(|n| u32::try_from(n).unwrap_or(u32::MAX))
}

/// Millisecond timestamp; integers beyond `i64` saturate to the sentinel
fn timestamp(value: &Value) -> Option<i64> {
    if let Some(ts) = value.as_i64() {
        return Some(ts);
    }
    if value.as_u64().is_some() {
        return Some(DUE_NEVER);
    }
    let ts = value.as_f64()?;
    ts.is_finite().then(|| ts.trunc() as i64)
}

/// Deduplicated, sorted scope tokens
pub(crate) fn normalize_scope(value: &Value) -> Vec<String> {
    let Some(tokens) = value.as_array() else {
        return Vec::new();
    };
    tokens
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

impl ItemSrRecord {
    /// Load a stored record
    ///
    /// Anything that is not a record at the current version is replaced by an
    /// empty one. There is no incremental upgrade path between versions.
    pub fn from_value(value: &Value) -> Self {
        let version = value.get("version").and_then(Value::as_u64);
        if version != Some(u64::from(SR_RECORD_VERSION)) {
            if !value.is_null() {
                log::info!(
                    "Resetting scheduling record with version {:?} (current {})",
                    version,
                    SR_RECORD_VERSION
                );
            }
            return Self::default();
        }

        let sections = value
            .get("sections")
            .and_then(Value::as_object)
            .map(|sections| {
                sections
                    .iter()
                    .filter(|(key, entry)| !key.is_empty() && entry.is_object())
                    .map(|(key, entry)| (key.clone(), entry.clone()))
                    .collect::<BTreeMap<_, _>>()
            })
            .unwrap_or_default();

        Self {
            version: SR_RECORD_VERSION,
            sections,
        }
    }
}

impl<'de> Deserialize<'de> for ItemSrRecord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(&value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_state() {
        let config = SchedulingConfig::default();
        let state = SectionState::new(&config);
        assert_eq!(state.phase, Phase::New);
        assert_eq!(state.ease, config.starting_ease);
        assert_eq!(state.streak, 0);
        assert!(state.lecture_scope.is_empty());
        assert!(!state.has_review_history());
    }

    #[test]
    fn test_garbage_becomes_default() {
        let config = SchedulingConfig::default();
        let default = SectionState::new(&config);
        assert_eq!(SectionState::from_value(&json!(null), &config), default);
        assert_eq!(SectionState::from_value(&json!([1, 2]), &config), default);
        assert_eq!(
            SectionState::from_value(
                &json!({
                    "streak": -2,
                    "lastRating": "meh",
                    "lastReviewedAt": 0,
                    "phase": "graduated",
                    "ease": "high",
                    "interval": "long",
                    "retired": "yes"
                }),
                &config
            ),
            default
        );
    }

    #[test]
    fn test_valid_fields_preserved() {
        let config = SchedulingConfig::default();
        let state = SectionState::from_value(
            &json!({
                "streak": 3,
                "lastRating": "good",
                "lastReviewedAt": 1_700_000_000_000i64,
                "due": 1_700_086_400_000i64,
                "contentDigest": "sha256:abc",
                "lectureScope": ["b|2", "a|1", "b|2", "", 7],
                "interval": 1440,
                "ease": 2.65,
                "lapses": 1,
                "learningStep": 1,
                "phase": "review",
                "pendingInterval": 30
            }),
            &config,
        );
        assert_eq!(state.streak, 3);
        assert_eq!(state.last_rating, Some(Rating::Good));
        assert_eq!(state.last_reviewed_at, Some(1_700_000_000_000));
        assert_eq!(state.due_at, 1_700_086_400_000);
        assert_eq!(state.content_digest.as_deref(), Some("sha256:abc"));
        assert_eq!(state.lecture_scope, vec!["a|1", "b|2"]);
        assert_eq!(state.interval, 1440);
        assert_eq!(state.ease, 2.65);
        assert_eq!(state.lapses, 1);
        assert_eq!(state.learning_step, 1);
        assert_eq!(state.phase, Phase::Review);
        assert_eq!(state.pending_interval, 30);
    }

    #[test]
    fn test_ease_clamped_to_minimum() {
        let config = SchedulingConfig::default();
        let state = SectionState::from_value(&json!({ "ease": 0.4 }), &config);
        assert_eq!(state.ease, config.minimum_ease);
    }

    #[test]
    fn test_retired_forces_sentinel_due() {
        let config = SchedulingConfig::default();
        let state = SectionState::from_value(&json!({ "retired": true, "due": 5 }), &config);
        assert_eq!(state.due_at, DUE_NEVER);
    }

    #[test]
    fn test_normalize_round_trips_serialized_state() {
        let config = SchedulingConfig::default();
        let mut state = SectionState::new(&config);
        state.retired = true;
        state.due_at = DUE_NEVER;
        state.interval = crate::review::models::INTERVAL_NEVER;
        state.last_rating = Some(Rating::Retire);
        state.last_reviewed_at = Some(42);

        let stored = serde_json::to_value(&state).unwrap();
        assert_eq!(SectionState::from_value(&stored, &config), state);
    }

    #[test]
    fn test_record_version_mismatch_resets() {
        let stale = json!({ "version": 1, "sections": { "a": { "streak": 2 } } });
        assert_eq!(ItemSrRecord::from_value(&stale), ItemSrRecord::default());
        assert_eq!(ItemSrRecord::from_value(&json!("junk")), ItemSrRecord::default());
    }

    #[test]
    fn test_record_keeps_current_sections() {
        let current = json!({
            "version": SR_RECORD_VERSION,
            "sections": { "a": { "streak": 2 }, "b": 5, "": {} }
        });
        let record = ItemSrRecord::from_value(&current);
        assert_eq!(record.sections.len(), 1);
        assert_eq!(record.sections["a"]["streak"], 2);
    }

    #[test]
    fn test_learning_step_clamped_to_phase_steps() {
        let config = SchedulingConfig {
            learning_steps: vec![10, 60, 240],
            relearning_steps: vec![10],
            ..SchedulingConfig::default()
        };

        let learning = SectionState::from_value(&json!({ "phase": "learning", "learningStep": 7 }), &config);
        assert_eq!(learning.learning_step, 2);

        let relearning = SectionState::from_value(&json!({ "phase": "relearning", "learningStep": 2 }), &config);
        assert_eq!(relearning.learning_step, 0);

        let in_range = SectionState::from_value(&json!({ "phase": "learning", "learningStep": 1 }), &config);
        assert_eq!(in_range.learning_step, 1);
    }
}
