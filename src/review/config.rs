//! Scheduling configuration
//!
//! Settings arrive as an arbitrary JSON payload. `normalize_config` merges
//! whatever is usable over the defaults and never fails, so a damaged
//! settings file can never stop a review session.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;

use super::models::MAX_INTERVAL_MINUTES;
use super::storage::SettingsStore;

/// Settings key holding the scheduling configuration
pub const SETTINGS_KEY: &str = "review";

/// Floor applied to the configured minimum ease
pub const EASE_FLOOR: f64 = 0.5;

/// Base wait in minutes for each answer button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingMinutes {
    pub again: u64,
    pub hard: u64,
    pub good: u64,
    pub easy: u64,
}

impl Default for RatingMinutes {
    fn default() -> Self {
        Self {
            again: 10,
            hard: 60,
            good: 1440,
            easy: 4320,
        }
    }
}

/// Complete, internally consistent scheduling parameters
///
/// All durations are in minutes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingConfig {
    pub review_steps: RatingMinutes,
    pub learning_steps: Vec<u64>,
    pub relearning_steps: Vec<u64>,
    pub graduating_interval_good: u64,
    pub graduating_interval_easy: u64,
    pub starting_ease: f64,
    pub minimum_ease: f64,
    pub ease_bonus: f64,
    pub ease_penalty: f64,
    pub hard_ease_penalty: f64,
    pub hard_interval_multiplier: f64,
    pub easy_interval_bonus: f64,
    pub interval_modifier: f64,
    pub lapse_interval_multiplier: f64,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            review_steps: RatingMinutes::default(),
            learning_steps: vec![10, 60],
            relearning_steps: vec![10],
            graduating_interval_good: 1440,
            graduating_interval_easy: 5760,
            starting_ease: 2.5,
            minimum_ease: 1.3,
            ease_bonus: 0.15,
            ease_penalty: 0.2,
            hard_ease_penalty: 0.15,
            hard_interval_multiplier: 1.2,
            easy_interval_bonus: 1.3,
            interval_modifier: 1.0,
            lapse_interval_multiplier: 0.5,
        }
    }
}

/// Lower bound a numeric knob must satisfy to be accepted
#[derive(Debug, Clone, Copy)]
enum Bound {
    /// Strictly greater than
    Above(f64),
    /// Greater than or equal to
    AtLeast(f64),
}

impl Bound {
    fn admits(self, value: f64) -> bool {
        match self {
            Bound::Above(min) => value > min,
            Bound::AtLeast(min) => value >= min,
        }
    }
}

/// Turn an arbitrary settings object into a usable configuration
pub fn normalize_config(raw: Option<&Value>) -> SchedulingConfig {
    let defaults = SchedulingConfig::default();
    let Some(obj) = raw.and_then(Value::as_object) else {
        return defaults;
    };

    let steps_obj = obj.get("reviewSteps").and_then(Value::as_object);
    let step = |key: &str, default: u64| -> u64 {
        steps_obj
            .and_then(|s| whole_minutes(s.get(key)))
            .unwrap_or(default)
    };
    let review_steps = RatingMinutes {
        again: step("again", defaults.review_steps.again),
        hard: step("hard", defaults.review_steps.hard),
        good: step("good", defaults.review_steps.good),
        easy: step("easy", defaults.review_steps.easy),
    };

    let knob = |key: &str, default: f64, bound: Bound| -> f64 {
        coerce_number(obj.get(key))
            .filter(|v| bound.admits(*v))
            .unwrap_or(default)
    };

    let mut config = SchedulingConfig {
        review_steps,
        learning_steps: step_list(obj.get("learningSteps"), &defaults.learning_steps),
        relearning_steps: step_list(obj.get("relearningSteps"), &defaults.relearning_steps),
        graduating_interval_good: whole_minutes(obj.get("graduatingIntervalGood"))
            .unwrap_or(defaults.graduating_interval_good),
        graduating_interval_easy: whole_minutes(obj.get("graduatingIntervalEasy"))
            .unwrap_or(defaults.graduating_interval_easy),
        starting_ease: knob("startingEase", defaults.starting_ease, Bound::Above(0.0)),
        minimum_ease: knob("minimumEase", defaults.minimum_ease, Bound::Above(0.0)),
        ease_bonus: knob("easeBonus", defaults.ease_bonus, Bound::AtLeast(0.0)),
        ease_penalty: knob("easePenalty", defaults.ease_penalty, Bound::AtLeast(0.0)),
        hard_ease_penalty: knob("hardEasePenalty", defaults.hard_ease_penalty, Bound::AtLeast(0.0)),
        hard_interval_multiplier: knob(
            "hardIntervalMultiplier",
            defaults.hard_interval_multiplier,
            Bound::AtLeast(1.0),
        ),
        easy_interval_bonus: knob("easyIntervalBonus", defaults.easy_interval_bonus, Bound::AtLeast(1.0)),
        interval_modifier: knob("intervalModifier", defaults.interval_modifier, Bound::AtLeast(0.0)),
        lapse_interval_multiplier: knob(
            "lapseIntervalMultiplier",
            defaults.lapse_interval_multiplier,
            Bound::AtLeast(0.0),
        ),
    };

    config.minimum_ease = config.minimum_ease.max(EASE_FLOOR);
    config.starting_ease = config.starting_ease.max(config.minimum_ease);
    config
}

/// Accept JSON numbers and numeric strings; reject anything non-finite
fn coerce_number(value: Option<&Value>) -> Option<f64> {
    let number = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

/// A positive duration rounded to whole minutes, at most `MAX_INTERVAL_MINUTES`
fn whole_minutes(value: Option<&Value>) -> Option<u64> {
    coerce_number(value).and_then(rounded_minutes)
}

fn rounded_minutes(number: f64) -> Option<u64> {
    let minutes = number.round();
    (minutes >= 1.0 && minutes <= MAX_INTERVAL_MINUTES as f64).then_some(minutes as u64)
}

/// Parse a step list from an array or a delimited string
fn step_list(value: Option<&Value>, fallback: &[u64]) -> Vec<u64> {
    let steps: Vec<u64> = match value {
        Some(Value::Array(entries)) => entries.iter().filter_map(|e| whole_minutes(Some(e))).collect(),
        Some(Value::String(text)) => text
            .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
            .filter(|part| !part.is_empty())
            .filter_map(|part| part.parse::<f64>().ok())
            .filter(|n| n.is_finite())
            .filter_map(rounded_minutes)
            .collect(),
        _ => Vec::new(),
    };

    if steps.is_empty() {
        fallback.to_vec()
    } else {
        steps
    }
}

/// Process-lifetime cache of the normalized configuration
///
/// The first `get()` reads the settings store; later calls reuse the cached
/// value until `invalidate()` is called. A failing store is logged and the
/// defaults are cached in its place.
pub struct ConfigCache<S: SettingsStore> {
    store: S,
    cached: RwLock<Option<SchedulingConfig>>,
}

impl<S: SettingsStore> ConfigCache<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            cached: RwLock::new(None),
        }
    }

    /// The settings store backing this cache
    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn get(&self) -> SchedulingConfig {
        if let Some(config) = self.cached.read().await.as_ref() {
            return config.clone();
        }

        let mut cached = self.cached.write().await;
        // Another caller may have filled the cache while we waited
        if let Some(config) = cached.as_ref() {
            return config.clone();
        }

        let config = match self.store.get().await {
            Ok(settings) => normalize_config(settings.get(SETTINGS_KEY)),
            Err(e) => {
                log::warn!("Failed to load review settings, using defaults: {}", e);
                SchedulingConfig::default()
            }
        };
        *cached = Some(config.clone());
        config
    }

    /// Drop the cached configuration so the next `get()` reloads it
    pub async fn invalidate(&self) {
        *self.cached.write().await = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::review::storage::{Result as StoreResult, StoreError};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FakeSettings {
        payload: Mutex<Option<Value>>,
        reads: AtomicUsize,
    }

    impl FakeSettings {
        fn new(payload: Option<Value>) -> Self {
            Self {
                payload: Mutex::new(payload),
                reads: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl SettingsStore for FakeSettings {
        async fn get(&self) -> StoreResult<Value> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.payload
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| StoreError::Unavailable("settings offline".to_string()))
        }

        async fn set(&self, settings: Value) -> StoreResult<()> {
            *self.payload.lock().unwrap() = Some(settings);
            Ok(())
        }
    }

    #[test]
    fn test_missing_input_uses_defaults() {
        assert_eq!(normalize_config(None), SchedulingConfig::default());
        assert_eq!(normalize_config(Some(&json!("nonsense"))), SchedulingConfig::default());
        assert_eq!(normalize_config(Some(&json!({}))), SchedulingConfig::default());
    }

    #[test]
    fn test_review_steps_require_positive_numbers() {
        let config = normalize_config(Some(&json!({
            "reviewSteps": { "again": "15", "hard": -3, "good": 0.2, "easy": 2880.6 }
        })));
        assert_eq!(config.review_steps.again, 15);
        assert_eq!(config.review_steps.hard, 60);
        assert_eq!(config.review_steps.good, 1440);
        assert_eq!(config.review_steps.easy, 2881);
    }

    #[test]
    fn test_step_lists_from_array_and_string() {
        let config = normalize_config(Some(&json!({
            "learningSteps": [1, "10", 0, -5, "x", 30.4],
            "relearningSteps": "5, 20;  60"
        })));
        assert_eq!(config.learning_steps, vec![1, 10, 30]);
        assert_eq!(config.relearning_steps, vec![5, 20, 60]);
    }

    #[test]
    fn test_invalid_step_lists_fall_back() {
        let config = normalize_config(Some(&json!({
            "learningSteps": [],
            "relearningSteps": "zero, -1"
        })));
        assert_eq!(config.learning_steps, vec![10, 60]);
        assert_eq!(config.relearning_steps, vec![10]);
    }

    #[test]
    fn test_oversized_minutes_are_rejected() {
        let config = normalize_config(Some(&json!({
            "graduatingIntervalGood": 1e20,
            "graduatingIntervalEasy": MAX_INTERVAL_MINUTES,
            "learningSteps": [1, 1e20],
            "relearningSteps": "5 1e20",
            "reviewSteps": { "easy": 1e300 }
        })));
        assert_eq!(config.graduating_interval_good, 1440);
        assert_eq!(config.graduating_interval_easy, MAX_INTERVAL_MINUTES);
        assert_eq!(config.learning_steps, vec![1]);
        assert_eq!(config.relearning_steps, vec![5]);
        assert_eq!(config.review_steps.easy, 4320);
    }

    #[test]
    fn test_knob_bounds() {
        let config = normalize_config(Some(&json!({
            "graduatingIntervalGood": 0,
            "easeBonus": 0,
            "easePenalty": -1,
            "hardIntervalMultiplier": 1,
            "easyIntervalBonus": 0.9,
            "intervalModifier": 0,
            "lapseIntervalMultiplier": 0
        })));
        assert_eq!(config.graduating_interval_good, 1440);
        assert_eq!(config.ease_bonus, 0.0);
        assert_eq!(config.ease_penalty, 0.2);
        assert_eq!(config.hard_interval_multiplier, 1.0);
        assert_eq!(config.easy_interval_bonus, 1.3);
        assert_eq!(config.interval_modifier, 0.0);
        assert_eq!(config.lapse_interval_multiplier, 0.0);
    }

    #[test]
    fn test_ease_invariants() {
        let config = normalize_config(Some(&json!({ "minimumEase": 0.1, "startingEase": 0.3 })));
        assert_eq!(config.minimum_ease, EASE_FLOOR);
        assert_eq!(config.starting_ease, EASE_FLOOR);

        let config = normalize_config(Some(&json!({ "minimumEase": 2.0, "startingEase": 1.5 })));
        assert_eq!(config.minimum_ease, 2.0);
        assert_eq!(config.starting_ease, 2.0);
        assert!(config.minimum_ease <= config.starting_ease);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let raw = json!({
            "reviewSteps": { "again": 3.7 },
            "learningSteps": "1 5 25",
            "minimumEase": 0.2,
            "startingEase": "1.9",
            "intervalModifier": 0.85
        });
        let once = normalize_config(Some(&raw));
        let twice = normalize_config(Some(&serde_json::to_value(&once).unwrap()));
        assert_eq!(once, twice);
    }

    #[tokio::test]
    async fn test_cache_reads_store_once() {
        let cache = ConfigCache::new(FakeSettings::new(Some(json!({
            "review": { "learningSteps": [2, 4] }
        }))));

        assert_eq!(cache.get().await.learning_steps, vec![2, 4]);
        assert_eq!(cache.get().await.learning_steps, vec![2, 4]);
        assert_eq!(cache.store().reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cache_invalidate_reloads() {
        let cache = ConfigCache::new(FakeSettings::new(Some(json!({}))));
        assert_eq!(cache.get().await, SchedulingConfig::default());

        cache
            .store()
            .set(json!({ "review": { "graduatingIntervalGood": 720 } }))
            .await
            .unwrap();
        // Still cached
        assert_eq!(cache.get().await.graduating_interval_good, 1440);

        cache.invalidate().await;
        assert_eq!(cache.get().await.graduating_interval_good, 720);
    }

    #[tokio::test]
    async fn test_cache_falls_back_on_store_failure() {
        let cache = ConfigCache::new(FakeSettings::new(None));
        assert_eq!(cache.get().await, SchedulingConfig::default());
        assert_eq!(cache.get().await, SchedulingConfig::default());
        assert_eq!(cache.store().reads.load(Ordering::SeqCst), 1);
    }
}
