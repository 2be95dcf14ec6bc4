//! Data models for section-level spaced repetition

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Due timestamp meaning "never due" (retired or suspended sections)
pub const DUE_NEVER: i64 = i64::MAX;

/// Interval recorded on retired sections
pub const INTERVAL_NEVER: u64 = u64::MAX;

/// Longest wait the scheduler will ever assign (about a century)
pub const MAX_INTERVAL_MINUTES: u64 = 100 * 365 * 24 * 60;

/// Current version of the per-item scheduling record
pub const SR_RECORD_VERSION: u32 = 2;

/// Milliseconds in one minute
pub const MINUTE_MS: i64 = 60_000;

/// Current wall-clock time in milliseconds since the epoch
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Answer given for a section during review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    Again,
    Hard,
    Good,
    Easy,
    /// Take the section out of rotation for good
    Retire,
}

impl Rating {
    /// The four answer buttons, in display order
    pub const ANSWERS: [Rating; 4] = [Rating::Again, Rating::Hard, Rating::Good, Rating::Easy];

    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::Again => "again",
            Rating::Hard => "hard",
            Rating::Good => "good",
            Rating::Easy => "easy",
            Rating::Retire => "retire",
        }
    }

    /// Parse a stored rating name; anything else is treated as absent
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "again" => Some(Rating::Again),
            "hard" => Some(Rating::Hard),
            "good" => Some(Rating::Good),
            "easy" => Some(Rating::Easy),
            "retire" => Some(Rating::Retire),
            _ => None,
        }
    }

    /// Map an answer button (1-4: Again, Hard, Good, Easy) to a rating
    pub fn from_button(button: i32) -> Option<Self> {
        match button {
            1 => Some(Rating::Again),
            2 => Some(Rating::Hard),
            3 => Some(Rating::Good),
            4 => Some(Rating::Easy),
            _ => None,
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rating {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().to_lowercase();
        if let Ok(button) = trimmed.parse::<i32>() {
            return Rating::from_button(button)
                .ok_or_else(|| format!("Rating button must be 1-4, got {}", button));
        }
        Rating::from_name(&trimmed).ok_or_else(|| format!("Unknown rating: {}", s))
    }
}

/// Scheduling phase of a section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Never graduated, no learning step taken yet
    #[default]
    New,
    /// Walking the learning steps
    Learning,
    /// Regular spaced review
    Review,
    /// Walking the relearning steps after a lapse
    Relearning,
    /// Parked by the user
    Suspended,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::New => "new",
            Phase::Learning => "learning",
            Phase::Review => "review",
            Phase::Relearning => "relearning",
            Phase::Suspended => "suspended",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "new" => Some(Phase::New),
            "learning" => Some(Phase::Learning),
            "review" => Some(Phase::Review),
            "relearning" => Some(Phase::Relearning),
            "suspended" => Some(Phase::Suspended),
            _ => None,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse queue grouping derived from phase and last rating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    New,
    Learning,
    Review,
}

impl Category {
    /// Default priority order for review sessions
    pub const DEFAULT_ORDER: [Category; 3] = [Category::Review, Category::Learning, Category::New];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::New => "new",
            Category::Learning => "learning",
            Category::Review => "review",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "new" => Some(Category::New),
            "learning" => Some(Category::Learning),
            "review" => Some(Category::Review),
            _ => None,
        }
    }

    /// Derive the queue category of a section from its phase and last rating
    pub fn derive(phase: Phase, last_rating: Option<Rating>) -> Self {
        match phase {
            Phase::Review => Category::Review,
            Phase::Relearning => Category::Learning,
            Phase::Learning => match last_rating {
                None | Some(Rating::Again) => Category::New,
                Some(_) => Category::Learning,
            },
            Phase::New => match last_rating {
                Some(Rating::Easy | Rating::Good | Rating::Hard) => Category::Learning,
                _ => Category::New,
            },
            Phase::Suspended => Category::New,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scheduling state of one content section of an item
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionState {
    /// Consecutive successful reviews
    pub streak: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_rating: Option<Rating>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_reviewed_at: Option<i64>,
    /// Next due time (ms); `DUE_NEVER` when the section is parked
    #[serde(rename = "due")]
    pub due_at: i64,
    pub retired: bool,
    pub suspended: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_digest: Option<String>,
    /// Sorted, distinct scope tokens; empty means unscoped
    pub lecture_scope: Vec<String>,
    /// Minutes until the next review at the time of the last graduation
    pub interval: u64,
    pub ease: f64,
    pub lapses: u32,
    pub learning_step: usize,
    pub phase: Phase,
    /// Minutes reserved for when relearning graduates back to review
    pub pending_interval: u64,
}

impl SectionState {
    /// Whether the section has been rated since it was last reset
    pub fn has_review_history(&self) -> bool {
        self.last_reviewed_at.is_some() && self.last_rating.is_some()
    }

    /// Whether the section takes part in due/upcoming collection
    pub fn is_active(&self) -> bool {
        !self.retired && !self.suspended
    }
}

/// Per-item scheduling record as persisted alongside the item
///
/// Section entries are kept in their stored (untrusted) shape and are only
/// read through the scheduler's snapshot path, which normalizes them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemSrRecord {
    pub version: u32,
    pub sections: BTreeMap<String, Value>,
}

impl Default for ItemSrRecord {
    fn default() -> Self {
        Self {
            version: SR_RECORD_VERSION,
            sections: BTreeMap::new(),
        }
    }
}

/// Reference from an item to a lecture inside a course block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LectureRef {
    pub block_id: String,
    #[serde(rename = "id")]
    pub lecture_id: String,
}

impl LectureRef {
    pub fn new(block_id: impl Into<String>, lecture_id: impl Into<String>) -> Self {
        Self {
            block_id: block_id.into(),
            lecture_id: lecture_id.into(),
        }
    }

    /// Scope token identifying this lecture
    pub fn scope_token(&self) -> String {
        format!("{}|{}", self.block_id, self.lecture_id)
    }
}

/// A knowledge item whose content sections are scheduled for review
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: Uuid,
    #[serde(default)]
    pub title: String,
    /// Rendered content per section key
    #[serde(default)]
    pub sections: BTreeMap<String, String>,
    #[serde(default)]
    pub lectures: Vec<LectureRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sr: Option<ItemSrRecord>,
}

impl Item {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            sections: BTreeMap::new(),
            lectures: Vec::new(),
            sr: None,
        }
    }

    /// Builder-style helper to add a content section
    pub fn with_section(mut self, key: impl Into<String>, content: impl Into<String>) -> Self {
        self.sections.insert(key.into(), content.into());
        self
    }

    /// Builder-style helper to add a lecture reference
    pub fn with_lecture(mut self, block_id: impl Into<String>, lecture_id: impl Into<String>) -> Self {
        self.lectures.push(LectureRef::new(block_id, lecture_id));
        self
    }

    /// The scheduling record, created on first use
    pub fn sr_record_mut(&mut self) -> &mut ItemSrRecord {
        self.sr.get_or_insert_with(ItemSrRecord::default)
    }
}

/// A section ready (or soon ready) for review
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    pub item_id: Uuid,
    pub section_key: String,
    pub due_at: i64,
    pub phase: Phase,
    pub category: Category,
    pub state: SectionState,
}

/// Projected outcome of each answer button for one section
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingPreview {
    pub again: SectionState,
    pub hard: SectionState,
    pub good: SectionState,
    pub easy: SectionState,
}

impl RatingPreview {
    pub fn get(&self, rating: Rating) -> Option<&SectionState> {
        match rating {
            Rating::Again => Some(&self.again),
            Rating::Hard => Some(&self.hard),
            Rating::Good => Some(&self.good),
            Rating::Easy => Some(&self.easy),
            Rating::Retire => None,
        }
    }
}

/// Statistics across a set of items
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    pub total_sections: usize,
    pub new_sections: usize,
    pub learning_sections: usize,
    pub review_sections: usize,
    pub due_sections: usize,
    pub suspended_sections: usize,
    pub retired_sections: usize,
    pub total_lapses: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_from_str() {
        assert_eq!("again".parse::<Rating>().unwrap(), Rating::Again);
        assert_eq!(" Easy ".parse::<Rating>().unwrap(), Rating::Easy);
        assert_eq!("3".parse::<Rating>().unwrap(), Rating::Good);
        assert_eq!("retire".parse::<Rating>().unwrap(), Rating::Retire);
        assert!("5".parse::<Rating>().is_err());
        assert!("meh".parse::<Rating>().is_err());
    }

    #[test]
    fn test_category_derivation() {
        assert_eq!(Category::derive(Phase::Review, None), Category::Review);
        assert_eq!(Category::derive(Phase::Relearning, Some(Rating::Again)), Category::Learning);
        assert_eq!(Category::derive(Phase::Learning, None), Category::New);
        assert_eq!(Category::derive(Phase::Learning, Some(Rating::Again)), Category::New);
        assert_eq!(Category::derive(Phase::Learning, Some(Rating::Hard)), Category::Learning);
        assert_eq!(Category::derive(Phase::New, Some(Rating::Good)), Category::Learning);
        assert_eq!(Category::derive(Phase::New, Some(Rating::Again)), Category::New);
        assert_eq!(Category::derive(Phase::New, None), Category::New);
    }

    #[test]
    fn test_scope_token() {
        let lecture = LectureRef::new("cardio", "lec-3");
        assert_eq!(lecture.scope_token(), "cardio|lec-3");
    }

    #[test]
    fn test_item_json_shape() {
        let json = r#"{
            "id": "7f1b8f3e-8d6a-4c39-9d0a-2b9e4a5c6d7e",
            "title": "Heart failure",
            "sections": { "etiology": "Ischemia" },
            "lectures": [{ "blockId": "cardio", "id": "lec-1" }]
        }"#;
        let item: Item = serde_json::from_str(json).unwrap();
        assert_eq!(item.lectures[0].lecture_id, "lec-1");
        assert!(item.sr.is_none());

        let out = serde_json::to_value(&item).unwrap();
        assert_eq!(out["lectures"][0]["blockId"], "cardio");
        assert!(out.get("sr").is_none());
    }
}
