//! Spaced repetition for item sections
//!
//! This module provides:
//! - Scheduling configuration normalization and caching
//! - Section state records and their validation on load
//! - Content/lecture-scope invalidation of stale progress
//! - The rating state machine (learning, review, relearning)
//! - Due/upcoming queue collection and queue ordering

pub mod algorithm;
pub mod config;
pub mod invalidation;
pub mod models;
pub mod ordering;
pub mod queue;
mod record;
pub mod resolver;
pub mod scheduler;
pub mod storage;

pub use config::{normalize_config, ConfigCache, RatingMinutes, SchedulingConfig};
pub use models::*;
pub use ordering::{normalize_ordering, order_entries, Categorized, OrderingMode, OrderingSpec};
pub use queue::DEFAULT_UPCOMING_LIMIT;
pub use resolver::{ContentResolver, ItemSectionResolver, SectionDescriptor};
pub use scheduler::Scheduler;
pub use storage::{FileReviewStore, ItemStore, SettingsStore, StoreError};
