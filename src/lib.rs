//! Section-level spaced repetition scheduling for Nous knowledge items.

pub mod review;

pub use review::*;
