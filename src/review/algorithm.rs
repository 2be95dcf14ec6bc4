//! Rating state machine
//!
//! Leitner/SM-2 style scheduling with minute-based learning steps.
//!
//! Phases:
//! - new / learning: walk the learning steps, then graduate to review
//! - review: intervals grow by the section's ease factor
//! - relearning: walk the relearning steps, then graduate back to review
//!
//! Every function here is pure: it takes a state and returns the next one.

use super::config::SchedulingConfig;
use super::models::{
    Phase, Rating, SectionState, DUE_NEVER, INTERVAL_NEVER, MAX_INTERVAL_MINUTES, MINUTE_MS,
};

/// Apply a rating to a section state
pub fn transition(
    state: &SectionState,
    rating: Rating,
    config: &SchedulingConfig,
    now: i64,
) -> SectionState {
    let mut next = state.clone();

    if rating == Rating::Retire {
        retire(&mut next, now);
        return next;
    }

    // Retirement is terminal
    if state.retired {
        return next;
    }

    if next.suspended || next.phase == Phase::Suspended {
        next.suspended = false;
        next.phase = resumed_phase(&next);
    }

    match next.phase {
        Phase::New | Phase::Learning | Phase::Suspended => rate_learning(&mut next, rating, config, now),
        Phase::Relearning => rate_relearning(&mut next, rating, config, now),
        Phase::Review => rate_review(&mut next, rating, config, now),
    }

    next.ease = next.ease.max(config.minimum_ease);
    next.last_rating = Some(rating);
    next.last_reviewed_at = Some(now);
    next
}

fn retire(state: &mut SectionState, now: i64) {
    state.due_at = DUE_NEVER;
    state.interval = INTERVAL_NEVER;
    state.retired = true;
    state.suspended = false;
    state.phase = Phase::Review;
    state.pending_interval = 0;
    state.streak = 0;
    state.last_rating = Some(Rating::Retire);
    state.last_reviewed_at = Some(now);
}

fn rate_learning(state: &mut SectionState, rating: Rating, config: &SchedulingConfig, now: i64) {
    let steps = &config.learning_steps;
    let index = clamp_index(state.learning_step, steps);

    match rating {
        Rating::Again => {
            state.streak = 0;
            enter_step(state, Phase::Learning, steps, 0, now);
        }
        Rating::Hard => {
            state.phase = Phase::Learning;
            state.learning_step = index;
            schedule(state, hard_wait(step_at(steps, index), config), now);
        }
        Rating::Good => {
            if index + 1 < steps.len() {
                enter_step(state, Phase::Learning, steps, index + 1, now);
            } else {
                let interval = scaled(config.graduating_interval_good as f64, config);
                graduate(state, interval, config.starting_ease, now);
            }
        }
        Rating::Easy => {
            let interval = scaled(config.graduating_interval_easy as f64, config);
            graduate(state, interval, config.starting_ease + config.ease_bonus, now);
        }
        Rating::Retire => {}
    }
}

fn rate_relearning(state: &mut SectionState, rating: Rating, config: &SchedulingConfig, now: i64) {
    let steps = &config.relearning_steps;
    let index = clamp_index(state.learning_step, steps);

    match rating {
        Rating::Again => {
            state.streak = 0;
            enter_step(state, Phase::Relearning, steps, 0, now);
        }
        Rating::Hard => {
            state.learning_step = index;
            schedule(state, hard_wait(step_at(steps, index), config), now);
        }
        Rating::Good if index + 1 < steps.len() => {
            enter_step(state, Phase::Relearning, steps, index + 1, now);
        }
        Rating::Good | Rating::Easy => {
            let mut base = if state.pending_interval > 0 {
                state.pending_interval as f64
            } else {
                let previous = if state.interval > 0 && state.interval != INTERVAL_NEVER {
                    state.interval
                } else {
                    config.graduating_interval_good
                };
                whole(previous as f64 * config.lapse_interval_multiplier).max(1) as f64
            };
            let mut ease = state.ease;
            if rating == Rating::Easy {
                base *= config.easy_interval_bonus;
                ease += config.ease_bonus;
            }
            graduate(state, scaled(base, config), ease, now);
        }
        Rating::Retire => {}
    }
}

fn rate_review(state: &mut SectionState, rating: Rating, config: &SchedulingConfig, now: i64) {
    let current = if state.interval == INTERVAL_NEVER { 0 } else { state.interval };

    match rating {
        Rating::Again => {
            // A lapse goes back through the learning steps
            state.ease = (state.ease - config.ease_penalty).max(config.minimum_ease);
            state.lapses = state.lapses.saturating_add(1);
            state.interval = 0;
            state.pending_interval = 0;
            state.streak = 0;
            enter_step(state, Phase::Learning, &config.learning_steps, 0, now);
        }
        Rating::Hard => {
            state.ease = (state.ease - config.hard_ease_penalty).max(config.minimum_ease);
            state.interval = 0;
            state.pending_interval = 0;
            // Skip the shortest step: the section was still partly remembered
            let index = if config.learning_steps.len() >= 2 { 1 } else { 0 };
            enter_step(state, Phase::Learning, &config.learning_steps, index, now);
        }
        Rating::Good => {
            let grown = whole(current as f64 * state.ease).max(current);
            let interval = scaled(grown as f64, config);
            keep_reviewing(state, interval, now);
        }
        Rating::Easy => {
            state.ease += config.ease_bonus;
            let grown = whole(current as f64 * state.ease * config.easy_interval_bonus).max(current);
            let interval = scaled(grown as f64, config);
            keep_reviewing(state, interval, now);
        }
        Rating::Retire => {}
    }
}

/// Park a section until it is resumed
pub fn suspend(state: &SectionState, now: i64) -> SectionState {
    let mut next = state.clone();
    if next.retired {
        return next;
    }
    next.phase = Phase::Suspended;
    next.suspended = true;
    next.due_at = DUE_NEVER;
    next.last_reviewed_at = Some(now);
    next
}

/// Bring a suspended section back into rotation
pub fn resume(state: &SectionState, now: i64) -> SectionState {
    let mut next = state.clone();
    if next.retired {
        return next;
    }
    next.suspended = false;
    next.phase = resumed_phase(&next);
    if next.due_at == DUE_NEVER || next.due_at <= 0 {
        next.due_at = now;
    }
    next
}

fn resumed_phase(state: &SectionState) -> Phase {
    if state.interval > 0 {
        Phase::Review
    } else {
        Phase::Learning
    }
}

fn graduate(state: &mut SectionState, interval: u64, ease: f64, now: i64) {
    let interval = interval.min(MAX_INTERVAL_MINUTES);
    state.phase = Phase::Review;
    state.interval = interval;
    state.pending_interval = 0;
    state.learning_step = 0;
    state.ease = ease;
    state.streak = state.streak.saturating_add(1);
    schedule(state, interval, now);
}

fn keep_reviewing(state: &mut SectionState, interval: u64, now: i64) {
    let interval = interval.min(MAX_INTERVAL_MINUTES);
    state.phase = Phase::Review;
    state.interval = interval;
    state.streak = state.streak.saturating_add(1);
    schedule(state, interval, now);
}

fn enter_step(state: &mut SectionState, phase: Phase, steps: &[u64], index: usize, now: i64) {
    let index = clamp_index(index, steps);
    state.phase = phase;
    state.learning_step = index;
    schedule(state, step_at(steps, index), now);
}

/// Set the due time `minutes` from now, between one minute and `MAX_INTERVAL_MINUTES`
///
/// The due time always stays below `DUE_NEVER`.
fn schedule(state: &mut SectionState, minutes: u64, now: i64) {
    let minutes = i64::try_from(minutes.clamp(1, MAX_INTERVAL_MINUTES)).unwrap_or(1);
    state.due_at = now
        .saturating_add(minutes.saturating_mul(MINUTE_MS))
        .min(DUE_NEVER - 1);
}

fn hard_wait(step: u64, config: &SchedulingConfig) -> u64 {
    whole(step as f64 * config.hard_interval_multiplier).max(step)
}

/// Apply the interval modifier, kept within one minute and `MAX_INTERVAL_MINUTES`
fn scaled(minutes: f64, config: &SchedulingConfig) -> u64 {
    whole(minutes * config.interval_modifier).clamp(1, MAX_INTERVAL_MINUTES)
}

fn whole(minutes: f64) -> u64 {
    minutes.round().max(0.0) as u64
}

fn clamp_index(index: usize, steps: &[u64]) -> usize {
    index.min(steps.len().saturating_sub(1))
}

fn step_at(steps: &[u64], index: usize) -> u64 {
    steps.get(index).copied().unwrap_or(1)
}
