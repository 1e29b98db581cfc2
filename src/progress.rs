//! Progress reporting for long-running key derivation

use std::time::{Duration, Instant};

/// Receives progress signals from [`crate::enscrypt::stretch`].
///
/// Calls are made inline with the derivation loop, so implementations must
/// return quickly and must not block.
pub trait ProgressReporter {
    /// Called right before the first scrypt invocation.
    fn start_timer(&mut self);

    /// Called right after the first scrypt invocation.
    fn end_timer(&mut self);

    /// Called once per completed iteration, including the first.
    fn increment_progress(&mut self);
}

/// Ignores all progress signals.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn start_timer(&mut self) {}

    fn end_timer(&mut self) {}

    fn increment_progress(&mut self) {}
}

/// Measures the first iteration and counts the rest
///
/// Since every iteration does the same amount of work, the duration of the
/// first one is a good estimate for each of the remaining ones.
#[derive(Debug, Clone)]
pub struct TimingProgress {
    total: u32,
    completed: u32,
    started: Option<Instant>,
    first_iteration: Option<Duration>,
}

impl TimingProgress {
    /// Create a tracker for a derivation of `total` iterations.
    pub fn new(total: u32) -> Self {
        Self {
            total,
            completed: 0,
            started: None,
            first_iteration: None,
        }
    }

    pub fn completed(&self) -> u32 {
        self.completed
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    /// Duration of the first iteration, once it has finished.
    pub fn first_iteration(&self) -> Option<Duration> {
        self.first_iteration
    }

    /// Completed fraction in `0.0..=1.0`.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        f64::from(self.completed.min(self.total)) / f64::from(self.total)
    }

    /// Estimated time until the last iteration completes.
    pub fn estimated_remaining(&self) -> Option<Duration> {
        let per_iteration = self.first_iteration?;
        Some(per_iteration * self.total.saturating_sub(self.completed))
    }
}

impl ProgressReporter for TimingProgress {
    fn start_timer(&mut self) {
        self.started = Some(Instant::now());
    }

    fn end_timer(&mut self) {
        if let Some(started) = self.started.take() {
            self.first_iteration = Some(started.elapsed());
        }
    }

    fn increment_progress(&mut self) {
        self.completed = self.completed.saturating_add(1);
    }
}
