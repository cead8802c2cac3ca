//! Quiet-period coalescing of rapid inputs.
//!
//! A `Debouncer` is a passive timer: callers feed it inputs and poll it
//! with the current instant. Each input replaces the pending value and
//! pushes the deadline out by the quiet period. Once the deadline passes
//! the value is released, unless it equals the last released one.

use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    quiet: Duration,
    pending: Option<(T, Instant)>,
    last_honored: Option<T>,
}

impl<T: Clone + PartialEq> Debouncer<T> {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: None,
            last_honored: None,
        }
    }

    pub fn quiet(&self) -> Duration {
        self.quiet
    }

    /// Record an input, cancelling any pending deadline.
    pub fn input(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now + self.quiet));
    }

    /// Treat `value` as already released without waiting, dropping any
    /// pending input.
    pub fn settle(&mut self, value: T) {
        self.pending = None;
        self.last_honored = Some(value);
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, at)| *at)
    }

    /// Release the settled value if its deadline has passed and it differs
    /// from the previously released value.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((_, at)) if *at <= now => {}
            _ => return None,
        }
        let (value, _) = self.pending.take()?;
        if self.last_honored.as_ref() == Some(&value) {
            return None;
        }
        self.last_honored = Some(value.clone());
        Some(value)
    }
}
