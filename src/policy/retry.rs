//! Retry classification and exponential backoff.

use std::time::Duration;

use rand::Rng;

use crate::config::RetryConfig;
use crate::error::FailureKind;

/// Lower and upper bound of the multiplicative jitter.
const JITTER_RANGE: (f64, f64) = (0.75, 1.25);

/// Per-call retry state.
///
/// A fresh policy is created for every top-level call and never shared, so
/// the attempt counter only ever grows from zero to `max_retries`.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    initial_delay: Duration,
    backoff_factor: f64,
    max_delay: Duration,
    retry_on_timeout: bool,
    retry_on_connection_error: bool,
    retry_on_5xx: bool,
    attempt: u32,
}

impl RetryPolicy {
    /// Builds a policy from configuration; a disabled config never retries.
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            max_retries: if config.enabled { config.max_retries } else { 0 },
            initial_delay: config.initial_delay,
            backoff_factor: config.backoff_factor,
            max_delay: config.max_delay,
            retry_on_timeout: config.on_timeout,
            retry_on_connection_error: config.on_connection_error,
            retry_on_5xx: config.on_5xx,
            attempt: 0,
        }
    }

    /// Decides whether another attempt should be made.
    ///
    /// `failure` is the classification of the failed attempt (if it failed)
    /// and `status` the status code of the response (if one was received).
    pub fn should_retry(&self, failure: Option<FailureKind>, status: Option<u16>) -> bool {
        if self.attempt >= self.max_retries {
            return false;
        }

        let timeout = self.retry_on_timeout && failure == Some(FailureKind::Timeout);
        let connection = self.retry_on_connection_error && failure == Some(FailureKind::Connection);
        let server_error = self.retry_on_5xx && status.is_some_and(|s| (500..600).contains(&s));

        timeout || connection || server_error
    }

    /// Backoff before the retry that follows attempt `attempt`.
    ///
    /// Attempt 0 waits exactly `initial_delay`; later attempts wait
    /// `initial_delay * backoff_factor^attempt`, jittered by ±25% and capped
    /// at `max_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return self.initial_delay;
        }

        let base = self.initial_delay.as_secs_f64() * self.backoff_factor.powi(attempt as i32);
        let jitter = rand::thread_rng().gen_range(JITTER_RANGE.0..=JITTER_RANGE.1);
        let delay = base * jitter;

        if !delay.is_finite() || delay >= self.max_delay.as_secs_f64() {
            self.max_delay
        } else {
            Duration::from_secs_f64(delay)
        }
    }

    /// Delay before the next retry, based on the current attempt.
    pub fn next_delay(&self) -> Duration {
        self.delay_for(self.attempt)
    }

    pub fn increment_attempt(&mut self) {
        self.attempt += 1;
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }
}
