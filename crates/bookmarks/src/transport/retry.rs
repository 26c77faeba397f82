//! Exponential backoff retry
//!
//! A single higher-order retry loop shared by every remote call site.
//! Errors decide for themselves whether another attempt can help via
//! [`Retryable`].

use log::{debug, warn};
use std::fmt::Display;
use std::time::{Duration, Instant};

/// Errors that know whether retrying could change the outcome
pub trait Retryable {
    /// `true` if the failure will not go away on its own (e.g. bad credentials)
    fn is_permanent(&self) -> bool;
}

/// Backoff tuning for one retried call
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffConfig {
    /// Delay before the first retry
    pub initial_interval: Duration,
    /// Growth factor applied after every retry
    pub multiplier: f64,
    /// Cap on a single delay
    pub max_interval: Duration,
    /// Each delay is drawn from `interval * (1 ± randomization_factor)`
    pub randomization_factor: f64,
    /// Give up once this much time has passed since the first attempt
    pub max_elapsed_time: Option<Duration>,
    /// Give up after this many retries (not counting the first attempt)
    pub max_retries: Option<u32>,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(500),
            multiplier: 1.5,
            max_interval: Duration::from_secs(60),
            randomization_factor: 0.5,
            max_elapsed_time: Some(Duration::from_secs(15 * 60)),
            max_retries: None,
        }
    }
}

impl BackoffConfig {
    /// Default backoff whose total retry time stays under half of `interval`,
    /// so a retried call inside a scheduled tick cannot run into the next tick.
    pub fn bounded_by(interval: Duration) -> Self {
        let default = Self::default();
        let budget = interval / 2;
        let max_elapsed_time = match default.max_elapsed_time {
            Some(limit) => limit.min(budget),
            None => budget,
        };
        Self {
            max_elapsed_time: Some(max_elapsed_time),
            ..default
        }
    }

    /// Fresh per-call backoff state
    pub fn start(&self) -> ExponentialBackoff<'_> {
        ExponentialBackoff {
            config: self,
            current_interval: self.initial_interval,
            started_at: Instant::now(),
            retries: 0,
        }
    }
}

/// Backoff state for one call. Never shared between calls.
#[derive(Debug)]
pub struct ExponentialBackoff<'a> {
    config: &'a BackoffConfig,
    current_interval: Duration,
    started_at: Instant,
    retries: u32,
}

impl ExponentialBackoff<'_> {
    /// Delay before the next attempt, or `None` once the budget is spent
    pub fn next_backoff(&mut self) -> Option<Duration> {
        if let Some(max) = self.config.max_retries {
            if self.retries >= max {
                return None;
            }
        }

        let delay = randomize(self.current_interval, self.config.randomization_factor);

        if let Some(limit) = self.config.max_elapsed_time {
            if self.started_at.elapsed() + delay > limit {
                return None;
            }
        }

        self.retries += 1;
        self.current_interval = self
            .current_interval
            .mul_f64(self.config.multiplier)
            .min(self.config.max_interval);

        Some(delay)
    }

    /// Number of retries handed out so far
    pub fn retries(&self) -> u32 {
        self.retries
    }
}

/// Run `operation` until it succeeds, fails permanently, or the backoff
/// budget runs out. Returns the last error in the latter two cases.
pub fn retry<T, E, F>(config: &BackoffConfig, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Result<T, E>,
    E: Retryable + Display,
{
    let mut backoff = config.start();

    loop {
        let err = match operation() {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if err.is_permanent() {
            debug!("Permanent error, not retrying: {}", err);
            return Err(err);
        }

        match backoff.next_backoff() {
            Some(delay) => {
                debug!(
                    "Retry {} in {:?} after transient error: {}",
                    backoff.retries(),
                    delay,
                    err
                );
                std::thread::sleep(delay);
            }
            None => {
                warn!(
                    "Giving up after {} retries: {}",
                    backoff.retries(),
                    err
                );
                return Err(err);
            }
        }
    }
}

/// Spread `interval` uniformly over `interval * (1 ± factor)`
fn randomize(interval: Duration, factor: f64) -> Duration {
    if factor <= 0.0 || interval.is_zero() {
        return interval;
    }
    let delta = factor * interval.as_secs_f64();
    let min = interval.as_secs_f64() - delta;
    let spread = 2.0 * delta;
    Duration::from_secs_f64((min + spread * rand_unit()).max(0.0))
}

/// Pseudo-random value in [0, 1)
fn rand_unit() -> f64 {
    use std::collections::hash_map::RandomState;
    use std::hash::{BuildHasher, Hasher};

    let hasher = RandomState::new().build_hasher();
    (hasher.finish() % 10_000) as f64 / 10_000.0
}
