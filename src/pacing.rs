//! Randomized pacing between outbound replies
//!
//! Delays are drawn from a normal distribution and floored, so a run of
//! replies looks human-paced rather than scripted. Randomness and sleeping
//! are both injectable: [`Pacer::seeded`] makes the sequence reproducible
//! and a custom [`Sleeper`] lets tests skip real waits.

use crate::error::{Error, Result};
use async_trait::async_trait;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use std::time::Duration;

/// Parameters of the inter-reply delay, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PacingPolicy {
    pub average_delay_secs: f64,
    pub stddev_secs: f64,
    pub minimum_delay_secs: u64,
}

impl PacingPolicy {
    pub const DEFAULT_AVERAGE_SECS: f64 = 60.0;
    pub const DEFAULT_STDDEV_SECS: f64 = 30.0;
    pub const DEFAULT_MINIMUM_SECS: u64 = 5;
    /// Upper bound for the average, the spread and the floor: one day.
    pub const MAX_DELAY_SECS: u64 = 86_400;

    /// Default spread and floor around the given average.
    #[must_use]
    pub const fn with_average(average_delay_secs: f64) -> Self {
        Self {
            average_delay_secs,
            stddev_secs: Self::DEFAULT_STDDEV_SECS,
            minimum_delay_secs: Self::DEFAULT_MINIMUM_SECS,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn distribution(&self) -> Result<Normal<f64>> {
        let ceiling = Self::MAX_DELAY_SECS as f64;
        if !self.average_delay_secs.is_finite() || self.average_delay_secs > ceiling {
            return Err(Error::InvalidPacing(format!(
                "average delay must be finite and at most {} s, got {}",
                Self::MAX_DELAY_SECS,
                self.average_delay_secs
            )));
        }
        let invalid_spread = || {
            Error::InvalidPacing(format!(
                "standard deviation must be between 0 and {} s, got {}",
                Self::MAX_DELAY_SECS,
                self.stddev_secs
            ))
        };
        if !self.stddev_secs.is_finite() || self.stddev_secs > ceiling {
            return Err(invalid_spread());
        }
        if self.minimum_delay_secs > Self::MAX_DELAY_SECS {
            return Err(Error::InvalidPacing(format!(
                "minimum delay must be at most {} s, got {}",
                Self::MAX_DELAY_SECS,
                self.minimum_delay_secs
            )));
        }
        Normal::new(self.average_delay_secs, self.stddev_secs).map_err(|_| invalid_spread())
    }
}

impl Default for PacingPolicy {
    fn default() -> Self {
        Self::with_average(Self::DEFAULT_AVERAGE_SECS)
    }
}

/// Draws successive pacing intervals for one run.
#[derive(Debug, Clone)]
pub struct Pacer {
    distribution: Normal<f64>,
    minimum_secs: u64,
    rng: StdRng,
}

impl Pacer {
    /// Pacer seeded from OS entropy.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPacing`] for a non-finite average or a
    /// negative or non-finite standard deviation.
    pub fn new(policy: PacingPolicy) -> Result<Self> {
        Self::with_rng(policy, StdRng::from_entropy())
    }

    /// Pacer producing the same delay sequence for the same seed.
    ///
    /// # Errors
    ///
    /// Same as [`Pacer::new`].
    pub fn seeded(policy: PacingPolicy, seed: u64) -> Result<Self> {
        Self::with_rng(policy, StdRng::seed_from_u64(seed))
    }

    fn with_rng(policy: PacingPolicy, rng: StdRng) -> Result<Self> {
        Ok(Self {
            distribution: policy.distribution()?,
            minimum_secs: policy.minimum_delay_secs,
            rng,
        })
    }

    /// `max(minimum, round(sample))` seconds. Negative samples land on
    /// the floor.
    pub fn next_delay(&mut self) -> Duration {
        let sample = self.distribution.sample(&mut self.rng).round();
        Duration::from_secs(floor_secs(sample, self.minimum_secs))
    }
}

/// Clamp a rounded sample into `[minimum, MAX_DELAY_SECS]` whole seconds.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn floor_secs(sample: f64, minimum: u64) -> u64 {
    // Both bounds are at most one day, well inside f64's exact integers,
    // and the clamped value is integral, so the final cast is exact.
    sample.clamp(minimum as f64, PacingPolicy::MAX_DELAY_SECS as f64) as u64
}

/// Suspends the run between replies.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real wall-clock waits via `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Returns immediately. For dry runs and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSleep;

#[async_trait]
impl Sleeper for NoSleep {
    async fn sleep(&self, _duration: Duration) {}
}
