//! Jittered delays, dwell targets and every other random draw the run makes.
//!
//! All randomness flows through [`Pacer`] so bounds and distributions can be
//! exercised in isolation with a seeded generator.

mod retry;

pub use retry::{RetryDelay, RetryError, RetryPolicy};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// Pixel range for a single scroll step.
const SCROLL_DISTANCE_PX: (u32, u32) = (550, 650);

/// Upper limit for any configured pause, one day.
pub const MAX_BOUND_SECS: f64 = 86_400.0;

/// Inclusive `[min, max]` range in seconds, sampled uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JitterBounds {
    pub min: f64,
    pub max: f64,
}

impl JitterBounds {
    /// Builds bounds with `0 ≤ min ≤ max ≤ MAX_BOUND_SECS`; a `max` below
    /// `min` is raised to it.
    pub fn new(min: f64, max: f64) -> Self {
        let min = if min.is_finite() {
            min.clamp(0.0, MAX_BOUND_SECS)
        } else {
            0.0
        };
        let max = if max.is_finite() {
            max.clamp(min, MAX_BOUND_SECS)
        } else {
            min
        };
        Self { min, max }
    }

    pub const fn fixed(seconds: f64) -> Self {
        Self {
            min: seconds,
            max: seconds,
        }
    }

    pub fn normalized(self) -> Self {
        Self::new(self.min, self.max)
    }

    pub fn min_duration(&self) -> Duration {
        Duration::from_secs_f64(self.normalized().min)
    }

    pub fn max_duration(&self) -> Duration {
        Duration::from_secs_f64(self.normalized().max)
    }
}

/// Per-run pacing bounds (seconds).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PacingConfig {
    /// Pause between two visited topics
    #[serde(default = "default_topic_delay")]
    pub topic_delay: JitterBounds,
    /// Pause between scroll steps inside one topic
    #[serde(default = "default_scroll_delay")]
    pub scroll_delay: JitterBounds,
    /// Extra pause after a failed visit
    #[serde(default = "default_backoff")]
    pub backoff: JitterBounds,
    /// Total wall-clock time one visit should take
    #[serde(default = "default_post_target")]
    pub post_target: JitterBounds,
}

fn default_topic_delay() -> JitterBounds {
    JitterBounds::new(0.4, 1.0)
}

fn default_scroll_delay() -> JitterBounds {
    JitterBounds::new(0.2, 0.7)
}

fn default_backoff() -> JitterBounds {
    JitterBounds::new(3.0, 6.0)
}

fn default_post_target() -> JitterBounds {
    JitterBounds::new(5.0, 8.0)
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            topic_delay: default_topic_delay(),
            scroll_delay: default_scroll_delay(),
            backoff: default_backoff(),
            post_target: default_post_target(),
        }
    }
}

impl PacingConfig {
    pub fn normalized(self) -> Self {
        Self {
            topic_delay: self.topic_delay.normalized(),
            scroll_delay: self.scroll_delay.normalized(),
            backoff: self.backoff.normalized(),
            post_target: self.post_target.normalized(),
        }
    }

    /// Rough upper bound for one visited topic, excluding retries.
    pub fn per_item_ceiling(&self) -> Duration {
        self.post_target.max_duration() + self.topic_delay.max_duration()
    }
}

pub struct Pacer {
    config: PacingConfig,
    rng: Mutex<StdRng>,
}

impl Pacer {
    pub fn new(config: PacingConfig) -> Self {
        Self::with_rng(config, StdRng::from_os_rng())
    }

    /// Deterministic pacer for tests and reproducible runs.
    pub fn seeded(config: PacingConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: PacingConfig, rng: StdRng) -> Self {
        Self {
            config: config.normalized(),
            rng: Mutex::new(rng),
        }
    }

    pub fn config(&self) -> &PacingConfig {
        &self.config
    }

    fn with_rng_mut<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut rng)
    }

    /// Uniform draw from `bounds`.
    pub fn sample(&self, bounds: JitterBounds) -> Duration {
        let bounds = bounds.normalized();
        if bounds.max <= bounds.min {
            return Duration::from_secs_f64(bounds.min);
        }
        let secs = self.with_rng_mut(|rng| rng.random_range(bounds.min..=bounds.max));
        Duration::from_secs_f64(secs)
    }

    /// Sleeps for a uniform draw from `bounds` and returns the slept duration.
    pub async fn jitter(&self, bounds: JitterBounds) -> Duration {
        let pause = self.sample(bounds);
        tokio::time::sleep(pause).await;
        pause
    }

    pub async fn topic_delay(&self) -> Duration {
        self.jitter(self.config.topic_delay).await
    }

    pub async fn scroll_delay(&self) -> Duration {
        self.jitter(self.config.scroll_delay).await
    }

    pub async fn backoff(&self) -> Duration {
        self.jitter(self.config.backoff).await
    }

    pub fn dwell_target(&self) -> Duration {
        self.sample(self.config.post_target)
    }

    /// Sleeps whatever is left of `target` since `started`.
    ///
    /// Returns the backfilled duration, zero when the visit already overran.
    pub async fn backfill(&self, started: Instant, target: Duration) -> Duration {
        let remaining = target.saturating_sub(started.elapsed());
        if !remaining.is_zero() {
            tokio::time::sleep(remaining).await;
        }
        remaining
    }

    /// Bernoulli trial; `probability` is clamped into `[0, 1]`.
    pub fn chance(&self, probability: f64) -> bool {
        let p = if probability.is_nan() {
            0.0
        } else {
            probability.clamp(0.0, 1.0)
        };
        self.with_rng_mut(|rng| rng.random_bool(p))
    }

    pub fn scroll_distance(&self) -> u32 {
        let (low, high) = SCROLL_DISTANCE_PX;
        self.with_rng_mut(|rng| rng.random_range(low..=high))
    }

    /// Uniform random permutation in place.
    pub fn shuffle<T>(&self, items: &mut [T]) {
        self.with_rng_mut(|rng| items.shuffle(rng));
    }
}

impl std::fmt::Debug for Pacer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pacer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_clamp_max_up_to_min() {
        let bounds = JitterBounds::new(3.0, 1.0);
        assert_eq!(bounds.min, 3.0);
        assert_eq!(bounds.max, 3.0);
    }

    #[test]
    fn bounds_clamp_negative_and_non_finite() {
        let bounds = JitterBounds::new(-2.0, f64::NAN);
        assert_eq!(bounds.min, 0.0);
        assert_eq!(bounds.max, 0.0);

        let bounds = JitterBounds::new(f64::INFINITY, 4.0);
        assert_eq!(bounds.min, 0.0);
        assert_eq!(bounds.max, 4.0);
    }

    #[test]
    fn huge_bounds_are_capped_to_a_day() {
        let bounds = JitterBounds::new(1e300, 1e20);
        assert_eq!(bounds.min, MAX_BOUND_SECS);
        assert_eq!(bounds.max, MAX_BOUND_SECS);
        assert_eq!(bounds.max_duration(), Duration::from_secs(86_400));
    }

    #[test]
    fn huge_post_target_still_samples() {
        let config = PacingConfig {
            post_target: JitterBounds::new(5.0, 1e20),
            backoff: JitterBounds {
                min: 1.0,
                max: 1e300,
            },
            ..PacingConfig::default()
        };
        let pacer = Pacer::seeded(config, 4);
        for _ in 0..50 {
            let target = pacer.dwell_target();
            assert!(target >= Duration::from_secs(5));
            assert!(target <= Duration::from_secs(86_400));
        }
        assert!(pacer.sample(config.backoff) <= Duration::from_secs(86_400));
        assert!(config.per_item_ceiling() <= Duration::from_secs(2 * 86_400));
    }

    #[test]
    fn samples_stay_within_bounds() {
        let pacer = Pacer::seeded(PacingConfig::default(), 7);
        let bounds = JitterBounds::new(0.4, 1.0);
        for _ in 0..500 {
            let pause = pacer.sample(bounds);
            assert!(pause >= Duration::from_secs_f64(0.4), "{pause:?}");
            assert!(pause <= Duration::from_secs_f64(1.0), "{pause:?}");
        }
    }

    #[test]
    fn degenerate_bounds_return_the_single_value() {
        let pacer = Pacer::seeded(PacingConfig::default(), 1);
        assert_eq!(
            pacer.sample(JitterBounds::fixed(2.5)),
            Duration::from_millis(2500)
        );
    }

    #[test]
    fn dwell_target_uses_post_target_bounds() {
        let config = PacingConfig {
            post_target: JitterBounds::new(5.0, 8.0),
            ..PacingConfig::default()
        };
        let pacer = Pacer::seeded(config, 11);
        for _ in 0..200 {
            let target = pacer.dwell_target();
            assert!(target >= Duration::from_secs(5));
            assert!(target <= Duration::from_secs(8));
        }
    }

    #[test]
    fn chance_edges_are_deterministic() {
        let pacer = Pacer::seeded(PacingConfig::default(), 3);
        assert!((0..100).all(|_| pacer.chance(1.0)));
        assert!((0..100).all(|_| !pacer.chance(0.0)));
        assert!((0..100).all(|_| !pacer.chance(-1.0)));
        assert!((0..100).all(|_| pacer.chance(4.0)));
    }

    #[test]
    fn scroll_distance_within_pixel_range() {
        let pacer = Pacer::seeded(PacingConfig::default(), 5);
        for _ in 0..500 {
            let px = pacer.scroll_distance();
            assert!((550..=650).contains(&px), "{px}");
        }
    }

    #[test]
    fn shuffle_is_a_permutation() {
        let pacer = Pacer::seeded(PacingConfig::default(), 9);
        let mut items: Vec<u32> = (0..50).collect();
        pacer.shuffle(&mut items);
        let mut sorted = items.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn same_seed_same_draws() {
        let a = Pacer::seeded(PacingConfig::default(), 42);
        let b = Pacer::seeded(PacingConfig::default(), 42);
        for _ in 0..20 {
            assert_eq!(a.dwell_target(), b.dwell_target());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn backfill_sleeps_the_remainder() {
        let pacer = Pacer::seeded(PacingConfig::default(), 1);
        let started = Instant::now();
        tokio::time::sleep(Duration::from_secs(2)).await;

        let slept = pacer.backfill(started, Duration::from_secs(6)).await;
        assert_eq!(slept, Duration::from_secs(4));
        assert_eq!(started.elapsed(), Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn backfill_is_zero_when_overrun() {
        let pacer = Pacer::seeded(PacingConfig::default(), 1);
        let started = Instant::now();
        tokio::time::sleep(Duration::from_secs(9)).await;

        let slept = pacer.backfill(started, Duration::from_secs(6)).await;
        assert!(slept.is_zero());
        assert_eq!(started.elapsed(), Duration::from_secs(9));
    }

    #[tokio::test(start_paused = true)]
    async fn jitter_sleeps_the_sampled_duration() {
        let pacer = Pacer::seeded(PacingConfig::default(), 2);
        let started = Instant::now();
        let slept = pacer.jitter(JitterBounds::new(0.2, 0.7)).await;
        assert_eq!(started.elapsed(), slept);
        assert!(slept >= Duration::from_millis(200));
        assert!(slept <= Duration::from_millis(700));
    }
}
