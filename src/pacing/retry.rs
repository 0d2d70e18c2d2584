use super::{JitterBounds, Pacer};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Pause inserted between two attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RetryDelay {
    Fixed(Duration),
    Jitter(JitterBounds),
}

/// Explicit retry policy applied by a caller around one operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: RetryDelay,
}

/// The operation failed on every attempt.
#[derive(Debug)]
pub struct RetryError<E> {
    pub attempts: u32,
    pub last: E,
}

impl<E: Display> Display for RetryError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed after {} attempt(s): {}", self.attempts, self.last)
    }
}

impl RetryPolicy {
    pub const fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay: RetryDelay::Fixed(delay),
        }
    }

    pub const fn jittered(max_attempts: u32, bounds: JitterBounds) -> Self {
        Self {
            max_attempts,
            delay: RetryDelay::Jitter(bounds),
        }
    }

    /// Single attempt, no pause.
    pub const fn once() -> Self {
        Self::fixed(1, Duration::ZERO)
    }

    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Runs `op` until it succeeds or the attempt budget is spent.
    ///
    /// `op` receives the 1-based attempt number. The pause is only taken
    /// between attempts, never after the last one.
    pub async fn run<T, E, F, Fut>(
        &self,
        pacer: &Pacer,
        label: &str,
        mut op: F,
    ) -> Result<T, RetryError<E>>
    where
        E: Display,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let max_attempts = self.attempts();
        let mut attempt = 1;

        loop {
            match op(attempt).await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::info!(label, attempt, "Recovered after retries");
                    }
                    return Ok(value);
                }
                Err(e) if attempt >= max_attempts => {
                    tracing::warn!(label, attempt, max_attempts, "Final attempt failed: {e}");
                    return Err(RetryError { attempts: attempt, last: e });
                }
                Err(e) => {
                    let pause = match self.delay {
                        RetryDelay::Fixed(pause) => pause,
                        RetryDelay::Jitter(bounds) => pacer.sample(bounds),
                    };
                    tracing::warn!(
                        label,
                        attempt,
                        max_attempts,
                        retry_in_secs = pause.as_secs_f64(),
                        "Attempt failed, retrying: {e}"
                    );
                    if !pause.is_zero() {
                        tokio::time::sleep(pause).await;
                    }
                    attempt += 1;
                }
            }
        }
    }
}
