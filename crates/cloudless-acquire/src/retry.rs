use crate::AcquireError;
use log::warn;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Bounded exponential backoff for one scene download.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first one. `0` behaves like `1`.
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff_ms: 1_000,
            max_backoff_ms: 30_000,
        }
    }
}

impl RetryPolicy {
    /// Delay after failed attempt number `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.saturating_sub(1).min(32);
        let ms = self
            .initial_backoff_ms
            .saturating_mul(factor)
            .min(self.max_backoff_ms);
        Duration::from_millis(ms)
    }

    /// Run `op` until it succeeds or the attempt budget is spent.
    ///
    /// `op` receives the 1-based attempt number.
    pub fn run<T>(
        &self,
        url: &str,
        mut op: impl FnMut(u32) -> Result<T, AcquireError>,
    ) -> Result<T, AcquireError> {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(err) if attempt >= attempts => {
                    return Err(AcquireError::RetriesExhausted {
                        url: url.to_string(),
                        attempts,
                        last: Box::new(err),
                    });
                }
                Err(err) => {
                    let delay = self.backoff(attempt);
                    warn!(
                        "attempt {attempt}/{attempts} for {url} failed: {err}; retrying in {} ms",
                        delay.as_millis()
                    );
                    std::thread::sleep(delay);
                    attempt += 1;
                }
            }
        }
    }
}
