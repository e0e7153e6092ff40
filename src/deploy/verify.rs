//! Post-upload verification polling.
//!
//! The registry processes uploaded archives asynchronously, so a new version
//! only becomes visible on the lookup API some time after the PUT succeeds.
//! [`VerifyPolicy`] bounds how long to wait for it: an initial settle delay,
//! then exponentially growing waits until the attempt count or the total wait
//! budget runs out. The defaults give a single lookup after two seconds.

use std::future::Future;
use tokio::time::{Duration, Instant};

/// Default wait before the first verification lookup
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(2000);

/// Default total wait budget across all attempts
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(30);

/// Upper bound on verification attempts
pub const MAX_ATTEMPTS: u32 = 20;

/// Smallest interval the backoff grows from, so a zero settle delay still spaces out retries
pub const MIN_BACKOFF_BASE: Duration = Duration::from_millis(250);

/// How to poll for an uploaded version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyPolicy {
    /// Wait before the first lookup
    pub settle_delay: Duration,
    /// Number of lookups, at least one
    pub attempts: u32,
    /// Multiplier applied to the wait after each miss
    pub backoff_factor: u32,
    /// Total wait budget; the settle delay is always honoured
    pub max_wait: Duration,
}

impl Default for VerifyPolicy {
    fn default() -> Self {
        Self {
            settle_delay: DEFAULT_SETTLE_DELAY,
            attempts: 1,
            backoff_factor: 2,
            max_wait: DEFAULT_MAX_WAIT,
        }
    }
}

/// Result of a verification poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verification {
    /// Whether the version was seen
    pub visible: bool,
    /// Lookups performed
    pub attempts: u32,
    /// Total time slept
    pub waited: Duration,
}

impl VerifyPolicy {
    /// Validate the policy for consistency
    pub fn validate(&self) -> Result<(), String> {
        if self.attempts == 0 {
            return Err("verification needs at least one attempt".to_string());
        }
        if self.attempts > MAX_ATTEMPTS {
            return Err(format!(
                "verification attempts too high: {} (max: {})",
                self.attempts, MAX_ATTEMPTS
            ));
        }
        if self.backoff_factor == 0 {
            return Err("backoff factor must be at least 1".to_string());
        }
        Ok(())
    }

    /// Planned wait before each lookup.
    ///
    /// The first entry is the settle delay. Later entries grow by
    /// `backoff_factor` from the settle delay (or [`MIN_BACKOFF_BASE`] if
    /// that is shorter) and are clipped to what is left of `max_wait`;
    /// the schedule ends early once the budget is spent.
    pub fn schedule(&self) -> Vec<Duration> {
        let attempts = self.attempts.clamp(1, MAX_ATTEMPTS);
        let mut delays = Vec::with_capacity(attempts as usize);
        delays.push(self.settle_delay);

        let mut spent = self.settle_delay;
        let mut next = self.settle_delay.max(MIN_BACKOFF_BASE);
        for _ in 1..attempts {
            next = next.saturating_mul(self.backoff_factor.max(1));
            let remaining = self.max_wait.saturating_sub(spent);
            if remaining.is_zero() {
                break;
            }
            let wait = next.min(remaining);
            spent += wait;
            delays.push(wait);
        }
        delays
    }

    /// Sleep and run `check` according to the schedule until it reports `true`
    pub async fn wait_until<F, Fut>(&self, mut check: F) -> Verification
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = bool>,
    {
        let start = Instant::now();
        let mut attempts = 0;

        for delay in self.schedule() {
            if !delay.is_zero() {
                log::debug!("Waiting {:.1}s before verification lookup", delay.as_secs_f64());
                tokio::time::sleep(delay).await;
            }
            attempts += 1;
            if check().await {
                return Verification {
                    visible: true,
                    attempts,
                    waited: start.elapsed(),
                };
            }
        }

        Verification {
            visible: false,
            attempts,
            waited: start.elapsed(),
        }
    }
}
