//! Retry with exponential backoff for geocode lookups
//!
//! ```text
//! Attempt 1: immediate
//! Attempt 2: wait base
//! Attempt 3: wait base * 2
//! Attempt 4: wait base * 4
//! Attempt 5: wait base * 8
//! ```
//!
//! Transient failures (`Unavailable`, `TimedOut`) and empty answers are
//! retried; any other error ends the attempt sequence immediately.

use super::{Coordinates, GeocodeError, Geocoder};
use crate::config::GeocodeConfig;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts
    pub max_attempts: u32,

    /// Wait before the second attempt
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &GeocodeConfig) -> Self {
        Self {
            max_attempts: config.max_retries,
            base_delay: config.retry_delay(),
        }
    }

    /// Wait before attempt `attempt` (0-based): zero for the first,
    /// then `base * 2^(attempt - 1)`
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let factor = 1u32.checked_shl(attempt - 1).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Geocode `address`, retrying per this policy.
    ///
    /// Returns `None` once every attempt has failed.
    pub fn geocode<G: Geocoder + ?Sized>(&self, geocoder: &G, address: &str) -> Option<Coordinates> {
        for attempt in 0..self.max_attempts {
            let delay = self.delay_for_attempt(attempt);
            if !delay.is_zero() {
                info!(?delay, attempt = attempt + 1, "sleeping before geocode retry");
                std::thread::sleep(delay);
            }

            match geocoder.geocode(address) {
                Ok(Some(coords)) => {
                    info!(address, lat = coords.lat, lon = coords.lon, "geocoded");
                    return Some(coords);
                }
                Ok(None) => {
                    info!(address, "no geocode results");
                }
                Err(e) if e.is_retryable() => {
                    warn!(
                        address,
                        attempt = attempt + 1,
                        max_attempts = self.max_attempts,
                        error = %e,
                        "geocode attempt failed"
                    );
                }
                Err(e) => {
                    warn!(address, error = %e, "geocode failed, not retrying");
                    return None;
                }
            }
        }

        warn!(address, attempts = self.max_attempts, "all geocode attempts failed");
        None
    }
}
