//! Bounded exponential backoff for contended locks

use std::sync::{RwLock, RwLockWriteGuard, TryLockError};
use std::thread;
use std::time::Duration;

use tracing::debug;

use crate::config::LockSettings;
use crate::error::StockroomError;

/// How long a writer keeps retrying a contended lock before giving up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl LockPolicy {
    pub fn new(max_attempts: u32, base_delay_ms: u64, max_delay_ms: u64) -> Self {
        let base_delay_ms = base_delay_ms.max(1);
        Self {
            max_attempts: max_attempts.max(1),
            base_delay_ms,
            max_delay_ms: max_delay_ms.max(base_delay_ms),
        }
    }

    /// Delay after the given zero-based failed attempt
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = 2_u64.saturating_pow(attempt);
        let delay = self.base_delay_ms.saturating_mul(exp).min(self.max_delay_ms);
        Duration::from_millis(delay)
    }

    /// Take the write lock, backing off while another writer holds it
    pub fn acquire_write<'a, T>(
        &self,
        lock: &'a RwLock<T>,
        what: &str,
    ) -> Result<RwLockWriteGuard<'a, T>, StockroomError> {
        let mut attempt = 0;
        loop {
            match lock.try_write() {
                Ok(guard) => return Ok(guard),
                Err(TryLockError::Poisoned(e)) => {
                    return Err(StockroomError::Storage(format!(
                        "Failed to acquire write lock on {}: {}",
                        what, e
                    )));
                }
                Err(TryLockError::WouldBlock) => {
                    attempt += 1;
                    if attempt >= self.max_attempts {
                        return Err(StockroomError::ConcurrencyConflict(format!(
                            "{} is busy after {} attempts",
                            what, attempt
                        )));
                    }
                    let delay = self.delay_for(attempt - 1);
                    debug!(what, attempt, delay_ms = delay.as_millis() as u64, "lock contended");
                    thread::sleep(delay);
                }
            }
        }
    }
}

impl Default for LockPolicy {
    fn default() -> Self {
        LockSettings::default().into()
    }
}

impl From<LockSettings> for LockPolicy {
    fn from(settings: LockSettings) -> Self {
        Self::new(
            settings.max_attempts,
            settings.base_delay_ms,
            settings.max_delay_ms,
        )
    }
}
