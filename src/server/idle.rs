/// Idle shutdown
///
/// The server stops when no heartbeat has arrived for the configured
/// timeout. A zero timeout, or one too large to schedule, disables the timer.
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{self, Instant};
use tracing::info;

#[derive(Debug, Clone)]
pub struct IdleTimer {
    timeout: Option<Duration>,
    last_activity: Arc<Mutex<Instant>>,
}

impl IdleTimer {
    pub fn new(timeout: Duration) -> Self {
        let now = Instant::now();
        let schedulable = !timeout.is_zero() && now.checked_add(timeout).is_some();
        Self {
            timeout: schedulable.then_some(timeout),
            last_activity: Arc::new(Mutex::new(now)),
        }
    }

    pub fn from_minutes(minutes: u64) -> Self {
        match minutes.checked_mul(60) {
            Some(secs) => Self::new(Duration::from_secs(secs)),
            None => Self::new(Duration::ZERO),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.timeout.is_some()
    }

    /// Restart the countdown
    pub fn touch(&self) {
        *self.last_activity.lock() = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_activity.lock().elapsed()
    }

    /// Resolves once the timer has run out; never resolves when disabled
    pub async fn expired(self) {
        let Some(timeout) = self.timeout else {
            return std::future::pending().await;
        };

        loop {
            let Some(deadline) = self.last_activity.lock().checked_add(timeout) else {
                return std::future::pending().await;
            };
            time::sleep_until(deadline).await;

            if self.idle_for() >= timeout {
                info!(
                    "⏱️  No heartbeat received in {} seconds, shutting down",
                    timeout.as_secs()
                );
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_expires_without_activity() {
        let timer = IdleTimer::new(Duration::from_millis(50));
        let result = time::timeout(Duration::from_secs(5), timer.expired()).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_touch_postpones_expiry() {
        let timer = IdleTimer::new(Duration::from_millis(500));
        let watcher = tokio::spawn(timer.clone().expired());

        for _ in 0..4 {
            time::sleep(Duration::from_millis(100)).await;
            timer.touch();
        }
        assert!(!watcher.is_finished());

        let result = time::timeout(Duration::from_secs(5), watcher).await;
        assert!(result.is_ok());
        assert!(timer.idle_for() >= Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_zero_disables() {
        let timer = IdleTimer::from_minutes(0);
        assert!(!timer.is_enabled());

        let result = time::timeout(Duration::from_millis(100), timer.expired()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_huge_timeouts_disable() {
        for timer in [
            IdleTimer::from_minutes(u64::MAX),
            IdleTimer::from_minutes(u64::MAX / 60),
            IdleTimer::new(Duration::MAX),
        ] {
            assert!(!timer.is_enabled());
            let result = time::timeout(Duration::from_millis(50), timer.expired()).await;
            assert!(result.is_err());
        }
    }
}
