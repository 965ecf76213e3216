use super::registry::{RegistrationError, WaiterRegistry};
use std::time::Duration;
use tokio::time::{timeout_at, Instant};

/// Longest timeout a gate honours, larger values are clamped to it
pub const MAX_TIMEOUT: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Outcome of a single [`Gate::wait`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// A notification released the request before its deadline
    Notified,
    /// No notification arrived before the deadline
    TimedOut,
    /// The registry stayed at capacity until the deadline, the request was never registered
    Saturated,
    /// The registry has been closed, the request passes without gating
    Bypassed,
}

/// Per-request synchronization primitive
///
/// Holds a request until either the next notification arrives or the configured timeout
/// elapses. The timeout is an upper bound on the total added latency, including the time
/// spent waiting for a free slot in the registry.
#[derive(Clone)]
pub struct Gate {
    registry: WaiterRegistry,
    timeout: Duration,
}

impl Gate {
    /// Creates a new gate which registers its waiters in the given registry.
    /// Timeouts beyond [`MAX_TIMEOUT`] are clamped so that deadlines always stay representable.
    pub fn new(registry: WaiterRegistry, timeout: Duration) -> Self {
        Self {
            registry,
            timeout: timeout.min(MAX_TIMEOUT),
        }
    }

    /// Upper bound on how long a single call to [`Gate::wait`] may take
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Blocks until released by a notification or until the timeout elapses.
    /// Never fails, the returned value only describes why the call returned.
    pub async fn wait(&self) -> Admission {
        let deadline = Instant::now() + self.timeout;

        let waiter = match timeout_at(deadline, self.registry.register()).await {
            Ok(Ok(waiter)) => waiter,
            Ok(Err(RegistrationError::Closed)) => return Admission::Bypassed,
            Err(_) => return Admission::Saturated,
        };

        match timeout_at(deadline, waiter).await {
            Ok(()) => Admission::Notified,
            Err(_) => Admission::TimedOut,
        }
    }
}

#[cfg(test)]
mod does {
    use super::*;
    use futures::future::join_all;
    use std::time::Instant as StdInstant;
    use tokio::time::sleep;

    const TIMEOUT: Duration = Duration::from_millis(300);
    const SLACK: Duration = Duration::from_millis(150);

    async fn wait_until_pending(registry: &WaiterRegistry, count: usize) {
        while registry.pending() < count {
            sleep(Duration::from_millis(1)).await;
        }
    }

    #[tokio::test]
    async fn time_out_without_notification() {
        let gate = Gate::new(WaiterRegistry::new(10), TIMEOUT);

        let start = StdInstant::now();
        let admission = gate.wait().await;
        let elapsed = start.elapsed();

        assert_eq!(admission, Admission::TimedOut);
        assert!(elapsed >= TIMEOUT);
        assert!(elapsed < TIMEOUT + SLACK);
    }

    #[tokio::test]
    async fn release_on_notification() {
        let registry = WaiterRegistry::new(10);
        let gate = Gate::new(registry.clone(), Duration::from_secs(10));

        let start = StdInstant::now();
        let waiting = tokio::spawn(async move { gate.wait().await });

        wait_until_pending(&registry, 1).await;
        registry.release_all();

        assert_eq!(waiting.await.unwrap(), Admission::Notified);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn release_every_concurrent_waiter() {
        let registry = WaiterRegistry::new(100);
        let gate = Gate::new(registry.clone(), Duration::from_secs(10));

        let handles: Vec<_> = (0..50)
            .map(|_| {
                let gate = gate.clone();
                tokio::spawn(async move { gate.wait().await })
            })
            .collect();

        wait_until_pending(&registry, 50).await;
        assert_eq!(registry.release_all(), 50);

        for result in join_all(handles).await {
            assert_eq!(result.unwrap(), Admission::Notified);
        }
    }

    #[tokio::test]
    async fn unregister_after_timeout() {
        let registry = WaiterRegistry::new(10);
        let gate = Gate::new(registry.clone(), Duration::from_millis(20));

        assert_eq!(gate.wait().await, Admission::TimedOut);
        assert_eq!(registry.pending(), 0);
        assert_eq!(registry.release_all(), 0);
    }

    #[tokio::test]
    async fn bound_saturated_registration_by_timeout() {
        let registry = WaiterRegistry::new(1);
        let _occupant = registry.register().await.unwrap();
        let gate = Gate::new(registry.clone(), TIMEOUT);

        let start = StdInstant::now();
        assert_eq!(gate.wait().await, Admission::Saturated);
        assert!(start.elapsed() < TIMEOUT + SLACK);
    }

    #[tokio::test]
    async fn bypass_closed_registry() {
        let registry = WaiterRegistry::new(1);
        registry.close();

        let gate = Gate::new(registry, Duration::from_secs(10));
        assert_eq!(gate.wait().await, Admission::Bypassed);
    }

    #[tokio::test]
    async fn unregister_when_cancelled() {
        let registry = WaiterRegistry::new(10);
        let gate = Gate::new(registry.clone(), Duration::from_secs(10));

        let cancelled = tokio::time::timeout(Duration::from_millis(20), gate.wait()).await;

        assert!(cancelled.is_err());
        assert_eq!(registry.pending(), 0);
    }

    #[tokio::test]
    async fn clamp_oversized_timeout() {
        let registry = WaiterRegistry::new(10);
        let gate = Gate::new(registry.clone(), Duration::from_secs(i64::MAX as u64));
        assert_eq!(gate.timeout(), MAX_TIMEOUT);

        let waiting = tokio::spawn(async move { gate.wait().await });

        wait_until_pending(&registry, 1).await;
        registry.release_all();

        assert_eq!(waiting.await.unwrap(), Admission::Notified);
    }
}
