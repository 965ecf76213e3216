use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::{oneshot, OwnedSemaphorePermit, Semaphore};

/// Error returned when a waiter can not be registered
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistrationError {
    /// Registry has been closed and no longer accepts waiters
    #[error("waiter registry has been closed")]
    Closed,
}

struct Entry {
    tx: oneshot::Sender<()>,
    // Occupied slot, returned to the registry when the entry is dropped
    _slot: OwnedSemaphorePermit,
}

struct Inner {
    waiters: Mutex<HashMap<u64, Entry>>,
    slots: Arc<Semaphore>,
    next_id: AtomicU64,
    closed: AtomicBool,
    capacity: usize,
}

impl Inner {
    fn waiters(&self) -> MutexGuard<'_, HashMap<u64, Entry>> {
        self.waiters.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Bounded, concurrency-safe collection of pending [`Waiter`]s
///
/// Cloning the registry yields another reference to the same underlying collection.
/// Each registered waiter occupies one of `capacity` slots until it is either released
/// through [`WaiterRegistry::release_all`] or dropped by its owner.
#[derive(Clone)]
pub struct WaiterRegistry {
    inner: Arc<Inner>,
}

impl WaiterRegistry {
    /// Creates a new registry which holds at most `capacity` waiters at once (minimum of one)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);

        Self {
            inner: Arc::new(Inner {
                waiters: Mutex::new(HashMap::with_capacity(capacity)),
                slots: Arc::new(Semaphore::new(capacity)),
                next_id: AtomicU64::new(0),
                closed: AtomicBool::new(false),
                capacity,
            }),
        }
    }

    /// Registers a new waiter, waiting for a free slot if the registry is at capacity
    ///
    /// Callers that can not wait indefinitely should bound this future with a timeout. Dropping
    /// it before it resolves does not leave anything behind in the registry.
    pub async fn register(&self) -> Result<Waiter, RegistrationError> {
        let slot = self
            .inner
            .slots
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| RegistrationError::Closed)?;

        let (tx, rx) = oneshot::channel();
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);

        {
            let mut waiters = self.inner.waiters();

            // Checked while holding the lock so a concurrent close either drains this entry or rejects it
            if self.inner.closed.load(Ordering::SeqCst) {
                return Err(RegistrationError::Closed);
            }

            waiters.insert(id, Entry { tx, _slot: slot });
        }

        Ok(Waiter {
            id,
            inner: self.inner.clone(),
            rx,
        })
    }

    /// Takes every currently registered waiter out of the registry and signals each of them once.
    ///
    /// Waiters registered after the snapshot has been taken remain pending until the next call.
    /// Returns the number of waiters that were still listening for the signal.
    pub fn release_all(&self) -> usize {
        let drained = std::mem::take(&mut *self.inner.waiters());

        drained
            .into_iter()
            .map(|(_, Entry { tx, .. })| tx.send(()))
            .filter(Result::is_ok)
            .count()
    }

    /// Releases all pending waiters and rejects any future registrations
    pub fn close(&self) -> usize {
        self.inner.closed.store(true, Ordering::SeqCst);
        self.inner.slots.close();
        self.release_all()
    }

    /// Number of waiters currently registered
    pub fn pending(&self) -> usize {
        self.inner.waiters().len()
    }

    /// Maximum number of waiters that may be registered at once
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }
}

/// One-shot release handle owned by a single gated request
///
/// Resolves once the registry releases it. Dropping an unreleased waiter removes it from
/// the registry and frees its slot, a later release simply skips it.
pub struct Waiter {
    id: u64,
    inner: Arc<Inner>,
    rx: oneshot::Receiver<()>,
}

impl Future for Waiter {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        // A dropped sender means the entry is gone without a signal, there is nothing left to wait for
        Pin::new(&mut self.get_mut().rx).poll(cx).map(|_| ())
    }
}

impl Drop for Waiter {
    fn drop(&mut self) {
        self.inner.waiters().remove(&self.id);
    }
}

#[cfg(test)]
mod does {
    use super::*;
    use futures::poll;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn release_registered_waiters() {
        let registry = WaiterRegistry::new(10);
        let mut first = registry.register().await.unwrap();
        let mut second = registry.register().await.unwrap();

        assert!(poll!(&mut first).is_pending());
        assert_eq!(registry.pending(), 2);

        assert_eq!(registry.release_all(), 2);
        assert_eq!(registry.pending(), 0);

        assert!(poll!(&mut first).is_ready());
        assert!(poll!(&mut second).is_ready());
    }

    #[tokio::test]
    async fn not_release_waiters_registered_after_snapshot() {
        let registry = WaiterRegistry::new(10);
        let mut early = registry.register().await.unwrap();

        registry.release_all();
        let mut late = registry.register().await.unwrap();

        assert!(poll!(&mut early).is_ready());
        assert!(poll!(&mut late).is_pending());

        registry.release_all();
        assert!(poll!(&mut late).is_ready());
    }

    #[tokio::test]
    async fn skip_abandoned_waiters() {
        let registry = WaiterRegistry::new(10);
        let abandoned = registry.register().await.unwrap();
        let mut listening = registry.register().await.unwrap();

        drop(abandoned);
        assert_eq!(registry.pending(), 1);

        assert_eq!(registry.release_all(), 1);
        assert!(poll!(&mut listening).is_ready());
    }

    #[tokio::test]
    async fn tolerate_release_without_waiters() {
        let registry = WaiterRegistry::new(1);

        assert_eq!(registry.release_all(), 0);
        assert_eq!(registry.release_all(), 0);
    }

    #[tokio::test]
    async fn block_registration_at_capacity() {
        let registry = WaiterRegistry::new(2);
        let _first = registry.register().await.unwrap();
        let _second = registry.register().await.unwrap();

        let blocked = timeout(Duration::from_millis(50), registry.register()).await;
        assert!(blocked.is_err());

        // A fan-out frees every slot at once
        registry.release_all();
        let unblocked = timeout(Duration::from_millis(50), registry.register()).await;
        assert!(matches!(unblocked, Ok(Ok(_))));
    }

    #[tokio::test]
    async fn free_slot_when_waiter_is_dropped() {
        let registry = WaiterRegistry::new(1);
        let first = registry.register().await.unwrap();

        let pending_registration = tokio::spawn({
            let registry = registry.clone();
            async move { registry.register().await.map(|_| ()) }
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(first);

        let result = timeout(Duration::from_millis(200), pending_registration).await;
        assert!(matches!(result, Ok(Ok(Ok(())))));
    }

    #[tokio::test]
    async fn reject_registrations_after_close() {
        let registry = WaiterRegistry::new(4);
        let mut waiter = registry.register().await.unwrap();

        assert_eq!(registry.close(), 1);
        assert!(poll!(&mut waiter).is_ready());
        assert_eq!(
            registry.register().await.err(),
            Some(RegistrationError::Closed)
        );
    }

    #[tokio::test]
    async fn enforce_minimum_capacity() {
        assert_eq!(WaiterRegistry::new(0).capacity(), 1);
    }
}
