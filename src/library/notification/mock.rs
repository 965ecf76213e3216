//! Scripted [`NotificationSource`] for tests

use super::{NotificationError, NotificationSource, NotificationStream};
use async_trait::async_trait;
use futures::channel::mpsc::{unbounded, UnboundedSender};
use futures::stream::{self, StreamExt};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Source which plays back a queue of subscription outcomes.
///
/// Every call to `subscribe` takes the next scripted outcome, an empty script fails.
#[derive(Default)]
pub struct MockNotificationSource {
    script: Mutex<VecDeque<Option<NotificationStream>>>,
    attempts: AtomicUsize,
}

impl MockNotificationSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lets the next subscription attempt fail
    pub fn fail_next(&self) {
        self.script.lock().unwrap().push_back(None);
    }

    /// Lets the next subscription attempt succeed and returns a handle to publish on it.
    /// Dropping the handle closes the subscription as if the transport went away.
    pub fn accept_next(&self) -> UnboundedSender<()> {
        let (tx, rx) = unbounded();
        self.script.lock().unwrap().push_back(Some(Self::stream(rx)));
        tx
    }

    /// Creates a stream outside of the script, e.g. as an initial subscription
    pub fn detached() -> (UnboundedSender<()>, NotificationStream) {
        let (tx, rx) = unbounded();
        (tx, Self::stream(rx))
    }

    /// Number of subscription attempts made so far
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    fn stream(rx: futures::channel::mpsc::UnboundedReceiver<()>) -> NotificationStream {
        let closed = stream::once(async { Err(NotificationError::StreamClosed) });
        rx.map(Ok).chain(closed).boxed()
    }
}

#[async_trait]
impl NotificationSource for MockNotificationSource {
    async fn subscribe(&self) -> Result<NotificationStream, NotificationError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        match self.script.lock().unwrap().pop_front() {
            Some(Some(stream)) => Ok(stream),
            _ => Err(NotificationError::ConnectionTimeout),
        }
    }
}
