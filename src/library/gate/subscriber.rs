use super::registry::WaiterRegistry;
use crate::library::helpers::Backoff;
use crate::library::notification::{NotificationError, NotificationSource, NotificationStream};
use futures::StreamExt;
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Connection state of a [`SubscriberLoop`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    /// No subscription is active
    Disconnected,
    /// A connection is being opened and the topic subscribed
    Subscribing,
    /// Subscription is active and notifications are being received
    Listening,
}

/// Long-running task fanning out notifications to every pending waiter
///
/// Each notification received from the source releases all waiters registered at that time.
/// Transport failures never end the loop, it resubscribes with an exponential backoff instead.
/// In the meantime, gated requests fall back to their timeout.
pub struct SubscriberLoop<S: NotificationSource> {
    source: Arc<S>,
    registry: WaiterRegistry,
    backoff: Backoff,
    state: SubscriptionState,
}

impl<S: NotificationSource> SubscriberLoop<S> {
    /// Creates a new loop using the default reconnect backoff
    pub fn new(source: Arc<S>, registry: WaiterRegistry) -> Self {
        Self::with_backoff(source, registry, Backoff::default())
    }

    /// Creates a new loop with a custom reconnect backoff
    pub fn with_backoff(source: Arc<S>, registry: WaiterRegistry, backoff: Backoff) -> Self {
        Self {
            source,
            registry,
            backoff,
            state: SubscriptionState::Disconnected,
        }
    }

    /// Runs the loop forever.
    ///
    /// An already established subscription may be passed in, otherwise the loop starts
    /// by subscribing on its own.
    pub async fn run(mut self, initial: Option<NotificationStream>) {
        let mut established = initial;

        loop {
            let stream = match established.take() {
                Some(stream) => stream,
                None => self.subscribe().await,
            };

            self.transition(SubscriptionState::Listening);
            self.backoff.reset();

            let error = self.listen(stream).await;
            self.transition(SubscriptionState::Disconnected);

            let delay = self.backoff.next().unwrap_or_default();
            warn!(%error, ?delay, "Lost notification subscription, resubscribing");
            sleep(delay).await;
        }
    }

    async fn subscribe(&mut self) -> NotificationStream {
        loop {
            self.transition(SubscriptionState::Subscribing);

            match self.source.subscribe().await {
                Ok(stream) => return stream,
                Err(error) => {
                    self.transition(SubscriptionState::Disconnected);

                    let delay = self.backoff.next().unwrap_or_default();
                    warn!(%error, ?delay, "Unable to subscribe to notifications, retrying");
                    sleep(delay).await;
                }
            }
        }
    }

    async fn listen(&mut self, mut stream: NotificationStream) -> NotificationError {
        while let Some(item) = stream.next().await {
            match item {
                Ok(()) => {
                    let released = self.registry.release_all();
                    debug!(released, "Received notification");
                }
                Err(error) => return error,
            }
        }

        NotificationError::StreamClosed
    }

    fn transition(&mut self, state: SubscriptionState) {
        if self.state != state {
            info!(from = ?self.state, to = ?state, "Subscription state changed");
            self.state = state;
        }
    }
}
