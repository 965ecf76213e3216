use super::{NotificationError, NotificationSource, NotificationStream};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use redis::Client;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(4);

/// [`NotificationSource`] backed by a redis `SUBSCRIBE` on a single channel
pub struct RedisNotificationSource {
    client: Client,
    topic: String,
    connect_timeout: Duration,
}

impl RedisNotificationSource {
    /// Creates a new source for the given redis URL and channel.
    ///
    /// Fails if the URL is malformed, no connection is attempted.
    pub fn new(url: &str, topic: impl Into<String>) -> Result<Self, NotificationError> {
        let client = Client::open(url).map_err(NotificationError::InvalidEndpoint)?;

        Ok(Self {
            client,
            topic: topic.into(),
            connect_timeout: CONNECT_TIMEOUT,
        })
    }

    /// Channel which is being subscribed to
    pub fn topic(&self) -> &str {
        &self.topic
    }
}

#[async_trait]
impl NotificationSource for RedisNotificationSource {
    async fn subscribe(&self) -> Result<NotificationStream, NotificationError> {
        let con = timeout(self.connect_timeout, self.client.get_async_connection())
            .await
            .map_err(|_| NotificationError::ConnectionTimeout)??;

        let mut pubsub = con.into_pubsub();
        pubsub.subscribe(self.topic.as_str()).await?;

        debug!(topic = %self.topic, "Subscribed to notification channel");

        // Each message is reduced to its occurrence, the payload is never inspected
        let messages = pubsub.into_on_message().map(|_| Ok(()));
        let closed = stream::once(async { Err(NotificationError::StreamClosed) });

        Ok(messages.chain(closed).boxed())
    }
}
