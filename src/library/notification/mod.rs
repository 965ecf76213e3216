//! Content-free change notifications delivered over a publish/subscribe bus
//!
//! Only the occurrence of a notification carries meaning, payloads are discarded.

mod redis;

#[cfg(test)]
pub(crate) mod fake;
#[cfg(test)]
pub(crate) mod mock;

pub use self::redis::RedisNotificationSource;

use ::redis::RedisError;
use async_trait::async_trait;
use futures::stream::BoxStream;
use thiserror::Error;

/// Stream of notifications from a single subscription
///
/// Yields `Ok(())` for each notification. Once the underlying transport fails, the final
/// item is an error after which the stream ends.
pub type NotificationStream = BoxStream<'static, Result<(), NotificationError>>;

/// Errors raised while subscribing to or listening on a notification bus
#[derive(Debug, Error)]
pub enum NotificationError {
    /// Endpoint URL could not be parsed
    #[error("invalid notification bus endpoint")]
    InvalidEndpoint(#[source] RedisError),
    /// Connection attempt did not complete in time
    #[error("timed out while connecting to notification bus")]
    ConnectionTimeout,
    /// Transport level error reported by the bus client
    #[error("error interacting with notification bus")]
    Redis(#[from] RedisError),
    /// Subscription stream ended unexpectedly
    #[error("notification stream ended unexpectedly")]
    StreamClosed,
}

/// Origin of notifications which may be subscribed to repeatedly
#[async_trait]
pub trait NotificationSource: Send + Sync {
    /// Opens a fresh connection, subscribes to the topic and returns the resulting stream.
    /// Returns only after the subscription has been acknowledged.
    async fn subscribe(&self) -> Result<NotificationStream, NotificationError>;
}
