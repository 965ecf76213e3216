//! Admission gating on top of external change notifications
//!
//! Every gated request registers a one-shot [`Waiter`] in a shared [`WaiterRegistry`] and
//! races it against a deadline inside [`Gate::wait`]. A [`SubscriberLoop`] pulls events
//! from a [`NotificationSource`](super::notification::NotificationSource) and releases all
//! registered waiters at once for every event it receives.

mod gate;
mod registry;
mod subscriber;

pub use self::gate::{Admission, Gate, MAX_TIMEOUT};
pub use registry::{RegistrationError, Waiter, WaiterRegistry};
pub use subscriber::{SubscriberLoop, SubscriptionState};
