mod proxy;
mod subscriber;

pub use proxy::ProxyJob;
pub use subscriber::SubscriberJob;
