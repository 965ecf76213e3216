//! Admission-gating reverse proxy
//!
//! Holds every inbound request until the backend announces fresh state on the notification
//! bus or the wait timeout elapses, then forwards it to the backend unchanged.

use crate::harness::{Heart, Module};
use crate::library::gate::{Gate, WaiterRegistry};
use crate::library::notification::{NotificationSource, NotificationStream, RedisNotificationSource};
use crate::library::{BoxedError, EmptyResult};
use async_trait::async_trait;
use jatsl::{schedule, JobScheduler};
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

mod frontend;
mod jobs;
mod options;

use frontend::Frontend;
use jobs::{ProxyJob, SubscriberJob};
pub use options::Options;

/// Errors preventing the module from running
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Run procedure was invoked without a successful startup
    #[error("module has not been started")]
    NotStarted,
}

/// Resources acquired during startup whose failure is fatal
struct Startup {
    source: Arc<RedisNotificationSource>,
    subscription: NotificationStream,
    listener: TcpListener,
}

/// Module implementation
pub struct Proxy {
    options: Options,
    startup: Option<Startup>,
}

impl Proxy {
    /// Creates a new instance from raw parts
    pub fn new(options: Options) -> Self {
        Self {
            options,
            startup: None,
        }
    }
}

#[async_trait]
impl Module for Proxy {
    async fn pre_startup(&mut self) -> EmptyResult {
        let redis = &self.options.redis;
        let source = RedisNotificationSource::new(&redis.url, redis.topic.clone())?;

        info!(url = %redis.url, topic = %redis.topic, "Subscribing to notification bus");
        let subscription = source.subscribe().await?;

        let addr = SocketAddr::from(([0, 0, 0, 0], self.options.port));
        let listener = TcpListener::bind(addr)?;
        listener.set_nonblocking(true)?;

        self.startup = Some(Startup {
            source: Arc::new(source),
            subscription,
            listener,
        });

        Ok(())
    }

    async fn run(&mut self, scheduler: &JobScheduler) -> Result<Option<Heart>, BoxedError> {
        let startup = self.startup.take().ok_or(ProxyError::NotStarted)?;

        info!(
            backend = %self.options.backend,
            timeout = ?self.options.wait_timeout,
            pending_request_limit = self.options.pending_request_limit,
            "Starting gating proxy"
        );

        // Build all the required data structures
        let registry = WaiterRegistry::new(self.options.pending_request_limit);
        let gate = Gate::new(registry.clone(), self.options.wait_timeout);
        let frontend = Frontend::new(gate, self.options.backend.clone());

        // Create individual jobs
        let subscriber_job =
            SubscriberJob::new(startup.source, registry.clone(), startup.subscription);
        let proxy_job = ProxyJob::new(startup.listener, frontend, registry);

        // Schedule everything
        schedule!(scheduler, {
            subscriber_job,
            proxy_job
        });

        Ok(Some(Heart::without_heart_stone()))
    }
}
