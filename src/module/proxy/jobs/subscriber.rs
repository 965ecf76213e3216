use crate::library::gate::{SubscriberLoop, WaiterRegistry};
use crate::library::notification::{NotificationSource, NotificationStream};
use crate::library::EmptyResult;
use async_trait::async_trait;
use jatsl::{Job, JobManager};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Job running the [`SubscriberLoop`] for the lifetime of the process
pub struct SubscriberJob<S: NotificationSource> {
    source: Arc<S>,
    registry: WaiterRegistry,
    /// Subscription established during startup, consumed by the first execution
    initial: Mutex<Option<NotificationStream>>,
}

impl<S: NotificationSource> SubscriberJob<S> {
    pub fn new(source: Arc<S>, registry: WaiterRegistry, initial: NotificationStream) -> Self {
        Self {
            source,
            registry,
            initial: Mutex::new(Some(initial)),
        }
    }
}

#[async_trait]
impl<S> Job for SubscriberJob<S>
where
    S: NotificationSource + 'static,
{
    const NAME: &'static str = module_path!();

    async fn execute(&self, manager: JobManager) -> EmptyResult {
        let initial = self.initial.lock().await.take();

        manager.ready().await;

        SubscriberLoop::new(self.source.clone(), self.registry.clone())
            .run(initial)
            .await;

        Ok(())
    }
}
