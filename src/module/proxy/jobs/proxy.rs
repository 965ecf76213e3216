use super::super::frontend::Frontend;
use crate::library::gate::WaiterRegistry;
use crate::library::EmptyResult;
use async_trait::async_trait;
use hyper::server::conn::AddrStream;
use hyper::service::{make_service_fn, service_fn};
use hyper::Server;
use jatsl::{Job, JobManager};
use std::convert::Infallible;
use std::net::TcpListener;
use tracing::info;

/// Job serving the gating HTTP front-end on a pre-bound listener
pub struct ProxyJob {
    listener: TcpListener,
    frontend: Frontend,
    registry: WaiterRegistry,
}

impl ProxyJob {
    pub fn new(listener: TcpListener, frontend: Frontend, registry: WaiterRegistry) -> Self {
        Self {
            listener,
            frontend,
            registry,
        }
    }
}

#[async_trait]
impl Job for ProxyJob {
    const NAME: &'static str = module_path!();
    const SUPPORTS_GRACEFUL_TERMINATION: bool = true;

    async fn execute(&self, manager: JobManager) -> EmptyResult {
        let frontend = self.frontend.clone();
        let make_svc = make_service_fn(move |conn: &AddrStream| {
            let client_ip = conn.remote_addr().ip();
            let frontend = frontend.clone();

            async move {
                Ok::<_, Infallible>(service_fn(move |req| {
                    let frontend = frontend.clone();
                    async move { frontend.handle(req, client_ip).await }
                }))
            }
        });

        let listener = self.listener.try_clone()?;
        let addr = listener.local_addr()?;
        let server = Server::from_tcp(listener)?.serve(make_svc);

        // Waiting requests are let through right away so the graceful shutdown does not stall
        let registry = self.registry.clone();
        let termination = manager.termination_signal();
        let graceful = server.with_graceful_shutdown(async move {
            termination.await;
            let released = registry.close();
            info!(released, "Releasing gated requests for shutdown");
        });

        info!(%addr, "Listening");
        manager.ready().await;
        graceful.await?;

        Ok(())
    }
}
