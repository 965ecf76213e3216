use crate::library::gate::Gate;
use crate::library::http::{forward_request, uri_with_authority};
use hyper::client::HttpConnector;
use hyper::{Body, Client, Request, Response, StatusCode};
use std::convert::Infallible;
use std::net::IpAddr;
use std::time::Duration;
use tracing::{debug, warn};

/// HTTP-facing half of the proxy which gates every request before forwarding it to the backend
#[derive(Clone)]
pub struct Frontend {
    gate: Gate,
    client: Client<HttpConnector>,
    backend: String,
}

impl Frontend {
    pub fn new(gate: Gate, backend: String) -> Self {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(30))
            .build_http();

        Self {
            gate,
            client,
            backend,
        }
    }

    pub async fn handle(
        &self,
        req: Request<Body>,
        client_ip: IpAddr,
    ) -> Result<Response<Body>, Infallible> {
        let admission = self.gate.wait().await;

        let method = req.method().clone();
        let path = req
            .uri()
            .path_and_query()
            .map(|p| p.to_string())
            .unwrap_or_default();

        debug!(?client_ip, %method, %path, ?admission, "Forwarding request");

        let target = match uri_with_authority(&req, &self.backend) {
            Ok(target) => target,
            Err(e) => {
                warn!(backend = %self.backend, error = %e, "Unable to build upstream uri");
                return Ok(bad_gateway(format!("Invalid upstream {}: {}", self.backend, e)));
            }
        };

        match forward_request(&self.client, req, client_ip, target).await {
            Ok(response) => Ok(response),
            Err(e) => Ok(bad_gateway(format!(
                "Unable to forward request to {}: {}",
                self.backend, e
            ))),
        }
    }
}

fn bad_gateway(message: String) -> Response<Body> {
    let mut response = Response::new(Body::from(message));
    *response.status_mut() = StatusCode::BAD_GATEWAY;
    response
}
