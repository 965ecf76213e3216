//! Functions for forwarding HTTP requests to remote endpoints

use hyper::client::HttpConnector;
use hyper::http::{
    header::{
        Entry, HeaderName, InvalidHeaderValue, ToStrError, CONNECTION, PROXY_AUTHENTICATE,
        PROXY_AUTHORIZATION, TE, TRAILER, TRANSFER_ENCODING, UPGRADE,
    },
    HeaderMap, HeaderValue, Request, Response, Uri,
};
use hyper::{Body, Client};
use lazy_static::lazy_static;
use std::net::IpAddr;
use thiserror::Error;
use tracing::error;

lazy_static! {
    static ref HOP_HEADERS: [HeaderName; 9] = [
        CONNECTION,
        HeaderName::from_static("keep-alive"),
        HeaderName::from_static("proxy-connection"),
        PROXY_AUTHENTICATE,
        PROXY_AUTHORIZATION,
        TE,
        TRAILER,
        TRANSFER_ENCODING,
        UPGRADE,
    ];
    static ref X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
}

/// HTTP reverse proxy error
#[derive(Debug, Error)]
pub enum ForwardError {
    /// Unable to construct proxy header value
    #[error("unable to construct proxy header value")]
    InvalidHeaderValue(#[from] InvalidHeaderValue),
    /// Received non-ASCII forwarding header
    #[error("received non-ASCII forwarding header")]
    InvalidHeaderInput(#[from] ToStrError),
    /// HTTP connection failed
    #[error("http connection failed")]
    ConnectionFailed(#[from] hyper::Error),
}

#[inline]
fn add_forwarded_for<B>(req: &mut Request<B>, ip: &IpAddr) -> Result<(), ForwardError> {
    match req.headers_mut().entry(X_FORWARDED_FOR.clone()) {
        Entry::Vacant(entry) => {
            entry.insert(ip.to_string().parse()?);
        }
        Entry::Occupied(mut entry) => {
            let existing_value = entry.get().to_str()?;
            let new_value = format!("{}, {}", existing_value, ip);

            entry.insert(new_value.parse()?);
        }
    }

    Ok(())
}

#[inline]
fn strip_hop_headers(headers: &mut HeaderMap<HeaderValue>) {
    HOP_HEADERS.iter().for_each(|key| {
        headers.remove(key);
    });
}

#[inline]
fn translate_request<B>(
    ip: IpAddr,
    mut req: Request<B>,
    target: Uri,
) -> Result<Request<B>, ForwardError> {
    *req.uri_mut() = target;

    strip_hop_headers(req.headers_mut());
    add_forwarded_for(&mut req, &ip)?;

    Ok(req)
}

/// Extracts the [`Uri`] from a request and replaces the authority with the provided value
///
/// Additionally, the scheme will be fixed to `http`. Path and query are kept as-is.
#[inline]
pub fn uri_with_authority<B>(req: &Request<B>, authority: &str) -> Result<Uri, hyper::http::Error> {
    let mut uri = Uri::builder().scheme("http").authority(authority);

    match req.uri().path_and_query() {
        Some(p_and_q) => uri = uri.path_and_query(p_and_q.clone()),
        None => uri = uri.path_and_query("/"),
    }

    uri.build()
}

/// Takes an incoming request and forwards it to a remote target
///
/// The client address is appended to the `X-Forwarded-For` header and hop-by-hop
/// headers are stripped in both directions.
#[inline]
pub async fn forward_request(
    client: &Client<HttpConnector>,
    req: Request<Body>,
    source_ip: IpAddr,
    target: Uri,
) -> Result<Response<Body>, ForwardError> {
    let upstream = target.authority().map(|a| a.to_string());
    let req = translate_request(source_ip, req, target)?;

    match client.request(req).await {
        Ok(mut res) => {
            strip_hop_headers(res.headers_mut());
            Ok(res)
        }
        Err(e) => {
            error!(
                upstream = %upstream.unwrap_or_default(),
                error = %e,
                "Failed to fulfill request"
            );

            Err(e.into())
        }
    }
}
