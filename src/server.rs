//! HTTP surface: metrics exposition and liveness
//!
//! Serves the registry in the Prometheus text format on `/metrics` and a
//! fixed `pong` on `/ping`. The server shuts down gracefully when the root
//! cancellation token fires.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;

use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, Server, StatusCode};
use prometheus::{Encoder, Registry, TextEncoder};
use tokio_util::sync::CancellationToken;
use tracing::error;

use crate::Result;

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Binds the listen socket and returns the bound address together with the
/// serving future. The future resolves once the token is cancelled and
/// in-flight connections have drained.
pub fn bind(
    addr: SocketAddr,
    registry: Registry,
    cancel: CancellationToken,
) -> Result<(SocketAddr, impl Future<Output = Result<()>>)> {
    let make_svc = make_service_fn(move |_conn| {
        let registry = registry.clone();
        async move {
            Ok::<_, Infallible>(service_fn(move |req| {
                let registry = registry.clone();
                async move { handle(req, registry) }
            }))
        }
    });

    let server = Server::try_bind(&addr)?.serve(make_svc);
    let local_addr = server.local_addr();
    let graceful = server.with_graceful_shutdown(async move { cancel.cancelled().await });
    Ok((local_addr, async move {
        graceful.await?;
        Ok(())
    }))
}

fn handle(req: Request<Body>, registry: Registry) -> std::result::Result<Response<Body>, Infallible> {
    let response = match (req.method(), req.uri().path()) {
        (&Method::GET, "/metrics") => encode_metrics(&registry),
        (&Method::GET, "/ping") => Response::new(Body::from("pong\n")),
        _ => {
            let mut not_found = Response::new(Body::empty());
            *not_found.status_mut() = StatusCode::NOT_FOUND;
            not_found
        }
    };
    Ok(response)
}

fn encode_metrics(registry: &Registry) -> Response<Body> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&registry.gather(), &mut buffer) {
        error!("metrics encoding failed: {}", err);
        let mut response = Response::new(Body::from(err.to_string()));
        *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        return response;
    }

    let mut response = Response::new(Body::from(buffer));
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static(PROMETHEUS_CONTENT_TYPE),
    );
    response
}
