//! HTTP surface tests: /metrics exposition, /ping liveness, and graceful
//! shutdown, over a real ephemeral-port listener.

use std::net::SocketAddr;

use prometheus::Registry;
use sequencer_exporter::metrics::ExporterMetrics;
use sequencer_exporter::server;
use tokio_util::sync::CancellationToken;

fn localhost() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 0))
}

#[tokio::test]
async fn test_ping_returns_pong() {
    let cancel = CancellationToken::new();
    let (addr, serve) = server::bind(localhost(), Registry::new(), cancel.clone()).unwrap();
    let handle = tokio::spawn(serve);

    let response = reqwest::get(format!("http://{}/ping", addr)).await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "pong\n");

    cancel.cancel();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_metrics_exposition_carries_registered_series() {
    let registry = Registry::new();
    let metrics = ExporterMetrics::register(&registry).unwrap();
    metrics
        .heights
        .with_label_values(&["l2geth", "seq0"])
        .inc_by(42);
    metrics
        .wallet_balance
        .with_label_values(&["l2", "0x1000000000000000000000000000000000000001", "ops"])
        .set(1.5);
    metrics
        .failures
        .with_label_values(&["seq-seq0-l2geth"])
        .inc();

    let cancel = CancellationToken::new();
    let (addr, serve) = server::bind(localhost(), registry, cancel.clone()).unwrap();
    let handle = tokio::spawn(serve);

    let response = reqwest::get(format!("http://{}/metrics", addr)).await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(
        response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok()),
        Some("text/plain; version=0.0.4")
    );

    let body = response.text().await.unwrap();
    assert!(body.contains("sequencer:height{seq_name=\"seq0\",svc_name=\"l2geth\"} 42"));
    assert!(body.contains("sequencer:wallet:balance{"));
    assert!(body.contains("alias=\"ops\""));
    assert!(body.contains("sequencer_exporter_failures{svc_name=\"seq-seq0-l2geth\"} 1"));

    cancel.cancel();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let cancel = CancellationToken::new();
    let (addr, serve) = server::bind(localhost(), Registry::new(), cancel.clone()).unwrap();
    let handle = tokio::spawn(serve);

    let response = reqwest::get(format!("http://{}/other", addr)).await.unwrap();
    assert_eq!(response.status(), 404);

    cancel.cancel();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_server_shuts_down_on_cancellation() {
    let cancel = CancellationToken::new();
    let (addr, serve) = server::bind(localhost(), Registry::new(), cancel.clone()).unwrap();
    let handle = tokio::spawn(serve);

    // Reachable before, gone after.
    reqwest::get(format!("http://{}/ping", addr)).await.unwrap();
    cancel.cancel();
    tokio::time::timeout(std::time::Duration::from_secs(2), handle)
        .await
        .unwrap()
        .unwrap()
        .unwrap();

    assert!(reqwest::get(format!("http://{}/ping", addr)).await.is_err());
}
