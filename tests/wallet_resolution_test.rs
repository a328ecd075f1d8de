//! Startup wallet-set resolution: merging protocol custody addresses into the
//! user-configured wallet map.

use std::collections::HashMap;

use sequencer_exporter::clients::PosClient;
use sequencer_exporter::config::Address;
use sequencer_exporter::custody::{resolve_wallets, CustodyVariant};
use sequencer_exporter::error::ExporterError;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn custody_body(ordinal: u8, address: &str) -> serde_json::Value {
    serde_json::json!({
        "height": "4677131",
        "result": {
            "mpc_id": ordinal.to_string(),
            "threshold": 2,
            "mpc_address": address,
            "mpc_type": ordinal
        }
    })
}

fn not_found_body() -> serde_json::Value {
    serde_json::json!({ "code": 404, "error": "no address registered for type" })
}

async fn mount_custody(server: &MockServer, ordinal: u8, address: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/mpc/latest/{}", ordinal)))
        .respond_with(ResponseTemplate::new(200).set_body_json(custody_body(ordinal, address)))
        .mount(server)
        .await;
}

fn user_wallets() -> HashMap<String, Address> {
    let mut wallets = HashMap::new();
    wallets.insert(
        "ops".to_string(),
        "0x48120daed4f33ad803b19e4e237c4180a4043045"
            .parse()
            .unwrap(),
    );
    wallets
}

#[tokio::test]
async fn test_all_variants_merge_into_user_set() {
    let server = MockServer::start().await;
    mount_custody(&server, 0, "0x1000000000000000000000000000000000000000").await;
    mount_custody(&server, 1, "0x1000000000000000000000000000000000000001").await;
    mount_custody(&server, 2, "0x1000000000000000000000000000000000000002").await;
    mount_custody(&server, 3, "0x1000000000000000000000000000000000000003").await;

    let pos = PosClient::new(&server.uri()).unwrap();
    let wallets = resolve_wallets(Some(&pos), &user_wallets()).await.unwrap();

    assert_eq!(wallets.len(), 5);
    assert!(wallets.contains_key("ops"));
    for variant in CustodyVariant::ALL {
        let expected: Address = format!(
            "0x100000000000000000000000000000000000000{}",
            variant.ordinal()
        )
        .parse()
        .unwrap();
        assert_eq!(wallets[variant.alias()], expected);
    }
}

#[tokio::test]
async fn test_optional_variant_absence_is_skipped() {
    let server = MockServer::start().await;
    mount_custody(&server, 0, "0x1000000000000000000000000000000000000000").await;
    mount_custody(&server, 1, "0x1000000000000000000000000000000000000001").await;
    mount_custody(&server, 2, "0x1000000000000000000000000000000000000002").await;
    Mock::given(method("GET"))
        .and(path("/mpc/latest/3"))
        .respond_with(ResponseTemplate::new(404).set_body_json(not_found_body()))
        .mount(&server)
        .await;

    let pos = PosClient::new(&server.uri()).unwrap();
    let wallets = resolve_wallets(Some(&pos), &user_wallets()).await.unwrap();

    assert_eq!(wallets.len(), 4);
    assert!(!wallets.contains_key(CustodyVariant::BlobSubmit.alias()));
}

#[tokio::test]
async fn test_required_variant_failure_is_fatal() {
    let server = MockServer::start().await;
    mount_custody(&server, 0, "0x1000000000000000000000000000000000000000").await;
    Mock::given(method("GET"))
        .and(path("/mpc/latest/1"))
        .respond_with(ResponseTemplate::new(404).set_body_json(not_found_body()))
        .mount(&server)
        .await;

    let pos = PosClient::new(&server.uri()).unwrap();
    match resolve_wallets(Some(&pos), &user_wallets()).await.unwrap_err() {
        ExporterError::CustodyResolution { variant, .. } => {
            assert_eq!(variant, CustodyVariant::StateSubmit.alias());
        }
        e => panic!("expected CustodyResolution error, got {:?}", e),
    }
}

#[tokio::test]
async fn test_user_alias_colliding_with_variant_is_fatal() {
    let server = MockServer::start().await;

    let mut wallets = user_wallets();
    wallets.insert(
        "mpc-common".to_string(),
        "0x2000000000000000000000000000000000000000"
            .parse()
            .unwrap(),
    );

    let pos = PosClient::new(&server.uri()).unwrap();
    match resolve_wallets(Some(&pos), &wallets).await.unwrap_err() {
        ExporterError::DuplicateWalletAlias { alias } => assert_eq!(alias, "mpc-common"),
        e => panic!("expected DuplicateWalletAlias error, got {:?}", e),
    }

    // The collision is caught before any resolution request is made.
    assert!(server.received_requests().await.unwrap().is_empty());
}
