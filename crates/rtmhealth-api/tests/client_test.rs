#![allow(clippy::unwrap_used)]
// Integration tests for `ControllerClient` using wiremock.

use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use rtmhealth_api::{ControllerClient, Error, FlowQuery, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

const TENANT: &str = "1234567890";

async fn setup() -> (MockServer, ControllerClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let token = SecretString::from("test-token".to_string());
    let client = ControllerClient::new(base_url, &token, &TransportConfig::default()).unwrap();
    (server, client)
}

async fn mount_profile(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v2.1/api/profile"))
        .and(header("x-auth-token", "test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tenant_id": TENANT,
            "email": "noc@example.com"
        })))
        .mount(server)
        .await;
}

async fn authenticated() -> (MockServer, ControllerClient) {
    let (server, mut client) = setup().await;
    mount_profile(&server).await;
    client.authenticate().await.unwrap();
    (server, client)
}

fn tenant_path(suffix: &str) -> String {
    format!("/api/tenants/{TENANT}/{suffix}")
}

// ── Authentication tests ────────────────────────────────────────────

#[tokio::test]
async fn test_authenticate_records_tenant() {
    let (server, mut client) = setup().await;
    mount_profile(&server).await;

    let session = client.authenticate().await.unwrap();

    assert_eq!(session.tenant_id, TENANT);
    assert_eq!(session.email.as_deref(), Some("noc@example.com"));
    assert_eq!(client.tenant_id(), Some(TENANT));
}

#[tokio::test]
async fn test_authenticate_rejected_token() {
    let (server, mut client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v2.1/api/profile"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid token"))
        .mount(&server)
        .await;

    let result = client.authenticate().await;

    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
    assert!(client.tenant_id().is_none());
}

#[tokio::test]
async fn test_authenticate_profile_without_tenant() {
    let (server, mut client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v2.1/api/profile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "email": "x@y.z" })))
        .mount(&server)
        .await;

    let result = client.authenticate().await;

    match result {
        Err(Error::Authentication { ref message }) => {
            assert!(message.contains("tenant"), "unexpected message: {message}");
        }
        other => panic!("expected Authentication error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_tenant_call_before_authenticate() {
    let (_server, client) = setup().await;

    let result = client.list_sites().await;

    assert!(matches!(result, Err(Error::NotAuthenticated)));
}

// ── Directory tests ─────────────────────────────────────────────────

#[tokio::test]
async fn test_list_sites() {
    let (server, client) = authenticated().await;

    Mock::given(method("GET"))
        .and(path(format!("/v4.7{}", tenant_path("sites"))))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                { "id": "15000001", "name": "Branch-NYC", "admin_state": "active" },
                { "id": "15000002", "name": "DC-East" }
            ]
        })))
        .mount(&server)
        .await;

    let sites = client.list_sites().await.unwrap();

    assert_eq!(sites.len(), 2);
    assert_eq!(sites[0].id, "15000001");
    assert_eq!(sites[0].name.as_deref(), Some("Branch-NYC"));
    assert_eq!(sites[1].name.as_deref(), Some("DC-East"));
}

#[tokio::test]
async fn test_list_appdefs() {
    let (server, client) = authenticated().await;

    Mock::given(method("GET"))
        .and(path(format!("/v2.3{}", tenant_path("appdefs"))))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                { "id": "app-rtp", "display_name": "rtp", "category": "media" }
            ]
        })))
        .mount(&server)
        .await;

    let apps = client.list_appdefs().await.unwrap();

    assert_eq!(apps.len(), 1);
    assert_eq!(apps[0].display_name.as_deref(), Some("rtp"));
}

// ── Flow monitor tests ──────────────────────────────────────────────

#[tokio::test]
async fn test_query_flows_sends_filter_and_parses_items() {
    let (server, client) = authenticated().await;
    let query = FlowQuery::new("2024-06-15T10:00:00.000Z", "15000001", "app-rtp");

    Mock::given(method("POST"))
        .and(path(format!("/v3.6{}", tenant_path("monitor/flows"))))
        .and(body_json(json!({
            "end_time": "2024-06-15T10:00:00.000Z",
            "filter": { "site": ["15000001"], "app": ["app-rtp"] },
            "debug_level": "all"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "flows": {
                "items": [{
                    "source_ip": "10.0.0.5",
                    "source_port": 16384,
                    "destination_ip": "192.0.2.10",
                    "destination_port": 3478,
                    "flow_start_time_ms": 1_718_445_600_000_i64,
                    "flow_end_time_ms": 1_718_445_660_000_i64,
                    "max_packet_loss_s2c": null,
                    "max_packet_loss_c2s": 5.0,
                    "media_type": "audio",
                    "lan_to_wan": true
                }]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let page = client.query_flows(&query).await.unwrap();

    // No embedded status: falls back to HTTP 200.
    assert_eq!(page.status_code, Some(200));
    assert!(page.is_ok());
    assert_eq!(page.flows.items.len(), 1);
    let flow = &page.flows.items[0];
    assert_eq!(flow.max_packet_loss_s2c, None);
    assert_eq!(flow.max_packet_loss_c2s, Some(5.0));
    assert_eq!(flow.duration_ms(), Some(60_000));
}

#[tokio::test]
async fn test_query_flows_keeps_embedded_status() {
    let (server, client) = authenticated().await;

    Mock::given(method("POST"))
        .and(path(format!("/v3.6{}", tenant_path("monitor/flows"))))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_status_code": 206,
            "flows": { "items": [] }
        })))
        .mount(&server)
        .await;

    let page = client
        .query_flows(&FlowQuery::new("2024-06-15T10:00:00.000Z", "s", "a"))
        .await
        .unwrap();

    assert_eq!(page.status_code, Some(206));
    assert!(!page.is_ok());
}

#[tokio::test]
async fn test_query_flows_no_content_is_empty_page() {
    let (server, client) = authenticated().await;

    Mock::given(method("POST"))
        .and(path(format!("/v3.6{}", tenant_path("monitor/flows"))))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let page = client
        .query_flows(&FlowQuery::new("2024-06-15T10:00:00.000Z", "s", "a"))
        .await
        .unwrap();

    assert_eq!(page.status_code, Some(204));
    assert!(page.flows.items.is_empty());
    assert!(!page.is_ok());
}

#[tokio::test]
async fn test_query_flows_server_error_carries_payload() {
    let (server, client) = authenticated().await;

    Mock::given(method("POST"))
        .and(path(format!("/v3.6{}", tenant_path("monitor/flows"))))
        .respond_with(
            ResponseTemplate::new(500).set_body_string(r#"{"_error":[{"code":"FLOW_QUERY"}]}"#),
        )
        .mount(&server)
        .await;

    let result = client
        .query_flows(&FlowQuery::new("2024-06-15T10:00:00.000Z", "s", "a"))
        .await;

    let err = result.unwrap_err();
    assert!(
        matches!(err, Error::Api { status: 500, .. }),
        "expected Api error, got: {err:?}"
    );
    assert!(err.raw_payload().unwrap().contains("FLOW_QUERY"));
}

#[tokio::test]
async fn test_query_flows_malformed_body() {
    let (server, client) = authenticated().await;

    Mock::given(method("POST"))
        .and(path(format!("/v3.6{}", tenant_path("monitor/flows"))))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let result = client
        .query_flows(&FlowQuery::new("2024-06-15T10:00:00.000Z", "s", "a"))
        .await;

    assert!(
        matches!(result, Err(Error::Deserialization { .. })),
        "expected Deserialization error, got: {result:?}"
    );
}
