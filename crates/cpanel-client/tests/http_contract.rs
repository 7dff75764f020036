//! Contract Test: HTTP Transport
//!
//! Runs the client against a local mock server.
//!
//! Constraints verified:
//! - Each dialect is requested at its own path with its own query shape
//! - Credentials travel only in the Authorization header
//! - Envelope failures and HTTP status codes map to the right error kinds
//! - Error statuses keep cPanel's own reason when the body carries an envelope
//! - The API token never appears in an error message

use cpanel_client::{AUTHENTICATION_FAILED, CpanelClient};
use cpanel_core::api::ApiCall;
use cpanel_core::config::ConnectionConfig;
use cpanel_core::error::Error;
use cpanel_core::traits::CpanelApi;
use serde_json::json;
use tokio_test::assert_ok;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "S3CR3TT0K3N";

fn client(server: &MockServer) -> CpanelClient {
    CpanelClient::new(ConnectionConfig::new("cpanel.example.com", "alice", TOKEN))
        .unwrap()
        .with_base_url(server.uri())
}

#[tokio::test]
async fn uapi_success_returns_data() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/execute/SubDomain/addsubdomain"))
        .and(query_param("domain", "www"))
        .and(query_param("rootdomain", "example.com"))
        .and(header("Authorization", format!("cpanel alice:{TOKEN}").as_str()))
        .and(header("Accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": 1,
            "data": {"created": true},
            "errors": null,
            "messages": ["ok"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let data = client(&server)
        .submit(
            &ApiCall::uapi("SubDomain", "addsubdomain")
                .param("domain", "www")
                .param("rootdomain", "example.com"),
        )
        .await
        .unwrap();

    assert_eq!(data, json!({"created": true}));
}

#[tokio::test]
async fn uapi_failure_carries_first_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/execute/SubDomain/addsubdomain"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": 0,
            "data": null,
            "errors": ["The subdomain already exists."]
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .submit(&ApiCall::uapi("SubDomain", "addsubdomain"))
        .await
        .unwrap_err();

    match err {
        Error::ApiRejected { call, reason } => {
            assert_eq!(call, "SubDomain::addsubdomain");
            assert_eq!(reason, "The subdomain already exists.");
        }
        other => panic!("expected ApiRejected, got {other:?}"),
    }
}

#[tokio::test]
async fn api2_sends_reserved_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json-api/cpanel"))
        .and(query_param("cpanel_jsonapi_user", "alice"))
        .and(query_param("cpanel_jsonapi_apiversion", "2"))
        .and(query_param("cpanel_jsonapi_module", "ZoneEdit"))
        .and(query_param("cpanel_jsonapi_func", "fetchzone_records"))
        .and(query_param("domain", "example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "cpanelresult": {
                "event": {"result": 1},
                "data": [{"line": 7, "name": "www.example.com.", "type": "A", "address": "192.0.2.10"}]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let data = client(&server)
        .submit(&ApiCall::api2("ZoneEdit", "fetchzone_records").param("domain", "example.com"))
        .await
        .unwrap();

    assert_eq!(data[0]["line"], 7);
}

#[tokio::test]
async fn api2_failure_uses_event_reason() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json-api/cpanel"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "cpanelresult": {
                "event": {"result": 0, "reason": "Invalid zone"},
                "data": null
            }
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .submit(&ApiCall::api2("ZoneEdit", "remove_zone_record"))
        .await
        .unwrap_err();

    match err {
        Error::ApiRejected { reason, .. } => assert_eq!(reason, "Invalid zone"),
        other => panic!("expected ApiRejected, got {other:?}"),
    }
}

#[tokio::test]
async fn unauthorized_is_rejected_without_leaking_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403).set_body_string(format!("bad token {TOKEN}")))
        .mount(&server)
        .await;

    let err = client(&server).verify().await.unwrap_err();

    match &err {
        Error::ApiRejected { call, reason } => {
            assert_eq!(call, "DomainInfo::list_domains");
            assert_eq!(reason, AUTHENTICATION_FAILED);
        }
        other => panic!("expected ApiRejected, got {other:?}"),
    }
    assert!(!err.to_string().contains(TOKEN));
    assert!(!format!("{err:?}").contains(TOKEN));
}

#[tokio::test]
async fn server_error_without_envelope_is_malformed_with_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = client(&server)
        .submit(&ApiCall::uapi("DomainInfo", "list_domains"))
        .await
        .unwrap_err();

    match err {
        Error::MalformedResponse(detail) => assert!(detail.starts_with("HTTP 500"), "{detail}"),
        other => panic!("expected MalformedResponse, got {other:?}"),
    }
}

#[tokio::test]
async fn server_error_keeps_uapi_reason() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/execute/ZoneEdit/lock"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "status": 0,
            "errors": ["Zone is locked"],
            "data": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server)
        .submit(&ApiCall::uapi("ZoneEdit", "lock"))
        .await
        .unwrap_err();

    match err {
        Error::ApiRejected { call, reason } => {
            assert_eq!(call, "ZoneEdit::lock");
            assert_eq!(reason, "Zone is locked");
        }
        other => panic!("expected ApiRejected, got {other:?}"),
    }
}

#[tokio::test]
async fn proxy_html_error_page_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json-api/cpanel"))
        .respond_with(
            ResponseTemplate::new(502).set_body_string("<html><body>Bad Gateway</body></html>"),
        )
        .mount(&server)
        .await;

    let err = client(&server)
        .submit(&ApiCall::api2("ZoneEdit", "fetchzone_records").param("domain", "example.com"))
        .await
        .unwrap_err();

    match err {
        Error::MalformedResponse(detail) => assert!(detail.starts_with("HTTP 502"), "{detail}"),
        other => panic!("expected MalformedResponse, got {other:?}"),
    }
}

#[tokio::test]
async fn successful_envelope_on_error_status_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "status": 1,
            "data": []
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .submit(&ApiCall::uapi("DomainInfo", "list_domains"))
        .await
        .unwrap_err();

    match err {
        Error::ApiRejected { reason, .. } => assert_eq!(reason, "HTTP 503"),
        other => panic!("expected ApiRejected, got {other:?}"),
    }
}

#[tokio::test]
async fn non_json_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&server)
        .await;

    let err = client(&server)
        .submit(&ApiCall::uapi("DomainInfo", "list_domains"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::MalformedResponse(_)));
}

#[tokio::test]
async fn verify_succeeds_with_harmless_read() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/execute/DomainInfo/list_domains"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": 1,
            "data": {"main_domain": "example.com", "addon_domains": [], "parked_domains": [], "sub_domains": []}
        })))
        .expect(1)
        .mount(&server)
        .await;

    assert_ok!(client(&server).verify().await);
}

#[tokio::test]
async fn unreachable_host_is_transport_error() {
    // Bind and drop a listener so the port is known to be closed
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let client = CpanelClient::new(
        ConnectionConfig::new("127.0.0.1", "alice", TOKEN).with_timeout_secs(2),
    )
    .unwrap()
    .with_base_url(format!("http://127.0.0.1:{port}"));

    let err = client
        .submit(&ApiCall::uapi("DomainInfo", "list_domains"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Transport(_)));
    assert!(!err.to_string().contains(TOKEN));
}

#[tokio::test]
async fn reserved_parameter_collision_never_reaches_the_wire() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = client(&server)
        .submit(&ApiCall::api2("ZoneEdit", "fetchzone_records").param("cpanel_jsonapi_user", "mallory"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::InvalidInput(_)));
}
