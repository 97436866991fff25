#![allow(clippy::unwrap_used)]
// Integration tests for bearer auth and refresh-on-401 using wiremock.

use std::time::Duration;

use chrono::{TimeDelta, Utc};
use futures_util::future::join_all;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use stocker_api::{AccessToken, ApiClient, Error, SessionCredentials};

// ── Helpers ─────────────────────────────────────────────────────────

const TOKEN_PATH: &str = "/api/method/gpos.gpos.pos.generate_token_secure";
const WAREHOUSES_PATH: &str = "/api/method/stocker.stocker.api.warehouse_list";

async fn setup_with(credentials: SessionCredentials) -> (MockServer, ApiClient) {
    let server = MockServer::start().await;
    let client = ApiClient::builder()
        .http_client(reqwest::Client::new())
        .base_url(Url::parse(&server.uri()).unwrap())
        .credentials(credentials)
        .build()
        .unwrap();
    (server, client)
}

async fn setup() -> (MockServer, ApiClient) {
    setup_with(SessionCredentials::new("key", "secret", "app")).await
}

fn token_body(token: &str) -> serde_json::Value {
    json!({ "data": { "access_token": token, "expires_in": 3600 } })
}

fn warehouses_body() -> serde_json::Value {
    json!({ "data": [{ "warehouse_id": "W1", "warehouse_name": "Main" }] })
}

fn store_token(client: &ApiClient, value: &str) {
    let expires = Utc::now() + TimeDelta::hours(1);
    client.tokens().set(Some(AccessToken::new(value, expires)));
}

// ── Bearer header ───────────────────────────────────────────────────

#[tokio::test]
async fn test_stored_token_is_sent_as_bearer() {
    let (server, client) = setup().await;
    store_token(&client, "tok-1");

    Mock::given(method("GET"))
        .and(path(WAREHOUSES_PATH))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(warehouses_body()))
        .expect(1)
        .mount(&server)
        .await;

    let warehouses = client.list_warehouses().await.unwrap();
    assert_eq!(warehouses.len(), 1);
}

#[tokio::test]
async fn test_request_without_base_url_never_hits_network() {
    let client = ApiClient::builder()
        .http_client(reqwest::Client::new())
        .credentials(SessionCredentials::new("key", "secret", "app"))
        .build()
        .unwrap();

    let result = client.list_warehouses().await;
    assert!(
        matches!(result, Err(Error::MissingBaseUrl)),
        "expected MissingBaseUrl, got: {result:?}"
    );
}

// ── Refresh on 401 ──────────────────────────────────────────────────

#[tokio::test]
async fn test_401_refreshes_and_retries_once() {
    let (server, client) = setup().await;
    store_token(&client, "stale");

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("api_key=key"))
        .and(body_string_contains("api_secret=secret"))
        .and(body_string_contains("app_key=app"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("fresh")))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(WAREHOUSES_PATH))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(warehouses_body()))
        .expect(1)
        .with_priority(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(WAREHOUSES_PATH))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .with_priority(5)
        .mount(&server)
        .await;

    let warehouses = client.list_warehouses().await.unwrap();
    assert_eq!(warehouses[0].warehouse_id, "W1");
    assert_eq!(client.tokens().get().unwrap().expose(), "fresh");
    assert!(!client.refresher().is_refreshing().await);
}

#[tokio::test]
async fn test_late_401_reuses_token_refreshed_meanwhile() {
    let (server, client) = setup().await;
    store_token(&client, "stale");

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("other")))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(WAREHOUSES_PATH))
        .and(header("authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(401).set_delay(Duration::from_millis(300)))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(WAREHOUSES_PATH))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(warehouses_body()))
        .expect(1)
        .mount(&server)
        .await;

    let (result, ()) = tokio::join!(client.list_warehouses(), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        store_token(&client, "fresh");
    });

    assert_eq!(result.unwrap()[0].warehouse_id, "W1");
    assert_eq!(client.tokens().get().unwrap().expose(), "fresh");
}

#[tokio::test]
async fn test_second_401_is_not_retried() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("fresh")))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(WAREHOUSES_PATH))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "Session expired" })),
        )
        .expect(2)
        .mount(&server)
        .await;

    let result = client.list_warehouses().await;
    match result {
        Err(Error::Unauthorized { message }) => assert_eq!(message, "Session expired"),
        other => panic!("expected Unauthorized, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_token_endpoint_401_does_not_loop() {
    let (server, client) = setup().await;
    store_token(&client, "stale");

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(WAREHOUSES_PATH))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let result = client.list_warehouses().await;
    assert!(
        matches!(result, Err(Error::Unauthorized { .. })),
        "expected Unauthorized, got: {result:?}"
    );
    assert!(client.tokens().get().is_none(), "failed refresh clears the store");
}

#[tokio::test]
async fn test_missing_credentials_skip_token_request() {
    let credentials = SessionCredentials {
        api_secret: None,
        ..SessionCredentials::new("key", "secret", "app")
    };
    let (server, client) = setup_with(credentials).await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("never")))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(WAREHOUSES_PATH))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let generated = client.refresher().generator().generate().await.unwrap();
    assert!(generated.is_none());

    let result = client.list_warehouses().await;
    assert!(matches!(result, Err(Error::Unauthorized { .. })));
}

#[tokio::test]
async fn test_malformed_token_response_yields_no_token() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": {} })))
        .expect(1)
        .mount(&server)
        .await;

    match client.refresher().refresh().await {
        Err(e) => assert!(matches!(*e, Error::TokenUnavailable), "got: {e:?}"),
        Ok(token) => panic!("expected no token, got: {token:?}"),
    }
}

#[tokio::test]
async fn test_ensure_token_reuses_valid_token() {
    let (server, client) = setup().await;
    store_token(&client, "still-good");

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("fresh")))
        .expect(0)
        .mount(&server)
        .await;

    let token = client.refresher().ensure_token().await.unwrap();
    assert_eq!(token.expose(), "still-good");
}

// ── Single flight ───────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_401s_share_one_refresh() {
    let (server, client) = setup().await;
    store_token(&client, "stale");

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(token_body("fresh"))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(WAREHOUSES_PATH))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(warehouses_body()))
        .expect(8)
        .with_priority(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(WAREHOUSES_PATH))
        .respond_with(ResponseTemplate::new(401))
        .expect(8)
        .with_priority(5)
        .mount(&server)
        .await;

    let calls = (0..8).map(|_| {
        let client = client.clone();
        async move { client.list_warehouses().await }
    });
    let results = join_all(calls).await;

    assert!(results.iter().all(Result::is_ok), "results: {results:?}");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_401s_fail_together() {
    let (server, client) = setup().await;
    store_token(&client, "stale");

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(500).set_delay(Duration::from_millis(300)))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(WAREHOUSES_PATH))
        .respond_with(ResponseTemplate::new(401))
        .expect(4)
        .mount(&server)
        .await;

    let calls = (0..4).map(|_| {
        let client = client.clone();
        async move { client.list_warehouses().await }
    });
    let results = join_all(calls).await;

    assert!(
        results
            .iter()
            .all(|r| matches!(r, Err(Error::Unauthorized { .. }))),
        "results: {results:?}"
    );
    assert!(client.tokens().get().is_none());
}
