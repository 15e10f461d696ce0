//! SendGrid client behavior against a mock HTTP server.

use std::time::Duration;

use sendgrid_provider::client::api_keys::ApiKeyRequest;
use sendgrid_provider::client::settings::EnforcedTls;
use sendgrid_provider::{retry_on_rate_limit, ApiError, RetryError, RetryPolicy, SendgridClient};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_json, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer, subuser: Option<&str>) -> SendgridClient {
    SendgridClient::new("SG.test", subuser.map(str::to_string), Some(&server.uri())).unwrap()
}

fn request() -> ApiKeyRequest {
    ApiKeyRequest {
        name: "ci".to_string(),
        scopes: Some(vec!["mail.send".to_string()]),
    }
}

fn policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::new(max_attempts).with_backoff(Duration::from_millis(50), Duration::from_millis(100))
}

fn key_body() -> serde_json::Value {
    json!({
        "api_key_id": "key-1",
        "name": "ci",
        "scopes": ["mail.send", "sender_verification_eligible"],
        "api_key": "SG.secret"
    })
}

#[tokio::test]
async fn test_sends_bearer_token_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api_keys"))
        .and(header("authorization", "Bearer SG.test"))
        .and(body_json(json!({"name": "ci", "scopes": ["mail.send"]})))
        .respond_with(ResponseTemplate::new(201).set_body_json(key_body()))
        .expect(1)
        .mount(&server)
        .await;

    let key = client(&server, None).create_api_key(&request()).await.unwrap();

    assert_eq!(key.api_key_id, "key-1");
    assert_eq!(key.api_key.as_deref(), Some("SG.secret"));
}

#[tokio::test]
async fn test_on_behalf_of_subuser() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/settings/enforced_tls"))
        .and(header("on-behalf-of", "marketing"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"require_tls": true, "require_valid_cert": false})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let settings = client(&server, Some("marketing"))
        .get_enforced_tls()
        .await
        .unwrap();

    assert_eq!(
        settings,
        EnforcedTls {
            require_tls: true,
            require_valid_cert: false
        }
    );
}

#[tokio::test]
async fn test_no_subuser_header_by_default() {
    let server = MockServer::start().await;
    Mock::given(header_exists("on-behalf-of"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api_keys/key-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(key_body()))
        .mount(&server)
        .await;

    let key = client(&server, None).get_api_key("key-1").await.unwrap();
    assert_eq!(key.name, "ci");
}

#[tokio::test]
async fn test_rate_limit_reset_header_becomes_hint() {
    let server = MockServer::start().await;
    let reset_at = chrono::Utc::now().timestamp() + 30;
    Mock::given(method("GET"))
        .and(path("/api_keys/key-1"))
        .respond_with(
            ResponseTemplate::new(429).insert_header("X-RateLimit-Reset", reset_at.to_string().as_str()),
        )
        .mount(&server)
        .await;

    let err = client(&server, None).get_api_key("key-1").await.unwrap_err();

    match err {
        ApiError::RateLimited {
            reset_after: Some(wait),
        } => {
            assert!(wait <= Duration::from_secs(30), "{:?}", wait);
            assert!(wait >= Duration::from_secs(28), "{:?}", wait);
        }
        other => panic!("expected rate limit, got {:?}", other),
    }
}

#[tokio::test]
async fn test_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api_keys/missing"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({"errors": [{"field": null, "message": "unable to find API Key"}]})),
        )
        .mount(&server)
        .await;

    let err = client(&server, None).get_api_key("missing").await.unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "not found: unable to find API Key");
}

#[tokio::test]
async fn test_error_body_is_parsed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api_keys"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "errors": [
                {"field": "name", "message": "is required"},
                {"field": "scopes", "message": "invalid scope"}
            ]
        })))
        .mount(&server)
        .await;

    let err = client(&server, None).create_api_key(&request()).await.unwrap_err();

    match err {
        ApiError::Status { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "name: is required; scopes: invalid scope");
        }
        other => panic!("expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_retries_through_rate_limit() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api_keys"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api_keys"))
        .respond_with(ResponseTemplate::new(201).set_body_json(key_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, None);
    let request = request();
    let key = retry_on_rate_limit(&policy(5), &CancellationToken::new(), || {
        client.create_api_key(&request)
    })
    .await
    .unwrap();

    assert_eq!(key.api_key_id, "key-1");
}

#[tokio::test]
async fn test_gives_up_after_max_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api_keys/key-1"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .expect(3)
        .mount(&server)
        .await;

    let client = client(&server, None);
    let err = retry_on_rate_limit(&policy(3), &CancellationToken::new(), || {
        client.delete_api_key("key-1")
    })
    .await
    .unwrap_err();

    assert!(err.is_exhausted());
    assert!(matches!(err, RetryError::Exhausted { attempts: 3, .. }));
}

#[tokio::test]
async fn test_stale_reset_header_still_backs_off() {
    let server = MockServer::start().await;
    let reset_at = chrono::Utc::now().timestamp() - 5;
    Mock::given(method("GET"))
        .and(path("/api_keys/key-1"))
        .respond_with(
            ResponseTemplate::new(429).insert_header("X-RateLimit-Reset", reset_at.to_string().as_str()),
        )
        .expect(3)
        .mount(&server)
        .await;

    let client = client(&server, None);
    let policy = policy(3);
    let started = std::time::Instant::now();
    let err = retry_on_rate_limit(&policy, &CancellationToken::new(), || client.get_api_key("key-1"))
        .await
        .unwrap_err();

    assert!(err.is_exhausted());
    // 50ms then 100ms of fallback backoff.
    assert!(started.elapsed() >= policy.initial_backoff * 3, "{:?}", started.elapsed());
}

#[tokio::test]
async fn test_non_rate_limit_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api_keys/key-1"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, None);
    let err = retry_on_rate_limit(&policy(3), &CancellationToken::new(), || {
        client.delete_api_key("key-1")
    })
    .await
    .unwrap_err();

    assert_eq!(err.operation_error().and_then(ApiError::status), Some(403));
}

fn teammate(n: usize) -> serde_json::Value {
    json!({
        "username": format!("user{}", n),
        "email": format!("user{}@example.com", n),
        "user_type": "teammate"
    })
}

#[tokio::test]
async fn test_list_teammates_follows_offset() {
    let server = MockServer::start().await;
    let first: Vec<_> = (0..500).map(teammate).collect();
    Mock::given(method("GET"))
        .and(path("/teammates"))
        .and(query_param("limit", "500"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": first})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/teammates"))
        .and(query_param("offset", "500"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"result": [teammate(500), teammate(501)]})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/teammates/user501"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "username": "user501",
            "email": "user501@example.com",
            "is_admin": false,
            "scopes": ["mail.send"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, None);
    assert_eq!(client.list_teammates().await.unwrap().len(), 502);

    let found = client.find_teammate_by_email("USER501@example.com").await.unwrap();
    assert_eq!(found.username, "user501");
    assert_eq!(found.scopes, vec!["mail.send"]);
}

#[tokio::test]
async fn test_list_teammates_single_short_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/teammates"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": [teammate(1)]})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, None);
    let err = client.find_teammate_by_email("nobody@example.com").await.unwrap_err();
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn test_path_parameters_are_encoded() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/teammates/jane%2Fdoe"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/user/webhooks/parse/settings/in%20bound.example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "hostname": "in bound.example.com",
            "url": "https://example.com/parse"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, None);
    client.delete_teammate("jane/doe").await.unwrap();
    let webhook = client.get_parse_webhook("in bound.example.com").await.unwrap();
    assert_eq!(webhook.hostname, "in bound.example.com");
}
