//! Provider lifecycle against a mock SendGrid API.

use sendgrid_provider::testing::{
    assert_error_contains, assert_gone, assert_plan_changes_attribute, assert_plan_has_changes,
    assert_plan_no_changes, ProviderTester,
};
use sendgrid_provider::{ProviderError, SendgridProvider};
use serde_json::{json, Value};
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn configured(server: &MockServer) -> ProviderTester<SendgridProvider> {
    let tester = ProviderTester::new(SendgridProvider::with_env(|_| None));
    assert_ok!(
        tester
            .configure(json!({
                "api_key": "SG.test",
                "base_url": server.uri(),
                "max_retry_attempts": 2,
            }))
            .await
    );
    tester
}

fn key(name: &str, secret: Option<&str>) -> Value {
    let mut body = json!({
        "api_key_id": "key-1",
        "name": name,
        "scopes": ["mail.send", "sender_verification_eligible"],
    });
    if let Some(secret) = secret {
        body["api_key"] = json!(secret);
    }
    body
}

#[tokio::test]
async fn test_configure_requires_api_key() {
    let tester = ProviderTester::new(SendgridProvider::with_env(|_| None));

    let err = assert_err!(tester.configure(json!({})).await);
    assert_error_contains(err.diagnostics(), "Missing SendGrid API key");

    let err = assert_err!(
        tester
            .configure(json!({"api_key": "SG.test", "max_retry_attempts": 0}))
            .await
    );
    assert_error_contains(err.diagnostics(), "max_retry_attempts");
}

#[tokio::test]
async fn test_configure_falls_back_to_environment() {
    let tester = ProviderTester::new(SendgridProvider::with_env(|name| match name {
        "SENDGRID_API_KEY" => Some("SG.env".to_string()),
        _ => None,
    }));
    assert_ok!(tester.validate_provider_config(json!({})).await);
    assert_ok!(tester.configure(json!({})).await);
}

#[tokio::test]
async fn test_api_key_crud() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api_keys"))
        .and(body_json(json!({"name": "ci", "scopes": ["mail.send"]})))
        .respond_with(ResponseTemplate::new(201).set_body_json(key("ci", Some("SG.secret"))))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api_keys/key-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(key("ci", None)))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api_keys/key-1"))
        .and(body_json(json!({"name": "deploy", "scopes": ["mail.send"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(key("deploy", None)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api_keys/key-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(key("deploy", None)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api_keys/key-1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let tester = configured(&server).await;
    let updated = tester
        .lifecycle_crud(
            "sendgrid_api_key",
            json!({"name": "ci", "scopes": ["mail.send"]}),
            json!({"name": "deploy", "scopes": ["mail.send"]}),
        )
        .await
        .unwrap();

    assert_eq!(updated["id"], "key-1");
    assert_eq!(updated["name"], "deploy");
    assert_eq!(updated["scopes"], json!(["mail.send"]));
    assert_eq!(updated["api_key"], "SG.secret");
}

#[tokio::test]
async fn test_rename_plans_in_place_update() {
    let server = MockServer::start().await;
    let tester = configured(&server).await;
    let prior = json!({"id": "key-1", "name": "ci", "scopes": ["mail.send"], "api_key": "SG.secret"});

    let plan = tester
        .plan_update("sendgrid_api_key", prior.clone(), json!({"name": "deploy", "scopes": ["mail.send"]}))
        .await
        .unwrap();

    assert_plan_has_changes(&plan);
    assert_plan_changes_attribute(&plan, "name");
    assert!(!plan.requires_replace);
    assert_eq!(plan.planned_state["api_key"], "SG.secret");
}

#[tokio::test]
async fn test_deleted_outside_is_drift() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api_keys/key-1"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "errors": [{"field": null, "message": "unable to find API Key"}]
        })))
        .mount(&server)
        .await;

    let tester = configured(&server).await;
    let state = tester
        .read("sendgrid_api_key", json!({"id": "key-1", "name": "ci"}))
        .await
        .unwrap();

    assert_gone(&state);
}

#[tokio::test]
async fn test_import_plans_no_changes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api_keys/key-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "api_key_id": "key-1",
            "name": "ci",
            "scopes": ["2fa_required", "mail.send"],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let tester = configured(&server).await;
    let (state, plan) = tester
        .lifecycle_import("sendgrid_api_key", "key-1", json!({"name": "ci", "scopes": ["mail.send"]}))
        .await
        .unwrap();

    assert_eq!(state["scopes"], json!(["mail.send"]));
    assert_eq!(state["api_key"], Value::Null);
    assert_plan_no_changes(&plan);
}

#[tokio::test]
async fn test_rate_limit_exhaustion_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api_keys/key-1"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .expect(2)
        .mount(&server)
        .await;

    let tester = configured(&server).await;
    let err = tester
        .read("sendgrid_api_key", json!({"id": "key-1", "name": "ci"}))
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::ResourceExhausted(_)), "{:?}", err);
    assert!(err.to_string().contains("reading API key"));
}

#[tokio::test]
async fn test_stop_cancels_calls() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201).set_body_json(key("ci", Some("SG.secret"))))
        .expect(0)
        .mount(&server)
        .await;

    let tester = configured(&server).await;
    tester.stop().await.unwrap();
    let err = tester
        .create("sendgrid_api_key", json!({"name": "ci"}))
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::Cancelled(_)), "{:?}", err);
}

#[tokio::test]
async fn test_data_source_not_found_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/templates/d-missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let tester = configured(&server).await;
    let err = tester
        .read_data_source("sendgrid_template", json!({"id": "d-missing"}))
        .await
        .unwrap_err();

    assert!(err.is_not_found(), "{:?}", err);
}

#[tokio::test]
async fn test_template_data_source() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/templates/d-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "d-1",
            "name": "welcome",
            "generation": "dynamic",
            "updated_at": "2024-01-01 00:00:00",
            "versions": [],
        })))
        .mount(&server)
        .await;

    let tester = configured(&server).await;
    assert_ok!(
        tester
            .validate_data_source_config("sendgrid_template", json!({"id": "d-1"}))
            .await
    );
    let state = tester
        .read_data_source("sendgrid_template", json!({"id": "d-1"}))
        .await
        .unwrap();

    assert_eq!(state["name"], "welcome");
    assert_eq!(state["generation"], "dynamic");
}

#[tokio::test]
async fn test_enforced_tls_delete_resets_settings() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/user/settings/enforced_tls"))
        .and(body_json(json!({"require_tls": false, "require_valid_cert": false})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"require_tls": false, "require_valid_cert": false})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let tester = configured(&server).await;
    tester
        .delete(
            "sendgrid_enforced_tls",
            json!({"id": "enforced_tls", "require_tls": true, "require_valid_cert": true}),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_enforced_tls_import_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/settings/enforced_tls"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"require_tls": true, "require_valid_cert": false})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let tester = configured(&server).await;
    let err = tester
        .import_resource("sendgrid_enforced_tls", "tls")
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Validation(_)));

    let imported = tester
        .import_resource("sendgrid_enforced_tls", "enforced_tls")
        .await
        .unwrap();
    assert_eq!(imported.len(), 1);
    assert_eq!(imported[0].resource_type, "sendgrid_enforced_tls");
    assert_eq!(
        imported[0].state,
        json!({"id": "enforced_tls", "require_tls": true, "require_valid_cert": false})
    );
}

#[tokio::test]
async fn test_unknown_resource_type() {
    let server = MockServer::start().await;
    let tester = configured(&server).await;

    let err = tester
        .create("sendgrid_widget", json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::UnknownResource(_)));
}
