#![allow(clippy::unwrap_used)]
// Integration tests for `ApiClient` using wiremock.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use amlctl_api::models::LoginOutcome;
use amlctl_api::{
    ApiClient, AuthEvent, CredentialStore, EntityId, Error, ExportFormat, ListQuery,
    MemoryCredentialStore, StoredCredentials,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn signed_in(access: &str, refresh: Option<&str>) -> Arc<MemoryCredentialStore> {
    Arc::new(MemoryCredentialStore::with_credentials(StoredCredentials {
        access_token: Some(SecretString::from(access.to_owned())),
        refresh_token: refresh.map(|r| SecretString::from(r.to_owned())),
        user: None,
    }))
}

async fn setup(store: Arc<MemoryCredentialStore>) -> (MockServer, ApiClient) {
    let server = MockServer::start().await;
    let base = Url::parse(&format!("{}/api", server.uri())).unwrap();
    let regulatory = Url::parse(&format!("{}/dfsa-api", server.uri())).unwrap();
    let client = ApiClient::with_client(reqwest::Client::new(), &base, &regulatory, store);
    (server, client)
}

fn customer_page() -> serde_json::Value {
    json!({
        "status": "success",
        "data": {
            "results": [{"id": "C1", "name": "Alice Trading LLC", "risk_level": "high"}],
            "count": 1,
            "currentPage": 1,
            "totalPages": 1
        }
    })
}

// ── Refresh-and-retry ───────────────────────────────────────────────

#[tokio::test]
async fn expired_token_is_refreshed_and_request_retried() {
    let store = signed_in("old-access", Some("refresh-1"));
    let (server, client) = setup(store.clone()).await;
    let mut events = client.subscribe_auth_events();

    Mock::given(method("GET"))
        .and(path("/api/customers/"))
        .and(header("authorization", "Bearer old-access"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "expired"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/token/refresh/"))
        .and(body_json(json!({"refresh": "refresh-1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "new-access"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/customers/"))
        .and(header("authorization", "Bearer new-access"))
        .respond_with(ResponseTemplate::new(200).set_body_json(customer_page()))
        .expect(1)
        .mount(&server)
        .await;

    let page = client.list_customers(&ListQuery::default()).await.unwrap();
    assert_eq!(page.results.len(), 1);
    assert_eq!(page.results[0].name, "Alice Trading LLC");

    let stored = store.load().unwrap();
    assert_eq!(stored.access_token.unwrap().expose_secret(), "new-access");
    assert_eq!(stored.refresh_token.unwrap().expose_secret(), "refresh-1");
    assert_eq!(events.try_recv().unwrap(), AuthEvent::TokenRefreshed);
}

#[tokio::test]
async fn second_unauthorized_expires_session_without_another_refresh() {
    let store = signed_in("old-access", Some("refresh-1"));
    let (server, client) = setup(store.clone()).await;
    let mut events = client.subscribe_auth_events();

    Mock::given(method("GET"))
        .and(path("/api/alerts/"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/token/refresh/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "new-access"})))
        .expect(1)
        .mount(&server)
        .await;

    let result = client.list_alerts(&ListQuery::default()).await;
    assert!(matches!(result, Err(Error::SessionExpired)), "got {result:?}");

    let stored = store.load().unwrap();
    assert!(stored.access_token.is_none());
    assert!(stored.refresh_token.is_none());
    assert_eq!(events.try_recv().unwrap(), AuthEvent::TokenRefreshed);
    assert_eq!(events.try_recv().unwrap(), AuthEvent::SessionExpired);
}

#[tokio::test]
async fn missing_refresh_token_fails_without_refresh_call() {
    let store = signed_in("old-access", None);
    let (server, client) = setup(store.clone()).await;

    Mock::given(method("GET"))
        .and(path("/api/cases/"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/token/refresh/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "x"})))
        .expect(0)
        .mount(&server)
        .await;

    let result = client.list_cases(&ListQuery::default()).await;
    assert!(result.unwrap_err().is_auth_expired());
    assert!(!store.load().unwrap().has_access_token());
}

#[tokio::test]
async fn rejected_refresh_expires_session() {
    let store = signed_in("old-access", Some("revoked"));
    let (server, client) = setup(store.clone()).await;

    Mock::given(method("GET"))
        .and(path("/api/devices/"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/token/refresh/"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"detail": "Token is blacklisted"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let result = client.list_devices(&ListQuery::default()).await;
    assert!(matches!(result, Err(Error::SessionExpired)));
    assert!(!store.load().unwrap().has_access_token());
}

#[tokio::test]
async fn concurrent_unauthorized_requests_share_one_refresh() {
    let store = signed_in("old-access", Some("refresh-1"));
    let (server, client) = setup(store.clone()).await;

    Mock::given(method("GET"))
        .and(header("authorization", "Bearer old-access"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/token/refresh/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access": "new-access", "refresh": "refresh-2"}))
                .set_delay(std::time::Duration::from_millis(50)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/customers/"))
        .and(header("authorization", "Bearer new-access"))
        .respond_with(ResponseTemplate::new(200).set_body_json(customer_page()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/transactions/"))
        .and(header("authorization", "Bearer new-access"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [], "count": 0
        })))
        .mount(&server)
        .await;

    let query = ListQuery::default();
    let (customers, transactions) = tokio::join!(
        client.list_customers(&query),
        client.list_transactions(&query)
    );
    assert_eq!(customers.unwrap().count, 1);
    assert_eq!(transactions.unwrap().count, 0);
    assert_eq!(
        store.load().unwrap().refresh_token.unwrap().expose_secret(),
        "refresh-2"
    );
}

// ── Session ─────────────────────────────────────────────────────────

#[tokio::test]
async fn login_stores_tokens_and_user() {
    let store = Arc::new(MemoryCredentialStore::new());
    let (server, client) = setup(store.clone()).await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .and(body_json(json!({"email": "analyst@bank.test", "password": "hunter2"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "data": {
                "access": "a-1",
                "refresh": "r-1",
                "user": {"id": 3, "email": "analyst@bank.test", "first_name": "Dana"}
            }
        })))
        .mount(&server)
        .await;

    let password = SecretString::from("hunter2".to_owned());
    let outcome = client.login("analyst@bank.test", &password).await.unwrap();
    assert!(matches!(outcome, LoginOutcome::Authenticated(_)));

    let stored = store.load().unwrap();
    assert_eq!(stored.access_token.unwrap().expose_secret(), "a-1");
    assert_eq!(stored.refresh_token.unwrap().expose_secret(), "r-1");
    assert_eq!(stored.user.unwrap().id, EntityId::Numeric(3));
}

#[tokio::test]
async fn login_with_second_factor_stores_nothing() {
    let store = Arc::new(MemoryCredentialStore::new());
    let (server, client) = setup(store.clone()).await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"mfa_required": true, "user_id": 7})),
        )
        .mount(&server)
        .await;

    let password = SecretString::from("hunter2".to_owned());
    let outcome = client.login("analyst@bank.test", &password).await.unwrap();
    match outcome {
        LoginOutcome::MfaRequired { user_id } => assert_eq!(user_id, "7"),
        LoginOutcome::Authenticated(_) => panic!("expected MFA challenge"),
    }
    assert!(!store.load().unwrap().has_access_token());
}

#[tokio::test]
async fn bad_password_is_authentication_error() {
    let store = Arc::new(MemoryCredentialStore::new());
    let (server, client) = setup(store).await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"detail": "Invalid credentials"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/token/refresh/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let password = SecretString::from("wrong".to_owned());
    let result = client.login("analyst@bank.test", &password).await;
    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}

#[tokio::test]
async fn logout_clears_credentials_even_when_server_fails() {
    let store = signed_in("a-1", Some("r-1"));
    let (server, client) = setup(store.clone()).await;

    Mock::given(method("POST"))
        .and(path("/api/auth/logout/"))
        .and(body_json(json!({"refresh": "r-1"})))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let result = client.logout().await;
    assert!(result.is_err());
    assert!(!store.load().unwrap().has_access_token());
}

// ── Endpoints ───────────────────────────────────────────────────────

#[tokio::test]
async fn list_sends_search_ordering_and_page() {
    let store = signed_in("a-1", None);
    let (server, client) = setup(store).await;

    Mock::given(method("GET"))
        .and(path("/api/customers/"))
        .and(query_param("search", "Alice"))
        .and(query_param("ordering", "-created_at"))
        .and(query_param("page", "2"))
        .and(query_param("page_size", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(customer_page()))
        .expect(1)
        .mount(&server)
        .await;

    let query = ListQuery {
        search: Some("Alice".into()),
        sort_field: Some("created_at".into()),
        sort_direction: amlctl_api::SortDirection::Desc,
        page: 2,
        page_size: 10,
        ..ListQuery::default()
    };
    client.list_customers(&query).await.unwrap();
}

#[tokio::test]
async fn validation_envelope_surfaces_field_errors() {
    let store = signed_in("a-1", None);
    let (server, client) = setup(store).await;

    Mock::given(method("POST"))
        .and(path("/api/cases/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "status": "error",
            "message": "Invalid case",
            "errors": [{"field": "title", "message": "This field is required."}]
        })))
        .mount(&server)
        .await;

    let body = amlctl_api::models::CreateCaseRequest {
        title: String::new(),
        description: None,
        priority: amlctl_api::models::Severity::High,
        customer_id: None,
        alert_ids: Vec::new(),
        assigned_to: None,
    };
    match client.create_case(&body).await {
        Err(Error::Validation { errors, .. }) => {
            assert_eq!(errors[0].field.as_deref(), Some("title"));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn flag_transaction_returns_updated_record() {
    let store = signed_in("a-1", None);
    let (server, client) = setup(store).await;

    Mock::given(method("POST"))
        .and(path("/api/transactions/T9/flag/"))
        .and(body_json(json!({"reason": "structuring"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "T9", "amount": "9900.00", "status": "flagged", "flag_reason": "structuring"
        })))
        .mount(&server)
        .await;

    let txn = client
        .flag_transaction(&EntityId::from("T9"), "structuring")
        .await
        .unwrap();
    assert_eq!(txn.status, amlctl_api::models::TransactionStatus::Flagged);
    assert!((txn.amount - 9900.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn report_export_hits_regulatory_backend() {
    let store = signed_in("a-1", None);
    let (server, client) = setup(store).await;

    Mock::given(method("GET"))
        .and(path("/dfsa-api/dfsa/reports/5/export/"))
        .and(query_param("format", "pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.7".to_vec()))
        .mount(&server)
        .await;

    let bytes = client
        .export_report(&EntityId::Numeric(5), ExportFormat::Pdf)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"%PDF-1.7");
}

#[tokio::test]
async fn remove_device_accepts_empty_response() {
    let store = signed_in("a-1", None);
    let (server, client) = setup(store).await;

    Mock::given(method("DELETE"))
        .and(path("/api/devices/D1/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client.remove_device(&EntityId::from("D1")).await.unwrap();
}

#[tokio::test]
async fn missing_record_is_not_found() {
    let store = signed_in("a-1", None);
    let (server, client) = setup(store).await;

    Mock::given(method("GET"))
        .and(path("/api/alerts/A404/"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Not found."})))
        .mount(&server)
        .await;

    let err = client.get_alert(&EntityId::from("A404")).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn zero_padded_id_is_requested_as_issued() {
    let store = signed_in("a-1", None);
    let (server, client) = setup(store).await;

    Mock::given(method("GET"))
        .and(path("/api/customers/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{"id": "007", "name": "Bond Holdings", "risk_level": "low"}],
            "count": 1
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/customers/007/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"id": "007", "name": "Bond Holdings", "risk_level": "low"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let page = client.list_customers(&ListQuery::default()).await.unwrap();
    let customer = client.get_customer(&page.results[0].id).await.unwrap();
    assert_eq!(customer.id.to_string(), "007");
}

#[tokio::test]
async fn slash_in_id_stays_inside_one_segment() {
    let store = signed_in("a-1", None);
    let (server, client) = setup(store).await;

    Mock::given(method("GET"))
        .and(path("/api/alerts/A1%2F..%2Fcases/"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Not found."})))
        .expect(1)
        .mount(&server)
        .await;

    let err = client
        .get_alert(&EntityId::from("A1/../cases"))
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    let err = client.get_alert(&EntityId::from("..")).await.unwrap_err();
    assert!(matches!(err, Error::InvalidPathSegment(ref s) if s == ".."));
}
