//! Black-box HTTP tests: spin up the real router on an ephemeral port and
//! drive it with reqwest, exactly as an external client would.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{Value, json};

use gatehouse_accounts::{
    AccountLifecycle, AuditAction, AuditEntry, EmailMessage, Hs256VerificationTokens, Notifier,
    NotifyError,
};
use gatehouse_api::app::{AppServices, build_router};
use gatehouse_auth::{Role, SessionClaims};
use gatehouse_core::AccountId;
use gatehouse_infra::{InMemoryAccountStore, InMemoryAuditLog};

const JWT_SECRET: &str = "black-box-session-secret";
const VERIFY_SECRET: &str = "black-box-verify-secret";
const BASE_URL: &str = "http://testserver";

// ─── test doubles ────────────────────────────────────────────────────────────

#[derive(Default)]
struct CapturingNotifier {
    sent: Mutex<Vec<EmailMessage>>,
}

impl CapturingNotifier {
    fn last_body(&self) -> String {
        let sent = self.sent.lock().unwrap();
        sent.last().expect("no email captured").body.clone()
    }
}

#[async_trait]
impl Notifier for CapturingNotifier {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn send(&self, _message: &EmailMessage) -> Result<(), NotifyError> {
        Err(NotifyError::Send("smtp relay unreachable".to_string()))
    }
}

// ─── harness ─────────────────────────────────────────────────────────────────

struct Harness {
    base_url: String,
    client: reqwest::Client,
    audit: Arc<InMemoryAuditLog>,
    mail: Arc<CapturingNotifier>,
}

impl Harness {
    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

async fn spawn_router(notifier: Arc<dyn Notifier>, audit: Arc<InMemoryAuditLog>) -> String {
    let store = Arc::new(InMemoryAccountStore::new());
    let tokens = Arc::new(Hs256VerificationTokens::with_default_ttl(
        VERIFY_SECRET.as_bytes(),
    ));
    let lifecycle = AccountLifecycle::new(store, tokens, notifier, audit, BASE_URL);
    let services = Arc::new(AppServices { lifecycle });
    let app = build_router(services, JWT_SECRET);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server");
    });

    format!("http://{addr}")
}

async fn spawn_harness() -> Harness {
    let mail = Arc::new(CapturingNotifier::default());
    let audit = Arc::new(InMemoryAuditLog::new());
    let base_url = spawn_router(mail.clone(), audit.clone()).await;
    Harness {
        base_url,
        client: reqwest::Client::new(),
        audit,
        mail,
    }
}

fn mint_session(role: Role) -> String {
    let now = Utc::now();
    let claims = SessionClaims {
        sub: AccountId::new(),
        role,
        issued_at: now,
        expires_at: now + Duration::minutes(30),
    };
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("mint session token")
}

async fn register(harness: &Harness, username: &str, email: &str) -> reqwest::Response {
    harness
        .client
        .post(harness.url("/accounts/register"))
        .json(&json!({
            "username": username,
            "email": email,
            "password": "s3cret-pass",
        }))
        .send()
        .await
        .expect("register request")
}

/// Pull the verification path out of the last captured email. The link is the
/// final whitespace-separated token of the body.
fn verification_path(harness: &Harness) -> String {
    let body = harness.mail.last_body();
    let link = body.split_whitespace().last().expect("link in email body");
    link.strip_prefix(BASE_URL)
        .expect("link uses configured base url")
        .to_string()
}

async fn admin_get(harness: &Harness, path: &str, token: &str) -> reqwest::Response {
    harness
        .client
        .get(harness.url(path))
        .bearer_auth(token)
        .send()
        .await
        .expect("admin GET")
}

async fn admin_post(harness: &Harness, path: &str, token: &str) -> reqwest::Response {
    harness
        .client
        .post(harness.url(path))
        .bearer_auth(token)
        .send()
        .await
        .expect("admin POST")
}

// ─── tests ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn health_is_open() {
    let harness = spawn_harness().await;

    let resp = harness
        .client
        .get(harness.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn admin_routes_require_a_bearer_token() {
    let harness = spawn_harness().await;

    let resp = harness
        .client
        .get(harness.url("/accounts/admin/pending-users"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let resp = admin_get(&harness, "/accounts/admin/pending-users", "not-a-jwt").await;
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn non_admin_sessions_are_forbidden() {
    let harness = spawn_harness().await;
    let id = AccountId::new();

    for role in [Role::Customer, Role::Manager] {
        let token = mint_session(role);

        let resp = admin_get(&harness, "/accounts/admin/pending-users", &token).await;
        assert_eq!(resp.status(), 403);

        let resp = admin_post(&harness, &format!("/accounts/admin/approve/{id}"), &token).await;
        assert_eq!(resp.status(), 403);

        let resp = admin_get(&harness, &format!("/accounts/admin/user-logs/{id}"), &token).await;
        assert_eq!(resp.status(), 403);
    }
}

#[tokio::test]
async fn registration_verification_and_approval_flow() {
    let harness = spawn_harness().await;
    let admin = mint_session(Role::Admin);

    // Register: created, told to verify.
    let resp = register(&harness, "alice", "alice@example.com").await;
    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "User registered. Verify your email first.");
    let alice_id = body["id"].as_str().unwrap().to_string();

    // Not pending yet: the email is unverified.
    let resp = admin_get(&harness, "/accounts/admin/pending-users", &admin).await;
    assert_eq!(resp.status(), 200);
    let pending: Value = resp.json().await.unwrap();
    assert_eq!(pending.as_array().unwrap().len(), 0);

    // Follow the emailed link.
    let path = verification_path(&harness);
    let resp = harness.client.get(harness.url(&path)).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body["success"],
        "Email verified successfully. Wait for admin approval."
    );

    // Now pending, with the registered identity.
    let resp = admin_get(&harness, "/accounts/admin/pending-users", &admin).await;
    let pending: Value = resp.json().await.unwrap();
    let pending = pending.as_array().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0]["id"], alice_id.as_str());
    assert_eq!(pending[0]["username"], "alice");
    assert_eq!(pending[0]["email"], "alice@example.com");
    assert_eq!(pending[0]["role"], "customer");

    // Approve and drop off the pending list.
    let resp = admin_post(
        &harness,
        &format!("/accounts/admin/approve/{alice_id}"),
        &admin,
    )
    .await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], "User approved");

    let resp = admin_get(&harness, "/accounts/admin/pending-users", &admin).await;
    let pending: Value = resp.json().await.unwrap();
    assert_eq!(pending.as_array().unwrap().len(), 0);

    // The link was single-use: replaying it fails.
    let resp = harness.client.get(harness.url(&path)).send().await.unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn registration_reports_email_delivery_failure() {
    let audit = Arc::new(InMemoryAuditLog::new());
    let base_url = spawn_router(Arc::new(FailingNotifier), audit).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base_url}/accounts/register"))
        .json(&json!({
            "username": "bob",
            "email": "bob@example.com",
            "password": "s3cret-pass",
        }))
        .send()
        .await
        .unwrap();

    // The account exists despite the outage; only the message differs.
    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "User registered, but email failed to send.");
}

#[tokio::test]
async fn duplicate_registration_lists_field_errors() {
    let harness = spawn_harness().await;

    let resp = register(&harness, "carol", "carol@example.com").await;
    assert_eq!(resp.status(), 201);

    let resp = register(&harness, "carol", "carol@example.com").await;
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["fields"]["username"][0], "already taken");
    assert_eq!(body["fields"]["email"][0], "already registered");
}

#[tokio::test]
async fn missing_fields_are_reported_together() {
    let harness = spawn_harness().await;

    let resp = harness
        .client
        .post(harness.url("/accounts/register"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["fields"]["username"].is_array());
    assert!(body["fields"]["email"].is_array());
    assert!(body["fields"]["password"].is_array());
}

#[tokio::test]
async fn unknown_and_malformed_ids_get_not_found() {
    let harness = spawn_harness().await;
    let admin = mint_session(Role::Admin);
    let unknown = AccountId::new();

    for path in [
        format!("/accounts/admin/approve/{unknown}"),
        format!("/accounts/admin/reject/{unknown}"),
        format!("/accounts/admin/toggle-status/{unknown}"),
        "/accounts/admin/approve/not-a-uuid".to_string(),
    ] {
        let resp = admin_post(&harness, &path, &admin).await;
        assert_eq!(resp.status(), 404, "{path}");
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["message"], "User not found");
    }

    let resp = admin_get(
        &harness,
        &format!("/accounts/admin/user-logs/{unknown}"),
        &admin,
    )
    .await;
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn toggle_status_reports_the_resulting_state() {
    let harness = spawn_harness().await;
    let admin = mint_session(Role::Admin);

    let resp = register(&harness, "dave", "dave@example.com").await;
    let body: Value = resp.json().await.unwrap();
    let id = body["id"].as_str().unwrap().to_string();

    // Verification flips dave active.
    let path = verification_path(&harness);
    harness.client.get(harness.url(&path)).send().await.unwrap();

    let resp = admin_post(
        &harness,
        &format!("/accounts/admin/toggle-status/{id}"),
        &admin,
    )
    .await;
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], "User deactivated successfully");

    let resp = admin_post(
        &harness,
        &format!("/accounts/admin/toggle-status/{id}"),
        &admin,
    )
    .await;
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], "User activated successfully");
}

#[tokio::test]
async fn reset_password_requires_a_new_password() {
    let harness = spawn_harness().await;
    let admin = mint_session(Role::Admin);

    let resp = register(&harness, "erin", "erin@example.com").await;
    let body: Value = resp.json().await.unwrap();
    let id = body["id"].as_str().unwrap().to_string();

    let resp = harness
        .client
        .post(harness.url(&format!("/accounts/admin/reset-password/{id}")))
        .bearer_auth(&admin)
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["fields"]["new_password"].is_array());

    let resp = harness
        .client
        .post(harness.url(&format!("/accounts/admin/reset-password/{id}")))
        .bearer_auth(&admin)
        .json(&json!({ "new_password": "fresh-pass" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], "Password reset successfully");
}

#[tokio::test]
async fn user_logs_returns_the_audit_trail() {
    let harness = spawn_harness().await;
    let admin = mint_session(Role::Admin);

    let resp = register(&harness, "frank", "frank@example.com").await;
    let body: Value = resp.json().await.unwrap();
    let id: AccountId = body["id"].as_str().unwrap().parse().unwrap();

    harness.audit.record(
        id,
        AuditEntry {
            recorded_at: Utc::now(),
            action: AuditAction::Change,
            change_message: "Changed email.".to_string(),
            entity_kind: "account".to_string(),
        },
    );

    let resp = admin_get(&harness, &format!("/accounts/admin/user-logs/{id}"), &admin).await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let logs = body["logs"].as_array().unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0]["action"], "change");
    assert_eq!(logs[0]["change_message"], "Changed email.");
}
