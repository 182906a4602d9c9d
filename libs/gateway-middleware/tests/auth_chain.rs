//! End-to-end tests for the authentication chain: JWT verification, the
//! revocation blacklist, and the sliding-window session guard composed in
//! order over in-memory backends.

use actix_web::body::MessageBody;
use actix_web::dev::ServiceResponse;
use actix_web::http::header;
use actix_web::{test, web, App, HttpRequest, HttpResponse};
use auth_core::{JwtSigner, JwtVerifier, KeyMaterial};
use gateway_middleware::{
    AuthenticatedUser, JwtAuthMiddleware, PublicPaths, SessionGuardMiddleware,
    TokenRevocationMiddleware,
};
use session_store::{
    MemoryBackend, RevocationStore, SessionConfig, SessionRecord, SessionStore,
};
use std::sync::Arc;
use std::time::Duration;

fn material() -> KeyMaterial {
    KeyMaterial::Secret("chain-test-secret".to_string())
}

fn verifier() -> Arc<JwtVerifier> {
    Arc::new(JwtVerifier::new(&material(), 0).unwrap())
}

fn signer() -> JwtSigner {
    JwtSigner::new(&material(), 3600).unwrap()
}

struct Harness {
    sessions: SessionStore,
    revocations: RevocationStore,
    session_backend: MemoryBackend,
    blacklist_backend: MemoryBackend,
}

impl Harness {
    fn new(config: SessionConfig) -> Self {
        let session_backend = MemoryBackend::new();
        let blacklist_backend = MemoryBackend::new();
        Self {
            sessions: SessionStore::new(Arc::new(session_backend.clone()), config),
            revocations: RevocationStore::new(Arc::new(blacklist_backend.clone())),
            session_backend,
            blacklist_backend,
        }
    }

    async fn login(&self, subject: &str) -> String {
        let token = signer()
            .generate(
                subject,
                Some(&format!("{subject}@corebank.dev")),
                Some("Test User"),
                &["USER".to_string()],
            )
            .unwrap();
        let mut record = SessionRecord::new(subject, token.clone());
        record.name = Some("Test User".to_string());
        record.roles = vec!["USER".to_string()];
        self.sessions.create(&record).await.unwrap();
        token
    }
}

async fn whoami(user: AuthenticatedUser, req: HttpRequest) -> HttpResponse {
    let header_value = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    };
    HttpResponse::Ok().json(serde_json::json!({
        "subject": user.subject,
        "roles": user.roles,
        "header_user_id": header_value("x-user-id"),
        "header_user_email": header_value("x-user-email"),
        "header_roles": header_value("x-user-roles"),
        "header_token": header_value("x-token"),
    }))
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"status": "ok"}))
}

macro_rules! chain_app {
    ($harness:expr) => {
        test::init_service(
            App::new()
                .wrap(SessionGuardMiddleware::new(
                    $harness.sessions.clone(),
                    PublicPaths::default(),
                ))
                .wrap(TokenRevocationMiddleware::new(
                    $harness.revocations.clone(),
                    PublicPaths::default(),
                ))
                .wrap(JwtAuthMiddleware::new(verifier(), PublicPaths::default()))
                .route("/api/profile", web::get().to(whoami))
                .route("/health", web::get().to(health)),
        )
        .await
    };
}

fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {token}"))
}

async fn rejection_reason<B: MessageBody>(resp: ServiceResponse<B>) -> String {
    let body = test::read_body(resp).await;
    let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
    value["error"].as_str().unwrap().to_string()
}

#[actix_web::test]
async fn test_authorized_request_propagates_claims() {
    let harness = Harness::new(SessionConfig::default());
    let token = harness.login("user-1").await;
    let app = chain_app!(harness);

    let req = test::TestRequest::get()
        .uri("/api/profile")
        .insert_header(bearer(&token))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["subject"], "user-1");
    assert_eq!(body["header_user_id"], "user-1");
    assert_eq!(body["header_user_email"], "user-1@corebank.dev");
    assert_eq!(body["header_roles"], "USER");
    assert_eq!(body["header_token"], token);
}

#[actix_web::test]
async fn test_spoofed_identity_headers_are_replaced() {
    let harness = Harness::new(SessionConfig::default());
    let token = harness.login("user-1").await;
    let app = chain_app!(harness);

    let req = test::TestRequest::get()
        .uri("/api/profile")
        .insert_header(bearer(&token))
        .insert_header(("x-user-id", "admin"))
        .insert_header(("x-user-roles", "ADMIN"))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["header_user_id"], "user-1");
    assert_eq!(body["header_roles"], "USER");
}

#[actix_web::test]
async fn test_missing_header_rejected_without_store_access() {
    let harness = Harness::new(SessionConfig::default());
    // Both stores down: a malformed request must be rejected before any
    // store round trip would matter.
    harness.session_backend.set_available(false);
    harness.blacklist_backend.set_available(false);
    let app = chain_app!(harness);

    let req = test::TestRequest::get().uri("/api/profile").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 401);
    assert_eq!(rejection_reason(resp).await, "malformed_request");
}

#[actix_web::test]
async fn test_expired_token_rejected() {
    let harness = Harness::new(SessionConfig::default());
    harness.login("user-1").await;
    let expired = JwtSigner::new(&material(), -3600)
        .unwrap()
        .generate("user-1", None, None, &[])
        .unwrap();
    let app = chain_app!(harness);

    let req = test::TestRequest::get()
        .uri("/api/profile")
        .insert_header(bearer(&expired))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 401);
    assert_eq!(rejection_reason(resp).await, "invalid_token");
}

#[actix_web::test]
async fn test_revocation_overrides_structural_validity() {
    let harness = Harness::new(SessionConfig::default());
    let token = harness.login("user-1").await;
    harness
        .revocations
        .revoke(&token, Duration::from_secs(3600))
        .await
        .unwrap();
    let app = chain_app!(harness);

    let req = test::TestRequest::get()
        .uri("/api/profile")
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 401);
    assert_eq!(rejection_reason(resp).await, "revoked");
}

#[actix_web::test]
async fn test_logout_then_replay_rejected() {
    let harness = Harness::new(SessionConfig::default());
    let token = harness.login("user-1").await;

    harness
        .sessions
        .invalidate("user-1", &token, &harness.revocations, Duration::from_secs(3600))
        .await
        .unwrap();

    let app = chain_app!(harness);
    let req = test::TestRequest::get()
        .uri("/api/profile")
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 401);
    assert_eq!(rejection_reason(resp).await, "revoked");
}

#[actix_web::test]
async fn test_fail_open_when_revocation_store_down() {
    let harness = Harness::new(SessionConfig::default());
    let token = harness.login("user-1").await;
    harness.blacklist_backend.set_available(false);
    let app = chain_app!(harness);

    let req = test::TestRequest::get()
        .uri("/api/profile")
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert!(resp.status().is_success());
}

#[actix_web::test]
async fn test_fail_closed_when_session_store_down() {
    let harness = Harness::new(SessionConfig::default());
    let token = harness.login("user-1").await;
    harness.session_backend.set_available(false);
    let app = chain_app!(harness);

    let req = test::TestRequest::get()
        .uri("/api/profile")
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 401);
    assert_eq!(rejection_reason(resp).await, "session_unavailable");
}

#[actix_web::test]
async fn test_public_path_bypasses_chain_and_stores() {
    let harness = Harness::new(SessionConfig::default());
    harness.session_backend.set_available(false);
    harness.blacklist_backend.set_available(false);
    let app = chain_app!(harness);

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;

    assert!(resp.status().is_success());
}

#[actix_web::test]
async fn test_session_absent_rejected() {
    let harness = Harness::new(SessionConfig::default());
    // Token is valid but no login ever created a session.
    let token = signer().generate("user-1", None, None, &[]).unwrap();
    let app = chain_app!(harness);

    let req = test::TestRequest::get()
        .uri("/api/profile")
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 401);
    assert_eq!(rejection_reason(resp).await, "session_expired");
}

#[actix_web::test]
async fn test_identity_mismatch_rejected() {
    let harness = Harness::new(SessionConfig::default());
    let token = signer().generate("user-1", None, None, &[]).unwrap();
    // The token→subject entry claims a different owner than the token.
    let mut record = SessionRecord::new("user-2", token.clone());
    record.roles = vec!["USER".to_string()];
    harness.sessions.create(&record).await.unwrap();
    let app = chain_app!(harness);

    let req = test::TestRequest::get()
        .uri("/api/profile")
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 401);
    assert_eq!(rejection_reason(resp).await, "identity_mismatch");
}

#[actix_web::test]
async fn test_concurrent_logins_last_write_wins() {
    let harness = Harness::new(SessionConfig::default());
    let first = harness.login("user-1").await;
    let second = harness.login("user-1").await;
    let app = chain_app!(harness);

    // The record now references the second token, but the first token is
    // still structurally valid, unrevoked, and mapped to the subject, so
    // both authorize.
    for token in [&first, &second] {
        let req = test::TestRequest::get()
            .uri("/api/profile")
            .insert_header(bearer(token))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
    }

    let record = harness.sessions.get("user-1").await.unwrap().unwrap();
    assert_eq!(record.token, second);
}

#[actix_web::test]
async fn test_sliding_window_extends_on_access() {
    let harness = Harness::new(SessionConfig {
        session_ttl: Duration::from_millis(1000),
        token_ttl: Duration::from_secs(60),
    });
    let token = harness.login("user-1").await;
    let app = chain_app!(harness);

    // Two accesses inside the window, each refreshing the TTL; the second
    // lands after the original window would have closed.
    for _ in 0..2 {
        tokio::time::sleep(Duration::from_millis(600)).await;
        let req = test::TestRequest::get()
            .uri("/api/profile")
            .insert_header(bearer(&token))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
    }

    // No accesses for a full window: the session lapses.
    tokio::time::sleep(Duration::from_millis(1300)).await;
    let req = test::TestRequest::get()
        .uri("/api/profile")
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 401);
    assert_eq!(rejection_reason(resp).await, "session_expired");
}
