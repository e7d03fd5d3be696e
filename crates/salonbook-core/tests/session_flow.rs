mod common;

use axum::http::StatusCode;
use axum::Router;
use serde_json::{json, Value};

use common::{reply, spawn, Seen};
use salonbook_core::models::{AccountType, RegisterRequest, UserRole};
use salonbook_core::{CredentialStore, Route, Session, SessionConfig};

fn login_ok(seen: &Seen) -> Router {
    Router::new()
        .route(
            "/api/auth/login",
            reply(
                seen,
                StatusCode::OK,
                json!({"access_token": "T1", "user": {"id": "1", "role": "customer"}}),
            ),
        )
        .route("/api/me", reply(seen, StatusCode::OK, json!({"id": "1"})))
}

#[tokio::test]
async fn login_persists_token_and_updates_state() {
    let seen = Seen::default();
    let base = spawn(login_ok(&seen)).await;
    let store = CredentialStore::in_memory();
    let mut session = Session::start(SessionConfig::new(base), store.clone()).unwrap();

    let user = session
        .login("a@x.com", "12345678", AccountType::Customer)
        .await
        .unwrap();
    assert_eq!(user.id.as_deref(), Some("1"));

    let state = session.state();
    assert!(state.is_authenticated());
    assert!(!state.is_guest());
    assert_eq!(state.token(), Some("T1"));
    assert_eq!(state.user().and_then(|u| u.role), Some(UserRole::Customer));
    assert_eq!(store.read().unwrap().as_deref(), Some("T1"));
    assert_eq!(session.landing_route(), Route::CustomerHome);

    let login_request = seen.last();
    assert_eq!(login_request.authorization, None);
    let body: Value = serde_json::from_str(&login_request.body).unwrap();
    assert_eq!(
        body,
        json!({"email": "a@x.com", "password": "12345678", "userType": "customer"})
    );

    let _: Value = session.client().get_json("/api/me").await.unwrap();
    assert_eq!(seen.last().authorization.as_deref(), Some("Bearer T1"));
}

#[tokio::test]
async fn login_validation_error_is_displayable() {
    let seen = Seen::default();
    let app = Router::new().route(
        "/api/auth/login",
        reply(
            &seen,
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({"detail": [{"loc": ["body", "email"], "msg": "invalid"}]}),
        ),
    );
    let base = spawn(app).await;
    let store = CredentialStore::in_memory();
    let mut session = Session::start(SessionConfig::new(base), store.clone()).unwrap();

    let err = session
        .login("a@x.com", "12345678", AccountType::Customer)
        .await
        .unwrap_err();
    assert_eq!(err.user_message(), "body.email: invalid");
    assert!(!session.state().is_authenticated());
    assert!(!store.has_token());
}

#[tokio::test]
async fn wrong_password_leaves_session_anonymous() {
    let seen = Seen::default();
    let app = Router::new().route(
        "/api/auth/login",
        reply(&seen, StatusCode::UNAUTHORIZED, json!({"detail": "Incorrect email or password"})),
    );
    let base = spawn(app).await;
    let mut session = Session::start(SessionConfig::new(base), CredentialStore::in_memory()).unwrap();

    let err = session
        .login("a@x.com", "wrong", AccountType::SalonAdmin)
        .await
        .unwrap_err();
    assert!(err.is_auth_denied());
    assert_eq!(err.user_message(), "Incorrect email or password");
    assert_eq!(session.landing_route(), Route::Home);
}

#[tokio::test]
async fn salon_admin_lands_on_admin_profile() {
    let seen = Seen::default();
    let app = Router::new().route(
        "/api/auth/login",
        reply(
            &seen,
            StatusCode::OK,
            json!({"access_token": "A1", "user": {"id": 9, "role": "salon_admin", "name": "Glow"}}),
        ),
    );
    let base = spawn(app).await;
    let mut session = Session::start(SessionConfig::new(base), CredentialStore::in_memory()).unwrap();

    session.login("s@x.com", "pw", AccountType::SalonAdmin).await.unwrap();
    assert_eq!(session.landing_route(), Route::AdminProfile);
}

#[tokio::test]
async fn logout_after_login_drops_authorization() {
    let seen = Seen::default();
    let base = spawn(login_ok(&seen)).await;
    let store = CredentialStore::in_memory();
    let mut session = Session::start(SessionConfig::new(base), store.clone()).unwrap();

    session.login("a@x.com", "12345678", AccountType::Customer).await.unwrap();
    session.logout().unwrap();

    assert!(!session.state().is_authenticated());
    assert_eq!(session.state().user(), None);
    assert!(!store.has_token());

    let _: Value = session.client().get_json("/api/me").await.unwrap();
    assert_eq!(seen.last().authorization, None);
}

#[tokio::test]
async fn expired_token_leaves_stale_auth_state_by_default() {
    let seen = Seen::default();
    let app = Router::new()
        .route(
            "/api/auth/login",
            reply(&seen, StatusCode::OK, json!({"access_token": "T1", "user": {"id": "1"}})),
        )
        .route("/api/me", reply(&seen, StatusCode::UNAUTHORIZED, json!({})));
    let base = spawn(app).await;
    let store = CredentialStore::in_memory();
    let mut session = Session::start(SessionConfig::new(base), store.clone()).unwrap();

    session.login("a@x.com", "12345678", AccountType::Customer).await.unwrap();
    let err = session.client().get_json::<Value>("/api/me").await.unwrap_err();

    assert!(err.is_auth_denied());
    assert!(!store.has_token());
    assert!(session.state().is_authenticated());
    assert_eq!(session.state().token(), Some("T1"));
}

#[tokio::test]
async fn register_returns_server_object() {
    let seen = Seen::default();
    let app = Router::new().route(
        "/api/auth/register",
        reply(&seen, StatusCode::CREATED, json!({"message": "Registered", "id": 5})),
    );
    let base = spawn(app).await;
    let session = Session::start(SessionConfig::new(base), CredentialStore::in_memory()).unwrap();

    let request = RegisterRequest {
        name: "Ana".to_string(),
        email: "a@x.com".to_string(),
        password: "12345678".to_string(),
        phone: "0771234567".to_string(),
        role: AccountType::Customer,
    };
    let response = session.register(&request).await.unwrap();
    assert_eq!(response["message"], "Registered");

    let body: Value = serde_json::from_str(&seen.last().body).unwrap();
    assert_eq!(body["role"], "customer");
    assert_eq!(body["phone"], "0771234567");
}

#[tokio::test]
async fn register_conflict_message() {
    let seen = Seen::default();
    let app = Router::new().route(
        "/api/auth/register",
        reply(
            &seen,
            StatusCode::BAD_REQUEST,
            json!({"errors": {"email": ["already registered"]}}),
        ),
    );
    let base = spawn(app).await;
    let session = Session::start(SessionConfig::new(base), CredentialStore::in_memory()).unwrap();

    let request = RegisterRequest {
        name: "Ana".to_string(),
        email: "a@x.com".to_string(),
        password: "12345678".to_string(),
        phone: "0771234567".to_string(),
        role: AccountType::Customer,
    };
    let err = session.register(&request).await.unwrap_err();
    assert_eq!(err.user_message(), "email: already registered");
}
