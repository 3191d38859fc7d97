//! Integration tests for login, refresh and logout through a real
//! `ApiClient` wired around a `Session`.

use std::sync::Arc;
use std::time::Duration;

use levelup_session::{
    Authenticator, KeyValueStore, MemoryStore, RouteDecision, Session,
    SessionError, SessionState, TOKEN_KEY, USERNAME_KEY,
};
use levelup_transport::mock::ScriptedExchange;
use levelup_transport::{ApiClient, Method};
use serde_json::{Value, json};

// =========================================================================
// Helpers
// =========================================================================

/// A handle to a memory store that stays inspectable after the session
/// takes ownership of its clone.
#[derive(Clone, Default)]
struct SharedStore(Arc<MemoryStore>);

impl KeyValueStore for SharedStore {
    fn get(&self, key: &str) -> Option<String> {
        self.0.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
        self.0.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), SessionError> {
        self.0.remove(key)
    }
}

struct Harness {
    exchange: ScriptedExchange,
    store: SharedStore,
    session: Arc<Session>,
    client: ApiClient<ScriptedExchange>,
    auth: Authenticator<ScriptedExchange>,
}

fn harness() -> Harness {
    harness_with(SharedStore::default())
}

/// A harness whose session starts from `store`.
fn harness_with(store: SharedStore) -> Harness {
    let exchange = ScriptedExchange::new();
    let session = Arc::new(Session::restore(store.clone()));
    let client = ApiClient::new(exchange.clone(), session.clone());
    let auth = Authenticator::new(client.clone(), session.clone());
    Harness {
        exchange,
        store,
        session,
        client,
        auth,
    }
}

// =========================================================================
// login()
// =========================================================================

#[tokio::test]
async fn test_login_stores_token_and_tags_later_requests() {
    let h = harness();
    h.exchange.respond(
        Method::Post,
        "/login",
        200,
        json!({"access_token": "T1", "username": "admin"}),
    );
    h.exchange.respond(Method::Get, "/users", 200, json!([]));

    let cred = h.auth.login("admin", "pw").await.expect("login");

    assert_eq!(cred.token, "T1");
    assert_eq!(h.session.state(), SessionState::Authenticated);
    assert_eq!(h.store.get(TOKEN_KEY).as_deref(), Some("T1"));
    assert_eq!(h.store.get(USERNAME_KEY).as_deref(), Some("admin"));

    h.client.send(Method::Get, "/users", None).await.expect("users");
    let req = h.exchange.last_request(Method::Get, "/users").unwrap();
    assert_eq!(req.bearer.as_deref(), Some("T1"));

    let login = h.exchange.last_request(Method::Post, "/login").unwrap();
    assert_eq!(login.body, Some(json!({"username": "admin", "password": "pw"})));
}

#[tokio::test]
async fn test_login_without_username_in_response_uses_identifier() {
    let h = harness();
    h.exchange
        .respond(Method::Post, "/login", 200, json!({"access_token": "T1"}));

    let cred = h.auth.login("maria", "pw").await.expect("login");

    assert_eq!(cred.username, "maria");
    assert_eq!(h.session.username().as_deref(), Some("maria"));
}

#[tokio::test]
async fn test_login_bad_credentials_stays_anonymous_without_refresh() {
    let h = harness();
    h.exchange.respond(
        Method::Post,
        "/login",
        401,
        json!({"msg": "Bad username or password"}),
    );

    let result = h.auth.login("admin", "wrong").await;

    assert!(matches!(result, Err(SessionError::AuthFailed(_))));
    let snap = h.session.snapshot();
    assert_eq!(snap.state, SessionState::Anonymous);
    assert!(snap.last_error.is_some());
    assert_eq!(h.exchange.count(Method::Post, "/refresh"), 0);
}

#[tokio::test]
async fn test_login_response_without_token_fails() {
    let h = harness();
    h.exchange
        .respond(Method::Post, "/login", 200, json!({"username": "admin"}));

    let result = h.auth.login("admin", "pw").await;

    assert!(matches!(result, Err(SessionError::AuthFailed(_))));
    assert_eq!(h.session.state(), SessionState::Anonymous);
    assert_eq!(h.store.get(TOKEN_KEY), None);
}

#[tokio::test]
async fn test_login_empty_fields_rejected_locally() {
    let h = harness();

    let result = h.auth.login("   ", "pw").await;

    assert!(matches!(result, Err(SessionError::Validation(_))));
    assert!(h.exchange.requests().is_empty(), "no request should be sent");
}

#[tokio::test]
async fn test_login_server_error_is_transport_error() {
    let h = harness();
    h.exchange
        .respond(Method::Post, "/login", 500, json!({"error": "boom"}));

    let result = h.auth.login("admin", "pw").await;

    assert!(matches!(result, Err(SessionError::Transport(_))));
    assert_eq!(h.session.guard(), RouteDecision::RedirectToLogin);
}

// =========================================================================
// Refresh through the session
// =========================================================================

#[tokio::test]
async fn test_expired_token_is_refreshed_and_persisted() {
    let h = harness();
    h.exchange
        .respond(Method::Post, "/login", 200, json!({"access_token": "T1"}));
    h.exchange
        .respond(Method::Get, "/users", 401, Value::Null)
        .respond(Method::Get, "/users", 200, json!([]));
    h.exchange
        .respond(Method::Post, "/refresh", 200, json!({"access_token": "T2"}));
    h.auth.login("admin", "pw").await.unwrap();

    h.client.send(Method::Get, "/users", None).await.expect("retried");

    assert_eq!(h.session.state(), SessionState::Authenticated);
    assert_eq!(h.store.get(TOKEN_KEY).as_deref(), Some("T2"));
}

#[tokio::test]
async fn test_failed_refresh_tears_session_down() {
    let h = harness();
    h.exchange
        .respond(Method::Post, "/login", 200, json!({"access_token": "T1"}));
    h.exchange.respond(Method::Get, "/users", 401, Value::Null);
    h.exchange.respond(Method::Post, "/refresh", 401, Value::Null);
    h.auth.login("admin", "pw").await.unwrap();

    let result = h.client.send(Method::Get, "/users", None).await;

    assert!(result.is_err());
    assert_eq!(h.session.state(), SessionState::Anonymous);
    assert_eq!(h.session.guard(), RouteDecision::RedirectToLogin);
    assert_eq!(h.store.get(TOKEN_KEY), None);
    assert_eq!(h.exchange.count(Method::Get, "/users"), 1);
}

/// A session restored as alice, whose token the server now rejects.
fn alice_with_expired_token() -> Harness {
    let store = SharedStore(Arc::new(MemoryStore::with_entries([
        (TOKEN_KEY, "ALICE-T1"),
        (USERNAME_KEY, "alice"),
    ])));
    let h = harness_with(store);
    h.exchange
        .respond(Method::Get, "/users", 401, Value::Null)
        .respond(Method::Get, "/users", 200, json!([]));
    h.exchange.respond_after(
        Method::Post,
        "/login",
        Duration::from_millis(10),
        200,
        json!({"access_token": "BOB-T1", "username": "bob"}),
    );
    h
}

#[tokio::test]
async fn test_refresh_finishing_after_new_login_keeps_new_credential() {
    let h = alice_with_expired_token();
    h.exchange.respond_after(
        Method::Post,
        "/refresh",
        Duration::from_millis(50),
        200,
        json!({"access_token": "ALICE-T2"}),
    );

    let (users, login) = tokio::join!(
        h.client.send(Method::Get, "/users", None),
        h.auth.login("bob", "pw"),
    );

    assert!(login.is_ok());
    assert!(users.is_ok());
    let credential = h.session.credential().unwrap();
    assert_eq!(credential.username, "bob");
    assert_eq!(credential.token, "BOB-T1");
    assert_eq!(h.store.get(TOKEN_KEY).as_deref(), Some("BOB-T1"));
    assert_eq!(h.store.get(USERNAME_KEY).as_deref(), Some("bob"));
    // The interrupted request is retried under the session's live token.
    let retried = h.exchange.last_request(Method::Get, "/users").unwrap();
    assert_eq!(retried.bearer.as_deref(), Some("BOB-T1"));
}

#[tokio::test]
async fn test_refresh_failing_after_new_login_keeps_session() {
    let h = alice_with_expired_token();
    h.exchange.respond_after(
        Method::Post,
        "/refresh",
        Duration::from_millis(50),
        401,
        Value::Null,
    );

    let (users, login) = tokio::join!(
        h.client.send(Method::Get, "/users", None),
        h.auth.login("bob", "pw"),
    );

    assert!(login.is_ok());
    assert!(users.is_err());
    assert_eq!(h.session.state(), SessionState::Authenticated);
    assert_eq!(h.session.username().as_deref(), Some("bob"));
    assert_eq!(h.store.get(TOKEN_KEY).as_deref(), Some("BOB-T1"));
}

#[tokio::test]
async fn test_concurrent_401s_share_one_refresh() {
    let h = harness();
    h.exchange
        .respond(Method::Post, "/login", 200, json!({"access_token": "T1"}));
    h.auth.login("admin", "pw").await.unwrap();
    h.exchange
        .respond(Method::Get, "/users", 401, Value::Null)
        .respond(Method::Get, "/users", 200, json!([]));
    h.exchange
        .respond_after(Method::Get, "/rewards", Duration::from_millis(30), 401, Value::Null)
        .respond(Method::Get, "/rewards", 200, json!([]));
    h.exchange
        .respond(Method::Post, "/refresh", 200, json!({"access_token": "T2"}));

    let (users, rewards) = tokio::join!(
        h.client.send(Method::Get, "/users", None),
        h.client.send(Method::Get, "/rewards", None),
    );

    assert!(users.is_ok() && rewards.is_ok());
    assert_eq!(h.exchange.count(Method::Post, "/refresh"), 1);
    assert_eq!(h.store.get(TOKEN_KEY).as_deref(), Some("T2"));
}

// =========================================================================
// restore() / logout()
// =========================================================================

#[tokio::test]
async fn test_restored_session_tags_requests_without_validation() {
    let exchange = ScriptedExchange::new();
    exchange.respond(Method::Get, "/rewards", 200, json!([]));
    let store = MemoryStore::with_entries([(TOKEN_KEY, "persisted"), (USERNAME_KEY, "admin")]);
    let session = Arc::new(Session::restore(store));
    let client = ApiClient::new(exchange.clone(), session.clone());

    assert_eq!(session.state(), SessionState::Authenticated);
    assert!(exchange.requests().is_empty(), "restore must not hit the server");

    client.send(Method::Get, "/rewards", None).await.unwrap();
    let req = exchange.last_request(Method::Get, "/rewards").unwrap();
    assert_eq!(req.bearer.as_deref(), Some("persisted"));
}

#[tokio::test]
async fn test_logout_then_requests_are_unauthenticated() {
    let h = harness();
    h.exchange
        .respond(Method::Post, "/login", 200, json!({"access_token": "T1"}));
    h.exchange.respond(Method::Get, "/rewards", 200, json!([]));
    h.auth.login("admin", "pw").await.unwrap();

    h.auth.logout();
    h.auth.logout();

    h.client.send(Method::Get, "/rewards", None).await.unwrap();
    let req = h.exchange.last_request(Method::Get, "/rewards").unwrap();
    assert!(req.bearer.is_none());
    assert_eq!(h.store.get(TOKEN_KEY), None);
}
