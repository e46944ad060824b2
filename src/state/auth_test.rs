use super::*;
use crate::net::test_helpers::{Harness, harness, harness_with_storage, url};
use crate::net::transport::HttpResponse;
use crate::state::session::SessionPhase;
use crate::util::storage::{DurableStorage, MemoryStorage, TOKEN_KEY, USER_KEY};
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;

fn store(h: &Harness) -> AuthStore {
    AuthStore::new(h.api.clone())
}

// =============================================================
// login
// =============================================================

#[tokio::test]
async fn login_with_inline_identity_authenticates() {
    let h = harness();
    h.transport.push_json(
        200,
        json!({ "token": "abc", "user": { "id": "1", "email": "admin@mynute.com" } }),
    );

    let result = store(&h).login("admin@mynute.com", "admin123").await;

    assert_eq!(result, ActionResult::done());
    assert!(h.session.is_authenticated());
    assert_eq!(h.session.token().as_deref(), Some("abc"));
    assert_eq!(h.session.user().unwrap().id, "1");
    assert_eq!(h.transport.request_count(), 1);
    assert_eq!(h.storage.get(TOKEN_KEY).as_deref(), Some("abc"));
    assert!(h.storage.get(USER_KEY).unwrap().contains("admin@mynute.com"));
}

#[tokio::test]
async fn login_sends_credentials_without_session_token() {
    let h = harness();
    h.transport.push_json(200, json!({ "token": "abc", "user": { "id": "1", "email": "a@b.com" } }));

    store(&h).login(" a@b.com ", "pw").await;

    let request = h.transport.last_request();
    assert_eq!(request.method, Method::Post);
    assert_eq!(request.url, url(LOGIN_PATH));
    assert!(request.header("Authorization").is_none());
    assert_eq!(request.header("content-type"), Some("application/json"));
    let body: serde_json::Value = serde_json::from_str(request.body.as_deref().unwrap()).unwrap();
    assert_eq!(body, json!({ "email": "a@b.com", "password": "pw" }));
}

#[tokio::test]
async fn login_rejected_credentials_surface_server_message() {
    let h = harness();
    h.transport.push_json(401, json!({ "message": "invalid credentials" }));

    let result = store(&h).login("admin@mynute.com", "wrong").await;

    assert_eq!(result, ActionResult::failed("invalid credentials"));
    assert_eq!(h.session.phase(), SessionPhase::Anonymous);
    assert!(h.storage.is_empty());
}

#[tokio::test]
async fn login_accepts_enveloped_response() {
    let h = harness();
    h.transport.push_json(
        200,
        json!({ "data": { "token": "abc", "user": { "id": "1", "email": "a@b.com" } } }),
    );

    let result = store(&h).login("a@b.com", "pw").await;

    assert!(result.success);
    assert_eq!(h.session.token().as_deref(), Some("abc"));
}

#[tokio::test]
async fn login_header_token_triggers_single_identity_lookup() {
    let h = harness();
    h.transport.push_response(HttpResponse {
        status: 200,
        status_text: "OK".into(),
        headers: vec![("x-auth-token".into(), "hdr-token".into())],
        body: String::new(),
    });
    h.transport.push_json(200, json!({ "data": { "id": "9", "name": "Ana", "email": "ana@mynute.com", "roles": ["superadmin"] } }));

    let result = store(&h).login("ana@mynute.com", "pw").await;

    assert!(result.success);
    assert_eq!(h.transport.request_count(), 2);
    let lookup = h.transport.last_request();
    assert_eq!(lookup.method, Method::Get);
    assert_eq!(lookup.url, url("/admin/email/ana@mynute.com"));
    assert_eq!(lookup.header("Authorization"), Some("Bearer hdr-token"));
    let user = h.session.user().unwrap();
    assert_eq!(user.id, "9");
    assert_eq!(user.role.as_deref(), Some("superadmin"));
    assert_eq!(h.session.token().as_deref(), Some("hdr-token"));
}

#[tokio::test]
async fn login_lookup_escapes_reserved_characters_in_email() {
    let h = harness();
    h.transport.push_json(200, json!({ "token": "abc" }));
    h.transport.push_json(200, json!({ "id": "7", "email": "a#b?c@mynute.com" }));

    store(&h).login("a#b?c@mynute.com", "pw").await;

    let lookup = h.transport.last_request();
    assert_eq!(lookup.url, url("/admin/email/a%23b%3Fc@mynute.com"));
    assert_eq!(h.session.user().unwrap().id, "7");
}

#[test]
fn identity_lookup_path_escapes_slash() {
    assert_eq!(identity_lookup_path("x/y@mynute.com"), "/admin/email/x%2Fy@mynute.com");
    assert_eq!(identity_lookup_path("ana+ops@mynute.com"), "/admin/email/ana+ops@mynute.com");
}

#[tokio::test]
async fn login_failed_lookup_degrades_to_email_identity() {
    let h = harness();
    h.transport.push_json(200, json!({ "token": "abc" }));
    h.transport.push_json(404, json!({ "error": "not found" }));

    let result = store(&h).login("ana@mynute.com", "pw").await;

    assert!(result.success);
    assert_eq!(h.transport.request_count(), 2);
    assert_eq!(h.session.user(), Some(User::from_email("ana@mynute.com")));
    assert!(h.session.is_authenticated());
}

#[tokio::test]
async fn login_without_any_token_fails_without_mutation() {
    let h = harness();
    h.transport.push_json(200, json!({ "user": { "id": "1", "email": "a@b.com" } }));

    let result = store(&h).login("a@b.com", "pw").await;

    assert_eq!(result, ActionResult::failed("No auth token received"));
    assert!(h.session.token().is_none());
    assert!(h.session.user().is_none());
    assert_eq!(h.transport.request_count(), 1);
}

#[tokio::test]
async fn login_transport_failure_reports_error() {
    let h = harness();
    h.transport.push_failure("dns error");

    let result = store(&h).login("a@b.com", "pw").await;

    assert_eq!(result, ActionResult::failed("dns error"));
    assert!(!h.session.is_authenticated());
}

#[tokio::test]
async fn loading_is_false_after_every_login_outcome() {
    for outcome in ["success", "rejected", "transport"] {
        let h = harness();
        match outcome {
            "success" => h.transport.push_json(200, json!({ "token": "t", "user": { "id": "1", "email": "a@b.com" } })),
            "rejected" => h.transport.push_json(401, json!({ "message": "invalid credentials" })),
            _ => h.transport.push_failure("offline"),
        }

        store(&h).login("a@b.com", "pw").await;

        assert!(!h.session.is_loading(), "loading left high after {outcome}");
    }
}

#[tokio::test]
async fn login_publishes_loading_then_authenticated() {
    let h = harness();
    let phases = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&phases);
    h.session.subscribe(move |s| sink.borrow_mut().push(s.phase()));
    h.transport.push_json(200, json!({ "token": "t", "user": { "id": "1", "email": "a@b.com" } }));

    store(&h).login("a@b.com", "pw").await;

    assert_eq!(
        *phases.borrow(),
        vec![SessionPhase::Authenticating, SessionPhase::Authenticating, SessionPhase::Authenticated]
    );
}

#[tokio::test]
async fn login_refused_while_another_is_in_flight() {
    let h = harness();
    let auth = store(&h);
    let _held = h.session.begin_loading();

    let result = auth.login("a@b.com", "pw").await;

    assert_eq!(result, ActionResult::failed("Login already in progress"));
    assert_eq!(h.transport.request_count(), 0);
}

// =============================================================
// logout
// =============================================================

#[tokio::test]
async fn logout_after_login_clears_everything() {
    let h = harness();
    h.transport.push_json(200, json!({ "token": "t", "user": { "id": "1", "email": "a@b.com" } }));
    let auth = store(&h);
    auth.login("a@b.com", "pw").await;

    auth.logout();
    auth.logout();

    assert_eq!(h.session.phase(), SessionPhase::Anonymous);
    assert!(h.storage.get(TOKEN_KEY).is_none());
    assert!(h.storage.get(USER_KEY).is_none());
    assert_eq!(h.transport.request_count(), 1);
}

// =============================================================
// check_auth
// =============================================================

#[test]
fn check_auth_without_token_stays_anonymous() {
    let h = harness();
    let auth = store(&h);
    auth.check_auth();
    assert_eq!(h.session.phase(), SessionPhase::Anonymous);
    assert!(!h.session.is_loading());
}

#[test]
fn check_auth_trusts_cached_identity_without_network() {
    let storage = MemoryStorage::with_entries([
        (TOKEN_KEY, "abc"),
        (USER_KEY, r#"{"id":"1","name":"Admin","email":"admin@mynute.com"}"#),
    ]);
    let h = harness_with_storage(storage);

    store(&h).check_auth();

    assert!(h.session.is_authenticated());
    assert_eq!(h.transport.request_count(), 0);
}

#[test]
fn check_auth_with_token_but_no_identity_forces_logout() {
    let h = harness_with_storage(MemoryStorage::with_entries([(TOKEN_KEY, "abc")]));

    store(&h).check_auth();

    assert_eq!(h.session.phase(), SessionPhase::Anonymous);
    assert!(h.session.token().is_none());
    assert!(h.storage.is_empty());
    assert_eq!(h.transport.request_count(), 0);
}

#[test]
fn check_auth_discards_email_only_identity() {
    let h = harness_with_storage(MemoryStorage::with_entries([
        (TOKEN_KEY, "abc"),
        (USER_KEY, r#"{"email":"admin@mynute.com"}"#),
    ]));

    store(&h).check_auth();

    assert!(!h.session.is_authenticated());
    assert!(h.storage.is_empty());
}

#[test]
fn check_auth_identity_without_token_is_cleared() {
    let h = harness_with_storage(MemoryStorage::with_entries([(
        USER_KEY,
        r#"{"id":"1","email":"admin@mynute.com"}"#,
    )]));

    store(&h).check_auth();

    assert!(h.session.user().is_none());
    assert!(h.storage.is_empty());
}

#[tokio::test]
async fn check_auth_during_login_keeps_in_flight_guard() {
    let h = harness();
    let auth = store(&h);
    let _held = h.session.begin_loading();

    auth.check_auth();

    assert!(h.session.is_loading());
    assert_eq!(h.session.phase(), SessionPhase::Authenticating);
    let second = auth.login("a@b.com", "pw").await;
    assert_eq!(second, ActionResult::failed("Login already in progress"));
    assert_eq!(h.transport.request_count(), 0);
}

// =============================================================
// invariant
// =============================================================

#[tokio::test]
async fn authenticated_matches_token_and_user_across_transitions() {
    let h = harness_with_storage(MemoryStorage::with_entries([(TOKEN_KEY, "stale")]));
    let violations = Rc::new(RefCell::new(0));
    let sink = Rc::clone(&violations);
    h.session.subscribe(move |s| {
        if s.is_authenticated() != (s.token.is_some() && s.user.is_some()) {
            *sink.borrow_mut() += 1;
        }
    });
    let auth = store(&h);
    let check = |expect_auth: bool| {
        let s = h.session.state();
        assert_eq!(s.is_authenticated(), s.token.is_some() && s.user.is_some());
        assert_eq!(s.is_authenticated(), expect_auth);
    };

    check(false);
    auth.check_auth();
    check(false);
    h.transport.push_json(401, json!({ "message": "bad" }));
    auth.login("a@b.com", "pw").await;
    check(false);
    h.transport.push_json(200, json!({ "token": "t", "user": { "id": "1", "email": "a@b.com" } }));
    auth.login("a@b.com", "pw").await;
    check(true);
    auth.logout();
    check(false);
    assert_eq!(*violations.borrow(), 0);
}
