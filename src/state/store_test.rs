use super::*;
use crate::net::test_helpers::{harness, signed_in_harness, url};
use crate::net::types::Client;
use serde_json::json;

fn client(id: &str, name: &str) -> Client {
    Client { id: id.into(), name: name.into(), ..Client::default() }
}

// =============================================================
// ActionResult
// =============================================================

#[test]
fn action_result_serializes_like_ui_expects() {
    let ok = serde_json::to_value(ActionResult::done()).unwrap();
    assert_eq!(ok, json!({ "success": true }));

    let failed = serde_json::to_value(ActionResult::<()>::failed("nope")).unwrap();
    assert_eq!(failed, json!({ "success": false, "error": "nope" }));

    let with_data = serde_json::to_value(ActionResult::ok(7)).unwrap();
    assert_eq!(with_data, json!({ "success": true, "data": 7 }));
}

#[test]
fn discard_keeps_status_and_error() {
    let result = ActionResult::<u8>::failed("x").discard();
    assert_eq!(result, ActionResult { success: false, data: None, error: Some("x".into()) });
}

// =============================================================
// surface_error
// =============================================================

#[test]
fn surface_error_logs_out_on_auth_invalid() {
    let h = signed_in_harness();
    let text = surface_error(&h.session, &ApiError::AuthInvalid { message: "token expired".into() });
    assert_eq!(text, "token expired");
    assert!(!h.session.is_authenticated());
}

#[test]
fn surface_error_keeps_session_for_other_errors() {
    let h = signed_in_harness();
    let text = surface_error(&h.session, &ApiError::Api { status: 500, message: "boom".into() });
    assert_eq!(text, "boom");
    assert!(h.session.is_authenticated());
}

// =============================================================
// Busy
// =============================================================

#[test]
fn busy_resets_flag_on_drop() {
    let flag = Observable::new(false);
    {
        let _busy = Busy::start(&flag);
        assert!(flag.get());
    }
    assert!(!flag.get());
}

// =============================================================
// Collection
// =============================================================

#[tokio::test]
async fn fetch_list_replaces_cache_wholesale() {
    let h = harness();
    let collection: Collection<Client> = Collection::new();
    collection.items.set(vec![client("old", "Old")]);
    h.transport.push_json(200, json!([{ "id": "1", "name": "Ana" }, { "id": "2", "name": "Bo" }]));

    collection.fetch_list(&h.api, "/admin/clients").await;

    let ids: Vec<String> = collection.items().into_iter().map(|c| c.id).collect();
    assert_eq!(ids, vec!["1", "2"]);
    assert!(!collection.loading.get());
    assert!(collection.error.get().is_none());
}

#[tokio::test]
async fn fetch_list_failure_keeps_cache_and_records_error() {
    let h = harness();
    let collection: Collection<Client> = Collection::new();
    collection.items.set(vec![client("1", "Ana")]);
    h.transport.push_json(500, json!({ "error": "database down" }));

    collection.fetch_list(&h.api, "/admin/clients").await;

    assert_eq!(collection.len(), 1);
    assert_eq!(collection.error.get().as_deref(), Some("database down"));
    assert!(!collection.loading.get());
}

#[tokio::test]
async fn fetch_list_clears_previous_error() {
    let h = harness();
    let collection: Collection<Client> = Collection::new();
    collection.error.set(Some("stale".into()));
    h.transport.push_json(200, json!({ "data": [] }));

    collection.fetch_list(&h.api, "/admin/clients").await;

    assert!(collection.error.get().is_none());
    assert!(collection.is_empty());
}

#[tokio::test]
async fn loading_is_observed_high_during_fetch() {
    let h = harness();
    let collection: Collection<Client> = Collection::new();
    let seen = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
    let sink = std::rc::Rc::clone(&seen);
    collection.loading.subscribe(move |v| sink.borrow_mut().push(*v));
    h.transport.push_json(200, json!([]));

    collection.fetch_list(&h.api, "/admin/clients").await;

    assert_eq!(*seen.borrow(), vec![true, false]);
}

#[tokio::test]
async fn update_replaces_only_matching_record_and_selection() {
    let h = harness();
    let collection: Collection<Client> = Collection::new();
    collection.items.set(vec![client("1", "Ana"), client("2", "Bo")]);
    collection.selected.set(Some(client("2", "Bo")));
    h.transport.push_json(200, json!({ "data": { "id": "2", "name": "Bob" } }));

    let result = collection.update(&h.api, Method::Put, "/client/2", "2", &json!({ "name": "Bob" })).await;

    assert!(result.success);
    assert_eq!(collection.find("1").unwrap().name, "Ana");
    assert_eq!(collection.find("2").unwrap().name, "Bob");
    assert_eq!(collection.selected.get().unwrap().name, "Bob");
}

#[tokio::test]
async fn remove_forgets_record_and_selection() {
    let h = harness();
    let collection: Collection<Client> = Collection::new();
    collection.items.set(vec![client("1", "Ana"), client("2", "Bo")]);
    collection.selected.set(Some(client("1", "Ana")));
    h.transport.push_raw(200, "");

    let result = collection.remove(&h.api, "/client/1", "1").await;

    assert_eq!(result, ActionResult::done());
    assert!(collection.find("1").is_none());
    assert!(collection.selected.get().is_none());
    assert_eq!(h.transport.last_request().url, url("/client/1"));
}

#[tokio::test]
async fn auth_invalid_during_create_signs_out() {
    let h = signed_in_harness();
    let collection: Collection<Client> = Collection::new();
    h.transport.push_json(401, json!({ "message": "token expired" }));

    let result = collection.create(&h.api, "/client", &json!({ "name": "Ana" })).await;

    assert_eq!(result.error.as_deref(), Some("token expired"));
    assert!(!h.session.is_authenticated());
    assert!(h.storage.is_empty());
    assert!(collection.is_empty());
}
