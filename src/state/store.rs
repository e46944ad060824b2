//! Building blocks shared by the domain stores.
//!
//! DESIGN
//! ======
//! Admins, companies and clients are the same CRUD shape over different paths,
//! so the cache handling lives once in [`Collection`]: lists are replaced
//! wholesale on fetch, then patched by id on create/update/delete. The cache is
//! never reconciled beyond that; the backend stays the source of truth.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::observable::Observable;
use super::session::Session;
use crate::net::api::{ApiClient, ApiError, RequestDescriptor};
use crate::net::transport::Method;
use crate::net::types::Record;

/// Outcome of a store mutation, shaped for direct display.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ActionResult<T = ()> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ActionResult<T> {
    pub fn ok(data: T) -> Self {
        Self { success: true, data: Some(data), error: None }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self { success: false, data: None, error: Some(message.into()) }
    }

    /// Drop the payload, keeping success/error.
    pub fn discard(self) -> ActionResult {
        ActionResult { success: self.success, data: None, error: self.error }
    }
}

impl ActionResult {
    pub fn done() -> Self {
        Self { success: true, data: None, error: None }
    }
}

/// Turn an API error into display text, forcing a logout first when the
/// session token was rejected.
pub(crate) fn surface_error(session: &Session, err: &ApiError) -> String {
    if err.is_auth_invalid() {
        tracing::info!("session token rejected; signing out");
        session.logout();
    }
    err.to_string()
}

/// Holds a `bool` observable high until dropped.
pub(crate) struct Busy<'a>(&'a Observable<bool>);

impl<'a> Busy<'a> {
    pub(crate) fn start(flag: &'a Observable<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for Busy<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

// =============================================================================
// COLLECTION
// =============================================================================

/// Observable cache of one resource type plus its fetch status.
#[derive(Clone, Debug)]
pub struct Collection<T> {
    pub items: Observable<Vec<T>>,
    pub selected: Observable<Option<T>>,
    pub loading: Observable<bool>,
    pub error: Observable<Option<String>>,
}

impl<T: Clone + 'static> Default for Collection<T> {
    fn default() -> Self {
        Self {
            items: Observable::new(Vec::new()),
            selected: Observable::new(None),
            loading: Observable::new(false),
            error: Observable::new(None),
        }
    }
}

impl<T> Collection<T>
where
    T: Record + Clone + DeserializeOwned + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> Vec<T> {
        self.items.get()
    }

    pub fn find(&self, id: &str) -> Option<T> {
        self.items.with(|items| items.iter().find(|item| item.id() == id).cloned())
    }

    pub fn len(&self) -> usize {
        self.items.with(Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replace the cache with the list at `path`. Failures land in `error`.
    pub(crate) async fn fetch_list(&self, api: &ApiClient, path: &str) {
        self.fetch_into(api, path, &self.items).await;
    }

    /// Load one record into `selected`. Failures land in `error`.
    pub(crate) async fn fetch_one(&self, api: &ApiClient, path: &str) {
        let _busy = Busy::start(&self.loading);
        self.error.set(None);
        match api.get::<T>(path).await {
            Ok(record) => self.selected.set(Some(record)),
            Err(e) => {
                tracing::warn!(%path, error = %e, "fetch failed");
                self.error.set(Some(surface_error(api.session(), &e)));
            }
        }
    }

    /// Fetch a list at `path` into an arbitrary observable, sharing this
    /// collection's loading/error status.
    pub(crate) async fn fetch_into<R: DeserializeOwned + Clone + 'static>(
        &self,
        api: &ApiClient,
        path: &str,
        target: &Observable<Vec<R>>,
    ) {
        let _busy = Busy::start(&self.loading);
        self.error.set(None);
        match api.list::<R>(RequestDescriptor::new(Method::Get, path)).await {
            Ok(records) => target.set(records),
            Err(e) => {
                tracing::warn!(%path, error = %e, "fetch failed");
                self.error.set(Some(surface_error(api.session(), &e)));
            }
        }
    }

    /// `POST` a new record and append the server's copy.
    pub(crate) async fn create<B: Serialize + ?Sized>(&self, api: &ApiClient, path: &str, body: &B) -> ActionResult<T> {
        match api.post::<T, B>(path, body).await {
            Ok(record) => {
                self.items.update(|items| items.push(record.clone()));
                ActionResult::ok(record)
            }
            Err(e) => ActionResult::failed(surface_error(api.session(), &e)),
        }
    }

    /// Send an update for `id` and replace the cached record (and `selected`
    /// when it is the same record).
    pub(crate) async fn update<B: Serialize + ?Sized>(
        &self,
        api: &ApiClient,
        method: Method,
        path: &str,
        id: &str,
        body: &B,
    ) -> ActionResult<T> {
        let descriptor = match RequestDescriptor::new(method, path).json(body) {
            Ok(descriptor) => descriptor,
            Err(e) => return ActionResult::failed(e.to_string()),
        };
        match api.request::<T>(descriptor).await {
            Ok(record) => {
                self.replace(id, &record);
                ActionResult::ok(record)
            }
            Err(e) => ActionResult::failed(surface_error(api.session(), &e)),
        }
    }

    /// `DELETE` the record and drop it from the cache (and `selected`).
    pub(crate) async fn remove(&self, api: &ApiClient, path: &str, id: &str) -> ActionResult {
        match api.delete(path).await {
            Ok(()) => {
                self.forget(id);
                ActionResult::done()
            }
            Err(e) => ActionResult::failed(surface_error(api.session(), &e)),
        }
    }

    fn replace(&self, id: &str, record: &T) {
        self.items.update(|items| {
            for item in items.iter_mut().filter(|item| item.id() == id) {
                *item = record.clone();
            }
        });
        if self.selected.with(|s| s.as_ref().is_some_and(|s| s.id() == id)) {
            self.selected.set(Some(record.clone()));
        }
    }

    fn forget(&self, id: &str) {
        self.items.update(|items| items.retain(|item| item.id() != id));
        if self.selected.with(|s| s.as_ref().is_some_and(|s| s.id() == id)) {
            self.selected.set(None);
        }
    }
}
