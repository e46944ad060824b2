//! Scripted transport and wiring shared by store tests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use serde_json::Value;

use super::api::ApiClient;
use super::transport::{HttpRequest, HttpResponse, HttpTransport, Method, TransportError};
use crate::config::ClientConfig;
use crate::state::session::Session;
use crate::util::storage::{DurableStorage, MemoryStorage};

/// Replays queued responses in order and records every request it sees.
/// An exhausted queue behaves like an unreachable server.
#[derive(Default)]
pub struct MockTransport {
    responses: RefCell<VecDeque<Result<HttpResponse, TransportError>>>,
    requests: RefCell<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn push_json(&self, status: u16, body: Value) {
        self.push_raw(status, &body.to_string());
    }

    pub fn push_raw(&self, status: u16, body: &str) {
        self.push_response(HttpResponse {
            status,
            status_text: String::new(),
            headers: Vec::new(),
            body: body.to_owned(),
        });
    }

    pub fn push_response(&self, response: HttpResponse) {
        self.responses.borrow_mut().push_back(Ok(response));
    }

    pub fn push_failure(&self, message: &str) {
        self.responses.borrow_mut().push_back(Err(TransportError(message.to_owned())));
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.borrow().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }

    pub fn last_request(&self) -> HttpRequest {
        self.requests.borrow().last().cloned().expect("no request was sent")
    }

    /// `(method, url)` pairs for compact assertions.
    pub fn calls(&self) -> Vec<(Method, String)> {
        self.requests.borrow().iter().map(|r| (r.method, r.url.clone())).collect()
    }
}

#[async_trait::async_trait(?Send)]
impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.borrow_mut().push(request);
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError("connection refused".to_owned())))
    }
}

/// Everything a store test needs, wired the way an app would wire it.
pub struct Harness {
    pub transport: Rc<MockTransport>,
    pub storage: Rc<MemoryStorage>,
    pub session: Session,
    pub api: ApiClient,
}

pub const TEST_ORIGIN: &str = "http://backend.test";

pub fn url(path: &str) -> String {
    format!("{TEST_ORIGIN}/api{path}")
}

pub fn harness() -> Harness {
    harness_with_storage(MemoryStorage::new())
}

pub fn harness_with_storage(storage: MemoryStorage) -> Harness {
    let transport = MockTransport::new();
    let storage = Rc::new(storage);
    let session = Session::restore(Rc::clone(&storage) as Rc<dyn DurableStorage>);
    let config = ClientConfig::new(TEST_ORIGIN).expect("valid test origin");
    let api = ApiClient::new(config, Rc::clone(&transport) as Rc<dyn HttpTransport>, session.clone());
    Harness { transport, storage, session, api }
}

/// Harness whose session already holds a token and a complete identity.
pub fn signed_in_harness() -> Harness {
    let storage = MemoryStorage::with_entries([
        (crate::util::storage::TOKEN_KEY, "tok-1"),
        (
            crate::util::storage::USER_KEY,
            r#"{"id":"u1","name":"Root","email":"root@mynute.com"}"#,
        ),
    ]);
    harness_with_storage(storage)
}
