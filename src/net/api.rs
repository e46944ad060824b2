//! REST request pipeline shared by every store.
//!
//! SYSTEM CONTEXT
//! ==============
//! All backend traffic goes through [`ApiClient`]. It attaches the session
//! token, serializes bodies, and turns raw responses into either a decoded
//! payload or an [`ApiError`] whose text is safe to show in the UI.
//!
//! ERROR HANDLING
//! ==============
//! Expected conditions never panic. A 401 on a request that carried the session
//! token is reported as [`ApiError::AuthInvalid`]; stores react to it by forcing
//! a logout. The client itself never mutates the session.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::rc::Rc;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::transport::{HttpRequest, HttpResponse, HttpTransport, Method};
use crate::config::ClientConfig;
use crate::state::session::Session;

pub const AUTHORIZATION_HEADER: &str = "Authorization";
/// Header the backend uses both to accept and to hand out session tokens.
pub const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";
const CONTENT_TYPE_HEADER: &str = "Content-Type";
const JSON_CONTENT_TYPE: &str = "application/json";

/// Bytes escaped inside a single path segment. `@` and `+` stay literal so
/// email segments read the way the backend routes them.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b',')
    .add(b'/')
    .add(b';')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Percent-encode a value interpolated into one path segment (ids, emails).
pub fn path_segment(raw: &str) -> String {
    utf8_percent_encode(raw, PATH_SEGMENT).to_string()
}

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by [`ApiClient`] calls.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The request never produced an HTTP response.
    #[error("{0}")]
    Transport(String),

    /// The backend answered with a non-success status.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// A non-empty body was not valid JSON, or did not match the expected shape.
    #[error("invalid response: {0}")]
    Decode(String),

    /// The request body could not be serialized.
    #[error("invalid request body: {0}")]
    Encode(String),

    /// The session token was rejected (or is missing where one is required).
    #[error("{message}")]
    AuthInvalid { message: String },
}

impl ApiError {
    pub fn is_auth_invalid(&self) -> bool {
        matches!(self, Self::AuthInvalid { .. })
    }

    /// HTTP status for server-side failures, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::AuthInvalid { .. } => Some(401),
            _ => None,
        }
    }
}

// =============================================================================
// REQUEST DESCRIPTOR
// =============================================================================

/// Outbound body: a JSON value, or text that is already serialized.
#[derive(Clone, Debug, PartialEq)]
pub enum RequestBody {
    Json(Value),
    Raw(String),
}

/// One outbound call, built per request and then discarded.
#[derive(Clone, Debug, PartialEq)]
pub struct RequestDescriptor {
    pub method: Method,
    /// Path relative to the configured API prefix.
    pub path: String,
    pub body: Option<RequestBody>,
    /// Applied after the default headers, so they override them.
    pub extra_headers: Vec<(String, String)>,
    /// When `false` the session token is never attached.
    pub authenticated: bool,
}

impl RequestDescriptor {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            extra_headers: Vec::new(),
            authenticated: true,
        }
    }

    /// Attach a serializable JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Encode`] if `body` cannot be represented as JSON.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body).map_err(|e| ApiError::Encode(e.to_string()))?;
        self.body = Some(RequestBody::Json(value));
        Ok(self)
    }

    /// Attach a body that is already JSON text; it is sent untouched.
    #[must_use]
    pub fn raw_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(RequestBody::Raw(body.into()));
        self
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.push((name.into(), value.into()));
        self
    }

    /// Send the request with an explicit token instead of the session's.
    #[must_use]
    pub fn bearer(self, token: &str) -> Self {
        self.header(AUTHORIZATION_HEADER, format!("Bearer {token}"))
            .header(AUTH_TOKEN_HEADER, token)
    }

    /// Never attach the session token.
    #[must_use]
    pub fn anonymous(mut self) -> Self {
        self.authenticated = false;
        self
    }
}

/// A successful response after decoding and envelope normalization.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiReply {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Value,
}

impl ApiReply {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

// =============================================================================
// CLIENT
// =============================================================================

/// Cheap-to-clone handle; clones share the transport and the session.
#[derive(Clone)]
pub struct ApiClient {
    transport: Rc<dyn HttpTransport>,
    config: Rc<ClientConfig>,
    session: Session,
}

impl ApiClient {
    pub fn new(config: ClientConfig, transport: Rc<dyn HttpTransport>, session: Session) -> Self {
        Self { transport, config: Rc::new(config), session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Execute a request and return the normalized body plus headers.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure, non-2xx status, or an
    /// undecodable body.
    pub async fn send(&self, descriptor: RequestDescriptor) -> Result<ApiReply, ApiError> {
        let (request, token_attached) = self.prepare(descriptor);
        let method = request.method;
        let url = request.url.clone();
        tracing::debug!(%method, %url, "api request");

        let response = self.transport.send(request).await.map_err(|e| {
            tracing::debug!(%method, %url, error = %e, "api transport failure");
            ApiError::Transport(e.0)
        })?;
        tracing::debug!(%method, %url, status = response.status, "api response");

        interpret_response(response, token_attached)
    }

    /// Execute a request and decode the normalized body into `T`.
    ///
    /// # Errors
    ///
    /// Same as [`ApiClient::send`], plus [`ApiError::Decode`] when the body does
    /// not match `T`.
    pub async fn request<T: DeserializeOwned>(&self, descriptor: RequestDescriptor) -> Result<T, ApiError> {
        let reply = self.send(descriptor).await?;
        serde_json::from_value(reply.body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Execute a request whose body is a collection.
    ///
    /// # Errors
    ///
    /// Same as [`ApiClient::request`].
    pub async fn list<T: DeserializeOwned>(&self, descriptor: RequestDescriptor) -> Result<Vec<T>, ApiError> {
        let reply = self.send(descriptor).await?;
        decode_list(reply.body)
    }

    /// `GET path` decoded into `T`.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(RequestDescriptor::new(Method::Get, path)).await
    }

    /// `POST path` with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        self.request(RequestDescriptor::new(Method::Post, path).json(body)?).await
    }

    /// `PUT path` with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        self.request(RequestDescriptor::new(Method::Put, path).json(body)?).await
    }

    /// `PATCH path` with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        self.request(RequestDescriptor::new(Method::Patch, path).json(body)?).await
    }

    /// `DELETE path`. The response body is ignored, so an empty 200/204 is a
    /// success.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure or non-2xx status.
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let (request, token_attached) = self.prepare(RequestDescriptor::new(Method::Delete, path));
        let url = request.url.clone();
        tracing::debug!(method = %Method::Delete, %url, "api request");
        let response = self.transport.send(request).await.map_err(|e| ApiError::Transport(e.0))?;
        tracing::debug!(method = %Method::Delete, %url, status = response.status, "api response");
        if response.is_success() {
            return Ok(());
        }
        Err(failure_error(&response, token_attached))
    }

    fn prepare(&self, descriptor: RequestDescriptor) -> (HttpRequest, bool) {
        let mut headers = vec![(CONTENT_TYPE_HEADER.to_owned(), JSON_CONTENT_TYPE.to_owned())];

        let token = descriptor.authenticated.then(|| self.session.token()).flatten();
        let token_attached = token.is_some();
        if let Some(token) = token {
            headers.push((AUTHORIZATION_HEADER.to_owned(), format!("Bearer {token}")));
            headers.push((AUTH_TOKEN_HEADER.to_owned(), token));
        }

        for (name, value) in descriptor.extra_headers {
            headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(&name));
            headers.push((name, value));
        }

        let body = descriptor.body.map(|body| match body {
            RequestBody::Json(value) => value.to_string(),
            RequestBody::Raw(text) => text,
        });

        let request = HttpRequest {
            method: descriptor.method,
            url: self.config.url_for(&descriptor.path),
            headers,
            body,
        };
        (request, token_attached)
    }
}

// =============================================================================
// RESPONSE INTERPRETATION
// =============================================================================

/// Turn a raw response into a normalized reply or an error.
fn interpret_response(response: HttpResponse, token_attached: bool) -> Result<ApiReply, ApiError> {
    if !response.is_success() {
        return Err(failure_error(&response, token_attached));
    }
    let body = decode_body(&response.body)?;
    Ok(ApiReply {
        status: response.status,
        headers: response.headers,
        body: unwrap_envelope(body),
    })
}

fn failure_error(response: &HttpResponse, token_attached: bool) -> ApiError {
    let message = failure_message(response);
    if response.status == 401 && token_attached {
        return ApiError::AuthInvalid { message };
    }
    ApiError::Api { status: response.status, message }
}

/// Decode response text; empty text is an empty object.
///
/// # Errors
///
/// Returns [`ApiError::Decode`] for non-empty text that is not JSON.
pub fn decode_body(raw: &str) -> Result<Value, ApiError> {
    if raw.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_str(raw).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Strip one `{ "data": ... }` envelope level. Anything else passes through.
pub fn unwrap_envelope(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.get("data").is_some_and(|data| !data.is_null()) => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Decode a normalized body that should be a collection.
///
/// # Errors
///
/// Returns [`ApiError::Decode`] when the body is neither a list nor empty.
pub fn decode_list<T: DeserializeOwned>(value: Value) -> Result<Vec<T>, ApiError> {
    let items = match value {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        Value::Object(map) if map.is_empty() || map.get("data").is_some_and(Value::is_null) => Vec::new(),
        other => return Err(ApiError::Decode(format!("expected a list, got {}", json_kind(&other)))),
    };
    items
        .into_iter()
        .map(|item| serde_json::from_value(item).map_err(|e| ApiError::Decode(e.to_string())))
        .collect()
}

fn failure_message(response: &HttpResponse) -> String {
    let from_body = decode_body(&response.body).ok().and_then(|body| message_field(&body));
    if let Some(message) = from_body {
        return message;
    }
    let status_text = response.status_text.trim();
    if !status_text.is_empty() {
        return status_text.to_owned();
    }
    request_failed_message(response.status)
}

fn message_field(body: &Value) -> Option<String> {
    ["message", "error"]
        .into_iter()
        .filter_map(|key| body.get(key).and_then(Value::as_str))
        .find(|text| !text.is_empty())
        .map(ToOwned::to_owned)
}

fn request_failed_message(status: u16) -> String {
    format!("request failed: {status}")
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
