//! Login, logout and startup validation for the admin session.
//!
//! SYSTEM CONTEXT
//! ==============
//! Used by route guards and the CLI to establish or drop the [`Session`]. All
//! writes to token/identity outside the forced-logout path happen here.
//!
//! DESIGN
//! ======
//! One lifecycle, no variants:
//! - `login` takes the identity from the login response when present, otherwise
//!   makes exactly one lookup by email, otherwise settles for an email-only
//!   identity.
//! - `check_auth` trusts a cached identity and never touches the network. A
//!   token without a usable identity is treated as corrupt and cleared.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use super::session::Session;
use super::store::ActionResult;
use crate::net::api::{AUTH_TOKEN_HEADER, ApiClient, ApiError, RequestDescriptor, path_segment};
use crate::net::transport::Method;
use crate::net::types::{Admin, LoginRequest, LoginResponse, User};

pub const LOGIN_PATH: &str = "/admin/auth/login";

fn identity_lookup_path(email: &str) -> String {
    format!("/admin/email/{}", path_segment(email))
}

#[derive(Debug, thiserror::Error)]
enum LoginError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("No auth token received")]
    MissingToken,
}

#[derive(Clone)]
pub struct AuthStore {
    session: Session,
    api: ApiClient,
}

impl AuthStore {
    pub fn new(api: ApiClient) -> Self {
        Self { session: api.session().clone(), api }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Authenticate with email and password.
    ///
    /// On failure the session is left exactly as it was. `loading` is raised
    /// for the duration of the call and lowered on every exit path.
    pub async fn login(&self, email: &str, password: &str) -> ActionResult {
        if self.session.is_loading() {
            return ActionResult::failed("Login already in progress");
        }
        let email = email.trim();
        let _loading = self.session.begin_loading();

        match self.authenticate(email, password).await {
            Ok((token, user)) => {
                tracing::info!(%email, complete_identity = user.is_complete(), "admin signed in");
                self.session.establish(token, user);
                ActionResult::done()
            }
            Err(e) => {
                tracing::info!(%email, error = %e, "admin sign-in failed");
                ActionResult::failed(e.to_string())
            }
        }
    }

    /// Sign out locally. No network effect; safe to call repeatedly.
    pub fn logout(&self) {
        self.session.logout();
    }

    /// Validate the restored session once at startup.
    ///
    /// A login in flight owns the session, so the check is skipped and the
    /// `loading` flag is left to the login's guard.
    pub fn check_auth(&self) {
        let state = self.session.state();
        if state.loading {
            tracing::debug!("login in flight; skipping session check");
            return;
        }
        if state.token.is_none() {
            self.session.logout();
        } else if !state.user.as_ref().is_some_and(User::is_complete) {
            tracing::info!("stored token has no usable identity; signing out");
            self.session.logout();
        }
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<(String, User), LoginError> {
        let descriptor = RequestDescriptor::new(Method::Post, LOGIN_PATH)
            .json(&LoginRequest { email, password })?
            .anonymous();
        let reply = self.api.send(descriptor).await?;

        let header_token = reply.header(AUTH_TOKEN_HEADER).map(ToOwned::to_owned);
        let body: LoginResponse =
            serde_json::from_value(reply.body).map_err(|e| ApiError::Decode(e.to_string()))?;

        let token = body
            .token
            .filter(|t| !t.is_empty())
            .or(header_token.filter(|t| !t.is_empty()))
            .ok_or(LoginError::MissingToken)?;

        let user = match body.user {
            Some(user) => user,
            None => self.lookup_identity(email, &token).await,
        };
        Ok((token, user))
    }

    /// Fetch the admin record for `email` using the token just issued. Any
    /// failure degrades to an email-only identity.
    async fn lookup_identity(&self, email: &str, token: &str) -> User {
        let descriptor = RequestDescriptor::new(Method::Get, identity_lookup_path(email))
            .anonymous()
            .bearer(token);
        match self.api.request::<Admin>(descriptor).await {
            Ok(admin) => User::from(admin),
            Err(e) => {
                tracing::warn!(%email, error = %e, "identity lookup failed; keeping email-only identity");
                User::from_email(email)
            }
        }
    }
}
