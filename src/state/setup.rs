//! First-run bootstrap: detect whether any superadmin exists and create the
//! first one.
//!
//! SYSTEM CONTEXT
//! ==============
//! The login screen asks [`SetupStore::check_superadmin`] before rendering; a
//! fresh install gets the registration form instead. A successful registration
//! is followed by one verification-code email for the new address. All three
//! endpoints are public, so requests go out without the session token.

#[cfg(test)]
#[path = "setup_test.rs"]
mod setup_test;

use super::observable::Observable;
use super::store::{ActionResult, Busy};
use crate::net::api::{ApiClient, RequestDescriptor, path_segment};
use crate::net::transport::Method;
use crate::net::types::{Admin, FirstAdminRequest, SuperadminStatus};

const SUPERADMIN_STATUS_PATH: &str = "/admin/are_there_any_superadmin";
const FIRST_SUPERADMIN_PATH: &str = "/admin/first_superadmin";
pub const MIN_PASSWORD_LEN: usize = 8;

fn verification_code_path(email: &str) -> String {
    format!("/admin/send-verification-code/email/{}", path_segment(email))
}

/// Registration form input, validated before anything is sent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FirstAdminForm {
    pub name: String,
    pub surname: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl FirstAdminForm {
    /// Trim and check the form.
    ///
    /// # Errors
    ///
    /// Returns the message to show next to the form.
    pub fn validate(&self) -> Result<FirstAdminRequest, &'static str> {
        let name = self.name.trim();
        let surname = self.surname.trim();
        let email = self.email.trim();
        if name.is_empty() || surname.is_empty() || email.is_empty() || self.password.is_empty() {
            return Err("Fill in all fields.");
        }
        if !email.contains('@') {
            return Err("Enter a valid email address.");
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err("Password must be at least 8 characters");
        }
        if self.password != self.confirm_password {
            return Err("Passwords do not match");
        }
        Ok(FirstAdminRequest {
            name: name.to_owned(),
            surname: surname.to_owned(),
            email: email.to_owned(),
            password: self.password.clone(),
        })
    }
}

#[derive(Clone)]
pub struct SetupStore {
    api: ApiClient,
    /// `None` until checked.
    pub has_superadmin: Observable<Option<bool>>,
    /// Address the last verification email went to.
    pub verification_sent_to: Observable<Option<String>>,
    pub loading: Observable<bool>,
    pub error: Observable<Option<String>>,
}

impl SetupStore {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            has_superadmin: Observable::new(None),
            verification_sent_to: Observable::new(None),
            loading: Observable::new(false),
            error: Observable::new(None),
        }
    }

    pub async fn check_superadmin(&self) -> Option<bool> {
        let _busy = Busy::start(&self.loading);
        self.error.set(None);
        let descriptor = RequestDescriptor::new(Method::Get, SUPERADMIN_STATUS_PATH).anonymous();
        match self.api.request::<SuperadminStatus>(descriptor).await {
            Ok(status) => {
                self.has_superadmin.set(Some(status.has_superadmin));
                Some(status.has_superadmin)
            }
            Err(e) => {
                tracing::warn!(error = %e, "superadmin check failed");
                self.error.set(Some(e.to_string()));
                None
            }
        }
    }

    /// Register the first superadmin, then request a verification email for
    /// it. A failed email does not undo the registration; it lands in `error`.
    pub async fn create_first_admin(&self, form: &FirstAdminForm) -> ActionResult<Admin> {
        let request = match form.validate() {
            Ok(request) => request,
            Err(message) => return ActionResult::failed(message),
        };
        let _busy = Busy::start(&self.loading);
        self.error.set(None);
        let descriptor = match RequestDescriptor::new(Method::Post, FIRST_SUPERADMIN_PATH).json(&request) {
            Ok(descriptor) => descriptor.anonymous(),
            Err(e) => return ActionResult::failed(e.to_string()),
        };
        match self.api.request::<Admin>(descriptor).await {
            Ok(admin) => {
                tracing::info!(email = %admin.email, "first superadmin created");
                self.has_superadmin.set(Some(true));
                if let Err(message) = self.request_verification(&request.email).await {
                    self.error.set(Some(message));
                }
                ActionResult::ok(admin)
            }
            Err(e) => ActionResult::failed(e.to_string()),
        }
    }

    /// Ask the backend to (re)send the verification code to `email`.
    pub async fn send_verification_code(&self, email: &str) -> ActionResult {
        let _busy = Busy::start(&self.loading);
        match self.request_verification(email.trim()).await {
            Ok(()) => ActionResult::done(),
            Err(message) => ActionResult::failed(message),
        }
    }

    async fn request_verification(&self, email: &str) -> Result<(), String> {
        let descriptor = RequestDescriptor::new(Method::Post, verification_code_path(email)).anonymous();
        match self.api.send(descriptor).await {
            Ok(_) => {
                tracing::info!(%email, "verification email requested");
                self.verification_sent_to.set(Some(email.to_owned()));
                Ok(())
            }
            Err(e) => {
                tracing::warn!(%email, error = %e, "verification email request failed");
                Err(e.to_string())
            }
        }
    }
}
