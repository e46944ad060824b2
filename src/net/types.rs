//! Wire DTOs for the admin REST API.
//!
//! DESIGN
//! ======
//! These types mirror backend payloads. Optional and server-assigned fields use
//! `#[serde(default)]` so partial records (a login that only echoes the email,
//! a list endpoint that omits nested collections) still decode.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use serde::{Deserialize, Serialize};

/// Anything cached by id in a domain store.
pub trait Record {
    fn id(&self) -> &str;
}

/// The signed-in admin identity held by the session.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, rename = "createdAt", alias = "created_at", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, rename = "updatedAt", alias = "updated_at", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl User {
    /// Identity known only by the email used to log in.
    pub fn from_email(email: &str) -> Self {
        Self { email: email.to_owned(), ..Self::default() }
    }

    /// Whether the record carries enough to be trusted as a cached identity.
    pub fn is_complete(&self) -> bool {
        !self.id.is_empty() && !self.email.is_empty()
    }
}

impl From<Admin> for User {
    fn from(admin: Admin) -> Self {
        let role = admin.role.or_else(|| admin.roles.into_iter().next());
        Self {
            id: admin.id,
            name: admin.name,
            email: admin.email,
            role,
            created_at: admin.created_at,
            updated_at: admin.updated_at,
        }
    }
}

/// Body of `POST /admin/auth/login`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Body of a successful login. Both fields are optional on the wire: the token
/// may arrive in the `X-Auth-Token` header and the identity may be omitted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
}

/// An admin account.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Admin {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Record for Admin {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Fields accepted by `POST /admin` and `PATCH /admin/{id}`. Unset fields are
/// omitted from the body.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AdminInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,
}

/// A tenant company, optionally with its full detail collections.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: String,
    #[serde(default)]
    pub legal_name: String,
    #[serde(default)]
    pub trade_name: String,
    #[serde(default)]
    pub tax_id: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branches: Option<Vec<Branch>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employees: Option<Vec<Employee>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub services: Option<Vec<Service>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subdomains: Option<Vec<Subdomain>>,
}

impl Record for Company {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Fields accepted by `POST /company` and `PUT /company/{id}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CompanyInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legal_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trade_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub company_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default)]
    pub created_at: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub surname: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default)]
    pub company_id: String,
    #[serde(default)]
    pub is_owner: bool,
    #[serde(default)]
    pub created_at: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Duration in minutes.
    #[serde(default)]
    pub duration: u32,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub company_id: String,
    #[serde(default)]
    pub created_at: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subdomain {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub company_id: String,
    #[serde(default)]
    pub created_at: String,
}

/// An end customer of some tenant.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl Record for Client {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientAppointment {
    pub id: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub employee_id: String,
    #[serde(default)]
    pub service_id: String,
    #[serde(default)]
    pub branch_id: String,
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub created_at: String,
}

impl Record for ClientAppointment {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Response of `GET /admin/are_there_any_superadmin`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct SuperadminStatus {
    #[serde(default)]
    pub has_superadmin: bool,
}

/// Body of `POST /admin/first_superadmin`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FirstAdminRequest {
    pub name: String,
    pub surname: String,
    pub email: String,
    pub password: String,
}
