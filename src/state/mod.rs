//! Client-side state modules.
//!
//! DESIGN
//! ======
//! State is split by domain (`auth`, `admins`, `companies`, ...) so views and
//! commands depend on small focused stores. All of them share one [`Session`]
//! through the [`ApiClient`] they are built from.
//!
//! [`Session`]: session::Session
//! [`ApiClient`]: crate::net::api::ApiClient

pub mod admins;
pub mod auth;
pub mod clients;
pub mod companies;
pub mod observable;
pub mod session;
pub mod setup;
pub mod store;
