//! # mynute-admin
//!
//! Client core for the Mynute administration console: the session/auth
//! lifecycle, the REST request pipeline every store goes through, and the
//! CRUD stores for admins, companies and clients.
//!
//! SYSTEM CONTEXT
//! ==============
//! `net` talks to the backend, `state` holds observable client state built on
//! top of it, and `util` isolates environment concerns (durable storage).
//! The same code runs in the browser (`hydrate` feature) and natively
//! (`native` feature, used by the CLI).

pub mod config;
pub mod net;
pub mod state;
pub mod util;

pub use config::ClientConfig;
pub use net::api::{ApiClient, ApiError};
pub use state::auth::AuthStore;
pub use state::session::Session;
