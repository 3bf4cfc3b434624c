//! Client SDK for the FoodScan nutrition-estimation backend.
//!
//! The crate is the session and API layer of the mobile app: a configured
//! HTTP transport ([`ApiClient`]), a durable token/user store
//! ([`session::SessionStore`]), two facades covering the REST surface
//! ([`auth::AuthService`], [`nutrients::NutrientService`]) and an
//! orchestrator ([`session::SessionManager`]) keeping local state in step
//! with the backend.
//!
//! Every facade method resolves to an [`ApiOutcome`] — a uniform
//! `{success, message, payload}` shape — regardless of whether the failure
//! was a validation error, an expired session or a dead network. Errors do
//! not cross facade boundaries.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod nutrients;
pub mod response;
pub mod session;
pub mod validate;

pub use client::ApiClient;
pub use config::ApiConfig;
pub use error::ApiError;
pub use response::{Ack, ApiOutcome, NETWORK_ERROR_MESSAGE};
pub use session::{SessionManager, SessionState, SessionStore};
