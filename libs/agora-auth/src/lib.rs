//! Bearer-token authentication for Agora HTTP services.
//!
//! `auth_required` validates the `Authorization` header with a
//! [`TokenValidator`] and stores the resulting `SecurityContext` in the
//! request extensions; handlers read it back with the [`Authz`] extractor.

pub mod axum_ext;
pub mod config;
pub mod errors;
pub mod traits;
pub mod validator;

pub use axum_ext::{Authz, auth_required};
pub use config::AuthConfig;
pub use errors::AuthError;
pub use traits::TokenValidator;
pub use validator::StaticTokenValidator;
