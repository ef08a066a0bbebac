//! Authentication module
//!
//! Supports: Basic, None
//!
//! The catalog API authenticates with HTTP Basic using the application id
//! and key.

mod authenticator;
mod types;

pub use authenticator::Authenticator;
pub use types::AuthConfig;
