//! Session credentials.
//!
//! # Data Flow
//! ```text
//! login (caller) → CredentialStore::save → durable store + session copy
//! every request  → CredentialStore::access_token (session copy first)
//! 401 response   → CredentialStore::clear → LoginNavigator::redirect_to_login
//! ```

pub mod credentials;
pub mod navigator;

pub use credentials::{CredentialStore, Credentials, UserProfile};
pub use navigator::{LogNavigator, LoginNavigator};
