//! Authentication module for managing user sessions and credentials.
//!
//! This module provides:
//! - `Session` / `SessionStore`: the single persisted session record
//! - `AuthClient`: login, signup, token refresh, and logout
//! - `CredentialStore`: remember-me storage via the OS keychain
//!
//! The session is a JSON blob on disk; no local expiry tracking. An
//! expired token is discovered reactively when the server rejects it,
//! at which point the API client drives a silent refresh.

pub mod client;
pub mod credentials;
pub mod session;

pub use client::AuthClient;
pub use credentials::CredentialStore;
pub use session::{Session, SessionStore};
