//! REST API client module for the query backend.
//!
//! This module provides the `ApiClient` for connecting databases,
//! executing queries, and listing saved connections, with transparent
//! single-shot token refresh on expired-token rejections.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
