//! Data models for the query dashboard.
//!
//! - `ConnectionDetails`, `ConnectResponse`, `ConnectionDescriptor`:
//!   connect form payload and server responses
//! - `QueryRequest`, `QueryResponse`, `OptimizationDetails`: query
//!   execution and the AI suggestion that rides along with it

pub mod connection;
pub mod query;

pub use connection::{ConnectResponse, ConnectionDescriptor, ConnectionDetails, DbType};
pub use query::{OptimizationDetails, QueryRequest, QueryResponse};
