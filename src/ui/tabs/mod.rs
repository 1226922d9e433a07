pub mod connect;
pub mod connections;
pub mod query;
