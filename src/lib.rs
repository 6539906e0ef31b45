// Library root — exposes internals for integration tests and embedding hosts.
// The binary entry point is src/main.rs.

pub mod backend;
pub mod config;
pub mod error;
pub mod executor;
pub mod host;
pub mod logger;
pub mod pipeline;
pub mod prompt;
pub mod resolver;
pub mod response;
