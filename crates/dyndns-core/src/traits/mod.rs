//! Core traits for the updater
//!
//! These are the seams between the reconciliation engine and the outside
//! world:
//!
//! - [`ApiGateway`]: authenticated request/response wrapper around the
//!   provider API
//! - [`IpResolver`]: a strategy producing the machine's current address

pub mod api_gateway;
pub mod ip_resolver;

pub use api_gateway::ApiGateway;
pub use ip_resolver::IpResolver;
