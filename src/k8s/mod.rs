//! Kubernetes API client module
//!
//! Connection handling and single-resource operations.

mod client;
mod resource;

pub use client::{connect, ConfigError, ConnectionHandle, ConnectionSource};
pub use resource::{OperationError, Outcome, ResourceOperations};
