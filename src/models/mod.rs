//! Data models for resource operations
//!
//! Descriptors describe what the caller wants; states are what the cluster returned.

mod descriptor;
mod state;

pub use descriptor::{parse_api_version, DescriptorError, Identity, ResourceDescriptor};
#[cfg(test)]
pub use descriptor::pod_gvk;
pub use state::ResourceState;
