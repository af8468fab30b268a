//! Stackbridge Core - tenant cluster to OpenStack CAPI translation
//!
//! This crate provides the pure, I/O-free half of Stackbridge:
//! - `TenantCluster`: the desired state of a tenant's cluster on OpenStack
//! - `OpenStackCluster`: the CAPO infrastructure resource it translates to
//! - Filter and tag translation between the two vocabularies
//! - Managed subnet defaults
//! - The `OpenStackClusterSpec` synthesizer run under create-or-update
//! - The provider agent deployment spec and RBAC rules

pub mod capo;
pub mod deployment;
pub mod error;
pub mod filters;
pub mod network;
pub mod rbac;
pub mod synthesize;
pub mod tenant;

pub use capo::{ApiEndpoint, OpenStackCluster, OpenStackClusterSpec};
pub use deployment::{
    PROVIDER_IMAGE_ANNOTATION, PROVIDER_IMAGE_ENV_VAR, provider_deployment_spec,
    resolve_provider_image,
};
pub use error::{CoreError, Result};
pub use filters::{TagLists, project_filter_tags, translate_filter_tags};
pub use network::{DEFAULT_CIDR_BLOCK, compute_managed_subnet, validate_machine_networks};
pub use rbac::provider_policy_rules;
pub use synthesize::{reconcile_cluster_spec, synthesize};
pub use tenant::{OpenStackPlatformSpec, TenantCluster, TenantClusterSpec};
