//! Stackbridge Kube - object store integration
//!
//! This crate drives the translation in `stackbridge-core` against an
//! object store:
//! - `ObjectStore`: get/create/update keyed by namespace and name, backed by
//!   the Kubernetes API or kept in memory for tests
//! - `create_or_update`: read-modify-write that only persists a real diff
//! - Credential synchronization from the tenant namespace into the control
//!   plane namespace
//! - `OpenStackPlatform`: the entry points a reconciliation loop calls

pub mod config;
pub mod credentials;
pub mod error;
pub mod platform;
pub mod store;
pub mod upsert;

pub use config::{CaCertExtractor, DEFAULT_CA_SECRET_NAME, MissingKeyPolicy, PlatformConfig};
pub use credentials::{
    CredentialSyncReport, ca_cert_from_credentials, mirror_cloud_config, project_ca_cert,
    sync_credentials,
};
pub use error::{CredentialStep, CredentialSyncError, KubeError, Result, StepFailure};
pub use platform::OpenStackPlatform;
pub use store::{KubeStore, MockObjectStore, ObjectKey, ObjectStore, OperationCounts, StoredObject};
pub use upsert::{OperationResult, create_or_update};
