//! CLI commands

pub mod crds;
pub mod deployment;
pub mod reconcile;
pub mod render;

use std::path::Path;

use stackbridge_core::TenantCluster;

use crate::error::{CliError, Result};

/// Load a tenant cluster manifest, keeping IO and parse failures apart
pub(crate) fn load_tenant(path: &Path) -> Result<TenantCluster> {
    TenantCluster::from_file(path).map_err(|e| match CliError::from(e) {
        CliError::Io { message } => CliError::Io {
            message: format!("{}: {}", path.display(), message),
        },
        other => other,
    })
}
