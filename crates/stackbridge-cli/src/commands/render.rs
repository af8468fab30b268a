//! Render command - print the OpenStackCluster a tenant cluster translates to

use std::path::Path;

use stackbridge_core::{ApiEndpoint, OpenStackCluster, synthesize, validate_machine_networks};

use tracing::debug;

use super::load_tenant;
use crate::error::Result;

pub fn run(file: &Path, host: &str, port: i32, namespace: Option<&str>) -> Result<()> {
    let tenant = load_tenant(file)?;
    validate_machine_networks(&tenant.spec.networking.machine_network)?;

    let spec = synthesize(&tenant, &ApiEndpoint::new(host, port))?;

    let name = tenant.metadata.name.clone().unwrap_or_default();
    let mut cluster = OpenStackCluster::new(&name, spec);
    cluster.metadata.namespace = namespace
        .map(str::to_string)
        .or_else(|| tenant.metadata.namespace.clone());

    debug!(
        cluster = %name,
        managed = cluster.spec.is_managed_subnet_mode(),
        "synthesized OpenStackCluster"
    );
    print!("{}", serde_yaml::to_string(&cluster)?);
    Ok(())
}
