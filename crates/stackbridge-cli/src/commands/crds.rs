//! CRDs command - print the CustomResourceDefinitions this tool reads and writes

use kube::CustomResourceExt;
use stackbridge_core::{OpenStackCluster, TenantCluster};

use crate::error::Result;

pub fn run() -> Result<()> {
    let tenant = serde_yaml::to_string(&TenantCluster::crd())?;
    let cluster = serde_yaml::to_string(&OpenStackCluster::crd())?;
    print!("{}---\n{}", tenant, cluster);
    Ok(())
}
