//! Deployment command - print the provider agent deployment for a tenant cluster

use std::path::Path;

use stackbridge_kube::OpenStackPlatform;

use super::load_tenant;
use crate::error::Result;

pub fn run(file: &Path, provider_image: &str, env_override: Option<&str>) -> Result<()> {
    let tenant = load_tenant(file)?;
    let platform = OpenStackPlatform::new(provider_image);

    let spec = platform.provider_deployment_spec(&tenant, env_override);
    print!("{}", serde_yaml::to_string(&spec)?);
    Ok(())
}
