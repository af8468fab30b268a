//! Tenant cluster to `OpenStackClusterSpec` synthesis
//!
//! [`reconcile_cluster_spec`] mutates an existing spec in place so it can
//! run as the mutate step of a create-or-update. It is idempotent: applying
//! it twice with the same inputs leaves the cluster spec unchanged the second time.
//!
//! Rules:
//! - The control-plane endpoint and identity reference are always
//!   overwritten.
//! - Explicit subnets win whenever at least one is given; otherwise a single
//!   managed subnet is computed. Entering one mode clears the other.
//! - Router, network, external network, MTU and the external-network switch
//!   are only written when the tenant sets them.
//! - `disableAPIServerFloatingIP` is always `true` and managed security
//!   groups are always present. Tenant input cannot change either.
//! - Tags are copied verbatim.

use crate::capo::{ApiEndpoint, ManagedSecurityGroups, OpenStackClusterSpec, OpenStackIdentityReference};
use crate::error::{CoreError, Result};
use crate::filters;
use crate::network::compute_managed_subnet;
use crate::tenant::TenantCluster;

/// Bring `spec` in line with the tenant's desired state
pub fn reconcile_cluster_spec(
    tenant: &TenantCluster,
    spec: &mut OpenStackClusterSpec,
    endpoint: &ApiEndpoint,
) -> Result<()> {
    let platform = tenant
        .openstack()
        .ok_or_else(|| CoreError::MissingPlatformSpec {
            cluster: tenant.metadata.name.clone().unwrap_or_default(),
        })?;

    spec.identity_ref = OpenStackIdentityReference {
        name: platform.identity_ref.name.clone(),
        cloud_name: platform.identity_ref.cloud_name.clone(),
    };
    spec.control_plane_endpoint = Some(endpoint.clone());

    if !platform.subnets.is_empty() {
        spec.subnets = platform.subnets.iter().map(filters::subnet_param).collect();
        spec.managed_subnets.clear();
    } else {
        spec.managed_subnets = vec![compute_managed_subnet(
            &tenant.spec.networking.machine_network,
            &platform.managed_subnets,
        )];
        spec.subnets.clear();
    }

    if let Some(router) = &platform.router {
        spec.router = Some(filters::router_param(router));
    }
    if let Some(network) = &platform.network {
        spec.network = Some(filters::network_param(network));
    }
    if let Some(mtu) = platform.network_mtu {
        spec.network_mtu = Some(mtu);
    }
    if let Some(external) = &platform.external_network {
        spec.external_network = Some(filters::network_param(external));
    }
    if let Some(disable) = platform.disable_external_network {
        spec.disable_external_network = Some(disable);
    }

    spec.managed_security_groups = Some(ManagedSecurityGroups::default());
    spec.disable_api_server_floating_ip = Some(true);
    spec.tags = platform.tags.clone();

    Ok(())
}

/// Synthesize a fresh spec from scratch
pub fn synthesize(tenant: &TenantCluster, endpoint: &ApiEndpoint) -> Result<OpenStackClusterSpec> {
    let mut spec = OpenStackClusterSpec::default();
    reconcile_cluster_spec(tenant, &mut spec, endpoint)?;
    Ok(spec)
}
