//! Managed subnet defaults
//!
//! When the tenant references no existing subnet, CAPO is asked to create
//! exactly one. Its CIDR comes from the first machine network, or from
//! [`DEFAULT_CIDR_BLOCK`] when none is set. CAPO supports a single managed
//! subnet, so further machine networks are ignored.

use ipnetwork::IpNetwork;

use crate::capo;
use crate::error::{CoreError, Result};
use crate::tenant::{MachineNetworkEntry, ManagedSubnet};

/// CIDR used when the tenant sets no machine network
pub const DEFAULT_CIDR_BLOCK: &str = "10.0.0.0/16";

/// Compute the single managed subnet for a cluster
///
/// `overrides` are the tenant's per-subnet settings; only the first entry
/// applies since only one subnet is produced.
pub fn compute_managed_subnet(
    machine_networks: &[MachineNetworkEntry],
    overrides: &[ManagedSubnet],
) -> capo::SubnetSpec {
    let cidr = machine_networks
        .first()
        .map(|entry| canonical_cidr(&entry.cidr))
        .unwrap_or_else(|| DEFAULT_CIDR_BLOCK.to_string());

    let mut subnet = capo::SubnetSpec {
        cidr,
        ..Default::default()
    };

    if let Some(first) = overrides.first() {
        subnet.dns_nameservers = first.dns_nameservers.clone();
        subnet.allocation_pools = first
            .allocation_pools
            .iter()
            .map(|pool| capo::AllocationPool {
                start: pool.start.clone(),
                end: pool.end.clone(),
            })
            .collect();
    }

    subnet
}

/// Render a CIDR with its host bits cleared (`10.0.0.5/16` -> `10.0.0.0/16`)
///
/// Unparseable input is returned unchanged; callers validate first.
fn canonical_cidr(cidr: &str) -> String {
    cidr.parse::<IpNetwork>()
        .ok()
        .and_then(|net| IpNetwork::new(net.network(), net.prefix()).ok())
        .map(|net| net.to_string())
        .unwrap_or_else(|| cidr.to_string())
}

/// Reject machine networks that are not valid CIDRs
///
/// Run this before synthesizing; the translation itself never fails on
/// network input.
pub fn validate_machine_networks(entries: &[MachineNetworkEntry]) -> Result<Vec<IpNetwork>> {
    entries
        .iter()
        .map(|entry| {
            if !entry.cidr.contains('/') {
                return Err(CoreError::InvalidNetworkConfig {
                    cidr: entry.cidr.clone(),
                    message: "missing prefix length".to_string(),
                });
            }
            entry
                .cidr
                .parse::<IpNetwork>()
                .map_err(|e| CoreError::InvalidNetworkConfig {
                    cidr: entry.cidr.clone(),
                    message: e.to_string(),
                })
        })
        .collect()
}
