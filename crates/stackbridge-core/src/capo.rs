//! OpenStack Cluster API (CAPO) infrastructure resource
//!
//! Reference: <https://cluster-api-openstack.sigs.k8s.io/clusteropenstack/configuration.html>
//!
//! Only the fields this workspace writes are modeled; every other spec field
//! is carried through untouched in [`OpenStackClusterSpec::extra`]. The subnet
//! layout is either explicit (`subnets`) or managed (`managed_subnets`),
//! never both.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// API group of the CAPO resources
pub const INFRASTRUCTURE_API_GROUP: &str = "infrastructure.cluster.x-k8s.io";

/// Desired state of an `OpenStackCluster`
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "infrastructure.cluster.x-k8s.io",
    version = "v1beta1",
    kind = "OpenStackCluster",
    namespaced,
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct OpenStackClusterSpec {
    pub identity_ref: OpenStackIdentityReference,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_plane_endpoint: Option<ApiEndpoint>,

    /// Subnets created and owned by CAPO
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub managed_subnets: Vec<SubnetSpec>,

    /// Pre-existing subnets
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subnets: Vec<SubnetParam>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub router: Option<RouterParam>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<NetworkParam>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_network: Option<NetworkParam>,

    #[serde(default, rename = "networkMTU", skip_serializing_if = "Option::is_none")]
    pub network_mtu: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable_external_network: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub managed_security_groups: Option<ManagedSecurityGroups>,

    #[serde(
        default,
        rename = "disableAPIServerFloatingIP",
        skip_serializing_if = "Option::is_none"
    )]
    pub disable_api_server_floating_ip: Option<bool>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Spec fields written by other parties (`bastion`, `apiServerLoadBalancer`, ...)
    #[serde(flatten)]
    #[schemars(skip)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl OpenStackClusterSpec {
    /// Whether pre-existing subnets are referenced
    pub fn is_explicit_subnet_mode(&self) -> bool {
        !self.subnets.is_empty()
    }

    /// Whether CAPO is asked to create the subnet
    pub fn is_managed_subnet_mode(&self) -> bool {
        !self.managed_subnets.is_empty()
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OpenStackIdentityReference {
    pub name: String,
    pub cloud_name: String,
}

/// Host and port the workload cluster API server is reachable on
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApiEndpoint {
    pub host: String,
    pub port: i32,
}

impl ApiEndpoint {
    pub fn new(host: impl Into<String>, port: i32) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

/// A subnet CAPO creates
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubnetSpec {
    pub cidr: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dns_nameservers: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allocation_pools: Vec<AllocationPool>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AllocationPool {
    pub start: String,
    pub end: String,
}

/// Security group policy; an empty object lets CAPO manage the defaults
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ManagedSecurityGroups {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub allow_all_in_cluster_traffic: bool,
}

/// A Neutron tag in CAPO's filter vocabulary
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct NeutronTag(pub String);

/// Tag matching shared by every CAPO filter
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FilterByNeutronTags {
    /// Resource must carry all of these
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<NeutronTag>,

    /// Resource must carry at least one of these
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags_any: Vec<NeutronTag>,

    /// Resource must not carry all of these
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub not_tags: Vec<NeutronTag>,

    /// Resource must not carry any of these
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub not_tags_any: Vec<NeutronTag>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubnetParam {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<SubnetFilter>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RouterParam {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<RouterFilter>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkParam {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<NetworkFilter>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubnetFilter {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, rename = "projectID", skip_serializing_if = "String::is_empty")]
    pub project_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_version: Option<i32>,
    #[serde(default, rename = "gatewayIP", skip_serializing_if = "String::is_empty")]
    pub gateway_ip: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cidr: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ipv6_address_mode: String,
    #[serde(default, rename = "ipv6RAMode", skip_serializing_if = "String::is_empty")]
    pub ipv6_ra_mode: String,
    #[serde(flatten)]
    pub filter_by_neutron_tags: FilterByNeutronTags,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RouterFilter {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, rename = "projectID", skip_serializing_if = "String::is_empty")]
    pub project_id: String,
    #[serde(flatten)]
    pub filter_by_neutron_tags: FilterByNeutronTags,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkFilter {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, rename = "projectID", skip_serializing_if = "String::is_empty")]
    pub project_id: String,
    #[serde(flatten)]
    pub filter_by_neutron_tags: FilterByNeutronTags,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_security_groups_serialize_as_object() {
        let spec = OpenStackClusterSpec {
            managed_security_groups: Some(ManagedSecurityGroups::default()),
            disable_api_server_floating_ip: Some(true),
            ..Default::default()
        };

        let value = serde_json::to_value(&spec).unwrap();
        assert_eq!(value["managedSecurityGroups"], serde_json::json!({}));
        assert_eq!(value["disableAPIServerFloatingIP"], serde_json::json!(true));
        assert!(value.get("subnets").is_none());
        assert!(value.get("router").is_none());

        let back: OpenStackClusterSpec = serde_json::from_value(value).unwrap();
        assert_eq!(back, spec);
    }

    #[test]
    fn test_unmodeled_fields_are_kept() {
        let value = serde_json::json!({
            "identityRef": { "name": "creds", "cloudName": "openstack" },
            "bastion": { "enabled": true, "spec": { "flavor": "m1.small" } },
            "controlPlaneAvailabilityZones": ["az1", "az2"],
        });

        let spec: OpenStackClusterSpec = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(spec.identity_ref.name, "creds");
        assert_eq!(spec.extra["bastion"]["spec"]["flavor"], "m1.small");
        assert!(!spec.extra.contains_key("identityRef"));

        assert_eq!(serde_json::to_value(&spec).unwrap(), value);
    }

    #[test]
    fn test_filter_tags_are_inlined() {
        let filter = NetworkFilter {
            name: "tenant-net".to_string(),
            filter_by_neutron_tags: FilterByNeutronTags {
                tags_any: vec![NeutronTag("a".to_string())],
                ..Default::default()
            },
            ..Default::default()
        };

        let value = serde_json::to_value(&filter).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "name": "tenant-net", "tagsAny": ["a"] })
        );
    }

    #[test]
    fn test_subnet_modes() {
        let mut spec = OpenStackClusterSpec::default();
        assert!(!spec.is_explicit_subnet_mode());
        assert!(!spec.is_managed_subnet_mode());

        spec.managed_subnets.push(SubnetSpec {
            cidr: "10.0.0.0/16".to_string(),
            ..Default::default()
        });
        assert!(spec.is_managed_subnet_mode());
        assert!(!spec.is_explicit_subnet_mode());
    }
}
