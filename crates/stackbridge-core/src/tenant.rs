//! Tenant cluster desired state
//!
//! `TenantCluster` is the input of record: it describes the tenant's
//! intended networking and identity configuration on OpenStack. Nothing
//! in this workspace writes to it.
//!
//! Optional sub-resources (router, network, external network, MTU, the
//! external-network switch) are `Option`s so that "not specified" is
//! never confused with an explicit zero value.

use std::path::Path;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::deployment::PROVIDER_IMAGE_ANNOTATION;

/// Desired state of a tenant cluster
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "stackbridge.io",
    version = "v1alpha1",
    kind = "TenantCluster",
    namespaced,
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct TenantClusterSpec {
    /// Platform-specific configuration
    #[serde(default)]
    pub platform: PlatformSpec,

    /// Cluster networking
    #[serde(default)]
    pub networking: ClusterNetworking,
}

impl TenantCluster {
    /// Parse a tenant cluster manifest
    pub fn from_yaml(content: &str) -> crate::Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Load a tenant cluster manifest from disk
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// The OpenStack section of the platform spec, if any
    pub fn openstack(&self) -> Option<&OpenStackPlatformSpec> {
        self.spec.platform.openstack.as_ref()
    }

    /// Provider image override set through the object's annotations
    pub fn provider_image_annotation(&self) -> Option<&str> {
        self.metadata
            .annotations
            .as_ref()
            .and_then(|a| a.get(PROVIDER_IMAGE_ANNOTATION))
            .map(String::as_str)
    }
}

/// Platform-specific configuration
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlatformSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openstack: Option<OpenStackPlatformSpec>,
}

/// Networking settings shared by all platforms
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterNetworking {
    /// CIDRs the cluster machines live in
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub machine_network: Vec<MachineNetworkEntry>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MachineNetworkEntry {
    pub cidr: String,
}

impl MachineNetworkEntry {
    pub fn new(cidr: impl Into<String>) -> Self {
        Self { cidr: cidr.into() }
    }
}

/// OpenStack platform configuration
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OpenStackPlatformSpec {
    /// Secret holding the tenant's clouds.yaml
    pub identity_ref: IdentityReference,

    /// Per-subnet overrides applied when the subnet is managed
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub managed_subnets: Vec<ManagedSubnet>,

    /// Pre-existing subnets, by ID or filter
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subnets: Vec<SubnetParam>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub router: Option<RouterParam>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<NetworkParam>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_network: Option<NetworkParam>,

    /// MTU override for the cluster network
    #[serde(default, rename = "networkMTU", skip_serializing_if = "Option::is_none")]
    pub network_mtu: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable_external_network: Option<bool>,

    /// Tags applied to every OpenStack resource created for the cluster
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IdentityReference {
    /// Secret name in the tenant namespace
    pub name: String,

    /// Entry in clouds.yaml to use
    pub cloud_name: String,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ManagedSubnet {
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

/// A Neutron tag as written by the tenant
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct NeutronTag(pub String);

impl From<&str> for NeutronTag {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
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

/// Match criteria for a pre-existing subnet
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
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<NeutronTag>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags_any: Vec<NeutronTag>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub not_tags: Vec<NeutronTag>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub not_tags_any: Vec<NeutronTag>,
}

/// Match criteria for a pre-existing router
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RouterFilter {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, rename = "projectID", skip_serializing_if = "String::is_empty")]
    pub project_id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<NeutronTag>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags_any: Vec<NeutronTag>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub not_tags: Vec<NeutronTag>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub not_tags_any: Vec<NeutronTag>,
}

/// Match criteria for a pre-existing network
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkFilter {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, rename = "projectID", skip_serializing_if = "String::is_empty")]
    pub project_id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<NeutronTag>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags_any: Vec<NeutronTag>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub not_tags: Vec<NeutronTag>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub not_tags_any: Vec<NeutronTag>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tenant_cluster() {
        let yaml = r#"
apiVersion: stackbridge.io/v1alpha1
kind: TenantCluster
metadata:
  name: demo
  namespace: clusters
  annotations:
    stackbridge.io/capi-openstack-provider-image: quay.io/example/capo:dev
spec:
  networking:
    machineNetwork:
      - cidr: 192.168.10.0/24
  platform:
    openstack:
      identityRef:
        name: demo-cloud-credentials
        cloudName: openstack
      networkMTU: 1450
      router:
        filter:
          name: shared-router
          tags: [blue, green]
"#;
        let cluster: TenantCluster = serde_yaml::from_str(yaml).unwrap();
        let openstack = cluster.openstack().unwrap();

        assert_eq!(openstack.identity_ref.name, "demo-cloud-credentials");
        assert_eq!(openstack.network_mtu, Some(1450));
        assert!(openstack.network.is_none());
        assert!(openstack.disable_external_network.is_none());

        let router = openstack.router.as_ref().unwrap();
        assert!(router.id.is_none());
        let filter = router.filter.as_ref().unwrap();
        assert_eq!(filter.tags, vec![NeutronTag::from("blue"), NeutronTag::from("green")]);

        assert_eq!(cluster.spec.networking.machine_network[0].cidr, "192.168.10.0/24");
        assert_eq!(
            cluster.provider_image_annotation(),
            Some("quay.io/example/capo:dev")
        );
    }

    #[test]
    fn test_missing_platform_section() {
        let yaml = r#"
apiVersion: stackbridge.io/v1alpha1
kind: TenantCluster
metadata:
  name: bare
spec: {}
"#;
        let cluster = TenantCluster::from_yaml(yaml).unwrap();
        assert!(cluster.openstack().is_none());
        assert!(cluster.spec.networking.machine_network.is_empty());
        assert!(cluster.provider_image_annotation().is_none());
    }

    #[test]
    fn test_from_yaml_rejects_garbage() {
        let err = TenantCluster::from_yaml("spec: [not, a, map]").unwrap_err();
        assert!(matches!(err, crate::CoreError::YamlParse(_)));
    }
}
