//! OpenStack platform reconciler
//!
//! [`OpenStackPlatform`] is what an external control loop calls for each
//! tenant cluster. Every call re-reads the store and recomputes the desired
//! state; nothing is cached between calls, so one instance can serve any
//! number of tenants.

use k8s_openapi::api::apps::v1::DeploymentSpec;
use k8s_openapi::api::rbac::v1::PolicyRule;
use stackbridge_core::{
    ApiEndpoint, CoreError, OpenStackCluster, OpenStackClusterSpec, TenantCluster,
    provider_deployment_spec, provider_policy_rules, reconcile_cluster_spec,
    resolve_provider_image, validate_machine_networks,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::PlatformConfig;
use crate::credentials::{CredentialSyncReport, sync_credentials};
use crate::error::{KubeError, Result};
use crate::store::ObjectStore;
use crate::upsert::{OperationResult, create_or_update};

/// Reconciler for tenant clusters hosted on OpenStack
#[derive(Debug, Clone, Default)]
pub struct OpenStackPlatform {
    config: PlatformConfig,
}

fn missing_platform(tenant: &TenantCluster) -> KubeError {
    CoreError::MissingPlatformSpec {
        cluster: tenant.metadata.name.clone().unwrap_or_default(),
    }
    .into()
}

impl OpenStackPlatform {
    /// Platform with default settings and the given provider image
    pub fn new(capi_provider_image: impl Into<String>) -> Self {
        Self::with_config(PlatformConfig::new(capi_provider_image))
    }

    pub fn with_config(config: PlatformConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }

    /// Create or update the tenant's `OpenStackCluster`
    ///
    /// The resource is named after the tenant and lives in the control-plane
    /// namespace. Fields the tenant does not set keep whatever the stored
    /// copy already has.
    pub async fn reconcile_infra_cr<S: ObjectStore>(
        &self,
        cancel: &CancellationToken,
        store: &S,
        tenant: &TenantCluster,
        control_plane_namespace: &str,
        endpoint: &ApiEndpoint,
    ) -> Result<(OperationResult, OpenStackCluster)> {
        if tenant.openstack().is_none() {
            return Err(missing_platform(tenant));
        }
        validate_machine_networks(&tenant.spec.networking.machine_network)?;

        let name = tenant
            .metadata
            .name
            .clone()
            .ok_or_else(|| KubeError::InvalidObject("TenantCluster has no name".to_string()))?;

        let mut cluster = OpenStackCluster::new(&name, OpenStackClusterSpec::default());
        cluster.metadata.namespace = Some(control_plane_namespace.to_string());

        let (result, cluster) = create_or_update(cancel, store, cluster, |cluster| {
            reconcile_cluster_spec(tenant, &mut cluster.spec, endpoint).map_err(KubeError::from)
        })
        .await?;

        info!(
            cluster = %name,
            namespace = %control_plane_namespace,
            %result,
            "reconciled OpenStackCluster"
        );
        Ok((result, cluster))
    }

    /// Keep the control-plane copies of the tenant's credentials current
    ///
    /// Credentials are read from the tenant's own namespace under the
    /// identity reference name.
    pub async fn reconcile_credentials<S: ObjectStore>(
        &self,
        cancel: &CancellationToken,
        store: &S,
        tenant: &TenantCluster,
        control_plane_namespace: &str,
    ) -> Result<CredentialSyncReport> {
        let platform = tenant.openstack().ok_or_else(|| missing_platform(tenant))?;
        let tenant_namespace = tenant.metadata.namespace.as_deref().ok_or_else(|| {
            KubeError::InvalidObject("TenantCluster has no namespace".to_string())
        })?;

        sync_credentials(
            cancel,
            store,
            &self.config,
            tenant_namespace,
            control_plane_namespace,
            &platform.identity_ref.name,
        )
        .await
    }

    /// Nothing to encrypt for OpenStack
    pub async fn reconcile_secret_encryption<S: ObjectStore>(
        &self,
        _cancel: &CancellationToken,
        _store: &S,
        tenant: &TenantCluster,
        _control_plane_namespace: &str,
    ) -> Result<()> {
        debug!(cluster = ?tenant.metadata.name, "no secret encryption to reconcile");
        Ok(())
    }

    /// Derived credentials are owned by the control-plane namespace and go with it
    pub async fn delete_credentials<S: ObjectStore>(
        &self,
        _cancel: &CancellationToken,
        _store: &S,
        tenant: &TenantCluster,
        _control_plane_namespace: &str,
    ) -> Result<()> {
        debug!(cluster = ?tenant.metadata.name, "no credentials to delete");
        Ok(())
    }

    /// Deployment spec for the provider agent of `tenant`
    ///
    /// `env_override` is the value of [`stackbridge_core::PROVIDER_IMAGE_ENV_VAR`]
    /// as read by the caller.
    pub fn provider_deployment_spec(
        &self,
        tenant: &TenantCluster,
        env_override: Option<&str>,
    ) -> DeploymentSpec {
        let image = resolve_provider_image(
            &self.config.capi_provider_image,
            env_override,
            tenant.provider_image_annotation(),
        );
        provider_deployment_spec(&image)
    }

    pub fn policy_rules(&self) -> Vec<PolicyRule> {
        provider_policy_rules()
    }
}
