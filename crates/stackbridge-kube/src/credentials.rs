//! Credential synchronization
//!
//! The tenant keeps its OpenStack credentials in a secret named after its
//! identity reference. Two independent steps derive control-plane secrets
//! from it:
//!
//! - **cloud-config**: a mirror of `clouds.yaml`, `clouds.conf` and, when
//!   present, `cacert`, under the same name
//! - **ca-cert**: the CA certificate alone under `ca.pem`, only when the
//!   credentials carry one
//!
//! Each step reads the source itself, so one failing never stops the other.
//! Failures from both are reported together.

use std::collections::BTreeMap;

use k8s_openapi::ByteString;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::{MissingKeyPolicy, PlatformConfig};
use crate::error::{CredentialStep, CredentialSyncError, KubeError, Result};
use crate::store::{ObjectKey, ObjectStore, ensure_active};
use crate::upsert::{OperationResult, create_or_update};

/// Cloud configuration in clouds.yaml form
pub const CLOUDS_YAML_KEY: &str = "clouds.yaml";
/// Cloud configuration in clouds.conf form
pub const CLOUDS_CONF_KEY: &str = "clouds.conf";
/// Optional CA bundle in the tenant's credentials
pub const CA_CERT_KEY: &str = "cacert";
/// Key of the projected CA certificate
pub const CA_PEM_KEY: &str = "ca.pem";

const REQUIRED_KEYS: [&str; 2] = [CLOUDS_YAML_KEY, CLOUDS_CONF_KEY];

/// CA certificate carried by a credentials secret, if any
///
/// Only the presence of `cacert` counts: an empty value is still a CA and is
/// projected as an empty `ca.pem`, matching what the mirror copies.
pub fn ca_cert_from_credentials(secret: &Secret) -> Option<Vec<u8>> {
    secret
        .data
        .as_ref()
        .and_then(|data| data.get(CA_CERT_KEY))
        .map(|cert| cert.0.clone())
}

/// What each step did on a successful pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CredentialSyncReport {
    pub cloud_config: OperationResult,
    /// `None` when the credentials carry no CA certificate
    pub ca_cert: Option<OperationResult>,
}

fn secret_stub(namespace: &str, name: &str) -> Secret {
    Secret {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        ..Default::default()
    }
}

async fn read_source<S: ObjectStore>(
    cancel: &CancellationToken,
    store: &S,
    namespace: &str,
    name: &str,
) -> Result<Secret> {
    ensure_active(cancel)?;
    store
        .get::<Secret>(&ObjectKey::new(namespace, name))
        .await?
        .ok_or_else(|| KubeError::SourceSecretNotFound {
            namespace: namespace.to_string(),
            name: name.to_string(),
        })
}

/// Mirror the cloud configuration into `dest_namespace`
///
/// A `cacert` copied on an earlier pass stays in place when the source
/// later drops it.
pub async fn mirror_cloud_config<S: ObjectStore>(
    cancel: &CancellationToken,
    store: &S,
    config: &PlatformConfig,
    source_namespace: &str,
    dest_namespace: &str,
    identity_name: &str,
) -> Result<OperationResult> {
    let source = read_source(cancel, store, source_namespace, identity_name).await?;
    let source_data = source.data.unwrap_or_default();

    let mut copied = BTreeMap::new();
    for key in REQUIRED_KEYS {
        match source_data.get(key) {
            Some(value) => {
                copied.insert(key.to_string(), value.clone());
            }
            None if config.missing_key_policy == MissingKeyPolicy::Reject => {
                return Err(KubeError::MissingRequiredKey {
                    namespace: source_namespace.to_string(),
                    name: identity_name.to_string(),
                    key: key.to_string(),
                });
            }
            None => {
                warn!(
                    namespace = %source_namespace,
                    secret = %identity_name,
                    key,
                    "credentials secret lacks required key, copying empty value"
                );
                copied.insert(key.to_string(), ByteString(Vec::new()));
            }
        }
    }
    if let Some(ca) = source_data.get(CA_CERT_KEY) {
        copied.insert(CA_CERT_KEY.to_string(), ca.clone());
    }

    let (result, _) = create_or_update(
        cancel,
        store,
        secret_stub(dest_namespace, identity_name),
        |secret: &mut Secret| {
            secret.data.get_or_insert_with(BTreeMap::new).extend(copied);
            Ok(())
        },
    )
    .await?;
    Ok(result)
}

/// Project the CA certificate into its own secret
///
/// Returns `None` without writing when the credentials carry no CA.
pub async fn project_ca_cert<S: ObjectStore>(
    cancel: &CancellationToken,
    store: &S,
    config: &PlatformConfig,
    source_namespace: &str,
    dest_namespace: &str,
    identity_name: &str,
) -> Result<Option<OperationResult>> {
    let source = read_source(cancel, store, source_namespace, identity_name).await?;

    let Some(ca) = (config.ca_extractor)(&source) else {
        debug!(
            namespace = %source_namespace,
            secret = %identity_name,
            "no CA certificate in credentials, skipping projection"
        );
        return Ok(None);
    };

    let (result, _) = create_or_update(
        cancel,
        store,
        secret_stub(dest_namespace, &config.ca_secret_name),
        |secret: &mut Secret| {
            secret.data = Some(BTreeMap::from([(CA_PEM_KEY.to_string(), ByteString(ca))]));
            Ok(())
        },
    )
    .await?;
    Ok(Some(result))
}

/// Run both credential steps and join their failures
pub async fn sync_credentials<S: ObjectStore>(
    cancel: &CancellationToken,
    store: &S,
    config: &PlatformConfig,
    source_namespace: &str,
    dest_namespace: &str,
    identity_name: &str,
) -> Result<CredentialSyncReport> {
    let cloud_config = mirror_cloud_config(
        cancel,
        store,
        config,
        source_namespace,
        dest_namespace,
        identity_name,
    )
    .await;
    let ca_cert = project_ca_cert(
        cancel,
        store,
        config,
        source_namespace,
        dest_namespace,
        identity_name,
    )
    .await;

    match (cloud_config, ca_cert) {
        (Ok(cloud_config), Ok(ca_cert)) => Ok(CredentialSyncReport {
            cloud_config,
            ca_cert,
        }),
        (cloud_config, ca_cert) => {
            let results = vec![
                (CredentialStep::CloudConfig, cloud_config.map(|_| ())),
                (CredentialStep::CaCert, ca_cert.map(|_| ())),
            ];
            match CredentialSyncError::from_results(results) {
                Some(err) => Err(err.into()),
                None => Err(KubeError::Storage(
                    "credential sync failed without a recorded cause".to_string(),
                )),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MockObjectStore;

    const TENANT_NS: &str = "clusters";
    const CP_NS: &str = "clusters-demo";
    const IDENTITY: &str = "demo-cloud-credentials";

    fn credentials(entries: &[(&str, &str)]) -> Secret {
        let mut secret = secret_stub(TENANT_NS, IDENTITY);
        secret.data = Some(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), ByteString(v.as_bytes().to_vec())))
                .collect(),
        );
        secret
    }

    fn full_credentials() -> Secret {
        credentials(&[
            ("clouds.yaml", "clouds: {}"),
            ("clouds.conf", "[Global]"),
            ("cacert", "-----BEGIN CERTIFICATE-----"),
        ])
    }

    fn data_of(store: &MockObjectStore, namespace: &str, name: &str) -> BTreeMap<String, ByteString> {
        store
            .object::<Secret>(&ObjectKey::new(namespace, name))
            .and_then(|s| s.data)
            .unwrap_or_default()
    }

    async fn sync(store: &MockObjectStore, config: &PlatformConfig) -> Result<CredentialSyncReport> {
        sync_credentials(&CancellationToken::new(), store, config, TENANT_NS, CP_NS, IDENTITY).await
    }

    #[test]
    fn test_ca_extraction() {
        assert_eq!(
            ca_cert_from_credentials(&full_credentials()),
            Some(b"-----BEGIN CERTIFICATE-----".to_vec())
        );
        assert_eq!(
            ca_cert_from_credentials(&credentials(&[("cacert", "")])),
            Some(Vec::new())
        );
        assert_eq!(ca_cert_from_credentials(&credentials(&[])), None);
        assert_eq!(ca_cert_from_credentials(&secret_stub(TENANT_NS, IDENTITY)), None);
    }

    #[tokio::test]
    async fn test_sync_with_ca() {
        let store = MockObjectStore::new().with_object(&full_credentials());

        let report = sync(&store, &PlatformConfig::default()).await.unwrap();
        assert_eq!(report.cloud_config, OperationResult::Created);
        assert_eq!(report.ca_cert, Some(OperationResult::Created));

        let mirrored = data_of(&store, CP_NS, IDENTITY);
        assert_eq!(
            mirrored.keys().collect::<Vec<_>>(),
            vec!["cacert", "clouds.conf", "clouds.yaml"]
        );
        assert_eq!(mirrored["clouds.yaml"].0, b"clouds: {}");

        let ca = data_of(&store, CP_NS, "openstack-ca");
        assert_eq!(ca.len(), 1);
        assert_eq!(ca["ca.pem"].0, b"-----BEGIN CERTIFICATE-----");
    }

    #[tokio::test]
    async fn test_sync_without_ca_skips_projection() {
        let store = MockObjectStore::new().with_object(&credentials(&[
            ("clouds.yaml", "clouds: {}"),
            ("clouds.conf", "[Global]"),
        ]));

        let report = sync(&store, &PlatformConfig::default()).await.unwrap();
        assert_eq!(report.cloud_config, OperationResult::Created);
        assert_eq!(report.ca_cert, None);

        let mirrored = data_of(&store, CP_NS, IDENTITY);
        assert_eq!(mirrored.len(), 2);
        assert!(!mirrored.contains_key("cacert"));
        assert!(
            store
                .object::<Secret>(&ObjectKey::new(CP_NS, "openstack-ca"))
                .is_none()
        );
        assert_eq!(store.operation_counts().writes(), 1);
    }

    #[tokio::test]
    async fn test_empty_ca_is_mirrored_and_projected() {
        let store = MockObjectStore::new().with_object(&credentials(&[
            ("clouds.yaml", "clouds: {}"),
            ("clouds.conf", "[Global]"),
            ("cacert", ""),
        ]));

        let report = sync(&store, &PlatformConfig::default()).await.unwrap();
        assert_eq!(report.ca_cert, Some(OperationResult::Created));

        let mirrored = data_of(&store, CP_NS, IDENTITY);
        assert_eq!(mirrored["cacert"].0, b"");
        let ca = data_of(&store, CP_NS, "openstack-ca");
        assert_eq!(ca["ca.pem"].0, b"");
    }

    #[tokio::test]
    async fn test_missing_source_fails_both_steps() {
        let store = MockObjectStore::new();

        let err = sync(&store, &PlatformConfig::default()).await.unwrap_err();
        let KubeError::CredentialSync(joined) = err else {
            panic!("expected a joined credential error, got {err:?}");
        };
        assert_eq!(joined.failures.len(), 2);
        for step in [CredentialStep::CloudConfig, CredentialStep::CaCert] {
            assert!(matches!(
                joined.failure(step),
                Some(KubeError::SourceSecretNotFound { .. })
            ));
        }
        assert_eq!(store.operation_counts().writes(), 0);
    }

    #[tokio::test]
    async fn test_missing_required_key_copies_empty() {
        let store = MockObjectStore::new().with_object(&credentials(&[("clouds.yaml", "clouds: {}")]));

        sync(&store, &PlatformConfig::default()).await.unwrap();

        let mirrored = data_of(&store, CP_NS, IDENTITY);
        assert_eq!(mirrored["clouds.conf"].0, b"");
        assert_eq!(mirrored["clouds.yaml"].0, b"clouds: {}");
    }

    #[tokio::test]
    async fn test_missing_required_key_rejected() {
        let store = MockObjectStore::new().with_object(&credentials(&[
            ("clouds.yaml", "clouds: {}"),
            ("cacert", "pem"),
        ]));
        let config = PlatformConfig::default().with_missing_key_policy(MissingKeyPolicy::Reject);

        let err = sync(&store, &config).await.unwrap_err();
        insta::assert_snapshot!(
            err.to_string(),
            @"credential sync failed: [cloud-config: source secret 'clusters/demo-cloud-credentials' is missing required key 'clouds.conf']"
        );

        // The CA step is independent and still lands
        assert_eq!(data_of(&store, CP_NS, "openstack-ca")["ca.pem"].0, b"pem");
    }

    #[tokio::test]
    async fn test_second_pass_is_unchanged() {
        let store = MockObjectStore::new().with_object(&full_credentials());
        let config = PlatformConfig::default();

        sync(&store, &config).await.unwrap();
        store.reset_counts();

        let report = sync(&store, &config).await.unwrap();
        assert_eq!(report.cloud_config, OperationResult::Unchanged);
        assert_eq!(report.ca_cert, Some(OperationResult::Unchanged));
        assert_eq!(store.operation_counts().writes(), 0);
    }

    #[tokio::test]
    async fn test_rotated_credentials_update() {
        let store = MockObjectStore::new().with_object(&full_credentials());
        let config = PlatformConfig::default();
        sync(&store, &config).await.unwrap();

        store.insert(&credentials(&[
            ("clouds.yaml", "clouds: {rotated: true}"),
            ("clouds.conf", "[Global]"),
        ]));

        let report = sync(&store, &config).await.unwrap();
        assert_eq!(report.cloud_config, OperationResult::Updated);
        assert_eq!(report.ca_cert, None);

        let mirrored = data_of(&store, CP_NS, IDENTITY);
        assert_eq!(mirrored["clouds.yaml"].0, b"clouds: {rotated: true}");
        // A previously mirrored CA is left in place
        assert!(mirrored.contains_key("cacert"));
    }

    #[tokio::test]
    async fn test_ca_write_failure_is_isolated() {
        let store = MockObjectStore::new().with_object(&full_credentials());
        store.fail_writes_to(ObjectKey::new(CP_NS, "openstack-ca"));

        let err = sync(&store, &PlatformConfig::default()).await.unwrap_err();
        let KubeError::CredentialSync(joined) = err else {
            panic!("expected a joined credential error, got {err:?}");
        };
        assert_eq!(joined.failures.len(), 1);
        assert_eq!(joined.failures[0].step, CredentialStep::CaCert);
        assert_eq!(data_of(&store, CP_NS, IDENTITY).len(), 3);
    }

    #[tokio::test]
    async fn test_custom_ca_secret_and_extractor() {
        let store = MockObjectStore::new().with_object(&credentials(&[
            ("clouds.yaml", "clouds: {}"),
            ("clouds.conf", "[Global]"),
            ("ca-bundle.crt", "bundle"),
        ]));
        let config = PlatformConfig::default()
            .with_ca_secret_name("tenant-ca")
            .with_ca_extractor(|secret| {
                secret
                    .data
                    .as_ref()
                    .and_then(|d| d.get("ca-bundle.crt"))
                    .map(|b| b.0.clone())
            });

        let report = sync(&store, &config).await.unwrap();
        assert_eq!(report.ca_cert, Some(OperationResult::Created));
        assert_eq!(data_of(&store, CP_NS, "tenant-ca")["ca.pem"].0, b"bundle");
    }

    #[tokio::test]
    async fn test_cancelled_sync_touches_nothing() {
        let store = MockObjectStore::new().with_object(&full_credentials());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = sync_credentials(&cancel, &store, &PlatformConfig::default(), TENANT_NS, CP_NS, IDENTITY)
            .await
            .unwrap_err();
        let KubeError::CredentialSync(joined) = err else {
            panic!("expected a joined credential error, got {err:?}");
        };
        assert!(
            joined
                .failures
                .iter()
                .all(|f| matches!(f.source.as_ref(), KubeError::Cancelled))
        );
        assert_eq!(store.operation_counts().total(), 0);
    }
}
