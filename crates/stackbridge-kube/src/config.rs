//! Platform configuration
//!
//! Everything the reconciler needs that is not part of the tenant cluster
//! itself. Built once by the caller and passed in; nothing here reads the
//! process environment.

use k8s_openapi::api::core::v1::Secret;

use crate::credentials::ca_cert_from_credentials;

/// Default name of the secret the CA certificate is projected into
pub const DEFAULT_CA_SECRET_NAME: &str = "openstack-ca";

/// Pulls the CA certificate out of a credentials secret
pub type CaCertExtractor = fn(&Secret) -> Option<Vec<u8>>;

/// What to do when the source secret lacks `clouds.yaml` or `clouds.conf`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MissingKeyPolicy {
    /// Copy an empty value and log a warning
    #[default]
    CopyEmpty,
    /// Fail the cloud-config step with `MissingRequiredKey`
    Reject,
}

/// Configuration for the OpenStack platform reconciler
#[derive(Debug, Clone)]
pub struct PlatformConfig {
    /// Default CAPO provider image
    pub capi_provider_image: String,
    /// Destination secret for the CA certificate
    pub ca_secret_name: String,
    pub missing_key_policy: MissingKeyPolicy,
    pub ca_extractor: CaCertExtractor,
}

impl PlatformConfig {
    pub fn new(capi_provider_image: impl Into<String>) -> Self {
        Self {
            capi_provider_image: capi_provider_image.into(),
            ..Default::default()
        }
    }

    pub fn with_missing_key_policy(mut self, policy: MissingKeyPolicy) -> Self {
        self.missing_key_policy = policy;
        self
    }

    pub fn with_ca_secret_name(mut self, name: impl Into<String>) -> Self {
        self.ca_secret_name = name.into();
        self
    }

    pub fn with_ca_extractor(mut self, extractor: CaCertExtractor) -> Self {
        self.ca_extractor = extractor;
        self
    }
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            capi_provider_image: String::new(),
            ca_secret_name: DEFAULT_CA_SECRET_NAME.to_string(),
            missing_key_policy: MissingKeyPolicy::default(),
            ca_extractor: ca_cert_from_credentials,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PlatformConfig::new("registry.example/capo:v1");
        assert_eq!(config.capi_provider_image, "registry.example/capo:v1");
        assert_eq!(config.ca_secret_name, "openstack-ca");
        assert_eq!(config.missing_key_policy, MissingKeyPolicy::CopyEmpty);
    }

    #[test]
    fn test_builders() {
        let config = PlatformConfig::default()
            .with_ca_secret_name("custom-ca")
            .with_missing_key_policy(MissingKeyPolicy::Reject)
            .with_ca_extractor(|_| Some(b"pem".to_vec()));
        assert_eq!(config.ca_secret_name, "custom-ca");
        assert_eq!(config.missing_key_policy, MissingKeyPolicy::Reject);
        assert_eq!((config.ca_extractor)(&Secret::default()), Some(b"pem".to_vec()));
    }
}
