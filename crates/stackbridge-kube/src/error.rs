//! Error types for stackbridge-kube

use std::fmt;

use thiserror::Error;

/// Result type for stackbridge-kube operations
pub type Result<T> = std::result::Result<T, KubeError>;

/// Errors that can occur while reconciling against the object store
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum KubeError {
    /// Kubernetes API error
    #[error("Kubernetes API error: {0}")]
    Api(#[from] kube::Error),

    /// Translation error from the core crate
    #[error(transparent)]
    Core(#[from] stackbridge_core::CoreError),

    /// The tenant's credentials secret does not exist (yet)
    #[error("source secret '{name}' not found in namespace '{namespace}'")]
    SourceSecretNotFound { namespace: String, name: String },

    /// A required key is missing from the source secret
    #[error("source secret '{namespace}/{name}' is missing required key '{key}'")]
    MissingRequiredKey {
        namespace: String,
        name: String,
        key: String,
    },

    /// The object changed since it was read
    #[error("{kind} '{namespace}/{name}' was modified concurrently")]
    Conflict {
        kind: String,
        namespace: String,
        name: String,
    },

    /// The object already exists
    #[error("{kind} '{namespace}/{name}' already exists")]
    AlreadyExists {
        kind: String,
        namespace: String,
        name: String,
    },

    /// The object lacks a name or namespace
    #[error("invalid object: {0}")]
    InvalidObject(String),

    /// The caller cancelled the reconciliation
    #[error("reconciliation cancelled")]
    Cancelled,

    /// One or both credential sync steps failed
    #[error(transparent)]
    CredentialSync(#[from] CredentialSyncError),

    /// Storage error
    #[error("storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for KubeError {
    fn from(e: serde_json::Error) -> Self {
        KubeError::Serialization(e.to_string())
    }
}

impl KubeError {
    /// Check if this is a Kubernetes 404 Not Found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, KubeError::Api(kube::Error::Api(resp)) if resp.code == 404)
    }

    /// Check if this is a conflict error, from the API server or the store
    pub fn is_conflict(&self) -> bool {
        matches!(self, KubeError::Conflict { .. })
            || matches!(self, KubeError::Api(kube::Error::Api(resp)) if resp.code == 409)
    }
}

/// The independent steps of a credential sync
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialStep {
    /// Mirror of the clouds.yaml/clouds.conf secret
    CloudConfig,
    /// Projection of the CA certificate
    CaCert,
}

impl fmt::Display for CredentialStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialStep::CloudConfig => write!(f, "cloud-config"),
            CredentialStep::CaCert => write!(f, "ca-cert"),
        }
    }
}

/// A failed credential step and its cause
#[derive(Debug, Error)]
#[error("{step}: {source}")]
pub struct StepFailure {
    pub step: CredentialStep,
    pub source: Box<KubeError>,
}

/// Failures from every credential step that failed in one pass
#[derive(Debug, Error)]
#[error("credential sync failed: {}", join_failures(.failures))]
pub struct CredentialSyncError {
    pub failures: Vec<StepFailure>,
}

fn join_failures(failures: &[StepFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("[{}]", f))
        .collect::<Vec<_>>()
        .join("; ")
}

impl CredentialSyncError {
    /// Collect step results; `None` when every step succeeded
    pub fn from_results(results: Vec<(CredentialStep, Result<()>)>) -> Option<Self> {
        let failures: Vec<StepFailure> = results
            .into_iter()
            .filter_map(|(step, result)| {
                result.err().map(|e| StepFailure {
                    step,
                    source: Box::new(e),
                })
            })
            .collect();

        if failures.is_empty() {
            None
        } else {
            Some(Self { failures })
        }
    }

    /// The failure for a given step, if that step failed
    pub fn failure(&self, step: CredentialStep) -> Option<&KubeError> {
        self.failures
            .iter()
            .find(|f| f.step == step)
            .map(|f| f.source.as_ref())
    }
}
