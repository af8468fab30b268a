//! CLI error types with exit code handling
//!
//! Library errors are flattened into [`CliError`] at the command boundary
//! so each failure maps onto one exit code.

use miette::Diagnostic;
use stackbridge_core::CoreError;
use stackbridge_kube::KubeError;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// The manifest or its networks are invalid
    #[error("Invalid input: {message}")]
    #[diagnostic(code(stackbridge::cli::input))]
    Input {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// The tenant cluster cannot be translated
    #[error("Translation failed: {message}")]
    #[diagnostic(code(stackbridge::cli::translation))]
    Translation {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Talking to the cluster failed
    #[error("Cluster error: {message}")]
    #[diagnostic(code(stackbridge::cli::cluster))]
    Cluster {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(stackbridge::cli::io))]
    Io { message: String },

    /// The run was interrupted
    #[error("Interrupted")]
    #[diagnostic(code(stackbridge::cli::interrupted))]
    Interrupted,

    /// Internal error (runtime, unexpected failure)
    #[error("Internal error: {message}")]
    #[diagnostic(code(stackbridge::cli::internal))]
    Internal { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Input { .. } => exit_codes::INPUT_ERROR,
            CliError::Translation { .. } => exit_codes::TRANSLATION_ERROR,
            CliError::Cluster { .. } => exit_codes::CLUSTER_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Interrupted => exit_codes::INTERRUPTED,
            CliError::Internal { .. } => exit_codes::ERROR,
        }
    }

    /// Create a cluster error
    pub fn cluster(message: impl Into<String>) -> Self {
        Self::Cluster {
            message: message.into(),
            help: None,
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match &err {
            CoreError::MissingPlatformSpec { .. } => CliError::Translation {
                message: err.to_string(),
                help: Some("Add a spec.platform.openstack section to the tenant cluster".to_string()),
            },
            CoreError::InvalidNetworkConfig { .. } => CliError::Input {
                message: err.to_string(),
                help: Some(
                    "Machine networks must be CIDRs such as 192.168.10.0/24".to_string(),
                ),
            },
            CoreError::YamlParse(_) => CliError::Input {
                message: err.to_string(),
                help: None,
            },
            CoreError::Io(_) => CliError::Io {
                message: err.to_string(),
            },
        }
    }
}

impl From<KubeError> for CliError {
    fn from(err: KubeError) -> Self {
        match err {
            KubeError::Core(core) => core.into(),
            KubeError::Cancelled => CliError::Interrupted,
            KubeError::SourceSecretNotFound { .. } => CliError::Cluster {
                message: err.to_string(),
                help: Some(
                    "The tenant must create its credentials secret before credentials can sync"
                        .to_string(),
                ),
            },
            KubeError::Conflict { .. } => CliError::Cluster {
                message: err.to_string(),
                help: Some("Another writer changed the object; run the command again".to_string()),
            },
            other => CliError::cluster(other.to_string()),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for CliError {
    fn from(err: serde_yaml::Error) -> Self {
        CliError::internal(format!("failed to serialize output: {}", err))
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
