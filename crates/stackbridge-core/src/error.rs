//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("tenant cluster '{cluster}' has no OpenStack platform spec")]
    MissingPlatformSpec { cluster: String },

    #[error("invalid machine network '{cidr}': {message}")]
    InvalidNetworkConfig { cidr: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
