//! Error types for idflasher-core
//!
//! These cover failures of the machinery around a provisioning attempt
//! (enumerating ports, loading a profile, staging a serial record). The
//! outcome of an attempt itself is reported as a value, see
//! [`crate::provision::ProvisioningResult`].

use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// Serial port enumeration failed
    #[error("Failed to enumerate serial ports: {0}")]
    PortEnumeration(#[from] serialport::Error),

    /// Failed to read a configuration file
    #[error("Failed to read {path}: {source}")]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid TOML or has the wrong shape
    #[error("Invalid configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration parsed but holds an unusable value
    #[error("Invalid configuration value for `{field}`: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    /// Serial record could not be staged on disk
    #[error("Failed to create serial record: {0}")]
    Record(#[source] std::io::Error),
}

/// Result type for idflasher-core operations
pub type Result<T> = std::result::Result<T, Error>;
