//! # Error Types
//!
//! `ConfigError` covers loading [`SefazConfig`](crate::SefazConfig);
//! `SefazError` covers building and dispatching requests, including
//! failures reported by the injected collaborators.

use bpe_core::{KeyError, XmlError};
use thiserror::Error;

/// Error while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required setting is absent.
    #[error("missing configuration value: {name}")]
    Missing {
        /// Environment variable or file key.
        name: &'static str,
    },

    /// A setting is present but unusable.
    #[error("invalid configuration value for {name}: {reason}")]
    Invalid {
        /// Environment variable or file key.
        name: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// The configuration file could not be read.
    #[error("cannot read configuration file: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid YAML for [`SefazConfig`](crate::SefazConfig).
    #[error("malformed YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The configuration file is not valid JSON for [`SefazConfig`](crate::SefazConfig).
    #[error("malformed JSON configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// Error while building or sending a SEFAZ request.
#[derive(Error, Debug)]
pub enum SefazError {
    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The key belongs to a different UF than the configured issuer.
    #[error("document key belongs to UF {key_uf}, configured UF is {configured}")]
    KeyUfMismatch {
        /// UF numeric code taken from the key.
        key_uf: u8,
        /// Configured UF acronym.
        configured: String,
    },

    /// The key UF code does not name any federative unit.
    #[error("document key carries unknown UF code {0}")]
    UnknownKeyUf(u8),

    /// Event sequence outside 1..=99.
    #[error("event sequence must be between 1 and 99, got {0}")]
    InvalidSequence(u32),

    /// The signer refused or failed.
    #[error("signing failed: {reason}")]
    Signing {
        /// Signer diagnostic.
        reason: String,
    },

    /// Schema validation rejected the request.
    #[error("{schema} failed schema validation: {reason}")]
    Validation {
        /// Root element validated.
        schema: String,
        /// Validator diagnostic.
        reason: String,
    },

    /// The transport could not deliver the request.
    #[error("{service} unavailable: {reason}")]
    Transport {
        /// Web service name.
        service: String,
        /// Transport diagnostic.
        reason: String,
    },

    /// Batch compression failed.
    #[error("compression failed: {0}")]
    Compression(#[from] std::io::Error),

    /// Invalid document key.
    #[error(transparent)]
    Key(#[from] KeyError),

    /// XML serialization failed.
    #[error(transparent)]
    Xml(#[from] XmlError),
}
