//! # Assembly Errors

use bpe_core::{KeyError, XmlError};
use thiserror::Error;

/// Error raised while assembling a ticket document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssemblyError {
    /// A required field or group has no value.
    #[error("missing required field <{element}> in <{context}>")]
    MissingRequiredField {
        /// Element that should have been emitted.
        element: String,
        /// Enclosing group.
        context: String,
    },

    /// The ICMS `CST` code selects no known tax block.
    #[error("unknown ICMS tax situation code: {code:?}")]
    UnknownTaxSituation {
        /// Offending `CST` value.
        code: String,
    },

    /// A field is present but unusable.
    #[error("invalid value for <{element}>: {reason}")]
    InvalidField {
        /// Element name.
        element: String,
        /// What is wrong with it.
        reason: String,
    },

    /// `build()` was called again without `reset()`.
    #[error("assembler already built a document; call reset() before reuse")]
    AlreadyBuilt,

    /// XML serialization or parsing failed.
    #[error(transparent)]
    Xml(#[from] XmlError),

    /// Key derivation failed.
    #[error(transparent)]
    Key(#[from] KeyError),
}

impl AssemblyError {
    pub(crate) fn missing(element: &str, context: &str) -> Self {
        Self::MissingRequiredField {
            element: element.to_string(),
            context: context.to_string(),
        }
    }

    pub(crate) fn invalid(element: &str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            element: element.to_string(),
            reason: reason.into(),
        }
    }
}
