//! # Protocol Errors
//!
//! Every variant is fatal to the operation that raised it. Nothing here is
//! retried; the caller decides whether to query SEFAZ again.

use bpe_core::XmlError;
use thiserror::Error;

/// Error raised while merging or patching protocol documents.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// The request root is neither `BPe` nor `eventoBPe`.
    #[error("document <{root}> cannot receive a protocol")]
    UnsupportedDocument {
        /// Root element found.
        root: String,
    },

    /// The response lacks the protocol or event result element.
    #[error("response has no <{element}>")]
    MissingProtocol {
        /// Element that was expected.
        element: &'static str,
    },

    /// SEFAZ did not accept the document or event.
    #[error("[{code}] {reason}")]
    Rejected {
        /// `cStat` returned.
        code: String,
        /// `xMotivo` returned.
        reason: String,
    },

    /// The response acknowledges a different document than the one sent.
    #[error("digest mismatch: request {request:?}, protocol {response:?}")]
    DigestMismatch {
        /// `DigestValue` of the signed request.
        request: String,
        /// `digVal` of the protocol.
        response: String,
    },

    /// The event type has no composed form.
    #[error("unsupported event type {code:?}")]
    UnsupportedEvent {
        /// `tpEvento` found.
        code: String,
    },

    /// The ticket carries no `protBPe` and was never authorized.
    #[error("document has no authorization protocol")]
    NotAuthorized,

    /// A structural element is absent from a document.
    #[error("<{element}> not found in <{document}>")]
    MissingElement {
        /// Element looked for.
        element: &'static str,
        /// Document or group searched.
        document: String,
    },

    /// Input is not well-formed XML.
    #[error(transparent)]
    Xml(#[from] XmlError),
}
