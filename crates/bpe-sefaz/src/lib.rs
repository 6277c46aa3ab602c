//! # bpe-sefaz: SEFAZ Request Construction
//!
//! Everything between a finished BP-e and the authorizer's web services:
//!
//! - [`SefazConfig`]: issuer environment, UF, CNPJ, version, QR-code URL,
//!   loaded from a file or from `BPE_*` environment variables.
//! - [`Signer`], [`Transport`], [`SchemaValidator`]: seams for the
//!   certificate, SOAP, and XSD machinery, with recording mocks.
//! - [`build_event_request`]: unsigned `eventoBPe` for cancellation,
//!   boarding denial, and seat change.
//! - [`SefazTools`]: batch submission, receipt and key queries, events.

pub mod collaborator;
pub mod config;
pub mod error;
pub mod events;
pub mod service;
pub mod tools;

pub use collaborator::{
    MockSigner, MockTransport, MockValidator, SchemaValidator, SentRequest, SignCall, Signer, Transport,
};
pub use config::{Canonicalization, Environment, SefazConfig, SignatureAlgorithm, SigningProfile};
pub use error::{ConfigError, SefazError};
pub use events::{build_event_request, event_id, EventDetail};
pub use service::{Service, ServiceCall};
pub use tools::SefazTools;
