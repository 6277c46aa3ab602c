//! # bpe-core: Foundational Types for BP-e Documents
//!
//! This crate is the leaf of the workspace. It defines the primitives every
//! other crate builds on when assembling, reconciling, or submitting a
//! Bilhete de Passagem Eletrônico (BP-e, model 63).
//!
//! ## Key Design Principles
//!
//! 1. **Constants live in one place.** The portal namespace, layout version,
//!    SEFAZ status sentinels, and fixed field widths are `const` data in
//!    [`constants`]. No scattered literals.
//!
//! 2. **`DocumentKey` newtype.** A 44-digit key is only constructible by
//!    derivation from its fields or by validating an existing string
//!    (length, digits, check digit). No bare strings for keys.
//!
//! 3. **Single `EventKind` table.** Event codes, descriptions, detail
//!    element names, and proc wrapper names come from one enum. Request
//!    building and protocol merging read the same table.
//!
//! 4. **Ordered XML tree.** [`xml::Element`] keeps children in insertion
//!    order and serializes without reformatting. [`reader::XmlDocument`]
//!    parses while remembering byte spans so fragments can be cut out of
//!    a signed document verbatim.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `bpe-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod constants;
pub mod error;
pub mod event;
pub mod jurisdiction;
pub mod key;
pub mod reader;
pub mod strings;
pub mod xml;

// Re-export primary types for ergonomic imports.
pub use error::{KeyError, XmlError};
pub use event::EventKind;
pub use jurisdiction::Uf;
pub use key::{DocumentKey, KeyFields};
pub use reader::{ParsedElement, XmlDocument};
pub use xml::Element;
