//! # bpe-protocol: Protocol Reconciliation
//!
//! Pure functions over XML text that reconcile what was sent to SEFAZ with
//! what SEFAZ answered:
//!
//! - [`merge_authorization`]: signed `BPe` + `protBPe` → `bpeProc`;
//!   signed `eventoBPe` + `retEventoBPe` → `procCancBPe`, `procNaoEmb`, or
//!   `procAlteracaoPoltrona`.
//! - [`apply_cancellation`]: authorized `bpeProc` + event results →
//!   `bpeProc` with status 101 when a cancellation was accepted.
//!
//! Neither function holds state, so both may run concurrently on
//! independent inputs.

pub mod cancel;
pub mod error;
pub mod fragment;
pub mod merge;

pub use cancel::{apply_cancellation, find_cancellation, CancellationMatch};
pub use error::ProtocolError;
pub use fragment::ProtocolFragment;
pub use merge::{join, merge_authorization, RequestKind};
