//! # bpe-make: BP-e Document Assembler
//!
//! Turns plain per-group input records into a signed-ready `BPe` document.
//!
//! ## Flow
//!
//! ```text
//! records ──tag_*──▶ TicketAssembler ──build()──▶ ordered tree
//!                                                    │
//!                                         check_key (self-healing)
//!                                                    │
//!                                                    ▼
//!                                            serialized BPe
//! ```
//!
//! After external signing, [`qrcode::put_qr_tag`] adds the `infBPeSupl`
//! group in front of the signature.
//!
//! ## Crate Policy
//!
//! - Depends on `bpe-core` only among workspace crates.
//! - Required fields are checked per group; nothing is emitted for absent
//!   optional fields.

pub mod assembler;
pub mod error;
mod group;
pub mod key_check;
pub mod qrcode;
pub mod records;
pub mod tax;

pub use assembler::TicketAssembler;
pub use error::AssemblyError;
pub use key_check::check_key;
pub use qrcode::{put_qr_tag, DEFAULT_QRCODE_URL};
pub use records::TicketInput;
pub use tax::{Icms, IcmsRecord};
