//! # bpe-cli: Command-Line Front End
//!
//! Wires files and configuration to the library crates:
//!
//! - `bpe make`: assemble a ticket from a YAML/JSON description.
//! - `bpe key`: derive a key from its fields, or inspect one.
//! - `bpe qrcode`: add `infBPeSupl` to a signed ticket.
//! - `bpe event`: build an unsigned event request.
//! - `bpe authorize`: merge a signed request with the SEFAZ response.
//! - `bpe cancel-register`: mark an authorized ticket as canceled.
//!
//! Every handler returns the process exit code; errors bubble up as
//! `anyhow::Error` with file context attached.

pub mod event;
pub mod key;
pub mod make;
pub mod protocol;

use std::path::Path;

use anyhow::{Context, Result};
use bpe_sefaz::SefazConfig;

/// Read a UTF-8 file.
pub fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Write `content` to `out`, or to stdout when `out` is `None`.
pub fn write_output(out: Option<&Path>, content: &str) -> Result<()> {
    match out {
        Some(path) => std::fs::write(path, content)
            .with_context(|| format!("failed to write {}", path.display())),
        None => {
            println!("{content}");
            Ok(())
        }
    }
}

/// Configuration from `--config`, falling back to `BPE_*` variables.
pub fn resolve_config(path: Option<&Path>) -> Result<SefazConfig> {
    match path {
        Some(p) => SefazConfig::load(p)
            .with_context(|| format!("invalid configuration file {}", p.display())),
        None => SefazConfig::from_env().context("configuration not found in BPE_* environment"),
    }
}
