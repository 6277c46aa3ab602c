//! `bpe authorize` and `bpe cancel-register`.
//!
//! ```bash
//! bpe authorize --request signed.xml --response retBPe.xml -o bpeProc.xml
//! bpe cancel-register bpeProc.xml --events retEvento1.xml retEvento2.xml -o bpeProc.xml
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use bpe_protocol::{apply_cancellation, merge_authorization};
use clap::Args;

use crate::{read_text, write_output};

/// Arguments for `bpe authorize`.
#[derive(Args, Debug)]
pub struct AuthorizeArgs {
    /// Signed `BPe` or `eventoBPe` as sent.
    #[arg(long)]
    pub request: PathBuf,

    /// SEFAZ response holding `protBPe` or `retEventoBPe`.
    #[arg(long)]
    pub response: PathBuf,

    /// Where to write the processed document; stdout when absent.
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

/// Arguments for `bpe cancel-register`.
#[derive(Args, Debug)]
pub struct CancelRegisterArgs {
    /// Authorized `bpeProc`.
    pub authorized: PathBuf,

    /// Event result documents to search for an accepted cancellation.
    #[arg(long, num_args = 1.., required = true)]
    pub events: Vec<PathBuf>,

    /// Where to write the document; stdout when absent.
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

/// Execute `bpe authorize`.
pub fn run_authorize(args: &AuthorizeArgs) -> Result<u8> {
    let request = read_text(&args.request)?;
    let response = read_text(&args.response)?;
    let composed = merge_authorization(&request, &response).with_context(|| {
        format!(
            "cannot merge {} with {}",
            args.request.display(),
            args.response.display()
        )
    })?;
    write_output(args.out.as_deref(), &composed)?;
    Ok(0)
}

/// Execute `bpe cancel-register`.
pub fn run_cancel_register(args: &CancelRegisterArgs) -> Result<u8> {
    let authorized = read_text(&args.authorized)?;
    let events = args
        .events
        .iter()
        .map(|path| read_text(path))
        .collect::<Result<Vec<_>>>()?;
    let patched = apply_cancellation(&authorized, &events)
        .with_context(|| format!("cannot update {}", args.authorized.display()))?;
    write_output(args.out.as_deref(), &patched)?;
    Ok(0)
}
