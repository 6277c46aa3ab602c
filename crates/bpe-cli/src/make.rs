//! # Ticket Commands
//!
//! `bpe make` assembles a ticket; `bpe qrcode` adds the QR-code supplement
//! after the ticket has been signed elsewhere.
//!
//! ```bash
//! bpe make ticket.yaml -o ticket.xml
//! bpe qrcode signed.xml -o signed-with-qr.xml
//! ```
//!
//! Ticket descriptions use the XML element names as keys (`ide`, `emit`,
//! `cUF`, `nBP`, ...). Every leaf is text; unquoted numbers and booleans
//! are converted to their literal text before assembly, so values that
//! carry leading zeros or fixed decimals (`serie: "001"`, `vBP: "10.50"`)
//! must be quoted.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bpe_make::{put_qr_tag, TicketAssembler, TicketInput, DEFAULT_QRCODE_URL};
use clap::Args;

use crate::{read_text, resolve_config, write_output};

/// Arguments for `bpe make`.
#[derive(Args, Debug)]
pub struct MakeArgs {
    /// Ticket description (`.yaml`, `.yml`, or `.json`).
    pub input: PathBuf,

    /// Where to write the XML; stdout when absent.
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

/// Arguments for `bpe qrcode`.
#[derive(Args, Debug)]
pub struct QrcodeArgs {
    /// Signed BP-e.
    pub signed: PathBuf,

    /// Consultation URL; taken from `--config` or the built-in default
    /// when absent.
    #[arg(long)]
    pub url: Option<String>,

    /// Where to write the XML; stdout when absent.
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

fn stringify_yaml(value: serde_yaml::Value) -> serde_yaml::Value {
    use serde_yaml::Value;
    match value {
        Value::Number(n) => Value::String(n.to_string()),
        Value::Bool(b) => Value::String(b.to_string()),
        Value::Sequence(items) => Value::Sequence(items.into_iter().map(stringify_yaml).collect()),
        Value::Mapping(map) => Value::Mapping(
            map.into_iter()
                .map(|(k, v)| (k, stringify_yaml(v)))
                .collect(),
        ),
        Value::Tagged(tagged) => stringify_yaml(tagged.value),
        other => other,
    }
}

fn stringify_json(value: serde_json::Value) -> serde_json::Value {
    use serde_json::Value;
    match value {
        Value::Number(n) => Value::String(n.to_string()),
        Value::Bool(b) => Value::String(b.to_string()),
        Value::Array(items) => Value::Array(items.into_iter().map(stringify_json).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, stringify_json(v)))
                .collect(),
        ),
        other => other,
    }
}

/// Parse a ticket description; `.json` files as JSON, others as YAML.
pub fn load_ticket(path: &Path) -> Result<TicketInput> {
    let text = read_text(path)?;
    let is_json = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let input = if is_json {
        let raw: serde_json::Value = serde_json::from_str(&text)
            .with_context(|| format!("invalid JSON in {}", path.display()))?;
        serde_json::from_value(stringify_json(raw))
            .with_context(|| format!("unexpected ticket layout in {}", path.display()))?
    } else {
        let raw: serde_yaml::Value = serde_yaml::from_str(&text)
            .with_context(|| format!("invalid YAML in {}", path.display()))?;
        serde_yaml::from_value(stringify_yaml(raw))
            .with_context(|| format!("unexpected ticket layout in {}", path.display()))?
    };
    Ok(input)
}

/// Execute `bpe make`.
pub fn run_make(args: &MakeArgs) -> Result<u8> {
    let input = load_ticket(&args.input)?;
    let (xml, key) = TicketAssembler::assemble(&input)
        .with_context(|| format!("cannot assemble {}", args.input.display()))?;
    tracing::info!(key = %key, "ticket assembled");
    write_output(args.out.as_deref(), &xml)?;
    if args.out.is_some() {
        println!("{key}");
    }
    Ok(0)
}

/// Execute `bpe qrcode`.
pub fn run_qrcode(args: &QrcodeArgs, config: Option<&Path>) -> Result<u8> {
    let url = match (&args.url, config) {
        (Some(url), _) => url.clone(),
        (None, Some(_)) => resolve_config(config)?.qrcode_url,
        (None, None) => DEFAULT_QRCODE_URL.to_string(),
    };
    let signed = read_text(&args.signed)?;
    let xml = put_qr_tag(&signed, &url)
        .with_context(|| format!("cannot add QR code to {}", args.signed.display()))?;
    write_output(args.out.as_deref(), &xml)?;
    Ok(0)
}
