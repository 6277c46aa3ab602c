//! `bpe event`: build an unsigned event request for the configured issuer.
//!
//! ```bash
//! bpe event cancel --key <KEY> --protocol 135190000000001 --justification "Viagem cancelada"
//! bpe event seat-change --key <KEY> --protocol 135190000000001 --seat 12 --sequence 2
//! ```
//!
//! The output still has to be signed over `infEvento/@Id` before it can be
//! sent.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use bpe_core::{DocumentKey, Uf};
use bpe_sefaz::{build_event_request, EventDetail};
use chrono::{DateTime, FixedOffset, Local};
use clap::{Args, Subcommand};

use crate::{resolve_config, write_output};

/// Arguments for `bpe event`.
#[derive(Args, Debug)]
pub struct EventArgs {
    #[command(subcommand)]
    pub command: EventCommand,
}

/// Options shared by every event.
#[derive(Args, Debug)]
pub struct EventCommon {
    /// Key of the ticket.
    #[arg(long)]
    pub key: String,

    /// Authorization protocol of the ticket.
    #[arg(long)]
    pub protocol: String,

    /// Event sequence (`nSeqEvento`).
    #[arg(long, default_value_t = 1)]
    pub sequence: u32,

    /// Event timestamp (RFC 3339); now when absent.
    #[arg(long)]
    pub at: Option<String>,

    /// Where to write the XML; stdout when absent.
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

/// Supported events.
#[derive(Subcommand, Debug)]
pub enum EventCommand {
    /// Cancellation (110111).
    Cancel {
        #[command(flatten)]
        common: EventCommon,
        /// Reason for canceling.
        #[arg(long)]
        justification: String,
    },
    /// Boarding denial (110115).
    NoBoarding {
        #[command(flatten)]
        common: EventCommon,
        /// Reason the passenger did not board.
        #[arg(long)]
        justification: String,
    },
    /// Seat change (110116).
    SeatChange {
        #[command(flatten)]
        common: EventCommon,
        /// New seat.
        #[arg(long)]
        seat: String,
    },
}

impl EventCommand {
    fn split(&self) -> (&EventCommon, EventDetail) {
        match self {
            Self::Cancel {
                common,
                justification,
            } => (
                common,
                EventDetail::Cancellation {
                    protocol: common.protocol.clone(),
                    justification: justification.clone(),
                },
            ),
            Self::NoBoarding {
                common,
                justification,
            } => (
                common,
                EventDetail::NoBoarding {
                    protocol: common.protocol.clone(),
                    justification: justification.clone(),
                },
            ),
            Self::SeatChange { common, seat } => (
                common,
                EventDetail::SeatChange {
                    protocol: common.protocol.clone(),
                    seat: seat.clone(),
                },
            ),
        }
    }
}

fn issued_at(at: Option<&str>) -> Result<DateTime<FixedOffset>> {
    match at {
        Some(text) => DateTime::parse_from_rfc3339(text.trim())
            .with_context(|| format!("--at is not an RFC 3339 timestamp: {text:?}")),
        None => {
            let now = Local::now();
            Ok(now.with_timezone(now.offset()))
        }
    }
}

/// Execute `bpe event`.
pub fn run_event(args: &EventArgs, config: Option<&Path>) -> Result<u8> {
    let config = resolve_config(config)?;
    let (common, detail) = args.command.split();
    let key = DocumentKey::new(common.key.as_str()).context("invalid document key")?;
    if Uf::from_code(key.uf_code()) != Some(config.uf) {
        bail!(
            "key belongs to UF code {}, configured issuer UF is {}",
            key.uf_code(),
            config.uf
        );
    }
    let at = issued_at(common.at.as_deref())?;
    let xml = build_event_request(&config, &key, &detail, common.sequence, &at)?;
    write_output(common.out.as_deref(), &xml)?;
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_timestamp_keeps_offset() {
        let at = issued_at(Some("2019-01-10T10:00:00-03:00")).unwrap();
        assert_eq!(at.offset().local_minus_utc(), -3 * 3600);
    }

    #[test]
    fn bad_timestamp() {
        assert!(issued_at(Some("10/01/2019")).is_err());
    }
}
