//! `bpe key`: derive a document key from its fields, or take one apart.
//!
//! ```bash
//! bpe key derive --uf SP --year-month 1901 --cnpj 12345678000195 --series 1 --number 123
//! bpe key inspect 35190112345678000195630010000001231456789013
//! ```

use anyhow::{bail, Context, Result};
use bpe_core::constants::MODEL_BPE;
use bpe_core::key::random_numeric_code;
use bpe_core::{DocumentKey, KeyFields, Uf};
use clap::{Args, Subcommand};

/// Arguments for `bpe key`.
#[derive(Args, Debug)]
pub struct KeyArgs {
    #[command(subcommand)]
    pub command: KeyCommand,
}

/// Key operations.
#[derive(Subcommand, Debug)]
pub enum KeyCommand {
    /// Compute a key and its check digit.
    Derive {
        /// Issuer UF acronym.
        #[arg(long)]
        uf: Uf,

        /// Emission year and month as YYMM.
        #[arg(long)]
        year_month: String,

        /// Issuer CNPJ.
        #[arg(long)]
        cnpj: String,

        /// Document series.
        #[arg(long)]
        series: u32,

        /// Document number.
        #[arg(long)]
        number: u64,

        /// Emission type (`tpEmis`).
        #[arg(long, default_value_t = 1)]
        emission_type: u8,

        /// Numeric code (`cBP`); random when absent.
        #[arg(long)]
        numeric_code: Option<u32>,
    },

    /// Validate a key and print its fields as JSON.
    Inspect {
        /// The 44-digit key.
        key: String,
    },
}

/// Split `YYMM` into year and month.
fn parse_year_month(text: &str) -> Result<(u8, u8)> {
    let text = text.trim();
    if text.len() != 4 || !text.bytes().all(|b| b.is_ascii_digit()) {
        bail!("--year-month must be four digits (YYMM), got {text:?}");
    }
    let year = text[..2].parse().context("invalid year")?;
    let month = text[2..].parse().context("invalid month")?;
    Ok((year, month))
}

/// Fields encoded in `key`.
pub fn key_fields(key: &DocumentKey) -> Result<KeyFields> {
    let (year, month) = parse_year_month(key.year_month())?;
    Ok(KeyFields {
        uf_code: key.uf_code(),
        year,
        month,
        tax_id: key.tax_id().to_string(),
        model: key.model(),
        series: key.series(),
        number: key.number(),
        emission_type: key.emission_type(),
        numeric_code: key.numeric_code(),
    })
}

/// Execute `bpe key`.
pub fn run_key(args: &KeyArgs) -> Result<u8> {
    match &args.command {
        KeyCommand::Derive {
            uf,
            year_month,
            cnpj,
            series,
            number,
            emission_type,
            numeric_code,
        } => {
            let (year, month) = parse_year_month(year_month)?;
            let fields = KeyFields {
                uf_code: uf.code(),
                year,
                month,
                tax_id: cnpj.trim().to_string(),
                model: MODEL_BPE,
                series: *series,
                number: *number,
                emission_type: *emission_type,
                numeric_code: numeric_code.unwrap_or_else(|| random_numeric_code(*number)),
            };
            let key = fields.derive().context("cannot derive key")?;
            println!("{key}");
        }
        KeyCommand::Inspect { key } => {
            let key = DocumentKey::new(key.as_str()).context("invalid document key")?;
            let fields = key_fields(&key)?;
            println!("{}", serde_json::to_string_pretty(&fields)?);
        }
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_month_parsing() {
        assert_eq!(parse_year_month("1901").unwrap(), (19, 1));
        assert!(parse_year_month("190").is_err());
        assert!(parse_year_month("19a1").is_err());
    }

    #[test]
    fn fields_round_trip() {
        let key = DocumentKey::new("35190112345678000195630010000001231456789013").unwrap();
        let fields = key_fields(&key).unwrap();
        assert_eq!(fields.uf_code, 35);
        assert_eq!((fields.year, fields.month), (19, 1));
        assert_eq!(fields.series, 1);
        assert_eq!(fields.number, 123);
        assert_eq!(fields.derive().unwrap(), key);
    }
}
