//! # bpe CLI entry point
//!
//! Parses command-line arguments, installs logging, and dispatches to the
//! subcommand handlers in `bpe_cli`.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use bpe_cli::event::{run_event, EventArgs};
use bpe_cli::key::{run_key, KeyArgs};
use bpe_cli::make::{run_make, run_qrcode, MakeArgs, QrcodeArgs};
use bpe_cli::protocol::{run_authorize, run_cancel_register, AuthorizeArgs, CancelRegisterArgs};

/// BP-e toolkit.
///
/// Assembles electronic passenger tickets (model 63), derives document
/// keys, builds event requests, and reconciles SEFAZ responses with the
/// documents they answer.
#[derive(Parser, Debug)]
#[command(name = "bpe", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Issuer configuration file (YAML or JSON); `BPE_*` variables otherwise.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Assemble a ticket from a YAML/JSON description.
    Make(MakeArgs),

    /// Derive or inspect a document key.
    Key(KeyArgs),

    /// Insert the QR-code supplement into a signed ticket.
    Qrcode(QrcodeArgs),

    /// Build an unsigned event request.
    Event(EventArgs),

    /// Merge a signed request with its SEFAZ response.
    Authorize(AuthorizeArgs),

    /// Mark an authorized ticket as canceled from event results.
    CancelRegister(CancelRegisterArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.config.as_deref();
    let result = match &cli.command {
        Commands::Make(args) => run_make(args),
        Commands::Key(args) => run_key(args),
        Commands::Qrcode(args) => run_qrcode(args, config),
        Commands::Event(args) => run_event(args, config),
        Commands::Authorize(args) => run_authorize(args),
        Commands::CancelRegister(args) => run_cancel_register(args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
