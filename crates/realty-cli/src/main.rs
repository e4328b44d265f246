//! Realty Command-Line Back Office
//!
//! Lists and edits properties, payments, documents, and accounts on behalf
//! of an authenticated uid, enforcing the role-based access policy.

mod commands;
mod error;
mod formatter;

use clap::Parser;
use commands::Command;
use error::CliError;
use formatter::OutputFormat;
use realty_core::storage::{DATA_PATH_ENV, DEFAULT_DATA_PATH};
use realty_core::{Identity, RecordStore, Repository, SessionResolver, StorageConfig, TracingAuditLogger};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Realty Command-Line Back Office
#[derive(Parser, Debug)]
#[command(name = "realty")]
#[command(version, about = "Realty back office")]
pub struct Args {
    /// Data directory
    #[arg(long, env = DATA_PATH_ENV, default_value = DEFAULT_DATA_PATH)]
    pub data_path: PathBuf,

    /// Authenticated uid of the caller
    #[arg(long, env = "REALTY_UID")]
    pub uid: Option<String>,

    /// Output format
    #[arg(long, default_value = "table", value_enum)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

fn main() {
    // Logs go to stderr so JSON output stays parseable.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("realty_core=warn,realty=warn,audit=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

fn run(args: Args) -> Result<(), CliError> {
    let formatter = formatter::create_formatter(args.format);

    let command = match args.command {
        // Policy inspection needs no store.
        Command::Policy(cmd) => {
            println!("{}", commands::execute_policy(cmd, &*formatter));
            return Ok(());
        }
        command => command,
    };

    let store = Arc::new(RecordStore::open(StorageConfig::new(&args.data_path))?);
    let audit = Arc::new(TracingAuditLogger);

    let identity = match args.uid.as_deref() {
        Some(uid) => SessionResolver::new(store.clone())
            .with_audit(audit.clone())
            .resolve(uid),
        None => Identity::anonymous(),
    };
    tracing::debug!(caller = %identity, path = %args.data_path.display(), "session resolved");

    let repo = Repository::new(store.clone()).with_audit(audit);
    let output = commands::execute(command, &repo, &identity, &*formatter)?;
    store.flush()?;
    println!("{}", output);
    Ok(())
}
