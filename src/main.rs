use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use bank_ledger::persistence::{DATA_FILE_ENV, DEFAULT_DATA_FILE};
use bank_ledger::{Error, Ledger};

/// Interactive bank account ledger backed by a single data file.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Path of the data file holding all accounts
    #[arg(long, env = DATA_FILE_ENV, default_value = DEFAULT_DATA_FILE)]
    data_file: PathBuf,

    /// Log operations at debug level (overridden by RUST_LOG)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut ledger = match Ledger::load(&args.data_file) {
        Ok(ledger) => ledger,
        Err(err @ Error::CorruptStore(_)) => {
            error!(path = %args.data_file.display(), %err, "refusing to start");
            eprintln!(
                "Error: {}: {err}; refusing to overwrite it",
                args.data_file.display()
            );
            return ExitCode::from(2);
        }
        Err(err) => {
            eprintln!("Error: {}: {err}", args.data_file.display());
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = bank_ledger::run(&mut ledger, io::stdin().lock(), io::stdout().lock()) {
        eprintln!("Error: {err}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}
