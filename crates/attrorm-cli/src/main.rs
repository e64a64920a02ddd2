//! attrorm command-line client
//!
//! Inspect and edit a sled-backed attribute store, or run the session demo.

mod commands;
mod demo;
mod formatter;

use std::path::PathBuf;

use attrorm_core::{AttributeStore, CacheKind, SledStore, StoreConfig};
use clap::Parser;
use commands::{CliError, Command};
use formatter::OutputFormat;

/// attrorm command-line client
#[derive(Parser, Debug)]
#[command(name = "attrorm")]
#[command(version, about = "attrorm command-line client")]
pub struct Args {
    /// Store directory
    #[arg(short = 'd', long, default_value = "./attrorm_data")]
    pub data_path: PathBuf,

    /// Output format
    #[arg(long, default_value = "table", value_enum)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new("attrorm=info,attrorm_core=info")
                }),
        )
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn run(args: Args) -> Result<String, CliError> {
    let formatter = formatter::create_formatter(args.format);

    if let Command::Demo { cache } = &args.command {
        return demo::run(CacheKind::from(*cache), &*formatter);
    }

    let store = SledStore::open(&StoreConfig::new(&args.data_path))?;
    tracing::debug!(path = %args.data_path.display(), "store opened");

    let output = commands::execute(&store, &args.command, &*formatter)?;
    store.flush()?;
    Ok(output)
}
