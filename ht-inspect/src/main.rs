//! Command-line inspector for handheld transceiver traffic
//!
//! Commands:
//! - `frame <HEX>` - decode a standard or short-form packet frame
//! - `address <TEXT> [--last]` - show the wire form of a `CALL-SSID` address
//! - `record <KIND> <HEX>` - decode a device record body
//! - `reassemble [FILE]` - reassemble hex fragments, one per line (stdin by default)
//! - `routes [TEXT]` - parse and normalise a digipeater route table
//! - `config [--save]` - show (and optionally write) the settings file

mod inspect;
mod settings;

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::inspect::{Options, RecordKind};
use crate::settings::{OutputFormat, Settings};

#[derive(Parser)]
#[command(name = "htinspect")]
#[command(about = "Decode packets, fragments and device records from Bluetooth handheld radios")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (defaults to the saved setting)
    #[arg(short, long, value_enum, global = true)]
    output: Option<OutputFormat>,

    /// Append raw hex to decoded frames
    #[arg(long, global = true)]
    hex: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a packet frame
    Frame {
        /// Frame bytes as hex
        hex: String,
    },
    /// Encode a station address
    Address {
        /// Address text, e.g. N0CALL-9
        text: String,
        /// Mark as the last address of the chain
        #[arg(long)]
        last: bool,
    },
    /// Decode a device record body
    Record {
        #[arg(value_enum)]
        kind: RecordKind,
        /// Record body as hex
        hex: String,
    },
    /// Reassemble fragments into frames
    Reassemble {
        /// File with one hex fragment per line
        file: Option<PathBuf>,
    },
    /// Parse a route table
    Routes {
        /// Route table text; the saved default is used when omitted
        text: Option<String>,
    },
    /// Show the settings file
    Config {
        /// Write the effective settings back to disk
        #[arg(long)]
        save: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| settings.log_filter.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let options = Options {
        output: cli.output.unwrap_or(settings.output),
        show_hex: cli.hex || settings.show_hex,
    };

    let report = match cli.command {
        Commands::Frame { hex } => inspect::frame(&hex, &options)?,
        Commands::Address { text, last } => inspect::address(&text, last, &options)?,
        Commands::Record { kind, hex } => inspect::record(kind, &hex, &options)?,
        Commands::Reassemble { file } => {
            let input: Box<dyn BufRead> = match file {
                Some(path) => {
                    let file = File::open(&path)
                        .with_context(|| format!("Failed to open {}", path.display()))?;
                    Box::new(BufReader::new(file))
                }
                None => Box::new(io::stdin().lock()),
            };
            inspect::reassemble(input, &options)?
        }
        Commands::Routes { text } => {
            inspect::routes(text.as_deref().unwrap_or(&settings.default_routes), &options)?
        }
        Commands::Config { save } => {
            if save {
                let path = settings.save()?;
                tracing::info!("Saved settings to {}", path.display());
            }
            inspect::config(&settings)?
        }
    };

    println!("{report}");
    Ok(())
}
