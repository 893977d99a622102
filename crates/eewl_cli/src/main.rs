//! eewl CLI
//!
//! Command-line tools for wear-leveled buffers stored in a medium image file.
//!
//! # Commands
//!
//! - `inspect` - Display buffer layout, state and current record
//! - `verify` - Check block markers without repairing them
//! - `dump` - Print the control fields and every block
//! - `format` - Free every block marker
//! - `put` - Store a record
//! - `get` - Read the current record

mod commands;

use clap::{Parser, Subcommand};
use eewl_core::Config;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// eewl command-line medium image tools.
#[derive(Parser)]
#[command(name = "eewl")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the medium image file
    #[arg(global = true, short, long)]
    image: Option<PathBuf>,

    /// Record size in bytes
    #[arg(global = true, short, long)]
    payload_size: Option<usize>,

    /// Number of blocks in rotation
    #[arg(global = true, short, long, default_value = "10")]
    blocks: usize,

    /// Address of the first block (decimal or 0x-prefixed hex)
    #[arg(global = true, short, long, default_value = "1", value_parser = commands::parse_address)]
    start: usize,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn config(&self) -> Result<Config, &'static str> {
        let payload_size = self
            .payload_size
            .ok_or("Record size required (--payload-size)")?;
        Ok(Config::new(payload_size)
            .block_count(self.blocks)
            .start_address(self.start))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Display buffer layout, state and current record
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Check block markers without repairing them
    Verify,

    /// Print the control fields and the raw content of every block
    Dump,

    /// Free every block marker, erasing the record
    Format,

    /// Store a record given as hex bytes
    Put {
        /// Record bytes, e.g. "01 02 03 04" or "01020304"
        hex: String,
    },

    /// Read the current record
    Get {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match &cli.command {
        Commands::Inspect { format } => {
            let image = cli.image.as_deref().ok_or("Image path required for inspect")?;
            commands::inspect::run(image, &cli.config()?, format)?;
        }
        Commands::Verify => {
            let image = cli.image.as_deref().ok_or("Image path required for verify")?;
            commands::verify::run(image, &cli.config()?)?;
        }
        Commands::Dump => {
            let image = cli.image.as_deref().ok_or("Image path required for dump")?;
            commands::dump::run(image, &cli.config()?)?;
        }
        Commands::Format => {
            let image = cli.image.as_deref().ok_or("Image path required for format")?;
            commands::format::run(image, &cli.config()?)?;
        }
        Commands::Put { hex } => {
            let image = cli.image.as_deref().ok_or("Image path required for put")?;
            commands::put::run(image, &cli.config()?, hex)?;
        }
        Commands::Get { format } => {
            let image = cli.image.as_deref().ok_or("Image path required for get")?;
            commands::get::run(image, &cli.config()?, format)?;
        }
        Commands::Version => {
            println!("eewl CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("eewl Core v{}", eewl_core::VERSION);
        }
    }

    Ok(())
}
