//! Tessera CLI - local front end for the raster post-processing pipeline.
//!
//! Tessera decodes a source image, applies the requested region, size,
//! rotation, color, redaction and watermark operations, and writes the
//! encoded derivative.
//!
//! # Usage
//!
//! ```bash
//! # Square thumbnail, 200px wide
//! tessera process photo.jpg -o thumb.webp --region square --size 200,
//!
//! # Redact a region and keep the EXIF block
//! tessera process scan.tif -o public.jpg --redact 120,80,300,40 --copy-metadata
//!
//! # View configuration
//! tessera config show
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// Tessera - raster post-processing for image delivery.
#[derive(Parser, Debug)]
#[command(name = "tessera")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Transform one image and write the encoded result
    Process(cli::process::ProcessArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so config warnings go through eprintln.
    let config = match tessera_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `tessera config path`."
            );
            tessera_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Tessera v{}", tessera_core::VERSION);

    match cli.command {
        Commands::Process(args) => cli::process::execute(args).await,
        Commands::Config(args) => cli::config::execute(args).await,
    }
}
