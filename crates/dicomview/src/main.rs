//! DicomView CLI - open DICOM objects from disk or HTTP and render the first frame.
//!
//! The object is streamed through a bounded pipe into the decoder, so large or
//! remote files start decoding before they are fully read.
//!
//! # Usage
//!
//! ```bash
//! # Open a file and print the patient name
//! dicomview open scan.dcm
//!
//! # Open the third DICOM file of a directory and save the frame as PNG
//! dicomview open ./series/ --index 2 --png frame.png
//!
//! # Stream from a server, report as JSON
//! dicomview open https://pacs.example.org/wado/ct.dcm --format json
//!
//! # List DICOM files in a directory
//! dicomview list ./series/
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// DicomView - stream, decode and render DICOM images.
#[derive(Parser, Debug)]
#[command(name = "dicomview")]
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
    /// Decode a DICOM file or URL and render its first frame
    Open(cli::open::OpenArgs),

    /// List DICOM files in a directory in selection order
    List(cli::list::ListArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so config warnings go to stderr directly.
    let config = match dicomview_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `dicomview config path`."
            );
            dicomview_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("DicomView v{}", dicomview_core::VERSION);

    match cli.command {
        Commands::Open(args) => cli::open::execute(args, config).await,
        Commands::List(args) => cli::list::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args).await,
    }
}
