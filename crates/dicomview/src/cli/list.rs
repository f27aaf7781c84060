//! The `dicomview list` command: show the DICOM files of a directory in the
//! order `open --index` selects them.

use clap::Args;
use dicomview_core::{Config, DicomDiscovery, OutputWriter};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;

use super::OutputFormat;

/// Arguments for the `list` command.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Directory to scan
    #[arg(required = true)]
    pub dir: PathBuf,

    /// Descend into subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// One listed file.
#[derive(Debug, Serialize)]
pub struct ListEntry {
    pub index: usize,
    pub path: PathBuf,
    pub size: u64,
}

/// Execute the list command.
pub async fn execute(args: ListArgs, mut config: Config) -> anyhow::Result<()> {
    if !args.dir.is_dir() {
        anyhow::bail!("Not a directory: {:?}", args.dir);
    }
    if args.recursive {
        config.discovery.recursive = true;
    }

    let entries = list_entries(&args.dir, config);
    if entries.is_empty() {
        tracing::warn!("No DICOM files found in {:?}", args.dir);
    }

    let stdout = std::io::stdout().lock();
    match args.format.record_format() {
        Some(format) => {
            let mut writer = OutputWriter::new(stdout, format);
            writer.write_batch(&entries)?;
            writer.flush()?;
        }
        None => {
            let mut out = stdout;
            for entry in &entries {
                writeln!(out, "{:>4}  {:>10}  {}", entry.index, entry.size, entry.path.display())?;
            }
            out.flush()?;
        }
    }
    Ok(())
}

fn list_entries(dir: &std::path::Path, config: Config) -> Vec<ListEntry> {
    DicomDiscovery::new(config.discovery)
        .discover(dir)
        .into_iter()
        .enumerate()
        .map(|(index, file)| ListEntry {
            index,
            path: file.path,
            size: file.size,
        })
        .collect()
}
