//! The `dicomview open` command: decode one object and render its first frame.

use clap::Args;
use dicomview_core::config::DiscoveryConfig;
use dicomview_core::{
    Config, DicomDiscovery, Orchestrator, OutputWriter, SourceLocator, TagId, ViewRecord,
};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use super::OutputFormat;

/// Arguments for the `open` command.
#[derive(Args, Debug)]
pub struct OpenArgs {
    /// DICOM file, directory of DICOM files, or http(s) URL
    #[arg(required = true)]
    pub input: String,

    /// Position of the file to open when INPUT is a directory
    #[arg(short, long, default_value = "0")]
    pub index: usize,

    /// Save the rendered frame as a PNG file
    #[arg(long)]
    pub png: Option<PathBuf>,

    /// Output file for the report (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Report format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Include all text metadata in the report
    #[arg(long)]
    pub metadata: bool,

    /// Report only this element, as GGGG,EEEE (repeatable)
    #[arg(long = "tag", value_name = "TAG", conflicts_with = "metadata")]
    pub tags: Vec<String>,

    /// Pipe capacity in bytes (overrides config)
    #[arg(long)]
    pub pipe_capacity: Option<usize>,

    /// Decode timeout in milliseconds, 0 for none (overrides config)
    #[arg(long)]
    pub timeout_ms: Option<u64>,
}

/// Execute the open command.
pub async fn execute(args: OpenArgs, mut config: Config) -> anyhow::Result<()> {
    if let Some(capacity) = args.pipe_capacity {
        config.pipe.capacity = capacity;
    }
    if let Some(timeout_ms) = args.timeout_ms {
        config.limits.decode_timeout_ms = timeout_ms;
    }
    config.validate()?;
    let tags = parse_tags(&args.tags)?;

    let locator = resolve_locator(&args.input, args.index, &config.discovery)?;
    let orchestrator = Orchestrator::new(config);

    let view = match orchestrator.open(&locator).await {
        Ok(view) => view,
        Err(e) => {
            tracing::error!("Failed to open {}: {}", locator, e);
            return Err(e.into());
        }
    };

    if let Some(path) = &args.png {
        view.bitmap.save_png(path)?;
    }

    let writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(std::io::stdout().lock()),
    };
    let record = if tags.is_empty() {
        view.to_record(args.metadata)
    } else {
        view.to_selected_record(&tags)
    };
    write_report(writer, &record, args.format)?;

    Ok(())
}

/// Turn the INPUT argument into a locator, picking the `index`-th DICOM file
/// when it names a directory.
pub fn resolve_locator(
    input: &str,
    index: usize,
    discovery: &DiscoveryConfig,
) -> anyhow::Result<SourceLocator> {
    let locator = SourceLocator::parse(input);
    match locator {
        SourceLocator::File(path) if path.is_dir() => {
            let selected = DicomDiscovery::new(discovery.clone()).select(&path, index)?;
            tracing::info!("Selected {:?} (#{} in {:?})", selected.path, index, path);
            Ok(SourceLocator::File(selected.path))
        }
        SourceLocator::File(path) if !path.exists() => anyhow::bail!(
            "Input path does not exist: {:?}\n\n  Hint: Check the file path and try again.",
            path
        ),
        other => Ok(other),
    }
}

/// Parse `--tag` values, rejecting the first one that is not a tag.
fn parse_tags(values: &[String]) -> anyhow::Result<Vec<TagId>> {
    values
        .iter()
        .map(|value| {
            TagId::parse(value).ok_or_else(|| {
                anyhow::anyhow!(
                    "Invalid tag '{}'\n\n  Hint: Use GGGG,EEEE in hex, e.g. 0010,0020.",
                    value
                )
            })
        })
        .collect()
}

fn write_report(
    mut writer: impl Write,
    record: &ViewRecord,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match format.record_format() {
        Some(core_format) => {
            let mut output = OutputWriter::new(writer, core_format);
            output.write(record)?;
            output.flush()?;
        }
        None => {
            let name = &record.patient_name;
            let display = name.display_name();
            if display == name.alphabetic {
                writeln!(writer, "Patient: {}", name.alphabetic)?;
            } else {
                writeln!(writer, "Patient: {} ({})", name.alphabetic, display)?;
            }
            writeln!(writer, "Source:  {}", record.source)?;
            writeln!(writer, "Image:   {}x{}", record.width, record.height)?;
            for entry in &record.metadata {
                let keyword = entry.keyword.as_deref().unwrap_or("");
                writeln!(writer, "  {} {:<28} {}", entry.tag, keyword, entry.value)?;
            }
            writer.flush()?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dicomview_core::output::MetadataEntry;
    use dicomview_core::PatientName;

    #[test]
    fn test_resolve_url() {
        let locator =
            resolve_locator("https://pacs.local/ct.dcm", 0, &DiscoveryConfig::default()).unwrap();
        assert_eq!(
            locator,
            SourceLocator::Url("https://pacs.local/ct.dcm".to_string())
        );
    }

    #[test]
    fn test_resolve_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.dcm");
        std::fs::write(&path, b"x").unwrap();

        let locator =
            resolve_locator(path.to_str().unwrap(), 0, &DiscoveryConfig::default()).unwrap();
        assert_eq!(locator, SourceLocator::File(path));
    }

    #[test]
    fn test_resolve_missing_file() {
        let result = resolve_locator("/no/such/scan.dcm", 0, &DiscoveryConfig::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_resolve_directory_by_index() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.dcm", "a.dcm", "c.dcm", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }

        let config = DiscoveryConfig::default();
        let input = dir.path().to_str().unwrap();
        assert_eq!(
            resolve_locator(input, 1, &config).unwrap(),
            SourceLocator::File(dir.path().join("b.dcm"))
        );
        assert!(resolve_locator(input, 3, &config).is_err());
    }

    fn sample_record(patient: &str) -> ViewRecord {
        ViewRecord {
            source: SourceLocator::Url("https://pacs.local/ct.dcm".to_string()),
            patient_name: PatientName::parse(patient),
            width: 4,
            height: 3,
            metadata: Vec::new(),
            bridge: None,
            elapsed_ms: 7,
        }
    }

    #[test]
    fn test_parse_tags() {
        let tags = parse_tags(&["0010,0020".to_string(), "(0008,0060)".to_string()]).unwrap();
        assert_eq!(tags, vec![TagId::PATIENT_ID, TagId::MODALITY]);

        let err = parse_tags(&["0010,0020".to_string(), "patient".to_string()]).unwrap_err();
        assert!(err.to_string().contains("'patient'"));
    }

    #[test]
    fn test_text_report_prints_alphabetic_name() {
        let mut out = Vec::new();
        write_report(&mut out, &sample_record("Doe^Jane"), OutputFormat::Text).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Patient: Doe^Jane (Jane Doe)\n"));
        assert!(text.contains("Source:  https://pacs.local/ct.dcm"));
        assert!(text.contains("Image:   4x3"));
    }

    #[test]
    fn test_text_report_single_component_name() {
        let mut out = Vec::new();
        write_report(&mut out, &sample_record("Anonymous"), OutputFormat::Text).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Patient: Anonymous\n"));
    }

    #[test]
    fn test_text_report_lists_selected_tags() {
        let mut record = sample_record("Doe^Jane");
        record.metadata = vec![MetadataEntry {
            tag: TagId::PATIENT_ID.to_string(),
            keyword: Some("PatientID".to_string()),
            value: "42".to_string(),
        }];

        let mut out = Vec::new();
        write_report(&mut out, &record, OutputFormat::Text).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("(0010,0020) PatientID"));
        assert!(text.trim_end().ends_with("42"));
    }
}
