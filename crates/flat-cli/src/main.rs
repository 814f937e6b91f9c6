//! # flat-cli
//!
//! Command-line front end for the flat record codec: decodes files or
//! directories against a schema description and prints the result.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use flat_codec::{ConverterRegistry, Schema};
use flat_ir::{Entry, Record};
use flat_pipeline::{AcceptancePolicy, Pipeline, PipelineConfig};
use flat_schema::SchemaLoader;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "flat")]
#[command(about = "Fixed-width flat record codec")]
#[command(version)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a flat file, or every file of a directory
    Parse {
        /// Input file or directory
        source: PathBuf,

        /// Schema description file (JSON or YAML)
        #[arg(short, long)]
        schema: PathBuf,

        /// Write the result to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Field separator for the text format
        #[arg(long, default_value = ", ")]
        separator: String,

        /// Report decode failures as error records instead of failing
        #[arg(long)]
        silent: bool,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Print the normalized schema description
    Describe {
        /// Schema description file (JSON or YAML)
        #[arg(short, long)]
        schema: PathBuf,

        /// Only list element names per segment
        #[arg(long)]
        structure: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ERROR: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Parse {
            source,
            schema,
            output,
            format,
            separator,
            silent,
            pretty,
        } => {
            tracing::info!("Parsing {} with {}", source.display(), schema.display());
            let pipeline = Pipeline::from_schema_file(
                &schema,
                Arc::new(ConverterRegistry::with_builtins()),
                PipelineConfig {
                    acceptance_policy: AcceptancePolicy::from_silent(silent),
                    ..Default::default()
                },
            )
            .with_context(|| format!("loading schema {}", schema.display()))?;

            let (rendered, count) = if source.is_dir() {
                let batch = pipeline.decode_dir(&source).await?;
                let rendered = match format {
                    OutputFormat::Json => to_json(&batch.file_results, pretty)?,
                    OutputFormat::Text => batch
                        .file_results
                        .iter()
                        .map(|r| format!("== {} ==\n{}", r.path.display(), render_text(&r.content, &separator)))
                        .collect::<Vec<_>>()
                        .join("\n"),
                };
                (rendered, batch.total_files)
            } else if source.is_file() {
                let result = pipeline.decode_file(&source)?;
                let rendered = match format {
                    OutputFormat::Json => to_json(&result.content, pretty)?,
                    OutputFormat::Text => render_text(&result.content, &separator),
                };
                (rendered, 1)
            } else {
                bail!("source not found: {}", source.display());
            };

            write_output(output.as_deref(), &rendered)?;
            eprintln!("{count} file(s) found");
            Ok(())
        }
        Commands::Describe { schema, structure } => {
            let description = SchemaLoader::new()
                .load_from_file(&schema)
                .with_context(|| format!("loading schema {}", schema.display()))?;
            let built = Schema::with_builtins(&description)?;

            let rendered = if structure {
                let map: serde_json::Map<String, serde_json::Value> = built
                    .structure()
                    .into_iter()
                    .map(|(segment, elements)| (segment.to_string(), serde_json::json!(elements)))
                    .collect();
                to_json(&map, true)?
            } else {
                to_json(description.as_ref(), true)?
            };
            println!("{rendered}");
            Ok(())
        }
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> anyhow::Result<String> {
    Ok(if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    })
}

fn write_output(output: Option<&Path>, rendered: &str) -> anyhow::Result<()> {
    match output {
        Some(path) => std::fs::write(path, format!("{rendered}\n"))
            .with_context(|| format!("writing {}", path.display())),
        None => {
            println!("{rendered}");
            Ok(())
        }
    }
}

/// One line per segment occurrence: `Name: field=value<sep>field=value`,
/// children after their parent
fn render_text(record: &Record, separator: &str) -> String {
    let mut out = String::new();
    for (name, entry) in record.iter() {
        match entry {
            Entry::Record(segment) => render_segment(&mut out, name, segment, separator),
            Entry::List(segments) => {
                for segment in segments {
                    render_segment(&mut out, name, segment, separator);
                }
            }
            Entry::Value(value) => {
                let _ = writeln!(out, "{name}: {value}");
            }
        }
    }
    out.trim_end().to_string()
}

fn render_segment(out: &mut String, name: &str, segment: &Record, separator: &str) {
    let fields: Vec<String> = segment
        .iter()
        .filter_map(|(field, entry)| match entry {
            Entry::Value(value) => Some(format!("{field}={value}")),
            _ => None,
        })
        .collect();
    let _ = writeln!(out, "{name}: {}", fields.join(separator));

    for (child, entry) in segment.iter() {
        match entry {
            Entry::Record(nested) => render_segment(out, child, nested, separator),
            Entry::List(nested) => {
                for item in nested {
                    render_segment(out, child, item, separator);
                }
            }
            Entry::Value(_) => {}
        }
    }
}
