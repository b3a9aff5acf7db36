use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(version, about = "Network telemetry ingestion and reporting")]
pub struct Cli {
  #[command(subcommand)]
  pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
  /// Parse a GPCNET benchmark log and export the structured results.
  Log {
    /// Path to the benchmark log file.
    logfile: PathBuf,

    /// Output format for the parsed results.
    #[arg(long, value_enum, default_value = "json")]
    format: ExportFormat,

    /// Output base name; the format's extension is appended.
    #[arg(long, default_value = "gpcnet_results")]
    output: String,
  },

  /// Parse a counter CSV and report on the discovered telemetry.
  Counters {
    /// Path to the counter CSV file.
    csvfile: PathBuf,

    /// Virtual lane used for cross-port comparison exports.
    #[arg(long)]
    comparison_vl: Option<String>,

    /// Root directory for exported series files.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Write per-coordinate series CSVs under the output directory.
    #[arg(long)]
    export: bool,

    /// Print summary statistics for each attribute.
    #[arg(long)]
    summary: bool,
  },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
  Json,
  Csv,
  Both,
}

impl ExportFormat {
  pub fn includes_json(self) -> bool {
    matches!(self, ExportFormat::Json | ExportFormat::Both)
  }

  pub fn includes_csv(self) -> bool {
    matches!(self, ExportFormat::Csv | ExportFormat::Both)
  }
}
