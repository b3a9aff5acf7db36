use crate::cli::ExportFormat;
use crate::config::Config;
use crate::counters;
use crate::counters::CounterHierarchy;
use crate::error::ReportError;
use crate::error::TelemlabError;
use crate::gpcnet;
use crate::gpcnet::LogReport;
use crate::series;
use crate::series::SeriesCache;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

/// Memoizes created directories so repeated exports skip redundant
/// create-dir calls. Owned by one export session; clear between runs.
#[derive(Debug, Default)]
pub struct DirCache {
  created: HashSet<PathBuf>,
}

impl DirCache {
  pub fn new() -> Self {
    Self::default()
  }

  /// Creates the directory on first use.
  pub fn ensure(&mut self, dir: &Path) -> Result<(), ReportError> {
    if self.created.contains(dir) {
      return Ok(());
    }

    fs::create_dir_all(dir).map_err(|source| ReportError::CreateDir {
      path: dir.to_path_buf(),
      source,
    })?;
    self.created.insert(dir.to_path_buf());

    Ok(())
  }

  pub fn clear(&mut self) {
    self.created.clear();
  }

  pub fn len(&self) -> usize {
    self.created.len()
  }

  pub fn is_empty(&self) -> bool {
    self.created.is_empty()
  }
}

/// Writes the parsed log as pretty-printed JSON.
pub fn write_json(report: &LogReport, path: &Path) -> Result<(), ReportError> {
  let json = serde_json::to_string_pretty(report)?;

  fs::write(path, json).map_err(|source| ReportError::WriteFile {
    path: path.to_path_buf(),
    source,
  })?;

  tracing::info!("Report written to {}", path.display());
  Ok(())
}

/// Writes the parsed log as a CSV digest: the metadata block first, then
/// each result table with its normalized title, the execution name
/// upper-cased above the first table of each execution.
pub fn write_tables_csv(report: &LogReport, path: &Path) -> Result<(), ReportError> {
  let mut out = String::new();

  for (key, value) in &report.test_info {
    // commas inside metadata values would break the column layout
    let _ = writeln!(out, "{key},{}", value.replace(',', ";"));
  }

  for (execution, tables) in &report.executions {
    for (index, (title, table)) in tables.iter().enumerate() {
      let columns: Vec<&String> = table
        .values()
        .next()
        .map(|row| row.keys().collect())
        .unwrap_or_default();

      if index == 0 {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", execution.to_uppercase());
      }
      let _ = writeln!(out, "{}", normalize_title(title));
      if index == 0 {
        let header: Vec<&str> = columns.iter().map(|c| c.as_str()).collect();
        let _ = writeln!(out, "Name,{}", header.join(","));
      }

      for (label, row) in table {
        let cells: Vec<&str> = columns
          .iter()
          .map(|column| row.get(*column).map(String::as_str).unwrap_or(""))
          .collect();
        let _ = writeln!(out, "{label},{}", cells.join(","));
      }
    }
  }

  fs::write(path, out).map_err(|source| ReportError::WriteFile {
    path: path.to_path_buf(),
    source,
  })?;

  tracing::info!("Table export written to {}", path.display());
  Ok(())
}

/// Collapses a table title to an identifier: parentheses become spaces,
/// whitespace runs join with underscores.
fn normalize_title(title: &str) -> String {
  title
    .replace(['(', ')'], " ")
    .split_whitespace()
    .collect::<Vec<_>>()
    .join("_")
}

/// Descriptive statistics over one numeric series.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Summary {
  pub count: usize,
  pub mean: f64,
  pub max: f64,
  pub sum: f64,
  /// Geometric mean of the positive values; `None` when there are none.
  pub geomean: Option<f64>,
  pub std_dev: f64,
  /// Standard deviation as a percentage of the mean.
  pub std_dev_ratio: f64,
}

impl Summary {
  /// `None` for an empty series.
  pub fn of(values: &[f64]) -> Option<Summary> {
    if values.is_empty() {
      return None;
    }

    let count = values.len();
    let sum: f64 = values.iter().sum();
    let mean = sum / count as f64;
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;
    let std_dev = variance.sqrt();
    let std_dev_ratio = if mean == 0.0 {
      0.0
    } else {
      std_dev / mean * 100.0
    };

    // The geometric mean is only defined over positive values; counter
    // series legitimately contain zeros, which are excluded.
    let positive: Vec<f64> = values.iter().copied().filter(|v| *v > 0.0).collect();
    let geomean = if positive.is_empty() {
      None
    } else {
      let log_mean = positive.iter().map(|v| v.ln()).sum::<f64>() / positive.len() as f64;
      Some(log_mean.exp())
    };

    Some(Summary {
      count,
      mean,
      max,
      sum,
      geomean,
      std_dev,
      std_dev_ratio,
    })
  }
}

/// Parses a benchmark log and writes the requested export(s).
pub fn run_log(logfile: &Path, format: ExportFormat, output: &str) -> Result<(), TelemlabError> {
  let report = gpcnet::parse_log_file(logfile)?;

  if format.includes_json() {
    write_json(&report, &PathBuf::from(format!("{output}.json")))?;
  }
  if format.includes_csv() {
    write_tables_csv(&report, &PathBuf::from(format!("{output}.csv")))?;
  }

  Ok(())
}

/// Parses a counter CSV and reports on it: prints the discovered
/// attributes and device count, then the optional summaries and series
/// export.
pub fn run_counters(
  csvfile: &Path,
  config: &Config,
  export: bool,
  summary: bool,
) -> Result<(), TelemlabError> {
  let parsed = counters::parse_counters_file(csvfile)?;

  tracing::info!(
    devices = parsed.hierarchy.device_count(),
    warnings = parsed.warnings.len(),
    "Parsed counter data"
  );
  println!("Available attributes: {:?}", parsed.attributes);
  println!("Found {} GUIDs in dataset", parsed.hierarchy.device_count());

  let mut config = config.clone();
  if !comparison_vl_present(&parsed.hierarchy, &config.comparison_vl) {
    tracing::warn!(
      "Comparison VL '{}' not found in data. Using 'Overall' as fallback.",
      config.comparison_vl
    );
    config.comparison_vl = "Overall".to_string();
  }

  if summary {
    print_summaries(&parsed.hierarchy, &parsed.attributes, &config);
  }

  if export {
    let written = export_series(&parsed.hierarchy, &parsed.attributes, &config)?;
    println!(
      "Exported {written} series files to {}",
      config.output_dir.display()
    );
  }

  Ok(())
}

/// True when any device carries the given VL.
fn comparison_vl_present(hierarchy: &CounterHierarchy, vl: &str) -> bool {
  hierarchy
    .device_ids()
    .filter_map(|guid| hierarchy.layout(guid))
    .any(|layout| layout.vls.iter().any(|candidate| candidate == vl))
}

/// Prints one summary line per (device, attribute), aggregated over all
/// ports at the comparison VL.
fn print_summaries(hierarchy: &CounterHierarchy, attributes: &[String], config: &Config) {
  let mut cache = SeriesCache::new();

  for guid in hierarchy.device_ids() {
    let Some(layout) = hierarchy.layout(guid) else {
      continue;
    };

    for attribute in attributes {
      let mut values = Vec::new();
      for port in &layout.ports {
        values.extend(series::extract(
          hierarchy,
          guid,
          port,
          &config.comparison_vl,
          attribute,
          &layout.iterations,
          &mut cache,
        ));
      }

      if let Some(summary) = Summary::of(&values) {
        let geomean = summary
          .geomean
          .map(|g| format!("{g:.2}"))
          .unwrap_or_else(|| "n/a".to_string());
        println!(
          "{guid} {attribute}: count={} mean={:.2} max={:.2} sum={:.2} geomean={geomean} std_dev_ratio={:.2}%",
          summary.count, summary.mean, summary.max, summary.sum, summary.std_dev_ratio
        );
      }
    }
  }
}

/// Writes one CSV per (device, port, attribute) with the per-iteration
/// series of every VL, plus a cross-port comparison CSV per attribute at
/// the comparison VL. Returns the number of files written.
pub fn export_series(
  hierarchy: &CounterHierarchy,
  attributes: &[String],
  config: &Config,
) -> Result<usize, ReportError> {
  let mut cache = config.cache_series.then(SeriesCache::new);
  let mut dirs = DirCache::new();
  let mut written = 0;

  for (index, guid) in hierarchy.device_ids().enumerate() {
    let Some(layout) = hierarchy.layout(guid) else {
      continue;
    };

    let guid_dir = config.output_dir.join(format!("guid_{guid}"));

    for port in &layout.ports {
      let port_dir = guid_dir.join(format!("port_{port}"));
      dirs.ensure(&port_dir)?;

      for attribute in attributes {
        let path = port_dir.join(format!("{}.csv", safe_name(attribute)));
        write_vl_series_csv(hierarchy, guid, port, attribute, &layout, &mut cache, &path)?;
        written += 1;
      }
    }

    dirs.ensure(&guid_dir)?;
    for attribute in attributes {
      let path = guid_dir.join(format!(
        "{}_{}_all_ports.csv",
        safe_name(&config.comparison_vl),
        safe_name(attribute)
      ));
      write_port_comparison_csv(
        hierarchy,
        guid,
        attribute,
        &config.comparison_vl,
        &layout,
        &mut cache,
        &path,
      )?;
      written += 1;
    }

    // Long batch runs would otherwise accumulate one entry per
    // coordinate; the owner clears wholesale every few devices.
    if let Some(cache) = cache.as_mut() {
      if (index + 1) % config.cache_clear_interval == 0 {
        tracing::debug!(entries = cache.len(), "Clearing series cache");
        cache.clear();
      }
    }
  }

  Ok(written)
}

fn safe_name(name: &str) -> String {
  name.replace(' ', "_")
}

/// Rows are iterations, columns are VLs.
fn write_vl_series_csv(
  hierarchy: &CounterHierarchy,
  guid: &str,
  port: &str,
  attribute: &str,
  layout: &counters::DeviceLayout,
  cache: &mut Option<SeriesCache>,
  path: &Path,
) -> Result<(), ReportError> {
  let columns: Vec<Vec<f64>> = layout
    .vls
    .iter()
    .map(|vl| extract_with(hierarchy, guid, port, vl, attribute, &layout.iterations, cache))
    .collect();

  let mut header = vec!["Iteration".to_string()];
  header.extend(layout.vls.iter().cloned());

  write_series_table(path, &header, &layout.iterations, &columns)
}

/// Rows are iterations, columns are ports, all at one VL.
fn write_port_comparison_csv(
  hierarchy: &CounterHierarchy,
  guid: &str,
  attribute: &str,
  vl: &str,
  layout: &counters::DeviceLayout,
  cache: &mut Option<SeriesCache>,
  path: &Path,
) -> Result<(), ReportError> {
  let columns: Vec<Vec<f64>> = layout
    .ports
    .iter()
    .map(|port| extract_with(hierarchy, guid, port, vl, attribute, &layout.iterations, cache))
    .collect();

  let mut header = vec!["Iteration".to_string()];
  header.extend(layout.ports.iter().map(|port| format!("Port {port}")));

  write_series_table(path, &header, &layout.iterations, &columns)
}

fn extract_with(
  hierarchy: &CounterHierarchy,
  guid: &str,
  port: &str,
  vl: &str,
  attribute: &str,
  iterations: &[String],
  cache: &mut Option<SeriesCache>,
) -> Vec<f64> {
  match cache.as_mut() {
    Some(cache) => series::extract(hierarchy, guid, port, vl, attribute, iterations, cache),
    None => series::extract_uncached(hierarchy, guid, port, vl, attribute, iterations),
  }
}

fn write_series_table(
  path: &Path,
  header: &[String],
  iterations: &[String],
  columns: &[Vec<f64>],
) -> Result<(), ReportError> {
  let mut writer = csv::Writer::from_path(path).map_err(|source| ReportError::WriteCsv {
    path: path.to_path_buf(),
    source,
  })?;

  let write_record = |writer: &mut csv::Writer<fs::File>, record: &[String]| {
    writer
      .write_record(record)
      .map_err(|source| ReportError::WriteCsv {
        path: path.to_path_buf(),
        source,
      })
  };

  write_record(&mut writer, header)?;

  for (row, iteration) in iterations.iter().enumerate() {
    let mut record = Vec::with_capacity(columns.len() + 1);
    record.push(iteration.clone());
    for column in columns {
      record.push(column[row].to_string());
    }
    write_record(&mut writer, &record)?;
  }

  writer.flush().map_err(|source| ReportError::WriteFile {
    path: path.to_path_buf(),
    source,
  })?;

  Ok(())
}
