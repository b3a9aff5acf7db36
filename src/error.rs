// Copyright 2025 Chisomo Makombo Sakala
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error enum for the telemlab library.
#[derive(Error, Debug)]
pub enum TelemlabError {
  #[error("Log parse failed")]
  Log(#[from] LogError),

  #[error("Counter parse failed")]
  Counters(#[from] CounterError),

  #[error("Report generation failed")]
  Report(#[from] ReportError),

  #[error("Configuration error")]
  Config(#[from] ConfigError),

  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),

  #[error("JSON serialization/deserialization error: {0}")]
  Json(#[from] serde_json::Error),
}

/// Errors related to benchmark log parsing (src/gpcnet.rs).
///
/// Only structural problems abort a parse; recoverable ones are routed
/// through [`Warnings`] and never unwind.
#[derive(Error, Debug)]
pub enum LogError {
  #[error("Log file not found: {0}")]
  FileNotFound(PathBuf),

  #[error("Failed to read log file: {path}")]
  ReadLog {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("Malformed metadata on line {line}: {content}")]
  MalformedMetadata { line: usize, content: String },

  #[error("Table title '{title}' on line {line} appears before any execution context")]
  TitleOutsideExecution { line: usize, title: String },

  #[error("Data row on line {line} appears before any table title")]
  RowWithoutTable { line: usize },

  #[error("Data row on line {line} appears before any column-header line")]
  RowWithoutHeader { line: usize },
}

/// Errors related to counter CSV parsing (src/counters.rs).
#[derive(Error, Debug)]
pub enum CounterError {
  #[error("CSV file not found: {0}")]
  FileNotFound(PathBuf),

  #[error("Failed to open CSV file: {path}")]
  OpenCsv {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("CSV input is empty or has no header row")]
  EmptyCsv,

  #[error("Missing required headers: {missing:?}")]
  MissingHeaders { missing: Vec<String> },

  #[error("Failed to read CSV record")]
  Record(#[from] csv::Error),

  #[error("Counter hierarchy is empty, no attributes can be extracted")]
  EmptyHierarchy,

  #[error("Counter hierarchy contains no measurement data")]
  NoMeasurements,
}

/// Errors related to report/export generation (src/report.rs).
#[derive(Error, Debug)]
pub enum ReportError {
  #[error("Failed to create output directory: {path}")]
  CreateDir {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("Failed to write {path}")]
  WriteFile {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("Failed to write CSV export: {path}")]
  WriteCsv {
    path: PathBuf,
    #[source]
    source: csv::Error,
  },

  #[error("Failed to serialize report")]
  Serialize(#[from] serde_json::Error),
}

/// Errors related to configuration resolution (src/config.rs).
#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("Failed to load configuration")]
  Load(#[from] Box<figment::Error>),

  #[error("cache_clear_interval must be at least 1")]
  CacheClearInterval,
}

/// Collector for recoverable parse problems.
///
/// Every entry is emitted through `tracing::warn!` as it is recorded, so
/// interactive runs surface problems immediately while callers and tests
/// can still assert on the collected set afterwards.
#[derive(Debug, Default)]
pub struct Warnings {
  entries: Vec<String>,
}

impl Warnings {
  pub fn new() -> Self {
    Self::default()
  }

  /// Records a warning and forwards it to the tracing subscriber.
  pub fn push(&mut self, message: impl Into<String>) {
    let message = message.into();
    tracing::warn!("{message}");
    self.entries.push(message);
  }

  pub fn entries(&self) -> &[String] {
    &self.entries
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}
