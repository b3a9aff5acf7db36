use crate::error::LogError;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Splits metadata lines: `<name> - <date> - <config>`.
const META_DELIMITER: &str = " - ";
/// Splits `key: value` pairs inside an execution line.
const PAIR_DELIMITER: &str = ": ";
/// Prefix of a line that opens a new execution context.
const EXEC_PREFIX: &str = "GPCNET";
/// Prefix of the stored-verbatim invocation line.
const MPIRUN_PREFIX: &str = "mpirun";
/// Substring that marks a table's column-header line.
const HEADER_MARKER: &str = "Avg(Worst)";

/// Column name -> raw cell text for one table row.
pub type Row = BTreeMap<String, String>;

/// Row label -> row. A repeated label within one table overwrites the
/// earlier row (the log format reruns a measurement under the same name).
pub type Table = BTreeMap<String, Row>;

/// Table title -> table, for one named execution context.
pub type TableSet = BTreeMap<String, Table>;

/// Fully parsed benchmark log.
///
/// Serializes to the shape reporting consumers expect: a `test_info`
/// object with the execution-context maps flattened beside it.
#[derive(Debug, Default, Serialize, PartialEq)]
pub struct LogReport {
  /// Global metadata: date, config label, allocation details, and the
  /// mpirun invocation line under `mpi_line`.
  pub test_info: BTreeMap<String, String>,

  /// Result tables grouped by execution-context name.
  #[serde(flatten)]
  pub executions: BTreeMap<String, TableSet>,
}

/// Classification state carried across lines.
///
/// The active title and columns are explicit here so a data row arriving
/// before its table or header is a defined error instead of a lookup on
/// stale state.
#[derive(Debug, Default)]
struct ParserState {
  execution: Option<String>,
  title: Option<String>,
  columns: Vec<String>,
}

/// Parses a whole benchmark log already read into memory.
///
/// Each line is classified independently, first matching rule wins:
/// banner (line 1), execution context, mpirun line, table title,
/// column header, data row, else ignored (borders, free text, blanks).
pub fn parse_log(source: &str) -> Result<LogReport, LogError> {
  let mut report = LogReport::default();
  let mut state = ParserState::default();

  for (index, raw) in source.lines().enumerate() {
    let line = raw.trim();
    let number = index + 1;

    if index == 0 {
      parse_banner(line, number, &mut report)?;
    } else if line.starts_with(EXEC_PREFIX) {
      parse_execution(line, number, &mut report, &mut state)?;
    } else if line.starts_with(MPIRUN_PREFIX) {
      report
        .test_info
        .insert("mpi_line".to_string(), line.to_string());
    } else if line.matches('|').count() == 2 {
      open_table(line, number, &mut report, &mut state)?;
    } else if line.contains(HEADER_MARKER) {
      state.columns = split_cells(line).skip(1).collect();
    } else if line.starts_with('|') {
      insert_row(line, number, &mut report, &state)?;
    }
    // everything else is decoration
  }

  Ok(report)
}

/// Reads and parses a benchmark log file.
pub fn parse_log_file(path: &Path) -> Result<LogReport, LogError> {
  if !path.exists() {
    return Err(LogError::FileNotFound(path.to_path_buf()));
  }

  let source = fs::read_to_string(path).map_err(|source| LogError::ReadLog {
    path: path.to_path_buf(),
    source,
  })?;

  parse_log(&source)
}

/// First line: `<name> - <date> - <config>`.
fn parse_banner(line: &str, number: usize, report: &mut LogReport) -> Result<(), LogError> {
  let fields: Vec<&str> = line.split(META_DELIMITER).collect();

  if fields.len() < 3 {
    return Err(LogError::MalformedMetadata {
      line: number,
      content: line.to_string(),
    });
  }

  report
    .test_info
    .insert("date".to_string(), fields[1].to_string());
  report
    .test_info
    .insert("config".to_string(), fields[2].to_string());

  Ok(())
}

/// `GPCNET - GPCNET: <context> - key: value - ...` opens a fresh table
/// set for `<context>` and merges the remaining pairs into the metadata.
fn parse_execution(
  line: &str,
  number: usize,
  report: &mut LogReport,
  state: &mut ParserState,
) -> Result<(), LogError> {
  let mut context = None;

  for field in line.split(META_DELIMITER) {
    // Some runs emit a bare "GPCNET" tag ahead of the first pair.
    if field == EXEC_PREFIX {
      continue;
    }

    let Some((key, value)) = field.split_once(PAIR_DELIMITER) else {
      return Err(LogError::MalformedMetadata {
        line: number,
        content: line.to_string(),
      });
    };

    if key == EXEC_PREFIX {
      context = Some(value.to_string());
    } else {
      report
        .test_info
        .insert(key.to_string(), value.to_string());
    }
  }

  let Some(context) = context else {
    return Err(LogError::MalformedMetadata {
      line: number,
      content: line.to_string(),
    });
  };

  // Reopening a context discards its earlier tables, and the active
  // title never outlives the context that owned it.
  report.executions.insert(context.clone(), TableSet::new());
  state.execution = Some(context);
  state.title = None;

  Ok(())
}

/// A line with exactly two pipes titles the next table.
fn open_table(
  line: &str,
  number: usize,
  report: &mut LogReport,
  state: &mut ParserState,
) -> Result<(), LogError> {
  let title = line.trim_matches('|').trim().to_string();

  let Some(execution) = &state.execution else {
    return Err(LogError::TitleOutsideExecution {
      line: number,
      title,
    });
  };

  report
    .executions
    .entry(execution.clone())
    .or_default()
    .insert(title.clone(), Table::new());
  state.title = Some(title);

  Ok(())
}

/// Any other `|`-prefixed line is a data row: first cell is the label,
/// the rest pair positionally with the active header columns.
fn insert_row(
  line: &str,
  number: usize,
  report: &mut LogReport,
  state: &ParserState,
) -> Result<(), LogError> {
  let (Some(execution), Some(title)) = (&state.execution, &state.title) else {
    return Err(LogError::RowWithoutTable { line: number });
  };

  if state.columns.is_empty() {
    return Err(LogError::RowWithoutHeader { line: number });
  }

  let mut cells = split_cells(line);
  let Some(label) = cells.next() else {
    return Ok(()); // a bare pipe carries nothing
  };

  let row: Row = state.columns.iter().cloned().zip(cells).collect();

  report
    .executions
    .entry(execution.clone())
    .or_default()
    .entry(title.clone())
    .or_default()
    .insert(label, row);

  Ok(())
}

/// Splits on `|`, drops the empty tokens produced by leading/trailing
/// pipes, and trims each cell.
fn split_cells(line: &str) -> impl Iterator<Item = String> + '_ {
  line
    .split('|')
    .filter(|token| !token.is_empty())
    .map(|token| token.trim().to_string())
}
