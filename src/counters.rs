use crate::coerce::Value;
use crate::coerce::coerce;
use crate::error::CounterError;
use crate::error::Warnings;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::io::Read;
use std::path::Path;

/// Header columns that key the hierarchy rather than carry counter data.
/// Matching is exact and case-sensitive.
pub const REQUIRED_HEADERS: [&str; 5] = ["GUID", "Description", "Port", "Iteration", "VL"];

/// Attribute name -> coerced cell value, for one (iteration, port, VL) leaf.
pub type AttributeMap = BTreeMap<String, Value>;
/// Virtual lane -> attributes.
pub type VlMap = BTreeMap<String, AttributeMap>;
/// Port -> virtual lanes.
pub type PortMap = BTreeMap<String, VlMap>;
/// Iteration -> ports.
pub type IterationMap = BTreeMap<String, PortMap>;

/// Counters recorded for a single device.
#[derive(Debug, Serialize, PartialEq)]
pub struct DeviceCounters {
  /// Human-readable device description; the first value seen for the
  /// device wins, later conflicting values are discarded with a warning.
  #[serde(rename = "Description")]
  pub description: String,

  #[serde(flatten)]
  pub iterations: IterationMap,
}

/// Iteration, port, and VL labels as laid out for one device, sampled
/// from the first populated levels. Port and VL sets are uniform across
/// a well-formed dump, so the sample stands for the whole device.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceLayout {
  pub iterations: Vec<String>,
  pub ports: Vec<String>,
  pub vls: Vec<String>,
}

/// Four-level keyed hierarchy of parsed counter data:
/// device GUID -> iteration -> port -> VL -> attribute -> value.
#[derive(Debug, Default, Serialize, PartialEq)]
pub struct CounterHierarchy {
  #[serde(flatten)]
  devices: BTreeMap<String, DeviceCounters>,
}

impl CounterHierarchy {
  pub fn is_empty(&self) -> bool {
    self.devices.is_empty()
  }

  pub fn device_count(&self) -> usize {
    self.devices.len()
  }

  /// Device GUIDs in sorted order.
  pub fn device_ids(&self) -> impl Iterator<Item = &str> {
    self.devices.keys().map(String::as_str)
  }

  pub fn device(&self, guid: &str) -> Option<&DeviceCounters> {
    self.devices.get(guid)
  }

  /// Description recorded for a device, if the device exists.
  pub fn get_description(&self, guid: &str) -> Option<&str> {
    self.devices.get(guid).map(|d| d.description.as_str())
  }

  /// Value at one (device, iteration, port, VL, attribute) coordinate.
  /// Absence of any intermediate level is not an error.
  pub fn get_value(
    &self,
    guid: &str,
    iteration: &str,
    port: &str,
    vl: &str,
    attribute: &str,
  ) -> Option<&Value> {
    self
      .devices
      .get(guid)?
      .iterations
      .get(iteration)?
      .get(port)?
      .get(vl)?
      .get(attribute)
  }

  /// Attribute names at the first populated leaf, in iteration order.
  pub fn available_attributes(&self) -> Result<Vec<String>, CounterError> {
    if self.devices.is_empty() {
      return Err(CounterError::EmptyHierarchy);
    }

    for device in self.devices.values() {
      let leaf = device
        .iterations
        .values()
        .next()
        .and_then(|ports| ports.values().next())
        .and_then(|vls| vls.values().next());

      if let Some(attributes) = leaf {
        return Ok(attributes.keys().cloned().collect());
      }
    }

    Err(CounterError::NoMeasurements)
  }

  /// Sampled layout for one device; `None` if the device is unknown or
  /// holds no measurements.
  pub fn layout(&self, guid: &str) -> Option<DeviceLayout> {
    let device = self.devices.get(guid)?;
    let iterations: Vec<String> = device.iterations.keys().cloned().collect();
    let first = device.iterations.values().next()?;
    let ports: Vec<String> = first.keys().cloned().collect();
    let vls: Vec<String> = first.values().next()?.keys().cloned().collect();

    Some(DeviceLayout {
      iterations,
      ports,
      vls,
    })
  }
}

/// Everything one parse produces: the hierarchy, the attribute columns
/// in header order, and the recoverable problems encountered.
#[derive(Debug)]
pub struct CounterParse {
  pub hierarchy: CounterHierarchy,
  pub attributes: Vec<String>,
  pub warnings: Warnings,
}

/// Positions of the five required key columns within the header.
struct KeyIndices {
  guid: usize,
  description: usize,
  port: usize,
  iteration: usize,
  vl: usize,
}

impl KeyIndices {
  /// Locates every required column, reporting all absent ones at once.
  fn locate(headers: &[String]) -> Result<Self, CounterError> {
    let mut missing = Vec::new();
    let mut find = |name: &str| match headers.iter().position(|h| h == name) {
      Some(index) => index,
      None => {
        missing.push(name.to_string());
        0
      }
    };

    let indices = KeyIndices {
      guid: find("GUID"),
      description: find("Description"),
      port: find("Port"),
      iteration: find("Iteration"),
      vl: find("VL"),
    };

    if missing.is_empty() {
      Ok(indices)
    } else {
      Err(CounterError::MissingHeaders { missing })
    }
  }
}

/// A fully extracted data row, staged before touching the hierarchy so a
/// failing row never leaves a partial merge behind.
struct StagedRow {
  guid: String,
  description: String,
  port: String,
  iteration: String,
  vl: String,
  values: Vec<(String, Value)>,
}

/// Parses a counter CSV file into the four-level hierarchy.
pub fn parse_counters_file(path: &Path) -> Result<CounterParse, CounterError> {
  if !path.exists() {
    return Err(CounterError::FileNotFound(path.to_path_buf()));
  }

  let file = File::open(path).map_err(|source| CounterError::OpenCsv {
    path: path.to_path_buf(),
    source,
  })?;

  parse_counters(BufReader::new(file))
}

/// Parses counter CSV data from any reader.
///
/// Structural problems (no header, required columns absent) fail the
/// parse; row-level problems skip the row with a warning and continue.
pub fn parse_counters(input: impl Read) -> Result<CounterParse, CounterError> {
  let mut reader = csv::ReaderBuilder::new()
    .has_headers(false)
    .flexible(true)
    .from_reader(input);

  let mut records = reader.records();

  let Some(header_record) = records.next() else {
    return Err(CounterError::EmptyCsv);
  };
  let headers: Vec<String> = header_record?
    .iter()
    .map(|header| header.trim().to_string())
    .collect();

  let keys = KeyIndices::locate(&headers)?;

  let mut attributes = Vec::new();
  let mut attribute_indices = Vec::new();
  for (index, header) in headers.iter().enumerate() {
    if !REQUIRED_HEADERS.contains(&header.as_str()) {
      attributes.push(header.clone());
      attribute_indices.push(index);
    }
  }

  let mut hierarchy = CounterHierarchy::default();
  let mut warnings = Warnings::new();

  // Data rows are numbered from 2 so warnings line up with file line
  // numbers (the header is line 1).
  for (offset, record) in records.enumerate() {
    let row_number = offset + 2;
    let record = record?;

    if record.len() != headers.len() {
      warnings.push(format!(
        "Row {row_number} has {} columns, expected {}. Skipping.",
        record.len(),
        headers.len()
      ));
      continue;
    }

    let Some(staged) = stage_row(
      &record,
      &keys,
      &attributes,
      &attribute_indices,
      row_number,
      &mut warnings,
    ) else {
      continue;
    };

    insert_row(&mut hierarchy, staged, &mut warnings);
  }

  Ok(CounterParse {
    hierarchy,
    attributes,
    warnings,
  })
}

/// Pulls the key fields and coerced attribute cells out of one record.
/// Any missing field downgrades the whole row to a warning.
fn stage_row(
  record: &csv::StringRecord,
  keys: &KeyIndices,
  attributes: &[String],
  attribute_indices: &[usize],
  row_number: usize,
  warnings: &mut Warnings,
) -> Option<StagedRow> {
  let field = |index: usize| record.get(index).map(|cell| cell.trim().to_string());

  let mut fetch = |index: usize| match field(index) {
    Some(cell) => Some(cell),
    None => {
      warnings.push(format!(
        "Error processing row {row_number}: missing field {index}. Skipping."
      ));
      None
    }
  };

  let guid = fetch(keys.guid)?;
  let description = fetch(keys.description)?;
  let port = fetch(keys.port)?;
  let iteration = fetch(keys.iteration)?;
  let vl = fetch(keys.vl)?;

  let mut values = Vec::with_capacity(attributes.len());
  for (name, index) in attributes.iter().zip(attribute_indices) {
    let cell = fetch(*index)?;
    values.push((name.clone(), coerce(&cell)));
  }

  Some(StagedRow {
    guid,
    description,
    port,
    iteration,
    vl,
    values,
  })
}

/// Merges a staged row, creating intermediate levels on first use.
fn insert_row(hierarchy: &mut CounterHierarchy, staged: StagedRow, warnings: &mut Warnings) {
  let device = hierarchy
    .devices
    .entry(staged.guid.clone())
    .or_insert_with(|| DeviceCounters {
      description: staged.description.clone(),
      iterations: IterationMap::new(),
    });

  // First description wins; a fresh insert can never differ.
  if device.description != staged.description {
    warnings.push(format!(
      "Inconsistent description for GUID {}: existing='{}', new='{}'. Keeping existing description.",
      staged.guid, device.description, staged.description
    ));
  }

  let leaf = device
    .iterations
    .entry(staged.iteration)
    .or_default()
    .entry(staged.port)
    .or_default()
    .entry(staged.vl)
    .or_default();

  for (name, value) in staged.values {
    leaf.insert(name, value);
  }
}
