use crate::coerce::Value;
use crate::counters::CounterHierarchy;
use sha2::Digest;
use sha2::Sha256;
use std::collections::HashMap;
use std::fmt::Write as _;

/// Coordinate plus the digest of the iteration order.
type SeriesKey = (String, String, String, String, String);

/// Memoizes extracted per-iteration series.
///
/// One instance belongs to one reporting session; it is never shared
/// between parses. Entries are immutable once written, and the owner
/// clears the cache wholesale to bound memory over long batch runs.
#[derive(Debug, Default)]
pub struct SeriesCache {
  entries: HashMap<SeriesKey, Vec<f64>>,
}

impl SeriesCache {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get(
    &self,
    guid: &str,
    port: &str,
    vl: &str,
    attribute: &str,
    digest: &str,
  ) -> Option<&[f64]> {
    self
      .entries
      .get(&series_key(guid, port, vl, attribute, digest))
      .map(Vec::as_slice)
  }

  pub fn put(
    &mut self,
    guid: &str,
    port: &str,
    vl: &str,
    attribute: &str,
    digest: String,
    values: Vec<f64>,
  ) {
    self
      .entries
      .insert(
        (
          guid.to_string(),
          port.to_string(),
          vl.to_string(),
          attribute.to_string(),
          digest,
        ),
        values,
      );
  }

  pub fn clear(&mut self) {
    self.entries.clear();
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

fn series_key(guid: &str, port: &str, vl: &str, attribute: &str, digest: &str) -> SeriesKey {
  (
    guid.to_string(),
    port.to_string(),
    vl.to_string(),
    attribute.to_string(),
    digest.to_string(),
  )
}

/// Deterministic digest of an iteration sequence. Order is part of the
/// digest: the same keys in a different order name a different series.
pub fn iterations_digest(iterations: &[String]) -> String {
  let digest = Sha256::digest(iterations.join(",").as_bytes());
  let mut hex = String::with_capacity(64);
  for byte in digest {
    let _ = write!(hex, "{byte:02x}");
  }
  hex
}

/// Ordered series for one (device, port, VL, attribute) coordinate.
///
/// Output order follows `iterations`, and every requested iteration
/// contributes an element: a missing or non-numeric value becomes 0.0,
/// so the result length always equals `iterations.len()`. A cache hit
/// is returned verbatim.
pub fn extract(
  hierarchy: &CounterHierarchy,
  guid: &str,
  port: &str,
  vl: &str,
  attribute: &str,
  iterations: &[String],
  cache: &mut SeriesCache,
) -> Vec<f64> {
  let digest = iterations_digest(iterations);

  if let Some(hit) = cache.get(guid, port, vl, attribute, &digest) {
    return hit.to_vec();
  }

  let values = extract_uncached(hierarchy, guid, port, vl, attribute, iterations);
  cache.put(guid, port, vl, attribute, digest, values.clone());

  values
}

/// The cold path. The cache is an optimization only: this must agree
/// with [`extract`] for every input.
pub fn extract_uncached(
  hierarchy: &CounterHierarchy,
  guid: &str,
  port: &str,
  vl: &str,
  attribute: &str,
  iterations: &[String],
) -> Vec<f64> {
  iterations
    .iter()
    .map(|iteration| {
      hierarchy
        .get_value(guid, iteration, port, vl, attribute)
        .and_then(Value::as_f64)
        .unwrap_or(0.0)
    })
    .collect()
}
