use telemlab::config::Config;
use telemlab::error::ConfigError;
use telemlab::gpcnet::parse_log;
use telemlab::report::DirCache;
use telemlab::report::Summary;
use telemlab::report::write_json;
use telemlab::report::write_tables_csv;
use tempfile::tempdir;

use std::fs;

fn assert_close(actual: f64, expected: f64) {
  assert!(
    (actual - expected).abs() < 1e-9,
    "expected {expected}, got {actual}"
  );
}

const SAMPLE_LOG: &str = "\
RUN - 2024-01-01 - cfgA
GPCNET - GPCNET: rr_two_sided - nodes: 4
| two-sided RR |
| Avg(Worst) | A | B |
| row1 | 1.0 | 2.0(3.0) |
";

#[test]
fn test_summary_known_vector() {
  let summary = Summary::of(&[1.0, 2.0, 3.0, 4.0]).unwrap();

  assert_eq!(summary.count, 4);
  assert_close(summary.mean, 2.5);
  assert_close(summary.sum, 10.0);
  assert_close(summary.max, 4.0);
  assert_close(summary.std_dev, 1.25_f64.sqrt());
  assert_close(summary.std_dev_ratio, 1.25_f64.sqrt() / 2.5 * 100.0);
  assert_close(summary.geomean.unwrap(), 24.0_f64.powf(0.25));
}

#[test]
fn test_summary_of_empty_is_none() {
  assert!(Summary::of(&[]).is_none());
}

#[test]
fn test_summary_all_zeros_has_no_geomean() {
  let summary = Summary::of(&[0.0, 0.0, 0.0]).unwrap();

  assert!(summary.geomean.is_none());
  assert_close(summary.mean, 0.0);
  assert_close(summary.std_dev_ratio, 0.0);
}

#[test]
fn test_summary_geomean_skips_non_positive_values() {
  let summary = Summary::of(&[0.0, 4.0, 9.0]).unwrap();

  // only 4 and 9 participate: sqrt(36) = 6
  assert_close(summary.geomean.unwrap(), 6.0);
}

#[test]
fn test_dir_cache_creates_once_and_clears() {
  let temp = tempdir().unwrap();
  let target = temp.path().join("a").join("b");
  let mut dirs = DirCache::new();

  assert!(dirs.is_empty());
  dirs.ensure(&target).unwrap();
  assert!(target.is_dir());
  assert_eq!(dirs.len(), 1);

  // second ensure is a no-op on an already-known path
  dirs.ensure(&target).unwrap();
  assert_eq!(dirs.len(), 1);

  dirs.clear();
  assert!(dirs.is_empty());
}

#[test]
fn test_write_json_mirrors_parse() {
  let temp = tempdir().unwrap();
  let path = temp.path().join("out.json");
  let report = parse_log(SAMPLE_LOG).unwrap();

  write_json(&report, &path).unwrap();

  let data: serde_json::Value =
    serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
  assert_eq!(data["test_info"]["config"], "cfgA");
  assert_eq!(data["rr_two_sided"]["two-sided RR"]["row1"]["B"], "2.0(3.0)");
}

#[test]
fn test_write_tables_csv_layout() {
  let temp = tempdir().unwrap();
  let path = temp.path().join("out.csv");
  let report = parse_log(SAMPLE_LOG).unwrap();

  write_tables_csv(&report, &path).unwrap();

  let content = fs::read_to_string(&path).unwrap();
  let lines: Vec<&str> = content.lines().collect();

  assert!(lines.contains(&"date,2024-01-01"));
  assert!(lines.contains(&"RR_TWO_SIDED"));
  assert!(lines.contains(&"two-sided_RR"));
  assert!(lines.contains(&"Name,A,B"));
  assert!(lines.contains(&"row1,1.0,2.0(3.0)"));
}

#[test]
fn test_config_defaults_are_valid() {
  let config = Config::default();

  assert!(config.validate().is_ok());
  assert_eq!(config.comparison_vl, "Overall");
  assert_eq!(config.cache_clear_interval, 5);
  assert!(config.cache_series);
}

#[test]
fn test_config_rejects_zero_clear_interval() {
  let config = Config {
    cache_clear_interval: 0,
    ..Config::default()
  };

  let err = config.validate().unwrap_err();
  assert!(matches!(err, ConfigError::CacheClearInterval));
}
