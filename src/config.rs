use crate::error::ConfigError;
use figment::Figment;
use figment::providers::Env;
use figment::providers::Format;
use figment::providers::Serialized;
use figment::providers::Toml;
use serde::Deserialize;
use serde::Serialize;
use std::path::PathBuf;

/// Default VL for cross-port comparison exports; "Overall" is the
/// aggregate lane every dump carries.
fn default_comparison_vl() -> String {
  "Overall".to_string()
}

fn default_output_dir() -> PathBuf {
  PathBuf::from("counter_reports")
}

/// Resolved settings for counter report generation.
///
/// Values are layered: built-in defaults, then `telem.toml`, then
/// `TELEM_*` environment variables, then explicit CLI overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
  /// Root directory for exported series files.
  pub output_dir: PathBuf,

  /// Virtual lane used for cross-port comparison exports.
  pub comparison_vl: String,

  /// Memoize extracted series. Output is identical either way.
  pub cache_series: bool,

  /// Devices processed between wholesale series-cache clears.
  pub cache_clear_interval: usize,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      output_dir: default_output_dir(),
      comparison_vl: default_comparison_vl(),
      cache_series: true,
      cache_clear_interval: 5,
    }
  }
}

/// CLI-provided values, applied after every other layer.
#[derive(Debug, Default)]
pub struct Overrides {
  pub output_dir: Option<PathBuf>,
  pub comparison_vl: Option<String>,
}

impl Config {
  /// Resolves the layered configuration and validates it.
  pub fn load(overrides: Overrides) -> Result<Self, ConfigError> {
    let mut config: Config = Figment::new()
      .merge(Serialized::defaults(Config::default()))
      .merge(Toml::file("telem.toml"))
      .merge(Env::prefixed("TELEM_"))
      .extract()
      .map_err(Box::new)?;

    if let Some(output_dir) = overrides.output_dir {
      config.output_dir = output_dir;
    }
    if let Some(comparison_vl) = overrides.comparison_vl {
      config.comparison_vl = comparison_vl;
    }

    config.validate()?;
    Ok(config)
  }

  /// An interval of zero would mean clearing the cache before any device
  /// is processed, which the export loop cannot express.
  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.cache_clear_interval < 1 {
      return Err(ConfigError::CacheClearInterval);
    }
    Ok(())
  }
}
