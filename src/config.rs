//! Panel configuration loaded from YAML.
//!
//! # Example Config (YAML)
//!
//! ```yaml
//! timezone: "Asia/Tokyo"
//!
//! influxdb:
//!   url: "http://influxdb:8086"
//!   token: "..."          # INFLUXDB_TOKEN overrides this
//!   org: "home"
//!   bucket: "sensor"
//!
//! usage:
//!   target:
//!     type: "sensor.power"
//!     host: "rasp-meter-1"
//!     param: "power"
//!     threshold:
//!       work: 100
//!       wake: 10
//!
//! graph:
//!   param:
//!     name: "temp"
//!     period: "30h"
//!     unit: "°C"
//!     format: "{:.1f}"
//!     range: [0, 40]
//!   equip_list:
//!     - type: "sensor.rasp"
//!       host: "rasp-room-1"
//!       label: "Room"
//!   valve:
//!     type: "sensor.flow"
//!     host: "rasp-cooler-1"
//!     param: "flow"
//!     threshold:
//!       full: 2.0
//!       interm: 0.1
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use sensor_panel::PanelConfig;
//!
//! let config = PanelConfig::load("config.yaml")?;
//! let tz = config.tz()?;
//! ```

use std::path::Path;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::extract::TieredThreshold;
use crate::source::SeriesQuery;
use crate::usage::UsageThreshold;
use crate::{Error, DEFAULT_PERIOD, DEFAULT_TIMEZONE, DEFAULT_WINDOW};

/// Environment variable that overrides `influxdb.token`.
pub const TOKEN_ENV: &str = "INFLUXDB_TOKEN";

/// Top-level panel configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelConfig {
    /// IANA timezone used to display sample timestamps
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Time-series database connection details
    pub influxdb: InfluxConfig,
    /// "Usage today" panel
    pub usage: UsageConfig,
    /// Sensor graph
    pub graph: GraphConfig,
}

/// Connection details handed to the sample source implementation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfluxConfig {
    /// Server URL
    pub url: String,
    /// Access token
    #[serde(default)]
    pub token: String,
    /// Organisation
    pub org: String,
    /// Bucket to query
    pub bucket: String,
}

/// Usage panel configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageConfig {
    /// Series the usage figures are computed from
    pub target: UsageTarget,
}

/// The monitored series for the usage panel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageTarget {
    /// Measurement name
    #[serde(rename = "type")]
    pub sensor_type: String,
    /// Host tag
    pub host: String,
    /// Field name
    pub param: String,
    /// Work / wake thresholds
    pub threshold: UsageThreshold,
    /// Aggregation window (`<N>m`)
    #[serde(default = "default_window")]
    pub window: String,
}

/// Sensor graph configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Plotted field and its presentation
    pub param: GraphParam,
    /// One graph row per entry
    pub equip_list: Vec<EquipConfig>,
    /// Optional valve series whose FULL/INTERM ranges shade the graph
    #[serde(default)]
    pub valve: Option<ValveConfig>,
}

/// The field plotted on every graph row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphParam {
    /// Field name
    pub name: String,
    /// Trailing range
    #[serde(default = "default_period")]
    pub period: String,
    /// Aggregation window
    #[serde(default = "default_window")]
    pub window: String,
    /// Unit label
    #[serde(default)]
    pub unit: String,
    /// Value format hint for the renderer
    #[serde(default)]
    pub format: String,
    /// Default y-axis range
    pub range: [f64; 2],
}

/// One graph row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquipConfig {
    /// Measurement name
    #[serde(rename = "type")]
    pub sensor_type: String,
    /// Host tag
    pub host: String,
    /// Row title; the host name is used when absent
    #[serde(default)]
    pub label: Option<String>,
    /// Y-axis range override
    #[serde(default)]
    pub range: Option<[f64; 2]>,
    /// Whether to print the latest value on the row
    #[serde(default = "default_true")]
    pub show_value: bool,
}

/// Valve series used for tiered range shading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValveConfig {
    /// Measurement name
    #[serde(rename = "type")]
    pub sensor_type: String,
    /// Host tag
    pub host: String,
    /// Field name
    pub param: String,
    /// FULL / INTERM thresholds
    pub threshold: TieredThreshold,
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

fn default_period() -> String {
    DEFAULT_PERIOD.to_string()
}

fn default_window() -> String {
    DEFAULT_WINDOW.to_string()
}

fn default_true() -> bool {
    true
}

impl PanelConfig {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::Config(format!(
                "Failed to read config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    ///
    /// The timezone is validated here so later lookups cannot fail.
    pub fn from_yaml(yaml: &str) -> Result<Self, Error> {
        let config: Self = serde_yaml::from_str(yaml)
            .map_err(|e| Error::Config(format!("Invalid panel YAML: {}", e)))?;
        config.tz()?;

        tracing::debug!(
            "Loaded panel config: {} graph rows, valve={}",
            config.graph.equip_list.len(),
            config.graph.valve.is_some()
        );
        Ok(config)
    }

    /// Parsed display timezone.
    pub fn tz(&self) -> Result<Tz, Error> {
        self.timezone
            .parse()
            .map_err(|_| Error::Config(format!("Unknown timezone '{}'", self.timezone)))
    }
}

impl InfluxConfig {
    /// Token to use: `INFLUXDB_TOKEN` if set, else the configured one.
    pub fn resolved_token(&self) -> String {
        self.token_from_env(TOKEN_ENV)
    }

    fn token_from_env(&self, var: &str) -> String {
        std::env::var(var).unwrap_or_else(|_| self.token.clone())
    }
}

impl UsageTarget {
    /// Query for this target over `period`.
    pub fn query(&self, period: impl Into<String>) -> SeriesQuery {
        SeriesQuery::new(&self.sensor_type, &self.host, &self.param)
            .with_period(period)
            .with_window(&self.window)
    }
}

impl GraphConfig {
    /// Query for one graph row.
    pub fn row_query(&self, equip: &EquipConfig) -> SeriesQuery {
        SeriesQuery::new(&equip.sensor_type, &equip.host, &self.param.name)
            .with_period(&self.param.period)
            .with_window(&self.param.window)
    }

    /// Query for the valve series, if configured.
    pub fn valve_query(&self) -> Option<SeriesQuery> {
        self.valve.as_ref().map(|valve| {
            SeriesQuery::new(&valve.sensor_type, &valve.host, &valve.param)
                .with_period(&self.param.period)
                .with_window(&self.param.window)
        })
    }
}

impl EquipConfig {
    /// Row title: the label, or the host name.
    pub fn title(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.host)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const SAMPLE_YAML: &str = r#"
influxdb:
  url: "http://localhost:8086"
  token: "from-file"
  org: "home"
  bucket: "sensor"
usage:
  target:
    type: "sensor.power"
    host: "meter"
    param: "power"
    threshold:
      work: 100
      wake: 10
graph:
  param:
    name: "temp"
    unit: "C"
    range: [0, 40]
  equip_list:
    - type: "sensor.rasp"
      host: "room-1"
      label: "Living"
    - type: "sensor.rasp"
      host: "room-2"
      range: [-10, 10]
      show_value: false
  valve:
    type: "sensor.flow"
    host: "cooler"
    param: "flow"
    threshold:
      full: 2.0
      interm: 0.1
"#;

    #[test]
    fn test_from_yaml() {
        let config = PanelConfig::from_yaml(SAMPLE_YAML).unwrap();
        assert_eq!(config.timezone, "Asia/Tokyo");
        assert_eq!(config.influxdb.bucket, "sensor");
        assert_eq!(config.usage.target.threshold.work, 100.0);
        assert_eq!(config.usage.target.window, "10m");
        assert_eq!(config.graph.param.period, "30h");
        assert_eq!(config.graph.equip_list.len(), 2);
        assert!(config.graph.equip_list[0].show_value);
        assert!(!config.graph.equip_list[1].show_value);
        assert_eq!(config.graph.equip_list[1].range, Some([-10.0, 10.0]));

        let valve = config.graph.valve.as_ref().unwrap();
        assert_eq!(valve.threshold, TieredThreshold::new(2.0, 0.1));
    }

    #[test]
    fn test_tz() {
        let config = PanelConfig::from_yaml(SAMPLE_YAML).unwrap();
        assert_eq!(config.tz().unwrap(), chrono_tz::Asia::Tokyo);
    }

    #[test]
    fn test_unknown_timezone_rejected() {
        let yaml = format!("timezone: \"Mars/Olympus\"\n{}", SAMPLE_YAML);
        assert!(matches!(PanelConfig::from_yaml(&yaml), Err(Error::Config(_))));
    }

    #[test]
    fn test_invalid_yaml() {
        let result = PanelConfig::from_yaml("influxdb: [");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = PanelConfig::load("/nonexistent/panel.yaml");
        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("panel.yaml")));
    }

    #[test]
    fn test_resolved_token() {
        const VAR: &str = "SENSOR_PANEL_TEST_TOKEN_OVERRIDE";
        let config = PanelConfig::from_yaml(SAMPLE_YAML).unwrap();

        std::env::remove_var(VAR);
        assert_eq!(config.influxdb.token_from_env(VAR), "from-file");

        std::env::set_var(VAR, "from-env");
        assert_eq!(config.influxdb.token_from_env(VAR), "from-env");
        std::env::remove_var(VAR);

        // Only this test touches the real variable.
        match std::env::var(TOKEN_ENV) {
            Ok(token) => assert_eq!(config.influxdb.resolved_token(), token),
            Err(_) => assert_eq!(config.influxdb.resolved_token(), "from-file"),
        }
    }

    #[test]
    fn test_titles() {
        let config = PanelConfig::from_yaml(SAMPLE_YAML).unwrap();
        assert_eq!(config.graph.equip_list[0].title(), "Living");
        assert_eq!(config.graph.equip_list[1].title(), "room-2");
    }

    #[test]
    fn test_queries() {
        let config = PanelConfig::from_yaml(SAMPLE_YAML).unwrap();

        let row = config.graph.row_query(&config.graph.equip_list[1]);
        assert_eq!(row.sensor_type, "sensor.rasp");
        assert_eq!(row.hostname, "room-2");
        assert_eq!(row.param, "temp");
        assert_eq!(row.period, "30h");

        let valve = config.graph.valve_query().unwrap();
        assert_eq!(valve.hostname, "cooler");
        assert_eq!(valve.param, "flow");

        let usage = config.usage.target.query("9h41m");
        assert_eq!(usage.period, "9h41m");
        assert_eq!(usage.window, "10m");
    }
}
