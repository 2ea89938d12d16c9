//! Time-series queries and the sample source seam.
//!
//! The crate never talks to a database itself. A [`SampleSource`] answers
//! [`SeriesQuery`]s; [`fetch_data`] wraps it so that any failure becomes
//! [`SensorData::invalid`] and never reaches the extractors.
//!
//! # Example
//!
//! ```
//! use sensor_panel::{fetch_data, Error, SensorData, SeriesQuery};
//!
//! let offline = |_: &SeriesQuery| -> Result<SensorData, Error> {
//!     Err(Error::Fetch("connection refused".to_string()))
//! };
//!
//! let query = SeriesQuery::new("sensor.power", "rasp-meter-1", "power");
//! let data = fetch_data(&offline, &query);
//! assert!(!data.valid);
//! ```

use serde::{Deserialize, Serialize};

use crate::series::SensorData;
use crate::{Error, DEFAULT_PERIOD, DEFAULT_WINDOW};

/// Description of one series to fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesQuery {
    /// Measurement name (e.g. `"sensor.power"`)
    pub sensor_type: String,
    /// Host tag to filter on
    pub hostname: String,
    /// Field to read
    pub param: String,
    /// Trailing range, e.g. `"30h"` or `"9h41m"`
    pub period: String,
    /// Aggregation bucket width, e.g. `"10m"`
    pub window: String,
}

impl SeriesQuery {
    /// Create a query with the default period and window.
    pub fn new(
        sensor_type: impl Into<String>,
        hostname: impl Into<String>,
        param: impl Into<String>,
    ) -> Self {
        Self {
            sensor_type: sensor_type.into(),
            hostname: hostname.into(),
            param: param.into(),
            period: DEFAULT_PERIOD.to_string(),
            window: DEFAULT_WINDOW.to_string(),
        }
    }

    /// Set the trailing range.
    #[must_use]
    pub fn with_period(mut self, period: impl Into<String>) -> Self {
        self.period = period.into();
        self
    }

    /// Set the aggregation window.
    #[must_use]
    pub fn with_window(mut self, window: impl Into<String>) -> Self {
        self.window = window.into();
        self
    }

    /// Render the Flux query for this series against `bucket`.
    ///
    /// Gaps are forward-filled before the mean aggregation, and empty
    /// windows are not emitted.
    pub fn to_flux(&self, bucket: &str) -> String {
        format!(
            r#"from(bucket: "{bucket}")
    |> range(start: -{period})
    |> filter(fn:(r) => r._measurement == "{sensor_type}")
    |> filter(fn: (r) => r.hostname == "{hostname}")
    |> filter(fn: (r) => r["_field"] == "{param}")
    |> fill(usePrevious: true)
    |> aggregateWindow(every: {window}, fn: mean, createEmpty: false)
"#,
            bucket = bucket,
            period = self.period,
            sensor_type = self.sensor_type,
            hostname = self.hostname,
            param = self.param,
            window = self.window,
        )
    }
}

/// Anything that can answer a series query.
///
/// Implementations own transport, credentials and timeouts. Closures of the
/// right shape implement this trait, which keeps tests free of I/O.
pub trait SampleSource {
    /// Fetch the series described by `query`.
    fn query(&self, query: &SeriesQuery) -> Result<SensorData, Error>;
}

impl<F> SampleSource for F
where
    F: Fn(&SeriesQuery) -> Result<SensorData, Error>,
{
    fn query(&self, query: &SeriesQuery) -> Result<SensorData, Error> {
        self(query)
    }
}

/// Fetch a series, folding every failure into [`SensorData::invalid`].
pub fn fetch_data<S>(source: &S, query: &SeriesQuery) -> SensorData
where
    S: SampleSource + ?Sized,
{
    tracing::debug!(
        "Fetching {}/{} field={} period={} window={}",
        query.sensor_type,
        query.hostname,
        query.param,
        query.period,
        query.window
    );

    match source.query(query) {
        Ok(data) if !data.is_empty() => data,
        Ok(_) => {
            tracing::debug!("No data for {}/{}", query.sensor_type, query.hostname);
            SensorData::invalid()
        }
        Err(e) => {
            tracing::warn!(
                "Fetch failed for {}/{}: {}",
                query.sensor_type,
                query.hostname,
                e
            );
            SensorData::invalid()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn one_sample(_: &SeriesQuery) -> Result<SensorData, Error> {
        let t = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap().fixed_offset();
        Ok(SensorData::new(vec![Some(42.0)], vec![t]))
    }

    #[test]
    fn test_query_defaults_and_builder() {
        let query = SeriesQuery::new("sensor.power", "host-a", "power");
        assert_eq!(query.period, "30h");
        assert_eq!(query.window, "10m");

        let query = query.with_period("9h41m").with_window("1m");
        assert_eq!(query.period, "9h41m");
        assert_eq!(query.window, "1m");
    }

    #[test]
    fn test_to_flux() {
        let flux = SeriesQuery::new("sensor.power", "host-a", "power")
            .with_period("2h")
            .to_flux("sensor");
        assert!(flux.starts_with("from(bucket: \"sensor\")"));
        assert!(flux.contains("range(start: -2h)"));
        assert!(flux.contains("r._measurement == \"sensor.power\""));
        assert!(flux.contains("r.hostname == \"host-a\""));
        assert!(flux.contains("r[\"_field\"] == \"power\""));
        assert!(flux.contains("fill(usePrevious: true)"));
        assert!(flux.contains("aggregateWindow(every: 10m, fn: mean, createEmpty: false)"));
    }

    #[test]
    fn test_fetch_data_passes_through() {
        let query = SeriesQuery::new("sensor.power", "host-a", "power");
        let data = fetch_data(&one_sample, &query);
        assert!(data.valid);
        assert_eq!(data.value, vec![Some(42.0)]);
    }

    #[test]
    fn test_fetch_data_degrades_errors() {
        let failing = |_: &SeriesQuery| -> Result<SensorData, Error> {
            Err(Error::Fetch("timeout".to_string()))
        };
        let data = fetch_data(&failing, &SeriesQuery::new("a", "b", "c"));
        assert_eq!(data, SensorData::invalid());
    }

    #[test]
    fn test_fetch_data_degrades_empty_results() {
        let empty = |_: &SeriesQuery| -> Result<SensorData, Error> { Ok(SensorData::new(vec![], vec![])) };
        let data = fetch_data(&empty, &SeriesQuery::new("a", "b", "c"));
        assert!(!data.valid);
    }

    #[test]
    fn test_trait_object() {
        let source: &dyn SampleSource = &one_sample;
        let data = fetch_data(source, &SeriesQuery::new("a", "b", "c"));
        assert!(data.valid);
    }
}
