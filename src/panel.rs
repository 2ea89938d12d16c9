//! Data assembly for the graph and usage panels.
//!
//! These are the structures handed to the renderer: everything the panels
//! show, fetched and reduced, with fetch failures already absorbed.
//!
//! # Example
//!
//! ```rust,ignore
//! use sensor_panel::{GraphData, PanelConfig, UsageData};
//!
//! let config = PanelConfig::load("config.yaml")?;
//! let now = chrono::Utc::now().with_timezone(&config.tz()?);
//!
//! let graph = GraphData::collect(&influx, &config, &now)?;
//! let usage = UsageData::collect(&influx, &config, &now)?;
//! ```

use chrono::DateTime;
use chrono_tz::Tz;
use serde::Serialize;

use crate::config::PanelConfig;
use crate::extract::{extract_tiered_ranges, Interval};
use crate::series::{SensorData, Timestamp};
use crate::source::{fetch_data, SampleSource};
use crate::usage::{today_period, UsageSummary};
use crate::Error;

/// One row of the sensor graph.
#[derive(Debug, Clone, Serialize)]
pub struct GraphRow {
    /// Row title
    pub title: String,
    /// Y-axis range
    pub range: [f64; 2],
    /// Whether the latest value is printed
    pub show_value: bool,
    /// Series to plot; a placeholder when the host had no data
    pub data: SensorData,
    /// Latest value, `None` when the renderer should print "?"
    pub latest: Option<f64>,
}

/// Everything the sensor graph needs.
#[derive(Debug, Clone, Serialize)]
pub struct GraphData {
    /// Shared x-axis start: first sample of the first row with data, capped at now
    pub time_begin: Timestamp,
    /// One entry per configured equipment
    pub rows: Vec<GraphRow>,
    /// FULL / INTERM ranges of the valve series, for background shading
    pub valve_ranges: Vec<Interval>,
}

impl GraphData {
    /// Fetch every graph row and the valve series.
    ///
    /// Rows without data share the timestamps of the first row that has
    /// data, so every subplot spans the same axis.
    pub fn collect<S>(source: &S, config: &PanelConfig, now: &DateTime<Tz>) -> Result<Self, Error>
    where
        S: SampleSource + ?Sized,
    {
        let tz = config.tz()?;
        let graph = &config.graph;

        let fetched: Vec<SensorData> = graph
            .equip_list
            .iter()
            .map(|equip| fetch_data(source, &graph.row_query(equip)).localized(&tz))
            .collect();

        // Axis starts at the first row with data, never later than now.
        let time_begin = fetched
            .iter()
            .find_map(SensorData::first_time)
            .map_or(now.fixed_offset(), |first| first.min(now.fixed_offset()));

        let placeholder = fetched
            .iter()
            .find(|data| data.valid)
            .map(SensorData::placeholder_like);

        let rows = graph
            .equip_list
            .iter()
            .zip(fetched)
            .map(|(equip, data)| {
                let latest = data.last_value();
                let data = match (&placeholder, data.valid) {
                    (Some(placeholder), false) => placeholder.clone(),
                    _ => data,
                };
                GraphRow {
                    title: equip.title().to_string(),
                    range: equip.range.unwrap_or(graph.param.range),
                    show_value: equip.show_value,
                    data,
                    latest,
                }
            })
            .collect::<Vec<_>>();

        let valve_ranges = match (&graph.valve, graph.valve_query()) {
            (Some(valve), Some(query)) => {
                let data = fetch_data(source, &query).localized(&tz);
                extract_tiered_ranges(data.samples(), &valve.threshold)
            }
            _ => Vec::new(),
        };

        tracing::info!(
            "Collected graph data: {} rows ({} with data), {} valve ranges",
            rows.len(),
            rows.iter().filter(|row| row.data.valid).count(),
            valve_ranges.len()
        );

        Ok(Self {
            time_begin,
            rows,
            valve_ranges,
        })
    }
}

/// Everything the usage panel needs.
#[derive(Debug, Clone, Serialize)]
pub struct UsageData {
    /// Trailing period the figures cover (`"{h}h{m}m"`)
    pub period: String,
    /// Today's figures
    pub summary: UsageSummary,
}

impl UsageData {
    /// Fetch today's usage series and compute the summary.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the configured window is malformed.
    /// Fetch failures give a zero summary instead.
    pub fn collect<S>(source: &S, config: &PanelConfig, now: &DateTime<Tz>) -> Result<Self, Error>
    where
        S: SampleSource + ?Sized,
    {
        let target = &config.usage.target;
        let period = today_period(now);
        let data = fetch_data(source, &target.query(period.as_str()));
        let summary = UsageSummary::compute(&data, &target.threshold, &target.window)?;

        Ok(Self { period, summary })
    }
}
