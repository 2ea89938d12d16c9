//! # sensor-panel
//!
//! Data preparation for e-paper dashboard panels that show a sensor graph
//! and a "usage today" summary.
//!
//! The crate sits between a time-series database and an image renderer:
//! - Series types that match what the query layer returns
//! - On/off and FULL/INTERM interval detection for graph shading
//! - Active-minute counting for the usage summary
//! - Optional YAML config and panel data assembly
//!
//! Drawing, fonts and database transport are left to the caller.
//!
//! ## Quick Start
//!
//! ```
//! use chrono::{Duration, TimeZone, Utc};
//! use sensor_panel::{count_active_minutes, extract_tiered_ranges, SensorData, TieredThreshold};
//!
//! let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap().fixed_offset();
//! let data = SensorData::new(
//!     vec![Some(5.0), Some(15.0), Some(25.0), Some(15.0), Some(5.0)],
//!     (0..5).map(|i| start + Duration::minutes(10 * i)).collect(),
//! );
//!
//! let ranges = extract_tiered_ranges(data.samples(), &TieredThreshold::new(20.0, 10.0));
//! assert_eq!(ranges.len(), 3);
//! assert!(ranges[1].is_full);
//!
//! assert_eq!(count_active_minutes(data.samples(), 10.0, "10m").unwrap(), 30);
//! ```
//!
//! ## Data Flow
//!
//! | Stage | Type | Owner |
//! |-------|------|-------|
//! | Fetch | [`SampleSource`] → [`SensorData`] | caller (database client) |
//! | Extract | [`Interval`], minute counts | this crate |
//! | Render | `GraphData`, `UsageData` (`config` feature) → image | caller (image library) |
//!
//! A failed or empty fetch becomes [`SensorData::invalid`]. Every extractor
//! returns its empty result for it; the only error they raise is a malformed
//! window string.
//!
//! ## Feature Flags
//!
//! - `config` (default) - YAML panel configuration and panel data assembly
//! - `full` - All features

mod error;
mod extract;
mod series;
mod source;
mod usage;

pub use error::Error;
pub use extract::{
    count_active_minutes, extract_on_off_ranges, extract_tiered_ranges, parse_window_minutes,
    ActivityState, Interval, TieredThreshold,
};
pub use series::{Sample, SensorData, Timestamp, PLACEHOLDER_VALUE};
pub use source::{fetch_data, SampleSource, SeriesQuery};
pub use usage::{today_period, DurationParts, UsageSummary, UsageThreshold, LEAVE_MARGIN_MINUTES};

/// Default trailing range for graph queries
pub const DEFAULT_PERIOD: &str = "30h";

/// Default aggregation window (one sample per bucket)
pub const DEFAULT_WINDOW: &str = "10m";

/// Default display timezone
pub const DEFAULT_TIMEZONE: &str = "Asia/Tokyo";

// Optional modules
#[cfg(feature = "config")]
pub mod config;
#[cfg(feature = "config")]
pub use config::{EquipConfig, GraphConfig, GraphParam, InfluxConfig, PanelConfig, UsageConfig, UsageTarget, ValveConfig};

#[cfg(feature = "config")]
mod panel;
#[cfg(feature = "config")]
pub use panel::{GraphData, GraphRow, UsageData};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_parse() {
        assert_eq!(parse_window_minutes(DEFAULT_WINDOW).unwrap(), 10);
        assert!(DEFAULT_PERIOD.ends_with('h'));
    }
}
