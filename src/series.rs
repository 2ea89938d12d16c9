//! Sensor time-series as handed over by a sample source.
//!
//! A [`SensorData`] mirrors what the time-series query layer produces: two
//! parallel vectors (values and timestamps) plus a `valid` flag. When `valid`
//! is `false` the contents are never inspected; every consumer treats the
//! series as empty.

use chrono::{DateTime, FixedOffset, TimeZone};
use serde::{Deserialize, Serialize};

/// Timestamp of a sample, carrying the offset it should be displayed in.
pub type Timestamp = DateTime<FixedOffset>;

/// Value written into placeholder series so nothing shows inside the plot range.
pub const PLACEHOLDER_VALUE: f64 = -100.0;

/// One observation of a time-series.
///
/// `value` is `None` when the aggregation window had no data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Bucket timestamp
    pub time: Timestamp,
    /// Aggregated value, if any
    pub value: Option<f64>,
}

impl Sample {
    /// Create a sample with a value.
    pub fn new(time: Timestamp, value: f64) -> Self {
        Self {
            time,
            value: Some(value),
        }
    }

    /// Create a sample for an empty bucket.
    pub fn missing(time: Timestamp) -> Self {
        Self { time, value: None }
    }
}

/// A fetched series: parallel value/time vectors and a validity flag.
///
/// # Example
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use sensor_panel::SensorData;
///
/// let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap().fixed_offset();
/// let t1 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 10, 0).unwrap().fixed_offset();
///
/// let data = SensorData::new(vec![Some(21.5), None], vec![t0, t1]);
/// assert!(data.valid);
/// assert_eq!(data.samples().count(), 2);
/// assert_eq!(data.last_value(), Some(21.5));
///
/// assert_eq!(SensorData::invalid().samples().count(), 0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorData {
    /// Sample values, `None` for empty buckets
    pub value: Vec<Option<f64>>,
    /// Sample timestamps, same length as `value`
    pub time: Vec<Timestamp>,
    /// `false` when the fetch failed or returned nothing
    pub valid: bool,
}

impl SensorData {
    /// Build a series from parallel vectors.
    ///
    /// The series is valid iff it holds at least one sample. Vectors of
    /// different lengths are truncated to the shorter one.
    pub fn new(mut value: Vec<Option<f64>>, mut time: Vec<Timestamp>) -> Self {
        if value.len() != time.len() {
            tracing::warn!(
                "Series length mismatch: {} values vs {} timestamps, truncating",
                value.len(),
                time.len()
            );
            let len = value.len().min(time.len());
            value.truncate(len);
            time.truncate(len);
        }
        let valid = !time.is_empty();
        Self { value, time, valid }
    }

    /// The "no data" series substituted for any failed or empty fetch.
    pub fn invalid() -> Self {
        Self::default()
    }

    /// A stand-in series sharing `other`'s timestamps with every value set
    /// to [`PLACEHOLDER_VALUE`]. Marked invalid so no value is reported.
    pub fn placeholder_like(other: &SensorData) -> Self {
        Self {
            value: vec![Some(PLACEHOLDER_VALUE); other.time.len()],
            time: other.time.clone(),
            valid: false,
        }
    }

    /// Number of usable samples (zero for an invalid series).
    pub fn len(&self) -> usize {
        if self.valid {
            self.value.len().min(self.time.len())
        } else {
            0
        }
    }

    /// `true` when there is nothing to scan.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over the usable samples in time order.
    pub fn samples(&self) -> impl Iterator<Item = Sample> + '_ {
        let len = self.len();
        self.time[..len]
            .iter()
            .zip(&self.value[..len])
            .map(|(&time, &value)| Sample { time, value })
    }

    /// Timestamp of the first usable sample.
    pub fn first_time(&self) -> Option<Timestamp> {
        self.samples().next().map(|s| s.time)
    }

    /// Most recent non-null value, shown as the graph's headline number.
    pub fn last_value(&self) -> Option<f64> {
        self.samples().filter_map(|s| s.value).last()
    }

    /// Re-express every timestamp in the given display timezone.
    ///
    /// Instants are unchanged; only the attached offset moves.
    #[must_use]
    pub fn localized<Tz: TimeZone>(mut self, tz: &Tz) -> Self {
        for time in &mut self.time {
            *time = time.with_timezone(tz).fixed_offset();
        }
        self
    }
}

impl FromIterator<Sample> for SensorData {
    fn from_iter<I: IntoIterator<Item = Sample>>(iter: I) -> Self {
        let (time, value) = iter.into_iter().map(|s| (s.time, s.value)).unzip();
        Self::new(value, time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn at(minute: i64) -> Timestamp {
        let base = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        (base + Duration::minutes(minute)).fixed_offset()
    }

    #[test]
    fn test_new_sets_validity() {
        assert!(SensorData::new(vec![Some(1.0)], vec![at(0)]).valid);
        assert!(!SensorData::new(vec![], vec![]).valid);
    }

    #[test]
    fn test_new_truncates_mismatched_lengths() {
        let data = SensorData::new(vec![Some(1.0), Some(2.0), Some(3.0)], vec![at(0), at(10)]);
        assert_eq!(data.value.len(), 2);
        assert_eq!(data.time.len(), 2);
        assert_eq!(data.len(), 2);
    }

    #[test]
    fn test_invalid_is_never_inspected() {
        let data = SensorData {
            value: vec![Some(50.0), Some(60.0)],
            time: vec![at(0), at(10)],
            valid: false,
        };
        assert!(data.is_empty());
        assert_eq!(data.samples().count(), 0);
        assert_eq!(data.last_value(), None);
        assert_eq!(data.first_time(), None);
    }

    #[test]
    fn test_last_value_skips_nulls() {
        let data = SensorData::new(vec![Some(1.0), Some(2.5), None, None], (0..4).map(|i| at(i * 10)).collect());
        assert_eq!(data.last_value(), Some(2.5));

        let data = SensorData::new(vec![None, None], vec![at(0), at(10)]);
        assert_eq!(data.last_value(), None);
    }

    #[test]
    fn test_placeholder_like() {
        let data = SensorData::new(vec![Some(3.0), None], vec![at(0), at(10)]);
        let placeholder = SensorData::placeholder_like(&data);
        assert!(!placeholder.valid);
        assert_eq!(placeholder.time, data.time);
        assert_eq!(placeholder.value, vec![Some(PLACEHOLDER_VALUE); 2]);
    }

    #[test]
    fn test_localized_keeps_instant() {
        let jst = FixedOffset::east_opt(9 * 3600).unwrap();
        let data = SensorData::new(vec![Some(1.0)], vec![at(0)]).localized(&jst);
        assert_eq!(data.time[0], at(0));
        assert_eq!(data.time[0].offset().local_minus_utc(), 9 * 3600);
        assert_eq!(data.time[0].to_rfc3339(), "2024-05-01T09:00:00+09:00");
    }

    #[test]
    fn test_from_iterator() {
        let data: SensorData = vec![Sample::new(at(0), 1.0), Sample::missing(at(10))]
            .into_iter()
            .collect();
        assert!(data.valid);
        assert_eq!(data.value, vec![Some(1.0), None]);

        let empty: SensorData = std::iter::empty().collect();
        assert!(!empty.valid);
    }

    #[test]
    fn test_serialization_shape() {
        let data = SensorData::new(vec![Some(1.0), None], vec![at(0), at(10)]);
        let json = serde_json::to_string(&data).unwrap();
        assert!(json.contains("\"value\":[1.0,null]"));
        assert!(json.contains("\"valid\":true"));
    }
}
