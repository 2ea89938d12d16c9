//! On/off interval detection over sampled time-series.
//!
//! Turns a sequence of [`Sample`]s into the time ranges during which a piece
//! of equipment was active, and counts active minutes over a window.
//!
//! Comparison rules:
//! - Interval extraction uses strict `>`: a value exactly on a threshold
//!   belongs to the lower band.
//! - [`count_active_minutes`] uses inclusive `>=`.
//! - A null value never exceeds any threshold. It ends an open run just like
//!   a low reading would.

use serde::{Deserialize, Serialize};

use crate::series::{Sample, Timestamp};
use crate::Error;

/// A closed time range during which a derived state held.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    /// Time of the sample that entered the state
    pub start: Timestamp,
    /// Time of the sample that left it, or of the last sample for a trailing run.
    /// Equal to `start` when the last sample opened the run.
    pub end: Timestamp,
    /// `true` for a FULL run. Always `false` for binary on/off ranges.
    pub is_full: bool,
}

impl Interval {
    /// Length of the interval.
    pub fn duration(&self) -> chrono::Duration {
        self.end - self.start
    }

    /// Whether `time` falls inside `[start, end)`.
    pub fn contains(&self, time: Timestamp) -> bool {
        self.start <= time && time < self.end
    }
}

/// Activity band of a single sample in the three-state variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityState {
    /// At or below the intermediate threshold (or no data)
    Idle,
    /// Above intermediate, at or below full
    Interm,
    /// Above the full threshold
    Full,
}

/// Two-level threshold defining the IDLE / INTERM / FULL bands.
///
/// # Example
///
/// ```
/// use sensor_panel::{ActivityState, TieredThreshold};
///
/// let threshold = TieredThreshold::new(20.0, 10.0);
/// assert_eq!(threshold.classify(Some(25.0)), ActivityState::Full);
/// assert_eq!(threshold.classify(Some(20.0)), ActivityState::Interm);
/// assert_eq!(threshold.classify(Some(10.0)), ActivityState::Idle);
/// assert_eq!(threshold.classify(None), ActivityState::Idle);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TieredThreshold {
    /// Values strictly above this are FULL
    pub full: f64,
    /// Values strictly above this (and not FULL) are INTERM
    pub interm: f64,
}

impl TieredThreshold {
    /// Create a threshold pair.
    pub fn new(full: f64, interm: f64) -> Self {
        Self { full, interm }
    }

    /// Classify one sample value.
    pub fn classify(&self, value: Option<f64>) -> ActivityState {
        match value {
            Some(v) if v > self.full => ActivityState::Full,
            Some(v) if v > self.interm => ActivityState::Interm,
            _ => ActivityState::Idle,
        }
    }
}

/// Scan state: either nothing is open or a run started at `start` in `state`.
#[derive(Debug, Clone, Copy)]
enum Scan<S> {
    Idle,
    Open { start: Timestamp, state: S },
}

/// Split samples into maximal runs of the same non-idle label.
///
/// A label change closes the current run at the changing sample's time and,
/// unless the new label is idle, opens the next run at that same time.
///
/// Timestamps are expected to be non-decreasing. Runs satisfy
/// `start <= end`; a run is zero-length only when opened by the last sample
/// or when two samples share a timestamp.
fn scan_runs<S, I, F>(samples: I, idle: S, mut classify: F) -> Vec<(Timestamp, Timestamp, S)>
where
    S: Copy + PartialEq,
    I: IntoIterator<Item = Sample>,
    F: FnMut(Option<f64>) -> S,
{
    let mut runs = Vec::new();
    let mut scan = Scan::Idle;
    let mut last_time = None;

    for sample in samples {
        let label = classify(sample.value);
        last_time = Some(sample.time);

        scan = match scan {
            Scan::Open { state, .. } if state == label => scan,
            Scan::Open { start, state } => {
                runs.push((start, sample.time, state));
                open_unless_idle(sample.time, label, idle)
            }
            Scan::Idle => open_unless_idle(sample.time, label, idle),
        };
    }

    // A run still open closes at the last sample, even one it opened itself.
    if let (Scan::Open { start, state }, Some(end)) = (scan, last_time) {
        runs.push((start, end, state));
    }

    runs
}

fn open_unless_idle<S: PartialEq>(time: Timestamp, label: S, idle: S) -> Scan<S> {
    if label == idle {
        Scan::Idle
    } else {
        Scan::Open {
            start: time,
            state: label,
        }
    }
}

/// Find the ranges during which values stayed strictly above `threshold`.
///
/// Each range starts at the first sample above the threshold and ends at the
/// first sample at or below it. A range still open when the data runs out
/// ends at the last sample's timestamp, so a range opened by the last sample
/// is zero-length. Empty input yields no ranges.
///
/// # Example
///
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use sensor_panel::{extract_on_off_ranges, Sample};
///
/// let t = |m| (Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(m)).fixed_offset();
/// let samples = vec![
///     Sample::new(t(0), 5.0),
///     Sample::new(t(10), 15.0),
///     Sample::new(t(20), 15.0),
///     Sample::new(t(30), 5.0),
/// ];
///
/// let ranges = extract_on_off_ranges(samples, 10.0);
/// assert_eq!(ranges.len(), 1);
/// assert_eq!((ranges[0].start, ranges[0].end), (t(10), t(30)));
/// ```
pub fn extract_on_off_ranges<I>(samples: I, threshold: f64) -> Vec<Interval>
where
    I: IntoIterator<Item = Sample>,
{
    let ranges: Vec<Interval> = scan_runs(samples, false, |value| {
        matches!(value, Some(v) if v > threshold)
    })
    .into_iter()
    .map(|(start, end, _)| Interval {
        start,
        end,
        is_full: false,
    })
    .collect();

    tracing::debug!("Found {} on ranges above {}", ranges.len(), threshold);
    ranges
}

/// Find FULL and INTERM ranges using a two-level threshold.
///
/// Moving between FULL and INTERM closes the current range and opens the
/// next one at the same sample, so a run is never relabelled in place.
/// `is_full` records which band each range belongs to.
pub fn extract_tiered_ranges<I>(samples: I, threshold: &TieredThreshold) -> Vec<Interval>
where
    I: IntoIterator<Item = Sample>,
{
    let ranges: Vec<Interval> = scan_runs(samples, ActivityState::Idle, |value| {
        threshold.classify(value)
    })
    .into_iter()
    .map(|(start, end, state)| Interval {
        start,
        end,
        is_full: state == ActivityState::Full,
    })
    .collect();

    tracing::debug!(
        "Found {} tiered ranges (full > {}, interm > {})",
        ranges.len(),
        threshold.full,
        threshold.interm
    );
    ranges
}

/// Parse an aggregation window of the form `<N>m` into minutes.
///
/// # Example
///
/// ```
/// use sensor_panel::parse_window_minutes;
///
/// assert_eq!(parse_window_minutes("10m").unwrap(), 10);
/// assert!(parse_window_minutes("10h").is_err());
/// ```
pub fn parse_window_minutes(window: &str) -> Result<u32, Error> {
    let invalid = || Error::InvalidArgument(format!("window must look like '<N>m', got '{}'", window));

    let digits = window.strip_suffix('m').ok_or_else(invalid)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    digits.parse().map_err(|_| invalid())
}

/// Total minutes during which values were at or above `threshold`.
///
/// Each qualifying sample stands for one bucket of `window` (e.g. `"10m"`).
/// The window is validated before any sample is looked at, so a malformed
/// window is an error even when there is no data.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if `window` is not `<N>m`.
///
/// # Example
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use sensor_panel::{count_active_minutes, Sample};
///
/// let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap().fixed_offset();
/// let samples = vec![Sample::new(t, 10.0), Sample::new(t, 9.9)];
///
/// assert_eq!(count_active_minutes(samples, 10.0, "10m").unwrap(), 10);
/// ```
pub fn count_active_minutes<I>(samples: I, threshold: f64, window: &str) -> Result<u32, Error>
where
    I: IntoIterator<Item = Sample>,
{
    let unit = parse_window_minutes(window)?;

    let count = samples
        .into_iter()
        .filter(|sample| matches!(sample.value, Some(v) if v >= threshold))
        .count();

    Ok(u32::try_from(count)
        .unwrap_or(u32::MAX)
        .saturating_mul(unit))
}
