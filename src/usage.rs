//! "Usage today" summary numbers.
//!
//! Two thresholds are applied to the same series: `work` marks the equipment
//! actually running, `wake` marks it powered on at all. Time spent awake but
//! not working (minus a small margin) is reported as "left on".

use chrono::{DateTime, TimeZone, Timelike};
use serde::{Deserialize, Serialize};

use crate::extract::count_active_minutes;
use crate::series::SensorData;
use crate::Error;

/// Minutes of wake-but-idle time that are not counted as "left on".
pub const LEAVE_MARGIN_MINUTES: u32 = 5;

/// Thresholds for the usage panel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UsageThreshold {
    /// Values at or above this count as working
    pub work: f64,
    /// Values at or above this count as powered on
    pub wake: f64,
}

/// Trailing period covering today so far, formatted as `"{h}h{m}m"`.
///
/// # Example
///
/// ```
/// use chrono::{FixedOffset, TimeZone};
/// use sensor_panel::today_period;
///
/// let jst = FixedOffset::east_opt(9 * 3600).unwrap();
/// let now = jst.with_ymd_and_hms(2024, 5, 1, 9, 41, 30).unwrap();
/// assert_eq!(today_period(&now), "9h41m");
/// ```
pub fn today_period<Tz: TimeZone>(now: &DateTime<Tz>) -> String {
    format!("{}h{}m", now.hour(), now.minute())
}

/// Today's usage figures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageSummary {
    /// Minutes at or above the work threshold
    pub work_minutes: u32,
    /// Minutes at or above the wake threshold
    pub wake_minutes: u32,
    /// Minutes awake but not working, less [`LEAVE_MARGIN_MINUTES`]
    pub leave_minutes: u32,
}

impl UsageSummary {
    /// Build the summary from raw minute counts.
    pub fn from_minutes(work_minutes: u32, wake_minutes: u32) -> Self {
        let leave_minutes = wake_minutes
            .saturating_sub(work_minutes)
            .saturating_sub(LEAVE_MARGIN_MINUTES);
        Self {
            work_minutes,
            wake_minutes,
            leave_minutes,
        }
    }

    /// Count work and wake minutes in `data`, one bucket per `window`.
    ///
    /// An invalid series gives an all-zero summary.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `window` is not `<N>m`.
    pub fn compute(
        data: &SensorData,
        threshold: &UsageThreshold,
        window: &str,
    ) -> Result<Self, Error> {
        let work = count_active_minutes(data.samples(), threshold.work, window)?;
        let wake = count_active_minutes(data.samples(), threshold.wake, window)?;
        let summary = Self::from_minutes(work, wake);

        tracing::info!(
            "today usage: {} min (leave: {} min)",
            summary.work_minutes,
            summary.leave_minutes
        );
        Ok(summary)
    }

    /// Whether the "left on" line is worth showing.
    pub fn show_leave(&self) -> bool {
        self.leave_minutes > LEAVE_MARGIN_MINUTES
    }
}

/// A minute count split the way the panel prints it.
///
/// Hours appear once there is at least one full hour. Minutes appear when
/// the count is zero or not a whole number of hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationParts {
    /// Whole hours, if shown
    pub hours: Option<u32>,
    /// Remaining minutes, if shown
    pub minutes: Option<u32>,
}

impl DurationParts {
    /// Split a minute count.
    ///
    /// # Example
    ///
    /// ```
    /// use sensor_panel::DurationParts;
    ///
    /// let parts = DurationParts::from_minutes(125);
    /// assert_eq!(parts.hours, Some(2));
    /// assert_eq!(parts.minutes_text().as_deref(), Some("05"));
    ///
    /// assert_eq!(DurationParts::from_minutes(120).minutes, None);
    /// ```
    pub fn from_minutes(total: u32) -> Self {
        let hours = (total >= 60).then_some(total / 60);
        let minutes = (total == 0 || total % 60 != 0).then_some(total % 60);
        Self { hours, minutes }
    }

    /// Minutes as printed: zero-padded after an hours part, bare otherwise.
    pub fn minutes_text(&self) -> Option<String> {
        self.minutes.map(|m| match self.hours {
            Some(_) => format!("{:02}", m),
            None => m.to_string(),
        })
    }
}
