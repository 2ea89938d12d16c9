//! Error types for sensor panel data preparation.

use thiserror::Error;

/// Errors that can occur while preparing panel data.
///
/// Missing or unreadable sensor data is deliberately *not* an error: fetch
/// failures are folded into [`SensorData::invalid`](crate::SensorData::invalid)
/// and the extractors return their empty result for it.
#[derive(Debug, Error)]
pub enum Error {
    /// Caller passed a malformed argument (e.g. a window that is not `<N>m`)
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Panel configuration could not be read or parsed
    #[error("configuration error: {0}")]
    Config(String),

    /// A sample source failed to answer a query
    #[error("fetch failed: {0}")]
    Fetch(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidArgument("window '10h'".to_string());
        assert_eq!(err.to_string(), "invalid argument: window '10h'");

        let err = Error::Fetch("connection refused".to_string());
        assert!(err.to_string().contains("connection refused"));

        let err = Error::Config("Invalid panel YAML".to_string());
        assert!(err.to_string().starts_with("configuration error"));
    }
}
