use thiserror::Error;

/// Failures raised while fabricating an analysis.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// A uniform range was empty or not finite.
    #[error("invalid sampling range [{low}, {high}) for {field}")]
    InvalidRange {
        /// Quantity being drawn.
        field: &'static str,
        /// Lower bound.
        low: f64,
        /// Upper bound.
        high: f64,
    },
    /// A result value could not be represented as JSON.
    #[error("non-finite value for {field}: {value}")]
    NonFinite {
        /// Result key.
        field: String,
        /// Offending value.
        value: f64,
    },
    /// Latency could not be converted into a timer duration.
    #[error("invalid simulated delay: {0}")]
    InvalidDelay(String),
}
