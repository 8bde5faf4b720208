//! Error types for muonstat

use thiserror::Error;

/// muonstat error type
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV decoding error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Invalid argument to a statistical helper (e.g. `q` outside (0,1), negative counts).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Input data is structurally wrong: missing column, unknown channel,
    /// inconsistent lengths, or successes exceeding trials.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Two histograms with different binning were combined.
    #[error("Bin mismatch: {0}")]
    BinMismatch(String),

    /// Computation error
    #[error("Computation error: {0}")]
    Computation(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_category() {
        let e = Error::BinMismatch("50 bins vs 14 bins".into());
        assert_eq!(e.to_string(), "Bin mismatch: 50 bins vs 14 bins");

        let e = Error::MalformedInput("missing column 'rate'".into());
        assert!(e.to_string().starts_with("Malformed input"));
    }

    #[test]
    fn io_converts() {
        fn open() -> Result<()> {
            std::fs::read("/definitely/not/here.csv")?;
            Ok(())
        }
        assert!(matches!(open(), Err(Error::Io(_))));
    }
}
