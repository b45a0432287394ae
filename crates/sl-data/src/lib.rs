//! Tabular data loading for the dashboard
//!
//! Resolves a dataset from an ordered list of candidate sources (local
//! files, an uploaded buffer, a remote CSV export), parses it into an arrow
//! backed [`Dataset`](sl_core::Dataset) and normalizes column names and text
//! cells.

pub mod config;
pub mod loader;
pub mod normalize;
pub mod schema;
pub mod session;
pub mod sources;

use arrow::error::ArrowError;
use sl_core::FailureReason;
use thiserror::Error;

// Re-exports
pub use config::{LoaderConfig, NullConfig};
pub use loader::{Loader, SourcePlan};
pub use normalize::normalize;
pub use session::Session;
pub use sources::{DelimitedReader, HttpFetcher, RemoteFetcher, SpreadsheetReader};

/// Errors that can occur while reading a single source
#[derive(Error, Debug)]
pub enum DataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    #[error("CSV parsing error: {0}")]
    Csv(String),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    #[error("Sheet {0} not found")]
    SheetNotFound(String),

    #[error("Remote fetch failed: {0}")]
    Remote(String),

    #[error("HTTP status {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Unsupported extension: {0}")]
    UnsupportedFormat(String),

    #[error("No header row found")]
    Empty,
}

impl From<csv::Error> for DataError {
    fn from(error: csv::Error) -> Self {
        match error.kind() {
            csv::ErrorKind::Io(io_err) => DataError::Io(std::io::Error::new(io_err.kind(), error.to_string())),
            _ => DataError::Csv(error.to_string()),
        }
    }
}

impl From<calamine::Error> for DataError {
    fn from(error: calamine::Error) -> Self {
        match error {
            calamine::Error::Io(io_err) => DataError::Io(io_err),
            other => DataError::Spreadsheet(other.to_string()),
        }
    }
}

impl From<DataError> for FailureReason {
    fn from(error: DataError) -> Self {
        match error {
            DataError::Io(_) | DataError::Remote(_) | DataError::HttpStatus { .. } => {
                FailureReason::Unreadable(error.to_string())
            }
            DataError::UnsupportedFormat(ext) => FailureReason::Unsupported(ext),
            other => FailureReason::Malformed(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let reason: FailureReason = DataError::HttpStatus {
            status: 404,
            url: "http://example/data.csv".to_string(),
        }
        .into();
        assert!(matches!(reason, FailureReason::Unreadable(_)));

        let reason: FailureReason = DataError::UnsupportedFormat("parquet".to_string()).into();
        assert_eq!(reason, FailureReason::Unsupported("parquet".to_string()));

        let reason: FailureReason = DataError::Empty.into();
        assert!(matches!(reason, FailureReason::Malformed(_)));
    }
}
