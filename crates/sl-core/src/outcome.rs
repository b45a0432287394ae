//! Outcome of a load attempt

use std::fmt;

use serde::Serialize;

use crate::dataset::Dataset;
use crate::source::SourceDescriptor;

/// Why a single source did not produce a dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FailureReason {
    /// Local path does not exist; skipped without reading
    NotFound,
    /// The bytes could not be obtained (I/O or network)
    Unreadable(String),
    /// The bytes were obtained but are not a usable table
    Malformed(String),
    /// No reader handles this extension
    Unsupported(String),
}

impl FailureReason {
    /// Whether the source was skipped rather than read and rejected
    pub fn is_skip(&self) -> bool {
        matches!(self, FailureReason::NotFound)
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::NotFound => write!(f, "not found"),
            FailureReason::Unreadable(msg) => write!(f, "unreadable: {}", msg),
            FailureReason::Malformed(msg) => write!(f, "malformed content: {}", msg),
            FailureReason::Unsupported(ext) => write!(f, "unsupported extension: {}", ext),
        }
    }
}

/// A source paired with the reason it failed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadFailure {
    pub source: SourceDescriptor,
    pub reason: FailureReason,
}

impl fmt::Display for LoadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.source, self.reason)
    }
}

/// Result of resolving a list of sources.
///
/// Failures are data here: every source tried before the outcome was
/// decided leaves exactly one entry in `failures`.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Loaded {
        dataset: Dataset,
        source: SourceDescriptor,
        /// Sources tried (and failed) before the one that succeeded
        failures: Vec<LoadFailure>,
    },
    Unavailable {
        failures: Vec<LoadFailure>,
    },
}

impl LoadOutcome {
    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadOutcome::Loaded { .. })
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        match self {
            LoadOutcome::Loaded { dataset, .. } => Some(dataset),
            LoadOutcome::Unavailable { .. } => None,
        }
    }

    /// The source that produced the dataset
    pub fn source(&self) -> Option<&SourceDescriptor> {
        match self {
            LoadOutcome::Loaded { source, .. } => Some(source),
            LoadOutcome::Unavailable { .. } => None,
        }
    }

    pub fn failures(&self) -> &[LoadFailure] {
        match self {
            LoadOutcome::Loaded { failures, .. } | LoadOutcome::Unavailable { failures } => {
                failures
            }
        }
    }

    pub fn into_dataset(self) -> Option<Dataset> {
        match self {
            LoadOutcome::Loaded { dataset, .. } => Some(dataset),
            LoadOutcome::Unavailable { .. } => None,
        }
    }
}
