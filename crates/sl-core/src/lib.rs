//! Core types for the tabular loading system
//!
//! This crate provides the data model shared by the loader, the report
//! builders and the command line front end: the in-memory dataset, the
//! descriptors naming where a dataset may come from, and the outcome of a
//! load attempt.

pub mod dataset;
pub mod outcome;
pub mod source;

// Re-export commonly used types
pub use dataset::{ColumnKind, Dataset};
pub use outcome::{FailureReason, LoadFailure, LoadOutcome};
pub use source::{SheetSelector, SourceDescriptor, SourceFormat, SourceLocation};
