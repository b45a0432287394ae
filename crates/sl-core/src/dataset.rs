//! In-memory tabular dataset

use std::sync::Arc;

use arrow::array::ArrayRef;
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::error::ArrowError;
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use serde::{Deserialize, Serialize};

/// Kind of values held by a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnKind {
    Text,
    Integer,
    Float,
    Boolean,
    Date,
    DateTime,
    Other,
}

impl ColumnKind {
    /// Map an arrow data type onto a column kind
    pub fn of(data_type: &DataType) -> Self {
        match data_type {
            DataType::Utf8 | DataType::LargeUtf8 => ColumnKind::Text,
            DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64 => ColumnKind::Integer,
            DataType::Float32 | DataType::Float64 => ColumnKind::Float,
            DataType::Boolean => ColumnKind::Boolean,
            DataType::Date32 | DataType::Date64 => ColumnKind::Date,
            DataType::Timestamp(_, _) => ColumnKind::DateTime,
            _ => ColumnKind::Other,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnKind::Integer | ColumnKind::Float)
    }

    pub fn is_temporal(&self) -> bool {
        matches!(self, ColumnKind::Date | ColumnKind::DateTime)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ColumnKind::Text => "text",
            ColumnKind::Integer => "integer",
            ColumnKind::Float => "float",
            ColumnKind::Boolean => "boolean",
            ColumnKind::Date => "date",
            ColumnKind::DateTime => "datetime",
            ColumnKind::Other => "other",
        }
    }
}

/// An ordered sequence of named columns backed by an arrow record batch.
///
/// Rows carry no identity beyond their position. Datasets returned by the
/// loader have unique, non-empty, trimmed column names.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    batch: RecordBatch,
}

impl Dataset {
    /// Wrap an existing record batch
    pub fn new(batch: RecordBatch) -> Self {
        Self { batch }
    }

    /// Build a dataset from fields and matching arrays.
    ///
    /// The row count is given explicitly so that a header-only table
    /// (columns but no rows) is representable.
    pub fn try_from_columns(
        fields: Vec<Field>,
        columns: Vec<ArrayRef>,
        row_count: usize,
    ) -> Result<Self, ArrowError> {
        let schema = Arc::new(Schema::new(fields));
        let options = RecordBatchOptions::new().with_row_count(Some(row_count));
        let batch = RecordBatch::try_new_with_options(schema, columns, &options)?;
        Ok(Self { batch })
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn into_batch(self) -> RecordBatch {
        self.batch
    }

    pub fn schema(&self) -> SchemaRef {
        self.batch.schema()
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn num_columns(&self) -> usize {
        self.batch.num_columns()
    }

    /// Column names in positional order
    pub fn column_names(&self) -> Vec<String> {
        self.batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect()
    }

    /// Position of the first column with the given name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.batch
            .schema()
            .fields()
            .iter()
            .position(|f| f.name() == name)
    }

    /// Look up a column by name
    pub fn column(&self, name: &str) -> Option<&ArrayRef> {
        self.column_index(name).map(|idx| self.batch.column(idx))
    }

    /// Column kind at the given position
    pub fn column_kind(&self, idx: usize) -> ColumnKind {
        ColumnKind::of(self.batch.column(idx).data_type())
    }

    /// A dataset holding the first `n` rows (or fewer)
    pub fn head(&self, n: usize) -> Self {
        let len = n.min(self.num_rows());
        Self {
            batch: self.batch.slice(0, len),
        }
    }
}

impl From<RecordBatch> for Dataset {
    fn from(batch: RecordBatch) -> Self {
        Self::new(batch)
    }
}
