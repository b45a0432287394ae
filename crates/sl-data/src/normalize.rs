//! Column name and text cell normalization applied after every load

use std::sync::Arc;

use ahash::AHashSet;
use arrow::array::{Array, ArrayRef, StringArray};
use arrow::datatypes::{DataType, Schema};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use sl_core::Dataset;

use crate::DataError;

/// Normalize a freshly loaded dataset.
///
/// Column names are trimmed, blank names become `column_<n>` and repeated
/// names get `.1`, `.2`, ... suffixes. Text cells are trimmed; every other
/// column is left untouched. Applying this twice is the same as once.
pub fn normalize(dataset: Dataset) -> Result<Dataset, DataError> {
    let batch = dataset.into_batch();
    let schema = batch.schema();

    let raw_names: Vec<String> = schema.fields().iter().map(|f| f.name().clone()).collect();
    let names = normalize_column_names(&raw_names);

    let fields: Vec<_> = schema
        .fields()
        .iter()
        .zip(names)
        .map(|(field, name)| field.as_ref().clone().with_name(name))
        .collect();

    let columns: Vec<ArrayRef> = batch.columns().iter().map(trim_text_column).collect();

    let schema = Arc::new(Schema::new_with_metadata(fields, schema.metadata().clone()));
    let options = RecordBatchOptions::new().with_row_count(Some(batch.num_rows()));
    let batch = RecordBatch::try_new_with_options(schema, columns, &options)?;
    Ok(Dataset::new(batch))
}

/// Trim names and make them non-empty and unique, keeping their order
pub fn normalize_column_names(names: &[String]) -> Vec<String> {
    // (name, generated for a blank header)
    let base: Vec<(String, bool)> = names
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let trimmed = name.trim();
            if trimmed.is_empty() {
                (format!("column_{}", idx + 1), true)
            } else {
                (trimmed.to_string(), false)
            }
        })
        .collect();

    // Neither a suffixed nor a generated name may steal a name given explicitly
    let reserved: AHashSet<&str> = base
        .iter()
        .filter(|(_, generated)| !generated)
        .map(|(name, _)| name.as_str())
        .collect();
    let mut used: AHashSet<String> = AHashSet::with_capacity(base.len());
    let mut result = Vec::with_capacity(base.len());

    for (name, generated) in &base {
        let taken = used.contains(name) || (*generated && reserved.contains(name.as_str()));
        if !taken {
            used.insert(name.clone());
            result.push(name.clone());
            continue;
        }

        let mut counter = 1;
        loop {
            let candidate = format!("{}.{}", name, counter);
            if !used.contains(&candidate) && !reserved.contains(candidate.as_str()) {
                used.insert(candidate.clone());
                result.push(candidate);
                break;
            }
            counter += 1;
        }
    }

    result
}

fn trim_text_column(column: &ArrayRef) -> ArrayRef {
    if column.data_type() != &DataType::Utf8 {
        return column.clone();
    }
    match column.as_any().downcast_ref::<StringArray>() {
        Some(strings) => {
            let trimmed: StringArray = strings.iter().map(|v| v.map(str::trim)).collect();
            Arc::new(trimmed)
        }
        None => column.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Int64Array;
    use arrow::datatypes::Field;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn messy() -> Dataset {
        Dataset::try_from_columns(
            vec![
                Field::new("  Motivo ", DataType::Utf8, true),
                Field::new("Total", DataType::Int64, true),
                Field::new("Motivo", DataType::Utf8, true),
                Field::new("   ", DataType::Utf8, true),
            ],
            vec![
                Arc::new(StringArray::from(vec![Some(" a "), None])),
                Arc::new(Int64Array::from(vec![1, 2])),
                Arc::new(StringArray::from(vec!["x\t", " y"])),
                Arc::new(StringArray::from(vec!["", " "])),
            ],
            2,
        )
        .unwrap()
    }

    #[test]
    fn test_names_are_trimmed_and_unique() {
        assert_eq!(
            normalize_column_names(&names(&[" a", "b ", "a", "", "a"])),
            names(&["a", "b", "a.1", "column_4", "a.2"])
        );
    }

    #[test]
    fn test_suffix_skips_existing_names() {
        assert_eq!(
            normalize_column_names(&names(&["a", "a", "a.1"])),
            names(&["a", "a.2", "a.1"])
        );
    }

    #[test]
    fn test_generated_name_yields_to_explicit_one() {
        let renamed = normalize_column_names(&names(&["", "column_1"]));

        assert_eq!(renamed, names(&["column_1.1", "column_1"]));
        assert_eq!(normalize_column_names(&renamed), renamed);
    }

    #[test]
    fn test_text_cells_trimmed() {
        let ds = normalize(messy()).unwrap();

        assert_eq!(ds.column_names(), names(&["Motivo", "Total", "Motivo.1", "column_4"]));

        let motivo = ds.batch().column(0).as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(motivo.value(0), "a");
        assert!(motivo.is_null(1));

        let other = ds.batch().column(2).as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(other.value(0), "x");
        assert_eq!(other.value(1), "y");

        assert_eq!(ds.batch().column(1), messy().batch().column(1));
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = normalize(messy()).unwrap();
        let twice = normalize(once.clone()).unwrap();

        assert_eq!(once, twice);
    }
}
