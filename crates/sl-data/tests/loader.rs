use std::collections::HashMap;
use std::path::Path;

use arrow::array::{Array, Int64Array, StringArray};
use rust_xlsxwriter::Workbook;
use sl_core::{FailureReason, LoadOutcome, SheetSelector, SourceDescriptor};
use sl_data::{normalize, DataError, Loader, NullConfig, RemoteFetcher};

struct CannedFetcher(HashMap<String, String>);

impl RemoteFetcher for CannedFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, DataError> {
        self.0
            .get(url)
            .map(|body| body.as_bytes().to_vec())
            .ok_or_else(|| DataError::Remote(format!("connection refused: {}", url)))
    }
}

fn loader_with(responses: &[(&str, &str)]) -> Loader {
    let map = responses
        .iter()
        .map(|(url, body)| (url.to_string(), body.to_string()))
        .collect();
    Loader::with_fetcher(CannedFetcher(map), NullConfig::default())
}

fn int_column(outcome: &LoadOutcome, name: &str) -> Vec<i64> {
    let column = outcome.dataset().unwrap().column(name).unwrap();
    column
        .as_any()
        .downcast_ref::<Int64Array>()
        .unwrap()
        .values()
        .to_vec()
}

fn write_workbook(path: &Path) {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "Município ").unwrap();
    sheet.write_string(0, 1, "Situação").unwrap();
    sheet.write_string(0, 2, "Situação").unwrap();
    sheet.write_string(1, 0, "  Vila Velha ").unwrap();
    sheet.write_string(1, 1, "Eliminado").unwrap();
    sheet.write_number(1, 2, 1.0).unwrap();
    sheet.write_string(2, 0, "Serra").unwrap();
    sheet.write_string(2, 1, " Reclassificado").unwrap();
    sheet.write_number(2, 2, 2.0).unwrap();
    workbook.save(path).unwrap();
}

#[test]
fn remote_fallback_after_missing_local_file() {
    let loader = loader_with(&[("http://example/data.csv", "A,B\n1,2\n3,4\n")]);

    let outcome = loader.load(&[
        SourceDescriptor::local("data/missing.xlsx"),
        SourceDescriptor::remote("http://example/data.csv"),
    ]);

    let dataset = outcome.dataset().expect("remote source should load");
    assert_eq!(dataset.num_rows(), 2);
    assert_eq!(dataset.column_names(), vec!["A", "B"]);
    assert_eq!(int_column(&outcome, "A"), vec![1, 3]);
    assert_eq!(int_column(&outcome, "B"), vec![2, 4]);
}

#[test]
fn fallback_equals_loading_second_source_directly() {
    let loader = loader_with(&[("http://example/data.csv", "A,B\n1,2\n3,4\n")]);
    let second = SourceDescriptor::remote("http://example/data.csv");

    let via_fallback = loader.load(&[SourceDescriptor::remote("http://down/data.csv"), second.clone()]);
    let direct = loader.load(&[second.clone()]);

    assert_eq!(via_fallback.dataset(), direct.dataset());
    assert_eq!(via_fallback.source(), Some(&second));
    assert!(matches!(
        via_fallback.failures()[0].reason,
        FailureReason::Unreadable(_)
    ));
}

#[test]
fn semicolon_upload() {
    let loader = loader_with(&[]);
    let upload = SourceDescriptor::upload("data.csv", b"X;Y\nfoo;1\nbar;2\n".to_vec());

    let outcome = loader.load(&[upload]);

    let dataset = outcome.dataset().unwrap();
    assert_eq!(dataset.column_names(), vec!["X", "Y"]);
    let x = dataset.column("X").unwrap().as_any().downcast_ref::<StringArray>().unwrap();
    assert_eq!(x.value(0), "foo");
    assert_eq!(x.value(1), "bar");
}

#[test]
fn every_source_failing_reports_each_one() {
    let dir = tempfile::tempdir().unwrap();
    let corrupt = dir.path().join("base.xlsx");
    std::fs::write(&corrupt, b"not a workbook").unwrap();

    let sources = vec![
        SourceDescriptor::local(dir.path().join("missing.xlsx")),
        SourceDescriptor::local(&corrupt),
        SourceDescriptor::remote("http://down/data.csv"),
    ];
    let outcome = loader_with(&[]).load(&sources);

    match outcome {
        LoadOutcome::Unavailable { failures } => {
            assert_eq!(failures.len(), 3);
            assert_eq!(failures[0].reason, FailureReason::NotFound);
            assert!(matches!(failures[1].reason, FailureReason::Malformed(_)));
            assert!(matches!(failures[2].reason, FailureReason::Unreadable(_)));
        }
        LoadOutcome::Loaded { .. } => panic!("nothing should load"),
    }
}

#[test]
fn local_workbook_is_normalized() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("base.xlsx");
    write_workbook(&path);

    let outcome = loader_with(&[]).load(&[SourceDescriptor::local(&path)]);

    let dataset = outcome.dataset().unwrap();
    assert_eq!(dataset.column_names(), vec!["Município", "Situação", "Situação.1"]);
    let city = dataset.column("Município").unwrap().as_any().downcast_ref::<StringArray>().unwrap();
    assert_eq!(city.value(0), "Vila Velha");
    let status = dataset.column("Situação").unwrap().as_any().downcast_ref::<StringArray>().unwrap();
    assert_eq!(status.value(1), "Reclassificado");
    assert_eq!(int_column(&outcome, "Situação.1"), vec![1, 2]);
}

#[test]
fn local_csv_wins_over_remote() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("base.csv");
    std::fs::write(&path, "name, total \n ana ,1\n").unwrap();
    let loader = loader_with(&[("http://example/data.csv", "A,B\n1,2\n")]);

    let outcome = loader.load(&[
        SourceDescriptor::local(&path),
        SourceDescriptor::remote("http://example/data.csv"),
    ]);

    assert_eq!(outcome.source(), Some(&SourceDescriptor::local(&path)));
    assert_eq!(outcome.dataset().unwrap().column_names(), vec!["name", "total"]);
    assert_eq!(int_column(&outcome, "total"), vec![1]);
}

#[test]
fn workbook_sheet_by_name() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("book.xlsx");
    let mut workbook = Workbook::new();
    workbook.add_worksheet().write_string(0, 0, "first").unwrap();
    let second = workbook.add_worksheet();
    second.set_name("Dados").unwrap();
    second.write_string(0, 0, "wanted").unwrap();
    second.write_string(1, 0, "row").unwrap();
    workbook.save(&path).unwrap();

    let source = SourceDescriptor::local(&path).with_sheet(SheetSelector::Name("Dados".to_string()));
    let outcome = loader_with(&[]).load(&[source]);

    assert_eq!(outcome.dataset().unwrap().column_names(), vec!["wanted"]);
}

#[test]
fn loaded_dataset_is_already_normalized() {
    let loader = loader_with(&[(
        "http://example/data.csv",
        " a ,b,a\n x ,1,y\n",
    )]);

    let outcome = loader.load(&[SourceDescriptor::remote("http://example/data.csv")]);
    let dataset = outcome.into_dataset().unwrap();
    let renormalized = normalize(dataset.clone()).unwrap();

    assert_eq!(dataset, renormalized);
    assert_eq!(dataset.column_names(), vec!["a", "b", "a.1"]);
    assert_eq!(dataset.column("a").unwrap().null_count(), 0);
}
