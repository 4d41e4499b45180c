use std::fs;
use tempfile::tempdir;
use unichart::models::IndexKind;
use unichart::storage::{load_csv, load_json, save_csv, save_json};
use unichart::{Dataset, IndexKey};

fn sample() -> Dataset {
    Dataset::from_columns(
        vec![IndexKey::parse("2024-01-31"), IndexKey::parse("2024-02-29")],
        vec![("EURUSD", vec![1.08, f64::NAN]), ("GBPUSD", vec![1.27, 1.26])],
    )
    .unwrap()
}

#[test]
fn csv_keeps_gaps_and_dates() {
    let dir = tempdir().unwrap();
    let p = dir.path().join("fx.csv");
    save_csv(&sample(), &p).unwrap();

    let text = fs::read_to_string(&p).unwrap();
    assert!(text.starts_with("index,EURUSD,GBPUSD"));
    assert!(text.contains("2024-02-29,,1.26"));

    let back = load_csv(&p).unwrap();
    assert_eq!(back.index_kind(), Some(IndexKind::Chronological));
    assert_eq!(back.labels(), vec!["EURUSD", "GBPUSD"]);
    assert!(back.value(1, 0).unwrap().is_nan());
    assert_eq!(back.value(0, 1), Some(1.27));
}

#[test]
fn json_writes_nulls_for_gaps() {
    let dir = tempdir().unwrap();
    let p = dir.path().join("fx.json");
    save_json(&sample(), &p).unwrap();

    let v: serde_json::Value = serde_json::from_str(&fs::read_to_string(&p).unwrap()).unwrap();
    assert_eq!(v["index"][0], "2024-01-31");
    assert!(v["series"][0]["values"][1].is_null());

    let back = load_json(&p).unwrap();
    assert_eq!(back.index(), sample().index());
    assert_eq!(back.series_count(), 2);
}

#[test]
fn csv_needs_a_value_column() {
    let dir = tempdir().unwrap();
    let p = dir.path().join("only_index.csv");
    fs::write(&p, "date\n2024-01-01\n").unwrap();
    assert!(load_csv(&p).is_err());
}

#[test]
fn unsorted_time_index_is_rejected() {
    let dir = tempdir().unwrap();
    let p = dir.path().join("unsorted.csv");
    fs::write(&p, "date,v\n2024-01-02,1\n2024-01-01,2\n").unwrap();
    let err = load_csv(&p).unwrap_err().to_string();
    assert!(err.contains("sorted"), "{err}");
}

#[test]
fn labels_and_numbers_become_their_index_kinds() {
    let dir = tempdir().unwrap();
    let p = dir.path().join("k.csv");
    fs::write(&p, "state,v\nCA,1\nTX,2\n").unwrap();
    assert_eq!(load_csv(&p).unwrap().index_kind(), Some(IndexKind::Categorical));
    fs::write(&p, "x,v\n0.5,1\n1.5,2\n").unwrap();
    assert_eq!(load_csv(&p).unwrap().index_kind(), Some(IndexKind::Numeric));
}
