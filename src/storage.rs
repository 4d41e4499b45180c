use crate::error::{ChartError, Result};
use crate::models::{Dataset, IndexKey, Series};
use csv::{ReaderBuilder, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Load a wide CSV: the first column is the index, every other column a
/// series named by its header. Empty cells become `NaN`.
pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<Dataset> {
    let mut rdr = ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?;
    let headers = rdr.headers()?.clone();
    if headers.len() < 2 {
        return Err(ChartError::InvalidDataset(
            "CSV needs an index column and at least one value column".into(),
        ));
    }
    let names: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();
    let mut index = Vec::new();
    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); names.len()];

    for (row, record) in rdr.records().enumerate() {
        let record = record?;
        index.push(IndexKey::parse(record.get(0).unwrap_or_default()));
        for (col, values) in columns.iter_mut().enumerate() {
            let cell = record.get(col + 1).unwrap_or_default();
            let v = if cell.is_empty() {
                f64::NAN
            } else {
                cell.parse::<f64>().map_err(|_| {
                    ChartError::InvalidDataset(format!(
                        "row {}, column '{}': '{cell}' is not a number",
                        row + 1,
                        names[col]
                    ))
                })?
            };
            values.push(v);
        }
    }

    let series = names
        .into_iter()
        .zip(columns)
        .map(|(name, values)| Series::new(name, values))
        .collect();
    Dataset::new(index, series)
}

/// Save a dataset as a wide CSV with an `index` header; gaps are empty cells.
pub fn save_csv<P: AsRef<Path>>(data: &Dataset, path: P) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_path(path)?;
    let mut header = vec!["index".to_string()];
    header.extend(data.labels());
    wtr.write_record(&header)?;
    for (row, key) in data.index().iter().enumerate() {
        let mut record = vec![key.to_string()];
        for s in data.series() {
            let v = s.values[row];
            record.push(if v.is_finite() { v.to_string() } else { String::new() });
        }
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

#[derive(Serialize, Deserialize)]
struct JsonSeries {
    name: String,
    values: Vec<Option<f64>>,
}

#[derive(Serialize, Deserialize)]
struct JsonDataset {
    index: Vec<String>,
    series: Vec<JsonSeries>,
}

/// Save a dataset as pretty JSON; gaps become `null`.
pub fn save_json<P: AsRef<Path>>(data: &Dataset, path: P) -> Result<()> {
    let doc = JsonDataset {
        index: data.index().iter().map(ToString::to_string).collect(),
        series: data
            .series()
            .iter()
            .map(|s| JsonSeries {
                name: s.name.clone(),
                values: s.values.iter().map(|v| v.is_finite().then_some(*v)).collect(),
            })
            .collect(),
    };
    let mut f = File::create(path)?;
    let s = serde_json::to_string_pretty(&doc)?;
    f.write_all(s.as_bytes())?;
    Ok(())
}

/// Load a dataset written by [`save_json`].
pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Dataset> {
    let txt = std::fs::read_to_string(path)?;
    let doc: JsonDataset = serde_json::from_str(&txt)?;
    let index = doc.index.iter().map(|k| IndexKey::parse(k)).collect();
    let series = doc
        .series
        .into_iter()
        .map(|s| {
            Series::new(
                s.name,
                s.values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect(),
            )
        })
        .collect();
    Dataset::new(index, series)
}
