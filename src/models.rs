use crate::error::{ChartError, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One key of a dataset index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum IndexKey {
    /// Calendar timestamp (dates are stored at midnight).
    Timestamp(NaiveDateTime),
    /// Clock time without a date.
    TimeOfDay(NaiveTime),
    /// Plain numeric key.
    Number(f64),
    /// Categorical label.
    Label(String),
}

/// The axis domain an index belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexKind {
    Chronological,
    TimeOfDay,
    Numeric,
    Categorical,
}

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

impl IndexKey {
    /// Parse a raw cell: timestamps first, then dates, clock times, numbers,
    /// falling back to a categorical label.
    pub fn parse(raw: &str) -> Self {
        let s = raw.trim();
        for fmt in DATETIME_FORMATS {
            if let Ok(ts) = NaiveDateTime::parse_from_str(s, fmt) {
                return IndexKey::Timestamp(ts);
            }
        }
        if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return IndexKey::Timestamp(d.and_time(NaiveTime::MIN));
        }
        for fmt in ["%H:%M:%S%.f", "%H:%M"] {
            if let Ok(t) = NaiveTime::parse_from_str(s, fmt) {
                return IndexKey::TimeOfDay(t);
            }
        }
        match s.parse::<f64>() {
            Ok(v) if v.is_finite() => IndexKey::Number(v),
            _ => IndexKey::Label(s.to_string()),
        }
    }

    pub fn kind(&self) -> IndexKind {
        match self {
            IndexKey::Timestamp(_) => IndexKind::Chronological,
            IndexKey::TimeOfDay(_) => IndexKind::TimeOfDay,
            IndexKey::Number(_) => IndexKind::Numeric,
            IndexKey::Label(_) => IndexKind::Categorical,
        }
    }

    /// Position on a continuous axis: Unix seconds for timestamps, seconds
    /// after midnight for clock times. Labels have no continuous position.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            IndexKey::Timestamp(ts) => Some(ts.and_utc().timestamp() as f64),
            IndexKey::TimeOfDay(t) => {
                Some(t.signed_duration_since(NaiveTime::MIN).num_milliseconds() as f64 / 1000.0)
            }
            IndexKey::Number(v) => Some(*v),
            IndexKey::Label(_) => None,
        }
    }
}

impl fmt::Display for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexKey::Timestamp(ts) => {
                if ts.time() == NaiveTime::MIN {
                    write!(f, "{}", ts.format("%Y-%m-%d"))
                } else {
                    write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S"))
                }
            }
            IndexKey::TimeOfDay(t) => write!(f, "{}", t.format("%H:%M:%S")),
            IndexKey::Number(v) => write!(f, "{v}"),
            IndexKey::Label(s) => f.write_str(s),
        }
    }
}

impl From<NaiveDateTime> for IndexKey {
    fn from(ts: NaiveDateTime) -> Self {
        IndexKey::Timestamp(ts)
    }
}

impl From<NaiveDate> for IndexKey {
    fn from(d: NaiveDate) -> Self {
        IndexKey::Timestamp(d.and_time(NaiveTime::MIN))
    }
}

impl From<f64> for IndexKey {
    fn from(v: f64) -> Self {
        IndexKey::Number(v)
    }
}

impl From<&str> for IndexKey {
    fn from(s: &str) -> Self {
        IndexKey::Label(s.to_string())
    }
}

/// A named column of values sharing the dataset index. `NaN` marks a gap.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub values: Vec<f64>,
}

impl Series {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// Tabular input: one index, many named series.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    index: Vec<IndexKey>,
    series: Vec<Series>,
}

impl Dataset {
    /// Build a dataset, checking that every series matches the index length,
    /// that the index uses a single key kind, and that time indices are sorted.
    pub fn new(index: Vec<IndexKey>, series: Vec<Series>) -> Result<Self> {
        if let Some(first) = index.first() {
            let kind = first.kind();
            if let Some(bad) = index.iter().find(|k| k.kind() != kind) {
                return Err(ChartError::InvalidDataset(format!(
                    "index mixes {kind:?} keys with {bad}"
                )));
            }
            if matches!(kind, IndexKind::Chronological | IndexKind::TimeOfDay) {
                let sorted = index.windows(2).all(|w| match (&w[0], &w[1]) {
                    (IndexKey::Timestamp(a), IndexKey::Timestamp(b)) => a <= b,
                    (IndexKey::TimeOfDay(a), IndexKey::TimeOfDay(b)) => a <= b,
                    _ => true,
                });
                if !sorted {
                    return Err(ChartError::InvalidDataset(
                        "time index must be sorted in ascending order".into(),
                    ));
                }
            }
        }
        for s in &series {
            if s.values.len() != index.len() {
                return Err(ChartError::InvalidDataset(format!(
                    "series '{}' has {} values but the index has {} keys",
                    s.name,
                    s.values.len(),
                    index.len()
                )));
            }
        }
        Ok(Self { index, series })
    }

    /// Convenience constructor from `(name, values)` pairs.
    pub fn from_columns<S: Into<String>>(
        index: Vec<IndexKey>,
        columns: Vec<(S, Vec<f64>)>,
    ) -> Result<Self> {
        let series = columns
            .into_iter()
            .map(|(name, values)| Series::new(name, values))
            .collect();
        Self::new(index, series)
    }

    pub fn index(&self) -> &[IndexKey] {
        &self.index
    }

    pub fn series(&self) -> &[Series] {
        &self.series
    }

    pub fn index_kind(&self) -> Option<IndexKind> {
        self.index.first().map(IndexKey::kind)
    }

    /// Series names in column order.
    pub fn labels(&self) -> Vec<String> {
        self.series.iter().map(|s| s.name.clone()).collect()
    }

    /// Number of index keys (rows).
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty() || self.series.is_empty()
    }

    pub fn series_count(&self) -> usize {
        self.series.len()
    }

    pub fn value(&self, row: usize, col: usize) -> Option<f64> {
        self.series.get(col).and_then(|s| s.values.get(row)).copied()
    }

    /// A single-series dataset over the same index (used for subplot panels).
    pub fn column(&self, col: usize) -> Option<Dataset> {
        self.series.get(col).map(|s| Dataset {
            index: self.index.clone(),
            series: vec![s.clone()],
        })
    }

    /// Finite min/max across every series, if any value is finite.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        let mut it = self
            .series
            .iter()
            .flat_map(|s| s.values.iter().copied())
            .filter(|v| v.is_finite());
        let first = it.next()?;
        Some(it.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }
}

/// What a chart is drawn from: one dataset, or explicit panels (one subplot each).
#[derive(Debug, Clone, PartialEq)]
pub enum PlotData {
    Single(Dataset),
    Panels(Vec<Dataset>),
}

impl From<Dataset> for PlotData {
    fn from(d: Dataset) -> Self {
        PlotData::Single(d)
    }
}

impl From<Vec<Dataset>> for PlotData {
    fn from(v: Vec<Dataset>) -> Self {
        PlotData::Panels(v)
    }
}
