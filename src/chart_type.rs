//! Effective chart kind per series, and the layout facts derived from it.

use crate::error::{ChartError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Chart kinds understood by the dispatch layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Line,
    /// Grouped vertical bars, one slot per bar series.
    Bar,
    /// Grouped horizontal bars.
    Barh,
    /// Bars accumulated in a single slot.
    Stacked,
    Scatter,
    /// Whole dataset as one value grid.
    Heatmap,
    /// Whole dataset as one value grid, drawn as a 3D surface where supported.
    Surface,
    Choropleth,
    Bubble,
}

impl ChartKind {
    pub const ALL: [ChartKind; 9] = [
        ChartKind::Line,
        ChartKind::Bar,
        ChartKind::Barh,
        ChartKind::Stacked,
        ChartKind::Scatter,
        ChartKind::Heatmap,
        ChartKind::Surface,
        ChartKind::Choropleth,
        ChartKind::Bubble,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ChartKind::Line => "line",
            ChartKind::Bar => "bar",
            ChartKind::Barh => "barh",
            ChartKind::Stacked => "stacked",
            ChartKind::Scatter => "scatter",
            ChartKind::Heatmap => "heatmap",
            ChartKind::Surface => "surface",
            ChartKind::Choropleth => "choropleth",
            ChartKind::Bubble => "bubble",
        }
    }

    pub fn is_bar_family(self) -> bool {
        matches!(self, ChartKind::Bar | ChartKind::Barh | ChartKind::Stacked)
    }

    /// Kinds that get their own slot inside a category group.
    pub fn takes_bar_slot(self) -> bool {
        matches!(self, ChartKind::Bar | ChartKind::Barh)
    }

    pub fn is_matrix(self) -> bool {
        matches!(self, ChartKind::Heatmap | ChartKind::Surface)
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartKind {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_ascii_lowercase();
        ChartKind::ALL
            .into_iter()
            .find(|k| k.as_str() == lower)
            .ok_or(ChartError::UnknownChartKind { name: s.to_string() })
    }
}

/// A chart type as configured: one kind for every series, or one per series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChartTypeSpec {
    Single(ChartKind),
    PerSeries(Vec<ChartKind>),
}

impl Default for ChartTypeSpec {
    fn default() -> Self {
        ChartTypeSpec::Single(ChartKind::Line)
    }
}

impl From<ChartKind> for ChartTypeSpec {
    fn from(k: ChartKind) -> Self {
        ChartTypeSpec::Single(k)
    }
}

impl From<Vec<ChartKind>> for ChartTypeSpec {
    fn from(v: Vec<ChartKind>) -> Self {
        ChartTypeSpec::PerSeries(v)
    }
}

/// `"bar"` parses to a single kind; `"bar,line"` to a per-series list.
impl FromStr for ChartTypeSpec {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self> {
        let kinds = s
            .split([',', ';'])
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(ChartKind::from_str)
            .collect::<Result<Vec<_>>>()?;
        match kinds.as_slice() {
            [] => Err(ChartError::UnknownChartKind { name: s.to_string() }),
            [one] => Ok(ChartTypeSpec::Single(*one)),
            _ => Ok(ChartTypeSpec::PerSeries(kinds)),
        }
    }
}

/// Per-series kinds plus aggregate layout facts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedChartTypes {
    pub kinds: Vec<ChartKind>,
    /// Any series is `bar`, `barh` or `stacked`: categorical x-axis.
    pub is_bar_family: bool,
    /// Slots sharing one category width. `0` when not a bar-family chart.
    pub bar_slot_count: usize,
    /// `heatmap`/`surface`: the dataset is consumed as one grid.
    pub is_matrix: bool,
}

impl ResolvedChartTypes {
    pub fn kind(&self, series: usize) -> Option<ChartKind> {
        self.kinds.get(series).copied()
    }

    /// Slot of a bar series inside its category group. Stacked series all
    /// share slot 0; non-bar series have no slot.
    pub fn slot_index(&self, series: usize) -> Option<usize> {
        let kind = self.kind(series)?;
        if kind == ChartKind::Stacked {
            return Some(0);
        }
        if !kind.takes_bar_slot() {
            return None;
        }
        Some(
            self.kinds[..series]
                .iter()
                .filter(|k| k.takes_bar_slot())
                .count(),
        )
    }
}

/// Reconcile the call-level chart type with the style-level one.
///
/// `style_chart_type`, when set, wins at both the scalar and the list level.
/// A per-series list must name exactly one kind per series, and matrix kinds
/// cannot share a chart with anything else.
pub fn resolve(
    series_count: usize,
    chart_type: &ChartTypeSpec,
    style_chart_type: Option<&ChartTypeSpec>,
) -> Result<ResolvedChartTypes> {
    let effective = style_chart_type.unwrap_or(chart_type);

    let kinds = match effective {
        ChartTypeSpec::Single(k) => vec![*k; series_count],
        ChartTypeSpec::PerSeries(list) => {
            if list.len() != series_count {
                return Err(ChartError::ChartTypeCount {
                    expected: series_count,
                    got: list.len(),
                });
            }
            list.clone()
        }
    };

    if let Some(matrix) = kinds.iter().find(|k| k.is_matrix())
        && kinds.iter().any(|k| k != matrix)
    {
        return Err(ChartError::MixedMatrix {
            kind: matrix.to_string(),
        });
    }

    let is_bar_family = kinds.iter().any(|k| k.is_bar_family());
    let slotted = kinds.iter().filter(|k| k.takes_bar_slot()).count();
    let bar_slot_count = if slotted > 0 {
        slotted
    } else if is_bar_family {
        1
    } else {
        0
    };
    let is_matrix = kinds.iter().any(|k| k.is_matrix());

    log::debug!(
        "resolved chart types {:?} (bar family: {is_bar_family}, slots: {bar_slot_count}, matrix: {is_matrix})",
        kinds
    );

    Ok(ResolvedChartTypes {
        kinds,
        is_bar_family,
        bar_slot_count,
        is_matrix,
    })
}
