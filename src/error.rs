//! Error kinds surfaced by resolution and dispatch.
//!
//! Drawing problems inside an engine are *not* errors at this level: they are
//! collected as [`crate::engine::DrawFailure`] entries on the render outcome so
//! that one broken series never aborts its siblings.

#[derive(Debug, thiserror::Error)]
pub enum ChartError {
    #[error("unknown engine: {name} (expected one of matplotlib, bokeh, plotly, bqplot, vispy)")]
    UnknownEngine { name: String },

    #[error("unknown chart kind: {name}")]
    UnknownChartKind { name: String },

    #[error("per-series chart type list has {got} entries but the dataset has {expected} series")]
    ChartTypeCount { expected: usize, got: usize },

    #[error("{kind} consumes the whole dataset and cannot be combined with other chart kinds")]
    MixedMatrix { kind: String },

    #[error("no data to plot")]
    EmptyDataset,

    #[error("invalid dataset: {0}")]
    InvalidDataset(String),

    #[error("{engine} does not support {what}")]
    Unsupported { engine: String, what: String },

    #[error("unknown dashboard template: {name} (expected plain or keen)")]
    UnknownTemplate { name: String },

    #[error("style overrides were already installed for this process")]
    OverridesInstalled,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, ChartError>;
