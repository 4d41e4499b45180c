//! unichart
//!
//! Describe a chart once (a dataset, a chart kind and a [`Style`]) and render
//! it through any of several engines, or compose rendered charts, tables and
//! text into an HTML dashboard.
//!
//! ### Pipeline
//! - [`chart_type::resolve`] reconciles call-level and style-level chart kinds
//! - [`color::resolve`] assigns one color (or "engine palette") per series
//! - [`axis::plan`] picks the x-axis layout and tick rules
//! - [`plan::resolve_plan`] bundles the above into one [`ResolvedPlan`]
//! - an [`Engine`] draws the plan and reports per-series failures
//!
//! ### Example
//! ```no_run
//! use unichart::{Chart, ChartKind, Dataset, IndexKey, Style};
//!
//! let data = Dataset::from_columns(
//!     vec![IndexKey::from("Q1"), IndexKey::from("Q2"), IndexKey::from("Q3")],
//!     vec![("revenue", vec![3.0, 4.5, 5.1]), ("costs", vec![2.0, 2.4, 2.2])],
//! )?;
//! let mut chart = Chart::new()
//!     .with_data(data)
//!     .with_engine("bokeh")
//!     .with_chart_type(ChartKind::Bar)
//!     .with_style(Style::default().with_title("Quarterly"));
//! let outcome = chart.render()?;
//! println!("{:?}", outcome.output_path());
//! # Ok::<(), unichart::ChartError>(())
//! ```

pub mod axis;
pub mod canvas;
pub mod chart;
pub mod chart_type;
pub mod color;
pub mod constants;
pub mod engine;
pub mod error;
pub mod models;
pub mod plan;
pub mod storage;
pub mod style;

pub use canvas::{Canvas, CanvasTemplate, Element};
pub use chart::Chart;
pub use chart_type::{ChartKind, ChartTypeSpec};
pub use color::{ColorSpec, Rgba};
pub use engine::{Engine, EngineKind, EngineSelector, RenderOutcome};
pub use error::{ChartError, Result};
pub use models::{Dataset, IndexKey, PlotData, Series};
pub use plan::ResolvedPlan;
pub use style::Style;
