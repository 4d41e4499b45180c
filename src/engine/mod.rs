//! Rendering engines.
//!
//! Every engine consumes the same [`ResolvedPlan`]. Names are matched
//! case-insensitively against a closed set:
//!
//! - `matplotlib`: static raster figure (PNG)
//! - `bokeh`: SVG figure inside a standalone HTML page
//! - `plotly`: plotly.js figure JSON inside an HTML page
//! - `bqplot`: accepts the plan and draws nothing
//! - `vispy`: line series only, through the raster path
//!
//! Drawing problems are not errors: each one is recorded as a
//! [`DrawFailure`] and the remaining series are still drawn.

mod bokeh;
mod draw;
mod fonts;
mod matplotlib;
mod partial;
mod plotly;

pub use bokeh::Bokeh;
pub use fonts::fonts_available;
pub use matplotlib::Matplotlib;
pub use partial::{Bqplot, Vispy};
pub use plotly::Plotly;

use crate::color::{Rgba, parse_rgba};
use crate::error::{ChartError, Result};
use crate::plan::ResolvedPlan;
use crate::style::Style;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// A rendering backend.
pub trait Engine {
    /// Name used for palettes, size correction and generated file names.
    fn name(&self) -> &str;

    /// Draw a resolved plan. Only I/O problems on the final artifact are
    /// returned as errors; drawing problems go into the outcome.
    fn plot_chart(&self, plan: &ResolvedPlan, style: &Style) -> Result<RenderOutcome>;
}

/// The built-in engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    Matplotlib,
    Bokeh,
    Plotly,
    Bqplot,
    Vispy,
}

impl EngineKind {
    pub const ALL: [EngineKind; 5] = [
        EngineKind::Matplotlib,
        EngineKind::Bokeh,
        EngineKind::Plotly,
        EngineKind::Bqplot,
        EngineKind::Vispy,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EngineKind::Matplotlib => "matplotlib",
            EngineKind::Bokeh => "bokeh",
            EngineKind::Plotly => "plotly",
            EngineKind::Bqplot => "bqplot",
            EngineKind::Vispy => "vispy",
        }
    }

    pub fn engine(self) -> Box<dyn Engine> {
        match self {
            EngineKind::Matplotlib => Box::new(Matplotlib),
            EngineKind::Bokeh => Box::new(Bokeh),
            EngineKind::Plotly => Box::new(Plotly),
            EngineKind::Bqplot => Box::new(Bqplot),
            EngineKind::Vispy => Box::new(Vispy),
        }
    }

    /// Whether the dashboard should embed `file_output` (static image)
    /// rather than `html_file_output`.
    pub fn embeds_static_file(self) -> bool {
        matches!(self, EngineKind::Matplotlib | EngineKind::Vispy)
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EngineKind {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_ascii_lowercase();
        EngineKind::ALL
            .into_iter()
            .find(|k| k.as_str() == lower)
            .ok_or_else(|| ChartError::UnknownEngine { name: s.to_string() })
    }
}

/// An engine picked by name or supplied as an object.
pub enum EngineSelector {
    Name(String),
    Custom(Box<dyn Engine>),
}

impl EngineSelector {
    /// The built-in engine for a name, or the custom engine itself.
    pub fn resolve(&self) -> Result<ResolvedEngine<'_>> {
        match self {
            EngineSelector::Name(name) => {
                let kind: EngineKind = name.parse()?;
                Ok(ResolvedEngine::Builtin(kind, kind.engine()))
            }
            EngineSelector::Custom(engine) => Ok(ResolvedEngine::Custom(engine.as_ref())),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            EngineSelector::Name(n) => n,
            EngineSelector::Custom(e) => e.name(),
        }
    }
}

impl fmt::Debug for EngineSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineSelector::Name(n) => f.debug_tuple("Name").field(n).finish(),
            EngineSelector::Custom(e) => f.debug_tuple("Custom").field(&e.name()).finish(),
        }
    }
}

impl From<&str> for EngineSelector {
    fn from(s: &str) -> Self {
        EngineSelector::Name(s.to_string())
    }
}

impl From<String> for EngineSelector {
    fn from(s: String) -> Self {
        EngineSelector::Name(s)
    }
}

impl From<EngineKind> for EngineSelector {
    fn from(k: EngineKind) -> Self {
        EngineSelector::Name(k.as_str().to_string())
    }
}

impl From<Box<dyn Engine>> for EngineSelector {
    fn from(e: Box<dyn Engine>) -> Self {
        EngineSelector::Custom(e)
    }
}

/// A selector after name lookup.
pub enum ResolvedEngine<'a> {
    Builtin(EngineKind, Box<dyn Engine>),
    Custom(&'a dyn Engine),
}

impl ResolvedEngine<'_> {
    pub fn get(&self) -> &dyn Engine {
        match self {
            ResolvedEngine::Builtin(_, e) => e.as_ref(),
            ResolvedEngine::Custom(e) => *e,
        }
    }

    pub fn kind(&self) -> Option<EngineKind> {
        match self {
            ResolvedEngine::Builtin(k, _) => Some(*k),
            ResolvedEngine::Custom(_) => None,
        }
    }
}

/// One drawing call that could not be completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrawFailure {
    /// Series label, or `None` for chart-level elements (axes, titles, files).
    pub series: Option<String>,
    pub message: String,
}

impl DrawFailure {
    pub fn series(label: impl Into<String>, message: impl fmt::Display) -> Self {
        Self {
            series: Some(label.into()),
            message: message.to_string(),
        }
    }

    pub fn chart(message: impl fmt::Display) -> Self {
        Self {
            series: None,
            message: message.to_string(),
        }
    }
}

impl fmt::Display for DrawFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.series {
            Some(s) => write!(f, "series '{s}': {}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// What a render produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Artifact {
    File { path: PathBuf },
    /// A complete HTML page kept in memory.
    Page { html: String },
    Figure {
        figure: serde_json::Value,
        path: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderOutcome {
    pub engine: String,
    pub artifact: Option<Artifact>,
    /// Labels of the series that were drawn, in drawing order.
    pub drawn: Vec<String>,
    pub failures: Vec<DrawFailure>,
}

impl RenderOutcome {
    pub fn empty(engine: &str) -> Self {
        Self {
            engine: engine.to_string(),
            artifact: None,
            drawn: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// File written by the engine, if any.
    pub fn output_path(&self) -> Option<&Path> {
        match &self.artifact {
            Some(Artifact::File { path }) => Some(path),
            Some(Artifact::Figure { path, .. }) => path.as_deref(),
            Some(Artifact::Page { .. }) | None => None,
        }
    }

    /// Page held in memory by engines that were told not to write one.
    pub fn page(&self) -> Option<&str> {
        match &self.artifact {
            Some(Artifact::Page { html }) => Some(html),
            _ => None,
        }
    }

    pub fn figure(&self) -> Option<&serde_json::Value> {
        match &self.artifact {
            Some(Artifact::Figure { figure, .. }) => Some(figure),
            _ => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed_series(&self) -> Vec<&str> {
        self.failures
            .iter()
            .filter_map(|f| f.series.as_deref())
            .collect()
    }
}

/// Escape text for HTML element content and attribute values.
pub(crate) fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Parsed default palette for a built-in engine.
pub fn default_palette(engine: &str) -> Vec<Rgba> {
    let cc = crate::constants::constants();
    let specs = match engine {
        "bokeh" => &cc.bokeh_palette,
        "plotly" => &cc.plotly_palette,
        _ => &cc.matplotlib_palette,
    };
    let parsed: Vec<Rgba> = specs.iter().filter_map(|s| parse_rgba(s)).collect();
    if parsed.is_empty() {
        vec![Rgba::opaque(0x77, 0x77, 0x77)]
    } else {
        parsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_case_insensitive() {
        assert_eq!("Plotly".parse::<EngineKind>().unwrap(), EngineKind::Plotly);
        assert_eq!(" BOKEH ".parse::<EngineKind>().unwrap(), EngineKind::Bokeh);
    }

    #[test]
    fn unknown_name_is_an_error() {
        let sel = EngineSelector::from("gnuplot");
        assert!(matches!(
            sel.resolve(),
            Err(ChartError::UnknownEngine { name }) if name == "gnuplot"
        ));
    }

    #[test]
    fn palettes_parse() {
        assert_eq!(default_palette("bokeh").len(), 8);
        assert_eq!(default_palette("custom")[0], Rgba::opaque(0xE2, 0x4A, 0x33));
    }
}
