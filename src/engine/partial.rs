//! Engines with partial support.

use super::matplotlib::render_raster;
use super::{DrawFailure, Engine, RenderOutcome, default_palette};
use crate::chart_type::ChartKind;
use crate::error::Result;
use crate::plan::ResolvedPlan;
use crate::style::Style;

/// Accepts any plan and draws nothing.
pub struct Bqplot;

impl Engine for Bqplot {
    fn name(&self) -> &str {
        "bqplot"
    }

    fn plot_chart(&self, plan: &ResolvedPlan, _style: &Style) -> Result<RenderOutcome> {
        log::warn!(
            "bqplot draws nothing; {} series not rendered",
            plan.series_count()
        );
        let mut outcome = RenderOutcome::empty(self.name());
        outcome
            .failures
            .push(DrawFailure::chart("bqplot does not draw charts"));
        Ok(outcome)
    }
}

/// Line series only, drawn through the raster path.
pub struct Vispy;

impl Engine for Vispy {
    fn name(&self) -> &str {
        "vispy"
    }

    fn plot_chart(&self, plan: &ResolvedPlan, style: &Style) -> Result<RenderOutcome> {
        render_raster(
            self.name(),
            plan,
            style,
            &default_palette(self.name()),
            &|kind| kind == ChartKind::Line,
        )
    }
}
