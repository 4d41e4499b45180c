//! Static raster figures through `plotters-bitmap`.

use super::draw::{DrawReport, draw_plan};
use super::{Artifact, Engine, RenderOutcome, default_palette};
use crate::chart_type::ChartKind;
use crate::color::Rgba;
use crate::error::Result;
use crate::plan::ResolvedPlan;
use crate::style::Style;
use plotters::prelude::*;
use plotters_bitmap::BitMapBackend;
use std::fs;
use std::path::Path;

pub struct Matplotlib;

impl Engine for Matplotlib {
    fn name(&self) -> &str {
        "matplotlib"
    }

    fn plot_chart(&self, plan: &ResolvedPlan, style: &Style) -> Result<RenderOutcome> {
        render_raster(self.name(), plan, style, &default_palette(self.name()), &|_| true)
    }
}

pub(crate) fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Draw to a PNG at `file_output` (or `<engine>.png`). Without `save_fig`
/// the figure is drawn into memory only and no artifact is produced.
pub(crate) fn render_raster(
    engine: &str,
    plan: &ResolvedPlan,
    style: &Style,
    palette: &[Rgba],
    accept: &dyn Fn(ChartKind) -> bool,
) -> Result<RenderOutcome> {
    let (w, h) = (plan.layout.width_px, plan.layout.height_px);
    let mut outcome = RenderOutcome::empty(engine);

    let report: DrawReport = if plan.outputs.save_fig {
        let path = plan.outputs.file_or_default(engine);
        ensure_parent(&path)?;
        let report = {
            let root = BitMapBackend::new(&path, (w, h)).into_drawing_area();
            draw_plan(root, plan, style, palette, accept)
        };
        if path.exists() {
            log::info!("{engine}: wrote {}", path.display());
            outcome.artifact = Some(Artifact::File { path });
        }
        report
    } else {
        let mut buffer = vec![0u8; (w as usize) * (h as usize) * 3];
        let root = BitMapBackend::with_buffer(&mut buffer, (w, h)).into_drawing_area();
        draw_plan(root, plan, style, palette, accept)
    };

    outcome.drawn = report.drawn;
    outcome.failures = report.failures;
    Ok(outcome)
}
