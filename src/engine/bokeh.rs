//! SVG figures wrapped in a standalone HTML page.

use super::draw::draw_plan;
use super::matplotlib::ensure_parent;
use super::{Artifact, Engine, RenderOutcome, default_palette, html_escape};
use crate::error::Result;
use crate::plan::ResolvedPlan;
use crate::style::Style;
use plotters::prelude::*;
use plotters_svg::SVGBackend;
use std::fs;

pub struct Bokeh;

/// Plot modes that return the page instead of writing it.
const IN_MEMORY_MODES: [&str; 1] = ["offline_jupyter"];

impl Engine for Bokeh {
    fn name(&self) -> &str {
        "bokeh"
    }

    fn plot_chart(&self, plan: &ResolvedPlan, style: &Style) -> Result<RenderOutcome> {
        let (w, h) = (plan.layout.width_px, plan.layout.height_px);
        let palette = default_palette(self.name());

        let mut svg = String::new();
        let report = {
            let root = SVGBackend::with_string(&mut svg, (w, h)).into_drawing_area();
            draw_plan(root, plan, style, &palette, &|_| true)
        };

        let html = page(&plan.layout.title, &svg);
        let artifact = if IN_MEMORY_MODES.contains(&style.bokeh_plot_mode.as_str()) {
            Artifact::Page { html }
        } else {
            let path = plan.outputs.html_or_default(self.name());
            ensure_parent(&path)?;
            fs::write(&path, html)?;
            log::info!("bokeh: wrote {}", path.display());
            Artifact::File { path }
        };

        Ok(RenderOutcome {
            engine: self.name().to_string(),
            artifact: Some(artifact),
            drawn: report.drawn,
            failures: report.failures,
        })
    }
}

fn page(title: &str, svg: &str) -> String {
    let title = if title.trim().is_empty() { "chart" } else { title };
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{}</title>\n</head>\n<body style=\"margin:0\">\n{svg}\n</body>\n</html>\n",
        html_escape(title)
    )
}
