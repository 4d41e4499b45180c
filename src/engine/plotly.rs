//! plotly.js figures: the figure is built as JSON and embedded in an HTML
//! page that loads plotly.js.

use super::matplotlib::ensure_parent;
use super::{Artifact, DrawFailure, Engine, RenderOutcome, html_escape};
use crate::axis::{AxisPlan, TickStep};
use crate::chart_type::ChartKind;
use crate::color::{ColorSpec, Colormap};
use crate::constants::constants;
use crate::error::Result;
use crate::models::IndexKey;
use crate::plan::{AxisSide, LegendLoc, Panel, ResolvedPlan, SeriesDraw};
use crate::style::Style;
use serde_json::{Map, Value, json};
use std::fs;

pub struct Plotly;

/// Colorscale used for choropleths when the style names no colors.
const CHOROPLETH_SCALE: [(f64, &str); 6] = [
    (0.0, "rgb(242,240,247)"),
    (0.2, "rgb(218,218,235)"),
    (0.4, "rgb(188,189,220)"),
    (0.6, "rgb(158,154,200)"),
    (0.8, "rgb(117,107,177)"),
    (1.0, "rgb(84,39,143)"),
];

/// Plot modes that stay in memory instead of writing a page.
const IN_MEMORY_MODES: [&str; 2] = ["offline_jupyter", "dash"];

impl Engine for Plotly {
    fn name(&self) -> &str {
        "plotly"
    }

    fn plot_chart(&self, plan: &ResolvedPlan, style: &Style) -> Result<RenderOutcome> {
        let mut builder = FigureBuilder::new(plan, style);
        for (p, panel) in plan.panels.iter().enumerate() {
            builder.add_panel(p, panel);
        }
        let (figure, drawn, failures) = builder.finish();

        let path = if IN_MEMORY_MODES.contains(&style.plotly_plot_mode.as_str()) {
            None
        } else {
            let path = plan.outputs.html_or_default(self.name());
            ensure_parent(&path)?;
            fs::write(&path, page(plan, &figure)?)?;
            log::info!("plotly: wrote {}", path.display());
            Some(path)
        };

        Ok(RenderOutcome {
            engine: self.name().to_string(),
            artifact: Some(Artifact::Figure { figure, path }),
            drawn,
            failures,
        })
    }
}

fn page(plan: &ResolvedPlan, figure: &Value) -> Result<String> {
    let title = if plan.layout.title.trim().is_empty() {
        "chart"
    } else {
        plan.layout.title.as_str()
    };
    // Keep the JSON from closing the script element early.
    let fig = serde_json::to_string(figure)?.replace("</", "<\\/");
    Ok(format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n<script src=\"{src}\"></script>\n</head>\n<body style=\"margin:0\">\n\
         <div id=\"unichart-plot\" style=\"width:{w}px;height:{h}px;\"></div>\n\
         <script>\nconst fig = {fig};\n\
         Plotly.newPlot(\"unichart-plot\", fig.data, fig.layout, {{responsive: true}});\n\
         </script>\n</body>\n</html>\n",
        title = html_escape(title),
        src = html_escape(&constants().plotly_js_url),
        w = plan.layout.width_px,
        h = plan.layout.height_px,
    ))
}

/// plotly `dtick` for a calendar step: month counts as `"M<n>"`, shorter
/// steps in milliseconds.
fn dtick(step: TickStep) -> Value {
    match step {
        TickStep::Months(n) => json!(format!("M{n}")),
        TickStep::Years(n) => json!(format!("M{}", 12 * n)),
        other => json!(other.approx_millis()),
    }
}

/// Tick placement from the axis plan.
fn tick_settings(axis: &AxisPlan) -> Map<String, Value> {
    let mut out = Map::new();
    match axis {
        AxisPlan::Time {
            start,
            end,
            major,
            minor,
            format,
        } => {
            if let Some(first) = major.ticks(*start, *end).first() {
                out.insert("tick0".into(), key_value(&IndexKey::Timestamp(*first)));
            }
            out.insert("dtick".into(), dtick(*major));
            out.insert("tickformat".into(), json!(format));
            if let Some(m) = minor {
                out.insert("minor".into(), json!({ "dtick": dtick(*m), "showgrid": true }));
            }
        }
        AxisPlan::Numeric { major, minor, .. } if *major > 0.0 => {
            out.insert("tick0".into(), json!(0.0));
            out.insert("dtick".into(), json!(major));
            out.insert("minor".into(), json!({ "dtick": minor, "showgrid": true }));
        }
        _ => {}
    }
    out
}

fn key_value(key: &IndexKey) -> Value {
    match key {
        IndexKey::Timestamp(t) => json!(t.format("%Y-%m-%d %H:%M:%S").to_string()),
        IndexKey::TimeOfDay(t) => json!(t.format("%H:%M:%S").to_string()),
        IndexKey::Number(v) => number(*v),
        IndexKey::Label(s) => json!(s),
    }
}

/// `NaN` becomes `null`, which plotly draws as a gap.
fn number(v: f64) -> Value {
    if v.is_finite() { json!(v) } else { Value::Null }
}

fn numbers(values: &[f64]) -> Value {
    Value::Array(values.iter().map(|v| number(*v)).collect())
}

fn colorscale(style: &Style) -> Value {
    let cmap = match &style.color {
        ColorSpec::Colormap(name) => Colormap::by_name(name),
        ColorSpec::List(_) => None,
    }
    .or_else(|| Colormap::by_name(&constants().default_colormap));
    match cmap {
        Some(cm) => Value::Array(
            (0..=10)
                .map(|i| {
                    let t = i as f64 / 10.0;
                    json!([t, cm.sample(t).to_css()])
                })
                .collect(),
        ),
        None => json!(constants().default_colormap),
    }
}

fn choropleth_scale(style: &Style) -> Value {
    match &style.color {
        ColorSpec::Colormap(name) if !name.trim().is_empty() => colorscale(style),
        ColorSpec::List(list) if list.len() > 1 => {
            let last = (list.len() - 1) as f64;
            Value::Array(
                list.iter()
                    .enumerate()
                    .map(|(i, c)| json!([i as f64 / last, crate::color::Color::parse(c).to_css()]))
                    .collect(),
            )
        }
        _ => Value::Array(
            CHOROPLETH_SCALE
                .iter()
                .map(|(t, c)| json!([t, c]))
                .collect(),
        ),
    }
}

struct FigureBuilder<'a> {
    plan: &'a ResolvedPlan,
    style: &'a Style,
    palette: Vec<String>,
    next_color: usize,
    traces: Vec<Value>,
    layout: Map<String, Value>,
    annotations: Vec<Value>,
    drawn: Vec<String>,
    failures: Vec<DrawFailure>,
}

impl<'a> FigureBuilder<'a> {
    fn new(plan: &'a ResolvedPlan, style: &'a Style) -> Self {
        let l = &plan.layout;
        let mut layout = Map::new();
        layout.insert("title".into(), json!({ "text": l.title }));
        layout.insert("width".into(), json!(l.width_px));
        layout.insert("height".into(), json!(l.height_px));
        layout.insert("showlegend".into(), json!(l.legend.is_some()));
        if let Some(legend) = l.legend {
            let (x, anchor) = match legend.primary {
                LegendLoc::UpperRight => (0.95, "right"),
                LegendLoc::UpperLeft | LegendLoc::Best => (0.05, "left"),
            };
            layout.insert(
                "legend".into(),
                json!({ "x": x, "y": 1, "xanchor": anchor, "bgcolor": "rgba(0,0,0,0)" }),
            );
        }
        layout.insert("paper_bgcolor".into(), json!("rgba(0,0,0,0)"));
        layout.insert("plot_bgcolor".into(), json!("rgba(0,0,0,0)"));
        layout.insert("meta".into(), json!({ "theme": style.plotly_theme }));

        let mut annotations = Vec::new();
        if let Some(source) = &l.source_label {
            annotations.push(json!({
                "text": source, "xref": "paper", "yref": "paper",
                "x": 1, "y": -0.12, "xanchor": "right", "showarrow": false,
                "font": { "color": crate::color::Color::parse(&l.source_color).to_css() }
            }));
        }
        if let Some(brand) = &l.brand_label {
            annotations.push(json!({
                "text": brand, "xref": "paper", "yref": "paper",
                "x": 0, "y": -0.12, "xanchor": "left", "showarrow": false,
                "font": { "color": crate::color::Color::parse(&l.brand_color).to_css() }
            }));
        }

        let cc = constants();
        let palette = if cc.plotly_palette.is_empty() {
            vec!["#777777".to_string()]
        } else {
            cc.plotly_palette.clone()
        };

        Self {
            plan,
            style,
            palette,
            next_color: 0,
            traces: Vec::new(),
            layout,
            annotations,
            drawn: Vec::new(),
            failures: Vec::new(),
        }
    }

    fn finish(mut self) -> (Value, Vec<String>, Vec<DrawFailure>) {
        if !self.annotations.is_empty() {
            self.layout
                .insert("annotations".into(), Value::Array(self.annotations));
        }
        let figure = json!({ "data": self.traces, "layout": self.layout });
        (figure, self.drawn, self.failures)
    }

    fn color_for(&mut self, s: &SeriesDraw) -> String {
        let i = self.next_color;
        self.next_color += 1;
        match &s.color {
            Some(c) => c.to_css(),
            None => self.palette[i % self.palette.len()].clone(),
        }
    }

    fn fail(&mut self, series: Option<&str>, message: String) {
        log::warn!("plotly: {message}");
        self.failures.push(match series {
            Some(label) => DrawFailure::series(label, message),
            None => DrawFailure::chart(message),
        });
    }

    /// Axis ids for panel `p`: `(x, y, y2)`, as trace refs (`x2`) and layout
    /// keys (`xaxis2`).
    fn axis_ids(&self, p: usize) -> (String, String, String) {
        let n = self.plan.panels.len();
        let suffix = |k: usize| if k == 1 { String::new() } else { k.to_string() };
        (suffix(p + 1), suffix(p + 1), (n + p + 1).to_string())
    }

    fn add_panel(&mut self, p: usize, panel: &Panel) {
        let (xs, ys, y2s) = self.axis_ids(p);
        let n = self.plan.panels.len().max(1) as f64;
        let gap = if n > 1.0 { 0.04 } else { 0.0 };
        let domain = [((n - 1.0 - p as f64) / n + gap).min(1.0), (n - p as f64) / n];
        let l = &self.plan.layout;

        let mut xaxis = json!({
            "title": { "text": l.x_title },
            "showgrid": l.x_grid,
            "anchor": format!("y{ys}"),
        });
        if let AxisPlan::Bar { rotate_labels: true, .. } = panel.axis {
            xaxis["tickangle"] = json!(-90);
        }
        if let Value::Object(ticks) = &mut xaxis {
            ticks.extend(tick_settings(&panel.axis));
        }
        if p > 0 && l.shared_x.is_some() {
            xaxis["matches"] = json!("x");
        }
        let yaxis = json!({
            "title": { "text": l.y_title },
            "showgrid": l.y_grid,
            "domain": domain,
            "anchor": format!("x{xs}"),
        });
        self.layout.insert(format!("xaxis{xs}"), xaxis);
        self.layout.insert(format!("yaxis{ys}"), yaxis);
        if panel.has_secondary_axis() {
            self.layout.insert(
                format!("yaxis{y2s}"),
                json!({
                    "overlaying": format!("y{ys}"),
                    "side": "right",
                    "showgrid": l.y2_grid,
                    "anchor": format!("x{xs}"),
                }),
            );
        }

        let x: Vec<Value> = panel.index.iter().map(key_value).collect();
        let axis_refs = (format!("x{xs}"), format!("y{ys}"), format!("y{y2s}"));

        match panel.types.kinds.first() {
            Some(ChartKind::Heatmap | ChartKind::Surface) => self.add_matrix(panel, &x, &axis_refs),
            Some(ChartKind::Bubble) => self.add_bubble(panel, &axis_refs),
            Some(ChartKind::Choropleth) => self.add_choropleth(panel),
            _ => {
                for s in &panel.series {
                    self.add_series(s, &x, &axis_refs);
                }
            }
        }

        if panel.types.is_bar_family {
            let stacked = panel.types.kinds.contains(&ChartKind::Stacked);
            self.layout.insert(
                "barmode".into(),
                json!(if stacked { "relative" } else { "group" }),
            );
        }
    }

    fn add_series(
        &mut self,
        s: &SeriesDraw,
        x: &[Value],
        (xref, yref, y2ref): &(String, String, String),
    ) {
        let color = self.color_for(s);
        let yaxis = match s.axis {
            AxisSide::Primary => yref,
            AxisSide::Secondary => y2ref,
        };
        let width = s.linewidth * self.plan.layout.scale;
        let mut trace = json!({
            "name": s.label,
            "xaxis": xref,
            "yaxis": yaxis,
        });
        match s.kind {
            ChartKind::Line => {
                trace["type"] = json!("scatter");
                trace["mode"] = json!("lines");
                trace["x"] = json!(x);
                trace["y"] = numbers(&s.values);
                trace["line"] = json!({ "color": color, "width": width });
            }
            ChartKind::Scatter => {
                trace["type"] = json!("scatter");
                trace["mode"] = json!("markers");
                trace["x"] = json!(x);
                trace["y"] = numbers(&s.values);
                trace["marker"] =
                    json!({ "color": color, "size": 5.0 * self.plan.layout.marker_size });
            }
            ChartKind::Bar | ChartKind::Stacked => {
                trace["type"] = json!("bar");
                trace["x"] = json!(x);
                trace["y"] = numbers(&s.values);
                trace["marker"] = json!({ "color": color });
            }
            ChartKind::Barh => {
                trace["type"] = json!("bar");
                trace["orientation"] = json!("h");
                trace["x"] = numbers(&s.values);
                trace["y"] = json!(x);
                trace["marker"] = json!({ "color": color });
            }
            other => {
                self.fail(
                    Some(&s.label),
                    format!("{other} cannot be mixed with other chart kinds"),
                );
                return;
            }
        }
        self.traces.push(trace);
        self.drawn.push(s.label.clone());

        if let Some(t) = &s.trendline {
            self.traces.push(json!({
                "type": "scatter",
                "mode": "lines",
                "name": format!("{} fit", s.label),
                "showlegend": false,
                "x": [t.x0, t.x1],
                "y": [t.at(t.x0), t.at(t.x1)],
                "xaxis": xref,
                "yaxis": yaxis,
                "line": { "color": color, "dash": "dash", "width": width },
            }));
            self.annotations.push(json!({
                "text": t.annotation(),
                "xref": "paper", "yref": "paper",
                "x": 1, "y": 1, "xanchor": "right", "showarrow": false,
            }));
        }
    }

    fn add_matrix(&mut self, panel: &Panel, y: &[Value], (xref, yref, _): &(String, String, String)) {
        let kind = if panel.types.kinds.first() == Some(&ChartKind::Surface) {
            "surface"
        } else {
            "heatmap"
        };
        let z: Vec<Value> = panel.grid().iter().map(|row| numbers(row)).collect();
        let cols: Vec<&str> = panel.series.iter().map(|s| s.label.as_str()).collect();
        let mut trace = json!({
            "type": kind,
            "z": z,
            "x": cols,
            "y": y,
            "colorscale": colorscale(self.style),
        });
        if kind == "heatmap" {
            trace["xaxis"] = json!(xref);
            trace["yaxis"] = json!(yref);
            trace["texttemplate"] = json!("%{z:.0f}");
        }
        self.traces.push(trace);
        self.drawn
            .extend(panel.series.iter().map(|s| s.label.clone()));
    }

    /// First three series are x, y and marker size; later series are reported as failures.
    fn add_bubble(&mut self, panel: &Panel, (xref, yref, _): &(String, String, String)) {
        let [xs, ys, sizes] = match panel.series.as_slice() {
            [a, b, c, ..] => [a, b, c],
            _ => {
                self.fail(
                    None,
                    format!(
                        "bubble charts need three series (x, y, size), got {}",
                        panel.series.len()
                    ),
                );
                return;
            }
        };
        let color = self.color_for(ys);
        let peak = sizes
            .values
            .iter()
            .filter(|v| v.is_finite())
            .fold(0.0f64, |m, v| m.max(v.abs()));
        let scalar = constants().bubble_size_scalar;
        let size: Vec<Value> = sizes
            .values
            .iter()
            .map(|v| {
                if v.is_finite() && peak > 0.0 {
                    json!(v.abs() / peak * scalar)
                } else {
                    Value::Null
                }
            })
            .collect();
        let text: Vec<String> = panel.index_labels();
        self.traces.push(json!({
            "type": "scatter",
            "mode": "markers",
            "name": ys.label,
            "x": numbers(&xs.values),
            "y": numbers(&ys.values),
            "text": text,
            "xaxis": xref,
            "yaxis": yref,
            "marker": { "size": size, "color": color, "sizemode": "diameter" },
        }));
        self.drawn
            .extend([&xs.label, &ys.label, &sizes.label].map(|l| l.clone()));
        for extra in panel.series.iter().skip(3) {
            self.fail(
                Some(&extra.label),
                "bubble charts take three series (x, y, size); extra series are not drawn".into(),
            );
        }
    }

    /// Index labels are location codes; the colored field is
    /// `plotly_choropleth_field`, or the first series.
    fn add_choropleth(&mut self, panel: &Panel) {
        let field = self.style.plotly_choropleth_field.as_deref();
        let series = field
            .and_then(|f| panel.series.iter().find(|s| s.label == f))
            .or_else(|| {
                if let Some(f) = field {
                    log::warn!("plotly: choropleth field '{f}' not found, using the first series");
                }
                panel.series.first()
            });
        let Some(series) = series else {
            self.fail(None, "choropleth has no series".to_string());
            return;
        };
        self.traces.push(json!({
            "type": "choropleth",
            "colorscale": choropleth_scale(self.style),
            "autocolorscale": false,
            "locations": panel.index_labels(),
            "z": numbers(&series.values),
            "locationmode": self.style.plotly_location_mode,
            "marker": { "line": { "color": "rgb(255,255,255)", "width": 1 } },
            "colorbar": { "title": { "text": self.plan.layout.units } },
        }));
        self.layout.insert(
            "geo".into(),
            json!({
                "scope": self.style.plotly_scope,
                "projection": { "type": self.style.plotly_projection },
                "showlakes": true,
                "lakecolor": "rgb(255, 255, 255)",
            }),
        );
        self.drawn.push(series.label.clone());
    }
}
