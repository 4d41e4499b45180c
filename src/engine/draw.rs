//! Shared plotters drawing for the static engines, generic over the backend.
//!
//! Each element is drawn on its own; a failing element is recorded and the
//! next one is still attempted.

use super::DrawFailure;
use super::fonts::font_family;
use crate::axis::AxisPlan;
use crate::chart_type::ChartKind;
use crate::color::{ColorSpec, Colormap, Rgba};
use crate::constants::constants;
use crate::error::ChartError;
use crate::plan::{AxisSide, LegendLoc, Panel, ResolvedPlan, SeriesDraw};
use crate::style::Style;
use anyhow::{Result, anyhow};
use plotters::coord::Shift;
use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::combinators::WithKeyPoints;
use plotters::coord::ranged1d::{BoldPoints, LightPoints};
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;
use plotters::style::FontTransform;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::fmt::Debug;

type Axis = WithKeyPoints<RangedCoordf64>;
type Cart = Cartesian2d<Axis, Axis>;

const VALUE_TICKS: usize = 10;

fn plot_err<E: Debug>(e: E) -> anyhow::Error {
    anyhow!("{:?}", e)
}

/// Heuristic: estimate pixel width of text (plotters has no text measuring).
fn estimate_text_width_px(text: &str, font_px: u32) -> i32 {
    ((text.chars().count() as f32) * (font_px as f32) * 0.60).ceil() as i32
}

/// Tick label with precision shrinking as magnitude grows.
fn format_value(v: f64) -> String {
    let a = v.abs();
    let prec = if a >= 100.0 {
        0
    } else if a >= 10.0 {
        1
    } else {
        2
    };
    format!("{:.*}", prec, v)
}

fn to_plotters(c: Rgba) -> RGBAColor {
    RGBAColor(c.r, c.g, c.b, c.a)
}

/// Named or CSS color, black when it cannot be parsed.
fn css_color(spec: &str) -> RGBAColor {
    crate::color::Color::parse(spec)
        .rgba()
        .map(to_plotters)
        .unwrap_or(RGBAColor(0, 0, 0, 1.0))
}

#[derive(Debug, Default)]
pub(crate) struct DrawReport {
    pub drawn: Vec<String>,
    pub failures: Vec<DrawFailure>,
}

impl DrawReport {
    fn chart_failure(&mut self, engine: &str, e: impl std::fmt::Display) {
        log::warn!("{engine}: {e}");
        self.failures.push(DrawFailure::chart(e));
    }

    fn series_failure(&mut self, engine: &str, label: &str, e: impl std::fmt::Display) {
        log::warn!("{engine}: series '{label}' not drawn: {e}");
        self.failures.push(DrawFailure::series(label, e));
    }
}

struct Ctx<'a> {
    plan: &'a ResolvedPlan,
    style: &'a Style,
    palette: &'a [Rgba],
    accept: &'a dyn Fn(ChartKind) -> bool,
    text: bool,
    font: &'static str,
    /// Position in this render call, used for palette fallback.
    next_color: usize,
}

impl Ctx<'_> {
    fn font_px(&self, base: f64) -> u32 {
        ((base * self.plan.layout.scale.max(0.5)).round() as u32).max(6)
    }

    fn color_for(&mut self, s: &SeriesDraw) -> RGBAColor {
        let i = self.next_color;
        self.next_color += 1;
        match s.color.as_ref().and_then(|c| c.rgba()) {
            Some(c) => to_plotters(c),
            None => to_plotters(self.palette[i % self.palette.len().max(1)]),
        }
    }

    fn engine(&self) -> &str {
        &self.plan.engine
    }
}

/// Draw a whole plan onto `root` and present it.
pub(crate) fn draw_plan<DB: DrawingBackend>(
    root: DrawingArea<DB, Shift>,
    plan: &ResolvedPlan,
    style: &Style,
    palette: &[Rgba],
    accept: &dyn Fn(ChartKind) -> bool,
) -> DrawReport {
    let mut report = DrawReport::default();
    let fallback = [Rgba::opaque(0x77, 0x77, 0x77)];
    let mut ctx = Ctx {
        plan,
        style,
        palette: if palette.is_empty() { &fallback } else { palette },
        accept,
        text: font_family().is_some(),
        font: font_family().unwrap_or("sans-serif"),
        next_color: 0,
    };
    let layout = &plan.layout;

    if let Err(e) = root.fill(&WHITE) {
        report.chart_failure(ctx.engine(), plot_err(e));
    }

    let mut area = root.clone();
    if ctx.text && !layout.title.trim().is_empty() {
        match root.titled(&layout.title, (ctx.font, ctx.font_px(14.0))) {
            Ok(a) => area = a,
            Err(e) => report.chart_failure(ctx.engine(), plot_err(e)),
        }
    }

    let has_footer = ctx.text && (layout.source_label.is_some() || layout.brand_label.is_some());
    let footer_h = if has_footer { ctx.font_px(14.0) as i32 } else { 0 };
    let (_, h) = area.dim_in_pixel();
    let (body, footer) = area.split_vertically((h as i32 - footer_h).max(1));

    let panel_areas = body.split_evenly((plan.panels.len().max(1), 1));
    for (p, (panel, parea)) in plan.panels.iter().zip(panel_areas.iter()).enumerate() {
        if panel.types.is_matrix {
            draw_matrix_panel(parea, panel, &mut ctx, &mut report);
        } else {
            draw_xy_panel(parea, p, panel, &mut ctx, &mut report);
        }
    }

    if has_footer {
        let px = ctx.font_px(7.0);
        let (fw, _) = footer.dim_in_pixel();
        if let Some(brand) = &layout.brand_label {
            let color = css_color(&layout.brand_color);
            let t = Text::new(brand.clone(), (5, 2), (ctx.font, px).into_font().color(&color));
            if let Err(e) = footer.draw(&t) {
                report.chart_failure(ctx.engine(), plot_err(e));
            }
        }
        if let Some(source) = &layout.source_label {
            let color = css_color(&layout.source_color);
            let x = fw as i32 - 5 - estimate_text_width_px(source, px);
            let font = (ctx.font, px).into_font().color(&color);
            let t = Text::new(source.clone(), (x.max(0), 2), font);
            if let Err(e) = footer.draw(&t) {
                report.chart_failure(ctx.engine(), plot_err(e));
            }
        }
    }

    if let Err(e) = root.present() {
        report.chart_failure(ctx.engine(), plot_err(e));
    }
    report
}

fn draw_matrix_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    panel: &Panel,
    ctx: &mut Ctx<'_>,
    report: &mut DrawReport,
) {
    if panel.types.kinds.first() == Some(&ChartKind::Surface) {
        let engine = ctx.engine().to_string();
        let err = ChartError::Unsupported {
            engine: engine.clone(),
            what: "surface charts".into(),
        };
        report.chart_failure(&engine, err);
        return;
    }
    if !(ctx.accept)(ChartKind::Heatmap) {
        let engine = ctx.engine().to_string();
        for s in &panel.series {
            report.series_failure(&engine, &s.label, format!("{engine} cannot draw heatmaps"));
        }
        return;
    }
    let engine = ctx.engine().to_string();
    match draw_heatmap(area, panel, ctx) {
        Ok(()) => report
            .drawn
            .extend(panel.series.iter().map(|s| s.label.clone())),
        Err(e) => report.chart_failure(&engine, e),
    }
}

fn heat_colormap(style: &Style) -> Option<Colormap> {
    let named = match &style.color {
        ColorSpec::Colormap(name) => Colormap::by_name(name),
        ColorSpec::List(_) => None,
    };
    named
        .or_else(|| Colormap::by_name(&constants().default_colormap))
        .or_else(|| Colormap::by_name("blues"))
}

fn draw_heatmap<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    panel: &Panel,
    ctx: &mut Ctx<'_>,
) -> Result<()> {
    let grid = panel.grid();
    let rows = grid.len();
    let cols = panel.series.len();
    let (lo, hi) = grid
        .iter()
        .flatten()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        });
    let span = if hi > lo { hi - lo } else { 1.0 };
    let cmap = heat_colormap(ctx.style);
    let y_labels = panel.index_labels();

    let label_px = if ctx.text { ctx.font_px(40.0) } else { 0 };
    // Cell centres sit on integer coordinates.
    let mut chart = ChartBuilder::on(area)
        .margin(if ctx.plan.layout.thin_margin { 4 } else { 16 })
        .x_label_area_size(label_px)
        .y_label_area_size(label_px)
        .build_cartesian_2d(
            -0.5f64..cols.max(1) as f64 - 0.5,
            -0.5f64..rows.max(1) as f64 - 0.5,
        )
        .map_err(plot_err)?;

    let x_fmt = |x: &f64| panel.axis.format_x(x + 0.5);
    let y_fmt = |y: &f64| {
        let k = y.round();
        if (y - k).abs() > 1e-6 || k < 0.0 {
            return String::new();
        }
        y_labels.get(k as usize).cloned().unwrap_or_default()
    };
    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(if ctx.text { cols } else { 0 })
        .y_labels(if ctx.text { rows } else { 0 })
        .x_label_formatter(&x_fmt)
        .y_label_formatter(&y_fmt)
        .label_style((ctx.font, ctx.font_px(10.0)))
        .draw()
        .map_err(plot_err)?;

    let cells = grid.iter().enumerate().flat_map(|(r, row)| {
        row.iter().enumerate().filter(|(_, v)| v.is_finite()).map(move |(c, v)| (r, c, *v))
    });
    let mut rects = Vec::new();
    let mut labels = Vec::new();
    for (r, c, v) in cells {
        let t = (v - lo) / span;
        let fill = match cmap {
            Some(cm) => to_plotters(cm.sample(t)),
            None => to_plotters(ctx.palette[0]).mix(t.clamp(0.1, 1.0)),
        };
        let (x, y) = (c as f64, r as f64);
        rects.push(Rectangle::new([(x - 0.5, y - 0.5), (x + 0.5, y + 0.5)], fill.filled()));
        labels.push((format!("{v:.0}"), (x, y)));
    }
    chart.draw_series(rects).map_err(plot_err)?;

    if ctx.text {
        let px = ctx.font_px(9.0);
        let style = (ctx.font, px)
            .into_font()
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Center));
        chart
            .draw_series(
                labels
                    .into_iter()
                    .map(|(s, pos)| Text::new(s, pos, style.clone())),
            )
            .map_err(plot_err)?;
    }
    Ok(())
}

/// Index axis with ticks at the positions the axis plan chose. Without text
/// every tick becomes a light grid line.
fn index_axis(plan: &AxisPlan, (lo, hi): (f64, f64), text: bool) -> Axis {
    let inside = |x: &f64| *x >= lo && *x <= hi;
    let (mut major, mut minor) = plan.tick_positions();
    major.retain(inside);
    minor.retain(inside);
    if major.is_empty() {
        major = RangedCoordf64::from(lo..hi).key_points(BoldPoints(5));
    }
    if !text {
        minor.append(&mut major);
    }
    (lo..hi).with_key_points(major).with_light_points(minor)
}

/// Value axis with plotters' own round-number ticks.
fn value_axis((lo, hi): (f64, f64), text: bool) -> Axis {
    let inner = RangedCoordf64::from(lo..hi);
    let bold = if text {
        inner.key_points(BoldPoints(VALUE_TICKS))
    } else {
        Vec::new()
    };
    let light = inner.key_points(LightPoints::new(VALUE_TICKS, VALUE_TICKS * 5));
    (lo..hi).with_key_points(bold).with_light_points(light)
}

fn segments(xs: &[f64], ys: &[f64], map_y: &dyn Fn(f64) -> f64) -> Vec<Vec<(f64, f64)>> {
    let mut out: Vec<Vec<(f64, f64)>> = Vec::new();
    let mut cur = Vec::new();
    for (x, y) in xs.iter().zip(ys) {
        if x.is_finite() && y.is_finite() {
            cur.push((*x, map_y(*y)));
        } else if !cur.is_empty() {
            out.push(std::mem::take(&mut cur));
        }
    }
    if !cur.is_empty() {
        out.push(cur);
    }
    out
}

fn draw_xy_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    p: usize,
    panel: &Panel,
    ctx: &mut Ctx<'_>,
    report: &mut DrawReport,
) {
    let engine = ctx.engine().to_string();
    let plan = ctx.plan;
    let layout = &plan.layout;
    let horizontal = panel.types.kinds.contains(&ChartKind::Barh);
    let (x0, x1) = plan.x_range(p);
    let (y0, y1) = panel.y_range;
    let (y20, y21) = panel.y2_range.unwrap_or(panel.y_range);
    let secondary = panel.y2_range.is_some();

    let rotate = matches!(panel.axis, AxisPlan::Bar { rotate_labels: true, .. });
    let x_area = if ctx.text {
        ctx.font_px(if rotate { 60.0 } else { 30.0 })
    } else {
        0
    };
    let y_area = if ctx.text { ctx.font_px(50.0) } else { 0 };

    let mut builder = ChartBuilder::on(area);
    builder
        .margin(if layout.thin_margin { 4 } else { 16 })
        .x_label_area_size(x_area)
        .y_label_area_size(y_area);
    if secondary {
        builder.right_y_label_area_size(y_area);
    }
    let index = index_axis(&panel.axis, (x0, x1), ctx.text);
    let values = value_axis((y0, y1), ctx.text);
    let built = if horizontal {
        builder.build_cartesian_2d(values, index)
    } else {
        builder.build_cartesian_2d(index, values)
    };
    let chart = match built {
        Ok(c) => c,
        Err(e) => {
            report.chart_failure(&engine, plot_err(e));
            return;
        }
    };
    let mut chart = if horizontal {
        chart.set_secondary_coord(y20..y21, x0..x1)
    } else {
        chart.set_secondary_coord(x0..x1, y20..y21)
    };

    // Mesh and axes; tick positions come from the axes themselves.
    {
        let axis_fmt = |x: &f64| panel.axis.format_x(*x);
        let value_fmt = |v: &f64| format_value(*v);
        let tick_px = ctx.font_px(10.0);
        let y2_count = if ctx.text { VALUE_TICKS } else { 0 };

        let mut mesh = chart.configure_mesh();
        mesh.label_style((ctx.font, tick_px))
            .axis_desc_style((ctx.font, ctx.font_px(12.0)));
        if horizontal {
            mesh.x_label_formatter(&value_fmt)
                .y_label_formatter(&axis_fmt);
        } else {
            mesh.x_label_formatter(&axis_fmt)
                .y_label_formatter(&value_fmt);
        }
        if rotate && !horizontal {
            mesh.x_label_style(
                (ctx.font, tick_px)
                    .into_font()
                    .transform(FontTransform::Rotate90),
            );
        }
        if ctx.text && !layout.x_title.is_empty() {
            mesh.x_desc(layout.x_title.as_str());
        }
        if ctx.text && !layout.y_title.is_empty() {
            mesh.y_desc(layout.y_title.as_str());
        }
        if !layout.x_grid {
            mesh.disable_x_mesh();
        }
        if !layout.y_grid {
            mesh.disable_y_mesh();
        }
        if let Err(e) = mesh.draw() {
            report.chart_failure(&engine, plot_err(e));
        }

        if secondary {
            let mut axes = chart.configure_secondary_axes();
            axes.label_style((ctx.font, tick_px));
            if horizontal {
                axes.x_labels(y2_count).x_label_formatter(&value_fmt);
            } else {
                axes.y_labels(y2_count).y_label_formatter(&value_fmt);
            }
            if let Err(e) = axes.draw() {
                report.chart_failure(&engine, plot_err(e));
            }
        }
    }

    let to_primary = |y: f64| {
        if y21 - y20 == 0.0 {
            y
        } else {
            y0 + (y - y20) * (y1 - y0) / (y21 - y20)
        }
    };
    let identity = |y: f64| y;

    let slot_width = match &panel.axis {
        AxisPlan::Bar { slot_width, .. } => *slot_width,
        _ => 0.8,
    };

    let mut legend: Vec<(String, RGBAColor, AxisSide)> = Vec::new();
    let mut notes: Vec<String> = Vec::new();
    for s in &panel.series {
        let color = ctx.color_for(s);
        if !(ctx.accept)(s.kind) {
            report.series_failure(
                &engine,
                &s.label,
                format!("{engine} cannot draw {} series", s.kind),
            );
            continue;
        }
        let map_y: &dyn Fn(f64) -> f64 = match s.axis {
            AxisSide::Secondary => &to_primary,
            AxisSide::Primary => &identity,
        };
        let stroke = ((s.linewidth * layout.scale).round() as u32).max(1);

        let result = match s.kind {
            ChartKind::Line if !horizontal => {
                draw_line(&mut *chart, &segments(&panel.xs, &s.values, map_y), color, stroke)
            }
            ChartKind::Scatter if !horizontal => {
                let r = ((3.0 * layout.marker_size.max(0.5)) * layout.scale.max(1.0).sqrt())
                    .round() as i32;
                draw_scatter(&mut *chart, s, &panel.xs, map_y, color, r.max(2), stroke)
            }
            ChartKind::Bar | ChartKind::Barh | ChartKind::Stacked => {
                let slot = s.slot.unwrap_or(0);
                let rects: Vec<_> = (0..s.values.len())
                    .filter_map(|k| {
                        let (b, t) = s.bar_span(k)?;
                        let left = panel.axis.left_edge(k, slot);
                        let right = left + slot_width;
                        let (b, t) = (map_y(b), map_y(t));
                        Some(if horizontal {
                            Rectangle::new([(b, left), (t, right)], color.filled())
                        } else {
                            Rectangle::new([(left, b), (right, t)], color.filled())
                        })
                    })
                    .collect();
                chart.draw_series(rects).map(|_| ()).map_err(plot_err)
            }
            ChartKind::Line | ChartKind::Scatter => Err(anyhow!(
                "{} series cannot share a horizontal bar chart",
                s.kind
            )),
            other => Err(ChartError::Unsupported {
                engine: engine.clone(),
                what: format!("{other} charts"),
            }
            .into()),
        };

        match result {
            Ok(()) => {
                report.drawn.push(s.label.clone());
                legend.push((s.label.clone(), color, s.axis));
                if let Some(t) = &s.trendline {
                    notes.push(t.annotation());
                }
            }
            Err(e) => report.series_failure(&engine, &s.label, e),
        }
    }

    if !ctx.text {
        return;
    }
    let plot_area = chart.plotting_area().strip_coord_spec();
    if let Some(placement) = layout.legend {
        let (primary, secondary_items): (Vec<_>, Vec<_>) = legend
            .into_iter()
            .partition(|(_, _, side)| *side == AxisSide::Primary);
        let px = ctx.font_px(10.0);
        let font = (ctx.font, px);
        if let Err(e) = draw_legend(&plot_area, &primary, placement.primary, font) {
            report.chart_failure(&engine, e);
        }
        if let Some(loc) = placement.secondary
            && let Err(e) = draw_legend(&plot_area, &secondary_items, loc, font)
        {
            report.chart_failure(&engine, e);
        }
    }
    if !notes.is_empty() {
        let px = ctx.font_px(8.0);
        let (w, h) = plot_area.dim_in_pixel();
        for (i, note) in notes.iter().enumerate() {
            let x = w as i32 - 5 - estimate_text_width_px(note, px);
            let y = h as i32 - 5 - (notes.len() - i) as i32 * (px as i32 + 4);
            let t = Text::new(note.clone(), (x.max(0), y.max(0)), (ctx.font, px));
            if let Err(e) = plot_area.draw(&t) {
                report.chart_failure(&engine, plot_err(e));
            }
        }
    }
}

fn draw_line<DB: DrawingBackend>(
    chart: &mut ChartContext<'_, DB, Cart>,
    segments: &[Vec<(f64, f64)>],
    color: RGBAColor,
    stroke: u32,
) -> Result<()> {
    let style = ShapeStyle {
        color,
        filled: false,
        stroke_width: stroke,
    };
    for seg in segments {
        chart
            .draw_series(LineSeries::new(seg.iter().copied(), style))
            .map_err(plot_err)?;
    }
    Ok(())
}

fn draw_scatter<DB: DrawingBackend>(
    chart: &mut ChartContext<'_, DB, Cart>,
    s: &SeriesDraw,
    xs: &[f64],
    map_y: &dyn Fn(f64) -> f64,
    color: RGBAColor,
    radius: i32,
    stroke: u32,
) -> Result<()> {
    chart
        .draw_series(
            s.points(xs)
                .map(|(x, y)| Circle::new((x, map_y(y)), radius, color.filled())),
        )
        .map_err(plot_err)?;
    if let Some(t) = &s.trendline {
        let line = [(t.x0, map_y(t.at(t.x0))), (t.x1, map_y(t.at(t.x1)))];
        chart
            .draw_series(LineSeries::new(line, color.stroke_width(stroke)))
            .map_err(plot_err)?;
    }
    Ok(())
}

fn draw_legend<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    items: &[(String, RGBAColor, AxisSide)],
    loc: LegendLoc,
    (family, px): (&str, u32),
) -> Result<()> {
    if items.is_empty() {
        return Ok(());
    }
    let (w, _) = area.dim_in_pixel();
    let line_h = px as i32 + 6;
    let swatch = px as i32;
    let text_w = items
        .iter()
        .map(|(l, _, _)| estimate_text_width_px(l, px))
        .max()
        .unwrap_or(0);
    let box_w = swatch + 6 + text_w + 12;
    let box_h = line_h * items.len() as i32 + 6;
    let left = match loc {
        LegendLoc::UpperRight => (w as i32 - box_w - 10).max(0),
        LegendLoc::UpperLeft | LegendLoc::Best => 10,
    };
    let top = 10;

    area.draw(&Rectangle::new(
        [(left, top), (left + box_w, top + box_h)],
        WHITE.mix(0.75).filled(),
    ))
    .map_err(plot_err)?;
    for (i, (label, color, _)) in items.iter().enumerate() {
        let y = top + 6 + i as i32 * line_h;
        area.draw(&Rectangle::new(
            [(left + 6, y), (left + 6 + swatch, y + swatch - 2)],
            color.filled(),
        ))
        .map_err(plot_err)?;
        area.draw(&Text::new(
            label.clone(),
            (left + 12 + swatch, y),
            (family, px),
        ))
        .map_err(plot_err)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gaps_split_line_segments() {
        let xs = [0.0, 1.0, 2.0, 3.0, 4.0];
        let ys = [1.0, f64::NAN, 2.0, 3.0, f64::NAN];
        let segs = segments(&xs, &ys, &|y| y);
        assert_eq!(segs, vec![vec![(0.0, 1.0)], vec![(2.0, 2.0), (3.0, 3.0)]]);
    }

    #[test]
    fn index_axis_keeps_plan_ticks_inside_the_range() {
        let plan = AxisPlan::Numeric {
            min: 0.0,
            max: 47.0,
            major: 5.0,
            minor: 1.0,
        };
        let axis = index_axis(&plan, (2.0, 47.0), true);
        assert_eq!(axis.bold_points().first(), Some(&5.0));
        assert_eq!(axis.bold_points().len(), 9);
        assert_eq!(axis.light_points().len(), 46);

        let silent = index_axis(&plan, (2.0, 47.0), false);
        assert!(silent.bold_points().is_empty());
        assert_eq!(silent.light_points().len(), 55);
    }

    #[test]
    fn value_labels_shrink_precision() {
        assert_eq!(format_value(1234.5), "1234");
        assert_eq!(format_value(12.34), "12.3");
        assert_eq!(format_value(0.123), "0.12");
    }
}
