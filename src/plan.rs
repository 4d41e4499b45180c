//! The shared resolution pipeline.
//!
//! [`resolve_plan`] runs chart-type resolution, color assignment and axis
//! planning once and produces a [`ResolvedPlan`]. Engines only consume the
//! plan; none of them re-derive colors, slots or ticks.

use crate::axis::{self, AxisPlan};
use crate::chart_type::{self, ChartKind, ChartTypeSpec, ResolvedChartTypes};
use crate::color::{self, Color, ColorAssignment};
use crate::constants::constants;
use crate::error::{ChartError, Result};
use crate::models::{Dataset, IndexKey, IndexKind, PlotData};
use crate::style::Style;
use serde::Serialize;
use std::path::PathBuf;

const DEFAULT_LINEWIDTH: f64 = 1.0;

/// Which y-axis a series is drawn against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisSide {
    Primary,
    Secondary,
}

/// Legend anchor inside the plotting area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LegendLoc {
    Best,
    UpperLeft,
    UpperRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LegendPlacement {
    pub primary: LegendLoc,
    /// Present only when some series sit on the secondary axis.
    pub secondary: Option<LegendLoc>,
}

/// Least-squares line `y = slope * x + intercept` with its R².
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Trendline {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    pub x0: f64,
    pub x1: f64,
}

impl Trendline {
    pub fn fit(xs: &[f64], ys: &[f64]) -> Option<Trendline> {
        let pts: Vec<(f64, f64)> = xs
            .iter()
            .zip(ys)
            .map(|(x, y)| (*x, *y))
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .collect();
        if pts.len() < 2 {
            return None;
        }
        let n = pts.len() as f64;
        let mx = pts.iter().map(|p| p.0).sum::<f64>() / n;
        let my = pts.iter().map(|p| p.1).sum::<f64>() / n;
        let sxx: f64 = pts.iter().map(|p| (p.0 - mx).powi(2)).sum();
        if sxx == 0.0 {
            return None;
        }
        let sxy: f64 = pts.iter().map(|p| (p.0 - mx) * (p.1 - my)).sum();
        let slope = sxy / sxx;
        let intercept = my - slope * mx;
        let ss_tot: f64 = pts.iter().map(|p| (p.1 - my).powi(2)).sum();
        let ss_res: f64 = pts
            .iter()
            .map(|p| (p.1 - (slope * p.0 + intercept)).powi(2))
            .sum();
        let r_squared = if ss_tot == 0.0 { 1.0 } else { 1.0 - ss_res / ss_tot };
        let (x0, x1) = pts
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
                (lo.min(p.0), hi.max(p.0))
            });
        Some(Trendline {
            slope,
            intercept,
            r_squared,
            x0,
            x1,
        })
    }

    pub fn at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    pub fn annotation(&self) -> String {
        format!(
            "R^2 = {:.2}, m = {:.4}, c = {:.4}",
            self.r_squared, self.slope, self.intercept
        )
    }
}

/// Everything an engine needs to draw one series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesDraw {
    pub label: String,
    pub kind: ChartKind,
    /// `None` means "take the engine's palette color for this position".
    pub color: Option<Color>,
    pub values: Vec<f64>,
    pub axis: AxisSide,
    pub linewidth: f64,
    /// Bar slot within the category group.
    pub slot: Option<usize>,
    /// Per-row baseline for stacked bars (positive and negative values
    /// accumulate separately).
    pub stack_base: Option<Vec<f64>>,
    pub trendline: Option<Trendline>,
}

impl SeriesDraw {
    /// Finite `(x, y)` pairs.
    pub fn points<'a>(&'a self, xs: &'a [f64]) -> impl Iterator<Item = (f64, f64)> + 'a {
        xs.iter()
            .zip(&self.values)
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .map(|(x, y)| (*x, *y))
    }

    /// Bottom and top of the bar drawn at `row`.
    pub fn bar_span(&self, row: usize) -> Option<(f64, f64)> {
        let v = *self.values.get(row)?;
        if !v.is_finite() {
            return None;
        }
        let base = self
            .stack_base
            .as_ref()
            .and_then(|b| b.get(row).copied())
            .unwrap_or(0.0);
        Some((base, base + v))
    }
}

/// One subplot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Panel {
    pub index: Vec<IndexKey>,
    /// Position of each index key on the x-axis.
    pub xs: Vec<f64>,
    pub axis: AxisPlan,
    #[serde(skip)]
    pub types: ResolvedChartTypes,
    pub series: Vec<SeriesDraw>,
    pub y_range: (f64, f64),
    pub y2_range: Option<(f64, f64)>,
}

impl Panel {
    pub fn has_secondary_axis(&self) -> bool {
        self.y2_range.is_some()
    }

    /// `rows × cols` value grid for matrix charts (rows follow the index).
    pub fn grid(&self) -> Vec<Vec<f64>> {
        (0..self.index.len())
            .map(|r| {
                self.series
                    .iter()
                    .map(|s| s.values.get(r).copied().unwrap_or(f64::NAN))
                    .collect()
            })
            .collect()
    }

    pub fn index_labels(&self) -> Vec<String> {
        self.index.iter().map(ToString::to_string).collect()
    }
}

/// Chart-wide layout facts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    /// Pixel size after the engine's scale correction.
    pub width_px: u32,
    pub height_px: u32,
    /// Multiplier applied to fonts and margins.
    pub scale: f64,
    pub title: String,
    pub x_title: String,
    pub y_title: String,
    pub units: String,
    pub legend: Option<LegendPlacement>,
    pub x_grid: bool,
    pub y_grid: bool,
    pub y2_grid: bool,
    pub source_label: Option<String>,
    pub source_color: String,
    pub brand_label: Option<String>,
    pub brand_color: String,
    pub thin_margin: bool,
    pub marker_size: f64,
    /// Common x extent when subplots share their x-axis.
    pub shared_x: Option<(f64, f64)>,
}

/// Where an engine writes its artifact.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OutputTargets {
    pub file_output: Option<PathBuf>,
    pub html_file_output: Option<PathBuf>,
    pub save_fig: bool,
    pub silent_display: bool,
}

impl OutputTargets {
    /// Raster/static target, or `<engine>.png` in the working directory.
    pub fn file_or_default(&self, engine: &str) -> PathBuf {
        self.file_output
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("{engine}.png")))
    }

    /// HTML target, or `<engine>.html` in the working directory.
    pub fn html_or_default(&self, engine: &str) -> PathBuf {
        self.html_file_output
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("{engine}.html")))
    }
}

/// The fully resolved draw plan handed to an engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedPlan {
    pub engine: String,
    pub panels: Vec<Panel>,
    pub layout: Layout,
    pub colors: ColorAssignment,
    pub outputs: OutputTargets,
}

impl ResolvedPlan {
    pub fn series_count(&self) -> usize {
        self.panels.iter().map(|p| p.series.len()).sum()
    }

    pub fn x_range(&self, panel: usize) -> (f64, f64) {
        match (self.layout.shared_x, self.panels.get(panel)) {
            (Some(shared), _) => shared,
            (None, Some(p)) => p.axis.x_range(),
            (None, None) => (0.0, 1.0),
        }
    }

    pub fn is_matrix(&self) -> bool {
        self.panels.iter().any(|p| p.types.is_matrix)
    }
}

/// Pixel scale after the engine-specific correction: bokeh shrinks a
/// positive scale factor to two thirds, plotly does the same in
/// `offline_html` mode.
pub fn engine_scale(engine: &str, style: &Style) -> f64 {
    let magnitude = style.scale_magnitude();
    match engine {
        "bokeh" if style.scale_factor > 0.0 => magnitude * 2.0 / 3.0,
        "plotly" if style.plotly_plot_mode == "offline_html" => magnitude * 2.0 / 3.0,
        _ => magnitude,
    }
}

fn split_panels(data: &PlotData, style: &Style) -> Vec<Dataset> {
    match data {
        PlotData::Panels(list) => list.clone(),
        PlotData::Single(ds) if style.subplots => {
            (0..ds.series_count()).filter_map(|c| ds.column(c)).collect()
        }
        PlotData::Single(ds) => vec![ds.clone()],
    }
}

fn x_positions(index: &[IndexKey], types: &ResolvedChartTypes) -> Vec<f64> {
    let categorical = types.is_bar_family
        || types.is_matrix
        || matches!(index.first().map(IndexKey::kind), Some(IndexKind::Categorical));
    if categorical {
        return (0..index.len()).map(|i| i as f64).collect();
    }
    index
        .iter()
        .enumerate()
        .map(|(i, k)| k.as_f64().unwrap_or(i as f64))
        .collect()
}

/// Baselines for every stacked series: positive values pile up from zero,
/// negative values pile down from zero.
fn stack_bases(ds: &Dataset, kinds: &[ChartKind]) -> Vec<Option<Vec<f64>>> {
    let mut pos = vec![0.0; ds.len()];
    let mut neg = vec![0.0; ds.len()];
    ds.series()
        .iter()
        .zip(kinds)
        .map(|(s, kind)| {
            if *kind != ChartKind::Stacked {
                return None;
            }
            let base = s
                .values
                .iter()
                .enumerate()
                .map(|(row, v)| {
                    if !v.is_finite() {
                        return 0.0;
                    }
                    let acc = if *v >= 0.0 { &mut pos[row] } else { &mut neg[row] };
                    let b = *acc;
                    *acc += v;
                    b
                })
                .collect();
            Some(base)
        })
        .collect()
}

fn padded(lo: f64, hi: f64) -> (f64, f64) {
    if !lo.is_finite() || !hi.is_finite() {
        return (0.0, 1.0);
    }
    if (hi - lo).abs() < f64::EPSILON {
        return (lo - 1.0, hi + 1.0);
    }
    let pad = (hi - lo) * 0.05;
    (lo - pad, hi + pad)
}

fn y_extent<'a>(
    series: impl Iterator<Item = &'a SeriesDraw>,
    xs: &[f64],
) -> Option<(f64, f64)> {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    let mut seen = false;
    for s in series {
        seen = true;
        if s.kind.is_bar_family() {
            lo = lo.min(0.0);
            hi = hi.max(0.0);
            for row in 0..s.values.len() {
                if let Some((b, t)) = s.bar_span(row) {
                    lo = lo.min(b.min(t));
                    hi = hi.max(b.max(t));
                }
            }
        } else {
            for (_, y) in s.points(xs) {
                lo = lo.min(y);
                hi = hi.max(y);
            }
        }
        if let Some(t) = &s.trendline {
            for y in [t.at(t.x0), t.at(t.x1)] {
                lo = lo.min(y);
                hi = hi.max(y);
            }
        }
    }
    seen.then(|| padded(lo, hi))
}

/// Resolve chart types, colors and axes for every panel.
///
/// The chart type list (after `style.chart_type` takes precedence) is
/// validated against the total series count and then sliced per panel.
/// Colors are assigned once over every label in the chart so positional
/// palettes continue across subplots.
pub fn resolve_plan(
    data: &PlotData,
    style: &Style,
    chart_type: &ChartTypeSpec,
    engine: &str,
) -> Result<ResolvedPlan> {
    let panels_data = split_panels(data, style);
    let total: usize = panels_data.iter().map(Dataset::series_count).sum();
    if total == 0 || panels_data.iter().all(Dataset::is_empty) {
        return Err(ChartError::EmptyDataset);
    }

    let all_types = chart_type::resolve(total, chart_type, style.chart_type.as_ref())?;
    let labels: Vec<String> = panels_data.iter().flat_map(Dataset::labels).collect();
    let colors = color::resolve(&labels, style);

    let mut panels = Vec::with_capacity(panels_data.len());
    let mut offset = 0;
    for ds in &panels_data {
        let n = ds.series_count();
        let slice = all_types.kinds[offset..offset + n].to_vec();
        let types = chart_type::resolve(n, &ChartTypeSpec::PerSeries(slice), None)?;
        let columns = ds.labels();
        let axis = axis::plan(ds.index(), &types, &columns, style.date_formatter.as_deref());
        let xs = x_positions(ds.index(), &types);
        let bases = stack_bases(ds, &types.kinds);

        let series: Vec<SeriesDraw> = ds
            .series()
            .iter()
            .enumerate()
            .zip(bases)
            .map(|((i, s), stack_base)| {
                let kind = types.kinds[i];
                let linewidth = if style.uses_linewidth_2(&s.name) {
                    style.linewidth_2.or(style.linewidth)
                } else {
                    style.linewidth
                }
                .unwrap_or(DEFAULT_LINEWIDTH);
                let trendline = (style.line_of_best_fit && kind == ChartKind::Scatter)
                    .then(|| Trendline::fit(&xs, &s.values))
                    .flatten();
                SeriesDraw {
                    label: s.name.clone(),
                    kind,
                    color: colors.at(offset + i).cloned(),
                    values: s.values.clone(),
                    axis: if style.is_secondary_axis(&s.name) {
                        AxisSide::Secondary
                    } else {
                        AxisSide::Primary
                    },
                    linewidth,
                    slot: types.slot_index(i),
                    stack_base,
                    trendline,
                }
            })
            .collect();

        let y_range = if types.is_matrix {
            (0.0, ds.len().max(1) as f64)
        } else {
            y_extent(
                series.iter().filter(|s| s.axis == AxisSide::Primary),
                &xs,
            )
            .unwrap_or((0.0, 1.0))
        };
        let y2_range = y_extent(
            series.iter().filter(|s| s.axis == AxisSide::Secondary),
            &xs,
        );

        offset += n;
        panels.push(Panel {
            index: ds.index().to_vec(),
            xs,
            axis,
            types,
            series,
            y_range,
            y2_range,
        });
    }

    let shared_x = (style.share_subplot_x && panels.len() > 1).then(|| {
        panels
            .iter()
            .map(|p| p.axis.x_range())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (a, b)| {
                (lo.min(a), hi.max(b))
            })
    });

    let has_secondary = panels.iter().any(Panel::has_secondary_axis);
    let legend = style.display_legend.then_some(if has_secondary {
        LegendPlacement {
            primary: LegendLoc::UpperLeft,
            secondary: Some(LegendLoc::UpperRight),
        }
    } else {
        LegendPlacement {
            primary: LegendLoc::Best,
            secondary: None,
        }
    });

    let scale = engine_scale(engine, style);
    let cc = constants();
    let layout = Layout {
        width_px: (style.width as f64 * scale).round().max(1.0) as u32,
        height_px: (style.height as f64 * scale).round().max(1.0) as u32,
        scale,
        title: style.title.clone(),
        x_title: style.x_title.clone(),
        y_title: style.y_title.clone(),
        units: style.units.clone(),
        legend,
        x_grid: style.x_axis_showgrid,
        y_grid: style.y_axis_showgrid,
        y2_grid: style.y_axis_2_showgrid,
        source_label: (style.display_source_label && !style.source.trim().is_empty())
            .then(|| format!("Source: {}", style.source)),
        source_color: style.source_color.clone(),
        brand_label: (style.display_brand_label && !style.brand_label.trim().is_empty())
            .then(|| style.brand_label.clone()),
        brand_color: cc.brand_color.clone(),
        thin_margin: style.thin_margin,
        marker_size: style.marker_size,
        shared_x,
    };

    log::debug!(
        "resolved plan for {engine}: {} panel(s), {total} series, {}x{} px",
        panels.len(),
        layout.width_px,
        layout.height_px
    );

    Ok(ResolvedPlan {
        engine: engine.to_string(),
        panels,
        layout,
        colors,
        outputs: OutputTargets {
            file_output: style.file_output.as_ref().map(PathBuf::from),
            html_file_output: style.html_file_output.as_ref().map(PathBuf::from),
            save_fig: style.save_fig,
            silent_display: style.silent_display,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels_ds(cols: Vec<(&str, Vec<f64>)>) -> Dataset {
        let n = cols.first().map(|c| c.1.len()).unwrap_or(0);
        let idx = (0..n).map(|i| IndexKey::Label(format!("k{i}"))).collect();
        Dataset::from_columns(idx, cols).unwrap()
    }

    #[test]
    fn stacked_bases_split_by_sign() {
        let ds = labels_ds(vec![("a", vec![1.0, -2.0]), ("b", vec![3.0, -1.0])]);
        let plan = resolve_plan(
            &ds.into(),
            &Style::default(),
            &ChartKind::Stacked.into(),
            "matplotlib",
        )
        .unwrap();
        let b = &plan.panels[0].series[1];
        assert_eq!(b.stack_base.as_deref(), Some(&[1.0, -2.0][..]));
        assert_eq!(b.bar_span(1), Some((-2.0, -3.0)));
    }

    #[test]
    fn trendline_fits_exact_line() {
        let t = Trendline::fit(&[0.0, 1.0, 2.0], &[1.0, 3.0, 5.0]).unwrap();
        assert!((t.slope - 2.0).abs() < 1e-12);
        assert!((t.intercept - 1.0).abs() < 1e-12);
        assert!((t.r_squared - 1.0).abs() < 1e-12);
        assert_eq!(t.annotation(), "R^2 = 1.00, m = 2.0000, c = 1.0000");
    }

    #[test]
    fn subplots_split_per_series_and_keep_color_order() {
        let ds = labels_ds(vec![("a", vec![1.0]), ("b", vec![2.0])]);
        let style = Style {
            subplots: true,
            color: crate::color::ColorSpec::list(["red", "blue"]),
            ..Style::default()
        };
        let plan = resolve_plan(&ds.into(), &style, &ChartKind::Line.into(), "bokeh").unwrap();
        assert_eq!(plan.panels.len(), 2);
        assert_eq!(plan.panels[1].series[0].color, Some(Color::parse("blue")));
    }

    #[test]
    fn secondary_axis_moves_legends_apart() {
        let ds = labels_ds(vec![("a", vec![1.0]), ("b", vec![2.0])]);
        let style = Style::default().with_y_axis_2_series(["b"]);
        let plan = resolve_plan(&ds.into(), &style, &ChartKind::Line.into(), "matplotlib").unwrap();
        assert_eq!(
            plan.layout.legend,
            Some(LegendPlacement {
                primary: LegendLoc::UpperLeft,
                secondary: Some(LegendLoc::UpperRight)
            })
        );
        assert!(plan.panels[0].y2_range.is_some());
    }

    #[test]
    fn engine_scale_corrections() {
        let s = Style::default().with_size(600, 400, 3.0);
        assert_eq!(engine_scale("matplotlib", &s), 3.0);
        assert_eq!(engine_scale("bokeh", &s), 2.0);
        let neg = Style::default().with_size(600, 400, -3.0);
        assert_eq!(engine_scale("bokeh", &neg), 3.0);
        let html = Style {
            plotly_plot_mode: "offline_html".into(),
            ..s
        };
        assert_eq!(engine_scale("plotly", &html), 2.0);
    }

    #[test]
    fn empty_data_is_rejected() {
        let ds = Dataset::new(Vec::new(), Vec::new()).unwrap();
        assert!(matches!(
            resolve_plan(&ds.into(), &Style::default(), &ChartKind::Line.into(), "plotly"),
            Err(ChartError::EmptyDataset)
        ));
    }
}
