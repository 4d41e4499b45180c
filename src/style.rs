//! Rendering configuration.
//!
//! A [`Style`] is a plain value with real defaults (taken from the
//! process-wide constants table) and `Option` for settings whose absence is
//! meaningful. Transient changes, such as the dashboard silencing display,
//! are made on a derived copy via [`Style::with_overrides`]; the original is
//! never touched.

use crate::chart_type::ChartTypeSpec;
use crate::color::ColorSpec;
use crate::constants::constants;
use crate::error::Result;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Style {
    // captions
    pub title: String,
    pub x_title: String,
    pub y_title: String,
    pub units: String,

    // plot kind
    pub engine: Option<String>,
    pub chart_type: Option<ChartTypeSpec>,

    // colors
    pub color: ColorSpec,
    pub color_2: ColorSpec,
    pub color_2_series: Vec<String>,
    pub exclude_from_color: Vec<String>,

    // subplots
    pub subplots: bool,
    pub share_subplot_x: bool,

    // sizes
    /// Magnitude scales the pixel size; the sign is an engine-specific layout switch.
    pub scale_factor: f64,
    pub width: u32,
    pub height: u32,
    pub thin_margin: bool,

    // lines and secondary axis
    pub y_axis_2_series: Vec<String>,
    pub linewidth_2_series: Vec<String>,
    pub linewidth: Option<f64>,
    pub linewidth_2: Option<f64>,
    pub marker_size: f64,
    pub line_of_best_fit: bool,

    // grids
    pub x_axis_showgrid: bool,
    pub y_axis_showgrid: bool,
    pub y_axis_2_showgrid: bool,

    // annotations
    pub brand_label: String,
    pub display_brand_label: bool,
    pub source: String,
    pub source_color: String,
    pub display_source_label: bool,
    pub display_legend: bool,

    // output
    pub silent_display: bool,
    pub file_output: Option<String>,
    pub html_file_output: Option<String>,
    /// strftime pattern overriding the automatic date label format.
    pub date_formatter: Option<String>,
    pub auto_generate_filename: bool,
    pub auto_generate_html_filename: bool,
    pub save_fig: bool,

    // engine sub-settings
    pub plotly_plot_mode: String,
    pub plotly_theme: String,
    /// Series holding choropleth values; defaults to the first series.
    pub plotly_choropleth_field: Option<String>,
    pub plotly_location_mode: String,
    pub plotly_scope: String,
    pub plotly_projection: String,
    pub bokeh_plot_mode: String,
}

impl Default for Style {
    fn default() -> Self {
        let cc = constants();
        Self {
            title: String::new(),
            x_title: String::new(),
            y_title: String::new(),
            units: String::new(),
            engine: None,
            chart_type: None,
            color: ColorSpec::default(),
            color_2: ColorSpec::default(),
            color_2_series: Vec::new(),
            exclude_from_color: Vec::new(),
            subplots: false,
            share_subplot_x: false,
            scale_factor: cc.scale_factor,
            width: cc.width,
            height: cc.height,
            thin_margin: false,
            y_axis_2_series: Vec::new(),
            linewidth_2_series: Vec::new(),
            linewidth: None,
            linewidth_2: None,
            marker_size: 1.0,
            line_of_best_fit: false,
            x_axis_showgrid: true,
            y_axis_showgrid: true,
            y_axis_2_showgrid: true,
            brand_label: cc.brand_label.clone(),
            display_brand_label: cc.display_brand_label,
            source: cc.source.clone(),
            source_color: "black".into(),
            display_source_label: cc.display_source_label,
            display_legend: true,
            silent_display: cc.silent_display,
            file_output: None,
            html_file_output: None,
            date_formatter: None,
            auto_generate_filename: false,
            auto_generate_html_filename: false,
            save_fig: true,
            plotly_plot_mode: cc.plotly_plot_mode.clone(),
            plotly_theme: cc.plotly_theme.clone(),
            plotly_choropleth_field: None,
            plotly_location_mode: "USA-states".into(),
            plotly_scope: "usa".into(),
            plotly_projection: "albers usa".into(),
            bokeh_plot_mode: cc.bokeh_plot_mode.clone(),
        }
    }
}

fn to_labels<I, T>(labels: I) -> Vec<String>
where
    I: IntoIterator<Item = T>,
    T: ToString,
{
    labels.into_iter().map(|l| l.to_string()).collect()
}

/// Stem used for generated file names: the timestamp with `:`, ` ` and `.`
/// replaced by `-`, e.g. `2024-03-01-12-30-05-123456`.
pub fn timestamp_stem(now: NaiveDateTime) -> String {
    now.format("%Y-%m-%d %H:%M:%S%.6f")
        .to_string()
        .replace([':', ' ', '.'], "-")
}

impl Style {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a style from a JSON object; missing fields keep their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let txt = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&txt)?)
    }

    /// A modified copy. `self` is left exactly as it was.
    pub fn with_overrides(&self, apply: impl FnOnce(&mut Style)) -> Style {
        let mut derived = self.clone();
        apply(&mut derived);
        derived
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = Some(engine.into());
        self
    }

    pub fn with_chart_type(mut self, chart_type: impl Into<ChartTypeSpec>) -> Self {
        self.chart_type = Some(chart_type.into());
        self
    }

    pub fn with_color(mut self, color: ColorSpec) -> Self {
        self.color = color;
        self
    }

    pub fn with_color_2(mut self, color: ColorSpec) -> Self {
        self.color_2 = color;
        self
    }

    pub fn with_color_2_series<I: IntoIterator<Item = T>, T: ToString>(mut self, labels: I) -> Self {
        self.color_2_series = to_labels(labels);
        self
    }

    pub fn with_exclude_from_color<I: IntoIterator<Item = T>, T: ToString>(
        mut self,
        labels: I,
    ) -> Self {
        self.exclude_from_color = to_labels(labels);
        self
    }

    pub fn with_y_axis_2_series<I: IntoIterator<Item = T>, T: ToString>(mut self, labels: I) -> Self {
        self.y_axis_2_series = to_labels(labels);
        self
    }

    pub fn with_linewidth_2_series<I: IntoIterator<Item = T>, T: ToString>(
        mut self,
        labels: I,
    ) -> Self {
        self.linewidth_2_series = to_labels(labels);
        self
    }

    pub fn with_size(mut self, width: u32, height: u32, scale_factor: f64) -> Self {
        self.width = width;
        self.height = height;
        self.scale_factor = scale_factor;
        self
    }

    pub fn with_file_output(mut self, path: impl Into<String>) -> Self {
        self.file_output = Some(path.into());
        self
    }

    pub fn with_html_file_output(mut self, path: impl Into<String>) -> Self {
        self.html_file_output = Some(path.into());
        self
    }

    /// Fill empty output targets whose auto-generate flag is set.
    ///
    /// Names look like `<timestamp stem>-<engine>.png` / `.html`. A target
    /// that already holds a name is left alone, so repeated calls on one
    /// instance keep the first name.
    pub fn ensure_output_targets(&mut self, engine: &str, now: NaiveDateTime) {
        let stem = timestamp_stem(now);
        if self.auto_generate_filename && self.file_output.is_none() {
            let name = format!("{stem}-{engine}.png");
            log::debug!("auto-generated file output {name}");
            self.file_output = Some(name);
        }
        if self.auto_generate_html_filename && self.html_file_output.is_none() {
            let name = format!("{stem}-{engine}.html");
            log::debug!("auto-generated html file output {name}");
            self.html_file_output = Some(name);
        }
    }

    /// Pixel multiplier (the magnitude of `scale_factor`).
    pub fn scale_magnitude(&self) -> f64 {
        let s = self.scale_factor.abs();
        if s > 0.0 { s } else { 1.0 }
    }

    pub fn is_secondary_axis(&self, label: &str) -> bool {
        self.y_axis_2_series.iter().any(|l| l == label)
    }

    pub fn uses_linewidth_2(&self, label: &str) -> bool {
        self.linewidth_2_series.iter().any(|l| l == label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32, micro: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .and_then(|d| d.and_hms_micro_opt(h, m, s, micro))
            .unwrap()
    }

    #[test]
    fn stem_replaces_separators() {
        assert_eq!(timestamp_stem(at(12, 30, 5, 123456)), "2024-03-01-12-30-05-123456");
    }

    #[test]
    fn output_targets_are_generated_once() {
        let mut s = Style {
            auto_generate_filename: true,
            auto_generate_html_filename: true,
            ..Style::default()
        };
        s.ensure_output_targets("bokeh", at(1, 2, 3, 4));
        assert_eq!(s.file_output.as_deref(), Some("2024-03-01-01-02-03-000004-bokeh.png"));
        assert_eq!(
            s.html_file_output.as_deref(),
            Some("2024-03-01-01-02-03-000004-bokeh.html")
        );
        let first = s.clone();
        s.ensure_output_targets("bokeh", at(9, 9, 9, 9));
        assert_eq!(s, first);
    }

    #[test]
    fn no_flags_no_names() {
        let mut s = Style::default();
        s.ensure_output_targets("plotly", at(0, 0, 0, 0));
        assert!(s.file_output.is_none() && s.html_file_output.is_none());
    }

    #[test]
    fn label_setters_coerce_to_strings() {
        let s = Style::new().with_color_2_series([2020, 2021]);
        assert_eq!(s.color_2_series, vec!["2020".to_string(), "2021".to_string()]);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let s: Style = serde_json::from_str(r#"{"title":"GDP","color":"Blues"}"#).unwrap();
        assert_eq!(s.title, "GDP");
        assert_eq!(s.color, ColorSpec::Colormap("Blues".into()));
        assert_eq!(s.width, constants().width);
        assert!(s.display_legend);
    }
}
