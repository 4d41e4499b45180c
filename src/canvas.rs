//! HTML dashboards: rows of charts, text blocks and tables.
//!
//! Each chart is rendered through a derived view of its style and embedded
//! with an `<iframe>`; the chart's own style is never modified.

use crate::chart::Chart;
use crate::engine::EngineKind;
use crate::engine::html_escape;
use crate::error::{ChartError, Result};
use crate::models::Dataset;
use crate::style::{Style, timestamp_stem};
use chrono::Local;
use num_format::{Locale, ToFormattedString};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Characters left as-is in iframe `src` paths.
const SRC_SAFE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

const PLAIN_PADDING: f64 = 40.0;
const KEEN_PADDING: f64 = 20.0;
const KEEN_BOKEH_SHRINK: f64 = 0.9;

pub enum Element {
    Chart(Box<Chart>),
    /// HTML fragment, embedded verbatim.
    Text(String),
    Table(Dataset),
}

impl From<Chart> for Element {
    fn from(c: Chart) -> Self {
        Element::Chart(Box::new(c))
    }
}

impl From<&str> for Element {
    fn from(s: &str) -> Self {
        Element::Text(s.to_string())
    }
}

impl From<String> for Element {
    fn from(s: String) -> Self {
        Element::Text(s)
    }
}

impl From<Dataset> for Element {
    fn from(d: Dataset) -> Self {
        Element::Table(d)
    }
}

/// Page layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CanvasTemplate {
    /// Table layout with inline CSS.
    #[default]
    Plain,
    /// Card layout: chart title above, source notes below.
    Keen,
}

impl FromStr for CanvasTemplate {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plain" => Ok(CanvasTemplate::Plain),
            "keen" => Ok(CanvasTemplate::Keen),
            _ => Err(ChartError::UnknownTemplate {
                name: s.to_string(),
            }),
        }
    }
}

/// An embedded chart after rendering.
struct Frame {
    src: Option<String>,
    width: f64,
    height: f64,
    title: String,
    notes: String,
}

#[derive(Default)]
pub struct Canvas {
    rows: Vec<Vec<Element>>,
}

impl Canvas {
    pub fn new(rows: Vec<Vec<Element>>) -> Self {
        Self { rows }
    }

    pub fn push_row(&mut self, row: Vec<Element>) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[Vec<Element>] {
        &self.rows
    }

    /// Render every chart and write the page. Returns the page path, which
    /// defaults to `<timestamp>-canvas.html` in the working directory.
    ///
    /// A chart that cannot be rendered is logged and left out of the page.
    pub fn generate(
        &mut self,
        page_title: &str,
        output: Option<&Path>,
        template: CanvasTemplate,
    ) -> Result<PathBuf> {
        let path = match output {
            Some(p) => p.to_path_buf(),
            None => PathBuf::from(format!(
                "{}-canvas.html",
                timestamp_stem(Local::now().naive_local())
            )),
        };
        let dir = match path.parent() {
            Some(d) if !d.as_os_str().is_empty() => d.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let mut body = String::new();
        for row in &mut self.rows {
            match template {
                CanvasTemplate::Plain => body.push_str("<tr>\n"),
                CanvasTemplate::Keen => body.push_str("<div class=\"row\">\n"),
            }
            for element in row.iter_mut() {
                let html = match element {
                    Element::Chart(chart) => render_frame(chart, template, &dir)
                        .map(|f| frame_html(&f, template))
                        .unwrap_or_default(),
                    Element::Text(text) => text.clone(),
                    Element::Table(data) => table_html(data),
                };
                match template {
                    CanvasTemplate::Plain => {
                        let _ = writeln!(body, "<td>{html}</td>");
                    }
                    CanvasTemplate::Keen => {
                        let _ = writeln!(body, "<div style=\"display:inline-block;\">{html}</div>");
                    }
                }
            }
            match template {
                CanvasTemplate::Plain => body.push_str("</tr>\n"),
                CanvasTemplate::Keen => body.push_str("</div>\n"),
            }
        }

        let page = match template {
            CanvasTemplate::Plain => plain_page(page_title, &body),
            CanvasTemplate::Keen => keen_page(page_title, &body),
        };
        fs::write(&path, page)?;
        log::info!("wrote dashboard {}", path.display());
        Ok(path)
    }
}

/// The style a chart is drawn with inside a dashboard.
pub fn dashboard_style(style: &Style, engine: &str, template: CanvasTemplate) -> Style {
    style.with_overrides(|s| {
        s.silent_display = true;
        s.thin_margin = true;
        s.auto_generate_filename = true;
        s.auto_generate_html_filename = true;
        if template == CanvasTemplate::Keen {
            s.title.clear();
            s.source.clear();
            if engine.eq_ignore_ascii_case("bokeh") {
                s.scale_factor *= KEEN_BOKEH_SHRINK;
            }
        }
    })
}

fn render_frame(chart: &mut Chart, template: CanvasTemplate, dir: &Path) -> Option<Frame> {
    let engine = chart.engine_name().to_string();
    let mut derived = dashboard_style(chart.style(), &engine, template);

    // Generated names land next to the page.
    let (had_file, had_html) = (derived.file_output.is_some(), derived.html_file_output.is_some());
    derived.ensure_output_targets(&engine.to_ascii_lowercase(), Local::now().naive_local());
    let beside_page = |name: Option<String>| {
        name.map(|n| dir.join(n).to_string_lossy().into_owned())
    };
    if !had_file {
        derived.file_output = beside_page(derived.file_output.take());
    }
    if !had_html {
        derived.html_file_output = beside_page(derived.html_file_output.take());
    }

    let outcome = match chart.plot_with_style(&mut derived) {
        Ok(o) => o,
        Err(e) => {
            log::warn!("dashboard: chart '{}' not rendered: {e}", chart.style().title);
            return None;
        }
    };

    let target = match engine.parse::<EngineKind>() {
        Ok(kind) if kind.embeds_static_file() => derived.file_output.clone().map(PathBuf::from),
        Ok(_) => derived.html_file_output.clone().map(PathBuf::from),
        Err(_) => None,
    };
    let src = outcome
        .output_path()
        .map(Path::to_path_buf)
        .or(target)
        .filter(|p| p.exists())
        .map(|p| {
            let rel = p.strip_prefix(dir).map(Path::to_path_buf).unwrap_or(p);
            utf8_percent_encode(&rel.to_string_lossy(), SRC_SAFE).to_string()
        });

    let original = chart.style();
    let padding = match template {
        CanvasTemplate::Plain => PLAIN_PADDING,
        CanvasTemplate::Keen => KEEN_PADDING,
    };
    Some(Frame {
        src,
        width: original.width as f64 * original.scale_factor.abs() + padding,
        height: original.height as f64 * original.scale_factor.abs() + padding,
        title: original.title.clone(),
        notes: original.source.clone(),
    })
}

/// Pixel sizes print without a trailing `.0`.
fn px(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

fn iframe(f: &Frame, src: &str, align: bool) -> String {
    format!(
        "<iframe src=\"{src}\" width=\"{}\" height=\"{}\" frameborder=\"0\" scrolling=\"no\"{}></iframe>",
        px(f.width),
        px(f.height),
        if align { " align=\"middle\"" } else { "" }
    )
}

fn frame_html(f: &Frame, template: CanvasTemplate) -> String {
    match template {
        CanvasTemplate::Plain => f
            .src
            .as_deref()
            .map(|src| iframe(f, src, false))
            .unwrap_or_default(),
        CanvasTemplate::Keen => {
            let mut html = format!(
                "<div style=\"display:inline-block; width: {}px\">\n<div class=\"chart-wrapper\">\n\
                 <div class=\"chart-title\">{}</div>\n",
                px(f.width),
                html_escape(&f.title)
            );
            if let Some(src) = &f.src {
                let _ = write!(
                    html,
                    "<div style=\"display:inline-block; height: {}px; vertical-align: center\" \
                     class=\"chart-stage\">{}</div>\n<div class=\"chart-notes\">{}</div>\n",
                    px(f.height),
                    iframe(f, src, true),
                    html_escape(&f.notes)
                );
            }
            html.push_str("</div>\n</div>");
            html
        }
    }
}

fn format_number(v: f64) -> String {
    if !v.is_finite() {
        return String::new();
    }
    let sign = if v < 0.0 { "-" } else { "" };
    let a = v.abs();
    let whole = a.trunc() as i64;
    let cents = ((a - a.trunc()) * 100.0).round() as i64;
    // Rounding the fraction up carries into the integer part.
    let (whole, cents) = if cents == 100 { (whole + 1, 0) } else { (whole, cents) };
    if v.fract() == 0.0 {
        format!("{sign}{}", whole.to_formatted_string(&Locale::en))
    } else {
        format!("{sign}{}.{cents:02}", whole.to_formatted_string(&Locale::en))
    }
}

/// A dataset as an HTML table, index in the first column.
pub fn table_html(data: &Dataset) -> String {
    let mut html = String::from("<table class=\"dataframe\" border=\"0\">\n<thead>\n<tr><th></th>");
    for label in data.labels() {
        let _ = write!(html, "<th>{}</th>", html_escape(&label));
    }
    html.push_str("</tr>\n</thead>\n<tbody>\n");
    for (row, key) in data.index().iter().enumerate() {
        let _ = write!(html, "<tr><th>{}</th>", html_escape(&key.to_string()));
        for s in data.series() {
            let _ = write!(html, "<td>{}</td>", format_number(s.values[row]));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody>\n</table>");
    html
}

const PLAIN_CSS: &str = r#"<style>
a, a:focus, a:hover, a:active {
  color: #00afd7;
}
p, tr {
  font-family: "Open Sans Light", "Raleway", "Helvetica Neue", Helvetica, Arial, sans-serif;
}
h1, h2, h3 {
  font-family: "Open Sans Light", "Raleway", "Helvetica Neue", Helvetica, Arial, sans-serif;
  margin: 12px 0;
}
h1 {
  font-size: 32px;
  font-weight: 100;
  letter-spacing: .02em;
  line-height: 48px;
}
td, tr {
  text-align: center;
  vertical-align: text-top;
  font-size: 12px;
}
</style>"#;

fn plain_page(title: &str, rows: &str) -> String {
    let title = html_escape(title);
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n{PLAIN_CSS}\n</head>\n<body>\n\
         <h1>{title}</h1>\n<table cellpadding=\"0\">\n{rows}</table>\n</body>\n</html>\n"
    )
}

fn keen_page(title: &str, rows: &str) -> String {
    let title = html_escape(title);
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<link rel="stylesheet" type="text/css" href="static/css/bootstrap.min.css" />
<link rel="stylesheet" type="text/css" href="static/css/keen-dashboards.css" />
</head>
<body class="application">
<div class="navbar navbar-inverse navbar-fixed-top" role="navigation">
<div class="container-fluid">
<div class="navbar-header">
<a class="navbar-brand">{title}</a>
</div>
</div>
</div>
<div class="container-fluid">
{rows}</div>
</body>
</html>
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_get_thousands_separators() {
        assert_eq!(format_number(1234567.0), "1,234,567");
        assert_eq!(format_number(-1234.5), "-1,234.50");
        assert_eq!(format_number(0.999), "1.00");
        assert_eq!(format_number(f64::NAN), "");
    }

    #[test]
    fn keen_clears_title_and_shrinks_bokeh() {
        let style = Style::default()
            .with_title("GDP")
            .with_size(600, 400, 2.0);
        let derived = dashboard_style(&style, "bokeh", CanvasTemplate::Keen);
        assert!(derived.title.is_empty());
        assert!((derived.scale_factor - 1.8).abs() < 1e-12);
        assert!(derived.thin_margin && derived.silent_display);
        let plain = dashboard_style(&style, "bokeh", CanvasTemplate::Plain);
        assert_eq!(plain.title, "GDP");
        assert_eq!(plain.scale_factor, 2.0);
    }

    #[test]
    fn pixel_sizes_drop_trailing_zero() {
        assert_eq!(px(1240.0), "1240");
        assert_eq!(px(12.5), "12.5");
    }

    #[test]
    fn template_names_parse() {
        assert_eq!("Keen".parse::<CanvasTemplate>().unwrap(), CanvasTemplate::Keen);
        assert!("fancy".parse::<CanvasTemplate>().is_err());
    }
}
