use chrono::NaiveDate;
use serde_json::{Map, json};
use std::fs;
use tempfile::tempdir;
use unichart::Style;
use unichart::canvas::{CanvasTemplate, dashboard_style};
use unichart::constants::{ChartConstants, load_overrides_file};

#[test]
fn derived_style_leaves_the_original_untouched() {
    let original = Style::new().with_title("Rates").with_size(500, 300, 2.0);
    let before = serde_json::to_value(&original).unwrap();
    let derived = original.with_overrides(|s| {
        s.silent_display = true;
        s.title.clear();
    });
    assert!(derived.silent_display);
    assert!(derived.title.is_empty());
    assert_eq!(serde_json::to_value(&original).unwrap(), before);
}

#[test]
fn dashboard_view_is_silent_and_auto_named() {
    let original = Style::new().with_title("FX").with_size(400, 200, 3.0);
    let plain = dashboard_style(&original, "bokeh", CanvasTemplate::Plain);
    assert!(plain.silent_display && plain.thin_margin);
    assert!(plain.auto_generate_filename && plain.auto_generate_html_filename);
    assert_eq!(plain.title, "FX");
    assert_eq!(plain.scale_factor, 3.0);

    let keen = dashboard_style(&original, "bokeh", CanvasTemplate::Keen);
    assert!(keen.title.is_empty() && keen.source.is_empty());
    assert!((keen.scale_factor - 2.7).abs() < 1e-9);
    assert_eq!(original.title, "FX");
}

#[test]
fn generated_names_are_stable_per_instance() {
    let at = |s| {
        NaiveDate::from_ymd_opt(2025, 1, 31)
            .and_then(|d| d.and_hms_micro_opt(23, 59, s, 5))
            .unwrap()
    };
    let mut style = Style {
        auto_generate_filename: true,
        ..Style::default()
    };
    style.ensure_output_targets("matplotlib", at(1));
    assert_eq!(
        style.file_output.as_deref(),
        Some("2025-01-31-23-59-01-000005-matplotlib.png")
    );
    assert!(style.html_file_output.is_none());
    style.ensure_output_targets("matplotlib", at(2));
    assert_eq!(
        style.file_output.as_deref(),
        Some("2025-01-31-23-59-01-000005-matplotlib.png")
    );
}

#[test]
fn explicit_names_are_never_replaced() {
    let mut style = Style {
        auto_generate_html_filename: true,
        ..Style::default()
    }
    .with_html_file_output("mine.html");
    style.ensure_output_targets("plotly", chrono::Local::now().naive_local());
    assert_eq!(style.html_file_output.as_deref(), Some("mine.html"));
}

#[test]
fn style_file_round_trips_through_json() {
    let dir = tempdir().unwrap();
    let p = dir.path().join("style.json");
    fs::write(
        &p,
        r#"{"title":"Spreads","chart_type":["bar","line"],"y_axis_2_series":["b"],"scale_factor":-1.5}"#,
    )
    .unwrap();
    let style = Style::from_json_file(&p).unwrap();
    assert_eq!(style.title, "Spreads");
    assert!(style.is_secondary_axis("b"));
    assert_eq!(style.scale_magnitude(), 1.5);
    assert!(style.save_fig);
}

#[test]
fn constants_overrides_from_file() {
    let dir = tempdir().unwrap();
    let p = dir.path().join("overrides.json");
    fs::write(&p, r#"{"brand_label":"Desk","height":250}"#).unwrap();
    let map = load_overrides_file(&p).unwrap();
    let c = ChartConstants::with_overrides(&map).unwrap();
    assert_eq!(c.brand_label, "Desk");
    assert_eq!(c.height, 250);
    assert_eq!(c.width, ChartConstants::default().width);
}

#[test]
fn override_file_must_be_an_object() {
    let dir = tempdir().unwrap();
    let p = dir.path().join("overrides.json");
    fs::write(&p, "[1, 2]").unwrap();
    assert!(load_overrides_file(&p).is_err());
}

#[test]
fn color_table_can_be_replaced() {
    let mut m = Map::new();
    m.insert("color_overwrites".into(), json!({ "red": "#ff0000" }));
    let c = ChartConstants::with_overrides(&m).unwrap();
    assert_eq!(c.color_code("red"), Some("#ff0000"));
    assert_eq!(c.color_code("blue"), None);
}
