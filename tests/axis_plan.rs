use chrono::NaiveDate;
use unichart::axis::{AxisPlan, TickStep, round_to_1};
use unichart::chart_type::ChartKind;
use unichart::plan::resolve_plan;
use unichart::{Dataset, IndexKey, PlotData, Style};

fn minutes(span: u32) -> Vec<IndexKey> {
    let start = NaiveDate::from_ymd_opt(2024, 5, 6)
        .and_then(|d| d.and_hms_opt(9, 0, 0))
        .unwrap();
    (0..=span)
        .step_by(5)
        .map(|m| IndexKey::Timestamp(start + chrono::Duration::minutes(m as i64)))
        .collect()
}

fn categories(n: usize) -> Vec<IndexKey> {
    (0..n).map(|i| IndexKey::Label(format!("k{i}"))).collect()
}

#[test]
fn forty_five_minute_line_chart() {
    let index = minutes(45);
    let n = index.len();
    let ds = Dataset::from_columns(index, vec![("px", (0..n).map(|i| i as f64).collect())]).unwrap();
    let plan = resolve_plan(&PlotData::from(ds), &Style::default(), &ChartKind::Line.into(), "matplotlib")
        .unwrap();
    match &plan.panels[0].axis {
        AxisPlan::Time { major, minor, .. } => {
            assert_eq!(*major, TickStep::Minutes(5));
            assert_eq!(*minor, Some(TickStep::Minutes(2)));
        }
        other => panic!("expected a time axis, got {other:?}"),
    }
}

#[test]
fn bar_labels_rotate_past_six_categories() {
    for (n, rotated) in [(6, false), (7, true)] {
        let ds = Dataset::from_columns(categories(n), vec![("v", vec![1.0; n])]).unwrap();
        let plan =
            resolve_plan(&PlotData::from(ds), &Style::default(), &ChartKind::Bar.into(), "plotly")
                .unwrap();
        match &plan.panels[0].axis {
            AxisPlan::Bar { rotate_labels, .. } => assert_eq!(*rotate_labels, rotated, "n = {n}"),
            other => panic!("expected a bar axis, got {other:?}"),
        }
    }
}

#[test]
fn bar_positions_are_category_numbers() {
    let ds = Dataset::from_columns(
        vec![IndexKey::from(2001.0), IndexKey::from(2002.0)],
        vec![("a", vec![1.0, 2.0]), ("b", vec![3.0, 4.0])],
    )
    .unwrap();
    let plan = resolve_plan(&PlotData::from(ds), &Style::default(), &ChartKind::Bar.into(), "bokeh")
        .unwrap();
    let panel = &plan.panels[0];
    assert_eq!(panel.xs, vec![0.0, 1.0]);
    assert_eq!(panel.axis.format_x(0.0), "2001");
    assert_eq!(panel.series[1].slot, Some(1));
}

#[test]
fn heatmap_axis_covers_the_grid() {
    let ds = Dataset::from_columns(
        categories(3),
        vec![("x", vec![1.0, 2.0, 3.0]), ("y", vec![4.0, 5.0, 6.0])],
    )
    .unwrap();
    let plan = resolve_plan(&PlotData::from(ds), &Style::default(), &ChartKind::Heatmap.into(), "plotly")
        .unwrap();
    assert!(plan.is_matrix());
    let panel = &plan.panels[0];
    assert!(matches!(panel.axis, AxisPlan::Matrix { rows: 3, cols: 2, .. }));
    assert_eq!(panel.grid()[2], vec![3.0, 6.0]);
}

#[test]
fn numeric_steps_use_one_significant_figure() {
    assert_eq!(round_to_1(1234.0), 1000.0);
    assert_eq!(round_to_1(0.00047), 0.0005);
    assert_eq!(round_to_1(-0.26), -0.3);
}
