use unichart::chart_type::{self, ChartKind, ChartTypeSpec};
use unichart::ChartError;

#[test]
fn scalar_bar_over_three_series() {
    let r = chart_type::resolve(3, &ChartKind::Bar.into(), None).unwrap();
    assert_eq!(r.kinds.len(), 3);
    assert!(r.is_bar_family);
    assert!(!r.is_matrix);
    assert_eq!(r.bar_slot_count, 3);
    assert_eq!(
        (0..3).map(|i| r.slot_index(i)).collect::<Vec<_>>(),
        vec![Some(0), Some(1), Some(2)]
    );
}

#[test]
fn style_scalar_beats_call_list() {
    let call: ChartTypeSpec = vec![ChartKind::Line, ChartKind::Bar].into();
    let style: ChartTypeSpec = ChartKind::Scatter.into();
    let r = chart_type::resolve(2, &call, Some(&style)).unwrap();
    assert_eq!(r.kinds, vec![ChartKind::Scatter; 2]);
    assert!(!r.is_bar_family);
}

#[test]
fn style_list_must_match_series_count() {
    let style: ChartTypeSpec = vec![ChartKind::Bar, ChartKind::Line, ChartKind::Line].into();
    let err = chart_type::resolve(2, &ChartKind::Line.into(), Some(&style)).unwrap_err();
    assert!(matches!(err, ChartError::ChartTypeCount { expected: 2, got: 3 }));
}

#[test]
fn barh_and_stacked_are_bar_family() {
    for kind in [ChartKind::Barh, ChartKind::Stacked] {
        let r = chart_type::resolve(2, &kind.into(), None).unwrap();
        assert!(r.is_bar_family, "{kind}");
    }
}

#[test]
fn surface_must_stand_alone() {
    let spec: ChartTypeSpec = vec![ChartKind::Surface, ChartKind::Bar].into();
    let err = chart_type::resolve(2, &spec, None).unwrap_err();
    assert!(matches!(err, ChartError::MixedMatrix { .. }));
    assert!(err.to_string().contains("surface"));
}

#[test]
fn specs_parse_from_text() {
    let spec: ChartTypeSpec = "line; bar".parse().unwrap();
    assert_eq!(spec, ChartTypeSpec::PerSeries(vec![ChartKind::Line, ChartKind::Bar]));
    assert!(matches!(
        "".parse::<ChartTypeSpec>(),
        Err(ChartError::UnknownChartKind { .. })
    ));
}

#[test]
fn specs_deserialize_from_json() {
    let single: ChartTypeSpec = serde_json::from_str("\"barh\"").unwrap();
    assert_eq!(single, ChartTypeSpec::Single(ChartKind::Barh));
    let list: ChartTypeSpec = serde_json::from_str("[\"line\",\"scatter\"]").unwrap();
    assert_eq!(
        list,
        ChartTypeSpec::PerSeries(vec![ChartKind::Line, ChartKind::Scatter])
    );
}
