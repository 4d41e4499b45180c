use unichart::color::{self, Color, Colormap, Rgba};
use unichart::{ColorSpec, Style};

#[test]
fn one_entry_per_label_in_input_order() {
    let style = Style::new().with_color(ColorSpec::list(["#112233", "#445566", "#778899"]));
    let labels = ["gdp", "cpi", "rates"];
    let colors = color::resolve(&labels, &style);
    assert_eq!(colors.len(), 3);
    assert_eq!(colors.labels(), vec!["gdp", "cpi", "rates"]);
    assert_eq!(
        colors.at(1).and_then(Color::rgba),
        Some(Rgba::opaque(0x44, 0x55, 0x66))
    );
}

#[test]
fn excluded_labels_get_no_color_and_do_not_consume_one() {
    let style = Style::new()
        .with_color(ColorSpec::list(["#ff0000", "#00ff00"]))
        .with_exclude_from_color(["b"]);
    let colors = color::resolve(&["a", "b", "c"], &style);
    assert!(colors.get("b").is_none());
    assert_eq!(
        colors.get("c").and_then(Color::rgba),
        Some(Rgba::opaque(0, 255, 0))
    );
}

#[test]
fn named_colors_use_the_softer_table() {
    let style = Style::new().with_color(ColorSpec::list(["red", "blue"]));
    let colors = color::resolve(&["x", "y"], &style);
    assert_eq!(
        colors.at(0).and_then(Color::rgba),
        Some(Rgba::opaque(0xE2, 0x4A, 0x33))
    );
    assert_eq!(
        colors.at(1).and_then(Color::rgba),
        Some(Rgba::opaque(0x34, 0x8A, 0xBD))
    );
}

#[test]
fn short_list_leaves_the_rest_to_the_engine() {
    let style = Style::new().with_color(ColorSpec::list(["#000000"]));
    let colors = color::resolve(&["a", "b"], &style);
    assert!(colors.at(0).is_some());
    assert!(colors.at(1).is_none());
}

#[test]
fn colormap_expands_to_bucket_size() {
    let style = Style::new().with_color(ColorSpec::colormap("Blues"));
    let colors = color::resolve(&["a", "b", "c", "d"], &style);
    let cm = Colormap::by_name("Blues").unwrap();
    let expected: Vec<Option<Color>> = cm.expand(4).into_iter().map(|c| Some(Color::Rgba(c))).collect();
    assert_eq!(colors.colors(), expected);
}

#[test]
fn secondary_bucket_counts_positions_separately() {
    let style = Style::new()
        .with_color(ColorSpec::list(["#010101", "#020202"]))
        .with_color_2(ColorSpec::list(["#0a0a0a"]))
        .with_color_2_series(["b"]);
    let colors = color::resolve(&["a", "b", "c"], &style);
    assert_eq!(colors.get("a").and_then(Color::rgba), Some(Rgba::opaque(1, 1, 1)));
    assert_eq!(colors.get("b").and_then(Color::rgba), Some(Rgba::opaque(10, 10, 10)));
    assert_eq!(colors.get("c").and_then(Color::rgba), Some(Rgba::opaque(2, 2, 2)));
}

#[test]
fn unknown_colormap_falls_back_to_palette() {
    let style = Style::new().with_color(ColorSpec::colormap("no_such_map"));
    let colors = color::resolve(&["a", "b"], &style);
    assert_eq!(colors.colors(), vec![None, None]);
}

#[test]
fn unparseable_specs_pass_through_verbatim() {
    let style = Style::new().with_color(ColorSpec::list(["C0"]));
    let colors = color::resolve(&["a"], &style);
    assert_eq!(colors.at(0), Some(&Color::Spec("C0".into())));
}
