use std::fs;
use tempfile::tempdir;
use unichart::chart_type::ChartKind;
use unichart::{Canvas, CanvasTemplate, Chart, Dataset, Element, IndexKey, Style};

fn series(name: &str) -> Dataset {
    Dataset::from_columns(
        ["2021", "2022", "2023"].into_iter().map(IndexKey::from).collect(),
        vec![(name, vec![1200.0, 1500.25, 1710.0])],
    )
    .unwrap()
}

fn chart(engine: &str, title: &str) -> Chart {
    Chart::new()
        .with_data(series("sales"))
        .with_engine(engine)
        .with_chart_type(ChartKind::Bar)
        .with_style(Style::new().with_title(title).with_size(200, 100, 1.0))
}

#[test]
fn plain_page_embeds_each_chart_in_a_table_cell() {
    let dir = tempdir().unwrap();
    let page = dir.path().join("board.html");
    let mut canvas = Canvas::new(vec![vec![
        chart("matplotlib", "Static").into(),
        chart("bokeh", "Interactive").into(),
    ]]);
    let written = canvas
        .generate("Sales board", Some(&page), CanvasTemplate::Plain)
        .unwrap();
    assert_eq!(written, page);

    let html = fs::read_to_string(&page).unwrap();
    assert!(html.contains("<h1>Sales board</h1>"));
    assert_eq!(html.matches("<iframe").count(), 2);
    assert!(html.contains("-matplotlib.png\""));
    assert!(html.contains("-bokeh.html\""));
    assert!(html.contains("width=\"240\" height=\"140\""));

    let pngs = fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|x| x == "png"))
        .count();
    assert_eq!(pngs, 1);
}

#[test]
fn chart_styles_survive_generation() {
    let dir = tempdir().unwrap();
    let page = dir.path().join("board.html");
    let original = Style::new().with_title("Kept").with_size(200, 100, 1.0);
    let c = Chart::new()
        .with_data(series("units"))
        .with_engine("plotly")
        .with_style(original.clone());
    let mut canvas = Canvas::default();
    canvas.push_row(vec![c.into()]);
    canvas.generate("t", Some(&page), CanvasTemplate::Keen).unwrap();

    match &canvas.rows()[0][0] {
        Element::Chart(c) => {
            assert_eq!(c.style(), &original);
            assert!(c.is_plotted());
        }
        _ => panic!("expected a chart element"),
    }
}

#[test]
fn keen_page_uses_cards_with_notes() {
    let dir = tempdir().unwrap();
    let page = dir.path().join("keen.html");
    let mut style = Style::new().with_title("Card").with_size(300, 200, 2.0);
    style.source = "Desk".into();
    let c = Chart::new()
        .with_data(series("fx"))
        .with_engine("plotly")
        .with_style(style);
    let mut canvas = Canvas::new(vec![vec![c.into()]]);
    canvas.generate("Keen board", Some(&page), CanvasTemplate::Keen).unwrap();

    let html = fs::read_to_string(&page).unwrap();
    assert!(html.contains("keen-dashboards.css"));
    assert!(html.contains("<div class=\"chart-title\">Card</div>"));
    assert!(html.contains("<div class=\"chart-notes\">Desk</div>"));
    assert!(html.contains("width=\"620\" height=\"420\""));
}

#[test]
fn text_and_tables_sit_beside_charts() {
    let dir = tempdir().unwrap();
    let page = dir.path().join("mixed.html");
    let mut canvas = Canvas::new(vec![vec![
        Element::from("<p>Notes</p>"),
        Element::from(series("revenue")),
    ]]);
    canvas.generate("Mixed", Some(&page), CanvasTemplate::Plain).unwrap();
    let html = fs::read_to_string(&page).unwrap();
    assert!(html.contains("<td><p>Notes</p></td>"));
    assert!(html.contains("<th>revenue</th>"));
    assert!(html.contains("<td>1,500.25</td>"));
}

#[test]
fn failing_charts_are_left_out() {
    let dir = tempdir().unwrap();
    let page = dir.path().join("partial.html");
    let broken = Chart::new().with_data(series("x")).with_engine("excel");
    let mut canvas = Canvas::new(vec![vec![broken.into(), chart("matplotlib", "ok").into()]]);
    canvas.generate("Partial", Some(&page), CanvasTemplate::Plain).unwrap();
    let html = fs::read_to_string(&page).unwrap();
    assert_eq!(html.matches("<iframe").count(), 1);
}
