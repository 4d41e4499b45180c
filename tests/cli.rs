use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

const CSV: &str = "quarter,revenue,costs\nQ1,10,7\nQ2,12.5,8\nQ3,9,\nQ4,14,9.5\n";

#[test]
fn cli_shows_help() {
    let mut cmd = Command::cargo_bin("unichart").unwrap();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("dashboard"));
}

#[test]
fn plot_writes_png_and_reports_json() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("q.csv");
    let out = dir.path().join("q.png");
    fs::write(&input, CSV).unwrap();

    let mut cmd = Command::cargo_bin("unichart").unwrap();
    cmd.env("XDG_CONFIG_HOME", dir.path())
        .arg("plot")
        .arg("--input")
        .arg(&input)
        .args(["--engine", "matplotlib", "-t", "bar", "--json", "--out"])
        .arg(&out);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"drawn\""))
        .stderr(predicate::str::contains("Wrote matplotlib chart"));
    assert!(out.exists());
}

#[test]
fn plot_html_engine_uses_out_as_page() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("q.csv");
    let out = dir.path().join("q.html");
    fs::write(&input, CSV).unwrap();

    let mut cmd = Command::cargo_bin("unichart").unwrap();
    cmd.env("XDG_CONFIG_HOME", dir.path())
        .arg("plot")
        .arg("--input")
        .arg(&input)
        .args(["--engine", "plotly", "-t", "line,bar", "--title", "Q"])
        .arg("--out")
        .arg(&out);
    cmd.assert().success();
    assert!(fs::read_to_string(&out).unwrap().contains("\"type\":\"bar\""));
}

#[test]
fn unknown_engine_fails() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("q.csv");
    fs::write(&input, CSV).unwrap();

    let mut cmd = Command::cargo_bin("unichart").unwrap();
    cmd.env("XDG_CONFIG_HOME", dir.path())
        .arg("plot")
        .arg("--input")
        .arg(&input)
        .args(["--engine", "excel"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("unknown engine"));
}

#[test]
fn dashboard_lists_one_row_per_input() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("north.csv");
    let b = dir.path().join("south.csv");
    fs::write(&a, CSV).unwrap();
    fs::write(&b, CSV).unwrap();
    let page = dir.path().join("board").join("index.html");

    let mut cmd = Command::cargo_bin("unichart").unwrap();
    cmd.env("XDG_CONFIG_HOME", dir.path())
        .arg("dashboard")
        .arg("--input")
        .arg(&a)
        .arg("--input")
        .arg(&b)
        .args(["--engine", "bokeh", "--tables", "--template", "keen", "--out"])
        .arg(&page);
    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Wrote dashboard"));

    let html = fs::read_to_string(&page).unwrap();
    assert_eq!(html.matches("<iframe").count(), 2);
    assert!(html.contains("chart-title\">north<"));
    assert!(html.contains("<th>revenue</th>"));
}

#[test]
fn dashboard_engine_flag_beats_the_style_file() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("q.csv");
    let style = dir.path().join("style.json");
    fs::write(&input, CSV).unwrap();
    fs::write(&style, r#"{"engine": "bokeh"}"#).unwrap();
    let page = dir.path().join("index.html");

    let mut cmd = Command::cargo_bin("unichart").unwrap();
    cmd.env("XDG_CONFIG_HOME", dir.path())
        .arg("dashboard")
        .arg("--input")
        .arg(&input)
        .arg("--style")
        .arg(&style)
        .args(["--engine", "matplotlib", "--out"])
        .arg(&page);
    cmd.assert().success();

    let html = fs::read_to_string(&page).unwrap();
    assert!(html.contains("-matplotlib.png\""));
    assert!(!html.contains("-bokeh.html"));
}

#[test]
fn bad_overrides_file_is_reported() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("q.csv");
    let overrides = dir.path().join("o.json");
    fs::write(&input, CSV).unwrap();
    fs::write(&overrides, "[]").unwrap();

    let mut cmd = Command::cargo_bin("unichart").unwrap();
    cmd.arg("--overrides")
        .arg(&overrides)
        .arg("plot")
        .arg("--input")
        .arg(&input);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("reading overrides"));
}
