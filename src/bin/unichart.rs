use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use unichart::constants::{install_overrides, load_overrides_file, user_overrides_path};
use unichart::{
    Canvas, CanvasTemplate, Chart, ChartTypeSpec, Dataset, Element, EngineKind, Style, storage,
};

#[derive(Parser, Debug)]
#[command(
    name = "unichart",
    version,
    about = "Render CSV/JSON datasets through matplotlib-, bokeh- or plotly-style engines"
)]
struct Cli {
    /// JSON file of chart constant overrides (defaults to the user config file).
    #[arg(long, global = true)]
    overrides: Option<PathBuf>,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render one dataset as a chart.
    Plot(PlotArgs),
    /// Render several datasets into an HTML dashboard.
    Dashboard(DashboardArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Template {
    Plain,
    Keen,
}

#[derive(Args, Debug)]
struct PlotArgs {
    /// Dataset file (.csv with the index in the first column, or .json).
    #[arg(short, long)]
    input: PathBuf,
    /// Engine name (matplotlib, bokeh, plotly, bqplot, vispy).
    #[arg(short, long)]
    engine: Option<String>,
    /// Chart kind, or one kind per series separated by comma (e.g., bar,line).
    #[arg(short = 't', long)]
    chart_type: Option<String>,
    /// Style JSON file; missing fields keep their defaults.
    #[arg(long)]
    style: Option<PathBuf>,
    /// Output file (PNG for static engines, HTML otherwise).
    #[arg(long)]
    out: Option<PathBuf>,
    /// Chart title.
    #[arg(long)]
    title: Option<String>,
    /// One panel per series.
    #[arg(long, default_value_t = false)]
    subplots: bool,
    /// Print the render outcome as JSON to stdout.
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Args, Debug)]
struct DashboardArgs {
    /// Dataset files; each becomes one row of the dashboard.
    #[arg(short, long, required = true)]
    input: Vec<PathBuf>,
    #[arg(short, long)]
    engine: Option<String>,
    #[arg(short = 't', long)]
    chart_type: Option<String>,
    #[arg(long)]
    style: Option<PathBuf>,
    /// Page title.
    #[arg(long, default_value = "unichart dashboard")]
    title: String,
    #[arg(long, value_enum, default_value_t = Template::Plain)]
    template: Template,
    /// Also show each dataset as a table next to its chart.
    #[arg(long, default_value_t = false)]
    tables: bool,
    /// Dashboard file (defaults to `<timestamp>-canvas.html`).
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    load_overrides(cli.overrides.as_deref())?;
    match cli.cmd {
        Command::Plot(args) => cmd_plot(args),
        Command::Dashboard(args) => cmd_dashboard(args),
    }
}

fn load_overrides(explicit: Option<&Path>) -> Result<()> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => match user_overrides_path() {
            Some(p) if p.exists() => p,
            _ => return Ok(()),
        },
    };
    let map = load_overrides_file(&path)
        .with_context(|| format!("reading overrides from {}", path.display()))?;
    install_overrides(&map)?;
    Ok(())
}

fn load_dataset(path: &Path) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("csv")
        .to_ascii_lowercase();
    let data = match ext.as_str() {
        "json" => storage::load_json(path),
        _ => storage::load_csv(path),
    };
    data.with_context(|| format!("loading {}", path.display()))
}

fn load_style(path: Option<&Path>) -> Result<Style> {
    match path {
        Some(p) => Style::from_json_file(p).with_context(|| format!("reading style {}", p.display())),
        None => Ok(Style::default()),
    }
}

fn build_chart(
    data: Dataset,
    engine: Option<&str>,
    chart_type: Option<&str>,
    style: Style,
) -> Result<Chart> {
    let mut chart = Chart::new().with_data(data).with_style(style);
    if let Some(e) = engine {
        chart = chart.with_engine(e);
    }
    if let Some(t) = chart_type {
        let spec: ChartTypeSpec = t.parse()?;
        chart = chart.with_chart_type(spec);
    }
    Ok(chart)
}

fn cmd_plot(args: PlotArgs) -> Result<()> {
    let data = load_dataset(&args.input)?;
    let mut style = load_style(args.style.as_deref())?;
    if let Some(title) = args.title {
        style.title = title;
    }
    style.subplots |= args.subplots;
    prefer_cli_engine(&mut style, args.engine.as_deref());

    let mut chart = build_chart(data, args.engine.as_deref(), args.chart_type.as_deref(), style)?;
    if let Some(out) = &args.out {
        let is_static = chart
            .engine_name()
            .parse::<EngineKind>()
            .map(EngineKind::embeds_static_file)?;
        let out = out.to_string_lossy().into_owned();
        let style = if is_static {
            chart.style().clone().with_file_output(out)
        } else {
            chart.style().clone().with_html_file_output(out)
        };
        chart = chart.with_style(style);
    }

    let outcome = chart.render()?;
    if let Some(path) = outcome.output_path() {
        eprintln!("Wrote {} chart to {}", outcome.engine, path.display());
    }
    for f in &outcome.failures {
        eprintln!("warning: {f}");
    }
    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    }
    Ok(())
}

/// A command-line engine beats one named in the style file.
fn prefer_cli_engine(style: &mut Style, engine: Option<&str>) {
    if let Some(e) = engine {
        style.engine = Some(e.to_string());
    }
}

fn cmd_dashboard(args: DashboardArgs) -> Result<()> {
    let mut style = load_style(args.style.as_deref())?;
    prefer_cli_engine(&mut style, args.engine.as_deref());
    let mut canvas = Canvas::default();
    for input in &args.input {
        let data = load_dataset(input)?;
        let mut row_style = style.clone();
        if row_style.title.is_empty() {
            row_style.title = input
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
        }
        let mut row: Vec<Element> = Vec::new();
        let table = args.tables.then(|| data.clone());
        row.push(
            build_chart(
                data,
                args.engine.as_deref(),
                args.chart_type.as_deref(),
                row_style,
            )?
            .into(),
        );
        if let Some(t) = table {
            row.push(t.into());
        }
        canvas.push_row(row);
    }
    let template = match args.template {
        Template::Plain => CanvasTemplate::Plain,
        Template::Keen => CanvasTemplate::Keen,
    };
    let path = canvas.generate(&args.title, args.out.as_deref(), template)?;
    eprintln!("Wrote dashboard to {}", path.display());
    Ok(())
}
