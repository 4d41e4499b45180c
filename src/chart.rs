//! The dispatch entry point: a chart bundles data, engine, chart type and
//! style, and `plot` forwards a resolved plan to the selected engine.

use crate::chart_type::ChartTypeSpec;
use crate::constants::constants;
use crate::engine::{EngineSelector, RenderOutcome};
use crate::error::{ChartError, Result};
use crate::models::PlotData;
use crate::plan::resolve_plan;
use crate::style::Style;
use chrono::Local;

#[derive(Debug)]
pub struct Chart {
    data: Option<PlotData>,
    engine: EngineSelector,
    chart_type: ChartTypeSpec,
    style: Style,
    is_plotted: bool,
}

impl Default for Chart {
    fn default() -> Self {
        Self {
            data: None,
            engine: EngineSelector::Name(constants().default_engine.clone()),
            chart_type: ChartTypeSpec::default(),
            style: Style::default(),
            is_plotted: false,
        }
    }
}

impl Chart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(mut self, data: impl Into<PlotData>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn with_engine(mut self, engine: impl Into<EngineSelector>) -> Self {
        self.engine = engine.into();
        self
    }

    pub fn with_chart_type(mut self, chart_type: impl Into<ChartTypeSpec>) -> Self {
        self.chart_type = chart_type.into();
        self
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn data(&self) -> Option<&PlotData> {
        self.data.as_ref()
    }

    pub fn style(&self) -> &Style {
        &self.style
    }

    pub fn chart_type(&self) -> &ChartTypeSpec {
        &self.chart_type
    }

    pub fn is_plotted(&self) -> bool {
        self.is_plotted
    }

    /// Name of the engine `plot` would use with no engine argument:
    /// `style.engine` when set, otherwise the chart's own engine.
    pub fn engine_name(&self) -> &str {
        match &self.style.engine {
            Some(name) => name,
            None => self.engine.label(),
        }
    }

    /// Render with the chart's own data, engine, chart type and style.
    pub fn render(&mut self) -> Result<RenderOutcome> {
        self.plot(None, None, None, None)
    }

    /// Render, letting each argument replace the chart's stored value for
    /// this call only.
    ///
    /// The engine comes from the argument, then `style.engine`, then the
    /// chart's engine. Output names generated for the chart's own style are
    /// kept on it, so later calls write to the same files.
    pub fn plot(
        &mut self,
        data: Option<PlotData>,
        engine: Option<EngineSelector>,
        chart_type: Option<ChartTypeSpec>,
        style: Option<Style>,
    ) -> Result<RenderOutcome> {
        let Chart {
            data: own_data,
            engine: own_engine,
            chart_type: own_chart_type,
            style: own_style,
            is_plotted,
        } = self;

        let data = data.as_ref().or(own_data.as_ref()).ok_or(ChartError::EmptyDataset)?;
        let chart_type = chart_type.as_ref().unwrap_or(own_chart_type);
        let outcome = match style {
            Some(mut style) => dispatch(data, engine.as_ref(), own_engine, chart_type, &mut style)?,
            None => dispatch(data, engine.as_ref(), own_engine, chart_type, own_style)?,
        };
        *is_plotted = true;
        Ok(outcome)
    }

    /// Render through a derived style (e.g. a dashboard view of this chart).
    ///
    /// `style` receives any generated output names; the chart's own style is
    /// not touched.
    pub fn plot_with_style(&mut self, style: &mut Style) -> Result<RenderOutcome> {
        let data = self.data.as_ref().ok_or(ChartError::EmptyDataset)?;
        let outcome = dispatch(data, None, &self.engine, &self.chart_type, style)?;
        self.is_plotted = true;
        Ok(outcome)
    }
}

fn dispatch(
    data: &PlotData,
    engine: Option<&EngineSelector>,
    fallback: &EngineSelector,
    chart_type: &ChartTypeSpec,
    style: &mut Style,
) -> Result<RenderOutcome> {
    let from_style;
    let selector = match (engine, &style.engine) {
        (Some(sel), _) => sel,
        (None, Some(name)) => {
            from_style = EngineSelector::Name(name.clone());
            &from_style
        }
        (None, None) => fallback,
    };
    let resolved = selector.resolve()?;
    let engine = resolved.get();
    let name = engine.name().to_string();

    style.ensure_output_targets(&name, Local::now().naive_local());
    let plan = resolve_plan(data, style, chart_type, &name)?;
    log::debug!("dispatching {} series to {name}", plan.series_count());

    let outcome = engine.plot_chart(&plan, style)?;
    for failure in &outcome.failures {
        log::warn!("{name}: {failure}");
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Dataset, IndexKey};

    fn data() -> Dataset {
        Dataset::from_columns(
            vec![IndexKey::from("a"), IndexKey::from("b")],
            vec![("x", vec![1.0, 2.0])],
        )
        .unwrap()
    }

    #[test]
    fn style_engine_beats_chart_engine() {
        let chart = Chart::new()
            .with_engine("bokeh")
            .with_style(Style::default().with_engine("plotly"));
        assert_eq!(chart.engine_name(), "plotly");
    }

    #[test]
    fn unknown_engine_is_reported() {
        let mut chart = Chart::new().with_data(data()).with_engine("excel");
        let err = chart.render().unwrap_err();
        assert!(matches!(err, ChartError::UnknownEngine { .. }));
        assert!(!chart.is_plotted());
    }

    #[test]
    fn missing_data_is_an_error() {
        let mut chart = Chart::new().with_engine("bqplot");
        assert!(matches!(chart.render(), Err(ChartError::EmptyDataset)));
    }

    #[test]
    fn bqplot_marks_plotted_without_artifact() {
        let mut chart = Chart::new().with_data(data()).with_engine("bqplot");
        let outcome = chart.render().unwrap();
        assert!(outcome.artifact.is_none());
        assert!(chart.is_plotted());
    }
}
