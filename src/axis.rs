//! X-axis planning: tick granularity for time indices, slot arithmetic for
//! bar charts and grid labels for matrix charts.

use crate::chart_type::ResolvedChartTypes;
use crate::models::IndexKey;
use chrono::format::{Item, StrftimeItems};
use chrono::{Datelike, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::Serialize;
use std::fmt::{Display, Write};

/// Gap left between neighbouring category groups, as a fraction of one category.
pub const BAR_SPACING: f64 = 0.2;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Upper bound on generated tick positions per axis.
const MAX_TICKS: f64 = 1_000.0;

/// Regular calendar step between ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "unit", content = "every", rename_all = "lowercase")]
pub enum TickStep {
    Minutes(u32),
    Hours(u32),
    Days(u32),
    Months(u32),
    Years(u32),
}

impl TickStep {
    /// Nominal length in milliseconds (months as 30 days, years as 365).
    pub fn approx_millis(&self) -> i64 {
        let minute = 60_000i64;
        match *self {
            TickStep::Minutes(n) => n as i64 * minute,
            TickStep::Hours(n) => n as i64 * 60 * minute,
            TickStep::Days(n) => n as i64 * 1_440 * minute,
            TickStep::Months(n) => n as i64 * 30 * 1_440 * minute,
            TickStep::Years(n) => n as i64 * 365 * 1_440 * minute,
        }
    }

    /// First tick at or after `t`, aligned to the step's unit.
    fn align(&self, t: NaiveDateTime) -> Option<NaiveDateTime> {
        let date = t.date();
        let floor = match *self {
            TickStep::Minutes(n) => {
                let m = t.minute() - t.minute() % n.max(1);
                date.and_hms_opt(t.hour(), m, 0)?
            }
            TickStep::Hours(n) => {
                let h = t.hour() - t.hour() % n.max(1);
                date.and_hms_opt(h, 0, 0)?
            }
            TickStep::Days(_) => date.and_time(NaiveTime::MIN),
            TickStep::Months(n) => {
                let m0 = date.month0() - date.month0() % n.max(1);
                NaiveDate::from_ymd_opt(date.year(), m0 + 1, 1)?.and_time(NaiveTime::MIN)
            }
            TickStep::Years(n) => {
                let n = n.max(1) as i32;
                let y = date.year() - date.year().rem_euclid(n);
                NaiveDate::from_ymd_opt(y, 1, 1)?.and_time(NaiveTime::MIN)
            }
        };
        if floor < t { self.advance(floor) } else { Some(floor) }
    }

    fn advance(&self, t: NaiveDateTime) -> Option<NaiveDateTime> {
        match *self {
            TickStep::Minutes(n) => t.checked_add_signed(Duration::minutes(n.max(1) as i64)),
            TickStep::Hours(n) => t.checked_add_signed(Duration::hours(n.max(1) as i64)),
            TickStep::Days(n) => t.checked_add_signed(Duration::days(n.max(1) as i64)),
            TickStep::Months(n) => t.checked_add_months(Months::new(n.max(1))),
            TickStep::Years(n) => t.checked_add_months(Months::new(12 * n.max(1))),
        }
    }

    /// Aligned ticks inside `[start, end]`.
    pub fn ticks(&self, start: NaiveDateTime, end: NaiveDateTime) -> Vec<NaiveDateTime> {
        let mut out = Vec::new();
        let mut cur = self.align(start);
        while let Some(t) = cur {
            if t > end {
                break;
            }
            out.push(t);
            cur = self.advance(t);
        }
        out
    }
}

/// How the x-axis of one panel is laid out.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AxisPlan {
    /// Calendar axis; positions are Unix seconds.
    Time {
        start: NaiveDateTime,
        end: NaiveDateTime,
        major: TickStep,
        minor: Option<TickStep>,
        format: String,
    },
    /// Clock axis without dates; positions are seconds after midnight.
    TimeOfDay {
        start: f64,
        end: f64,
        major: f64,
        minor: f64,
        format: String,
    },
    Numeric {
        min: f64,
        max: f64,
        major: f64,
        minor: f64,
    },
    /// Categories at `0..labels.len()`, each shared by `slot_count` bar slots.
    Bar {
        labels: Vec<String>,
        slot_count: usize,
        slot_width: f64,
        rotate_labels: bool,
    },
    /// Whole-dataset grid: columns along x, index along y.
    Matrix {
        rows: usize,
        cols: usize,
        x_labels: Vec<String>,
        y_labels: Vec<String>,
    },
    /// Labelled index on a non-bar chart, at positions `0..labels.len()`.
    Categorical { labels: Vec<String> },
}

impl AxisPlan {
    /// Left edge of bar slot `slot` in category `k`. Meaningful for `Bar` only.
    pub fn left_edge(&self, k: usize, slot: usize) -> f64 {
        match self {
            AxisPlan::Bar { slot_width, .. } => {
                k as f64 - (1.0 - BAR_SPACING) / 2.0 + slot as f64 * slot_width
            }
            _ => k as f64,
        }
    }

    /// Data-space extent of the axis.
    pub fn x_range(&self) -> (f64, f64) {
        let pad = |lo: f64, hi: f64| if hi > lo { (lo, hi) } else { (lo - 1.0, hi + 1.0) };
        match self {
            AxisPlan::Time { start, end, .. } => pad(
                start.and_utc().timestamp() as f64,
                end.and_utc().timestamp() as f64,
            ),
            AxisPlan::TimeOfDay { start, end, .. } => pad(*start, *end),
            AxisPlan::Numeric { min, max, .. } => pad(*min, *max),
            AxisPlan::Bar { labels, .. } => (-1.0, labels.len() as f64),
            AxisPlan::Matrix { cols, .. } => (0.0, (*cols).max(1) as f64),
            AxisPlan::Categorical { labels } => (-0.5, labels.len() as f64 - 0.5),
        }
    }

    /// Major and minor tick positions, in axis coordinates.
    pub fn tick_positions(&self) -> (Vec<f64>, Vec<f64>) {
        let secs = |ts: Vec<NaiveDateTime>| -> Vec<f64> {
            ts.into_iter().map(|t| t.and_utc().timestamp() as f64).collect()
        };
        match self {
            AxisPlan::Time {
                start,
                end,
                major,
                minor,
                ..
            } => (
                secs(major.ticks(*start, *end)),
                minor.map(|m| secs(m.ticks(*start, *end))).unwrap_or_default(),
            ),
            AxisPlan::TimeOfDay {
                start,
                end,
                major,
                minor,
                ..
            }
            | AxisPlan::Numeric {
                min: start,
                max: end,
                major,
                minor,
            } => (
                multiples(*start, *end, *major),
                multiples(*start, *end, *minor),
            ),
            AxisPlan::Bar { labels, .. } | AxisPlan::Categorical { labels } => {
                ((0..labels.len()).map(|k| k as f64).collect(), Vec::new())
            }
            AxisPlan::Matrix { cols, .. } => {
                ((0..*cols).map(|k| k as f64 + 0.5).collect(), Vec::new())
            }
        }
    }

    /// Tick label for a position on this axis.
    pub fn format_x(&self, x: f64) -> String {
        let label_at = |labels: &[String], x: f64| {
            let k = x.round();
            if (x - k).abs() > 1e-6 || k < 0.0 {
                return String::new();
            }
            labels.get(k as usize).cloned().unwrap_or_default()
        };
        match self {
            AxisPlan::Time { format, .. } => chrono::DateTime::from_timestamp(x.round() as i64, 0)
                .and_then(|t| render(t.naive_utc().format(format)))
                .unwrap_or_default(),
            AxisPlan::TimeOfDay { format, .. } => {
                let secs = x.rem_euclid(SECONDS_PER_DAY).round() as u32;
                NaiveTime::from_num_seconds_from_midnight_opt(secs.min(86_399), 0)
                    .and_then(|t| render(t.format(format)).or_else(|| render(t.format("%H:%M"))))
                    .unwrap_or_default()
            }
            AxisPlan::Numeric { .. } => trim_number(x),
            AxisPlan::Bar { labels, .. } | AxisPlan::Categorical { labels } => label_at(labels, x),
            AxisPlan::Matrix { x_labels, .. } => label_at(x_labels, x - 0.5),
        }
    }
}

/// Multiples of `step` inside `[lo, hi]`; empty when the step is unusable.
fn multiples(lo: f64, hi: f64, step: f64) -> Vec<f64> {
    if step.is_nan() || step <= 0.0 || !lo.is_finite() || !hi.is_finite() {
        return Vec::new();
    }
    if (hi - lo) / step > MAX_TICKS {
        return Vec::new();
    }
    let first = (lo / step).ceil() as i64;
    let last = (hi / step).floor() as i64;
    (first..=last).map(|k| k as f64 * step).collect()
}

/// Whether chrono accepts `fmt` as a strftime pattern.
pub fn is_valid_date_format(fmt: &str) -> bool {
    StrftimeItems::new(fmt).all(|item| !matches!(item, Item::Error))
}

/// Format a chrono value without panicking. `None` when the pattern asks for
/// fields the value lacks, such as a year on a clock time.
fn render(value: impl Display) -> Option<String> {
    let mut out = String::new();
    write!(out, "{value}").ok()?;
    Some(out)
}

fn trim_number(x: f64) -> String {
    if x.fract() == 0.0 && x.abs() < 1e15 {
        format!("{}", x as i64)
    } else {
        let s = format!("{x:.6}");
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Round to one significant figure: `47 -> 50`, `0.0031 -> 0.003`.
pub fn round_to_1(x: f64) -> f64 {
    if x == 0.0 || !x.is_finite() {
        return x;
    }
    let digits = -(x.abs().log10().floor() as i32);
    if digits >= 0 {
        let f = 10f64.powi(digits);
        (x * f).round() / f
    } else {
        let f = 10f64.powi(-digits);
        (x / f).round() * f
    }
}

/// Tick rule for a calendar span: a major step and an optional minor step.
pub fn time_ladder(span: Duration) -> (TickStep, Option<TickStep>) {
    let days = span.num_seconds() as f64 / SECONDS_PER_DAY;
    if span < Duration::minutes(20) {
        (TickStep::Minutes(2), Some(TickStep::Minutes(1)))
    } else if span < Duration::hours(1) {
        (TickStep::Minutes(5), Some(TickStep::Minutes(2)))
    } else if span < Duration::hours(6) {
        (TickStep::Hours(1), Some(TickStep::Minutes(30)))
    } else if span < Duration::days(3) {
        (TickStep::Hours(6), Some(TickStep::Hours(1)))
    } else if span < Duration::days(10) {
        (TickStep::Days(2), Some(TickStep::Days(1)))
    } else if span < Duration::days(40) {
        (TickStep::Days(10), Some(TickStep::Days(1)))
    } else if days < 365.0 * 0.5 {
        (TickStep::Months(2), Some(TickStep::Months(1)))
    } else if days < 365.0 * 2.0 {
        (TickStep::Months(3), Some(TickStep::Months(1)))
    } else if days < 365.0 * 5.0 {
        (TickStep::Years(1), None)
    } else {
        let years = ((days / 365.0 / 5.0).floor() as u32).max(1);
        (TickStep::Years(years), None)
    }
}

/// Default label pattern for a calendar span.
pub fn time_label_format(span: Duration) -> &'static str {
    if span < Duration::days(4) {
        "%H:%M"
    } else if span < Duration::days(40) {
        "%d %b %y"
    } else if span < Duration::days(365 * 2) {
        "%b %y"
    } else {
        "%Y"
    }
}

/// Derive the x-axis plan for one panel.
///
/// Matrix charts lay the dataset out as a `rows × cols` grid; bar-family
/// charts use integer category positions with slot offsets; otherwise the
/// index kind decides between a calendar, clock, numeric or labelled axis.
pub fn plan(
    index: &[IndexKey],
    chart: &ResolvedChartTypes,
    columns: &[String],
    date_formatter: Option<&str>,
) -> AxisPlan {
    let date_formatter = date_formatter.filter(|fmt| {
        let valid = is_valid_date_format(fmt);
        if !valid {
            log::warn!("ignoring invalid date format {fmt:?}");
        }
        valid
    });
    let label = |k: &IndexKey| match (k, date_formatter) {
        (IndexKey::Timestamp(ts), Some(fmt)) => {
            render(ts.format(fmt)).unwrap_or_else(|| k.to_string())
        }
        _ => k.to_string(),
    };

    if chart.is_matrix {
        return AxisPlan::Matrix {
            rows: index.len(),
            cols: columns.len(),
            x_labels: columns.to_vec(),
            y_labels: index.iter().map(label).collect(),
        };
    }

    if chart.is_bar_family {
        let slot_count = chart.bar_slot_count.max(1);
        return AxisPlan::Bar {
            labels: index.iter().map(label).collect(),
            slot_count,
            slot_width: (1.0 - BAR_SPACING) / slot_count as f64,
            rotate_labels: index.len() > 6,
        };
    }

    match (index.first(), index.last()) {
        (Some(IndexKey::Timestamp(start)), Some(IndexKey::Timestamp(end))) => {
            let span = *end - *start;
            let (major, minor) = time_ladder(span);
            let format = date_formatter
                .map(str::to_string)
                .unwrap_or_else(|| time_label_format(span).to_string());
            log::debug!("time axis over {span}: major {major:?}, minor {minor:?}, format {format}");
            AxisPlan::Time {
                start: *start,
                end: *end,
                major,
                minor,
                format,
            }
        }
        (Some(first @ IndexKey::TimeOfDay(_)), Some(last)) => AxisPlan::TimeOfDay {
            start: first.as_f64().unwrap_or(0.0),
            end: last.as_f64().unwrap_or(SECONDS_PER_DAY),
            major: SECONDS_PER_DAY / 3.0,
            minor: SECONDS_PER_DAY / 24.0,
            format: date_formatter.unwrap_or("%H:%M").to_string(),
        },
        (Some(IndexKey::Number(_)), Some(_)) => {
            let xs = index.iter().filter_map(IndexKey::as_f64);
            let (min, max) = xs.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
            let major = round_to_1((max - min) / 10.0);
            AxisPlan::Numeric {
                min,
                max,
                major,
                minor: major / 5.0,
            }
        }
        _ => AxisPlan::Categorical {
            labels: index.iter().map(label).collect(),
        },
    }
}
