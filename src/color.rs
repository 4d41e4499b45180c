//! Per-series color assignment: exclusion and secondary buckets, explicit
//! lists, colormap sampling, the named-color table and RGBA normalization.

use crate::constants::constants;
use crate::style::Style;
use ahash::AHashSet;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// A color configured on a style: an explicit ordered list of color specs,
/// or the name of a colormap to expand into as many colors as needed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColorSpec {
    List(Vec<String>),
    Colormap(String),
}

impl Default for ColorSpec {
    fn default() -> Self {
        ColorSpec::List(Vec::new())
    }
}

impl ColorSpec {
    pub fn list<I, S>(colors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ColorSpec::List(colors.into_iter().map(Into::into).collect())
    }

    pub fn colormap(name: impl Into<String>) -> Self {
        ColorSpec::Colormap(name.into())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ColorSpec::List(v) => v.is_empty(),
            ColorSpec::Colormap(name) => name.trim().is_empty(),
        }
    }
}

/// 8-bit RGB with a `0.0..=1.0` alpha channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    const fn from_u32(rgb: u32) -> Self {
        Self::opaque((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
    }

    /// `#rrggbb`, or `#rrggbbaa` when not fully opaque.
    pub fn to_hex(&self) -> String {
        if self.a >= 1.0 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            let a = (self.a.clamp(0.0, 1.0) * 255.0).round() as u8;
            format!("#{:02x}{:02x}{:02x}{a:02x}", self.r, self.g, self.b)
        }
    }

    /// CSS `rgba(r, g, b, a)` form.
    pub fn to_css(&self) -> String {
        format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

/// A resolved series color. Specs that cannot be parsed are kept verbatim
/// so a backend that understands them can still use them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Color {
    Rgba(Rgba),
    Spec(String),
}

impl Color {
    /// Normalize a color spec: named-color table first, then hex or
    /// `rgb()`/`rgba()` parsing; anything else passes through unchanged.
    pub fn parse(spec: &str) -> Color {
        let trimmed = spec.trim();
        let substituted = constants().color_code(trimmed).unwrap_or(trimmed);
        match parse_rgba(substituted) {
            Some(c) => Color::Rgba(c),
            None => Color::Spec(spec.to_string()),
        }
    }

    pub fn rgba(&self) -> Option<Rgba> {
        match self {
            Color::Rgba(c) => Some(*c),
            Color::Spec(_) => None,
        }
    }

    /// Form suitable for CSS and JSON consumers.
    pub fn to_css(&self) -> String {
        match self {
            Color::Rgba(c) => c.to_css(),
            Color::Spec(s) => s.clone(),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}

fn rgb_fn_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^rgba?\(\s*(\d{1,3})\s*,\s*(\d{1,3})\s*,\s*(\d{1,3})\s*(?:,\s*([0-9]*\.?[0-9]+)\s*)?\)$",
        )
        .ok()
    })
    .as_ref()
}

/// Parse `#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb(..)` or `rgba(..)`.
pub fn parse_rgba(spec: &str) -> Option<Rgba> {
    let s = spec.trim();
    if let Some(hex) = s.strip_prefix('#') {
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        return match hex.len() {
            3 => {
                let nib = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);
                Some(Rgba::opaque(nib(0)?, nib(1)?, nib(2)?))
            }
            6 => Some(Rgba::opaque(byte(0)?, byte(2)?, byte(4)?)),
            8 => Some(Rgba {
                r: byte(0)?,
                g: byte(2)?,
                b: byte(4)?,
                a: byte(6)? as f64 / 255.0,
            }),
            _ => None,
        };
    }
    let lowered = s.to_ascii_lowercase();
    let caps = rgb_fn_re()?.captures(&lowered)?;
    let channel = |i: usize| caps.get(i)?.as_str().parse::<u16>().ok().filter(|v| *v <= 255);
    let a = match caps.get(4) {
        Some(m) => m.as_str().parse::<f64>().ok()?.clamp(0.0, 1.0),
        None => 1.0,
    };
    Some(Rgba {
        r: channel(1)? as u8,
        g: channel(2)? as u8,
        b: channel(3)? as u8,
        a,
    })
}

/// Anchor colors for the sequential and diverging colormaps we can expand.
const COLORMAPS: &[(&str, &[u32])] = &[
    (
        "blues",
        &[0xf7fbff, 0xdeebf7, 0xc6dbef, 0x9ecae1, 0x6baed6, 0x4292c6, 0x2171b5, 0x08519c, 0x08306b],
    ),
    (
        "reds",
        &[0xfff5f0, 0xfee0d2, 0xfcbba1, 0xfc9272, 0xfb6a4a, 0xef3b2c, 0xcb181d, 0xa50f15, 0x67000d],
    ),
    (
        "greens",
        &[0xf7fcf5, 0xe5f5e0, 0xc7e9c0, 0xa1d99b, 0x74c476, 0x41ab5d, 0x238b45, 0x006d2c, 0x00441b],
    ),
    (
        "greys",
        &[0xffffff, 0xf0f0f0, 0xd9d9d9, 0xbdbdbd, 0x969696, 0x737373, 0x525252, 0x252525, 0x000000],
    ),
    (
        "oranges",
        &[0xfff5eb, 0xfee6ce, 0xfdd0a2, 0xfdae6b, 0xfd8d3c, 0xf16913, 0xd94801, 0xa63603, 0x7f2704],
    ),
    (
        "purples",
        &[0xfcfbfd, 0xefedf5, 0xdadaeb, 0xbcbddc, 0x9e9ac8, 0x807dba, 0x6a51a3, 0x54278f, 0x3f007d],
    ),
    (
        "viridis",
        &[0x440154, 0x482878, 0x3e4989, 0x31688e, 0x26828e, 0x1f9e89, 0x35b779, 0x6ece58, 0xb5de2b, 0xfde725],
    ),
    (
        "plasma",
        &[0x0d0887, 0x46039f, 0x7201a8, 0x9c179e, 0xbd3786, 0xd8576b, 0xed7953, 0xfb9f3a, 0xfdca26, 0xf0f921],
    ),
    (
        "coolwarm",
        &[0x3b4cc0, 0x6788ee, 0x9abbff, 0xc9d7f0, 0xedd1c2, 0xf7a889, 0xe26952, 0xb40426],
    ),
    (
        "rdylgn",
        &[
            0xa50026, 0xd73027, 0xf46d43, 0xfdae61, 0xfee08b, 0xffffbf, 0xd9ef8b, 0xa6d96a, 0x66bd63,
            0x1a9850, 0x006837,
        ],
    ),
];

/// A named colormap, optionally reversed with the `_r` suffix.
#[derive(Debug, Clone, Copy)]
pub struct Colormap {
    stops: &'static [u32],
    reversed: bool,
}

impl Colormap {
    /// Case-insensitive lookup; `None` for names we do not know.
    pub fn by_name(name: &str) -> Option<Self> {
        let lower = name.trim().to_ascii_lowercase();
        let (base, reversed) = match lower.strip_suffix("_r") {
            Some(b) => (b, true),
            None => (lower.as_str(), false),
        };
        let base = match base {
            "gray" | "grey" => "greys",
            other => other,
        };
        COLORMAPS
            .iter()
            .find(|(n, _)| *n == base)
            .map(|(_, stops)| Colormap {
                stops: *stops,
                reversed,
            })
    }

    /// Linear interpolation between anchors at `t` in `[0, 1]`.
    pub fn sample(&self, t: f64) -> Rgba {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        let t = if self.reversed { 1.0 - t } else { t };
        let last = self.stops.len().saturating_sub(1);
        if last == 0 {
            return self.stops.first().map_or(Rgba::opaque(0, 0, 0), |c| Rgba::from_u32(*c));
        }
        let pos = t * last as f64;
        let i = (pos.floor() as usize).min(last - 1);
        let frac = pos - i as f64;
        let (a, b) = (Rgba::from_u32(self.stops[i]), Rgba::from_u32(self.stops[i + 1]));
        let lerp = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * frac).round() as u8;
        Rgba::opaque(lerp(a.r, b.r), lerp(a.g, b.g), lerp(a.b, b.b))
    }

    /// `n` colors sampled at `i / n` for `i in 0..n`.
    pub fn expand(&self, n: usize) -> Vec<Rgba> {
        (0..n).map(|i| self.sample(i as f64 / n as f64)).collect()
    }
}

/// One resolved color (or `None` = "use the engine's cycling palette") per
/// series label, in input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ColorAssignment {
    entries: Vec<(String, Option<Color>)>,
}

impl ColorAssignment {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Color>)> {
        self.entries.iter().map(|(l, c)| (l.as_str(), c.as_ref()))
    }

    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(|(l, _)| l.as_str()).collect()
    }

    pub fn colors(&self) -> Vec<Option<Color>> {
        self.entries.iter().map(|(_, c)| c.clone()).collect()
    }

    /// Color at a position (the `i`-th input label).
    pub fn at(&self, i: usize) -> Option<&Color> {
        self.entries.get(i).and_then(|(_, c)| c.as_ref())
    }

    /// Color of the first entry with this label.
    pub fn get(&self, label: &str) -> Option<&Color> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .and_then(|(_, c)| c.as_ref())
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Bucket {
    Excluded,
    Secondary,
    Primary,
}

fn expand_bucket(spec: &ColorSpec, n: usize) -> Vec<Option<Color>> {
    match spec {
        ColorSpec::List(list) => (0..n)
            .map(|i| list.get(i).map(|s| Color::parse(s)))
            .collect(),
        ColorSpec::Colormap(name) if name.trim().is_empty() => vec![None; n],
        ColorSpec::Colormap(name) => match Colormap::by_name(name) {
            Some(cm) => cm.expand(n).into_iter().map(|c| Some(Color::Rgba(c))).collect(),
            None => {
                log::warn!("unknown colormap '{name}', falling back to the engine palette");
                vec![None; n]
            }
        },
    }
}

/// Assign a color to every label.
///
/// Labels in `exclude_from_color` get `None`. The rest are split into the
/// secondary bucket (`color_2_series`, palette `color_2`) and the primary
/// bucket (palette `color`); the n-th member of a bucket takes the n-th
/// color of that bucket's palette.
pub fn resolve<S: AsRef<str>>(labels: &[S], style: &Style) -> ColorAssignment {
    let excluded: AHashSet<&str> = style.exclude_from_color.iter().map(String::as_str).collect();
    let secondary: AHashSet<&str> = style.color_2_series.iter().map(String::as_str).collect();

    let buckets: Vec<Bucket> = labels
        .iter()
        .map(|l| {
            let l = l.as_ref();
            if excluded.contains(l) {
                Bucket::Excluded
            } else if secondary.contains(l) {
                Bucket::Secondary
            } else {
                Bucket::Primary
            }
        })
        .collect();

    let n_primary = buckets.iter().filter(|b| **b == Bucket::Primary).count();
    let n_secondary = buckets.iter().filter(|b| **b == Bucket::Secondary).count();
    let mut primary = expand_bucket(&style.color, n_primary).into_iter();
    let mut secondary = expand_bucket(&style.color_2, n_secondary).into_iter();

    let entries = labels
        .iter()
        .zip(buckets)
        .map(|(label, bucket)| {
            let color = match bucket {
                Bucket::Excluded => None,
                Bucket::Secondary => secondary.next().flatten(),
                Bucket::Primary => primary.next().flatten(),
            };
            (label.as_ref().to_string(), color)
        })
        .collect();

    ColorAssignment { entries }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_forms() {
        assert_eq!(parse_rgba("#fff"), Some(Rgba::opaque(255, 255, 255)));
        assert_eq!(parse_rgba("#348ABD"), Some(Rgba::opaque(0x34, 0x8a, 0xbd)));
        let half = parse_rgba("#00000080").unwrap();
        assert!((half.a - 128.0 / 255.0).abs() < 1e-9);
        assert_eq!(parse_rgba("#12345"), None);
        assert_eq!(parse_rgba("#gggggg"), None);
    }

    #[test]
    fn functional_forms() {
        assert_eq!(parse_rgba("rgb(1, 2, 3)"), Some(Rgba::opaque(1, 2, 3)));
        let c = parse_rgba("RGBA(10,20,30,0.5)").unwrap();
        assert_eq!((c.r, c.g, c.b, c.a), (10, 20, 30, 0.5));
        assert_eq!(parse_rgba("rgb(300, 0, 0)"), None);
    }

    #[test]
    fn unknown_names_pass_through() {
        assert_eq!(
            Color::parse("not-a-color"),
            Color::Spec("not-a-color".to_string())
        );
    }

    #[test]
    fn colormap_endpoints_and_reverse() {
        let cm = Colormap::by_name("Blues").unwrap();
        assert_eq!(cm.sample(0.0), Rgba::from_u32(0xf7fbff));
        assert_eq!(cm.sample(1.0), Rgba::from_u32(0x08306b));
        let r = Colormap::by_name("blues_r").unwrap();
        assert_eq!(r.sample(0.0), Rgba::from_u32(0x08306b));
        assert!(Colormap::by_name("nope").is_none());
    }

    #[test]
    fn expand_samples_i_over_n() {
        let cm = Colormap::by_name("greys").unwrap();
        let v = cm.expand(2);
        assert_eq!(v.len(), 2);
        assert_eq!(v[0], cm.sample(0.0));
        assert_eq!(v[1], cm.sample(0.5));
    }
}
