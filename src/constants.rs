//! Process-wide defaults: sizes, labels, engine palettes and the named-color table.
//!
//! The table is read once. An override map (field name -> JSON value) may be
//! installed at process start with [`install_overrides`]; after the first read
//! the table is frozen and later installs are rejected.

use crate::error::{ChartError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

static CONSTANTS: OnceLock<ChartConstants> = OnceLock::new();

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConstants {
    pub default_engine: String,
    pub source: String,
    pub brand_label: String,
    pub display_source_label: bool,
    pub display_brand_label: bool,
    pub brand_color: String,
    pub scale_factor: f64,
    pub width: u32,
    pub height: u32,
    pub bubble_size_scalar: f64,
    pub font_family: String,
    /// Forces every engine to skip opening a viewer.
    pub silent_display: bool,
    pub default_colormap: String,
    pub bokeh_plot_mode: String,
    pub bokeh_palette: Vec<String>,
    pub plotly_plot_mode: String,
    pub plotly_theme: String,
    pub plotly_palette: Vec<String>,
    pub plotly_js_url: String,
    pub matplotlib_palette: Vec<String>,
    pub color_overwrites: BTreeMap<String, String>,
}

const ENGINE_PALETTE: [&str; 8] = [
    "#E24A33", "#348ABD", "#988ED5", "#777777", "#FBC15E", "#8EBA42", "#FFB5B8", "#ee538b",
];

// Standard CSS colors, with the primaries remapped to softer chart-friendly tones.
const COLOR_OVERWRITES: &[(&str, &str)] = &[
    ("aliceblue", "#F0F8FF"),
    ("antiquewhite", "#FAEBD7"),
    ("aqua", "#00FFFF"),
    ("aquamarine", "#7FFFD4"),
    ("azure", "#F0FFFF"),
    ("beige", "#F5F5DC"),
    ("bisque", "#FFE4C4"),
    ("black", "#000000"),
    ("blanchedalmond", "#FFEBCD"),
    ("blue", "#348ABD"),
    ("bluegray", "#565656"),
    ("bluepurple", "#6432AB"),
    ("blueviolet", "#8A2BE2"),
    ("brick", "#E24A33"),
    ("brightblue", "#0000FF"),
    ("brightred", "#FF0000"),
    ("brown", "#A52A2A"),
    ("burlywood", "#DEB887"),
    ("cadetblue", "#5F9EA0"),
    ("charcoal", "#151516"),
    ("chartreuse", "#7FFF00"),
    ("chocolate", "#D2691E"),
    ("coral", "#FF7F50"),
    ("cornflowerblue", "#6495ED"),
    ("cornsilk", "#FFF8DC"),
    ("crimson", "#DC143C"),
    ("cyan", "#00FFFF"),
    ("darkblue", "#00008B"),
    ("darkcyan", "#008B8B"),
    ("darkgoldenrod", "#B8860B"),
    ("darkgray", "#A9A9A9"),
    ("darkgreen", "#006400"),
    ("darkgrey", "#A9A9A9"),
    ("darkkhaki", "#BDB76B"),
    ("darkmagenta", "#8B008B"),
    ("darkolivegreen", "#556B2F"),
    ("darkorange", "#FF8C00"),
    ("darkorchid", "#9932CC"),
    ("darkred", "#8B0000"),
    ("darksalmon", "#E9967A"),
    ("darkseagreen", "#8FBC8F"),
    ("darkslateblue", "#483D8B"),
    ("darkslategray", "#2F4F4F"),
    ("darkslategrey", "#2F4F4F"),
    ("darkturquoise", "#00CED1"),
    ("darkviolet", "#9400D3"),
    ("deeppink", "#FF1493"),
    ("deepskyblue", "#00BFFF"),
    ("dimgray", "#696969"),
    ("dimgrey", "#696969"),
    ("dodgerblue", "#1E90FF"),
    ("firebrick", "#B22222"),
    ("floralwhite", "#FFFAF0"),
    ("forestgreen", "#228B22"),
    ("fuchsia", "#FF00FF"),
    ("gainsboro", "#DCDCDC"),
    ("ghostwhite", "#F8F8FF"),
    ("gold", "#FFD700"),
    ("goldenrod", "#DAA520"),
    ("grassgreen", "#32ab60"),
    ("gray", "#777777"),
    ("green", "#8EBA42"),
    ("greenyellow", "#ADFF2F"),
    ("grey", "#808080"),
    ("grey01", "#0A0A0A"),
    ("grey02", "#151516"),
    ("grey03", "#1A1A1C"),
    ("grey04", "#1E1E21"),
    ("grey05", "#252529"),
    ("grey06", "#36363C"),
    ("grey07", "#3C3C42"),
    ("grey08", "#434343"),
    ("grey09", "#666570"),
    ("grey10", "#666666"),
    ("grey11", "#8C8C8C"),
    ("grey12", "#C2C2C2"),
    ("grey13", "#E2E2E2"),
    ("honeydew", "#F0FFF0"),
    ("hotpink", "#FF69B4"),
    ("indianred", "#CD5C5C"),
    ("indigo", "#4B0082"),
    ("ivory", "#FFFFF0"),
    ("khaki", "#F0E68C"),
    ("lavender", "#E6E6FA"),
    ("lavenderblush", "#FFF0F5"),
    ("lawngreen", "#7CFC00"),
    ("lemonchiffon", "#FFFACD"),
    ("lightpink2", "#fccde5"),
    ("lightpurple", "#bc80bd"),
    ("lightblue", "#ADD8E6"),
    ("lightcoral", "#F08080"),
    ("lightcyan", "#E0FFFF"),
    ("lightgoldenrodyellow", "#FAFAD2"),
    ("lightgray", "#D3D3D3"),
    ("lightgreen", "#90EE90"),
    ("lightgrey", "#D3D3D3"),
    ("lightpink", "#FFB6C1"),
    ("lightsalmon", "#FFA07A"),
    ("lightseagreen", "#20B2AA"),
    ("lightskyblue", "#87CEFA"),
    ("lightslategray", "#778899"),
    ("lightslategrey", "#778899"),
    ("lightsteelblue", "#B0C4DE"),
    ("lightteal", "#8dd3c7"),
    ("lightyellow", "#FFFFE0"),
    ("lightblue2", "#80b1d3"),
    ("lightviolet", "#8476CA"),
    ("lime", "#00FF00"),
    ("lime2", "#8EBA42"),
    ("limegreen", "#32CD32"),
    ("linen", "#FAF0E6"),
    ("magenta", "#FF00FF"),
    ("maroon", "#800000"),
    ("mediumaquamarine", "#66CDAA"),
    ("mediumblue", "#0000CD"),
    ("mediumgray", "#656565"),
    ("mediumorchid", "#BA55D3"),
    ("mediumpurple", "#9370DB"),
    ("mediumseagreen", "#3CB371"),
    ("mediumslateblue", "#7B68EE"),
    ("mediumspringgreen", "#00FA9A"),
    ("mediumturquoise", "#48D1CC"),
    ("mediumvioletred", "#C71585"),
    ("midnightblue", "#191970"),
    ("mintcream", "#F5FFFA"),
    ("mistyrose", "#FFE4E1"),
    ("moccasin", "#FFE4B5"),
    ("mustard", "#FBC15E"),
    ("navajowhite", "#FFDEAD"),
    ("navy", "#000080"),
    ("oldlace", "#FDF5E6"),
    ("olive", "#808000"),
    ("olivedrab", "#6B8E23"),
    ("orange", "#FF9900"),
    ("orangered", "#FF4500"),
    ("orchid", "#DA70D6"),
    ("palegoldenrod", "#EEE8AA"),
    ("palegreen", "#98FB98"),
    ("paleolive", "#b3de69"),
    ("paleturquoise", "#AFEEEE"),
    ("palevioletred", "#DB7093"),
    ("papayawhip", "#FFEFD5"),
    ("peachpuff", "#FFDAB9"),
    ("pearl", "#D9D9D9"),
    ("pearl02", "#F5F6F9"),
    ("pearl03", "#E1E5ED"),
    ("pearl04", "#9499A3"),
    ("pearl05", "#6F7B8B"),
    ("pearl06", "#4D5663"),
    ("peru", "#CD853F"),
    ("pink", "#FFB5B8"),
    ("pinksalmon", "#FFB5B8"),
    ("plum", "#DDA0DD"),
    ("powderblue", "#B0E0E6"),
    ("purple", "#988ED5"),
    ("red", "#E24A33"),
    ("rose", "#FFC0CB"),
    ("rosybrown", "#BC8F8F"),
    ("royalblue", "#4169E1"),
    ("saddlebrown", "#8B4513"),
    ("salmon", "#fb8072"),
    ("sandybrown", "#FAA460"),
    ("seaborn", "#EAE7E4"),
    ("seagreen", "#2E8B57"),
    ("seashell", "#FFF5EE"),
    ("sienna", "#A0522D"),
    ("silver", "#C0C0C0"),
    ("skyblue", "#87CEEB"),
    ("slateblue", "#6A5ACD"),
    ("slategray", "#708090"),
    ("slategrey", "#708090"),
    ("smurf", "#3E6FB0"),
    ("snow", "#FFFAFA"),
    ("springgreen", "#00FF7F"),
    ("steelblue", "#4682B4"),
    ("tan", "#D2B48C"),
    ("teal", "#008080"),
    ("thistle", "#D8BFD8"),
    ("tomato", "#FF6347"),
    ("turquoise", "#40E0D0"),
    ("violet", "#EE82EE"),
    ("wheat", "#F5DEB3"),
    ("white", "#FFFFFF"),
    ("whitesmoke", "#F5F5F5"),
    ("yellow", "#FBC15E"),
    ("yellowgreen", "#9ACD32"),
];

impl Default for ChartConstants {
    fn default() -> Self {
        let palette: Vec<String> = ENGINE_PALETTE.iter().map(|s| s.to_string()).collect();
        Self {
            default_engine: "matplotlib".into(),
            source: "Web".into(),
            brand_label: "unichart".into(),
            display_source_label: true,
            display_brand_label: true,
            brand_color: "#C0C0C0".into(),
            scale_factor: 3.0,
            width: 600,
            height: 400,
            bubble_size_scalar: 35.0,
            font_family: "sans-serif".into(),
            silent_display: false,
            default_colormap: "Blues".into(),
            bokeh_plot_mode: "offline_html".into(),
            bokeh_palette: palette.clone(),
            plotly_plot_mode: "offline_html_exc_embed_js".into(),
            plotly_theme: "plotly".into(),
            plotly_palette: palette.clone(),
            plotly_js_url: "https://cdn.plot.ly/plotly-2.35.2.min.js".into(),
            matplotlib_palette: palette,
            color_overwrites: COLOR_OVERWRITES
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

impl ChartConstants {
    /// Apply a field-name -> value override map on top of the defaults.
    /// Unknown field names are ignored with a warning.
    pub fn with_overrides(overrides: &Map<String, Value>) -> Result<Self> {
        let mut base = match serde_json::to_value(Self::default())? {
            Value::Object(m) => m,
            _ => Map::new(),
        };
        for (k, v) in overrides {
            if base.contains_key(k) {
                base.insert(k.clone(), v.clone());
            } else {
                log::warn!("ignoring unknown chart constant override '{k}'");
            }
        }
        Ok(serde_json::from_value(Value::Object(base))?)
    }

    /// Look up a named color in the overwrite table (case-insensitive).
    pub fn color_code(&self, name: &str) -> Option<&str> {
        self.color_overwrites
            .get(name)
            .or_else(|| self.color_overwrites.get(&name.to_ascii_lowercase()))
            .map(String::as_str)
    }
}

/// The process-wide constants table.
pub fn constants() -> &'static ChartConstants {
    CONSTANTS.get_or_init(ChartConstants::default)
}

/// Install process-wide overrides. Must run before anything reads the table.
pub fn install_overrides(overrides: &Map<String, Value>) -> Result<&'static ChartConstants> {
    let table = ChartConstants::with_overrides(overrides)?;
    CONSTANTS
        .set(table)
        .map_err(|_| ChartError::OverridesInstalled)?;
    log::debug!("installed {} chart constant override(s)", overrides.len());
    Ok(constants())
}

/// Read an override map from a JSON object file.
pub fn load_overrides_file<P: AsRef<Path>>(path: P) -> Result<Map<String, Value>> {
    let txt = std::fs::read_to_string(path)?;
    match serde_json::from_str::<Value>(&txt)? {
        Value::Object(m) => Ok(m),
        other => Err(ChartError::InvalidDataset(format!(
            "override file must hold a JSON object, found {other}"
        ))),
    }
}

/// Default location of the user override file (`<config dir>/unichart/overrides.json`).
pub fn user_overrides_path() -> Option<std::path::PathBuf> {
    dirs::config_dir().map(|d| d.join("unichart").join("overrides.json"))
}
