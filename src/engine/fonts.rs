//! Font registration for the `ab_glyph` text path, which does not discover
//! OS fonts on its own.

use crate::constants::constants;
use std::path::PathBuf;
use std::sync::OnceLock;

static INIT_FONTS: OnceLock<Option<String>> = OnceLock::new();

const FONT_ENV: &str = "UNICHART_FONT";

const CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

fn candidates() -> impl Iterator<Item = PathBuf> {
    std::env::var_os(FONT_ENV)
        .map(PathBuf::from)
        .into_iter()
        .chain(CANDIDATES.iter().map(PathBuf::from))
}

/// Registers the first usable font file under the configured family name.
fn register() -> Option<String> {
    let family = match constants().font_family.trim() {
        "" => "sans-serif",
        name => name,
    };
    for path in candidates() {
        let Ok(bytes) = std::fs::read(&path) else {
            continue;
        };
        // Registered fonts must outlive every drawing call; this runs once.
        let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
        match plotters::style::register_font(family, plotters::style::FontStyle::Normal, bytes) {
            Ok(()) => {
                log::debug!("registered font family '{family}' from {}", path.display());
                return Some(family.to_string());
            }
            Err(_) => log::debug!("{} is not a usable font", path.display()),
        }
    }
    log::warn!("no usable font found (set {FONT_ENV}); charts will be drawn without text");
    None
}

/// Family name text is drawn with, registering it on first use. `None` when
/// no font could be loaded.
pub fn font_family() -> Option<&'static str> {
    INIT_FONTS.get_or_init(register).as_deref()
}

/// Whether charts can carry text.
pub fn fonts_available() -> bool {
    font_family().is_some()
}
