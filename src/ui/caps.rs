//! Terminal capability probe.
//!
//! Decides, once per session, whether the terminal can show the katakana
//! pool and the 256-color ramp. Reduced capability is not an error: the
//! session runs with the ASCII pool or the basic palette and says so at
//! `info` level.

use std::env;

use tracing::info;

use crate::config::{ColorMode, DisplayConfig, GlyphMode};
use crate::domain::shade::ColorDepth;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Capabilities {
    pub unicode: bool,
    pub extended_color: bool,
}

impl Capabilities {
    pub fn detect() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Probe through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let colorterm = lookup("COLORTERM").unwrap_or_default().to_ascii_lowercase();
        let term = lookup("TERM").unwrap_or_default().to_ascii_lowercase();
        let extended_color =
            colorterm == "truecolor" || colorterm == "24bit" || term.contains("256color");

        // Locale precedence: the first non-empty of LC_ALL, LC_CTYPE, LANG decides.
        let locale = ["LC_ALL", "LC_CTYPE", "LANG"]
            .iter()
            .filter_map(|key| lookup(key))
            .find(|value| !value.is_empty())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let unicode = locale.contains("utf-8") || locale.contains("utf8");

        Capabilities { unicode, extended_color }
    }

    /// Apply config overrides. Returns `(unicode, color depth)`.
    pub fn resolve(&self, display: &DisplayConfig) -> (bool, ColorDepth) {
        let unicode = match display.glyphs {
            GlyphMode::Auto => self.unicode,
            GlyphMode::Unicode => true,
            GlyphMode::Ascii => false,
        };
        let depth = match display.color {
            ColorMode::Auto if self.extended_color => ColorDepth::Extended,
            ColorMode::Auto => ColorDepth::Basic,
            ColorMode::Extended => ColorDepth::Extended,
            ColorMode::Basic => ColorDepth::Basic,
        };

        if !unicode {
            info!("using ASCII glyph pool");
        }
        if depth == ColorDepth::Basic {
            info!("using basic 16-color palette");
        }
        (unicode, depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RainConfig;
    use std::collections::HashMap;

    fn probe(vars: &[(&str, &str)]) -> Capabilities {
        let map: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Capabilities::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn modern_terminal() {
        let caps = probe(&[("TERM", "xterm-256color"), ("LANG", "en_US.UTF-8")]);
        assert_eq!(caps, Capabilities { unicode: true, extended_color: true });
    }

    #[test]
    fn colorterm_alone_means_extended() {
        assert!(probe(&[("TERM", "xterm"), ("COLORTERM", "truecolor")]).extended_color);
        assert!(probe(&[("COLORTERM", "24bit")]).extended_color);
        assert!(!probe(&[("TERM", "xterm")]).extended_color);
    }

    #[test]
    fn bare_environment_degrades() {
        assert_eq!(probe(&[]), Capabilities { unicode: false, extended_color: false });
    }

    #[test]
    fn lc_all_overrides_lang() {
        assert!(!probe(&[("LC_ALL", "C"), ("LANG", "en_US.UTF-8")]).unicode);
        assert!(probe(&[("LC_ALL", ""), ("LC_CTYPE", "C.utf8"), ("LANG", "C")]).unicode);
    }

    #[test]
    fn config_overrides_detection() {
        let caps = Capabilities { unicode: false, extended_color: false };
        let mut display = RainConfig::default().display;
        assert_eq!(caps.resolve(&display), (false, ColorDepth::Basic));

        display.glyphs = GlyphMode::Unicode;
        display.color = ColorMode::Extended;
        assert_eq!(caps.resolve(&display), (true, ColorDepth::Extended));

        let caps = Capabilities { unicode: true, extended_color: true };
        display.glyphs = GlyphMode::Ascii;
        display.color = ColorMode::Basic;
        assert_eq!(caps.resolve(&display), (false, ColorDepth::Basic));
    }
}
