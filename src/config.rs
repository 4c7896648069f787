//! External configuration loader.
//!
//! Reads `config.toml` from the executable's directory, the CWD, or
//! `~/.config/digital-rain`. Every key is optional and falls back to a
//! default; values outside their valid range are normalized rather than
//! rejected. Warnings are collected instead of printed so they can be
//! logged once the subscriber is installed.

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{RainError, Result};

// ── Public Config Structs ──

#[derive(Clone, Debug)]
pub struct RainConfig {
    pub rain: RainParams,
    pub display: DisplayConfig,
    pub logging: LogConfig,
}

/// Simulation parameters for the whole session.
#[derive(Clone, Debug)]
pub struct RainParams {
    pub target_fps: u32,
    pub spawn_probability: f64,
    pub mutation_interval_frames: u64,
    pub max_overlap_per_slot: usize,
    pub reap_margin: f32,
    pub seed: Option<u64>,
    pub column: ColumnParams,
}

/// Per-column sampling ranges, consumed by the spawn pass.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnParams {
    pub speed_min: f32,   // rows per second
    pub speed_max: f32,
    pub speed_skew: f32,  // >= 1.0; higher = more slow columns
    pub length_min: usize,
    pub length_max: usize,
    pub mutating_fraction: f64,
    pub highlight_probability: f64,
    /// 0.0..=1.0; new heads start up to this fraction of their length above row 0.
    pub entry_stagger: f32,
}

#[derive(Clone, Debug)]
pub struct DisplayConfig {
    pub color_levels: u8,
    pub color: ColorMode,
    pub glyphs: GlyphMode,
    pub min_width: usize,
    pub min_height: usize,
}

#[derive(Clone, Debug)]
pub struct LogConfig {
    pub level: String,
    pub file: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    #[default]
    Auto,
    Basic,
    Extended,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GlyphMode {
    #[default]
    Auto,
    Unicode,
    Ascii,
}

/// Result of [`RainConfig::load`]: the config plus where it came from.
pub struct Loaded {
    pub config: RainConfig,
    pub source: Option<PathBuf>,
    pub warnings: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    rain: TomlRain,
    #[serde(default)]
    display: TomlDisplay,
    #[serde(default)]
    logging: TomlLogging,
}

#[derive(Deserialize, Debug)]
struct TomlRain {
    #[serde(default = "default_target_fps")]
    target_fps: u32,
    #[serde(default = "default_spawn_probability")]
    spawn_probability: f64,
    #[serde(default = "default_speed_min")]
    speed_min: f32,
    #[serde(default = "default_speed_max")]
    speed_max: f32,
    #[serde(default = "default_speed_skew")]
    speed_skew: f32,
    #[serde(default = "default_length_min")]
    length_min: usize,
    #[serde(default = "default_length_max")]
    length_max: usize,
    #[serde(default = "default_mutation_interval")]
    mutation_interval_frames: u64,
    #[serde(default = "default_mutating_fraction")]
    mutating_fraction: f64,
    #[serde(default = "default_highlight_probability")]
    highlight_probability: f64,
    #[serde(default)]
    entry_stagger: f32,
    #[serde(default = "default_max_overlap")]
    max_overlap_per_slot: usize,
    #[serde(default)]
    reap_margin: f32,
    #[serde(default)]
    seed: Option<u64>,
}

#[derive(Deserialize, Debug)]
struct TomlDisplay {
    #[serde(default = "default_color_levels")]
    color_levels: u8,
    #[serde(default)]
    color: ColorMode,
    #[serde(default)]
    glyphs: GlyphMode,
    #[serde(default = "default_min_width")]
    min_width: usize,
    #[serde(default = "default_min_height")]
    min_height: usize,
}

#[derive(Deserialize, Debug)]
struct TomlLogging {
    #[serde(default = "default_log_level")]
    level: String,
    #[serde(default)]
    file: Option<String>,
}

// ── Defaults ──

fn default_target_fps() -> u32 { 20 }
fn default_spawn_probability() -> f64 { 0.025 }  // per slot per frame
fn default_speed_min() -> f32 { 5.0 }
fn default_speed_max() -> f32 { 20.0 }
fn default_speed_skew() -> f32 { 2.0 }
fn default_length_min() -> usize { 7 }
fn default_length_max() -> usize { 20 }
fn default_mutation_interval() -> u64 { 3 }
fn default_mutating_fraction() -> f64 { 0.5 }
fn default_highlight_probability() -> f64 { 0.2 }
fn default_max_overlap() -> usize { 3 }
fn default_color_levels() -> u8 { 6 }
fn default_min_width() -> usize { 40 }
fn default_min_height() -> usize { 20 }
fn default_log_level() -> String { "warn".into() }

const MAX_COLOR_LEVELS: u8 = 16;

impl Default for TomlRain {
    fn default() -> Self {
        TomlRain {
            target_fps: default_target_fps(),
            spawn_probability: default_spawn_probability(),
            speed_min: default_speed_min(),
            speed_max: default_speed_max(),
            speed_skew: default_speed_skew(),
            length_min: default_length_min(),
            length_max: default_length_max(),
            mutation_interval_frames: default_mutation_interval(),
            mutating_fraction: default_mutating_fraction(),
            highlight_probability: default_highlight_probability(),
            entry_stagger: 0.0,
            max_overlap_per_slot: default_max_overlap(),
            reap_margin: 0.0,
            seed: None,
        }
    }
}

impl Default for TomlDisplay {
    fn default() -> Self {
        TomlDisplay {
            color_levels: default_color_levels(),
            color: ColorMode::Auto,
            glyphs: GlyphMode::Auto,
            min_width: default_min_width(),
            min_height: default_min_height(),
        }
    }
}

impl Default for TomlLogging {
    fn default() -> Self {
        TomlLogging {
            level: default_log_level(),
            file: None,
        }
    }
}

impl Default for RainConfig {
    fn default() -> Self {
        RainConfig::from_toml(TomlConfig::default(), &mut Vec::new())
    }
}

impl Default for RainParams {
    fn default() -> Self {
        RainConfig::default().rain
    }
}

// ── Loading ──

impl RainConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory,
    /// (3) `~/.config/digital-rain`. Missing file or keys fall back to defaults.
    pub fn load() -> Loaded {
        let mut warnings = Vec::new();
        let Some((text, path)) = read_config_text(&candidate_dirs(), &mut warnings) else {
            return Loaded { config: RainConfig::default(), source: None, warnings };
        };
        let config = match RainConfig::from_toml_str(&text, &mut warnings) {
            Ok(cfg) => cfg,
            Err(e) => {
                warnings.push(format!("{} parse error, using defaults: {e}", path.display()));
                RainConfig::default()
            }
        };
        Loaded { config, source: Some(path), warnings }
    }

    /// Parse a config document. Normalization warnings are appended to `warnings`.
    pub fn from_toml_str(text: &str, warnings: &mut Vec<String>) -> std::result::Result<Self, toml::de::Error> {
        let toml_cfg = toml::from_str::<TomlConfig>(text)?;
        Ok(RainConfig::from_toml(toml_cfg, warnings))
    }

    fn from_toml(t: TomlConfig, warnings: &mut Vec<String>) -> Self {
        let r = t.rain;

        let target_fps = if r.target_fps == 0 {
            warnings.push("rain.target_fps must be at least 1; using 1".into());
            1
        } else {
            r.target_fps
        };

        let mutation_interval_frames = if r.mutation_interval_frames == 0 {
            warnings.push("rain.mutation_interval_frames must be at least 1; using 1".into());
            1
        } else {
            r.mutation_interval_frames
        };

        let (mut speed_min, mut speed_max) = (r.speed_min.max(0.0), r.speed_max.max(0.0));
        if speed_min > speed_max {
            warnings.push(format!("rain.speed_min ({speed_min}) > speed_max ({speed_max}); swapping"));
            std::mem::swap(&mut speed_min, &mut speed_max);
        }

        let speed_skew = if r.speed_skew.is_finite() && r.speed_skew >= 1.0 {
            r.speed_skew
        } else {
            warnings.push(format!("rain.speed_skew ({}) must be >= 1.0; using 1.0", r.speed_skew));
            1.0
        };

        let (mut length_min, mut length_max) = (r.length_min.max(1), r.length_max.max(1));
        if length_min > length_max {
            warnings.push(format!("rain.length_min ({length_min}) > length_max ({length_max}); swapping"));
            std::mem::swap(&mut length_min, &mut length_max);
        }

        let entry_stagger = if (0.0..=1.0).contains(&r.entry_stagger) {
            r.entry_stagger
        } else {
            let clamped = if r.entry_stagger.is_nan() { 0.0 } else { r.entry_stagger.clamp(0.0, 1.0) };
            warnings.push(format!("rain.entry_stagger ({}) outside 0..=1; using {clamped}", r.entry_stagger));
            clamped
        };

        let max_overlap_per_slot = if r.max_overlap_per_slot == 0 {
            warnings.push("rain.max_overlap_per_slot must be at least 1; using 1".into());
            1
        } else {
            r.max_overlap_per_slot
        };

        let d = t.display;
        let color_levels = if (2..=MAX_COLOR_LEVELS).contains(&d.color_levels) {
            d.color_levels
        } else {
            let clamped = d.color_levels.clamp(2, MAX_COLOR_LEVELS);
            warnings.push(format!(
                "display.color_levels ({}) outside 2..={MAX_COLOR_LEVELS}; using {clamped}",
                d.color_levels,
            ));
            clamped
        };

        RainConfig {
            rain: RainParams {
                target_fps,
                spawn_probability: probability("rain.spawn_probability", r.spawn_probability, warnings),
                mutation_interval_frames,
                max_overlap_per_slot,
                reap_margin: r.reap_margin.max(0.0),
                seed: r.seed,
                column: ColumnParams {
                    speed_min,
                    speed_max,
                    speed_skew,
                    length_min,
                    length_max,
                    mutating_fraction: probability("rain.mutating_fraction", r.mutating_fraction, warnings),
                    highlight_probability: probability(
                        "rain.highlight_probability",
                        r.highlight_probability,
                        warnings,
                    ),
                    entry_stagger,
                },
            },
            display: DisplayConfig {
                color_levels,
                color: d.color,
                glyphs: d.glyphs,
                min_width: d.min_width,
                min_height: d.min_height,
            },
            logging: LogConfig {
                level: t.logging.level,
                file: t.logging.file.filter(|f| !f.is_empty()).map(PathBuf::from),
            },
        }
    }
}

impl DisplayConfig {
    /// Precondition for starting a session.
    pub fn check_size(&self, cols: usize, rows: usize) -> Result<()> {
        if cols < self.min_width || rows < self.min_height {
            return Err(RainError::SurfaceTooSmall {
                cols,
                rows,
                min_cols: self.min_width,
                min_rows: self.min_height,
            });
        }
        Ok(())
    }
}

fn probability(key: &str, p: f64, warnings: &mut Vec<String>) -> f64 {
    if (0.0..=1.0).contains(&p) {
        p
    } else {
        let clamped = if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) };
        warnings.push(format!("{key} ({p}) outside 0..=1; using {clamped}"));
        clamped
    }
}

/// Candidate directories to search: exe dir + CWD + user config dir (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    let config_home = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")));
    if let Some(base) = config_home {
        let dir = base.join("digital-rain");
        if dir.is_dir() && !dirs.iter().any(|d| d == &dir) {
            dirs.push(dir);
        }
    }

    dirs
}

/// Search for config.toml in candidate directories. The first readable file
/// wins, even if it later fails to parse.
fn read_config_text(search_dirs: &[PathBuf], warnings: &mut Vec<String>) -> Option<(String, PathBuf)> {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if !path.exists() {
            continue;
        }
        match std::fs::read_to_string(&path) {
            Ok(text) => return Some((text, path)),
            Err(e) => warnings.push(format!("could not read {}: {e}", path.display())),
        }
    }
    None
}
