//! Entry point: configuration, logging, capability probe, frame loop.

mod config;
mod domain;
mod error;
mod sim;
mod ui;

use std::fs::File;
use std::io;
use std::process::ExitCode;
use std::sync::Mutex;

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::{LogConfig, RainConfig};
use domain::glyph::GlyphPool;
use domain::shade::Palette;
use error::Result;
use sim::frame_loop::{self, Surface, SystemTimer};
use sim::world::RainWorld;
use ui::caps::Capabilities;
use ui::input::TerminalSurface;
use ui::renderer::TerminalRenderer;

fn main() -> ExitCode {
    let loaded = RainConfig::load();
    init_logging(&loaded.config.logging);

    match &loaded.source {
        Some(path) => info!(path = %path.display(), "loaded config"),
        None => info!("no config.toml found; using defaults"),
    }
    for warning in &loaded.warnings {
        warn!("{warning}");
    }

    match run(&loaded.config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // The terminal has been restored by now.
            eprintln!("digital-rain: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &RainConfig) -> Result<()> {
    let mut surface = TerminalSurface::new();
    let (cols, rows) = surface.size()?;
    config.display.check_size(cols, rows)?;

    let (unicode, depth) = Capabilities::detect().resolve(&config.display);
    let pool = GlyphPool::for_capability(unicode);
    info!(glyphs = pool.len(), ascii = pool.is_ascii(), ?depth, "glyph pool ready");
    let palette = Palette::new(depth, config.display.color_levels);
    let mut world = RainWorld::new(config.rain.clone(), pool, palette, cols, rows);

    let mut renderer = TerminalRenderer::stdout();
    let mut timer = SystemTimer::new();
    let stats = frame_loop::run(&mut world, &mut renderer, &mut surface, &mut timer)?;
    info!(frames = stats.frames, resizes = stats.resizes, shimmers = stats.shimmers, "exiting");
    Ok(())
}

/// `RUST_LOG` wins over the configured level. Logs go to stderr unless a
/// file is configured; a file that cannot be created falls back to stderr.
fn init_logging(logging: &LogConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let registry = tracing_subscriber::registry().with(filter);

    let file = logging.file.as_ref().and_then(|path| match File::create(path) {
        Ok(f) => Some(f),
        Err(e) => {
            eprintln!("digital-rain: cannot open log file {}: {e}", path.display());
            None
        }
    });

    match file {
        Some(f) => registry
            .with(tracing_subscriber::fmt::layer().with_writer(Mutex::new(f)).with_ansi(false))
            .init(),
        None => registry.with(tracing_subscriber::fmt::layer().with_writer(io::stderr)).init(),
    }
}
