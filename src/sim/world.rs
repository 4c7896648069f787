//! RainWorld: the complete state of a running animation.
//!
//! ## Ownership
//!
//!   - `columns`: active columns in spawn order (flat, no per-slot lists)
//!   - `grid`: scratch buffer the compositor rebuilds every frame
//!   - `diff`: owns the previous frame and the level → color palette
//!   - `rng`, `clock`: explicit state; a seeded world replays the same animation
//!
//! Dimensions are `cols` slots wide and `rows` rows high. A resize throws
//! away every in-flight column and forces a full repaint.

use std::time::Duration;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;

use crate::config::RainParams;
use crate::domain::column::Column;
use crate::domain::glyph::GlyphPool;
use crate::domain::shade::Palette;
use crate::sim::clock::FrameClock;
use crate::sim::diff::DiffRenderer;
use crate::sim::event::RainEvent;
use crate::sim::grid::Grid;

pub struct RainWorld {
    pub params: RainParams,
    pub levels: u8,
    pub pool: GlyphPool,
    pub rng: ChaCha8Rng,
    pub clock: FrameClock,
    pub columns: Vec<Column>,
    pub grid: Grid,
    pub diff: DiffRenderer,
    pub cols: usize,
    pub rows: usize,
    /// Events from the most recent step.
    pub events: Vec<RainEvent>,
}

impl RainWorld {
    pub fn new(params: RainParams, pool: GlyphPool, palette: Palette, cols: usize, rows: usize) -> Self {
        let rng = match params.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        RainWorld {
            levels: palette.levels(),
            params,
            pool,
            rng,
            clock: FrameClock::new(),
            columns: Vec::new(),
            grid: Grid::new(rows, cols),
            diff: DiffRenderer::new(rows, cols, palette),
            cols,
            rows,
            events: Vec::new(),
        }
    }

    /// Rebuild both grids at the new size and drop all columns.
    /// A resize to the current size keeps the columns but still repaints,
    /// since the terminal may have reflowed or cleared the screen.
    pub fn resize(&mut self, cols: usize, rows: usize) {
        if cols == self.cols && rows == self.rows {
            self.diff.invalidate();
            return;
        }
        info!(from_cols = self.cols, from_rows = self.rows, cols, rows, "surface resized");
        self.cols = cols;
        self.rows = rows;
        self.columns.clear();
        self.grid = Grid::new(rows, cols);
        self.diff.resize(rows, cols);
    }

    /// Wall-clock budget for one frame at the target rate.
    pub fn frame_budget(&self) -> Duration {
        Duration::from_secs(1) / self.params.target_fps.max(1)
    }

    /// The most recently emitted frame.
    pub fn frame(&self) -> &Grid {
        self.diff.previous()
    }

    /// Row index of the last visible row (-1 for an empty surface).
    pub fn bottom_row(&self) -> f32 {
        self.rows as f32 - 1.0
    }
}
