//! Diff against the previous frame: only changed cells leave the core.
//!
//! How it works:
//!   1. Compare each cell of the new grid with the previous grid
//!   2. Record an update (position, glyph, level, tone) for each difference
//!   3. Swap: the new grid becomes the previous one, and the caller gets the
//!      stale buffer back to composite the next frame into
//!
//! Invalidating the previous grid forces the next emit to cover every cell.

use crate::domain::shade::{Palette, Tone};
use crate::sim::grid::{Cell, Grid};

/// One dirty cell, ready for an output sink.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct CellUpdate {
    pub row: usize,
    pub col: usize,
    pub glyph: char,
    pub level: u8,
    pub tone: Tone,
}

pub struct DiffRenderer {
    previous: Grid,
    palette: Palette,
    updates: Vec<CellUpdate>,
}

impl DiffRenderer {
    /// Starts against a blank previous frame (the sink clears the screen on begin).
    pub fn new(rows: usize, cols: usize, palette: Palette) -> Self {
        DiffRenderer {
            previous: Grid::new(rows, cols),
            palette,
            updates: Vec::with_capacity(rows * cols / 4),
        }
    }

    /// New dimensions; the next emit repaints everything.
    pub fn resize(&mut self, rows: usize, cols: usize) {
        self.previous = Grid::new(rows, cols);
        self.previous.invalidate();
        self.updates.clear();
    }

    pub fn invalidate(&mut self) {
        self.previous.invalidate();
    }

    #[allow(dead_code)]
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// The last emitted frame.
    pub fn previous(&self) -> &Grid {
        &self.previous
    }

    /// Diff `current` against the previous frame, then swap the two.
    /// On return `current` holds the stale frame.
    pub fn emit(&mut self, current: &mut Grid) -> &[CellUpdate] {
        self.updates.clear();

        if !current.same_shape(&self.previous) {
            self.previous = Grid::new(current.rows(), current.cols());
            self.previous.invalidate();
        }

        for (row, col, cell) in current.iter() {
            if cell == self.previous.get(row, col) {
                continue;
            }
            let update = self.update_for(row, col, cell);
            self.updates.push(update);
        }

        std::mem::swap(current, &mut self.previous);
        &self.updates
    }

    fn update_for(&self, row: usize, col: usize, cell: Cell) -> CellUpdate {
        CellUpdate {
            row,
            col,
            glyph: cell.glyph,
            level: cell.level,
            tone: self.palette.tone(cell.level),
        }
    }
}
