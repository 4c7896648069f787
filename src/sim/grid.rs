//! The composited frame: one (glyph, level) per screen cell.
//!
//! How it works:
//!   1. Clear the grid to blank
//!   2. For every active column, in spawn order, walk its visible rows
//!   3. Compute the candidate level from the distance to the head
//!      (runner row one level brighter)
//!   4. Keep the brightest candidate per cell; on equal levels the later
//!      (newer) column wins
//!
//! Nothing else writes to a grid; it is rebuilt from the columns each frame.

use crate::domain::column::Column;
use crate::domain::shade::{self, BLANK_LEVEL};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Cell {
    pub glyph: char,
    pub level: u8,
}

impl Cell {
    pub const BLANK: Cell = Cell { glyph: ' ', level: BLANK_LEVEL };

    /// Sentinel used to invalidate a previous frame.
    /// Different from any real cell, so every position will be diff'd.
    pub const INVALID: Cell = Cell { glyph: '\0', level: BLANK_LEVEL - 1 };

    pub fn is_blank(&self) -> bool {
        self.level == BLANK_LEVEL
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
}

impl Grid {
    pub fn new(rows: usize, cols: usize) -> Self {
        Grid { rows, cols, cells: vec![Cell::BLANK; rows * cols] }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> Cell {
        if row < self.rows && col < self.cols {
            self.cells[row * self.cols + col]
        } else {
            Cell::BLANK
        }
    }

    fn slot_mut(&mut self, row: usize, col: usize) -> Option<&mut Cell> {
        if row < self.rows && col < self.cols {
            Some(&mut self.cells[row * self.cols + col])
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    pub fn invalidate(&mut self) {
        self.cells.fill(Cell::INVALID);
    }

    /// `(row, col, cell)` in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, Cell)> + '_ {
        let cols = self.cols.max(1);
        self.cells.iter().enumerate().map(move |(i, &c)| (i / cols, i % cols, c))
    }

    pub fn same_shape(&self, other: &Grid) -> bool {
        self.rows == other.rows && self.cols == other.cols
    }
}

/// Composite `columns` into a freshly allocated grid.
#[allow(dead_code)]
pub fn composite(columns: &[Column], rows: usize, cols: usize, levels: u8) -> Grid {
    let mut grid = Grid::new(rows, cols);
    composite_into(&mut grid, columns, levels);
    grid
}

/// Rebuild `grid` from scratch. `columns` must be in spawn order.
pub fn composite_into(grid: &mut Grid, columns: &[Column], levels: u8) {
    grid.clear();
    let rows = grid.rows();
    for column in columns {
        let length = column.length();
        let cells = column.cells();
        for (row, distance) in column.visible_rows(rows) {
            let mut level = shade::level_for_distance(distance, length, levels);
            if column.highlight() == Some(distance) {
                level = shade::brighten(level);
            }
            let Some(slot) = grid.slot_mut(row, column.slot) else { break };
            if level <= slot.level {
                *slot = Cell { glyph: cells[distance].glyph, level };
            }
        }
    }
}
