//! Falling columns and their lifecycle: spawn, advance, reap.
//!
//! A column occupies its head row plus `length` trail rows above it, so it
//! carries `length + 1` cells. Cell 0 is the head; cell `d` sits `d` rows
//! above it. Length and the mutating mask are fixed at spawn; only glyphs
//! of mutating cells and `head_row` change afterwards.

use rand::Rng;

use crate::config::ColumnParams;
use crate::domain::glyph::GlyphPool;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TrailCell {
    pub glyph: char,
    pub mutating: bool,
}

#[derive(Clone, Debug)]
pub struct Column {
    pub slot: usize,
    /// Fractional row of the head. Only ever grows.
    pub head_row: f32,
    pub speed: f32, // rows per second
    pub spawn_tick: u64,
    cells: Box<[TrailCell]>,
    highlight: Option<usize>,
}

impl Column {
    /// Build a column from explicit cells (head first). `cells` must not be empty.
    pub fn new(
        slot: usize,
        speed: f32,
        cells: Vec<TrailCell>,
        highlight: Option<usize>,
        spawn_tick: u64,
    ) -> Self {
        debug_assert!(!cells.is_empty(), "a column needs at least its head cell");
        Column {
            slot,
            head_row: 0.0,
            speed,
            spawn_tick,
            highlight: highlight.filter(|&h| h < cells.len()),
            cells: cells.into_boxed_slice(),
        }
    }

    /// Sample a fresh column for `slot`.
    pub fn spawn<R: Rng + ?Sized>(
        slot: usize,
        params: &ColumnParams,
        pool: &GlyphPool,
        rng: &mut R,
        spawn_tick: u64,
    ) -> Self {
        let speed = sample_speed(params, rng);
        let length = rng.gen_range(params.length_min..=params.length_max);

        let cells = (0..=length)
            .map(|_| TrailCell {
                glyph: pool.sample(rng),
                mutating: rng.gen_bool(params.mutating_fraction),
            })
            .collect();

        // Runner sits in the middle third of the trail, never on the head.
        let highlight = if rng.gen_bool(params.highlight_probability) {
            let lo = (length / 3).max(1);
            let hi = (2 * length / 3).max(lo);
            Some(rng.gen_range(lo..=hi))
        } else {
            None
        };

        let mut column = Column::new(slot, speed, cells, highlight, spawn_tick);
        // Head starts up to `entry_stagger * length` rows above the screen.
        if params.entry_stagger > 0.0 {
            let offset: f32 = rng.gen_range(0.0..=params.entry_stagger);
            column.head_row = -offset * length as f32;
        }
        column
    }

    pub fn length(&self) -> usize {
        self.cells.len() - 1
    }

    pub fn cells(&self) -> &[TrailCell] {
        &self.cells
    }

    pub fn highlight(&self) -> Option<usize> {
        self.highlight
    }

    /// Integer row of the head.
    pub fn head(&self) -> i64 {
        self.head_row.floor() as i64
    }

    /// Glyphs of mutating cells, for the shimmer tick. Static cells are not reachable.
    pub fn mutating_glyphs_mut(&mut self) -> impl Iterator<Item = &mut char> + '_ {
        self.cells.iter_mut().filter(|c| c.mutating).map(|c| &mut c.glyph)
    }

    /// `(row, distance)` for every occupied row inside `0..rows`, head first.
    pub fn visible_rows(&self, rows: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        let head = self.head();
        (0..self.cells.len()).filter_map(move |d| {
            let row = head - d as i64;
            (row >= 0 && (row as usize) < rows).then_some((row as usize, d))
        })
    }

    /// Tail has passed `bottom_row + margin`.
    pub fn expired(&self, bottom_row: f32, margin: f32) -> bool {
        self.head_row - self.length() as f32 > bottom_row + margin
    }
}

/// `min + (max - min) * u^skew`: with skew > 1 most columns are slow, a few fast.
fn sample_speed<R: Rng + ?Sized>(params: &ColumnParams, rng: &mut R) -> f32 {
    let u: f32 = rng.gen();
    params.speed_min + (params.speed_max - params.speed_min) * u.powf(params.speed_skew)
}

// ── Lifecycle passes ──

/// One Bernoulli trial per slot below `max_overlap`; returns the new columns.
#[allow(clippy::too_many_arguments)]
pub fn spawn_pass<R: Rng + ?Sized>(
    active: &[Column],
    slot_count: usize,
    probability: f64,
    max_overlap: usize,
    params: &ColumnParams,
    pool: &GlyphPool,
    rng: &mut R,
    spawn_tick: u64,
) -> Vec<Column> {
    let mut occupancy = vec![0usize; slot_count];
    for c in active {
        if let Some(n) = occupancy.get_mut(c.slot) {
            *n += 1;
        }
    }

    let mut spawned = Vec::new();
    for (slot, &count) in occupancy.iter().enumerate() {
        if count < max_overlap && rng.gen_bool(probability) {
            spawned.push(Column::spawn(slot, params, pool, rng, spawn_tick));
        }
    }
    spawned
}

pub fn advance(columns: &mut [Column], dt: f32) {
    for c in columns {
        c.head_row += c.speed * dt;
    }
}

/// Drop expired columns, keeping spawn order. Returns how many were removed.
pub fn reap(columns: &mut Vec<Column>, bottom_row: f32, margin: f32) -> usize {
    let before = columns.len();
    columns.retain(|c| !c.expired(bottom_row, margin));
    before - columns.len()
}
