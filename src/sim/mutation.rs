//! Globally synchronized shimmer.
//!
//! On a mutation frame every mutating cell of every column gets a fresh
//! glyph, all in the same call. Static cells keep the glyph they were
//! spawned with. No state lives here; the frame number comes from the
//! [`FrameClock`] passed in.

use rand::Rng;

use crate::domain::column::Column;
use crate::domain::glyph::GlyphPool;
use crate::sim::clock::FrameClock;

/// Re-sample mutating cells if this is a mutation frame. Returns whether it fired.
pub fn tick<R: Rng + ?Sized>(
    clock: &FrameClock,
    interval: u64,
    columns: &mut [Column],
    pool: &GlyphPool,
    rng: &mut R,
) -> bool {
    if !clock.is_mutation_frame(interval) {
        return false;
    }
    for column in columns {
        for glyph in column.mutating_glyphs_mut() {
            *glyph = pool.sample(rng);
        }
    }
    true
}
