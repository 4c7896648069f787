//! Pure simulation primitives: glyphs, columns, brightness.

pub mod column;
pub mod glyph;
pub mod shade;
