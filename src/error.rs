//! Error types for the rain session.
//!
//! Only two things can go wrong: the display is too small to start, or the
//! terminal stops accepting output. Everything else (slow frames, empty
//! spawn passes, reduced capabilities) is a normal state.

use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RainError {
    /// Display surface below the configured minimum. Checked once, before
    /// the frame loop starts.
    #[error("terminal is {cols}x{rows}, need at least {min_cols}x{min_rows}")]
    SurfaceTooSmall {
        cols: usize,
        rows: usize,
        min_cols: usize,
        min_rows: usize,
    },

    /// Terminal I/O failed (broken pipe, closed tty, ...). Fatal.
    #[error("terminal I/O error: {0}")]
    Terminal(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, RainError>;
