//! Presentation layer: writes dirty cells to the terminal.
//!
//! How it works:
//!   1. The diff renderer hands over only the cells that changed
//!   2. Each cell becomes MoveTo + color + Print, batched with `queue!`
//!   3. MoveTo is skipped when the cursor is already in place (runs of
//!      adjacent cells on one row), and colors are only set when they change
//!   4. One flush per frame
//!
//! The session owns the terminal: raw mode, alternate screen, hidden
//! cursor. Dropping an active renderer restores the terminal.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Attribute, Print, ResetColor, SetAttribute, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::shade::Tone;
use crate::error::Result;
use crate::sim::diff::CellUpdate;
use crate::sim::frame_loop::OutputSink;

pub struct TerminalRenderer<W: Write> {
    writer: W,
    /// Between begin_session and end_session.
    active: bool,
    /// Toggle raw mode with the session (off for non-tty writers).
    raw_mode: bool,
}

impl TerminalRenderer<BufWriter<io::Stdout>> {
    pub fn stdout() -> Self {
        let mut renderer = TerminalRenderer::new(BufWriter::with_capacity(64 * 1024, io::stdout()));
        renderer.raw_mode = true;
        renderer
    }
}

impl<W: Write> TerminalRenderer<W> {
    /// Renderer over an arbitrary writer; raw mode is left alone.
    pub fn new(writer: W) -> Self {
        TerminalRenderer { writer, active: false, raw_mode: false }
    }

    #[cfg(test)]
    pub fn writer(&self) -> &W {
        &self.writer
    }

    fn restore(&mut self) -> io::Result<()> {
        self.active = false;
        execute!(
            self.writer,
            SetAttribute(Attribute::Reset),
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        if self.raw_mode {
            terminal::disable_raw_mode()?;
        }
        Ok(())
    }

    fn queue_updates(&mut self, updates: &[CellUpdate]) -> io::Result<()> {
        // Unknown at the start of a frame: the first update always sets both.
        let mut tone: Option<Tone> = None;
        let mut cursor_at: Option<(usize, usize)> = None;

        for u in updates {
            if cursor_at != Some((u.row, u.col)) {
                queue!(self.writer, MoveTo(u.col as u16, u.row as u16))?;
            }
            if tone != Some(u.tone) {
                self.queue_tone(tone, u.tone)?;
                tone = Some(u.tone);
            }
            queue!(self.writer, Print(u.glyph))?;
            cursor_at = Some((u.row, u.col + 1));
        }
        Ok(())
    }

    fn queue_tone(&mut self, prev: Option<Tone>, next: Tone) -> io::Result<()> {
        if prev.map(|t| t.dim) != Some(next.dim) {
            let attr = if next.dim { Attribute::Dim } else { Attribute::NormalIntensity };
            queue!(self.writer, SetAttribute(attr))?;
        }
        if prev.map(|t| t.fg) != Some(next.fg) {
            queue!(self.writer, SetForegroundColor(next.fg))?;
        }
        Ok(())
    }
}

impl<W: Write> OutputSink for TerminalRenderer<W> {
    fn begin_session(&mut self) -> Result<()> {
        if self.raw_mode {
            terminal::enable_raw_mode()?;
        }
        self.active = true;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            ResetColor,
            Clear(ClearType::All)
        )?;
        Ok(())
    }

    fn present(&mut self, updates: &[CellUpdate]) -> Result<()> {
        if updates.is_empty() {
            return Ok(());
        }
        self.queue_updates(updates)?;
        self.writer.flush()?;
        Ok(())
    }

    fn end_session(&mut self) -> Result<()> {
        if self.active {
            self.restore()?;
        }
        Ok(())
    }
}

impl<W: Write> Drop for TerminalRenderer<W> {
    fn drop(&mut self) {
        if self.active {
            let _ = self.restore();
        }
    }
}
