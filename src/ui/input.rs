//! Terminal surface: size queries and the quit/resize event drain.
//!
//! Events are drained without blocking once per frame. Any quit key wins
//! over everything else in the same drain; several resizes in one drain
//! collapse into the last one.

use std::time::Duration;

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;

use crate::error::Result;
use crate::sim::frame_loop::{Surface, SurfaceEvent};

pub struct TerminalSurface;

impl TerminalSurface {
    pub fn new() -> Self {
        TerminalSurface
    }
}

impl Default for TerminalSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl Surface for TerminalSurface {
    fn size(&self) -> Result<(usize, usize)> {
        let (cols, rows) = terminal::size()?;
        Ok((cols as usize, rows as usize))
    }

    fn poll(&mut self) -> Result<SurfaceEvent> {
        let mut pending = SurfaceEvent::Idle;
        while poll(Duration::ZERO)? {
            match event::read()? {
                Event::Key(key) if is_quit_key(&key) => return Ok(SurfaceEvent::Quit),
                Event::Resize(cols, rows) => {
                    pending = SurfaceEvent::Resized { cols: cols as usize, rows: rows as usize };
                }
                _ => {}
            }
        }
        Ok(pending)
    }
}

/// q, Q, Esc, or Ctrl+C. Release events never count.
pub fn is_quit_key(key: &KeyEvent) -> bool {
    if key.kind == KeyEventKind::Release {
        return false;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => true,
        KeyCode::Char('c') | KeyCode::Char('C') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}
