//! Fixed-timestep frame loop and the seams it talks through.
//!
//! One iteration:
//!   1. Poll the surface (quit / resize / nothing)
//!   2. Measure dt since the previous iteration, clamped to [`MAX_FRAME_DELTA`]
//!   3. Step the world and hand the dirty cells to the sink
//!   4. Sleep whatever is left of the frame budget
//!
//! A slow frame is never caught up: the next iteration simply sees a
//! larger dt. The sink's session is always ended, on quit and on error.

use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, error, info};

use crate::error::Result;
use crate::sim::diff::CellUpdate;
use crate::sim::event::RainEvent;
use crate::sim::step::step;
use crate::sim::world::RainWorld;

/// Upper bound on the simulated time of one frame (e.g. after a suspend).
pub const MAX_FRAME_DELTA: Duration = Duration::from_millis(250);

// ── Collaborators ──

/// Where dirty cells go. The only writer of the output stream.
pub trait OutputSink {
    fn begin_session(&mut self) -> Result<()>;
    fn present(&mut self, updates: &[CellUpdate]) -> Result<()>;
    fn end_session(&mut self) -> Result<()>;
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SurfaceEvent {
    Idle,
    Resized { cols: usize, rows: usize },
    Quit,
}

/// The display surface: its size, and the user's request to stop.
pub trait Surface {
    /// `(cols, rows)`
    fn size(&self) -> Result<(usize, usize)>;
    /// Non-blocking. Called once at the top of every iteration.
    fn poll(&mut self) -> Result<SurfaceEvent>;
}

/// Injectable clock and sleep.
pub trait FrameTimer {
    /// Monotonic time since some fixed origin.
    fn now(&self) -> Duration;
    fn sleep(&mut self, duration: Duration);
}

pub struct SystemTimer {
    origin: Instant,
}

impl SystemTimer {
    pub fn new() -> Self {
        SystemTimer { origin: Instant::now() }
    }
}

impl Default for SystemTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameTimer for SystemTimer {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&mut self, duration: Duration) {
        thread::sleep(duration);
    }
}

// ── Session ──

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub frames: u64,
    pub spawned: u64,
    pub reaped: u64,
    pub shimmers: u64,
    pub cells_emitted: u64,
    pub slow_frames: u64,
    pub resizes: u64,
}

impl SessionStats {
    fn record(&mut self, events: &[RainEvent]) {
        for event in events {
            match event {
                RainEvent::Spawned { .. } => self.spawned += 1,
                RainEvent::Reaped { count } => self.reaped += *count as u64,
                RainEvent::Shimmer => self.shimmers += 1,
            }
        }
    }
}

/// Run until the surface reports quit or the sink fails.
pub fn run<O, S, T>(world: &mut RainWorld, sink: &mut O, surface: &mut S, timer: &mut T) -> Result<SessionStats>
where
    O: OutputSink + ?Sized,
    S: Surface + ?Sized,
    T: FrameTimer + ?Sized,
{
    info!(cols = world.cols, rows = world.rows, fps = world.params.target_fps, "rain session starting");

    let outcome = sink.begin_session().and_then(|()| drive(world, sink, surface, timer));
    let teardown = sink.end_session();

    match (outcome, teardown) {
        (Ok(stats), Ok(())) => {
            let lit = world.frame().iter().filter(|(_, _, cell)| !cell.is_blank()).count();
            info!(
                frames = stats.frames,
                lit,
                spawned = stats.spawned,
                reaped = stats.reaped,
                cells = stats.cells_emitted,
                slow = stats.slow_frames,
                "rain session finished"
            );
            Ok(stats)
        }
        (Ok(_), Err(e)) => Err(e),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(teardown_err)) => {
            error!(error = %teardown_err, "terminal teardown failed");
            Err(e)
        }
    }
}

fn drive<O, S, T>(world: &mut RainWorld, sink: &mut O, surface: &mut S, timer: &mut T) -> Result<SessionStats>
where
    O: OutputSink + ?Sized,
    S: Surface + ?Sized,
    T: FrameTimer + ?Sized,
{
    let budget = world.frame_budget();
    let mut stats = SessionStats::default();
    let mut last = timer.now();

    loop {
        match surface.poll()? {
            SurfaceEvent::Quit => break,
            SurfaceEvent::Resized { cols, rows } => {
                world.resize(cols, rows);
                stats.resizes += 1;
            }
            SurfaceEvent::Idle => {}
        }

        let frame_start = timer.now();
        let dt = frame_start.saturating_sub(last).min(MAX_FRAME_DELTA);
        last = frame_start;

        let updates = step(world, dt);
        stats.cells_emitted += updates.len() as u64;
        sink.present(updates)?;
        stats.frames += 1;
        stats.record(&world.events);

        let spent = timer.now().saturating_sub(frame_start);
        if spent > budget {
            stats.slow_frames += 1;
            debug!(frame = world.clock.frame, ?spent, ?budget, "slow frame");
        } else if spent < budget {
            timer.sleep(budget - spent);
        }
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RainParams;
    use crate::domain::glyph::GlyphPool;
    use crate::domain::shade::{ColorDepth, Palette};
    use crate::error::RainError;
    use std::cell::Cell;
    use std::collections::VecDeque;
    use std::io;
    use std::rc::Rc;

    type Clock = Rc<Cell<Duration>>;

    struct ManualTimer {
        clock: Clock,
        sleeps: Vec<Duration>,
    }

    impl FrameTimer for ManualTimer {
        fn now(&self) -> Duration {
            self.clock.get()
        }

        fn sleep(&mut self, duration: Duration) {
            self.sleeps.push(duration);
            self.clock.set(self.clock.get() + duration);
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        began: bool,
        ended: bool,
        frames: Vec<Vec<CellUpdate>>,
        /// Simulated render time per present.
        cost: Duration,
        clock: Option<Clock>,
        fail_on_frame: Option<usize>,
        fail_teardown: bool,
    }

    impl OutputSink for RecordingSink {
        fn begin_session(&mut self) -> Result<()> {
            self.began = true;
            Ok(())
        }

        fn present(&mut self, updates: &[CellUpdate]) -> Result<()> {
            if self.fail_on_frame == Some(self.frames.len()) {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone").into());
            }
            if let Some(clock) = &self.clock {
                clock.set(clock.get() + self.cost);
            }
            self.frames.push(updates.to_vec());
            Ok(())
        }

        fn end_session(&mut self) -> Result<()> {
            self.ended = true;
            if self.fail_teardown {
                return Err(io::Error::new(io::ErrorKind::Other, "teardown").into());
            }
            Ok(())
        }
    }

    /// Replays a fixed script of events, then quits.
    struct ScriptedSurface {
        size: (usize, usize),
        script: VecDeque<SurfaceEvent>,
    }

    impl ScriptedSurface {
        fn idle_frames(n: usize) -> Self {
            ScriptedSurface { size: (30, 20), script: std::iter::repeat(SurfaceEvent::Idle).take(n).collect() }
        }
    }

    impl Surface for ScriptedSurface {
        fn size(&self) -> Result<(usize, usize)> {
            Ok(self.size)
        }

        fn poll(&mut self) -> Result<SurfaceEvent> {
            Ok(self.script.pop_front().unwrap_or(SurfaceEvent::Quit))
        }
    }

    fn world(spawn_probability: f64) -> RainWorld {
        let params = RainParams { spawn_probability, seed: Some(11), ..RainParams::default() };
        RainWorld::new(params, GlyphPool::fallback(), Palette::new(ColorDepth::Extended, 6), 30, 20)
    }

    fn timer() -> (ManualTimer, Clock) {
        let clock = Rc::new(Cell::new(Duration::ZERO));
        (ManualTimer { clock: clock.clone(), sleeps: Vec::new() }, clock)
    }

    #[test]
    fn runs_n_frames_without_real_delay() {
        let mut w = world(0.1);
        let (mut t, _) = timer();
        let mut sink = RecordingSink::default();
        let mut surface = ScriptedSurface::idle_frames(100);

        let stats = run(&mut w, &mut sink, &mut surface, &mut t).unwrap();
        assert_eq!(stats.frames, 100);
        assert_eq!(sink.frames.len(), 100);
        assert!(sink.began && sink.ended);
        assert!(stats.spawned > 0);
        assert_eq!(stats.cells_emitted, sink.frames.iter().map(|f| f.len() as u64).sum::<u64>());
        // Zero-cost frames sleep the whole 50 ms budget.
        assert_eq!(t.sleeps.len(), 100);
        assert!(t.sleeps.iter().all(|&s| s == Duration::from_millis(50)));
        assert_eq!(w.clock.frame, 100);
    }

    #[test]
    fn sleeps_only_the_remainder_and_never_negative() {
        let mut w = world(0.0);
        let (mut t, clock) = timer();
        let mut sink = RecordingSink { cost: Duration::from_millis(20), clock: Some(clock), ..Default::default() };
        let mut surface = ScriptedSurface::idle_frames(5);
        let stats = run(&mut w, &mut sink, &mut surface, &mut t).unwrap();
        assert_eq!(stats.slow_frames, 0);
        assert!(t.sleeps.iter().all(|&s| s == Duration::from_millis(30)));
    }

    #[test]
    fn slow_frames_skip_the_sleep_and_do_not_catch_up() {
        let mut w = world(0.0);
        let (mut t, clock) = timer();
        let mut sink = RecordingSink { cost: Duration::from_millis(80), clock: Some(clock), ..Default::default() };
        let mut surface = ScriptedSurface::idle_frames(4);
        let stats = run(&mut w, &mut sink, &mut surface, &mut t).unwrap();
        assert_eq!(stats.frames, 4);
        assert_eq!(stats.slow_frames, 4);
        assert!(t.sleeps.is_empty());
        // One step per iteration; the 80 ms gaps become the next dt.
        assert_eq!(w.clock.frame, 4);
        assert_eq!(w.clock.elapsed, Duration::from_millis(240));
    }

    #[test]
    fn dt_is_clamped() {
        let mut w = world(0.0);
        let (mut t, clock) = timer();
        let mut sink = RecordingSink { cost: Duration::from_secs(5), clock: Some(clock), ..Default::default() };
        let mut surface = ScriptedSurface::idle_frames(3);
        run(&mut w, &mut sink, &mut surface, &mut t).unwrap();
        assert_eq!(w.clock.elapsed, MAX_FRAME_DELTA * 2);
    }

    #[test]
    fn quit_on_first_poll_still_tears_down() {
        let mut w = world(0.5);
        let (mut t, _) = timer();
        let mut sink = RecordingSink::default();
        let mut surface = ScriptedSurface::idle_frames(0);
        let stats = run(&mut w, &mut sink, &mut surface, &mut t).unwrap();
        assert_eq!(stats.frames, 0);
        assert!(sink.frames.is_empty());
        assert!(sink.began && sink.ended);
        assert_eq!(w.clock.frame, 0);
    }

    #[test]
    fn sink_failure_propagates_after_teardown() {
        let mut w = world(0.5);
        let (mut t, _) = timer();
        let mut sink = RecordingSink { fail_on_frame: Some(3), ..Default::default() };
        let mut surface = ScriptedSurface::idle_frames(10);
        let err = run(&mut w, &mut sink, &mut surface, &mut t).unwrap_err();
        assert!(matches!(err, RainError::Terminal(ref e) if e.kind() == io::ErrorKind::BrokenPipe));
        assert!(sink.ended);
        assert_eq!(sink.frames.len(), 3);
    }

    #[test]
    fn loop_error_wins_over_teardown_error() {
        let mut w = world(0.5);
        let (mut t, _) = timer();
        let mut sink = RecordingSink { fail_on_frame: Some(0), fail_teardown: true, ..Default::default() };
        let mut surface = ScriptedSurface::idle_frames(10);
        let err = run(&mut w, &mut sink, &mut surface, &mut t).unwrap_err();
        assert!(matches!(err, RainError::Terminal(ref e) if e.kind() == io::ErrorKind::BrokenPipe));
    }

    #[test]
    fn teardown_error_after_clean_run_is_reported() {
        let mut w = world(0.0);
        let (mut t, _) = timer();
        let mut sink = RecordingSink { fail_teardown: true, ..Default::default() };
        let mut surface = ScriptedSurface::idle_frames(2);
        assert!(run(&mut w, &mut sink, &mut surface, &mut t).is_err());
        assert_eq!(sink.frames.len(), 2);
    }

    #[test]
    fn resize_repaints_every_cell_of_the_new_surface() {
        let mut w = world(0.0);
        let (mut t, _) = timer();
        let mut sink = RecordingSink::default();
        let mut surface = ScriptedSurface {
            size: (30, 20),
            script: VecDeque::from([
                SurfaceEvent::Idle,
                SurfaceEvent::Resized { cols: 12, rows: 8 },
                SurfaceEvent::Idle,
            ]),
        };
        let stats = run(&mut w, &mut sink, &mut surface, &mut t).unwrap();
        assert_eq!(stats.resizes, 1);
        assert!(sink.frames[0].is_empty());
        assert_eq!(sink.frames[1].len(), 12 * 8);
        assert!(sink.frames[1].iter().all(|u| u.row < 8 && u.col < 12));
        assert!(sink.frames[2].is_empty());
        assert_eq!(surface.size().unwrap(), (30, 20));
    }
}
