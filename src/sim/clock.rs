//! Frame counter and elapsed-time accumulator for one session.

use std::time::Duration;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameClock {
    /// Frames simulated so far. The first `tick` makes this 1.
    pub frame: u64,
    /// Sum of all simulated deltas.
    pub elapsed: Duration,
}

impl FrameClock {
    pub fn new() -> Self {
        FrameClock::default()
    }

    pub fn tick(&mut self, dt: Duration) {
        self.frame += 1;
        self.elapsed += dt;
    }

    /// Shimmer fires on every `interval`-th frame. An interval of 0 never fires.
    pub fn is_mutation_frame(&self, interval: u64) -> bool {
        interval != 0 && self.frame % interval == 0
    }
}
