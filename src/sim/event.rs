//! Events emitted during a simulation step.
//! The frame loop consumes these for session statistics and tracing.

#[derive(Clone, Debug, PartialEq)]
pub enum RainEvent {
    Spawned { slot: usize, speed: f32, length: usize },
    Reaped { count: usize },
    Shimmer,
}
