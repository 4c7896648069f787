pub mod clock;
pub mod diff;
pub mod event;
pub mod frame_loop;
pub mod grid;
pub mod mutation;
pub mod step;
pub mod world;
