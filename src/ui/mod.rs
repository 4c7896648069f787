pub mod caps;
pub mod input;
pub mod renderer;
