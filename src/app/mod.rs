//! Application wiring for the headless client

mod frame_loop;
mod state;

pub use frame_loop::FrameLoop;
pub use state::AppState;
