/// Presentation: window state and the frame scheduler

pub mod window_state;
pub mod frame_scheduler;

pub use window_state::*;
pub use frame_scheduler::*;
