// Front-end wiring constants.

pub use soundscape_core::constants::{IMPULSE_RESPONSE_URL, SAMPLE_URL, SURFACE_ELEMENT_ID};

// setInterval period; the scheduler absorbs timer jitter
pub const CONTROL_TIMER_MS: i32 = soundscape_core::constants::CONTROL_TICK_MS as i32;
