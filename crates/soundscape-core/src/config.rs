use crate::constants::*;
use std::time::Duration;

/// Tunables for a soundscape session.
///
/// - `tick_period` is the control cadence of the scheduler
/// - `fade_amount` bounds how far the wind level moves per tick
/// - `noise_level_scale` is the wind level with the pointer at the top edge
/// - `curve_a`/`curve_c` shape the EQ parabola `a * (i - p)^2 + c` (dB)
/// - `noise_seconds` is the length of the looped noise buffer
/// - `note_gain`/`note_decay_sec` define the oscillator envelope of a note
/// - `osc_low_hz`/`osc_high_hz` are the oscillator base frequencies at step 0
/// - `reverb_delay_sec`/`reverb_feedback` configure the reverb feedback loop
/// - `seed` fixes the note RNG; `None` draws from entropy
#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub tick_period: Duration,
    pub max_catch_up_ticks: u32,
    pub fade_amount: f32,
    pub noise_level_scale: f32,
    pub curve_a: f32,
    pub curve_c: f32,
    pub noise_seconds: f32,
    pub peaking_q: f32,
    pub note_gain: f32,
    pub note_decay_sec: f64,
    pub osc_low_hz: f32,
    pub osc_high_hz: f32,
    pub reverb_delay_sec: f32,
    pub reverb_feedback: f32,
    pub seed: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_period: Duration::from_millis(CONTROL_TICK_MS),
            max_catch_up_ticks: MAX_CATCH_UP_TICKS,
            fade_amount: FADE_AMOUNT,
            noise_level_scale: NOISE_LEVEL_SCALE,
            curve_a: CURVE_A,
            curve_c: CURVE_C,
            noise_seconds: NOISE_SECONDS,
            peaking_q: PEAKING_Q,
            note_gain: NOTE_GAIN,
            note_decay_sec: NOTE_DECAY_SEC,
            osc_low_hz: OSC_LOW_HZ,
            osc_high_hz: OSC_HIGH_HZ,
            reverb_delay_sec: REVERB_DELAY_SEC,
            reverb_feedback: REVERB_FEEDBACK,
            seed: None,
        }
    }
}

impl SessionConfig {
    /// Same defaults with a fixed RNG seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }
}
