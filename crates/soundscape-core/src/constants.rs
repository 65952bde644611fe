/// Tuning constants for the soundscape control core.
///
/// These express the intended behavior (cadence, fade rates, curve shape) and
/// keep magic numbers out of the engines. `SessionConfig::default()` is built
/// from them.

// Number of EQ bands in the wind chain
pub const BAND_COUNT: usize = 10;

// Center (or shelf boundary) frequency of each band in Hz
pub const BAND_FREQUENCIES_HZ: [f32; BAND_COUNT] = [
    31.25, 62.5, 125.0, 250.0, 500.0, 1000.0, 2000.0, 4000.0, 8000.0, 16000.0,
];

// Q for the peaking bands (one octave bandwidth)
pub const PEAKING_Q: f32 = 1.414214;

// Control cadence
pub const CONTROL_TICK_MS: u64 = 40;
pub const MAX_CATCH_UP_TICKS: u32 = 4;

// Wind level: bounded step per tick, and the level reached at the top edge
pub const FADE_AMOUNT: f32 = 0.001;
pub const NOISE_LEVEL_SCALE: f32 = 0.2;

// EQ curve dB_i = a * (i - p)^2 + c
pub const CURVE_A: f32 = -1.5;
pub const CURVE_C: f32 = 20.0;

// Length of the looped noise buffer
pub const NOISE_SECONDS: f32 = 100.0;

// Notes
pub const SCALE_STEPS: u8 = 12;
pub const MAX_STEP_DRAWS: u32 = 1000;
pub const NOTE_GAIN: f32 = 0.2;
pub const NOTE_DECAY_SEC: f64 = 4.0;
pub const NOTE_STOP_TAIL_SEC: f64 = 0.05; // oscillators stop just after the envelope reaches zero
pub const OSC_LOW_HZ: f32 = 87.0;
pub const OSC_HIGH_HZ: f32 = 130.0;

// Reverb feedback loop
pub const REVERB_DELAY_SEC: f32 = 0.5;
pub const REVERB_MAX_DELAY_SEC: f32 = 1.0;
pub const REVERB_FEEDBACK: f32 = 0.2;

// Page bindings. Element ids are case-sensitive.
pub const SURFACE_ELEMENT_ID: &str = "Haunted";
pub const IMPULSE_RESPONSE_URL: &str = "IR/VeryLargeAmbience.wav";
pub const SAMPLE_URL: &str = "audio/KarplusStrongCut.wav";

#[inline]
pub fn semitone_ratio() -> f32 {
    2.0_f32.powf(1.0 / 12.0)
}
