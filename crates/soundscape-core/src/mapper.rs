//! Pure mapping from pointer position to wind level and EQ curve.

use crate::config::SessionConfig;
use crate::constants::{BAND_COUNT, CURVE_A, CURVE_C, FADE_AMOUNT, NOISE_LEVEL_SCALE};
use crate::pointer::PointerState;

/// Linear gain per EQ band, lowest band first.
pub type BandGain = [f32; BAND_COUNT];

/// Result of one mapping step.
///
/// `band_gain` is `None` while the pointer is absent: the EQ keeps whatever
/// curve it had when the pointer left.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MapOutput {
    pub noise_gain: f32,
    pub band_gain: Option<BandGain>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParameterMapper {
    pub fade_amount: f32,
    pub level_scale: f32,
    pub curve_a: f32,
    pub curve_c: f32,
}

impl Default for ParameterMapper {
    fn default() -> Self {
        Self {
            fade_amount: FADE_AMOUNT,
            level_scale: NOISE_LEVEL_SCALE,
            curve_a: CURVE_A,
            curve_c: CURVE_C,
        }
    }
}

impl From<&SessionConfig> for ParameterMapper {
    fn from(cfg: &SessionConfig) -> Self {
        Self {
            fade_amount: cfg.fade_amount,
            level_scale: cfg.noise_level_scale,
            curve_a: cfg.curve_a,
            curve_c: cfg.curve_c,
        }
    }
}

impl ParameterMapper {
    /// Map one pointer snapshot, given the gain applied on the previous tick.
    ///
    /// Absent pointer: fade out by `fade_amount`, floored at zero.
    /// Present pointer: fade in by at most `fade_amount`, capped at the target
    /// level `(1 - y) * level_scale`. A gain already above the target drops
    /// straight to it.
    pub fn map(&self, pointer: PointerState, previous_noise_gain: f32) -> MapOutput {
        match pointer.position() {
            None => MapOutput {
                noise_gain: (previous_noise_gain - self.fade_amount).max(0.0),
                band_gain: None,
            },
            Some(p) => {
                let target = self.target_level(p.y);
                let noise_gain = (previous_noise_gain + self.fade_amount).min(target);
                let curve = self.band_curve_db(p.x);
                MapOutput {
                    noise_gain,
                    band_gain: Some(curve.map(db_to_linear)),
                }
            }
        }
    }

    /// Wind level for a normalized vertical position (top = loudest).
    #[inline]
    pub fn target_level(&self, y: f32) -> f32 {
        (1.0 - y) * self.level_scale
    }

    /// Inverted parabola in dB centered on band index `x * BAND_COUNT`.
    pub fn band_curve_db(&self, x: f32) -> [f32; BAND_COUNT] {
        let center = x * BAND_COUNT as f32;
        std::array::from_fn(|i| {
            let d = i as f32 - center;
            self.curve_a * d * d + self.curve_c
        })
    }
}

#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}
