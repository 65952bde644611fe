//! Continuous wind texture: looped noise through a 10-band serial EQ.

use crate::backend::{AudioBackend, FilterKind, NodeSpec, PcmBuffer, Param, SignalNode};
use crate::config::SessionConfig;
use crate::constants::{BAND_COUNT, BAND_FREQUENCIES_HZ};
use crate::error::BackendResult;
use crate::mapper::{BandGain, MapOutput};
use crate::reverb::ReverbBus;
use rand::Rng;

// Biquad default; shelves ignore it
const SHELF_Q: f32 = 1.0;

/// Noise source → level gain → band 0 → … → band 9 → reverb bus.
///
/// The level starts at zero, so the engine is silent until the control tick
/// feeds it a non-zero target.
pub struct WindEngine<B: AudioBackend> {
    source: B::Node,
    gain: B::Node,
    bands: Vec<B::Node>,
    level: f32,
    band_gain: Option<BandGain>,
}

impl<B: AudioBackend> WindEngine<B> {
    pub fn new<R: Rng>(
        backend: &B,
        bus: &ReverbBus<B>,
        cfg: &SessionConfig,
        rng: &mut R,
    ) -> BackendResult<Self> {
        let noise = noise_buffer(backend.sample_rate(), cfg.noise_seconds, rng);
        let buffer = backend.create_buffer(&noise)?;
        let source = backend.create_node(NodeSpec::BufferSource {
            buffer: Some(buffer),
            playback_rate: 1.0,
            looping: true,
        })?;
        let gain = backend.create_node(NodeSpec::Gain { gain: 0.0 })?;

        let mut bands = Vec::with_capacity(BAND_COUNT);
        for (i, &frequency_hz) in BAND_FREQUENCIES_HZ.iter().enumerate() {
            let (kind, q) = match i {
                0 => (FilterKind::LowShelf, SHELF_Q),
                i if i == BAND_COUNT - 1 => (FilterKind::HighShelf, SHELF_Q),
                _ => (FilterKind::Peaking, cfg.peaking_q),
            };
            bands.push(backend.create_node(NodeSpec::Filter {
                kind,
                frequency_hz,
                q,
                gain: 0.0,
            })?);
        }

        source.connect(&gain)?;
        gain.connect(&bands[0])?;
        for pair in bands.windows(2) {
            pair[0].connect(&pair[1])?;
        }
        bus.route(&bands[BAND_COUNT - 1])?;

        log::info!(
            "[wind] built: {} noise frames, {} bands",
            noise.frames(),
            bands.len()
        );
        Ok(Self {
            source,
            gain,
            bands,
            level: 0.0,
            band_gain: None,
        })
    }

    pub fn start(&self, when: f64) -> BackendResult {
        self.source.start(when)
    }

    /// Write one tick of mapper output to the live nodes.
    ///
    /// Band values go to each filter's gain parameter unchanged; the EQ is
    /// left alone when the mapper reports no new curve.
    pub fn apply(&mut self, out: &MapOutput) -> BackendResult {
        self.gain.set_param(Param::Gain, out.noise_gain)?;
        self.level = out.noise_gain;
        if let Some(curve) = out.band_gain {
            for (band, value) in self.bands.iter().zip(curve.iter()) {
                band.set_param(Param::Gain, *value)?;
            }
            self.band_gain = Some(curve);
        }
        Ok(())
    }

    /// Level most recently written to the gain node.
    pub fn level(&self) -> f32 {
        self.level
    }

    /// Curve most recently written to the EQ; `None` while still flat.
    pub fn band_gain(&self) -> Option<BandGain> {
        self.band_gain
    }

    pub fn gain_node(&self) -> &B::Node {
        &self.gain
    }

    pub fn band_nodes(&self) -> &[B::Node] {
        &self.bands
    }
}

/// Mono buffer of uniform noise in `[-1, 1]`, `seconds` long.
pub fn noise_buffer<R: Rng>(sample_rate: f32, seconds: f32, rng: &mut R) -> PcmBuffer {
    let frames = ((sample_rate * seconds) as usize).max(1);
    let samples = (0..frames).map(|_| rng.gen_range(-1.0f32..=1.0)).collect();
    PcmBuffer::mono(sample_rate, samples)
}
