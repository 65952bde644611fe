//! Click-triggered notes: a pitched sample layered with two oscillators.

use crate::backend::{AudioBackend, NodeSpec, Param, SignalNode, Waveform};
use crate::config::SessionConfig;
use crate::constants::{semitone_ratio, MAX_STEP_DRAWS, NOTE_STOP_TAIL_SEC, SCALE_STEPS};
use crate::error::{AssetError, AssetKind, BackendResult};
use crate::reverb::ReverbBus;
use fnv::FnvHashMap;
use rand::prelude::*;
use smallvec::SmallVec;

/// Semitone offset from the base pitch, in `[0, 12)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScaleStep(u8);

impl ScaleStep {
    pub fn new(step: u8) -> Option<Self> {
        (step < SCALE_STEPS).then_some(ScaleStep(step))
    }

    #[inline]
    pub fn get(self) -> u8 {
        self.0
    }

    /// Frequency multiplier `2^(step/12)`.
    #[inline]
    pub fn ratio(self) -> f32 {
        semitone_ratio().powi(self.0 as i32)
    }
}

/// Draws scale steps, never the same step twice in a row.
pub struct StepPicker<R = StdRng> {
    rng: R,
}

impl StepPicker {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }
}

impl<R: Rng> StepPicker<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Draw the next step and record it in `last`.
    ///
    /// Rejection-samples until the draw differs from `last`. After
    /// `MAX_STEP_DRAWS` rejections it settles on the step above `last`.
    pub fn next(&mut self, last: &mut Option<ScaleStep>) -> ScaleStep {
        let mut picked = None;
        for _ in 0..MAX_STEP_DRAWS {
            let step = ScaleStep(self.rng.gen_range(0..SCALE_STEPS));
            if Some(step) != *last {
                picked = Some(step);
                break;
            }
        }
        let step = picked.unwrap_or_else(|| {
            let prev = last.map_or(0, ScaleStep::get);
            log::debug!("[notes] step draws exhausted; stepping up from {}", prev);
            ScaleStep((prev + 1) % SCALE_STEPS)
        });
        *last = Some(step);
        step
    }
}

/// Pitch parameters of one note, all derived from the same ratio.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VoicePitch {
    pub step: ScaleStep,
    pub ratio: f32,
    pub playback_rate: f32,
    pub osc_low_hz: f32,
    pub osc_high_hz: f32,
}

impl VoicePitch {
    pub fn new(step: ScaleStep, osc_low_base_hz: f32, osc_high_base_hz: f32) -> Self {
        let ratio = step.ratio();
        Self {
            step,
            ratio,
            playback_rate: ratio,
            osc_low_hz: osc_low_base_hz * ratio,
            osc_high_hz: osc_high_base_hz * ratio,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoiceId(pub u64);

/// Nodes of one triggered note, kept until both the envelope and the sample
/// have finished.
pub struct Voice<B: AudioBackend> {
    pub id: VoiceId,
    pub pitch: VoicePitch,
    pub started_at: f64,
    pub ends_at: f64,
    pub has_sample: bool,
    nodes: SmallVec<[B::Node; 4]>,
}

impl<B: AudioBackend> Voice<B> {
    pub fn nodes(&self) -> &[B::Node] {
        &self.nodes
    }

    fn release(&self) {
        for node in &self.nodes {
            if let Err(e) = node.disconnect() {
                log::debug!("[notes] voice {} disconnect: {}", self.id.0, e);
            }
        }
    }
}

/// Live voices keyed by id.
pub struct VoiceRegistry<B: AudioBackend> {
    voices: FnvHashMap<VoiceId, Voice<B>>,
}

impl<B: AudioBackend> Default for VoiceRegistry<B> {
    fn default() -> Self {
        Self {
            voices: FnvHashMap::default(),
        }
    }
}

impl<B: AudioBackend> VoiceRegistry<B> {
    pub fn insert(&mut self, voice: Voice<B>) {
        self.voices.insert(voice.id, voice);
    }

    pub fn get(&self, id: VoiceId) -> Option<&Voice<B>> {
        self.voices.get(&id)
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    /// Disconnect and drop every voice that finished before `now`.
    /// Returns how many were released.
    pub fn prune(&mut self, now: f64) -> usize {
        let before = self.voices.len();
        self.voices.retain(|_, v| {
            let done = now >= v.ends_at + NOTE_STOP_TAIL_SEC;
            if done {
                v.release();
            }
            !done
        });
        before - self.voices.len()
    }
}

pub struct NoteTriggerEngine<B: AudioBackend> {
    picker: StepPicker,
    sample: Option<B::Buffer>,
    note_gain: f32,
    decay_sec: f64,
    osc_low_hz: f32,
    osc_high_hz: f32,
    next_id: u64,
}

impl<B: AudioBackend> NoteTriggerEngine<B> {
    pub fn new(cfg: &SessionConfig) -> Self {
        Self {
            picker: StepPicker::new(cfg.seed),
            sample: None,
            note_gain: cfg.note_gain,
            decay_sec: cfg.note_decay_sec,
            osc_low_hz: cfg.osc_low_hz,
            osc_high_hz: cfg.osc_high_hz,
            next_id: 0,
        }
    }

    pub fn has_sample(&self) -> bool {
        self.sample.is_some()
    }

    pub fn set_sample(&mut self, backend: &B, sample: B::Buffer) -> Result<(), AssetError> {
        if backend.buffer_frames(&sample) == 0 {
            return Err(AssetError::Empty(AssetKind::Sample));
        }
        self.sample = Some(sample);
        log::info!("[notes] sample ready");
        Ok(())
    }

    /// Play one note now.
    ///
    /// The sample and oscillator layers are built independently: a missing
    /// sample or a refused node silences that layer only.
    pub fn trigger(
        &mut self,
        backend: &B,
        bus: &ReverbBus<B>,
        last_step: &mut Option<ScaleStep>,
    ) -> Voice<B> {
        let step = self.picker.next(last_step);
        let pitch = VoicePitch::new(step, self.osc_low_hz, self.osc_high_hz);
        let now = backend.current_time();
        let mut nodes: SmallVec<[B::Node; 4]> = SmallVec::new();

        let mut has_sample = false;
        let mut ends_at = now + self.decay_sec;
        match &self.sample {
            Some(buffer) => match spawn_sample(backend, bus, buffer, &pitch, now) {
                Ok(src) => {
                    nodes.push(src);
                    has_sample = true;
                    let rate = f64::from(pitch.playback_rate);
                    if rate > 0.0 {
                        ends_at = ends_at.max(now + backend.buffer_duration(buffer) / rate);
                    }
                }
                Err(e) => log::warn!("[notes] sample layer skipped: {}", e),
            },
            None => log::debug!("[notes] sample not loaded; oscillators only"),
        }

        if let Err(e) = self.spawn_oscillators(backend, bus, &pitch, now, &mut nodes) {
            log::warn!("[notes] oscillator layer skipped: {}", e);
        }

        self.next_id += 1;
        log::debug!(
            "[notes] step={} ratio={:.4} osc=({:.1},{:.1})Hz",
            step.get(),
            pitch.ratio,
            pitch.osc_low_hz,
            pitch.osc_high_hz
        );
        Voice {
            id: VoiceId(self.next_id),
            pitch,
            started_at: now,
            ends_at,
            has_sample,
            nodes,
        }
    }

    fn spawn_oscillators(
        &self,
        backend: &B,
        bus: &ReverbBus<B>,
        pitch: &VoicePitch,
        now: f64,
        nodes: &mut SmallVec<[B::Node; 4]>,
    ) -> BackendResult {
        let env = backend.create_node(NodeSpec::Gain {
            gain: self.note_gain,
        })?;
        env.schedule(Param::Gain, 0.0, now + self.decay_sec)?;
        bus.route(&env)?;
        nodes.push(env.clone());

        for frequency_hz in [pitch.osc_low_hz, pitch.osc_high_hz] {
            let spawned = backend
                .create_node(NodeSpec::Oscillator {
                    waveform: Waveform::Sine,
                    frequency_hz,
                })
                .and_then(|osc| {
                    osc.connect(&env)?;
                    osc.start(now)?;
                    osc.stop(now + self.decay_sec + NOTE_STOP_TAIL_SEC)?;
                    Ok(osc)
                });
            match spawned {
                Ok(osc) => nodes.push(osc),
                Err(e) => log::warn!("[notes] oscillator {:.1}Hz: {}", frequency_hz, e),
            }
        }
        Ok(())
    }
}

fn spawn_sample<B: AudioBackend>(
    backend: &B,
    bus: &ReverbBus<B>,
    buffer: &B::Buffer,
    pitch: &VoicePitch,
    now: f64,
) -> BackendResult<B::Node> {
    let src = backend.create_node(NodeSpec::BufferSource {
        buffer: Some(buffer.clone()),
        playback_rate: pitch.playback_rate,
        looping: false,
    })?;
    bus.route(&src)?;
    src.start(now)?;
    Ok(src)
}
