//! Session orchestration: owns the shared state and every engine, and is the
//! single entry point for the front-end (pointer, clicks, assets, timer).

use crate::backend::AudioBackend;
use crate::config::SessionConfig;
use crate::error::{AssetError, BackendResult};
use crate::mapper::ParameterMapper;
use crate::notes::{NoteTriggerEngine, ScaleStep, VoiceId, VoiceRegistry};
use crate::pointer::PointerCell;
use crate::reverb::ReverbBus;
use crate::scheduler::{ControlScheduler, TickOutcome};
use crate::wind::WindEngine;
use rand::prelude::*;
use std::sync::Arc;
use std::time::Duration;

// Derives the noise RNG from the session seed so notes and noise stay independent
const NOISE_SEED_MIX: u64 = 0x9E37_79B9_7F4A_7C15;

/// Mutable per-session values shared by the engines.
#[derive(Debug, Default)]
pub struct SessionState {
    pub pointer: Arc<PointerCell>,
    /// Wind gain applied on the last tick.
    pub noise_gain: f32,
    pub last_step: Option<ScaleStep>,
}

pub struct Session<B: AudioBackend> {
    backend: B,
    cfg: SessionConfig,
    state: SessionState,
    mapper: ParameterMapper,
    bus: ReverbBus<B>,
    wind: Option<WindEngine<B>>,
    notes: NoteTriggerEngine<B>,
    voices: VoiceRegistry<B>,
    scheduler: ControlScheduler,
}

impl<B: AudioBackend> Session<B> {
    /// Build the reverb bus; the wind engine waits for `start`.
    pub fn new(backend: B, cfg: SessionConfig) -> BackendResult<Self> {
        let bus = ReverbBus::new(&backend, cfg.reverb_delay_sec, cfg.reverb_feedback)?;
        Ok(Self {
            mapper: ParameterMapper::from(&cfg),
            notes: NoteTriggerEngine::new(&cfg),
            scheduler: ControlScheduler::new(cfg.tick_period, cfg.max_catch_up_ticks),
            voices: VoiceRegistry::default(),
            state: SessionState::default(),
            wind: None,
            bus,
            backend,
            cfg,
        })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &SessionConfig {
        &self.cfg
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn bus(&self) -> &ReverbBus<B> {
        &self.bus
    }

    pub fn wind(&self) -> Option<&WindEngine<B>> {
        self.wind.as_ref()
    }

    pub fn voices(&self) -> &VoiceRegistry<B> {
        &self.voices
    }

    pub fn scheduler(&self) -> &ControlScheduler {
        &self.scheduler
    }

    /// Handle for the pointer adapter. Writes need no access to the session.
    pub fn pointer(&self) -> Arc<PointerCell> {
        self.state.pointer.clone()
    }

    pub fn is_started(&self) -> bool {
        self.wind.is_some()
    }

    /// Build and start the wind engine, then activate the control tick.
    ///
    /// Safe to call repeatedly and before the backend is running: the resume
    /// request is issued each time, the graph is built once.
    pub fn start(&mut self) -> BackendResult {
        if let Err(e) = self.backend.resume() {
            log::warn!("[session] resume failed: {}", e);
        }
        if self.wind.is_some() {
            return Ok(());
        }
        let mut rng = match self.cfg.seed {
            Some(s) => StdRng::seed_from_u64(s ^ NOISE_SEED_MIX),
            None => StdRng::from_entropy(),
        };
        let wind = WindEngine::new(&self.backend, &self.bus, &self.cfg, &mut rng)?;
        wind.start(self.backend.current_time())?;
        self.wind = Some(wind);
        self.scheduler.activate();
        log::info!("[session] started");
        Ok(())
    }

    /// One control step: pointer → mapper → wind, then prune finished voices.
    pub fn control_tick(&mut self) -> TickOutcome {
        let Some(wind) = self.wind.as_mut() else {
            return TickOutcome::Skipped;
        };
        if !self.scheduler.is_active() {
            return TickOutcome::Skipped;
        }
        let pointer = self.state.pointer.load();
        let out = self.mapper.map(pointer, self.state.noise_gain);
        if let Err(e) = wind.apply(&out) {
            log::warn!("[session] wind update failed: {}", e);
        }
        // track what reached the gain node, even on a partial write
        self.state.noise_gain = wind.level();
        let released = self.voices.prune(self.backend.current_time());
        if released > 0 {
            log::debug!("[session] released {} voices", released);
        }
        self.scheduler.record_tick();
        TickOutcome::Applied
    }

    /// Feed elapsed wall time and run every tick that became due.
    pub fn advance(&mut self, dt: Duration) -> u32 {
        let due = self.scheduler.advance(dt);
        for _ in 0..due {
            self.control_tick();
        }
        due
    }

    /// Play a note now and keep it in the registry until its decay ends.
    pub fn trigger_note(&mut self) -> VoiceId {
        if !self.backend.is_running() {
            if let Err(e) = self.backend.resume() {
                log::warn!("[session] resume failed: {}", e);
            }
        }
        let voice = self
            .notes
            .trigger(&self.backend, &self.bus, &mut self.state.last_step);
        let id = voice.id;
        self.voices.insert(voice);
        id
    }

    pub fn attach_impulse_response(&mut self, impulse: B::Buffer) -> Result<(), AssetError> {
        self.bus
            .attach_impulse_response(&self.backend, impulse)
            .inspect_err(|e| self.asset_failed(e))
    }

    pub fn attach_sample(&mut self, sample: B::Buffer) -> Result<(), AssetError> {
        self.notes
            .set_sample(&self.backend, sample)
            .inspect_err(|e| self.asset_failed(e))
    }

    pub fn has_sample(&self) -> bool {
        self.notes.has_sample()
    }

    /// Record an asset that will never arrive; its branch stays silent.
    pub fn asset_failed(&self, err: &AssetError) {
        log::error!("[session] {}; continuing without it", err);
    }
}
