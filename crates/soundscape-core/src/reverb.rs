//! Shared reverb send/return.
//!
//! Topology once the impulse response is attached:
//!
//! ```text
//! source ──► input ──► convolver ──► dry ──► output
//!    │                   ▲    │
//!    │                   │    ▼
//!    │               feedback ◄── delay
//!    └──────────────────────────► dry
//! ```
//!
//! `input` and `dry` exist from construction, so sources can be routed before
//! the impulse response has loaded; the wet path is simply silent until then.

use crate::backend::{AudioBackend, NodeSpec, SignalNode};
use crate::constants::REVERB_MAX_DELAY_SEC;
use crate::error::{AssetError, AssetKind, BackendResult};

struct ReverbTail<N> {
    convolver: N,
    delay: N,
    feedback: N,
}

pub struct ReverbBus<B: AudioBackend> {
    input: B::Node,
    dry: B::Node,
    tail: Option<ReverbTail<B::Node>>,
    delay_sec: f32,
    feedback: f32,
}

impl<B: AudioBackend> ReverbBus<B> {
    pub fn new(backend: &B, delay_sec: f32, feedback: f32) -> BackendResult<Self> {
        let dry = backend.create_node(NodeSpec::Gain { gain: 1.0 })?;
        dry.connect(&backend.output())?;
        let input = backend.create_node(NodeSpec::Gain { gain: 1.0 })?;
        Ok(Self {
            input,
            dry,
            tail: None,
            delay_sec,
            feedback,
        })
    }

    /// Wet send. Accepts connections before the bus is ready.
    pub fn input(&self) -> &B::Node {
        &self.input
    }

    /// Dry output mix.
    pub fn dry(&self) -> &B::Node {
        &self.dry
    }

    pub fn is_ready(&self) -> bool {
        self.tail.is_some()
    }

    /// Connect a source to both the wet send and the dry mix.
    pub fn route(&self, src: &B::Node) -> BackendResult {
        src.connect(&self.input)?;
        src.connect(&self.dry)
    }

    /// Bind the impulse response and close the feedback loop. One-shot.
    pub fn attach_impulse_response(
        &mut self,
        backend: &B,
        impulse: B::Buffer,
    ) -> Result<(), AssetError> {
        if self.is_ready() {
            log::warn!("[reverb] impulse response already attached; ignoring");
            return Ok(());
        }
        if backend.buffer_frames(&impulse) == 0 {
            return Err(AssetError::Empty(AssetKind::ImpulseResponse));
        }
        let wire = || -> BackendResult<ReverbTail<B::Node>> {
            let convolver = backend.create_node(NodeSpec::Convolver {
                buffer: impulse.clone(),
                normalize: true,
            })?;
            let delay = backend.create_node(NodeSpec::Delay {
                max_delay_sec: REVERB_MAX_DELAY_SEC.max(self.delay_sec),
                delay_sec: self.delay_sec,
            })?;
            let feedback = backend.create_node(NodeSpec::Gain {
                gain: self.feedback,
            })?;
            convolver.connect(&self.dry)?;
            convolver.connect(&delay)?;
            delay.connect(&feedback)?;
            feedback.connect(&convolver)?;
            self.input.connect(&convolver)?;
            Ok(ReverbTail {
                convolver,
                delay,
                feedback,
            })
        };
        let tail = wire().map_err(|source| AssetError::Backend {
            asset: AssetKind::ImpulseResponse,
            source,
        })?;
        log::info!(
            "[reverb] ready (delay={:.2}s feedback={:.2})",
            self.delay_sec,
            self.feedback
        );
        self.tail = Some(tail);
        Ok(())
    }

    /// Nodes of the wet path, when ready: convolver, delay, feedback gain.
    pub fn tail_nodes(&self) -> Option<[&B::Node; 3]> {
        self.tail
            .as_ref()
            .map(|t| [&t.convolver, &t.delay, &t.feedback])
    }
}
