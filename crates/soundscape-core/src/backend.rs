//! Capability interface over the audio rendering engine.
//!
//! The core never touches a concrete audio API. It asks an `AudioBackend` to
//! create processing units and then drives them through the small
//! `SignalNode` surface (connect, set a parameter, schedule a ramp, start).
//! The web front-end implements these traits over WebAudio; `TestBackend`
//! records every operation so routing logic can be asserted on the host.

use crate::error::{BackendError, BackendResult};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Oscillator shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Waveform {
    Sine,
}

/// Biquad response used by the wind EQ.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterKind {
    LowShelf,
    Peaking,
    HighShelf,
}

/// Automatable parameters the core writes to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Param {
    Gain,
    Frequency,
    Q,
    PlaybackRate,
    DelayTime,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Gain,
    Filter,
    Oscillator,
    BufferSource,
    Delay,
    Convolver,
}

/// Construction request for a processing unit, with its initial parameters.
///
/// `B` is the backend's buffer handle; a buffer source without a buffer is
/// valid and simply renders silence.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeSpec<B> {
    Gain {
        gain: f32,
    },
    Filter {
        kind: FilterKind,
        frequency_hz: f32,
        q: f32,
        gain: f32,
    },
    Oscillator {
        waveform: Waveform,
        frequency_hz: f32,
    },
    BufferSource {
        buffer: Option<B>,
        playback_rate: f32,
        looping: bool,
    },
    Delay {
        max_delay_sec: f32,
        delay_sec: f32,
    },
    Convolver {
        buffer: B,
        normalize: bool,
    },
}

impl<B> NodeSpec<B> {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeSpec::Gain { .. } => NodeKind::Gain,
            NodeSpec::Filter { .. } => NodeKind::Filter,
            NodeSpec::Oscillator { .. } => NodeKind::Oscillator,
            NodeSpec::BufferSource { .. } => NodeKind::BufferSource,
            NodeSpec::Delay { .. } => NodeKind::Delay,
            NodeSpec::Convolver { .. } => NodeKind::Convolver,
        }
    }
}

/// Linear PCM audio, one `Vec` per channel.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PcmBuffer {
    pub sample_rate: f32,
    pub channels: Vec<Vec<f32>>,
}

impl PcmBuffer {
    pub fn mono(sample_rate: f32, samples: Vec<f32>) -> Self {
        Self {
            sample_rate,
            channels: vec![samples],
        }
    }

    pub fn frames(&self) -> usize {
        self.channels.iter().map(Vec::len).max().unwrap_or(0)
    }
}

/// Handle to a backend processing unit.
pub trait SignalNode: Clone {
    fn connect(&self, dst: &Self) -> BackendResult;

    /// Detach all outgoing connections.
    fn disconnect(&self) -> BackendResult;

    /// Set a parameter immediately.
    fn set_param(&self, param: Param, value: f32) -> BackendResult;

    /// Ramp a parameter linearly from its current value to `value`, arriving at `at_time`.
    fn schedule(&self, param: Param, value: f32, at_time: f64) -> BackendResult;

    fn start(&self, when: f64) -> BackendResult;

    fn stop(&self, when: f64) -> BackendResult;
}

/// Factory and clock of the rendering engine.
pub trait AudioBackend {
    type Node: SignalNode;
    type Buffer: Clone;

    fn sample_rate(&self) -> f32;

    /// Render clock in seconds.
    fn current_time(&self) -> f64;

    fn is_running(&self) -> bool;

    /// Ask the engine to leave its suspended state. Not awaited.
    fn resume(&self) -> BackendResult;

    /// Final mix node.
    fn output(&self) -> Self::Node;

    fn create_buffer(&self, pcm: &PcmBuffer) -> BackendResult<Self::Buffer>;

    fn buffer_frames(&self, buffer: &Self::Buffer) -> usize;

    /// Playback length at unit rate, in seconds.
    fn buffer_duration(&self, buffer: &Self::Buffer) -> f64;

    fn create_node(&self, spec: NodeSpec<Self::Buffer>) -> BackendResult<Self::Node>;
}

// ─── Test Backend ───────────────────────────────────────────────────

pub type NodeId = u32;

/// Buffer handle handed out by `TestBackend`; the samples themselves are dropped.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TestBuffer {
    pub id: u32,
    pub channels: usize,
    pub frames: usize,
    pub sample_rate: f32,
}

/// An operation recorded by `TestBackend` for assertion in tests.
#[derive(Clone, Debug, PartialEq)]
pub enum GraphOp {
    Resume,
    CreateBuffer {
        buffer: TestBuffer,
        sample_rate: f32,
    },
    Create {
        node: NodeId,
        spec: NodeSpec<TestBuffer>,
    },
    Connect {
        src: NodeId,
        dst: NodeId,
    },
    Disconnect(NodeId),
    SetParam {
        node: NodeId,
        param: Param,
        value: f32,
    },
    Ramp {
        node: NodeId,
        param: Param,
        value: f32,
        at_time: f64,
    },
    Start {
        node: NodeId,
        when: f64,
    },
    Stop {
        node: NodeId,
        when: f64,
    },
}

#[derive(Default)]
struct Recorder {
    ops: RefCell<Vec<GraphOp>>,
    next_id: Cell<u32>,
    refused_params: RefCell<Vec<NodeId>>,
}

impl Recorder {
    fn push(&self, op: GraphOp) {
        self.ops.borrow_mut().push(op);
    }

    fn next_id(&self) -> u32 {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        id
    }
}

/// Node handle of `TestBackend`. Node 0 is the output.
#[derive(Clone)]
pub struct TestNode {
    pub id: NodeId,
    rec: Rc<Recorder>,
}

impl std::fmt::Debug for TestNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("TestNode").field(&self.id).finish()
    }
}

impl SignalNode for TestNode {
    fn connect(&self, dst: &Self) -> BackendResult {
        self.rec.push(GraphOp::Connect {
            src: self.id,
            dst: dst.id,
        });
        Ok(())
    }

    fn disconnect(&self) -> BackendResult {
        self.rec.push(GraphOp::Disconnect(self.id));
        Ok(())
    }

    fn set_param(&self, param: Param, value: f32) -> BackendResult {
        if self.rec.refused_params.borrow().contains(&self.id) {
            return Err(BackendError(format!("node {} refused {:?}", self.id, param)));
        }
        self.rec.push(GraphOp::SetParam {
            node: self.id,
            param,
            value,
        });
        Ok(())
    }

    fn schedule(&self, param: Param, value: f32, at_time: f64) -> BackendResult {
        self.rec.push(GraphOp::Ramp {
            node: self.id,
            param,
            value,
            at_time,
        });
        Ok(())
    }

    fn start(&self, when: f64) -> BackendResult {
        self.rec.push(GraphOp::Start {
            node: self.id,
            when,
        });
        Ok(())
    }

    fn stop(&self, when: f64) -> BackendResult {
        self.rec.push(GraphOp::Stop {
            node: self.id,
            when,
        });
        Ok(())
    }
}

/// A backend that records all operations into a vector for assertions.
///
/// All operations succeed unless a node kind was marked with `fail_on` or a
/// node with `refuse_params`.
/// The clock only moves when the test moves it.
pub struct TestBackend {
    rec: Rc<Recorder>,
    sample_rate: f32,
    time: Cell<f64>,
    running: Cell<bool>,
    failing: RefCell<Vec<NodeKind>>,
}

impl TestBackend {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            rec: Rc::new(Recorder::default()),
            sample_rate,
            time: Cell::new(0.0),
            running: Cell::new(false),
            failing: RefCell::new(Vec::new()),
        }
    }

    /// Make every subsequent `create_node` of this kind fail.
    pub fn fail_on(&self, kind: NodeKind) {
        self.failing.borrow_mut().push(kind);
    }

    /// Make every subsequent `set_param` on this node fail.
    pub fn refuse_params(&self, node: NodeId) {
        self.rec.refused_params.borrow_mut().push(node);
    }

    pub fn set_time(&self, t: f64) {
        self.time.set(t);
    }

    /// Return all recorded operations.
    pub fn operations(&self) -> Vec<GraphOp> {
        self.rec.ops.borrow().clone()
    }

    /// Clear recorded operations.
    pub fn clear(&self) {
        self.rec.ops.borrow_mut().clear();
    }

    /// Count operations matching a predicate.
    pub fn count<F: Fn(&GraphOp) -> bool>(&self, f: F) -> usize {
        self.rec.ops.borrow().iter().filter(|op| f(op)).count()
    }

    /// Specs of every node created so far, in creation order.
    pub fn nodes_created(&self) -> Vec<(NodeId, NodeSpec<TestBuffer>)> {
        self.rec
            .ops
            .borrow()
            .iter()
            .filter_map(|op| match op {
                GraphOp::Create { node, spec } => Some((*node, spec.clone())),
                _ => None,
            })
            .collect()
    }

    /// Destinations `src` has been connected to.
    pub fn connections_from(&self, src: NodeId) -> Vec<NodeId> {
        self.rec
            .ops
            .borrow()
            .iter()
            .filter_map(|op| match op {
                GraphOp::Connect { src: s, dst } if *s == src => Some(*dst),
                _ => None,
            })
            .collect()
    }

    /// Most recent immediate value written to `param` on `node`.
    pub fn last_param(&self, node: NodeId, param: Param) -> Option<f32> {
        self.rec.ops.borrow().iter().rev().find_map(|op| match op {
            GraphOp::SetParam {
                node: n,
                param: p,
                value,
            } if *n == node && *p == param => Some(*value),
            _ => None,
        })
    }
}

impl AudioBackend for TestBackend {
    type Node = TestNode;
    type Buffer = TestBuffer;

    fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    fn current_time(&self) -> f64 {
        self.time.get()
    }

    fn is_running(&self) -> bool {
        self.running.get()
    }

    fn resume(&self) -> BackendResult {
        self.running.set(true);
        self.rec.push(GraphOp::Resume);
        Ok(())
    }

    fn output(&self) -> TestNode {
        TestNode {
            id: 0,
            rec: self.rec.clone(),
        }
    }

    fn create_buffer(&self, pcm: &PcmBuffer) -> BackendResult<TestBuffer> {
        if pcm.channels.is_empty() {
            return Err(BackendError::from("buffer needs at least one channel"));
        }
        let buffer = TestBuffer {
            id: self.rec.next_id(),
            channels: pcm.channels.len(),
            frames: pcm.frames(),
            sample_rate: pcm.sample_rate,
        };
        self.rec.push(GraphOp::CreateBuffer {
            buffer,
            sample_rate: pcm.sample_rate,
        });
        Ok(buffer)
    }

    fn buffer_frames(&self, buffer: &TestBuffer) -> usize {
        buffer.frames
    }

    fn buffer_duration(&self, buffer: &TestBuffer) -> f64 {
        if buffer.sample_rate > 0.0 {
            buffer.frames as f64 / buffer.sample_rate as f64
        } else {
            0.0
        }
    }

    fn create_node(&self, spec: NodeSpec<TestBuffer>) -> BackendResult<TestNode> {
        if self.failing.borrow().contains(&spec.kind()) {
            return Err(BackendError(format!("{:?} creation refused", spec.kind())));
        }
        let id = self.rec.next_id();
        self.rec.push(GraphOp::Create { node: id, spec });
        Ok(TestNode {
            id,
            rec: self.rec.clone(),
        })
    }
}
