//! WebAudio implementation of the core backend traits.

use soundscape_core::{
    AudioBackend, BackendError, BackendResult, FilterKind, NodeSpec, Param, PcmBuffer, SignalNode,
    Waveform,
};
use wasm_bindgen::JsValue;
use web_sys as web;

fn js_err(label: &'static str) -> impl Fn(JsValue) -> BackendError {
    move |e| BackendError(format!("{} error: {:?}", label, e))
}

/// A WebAudio node, tagged by type so parameters can be looked up.
#[derive(Clone)]
pub enum WebNode {
    Destination(web::AudioDestinationNode),
    Gain(web::GainNode),
    Filter(web::BiquadFilterNode),
    Oscillator(web::OscillatorNode),
    Source(web::AudioBufferSourceNode),
    Delay(web::DelayNode),
    Convolver(web::ConvolverNode),
}

impl WebNode {
    fn audio_node(&self) -> &web::AudioNode {
        match self {
            WebNode::Destination(n) => n,
            WebNode::Gain(n) => n,
            WebNode::Filter(n) => n,
            WebNode::Oscillator(n) => n,
            WebNode::Source(n) => n,
            WebNode::Delay(n) => n,
            WebNode::Convolver(n) => n,
        }
    }

    fn param(&self, param: Param) -> BackendResult<web::AudioParam> {
        match (self, param) {
            (WebNode::Gain(n), Param::Gain) => Ok(n.gain()),
            (WebNode::Filter(n), Param::Gain) => Ok(n.gain()),
            (WebNode::Filter(n), Param::Frequency) => Ok(n.frequency()),
            (WebNode::Filter(n), Param::Q) => Ok(n.q()),
            (WebNode::Oscillator(n), Param::Frequency) => Ok(n.frequency()),
            (WebNode::Source(n), Param::PlaybackRate) => Ok(n.playback_rate()),
            (WebNode::Delay(n), Param::DelayTime) => Ok(n.delay_time()),
            _ => Err(BackendError(format!("{:?} is not a parameter of this node", param))),
        }
    }
}

impl SignalNode for WebNode {
    fn connect(&self, dst: &Self) -> BackendResult {
        self.audio_node()
            .connect_with_audio_node(dst.audio_node())
            .map(|_| ())
            .map_err(js_err("connect"))
    }

    fn disconnect(&self) -> BackendResult {
        self.audio_node().disconnect().map_err(js_err("disconnect"))
    }

    fn set_param(&self, param: Param, value: f32) -> BackendResult {
        self.param(param)?.set_value(value);
        Ok(())
    }

    fn schedule(&self, param: Param, value: f32, at_time: f64) -> BackendResult {
        self.param(param)?
            .linear_ramp_to_value_at_time(value, at_time)
            .map(|_| ())
            .map_err(js_err("linearRampToValueAtTime"))
    }

    fn start(&self, when: f64) -> BackendResult {
        match self {
            WebNode::Source(n) => n.start_with_when(when).map_err(js_err("start")),
            WebNode::Oscillator(n) => n.start_with_when(when).map_err(js_err("start")),
            _ => Err(BackendError::from("start on a node that is not a source")),
        }
    }

    fn stop(&self, when: f64) -> BackendResult {
        match self {
            WebNode::Source(n) => n.stop_with_when(when).map_err(js_err("stop")),
            WebNode::Oscillator(n) => n.stop_with_when(when).map_err(js_err("stop")),
            _ => Err(BackendError::from("stop on a node that is not a source")),
        }
    }
}

pub struct WebBackend {
    ctx: web::AudioContext,
    output: WebNode,
}

impl WebBackend {
    pub fn new() -> anyhow::Result<Self> {
        let ctx = web::AudioContext::new().map_err(|e| anyhow::anyhow!("{:?}", e))?;
        let output = WebNode::Destination(ctx.destination());
        log::info!("[audio] context sample_rate={}", ctx.sample_rate());
        Ok(Self { ctx, output })
    }

    pub fn context(&self) -> &web::AudioContext {
        &self.ctx
    }
}

impl AudioBackend for WebBackend {
    type Node = WebNode;
    type Buffer = web::AudioBuffer;

    fn sample_rate(&self) -> f32 {
        self.ctx.sample_rate()
    }

    fn current_time(&self) -> f64 {
        self.ctx.current_time()
    }

    fn is_running(&self) -> bool {
        self.ctx.state() == web::AudioContextState::Running
    }

    fn resume(&self) -> BackendResult {
        self.ctx.resume().map(|_| ()).map_err(js_err("resume"))
    }

    fn output(&self) -> WebNode {
        self.output.clone()
    }

    fn create_buffer(&self, pcm: &PcmBuffer) -> BackendResult<web::AudioBuffer> {
        let frames = pcm.frames().max(1) as u32;
        let buffer = self
            .ctx
            .create_buffer(pcm.channels.len() as u32, frames, pcm.sample_rate)
            .map_err(js_err("createBuffer"))?;
        for (ch, samples) in pcm.channels.iter().enumerate() {
            let mut data = samples.clone();
            buffer
                .copy_to_channel(&mut data, ch as i32)
                .map_err(js_err("copyToChannel"))?;
        }
        Ok(buffer)
    }

    fn buffer_frames(&self, buffer: &web::AudioBuffer) -> usize {
        buffer.length() as usize
    }

    fn buffer_duration(&self, buffer: &web::AudioBuffer) -> f64 {
        buffer.duration()
    }

    fn create_node(&self, spec: NodeSpec<web::AudioBuffer>) -> BackendResult<WebNode> {
        let node = match spec {
            NodeSpec::Gain { gain } => {
                let g = web::GainNode::new(&self.ctx).map_err(js_err("GainNode"))?;
                g.gain().set_value(gain);
                WebNode::Gain(g)
            }
            NodeSpec::Filter {
                kind,
                frequency_hz,
                q,
                gain,
            } => {
                let f = web::BiquadFilterNode::new(&self.ctx).map_err(js_err("BiquadFilterNode"))?;
                f.set_type(match kind {
                    FilterKind::LowShelf => web::BiquadFilterType::Lowshelf,
                    FilterKind::Peaking => web::BiquadFilterType::Peaking,
                    FilterKind::HighShelf => web::BiquadFilterType::Highshelf,
                });
                f.frequency().set_value(frequency_hz);
                f.q().set_value(q);
                f.gain().set_value(gain);
                WebNode::Filter(f)
            }
            NodeSpec::Oscillator {
                waveform,
                frequency_hz,
            } => {
                let o = web::OscillatorNode::new(&self.ctx).map_err(js_err("OscillatorNode"))?;
                o.set_type(match waveform {
                    Waveform::Sine => web::OscillatorType::Sine,
                });
                o.frequency().set_value(frequency_hz);
                WebNode::Oscillator(o)
            }
            NodeSpec::BufferSource {
                buffer,
                playback_rate,
                looping,
            } => {
                let s = web::AudioBufferSourceNode::new(&self.ctx)
                    .map_err(js_err("AudioBufferSourceNode"))?;
                s.set_buffer(buffer.as_ref());
                s.set_loop(looping);
                s.playback_rate().set_value(playback_rate);
                WebNode::Source(s)
            }
            NodeSpec::Delay {
                max_delay_sec,
                delay_sec,
            } => {
                let d = self
                    .ctx
                    .create_delay_with_max_delay_time(max_delay_sec as f64)
                    .map_err(js_err("DelayNode"))?;
                d.delay_time().set_value(delay_sec);
                WebNode::Delay(d)
            }
            NodeSpec::Convolver { buffer, normalize } => {
                let c = web::ConvolverNode::new(&self.ctx).map_err(js_err("ConvolverNode"))?;
                c.set_normalize(normalize);
                c.set_buffer(Some(&buffer));
                WebNode::Convolver(c)
            }
        };
        Ok(node)
    }
}
