// Host-side tests for session lifecycle: wind graph, control ticks,
// scheduler cadence and reverb readiness.

use soundscape_core::constants::{BAND_COUNT, BAND_FREQUENCIES_HZ, PEAKING_Q};
use soundscape_core::{
    db_to_linear, AssetError, AssetKind, AudioBackend, ControlScheduler, FilterKind, GraphOp,
    NodeKind, NodeSpec, Param, ParameterMapper, PcmBuffer, PointerState, SchedulerState, Session,
    SessionConfig, TestBackend, TickOutcome,
};
use std::time::Duration;

fn make_session() -> Session<TestBackend> {
    Session::new(TestBackend::new(100.0), SessionConfig::seeded(3)).expect("session")
}

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

#[test]
fn ticks_before_start_are_skipped() {
    let mut session = make_session();
    session.pointer().store(PointerState::present(0.5, 0.0));
    session.backend().clear();
    assert_eq!(session.control_tick(), TickOutcome::Skipped);
    assert_eq!(session.advance(ms(200)), 0);
    assert_eq!(session.scheduler().state(), SchedulerState::Idle);
    assert!(session.backend().operations().is_empty());
    assert_eq!(session.state().noise_gain, 0.0);
}

#[test]
fn start_builds_silent_wind_chain_once() {
    let mut session = make_session();
    session.start().unwrap();
    session.start().unwrap();
    assert!(session.is_started());
    assert!(session.backend().is_running());
    assert_eq!(session.scheduler().state(), SchedulerState::Active);

    let created = session.backend().nodes_created();
    let noise: Vec<_> = created
        .iter()
        .filter(|(_, s)| matches!(s, NodeSpec::BufferSource { looping: true, .. }))
        .collect();
    assert_eq!(noise.len(), 1, "noise source built more than once");
    match &noise[0].1 {
        NodeSpec::BufferSource {
            buffer: Some(buf), ..
        } => assert_eq!(buf.frames, 100 * 100),
        other => panic!("unexpected noise source {other:?}"),
    }

    let wind = session.wind().unwrap();
    let gain_id = wind.gain_node().id;
    assert!(created
        .iter()
        .any(|(id, s)| *id == gain_id && *s == NodeSpec::Gain { gain: 0.0 }));
    assert_eq!(
        session
            .backend()
            .count(|op| matches!(op, GraphOp::Start { .. })),
        1
    );
}

#[test]
fn wind_bands_are_shelf_peaking_shelf_in_series() {
    let mut session = make_session();
    session.start().unwrap();
    let created = session.backend().nodes_created();
    let wind = session.wind().unwrap();
    let bands = wind.band_nodes();
    assert_eq!(bands.len(), BAND_COUNT);

    for (i, band) in bands.iter().enumerate() {
        let spec = created
            .iter()
            .find(|(id, _)| *id == band.id)
            .map(|(_, s)| s.clone())
            .unwrap();
        let NodeSpec::Filter {
            kind,
            frequency_hz,
            q,
            gain,
        } = spec
        else {
            panic!("band {i} is not a filter");
        };
        assert_eq!(frequency_hz, BAND_FREQUENCIES_HZ[i]);
        assert_eq!(gain, 0.0);
        match i {
            0 => assert_eq!(kind, FilterKind::LowShelf),
            9 => assert_eq!(kind, FilterKind::HighShelf),
            _ => {
                assert_eq!(kind, FilterKind::Peaking);
                assert_eq!(q, PEAKING_Q);
            }
        }
    }

    let backend = session.backend();
    assert_eq!(backend.connections_from(wind.gain_node().id), vec![bands[0].id]);
    for pair in bands.windows(2) {
        assert_eq!(backend.connections_from(pair[0].id), vec![pair[1].id]);
    }
    let last = backend.connections_from(bands[BAND_COUNT - 1].id);
    assert!(last.contains(&session.bus().input().id));
    assert!(last.contains(&session.bus().dry().id));
}

#[test]
fn tick_with_pointer_writes_level_and_curve() {
    let mut session = make_session();
    session.start().unwrap();
    session.pointer().store(PointerState::present(0.35, 0.0));
    assert_eq!(session.control_tick(), TickOutcome::Applied);

    let wind = session.wind().unwrap();
    let backend = session.backend();
    let level = backend
        .last_param(wind.gain_node().id, Param::Gain)
        .unwrap();
    assert!((level - 0.001).abs() < 1e-7);
    assert!((session.state().noise_gain - 0.001).abs() < 1e-7);
    assert_eq!(wind.level(), session.state().noise_gain);

    let db = ParameterMapper::default().band_curve_db(0.35);
    for (i, band) in wind.band_nodes().iter().enumerate() {
        let v = backend.last_param(band.id, Param::Gain).unwrap();
        assert!((v - db_to_linear(db[i])).abs() < 1e-4, "band {i}: {v}");
    }
    assert_eq!(wind.band_gain().map(|g| g.len()), Some(BAND_COUNT));
}

#[test]
fn partial_wind_update_keeps_level_in_step_with_gain_node() {
    let mut session = make_session();
    session.start().unwrap();
    let band = session.wind().unwrap().band_nodes()[3].id;
    session.backend().refuse_params(band);
    session.pointer().store(PointerState::present(0.5, 0.0));

    assert_eq!(session.control_tick(), TickOutcome::Applied);
    let gain_id = session.wind().unwrap().gain_node().id;
    let written = session.backend().last_param(gain_id, Param::Gain).unwrap();
    assert!((written - 0.001).abs() < 1e-7);
    assert_eq!(session.state().noise_gain, written);
    assert_eq!(session.wind().unwrap().level(), written);

    // the next fade step continues from what the node holds
    session.control_tick();
    assert!((session.state().noise_gain - 0.002).abs() < 1e-7);
}

#[test]
fn pointer_leaving_fades_out_and_freezes_eq() {
    let mut session = make_session();
    session.start().unwrap();
    session.pointer().store(PointerState::present(0.6, 0.2));
    for _ in 0..20 {
        session.control_tick();
    }
    let peak = session.state().noise_gain;
    assert!((peak - 0.02).abs() < 1e-5);
    let curve = session.wind().unwrap().band_gain();

    session.pointer().clear();
    let band_writes = |s: &Session<TestBackend>| {
        let ids: Vec<u32> = s.wind().unwrap().band_nodes().iter().map(|b| b.id).collect();
        s.backend().count(|op| {
            matches!(op, GraphOp::SetParam { node, param: Param::Gain, .. } if ids.contains(node))
        })
    };
    let before = band_writes(&session);
    for _ in 0..5 {
        session.control_tick();
    }
    assert!((session.state().noise_gain - (peak - 0.005)).abs() < 1e-5);
    assert_eq!(band_writes(&session), before);
    assert_eq!(session.wind().unwrap().band_gain(), curve);

    for _ in 0..100 {
        session.control_tick();
    }
    assert_eq!(session.state().noise_gain, 0.0);
}

#[test]
fn advance_runs_due_ticks_and_keeps_remainder() {
    let mut session = make_session();
    session.start().unwrap();
    assert_eq!(session.advance(ms(100)), 2);
    assert_eq!(session.advance(ms(19)), 0);
    assert_eq!(session.advance(ms(1)), 1);
    assert_eq!(session.scheduler().ticks(), 3);
}

#[test]
fn scheduler_caps_catch_up_after_a_stall() {
    let mut sched = ControlScheduler::new(ms(40), 4);
    assert_eq!(sched.advance(ms(400)), 0, "idle scheduler accumulates nothing");
    sched.activate();
    assert_eq!(sched.advance(ms(1000)), 4);
    // late whole periods were dropped, not queued
    assert_eq!(sched.advance(ms(0)), 0);
    assert_eq!(sched.advance(ms(40)), 1);
}

#[test]
fn reverb_accepts_routes_before_ready_and_wires_feedback_loop() {
    let mut session = make_session();
    assert!(!session.bus().is_ready());
    session.trigger_note();
    let input = session.bus().input().id;
    assert!(session.backend().count(|op| matches!(
        op,
        GraphOp::Connect { dst, .. } if *dst == input
    )) > 0);

    let ir = session
        .backend()
        .create_buffer(&PcmBuffer {
            sample_rate: 44_100.0,
            channels: vec![vec![0.5; 32], vec![0.4; 32]],
        })
        .unwrap();
    session.backend().clear();
    session.attach_impulse_response(ir).unwrap();
    assert!(session.bus().is_ready());

    let created = session.backend().nodes_created();
    let kinds: Vec<NodeKind> = created.iter().map(|(_, s)| s.kind()).collect();
    assert_eq!(
        kinds,
        vec![NodeKind::Convolver, NodeKind::Delay, NodeKind::Gain]
    );
    assert_eq!(
        created[1].1,
        NodeSpec::Delay {
            max_delay_sec: 1.0,
            delay_sec: 0.5
        }
    );
    assert_eq!(created[2].1, NodeSpec::Gain { gain: 0.2 });

    let [conv, delay, feedback] = session.bus().tail_nodes().unwrap();
    let backend = session.backend();
    assert_eq!(backend.connections_from(input), vec![conv.id]);
    let conv_dsts = backend.connections_from(conv.id);
    assert!(conv_dsts.contains(&session.bus().dry().id));
    assert!(conv_dsts.contains(&delay.id));
    assert_eq!(backend.connections_from(delay.id), vec![feedback.id]);
    assert_eq!(backend.connections_from(feedback.id), vec![conv.id]);
}

#[test]
fn second_impulse_response_is_ignored() {
    let mut session = make_session();
    let pcm = PcmBuffer::mono(48_000.0, vec![1.0; 16]);
    let a = session.backend().create_buffer(&pcm).unwrap();
    let b = session.backend().create_buffer(&pcm).unwrap();
    session.attach_impulse_response(a).unwrap();
    session.attach_impulse_response(b).unwrap();
    assert_eq!(
        session
            .backend()
            .count(|op| matches!(op, GraphOp::Create { spec, .. } if spec.kind() == NodeKind::Convolver)),
        1
    );
}

#[test]
fn empty_impulse_response_leaves_bus_silent() {
    let mut session = make_session();
    let empty = session
        .backend()
        .create_buffer(&PcmBuffer::mono(48_000.0, Vec::new()))
        .unwrap();
    let err = session.attach_impulse_response(empty).unwrap_err();
    assert_eq!(err, AssetError::Empty(AssetKind::ImpulseResponse));
    assert!(!session.bus().is_ready());

    // the rest of the session keeps working
    session.start().unwrap();
    session.pointer().store(PointerState::present(0.5, 0.5));
    assert_eq!(session.control_tick(), TickOutcome::Applied);
}
