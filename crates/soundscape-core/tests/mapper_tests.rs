// Host-side tests for the pointer → wind parameter mapping.

use soundscape_core::constants::BAND_COUNT;
use soundscape_core::{db_to_linear, ParameterMapper, PointerState};

#[test]
fn map_is_pure_for_identical_arguments() {
    let mapper = ParameterMapper::default();
    let pointer = PointerState::present(0.42, 0.3);
    let a = mapper.map(pointer, 0.05);
    let b = mapper.map(pointer, 0.05);
    assert_eq!(a, b);

    let absent_a = mapper.map(PointerState::Absent, 0.05);
    let absent_b = mapper.map(PointerState::Absent, 0.05);
    assert_eq!(absent_a, absent_b);
}

#[test]
fn fade_out_steps_down_by_fade_amount_and_stops_at_zero() {
    let mapper = ParameterMapper::default();
    let mut gain = 0.05_f32;
    for _ in 0..60 {
        let out = mapper.map(PointerState::Absent, gain);
        assert!(out.noise_gain >= 0.0, "gain went negative: {}", out.noise_gain);
        if gain >= 0.001 {
            assert!(
                (gain - out.noise_gain - 0.001).abs() < 1e-6,
                "expected a 0.001 step from {gain}, got {}",
                out.noise_gain
            );
        }
        assert!(out.band_gain.is_none(), "absent pointer must leave the EQ alone");
        gain = out.noise_gain;
    }
    assert_eq!(gain, 0.0);
}

#[test]
fn fade_in_is_rate_limited_towards_the_target() {
    let mapper = ParameterMapper::default();
    let pointer = PointerState::present(0.5, 0.0);
    let mut gain = 0.0_f32;
    for k in 1..=300 {
        gain = mapper.map(pointer, gain).noise_gain;
        let expected = (k as f32 * 0.001).min(0.2);
        assert!(
            (gain - expected).abs() < 1e-5,
            "tick {k}: expected {expected}, got {gain}"
        );
    }
    assert!(gain <= 0.2);
}

#[test]
fn gain_above_target_drops_straight_to_target() {
    let mapper = ParameterMapper::default();
    // y = 0.75 => target (1 - 0.75) * 0.2 = 0.05
    let out = mapper.map(PointerState::present(0.5, 0.75), 0.15);
    assert!((out.noise_gain - 0.05).abs() < 1e-6);
}

#[test]
fn bottom_edge_is_silent() {
    let mapper = ParameterMapper::default();
    let out = mapper.map(PointerState::present(0.2, 1.0), 0.0);
    assert_eq!(out.noise_gain, 0.0);
    assert!(out.band_gain.is_some());
}

#[test]
fn band_curve_peaks_between_the_two_nearest_bands() {
    let mapper = ParameterMapper::default();
    let db = mapper.band_curve_db(0.35);
    assert!((db[3] - db[4]).abs() < 1e-4, "bands 3 and 4 differ: {db:?}");
    assert!((db[3] - 19.625).abs() < 1e-3, "peak was {}", db[3]);
    for (i, v) in db.iter().enumerate() {
        if i != 3 && i != 4 {
            assert!(*v < db[3] - 1e-3, "band {i} ({v}) is not below the peak");
        }
    }
    assert!(db[0] < db[3]);
    assert!(db[9] < db[3]);
}

#[test]
fn band_gains_are_linear_and_non_negative() {
    let mapper = ParameterMapper::default();
    let out = mapper.map(PointerState::present(0.9, 0.5), 0.0);
    let gains = out.band_gain.expect("present pointer yields a curve");
    let db = mapper.band_curve_db(0.9);
    assert_eq!(gains.len(), BAND_COUNT);
    for i in 0..BAND_COUNT {
        assert!(gains[i] >= 0.0);
        assert!((gains[i] - db_to_linear(db[i])).abs() < 1e-4);
    }
    // peak sits at the top band for x = 0.9
    let max_i = (0..BAND_COUNT)
        .max_by(|a, b| gains[*a].total_cmp(&gains[*b]))
        .unwrap();
    assert_eq!(max_i, 9);
}

#[test]
fn db_to_linear_matches_known_points() {
    assert!((db_to_linear(0.0) - 1.0).abs() < 1e-6);
    assert!((db_to_linear(20.0) - 10.0).abs() < 1e-4);
    assert!((db_to_linear(-20.0) - 0.1).abs() < 1e-6);
}
