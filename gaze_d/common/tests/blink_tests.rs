use common::{BlinkConfig, BlinkDetector, BlinkPair, BlinkState, Eye};

const OPEN: f32 = 0.35;
const SHUT: f32 = 0.05;

fn config() -> BlinkConfig {
    BlinkConfig {
        ear_threshold: 0.22,
        min_closing_frames: 2,
        squint_timeout_frames: 10,
        cooldown_frames: 3,
    }
}

fn run(detector: &mut BlinkDetector, ears: &[f32]) -> usize {
    ears.iter()
        .enumerate()
        .filter_map(|(i, &ear)| detector.update(ear, i as f64 / 30.0))
        .count()
}

#[test]
fn debounced_blink_fires_once() {
    let cfg = config();
    let mut d = BlinkDetector::new(Eye::Left, cfg.clone());

    let mut ears = vec![OPEN; 3];
    ears.extend(std::iter::repeat(SHUT).take(cfg.min_closing_frames as usize + 1));
    ears.extend(std::iter::repeat(OPEN).take(10));

    assert_eq!(run(&mut d, &ears), 1);
    assert_eq!(d.state(), BlinkState::Open);
}

#[test]
fn click_reports_its_eye() {
    let mut d = BlinkDetector::new(Eye::Right, config());
    let mut click = None;
    for (i, &ear) in [SHUT, SHUT, SHUT, OPEN].iter().enumerate() {
        if let Some(c) = d.update(ear, i as f64) {
            click = Some(c);
        }
    }
    let click = click.expect("blink should fire");
    assert_eq!(click.eye, Eye::Right);
    assert_eq!(click.timestamp_s, 3.0);
}

#[test]
fn single_frame_dip_is_noise() {
    let mut d = BlinkDetector::new(Eye::Left, config());
    assert_eq!(run(&mut d, &[OPEN, SHUT, OPEN, OPEN, OPEN]), 0);
    assert_eq!(d.state(), BlinkState::Open);

    let mut eager = BlinkDetector::new(
        Eye::Left,
        BlinkConfig {
            min_closing_frames: 1,
            ..config()
        },
    );
    assert_eq!(run(&mut eager, &[OPEN, SHUT, OPEN, OPEN]), 0);
}

#[test]
fn squint_never_clicks() {
    let cfg = config();
    let mut d = BlinkDetector::new(Eye::Left, cfg.clone());

    let mut ears = vec![SHUT; cfg.squint_timeout_frames as usize + 20];
    let clicks_while_shut = run(&mut d, &ears);
    assert_eq!(clicks_while_shut, 0);
    assert_eq!(d.state(), BlinkState::Open);

    ears = vec![OPEN; 5];
    assert_eq!(run(&mut d, &ears), 0, "reopening after a squint is not a blink");
}

#[test]
fn squint_then_real_blink_still_works() {
    let cfg = config();
    let mut d = BlinkDetector::new(Eye::Left, cfg.clone());
    let mut ears = vec![SHUT; cfg.squint_timeout_frames as usize + 2];
    ears.extend([OPEN, OPEN, SHUT, SHUT, SHUT, OPEN]);
    assert_eq!(run(&mut d, &ears), 1);
}

#[test]
fn cooldown_swallows_immediate_reclosure() {
    let mut d = BlinkDetector::new(Eye::Left, config());
    let ears = [SHUT, SHUT, SHUT, OPEN, SHUT, SHUT, OPEN, OPEN];
    // The second closure lands inside the three cooldown frames.
    assert_eq!(run(&mut d, &ears), 1);
}

#[test]
fn zero_cooldown_returns_straight_to_open() {
    let mut d = BlinkDetector::new(
        Eye::Left,
        BlinkConfig {
            cooldown_frames: 0,
            ..config()
        },
    );
    assert_eq!(run(&mut d, &[SHUT, SHUT, OPEN]), 1);
    assert_eq!(d.state(), BlinkState::Open);
}

#[test]
fn nan_counts_as_closed() {
    let mut d = BlinkDetector::new(Eye::Left, config());
    d.update(f32::NAN, 0.0);
    assert_eq!(d.state(), BlinkState::Closing);
}

#[test]
fn eyes_are_independent() {
    let mut pair = BlinkPair::new(&config());
    let frames = [(SHUT, OPEN), (SHUT, OPEN), (SHUT, OPEN), (OPEN, OPEN)];
    let mut clicks = Vec::new();
    for (i, (l, r)) in frames.iter().enumerate() {
        clicks.extend(pair.update(*l, *r, i as f64));
    }
    assert_eq!(clicks.len(), 1);
    assert_eq!(clicks[0].eye, Eye::Left);
    assert_eq!(pair.right.state(), BlinkState::Open);
}
