use common::{CursorSmoother, LerpFilter, ScreenPoint, SmoothingConfig};

#[test]
fn lerp_error_shrinks_geometrically() {
    let alpha = 0.15;
    let mut f = LerpFilter::new(alpha, 0.0);
    let target = 1.0f32;

    let mut expected_error = 1.0f32;
    for _ in 0..40 {
        let out = f.filter(target);
        expected_error *= 1.0 - alpha;
        assert!(((target - out) - expected_error).abs() < 1e-5);
    }
}

#[test]
fn lerp_is_deterministic() {
    let targets = [0.2, 0.9, 0.4, 0.4, 0.7];
    let run = || {
        let mut f = LerpFilter::new(0.2, 0.5);
        targets.iter().map(|&t| f.filter(t)).collect::<Vec<_>>()
    };
    assert_eq!(run(), run());
}

#[test]
fn cursor_starts_at_center_and_follows() {
    let mut cursor = CursorSmoother::new(&SmoothingConfig::Lerp { alpha: 0.5 });
    assert_eq!(cursor.current(), ScreenPoint::CENTER);

    let p = cursor.smooth(ScreenPoint::new(1.0, 0.0), 0.0);
    assert!((p.x - 0.75).abs() < 1e-6);
    assert!((p.y - 0.25).abs() < 1e-6);
}

#[test]
fn snap_breaks_smoothing_lag() {
    for config in [SmoothingConfig::Lerp { alpha: 0.1 }, SmoothingConfig::default()] {
        let mut cursor = CursorSmoother::new(&config);
        for i in 0..10 {
            cursor.smooth(ScreenPoint::new(0.1, 0.1), i as f64 / 30.0);
        }

        let click = ScreenPoint::new(0.8, 0.3);
        cursor.snap(click, 10.0 / 30.0);
        assert_eq!(cursor.current(), click);

        // Holding the same target afterwards keeps the cursor there.
        let p = cursor.smooth(click, 11.0 / 30.0);
        assert!((p.x - click.x).abs() < 1e-5 && (p.y - click.y).abs() < 1e-5);
    }
}

#[test]
fn one_euro_cursor_converges() {
    let mut cursor = CursorSmoother::new(&SmoothingConfig::default());
    let goal = ScreenPoint::new(0.2, 0.8);
    let mut p = cursor.current();
    for i in 0..200 {
        p = cursor.smooth(goal, i as f64 / 60.0);
    }
    assert!((p.x - goal.x).abs() < 1e-3);
    assert!((p.y - goal.y).abs() < 1e-3);
}
