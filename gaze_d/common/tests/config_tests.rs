use common::{
    CapturePolicy, ConfigError, MapperStrategy, SmoothingConfig, TargetLayout, TrackerConfig,
};

#[test]
fn defaults_are_valid() {
    assert_eq!(TrackerConfig::default().validate(), Ok(()));
}

#[test]
fn partial_json_fills_defaults() {
    let config: TrackerConfig = serde_json::from_str(
        r#"{
            "mapper": { "strategy": "Polynomial", "k": 5 },
            "smoothing": { "kind": "Lerp", "alpha": 0.2 },
            "calibration": { "layout": "FivePoint", "capture": { "kind": "Confirm" } }
        }"#,
    )
    .expect("valid config");

    assert_eq!(config.mapper.strategy, MapperStrategy::Polynomial);
    assert_eq!(config.mapper.k, 5);
    assert_eq!(config.mapper.min_samples, 6);
    assert_eq!(config.smoothing, SmoothingConfig::Lerp { alpha: 0.2 });
    assert_eq!(config.calibration.layout, TargetLayout::FivePoint);
    assert_eq!(config.calibration.capture, CapturePolicy::Confirm);
    assert_eq!(config.calibration.dwell_ms, 2000);
    assert_eq!(config.blink.ear_threshold, 0.22);
    assert_eq!(config.validate(), Ok(()));
}

#[test]
fn default_config_round_trips_through_json() {
    let config = TrackerConfig::default();
    let text = serde_json::to_string_pretty(&config).unwrap();
    let back: TrackerConfig = serde_json::from_str(&text).unwrap();
    assert_eq!(back, config);
}

#[test]
fn validation_catches_bad_values() {
    let mut config = TrackerConfig::default();
    config.mapper.k = 0;
    assert_eq!(config.validate(), Err(ConfigError::Mapper("k", 0.0)));

    let mut config = TrackerConfig::default();
    config.blink.squint_timeout_frames = 1;
    assert_eq!(
        config.validate(),
        Err(ConfigError::Blink("squint_timeout_frames"))
    );

    let mut config = TrackerConfig::default();
    config.calibration.layout = TargetLayout::Custom(Vec::new());
    assert_eq!(config.validate(), Err(ConfigError::EmptyLayout));

    let mut config = TrackerConfig::default();
    config.smoothing = SmoothingConfig::OneEuro {
        min_cutoff: 0.0,
        beta: 0.5,
        d_cutoff: 1.0,
        frequency: 30.0,
    };
    assert_eq!(
        config.validate(),
        Err(ConfigError::EuroParameter("min_cutoff", 0.0))
    );

    let mut config = TrackerConfig::default();
    config.screen.width = 0;
    assert!(matches!(config.validate(), Err(ConfigError::Screen(0, _))));
}
