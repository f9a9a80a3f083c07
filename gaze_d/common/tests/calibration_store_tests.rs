use std::fs;
use std::path::{Path, PathBuf};

use common::calibration_store::CalibrationStore;
use common::{CalibrationSample, EyePoint, ScreenPoint};

fn get_test_dir(name: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("gaze_d_test_{}", name));
    let _ = fs::create_dir_all(&path);
    path
}

fn cleanup_test_dir(path: &Path) {
    let _ = fs::remove_dir_all(path);
}

fn samples() -> Vec<CalibrationSample> {
    vec![
        CalibrationSample::new(EyePoint::new(0.4123, 0.4567), ScreenPoint::new(0.1, 0.1)),
        CalibrationSample::new(EyePoint::new(0.5, 0.5), ScreenPoint::new(0.5, 0.5)),
        CalibrationSample::new(EyePoint::new(0.5871, 0.5402), ScreenPoint::new(0.9, 0.9)),
    ]
}

#[test]
fn test_save_then_load_preserves_order_and_values() {
    let dir = get_test_dir("roundtrip");
    cleanup_test_dir(&dir);

    let store = CalibrationStore::new(dir.clone());
    store.save(&samples()).expect("save should succeed");
    let loaded = store.load().expect("load should succeed").expect("data present");
    assert_eq!(loaded, samples());

    cleanup_test_dir(&dir);
}

#[test]
fn test_file_shape_is_nested_points() {
    let dir = get_test_dir("shape");
    cleanup_test_dir(&dir);

    let store = CalibrationStore::at(dir.join("nested").join("profile.json"));
    store.save(&samples()).expect("save should create parent dirs");

    let contents = fs::read_to_string(store.path()).expect("file should exist");
    let json: serde_json::Value = serde_json::from_str(&contents).expect("valid json");
    let first = &json["samples"][0];
    assert!((first["eye"]["x"].as_f64().unwrap() - 0.4123).abs() < 1e-6);
    assert!((first["eye"]["y"].as_f64().unwrap() - 0.4567).abs() < 1e-6);
    assert!((first["screen"]["x"].as_f64().unwrap() - 0.1).abs() < 1e-6);
    assert_eq!(json["samples"].as_array().unwrap().len(), 3);

    cleanup_test_dir(&dir);
}

#[test]
fn test_non_finite_samples_are_not_saved() {
    let dir = get_test_dir("sanitize");
    cleanup_test_dir(&dir);

    let mut data = samples();
    data.insert(
        1,
        CalibrationSample::new(EyePoint::new(f32::INFINITY, 0.5), ScreenPoint::CENTER),
    );
    let store = CalibrationStore::new(dir.clone());
    store.save(&data).expect("save should succeed");

    let loaded = store.load().unwrap().unwrap();
    assert_eq!(loaded, samples());

    cleanup_test_dir(&dir);
}

#[test]
fn test_missing_file_is_not_an_error() {
    let dir = get_test_dir("missing");
    cleanup_test_dir(&dir);

    let store = CalibrationStore::new(dir.clone());
    assert!(store.load().expect("missing file is fine").is_none());
}

#[test]
fn test_corrupt_file_is_an_error() {
    let dir = get_test_dir("corrupt");
    cleanup_test_dir(&dir);
    let _ = fs::create_dir_all(&dir);

    let store = CalibrationStore::new(dir.clone());
    fs::write(store.path(), "{ not json").unwrap();
    assert!(store.load().is_err());

    cleanup_test_dir(&dir);
}

#[test]
fn test_bare_sample_list_loads() {
    let dir = get_test_dir("bare");
    cleanup_test_dir(&dir);
    let _ = fs::create_dir_all(&dir);

    let store = CalibrationStore::new(dir.clone());
    fs::write(
        store.path(),
        serde_json::to_string_pretty(&samples()).unwrap(),
    )
    .unwrap();
    let loaded = store.load().expect("bare list is accepted").expect("data present");
    assert_eq!(loaded, samples());

    cleanup_test_dir(&dir);
}
