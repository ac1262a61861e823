mod common;

use std::fs;

use physics::{EngineOptions, EngineTelemetryOptions, ModelOptions, PhysicsError, TIME_COLUMN};

use common::cart_pole;

#[test]
fn header_lists_every_enabled_column() {
    let engine = cart_pole(EngineOptions::default());
    let header = engine.telemetry().header();
    let expected = [
        TIME_COLUMN,
        "q.slide",
        "q.hinge",
        "v.slide",
        "v.hinge",
        "a.slide",
        "a.hinge",
        "u.slide",
        "energy",
        "Slider.position",
        "Slider.velocity",
        "Pole.position",
        "Pole.velocity",
    ];
    assert_eq!(header, expected);
}

#[test]
fn one_row_per_breakpoint() {
    let mut engine = cart_pole(EngineOptions::default());
    for _ in 0..5 {
        engine.step(0.02).unwrap();
    }
    assert_eq!(engine.telemetry().len(), 6);

    let mut options = EngineOptions::default();
    options.stepper.controller_update_period = 0.01;
    let mut engine = cart_pole(options);
    engine.step(0.05).unwrap();
    let times = engine.telemetry().column(TIME_COLUMN).unwrap();
    assert_eq!(times.len(), 6);
    assert!((times[5] - 0.05).abs() < 1e-12);
}

#[test]
fn disabled_telemetry_records_nothing() {
    let mut options = EngineOptions::default();
    options.telemetry = EngineTelemetryOptions::disabled();
    let mut engine = cart_pole(options);
    let mut model_options = ModelOptions::default();
    model_options.telemetry.enable_encoder_sensors = false;
    engine.set_model_options(model_options);
    engine.reset(&[0.0; 4]).unwrap();
    engine.step(0.02).unwrap();
    assert!(engine.telemetry().is_empty());
    assert!(engine.telemetry().header().is_empty());
}

#[test]
fn reset_starts_a_new_log() {
    let mut engine = cart_pole(EngineOptions::default());
    engine.step(0.02).unwrap();
    engine.step(0.02).unwrap();
    engine.reset(&[0.1, 0.0, 0.0, 0.0]).unwrap();
    assert_eq!(engine.telemetry().len(), 1);
    assert_eq!(engine.telemetry().column("q.slide").unwrap(), vec![0.1]);
}

#[test]
fn write_log_produces_csv() {
    let mut engine = cart_pole(EngineOptions::default());
    engine.step(0.02).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("log.csv");
    engine.write_log(&path).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("Global.Time,q.slide,q.hinge"));
    assert_eq!(lines[1].split(',').count(), 13);
}

#[test]
fn write_log_reports_unwritable_path() {
    let engine = cart_pole(EngineOptions::default());
    let dir = tempfile::tempdir().unwrap();
    let result = engine.write_log(dir.path().join("missing").join("log.csv"));
    assert!(matches!(result, Err(PhysicsError::Telemetry { .. })));
}
