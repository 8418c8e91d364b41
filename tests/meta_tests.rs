//! Meta-tests that verify test suite integrity
//!
//! These tests ensure that:
//! - E2E test files exist
//! - The synthetic gesture generator produces the traces the E2E tests rely on
//! - A quiet sensor never produces taps
//! - The public API and build info stay reachable

use std::time::Instant;
use tapper::config::AppConfig;
use tapper::{GestureSynth, PatternMatched, TapDetector};

/// Verify E2E test files exist and are not empty
#[test]
fn e2e_tests_exist() {
    let test_files = [
        "e2e_pattern.rs",
        "e2e_trace.rs",
        "e2e_config.rs",
        "e2e_listener.rs",
    ];

    for file in test_files {
        let path = format!("tests/{}", file);
        let full_path = std::path::Path::new(&path);

        assert!(
            full_path.exists(),
            "Missing E2E test file: {}. All E2E tests must be present.",
            file
        );

        let metadata = std::fs::metadata(full_path).expect("Failed to get file metadata");
        assert!(
            metadata.len() > 100,
            "E2E test file {} appears to be empty or too small ({} bytes)",
            file,
            metadata.len()
        );
    }
}

// ============================================================================
// GESTURE GENERATOR INTEGRITY TESTS
// ============================================================================

/// Verify each synthetic tap is a short z-axis spike on top of gravity
#[test]
fn synth_tap_structure() {
    let readings = GestureSynth::new(100)
        .with_taps(&[1000])
        .with_noise(0.0)
        .readings();

    let spiked: Vec<usize> = readings
        .iter()
        .enumerate()
        .filter(|(_, (_, accel))| (accel[2] - 9.81).abs() > 1.0)
        .map(|(i, _)| i)
        .collect();
    assert_eq!(spiked, vec![100, 101, 102, 103], "Tap should be 4 samples at 1000ms");
}

/// Verify taps too weak to cross the threshold are ignored
#[test]
fn weak_taps_not_detected() {
    let detector =
        TapDetector::new(AppConfig::default().detector_config(), |_: &PatternMatched| {}).unwrap();
    let samples = GestureSynth::new(100)
        .with_taps(&[1000, 2500, 5000])
        .with_spike(0.1)
        .samples(Instant::now());

    for sample in samples {
        detector.on_sample(sample).unwrap();
    }

    let stats = detector.stats();
    assert_eq!(stats.excursions, 0, "A 0.1 m/s² tap should stay below threshold");
    assert_eq!(stats.matches, 0);
}

/// Verify a resting sensor with noise never registers an excursion
#[test]
fn no_false_taps_with_noise() {
    let detector =
        TapDetector::new(AppConfig::default().detector_config(), |_: &PatternMatched| {}).unwrap();
    let samples = GestureSynth::new(200)
        .with_duration_ms(30_000)
        .samples(Instant::now());

    for sample in samples {
        detector.on_sample(sample).unwrap();
    }

    let stats = detector.stats();
    assert_eq!(stats.excursions, 0, "Noise alone crossed the threshold");
    assert_eq!(stats.matches, 0);
}

/// Verify every synthetic tap is seen as exactly one tap
#[test]
fn tap_detection_reliability() {
    let taps: Vec<u64> = (1..=20).map(|i| i * 700).collect();
    let detector =
        TapDetector::new(AppConfig::default().detector_config(), |_: &PatternMatched| {}).unwrap();

    for sample in GestureSynth::new(100).with_taps(&taps).samples(Instant::now()) {
        detector.on_sample(sample).unwrap();
    }

    let stats = detector.stats();
    assert_eq!(stats.taps, taps.len() as u64);
    assert_eq!(stats.long_excursions, 0);
    // 700ms gaps are outside both windows
    assert_eq!(stats.matches, 0);
    assert_eq!(stats.evaluations, taps.len() as u64 - 2);
}

/// Verify all exported types are accessible
#[test]
fn public_api_accessible() {
    let _: fn() -> tapper::GestureSynth = || tapper::GestureSynth::new(100);
    let _: fn() -> tapper::config::AppConfig = tapper::config::AppConfig::default;
    let _: fn() -> tapper::detector::pattern::PatternMatcher = || {
        let config = AppConfig::default().detector_config();
        tapper::detector::pattern::PatternMatcher::new(config.pause1(), config.pause2())
    };
    assert_eq!(tapper::SMOOTHING_WINDOW, 5);
    assert_eq!(tapper::PATTERN_TAPS, 3);
}

/// Verify build info is stamped
#[test]
fn build_info_present() {
    assert!(!tapper::VERSION.is_empty());
    assert_eq!(tapper::BUILD_DATE.len(), 10, "BUILD_DATE should be YYYY-MM-DD");
}
