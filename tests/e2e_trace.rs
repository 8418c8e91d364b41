//! E2E tests for trace replay
//!
//! Generates synthetic traces, writes them in the line format the CLI reads,
//! and replays them through the detector.

use approx::assert_relative_eq;
use std::io::Cursor;
use std::time::Instant;
use tapper::config::AppConfig;
use tapper::trace::{self, TraceReader, TraceRecord};
use tapper::{GestureSynth, PatternMatched, TapDetector};

fn synth_trace(taps: &[u64]) -> Vec<u8> {
    let records = GestureSynth::new(100)
        .with_taps(taps)
        .readings()
        .into_iter()
        .map(|(offset, accel)| TraceRecord::from_reading(offset, accel));
    let mut out = Vec::new();
    trace::write_records(&mut out, records).unwrap();
    out
}

/// Replay a trace, returning matches and the number of unreadable lines
fn replay(input: &[u8]) -> (Vec<PatternMatched>, usize, TapDetector) {
    let detector =
        TapDetector::new(AppConfig::default().detector_config(), |_: &PatternMatched| {}).unwrap();
    let base = Instant::now();
    let mut matches = Vec::new();
    let mut bad_lines = 0;

    for item in TraceReader::new(Cursor::new(input)) {
        match item {
            Ok(record) => {
                if let Ok(Some(m)) = detector.on_sample(record.to_sample(base)) {
                    matches.push(m);
                }
            }
            Err(_) => bad_lines += 1,
        }
    }
    (matches, bad_lines, detector)
}

#[test]
fn test_synth_trace_replays_to_one_match() {
    let (matches, bad_lines, detector) = replay(&synth_trace(&[1000, 2500, 5000]));

    assert_eq!(bad_lines, 0);
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].gap1_ms(), 1500);
    assert_eq!(matches[0].gap2_ms(), 2500);
    assert_eq!(detector.stats().samples_accepted, 601);
}

/// Written traces read back with the generator's readings intact
#[test]
fn test_trace_preserves_readings() {
    let synth = GestureSynth::new(100).with_taps(&[1000, 2500, 5000]);
    let readings = synth.readings();
    let trace = synth_trace(&[1000, 2500, 5000]);

    let records: Vec<TraceRecord> = TraceReader::new(Cursor::new(trace))
        .map(Result::unwrap)
        .collect();
    assert_eq!(records.len(), readings.len());

    for (record, (offset, [x, y, z])) in records.iter().zip(&readings) {
        assert_eq!(record.offset(), *offset);
        assert_relative_eq!(record.x, *x);
        assert_relative_eq!(record.y, *y);
        assert_relative_eq!(record.z, *z);
    }
}

#[test]
fn test_trace_lines_are_json() {
    let trace = synth_trace(&[1000]);
    let text = String::from_utf8(trace).unwrap();
    let first = text.lines().next().unwrap();

    let value: serde_json::Value = serde_json::from_str(first).unwrap();
    assert_eq!(value["t_ms"], 0.0);
    assert!(value["z"].as_f64().unwrap() > 9.0);
}

/// CSV traces with comments and junk lines still replay
#[test]
fn test_csv_trace_with_bad_lines() {
    let mut csv = String::from("# t_ms,x,y,z\n");
    for (offset, [x, y, z]) in GestureSynth::new(100).with_taps(&[1000, 2500, 5000]).readings() {
        csv.push_str(&format!("{},{},{},{}\n", offset.as_millis(), x, y, z));
        if offset.as_millis() == 3000 {
            csv.push_str("garbage\n");
            csv.push_str("3000,1,2\n");
        }
    }

    let (matches, bad_lines, _) = replay(csv.as_bytes());
    assert_eq!(bad_lines, 2);
    assert_eq!(matches.len(), 1);
}

#[test]
fn test_non_finite_rows_reach_detector_and_are_rejected() {
    let input = "0,0,0,9.81\n10,NaN,0,9.81\n20,0,inf,9.81\n30,0,0,9.81\n";
    let (matches, bad_lines, detector) = replay(input.as_bytes());

    assert!(matches.is_empty());
    assert_eq!(bad_lines, 0);
    let stats = detector.stats();
    assert_eq!(stats.samples_accepted, 2);
    assert_eq!(stats.rejected_non_finite, 2);
}

#[test]
fn test_backwards_timestamps_rejected() {
    let input = "0,0,0,9.81\n20,0,0,9.81\n10,0,0,9.81\n20,0,0,9.81\n";
    let (_, _, detector) = replay(input.as_bytes());

    let stats = detector.stats();
    assert_eq!(stats.samples_accepted, 3, "Equal timestamps are accepted");
    assert_eq!(stats.rejected_out_of_order, 1);
}
