use std::fs;
use std::path::{Path, PathBuf};

use dissect_core::{Report, Selection, analyze_file};

fn case_dir(dir: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join(dir)
}

fn load_expected_report(dir: &str) -> Report {
    let expected_path = case_dir(dir).join("expected_report.json");
    let expected_json = fs::read_to_string(&expected_path).expect("read expected_report.json");
    serde_json::from_str(&expected_json).expect("parse expected report")
}

fn run_golden(dir: &str) {
    let input = case_dir(dir).join("input.bin");
    let expected = load_expected_report(dir);

    let mut actual = analyze_file(&input, &Selection::All).expect("analyze input");
    actual.input.path = expected.input.path.clone();
    actual.tool.version = expected.tool.version.clone();

    let actual_value = serde_json::to_value(actual).expect("serialize actual");
    let expected_value = serde_json::to_value(expected).expect("serialize expected");

    assert_eq!(actual_value, expected_value, "golden mismatch in {dir}");
}

#[test]
fn golden_two_packets() {
    run_golden("tests/golden/two_packets");
}

#[test]
fn golden_bad_id() {
    run_golden("tests/golden/bad_id");
}

#[test]
fn golden_mixed() {
    run_golden("tests/golden/mixed");
}

#[test]
fn golden_two_packets_is_clean() {
    let report = load_expected_report("tests/golden/two_packets");
    assert_eq!(report.packets_total, 2);
    assert!(!report.has_mismatches());
}

#[test]
fn golden_bad_id_keeps_checksums_valid() {
    let report = load_expected_report("tests/golden/bad_id");
    let second = &report.packets[1];
    assert_eq!(second.id.value, 5);
    assert_eq!(second.id.expected, 1);
    assert!(second.checksum.valid);
    assert_eq!(report.summary.id_mismatches, 1);
}

#[test]
fn golden_mixed_has_advisory_mismatches() {
    let report = load_expected_report("tests/golden/mixed");
    assert_eq!(report.packets_total, 4);
    assert!(report.packets[0].flags.more_data);
    assert!(!report.packets[1].checksum.valid);
    assert_eq!(report.packets[2].payload_length, 0);
    assert!(!report.packets[3].version.valid);
    assert_eq!(report.packets[3].flags.reserved, 0x01);
    assert_eq!(report.summary.version_mismatches, 1);
    assert_eq!(report.summary.checksum_mismatches, 1);
    assert_eq!(report.summary.id_mismatches, 0);
}
