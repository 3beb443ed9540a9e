//! Dissect core library for inspecting concatenated binary packet streams.
//!
//! Each packet starts with a fixed 8-byte big-endian header (version,
//! length, checksum, flags, id) followed by a payload of `length - 8`
//! bytes. This crate frames a buffer into packets, verifies each packet's
//! checksum, version and sequence id, and builds a deterministic report.
//! It can also copy selected headers and payloads verbatim to a sink.
//!
//! Pipeline: `source` -> `packet::segment` -> `select` -> `analysis`
//! (report) or `extract` (raw bytes). Decoding is byte-oriented and side
//! effect free; all I/O lives in `source` and in the caller's sink.
//!
//! Invariants:
//! - Framing never reads past the buffer end and never loops on a short
//!   length field; structural errors abort before any output.
//! - A packet's checksum covers only its own bytes.
//! - Ids are validated against the position within the selection.
//! - Checksum, version and id mismatches are reported, never fatal.
//!
//! # Examples
//! ```no_run
//! use std::path::Path;
//!
//! use dissect_core::{Selection, analyze_file};
//!
//! let report = analyze_file(Path::new("capture.bin"), &Selection::All)?;
//! println!("{} packets", report.packets_total);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use serde::{Deserialize, Serialize};

mod analysis;
pub mod checksum;
pub mod extract;
pub mod packet;
pub mod schema;
pub mod select;
mod source;

pub use analysis::{AnalysisError, analyze_bytes, analyze_file, analyze_source};
pub use extract::{ExtractError, ExtractParts, extract_bytes, extract_to};
pub use select::{SelectError, Selection};
pub use source::{ByteSource, FileSource, ReaderSource, SourceError};

/// Current report schema version.
pub const REPORT_VERSION: u32 = 1;

/// Report over the selected packets of one input.
///
/// # Examples
/// ```
/// use dissect_core::make_stub_report;
///
/// let report = make_stub_report("capture.bin", 24);
/// assert_eq!(report.report_version, dissect_core::REPORT_VERSION);
/// assert!(!report.has_mismatches());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Report schema version (not the binary version).
    pub report_version: u32,
    pub tool: ToolInfo,
    pub input: InputInfo,
    /// Number of packets framed from the whole input.
    pub packets_total: u64,
    /// Requested stream indices; absent when every packet is selected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<Vec<usize>>,
    /// Selected packets, in selection order.
    pub packets: Vec<PacketReport>,
    pub summary: ReportSummary,
}

impl Report {
    /// Whether any version, checksum or id check failed.
    pub fn has_mismatches(&self) -> bool {
        self.summary.version_mismatches > 0
            || self.summary.checksum_mismatches > 0
            || self.summary.id_mismatches > 0
    }
}

/// Tool metadata embedded in reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub version: String,
}

/// Input metadata embedded in reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputInfo {
    /// Input path as provided, or `-` for standard input.
    pub path: String,
    /// Input size in bytes.
    pub bytes: u64,
}

/// Decoded fields and validity of one packet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PacketReport {
    /// Position in the stream.
    pub index: usize,
    /// Byte offset of the header in the input.
    pub offset: usize,
    /// Total packet size in bytes.
    pub length: usize,
    pub header_length: usize,
    pub version: Checked<u16>,
    /// Length field as transmitted.
    pub declared_length: u16,
    pub checksum: Checked<u16>,
    pub flags: FlagsReport,
    /// Sequence id, checked against the position within the selection.
    pub id: Checked<u8>,
    pub payload_length: usize,
}

/// A transmitted value and the value it was checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checked<T> {
    pub value: T,
    pub expected: T,
    pub valid: bool,
}

impl<T: PartialEq + Copy> Checked<T> {
    pub fn new(value: T, expected: T) -> Self {
        Self {
            value,
            expected,
            valid: value == expected,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagsReport {
    /// Raw flags byte.
    pub bits: u8,
    pub more_data: bool,
    /// Undefined bits that are set.
    pub reserved: u8,
}

/// Mismatch counts over the selected packets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub version_mismatches: u64,
    pub checksum_mismatches: u64,
    pub id_mismatches: u64,
}

/// Build a report with base fields filled and no packets.
pub fn make_stub_report(input_path: &str, input_bytes: u64) -> Report {
    Report {
        report_version: REPORT_VERSION,
        tool: ToolInfo {
            name: "dissect".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        input: InputInfo {
            path: input_path.to_string(),
            bytes: input_bytes,
        },
        packets_total: 0,
        selection: None,
        packets: vec![],
        summary: ReportSummary::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_omits_selection_when_all() {
        let report = make_stub_report("capture.bin", 0);
        let value = serde_json::to_value(&report).expect("report json");
        assert!(value.get("selection").is_none());
        assert_eq!(value["tool"]["name"], "dissect");
        assert_eq!(value["summary"]["id_mismatches"], 0);
    }

    #[test]
    fn checked_compares_value_and_expected() {
        assert!(Checked::new(0xfd3fu16, 0xfd3f).valid);
        assert!(!Checked::new(5u8, 1).valid);
    }

    #[test]
    fn mismatches_come_from_summary() {
        let mut report = make_stub_report("capture.bin", 0);
        report.summary.id_mismatches = 1;
        assert!(report.has_mismatches());
    }
}
