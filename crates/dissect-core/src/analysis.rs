use std::path::Path;

use thiserror::Error;
use tracing::{debug, warn};

use crate::packet::{Flags, FramingError, HEADER_SIZE, PROTOCOL_VERSION, segment};
use crate::select::{IdCheck, SelectError, Selected, Selection, select, validate_ids};
use crate::source::{ByteSource, FileSource, SourceError};
use crate::{Checked, FlagsReport, PacketReport, Report, ReportSummary, make_stub_report};

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("source error: {0}")]
    Source(#[from] SourceError),
    #[error("framing error: {0}")]
    Framing(#[from] FramingError),
    #[error("selection error: {0}")]
    Select(#[from] SelectError),
}

pub fn analyze_file(path: &Path, selection: &Selection) -> Result<Report, AnalysisError> {
    let source = FileSource::open(path)?;
    analyze_source(&path.display().to_string(), source, selection)
}

pub fn analyze_source<S: ByteSource>(
    label: &str,
    mut source: S,
    selection: &Selection,
) -> Result<Report, AnalysisError> {
    let bytes = source.read_all()?;
    analyze_bytes(label, &bytes, selection)
}

/// Frame `bytes`, resolve `selection` and validate every selected packet.
///
/// # Errors
/// Returns `AnalysisError` on framing or selection failure. Checksum,
/// version and id mismatches are recorded in the report instead.
///
/// # Examples
/// ```
/// use dissect_core::packet::PacketBuilder;
/// use dissect_core::{Selection, analyze_bytes};
///
/// let mut input = Vec::new();
/// PacketBuilder::new(0).payload(&[1, 2, 3, 4]).write_to(&mut input)?;
/// PacketBuilder::new(5).payload(&[5, 6, 7, 8]).write_to(&mut input)?;
///
/// let report = analyze_bytes("-", &input, &Selection::All)?;
/// assert_eq!(report.packets_total, 2);
/// assert!(report.packets[1].checksum.valid);
/// assert!(!report.packets[1].id.valid);
/// assert_eq!(report.packets[1].id.expected, 1);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn analyze_bytes(
    label: &str,
    bytes: &[u8],
    selection: &Selection,
) -> Result<Report, AnalysisError> {
    let packets = segment(bytes)?;
    let selected = select(&packets, selection)?;
    let ids = validate_ids(selected.iter().map(|entry| entry.packet));

    let mut report = make_stub_report(label, bytes.len() as u64);
    report.packets_total = packets.len() as u64;
    report.selection = match selection {
        Selection::All => None,
        Selection::Indices(indices) => Some(indices.clone()),
    };
    report.packets = selected
        .iter()
        .zip(ids)
        .map(|(entry, id)| packet_report(entry, id))
        .collect();
    report.summary = summarize(&report.packets);

    debug!(
        packets = report.packets_total,
        selected = report.packets.len(),
        "analysis complete"
    );
    if report.has_mismatches() {
        warn!(
            version = report.summary.version_mismatches,
            checksum = report.summary.checksum_mismatches,
            id = report.summary.id_mismatches,
            "packets failed validation"
        );
    }
    Ok(report)
}

fn packet_report(entry: &Selected<'_, '_>, id: IdCheck) -> PacketReport {
    let packet = entry.packet;
    let header = packet.header();

    PacketReport {
        index: entry.index,
        offset: packet.offset(),
        length: packet.size(),
        header_length: HEADER_SIZE,
        version: Checked::new(header.version(), PROTOCOL_VERSION),
        declared_length: header.length(),
        checksum: Checked::new(header.checksum(), header.checksum_expected()),
        flags: flags_report(header.flags()),
        id: Checked::new(id.actual, id.expected),
        payload_length: packet.payload().len(),
    }
}

fn flags_report(flags: Flags) -> FlagsReport {
    FlagsReport {
        bits: flags.bits(),
        more_data: flags.contains(Flags::MORE_DATA),
        reserved: flags.reserved(),
    }
}

fn summarize(packets: &[PacketReport]) -> ReportSummary {
    let mut summary = ReportSummary::default();
    for packet in packets {
        summary.version_mismatches += u64::from(!packet.version.valid);
        summary.checksum_mismatches += u64::from(!packet.checksum.valid);
        summary.id_mismatches += u64::from(!packet.id.valid);
    }
    summary
}
