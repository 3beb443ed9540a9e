//! Text rendering of reports and layouts.
//!
//! Pure presentation over already-validated fields: every ok/invalid verdict
//! comes from the report.

use std::fmt;

use dissect_core::packet::PROTOCOL_VERSION;
use dissect_core::schema::Layout;
use dissect_core::{Checked, PacketReport, Report};

/// Column width of the field values, so verdicts line up.
const VALUE_WIDTH: usize = 10;

pub struct ReportTree<'a> {
    report: &'a Report,
}

impl<'a> ReportTree<'a> {
    pub fn new(report: &'a Report) -> Self {
        Self { report }
    }
}

impl fmt::Display for ReportTree<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.report;
        writeln!(
            f,
            "╭─ {}: {} packets - {} bytes",
            report.input.path, report.packets_total, report.input.bytes
        )?;
        for packet in &report.packets {
            writeln!(f, "│")?;
            write_packet(f, packet)?;
        }
        writeln!(f, "│")?;
        writeln!(f, "╰⬤")
    }
}

fn write_packet(f: &mut fmt::Formatter<'_>, packet: &PacketReport) -> fmt::Result {
    writeln!(f, "├──● Packet #{}: {} bytes", packet.index, packet.length)?;
    writeln!(f, "│  ├──● Header: {} bytes", packet.header_length)?;
    writeln!(
        f,
        "│  │  ├─○ version:  {:<w$}{}",
        hex(packet.version.value),
        verdict_with_expected(&packet.version, hex),
        w = VALUE_WIDTH
    )?;
    writeln!(f, "│  │  ├─○ length:   {}", packet.declared_length)?;
    writeln!(
        f,
        "│  │  ├─○ checksum: {:<w$}{} (expected: {})",
        hex(packet.checksum.value),
        verdict(packet.checksum.valid),
        hex(packet.checksum.expected),
        w = VALUE_WIDTH
    )?;
    writeln!(f, "│  │  ├─○ flags:    {:08b}", packet.flags.bits)?;
    writeln!(
        f,
        "│  │  │             ├──────── MORE_DATA: {}",
        if packet.flags.more_data { "set" } else { "not set" }
    )?;
    writeln!(
        f,
        "│  │  │             ╰──────── reserved:  {:#04x}",
        packet.flags.reserved
    )?;
    writeln!(
        f,
        "│  │  ╰─○ id:       {:<w$}{}",
        format!("{:#x}", packet.id.value),
        verdict_with_expected(&packet.id, |id| format!("{id:#x}")),
        w = VALUE_WIDTH
    )?;
    writeln!(f, "│  ╰──● Payload: {} bytes", packet.payload_length)?;
    writeln!(f, "│     ╰─○ data:     [...]")
}

fn hex(value: u16) -> String {
    format!("{value:#06x}")
}

fn verdict(valid: bool) -> &'static str {
    if valid { "ok" } else { "invalid" }
}

fn verdict_with_expected<T: Copy>(checked: &Checked<T>, show: impl Fn(T) -> String) -> String {
    if checked.valid {
        verdict(true).to_string()
    } else {
        format!("{} (expected: {})", verdict(false), show(checked.expected))
    }
}

pub struct LayoutTable<'a> {
    layout: &'a Layout,
}

impl<'a> LayoutTable<'a> {
    pub fn new(layout: &'a Layout) -> Self {
        Self { layout }
    }
}

impl fmt::Display for LayoutTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<20} {:<5} {:>6} {:>5}", "field", "type", "offset", "width")?;
        for placed in self.layout.fields() {
            writeln!(
                f,
                "{:<20} {:<5} {:>6} {:>5}",
                placed.field.name,
                placed.field.ty.as_str(),
                placed.offset,
                placed.width()
            )?;
        }
        writeln!(f, "size: {} bytes", self.layout.size())?;

        let fingerprint = self.layout.fingerprint();
        if fingerprint == PROTOCOL_VERSION {
            writeln!(
                f,
                "fingerprint: {} (matches protocol version)",
                hex(fingerprint)
            )
        } else {
            writeln!(f, "fingerprint: {}", hex(fingerprint))
        }
    }
}
