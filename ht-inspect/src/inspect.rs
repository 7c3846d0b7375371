//! Report builders for each subcommand
//!
//! Each function returns the text to print so the command logic can be
//! tested without capturing stdout.

use std::fmt::Debug;
use std::io::BufRead;
use std::time::SystemTime;

use anyhow::{Context, Result};
use serde::Serialize;

use ht_protocol::bits::{from_hex, to_hex};
use ht_protocol::{
    BeaconSettings, ChannelConfig, DecodeRecord, DeviceCapability, Fragment, Frame, FrameKind,
    GeoCoordinate, GlobalSettings, GpsPosition, LiveStatus, Reassembler, RouteTable,
    StationAddress,
};

use crate::settings::{OutputFormat, Settings};

/// Output options shared by all reports
#[derive(Debug, Clone, Copy)]
pub struct Options {
    pub output: OutputFormat,
    pub show_hex: bool,
}

/// Device record body types accepted by `record`
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum RecordKind {
    Capability,
    Status,
    Channel,
    Settings,
    Beacon,
    Position,
    Geo,
}

/// Pretty JSON or `{:#?}` text
fn render<T: Serialize + Debug>(value: &T, options: &Options) -> Result<String> {
    match options.output {
        OutputFormat::Json => serde_json::to_string_pretty(value).context("Failed to render JSON"),
        OutputFormat::Text => Ok(format!("{value:#?}")),
    }
}

fn decode_record<T: DecodeRecord + Serialize + Debug>(
    bytes: &[u8],
    options: &Options,
) -> Result<String> {
    let record = T::decode(bytes).with_context(|| format!("Failed to decode {}", T::NAME))?;
    render(&record, options)
}

/// One-line TNC2 form plus control details
fn describe_frame(frame: &Frame, raw: &[u8], show_hex: bool) -> String {
    let mut out = frame.to_string();
    match &frame.kind {
        FrameKind::Standard {
            control,
            protocol_id,
            ..
        } => {
            out.push_str(&format!(
                "\n  control {:#04x} ({})  pid {:#04x}",
                control,
                frame.control_field().name(),
                protocol_id
            ));
            if let Some(role) = frame.command_role() {
                out.push_str(&format!("  {role:?}"));
            }
        }
        FrameKind::ShortForm { .. } => out.push_str("\n  short form"),
    }
    if show_hex {
        out.push_str(&format!("\n  {}", to_hex(raw)));
    }
    out
}

/// Decode one frame from hex
pub fn frame(hex: &str, options: &Options) -> Result<String> {
    let bytes = from_hex(hex)?;
    let frame = Frame::decode(&bytes, SystemTime::now()).context("Failed to decode frame")?;
    match options.output {
        OutputFormat::Json => render(&frame, options),
        OutputFormat::Text => Ok(describe_frame(&frame, &bytes, options.show_hex)),
    }
}

#[derive(Debug, Serialize)]
struct AddressReport {
    address: String,
    callsign: String,
    ssid: u8,
    last: bool,
    wire: String,
}

/// Parse `CALL-SSID` and show its 7-byte wire form
pub fn address(text: &str, last: bool, options: &Options) -> Result<String> {
    let address = StationAddress::parse(text)?;
    let wire = to_hex(&address.encode(last)?);
    match options.output {
        OutputFormat::Json => render(
            &AddressReport {
                address: address.to_string(),
                callsign: address.callsign().to_string(),
                ssid: address.ssid(),
                last,
                wire,
            },
            options,
        ),
        OutputFormat::Text => Ok(format!("{address}  {wire}")),
    }
}

/// Decode a device record body from hex
pub fn record(kind: RecordKind, hex: &str, options: &Options) -> Result<String> {
    let bytes = from_hex(hex)?;
    match kind {
        RecordKind::Capability => decode_record::<DeviceCapability>(&bytes, options),
        RecordKind::Status => decode_record::<LiveStatus>(&bytes, options),
        RecordKind::Channel => decode_record::<ChannelConfig>(&bytes, options),
        RecordKind::Settings => decode_record::<GlobalSettings>(&bytes, options),
        RecordKind::Beacon => decode_record::<BeaconSettings>(&bytes, options),
        RecordKind::Position => decode_record::<GpsPosition>(&bytes, options),
        RecordKind::Geo => {
            let coord = GeoCoordinate::decode(&bytes).context("Failed to decode geo coordinate")?;
            render(&coord, options)
        }
    }
}

#[derive(Debug, Serialize)]
struct ReassembledFrame {
    channel_id: Option<u8>,
    frame: Frame,
    #[serde(skip)]
    raw: Vec<u8>,
}

/// Run hex fragments (one per line) through a reassembler
///
/// Blank lines and `#` comments are ignored; unreadable lines are logged
/// and skipped.
pub fn reassemble(input: impl BufRead, options: &Options) -> Result<String> {
    let mut reassembler = Reassembler::new();
    let mut frames = Vec::new();

    for (index, line) in input.lines().enumerate() {
        let line = line.context("Failed to read fragment input")?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fragment = match from_hex(line).and_then(|bytes| Fragment::decode(&bytes)) {
            Ok(fragment) => fragment,
            Err(e) => {
                tracing::warn!("Skipping line {}: {}", index + 1, e);
                continue;
            }
        };

        let Some(message) = reassembler.push(fragment) else {
            continue;
        };
        match message.decode_frame(SystemTime::now()) {
            Ok(frame) => frames.push(ReassembledFrame {
                channel_id: message.channel_id,
                frame,
                raw: message.data,
            }),
            Err(e) => tracing::warn!(
                "Failed to decode frame on channel {:?}: {}",
                message.channel_id,
                e
            ),
        }
    }

    tracing::info!(
        "Reassembled {} frames, {} partial sequences discarded",
        frames.len(),
        reassembler.discarded()
    );

    match options.output {
        OutputFormat::Json => render(&frames, options),
        OutputFormat::Text => Ok(frames
            .iter()
            .map(|f| {
                let channel = f
                    .channel_id
                    .map_or_else(|| "-".to_string(), |id| id.to_string());
                format!("[ch {channel}] {}", describe_frame(&f.frame, &f.raw, options.show_hex))
            })
            .collect::<Vec<_>>()
            .join("\n")),
    }
}

/// Parse and normalise a route table
pub fn routes(text: &str, options: &Options) -> Result<String> {
    let table = RouteTable::parse(text);
    match options.output {
        OutputFormat::Json => render(&table, options),
        OutputFormat::Text if table.is_empty() => Ok("(no routes)".to_string()),
        OutputFormat::Text => Ok(table
            .iter()
            .map(|(name, path)| {
                let path: Vec<String> = path.iter().map(ToString::to_string).collect();
                format!("{name}: {}", path.join(" > "))
            })
            .chain(std::iter::once(table.to_string()))
            .collect::<Vec<_>>()
            .join("\n")),
    }
}

/// Settings path and effective settings
pub fn config(settings: &Settings) -> Result<String> {
    let path = Settings::settings_path()
        .map_or_else(|| "(unavailable)".to_string(), |p| p.display().to_string());
    let json = serde_json::to_string_pretty(settings).context("Failed to serialize settings")?;
    Ok(format!("# {path}\n{json}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const TEXT: Options = Options {
        output: OutputFormat::Text,
        show_hex: false,
    };
    const JSON: Options = Options {
        output: OutputFormat::Json,
        show_hex: false,
    };

    /// APRS <- N0CALL UI frame, "Hello APRS!"
    const UI_FRAME: &str =
        "82A0A4A6404060 9C6086829898E1 03F0 48656C6C6F2041505253 21";

    #[test]
    fn test_frame_text() {
        let report = frame(UI_FRAME, &TEXT).unwrap();
        let mut lines = report.lines();
        assert_eq!(lines.next(), Some("N0CALL>APRS:Hello APRS!"));
        assert_eq!(
            lines.next(),
            Some("  control 0x03 (UI)  pid 0xf0  Response")
        );
    }

    #[test]
    fn test_frame_with_hex() {
        let options = Options {
            show_hex: true,
            ..TEXT
        };
        let report = frame(UI_FRAME, &options).unwrap();
        assert!(report.ends_with(&UI_FRAME.replace(' ', "")));
    }

    #[test]
    fn test_frame_bad_hex() {
        assert!(frame("82A0Z", &TEXT).is_err());
    }

    #[test]
    fn test_address_report() {
        assert_eq!(
            address("n0call-9", true, &TEXT).unwrap(),
            "N0CALL-9  9C608682989813"
        );
        let json: serde_json::Value =
            serde_json::from_str(&address("WIDE1-1", false, &JSON).unwrap()).unwrap();
        assert_eq!(json["callsign"], "WIDE1");
        assert_eq!(json["ssid"], 1);
        assert_eq!(json["last"], false);
    }

    #[test]
    fn test_record_json() {
        let report = record(RecordKind::Geo, "14D408DE5AB8", &JSON).unwrap();
        let json: serde_json::Value = serde_json::from_str(&report).unwrap();
        assert_eq!(json["latitude"], 45.5);
        assert_eq!(json["longitude"], -73.5);
    }

    #[test]
    fn test_record_too_short() {
        let err = record(RecordKind::Channel, "0102", &TEXT).unwrap_err();
        assert!(err.to_string().contains("channel config"));
    }

    #[test]
    fn test_reassemble_lines() {
        let wire = Frame::ui(
            StationAddress::parse("APRS").unwrap(),
            StationAddress::parse("N0CALL").unwrap(),
            [],
            b"fragmented".to_vec(),
        )
        .encode()
        .unwrap();

        let mut input = String::from("# capture\n\n");
        for fragment in ht_protocol::fragment_message(&wire, 6, Some(4)).unwrap() {
            input.push_str(&to_hex(&fragment.encode().unwrap()));
            input.push('\n');
        }
        input.push_str("not hex\n");

        let report = reassemble(Cursor::new(input), &TEXT).unwrap();
        assert!(report.starts_with("[ch 4] N0CALL>APRS:fragmented"));
    }

    #[test]
    fn test_routes_normalised() {
        let report = routes("WIDE, wide1-1 ,WIDE2-0|BAD,X-99", &TEXT).unwrap();
        assert_eq!(report, "WIDE: WIDE1-1 > WIDE2\nWIDE,WIDE1-1,WIDE2");
        assert_eq!(routes("", &TEXT).unwrap(), "(no routes)");
    }

    #[test]
    fn test_config_report() {
        let report = config(&Settings::default()).unwrap();
        assert!(report.starts_with("# "));
        assert!(report.contains("\"log_filter\""));
    }
}
