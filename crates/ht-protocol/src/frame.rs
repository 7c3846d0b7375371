//! AX.25 packet frame codec
//!
//! # Standard Frame Format
//! ```text
//! [dest (7)] [src (7)] [digi (7)]* [control] [pid] [payload...]
//! ```
//!
//! The address chain ends at the first address whose SSID byte has bit 0
//! set. The control and protocol-id bytes are passed through untouched.
//!
//! # Short Form
//! The radio also emits a proprietary single-address frame:
//! ```text
//! 01 [len] " " CALLSIGN [len] [control...] [len] "$" PAYLOAD
//! ```
//!
//! The leading space, the `$` and the control value `0x21` are fixed by
//! the firmware and are reproduced verbatim on encode.

use std::borrow::Cow;
use std::fmt;
use std::time::SystemTime;

use crate::address::{AddressFlags, StationAddress, ADDRESS_LEN};
use crate::error::{CodecError, Result};

/// First byte of a short-form frame
pub const SHORT_FORM_MARKER: u8 = 0x01;
/// Control value the radio expects in a short-form frame
pub const SHORT_FORM_CONTROL: u8 = 0x21;
/// Prefix byte of the short-form callsign field
const SHORT_FORM_CALLSIGN_PREFIX: u8 = b' ';
/// Prefix byte of the short-form payload field
const SHORT_FORM_PAYLOAD_PREFIX: u8 = b'$';

/// Unnumbered-information control value
pub const CONTROL_UI: u8 = 0x03;
/// "No layer 3" protocol identifier used by APRS
pub const PID_NO_LAYER3: u8 = 0xF0;

/// Wire layout variant of a frame
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FrameKind {
    /// Regular AX.25: destination, source, then digipeaters in path order
    Standard {
        addresses: Vec<StationAddress>,
        control: u8,
        protocol_id: u8,
    },
    /// Device-specific single-address frame
    ShortForm { address: StationAddress },
}

/// A decoded (or to-be-encoded) packet
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Frame {
    /// Wire variant and its addressing
    pub kind: FrameKind,
    /// Raw information field
    pub payload: Vec<u8>,
    /// Capture time; not part of the wire form
    pub timestamp: SystemTime,
}

/// Command/response role derived from the CR1 flags of destination and source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CommandRole {
    Command,
    Response,
}

/// Supervisory frame function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Supervisory {
    ReceiveReady,
    ReceiveNotReady,
    Reject,
    SelectiveReject,
}

/// Unnumbered frame function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Unnumbered {
    Sabm,
    Sabme,
    Disc,
    Dm,
    Ua,
    Frmr,
    Ui,
    Xid,
    Test,
    Other(u8),
}

/// Classification of a modulo-8 control byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ControlField {
    /// Information frame
    Information { ns: u8, nr: u8, poll: bool },
    /// Supervisory frame
    Supervisory { kind: Supervisory, nr: u8, poll: bool },
    /// Unnumbered frame
    Unnumbered { kind: Unnumbered, poll: bool },
}

impl ControlField {
    /// Classify a control byte
    pub fn from_byte(control: u8) -> Self {
        let poll = control & 0x10 != 0;
        let nr = (control >> 5) & 0x07;

        if control & 0x01 == 0 {
            return ControlField::Information {
                ns: (control >> 1) & 0x07,
                nr,
                poll,
            };
        }

        if control & 0x03 == 0x01 {
            let kind = match (control >> 2) & 0x03 {
                0 => Supervisory::ReceiveReady,
                1 => Supervisory::ReceiveNotReady,
                2 => Supervisory::Reject,
                _ => Supervisory::SelectiveReject,
            };
            return ControlField::Supervisory { kind, nr, poll };
        }

        let kind = match control & !0x10 {
            0x2F => Unnumbered::Sabm,
            0x6F => Unnumbered::Sabme,
            0x43 => Unnumbered::Disc,
            0x0F => Unnumbered::Dm,
            0x63 => Unnumbered::Ua,
            0x87 => Unnumbered::Frmr,
            0x03 => Unnumbered::Ui,
            0xAF => Unnumbered::Xid,
            0xE3 => Unnumbered::Test,
            _ => Unnumbered::Other(control),
        };
        ControlField::Unnumbered { kind, poll }
    }

    /// Short mnemonic for monitors
    pub fn name(&self) -> &'static str {
        match self {
            ControlField::Information { .. } => "I",
            ControlField::Supervisory { kind, .. } => match kind {
                Supervisory::ReceiveReady => "RR",
                Supervisory::ReceiveNotReady => "RNR",
                Supervisory::Reject => "REJ",
                Supervisory::SelectiveReject => "SREJ",
            },
            ControlField::Unnumbered { kind, .. } => match kind {
                Unnumbered::Sabm => "SABM",
                Unnumbered::Sabme => "SABME",
                Unnumbered::Disc => "DISC",
                Unnumbered::Dm => "DM",
                Unnumbered::Ua => "UA",
                Unnumbered::Frmr => "FRMR",
                Unnumbered::Ui => "UI",
                Unnumbered::Xid => "XID",
                Unnumbered::Test => "TEST",
                Unnumbered::Other(_) => "U?",
            },
        }
    }
}

impl Frame {
    /// Create a frame stamped with the current time
    pub fn new(kind: FrameKind, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            kind,
            payload: payload.into(),
            timestamp: SystemTime::now(),
        }
    }

    /// Build a UI frame (`control = 0x03`, `pid = 0xF0`)
    pub fn ui(
        destination: StationAddress,
        source: StationAddress,
        digipeaters: impl IntoIterator<Item = StationAddress>,
        payload: impl Into<Vec<u8>>,
    ) -> Self {
        let mut addresses = vec![destination, source];
        addresses.extend(digipeaters);
        Self::new(
            FrameKind::Standard {
                addresses,
                control: CONTROL_UI,
                protocol_id: PID_NO_LAYER3,
            },
            payload,
        )
    }

    /// Build a short-form frame
    pub fn short_form(address: StationAddress, payload: impl Into<Vec<u8>>) -> Self {
        Self::new(FrameKind::ShortForm { address }, payload)
    }

    /// Decode a complete frame captured at `time`
    pub fn decode(data: &[u8], time: SystemTime) -> Result<Self> {
        match data.first() {
            None => Err(CodecError::truncated("frame", 1, 0)),
            Some(&SHORT_FORM_MARKER) => Self::decode_short_form(data, time),
            Some(_) => Self::decode_standard(data, time),
        }
    }

    fn decode_standard(data: &[u8], time: SystemTime) -> Result<Self> {
        let mut addresses = Vec::new();
        let mut offset = 0;

        loop {
            if data.len() - offset < ADDRESS_LEN {
                return Err(CodecError::MalformedAddress(format!(
                    "address chain ends at byte {offset} without a last-address marker"
                )));
            }
            let (address, last) = StationAddress::decode(data, offset)?;
            addresses.push(address);
            offset += ADDRESS_LEN;
            if last {
                break;
            }
        }

        if addresses.len() < 2 {
            return Err(CodecError::MalformedAddress(
                "standard frame needs destination and source".into(),
            ));
        }

        let control = *data
            .get(offset)
            .ok_or_else(|| CodecError::truncated("frame control", offset + 1, data.len()))?;
        let protocol_id = data.get(offset + 1).copied().unwrap_or(0);
        let payload = data.get(offset + 2..).unwrap_or_default().to_vec();

        Ok(Self {
            kind: FrameKind::Standard {
                addresses,
                control,
                protocol_id,
            },
            payload,
            timestamp: time,
        })
    }

    fn decode_short_form(data: &[u8], time: SystemTime) -> Result<Self> {
        let mut reader = FieldReader { data, offset: 1 };

        let callsign_field = reader.length_prefixed("short-form callsign")?;
        reader.length_prefixed("short-form control")?;
        let payload_field = reader.length_prefixed("short-form payload")?;

        let callsign = String::from_utf8_lossy(callsign_field);
        let address = StationAddress::new(callsign.trim(), 0).map_err(|e| {
            CodecError::MalformedAddress(format!("short-form callsign: {e}"))
        })?;

        let payload = payload_field
            .strip_prefix(&[SHORT_FORM_PAYLOAD_PREFIX])
            .unwrap_or(payload_field)
            .to_vec();

        Ok(Self {
            kind: FrameKind::ShortForm { address },
            payload,
            timestamp: time,
        })
    }

    /// Encode to wire bytes
    ///
    /// Preconditions are checked up front; on error nothing is produced.
    pub fn encode(&self) -> Result<Vec<u8>> {
        match &self.kind {
            FrameKind::Standard {
                addresses,
                control,
                protocol_id,
            } => {
                if addresses.len() < 2 {
                    return Err(CodecError::NotEncodable(format!(
                        "standard frame needs at least 2 addresses, has {}",
                        addresses.len()
                    )));
                }

                let mut out =
                    Vec::with_capacity(addresses.len() * ADDRESS_LEN + 2 + self.payload.len());
                let last_index = addresses.len() - 1;
                for (i, address) in addresses.iter().enumerate() {
                    out.extend_from_slice(&address.encode(i == last_index)?);
                }
                // 16-bit control word: control in the high byte, protocol id in the low
                let word = (u16::from(*control) << 8) | u16::from(*protocol_id);
                out.extend_from_slice(&word.to_be_bytes());
                out.extend_from_slice(&self.payload);
                Ok(out)
            }
            FrameKind::ShortForm { address } => {
                if address.ssid() != 0 || !address.flags().is_empty() {
                    return Err(CodecError::NotEncodable(format!(
                        "short-form address {address} must have SSID 0 and no control flags"
                    )));
                }
                let callsign_len = address.callsign().len() + 1;
                let payload_len = self.payload.len() + 1;
                let (Ok(callsign_len), Ok(payload_len)) =
                    (u8::try_from(callsign_len), u8::try_from(payload_len))
                else {
                    return Err(CodecError::NotEncodable(format!(
                        "short-form payload of {} bytes exceeds the length field",
                        self.payload.len()
                    )));
                };

                let mut out =
                    Vec::with_capacity(6 + address.callsign().len() + self.payload.len());
                out.push(SHORT_FORM_MARKER);
                out.push(callsign_len);
                out.push(SHORT_FORM_CALLSIGN_PREFIX);
                out.extend_from_slice(address.callsign().as_bytes());
                out.push(1);
                out.push(SHORT_FORM_CONTROL);
                out.push(payload_len);
                out.push(SHORT_FORM_PAYLOAD_PREFIX);
                out.extend_from_slice(&self.payload);
                Ok(out)
            }
        }
    }

    /// All addresses in wire order
    pub fn addresses(&self) -> &[StationAddress] {
        match &self.kind {
            FrameKind::Standard { addresses, .. } => addresses,
            FrameKind::ShortForm { address } => std::slice::from_ref(address),
        }
    }

    /// Destination address (standard frames only)
    pub fn destination(&self) -> Option<&StationAddress> {
        match &self.kind {
            FrameKind::Standard { addresses, .. } => addresses.first(),
            FrameKind::ShortForm { .. } => None,
        }
    }

    /// Originating station
    pub fn source(&self) -> Option<&StationAddress> {
        match &self.kind {
            FrameKind::Standard { addresses, .. } => addresses.get(1),
            FrameKind::ShortForm { address } => Some(address),
        }
    }

    /// Digipeater path after destination and source
    pub fn digipeaters(&self) -> &[StationAddress] {
        match &self.kind {
            FrameKind::Standard { addresses, .. } => addresses.get(2..).unwrap_or_default(),
            FrameKind::ShortForm { .. } => &[],
        }
    }

    /// Control byte (fixed for short-form frames)
    pub fn control(&self) -> u8 {
        match &self.kind {
            FrameKind::Standard { control, .. } => *control,
            FrameKind::ShortForm { .. } => SHORT_FORM_CONTROL,
        }
    }

    /// Protocol identifier (standard frames only)
    pub fn protocol_id(&self) -> Option<u8> {
        match &self.kind {
            FrameKind::Standard { protocol_id, .. } => Some(*protocol_id),
            FrameKind::ShortForm { .. } => None,
        }
    }

    /// Classified control byte
    pub fn control_field(&self) -> ControlField {
        ControlField::from_byte(self.control())
    }

    /// Command/response role, if the CR1 flags of destination and source differ
    pub fn command_role(&self) -> Option<CommandRole> {
        let dest = self.destination()?.flags().contains(AddressFlags::CR1);
        let src = self.source()?.flags().contains(AddressFlags::CR1);
        match (dest, src) {
            (true, false) => Some(CommandRole::Command),
            (false, true) => Some(CommandRole::Response),
            _ => None,
        }
    }

    pub fn is_command(&self) -> bool {
        self.command_role() == Some(CommandRole::Command)
    }

    pub fn is_response(&self) -> bool {
        self.command_role() == Some(CommandRole::Response)
    }

    /// Payload decoded as UTF-8, replacing invalid sequences
    pub fn payload_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }
}

impl fmt::Display for Frame {
    /// TNC2 monitor format: `SRC>DST,DIGI1,DIGI2:payload`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.source(), self.destination()) {
            (Some(src), Some(dst)) => write!(f, "{src}>{dst}")?,
            (Some(src), None) => write!(f, "{src}")?,
            _ => {}
        }
        for digi in self.digipeaters() {
            write!(f, ",{digi}")?;
        }
        write!(f, ":{}", self.payload_text())
    }
}

/// Cursor over length-prefixed short-form fields
struct FieldReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> FieldReader<'a> {
    fn length_prefixed(&mut self, what: &'static str) -> Result<&'a [u8]> {
        let len = *self
            .data
            .get(self.offset)
            .ok_or_else(|| CodecError::truncated(what, self.offset + 1, self.data.len()))?
            as usize;
        let start = self.offset + 1;
        let end = start + len;
        if end > self.data.len() {
            return Err(CodecError::truncated(what, end, self.data.len()));
        }
        self.offset = end;
        Ok(&self.data[start..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(text: &str) -> StationAddress {
        StationAddress::parse(text).unwrap()
    }

    #[test]
    fn test_standard_round_trip() {
        let time = SystemTime::UNIX_EPOCH;
        let frame = Frame {
            kind: FrameKind::Standard {
                addresses: vec![addr("APRS-0"), addr("N0CALL-7")],
                control: 0x03,
                protocol_id: 0xF0,
            },
            payload: b"test".to_vec(),
            timestamp: time,
        };

        let encoded = frame.encode().unwrap();
        assert_eq!(encoded.len(), 14 + 2 + 4);
        assert_eq!(&encoded[14..16], &[0x03, 0xF0]);
        // Only the final address is marked last
        assert_eq!(encoded[6] & 0x01, 0);
        assert_eq!(encoded[13] & 0x01, 1);

        let decoded = Frame::decode(&encoded, time).unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn test_decode_known_ui_frame() {
        let mut raw = Vec::new();
        raw.extend_from_slice(&[0x82, 0xA0, 0xA4, 0xA6, 0x40, 0x40, 0x60]);
        raw.extend_from_slice(&[0x9C, 0x60, 0x86, 0x82, 0x98, 0x98, 0xE1]);
        raw.extend_from_slice(&[0x03, 0xF0]);
        raw.extend_from_slice(b"Hello APRS!");

        let frame = Frame::decode(&raw, SystemTime::UNIX_EPOCH).unwrap();
        assert_eq!(frame.destination().unwrap().callsign(), "APRS");
        assert_eq!(frame.source().unwrap().callsign(), "N0CALL");
        assert_eq!(frame.control(), CONTROL_UI);
        assert_eq!(frame.protocol_id(), Some(PID_NO_LAYER3));
        assert_eq!(frame.payload_text(), "Hello APRS!");
        assert_eq!(frame.command_role(), Some(CommandRole::Response));
        assert!(frame.is_response());
        assert!(!frame.is_command());
        assert_eq!(frame.to_string(), "N0CALL>APRS:Hello APRS!");
    }

    #[test]
    fn test_digipeater_order_preserved() {
        let frame = Frame::ui(
            addr("APRS"),
            addr("N0CALL-9"),
            [addr("WIDE1-1"), addr("WIDE2-2"), addr("RELAY")],
            "!4903.50N/07201.75W-",
        );
        let decoded = Frame::decode(&frame.encode().unwrap(), frame.timestamp).unwrap();
        let digis: Vec<String> = decoded.digipeaters().iter().map(|a| a.to_string()).collect();
        assert_eq!(digis, ["WIDE1-1", "WIDE2-2", "RELAY"]);
        assert_eq!(
            decoded.to_string(),
            "N0CALL-9>APRS,WIDE1-1,WIDE2-2,RELAY:!4903.50N/07201.75W-"
        );
    }

    #[test]
    fn test_decode_without_pid() {
        let frame = Frame::ui(addr("DEST"), addr("SRC"), [], Vec::new());
        let mut encoded = frame.encode().unwrap();
        encoded.truncate(15);

        let decoded = Frame::decode(&encoded, SystemTime::UNIX_EPOCH).unwrap();
        assert_eq!(decoded.control(), CONTROL_UI);
        assert_eq!(decoded.protocol_id(), Some(0));
        assert!(decoded.payload.is_empty());
    }

    #[test]
    fn test_decode_invalid_utf8_payload() {
        let frame = Frame::ui(addr("DEST"), addr("SRC"), [], vec![0xFF, 0xFE, b'A']);
        let decoded = Frame::decode(&frame.encode().unwrap(), SystemTime::UNIX_EPOCH).unwrap();
        assert_eq!(decoded.payload, vec![0xFF, 0xFE, b'A']);
        assert!(decoded.payload_text().ends_with('A'));
    }

    #[test]
    fn test_decode_missing_last_marker() {
        let dest = addr("DEST").encode(false).unwrap();
        let src = addr("SRC").encode(false).unwrap();
        let mut raw = dest.to_vec();
        raw.extend_from_slice(&src);
        raw.extend_from_slice(&[0x03, 0xF0]);

        assert!(matches!(
            Frame::decode(&raw, SystemTime::UNIX_EPOCH),
            Err(CodecError::MalformedAddress(_))
        ));
    }

    #[test]
    fn test_decode_single_standard_address() {
        let raw = addr("DEST").encode(true).unwrap();
        assert!(matches!(
            Frame::decode(&raw, SystemTime::UNIX_EPOCH),
            Err(CodecError::MalformedAddress(_))
        ));
    }

    #[test]
    fn test_decode_missing_control() {
        let frame = Frame::ui(addr("DEST"), addr("SRC"), [], Vec::new());
        let encoded = frame.encode().unwrap();
        assert!(matches!(
            Frame::decode(&encoded[..14], SystemTime::UNIX_EPOCH),
            Err(CodecError::Truncated { .. })
        ));
    }

    #[test]
    fn test_decode_empty() {
        assert!(matches!(
            Frame::decode(&[], SystemTime::UNIX_EPOCH),
            Err(CodecError::Truncated { .. })
        ));
    }

    #[test]
    fn test_short_form_encode() {
        let frame = Frame::short_form(addr("N0CALL-0"), "hello");
        let encoded = frame.encode().unwrap();

        let mut expected = vec![0x01, 7, b' '];
        expected.extend_from_slice(b"N0CALL");
        expected.extend_from_slice(&[1, 0x21, 6, b'$']);
        expected.extend_from_slice(b"hello");
        assert_eq!(encoded, expected);
    }

    #[test]
    fn test_short_form_round_trip() {
        let frame = Frame::short_form(addr("N0CALL"), "hello");
        let decoded = Frame::decode(&frame.encode().unwrap(), frame.timestamp).unwrap();

        assert_eq!(decoded, frame);
        assert_eq!(decoded.addresses().len(), 1);
        assert_eq!(decoded.control(), SHORT_FORM_CONTROL);
        assert_eq!(decoded.protocol_id(), None);
        assert_eq!(decoded.to_string(), "N0CALL:hello");
    }

    #[test]
    fn test_short_form_truncated() {
        let frame = Frame::short_form(addr("N0CALL"), "hello");
        let encoded = frame.encode().unwrap();
        for len in 1..encoded.len() {
            assert!(
                matches!(
                    Frame::decode(&encoded[..len], SystemTime::UNIX_EPOCH),
                    Err(CodecError::Truncated { .. })
                ),
                "prefix of {len} bytes should be truncated"
            );
        }
    }

    #[test]
    fn test_short_form_payload_too_long() {
        let frame = Frame::short_form(addr("N0CALL"), vec![b'x'; 255]);
        assert!(matches!(frame.encode(), Err(CodecError::NotEncodable(_))));
    }

    #[test]
    fn test_short_form_rejects_ssid_and_flags() {
        let with_ssid = Frame::short_form(addr("N0CALL-7"), b"hello".to_vec());
        assert!(matches!(with_ssid.encode(), Err(CodecError::NotEncodable(_))));

        let with_flags = Frame::short_form(
            addr("N0CALL").with_flags(AddressFlags::CR1),
            b"hello".to_vec(),
        );
        assert!(matches!(with_flags.encode(), Err(CodecError::NotEncodable(_))));
    }

    #[test]
    fn test_encode_requires_two_addresses() {
        let empty = Frame::new(
            FrameKind::Standard {
                addresses: Vec::new(),
                control: CONTROL_UI,
                protocol_id: PID_NO_LAYER3,
            },
            Vec::new(),
        );
        assert!(matches!(empty.encode(), Err(CodecError::NotEncodable(_))));

        let single = Frame::new(
            FrameKind::Standard {
                addresses: vec![addr("DEST")],
                control: CONTROL_UI,
                protocol_id: PID_NO_LAYER3,
            },
            Vec::new(),
        );
        assert!(matches!(single.encode(), Err(CodecError::NotEncodable(_))));
    }

    #[test]
    fn test_control_field_classification() {
        assert_eq!(
            ControlField::from_byte(0x03),
            ControlField::Unnumbered {
                kind: Unnumbered::Ui,
                poll: false
            }
        );
        assert_eq!(
            ControlField::from_byte(0x3F),
            ControlField::Unnumbered {
                kind: Unnumbered::Sabm,
                poll: true
            }
        );
        assert_eq!(
            ControlField::from_byte(0x41),
            ControlField::Supervisory {
                kind: Supervisory::ReceiveReady,
                nr: 2,
                poll: false
            }
        );
        assert_eq!(
            ControlField::from_byte(0x34),
            ControlField::Information {
                ns: 2,
                nr: 1,
                poll: true
            }
        );
        assert_eq!(ControlField::from_byte(0x09).name(), "REJ");
    }
}
