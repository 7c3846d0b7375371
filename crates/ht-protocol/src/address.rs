//! AX.25 station address codec
//!
//! Each address occupies 7 bytes on the wire:
//!
//! ```text
//! [C1<<1] [C2<<1] [C3<<1] [C4<<1] [C5<<1] [C6<<1] [CR1 CR2 CR3 S S S S L]
//! ```
//!
//! - Bytes 0-5: callsign characters shifted left by one, space padded
//! - Byte 6, bits 7-5: the three control flags ([`AddressFlags`])
//! - Byte 6, bits 4-1: SSID (0-15)
//! - Byte 6, bit 0: set on the last address of the chain
//!
//! The text form is `CALL-SSID`, with `-0` omitted.

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;

use crate::error::{CodecError, Result};

/// Wire length of one address field
pub const ADDRESS_LEN: usize = 7;
/// Longest callsign an address can carry
pub const MAX_CALLSIGN_LEN: usize = 6;
/// Highest SSID
pub const MAX_SSID: u8 = 15;

/// Longest accepted text form (`CALLSN-15`)
const MAX_TEXT_LEN: usize = MAX_CALLSIGN_LEN + 3;

bitflags! {
    /// Control flags carried in the top three bits of the SSID byte
    ///
    /// In AX.25 v2 `CR1` is the command/response (or has-been-repeated) bit;
    /// the other two are reserved but must be carried through unchanged.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct AddressFlags: u8 {
        const CR1 = 0x80;
        const CR2 = 0x40;
        const CR3 = 0x20;
    }
}

/// A callsign plus SSID, with the control flags from its wire form
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StationAddress {
    callsign: String,
    ssid: u8,
    flags: AddressFlags,
}

impl StationAddress {
    /// Create an address from a callsign and SSID
    ///
    /// The callsign is upper-cased. It must be 1-6 printable ASCII
    /// characters without `-`.
    pub fn new(callsign: &str, ssid: u8) -> Result<Self> {
        if callsign.is_empty() || callsign.len() > MAX_CALLSIGN_LEN {
            return Err(CodecError::InvalidAddress(format!(
                "callsign {callsign:?} must be 1-{MAX_CALLSIGN_LEN} characters"
            )));
        }
        if !callsign.chars().all(|c| c.is_ascii_graphic() && c != '-') {
            return Err(CodecError::InvalidAddress(format!(
                "callsign {callsign:?} contains an invalid character"
            )));
        }
        if ssid > MAX_SSID {
            return Err(CodecError::InvalidAddress(format!(
                "SSID {ssid} out of range 0-{MAX_SSID}"
            )));
        }

        Ok(Self {
            callsign: callsign.to_ascii_uppercase(),
            ssid,
            flags: AddressFlags::empty(),
        })
    }

    /// Parse the `CALL` or `CALL-SSID` text form
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        if text.is_empty() || text.len() > MAX_TEXT_LEN {
            return Err(CodecError::InvalidFormat(format!(
                "address {text:?} has invalid length"
            )));
        }

        let (callsign, ssid) = match text.split_once('-') {
            None => (text, 0),
            Some((call, ssid)) => {
                if call.is_empty() {
                    return Err(CodecError::InvalidFormat(format!(
                        "address {text:?} has no callsign before '-'"
                    )));
                }
                if ssid.is_empty() || !ssid.chars().all(|c| c.is_ascii_digit()) {
                    return Err(CodecError::InvalidFormat(format!(
                        "address {text:?} has a non-numeric SSID"
                    )));
                }
                let ssid: u8 = ssid.parse().map_err(|_| {
                    CodecError::InvalidFormat(format!("address {text:?} has an SSID out of range"))
                })?;
                (call, ssid)
            }
        };

        Self::new(callsign, ssid).map_err(|e| match e {
            CodecError::InvalidAddress(msg) => CodecError::InvalidFormat(msg),
            other => other,
        })
    }

    /// Decode one 7-byte address field starting at `offset`
    ///
    /// Returns the address and whether it terminates the address chain.
    /// A successful decode always consumes [`ADDRESS_LEN`] bytes. Callsigns
    /// that could not be written back as `CALL-SSID` text (lowercase, `-`,
    /// embedded spaces) are rejected as malformed.
    pub fn decode(data: &[u8], offset: usize) -> Result<(Self, bool)> {
        let available = data.len().saturating_sub(offset);
        if available < ADDRESS_LEN {
            return Err(CodecError::truncated("address", ADDRESS_LEN, available));
        }
        let field = &data[offset..offset + ADDRESS_LEN];

        let mut callsign = String::with_capacity(MAX_CALLSIGN_LEN);
        for (i, &byte) in field[..MAX_CALLSIGN_LEN].iter().enumerate() {
            if byte & 0x01 != 0 {
                return Err(CodecError::MalformedAddress(format!(
                    "extension bit set in callsign byte {i} (0x{byte:02X})"
                )));
            }
            let c = byte >> 1;
            if c < 0x20 {
                return Err(CodecError::MalformedAddress(format!(
                    "non-printable character 0x{c:02X} in callsign byte {i}"
                )));
            }
            callsign.push(char::from(c));
        }

        let trimmed_len = callsign.trim_end_matches(' ').len();
        callsign.truncate(trimmed_len);
        if callsign.is_empty() {
            return Err(CodecError::MalformedAddress("empty callsign".into()));
        }
        if !callsign
            .chars()
            .all(|c| c.is_ascii_graphic() && c != '-' && !c.is_ascii_lowercase())
        {
            return Err(CodecError::MalformedAddress(format!(
                "callsign {callsign:?} has no valid text form"
            )));
        }

        let ssid_byte = field[6];
        let address = Self {
            callsign,
            ssid: (ssid_byte >> 1) & 0x0F,
            flags: AddressFlags::from_bits_truncate(ssid_byte),
        };

        Ok((address, ssid_byte & 0x01 != 0))
    }

    /// Encode to the 7-byte wire form, setting the chain terminator if `last`
    pub fn encode(&self, last: bool) -> Result<[u8; ADDRESS_LEN]> {
        if self.callsign.len() > MAX_CALLSIGN_LEN {
            return Err(CodecError::InvalidAddress(format!(
                "callsign {:?} longer than {MAX_CALLSIGN_LEN} characters",
                self.callsign
            )));
        }
        if self.ssid > MAX_SSID {
            return Err(CodecError::InvalidAddress(format!(
                "SSID {} out of range 0-{MAX_SSID}",
                self.ssid
            )));
        }

        let mut out = [b' ' << 1; ADDRESS_LEN];
        for (slot, byte) in out.iter_mut().zip(self.callsign.bytes()) {
            *slot = byte << 1;
        }
        out[6] = self.flags.bits() | (self.ssid << 1) | u8::from(last);
        Ok(out)
    }

    /// Callsign without padding or SSID
    pub fn callsign(&self) -> &str {
        &self.callsign
    }

    /// Secondary station identifier (0-15)
    pub fn ssid(&self) -> u8 {
        self.ssid
    }

    /// Control flags from the SSID byte
    pub fn flags(&self) -> AddressFlags {
        self.flags
    }

    /// Replace the control flags
    pub fn set_flags(&mut self, flags: AddressFlags) {
        self.flags = flags;
    }

    /// Builder-style variant of [`set_flags`](Self::set_flags)
    pub fn with_flags(mut self, flags: AddressFlags) -> Self {
        self.flags = flags;
        self
    }

    /// True when both addresses name the same station (callsign and SSID)
    ///
    /// Control flags are not part of a station's identity.
    pub fn is_same(&self, other: &StationAddress) -> bool {
        self.callsign == other.callsign && self.ssid == other.ssid
    }
}

impl fmt::Display for StationAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ssid == 0 {
            write!(f, "{}", self.callsign)
        } else {
            write!(f, "{}-{}", self.callsign, self.ssid)
        }
    }
}

impl FromStr for StationAddress {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// "N0CALL" with SSID 7, flags clear, last bit set
    const N0CALL_7_LAST: [u8; 7] = [0x9C, 0x60, 0x86, 0x82, 0x98, 0x98, 0x0F];

    #[test]
    fn test_parse_with_ssid() {
        let addr = StationAddress::parse("N0CALL-15").unwrap();
        assert_eq!(addr.callsign(), "N0CALL");
        assert_eq!(addr.ssid(), 15);
    }

    #[test]
    fn test_parse_without_ssid() {
        let addr = StationAddress::parse("APRS").unwrap();
        assert_eq!(addr.callsign(), "APRS");
        assert_eq!(addr.ssid(), 0);
    }

    #[test]
    fn test_parse_rejects_bad_text() {
        for text in [
            "N0CALL-16",
            "TOOLONGCALL",
            "-5",
            "N0CALL-",
            "N0CALL-X",
            "N0CALL-+5",
            "",
            "ABCDEFG-1",
        ] {
            assert!(
                matches!(StationAddress::parse(text), Err(CodecError::InvalidFormat(_))),
                "{text:?} should not parse"
            );
        }
    }

    #[test]
    fn test_parse_uppercases() {
        let addr: StationAddress = "wide1-1".parse().unwrap();
        assert_eq!(addr.to_string(), "WIDE1-1");
    }

    #[test]
    fn test_display_omits_zero_ssid() {
        assert_eq!(StationAddress::new("APRS", 0).unwrap().to_string(), "APRS");
        assert_eq!(
            StationAddress::new("N0CALL", 7).unwrap().to_string(),
            "N0CALL-7"
        );
    }

    #[test]
    fn test_encode() {
        let addr = StationAddress::new("N0CALL", 7).unwrap();
        assert_eq!(addr.encode(true).unwrap(), N0CALL_7_LAST);

        let short = StationAddress::new("AB", 0).unwrap();
        let encoded = short.encode(false).unwrap();
        assert_eq!(&encoded[2..6], &[0x40, 0x40, 0x40, 0x40]);
        assert_eq!(encoded[6], 0x00);
    }

    #[test]
    fn test_decode() {
        let (addr, last) = StationAddress::decode(&N0CALL_7_LAST, 0).unwrap();
        assert_eq!(addr.callsign(), "N0CALL");
        assert_eq!(addr.ssid(), 7);
        assert!(addr.flags().is_empty());
        assert!(last);
    }

    #[test]
    fn test_decode_at_offset_strips_padding() {
        let mut data = vec![0xFF, 0xFF];
        data.extend_from_slice(&StationAddress::new("K1", 3).unwrap().encode(false).unwrap());
        let (addr, last) = StationAddress::decode(&data, 2).unwrap();
        assert_eq!(addr.callsign(), "K1");
        assert_eq!(addr.ssid(), 3);
        assert!(!last);
    }

    #[test]
    fn test_flags_round_trip() {
        let addr = StationAddress::new("N0CALL", 1)
            .unwrap()
            .with_flags(AddressFlags::CR1 | AddressFlags::CR3);
        let encoded = addr.encode(false).unwrap();
        assert_eq!(encoded[6], 0x80 | 0x20 | (1 << 1));

        let (decoded, last) = StationAddress::decode(&encoded, 0).unwrap();
        assert_eq!(decoded, addr);
        assert!(!last);
    }

    #[test]
    fn test_decode_rejects_control_character() {
        let mut field = N0CALL_7_LAST;
        field[2] = 0x01 << 1;
        assert!(matches!(
            StationAddress::decode(&field, 0),
            Err(CodecError::MalformedAddress(_))
        ));
    }

    #[test]
    fn test_decode_rejects_low_bit() {
        let mut field = N0CALL_7_LAST;
        field[0] |= 0x01;
        assert!(matches!(
            StationAddress::decode(&field, 0),
            Err(CodecError::MalformedAddress(_))
        ));
    }

    #[test]
    fn test_decode_truncated() {
        assert_eq!(
            StationAddress::decode(&N0CALL_7_LAST, 1),
            Err(CodecError::Truncated {
                what: "address",
                needed: 7,
                available: 6
            })
        );
    }

    #[test]
    fn test_decode_rejects_untextual_callsign() {
        for call in [b"AB-C  ", b"ab    ", b"A B   "] {
            let mut field = [0u8; ADDRESS_LEN];
            for (slot, &c) in field.iter_mut().zip(call.iter()) {
                *slot = c << 1;
            }
            field[6] = 3 << 1;
            assert!(
                matches!(
                    StationAddress::decode(&field, 0),
                    Err(CodecError::MalformedAddress(_))
                ),
                "{:?} should be rejected",
                String::from_utf8_lossy(call)
            );
        }
    }

    #[test]
    fn test_is_same_ignores_flags() {
        let a = StationAddress::new("N0CALL", 7).unwrap();
        let b = a.clone().with_flags(AddressFlags::CR2);
        let c = StationAddress::new("N0CALL", 8).unwrap();
        assert!(a.is_same(&b));
        assert_ne!(a, b);
        assert!(!a.is_same(&c));
    }
}
