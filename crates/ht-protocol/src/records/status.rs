//! Live radio status record (response/notification for the status query)
//!
//! ```text
//! 0     [pwr tx sq rx dual(2) scan fm]
//! 1     [ch3 ch2 ch1 ch0 gps hfp aoc -]
//! 2     [rssi (4) | rgn5 rgn4 rgn3 rgn2]          extended form only
//! 3     [rgn1 rgn0 | ch7 ch6 ch5 ch4 | - -]       extended form only
//! ```
//!
//! Older firmware sends only the first two bytes; the extended fields
//! then read as zero.

use crate::bits::{field, flag, require};
use crate::error::Result;
use crate::records::DecodeRecord;

/// Length of the extended status form
pub const EXTENDED_STATUS_LEN: usize = 4;

/// Dual-watch mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DualWatch {
    Off,
    A,
    B,
    Unknown(u8),
}

impl DualWatch {
    pub fn from_bits(bits: u8) -> Self {
        match bits {
            0 => DualWatch::Off,
            1 => DualWatch::A,
            2 => DualWatch::B,
            other => DualWatch::Unknown(other),
        }
    }

    pub fn to_bits(self) -> u8 {
        match self {
            DualWatch::Off => 0,
            DualWatch::A => 1,
            DualWatch::B => 2,
            DualWatch::Unknown(bits) => bits,
        }
    }
}

/// Snapshot of the radio's receive/transmit state
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LiveStatus {
    pub power_on: bool,
    pub in_tx: bool,
    pub squelch_open: bool,
    pub in_rx: bool,
    pub dual_watch: DualWatch,
    pub scanning: bool,
    /// Broadcast FM receiver active
    pub fm_radio_on: bool,
    /// Current channel, 8 bits (upper nibble only in the extended form)
    pub current_channel: u8,
    pub gps_locked: bool,
    pub hfp_connected: bool,
    pub aoc_connected: bool,
    /// Received signal strength, 0-15
    pub rssi: u8,
    /// Current region, 6 bits
    pub current_region: u8,
}

impl DecodeRecord for LiveStatus {
    const NAME: &'static str = "live status";
    const MIN_LEN: usize = 2;

    fn decode(data: &[u8]) -> Result<Self> {
        require(data, Self::MIN_LEN, Self::NAME)?;

        let channel_low = field(data[1], 0xF0, 4);
        let (rssi, current_region, channel_high) = if data.len() >= EXTENDED_STATUS_LEN {
            (
                field(data[2], 0xF0, 4),
                (field(data[2], 0x0F, 0) << 2) | field(data[3], 0xC0, 6),
                field(data[3], 0x3C, 2),
            )
        } else {
            (0, 0, 0)
        };

        Ok(Self {
            power_on: flag(data[0], 7),
            in_tx: flag(data[0], 6),
            squelch_open: flag(data[0], 5),
            in_rx: flag(data[0], 4),
            dual_watch: DualWatch::from_bits(field(data[0], 0x0C, 2)),
            scanning: flag(data[0], 1),
            fm_radio_on: flag(data[0], 0),
            current_channel: (channel_high << 4) | channel_low,
            gps_locked: flag(data[1], 3),
            hfp_connected: flag(data[1], 2),
            aoc_connected: flag(data[1], 1),
            rssi,
            current_region,
        })
    }
}
