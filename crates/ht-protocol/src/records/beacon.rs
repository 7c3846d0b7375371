//! BSS beacon settings record
//!
//! ```text
//! 0       [max forward times (4) | time to live (4)]
//! 1       [loc id-info user-id share pwr-volt aprs pos-check -]
//! 2       [aprs ssid (4) | - - - -]
//! 3       location share interval, 10 s units
//! 4-7     BSS user id
//! 8-19    PTT-release id info, 12 bytes
//! 20-37   beacon message, 18 bytes
//! 38-39   APRS symbol, 2 bytes
//! 40-45   APRS callsign, 6 bytes
//! ```
//!
//! Text fields are `\0`-padded and cut to fit on encode.

use std::ops::Range;
use std::time::Duration;

use crate::bits::{
    checked_width, field, flag, read_fixed_str, read_u32_be, require, set_flag, write_fixed_str,
    write_u32_be,
};
use crate::error::Result;
use crate::records::{DecodeRecord, EncodeRecord};

/// Wire length of the beacon record
pub const BEACON_SETTINGS_LEN: usize = 46;

/// Seconds per unit of `location_share_interval`
pub const LOCATION_INTERVAL_UNIT_SECS: u64 = 10;

const ID_INFO_RANGE: Range<usize> = 8..20;
const MESSAGE_RANGE: Range<usize> = 20..38;
const SYMBOL_RANGE: Range<usize> = 38..40;
const CALLSIGN_RANGE: Range<usize> = 40..46;
const PADDING: &[char] = &['\0'];

/// Over-the-air format used for location beacons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PacketFormat {
    #[default]
    Bss,
    Aprs,
}

/// Periodic position and identification broadcast configuration
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BeaconSettings {
    /// 4 bits
    pub max_forward_times: u8,
    /// 4 bits
    pub time_to_live: u8,
    pub ptt_release_send_location: bool,
    pub ptt_release_send_id_info: bool,
    pub ptt_release_send_bss_user_id: bool,
    pub should_share_location: bool,
    pub send_power_voltage: bool,
    pub packet_format: PacketFormat,
    pub allow_position_check: bool,
    /// 4 bits
    pub aprs_ssid: u8,
    /// In units of ten seconds
    pub location_share_interval: u8,
    pub bss_user_id: u32,
    pub ptt_release_id_info: String,
    pub beacon_message: String,
    pub aprs_symbol: String,
    pub aprs_callsign: String,
}

impl BeaconSettings {
    /// Time between location broadcasts
    pub fn location_share_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.location_share_interval) * LOCATION_INTERVAL_UNIT_SECS)
    }
}

impl DecodeRecord for BeaconSettings {
    const NAME: &'static str = "beacon settings";
    const MIN_LEN: usize = BEACON_SETTINGS_LEN;

    fn decode(data: &[u8]) -> Result<Self> {
        require(data, Self::MIN_LEN, Self::NAME)?;

        let packet_format = if flag(data[1], 2) {
            PacketFormat::Aprs
        } else {
            PacketFormat::Bss
        };

        Ok(Self {
            max_forward_times: field(data[0], 0xF0, 4),
            time_to_live: field(data[0], 0x0F, 0),
            ptt_release_send_location: flag(data[1], 7),
            ptt_release_send_id_info: flag(data[1], 6),
            ptt_release_send_bss_user_id: flag(data[1], 5),
            should_share_location: flag(data[1], 4),
            send_power_voltage: flag(data[1], 3),
            packet_format,
            allow_position_check: flag(data[1], 1),
            aprs_ssid: field(data[2], 0xF0, 4),
            location_share_interval: data[3],
            bss_user_id: read_u32_be(data, 4),
            ptt_release_id_info: read_fixed_str(data, ID_INFO_RANGE, PADDING),
            beacon_message: read_fixed_str(data, MESSAGE_RANGE, PADDING),
            aprs_symbol: read_fixed_str(data, SYMBOL_RANGE, PADDING),
            aprs_callsign: read_fixed_str(data, CALLSIGN_RANGE, PADDING),
        })
    }
}

impl EncodeRecord for BeaconSettings {
    fn encode(&self) -> Result<Vec<u8>> {
        let max_forward_times = checked_width(self.max_forward_times, 4, "max_forward_times")?;
        let time_to_live = checked_width(self.time_to_live, 4, "time_to_live")?;
        let aprs_ssid = checked_width(self.aprs_ssid, 4, "aprs_ssid")?;

        let mut out = vec![0u8; BEACON_SETTINGS_LEN];
        out[0] = max_forward_times << 4 | time_to_live;
        out[1] = set_flag(self.ptt_release_send_location, 7)
            | set_flag(self.ptt_release_send_id_info, 6)
            | set_flag(self.ptt_release_send_bss_user_id, 5)
            | set_flag(self.should_share_location, 4)
            | set_flag(self.send_power_voltage, 3)
            | set_flag(self.packet_format == PacketFormat::Aprs, 2)
            | set_flag(self.allow_position_check, 1);
        out[2] = aprs_ssid << 4;
        out[3] = self.location_share_interval;
        write_u32_be(&mut out, 4, self.bss_user_id);
        write_fixed_str(&mut out, ID_INFO_RANGE, &self.ptt_release_id_info);
        write_fixed_str(&mut out, MESSAGE_RANGE, &self.beacon_message);
        write_fixed_str(&mut out, SYMBOL_RANGE, &self.aprs_symbol);
        write_fixed_str(&mut out, CALLSIGN_RANGE, &self.aprs_callsign);
        Ok(out)
    }
}
