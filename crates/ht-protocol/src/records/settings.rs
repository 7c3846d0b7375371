//! Global radio settings record (read/write settings commands)
//!
//! ```text
//! 0       [channel a 3-0 | channel b 3-0]
//! 1       [scan aghfp-call double-ch(2) | squelch (4)]
//! 2       [tail-elim auto-relay auto-pwr-on keep-aghfp mic-gain(3) hold4]
//! 3       [hold 3-0 | time-limit 4-1]
//! 4       [limit0 local-spk(2) bt-mic-gain(3) adaptive no-tone]
//! 5       [pwr-save auto-off(3) | share-location channel (4)]
//! 6       [hm-spk(2) positioning(4) offset 5-4]
//! 7       [offset 3-0 | freq-range-2 ptt-lock sync-bit pair-at-pwr-on]
//! 8       [screen timeout (5) vfo-select(2) imperial]
//! 9       [channel a 7-4 | channel b 7-4]
//! 10      [weather(2) noaa ch(4) vfo1 pwr(2)]
//! 11      [vfo2 pwr(2) no-digital-mute ecc data-lock - - -]
//! 12-15   vfo1 frequency Hz
//! 16-19   vfo2 frequency Hz
//! ```

use crate::bits::{
    checked_width, field, flag, read_u32_be, require, set_flag, write_u32_be,
};
use crate::error::Result;
use crate::records::{DecodeRecord, EncodeRecord};

/// Wire length of the settings record
pub const GLOBAL_SETTINGS_LEN: usize = 20;

/// Radio-wide settings
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GlobalSettings {
    pub channel_a: u8,
    pub channel_b: u8,
    pub scan: bool,
    pub aghfp_call_mode: bool,
    /// 2 bits
    pub double_channel: u8,
    /// 4 bits
    pub squelch_level: u8,
    pub tail_elimination: bool,
    pub auto_relay: bool,
    pub auto_power_on: bool,
    pub keep_aghfp_link: bool,
    /// 3 bits
    pub mic_gain: u8,
    /// 5 bits
    pub tx_hold_time: u8,
    /// 5 bits
    pub tx_time_limit: u8,
    /// 2 bits
    pub local_speaker: u8,
    /// 3 bits
    pub bt_mic_gain: u8,
    pub adaptive_response: bool,
    pub disable_tone: bool,
    pub power_saving_mode: bool,
    /// 3 bits
    pub auto_power_off: u8,
    /// 4 bits
    pub auto_share_location_channel: u8,
    /// 2 bits
    pub hm_speaker: u8,
    /// 4 bits
    pub positioning_system: u8,
    /// 6 bits
    pub time_offset: u8,
    pub use_frequency_range_2: bool,
    pub ptt_lock: bool,
    pub leading_sync_bit: bool,
    pub pairing_at_power_on: bool,
    /// 5 bits
    pub screen_timeout: u8,
    /// 2 bits
    pub vfo_select: u8,
    pub imperial_units: bool,
    /// 2 bits
    pub weather_mode: u8,
    /// 4 bits
    pub noaa_channel: u8,
    /// 2 bits
    pub vfo1_tx_power: u8,
    /// 2 bits
    pub vfo2_tx_power: u8,
    pub disable_digital_mute: bool,
    pub signaling_ecc: bool,
    pub channel_data_lock: bool,
    pub vfo1_frequency_hz: u32,
    pub vfo2_frequency_hz: u32,
}

impl DecodeRecord for GlobalSettings {
    const NAME: &'static str = "global settings";
    const MIN_LEN: usize = GLOBAL_SETTINGS_LEN;

    fn decode(data: &[u8]) -> Result<Self> {
        require(data, Self::MIN_LEN, Self::NAME)?;
        let d = data;

        Ok(Self {
            channel_a: (field(d[9], 0xF0, 4) << 4) | field(d[0], 0xF0, 4),
            channel_b: (field(d[9], 0x0F, 0) << 4) | field(d[0], 0x0F, 0),
            scan: flag(d[1], 7),
            aghfp_call_mode: flag(d[1], 6),
            double_channel: field(d[1], 0x30, 4),
            squelch_level: field(d[1], 0x0F, 0),
            tail_elimination: flag(d[2], 7),
            auto_relay: flag(d[2], 6),
            auto_power_on: flag(d[2], 5),
            keep_aghfp_link: flag(d[2], 4),
            mic_gain: field(d[2], 0x0E, 1),
            tx_hold_time: (field(d[2], 0x01, 0) << 4) | field(d[3], 0xF0, 4),
            tx_time_limit: (field(d[3], 0x0F, 0) << 1) | field(d[4], 0x80, 7),
            local_speaker: field(d[4], 0x60, 5),
            bt_mic_gain: field(d[4], 0x1C, 2),
            adaptive_response: flag(d[4], 1),
            disable_tone: flag(d[4], 0),
            power_saving_mode: flag(d[5], 7),
            auto_power_off: field(d[5], 0x70, 4),
            auto_share_location_channel: field(d[5], 0x0F, 0),
            hm_speaker: field(d[6], 0xC0, 6),
            positioning_system: field(d[6], 0x3C, 2),
            time_offset: (field(d[6], 0x03, 0) << 4) | field(d[7], 0xF0, 4),
            use_frequency_range_2: flag(d[7], 3),
            ptt_lock: flag(d[7], 2),
            leading_sync_bit: flag(d[7], 1),
            pairing_at_power_on: flag(d[7], 0),
            screen_timeout: field(d[8], 0xF8, 3),
            vfo_select: field(d[8], 0x06, 1),
            imperial_units: flag(d[8], 0),
            weather_mode: field(d[10], 0xC0, 6),
            noaa_channel: field(d[10], 0x3C, 2),
            vfo1_tx_power: field(d[10], 0x03, 0),
            vfo2_tx_power: field(d[11], 0xC0, 6),
            disable_digital_mute: flag(d[11], 5),
            signaling_ecc: flag(d[11], 4),
            channel_data_lock: flag(d[11], 3),
            vfo1_frequency_hz: read_u32_be(d, 12),
            vfo2_frequency_hz: read_u32_be(d, 16),
        })
    }
}

impl EncodeRecord for GlobalSettings {
    fn encode(&self) -> Result<Vec<u8>> {
        let double_channel = checked_width(self.double_channel, 2, "double_channel")?;
        let squelch_level = checked_width(self.squelch_level, 4, "squelch_level")?;
        let mic_gain = checked_width(self.mic_gain, 3, "mic_gain")?;
        let tx_hold_time = checked_width(self.tx_hold_time, 5, "tx_hold_time")?;
        let tx_time_limit = checked_width(self.tx_time_limit, 5, "tx_time_limit")?;
        let local_speaker = checked_width(self.local_speaker, 2, "local_speaker")?;
        let bt_mic_gain = checked_width(self.bt_mic_gain, 3, "bt_mic_gain")?;
        let auto_power_off = checked_width(self.auto_power_off, 3, "auto_power_off")?;
        let share_channel = checked_width(
            self.auto_share_location_channel,
            4,
            "auto_share_location_channel",
        )?;
        let hm_speaker = checked_width(self.hm_speaker, 2, "hm_speaker")?;
        let positioning = checked_width(self.positioning_system, 4, "positioning_system")?;
        let time_offset = checked_width(self.time_offset, 6, "time_offset")?;
        let screen_timeout = checked_width(self.screen_timeout, 5, "screen_timeout")?;
        let vfo_select = checked_width(self.vfo_select, 2, "vfo_select")?;
        let weather_mode = checked_width(self.weather_mode, 2, "weather_mode")?;
        let noaa_channel = checked_width(self.noaa_channel, 4, "noaa_channel")?;
        let vfo1_tx_power = checked_width(self.vfo1_tx_power, 2, "vfo1_tx_power")?;
        let vfo2_tx_power = checked_width(self.vfo2_tx_power, 2, "vfo2_tx_power")?;

        let mut out = vec![0u8; GLOBAL_SETTINGS_LEN];
        out[0] = (self.channel_a & 0x0F) << 4 | (self.channel_b & 0x0F);
        out[1] = set_flag(self.scan, 7)
            | set_flag(self.aghfp_call_mode, 6)
            | double_channel << 4
            | squelch_level;
        out[2] = set_flag(self.tail_elimination, 7)
            | set_flag(self.auto_relay, 6)
            | set_flag(self.auto_power_on, 5)
            | set_flag(self.keep_aghfp_link, 4)
            | mic_gain << 1
            | tx_hold_time >> 4;
        out[3] = (tx_hold_time & 0x0F) << 4 | tx_time_limit >> 1;
        out[4] = (tx_time_limit & 0x01) << 7
            | local_speaker << 5
            | bt_mic_gain << 2
            | set_flag(self.adaptive_response, 1)
            | set_flag(self.disable_tone, 0);
        out[5] = set_flag(self.power_saving_mode, 7) | auto_power_off << 4 | share_channel;
        out[6] = hm_speaker << 6 | positioning << 2 | time_offset >> 4;
        out[7] = (time_offset & 0x0F) << 4
            | set_flag(self.use_frequency_range_2, 3)
            | set_flag(self.ptt_lock, 2)
            | set_flag(self.leading_sync_bit, 1)
            | set_flag(self.pairing_at_power_on, 0);
        out[8] = screen_timeout << 3 | vfo_select << 1 | set_flag(self.imperial_units, 0);
        out[9] = (self.channel_a >> 4) << 4 | self.channel_b >> 4;
        out[10] = weather_mode << 6 | noaa_channel << 2 | vfo1_tx_power;
        out[11] = vfo2_tx_power << 6
            | set_flag(self.disable_digital_mute, 5)
            | set_flag(self.signaling_ecc, 4)
            | set_flag(self.channel_data_lock, 3);
        write_u32_be(&mut out, 12, self.vfo1_frequency_hz);
        write_u32_be(&mut out, 16, self.vfo2_frequency_hz);
        Ok(out)
    }
}
