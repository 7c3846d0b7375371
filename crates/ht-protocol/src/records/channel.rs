//! Channel memory record (read/write channel commands)
//!
//! ```text
//! 0       channel id
//! 1-4     [tx mod (2) | tx frequency Hz (30)]
//! 5-8     [rx mod (2) | rx frequency Hz (30)]
//! 9-10    tx sub-audio
//! 11-12   rx sub-audio
//! 13      [scan max-pwr talkaround wide pre-de-emph sign med-pwr tx-disable]
//! 14      [fixed-freq fixed-bw fixed-pwr mute - - - -]
//! 15-24   name, 10 bytes, `\0`/space padded
//! ```

use std::fmt;

use crate::bits::{
    flag, read_fixed_str, read_u16_be, read_u32_be, require, set_flag, write_fixed_str,
    write_u16_be, write_u32_be,
};
use crate::error::{CodecError, Result};
use crate::records::{DecodeRecord, EncodeRecord};

/// Wire length of a channel record
pub const CHANNEL_CONFIG_LEN: usize = 25;

/// Width of the channel name field
pub const CHANNEL_NAME_LEN: usize = 10;

/// Largest frequency that fits beside the 2 modulation bits
pub const MAX_FREQUENCY_HZ: u32 = (1 << 30) - 1;

/// Sub-audio values below this are DCS codes, at or above it CTCSS tones
const CTCSS_THRESHOLD: u16 = 6700;

const NAME_RANGE: std::ops::Range<usize> = 15..15 + CHANNEL_NAME_LEN;
const NAME_PADDING: &[char] = &['\0', ' '];

/// Modulation mode, stored in the top two bits of a frequency word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Modulation {
    #[default]
    Fm,
    Am,
    Dmr,
    Reserved,
}

impl Modulation {
    fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => Modulation::Fm,
            1 => Modulation::Am,
            2 => Modulation::Dmr,
            _ => Modulation::Reserved,
        }
    }

    fn to_bits(self) -> u32 {
        match self {
            Modulation::Fm => 0,
            Modulation::Am => 1,
            Modulation::Dmr => 2,
            Modulation::Reserved => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Bandwidth {
    #[default]
    Narrow,
    Wide,
}

/// Squelch tone or code for one direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SubAudio {
    #[default]
    None,
    /// Digital-coded squelch code
    Dcs(u16),
    /// Continuous tone in hundredths of a hertz (8850 = 88.5 Hz)
    Ctcss(u16),
}

impl SubAudio {
    pub fn from_raw(raw: u16) -> Self {
        match raw {
            0 => SubAudio::None,
            code if code < CTCSS_THRESHOLD => SubAudio::Dcs(code),
            tone => SubAudio::Ctcss(tone),
        }
    }

    pub fn to_raw(self) -> u16 {
        match self {
            SubAudio::None => 0,
            SubAudio::Dcs(code) => code,
            SubAudio::Ctcss(tone) => tone,
        }
    }
}

impl fmt::Display for SubAudio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubAudio::None => write!(f, "none"),
            SubAudio::Dcs(code) => write!(f, "D{code:03}"),
            SubAudio::Ctcss(tone) => write!(f, "{}.{} Hz", tone / 100, (tone % 100) / 10),
        }
    }
}

/// One channel memory slot
///
/// Cloned and mutated to build the configuration written back to the radio.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelConfig {
    pub channel_id: u8,
    pub tx_modulation: Modulation,
    pub rx_modulation: Modulation,
    pub tx_frequency_hz: u32,
    pub rx_frequency_hz: u32,
    /// Raw tx sub-audio value, see [`SubAudio::from_raw`]
    pub tx_sub_audio: u16,
    pub rx_sub_audio: u16,
    pub scan: bool,
    pub tx_at_max_power: bool,
    pub talk_around: bool,
    pub bandwidth: Bandwidth,
    pub pre_de_emphasis_bypass: bool,
    pub sign: bool,
    pub tx_at_medium_power: bool,
    pub tx_disable: bool,
    pub fixed_frequency: bool,
    pub fixed_bandwidth: bool,
    pub fixed_tx_power: bool,
    pub mute: bool,
    pub name: String,
}

impl ChannelConfig {
    pub fn tx_sub_audio(&self) -> SubAudio {
        SubAudio::from_raw(self.tx_sub_audio)
    }

    pub fn rx_sub_audio(&self) -> SubAudio {
        SubAudio::from_raw(self.rx_sub_audio)
    }

    /// Receive-only channels have transmit disabled
    pub fn is_rx_only(&self) -> bool {
        self.tx_disable
    }

    /// Signed offset from the receive to the transmit frequency
    pub fn offset_hz(&self) -> i64 {
        i64::from(self.tx_frequency_hz) - i64::from(self.rx_frequency_hz)
    }
}

fn pack_frequency(modulation: Modulation, frequency_hz: u32, name: &str) -> Result<u32> {
    if frequency_hz > MAX_FREQUENCY_HZ {
        return Err(CodecError::NotEncodable(format!(
            "{name} {frequency_hz} Hz does not fit in 30 bits"
        )));
    }
    Ok((modulation.to_bits() << 30) | frequency_hz)
}

fn unpack_frequency(word: u32) -> (Modulation, u32) {
    (
        Modulation::from_bits((word >> 30) as u8),
        word & MAX_FREQUENCY_HZ,
    )
}

impl DecodeRecord for ChannelConfig {
    const NAME: &'static str = "channel config";
    const MIN_LEN: usize = CHANNEL_CONFIG_LEN;

    fn decode(data: &[u8]) -> Result<Self> {
        require(data, Self::MIN_LEN, Self::NAME)?;

        let (tx_modulation, tx_frequency_hz) = unpack_frequency(read_u32_be(data, 1));
        let (rx_modulation, rx_frequency_hz) = unpack_frequency(read_u32_be(data, 5));
        let bandwidth = if flag(data[13], 4) {
            Bandwidth::Wide
        } else {
            Bandwidth::Narrow
        };

        Ok(Self {
            channel_id: data[0],
            tx_modulation,
            rx_modulation,
            tx_frequency_hz,
            rx_frequency_hz,
            tx_sub_audio: read_u16_be(data, 9),
            rx_sub_audio: read_u16_be(data, 11),
            scan: flag(data[13], 7),
            tx_at_max_power: flag(data[13], 6),
            talk_around: flag(data[13], 5),
            bandwidth,
            pre_de_emphasis_bypass: flag(data[13], 3),
            sign: flag(data[13], 2),
            tx_at_medium_power: flag(data[13], 1),
            tx_disable: flag(data[13], 0),
            fixed_frequency: flag(data[14], 7),
            fixed_bandwidth: flag(data[14], 6),
            fixed_tx_power: flag(data[14], 5),
            mute: flag(data[14], 4),
            name: read_fixed_str(data, NAME_RANGE, NAME_PADDING),
        })
    }
}

impl EncodeRecord for ChannelConfig {
    fn encode(&self) -> Result<Vec<u8>> {
        let tx = pack_frequency(self.tx_modulation, self.tx_frequency_hz, "tx frequency")?;
        let rx = pack_frequency(self.rx_modulation, self.rx_frequency_hz, "rx frequency")?;

        let mut out = vec![0u8; CHANNEL_CONFIG_LEN];
        out[0] = self.channel_id;
        write_u32_be(&mut out, 1, tx);
        write_u32_be(&mut out, 5, rx);
        write_u16_be(&mut out, 9, self.tx_sub_audio);
        write_u16_be(&mut out, 11, self.rx_sub_audio);
        out[13] = set_flag(self.scan, 7)
            | set_flag(self.tx_at_max_power, 6)
            | set_flag(self.talk_around, 5)
            | set_flag(self.bandwidth == Bandwidth::Wide, 4)
            | set_flag(self.pre_de_emphasis_bypass, 3)
            | set_flag(self.sign, 2)
            | set_flag(self.tx_at_medium_power, 1)
            | set_flag(self.tx_disable, 0);
        out[14] = set_flag(self.fixed_frequency, 7)
            | set_flag(self.fixed_bandwidth, 6)
            | set_flag(self.fixed_tx_power, 5)
            | set_flag(self.mute, 4);
        write_fixed_str(&mut out, NAME_RANGE, &self.name);
        Ok(out)
    }
}
