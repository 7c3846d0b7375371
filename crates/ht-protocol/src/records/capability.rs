//! Device capability record (response to the device-info query)
//!
//! ```text
//! 0     vendor id
//! 1-2   product id
//! 3     hardware version
//! 4-5   software version
//! 6     [radio med-pwr fixed-vol no-soft-pwr no-spk hm-spk rgn5 rgn4]
//! 7     [rgn3 rgn2 rgn1 rgn0 noaa gmrs vfo dmr]
//! 8     channel count
//! 9     [frequency range count (4) | reserved (4)]
//! ```

use crate::bits::{field, flag, read_u16_be, require};
use crate::error::Result;
use crate::records::DecodeRecord;

/// What the connected radio model supports
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceCapability {
    pub vendor_id: u8,
    pub product_id: u16,
    pub hardware_version: u8,
    pub software_version: u16,
    /// Broadcast FM receiver present
    pub supports_radio: bool,
    pub supports_medium_power: bool,
    pub fixed_local_speaker_volume: bool,
    pub no_soft_power_control: bool,
    pub has_no_speaker: bool,
    /// Hand-microphone speaker present
    pub has_hm_speaker: bool,
    /// Number of channel regions (banks), 6 bits
    pub region_count: u8,
    pub supports_noaa: bool,
    pub gmrs: bool,
    pub supports_vfo: bool,
    pub supports_dmr: bool,
    pub channel_count: u8,
    pub frequency_range_count: u8,
}

impl DecodeRecord for DeviceCapability {
    const NAME: &'static str = "device capability";
    const MIN_LEN: usize = 10;

    fn decode(data: &[u8]) -> Result<Self> {
        require(data, Self::MIN_LEN, Self::NAME)?;

        Ok(Self {
            vendor_id: data[0],
            product_id: read_u16_be(data, 1),
            hardware_version: data[3],
            software_version: read_u16_be(data, 4),
            supports_radio: flag(data[6], 7),
            supports_medium_power: flag(data[6], 6),
            fixed_local_speaker_volume: flag(data[6], 5),
            no_soft_power_control: flag(data[6], 4),
            has_no_speaker: flag(data[6], 3),
            has_hm_speaker: flag(data[6], 2),
            region_count: (field(data[6], 0x03, 0) << 4) | field(data[7], 0xF0, 4),
            supports_noaa: flag(data[7], 3),
            gmrs: flag(data[7], 2),
            supports_vfo: flag(data[7], 1),
            supports_dmr: flag(data[7], 0),
            channel_count: data[8],
            frequency_range_count: field(data[9], 0xF0, 4),
        })
    }
}

impl DeviceCapability {
    /// Software version as `major.minor.patch` (`0x0123` -> `1.2.3`)
    pub fn software_version_string(&self) -> String {
        let v = self.software_version;
        format!("{}.{}.{}", v >> 8, (v >> 4) & 0x0F, v & 0x0F)
    }
}
