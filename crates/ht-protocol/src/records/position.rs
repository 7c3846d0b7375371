//! GPS position report record
//!
//! ```text
//! 0-2     latitude, signed 24-bit, degrees × 30000 (60 × 500)
//! 3-5     longitude, same scale
//! 6-7     altitude m (signed)
//! 8-9     speed
//! 10-11   heading degrees
//! 12-15   timestamp, unix seconds
//! 16-17   accuracy m
//! ```

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::bits::{
    read_i16_be, read_i24_be, read_u16_be, read_u32_be, require, write_i16_be, write_i24_be,
    write_u16_be, write_u32_be,
};
use crate::error::Result;
use crate::geo::{degrees_to_raw, raw_to_degrees};
use crate::records::{DecodeRecord, EncodeRecord};

/// Wire length of a position report
pub const GPS_POSITION_LEN: usize = 18;

/// Raw units per degree: minutes × 500
pub const POSITION_SCALE: f64 = 60.0 * 500.0;

/// A position fix reported by the radio's GPS
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GpsPosition {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude_m: i16,
    pub speed: u16,
    pub heading_deg: u16,
    /// Fix time, seconds since the unix epoch
    pub timestamp: u32,
    pub accuracy_m: u16,
}

impl GpsPosition {
    /// Fix time as a [`SystemTime`]
    pub fn time(&self) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(u64::from(self.timestamp))
    }
}

impl DecodeRecord for GpsPosition {
    const NAME: &'static str = "gps position";
    const MIN_LEN: usize = GPS_POSITION_LEN;

    fn decode(data: &[u8]) -> Result<Self> {
        require(data, Self::MIN_LEN, Self::NAME)?;

        Ok(Self {
            latitude: raw_to_degrees(read_i24_be(data, 0), POSITION_SCALE),
            longitude: raw_to_degrees(read_i24_be(data, 3), POSITION_SCALE),
            altitude_m: read_i16_be(data, 6),
            speed: read_u16_be(data, 8),
            heading_deg: read_u16_be(data, 10),
            timestamp: read_u32_be(data, 12),
            accuracy_m: read_u16_be(data, 16),
        })
    }
}

impl EncodeRecord for GpsPosition {
    fn encode(&self) -> Result<Vec<u8>> {
        let lat = degrees_to_raw(self.latitude, POSITION_SCALE, "latitude")?;
        let lon = degrees_to_raw(self.longitude, POSITION_SCALE, "longitude")?;

        let mut out = vec![0u8; GPS_POSITION_LEN];
        write_i24_be(&mut out, 0, lat);
        write_i24_be(&mut out, 3, lon);
        write_i16_be(&mut out, 6, self.altitude_m);
        write_u16_be(&mut out, 8, self.speed);
        write_u16_be(&mut out, 10, self.heading_deg);
        write_u32_be(&mut out, 12, self.timestamp);
        write_u16_be(&mut out, 16, self.accuracy_m);
        Ok(out)
    }
}
