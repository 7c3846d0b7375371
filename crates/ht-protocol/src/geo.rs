//! Compact 6-byte latitude/longitude encoding
//!
//! ```text
//! [lat (3)] [lon (3)]
//! ```
//!
//! Each axis is a signed 24-bit big-endian integer holding degrees × 30000.

use crate::bits::{read_i24_be, require, write_i24_be, I24_MAX, I24_MIN};
use crate::error::{CodecError, Result};

/// Wire length of a compact coordinate
pub const GEO_COORDINATE_LEN: usize = 6;

/// Raw units per degree in the compact form
pub const GEO_SCALE: f64 = 30000.0;

/// A latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeoCoordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoCoordinate {
    /// Create a coordinate from decimal degrees
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Decode the 6-byte compact form
    pub fn decode(data: &[u8]) -> Result<Self> {
        require(data, GEO_COORDINATE_LEN, "geo coordinate")?;
        Ok(Self {
            latitude: raw_to_degrees(read_i24_be(data, 0), GEO_SCALE),
            longitude: raw_to_degrees(read_i24_be(data, 3), GEO_SCALE),
        })
    }

    /// Encode to the 6-byte compact form
    pub fn encode(&self) -> Result<[u8; GEO_COORDINATE_LEN]> {
        let lat = degrees_to_raw(self.latitude, GEO_SCALE, "latitude")?;
        let lon = degrees_to_raw(self.longitude, GEO_SCALE, "longitude")?;

        let mut out = [0u8; GEO_COORDINATE_LEN];
        write_i24_be(&mut out, 0, lat);
        write_i24_be(&mut out, 3, lon);
        Ok(out)
    }
}

/// Convert a sign-extended 24-bit raw value to degrees
pub(crate) fn raw_to_degrees(raw: i32, scale: f64) -> f64 {
    f64::from(raw) / scale
}

/// Convert degrees to a raw 24-bit value, rounding to nearest
pub(crate) fn degrees_to_raw(degrees: f64, scale: f64, name: &str) -> Result<i32> {
    let raw = (degrees * scale).round();
    if !raw.is_finite() || raw < f64::from(I24_MIN) || raw > f64::from(I24_MAX) {
        return Err(CodecError::NotEncodable(format!(
            "{name} {degrees} outside the 24-bit coordinate range"
        )));
    }
    Ok(raw as i32)
}
