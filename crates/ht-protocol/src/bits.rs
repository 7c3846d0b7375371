//! Bit and byte helpers shared by the frame and record codecs
//!
//! All multi-byte fields on the wire are big-endian. The fixed-offset
//! readers here do not bounds-check: record decoders call [`require`] once
//! with their minimum length and then read freely inside that window.

use std::ops::Range;

use byteorder::{BigEndian, ByteOrder};

use crate::error::{CodecError, Result};

/// Fail with [`CodecError::Truncated`] unless `data` holds at least `needed` bytes
pub fn require(data: &[u8], needed: usize, what: &'static str) -> Result<()> {
    if data.len() < needed {
        return Err(CodecError::truncated(what, needed, data.len()));
    }
    Ok(())
}

/// Read a big-endian u16 at `offset`
pub fn read_u16_be(data: &[u8], offset: usize) -> u16 {
    BigEndian::read_u16(&data[offset..offset + 2])
}

/// Read a big-endian i16 at `offset`
pub fn read_i16_be(data: &[u8], offset: usize) -> i16 {
    BigEndian::read_i16(&data[offset..offset + 2])
}

/// Read an unsigned big-endian 24-bit value at `offset`
pub fn read_u24_be(data: &[u8], offset: usize) -> u32 {
    BigEndian::read_u24(&data[offset..offset + 3])
}

/// Read a signed big-endian 24-bit value at `offset`, sign-extending bit 23
pub fn read_i24_be(data: &[u8], offset: usize) -> i32 {
    sign_extend_24(read_u24_be(data, offset))
}

/// Read a big-endian u32 at `offset`
pub fn read_u32_be(data: &[u8], offset: usize) -> u32 {
    BigEndian::read_u32(&data[offset..offset + 4])
}

/// Write a big-endian u16 at `offset`
pub fn write_u16_be(buf: &mut [u8], offset: usize, value: u16) {
    BigEndian::write_u16(&mut buf[offset..offset + 2], value);
}

/// Write a big-endian i16 at `offset`
pub fn write_i16_be(buf: &mut [u8], offset: usize, value: i16) {
    BigEndian::write_i16(&mut buf[offset..offset + 2], value);
}

/// Write the low 24 bits of `value` big-endian at `offset`
pub fn write_u24_be(buf: &mut [u8], offset: usize, value: u32) {
    BigEndian::write_u24(&mut buf[offset..offset + 3], value & 0x00FF_FFFF);
}

/// Write a signed value as 24-bit two's complement at `offset`
pub fn write_i24_be(buf: &mut [u8], offset: usize, value: i32) {
    write_u24_be(buf, offset, value as u32);
}

/// Write a big-endian u32 at `offset`
pub fn write_u32_be(buf: &mut [u8], offset: usize, value: u32) {
    BigEndian::write_u32(&mut buf[offset..offset + 4], value);
}

/// Sign-extend a raw 24-bit value to i32
pub fn sign_extend_24(raw: u32) -> i32 {
    ((raw << 8) as i32) >> 8
}

/// Smallest value representable in 24-bit two's complement
pub const I24_MIN: i32 = -0x80_0000;
/// Largest value representable in 24-bit two's complement
pub const I24_MAX: i32 = 0x7F_FFFF;

/// Test a single bit (7 = MSB)
pub fn flag(byte: u8, bit: u8) -> bool {
    byte & (1 << bit) != 0
}

/// Return `1 << bit` when `on`, else 0
pub fn set_flag(on: bool, bit: u8) -> u8 {
    if on {
        1 << bit
    } else {
        0
    }
}

/// Extract `(byte & mask) >> shift`
pub fn field(byte: u8, mask: u8, shift: u8) -> u8 {
    (byte & mask) >> shift
}

/// Check that `value` fits in `width` bits before it is packed
pub fn checked_width(value: u8, width: u32, name: &str) -> Result<u8> {
    if u32::from(value) >> width != 0 {
        return Err(CodecError::NotEncodable(format!(
            "{name} = {value} does not fit in {width} bits"
        )));
    }
    Ok(value)
}

/// Decode a fixed-width text region, trimming trailing `trim` characters
pub fn read_fixed_str(data: &[u8], range: Range<usize>, trim: &[char]) -> String {
    String::from_utf8_lossy(&data[range])
        .trim_end_matches(trim)
        .to_string()
}

/// Write `text` into a fixed-width region, `\0`-padded
///
/// Text longer than the region is cut at the last character boundary that
/// fits.
pub fn write_fixed_str(buf: &mut [u8], range: Range<usize>, text: &str) {
    let width = range.len();
    let mut end = text.len().min(width);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    let region = &mut buf[range];
    region.fill(0);
    region[..end].copy_from_slice(&text.as_bytes()[..end]);
}

/// Format bytes as uppercase hex with no separators
pub fn to_hex(data: &[u8]) -> String {
    hex::encode_upper(data)
}

/// Parse hex text, ignoring whitespace, `:` and `-` separators and an
/// optional `0x` prefix
pub fn from_hex(text: &str) -> Result<Vec<u8>> {
    let trimmed = text.trim();
    let body = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let cleaned: String = body
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':' && *c != '-')
        .collect();
    hex::decode(&cleaned).map_err(|e| CodecError::InvalidHex(e.to_string()))
}
