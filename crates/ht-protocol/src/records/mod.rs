//! Fixed-layout device command/response records
//!
//! Each record is decoded from its body inside a command or response
//! message; the envelope (header, command group, command id) is stripped
//! by the caller. Offsets in the module docs are relative to the first
//! body byte.

pub mod beacon;
pub mod capability;
pub mod channel;
pub mod position;
pub mod settings;
pub mod status;

pub use beacon::{BeaconSettings, PacketFormat};
pub use capability::DeviceCapability;
pub use channel::{Bandwidth, ChannelConfig, Modulation, SubAudio};
pub use position::GpsPosition;
pub use settings::GlobalSettings;
pub use status::{DualWatch, LiveStatus};

use crate::error::Result;

/// Records that can be decoded from a response body
pub trait DecodeRecord: Sized {
    /// Human-readable record name
    const NAME: &'static str;
    /// Shortest body the decoder accepts
    const MIN_LEN: usize;

    /// Decode from a body of at least [`MIN_LEN`](Self::MIN_LEN) bytes
    fn decode(data: &[u8]) -> Result<Self>;
}

/// Records that can be written back to the radio
pub trait EncodeRecord {
    /// Encode to the exact body length of the record
    fn encode(&self) -> Result<Vec<u8>>;
}
