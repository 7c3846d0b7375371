//! Handheld Transceiver Protocol Library
//!
//! This crate provides the byte-level codecs used to talk to Bluetooth
//! handheld radios:
//!
//! - **Station addresses**: 7-byte AX.25 callsign/SSID fields with
//!   command/response flags
//! - **Packet frames**: standard AX.25 address chains and the radio's
//!   proprietary single-address short form
//! - **Fragment reassembly**: per-channel accumulation of transport
//!   fragments into complete frames
//! - **Device records**: fixed-layout bit-packed bodies for capability,
//!   status, channel, settings, beacon and position commands
//! - **Geo coordinates**: compact 6-byte latitude/longitude encoding
//! - **Route tables**: named digipeater paths in their text form
//!
//! # Architecture
//!
//! Every codec is a pure function over its input bytes. The only state is
//! the per-channel [`FragmentBuffer`], advanced one fragment at a time by
//! [`FragmentBuffer::advance`]; [`Reassembler`] keeps one buffer per
//! channel for callers that don't need to own the map.
//!
//! # Example
//!
//! ```rust
//! use std::time::SystemTime;
//! use ht_protocol::{fragment_message, Frame, Reassembler, StationAddress};
//!
//! let frame = Frame::ui(
//!     StationAddress::parse("APRS").unwrap(),
//!     StationAddress::parse("N0CALL-9").unwrap(),
//!     [StationAddress::parse("WIDE1-1").unwrap()],
//!     b"!4903.50N/07201.75W-".to_vec(),
//! );
//! let wire = frame.encode().unwrap();
//!
//! // Slice into transport-sized fragments and put it back together
//! let mut reassembler = Reassembler::new();
//! let mut decoded = None;
//! for fragment in fragment_message(&wire, 16, Some(2)).unwrap() {
//!     decoded = reassembler.push_frame(fragment, SystemTime::now());
//! }
//!
//! let decoded = decoded.unwrap();
//! assert_eq!(decoded.to_string(), "N0CALL-9>APRS,WIDE1-1:!4903.50N/07201.75W-");
//! ```

pub mod address;
pub mod bits;
pub mod error;
pub mod fragment;
pub mod frame;
pub mod geo;
pub mod records;
pub mod route;

pub use address::{AddressFlags, StationAddress};
pub use error::{CodecError, Result};
pub use fragment::{fragment_message, Fragment, FragmentBuffer, ReassembledMessage, Reassembler};
pub use frame::{CommandRole, ControlField, Frame, FrameKind};
pub use geo::GeoCoordinate;
pub use records::{
    BeaconSettings, ChannelConfig, DecodeRecord, DeviceCapability, EncodeRecord, GlobalSettings,
    GpsPosition, LiveStatus,
};
pub use route::RouteTable;
