//! Transport fragments and frame reassembly
//!
//! Frames larger than the transport's packet size arrive as a series of
//! fragments. Each fragment carries a one-byte header:
//!
//! ```text
//! [F C I I I I I I] [data...] [channel]?
//! ```
//!
//! - `F` (bit 7): final fragment of the frame
//! - `C` (bit 6): a trailing channel-id byte is present
//! - `I` (bits 5-0): rolling fragment id, modulo 64
//!
//! Reassembly is stop-and-wait: a fragment extends the buffer only if its
//! id is exactly one past the previous fragment and the buffer has not
//! already been closed by a final fragment. Anything else discards what
//! was accumulated and starts over from the new fragment.

use std::collections::HashMap;
use std::time::SystemTime;

use crate::error::{CodecError, Result};
use crate::frame::Frame;

/// Header bit marking the final fragment
const FINAL_BIT: u8 = 0x80;
/// Header bit marking a trailing channel-id byte
const CHANNEL_BIT: u8 = 0x40;
/// Header bits holding the fragment id
const ID_MASK: u8 = 0x3F;

/// Number of distinct fragment ids
pub const FRAGMENT_ID_MODULUS: u8 = 64;

/// One transport-sized slice of a frame
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Fragment {
    /// Last fragment of the frame
    pub is_final: bool,
    /// Rolling id, 0-63
    pub fragment_id: u8,
    /// Fragment payload
    pub data: Vec<u8>,
    /// Channel the frame was received on, if the radio reported it
    pub channel_id: Option<u8>,
    /// Region the channel belongs to; supplied by the caller, not on the wire
    pub region_id: Option<u8>,
}

impl Fragment {
    /// Create a fragment with no region information
    pub fn new(
        is_final: bool,
        fragment_id: u8,
        data: impl Into<Vec<u8>>,
        channel_id: Option<u8>,
    ) -> Self {
        Self {
            is_final,
            fragment_id,
            data: data.into(),
            channel_id,
            region_id: None,
        }
    }

    /// Decode a single fragment
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let (&header, rest) = bytes
            .split_first()
            .ok_or_else(|| CodecError::truncated("fragment header", 1, 0))?;

        let (data, channel_id) = if header & CHANNEL_BIT != 0 {
            let (&channel, data) = rest
                .split_last()
                .ok_or_else(|| CodecError::truncated("fragment channel id", 2, bytes.len()))?;
            (data, Some(channel))
        } else {
            (rest, None)
        };

        Ok(Self {
            is_final: header & FINAL_BIT != 0,
            fragment_id: header & ID_MASK,
            data: data.to_vec(),
            channel_id,
            region_id: None,
        })
    }

    /// Encode to the single-fragment wire form
    pub fn encode(&self) -> Result<Vec<u8>> {
        if self.fragment_id >= FRAGMENT_ID_MODULUS {
            return Err(CodecError::NotEncodable(format!(
                "fragment id {} exceeds 6 bits",
                self.fragment_id
            )));
        }

        let mut header = self.fragment_id;
        if self.is_final {
            header |= FINAL_BIT;
        }
        if self.channel_id.is_some() {
            header |= CHANNEL_BIT;
        }

        let mut out = Vec::with_capacity(self.data.len() + 2);
        out.push(header);
        out.extend_from_slice(&self.data);
        if let Some(channel) = self.channel_id {
            out.push(channel);
        }
        Ok(out)
    }
}

/// Slice an outgoing frame into consecutive fragments of at most `max_chunk` bytes
///
/// Ids start at 0 and wrap modulo 64. An empty message yields a single empty
/// final fragment.
pub fn fragment_message(
    data: &[u8],
    max_chunk: usize,
    channel_id: Option<u8>,
) -> Result<Vec<Fragment>> {
    if max_chunk == 0 {
        return Err(CodecError::NotEncodable(
            "fragment size must be at least 1 byte".into(),
        ));
    }
    if data.is_empty() {
        return Ok(vec![Fragment::new(true, 0, Vec::new(), channel_id)]);
    }

    let count = data.len().div_ceil(max_chunk);
    Ok(data
        .chunks(max_chunk)
        .enumerate()
        .map(|(i, chunk)| {
            let id = (i % usize::from(FRAGMENT_ID_MODULUS)) as u8;
            Fragment::new(i + 1 == count, id, chunk, channel_id)
        })
        .collect())
}

/// Per-channel reassembly state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FragmentBuffer {
    /// Nothing received yet
    #[default]
    Empty,
    /// Bytes gathered since the first fragment of the current sequence
    Accumulating {
        last_fragment_id: u8,
        final_received: bool,
        data: Vec<u8>,
    },
}

impl FragmentBuffer {
    /// True if `fragment` extends the current sequence
    pub fn continues_with(&self, fragment: &Fragment) -> bool {
        match self {
            FragmentBuffer::Empty => false,
            FragmentBuffer::Accumulating {
                last_fragment_id,
                final_received,
                ..
            } => {
                !final_received
                    && fragment.fragment_id
                        == last_fragment_id.wrapping_add(1) % FRAGMENT_ID_MODULUS
            }
        }
    }

    /// Apply one fragment
    ///
    /// Returns the new state and, when the adopted fragment is final, the
    /// complete message. The closed buffer keeps its sequence position but
    /// hands its bytes to the caller.
    pub fn advance(self, fragment: Fragment) -> (Self, Option<Vec<u8>>) {
        let continues = self.continues_with(&fragment);
        let Fragment {
            is_final,
            fragment_id,
            data: incoming,
            ..
        } = fragment;

        let data = match self {
            FragmentBuffer::Accumulating { mut data, .. } if continues => {
                data.extend_from_slice(&incoming);
                data
            }
            _ => incoming,
        };

        let (data, complete) = if is_final {
            (Vec::new(), Some(data))
        } else {
            (data, None)
        };
        let next = FragmentBuffer::Accumulating {
            last_fragment_id: fragment_id,
            final_received: is_final,
            data,
        };
        (next, complete)
    }

    /// True once a final fragment closed the buffer
    pub fn is_complete(&self) -> bool {
        matches!(
            self,
            FragmentBuffer::Accumulating {
                final_received: true,
                ..
            }
        )
    }

    /// Bytes held by an unfinished sequence (0 when empty or closed)
    pub fn pending_len(&self) -> usize {
        match self {
            FragmentBuffer::Accumulating {
                final_received: false,
                data,
                ..
            } => data.len(),
            _ => 0,
        }
    }
}

/// A complete message produced by the [`Reassembler`]
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReassembledMessage {
    pub channel_id: Option<u8>,
    pub region_id: Option<u8>,
    pub data: Vec<u8>,
}

impl ReassembledMessage {
    /// Decode the reassembled bytes as a frame
    pub fn decode_frame(&self, time: SystemTime) -> Result<Frame> {
        Frame::decode(&self.data, time)
    }
}

/// Channel-keyed table of [`FragmentBuffer`]s
///
/// Callers must feed fragments for a given channel in arrival order from a
/// single owner.
#[derive(Debug, Default)]
pub struct Reassembler {
    channels: HashMap<Option<u8>, FragmentBuffer>,
    discarded: u64,
}

impl Reassembler {
    /// Create an empty reassembler
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one fragment, returning a message when it completes one
    pub fn push(&mut self, fragment: Fragment) -> Option<ReassembledMessage> {
        let channel_id = fragment.channel_id;
        let region_id = fragment.region_id;
        let state = self.channels.remove(&channel_id).unwrap_or_default();

        let open = matches!(
            state,
            FragmentBuffer::Accumulating {
                final_received: false,
                ..
            }
        );
        if open && !state.continues_with(&fragment) {
            self.discarded += 1;
            tracing::debug!(
                "Fragment sequence break on channel {:?}: got id {}, dropping {} bytes",
                channel_id,
                fragment.fragment_id,
                state.pending_len()
            );
        }

        let (next, complete) = state.advance(fragment);
        self.channels.insert(channel_id, next);

        complete.map(|data| {
            tracing::trace!(
                "Reassembled {} bytes on channel {:?}",
                data.len(),
                channel_id
            );
            ReassembledMessage {
                channel_id,
                region_id,
                data,
            }
        })
    }

    /// Feed one fragment and decode the completed frame, if any
    ///
    /// Decode failures are logged and dropped.
    pub fn push_frame(&mut self, fragment: Fragment, time: SystemTime) -> Option<Frame> {
        let message = self.push(fragment)?;
        match message.decode_frame(time) {
            Ok(frame) => Some(frame),
            Err(e) => {
                tracing::warn!(
                    "Failed to decode reassembled frame on channel {:?}: {}",
                    message.channel_id,
                    e
                );
                None
            }
        }
    }

    /// Current state for a channel
    pub fn state(&self, channel_id: Option<u8>) -> Option<&FragmentBuffer> {
        self.channels.get(&channel_id)
    }

    /// Drop any accumulation for a channel (e.g. after a receive timeout)
    pub fn reset_channel(&mut self, channel_id: Option<u8>) {
        self.channels.remove(&channel_id);
    }

    /// Drop all state
    pub fn clear(&mut self) {
        self.channels.clear();
    }

    /// Number of unfinished sequences discarded because of a break
    pub fn discarded(&self) -> u64 {
        self.discarded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::StationAddress;

    fn frag(id: u8, is_final: bool, data: &[u8]) -> Fragment {
        Fragment::new(is_final, id, data, None)
    }

    #[test]
    fn test_continuity() {
        let state = FragmentBuffer::default();
        let (state, out) = state.advance(frag(0, false, b"AB"));
        assert!(out.is_none());
        let (state, out) = state.advance(frag(1, false, b"CD"));
        assert!(out.is_none());
        let (state, out) = state.advance(frag(2, true, b"EF"));
        assert_eq!(out.as_deref(), Some(&b"ABCDEF"[..]));
        assert!(state.is_complete());
    }

    #[test]
    fn test_break_restarts() {
        let (state, _) = FragmentBuffer::default().advance(frag(0, false, b"AB"));
        let (state, out) = state.advance(frag(5, true, b"ZZ"));
        assert_eq!(out.as_deref(), Some(&b"ZZ"[..]));
        assert_eq!(
            state,
            FragmentBuffer::Accumulating {
                last_fragment_id: 5,
                final_received: true,
                data: Vec::new(),
            }
        );
    }

    #[test]
    fn test_closed_buffer_does_not_continue() {
        let (state, out) = FragmentBuffer::default().advance(frag(3, true, b"ONE"));
        assert_eq!(out.as_deref(), Some(&b"ONE"[..]));
        // Next id in sequence still starts a fresh message
        let (state, out) = state.advance(frag(4, false, b"TW"));
        assert!(out.is_none());
        assert_eq!(state.pending_len(), 2);
        let (_, out) = state.advance(frag(5, true, b"O"));
        assert_eq!(out.as_deref(), Some(&b"TWO"[..]));
    }

    #[test]
    fn test_id_wraps_modulo_64() {
        let (state, _) = FragmentBuffer::default().advance(frag(63, false, b"A"));
        let (_, out) = state.advance(frag(0, true, b"B"));
        assert_eq!(out.as_deref(), Some(&b"AB"[..]));
    }

    #[test]
    fn test_duplicate_fragment_restarts() {
        let (state, _) = FragmentBuffer::default().advance(frag(0, false, b"AB"));
        let (state, _) = state.advance(frag(0, false, b"XY"));
        assert_eq!(state.pending_len(), 2);
    }

    #[test]
    fn test_fragment_wire_round_trip() {
        let fragment = Fragment::new(true, 17, b"hello".to_vec(), Some(3));
        let encoded = fragment.encode().unwrap();
        assert_eq!(encoded[0], 0x80 | 0x40 | 17);
        assert_eq!(*encoded.last().unwrap(), 3);
        assert_eq!(Fragment::decode(&encoded).unwrap(), fragment);
    }

    #[test]
    fn test_fragment_decode_without_channel() {
        let fragment = Fragment::decode(&[0x05, b'a', b'b']).unwrap();
        assert!(!fragment.is_final);
        assert_eq!(fragment.fragment_id, 5);
        assert_eq!(fragment.data, b"ab");
        assert_eq!(fragment.channel_id, None);
    }

    #[test]
    fn test_fragment_decode_truncated() {
        assert!(matches!(
            Fragment::decode(&[]),
            Err(CodecError::Truncated { .. })
        ));
        assert!(matches!(
            Fragment::decode(&[0x40]),
            Err(CodecError::Truncated { .. })
        ));
    }

    #[test]
    fn test_fragment_id_out_of_range() {
        let fragment = Fragment::new(false, 64, Vec::new(), None);
        assert!(matches!(
            fragment.encode(),
            Err(CodecError::NotEncodable(_))
        ));
    }

    #[test]
    fn test_fragment_message() {
        let fragments = fragment_message(b"ABCDEFG", 3, Some(1)).unwrap();
        assert_eq!(fragments.len(), 3);
        assert_eq!(fragments[0].data, b"ABC");
        assert_eq!(fragments[2].data, b"G");
        assert!(fragments[2].is_final);
        assert!(!fragments[1].is_final);
        assert_eq!(
            fragments.iter().map(|f| f.fragment_id).collect::<Vec<_>>(),
            [0, 1, 2]
        );
        assert!(fragment_message(b"A", 0, None).is_err());
        assert_eq!(fragment_message(&[], 8, None).unwrap().len(), 1);
    }

    #[test]
    fn test_reassembler_channels_are_independent() {
        let mut reassembler = Reassembler::new();
        assert!(reassembler
            .push(Fragment::new(false, 0, b"A1".to_vec(), Some(1)))
            .is_none());
        assert!(reassembler
            .push(Fragment::new(false, 0, b"B1".to_vec(), Some(2)))
            .is_none());

        let a = reassembler
            .push(Fragment::new(true, 1, b"A2".to_vec(), Some(1)))
            .unwrap();
        assert_eq!(a.channel_id, Some(1));
        assert_eq!(a.data, b"A1A2");

        let b = reassembler
            .push(Fragment::new(true, 1, b"B2".to_vec(), Some(2)))
            .unwrap();
        assert_eq!(b.data, b"B1B2");
        assert_eq!(reassembler.discarded(), 0);
    }

    #[test]
    fn test_reassembler_counts_discards() {
        let mut reassembler = Reassembler::new();
        reassembler.push(frag(0, false, b"AB"));
        let out = reassembler.push(frag(5, true, b"ZZ")).unwrap();
        assert_eq!(out.data, b"ZZ");
        assert_eq!(reassembler.discarded(), 1);

        // A closed buffer being replaced is not a discard
        reassembler.push(frag(9, false, b"Q"));
        assert_eq!(reassembler.discarded(), 1);

        reassembler.reset_channel(None);
        assert!(reassembler.state(None).is_none());

        reassembler.push(frag(0, false, b"AB"));
        reassembler.push(Fragment::new(false, 0, b"CD".to_vec(), Some(2)));
        reassembler.clear();
        assert!(reassembler.state(None).is_none());
        assert!(reassembler.state(Some(2)).is_none());
    }

    #[test]
    fn test_reassembler_counts_empty_broken_sequence() {
        let mut reassembler = Reassembler::new();
        reassembler.push(frag(0, false, b""));
        let out = reassembler.push(frag(9, true, b"Z")).unwrap();
        assert_eq!(out.data, b"Z");
        assert_eq!(reassembler.discarded(), 1);
    }

    #[test]
    fn test_closed_buffer_releases_data() {
        let mut reassembler = Reassembler::new();
        reassembler.push(frag(0, false, b"AB"));
        reassembler.push(frag(1, true, b"CD")).unwrap();

        let state = reassembler.state(None).unwrap();
        assert!(state.is_complete());
        assert_eq!(state.pending_len(), 0);
        assert!(matches!(
            state,
            FragmentBuffer::Accumulating { data, .. } if data.is_empty()
        ));
    }

    #[test]
    fn test_reassembler_decodes_frame() {
        let frame = Frame::ui(
            StationAddress::parse("APRS").unwrap(),
            StationAddress::parse("N0CALL-7").unwrap(),
            [],
            "fragmented payload",
        );
        let bytes = frame.encode().unwrap();

        let mut reassembler = Reassembler::new();
        let mut decoded = None;
        for fragment in fragment_message(&bytes, 5, Some(0)).unwrap() {
            let wire = fragment.encode().unwrap();
            decoded = reassembler.push_frame(Fragment::decode(&wire).unwrap(), frame.timestamp);
        }
        assert_eq!(decoded, Some(frame));
    }
}
