//! Typed views of response payloads
//!
//! Each query answers with a small payload whose shape is fixed by the
//! opcode. A [`Response`] type names the length it expects (so the decoder
//! can reject misaligned frames early) and converts the validated bytes.
//! Multi-byte integers are big-endian.

use heapless::Vec;

use crate::decoder::LengthPolicy;
use crate::frame::{Payload, MAX_PAYLOAD_SIZE};

/// A value that can be read from a response payload
pub trait Response: Sized {
    /// Accepted payload lengths for this type
    const LENGTH: LengthPolicy;

    /// Interpret a validated payload
    ///
    /// Returns `None` if the bytes do not form a value of this type.
    fn from_payload(payload: &[u8]) -> Option<Self>;
}

/// Single status byte
impl Response for u8 {
    const LENGTH: LengthPolicy = LengthPolicy::Fixed(1);

    fn from_payload(payload: &[u8]) -> Option<Self> {
        match payload {
            [value] => Some(*value),
            _ => None,
        }
    }
}

/// Big-endian 16-bit count
impl Response for u16 {
    const LENGTH: LengthPolicy = LengthPolicy::Fixed(2);

    fn from_payload(payload: &[u8]) -> Option<Self> {
        match payload {
            [hi, lo] => Some(u16::from_be_bytes([*hi, *lo])),
            _ => None,
        }
    }
}

/// Playback position or track length
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timestamp {
    pub hours: u8,
    pub minutes: u8,
    pub seconds: u8,
}

impl Timestamp {
    pub const fn new(hours: u8, minutes: u8, seconds: u8) -> Self {
        Self {
            hours,
            minutes,
            seconds,
        }
    }

    /// Whole seconds represented by this timestamp
    pub fn total_seconds(&self) -> u32 {
        u32::from(self.hours) * 3600 + u32::from(self.minutes) * 60 + u32::from(self.seconds)
    }
}

impl Response for Timestamp {
    const LENGTH: LengthPolicy = LengthPolicy::Fixed(3);

    fn from_payload(payload: &[u8]) -> Option<Self> {
        match payload {
            [hours, minutes, seconds] => Some(Self::new(*hours, *minutes, *seconds)),
            _ => None,
        }
    }
}

/// Name of the current file as reported by the module
///
/// The module reports names in its 8+3 form: upper case, padded with spaces,
/// no dot (`"TEST    WAV"`). The bytes are kept exactly as received.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FileName {
    bytes: Payload,
}

impl FileName {
    /// Raw name bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Name as text, if it is valid UTF-8
    pub fn as_str(&self) -> Option<&str> {
        core::str::from_utf8(&self.bytes).ok()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Copy the name into `buf` followed by a NUL byte
    ///
    /// Truncates if `buf` is too short. Returns the number of name bytes
    /// copied (not counting the terminator).
    pub fn copy_to(&self, buf: &mut [u8]) -> usize {
        let Some(room) = buf.len().checked_sub(1) else {
            return 0;
        };
        let len = self.bytes.len().min(room);
        buf[..len].copy_from_slice(&self.bytes[..len]);
        buf[len] = 0;
        len
    }
}

impl Response for FileName {
    const LENGTH: LengthPolicy = LengthPolicy::Any;

    fn from_payload(payload: &[u8]) -> Option<Self> {
        debug_assert!(payload.len() <= MAX_PAYLOAD_SIZE);
        Some(Self {
            bytes: Vec::from_slice(payload).ok()?,
        })
    }
}
