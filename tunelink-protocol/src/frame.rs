//! Frame encoding for the tunelink protocol.
//!
//! Frame format:
//! - START (1 byte): 0xAA synchronization byte
//! - OPCODE (1 byte): operation identifier
//! - LENGTH (1 byte): payload length (0-255)
//! - PAYLOAD (0-255 bytes): opcode-specific data
//! - CHECKSUM (1 byte): wrapping sum of START, OPCODE, LENGTH and all PAYLOAD bytes

use heapless::Vec;
use tunelink_hal::UartTx;

/// Frame synchronization byte
pub const FRAME_START: u8 = 0xAA;

/// Maximum payload size in bytes
pub const MAX_PAYLOAD_SIZE: usize = 255;

/// START + OPCODE + LENGTH
pub const HEADER_SIZE: usize = 3;

/// Maximum complete frame size (HEADER + MAX_PAYLOAD + CHECKSUM)
pub const MAX_FRAME_SIZE: usize = HEADER_SIZE + MAX_PAYLOAD_SIZE + 1;

/// Frame payload storage
pub type Payload = Vec<u8, MAX_PAYLOAD_SIZE>;

/// Errors that can occur during frame parsing or encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Payload exceeds maximum allowed size
    PayloadTooLarge,
    /// Buffer too small for encoding
    BufferTooSmall,
    /// Checksum mismatch
    InvalidChecksum,
}

/// Running frame checksum
///
/// Wrapping 8-bit sum; overflow is part of the definition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Checksum(u8);

impl Checksum {
    /// Empty checksum
    pub const fn new() -> Self {
        Self(0)
    }

    /// Fold one byte into the sum
    pub fn push(&mut self, byte: u8) {
        self.0 = self.0.wrapping_add(byte);
    }

    /// Current sum
    pub fn value(self) -> u8 {
        self.0
    }

    /// Checksum of a complete byte run
    pub fn of(bytes: &[u8]) -> u8 {
        let mut sum = Self::new();
        for &byte in bytes {
            sum.push(byte);
        }
        sum.value()
    }
}

/// Writes one frame byte by byte, accumulating the checksum as it goes
struct FrameWriter<'a, T: UartTx + ?Sized> {
    tx: &'a mut T,
    checksum: Checksum,
}

impl<'a, T: UartTx + ?Sized> FrameWriter<'a, T> {
    fn start(tx: &'a mut T) -> Result<Self, T::Error> {
        let mut writer = Self {
            tx,
            checksum: Checksum::new(),
        };
        writer.byte(FRAME_START)?;
        Ok(writer)
    }

    fn byte(&mut self, byte: u8) -> Result<(), T::Error> {
        self.checksum.push(byte);
        self.tx.write_byte(byte)
    }

    fn finish(self) -> Result<(), T::Error> {
        self.tx.write_byte(self.checksum.value())
    }
}

/// Write a complete frame to the transport
///
/// The payload must fit in the one-byte length field; longer payloads are a
/// caller bug. Use [`Frame::new`] when the length is not known to be valid.
pub fn write_frame<T: UartTx + ?Sized>(
    tx: &mut T,
    opcode: u8,
    payload: &[u8],
) -> Result<(), T::Error> {
    debug_assert!(payload.len() <= MAX_PAYLOAD_SIZE);

    let mut writer = FrameWriter::start(tx)?;
    writer.byte(opcode)?;
    writer.byte(payload.len() as u8)?;
    for &byte in payload {
        writer.byte(byte)?;
    }

    #[cfg(feature = "defmt")]
    defmt::trace!(
        "tx frame op={=u8:#x} len={=usize} sum={=u8:#x}",
        opcode,
        payload.len(),
        writer.checksum.value()
    );

    writer.finish()
}

/// A parsed or constructed frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Operation identifier
    pub opcode: u8,
    /// Payload data
    pub payload: Payload,
}

impl Frame {
    /// Create a new frame with the given opcode and payload
    pub fn new(opcode: u8, payload: &[u8]) -> Result<Self, FrameError> {
        let payload = Vec::from_slice(payload).map_err(|_| FrameError::PayloadTooLarge)?;
        Ok(Self { opcode, payload })
    }

    /// Create a frame with no payload
    pub fn empty(opcode: u8) -> Self {
        Self {
            opcode,
            payload: Vec::new(),
        }
    }

    /// Number of bytes this frame occupies on the wire
    pub fn encoded_len(&self) -> usize {
        HEADER_SIZE + self.payload.len() + 1
    }

    /// Checksum byte for this frame
    pub fn checksum(&self) -> u8 {
        let mut sum = Checksum::new();
        sum.push(FRAME_START);
        sum.push(self.opcode);
        sum.push(self.payload.len() as u8);
        for &byte in &self.payload {
            sum.push(byte);
        }
        sum.value()
    }

    /// Encode this frame into a byte buffer
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, FrameError> {
        let frame_len = self.encoded_len();
        if buffer.len() < frame_len {
            return Err(FrameError::BufferTooSmall);
        }

        let end = HEADER_SIZE + self.payload.len();
        buffer[0] = FRAME_START;
        buffer[1] = self.opcode;
        buffer[2] = self.payload.len() as u8;
        buffer[HEADER_SIZE..end].copy_from_slice(&self.payload);
        buffer[end] = self.checksum();

        Ok(frame_len)
    }

    /// Encode this frame into a heapless Vec
    pub fn encode_to_vec(&self) -> Result<Vec<u8, MAX_FRAME_SIZE>, FrameError> {
        let mut buffer = [0u8; MAX_FRAME_SIZE];
        let len = self.encode(&mut buffer)?;
        Vec::from_slice(&buffer[..len]).map_err(|_| FrameError::BufferTooSmall)
    }

    /// Write this frame to a transport
    pub fn write_to<T: UartTx + ?Sized>(&self, tx: &mut T) -> Result<(), T::Error> {
        write_frame(tx, self.opcode, &self.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tunelink_hal::mock::MockUart;

    #[test]
    fn test_set_volume_frame_bytes() {
        let mut uart = MockUart::new();
        write_frame(&mut uart, 0x13, &[30]).unwrap();
        // 0xAA + 0x13 + 0x01 + 0x1E = 0xDC
        assert_eq!(uart.sent(), &[0xAA, 0x13, 0x01, 0x1E, 0xDC]);
    }

    #[test]
    fn test_frame_encode_empty_payload() {
        let frame = Frame::empty(0x02); // play
        let mut buffer = [0u8; 8];
        let len = frame.encode(&mut buffer).unwrap();

        assert_eq!(len, 4);
        assert_eq!(buffer[0], FRAME_START);
        assert_eq!(buffer[1], 0x02); // opcode
        assert_eq!(buffer[2], 0); // length
        assert_eq!(buffer[3], 0xAC); // 0xAA + 0x02
    }

    #[test]
    fn test_buffer_and_stream_encoding_agree() {
        let frame = Frame::new(0x08, b"\x02/01      WAV").unwrap();
        let encoded = frame.encode_to_vec().unwrap();

        let mut uart = MockUart::new();
        frame.write_to(&mut uart).unwrap();

        assert_eq!(uart.sent(), encoded.as_slice());
        assert_eq!(encoded.len(), frame.encoded_len());
    }

    #[test]
    fn test_checksum_wraps() {
        let frame = Frame::new(0xFF, &[0xFF, 0xFF]).unwrap();
        let expected = (0xAAu32 + 0xFF + 0x02 + 0xFF + 0xFF) % 256;
        assert_eq!(frame.checksum() as u32, expected);
        assert_eq!(Checksum::of(&[0xAA, 0xFF, 0x02, 0xFF, 0xFF]), frame.checksum());
    }

    #[test]
    fn test_max_payload_fits_length_byte() {
        let payload = [0x11u8; MAX_PAYLOAD_SIZE];
        let frame = Frame::new(0x1B, &payload).unwrap();
        let encoded = frame.encode_to_vec().unwrap();
        assert_eq!(encoded[2], 0xFF);
        assert_eq!(encoded.len(), MAX_FRAME_SIZE);
    }

    #[test]
    fn test_payload_too_large() {
        let large_payload = [0u8; MAX_PAYLOAD_SIZE + 1];
        let result = Frame::new(0x1B, &large_payload);
        assert_eq!(result, Err(FrameError::PayloadTooLarge));
    }

    #[test]
    fn test_buffer_too_small() {
        let frame = Frame::new(0x07, &[0x00, 0x01]).unwrap();
        let mut buffer = [0u8; 4];
        assert_eq!(frame.encode(&mut buffer), Err(FrameError::BufferTooSmall));
    }
}
