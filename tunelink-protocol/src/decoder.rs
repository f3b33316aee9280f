//! Response decoding for the tunelink protocol.
//!
//! A response is read one byte at a time from a link that gives no framing
//! guarantees beyond the start byte. The decoder hunts for `START`, then
//! checks the opcode and declared length against what the caller asked for.
//! Any mismatch throws away what was collected and goes back to hunting, so
//! line noise and unrelated frames are skipped silently. Only a timeout or a
//! bad checksum ends the call with an error.
//!
//! ```text
//!            ┌──────────── mismatch ──────────────┐
//!            ▼                                    │
//!      ┌───────────┐ 0xAA ┌──────────────┐ ok ┌───┴────────┐ ok ┌─────────────┐
//!  ──▶ │ SeekStart │ ───▶ │ MatchOpcode  │ ──▶ │ ReadLength │ ──▶ │ ReadPayload │
//!      └───────────┘      └──────────────┘     └────────────┘     └──────┬──────┘
//!                                                                        ▼
//!                                                                ┌───────────────┐
//!                                                                │ ReadChecksum  │
//!                                                                └───────────────┘
//! ```

use core::fmt;

use tunelink_hal::{Clock, UartRx};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::frame::{Checksum, FrameError, Payload, FRAME_START};
#[cfg(feature = "defmt")]
use crate::opcode::Opcode;

/// Default wait for the next byte
pub const DEFAULT_BYTE_TIMEOUT_MS: u32 = 100;

/// Default budget for a whole response
pub const DEFAULT_TOTAL_TIMEOUT_MS: u32 = 500;

/// Timeout budget for one response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Timeouts {
    /// Longest silence allowed between two bytes (and before the first one)
    pub byte_ms: u32,
    /// Longest time the whole response may take
    pub total_ms: u32,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            byte_ms: DEFAULT_BYTE_TIMEOUT_MS,
            total_ms: DEFAULT_TOTAL_TIMEOUT_MS,
        }
    }
}

/// Expectation for the declared payload length of a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LengthPolicy {
    /// Length must be exactly this value
    Fixed(u8),
    /// Length may be anything up to and including this value
    AtMost(u8),
    /// Any length is accepted
    Any,
}

impl LengthPolicy {
    /// Whether a declared length is acceptable
    pub fn accepts(self, length: u8) -> bool {
        match self {
            LengthPolicy::Fixed(expected) => length == expected,
            LengthPolicy::AtMost(max) => length <= max,
            LengthPolicy::Any => true,
        }
    }
}

/// Parameters for one call to [`decode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DecodeRequest {
    /// Opcode the response must carry
    pub opcode: u8,
    /// Accepted payload lengths
    pub length: LengthPolicy,
    /// Timeout budget
    pub timeouts: Timeouts,
}

impl DecodeRequest {
    /// Request with the default timeouts
    pub fn new(opcode: u8, length: LengthPolicy) -> Self {
        Self {
            opcode,
            length,
            timeouts: Timeouts::default(),
        }
    }

    /// Replace the timeout budget
    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }
}

/// Why a response could not be obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError<E> {
    /// No byte arrived within the idle window
    ByteTimeout,
    /// The response took longer than the total budget
    TotalTimeout,
    /// A complete frame arrived but its checksum was wrong
    ChecksumMismatch,
    /// The payload could not be interpreted as the requested type
    Malformed,
    /// The transport reported an error
    Uart(E),
}

impl<E: fmt::Debug> fmt::Display for DecodeError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::ByteTimeout => f.write_str("timed out waiting for next byte"),
            DecodeError::TotalTimeout => f.write_str("timed out waiting for response"),
            DecodeError::ChecksumMismatch => f.write_str("response checksum mismatch"),
            DecodeError::Malformed => f.write_str("malformed response payload"),
            DecodeError::Uart(e) => write!(f, "uart error: {:?}", e),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Discarding bytes until START
    SeekStart,
    /// Got START, opcode must match
    MatchOpcode,
    /// Got opcode, waiting for LENGTH
    ReadLength,
    /// Reading payload bytes
    ReadPayload,
    /// Waiting for CHECKSUM
    ReadChecksum,
}

/// Per-call parse state
///
/// Built fresh by every [`decode`] call and dropped when it returns, so an
/// aborted exchange never leaks into the next one.
#[derive(Debug)]
pub(crate) struct Cursor {
    state: State,
    opcode: u8,
    policy: LengthPolicy,
    checksum: Checksum,
    length: u8,
    buffer: Payload,
}

impl Cursor {
    pub(crate) fn new(opcode: u8, policy: LengthPolicy) -> Self {
        Self {
            state: State::SeekStart,
            opcode,
            policy,
            checksum: Checksum::new(),
            length: 0,
            buffer: Payload::new(),
        }
    }

    fn resync(&mut self) {
        self.state = State::SeekStart;
        self.checksum = Checksum::new();
        self.length = 0;
        self.buffer.clear();
    }

    /// Feed a single byte
    ///
    /// Returns `Ok(Some(payload))` once a complete valid frame is parsed,
    /// `Ok(None)` when more bytes are needed, or `Err` on checksum mismatch.
    pub(crate) fn feed(&mut self, byte: u8) -> Result<Option<Payload>, FrameError> {
        match self.state {
            State::SeekStart => {
                // Silently ignore non-START bytes while waiting
                if byte == FRAME_START {
                    self.checksum.push(byte);
                    self.state = State::MatchOpcode;
                }
                Ok(None)
            }
            State::MatchOpcode => {
                if byte != self.opcode {
                    // The rejected byte is dropped, not re-tested as START:
                    // a frame starting right here is missed until the next 0xAA.
                    #[cfg(feature = "defmt")]
                    defmt::trace!(
                        "resync: opcode {=u8:#x} ({}), want {=u8:#x}",
                        byte,
                        Opcode::from_byte(byte),
                        self.opcode
                    );
                    self.resync();
                    return Ok(None);
                }
                self.checksum.push(byte);
                self.state = State::ReadLength;
                Ok(None)
            }
            State::ReadLength => {
                if !self.policy.accepts(byte) {
                    #[cfg(feature = "defmt")]
                    defmt::trace!("resync: length {=u8} rejected", byte);
                    self.resync();
                    return Ok(None);
                }
                self.checksum.push(byte);
                self.length = byte;
                self.buffer.clear();
                self.state = if byte == 0 {
                    State::ReadChecksum
                } else {
                    State::ReadPayload
                };
                Ok(None)
            }
            State::ReadPayload => {
                // Cannot overflow: length is a u8 and capacity is 255
                let _ = self.buffer.push(byte);
                self.checksum.push(byte);
                if self.buffer.len() == self.length as usize {
                    self.state = State::ReadChecksum;
                }
                Ok(None)
            }
            State::ReadChecksum => {
                if byte != self.checksum.value() {
                    #[cfg(feature = "defmt")]
                    defmt::debug!(
                        "checksum mismatch: got {=u8:#x}, computed {=u8:#x}",
                        byte,
                        self.checksum.value()
                    );
                    return Err(FrameError::InvalidChecksum);
                }
                Ok(Some(core::mem::take(&mut self.buffer)))
            }
        }
    }
}

/// Block until a byte is available, or a timeout expires
///
/// The idle window restarts on every call; the total window is measured
/// from `started`. Whichever runs out first decides the error.
fn wait_byte<R, C>(
    rx: &mut R,
    clock: &C,
    started: u64,
    timeouts: Timeouts,
) -> Result<u8, DecodeError<R::Error>>
where
    R: UartRx + ?Sized,
    C: Clock + ?Sized,
{
    let idle_since = clock.now_ms();
    loop {
        if rx.read_ready().map_err(DecodeError::Uart)? {
            return rx.read_byte().map_err(DecodeError::Uart);
        }
        let now = clock.now_ms();
        if now.saturating_sub(started) > u64::from(timeouts.total_ms) {
            return Err(DecodeError::TotalTimeout);
        }
        if now.saturating_sub(idle_since) >= u64::from(timeouts.byte_ms) {
            return Err(DecodeError::ByteTimeout);
        }
    }
}

/// Read one response frame
///
/// Returns the payload of the first frame that carries the requested opcode,
/// has an acceptable length, and passes the checksum. Bytes that do not fit
/// are discarded.
pub fn decode<R, C>(
    rx: &mut R,
    clock: &C,
    request: &DecodeRequest,
) -> Result<Payload, DecodeError<R::Error>>
where
    R: UartRx + ?Sized,
    C: Clock + ?Sized,
{
    let started = clock.now_ms();
    let mut cursor = Cursor::new(request.opcode, request.length);

    loop {
        let byte = match wait_byte(rx, clock, started, request.timeouts) {
            Ok(byte) => byte,
            Err(e) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("rx op={=u8:#x}: no response", request.opcode);
                return Err(e);
            }
        };

        let fed = cursor.feed(byte);

        if clock.elapsed_ms(started) > u64::from(request.timeouts.total_ms) {
            #[cfg(feature = "defmt")]
            defmt::warn!("rx op={=u8:#x}: total timeout", request.opcode);
            return Err(DecodeError::TotalTimeout);
        }

        match fed {
            Ok(Some(payload)) => {
                #[cfg(feature = "defmt")]
                defmt::trace!(
                    "rx frame op={=u8:#x} len={=usize}",
                    request.opcode,
                    payload.len()
                );
                return Ok(payload);
            }
            Ok(None) => {}
            Err(_) => return Err(DecodeError::ChecksumMismatch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;
    use tunelink_hal::mock::{MockClock, MockError, MockUart};

    fn feed_all(cursor: &mut Cursor, bytes: &[u8]) -> Result<Option<Payload>, FrameError> {
        for &byte in bytes {
            if let Some(payload) = cursor.feed(byte)? {
                return Ok(Some(payload));
            }
        }
        Ok(None)
    }

    fn run(bytes: &[u8], request: DecodeRequest) -> Result<Payload, DecodeError<MockError>> {
        let mut uart = MockUart::with_rx(bytes).unwrap();
        let clock = MockClock::new(1);
        decode(&mut uart, &clock, &request)
    }

    #[test]
    fn test_file_number_checksum_mismatch() {
        let request = DecodeRequest::new(0x0D, LengthPolicy::Fixed(2));
        let result = run(&[0xAA, 0x0D, 0x02, 0x00, 0x07, 0xB9], request);
        assert_eq!(result, Err(DecodeError::ChecksumMismatch));

        // 0xAA + 0x0D + 0x02 + 0x00 + 0x07 = 0xC0, so 0xB8 is wrong too
        let result = run(&[0xAA, 0x0D, 0x02, 0x00, 0x07, 0xB8], request);
        assert_eq!(result, Err(DecodeError::ChecksumMismatch));
    }

    #[test]
    fn test_file_number_valid() {
        let request = DecodeRequest::new(0x0D, LengthPolicy::Fixed(2));
        let payload = run(&[0xAA, 0x0D, 0x02, 0x00, 0x07, 0xC0], request).unwrap();
        assert_eq!(payload.as_slice(), &[0x00, 0x07]);
        assert_eq!(u16::from_be_bytes([payload[0], payload[1]]), 7);
    }

    #[test]
    fn test_zero_length_frame() {
        let frame = Frame::empty(0x1C).encode_to_vec().unwrap();
        let request = DecodeRequest::new(0x1C, LengthPolicy::Fixed(0));
        let payload = run(&frame, request).unwrap();
        assert!(payload.is_empty());
    }

    #[test]
    fn test_resync_after_garbage() {
        let mut stream = heapless::Vec::<u8, 32>::new();
        stream.extend_from_slice(&[0x00, 0xFF, 0x12, 0x34]).unwrap();
        stream
            .extend_from_slice(&Frame::new(0x01, &[0x01]).unwrap().encode_to_vec().unwrap())
            .unwrap();

        let request = DecodeRequest::new(0x01, LengthPolicy::Fixed(1));
        assert_eq!(run(&stream, request).unwrap().as_slice(), &[0x01]);
    }

    #[test]
    fn test_wrong_opcode_frame_is_skipped() {
        let mut stream = heapless::Vec::<u8, 32>::new();
        // A runtime report arrives before the answer we want
        stream
            .extend_from_slice(&Frame::new(0x25, &[0, 1, 2]).unwrap().encode_to_vec().unwrap())
            .unwrap();
        stream
            .extend_from_slice(&Frame::new(0x24, &[0, 3, 20]).unwrap().encode_to_vec().unwrap())
            .unwrap();

        let request = DecodeRequest::new(0x24, LengthPolicy::Fixed(3));
        assert_eq!(run(&stream, request).unwrap().as_slice(), &[0, 3, 20]);
    }

    #[test]
    fn test_wrong_length_frame_is_skipped() {
        let mut stream = heapless::Vec::<u8, 32>::new();
        stream
            .extend_from_slice(&Frame::new(0x0C, &[9]).unwrap().encode_to_vec().unwrap())
            .unwrap();
        stream
            .extend_from_slice(&Frame::new(0x0C, &[0x01, 0x02]).unwrap().encode_to_vec().unwrap())
            .unwrap();

        let request = DecodeRequest::new(0x0C, LengthPolicy::Fixed(2));
        assert_eq!(run(&stream, request).unwrap().as_slice(), &[0x01, 0x02]);
    }

    #[test]
    fn test_at_most_policy() {
        let policy = LengthPolicy::AtMost(4);
        assert!(policy.accepts(0));
        assert!(policy.accepts(4));
        assert!(!policy.accepts(5));
        assert!(LengthPolicy::Any.accepts(255));
        assert!(!LengthPolicy::Fixed(2).accepts(3));
    }

    #[test]
    fn test_mismatched_opcode_is_not_reused_as_start() {
        // 0xAA 0xAA 0x01 ...: the second 0xAA is eaten as a bad opcode
        let mut cursor = Cursor::new(0x01, LengthPolicy::Fixed(1));
        let mut stream = heapless::Vec::<u8, 16>::new();
        stream.push(FRAME_START).unwrap();
        stream
            .extend_from_slice(&Frame::new(0x01, &[0x02]).unwrap().encode_to_vec().unwrap())
            .unwrap();
        assert_eq!(feed_all(&mut cursor, &stream), Ok(None));
    }

    #[test]
    fn test_cursor_reports_bad_checksum() {
        let mut cursor = Cursor::new(0x1E, LengthPolicy::Any);
        let mut encoded = Frame::new(0x1E, b"TEST    WAV").unwrap().encode_to_vec().unwrap();
        let last = encoded.len() - 1;
        encoded[last] ^= 0xFF;
        assert_eq!(feed_all(&mut cursor, &encoded), Err(FrameError::InvalidChecksum));
    }

    #[test]
    fn test_silence_gives_byte_timeout() {
        let mut uart = MockUart::new();
        let clock = MockClock::new(1);
        let request = DecodeRequest::new(0x01, LengthPolicy::Fixed(1));

        assert_eq!(decode(&mut uart, &clock, &request), Err(DecodeError::ByteTimeout));
        let elapsed = clock.peek();
        assert!((100..=110).contains(&elapsed), "elapsed {}", elapsed);
    }

    #[test]
    fn test_silence_never_outlasts_total_budget() {
        let mut uart = MockUart::new();
        let clock = MockClock::new(1);
        let request = DecodeRequest::new(0x01, LengthPolicy::Fixed(1)).with_timeouts(Timeouts {
            byte_ms: 1000,
            total_ms: 200,
        });

        assert_eq!(decode(&mut uart, &clock, &request), Err(DecodeError::TotalTimeout));
        assert!(clock.peek() <= 210);
    }

    #[test]
    fn test_steady_noise_gives_total_timeout() {
        let noise = [0x55u8; 200];
        let mut uart = MockUart::with_rx(&noise).unwrap();
        let clock = MockClock::new(5);
        let request = DecodeRequest::new(0x01, LengthPolicy::Fixed(1));

        assert_eq!(decode(&mut uart, &clock, &request), Err(DecodeError::TotalTimeout));
        assert!(uart.pending() > 0);
    }

    #[test]
    fn test_late_checksum_byte_gives_total_timeout() {
        // Clock reads: start, then idle + elapsed per byte. With a 10 ms
        // step the elapsed checks land at 20, 40, ... 120; only the
        // checksum byte (sixth) is past 115.
        let frame = [0xAA, 0x0D, 0x02, 0x00, 0x07, 0xC0];
        let request = DecodeRequest::new(0x0D, LengthPolicy::Fixed(2)).with_timeouts(Timeouts {
            byte_ms: 100,
            total_ms: 115,
        });

        let mut uart = MockUart::with_rx(&frame).unwrap();
        let clock = MockClock::new(10);
        assert_eq!(decode(&mut uart, &clock, &request), Err(DecodeError::TotalTimeout));
        assert_eq!(uart.pending(), 0);
        assert_eq!(clock.peek(), 130);

        // Same frame finishing exactly on the budget is accepted
        let request = request.with_timeouts(Timeouts {
            byte_ms: 100,
            total_ms: 120,
        });
        let mut uart = MockUart::with_rx(&frame).unwrap();
        let clock = MockClock::new(10);
        let payload = decode(&mut uart, &clock, &request).unwrap();
        assert_eq!(payload.as_slice(), &[0x00, 0x07]);
    }

    #[test]
    fn test_each_call_starts_fresh() {
        // First call sees a truncated frame and times out mid-payload
        let mut uart = MockUart::with_rx(&[0xAA, 0x0D, 0x02, 0x00]).unwrap();
        let clock = MockClock::new(1);
        let request = DecodeRequest::new(0x0D, LengthPolicy::Fixed(2));
        assert_eq!(decode(&mut uart, &clock, &request), Err(DecodeError::ByteTimeout));

        // Second call must not continue the half-read frame
        uart.push_rx(&Frame::new(0x0D, &[0x00, 0x2A]).unwrap().encode_to_vec().unwrap())
            .unwrap();
        let payload = decode(&mut uart, &clock, &request).unwrap();
        assert_eq!(payload.as_slice(), &[0x00, 0x2A]);
    }

    #[test]
    fn test_uart_error_is_reported() {
        struct Broken;
        impl tunelink_hal::ErrorType for Broken {
            type Error = ();
        }
        impl UartRx for Broken {
            fn read_ready(&mut self) -> Result<bool, ()> {
                Err(())
            }
            fn read_byte(&mut self) -> Result<u8, ()> {
                Err(())
            }
        }

        let clock = MockClock::new(1);
        let request = DecodeRequest::new(0x01, LengthPolicy::Fixed(1));
        assert_eq!(decode(&mut Broken, &clock, &request), Err(DecodeError::Uart(())));
    }
}
