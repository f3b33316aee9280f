//! One request/response exchange at a time
//!
//! [`Link`] owns the serial port and clock for a session. Every operation
//! takes `&mut self`, so only one exchange can be in flight. Nothing is
//! retried here; a failed query is reported once and the caller decides
//! what to do next.

use tunelink_hal::{Clock, UartRx, UartTx};

use crate::decoder::{decode, DecodeError, DecodeRequest, LengthPolicy, Timeouts};
use crate::frame::{write_frame, Payload};
use crate::response::Response;

/// Serial session with a module
pub struct Link<U, C> {
    uart: U,
    clock: C,
    timeouts: Timeouts,
}

impl<U, C> Link<U, C>
where
    U: UartTx + UartRx,
    C: Clock,
{
    /// Create a link over a configured port
    pub fn new(uart: U, clock: C, timeouts: Timeouts) -> Self {
        Self {
            uart,
            clock,
            timeouts,
        }
    }

    pub fn set_timeouts(&mut self, timeouts: Timeouts) {
        self.timeouts = timeouts;
    }

    /// Send one frame
    pub fn send(&mut self, opcode: u8, payload: &[u8]) -> Result<(), U::Error> {
        write_frame(&mut self.uart, opcode, payload)?;
        self.uart.flush()
    }

    /// Read one response frame
    pub fn receive(
        &mut self,
        opcode: u8,
        length: LengthPolicy,
    ) -> Result<Payload, DecodeError<U::Error>> {
        let request = DecodeRequest::new(opcode, length).with_timeouts(self.timeouts);
        decode(&mut self.uart, &self.clock, &request)
    }

    /// Wait for a frame the module sends on its own
    pub fn listen<T: Response>(&mut self, opcode: u8) -> Result<T, DecodeError<U::Error>> {
        self.listen_with(opcode, T::LENGTH)
    }

    /// Wait for a frame, accepting only lengths allowed by `length`
    ///
    /// `length` replaces the type's own policy; the payload must still
    /// convert to `T`.
    pub fn listen_with<T: Response>(
        &mut self,
        opcode: u8,
        length: LengthPolicy,
    ) -> Result<T, DecodeError<U::Error>> {
        let payload = self.receive(opcode, length)?;
        T::from_payload(&payload).ok_or(DecodeError::Malformed)
    }

    /// Send a query and read its answer
    pub fn query<T: Response>(
        &mut self,
        opcode: u8,
        payload: &[u8],
    ) -> Result<T, DecodeError<U::Error>> {
        self.query_with(opcode, payload, T::LENGTH)
    }

    /// Send a query and read an answer whose length is set by `length`
    pub fn query_with<T: Response>(
        &mut self,
        opcode: u8,
        payload: &[u8],
        length: LengthPolicy,
    ) -> Result<T, DecodeError<U::Error>> {
        self.send(opcode, payload).map_err(DecodeError::Uart)?;
        self.listen_with(opcode, length)
    }

    /// Borrow the serial port
    pub fn uart(&self) -> &U {
        &self.uart
    }

    /// End the session and hand back the port and clock
    pub fn release(self) -> (U, C) {
        (self.uart, self.clock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;
    use crate::response::{FileName, Timestamp};
    use tunelink_hal::mock::{MockClock, MockUart};

    fn link_with(rx: &[u8]) -> Link<MockUart, MockClock> {
        Link::new(
            MockUart::with_rx(rx).unwrap(),
            MockClock::new(1),
            Timeouts::default(),
        )
    }

    #[test]
    fn test_query_sends_request_then_decodes() {
        let reply = Frame::new(0x0C, &[0x01, 0x2C]).unwrap().encode_to_vec().unwrap();
        let mut link = link_with(&reply);

        let total: u16 = link.query(0x0C, &[]).unwrap();
        assert_eq!(total, 300);
        assert_eq!(link.uart().sent(), &[0xAA, 0x0C, 0x00, 0xB6]);
    }

    #[test]
    fn test_query_timestamp() {
        let reply = Frame::new(0x24, &[0, 4, 5]).unwrap().encode_to_vec().unwrap();
        let mut link = link_with(&reply);
        let ts: Timestamp = link.query(0x24, &[]).unwrap();
        assert_eq!(ts, Timestamp::new(0, 4, 5));
    }

    #[test]
    fn test_query_variable_length_name() {
        let reply = Frame::new(0x1E, b"01      MP3").unwrap().encode_to_vec().unwrap();
        let mut link = link_with(&reply);
        let name: FileName = link.query(0x1E, &[]).unwrap();
        assert_eq!(name.as_bytes(), b"01      MP3");
    }

    #[test]
    fn test_query_without_answer_times_out() {
        let mut link = link_with(&[]);
        let result: Result<u8, _> = link.query(0x01, &[]);
        assert_eq!(result, Err(DecodeError::ByteTimeout));
        // Request still went out
        assert_eq!(link.uart().sent().len(), 4);
    }

    #[test]
    fn test_listen_does_not_send() {
        let report = Frame::new(0x25, &[0, 0, 42]).unwrap().encode_to_vec().unwrap();
        let mut link = link_with(&report);
        let ts: Timestamp = link.listen(0x25).unwrap();
        assert_eq!(ts.seconds, 42);
        assert!(link.uart().sent().is_empty());
    }

    #[test]
    fn test_custom_timeouts_apply() {
        let mut link = link_with(&[]);
        link.set_timeouts(Timeouts {
            byte_ms: 20,
            total_ms: 50,
        });
        let result: Result<u16, _> = link.query(0x0D, &[]);
        assert_eq!(result, Err(DecodeError::ByteTimeout));
        let (_, clock) = link.release();
        assert!(clock.peek() < 40);
    }

    #[test]
    fn test_length_override_rejects_type_policy() {
        // Two-byte answer, but the caller only accepts one byte
        let reply = Frame::new(0x01, &[0x00, 0x05]).unwrap().encode_to_vec().unwrap();
        let mut link = link_with(&reply);
        let result: Result<u16, _> = link.query_with(0x01, &[], LengthPolicy::Fixed(1));
        assert_eq!(result, Err(DecodeError::ByteTimeout));
    }

    #[test]
    fn test_length_override_still_converts() {
        let reply = Frame::new(0x01, &[0x02]).unwrap().encode_to_vec().unwrap();
        let mut link = link_with(&reply);
        let result: Result<u16, _> = link.query_with(0x01, &[], LengthPolicy::Fixed(1));
        assert_eq!(result, Err(DecodeError::Malformed));
    }
}
