//! Scripted transport for host tests
//!
//! [`MockUart`] replays a queue of received bytes and records everything
//! written. [`MockClock`] advances by a fixed step on every read, so a
//! polling loop always makes progress towards its deadline.

use core::cell::Cell;

use heapless::{Deque, Vec};

use crate::clock::Clock;
use crate::uart::{ErrorType, UartRx, UartTx};

/// Capacity of the receive queue and the transmit log
pub const MOCK_CAPACITY: usize = 1024;

/// Error from the mock UART
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MockError {
    /// Read attempted with nothing queued
    RxEmpty,
    /// Receive queue is full
    RxFull,
    /// Transmit log is full
    TxFull,
}

/// UART with a scripted receive queue and a captured transmit log
#[derive(Debug, Default)]
pub struct MockUart {
    rx: Deque<u8, MOCK_CAPACITY>,
    tx: Vec<u8, MOCK_CAPACITY>,
}

impl MockUart {
    /// Create an idle UART (nothing to receive)
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a UART that will deliver `bytes`
    pub fn with_rx(bytes: &[u8]) -> Result<Self, MockError> {
        let mut uart = Self::new();
        uart.push_rx(bytes)?;
        Ok(uart)
    }

    /// Queue more bytes for the receiver
    pub fn push_rx(&mut self, bytes: &[u8]) -> Result<(), MockError> {
        for &byte in bytes {
            self.rx.push_back(byte).map_err(|_| MockError::RxFull)?;
        }
        Ok(())
    }

    /// Number of queued bytes not yet read
    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    /// Everything written so far
    pub fn sent(&self) -> &[u8] {
        &self.tx
    }

    /// Forget the transmit log
    pub fn clear_sent(&mut self) {
        self.tx.clear();
    }
}

impl ErrorType for MockUart {
    type Error = MockError;
}

impl UartTx for MockUart {
    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.tx
            .extend_from_slice(data)
            .map_err(|_| MockError::TxFull)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl UartRx for MockUart {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.rx.is_empty())
    }

    fn read_byte(&mut self) -> Result<u8, Self::Error> {
        self.rx.pop_front().ok_or(MockError::RxEmpty)
    }
}

/// Clock that advances `step_ms` every time it is read
#[derive(Debug)]
pub struct MockClock {
    now: Cell<u64>,
    step_ms: u64,
}

impl MockClock {
    /// Create a clock starting at 0
    pub fn new(step_ms: u64) -> Self {
        Self {
            now: Cell::new(0),
            step_ms,
        }
    }

    /// Jump forward without counting as a read
    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }

    /// Current time without advancing
    pub fn peek(&self) -> u64 {
        self.now.get()
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        let now = self.now.get();
        self.now.set(now + self.step_ms);
        now
    }
}
