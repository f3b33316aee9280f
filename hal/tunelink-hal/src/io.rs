//! Bridge from `embedded-io` serial ports
//!
//! Most HALs expose their UARTs through the blocking `embedded-io` traits.
//! [`IoUart`] adapts such a port to [`UartTx`]/[`UartRx`].

use embedded_io::{Read, ReadReady, Write};

use crate::uart::{ErrorType, UartRx, UartTx};

/// Error from an `embedded-io` backed UART
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IoError<E> {
    /// Error reported by the underlying port
    Io(E),
    /// The port reported ready but returned no data
    UnexpectedEof,
}

/// UART backed by an `embedded-io` port
#[derive(Debug)]
pub struct IoUart<T> {
    inner: T,
}

impl<T> IoUart<T> {
    /// Wrap a configured serial port
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    /// Borrow the underlying port
    pub fn inner(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Return the underlying port
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: embedded_io::ErrorType> ErrorType for IoUart<T> {
    type Error = IoError<T::Error>;
}

impl<T: Write> UartTx for IoUart<T> {
    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.inner.write_all(data).map_err(IoError::Io)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.inner.flush().map_err(IoError::Io)
    }
}

impl<T: Read + ReadReady> UartRx for IoUart<T> {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        self.inner.read_ready().map_err(IoError::Io)
    }

    fn read_byte(&mut self) -> Result<u8, Self::Error> {
        let mut buf = [0u8; 1];
        match self.inner.read(&mut buf).map_err(IoError::Io)? {
            0 => Err(IoError::UnexpectedEof),
            _ => Ok(buf[0]),
        }
    }
}
