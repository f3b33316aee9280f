//! UART serial communication abstractions
//!
//! The protocol engine only needs byte-level access: write a run of bytes,
//! ask whether a byte is waiting, and take one byte. Baud rate and pin
//! setup belong to whoever constructs the port.

/// Error type shared by the transmit and receive halves
pub trait ErrorType {
    /// Error type for UART operations
    type Error: core::fmt::Debug;
}

impl<T: ErrorType + ?Sized> ErrorType for &mut T {
    type Error = T::Error;
}

/// UART transmitter
pub trait UartTx: ErrorType {
    /// Write data to the UART
    ///
    /// Blocks until all data has been handed to the peripheral or an error occurs.
    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Write a single byte to the UART
    fn write_byte(&mut self, byte: u8) -> Result<(), Self::Error> {
        self.write_blocking(&[byte])
    }

    /// Flush any buffered data
    fn flush(&mut self) -> Result<(), Self::Error>;
}

/// UART receiver
pub trait UartRx: ErrorType {
    /// Returns true if at least one byte can be read without blocking
    fn read_ready(&mut self) -> Result<bool, Self::Error>;

    /// Read a single byte from the UART
    ///
    /// Only called after [`UartRx::read_ready`] reported a byte.
    fn read_byte(&mut self) -> Result<u8, Self::Error>;
}

/// Combined UART interface
///
/// For UARTs that provide both TX and RX on a single peripheral.
pub trait Uart: UartTx + UartRx {}

// Blanket implementation
impl<T: UartTx + UartRx> Uart for T {}

impl<T: UartTx + ?Sized> UartTx for &mut T {
    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        T::write_blocking(self, data)
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), Self::Error> {
        T::write_byte(self, byte)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        T::flush(self)
    }
}

impl<T: UartRx + ?Sized> UartRx for &mut T {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        T::read_ready(self)
    }

    fn read_byte(&mut self) -> Result<u8, Self::Error> {
        T::read_byte(self)
    }
}
