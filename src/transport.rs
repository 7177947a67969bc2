use std::time::Duration;

/// Trait for RFID reader communication backends.
/// Implement this trait for different transports (UART, serial port, etc.)
///
/// A read that returns `Ok(0)` means no data arrived within the read timeout.
/// A disconnected channel must surface as an `Err`, never as `Ok(0)`.
pub trait RfidTransport {
    /// Error type for transport operations
    type Error: std::fmt::Debug;

    /// Write data to the transport, returning the number of bytes accepted
    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error>;

    /// Read whatever is available, waiting at most the configured read timeout
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Set how long a single `read` may block
    fn set_read_timeout(&mut self, timeout: Duration) -> Result<(), Self::Error>;

    /// Release the underlying channel
    fn close(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}
