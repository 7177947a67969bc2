//! Serial port transport for desktop using serialport crate

use crate::transport::RfidTransport;
use std::io::ErrorKind;
use std::time::Duration;

pub struct SerialTransport {
    port: Box<dyn serialport::SerialPort>,
}

impl SerialTransport {
    /// Open the port as 8N1 with a one second read timeout
    pub fn new(port_name: &str, baud_rate: u32) -> Result<Self, serialport::Error> {
        let port = serialport::new(port_name, baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .timeout(Duration::from_secs(1))
            .open()?;

        Ok(Self { port })
    }
}

impl RfidTransport for SerialTransport {
    type Error = std::io::Error;

    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error> {
        std::io::Write::write(&mut self.port, data)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        match std::io::Read::read(&mut self.port, buf) {
            // serialport reports an expired timeout as an error; the transport contract wants 0
            Err(e) if e.kind() == ErrorKind::TimedOut => Ok(0),
            other => other,
        }
    }

    fn set_read_timeout(&mut self, timeout: Duration) -> Result<(), Self::Error> {
        self.port.set_timeout(timeout).map_err(std::io::Error::other)
    }

    fn close(&mut self) -> Result<(), Self::Error> {
        std::io::Write::flush(&mut self.port)
    }
}
