//! UART transport for ESP32 using esp-idf-svc

use crate::transport::RfidTransport;
use esp_idf_svc::hal::delay::TickType;
use esp_idf_svc::hal::gpio::{self, InputPin, OutputPin};
use esp_idf_svc::hal::peripheral::Peripheral;
use esp_idf_svc::hal::uart::{self, UartDriver};
use std::time::Duration;

pub struct UartTransport<'a> {
    uart: UartDriver<'a>,
    // read timeout in FreeRTOS ticks
    timeout_ticks: u32,
}

impl<'a> UartTransport<'a> {
    /// Set up the UART as 8N1 without flow control
    pub fn new(
        uart: impl Peripheral<P = impl uart::Uart> + 'a,
        tx: impl Peripheral<P = impl OutputPin> + 'a,
        rx: impl Peripheral<P = impl InputPin> + 'a,
        baud_rate: u32,
        read_timeout: Duration,
    ) -> Result<Self, esp_idf_svc::sys::EspError> {
        let config = uart::config::Config::default()
            .baudrate(baud_rate.into())
            .data_bits(uart::config::DataBits::DataBits8)
            .parity_none()
            .stop_bits(uart::config::StopBits::STOP1);
        let driver = UartDriver::new(
            uart,
            tx,
            rx,
            Option::<gpio::Gpio0>::None,
            Option::<gpio::Gpio0>::None,
            &config,
        )?;

        Ok(Self {
            uart: driver,
            timeout_ticks: TickType::from(read_timeout).ticks(),
        })
    }
}

impl RfidTransport for UartTransport<'_> {
    type Error = esp_idf_svc::sys::EspError;

    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error> {
        self.uart.write(data)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.uart.read(buf, self.timeout_ticks)
    }

    fn set_read_timeout(&mut self, timeout: Duration) -> Result<(), Self::Error> {
        self.timeout_ticks = TickType::from(timeout).ticks();
        Ok(())
    }

    fn close(&mut self) -> Result<(), Self::Error> {
        self.uart.wait_tx_done(self.timeout_ticks)
    }
}
