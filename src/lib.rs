//! R200 UHF RFID reader driver with support for multiple transport backends.
//!
//! # Features
//!
//! - `uart-esp32` - UART transport for ESP32 using esp-idf-svc
//! - `serial` - Serial port transport for desktop using serialport crate
//!
//! # Example
//!
//! ```ignore
//! use r200_rfid::{R200, SerialTransport};
//!
//! let transport = SerialTransport::new("/dev/ttyUSB0", 115200)?;
//! let mut rfid = R200::open(transport, R200::<SerialTransport>::DEFAULT_READ_TIMEOUT)
//!     .with_poll_rounds(10);
//!
//! let read = rfid.read_tags()?;
//! for tag in &read.pool {
//!     println!("Found tag: {} (RSSI {})", tag.epc, tag.rssi);
//! }
//! if let Some(e) = read.error {
//!     println!("Reader said: {}", e);
//! }
//! ```

mod command;
mod frame;
mod reader;
mod transport;
mod types;

#[cfg(feature = "uart-esp32")]
mod uart;

#[cfg(feature = "serial")]
mod serial;

// Re-exports
pub use command::{Command, DemodulatorParams, ErrorCode, IfAmpGain, MixerGain, ModuleInfo, Region};
pub use frame::{
    DecodedFrames, Frame, FrameError, FrameReader, FrameType, MAX_PARAM_LEN, checksum, decode,
    encode,
};
pub use reader::{R200, TagRead};
pub use transport::RfidTransport;
pub use types::{EPC_LEN, Epc, ErrorReport, INVENTORY_PAYLOAD_LEN, InventoryReport, TagPool, UhfError};

#[cfg(feature = "uart-esp32")]
pub use uart::UartTransport;

#[cfg(feature = "serial")]
pub use serial::SerialTransport;
