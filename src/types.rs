//! Types for RFID operations

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::command::ErrorCode;
use crate::frame::FrameError;

/// Length of the EPC identifier carried in an inventory report
pub const EPC_LEN: usize = 12;

/// RSSI(1) + PC(2) + EPC(12) + CRC(2)
pub const INVENTORY_PAYLOAD_LEN: usize = 1 + 2 + EPC_LEN + 2;

/// Errors that can occur during RFID operations
#[derive(Debug, Error)]
pub enum UhfError {
    /// Transport layer error (UART, serial, etc.)
    #[error("transport error: {0}")]
    Transport(String),

    /// The transport accepted fewer bytes than the frame holds
    #[error("short write: {written} of {expected} bytes")]
    ShortWrite { written: usize, expected: usize },

    /// Parameter block does not fit the 16-bit length field
    #[error("parameter block of {len} bytes exceeds the 65535 byte frame limit")]
    Encoding { len: usize },

    /// Received bytes could not be split into frames
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// Frame checksum did not match its contents
    #[error("checksum mismatch in frame for command 0x{command:02X} (received 0x{checksum:02X})")]
    ChecksumMismatch { command: u8, checksum: u8 },

    /// Inventory payload shorter than the fixed report layout
    #[error("inventory payload too short: {len} bytes, expected 17")]
    PayloadTooShort { len: usize },

    /// The reader answered with an execution-failure frame
    #[error("reader error: {0}")]
    Reader(ErrorReport),

    /// Invalid parameter passed to a function
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Invalid response received from the reader
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Convert bytes to uppercase hex string
pub(crate) fn bytes_to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02X}", b)).collect()
}

/// Fixed-width tag identifier, compared byte for byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Epc(pub [u8; EPC_LEN]);

impl Epc {
    pub fn as_bytes(&self) -> &[u8; EPC_LEN] {
        &self.0
    }
}

impl fmt::Display for Epc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bytes_to_hex(&self.0))
    }
}

impl FromStr for Epc {
    type Err = UhfError;

    /// Parse from hex, either case
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != EPC_LEN * 2 || !s.is_ascii() {
            return Err(UhfError::InvalidParameter(format!(
                "EPC must be {} hex digits, got {:?}",
                EPC_LEN * 2,
                s
            )));
        }

        let mut bytes = [0u8; EPC_LEN];
        for (i, byte) in bytes.iter_mut().enumerate() {
            let digits = &s[i * 2..i * 2 + 2];
            *byte = u8::from_str_radix(digits, 16).map_err(|_| {
                UhfError::InvalidParameter(format!("Invalid hex digits {:?} in EPC", digits))
            })?;
        }
        Ok(Epc(bytes))
    }
}

/// Tag report carried by a single-poll response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryReport {
    pub rssi: u8,
    /// Protocol control word
    pub pc: u16,
    pub epc: Epc,
    pub crc: u16,
}

impl InventoryReport {
    /// Decode the parameter bytes of a single-poll response
    pub fn parse(params: &[u8]) -> Result<Self, UhfError> {
        if params.len() < INVENTORY_PAYLOAD_LEN {
            return Err(UhfError::PayloadTooShort { len: params.len() });
        }

        let mut epc = [0u8; EPC_LEN];
        epc.copy_from_slice(&params[3..3 + EPC_LEN]);

        Ok(Self {
            rssi: params[0],
            pc: u16::from_be_bytes([params[1], params[2]]),
            epc: Epc(epc),
            crc: u16::from_be_bytes([params[15], params[16]]),
        })
    }
}

/// Decoded execution-failure frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    pub code: u8,
    pub message: String,
}

impl ErrorReport {
    /// Decode the parameters of an execution-failure frame. Never fails.
    pub fn parse(error_bytes: &[u8]) -> Self {
        let Some(&code) = error_bytes.first() else {
            return Self {
                code: 0x00,
                message: "Error report without error code".into(),
            };
        };

        let message = match ErrorCode::try_from(code) {
            Ok(kind) => kind.message().to_string(),
            Err(_) => format!("Unknown error 0x{:02X}", code),
        };
        Self { code, message }
    }

    /// The known error kind, if the code is one the reader documents
    pub fn kind(&self) -> Option<ErrorCode> {
        ErrorCode::try_from(self.code).ok()
    }
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:02X})", self.message, self.code)
    }
}

/// Inventory reports with unique EPCs, in the order they were first seen
#[derive(Debug, Clone, Default)]
pub struct TagPool {
    reports: Vec<InventoryReport>,
    seen: HashSet<Epc>,
}

impl TagPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a report unless one with the same EPC is already present.
    /// Returns whether the report was added.
    pub fn insert(&mut self, report: InventoryReport) -> bool {
        if !self.seen.insert(report.epc) {
            return false;
        }
        self.reports.push(report);
        true
    }

    pub fn contains(&self, epc: &Epc) -> bool {
        self.seen.contains(epc)
    }

    pub fn get(&self, epc: &Epc) -> Option<&InventoryReport> {
        self.reports.iter().find(|r| &r.epc == epc)
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, InventoryReport> {
        self.reports.iter()
    }
}

impl IntoIterator for TagPool {
    type Item = InventoryReport;
    type IntoIter = std::vec::IntoIter<InventoryReport>;

    fn into_iter(self) -> Self::IntoIter {
        self.reports.into_iter()
    }
}

impl<'a> IntoIterator for &'a TagPool {
    type Item = &'a InventoryReport;
    type IntoIter = std::slice::Iter<'a, InventoryReport>;

    fn into_iter(self) -> Self::IntoIter {
        self.reports.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: [u8; 17] = [
        0xC8, // RSSI
        0x30, 0x00, // PC
        0xE2, 0x80, 0x69, 0x15, 0x00, 0x00, 0x50, 0x1D, 0x63, 0xE8, 0xF8, 0xE4, // EPC
        0x1A, 0x2B, // CRC
    ];

    #[test]
    fn test_inventory_report_parse() {
        let report = InventoryReport::parse(&PAYLOAD).unwrap();
        assert_eq!(report.rssi, 0xC8);
        assert_eq!(report.pc, 0x3000);
        assert_eq!(report.epc.to_string(), "E28069150000501D63E8F8E4");
        assert_eq!(report.crc, 0x1A2B);
    }

    #[test]
    fn test_inventory_report_ignores_extra_bytes() {
        let mut params = PAYLOAD.to_vec();
        params.extend_from_slice(&[0xFF, 0xFF]);
        let report = InventoryReport::parse(&params).unwrap();
        assert_eq!(report.crc, 0x1A2B);
    }

    #[test]
    fn test_inventory_report_too_short() {
        assert!(matches!(
            InventoryReport::parse(&PAYLOAD[..16]),
            Err(UhfError::PayloadTooShort { len: 16 })
        ));
        assert!(matches!(
            InventoryReport::parse(&[]),
            Err(UhfError::PayloadTooShort { len: 0 })
        ));
    }

    #[test]
    fn test_error_report_known_codes() {
        assert_eq!(ErrorReport::parse(&[0x15]).message, "No tags detected");
        assert_eq!(ErrorReport::parse(&[0x17]).message, "Can't execute command");
        assert_eq!(ErrorReport::parse(&[0x09]).message, "Read failed");
        assert_eq!(ErrorReport::parse(&[0x10]).message, "Write failed");
        assert_eq!(ErrorReport::parse(&[0x13]).message, "Lock failed");
        assert_eq!(ErrorReport::parse(&[0x12]).message, "Kill failed");
        assert_eq!(ErrorReport::parse(&[0x20]).message, "Frequency hopping failed");
        assert_eq!(ErrorReport::parse(&[0x16]).kind(), Some(ErrorCode::AccessFail));
    }

    #[test]
    fn test_error_report_unknown_code() {
        let report = ErrorReport::parse(&[0x42, 0x01, 0x02]);
        assert_eq!(report.code, 0x42);
        assert_eq!(report.message, "Unknown error 0x42");
        assert_eq!(report.kind(), None);
    }

    #[test]
    fn test_error_report_empty() {
        let report = ErrorReport::parse(&[]);
        assert_eq!(report.code, 0x00);
        assert!(report.kind().is_none());
    }

    #[test]
    fn test_epc_from_str() {
        let epc: Epc = "e28069150000501d63e8f8e4".parse().unwrap();
        assert_eq!(epc, InventoryReport::parse(&PAYLOAD).unwrap().epc);
        assert!("E280".parse::<Epc>().is_err());
        assert!("ZZ8069150000501D63E8F8E4".parse::<Epc>().is_err());
    }

    #[test]
    fn test_tag_pool_dedup() {
        let first = InventoryReport::parse(&PAYLOAD).unwrap();
        let mut again = first.clone();
        again.rssi = 0x10;
        let mut other = first.clone();
        other.epc.0[11] = 0x00;

        let mut pool = TagPool::new();
        assert!(pool.insert(first.clone()));
        assert!(!pool.insert(again));
        assert!(pool.insert(other.clone()));

        assert_eq!(pool.len(), 2);
        assert_eq!(pool.get(&first.epc).unwrap().rssi, 0xC8);
        assert!(pool.contains(&other.epc));
        let epcs: Vec<Epc> = pool.iter().map(|r| r.epc).collect();
        assert_eq!(epcs, vec![first.epc, other.epc]);
    }

    #[test]
    fn test_bytes_to_hex() {
        assert_eq!(bytes_to_hex(&[0xDE, 0xAD, 0xBE, 0xEF]), "DEADBEEF");
        assert_eq!(bytes_to_hex(&[0x00, 0x01, 0x0A, 0xFF]), "00010AFF");
        assert_eq!(bytes_to_hex(&[]), "");
    }
}
