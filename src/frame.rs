//! Frame codec for the R200 serial protocol
//!
//! ```text
//! AA | type | command | len MSB | len LSB | params... | checksum | DD
//! ```
//!
//! The checksum is the 8-bit sum of every byte from `type` through the last
//! parameter. Frame boundaries come from the length field only; `0xDD` may
//! legitimately appear inside parameter data.

use log::warn;
use thiserror::Error;

use crate::command::Command;
use crate::types::UhfError;

pub const HEADER: u8 = 0xAA;
pub const END: u8 = 0xDD;

const TYPE_POS: usize = 1;
const COMMAND_POS: usize = 2;
const LEN_MSB_POS: usize = 3;
const LEN_LSB_POS: usize = 4;
const PARAM_POS: usize = 5;
// checksum + end byte
const TAIL_LEN: usize = 2;

/// Largest parameter block the 16-bit length field can describe
pub const MAX_PARAM_LEN: usize = u16::MAX as usize;

/// Frame type byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FrameType {
    Command = 0x00,
    Response = 0x01,
    Notification = 0x02,
}

impl TryFrom<u8> for FrameType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(FrameType::Command),
            0x01 => Ok(FrameType::Response),
            0x02 => Ok(FrameType::Notification),
            other => Err(other),
        }
    }
}

/// A single frame received from the reader
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub frame_type: FrameType,
    pub command: u8,
    pub parameters: Vec<u8>,
    /// Checksum byte as received
    pub checksum: u8,
    /// Whether `checksum` matches the sum recomputed over the frame
    pub checksum_valid: bool,
}

impl Frame {
    /// Check whether this frame carries the given opcode
    pub fn is(&self, command: Command) -> bool {
        self.command == command as u8
    }
}

/// Structural decode failures. Decoding stops at the first one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("expected frame header 0xAA at offset {offset}, found 0x{found:02X}")]
    MissingHeader { offset: usize, found: u8 },

    #[error("unexpected frame type 0x{frame_type:02X} at offset {offset}")]
    UnexpectedFrameType { offset: usize, frame_type: u8 },

    #[error("truncated frame at offset {offset}: {needed} bytes required, {available} available")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },
}

/// Sum of all bytes truncated to 8 bits
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

/// Build an outgoing command frame
pub fn encode(command: u8, params: &[u8]) -> Result<Vec<u8>, UhfError> {
    let param_len =
        u16::try_from(params.len()).map_err(|_| UhfError::Encoding { len: params.len() })?;
    let [msb, lsb] = param_len.to_be_bytes();

    let mut frame = Vec::with_capacity(PARAM_POS + params.len() + TAIL_LEN);
    frame.extend_from_slice(&[HEADER, FrameType::Command as u8, command, msb, lsb]);
    frame.extend_from_slice(params);
    let sum = checksum(&frame[TYPE_POS..]);
    frame.push(sum);
    frame.push(END);
    Ok(frame)
}

/// Cursor over a received buffer yielding one frame at a time.
///
/// After the first structural error the reader yields that error once and
/// then stops; it never scans forward looking for another header.
pub struct FrameReader<'a> {
    buf: &'a [u8],
    pos: usize,
    failed: bool,
}

impl<'a> FrameReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            failed: false,
        }
    }

    /// Offset of the next unread byte
    pub fn position(&self) -> usize {
        self.pos
    }

    fn next_frame(&mut self) -> Result<Frame, FrameError> {
        let offset = self.pos;
        let buf = self.buf;
        let rest = &buf[offset..];
        let truncated = |needed: usize| FrameError::Truncated {
            offset,
            needed,
            available: rest.len(),
        };

        if rest[0] != HEADER {
            return Err(FrameError::MissingHeader {
                offset,
                found: rest[0],
            });
        }

        let type_byte = *rest.get(TYPE_POS).ok_or_else(|| truncated(PARAM_POS + TAIL_LEN))?;
        let frame_type = match FrameType::try_from(type_byte) {
            Ok(t @ (FrameType::Response | FrameType::Notification)) => t,
            _ => {
                return Err(FrameError::UnexpectedFrameType {
                    offset,
                    frame_type: type_byte,
                });
            }
        };

        if rest.len() < PARAM_POS {
            return Err(truncated(PARAM_POS + TAIL_LEN));
        }
        let param_len = u16::from_be_bytes([rest[LEN_MSB_POS], rest[LEN_LSB_POS]]) as usize;
        let params_end = PARAM_POS + param_len;
        let frame_len = params_end + TAIL_LEN;
        if rest.len() < frame_len {
            return Err(truncated(frame_len));
        }

        let received = rest[params_end];
        let expected = checksum(&rest[TYPE_POS..params_end]);
        if rest[frame_len - 1] != END {
            warn!(
                "Frame at offset {} ends with 0x{:02X} instead of 0x{:02X}",
                offset,
                rest[frame_len - 1],
                END
            );
        }

        self.pos += frame_len;
        Ok(Frame {
            frame_type,
            command: rest[COMMAND_POS],
            parameters: rest[PARAM_POS..params_end].to_vec(),
            checksum: received,
            checksum_valid: received == expected,
        })
    }
}

impl Iterator for FrameReader<'_> {
    type Item = Result<Frame, FrameError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos >= self.buf.len() {
            return None;
        }
        let result = self.next_frame();
        self.failed = result.is_err();
        Some(result)
    }
}

/// Frames recovered from a buffer, plus the reason decoding stopped early, if it did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedFrames {
    pub frames: Vec<Frame>,
    pub error: Option<FrameError>,
}

impl DecodedFrames {
    /// True when the whole buffer was consumed
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    /// Discard partial results if decoding did not consume the whole buffer
    pub fn into_result(self) -> Result<Vec<Frame>, FrameError> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.frames),
        }
    }
}

/// Split a buffer into frames
pub fn decode(buf: &[u8]) -> DecodedFrames {
    let mut decoded = DecodedFrames::default();
    for item in FrameReader::new(buf) {
        match item {
            Ok(frame) => decoded.frames.push(frame),
            Err(e) => decoded.error = Some(e),
        }
    }
    decoded
}

/// Build a frame as the reader would send it
#[cfg(test)]
pub(crate) fn device_frame(frame_type: FrameType, command: u8, params: &[u8]) -> Vec<u8> {
    let mut frame = encode(command, params).unwrap();
    frame[TYPE_POS] = frame_type as u8;
    let sum_pos = frame.len() - TAIL_LEN;
    frame[sum_pos] = checksum(&frame[TYPE_POS..sum_pos]);
    frame
}
