use log::{debug, error, warn};
use std::time::Duration;

use crate::command::{Command, DemodulatorParams, ErrorCode, IfAmpGain, MixerGain, ModuleInfo, Region};
use crate::frame::{self, DecodedFrames, Frame};
use crate::transport::RfidTransport;
use crate::types::{ErrorReport, InventoryReport, TagPool, UhfError};

// Leading byte of the multi-poll parameter block
const MULTI_POLL_RESERVED: u8 = 0x22;
const READ_CHUNK: usize = 512;

/// Result of a multi-poll inventory.
///
/// A device-reported error next to a non-empty pool is a normal outcome:
/// the reader reports failed rounds while other rounds still saw tags.
#[derive(Debug)]
pub struct TagRead {
    pub pool: TagPool,
    /// Inventory frames kept out of the pool (bad checksum or short payload)
    pub rejected: Vec<Frame>,
    pub error: Option<UhfError>,
}

impl TagRead {
    /// Keep the pool only if no error was reported
    pub fn into_result(self) -> Result<TagPool, UhfError> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.pool),
        }
    }
}

/// Session with an R200 reader over an exclusively owned transport.
///
/// Every operation is a blocking send followed by a single drain of the
/// transport; nothing is retried.
pub struct R200<T: RfidTransport> {
    transport: T,
    read_timeout: Duration,
    poll_rounds: u8,
}

impl<T: RfidTransport> R200<T> {
    pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(1);
    pub const DEFAULT_POLL_ROUNDS: u8 = 10;

    /// Create a session over an already configured transport
    pub fn open(transport: T, read_timeout: Duration) -> Self {
        Self {
            transport,
            read_timeout,
            poll_rounds: Self::DEFAULT_POLL_ROUNDS,
        }
    }

    /// Set the number of inventory rounds requested by `read_tags`, capped at 255
    pub fn with_poll_rounds(mut self, rounds: u32) -> Self {
        self.poll_rounds = u8::try_from(rounds).unwrap_or(u8::MAX);
        self
    }

    pub fn poll_rounds(&self) -> u8 {
        self.poll_rounds
    }

    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// Close the underlying transport
    pub fn close(mut self) -> Result<(), UhfError> {
        self.transport
            .close()
            .map_err(|e| UhfError::Transport(format!("{:?}", e)))
    }

    /// Give back the transport without closing it
    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Encode and write a command frame
    pub fn send(&mut self, command: impl Into<u8>, params: &[u8]) -> Result<(), UhfError> {
        let frame = frame::encode(command.into(), params)?;
        debug!("Sending command: {:02X?}", frame);
        let written = self
            .transport
            .write(&frame)
            .map_err(|e| UhfError::Transport(format!("{:?}", e)))?;
        if written != frame.len() {
            return Err(UhfError::ShortWrite {
                written,
                expected: frame.len(),
            });
        }
        Ok(())
    }

    /// Drain the transport until a read times out, then split what arrived into frames.
    ///
    /// The drain is unbounded: a reader that keeps streaming keeps the buffer growing.
    pub fn receive(&mut self) -> Result<DecodedFrames, UhfError> {
        self.transport
            .set_read_timeout(self.read_timeout)
            .map_err(|e| UhfError::Transport(format!("{:?}", e)))?;

        let mut buffer = Vec::new();
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            match self.transport.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => buffer.extend_from_slice(&chunk[..n]),
                Err(e) => {
                    error!("Read error: {:?}", e);
                    return Err(UhfError::Transport(format!("{:?}", e)));
                }
            }
        }
        debug!("Received {} bytes: {:02X?}", buffer.len(), buffer);

        let decoded = frame::decode(&buffer);
        if let Some(e) = &decoded.error {
            warn!("Unparseable bytes after {} frames: {}", decoded.frames.len(), e);
        }
        Ok(decoded)
    }

    /// Run a multi-poll inventory and collect one report per EPC.
    ///
    /// Device errors do not stop processing of the remaining frames; the last
    /// one seen is returned next to the pool. Without a device error, a
    /// rejected inventory frame or unparseable trailing bytes become the error.
    pub fn read_tags(&mut self) -> Result<TagRead, UhfError> {
        self.send(
            Command::MultiplePoll,
            &[MULTI_POLL_RESERVED, 0x00, self.poll_rounds],
        )?;
        let decoded = self.receive()?;

        let mut pool = TagPool::new();
        let mut rejected = Vec::new();
        let mut reader_error = None;
        let mut frame_error = None;
        for frame in decoded.frames {
            if frame.is(Command::SinglePoll) {
                match Self::inventory_report(&frame) {
                    Ok(report) => {
                        pool.insert(report);
                    }
                    Err(e) => {
                        frame_error = Some(e);
                        rejected.push(frame);
                    }
                }
            } else if frame.is(Command::ExecutionFailure) {
                let report = ErrorReport::parse(&frame.parameters);
                debug!("Reader reported: {}", report);
                reader_error = Some(report);
            }
        }

        let error = match (reader_error, frame_error, decoded.error) {
            (Some(report), _, _) => Some(UhfError::Reader(report)),
            (None, Some(e), _) => Some(e),
            (None, None, Some(e)) => Some(UhfError::Frame(e)),
            (None, None, None) => None,
        };
        Ok(TagRead {
            pool,
            rejected,
            error,
        })
    }

    /// Poll once for a single tag
    pub fn single_poll(&mut self) -> Result<Option<InventoryReport>, UhfError> {
        self.send(Command::SinglePoll, &[])?;
        let decoded = self.receive()?;

        let mut rejected = None;
        for frame in &decoded.frames {
            if frame.is(Command::SinglePoll) {
                match Self::inventory_report(frame) {
                    Ok(report) => return Ok(Some(report)),
                    Err(e) => rejected = Some(e),
                }
            } else if frame.is(Command::ExecutionFailure) {
                let report = ErrorReport::parse(&frame.parameters);
                return match report.kind() {
                    Some(ErrorCode::InventoryFail) => Ok(None),
                    _ => Err(UhfError::Reader(report)),
                };
            }
        }

        if let Some(e) = rejected {
            return Err(e);
        }
        match decoded.error {
            Some(e) => Err(e.into()),
            None if decoded.frames.is_empty() => {
                Err(UhfError::InvalidResponse("No response to single poll".into()))
            }
            None => Ok(None),
        }
    }

    /// Stop a running multi-poll
    pub fn stop_multi_poll(&mut self) -> Result<(), UhfError> {
        let frame = self.transact(Command::StopMultiplePoll, &[])?;
        Self::expect_success(&frame, "stop multiple poll")
    }

    /// Read a module information string
    pub fn module_info(&mut self, kind: ModuleInfo) -> Result<String, UhfError> {
        let frame = self.transact(Command::GetModuleInfo, &[kind as u8])?;
        match frame.parameters.split_first() {
            Some((_, info)) => Ok(String::from_utf8_lossy(info).to_string()),
            None => Err(UhfError::InvalidResponse("Empty module info response".into())),
        }
    }

    /// Get current operating region
    pub fn work_area(&mut self) -> Result<Region, UhfError> {
        let frame = self.transact(Command::GetWorkArea, &[])?;
        let code = Self::first_param(&frame, "work area")?;
        Region::try_from(code)
            .map_err(|_| UhfError::InvalidResponse(format!("Unknown region code: 0x{:02X}", code)))
    }

    /// Set operating region
    ///
    /// The region must match local regulations.
    pub fn set_work_area(&mut self, region: Region) -> Result<(), UhfError> {
        let frame = self.transact(Command::SetWorkArea, &[region as u8])?;
        Self::expect_success(&frame, "set work area")
    }

    /// Get current working channel index
    pub fn channel(&mut self) -> Result<u8, UhfError> {
        let frame = self.transact(Command::GetWorkingChannel, &[])?;
        Self::first_param(&frame, "working channel")
    }

    /// Set working channel index
    ///
    /// The valid channel range depends on the configured region.
    pub fn set_channel(&mut self, channel: u8) -> Result<(), UhfError> {
        let frame = self.transact(Command::SetWorkingChannel, &[channel])?;
        Self::expect_success(&frame, "set working channel")
    }

    /// Get receiver demodulator parameters
    pub fn demodulator(&mut self) -> Result<DemodulatorParams, UhfError> {
        let frame = self.transact(Command::GetReceiverDemodulatorParameters, &[])?;
        let [mixer, if_gain, msb, lsb] = frame.parameters[..] else {
            return Err(UhfError::InvalidResponse(format!(
                "Demodulator response has {} parameter bytes, expected 4",
                frame.parameters.len()
            )));
        };

        Ok(DemodulatorParams {
            mixer_gain: MixerGain::try_from(mixer).map_err(|_| {
                UhfError::InvalidResponse(format!("Unknown mixer gain: 0x{:02X}", mixer))
            })?,
            if_gain: IfAmpGain::try_from(if_gain).map_err(|_| {
                UhfError::InvalidResponse(format!("Unknown IF amplifier gain: 0x{:02X}", if_gain))
            })?,
            threshold: u16::from_be_bytes([msb, lsb]),
        })
    }

    /// Set receiver demodulator parameters
    pub fn set_demodulator(&mut self, params: DemodulatorParams) -> Result<(), UhfError> {
        let frame = self.transact(Command::SetReceiverDemodulatorParameters, &params.to_bytes())?;
        Self::expect_success(&frame, "set demodulator parameters")
    }

    /// Send a command and pick the reply frame carrying the same opcode
    fn transact(&mut self, command: Command, params: &[u8]) -> Result<Frame, UhfError> {
        self.send(command, params)?;
        let decoded = self.receive()?;

        let mut failure = None;
        for frame in decoded.frames {
            if frame.is(command) {
                if !frame.checksum_valid {
                    return Err(UhfError::InvalidResponse(format!(
                        "Checksum mismatch in {:?} response",
                        command
                    )));
                }
                return Ok(frame);
            }
            if frame.is(Command::ExecutionFailure) {
                failure = Some(ErrorReport::parse(&frame.parameters));
            }
        }

        if let Some(report) = failure {
            return Err(UhfError::Reader(report));
        }
        if let Some(e) = decoded.error {
            return Err(e.into());
        }
        Err(UhfError::InvalidResponse(format!("No {:?} response", command)))
    }

    fn inventory_report(frame: &Frame) -> Result<InventoryReport, UhfError> {
        if !frame.checksum_valid {
            warn!("Rejecting inventory frame with bad checksum: {:02X?}", frame.parameters);
            return Err(UhfError::ChecksumMismatch {
                command: frame.command,
                checksum: frame.checksum,
            });
        }
        InventoryReport::parse(&frame.parameters).inspect_err(|e| {
            warn!("Failed to parse inventory frame: {}", e);
        })
    }

    fn first_param(frame: &Frame, what: &str) -> Result<u8, UhfError> {
        frame
            .parameters
            .first()
            .copied()
            .ok_or_else(|| UhfError::InvalidResponse(format!("Empty {} response", what)))
    }

    fn expect_success(frame: &Frame, what: &str) -> Result<(), UhfError> {
        match frame.parameters.first().copied() {
            Some(0x00) => Ok(()),
            Some(status) => Err(UhfError::InvalidResponse(format!(
                "Failed to {}: status 0x{:02X}",
                what, status
            ))),
            None => Err(UhfError::InvalidResponse(format!("Failed to {}", what))),
        }
    }
}
