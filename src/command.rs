//! Opcodes, error codes and parameter constant sets of the R200 protocol

/// Command opcodes understood by the reader module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Command {
    GetModuleInfo = 0x03,
    SetWorkArea = 0x07,
    GetWorkArea = 0x08,
    GetSelectParameter = 0x0B,
    SetSelectParameter = 0x0C,
    GetQueryParameters = 0x0D,
    SetQueryParameters = 0x0E,
    SetSendSelectInstruction = 0x12,
    ModuleSleep = 0x17,
    ControlIoPort = 0x1A,
    SetModuleIdleSleepTime = 0x1D,
    SinglePoll = 0x22,
    MultiplePoll = 0x27,
    StopMultiplePoll = 0x28,
    ReadLabel = 0x39,
    WriteLabel = 0x49,
    KillTag = 0x65,
    LockLabel = 0x82,
    GetWorkingChannel = 0xAA,
    SetWorkingChannel = 0xAB,
    SetAutoFrequencyHopping = 0xAD,
    SetTransmitContinuousCarrier = 0xB0,
    SetTransmitPower = 0xB6,
    AcquireTransmitPower = 0xB7,
    SetReceiverDemodulatorParameters = 0xF0,
    GetReceiverDemodulatorParameters = 0xF1,
    TestRfInputBlockingSignal = 0xF2,
    TestChannelRssi = 0xF3,
    ExecutionFailure = 0xFF,
}

impl From<Command> for u8 {
    fn from(command: Command) -> Self {
        command as u8
    }
}

impl TryFrom<u8> for Command {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        let command = match value {
            0x03 => Command::GetModuleInfo,
            0x07 => Command::SetWorkArea,
            0x08 => Command::GetWorkArea,
            0x0B => Command::GetSelectParameter,
            0x0C => Command::SetSelectParameter,
            0x0D => Command::GetQueryParameters,
            0x0E => Command::SetQueryParameters,
            0x12 => Command::SetSendSelectInstruction,
            0x17 => Command::ModuleSleep,
            0x1A => Command::ControlIoPort,
            0x1D => Command::SetModuleIdleSleepTime,
            0x22 => Command::SinglePoll,
            0x27 => Command::MultiplePoll,
            0x28 => Command::StopMultiplePoll,
            0x39 => Command::ReadLabel,
            0x49 => Command::WriteLabel,
            0x65 => Command::KillTag,
            0x82 => Command::LockLabel,
            0xAA => Command::GetWorkingChannel,
            0xAB => Command::SetWorkingChannel,
            0xAD => Command::SetAutoFrequencyHopping,
            0xB0 => Command::SetTransmitContinuousCarrier,
            0xB6 => Command::SetTransmitPower,
            0xB7 => Command::AcquireTransmitPower,
            0xF0 => Command::SetReceiverDemodulatorParameters,
            0xF1 => Command::GetReceiverDemodulatorParameters,
            0xF2 => Command::TestRfInputBlockingSignal,
            0xF3 => Command::TestChannelRssi,
            0xFF => Command::ExecutionFailure,
            other => return Err(other),
        };
        Ok(command)
    }
}

/// Error codes carried in the first parameter byte of an execution-failure frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorCode {
    ReadFail = 0x09,
    WriteFail = 0x10,
    KillFail = 0x12,
    LockFail = 0x13,
    InventoryFail = 0x15,
    AccessFail = 0x16,
    CommandError = 0x17,
    FhssFail = 0x20,
}

impl ErrorCode {
    /// Human-readable description of the failure
    pub fn message(self) -> &'static str {
        match self {
            ErrorCode::ReadFail => "Read failed",
            ErrorCode::WriteFail => "Write failed",
            ErrorCode::KillFail => "Kill failed",
            ErrorCode::LockFail => "Lock failed",
            ErrorCode::InventoryFail => "No tags detected",
            ErrorCode::AccessFail => "Access failed, wrong password",
            ErrorCode::CommandError => "Can't execute command",
            ErrorCode::FhssFail => "Frequency hopping failed",
        }
    }
}

impl TryFrom<u8> for ErrorCode {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x09 => Ok(ErrorCode::ReadFail),
            0x10 => Ok(ErrorCode::WriteFail),
            0x12 => Ok(ErrorCode::KillFail),
            0x13 => Ok(ErrorCode::LockFail),
            0x15 => Ok(ErrorCode::InventoryFail),
            0x16 => Ok(ErrorCode::AccessFail),
            0x17 => Ok(ErrorCode::CommandError),
            0x20 => Ok(ErrorCode::FhssFail),
            other => Err(other),
        }
    }
}

/// Operating region (work area) of the reader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Region {
    /// China 920-925 MHz
    China900 = 0x01,
    /// US 902-928 MHz
    Us = 0x02,
    /// Europe 865-868 MHz
    Europe = 0x03,
    /// China 840-845 MHz
    China800 = 0x04,
    /// Korea 917-923 MHz
    Korea = 0x06,
}

impl TryFrom<u8> for Region {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(Region::China900),
            0x02 => Ok(Region::Us),
            0x03 => Ok(Region::Europe),
            0x04 => Ok(Region::China800),
            0x06 => Ok(Region::Korea),
            other => Err(other),
        }
    }
}

/// Which module information string to request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ModuleInfo {
    Hardware = 0x00,
    Software = 0x01,
    Manufacturer = 0x02,
}

/// Receiver mixer gain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MixerGain {
    Db0 = 0x00,
    Db3 = 0x01,
    Db6 = 0x02,
    Db9 = 0x03,
    Db12 = 0x04,
    Db15 = 0x05,
    Db16 = 0x06,
}

impl MixerGain {
    pub fn db(self) -> u8 {
        match self {
            MixerGain::Db0 => 0,
            MixerGain::Db3 => 3,
            MixerGain::Db6 => 6,
            MixerGain::Db9 => 9,
            MixerGain::Db12 => 12,
            MixerGain::Db15 => 15,
            MixerGain::Db16 => 16,
        }
    }
}

impl TryFrom<u8> for MixerGain {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(MixerGain::Db0),
            0x01 => Ok(MixerGain::Db3),
            0x02 => Ok(MixerGain::Db6),
            0x03 => Ok(MixerGain::Db9),
            0x04 => Ok(MixerGain::Db12),
            0x05 => Ok(MixerGain::Db15),
            0x06 => Ok(MixerGain::Db16),
            other => Err(other),
        }
    }
}

/// Receiver intermediate-frequency amplifier gain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum IfAmpGain {
    Db12 = 0x00,
    Db18 = 0x01,
    Db21 = 0x02,
    Db24 = 0x03,
    Db27 = 0x04,
    Db30 = 0x05,
    Db36 = 0x06,
    Db40 = 0x07,
}

impl IfAmpGain {
    pub fn db(self) -> u8 {
        match self {
            IfAmpGain::Db12 => 12,
            IfAmpGain::Db18 => 18,
            IfAmpGain::Db21 => 21,
            IfAmpGain::Db24 => 24,
            IfAmpGain::Db27 => 27,
            IfAmpGain::Db30 => 30,
            IfAmpGain::Db36 => 36,
            IfAmpGain::Db40 => 40,
        }
    }
}

impl TryFrom<u8> for IfAmpGain {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(IfAmpGain::Db12),
            0x01 => Ok(IfAmpGain::Db18),
            0x02 => Ok(IfAmpGain::Db21),
            0x03 => Ok(IfAmpGain::Db24),
            0x04 => Ok(IfAmpGain::Db27),
            0x05 => Ok(IfAmpGain::Db30),
            0x06 => Ok(IfAmpGain::Db36),
            0x07 => Ok(IfAmpGain::Db40),
            other => Err(other),
        }
    }
}

/// Receiver demodulator settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemodulatorParams {
    pub mixer_gain: MixerGain,
    pub if_gain: IfAmpGain,
    /// Signal demodulation threshold, lower is more sensitive
    pub threshold: u16,
}

impl DemodulatorParams {
    pub(crate) fn to_bytes(self) -> [u8; 4] {
        let [msb, lsb] = self.threshold.to_be_bytes();
        [self.mixer_gain as u8, self.if_gain as u8, msb, lsb]
    }
}
