use core::fmt;

use pata_bus::Register;

use crate::consts::*;
use crate::error::{IdeError, IdeResult};
use crate::identify::IdentifyRecord;
use crate::status::{ErrorBits, StatusWord};

/// One sector of data, byte `2i` holding the low half of data word `i`
pub type SectorBuffer = [u8; SECTOR_SIZE];

/// Commands this host issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    /// Written to the command register before IDENTIFY during detection
    SelectMaster = ATA_CMD_SELECT_MASTER,
    Identify = ATA_CMD_IDENTIFY,
    IdentifyPacket = ATA_CMD_IDENTIFY_PACKET,
    ReadSector = ATA_CMD_READ_SECTOR,
    WriteSector = ATA_CMD_WRITE_SECTOR,
}

impl Command {
    pub const fn opcode(self) -> u8 {
        self as u8
    }
}

/// Outcome of waiting for the device to finish a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollResult {
    /// Busy clear and data request set
    Ready,
    /// Error bit set; the error register as read right after
    ErrorCode { status: StatusWord, error: ErrorBits },
    DriveFault,
    /// Busy, fault, error and data request all clear
    UnknownFault(StatusWord),
    /// Poll budget spent while Busy stayed set
    Timeout,
}

impl PollResult {
    pub fn is_ready(&self) -> bool {
        matches!(self, PollResult::Ready)
    }

    /// Legacy status code, 0 when ready
    pub fn code(&self) -> u16 {
        match self.into_result() {
            Ok(()) => 0,
            Err(e) => e.code(),
        }
    }

    pub fn into_result(self) -> IdeResult<()> {
        match self {
            PollResult::Ready => Ok(()),
            PollResult::ErrorCode { status, error } => Err(IdeError::Device { status, error }),
            PollResult::DriveFault => Err(IdeError::DriveFault),
            PollResult::UnknownFault(status) => Err(IdeError::UnknownFault(status)),
            PollResult::Timeout => Err(IdeError::Timeout),
        }
    }
}

/// States of the detection handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectState {
    /// Selecting the master and issuing IDENTIFY
    Detecting,
    /// Device answered, waiting for it to become ready
    Polling,
    /// Device ready, IDENTIFY data pending
    Identified,
}

/// What detection found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectReport {
    /// Attempts that restarted the handshake before it succeeded
    pub retries: u32,
    pub identity: IdentifyRecord,
    /// The IDENTIFY block as transferred, in sector byte order
    pub raw: SectorBuffer,
}

/// Per-drive progress of the detection handshake.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeviceSession {
    pub master_selected: bool,
    pub identified: bool,
    /// IDENTIFY data from the last successful detection
    pub identity: Option<IdentifyRecord>,
}

impl DeviceSession {
    pub const fn new() -> Self {
        DeviceSession {
            master_selected: false,
            identified: false,
            identity: None,
        }
    }

    pub fn reset(&mut self) {
        *self = DeviceSession::new();
    }
}

/// Task-file registers 1 through 6 as read for diagnostics.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RegisterSnapshot {
    pub error: u8,
    pub sector_count: u8,
    pub lba0: u8,
    pub lba1: u8,
    pub lba2: u8,
    pub device_select: u8,
}

impl RegisterSnapshot {
    /// Registers in the order they are read
    pub const REGISTERS: [Register; 6] = [
        Register::ErrorFeatures,
        Register::SectorCount,
        Register::Lba0,
        Register::Lba1,
        Register::Lba2,
        Register::DeviceSelect,
    ];

    pub fn from_values(values: [u16; 6]) -> Self {
        RegisterSnapshot {
            error: values[0] as u8,
            sector_count: values[1] as u8,
            lba0: values[2] as u8,
            lba1: values[3] as u8,
            lba2: values[4] as u8,
            device_select: values[5] as u8,
        }
    }
}

impl fmt::Display for RegisterSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "err={:02X} cnt={:02X} lba={:02X}:{:02X}:{:02X} dev={:02X}",
            self.error, self.sector_count, self.lba2, self.lba1, self.lba0, self.device_select
        )
    }
}

/// Fixed-size block storage.
pub trait BlockDevice {
    type Error;

    /// Number of addressable blocks
    fn block_count(&self) -> u32;

    fn read_block(&mut self, index: u32, buffer: &mut SectorBuffer) -> Result<(), Self::Error>;

    fn write_block(&mut self, index: u32, buffer: &SectorBuffer) -> Result<(), Self::Error>;
}
