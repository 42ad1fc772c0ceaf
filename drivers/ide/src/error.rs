//! IDE driver error types
//!
//! Every error maps onto a 16-bit code compatible with the board's serial
//! console: 0 is success, device errors carry the error register in the
//! high byte and the status register in the low byte, and conditions with
//! no register state use sentinels whose low byte is zero.

use core::fmt;

use crate::status::{ErrorBits, StatusWord};

/// Status had Fault set with Busy and Error clear
pub const DRIVE_FAULT_CODE: u16 = 0xDF00;
/// Busy, Fault, Error and Data Request all clear
pub const UNKNOWN_FAULT_CODE: u16 = 0xEE00;
/// Poll budget spent while Busy stayed set
pub const TIMEOUT_CODE: u16 = 0x7100;
/// Detection gave up without seeing the device
pub const NOT_DETECTED_CODE: u16 = 0xDE00;
/// Block index beyond the 16-bit sector address
pub const OUT_OF_RANGE_CODE: u16 = 0xAD00;
/// No drive has been brought up
pub const NOT_INITIALIZED_CODE: u16 = 0xF000;

/// IDE driver error types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdeError {
    /// Device reported an error; both registers as read
    Device { status: StatusWord, error: ErrorBits },

    /// Device fault bit set
    DriveFault,

    /// Status matched no known condition
    UnknownFault(StatusWord),

    /// Device stayed busy past the poll budget
    Timeout,

    /// IDENTIFY finished with the error bit set
    IdentifyAborted { status: StatusWord, error: ErrorBits },

    /// Detection ran out of attempts
    NotDetected { attempts: u32 },

    /// Block index cannot be expressed with LBA0 and LBA1
    AddressOutOfRange(u32),

    /// No drive has been brought up
    NotInitialized,
}

/// Composite code for a device error: error register high, status low
pub const fn composite_code(status: StatusWord, error: ErrorBits) -> u16 {
    ((error.bits() as u16) << 8) | status.bits() as u16
}

impl IdeError {
    /// Legacy 16-bit status code
    pub fn code(&self) -> u16 {
        match *self {
            IdeError::Device { status, error } => composite_code(status, error),
            IdeError::IdentifyAborted { status, error } => composite_code(status, error),
            IdeError::DriveFault => DRIVE_FAULT_CODE,
            IdeError::UnknownFault(_) => UNKNOWN_FAULT_CODE,
            IdeError::Timeout => TIMEOUT_CODE,
            IdeError::NotDetected { .. } => NOT_DETECTED_CODE,
            IdeError::AddressOutOfRange(_) => OUT_OF_RANGE_CODE,
            IdeError::NotInitialized => NOT_INITIALIZED_CODE,
        }
    }

    /// Check if retrying the operation may succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            IdeError::Timeout | IdeError::UnknownFault(_) | IdeError::NotDetected { .. }
        )
    }

    /// Check if error was reported by the device itself
    pub fn is_hardware_error(&self) -> bool {
        matches!(
            self,
            IdeError::Device { .. } | IdeError::DriveFault | IdeError::IdentifyAborted { .. }
        )
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            IdeError::DriveFault => ErrorSeverity::Critical,
            IdeError::IdentifyAborted { .. } => ErrorSeverity::Critical,
            IdeError::Device { .. } => ErrorSeverity::Error,
            IdeError::NotDetected { .. } => ErrorSeverity::Error,
            IdeError::Timeout => ErrorSeverity::Warning,
            IdeError::UnknownFault(_) => ErrorSeverity::Warning,
            IdeError::AddressOutOfRange(_) => ErrorSeverity::Warning,
            IdeError::NotInitialized => ErrorSeverity::Info,
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Device unusable until power-cycled
    Critical,
    /// Operation failed, device may still answer
    Error,
    /// Operation failed, retry is reasonable
    Warning,
    /// Caller misuse or transient state
    Info,
}

impl fmt::Display for IdeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdeError::Device { status, error } =>
                write!(f, "Device error: status {}, error {}", status, error),
            IdeError::DriveFault =>
                write!(f, "Drive fault"),
            IdeError::UnknownFault(status) =>
                write!(f, "Unexpected status {}", status),
            IdeError::Timeout =>
                write!(f, "Device stayed busy past the poll budget"),
            IdeError::IdentifyAborted { status, error } =>
                write!(f, "IDENTIFY failed: status {}, error {}", status, error),
            IdeError::NotDetected { attempts } =>
                write!(f, "No device after {} detection attempts", attempts),
            IdeError::AddressOutOfRange(index) =>
                write!(f, "Block {} beyond 16-bit sector address", index),
            IdeError::NotInitialized =>
                write!(f, "Drive not initialized"),
        }
    }
}

/// IDE Result type alias
pub type IdeResult<T> = Result<T, IdeError>;

/// Code for an operation outcome, 0 on success
pub fn result_code<T>(result: &IdeResult<T>) -> u16 {
    match result {
        Ok(_) => 0,
        Err(e) => e.code(),
    }
}
