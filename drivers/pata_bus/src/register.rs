//! Task-file register addressing.
//!
//! Only three address lines are wired to the device, so the eight
//! command-block registers are reachable and the control block
//! (alternate status, device control) is not.

use core::fmt;

/// Number of device address lines driven by the host
pub const ADDRESS_LINES: u8 = 3;

/// Mask selecting the wired address bits
pub const ADDRESS_MASK: u8 = (1 << ADDRESS_LINES) - 1;

/// One of the eight addressable ATA task-file registers.
///
/// Addresses 1 and 7 are shared: the device answers reads with Error and
/// Status and interprets writes as Features and Command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Register {
    /// 16-bit data port used for sector and identify transfers
    Data = 0,
    /// Error on read, Features on write
    ErrorFeatures = 1,
    SectorCount = 2,
    /// Sector address bits 0-7
    Lba0 = 3,
    /// Sector address bits 8-15
    Lba1 = 4,
    /// Sector address bits 16-23
    Lba2 = 5,
    /// Drive/head and addressing mode
    DeviceSelect = 6,
    /// Status on read, Command on write
    StatusCommand = 7,
}

impl Register {
    pub const ERROR: Register = Register::ErrorFeatures;
    pub const FEATURES: Register = Register::ErrorFeatures;
    pub const STATUS: Register = Register::StatusCommand;
    pub const COMMAND: Register = Register::StatusCommand;

    /// Every register in address order
    pub const ALL: [Register; 8] = [
        Register::Data,
        Register::ErrorFeatures,
        Register::SectorCount,
        Register::Lba0,
        Register::Lba1,
        Register::Lba2,
        Register::DeviceSelect,
        Register::StatusCommand,
    ];

    /// Value placed on the address lines to select this register
    pub const fn address(self) -> u8 {
        self as u8
    }

    pub const fn from_address(addr: u8) -> Option<Register> {
        match addr {
            0 => Some(Register::Data),
            1 => Some(Register::ErrorFeatures),
            2 => Some(Register::SectorCount),
            3 => Some(Register::Lba0),
            4 => Some(Register::Lba1),
            5 => Some(Register::Lba2),
            6 => Some(Register::DeviceSelect),
            7 => Some(Register::StatusCommand),
            _ => None,
        }
    }

    /// Bits of the data bus the device latches for this register
    pub const fn width_mask(self) -> u16 {
        match self {
            Register::Data => 0xFFFF,
            _ => 0x00FF,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Register::Data => "data",
            Register::ErrorFeatures => "error/features",
            Register::SectorCount => "sector count",
            Register::Lba0 => "lba0",
            Register::Lba1 => "lba1",
            Register::Lba2 => "lba2",
            Register::DeviceSelect => "device select",
            Register::StatusCommand => "status/command",
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.address())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_roundtrip() {
        for (i, reg) in Register::ALL.iter().enumerate() {
            assert_eq!(reg.address(), i as u8);
            assert_eq!(Register::from_address(i as u8), Some(*reg));
        }
        assert_eq!(Register::from_address(8), None);
        assert_eq!(Register::from_address(0xFF), None);
    }

    #[test]
    fn test_shared_addresses() {
        assert_eq!(Register::ERROR.address(), 1);
        assert_eq!(Register::FEATURES, Register::ERROR);
        assert_eq!(Register::STATUS.address(), 7);
        assert_eq!(Register::COMMAND, Register::STATUS);
    }

    #[test]
    fn test_widths_fit_address_lines() {
        assert_eq!(ADDRESS_MASK, 0x07);
        assert_eq!(Register::Data.width_mask(), 0xFFFF);
        assert!(Register::ALL[1..].iter().all(|r| r.width_mask() == 0xFF));
    }
}
