//! Status and error register bits.

use core::fmt;

use bitflags::bitflags;

use crate::consts::*;

bitflags! {
    /// Bits of the status register.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StatusWord: u8 {
        const BUSY = ATA_SR_BSY;
        const READY = ATA_SR_DRDY;
        const FAULT = ATA_SR_DF;
        const SEEK_COMPLETE = ATA_SR_DSC;
        const DATA_REQUEST = ATA_SR_DRQ;
        const CORRECTED = ATA_SR_CORR;
        const INDEX = ATA_SR_IDX;
        const ERROR = ATA_SR_ERR;
    }
}

bitflags! {
    /// Bits of the error register, meaningful while the status Error bit is set.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ErrorBits: u8 {
        const BAD_BLOCK = ATA_ER_BBK;
        const UNCORRECTABLE = ATA_ER_UNC;
        const MEDIA_CHANGED = ATA_ER_MC;
        const ID_NOT_FOUND = ATA_ER_IDNF;
        const MEDIA_CHANGE_REQUEST = ATA_ER_MCR;
        const ABORTED = ATA_ER_ABRT;
        const TRACK0_NOT_FOUND = ATA_ER_TK0NF;
        const ADDRESS_MARK_NOT_FOUND = ATA_ER_AMNF;
    }
}

impl StatusWord {
    /// Decodes the low byte of a status register read
    pub const fn from_register(raw: u16) -> Self {
        StatusWord::from_bits_retain(raw as u8)
    }

    pub const fn is_busy(&self) -> bool {
        self.contains(StatusWord::BUSY)
    }

    pub const fn has_error(&self) -> bool {
        self.contains(StatusWord::ERROR)
    }
}

impl ErrorBits {
    pub const fn from_register(raw: u16) -> Self {
        ErrorBits::from_bits_retain(raw as u8)
    }
}

fn write_names<I>(f: &mut fmt::Formatter<'_>, raw: u8, names: I) -> fmt::Result
where
    I: Iterator<Item = &'static str>,
{
    write!(f, "0x{:02X}", raw)?;
    let mut first = true;
    for name in names {
        f.write_str(if first { " [" } else { "|" })?;
        f.write_str(name)?;
        first = false;
    }
    if !first {
        f.write_str("]")?;
    }
    Ok(())
}

impl fmt::Display for StatusWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_names(f, self.bits(), self.iter_names().map(|(name, _)| name))
    }
}

impl fmt::Display for ErrorBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_names(f, self.bits(), self.iter_names().map(|(name, _)| name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::format;

    #[test]
    fn test_status_decoding() {
        let status = StatusWord::from_register(0xFF58);
        assert!(status.contains(StatusWord::READY | StatusWord::SEEK_COMPLETE | StatusWord::DATA_REQUEST));
        assert!(!status.is_busy());
        assert!(!status.has_error());
        assert!(StatusWord::from_register(0x81).is_busy());
        assert!(StatusWord::from_register(0x81).has_error());
    }

    #[test]
    fn test_display_names_bits() {
        assert_eq!(format!("{}", StatusWord::from_register(0x58)), "0x58 [READY|SEEK_COMPLETE|DATA_REQUEST]");
        assert_eq!(format!("{}", ErrorBits::from_register(0x04)), "0x04 [ABORTED]");
        assert_eq!(format!("{}", StatusWord::empty()), "0x00");
    }
}
