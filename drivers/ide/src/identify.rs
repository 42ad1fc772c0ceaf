//! IDENTIFY DEVICE data.
//!
//! Offsets follow the CompactFlash card information block, which is a
//! subset of the ATA IDENTIFY layout.

use core::fmt;

use heapless::String;
use serde::Serialize;

use crate::consts::*;

/// One 256-word IDENTIFY response as read from the data register
pub type IdentifyWords = [u16; SECTOR_WORDS];

/// Cylinder/head/sector geometry.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Chs {
    pub cylinders: u16,
    pub heads: u16,
    pub sectors_per_track: u16,
}

impl Chs {
    pub const fn total_sectors(&self) -> u32 {
        self.cylinders as u32 * self.heads as u32 * self.sectors_per_track as u32
    }
}

impl fmt::Display for Chs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.cylinders, self.heads, self.sectors_per_track)
    }
}

/// Decoded IDENTIFY DEVICE fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentifyRecord {
    pub signature: u16,
    pub default_geometry: Chs,
    /// Sectors per card as reported by CompactFlash devices
    pub card_sectors: u32,
    pub serial: String<SERIAL_LEN>,
    pub ecc_bytes: u16,
    pub firmware: String<FIRMWARE_LEN>,
    pub model: String<MODEL_LEN>,
    /// Maximum sectors per READ/WRITE MULTIPLE
    pub max_multiple: u8,
    pub capabilities: u16,
    /// PIO timing mode from word 51 (0..2)
    pub pio_timing_mode: u8,
    pub field_validity: u16,
    pub current_geometry: Chs,
    pub current_capacity: u32,
    pub multiple_setting: u16,
    pub total_lba_sectors: u32,
    pub advanced_pio_modes: u16,
    /// Minimum PIO cycle in ns without flow control
    pub min_pio_cycle_ns: u16,
    /// Minimum PIO cycle in ns with IORDY
    pub min_pio_cycle_iordy_ns: u16,
}

/// Extracts ATA text: each word carries two characters, the first in the
/// high byte. Trailing spaces and NULs are trimmed and anything outside
/// printable ASCII becomes `?`.
pub fn ata_string<const N: usize>(words: &[u16]) -> String<N> {
    let mut out: String<N> = String::new();
    for &word in words {
        for byte in word.to_be_bytes() {
            let ch = match byte {
                0x20..=0x7E => byte as char,
                0 => ' ',
                _ => '?',
            };
            if out.push(ch).is_err() {
                break;
            }
        }
    }
    let trimmed = out.trim_end().len();
    out.truncate(trimmed);
    out
}

/// Two words holding a 32-bit count, low word first
fn dword(words: &IdentifyWords, offset: usize) -> u32 {
    u32::from(words[offset]) | (u32::from(words[offset + 1]) << 16)
}

impl IdentifyRecord {
    pub fn parse(words: &IdentifyWords) -> Self {
        IdentifyRecord {
            signature: words[ATA_IDENT_SIGNATURE],
            default_geometry: Chs {
                cylinders: words[ATA_IDENT_CYLINDERS],
                heads: words[ATA_IDENT_HEADS],
                sectors_per_track: words[ATA_IDENT_SECTORS],
            },
            // Word 7 is the high half as the CF card information block defines it;
            // some hosts read it low word first like the LBA counts
            card_sectors: (u32::from(words[ATA_IDENT_CF_SECTORS]) << 16)
                | u32::from(words[ATA_IDENT_CF_SECTORS + 1]),
            serial: ata_string(&words[ATA_IDENT_SERIAL..ATA_IDENT_SERIAL + SERIAL_LEN / 2]),
            ecc_bytes: words[ATA_IDENT_ECC_BYTES],
            firmware: ata_string(&words[ATA_IDENT_FIRMWARE..ATA_IDENT_FIRMWARE + FIRMWARE_LEN / 2]),
            model: ata_string(&words[ATA_IDENT_MODEL..ATA_IDENT_MODEL + MODEL_LEN / 2]),
            max_multiple: (words[ATA_IDENT_MAX_MULTIPLE] & 0xFF) as u8,
            capabilities: words[ATA_IDENT_CAPABILITIES],
            pio_timing_mode: (words[ATA_IDENT_PIO_TIMING] >> 8) as u8,
            field_validity: words[ATA_IDENT_FIELDVALID],
            current_geometry: Chs {
                cylinders: words[ATA_IDENT_CUR_CYLINDERS],
                heads: words[ATA_IDENT_CUR_HEADS],
                sectors_per_track: words[ATA_IDENT_CUR_SECTORS],
            },
            current_capacity: dword(words, ATA_IDENT_CUR_CAPACITY),
            multiple_setting: words[ATA_IDENT_MULTIPLE],
            total_lba_sectors: dword(words, ATA_IDENT_MAX_LBA),
            advanced_pio_modes: words[ATA_IDENT_ADV_PIO],
            min_pio_cycle_ns: words[ATA_IDENT_PIO_CYCLE],
            min_pio_cycle_iordy_ns: words[ATA_IDENT_PIO_CYCLE_IORDY],
        }
    }

    pub fn is_compact_flash(&self) -> bool {
        self.signature == CF_SIGNATURE
    }

    pub fn supports_lba(&self) -> bool {
        self.capabilities & ATA_CAP_LBA != 0
    }

    pub fn supports_iordy(&self) -> bool {
        self.capabilities & ATA_CAP_IORDY != 0
    }

    /// Supported PIO modes, bit `n` set for mode `n`
    pub fn pio_modes(&self) -> u8 {
        let basic = (1u8 << (self.pio_timing_mode.min(2) + 1)) - 1;
        if self.field_validity & ATA_VALID_TIMING == 0 {
            return basic;
        }
        basic | (((self.advanced_pio_modes & 0x03) as u8) << 3)
    }

    /// Fastest PIO mode the device claims
    pub fn max_pio_mode(&self) -> u8 {
        7 - self.pio_modes().leading_zeros() as u8
    }

    pub fn capacity_bytes(&self) -> u64 {
        u64::from(self.total_lba_sectors) * SECTOR_SIZE as u64
    }

    /// Sectors reachable with the 16-bit address this host drives
    pub fn addressable_sectors(&self) -> u32 {
        self.total_lba_sectors.min(ADDRESSABLE_SECTORS)
    }
}

impl fmt::Display for IdentifyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "\"{}\" serial \"{}\" firmware \"{}\", {} sectors ({} KiB), CHS {}",
            self.model,
            self.serial,
            self.firmware,
            self.total_lba_sectors,
            self.capacity_bytes() / 1024,
            self.default_geometry,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Packs text the way a device does, first character in the high byte
    fn put_text(words: &mut IdentifyWords, offset: usize, len: usize, text: &str) {
        let mut bytes = [b' '; 64];
        bytes[..text.len()].copy_from_slice(text.as_bytes());
        for i in 0..len / 2 {
            words[offset + i] = u16::from_be_bytes([bytes[2 * i], bytes[2 * i + 1]]);
        }
    }

    fn sample_words() -> IdentifyWords {
        let mut w = [0u16; SECTOR_WORDS];
        w[0] = CF_SIGNATURE;
        w[1] = 490;
        w[3] = 16;
        w[6] = 63;
        w[7] = 0x0007;
        w[8] = 0x8D30;
        put_text(&mut w, ATA_IDENT_SERIAL, SERIAL_LEN, "SN0042");
        w[22] = 4;
        put_text(&mut w, ATA_IDENT_FIRMWARE, FIRMWARE_LEN, "REV1.0");
        put_text(&mut w, ATA_IDENT_MODEL, MODEL_LEN, "SanDisk SDCFB-512");
        w[47] = 0x8001;
        w[49] = ATA_CAP_LBA;
        w[51] = 0x0200;
        w[53] = ATA_VALID_CURRENT | ATA_VALID_TIMING;
        w[54] = 490;
        w[55] = 16;
        w[56] = 63;
        w[57] = 0x8D30;
        w[58] = 0x0007;
        w[60] = 0x8D30;
        w[61] = 0x0007;
        w[64] = 0x0003;
        w[67] = 120;
        w[68] = 120;
        w
    }

    #[test]
    fn test_parse_fields() {
        let record = IdentifyRecord::parse(&sample_words());
        assert!(record.is_compact_flash());
        assert_eq!(record.default_geometry, Chs { cylinders: 490, heads: 16, sectors_per_track: 63 });
        assert_eq!(record.card_sectors, 0x0007_8D30);
        assert_eq!(record.current_capacity, 0x0007_8D30);
        assert_eq!(record.total_lba_sectors, 0x0007_8D30);
        assert_eq!(record.ecc_bytes, 4);
        assert_eq!(record.max_multiple, 1);
        assert_eq!(record.min_pio_cycle_iordy_ns, 120);
        assert!(record.supports_lba());
        assert!(!record.supports_iordy());
    }

    #[test]
    fn test_text_is_unswapped_and_trimmed() {
        let record = IdentifyRecord::parse(&sample_words());
        assert_eq!(record.model.as_str(), "SanDisk SDCFB-512");
        assert_eq!(record.serial.as_str(), "SN0042");
        assert_eq!(record.firmware.as_str(), "REV1.0");
    }

    #[test]
    fn test_unprintable_text() {
        let s: String<4> = ata_string(&[0x4101, 0x0000]);
        assert_eq!(s.as_str(), "A?");
    }

    #[test]
    fn test_pio_mode_and_capacity() {
        let mut words = sample_words();
        let record = IdentifyRecord::parse(&words);
        assert_eq!(record.pio_modes(), 0b1_1111);
        assert_eq!(record.max_pio_mode(), 4);
        assert_eq!(record.capacity_bytes(), 0x0007_8D30 * 512);
        assert_eq!(record.addressable_sectors(), ADDRESSABLE_SECTORS);

        words[ATA_IDENT_FIELDVALID] = 0;
        words[ATA_IDENT_MAX_LBA] = 1000;
        words[ATA_IDENT_MAX_LBA + 1] = 0;
        let record = IdentifyRecord::parse(&words);
        assert_eq!(record.pio_modes(), 0b111);
        assert_eq!(record.max_pio_mode(), 2);
        assert_eq!(record.addressable_sectors(), 1000);
    }
}
