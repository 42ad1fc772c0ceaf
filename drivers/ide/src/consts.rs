#![allow(unused)]

// ATA Status Register bits
pub const ATA_SR_BSY: u8 = 0x80;    // Busy
pub const ATA_SR_DRDY: u8 = 0x40;   // Drive ready
pub const ATA_SR_DF: u8 = 0x20;     // Drive write fault
pub const ATA_SR_DSC: u8 = 0x10;    // Drive seek complete
pub const ATA_SR_DRQ: u8 = 0x08;    // Data request ready
pub const ATA_SR_CORR: u8 = 0x04;   // Corrected data
pub const ATA_SR_IDX: u8 = 0x02;    // Index
pub const ATA_SR_ERR: u8 = 0x01;    // Error

// ATA Error Register bits
pub const ATA_ER_BBK: u8 = 0x80;    // Bad block
pub const ATA_ER_UNC: u8 = 0x40;    // Uncorrectable data
pub const ATA_ER_MC: u8 = 0x20;     // Media changed
pub const ATA_ER_IDNF: u8 = 0x10;   // ID mark not found
pub const ATA_ER_MCR: u8 = 0x08;    // Media change request
pub const ATA_ER_ABRT: u8 = 0x04;   // Command aborted
pub const ATA_ER_TK0NF: u8 = 0x02;  // Track 0 not found
pub const ATA_ER_AMNF: u8 = 0x01;   // No address mark

// Commands written to the command register
pub const ATA_CMD_SELECT_MASTER: u8 = 0xA0;   // Also the PACKET opcode
pub const ATA_CMD_IDENTIFY_PACKET: u8 = 0xA1;
pub const ATA_CMD_IDENTIFY: u8 = 0xEC;
pub const ATA_CMD_READ_SECTOR: u8 = 0x21;     // READ SECTOR(S) without retry
pub const ATA_CMD_WRITE_SECTOR: u8 = 0x30;

// Device select register
pub const ATA_DEVSEL_OBSOLETE: u8 = 0xA0;     // Bits 7 and 5 always set
pub const ATA_DEVSEL_LBA: u8 = 0x40;
pub const ATA_DEVSEL_SLAVE: u8 = 0x10;
pub const ATA_DEVSEL_MASTER_LBA: u8 = ATA_DEVSEL_OBSOLETE | ATA_DEVSEL_LBA;

// Transfer geometry
pub const SECTOR_SIZE: usize = 512;
pub const SECTOR_WORDS: usize = SECTOR_SIZE / 2;
/// Sectors reachable with LBA0 and LBA1 only
pub const ADDRESSABLE_SECTORS: u32 = 1 << 16;

/// Signature word of a CompactFlash card in memory/ATA mode
pub const CF_SIGNATURE: u16 = 0x848A;

// Identify data offsets (in words)
pub const ATA_IDENT_SIGNATURE: usize = 0;
pub const ATA_IDENT_CYLINDERS: usize = 1;
pub const ATA_IDENT_HEADS: usize = 3;
pub const ATA_IDENT_SECTORS: usize = 6;
pub const ATA_IDENT_CF_SECTORS: usize = 7;
pub const ATA_IDENT_SERIAL: usize = 10;
pub const ATA_IDENT_ECC_BYTES: usize = 22;
pub const ATA_IDENT_FIRMWARE: usize = 23;
pub const ATA_IDENT_MODEL: usize = 27;
pub const ATA_IDENT_MAX_MULTIPLE: usize = 47;
pub const ATA_IDENT_CAPABILITIES: usize = 49;
pub const ATA_IDENT_PIO_TIMING: usize = 51;
pub const ATA_IDENT_FIELDVALID: usize = 53;
pub const ATA_IDENT_CUR_CYLINDERS: usize = 54;
pub const ATA_IDENT_CUR_HEADS: usize = 55;
pub const ATA_IDENT_CUR_SECTORS: usize = 56;
pub const ATA_IDENT_CUR_CAPACITY: usize = 57;
pub const ATA_IDENT_MULTIPLE: usize = 59;
pub const ATA_IDENT_MAX_LBA: usize = 60;
pub const ATA_IDENT_ADV_PIO: usize = 64;
pub const ATA_IDENT_PIO_CYCLE: usize = 67;
pub const ATA_IDENT_PIO_CYCLE_IORDY: usize = 68;

// Text field lengths in characters
pub const SERIAL_LEN: usize = 20;
pub const FIRMWARE_LEN: usize = 8;
pub const MODEL_LEN: usize = 40;

// Capabilities word
pub const ATA_CAP_LBA: u16 = 1 << 9;
pub const ATA_CAP_IORDY: u16 = 1 << 11;

// Field validity word
pub const ATA_VALID_CURRENT: u16 = 1 << 0;
pub const ATA_VALID_TIMING: u16 = 1 << 1;
