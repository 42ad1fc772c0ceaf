//! CompactFlash storage for STM32F1 boards over a bit-banged IDE bus.
//!
//! The bus engine lives in [`pata_bus`], the ATA protocol in [`ide`]. This
//! crate wires them to the reference board, keeps the drive behind a global
//! lock and routes `log` output to the serial console.
#![cfg_attr(not(test), no_std)]

pub mod serial;

#[cfg(feature = "stm32f1")]
pub mod board;

pub use ide;
pub use pata_bus;

pub use serial::{hexdump, init_logger, log_hexdump, LoggerError};

#[cfg(feature = "stm32f1")]
pub use board::{read_sector, storage_init, with_storage, write_sector, Board, BoardConfig};
