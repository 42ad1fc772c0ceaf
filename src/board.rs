//! STM32F1 board bring-up and the global storage handle.

use ide::error::result_code;
use ide::{DetectReport, DriveConfig, IdeDrive, IdeError, IdeResult, SectorBuffer};
use log::{debug, info, Level};
use pata_bus::stm32f1::{DwtStopwatch, Stm32f1Pins, DEFAULT_CORE_HZ};
use pata_bus::{BusEngine, BusTiming};
use serde::{Deserialize, Serialize};
use spin::Mutex;

use crate::serial::log_hexdump;

/// Register bus of the reference board
pub type BoardBus = BusEngine<Stm32f1Pins, DwtStopwatch>;

/// CompactFlash card on the reference board
pub type Board = IdeDrive<BoardBus, DwtStopwatch>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardConfig {
    pub core_hz: u32,
    pub timing: BusTiming,
    pub drive: DriveConfig,
}

impl Default for BoardConfig {
    fn default() -> Self {
        BoardConfig {
            core_hz: DEFAULT_CORE_HZ,
            timing: BusTiming::PIO0,
            drive: DriveConfig::default(),
        }
    }
}

static STORAGE: Mutex<Option<Board>> = Mutex::new(None);

/// Initializes the bus and detects the card.
///
/// With the default policy this blocks until a card answers.
///
/// # Safety
/// GPIOA and GPIOB must be clocked and owned by the caller, and the DWT
/// cycle counter must not be used elsewhere.
pub unsafe fn bring_up(config: &BoardConfig) -> IdeResult<(Board, DetectReport)> {
    let stopwatch = DwtStopwatch::new(config.core_hz);
    let mut bus = BusEngine::with_timing(Stm32f1Pins::new(), stopwatch, config.timing);
    bus.initialize();

    let mut drive = IdeDrive::with_config(bus, stopwatch, config.drive);
    let report = drive.detect()?;
    info!(
        "card ready after {} retries: {}",
        report.retries, report.identity
    );
    log_hexdump(Level::Trace, &report.raw);
    Ok((drive, report))
}

/// Brings the board up and installs the drive as the global storage.
///
/// # Safety
/// Same as [`bring_up`].
pub unsafe fn storage_init(config: &BoardConfig) -> IdeResult<DetectReport> {
    let (drive, report) = bring_up(config)?;
    *STORAGE.lock() = Some(drive);
    Ok(report)
}

pub fn storage_ready() -> bool {
    STORAGE.lock().is_some()
}

/// Runs `f` on the installed drive, `None` before [`storage_init`]
pub fn with_storage<R>(f: impl FnOnce(&mut Board) -> R) -> Option<R> {
    STORAGE.lock().as_mut().map(f)
}

pub fn read_sector(lba: u16, buffer: &mut SectorBuffer) -> IdeResult<()> {
    let result = with_storage(|drive| drive.read_sector(lba, buffer))
        .unwrap_or(Err(IdeError::NotInitialized));
    debug!("read sector {} -> {:#06x}", lba, result_code(&result));
    if result.is_ok() {
        log_hexdump(Level::Trace, buffer);
    }
    result
}

pub fn write_sector(lba: u16, buffer: &SectorBuffer) -> IdeResult<()> {
    let result = with_storage(|drive| drive.write_sector(lba, buffer))
        .unwrap_or(Err(IdeError::NotInitialized));
    debug!("write sector {} -> {:#06x}", lba, result_code(&result));
    result
}
