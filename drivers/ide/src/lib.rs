// lib.rs - ATA protocol engine for a single PIO device on a register bus
#![cfg_attr(not(test), no_std)]

use log::{debug, error, info, trace, warn};
use pata_bus::{DelayMs, Register, RegisterBus};

pub mod config;
pub mod consts;
pub mod error;
pub mod identify;
pub mod status;
pub mod types;


use consts::*;
pub use config::{CommandPacing, DetectPolicy, DriveConfig, PollBudget};
pub use error::{ErrorSeverity, IdeError, IdeResult};
pub use identify::{IdentifyRecord, IdentifyWords};
pub use status::{ErrorBits, StatusWord};
pub use types::{
    BlockDevice, Command, DetectReport, DetectState, DeviceSession, PollResult, RegisterSnapshot,
    SectorBuffer,
};

/// The master device on one register bus.
pub struct IdeDrive<B, D> {
    bus: B,
    delay: D,
    config: DriveConfig,
    session: DeviceSession,
}

impl<B: RegisterBus, D: DelayMs> IdeDrive<B, D> {
    pub fn new(bus: B, delay: D) -> Self {
        Self::with_config(bus, delay, DriveConfig::default())
    }

    pub fn with_config(bus: B, delay: D, config: DriveConfig) -> Self {
        IdeDrive {
            bus,
            delay,
            config,
            session: DeviceSession::new(),
        }
    }

    pub fn config(&self) -> &DriveConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: DriveConfig) {
        self.config = config;
    }

    pub fn session(&self) -> &DeviceSession {
        &self.session
    }

    /// IDENTIFY data from the last successful detection
    pub fn identity(&self) -> Option<&IdentifyRecord> {
        self.session.identity.as_ref()
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    pub fn into_parts(self) -> (B, D) {
        (self.bus, self.delay)
    }

    fn pause(&mut self, ms: u32) {
        if ms > 0 {
            self.delay.delay_ms(ms);
        }
    }

    /* ============================================================================
     * STATUS AND POLLING
     * ============================================================================ */

    pub fn read_status(&mut self) -> StatusWord {
        StatusWord::from_register(self.bus.read_register(Register::STATUS))
    }

    pub fn read_error(&mut self) -> ErrorBits {
        ErrorBits::from_register(self.bus.read_register(Register::ERROR))
    }

    /// Waits for the device to finish the current command.
    ///
    /// Error is checked before Busy so a device that raises Error while
    /// still busy is reported rather than waited on.
    pub fn poll_for_ready(&mut self) -> PollResult {
        let mut busy_polls: u32 = 0;
        loop {
            let status = self.read_status();

            if status.contains(StatusWord::ERROR) {
                let error = self.read_error();
                debug!("poll: status {} error {}", status, error);
                return PollResult::ErrorCode { status, error };
            }

            if status.contains(StatusWord::BUSY) {
                busy_polls = busy_polls.saturating_add(1);
                if self.config.poll.exhausted(busy_polls) {
                    warn!("poll: still busy after {} reads", busy_polls);
                    return PollResult::Timeout;
                }
                continue;
            }

            if status.contains(StatusWord::FAULT) {
                error!("poll: drive fault, status {}", status);
                return PollResult::DriveFault;
            }

            if status.contains(StatusWord::DATA_REQUEST) {
                trace!("poll: ready after {} busy reads", busy_polls);
                return PollResult::Ready;
            }

            warn!("poll: unexpected status {}", status);
            return PollResult::UnknownFault(status);
        }
    }

    /// Reads error, sector count, LBA0-2 and device select.
    pub fn register_snapshot(&mut self) -> RegisterSnapshot {
        let mut values = [0u16; 6];
        for (value, reg) in values.iter_mut().zip(RegisterSnapshot::REGISTERS) {
            *value = self.bus.read_register(reg);
        }
        RegisterSnapshot::from_values(values)
    }

    /* ============================================================================
     * DETECTION
     * ============================================================================ */

    /// Selects the master, issues IDENTIFY and reports whether anything
    /// answered.
    fn probe(&mut self, attempt: u32) -> bool {
        let policy = self.config.detect;

        self.bus.write_register(Register::COMMAND, u16::from(Command::SelectMaster.opcode()));
        self.pause(policy.select_settle_ms);
        self.session.master_selected = true;

        self.bus.write_register(Register::COMMAND, u16::from(Command::Identify.opcode()));
        self.pause(policy.identify_settle_ms);

        let status = self.bus.read_register(Register::STATUS);
        if status == 0 {
            warn!("attempt {}: no device, waiting", attempt);
            return false;
        }
        debug!("attempt {}: device answered, status {:#06x}", attempt, status);
        true
    }

    /// Runs the detection handshake until IDENTIFY data is read.
    ///
    /// Retries forever unless the policy caps attempts. An Error bit after
    /// the device reports ready aborts without retrying.
    pub fn detect(&mut self) -> IdeResult<DetectReport> {
        let policy = self.config.detect;
        let mut state = DetectState::Detecting;
        let mut attempts: u32 = 0;

        loop {
            state = match state {
                DetectState::Detecting => {
                    if let Some(max) = policy.max_attempts {
                        if attempts >= max {
                            error!("no device after {} attempts", attempts);
                            return Err(IdeError::NotDetected { attempts });
                        }
                    }
                    attempts += 1;
                    self.session.reset();
                    self.pause(policy.pacing_ms);

                    if self.probe(attempts) {
                        DetectState::Polling
                    } else {
                        DetectState::Detecting
                    }
                }
                DetectState::Polling => match self.poll_for_ready() {
                    PollResult::Ready => DetectState::Identified,
                    other => {
                        let snapshot = self.register_snapshot();
                        warn!("attempt {}: {:?}, registers {}; restarting", attempts, other, snapshot);
                        DetectState::Detecting
                    }
                },
                DetectState::Identified => {
                    let (identity, raw) = self.read_identify()?;
                    info!("detected {}", identity);
                    self.session.identity = Some(identity.clone());
                    self.session.identified = true;
                    return Ok(DetectReport {
                        retries: attempts - 1,
                        identity,
                        raw,
                    });
                }
            };
        }
    }

    fn read_identify(&mut self) -> IdeResult<(IdentifyRecord, SectorBuffer)> {
        let status = self.read_status();
        if status.has_error() {
            let error = self.read_error();
            error!("IDENTIFY failed: status {}, error {}", status, error);
            return Err(IdeError::IdentifyAborted { status, error });
        }

        let mut words: IdentifyWords = [0; SECTOR_WORDS];
        self.read_data_words(&mut words);

        let mut raw: SectorBuffer = [0; SECTOR_SIZE];
        words_to_bytes(&words, &mut raw);

        let record = IdentifyRecord::parse(&words);
        debug!(
            "signature {:#06x}, default CHS {}, current CHS {}, LBA sectors {} (current {})",
            record.signature,
            record.default_geometry,
            record.current_geometry,
            record.total_lba_sectors,
            record.current_capacity,
        );
        debug!(
            "capabilities {:#06x}, PIO mode {}, LBA {}",
            record.capabilities,
            record.max_pio_mode(),
            record.supports_lba(),
        );
        Ok((record, raw))
    }

    /* ============================================================================
     * SECTOR TRANSFERS
     * ============================================================================ */

    fn read_data_words(&mut self, words: &mut [u16]) {
        let gap = self.config.pacing.word_ms;
        if gap == 0 {
            self.bus.read_words(Register::Data, words);
            return;
        }
        for word in words.iter_mut() {
            *word = self.bus.read_register(Register::Data);
            self.pause(gap);
        }
    }

    fn write_data_words(&mut self, words: &[u16]) {
        let gap = self.config.pacing.word_ms;
        if gap == 0 {
            self.bus.write_words(Register::Data, words);
            return;
        }
        for &word in words {
            self.bus.write_register(Register::Data, word);
            self.pause(gap);
        }
    }

    fn wait_ready(&mut self, what: &str, lba: u16) -> IdeResult<()> {
        let result = self.poll_for_ready();
        if let PollResult::UnknownFault(status) = result {
            let snapshot = self.register_snapshot();
            warn!("{} sector {}: status {}, registers {}", what, lba, status, snapshot);
        }
        result.into_result().map_err(|e| {
            error!("{} sector {}: {} (code {:#06x})", what, lba, e, e.code());
            e
        })
    }

    fn warn_if_unidentified(&self, what: &str) {
        if !self.session.identified {
            warn!("{} on a device that has not been identified", what);
        }
    }

    /// Loads the single-sector task file and issues `command`.
    fn issue_sector_command(&mut self, lba: u16, command: Command) {
        let pacing = self.config.pacing.register_ms;
        let [lba0, lba1] = lba.to_le_bytes();

        let task_file = [
            (Register::SectorCount, 1u8),
            (Register::Lba0, lba0),
            (Register::Lba1, lba1),
            (Register::Lba2, 0),
            (Register::DeviceSelect, ATA_DEVSEL_MASTER_LBA),
        ];
        for (reg, value) in task_file {
            self.bus.write_register(reg, u16::from(value));
            self.pause(pacing);
        }

        self.bus.write_register(Register::COMMAND, u16::from(command.opcode()));
        self.pause(self.config.pacing.command_ms);
    }

    /// Reads one 512-byte sector. There is no retry; a non-ready poll
    /// fails the read with the device's code.
    pub fn read_sector(&mut self, lba: u16, buffer: &mut SectorBuffer) -> IdeResult<()> {
        self.warn_if_unidentified("read");
        self.wait_ready("read", lba)?;
        self.issue_sector_command(lba, Command::ReadSector);
        self.wait_ready("read", lba)?;

        let mut words = [0u16; SECTOR_WORDS];
        self.read_data_words(&mut words);
        words_to_bytes(&words, buffer);
        trace!("read sector {}", lba);
        Ok(())
    }

    /// Writes one 512-byte sector.
    pub fn write_sector(&mut self, lba: u16, buffer: &SectorBuffer) -> IdeResult<()> {
        self.warn_if_unidentified("write");
        self.wait_ready("write", lba)?;
        self.issue_sector_command(lba, Command::WriteSector);
        self.wait_ready("write", lba)?;

        let mut words = [0u16; SECTOR_WORDS];
        bytes_to_words(buffer, &mut words);
        self.write_data_words(&words);
        trace!("wrote sector {}", lba);
        Ok(())
    }
}

/// Splits data words into sector bytes, low byte first
pub fn words_to_bytes(words: &[u16; SECTOR_WORDS], bytes: &mut SectorBuffer) {
    for (chunk, word) in bytes.chunks_exact_mut(2).zip(words.iter()) {
        chunk.copy_from_slice(&word.to_le_bytes());
    }
}

/// Packs sector bytes into data words, low byte first
pub fn bytes_to_words(bytes: &SectorBuffer, words: &mut [u16; SECTOR_WORDS]) {
    for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(2)) {
        *word = u16::from_le_bytes([chunk[0], chunk[1]]);
    }
}

fn block_address(index: u32) -> IdeResult<u16> {
    u16::try_from(index).map_err(|_| IdeError::AddressOutOfRange(index))
}

impl<B: RegisterBus, D: DelayMs> BlockDevice for IdeDrive<B, D> {
    type Error = IdeError;

    fn block_count(&self) -> u32 {
        self.identity()
            .map_or(ADDRESSABLE_SECTORS, IdentifyRecord::addressable_sectors)
    }

    fn read_block(&mut self, index: u32, buffer: &mut SectorBuffer) -> IdeResult<()> {
        let lba = block_address(index)?;
        self.read_sector(lba, buffer)
    }

    fn write_block(&mut self, index: u32, buffer: &SectorBuffer) -> IdeResult<()> {
        let lba = block_address(index)?;
        self.write_sector(lba, buffer)
    }
}
