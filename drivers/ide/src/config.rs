//! Protocol engine configuration.
//!
//! Defaults reproduce the pacing the reference board was tuned with. All of
//! it is far slower than ATA requires; the card's controller was unreliable
//! at anything tighter.

use serde::{Deserialize, Serialize};

/// How long the status poll may spin on Busy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PollBudget {
    /// Wait for Busy to clear forever
    Unbounded,
    /// Give up after this many Busy reads
    Iterations(u32),
}

impl PollBudget {
    /// True once `polls` Busy reads have used up the budget
    pub const fn exhausted(&self, polls: u32) -> bool {
        match *self {
            PollBudget::Unbounded => false,
            PollBudget::Iterations(max) => polls >= max,
        }
    }
}

impl Default for PollBudget {
    fn default() -> Self {
        PollBudget::Unbounded
    }
}

/// Timing of the detection handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectPolicy {
    /// Wait at the top of every attempt
    pub pacing_ms: u32,
    /// Wait after the select-master command
    pub select_settle_ms: u32,
    /// Wait after IDENTIFY before the first status read
    pub identify_settle_ms: u32,
    /// Attempts before giving up; `None` retries forever
    pub max_attempts: Option<u32>,
}

impl DetectPolicy {
    pub const REFERENCE: DetectPolicy = DetectPolicy {
        pacing_ms: 1000,
        select_settle_ms: 100,
        identify_settle_ms: 10,
        max_attempts: None,
    };
}

impl Default for DetectPolicy {
    fn default() -> Self {
        DetectPolicy::REFERENCE
    }
}

/// Delays inserted around task-file writes and data transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandPacing {
    /// After each parameter register write
    pub register_ms: u32,
    /// After writing the command register
    pub command_ms: u32,
    /// After each data word
    pub word_ms: u32,
}

impl CommandPacing {
    pub const REFERENCE: CommandPacing = CommandPacing {
        register_ms: 1,
        command_ms: 100,
        word_ms: 1,
    };

    /// No extra delays beyond the bus engine's own settle time
    pub const NONE: CommandPacing = CommandPacing {
        register_ms: 0,
        command_ms: 0,
        word_ms: 0,
    };
}

impl Default for CommandPacing {
    fn default() -> Self {
        CommandPacing::REFERENCE
    }
}

/// Everything an [`IdeDrive`](crate::IdeDrive) is tuned by.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveConfig {
    pub detect: DetectPolicy,
    pub poll: PollBudget,
    pub pacing: CommandPacing,
}

impl DriveConfig {
    /// Configuration for simulated devices: no delays, bounded polling
    pub const fn fast(max_polls: u32) -> Self {
        DriveConfig {
            detect: DetectPolicy {
                pacing_ms: 0,
                select_settle_ms: 0,
                identify_settle_ms: 0,
                max_attempts: None,
            },
            poll: PollBudget::Iterations(max_polls),
            pacing: CommandPacing::NONE,
        }
    }
}
