//! PIO cycle timing.
//!
//! Intervals are the PIO mode 0 figures the reference board runs with. The
//! one millisecond settle after each access is far slower than the bus
//! needs, but the card's controller misbehaves without it.

use serde::{Deserialize, Serialize};

/// Address valid to strobe asserted (t1)
pub const NS_ADDRESS_SETUP: u32 = 70;
/// Strobe asserted until data is valid (t2)
pub const NS_DATA_SETUP: u32 = 165;
/// Write data valid before strobe release (t3)
pub const NS_WRITE_SETUP: u32 = 60;
/// Write data held after strobe release (t4)
pub const NS_WRITE_HOLD: u32 = 30;
/// Read strobe release to bus turnaround (t6)
pub const NS_READ_HOLD: u32 = 20;
/// Coarse delay after every access
pub const MS_SETTLE: u32 = 1;

/// Intervals the bus engine waits between pin transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusTiming {
    pub address_setup_ns: u32,
    pub data_setup_ns: u32,
    pub write_setup_ns: u32,
    pub write_hold_ns: u32,
    pub read_hold_ns: u32,
    pub settle_ms: u32,
}

impl BusTiming {
    /// PIO mode 0 as the reference board drives it. Address setup reuses
    /// the data setup interval.
    pub const PIO0: BusTiming = BusTiming {
        address_setup_ns: NS_DATA_SETUP,
        data_setup_ns: NS_DATA_SETUP,
        write_setup_ns: NS_WRITE_SETUP,
        write_hold_ns: NS_WRITE_HOLD,
        read_hold_ns: NS_READ_HOLD,
        settle_ms: MS_SETTLE,
    };

    /// PIO mode 0 with the dedicated 70 ns address setup interval
    pub const fn distinct_address_setup() -> BusTiming {
        BusTiming {
            address_setup_ns: NS_ADDRESS_SETUP,
            ..BusTiming::PIO0
        }
    }

    /// Wait between asserting the write strobe and driving the data bus
    pub const fn write_lead_ns(&self) -> u32 {
        self.data_setup_ns.saturating_sub(self.write_setup_ns)
    }

    /// Precise portion of a read cycle, excluding the settle delay
    pub const fn read_cycle_ns(&self) -> u32 {
        self.address_setup_ns + self.data_setup_ns + self.read_hold_ns
    }

    /// Precise portion of a write cycle, excluding the settle delay
    pub const fn write_cycle_ns(&self) -> u32 {
        self.address_setup_ns + self.write_lead_ns() + self.write_setup_ns + self.write_hold_ns
    }
}

impl Default for BusTiming {
    fn default() -> Self {
        BusTiming::PIO0
    }
}
