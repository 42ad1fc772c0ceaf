//! STM32F1 backend: GPIO bus pins and the DWT cycle-counter stopwatch.
//!
//! Wiring on the reference board:
//! - GPIOB 0..15 carry the 16-bit data bus
//! - GPIOA 5..7 carry address lines A0..A2
//! - GPIOA 11 is the read strobe (DIOR-), GPIOA 12 the write strobe (DIOW-)

use volatile::{ReadOnly, Volatile, WriteOnly};

use crate::delay::{DelayMs, DelayNs};
use crate::pins::{BusPins, DataDirection, Level};
use crate::register::ADDRESS_MASK;

pub const GPIOA_BASE: usize = 0x4001_0800;
pub const GPIOB_BASE: usize = 0x4001_0C00;

/// Core clock of the reference board
pub const DEFAULT_CORE_HZ: u32 = 48_000_000;

/// All eight pins of a half-port as inputs with pull-up/pull-down
const CR_ALL_INPUT_PULL: u32 = 0x8888_8888;
/// All eight pins of a half-port as 10 MHz push-pull outputs
const CR_ALL_OUTPUT: u32 = 0x1111_1111;
/// Single pin as 2 MHz push-pull output
const PIN_MODE_OUTPUT: u32 = 0x2;
/// Pull-down selection while the data bus is an input
const ODR_READ: u32 = 0;

/// GPIO port register block
#[repr(C)]
pub struct GpioRegisters {
    /// Port configuration, pins 0..7
    pub crl: Volatile<u32>,
    /// Port configuration, pins 8..15
    pub crh: Volatile<u32>,
    /// Input data
    pub idr: ReadOnly<u32>,
    /// Output data
    pub odr: Volatile<u32>,
    /// Bit set (low half) and reset (high half)
    pub bsrr: WriteOnly<u32>,
    /// Bit reset
    pub brr: WriteOnly<u32>,
    /// Configuration lock
    pub lckr: Volatile<u32>,
}

impl GpioRegisters {
    fn set_pin_mode(&mut self, pin: u8, mode: u32) {
        let shift = u32::from(pin % 8) * 4;
        let cr = if pin < 8 { &mut self.crl } else { &mut self.crh };
        cr.update(|v| *v = (*v & !(0xF << shift)) | (mode << shift));
    }

    fn set_pin(&mut self, pin: u8) {
        self.bsrr.write(1 << pin);
    }

    fn reset_pin(&mut self, pin: u8) {
        self.bsrr.write(1 << (u32::from(pin) + 16));
    }
}

/// Placement of the control lines on GPIOA.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinMap {
    /// GPIOA pin carrying A0; A1 and A2 follow it
    pub address_offset: u8,
    pub read_strobe: u8,
    pub write_strobe: u8,
}

pub const REFERENCE_PINS: PinMap = PinMap {
    address_offset: 5,
    read_strobe: 11,
    write_strobe: 12,
};

/// BSRR word that drives the address lines to `addr` in one store
pub const fn address_bsrr(addr: u8, offset: u8) -> u32 {
    let addr = (addr & ADDRESS_MASK) as u32;
    let inverse = !addr & ADDRESS_MASK as u32;
    (addr << offset) | (inverse << (offset as u32 + 16))
}

/// Bus pins on GPIOA (control) and GPIOB (data).
pub struct Stm32f1Pins {
    control: &'static mut GpioRegisters,
    data: &'static mut GpioRegisters,
    map: PinMap,
}

impl Stm32f1Pins {
    /// # Safety
    /// The caller must own GPIOA and GPIOB exclusively and have enabled
    /// their clocks.
    pub unsafe fn new() -> Self {
        Self::with_pin_map(REFERENCE_PINS)
    }

    /// # Safety
    /// Same as [`Stm32f1Pins::new`].
    pub unsafe fn with_pin_map(map: PinMap) -> Self {
        Stm32f1Pins {
            control: &mut *(GPIOA_BASE as *mut GpioRegisters),
            data: &mut *(GPIOB_BASE as *mut GpioRegisters),
            map,
        }
    }

    pub fn pin_map(&self) -> PinMap {
        self.map
    }
}

impl BusPins for Stm32f1Pins {
    fn configure(&mut self) {
        let map = self.map;

        self.control.set_pin(map.read_strobe);
        self.control.set_pin(map.write_strobe);
        self.control.set_pin_mode(map.read_strobe, PIN_MODE_OUTPUT);
        self.control.set_pin_mode(map.write_strobe, PIN_MODE_OUTPUT);

        self.control.bsrr.write(address_bsrr(0, map.address_offset));
        for line in 0..crate::register::ADDRESS_LINES {
            self.control.set_pin_mode(map.address_offset + line, PIN_MODE_OUTPUT);
        }

        self.set_data_direction(DataDirection::Input);
    }

    fn set_address(&mut self, addr: u8) {
        self.control.bsrr.write(address_bsrr(addr, self.map.address_offset));
    }

    fn set_read_strobe(&mut self, level: Level) {
        match level {
            Level::Asserted => self.control.reset_pin(self.map.read_strobe),
            Level::Deasserted => self.control.set_pin(self.map.read_strobe),
        }
    }

    fn set_write_strobe(&mut self, level: Level) {
        match level {
            Level::Asserted => self.control.reset_pin(self.map.write_strobe),
            Level::Deasserted => self.control.set_pin(self.map.write_strobe),
        }
    }

    fn drive_data(&mut self, value: u16) {
        self.data.odr.write(u32::from(value));
    }

    fn set_data_direction(&mut self, direction: DataDirection) {
        match direction {
            DataDirection::Input => {
                self.data.odr.write(ODR_READ);
                self.data.crl.write(CR_ALL_INPUT_PULL);
                self.data.crh.write(CR_ALL_INPUT_PULL);
            }
            DataDirection::Output => {
                self.data.crl.write(CR_ALL_OUTPUT);
                self.data.crh.write(CR_ALL_OUTPUT);
            }
        }
    }

    fn sample_data(&mut self) -> u16 {
        (self.data.idr.read() & 0xFFFF) as u16
    }
}

/* ============================================================================
 * DWT STOPWATCH
 * ============================================================================ */

const DEMCR: usize = 0xE000_EDFC;
const DEMCR_TRCENA: u32 = 1 << 24;
const DWT_BASE: usize = 0xE000_1000;
const DWT_CTRL_CYCCNTENA: u32 = 1;

#[repr(C)]
struct DwtRegisters {
    ctrl: Volatile<u32>,
    cyccnt: Volatile<u32>,
}

/// Busy-wait delays counted on the Cortex-M3 cycle counter.
///
/// Copies share the one DWT unit; each access borrows its registers only
/// for the duration of that access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DwtStopwatch {
    core_hz: u32,
    dwt: usize,
    demcr: usize,
}

impl DwtStopwatch {
    /// # Safety
    /// Must run on a core with a DWT unit that nothing else reconfigures.
    pub const unsafe fn new(core_hz: u32) -> Self {
        DwtStopwatch {
            core_hz,
            dwt: DWT_BASE,
            demcr: DEMCR,
        }
    }

    /// Stopwatch over register blocks at the given addresses.
    ///
    /// # Safety
    /// Both pointers must stay valid for every use of the stopwatch and its
    /// copies.
    #[cfg(test)]
    unsafe fn with_registers(core_hz: u32, dwt: *mut DwtRegisters, demcr: *mut Volatile<u32>) -> Self {
        DwtStopwatch {
            core_hz,
            dwt: dwt as usize,
            demcr: demcr as usize,
        }
    }

    pub const fn core_hz(&self) -> u32 {
        self.core_hz
    }

    /// Cycles covering `ns`, rounded down
    pub const fn ns_to_ticks(&self, ns: u32) -> u32 {
        ((ns as u64 * self.core_hz as u64) / 1_000_000_000) as u32
    }

    pub const fn ticks_per_ms(&self) -> u32 {
        self.core_hz / 1000
    }

    /// Raw cycle counter value
    pub fn ticks(&self) -> u32 {
        let dwt = self.dwt as *const DwtRegisters;
        // SAFETY: constructing the stopwatch asserted the block is valid
        unsafe { (*dwt).cyccnt.read() }
    }

    fn enable_counter(&mut self) {
        // SAFETY: constructing the stopwatch asserted ownership of DEMCR and
        // the DWT; both borrows end with this function
        let (demcr, dwt) = unsafe {
            (
                &mut *(self.demcr as *mut Volatile<u32>),
                &mut *(self.dwt as *mut DwtRegisters),
            )
        };
        demcr.update(|v| *v |= DEMCR_TRCENA);
        dwt.cyccnt.write(0);
        dwt.ctrl.update(|v| *v |= DWT_CTRL_CYCCNTENA);
    }

    fn spin_ticks(&self, ticks: u32) {
        let start = self.ticks();
        while elapsed_ticks(start, self.ticks()) < ticks {
            core::hint::spin_loop();
        }
    }
}

/// Cycles between two counter samples, across a wrap of the counter
pub const fn elapsed_ticks(start: u32, now: u32) -> u32 {
    now.wrapping_sub(start)
}

impl DelayNs for DwtStopwatch {
    fn start(&mut self) {
        self.enable_counter();
    }

    fn delay_ns(&mut self, ns: u32) {
        self.spin_ticks(self.ns_to_ticks(ns));
    }
}

impl DelayMs for DwtStopwatch {
    fn delay_ms(&mut self, ms: u32) {
        let per_ms = self.ticks_per_ms();
        for _ in 0..ms {
            self.spin_ticks(per_ms);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_bsrr() {
        assert_eq!(address_bsrr(0, 5), 0b111 << 21);
        assert_eq!(address_bsrr(7, 5), 0b111 << 5);
        assert_eq!(address_bsrr(5, 5), (0b101 << 5) | (0b010 << 21));
        // Only three lines are wired
        assert_eq!(address_bsrr(0x0F, 5), address_bsrr(7, 5));
    }

    #[test]
    fn test_tick_conversion() {
        let sw = unsafe { DwtStopwatch::new(DEFAULT_CORE_HZ) };
        assert_eq!(sw.ns_to_ticks(165), 7);
        assert_eq!(sw.ns_to_ticks(20), 0);
        assert_eq!(sw.ns_to_ticks(1_000), 48);
        assert_eq!(sw.ticks_per_ms(), 48_000);
    }

    #[test]
    fn test_elapsed_across_wrap() {
        assert_eq!(elapsed_ticks(10, 25), 15);
        assert_eq!(elapsed_ticks(u32::MAX - 4, 5), 10);
    }

    #[test]
    fn test_register_block_layout() {
        assert_eq!(core::mem::size_of::<GpioRegisters>(), 7 * 4);
        assert_eq!(core::mem::size_of::<DwtRegisters>(), 2 * 4);
    }

    #[test]
    fn test_start_enables_counter() {
        let mut dwt = DwtRegisters {
            ctrl: Volatile::new(0x4000_0000),
            cyccnt: Volatile::new(1234),
        };
        let mut demcr = Volatile::new(0x0000_0001u32);
        let mut sw = unsafe { DwtStopwatch::with_registers(DEFAULT_CORE_HZ, &mut dwt, &mut demcr) };
        let copy = sw;
        assert_eq!(copy.ticks(), 1234);

        sw.start();
        assert_eq!(copy.ticks(), 0);
        // Zero-tick delays return without waiting on the counter
        sw.delay_ns(20);
        sw.delay_ms(0);
        assert_eq!(dwt.ctrl.read(), 0x4000_0001);
        assert_eq!(demcr.read(), 0x0100_0001);
        assert_eq!(dwt.cyccnt.read(), 0);
    }

    #[test]
    fn test_stopwatch_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<DwtStopwatch>();
    }
}
