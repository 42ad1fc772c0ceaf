//! Bus transaction engine.
//!
//! Turns register reads and writes into timed sequences of pin changes.
//! Every access ends with the data bus back in input mode so the host never
//! drives against the device.

use log::{debug, trace, warn};

use crate::delay::{DelayMs, DelayNs};
use crate::pins::{BusPins, DataDirection, Level};
use crate::register::Register;
use crate::timing::BusTiming;

/// Register-level access to an ATA device.
///
/// The protocol engine talks to the device only through this trait, which
/// lets it run against simulated devices as well as real pins.
pub trait RegisterBus {
    fn read_register(&mut self, reg: Register) -> u16;

    fn write_register(&mut self, reg: Register, value: u16);

    /// Reads `words.len()` consecutive values from one register
    fn read_words(&mut self, reg: Register, words: &mut [u16]) {
        for word in words.iter_mut() {
            *word = self.read_register(reg);
        }
    }

    /// Writes every value of `words` to one register, in order
    fn write_words(&mut self, reg: Register, words: &[u16]) {
        for &word in words {
            self.write_register(reg, word);
        }
    }
}

impl<T: RegisterBus + ?Sized> RegisterBus for &mut T {
    fn read_register(&mut self, reg: Register) -> u16 {
        (**self).read_register(reg)
    }

    fn write_register(&mut self, reg: Register, value: u16) {
        (**self).write_register(reg, value)
    }

    fn read_words(&mut self, reg: Register, words: &mut [u16]) {
        (**self).read_words(reg, words)
    }

    fn write_words(&mut self, reg: Register, words: &[u16]) {
        (**self).write_words(reg, words)
    }
}

/// Bit-banged bus master over a set of pins and a delay source.
pub struct BusEngine<P, D> {
    pins: P,
    delay: D,
    timing: BusTiming,
    direction: DataDirection,
    initialized: bool,
}

impl<P: BusPins, D: DelayNs + DelayMs> BusEngine<P, D> {
    pub fn new(pins: P, delay: D) -> Self {
        Self::with_timing(pins, delay, BusTiming::PIO0)
    }

    pub fn with_timing(pins: P, delay: D, timing: BusTiming) -> Self {
        BusEngine {
            pins,
            delay,
            timing,
            direction: DataDirection::Input,
            initialized: false,
        }
    }

    /// Puts the lines in their idle state and starts the delay counter.
    ///
    /// Calling it again is harmless; the lines return to idle.
    pub fn initialize(&mut self) {
        self.pins.configure();
        self.direction = DataDirection::Input;
        self.delay.start();
        self.initialized = true;
        debug!("bus engine initialized: {:?}", self.timing);
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn timing(&self) -> &BusTiming {
        &self.timing
    }

    /// Current direction of the data lines
    pub fn data_direction(&self) -> DataDirection {
        self.direction
    }

    pub fn pins(&self) -> &P {
        &self.pins
    }

    pub fn release(self) -> (P, D) {
        (self.pins, self.delay)
    }

    fn ensure_initialized(&mut self) {
        if !self.initialized {
            warn!("bus used before initialization, initializing now");
            self.initialize();
        }
    }

    fn select(&mut self, reg: Register) {
        self.pins.set_address(reg.address());
        self.delay.delay_ns(self.timing.address_setup_ns);
    }

    fn set_direction(&mut self, direction: DataDirection) {
        self.pins.set_data_direction(direction);
        self.direction = direction;
    }

    fn settle(&mut self) {
        if self.timing.settle_ms > 0 {
            self.delay.delay_ms(self.timing.settle_ms);
        }
    }

    /// Performs one read cycle and returns the sampled data lines.
    pub fn read(&mut self, reg: Register) -> u16 {
        self.ensure_initialized();

        self.select(reg);
        self.set_direction(DataDirection::Input);

        self.pins.set_read_strobe(Level::Asserted);
        self.delay.delay_ns(self.timing.data_setup_ns);
        let value = self.pins.sample_data();
        self.pins.set_read_strobe(Level::Deasserted);
        self.delay.delay_ns(self.timing.read_hold_ns);

        self.settle();
        trace!("read {} -> {:#06x}", reg, value);
        value
    }

    /// Performs one write cycle, leaving the data bus as an input.
    pub fn write(&mut self, reg: Register, value: u16) {
        self.ensure_initialized();
        trace!("write {} <- {:#06x}", reg, value);

        self.select(reg);

        self.pins.set_write_strobe(Level::Asserted);
        self.delay.delay_ns(self.timing.write_lead_ns());
        self.pins.drive_data(value);
        self.set_direction(DataDirection::Output);
        self.delay.delay_ns(self.timing.write_setup_ns);
        self.pins.set_write_strobe(Level::Deasserted);
        self.delay.delay_ns(self.timing.write_hold_ns);

        self.set_direction(DataDirection::Input);
        self.settle();
    }
}

impl<P: BusPins, D: DelayNs + DelayMs> RegisterBus for BusEngine<P, D> {
    fn read_register(&mut self, reg: Register) -> u16 {
        self.read(reg)
    }

    fn write_register(&mut self, reg: Register, value: u16) {
        self.write(reg, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delay::NoDelay;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::vec::Vec;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Event {
        Configure,
        Address(u8),
        ReadStrobe(Level),
        WriteStrobe(Level),
        Drive(u16),
        Direction(DataDirection),
        Sample(u16),
        Start,
        Ns(u32),
        Ms(u32),
    }

    type Log = Rc<RefCell<Vec<Event>>>;

    struct RecordingPins {
        log: Log,
        bus_value: u16,
    }

    impl BusPins for RecordingPins {
        fn configure(&mut self) {
            self.log.borrow_mut().push(Event::Configure);
        }

        fn set_address(&mut self, addr: u8) {
            self.log.borrow_mut().push(Event::Address(addr));
        }

        fn set_read_strobe(&mut self, level: Level) {
            self.log.borrow_mut().push(Event::ReadStrobe(level));
        }

        fn set_write_strobe(&mut self, level: Level) {
            self.log.borrow_mut().push(Event::WriteStrobe(level));
        }

        fn drive_data(&mut self, value: u16) {
            self.log.borrow_mut().push(Event::Drive(value));
        }

        fn set_data_direction(&mut self, direction: DataDirection) {
            self.log.borrow_mut().push(Event::Direction(direction));
        }

        fn sample_data(&mut self) -> u16 {
            self.log.borrow_mut().push(Event::Sample(self.bus_value));
            self.bus_value
        }
    }

    struct RecordingDelay {
        log: Log,
    }

    impl DelayNs for RecordingDelay {
        fn start(&mut self) {
            self.log.borrow_mut().push(Event::Start);
        }

        fn delay_ns(&mut self, ns: u32) {
            self.log.borrow_mut().push(Event::Ns(ns));
        }
    }

    impl DelayMs for RecordingDelay {
        fn delay_ms(&mut self, ms: u32) {
            self.log.borrow_mut().push(Event::Ms(ms));
        }
    }

    fn recording_engine(bus_value: u16) -> (BusEngine<RecordingPins, RecordingDelay>, Log) {
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let pins = RecordingPins { log: log.clone(), bus_value };
        let delay = RecordingDelay { log: log.clone() };
        (BusEngine::new(pins, delay), log)
    }

    /// Device model that latches writes on the strobe release and answers
    /// reads only while the read strobe is held.
    struct EchoPins {
        regs: [u16; 8],
        address: u8,
        direction: DataDirection,
        latched: u16,
        read_strobe: Level,
        write_strobe: Level,
    }

    impl EchoPins {
        fn new() -> Self {
            EchoPins {
                regs: [0; 8],
                address: 0,
                direction: DataDirection::Input,
                latched: 0,
                read_strobe: Level::Deasserted,
                write_strobe: Level::Deasserted,
            }
        }

        fn register(&self) -> Register {
            Register::from_address(self.address).unwrap()
        }
    }

    impl BusPins for EchoPins {
        fn configure(&mut self) {
            self.address = 0;
            self.direction = DataDirection::Input;
            self.read_strobe = Level::Deasserted;
            self.write_strobe = Level::Deasserted;
        }

        fn set_address(&mut self, addr: u8) {
            assert_eq!(self.read_strobe, Level::Deasserted, "address changed mid read");
            assert_eq!(self.write_strobe, Level::Deasserted, "address changed mid write");
            self.address = addr & 0x07;
        }

        fn set_read_strobe(&mut self, level: Level) {
            if level == Level::Asserted {
                assert_eq!(self.direction, DataDirection::Input, "bus contention");
            }
            self.read_strobe = level;
        }

        fn set_write_strobe(&mut self, level: Level) {
            if self.write_strobe == Level::Asserted && level == Level::Deasserted {
                assert_eq!(self.direction, DataDirection::Output, "write latched a floating bus");
                let reg = self.register();
                self.regs[self.address as usize] = self.latched & reg.width_mask();
            }
            self.write_strobe = level;
        }

        fn drive_data(&mut self, value: u16) {
            self.latched = value;
        }

        fn set_data_direction(&mut self, direction: DataDirection) {
            if direction == DataDirection::Output {
                assert_eq!(self.read_strobe, Level::Deasserted, "bus contention");
            }
            self.direction = direction;
        }

        fn sample_data(&mut self) -> u16 {
            assert_eq!(self.read_strobe, Level::Asserted, "sampled outside the read strobe");
            self.regs[self.address as usize]
        }
    }

    #[test]
    fn test_initialize_idles_lines() {
        let (mut engine, log) = recording_engine(0);
        engine.initialize();
        assert!(engine.is_initialized());
        assert_eq!(engine.data_direction(), DataDirection::Input);
        assert_eq!(*log.borrow(), [Event::Configure, Event::Start]);
    }

    #[test]
    fn test_read_cycle_order() {
        let (mut engine, log) = recording_engine(0x0058);
        engine.initialize();
        log.borrow_mut().clear();

        assert_eq!(engine.read(Register::STATUS), 0x0058);
        assert_eq!(
            *log.borrow(),
            [
                Event::Address(7),
                Event::Ns(165),
                Event::Direction(DataDirection::Input),
                Event::ReadStrobe(Level::Asserted),
                Event::Ns(165),
                Event::Sample(0x0058),
                Event::ReadStrobe(Level::Deasserted),
                Event::Ns(20),
                Event::Ms(1),
            ]
        );
    }

    #[test]
    fn test_write_cycle_order() {
        let (mut engine, log) = recording_engine(0);
        engine.initialize();
        log.borrow_mut().clear();

        engine.write(Register::COMMAND, 0xEC);
        assert_eq!(
            *log.borrow(),
            [
                Event::Address(7),
                Event::Ns(165),
                Event::WriteStrobe(Level::Asserted),
                Event::Ns(105),
                Event::Drive(0xEC),
                Event::Direction(DataDirection::Output),
                Event::Ns(60),
                Event::WriteStrobe(Level::Deasserted),
                Event::Ns(30),
                Event::Direction(DataDirection::Input),
                Event::Ms(1),
            ]
        );
        assert_eq!(engine.data_direction(), DataDirection::Input);
    }

    #[test]
    fn test_distinct_address_setup_timing() {
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let pins = RecordingPins { log: log.clone(), bus_value: 0 };
        let delay = RecordingDelay { log: log.clone() };
        let mut engine = BusEngine::with_timing(pins, delay, BusTiming::distinct_address_setup());
        engine.initialize();
        log.borrow_mut().clear();

        engine.read(Register::Data);
        assert_eq!(log.borrow()[1], Event::Ns(70));
    }

    #[test]
    fn test_lazy_initialization() {
        let (mut engine, log) = recording_engine(0);
        engine.write(Register::Lba0, 0x12);
        assert!(engine.is_initialized());
        assert_eq!(log.borrow()[0], Event::Configure);
        assert_eq!(log.borrow()[1], Event::Start);
        assert_eq!(log.borrow().iter().filter(|e| **e == Event::Configure).count(), 1);
    }

    #[test]
    fn test_echo_every_register() {
        let mut engine = BusEngine::new(EchoPins::new(), NoDelay);
        engine.initialize();

        for reg in Register::ALL {
            for value in [0x0000u16, 0x00A5, 0x1234, 0xFFFF] {
                engine.write_register(reg, value);
                assert_eq!(engine.data_direction(), DataDirection::Input);
                assert_eq!(engine.pins().direction, DataDirection::Input);
                assert_eq!(engine.read_register(reg), value & reg.width_mask(), "{}", reg);
            }
        }
    }

    #[test]
    fn test_block_words() {
        let mut engine = BusEngine::new(EchoPins::new(), NoDelay);
        engine.write_words(Register::Lba1, &[0x11, 0x22, 0x33]);
        let mut out = [0u16; 2];
        engine.read_words(Register::Lba1, &mut out);
        assert_eq!(out, [0x33, 0x33]);
    }
}
