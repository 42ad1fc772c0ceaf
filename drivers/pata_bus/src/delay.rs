//! Delay providers used by the bus and protocol engines.

/// Busy-wait delay with nanosecond resolution.
pub trait DelayNs {
    /// Enables or restarts the counter behind the delay. Called once when
    /// the bus engine initializes.
    fn start(&mut self) {}

    fn delay_ns(&mut self, ns: u32);
}

/// Coarse millisecond delay.
pub trait DelayMs {
    fn delay_ms(&mut self, ms: u32);
}

impl<T: DelayNs + ?Sized> DelayNs for &mut T {
    fn start(&mut self) {
        (**self).start()
    }

    fn delay_ns(&mut self, ns: u32) {
        (**self).delay_ns(ns)
    }
}

impl<T: DelayMs + ?Sized> DelayMs for &mut T {
    fn delay_ms(&mut self, ms: u32) {
        (**self).delay_ms(ms)
    }
}

/// Delay that returns immediately, for simulated devices.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

impl DelayMs for NoDelay {
    fn delay_ms(&mut self, _ms: u32) {}
}
