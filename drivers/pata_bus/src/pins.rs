//! Pin-level access to the parallel bus.

/// Logical state of an active-low strobe line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// Line driven low, cycle in progress
    Asserted,
    /// Line released high
    Deasserted,
}

/// Direction of the 16 data lines as seen from the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataDirection {
    Input,
    Output,
}

/// The lines a bus engine toggles.
///
/// Implementations map these calls onto GPIO registers; test doubles
/// record or simulate them.
pub trait BusPins {
    /// Puts every line in its idle state: strobes deasserted, address
    /// lines at zero, data bus an input.
    fn configure(&mut self);

    /// Drives the low three bits of `addr` onto the address lines
    fn set_address(&mut self, addr: u8);

    fn set_read_strobe(&mut self, level: Level);

    fn set_write_strobe(&mut self, level: Level);

    /// Latches `value` into the data output register. Has no effect on the
    /// lines until the bus is switched to output.
    fn drive_data(&mut self, value: u16);

    fn set_data_direction(&mut self, direction: DataDirection);

    /// Samples all 16 data lines
    fn sample_data(&mut self) -> u16;
}
