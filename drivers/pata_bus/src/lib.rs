//! Bit-banged parallel ATA bus.
//!
//! A [`BusEngine`] drives the address lines, the two active-low strobes and
//! the 16-bit data bus of an ATA device in PIO mode, giving register-level
//! access through the [`RegisterBus`] trait. The pins and the delay source
//! are traits so the engine runs against hardware or a simulated device.
#![cfg_attr(not(test), no_std)]

pub mod delay;
pub mod engine;
pub mod pins;
pub mod register;
pub mod timing;

#[cfg(feature = "stm32f1")]
pub mod stm32f1;

pub use delay::{DelayMs, DelayNs, NoDelay};
pub use engine::{BusEngine, RegisterBus};
pub use pins::{BusPins, DataDirection, Level};
pub use register::Register;
pub use timing::BusTiming;
