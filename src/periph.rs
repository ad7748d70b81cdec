//! Access to the CAN controller hardware.
//!
//! [`crate::Can`] owns one [`Peripheral`] and performs every register access
//! through it. `mmio::Can1` drives the real controller; tests can
//! substitute a simulated one.

use ufmt::derive::uDebug;

/// Electrical configuration of a CAN pin.
#[derive(uDebug, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinMode {
    /// Alternate function push-pull output, 50 MHz. Used for `CAN_TX`.
    AlternatePushPull,
    /// Input with pull-up. Used for `CAN_RX`.
    InputPullUp,
}

/// A CAN controller instance with its clock and pins.
pub trait Peripheral {
    /// Enables the bus clocks of the controller and of the GPIO ports it uses.
    fn enable_clocks(&mut self);

    /// Routes the controller to its pins and configures them.
    fn configure_pins(&mut self, tx: PinMode, rx: PinMode);

    /// Reads the register at byte offset `addr` of the CAN block.
    fn read(&mut self, addr: u16) -> u32;

    /// Writes the register at byte offset `addr` of the CAN block.
    fn write(&mut self, addr: u16, value: u32);

    /// Read-modify-write of the register at `addr`.
    #[inline]
    fn modify(&mut self, addr: u16, f: impl FnOnce(u32) -> u32) {
        let value = self.read(addr);
        self.write(addr, f(value));
    }
}

impl<P: Peripheral> Peripheral for &mut P {
    #[inline]
    fn enable_clocks(&mut self) {
        (**self).enable_clocks()
    }

    #[inline]
    fn configure_pins(&mut self, tx: PinMode, rx: PinMode) {
        (**self).configure_pins(tx, rx)
    }

    #[inline]
    fn read(&mut self, addr: u16) -> u32 {
        (**self).read(addr)
    }

    #[inline]
    fn write(&mut self, addr: u16, value: u32) {
        (**self).write(addr, value)
    }
}
