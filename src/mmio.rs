//! `CAN1` of CH32V20x parts, driven through `ch32-metapac`.

use ch32_metapac as pac;
use pac::{
    common::{Reg, RW},
    gpio::{
        vals::{Cnf, Mode},
        Gpio,
    },
    AFIO, CAN1, RCC,
};
use ufmt::derive::uDebug;

use crate::periph::{Peripheral, PinMode};

/// Pin pairs `CAN1` can be remapped onto, as `RX`/`TX`.
#[derive(uDebug, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Can1Pins {
    /// `RX` on PA11, `TX` on PA12. No remap.
    PA11PA12,
    /// `RX` on PB8, `TX` on PB9.
    PB8PB9,
    /// `RX` on PD0, `TX` on PD1.
    PD0PD1,
}

impl Can1Pins {
    /// Value of the `CAN1_RM` field of `AFIO_PCFR1`.
    const fn remap(self) -> u8 {
        match self {
            Can1Pins::PA11PA12 => 0b00,
            Can1Pins::PB8PB9 => 0b10,
            Can1Pins::PD0PD1 => 0b11,
        }
    }

    fn port(self) -> Gpio {
        match self {
            Can1Pins::PA11PA12 => pac::GPIOA,
            Can1Pins::PB8PB9 => pac::GPIOB,
            Can1Pins::PD0PD1 => pac::GPIOD,
        }
    }

    /// Pin numbers within the port, as `(rx, tx)`.
    const fn numbers(self) -> (usize, usize) {
        match self {
            Can1Pins::PA11PA12 => (11, 12),
            Can1Pins::PB8PB9 => (8, 9),
            Can1Pins::PD0PD1 => (0, 1),
        }
    }
}

impl PinMode {
    fn mode_cnf(self) -> (Mode, Cnf) {
        match self {
            PinMode::AlternatePushPull => (Mode::OUTPUT_50MHZ, Cnf::PULL_IN__AF_PUSH_PULL_OUT),
            PinMode::InputPullUp => (Mode::INPUT, Cnf::PULL_IN__AF_PUSH_PULL_OUT),
        }
    }
}

/// `CAN1` controller.
#[derive(Debug)]
pub struct Can1 {
    pins: Can1Pins,
}

impl Can1 {
    /// Creates a handle to `CAN1` routed to `pins`.
    ///
    /// # Safety
    ///
    /// The caller must be the only user of `CAN1` and of the pins, and must
    /// not reconfigure the RCC/AFIO bits this handle touches from elsewhere
    /// while it is alive.
    pub unsafe fn steal(pins: Can1Pins) -> Self {
        Self { pins }
    }

    fn configure_pin(port: Gpio, n: usize, pin: PinMode) {
        let (mode, cnf) = pin.mode_cnf();
        if n < 8 {
            port.cfglr().modify(|w| {
                w.set_mode(n, mode);
                w.set_cnf(n, cnf);
            });
        } else {
            port.cfghr().modify(|w| {
                w.set_mode(n - 8, mode);
                w.set_cnf(n - 8, cnf);
            });
        }
        // Pull direction of an input follows the output data bit.
        if pin == PinMode::InputPullUp {
            port.outdr().modify(|w| w.set_odr(n, true));
        }
    }

    /// Register at byte offset `addr` of the CAN block.
    fn reg(addr: u16) -> Reg<u32, RW> {
        let base = CAN1.as_ptr() as *mut u8;
        // SAFETY: every offset the driver uses lies inside the CAN1 block.
        unsafe { Reg::from_ptr(base.add(usize::from(addr)) as *mut u32) }
    }
}

impl Peripheral for Can1 {
    fn enable_clocks(&mut self) {
        let pins = self.pins;
        RCC.apb2pcenr().modify(|w| {
            w.set_afioen(true);
            match pins {
                Can1Pins::PA11PA12 => w.set_iopaen(true),
                Can1Pins::PB8PB9 => w.set_iopben(true),
                Can1Pins::PD0PD1 => w.set_iopden(true),
            }
        });
        RCC.apb1pcenr().modify(|w| w.set_can1en(true));
    }

    fn configure_pins(&mut self, tx: PinMode, rx: PinMode) {
        AFIO.pcfr1().modify(|w| w.set_can1_rm(self.pins.remap()));

        let port = self.pins.port();
        let (rx_pin, tx_pin) = self.pins.numbers();
        Self::configure_pin(port, tx_pin, tx);
        Self::configure_pin(port, rx_pin, rx);
    }

    #[inline]
    fn read(&mut self, addr: u16) -> u32 {
        Self::reg(addr).read()
    }

    #[inline]
    fn write(&mut self, addr: u16, value: u32) {
        Self::reg(addr).write_value(value)
    }
}
