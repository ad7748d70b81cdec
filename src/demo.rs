//! Demo loop: send a counter-derived test frame every second and print
//! whatever arrives.

use embedded_hal::{
    blocking::delay::DelayMs,
    can::{Frame, Id, StandardId},
    timer::CountDown,
};
use ufmt::{uWrite, uwrite};

use crate::{periph::Peripheral, Can};

/// Identifier the demo frames are sent with.
pub const DEMO_TX_ID: u16 = 0x320;

/// Pause between sending and polling, in milliseconds.
pub const DEMO_PERIOD_MS: u16 = 1000;

/// Bus bit rate the demo nodes agree on.
pub const DEMO_BITRATE: u32 = 333_333;

/// CAN kernel clock the default [`crate::timing::BitTiming`] is computed
/// for. On CH32V20x this is PCLK1, half of a 96 MHz system clock.
pub const DEMO_CAN_CLOCK_HZ: u32 = 48_000_000;

/// Test payload for a counter value. Every byte wraps.
pub fn payload(counter: u8) -> [u8; 8] {
    [
        counter,
        100u8.wrapping_sub(counter),
        2u8.wrapping_add(counter),
        99,
        120u8.wrapping_add(counter),
        13,
        99u8.wrapping_sub(counter),
        77u8.wrapping_add(counter),
    ]
}

/// State of the demo loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Demo {
    counter: u8,
}

impl Demo {
    pub const fn new() -> Self {
        Self { counter: 0 }
    }

    /// Counter value used by the last step.
    pub const fn counter(&self) -> u8 {
        self.counter
    }

    /// Runs one iteration: send the next test frame, sleep, then poll once.
    ///
    /// Transmit failures are reported on `console` and otherwise ignored.
    /// Only errors of the console itself are returned.
    pub fn step<P, T, D, W>(
        &mut self,
        can: &mut Can<P, T>,
        delay: &mut D,
        console: &mut W,
    ) -> Result<(), W::Error>
    where
        P: Peripheral,
        T: CountDown,
        T::Time: Copy,
        D: DelayMs<u16>,
        W: uWrite + ?Sized,
    {
        self.counter = self.counter.wrapping_add(1);
        let data = payload(self.counter);
        let id = StandardId::new(DEMO_TX_ID).unwrap_or(StandardId::MAX);

        if let Err(_e) = can.send(&data, id) {
            #[cfg(feature = "defmt")]
            defmt::warn!("demo frame {} not sent: {}", self.counter, _e);
            uwrite!(console, "Error: CAN_BUS failed!\r\n")?;
        }

        delay.delay_ms(DEMO_PERIOD_MS);

        if let Some(frame) = can.try_receive() {
            let raw = match frame.id() {
                Id::Standard(id) => u32::from(id.as_raw()),
                Id::Extended(id) => id.as_raw(),
            };
            uwrite!(console, "Received Data with ID: 0x{:X}\r\n", raw)?;
            for byte in frame.data() {
                uwrite!(console, "{} ", *byte)?;
            }
            uwrite!(console, "\r\n")?;
        }

        Ok(())
    }
}

/// Runs the demo forever. Console errors are dropped.
pub fn run<P, T, D, W>(can: &mut Can<P, T>, delay: &mut D, console: &mut W) -> !
where
    P: Peripheral,
    T: CountDown,
    T::Time: Copy,
    D: DelayMs<u16>,
    W: uWrite + ?Sized,
{
    let mut demo = Demo::new();
    loop {
        let _ = demo.step(can, delay, console);
    }
}
