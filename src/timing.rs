//! Bit timing.
//!
//! The bit rate is `pclk / (prescaler * (1 + seg1 + seg2))`, all counted in
//! time quanta. Nothing here is checked unless [`BitTiming::validate`] is
//! called: out of range values are masked into the register and yield a
//! different bit rate.

use ufmt::derive::uDebug;

use crate::{
    error::{Error, Result},
    regs::{Btimr, Mode},
};

/// Bit timing parameters, in time quanta.
#[derive(uDebug, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BitTiming {
    /// Resynchronization jump width, 1-4.
    pub sjw: u8,
    /// Time segment 1, 1-16.
    pub seg1: u8,
    /// Time segment 2, 1-8.
    pub seg2: u8,
    /// Length of a time quantum in peripheral clock cycles, 1-1024.
    pub prescaler: u16,
}

impl BitTiming {
    /// 333 kbit/s from a 48 MHz peripheral clock, sample point at 58%.
    pub const KBPS_333_AT_48MHZ: Self = Self::new(1, 6, 5, 12);

    pub const fn new(sjw: u8, seg1: u8, seg2: u8, prescaler: u16) -> Self {
        Self {
            sjw,
            seg1,
            seg2,
            prescaler,
        }
    }

    /// Time quanta per bit, including the sync segment.
    pub const fn quanta_per_bit(&self) -> u32 {
        1 + self.seg1 as u32 + self.seg2 as u32
    }

    /// Bit rate produced from a peripheral clock of `pclk_hz`.
    pub const fn bitrate(&self, pclk_hz: u32) -> u32 {
        let divisor = self.prescaler as u32 * self.quanta_per_bit();
        if divisor == 0 {
            0
        } else {
            pclk_hz / divisor
        }
    }

    /// Opt-in range check against the limits of `BTIMR`.
    pub fn validate(&self) -> Result<()> {
        let ok = (1..=4).contains(&self.sjw)
            && (1..=16).contains(&self.seg1)
            && (1..=8).contains(&self.seg2)
            && (1..=1024).contains(&self.prescaler);
        if ok {
            Ok(())
        } else {
            Err(Error::InvalidTiming)
        }
    }

    /// Encodes the timing and `mode` into `BTIMR`. Every field is stored
    /// minus one and masked to its width.
    pub fn to_register(&self, mode: Mode) -> Btimr {
        Btimr::new()
            .with_brp(self.prescaler.wrapping_sub(1) & 0x3FF)
            .with_ts1(self.seg1.wrapping_sub(1) & 0xF)
            .with_ts2(self.seg2.wrapping_sub(1) & 0x7)
            .with_sjw(self.sjw.wrapping_sub(1) & 0x3)
            .with_mode(mode)
    }
}

impl Default for BitTiming {
    fn default() -> Self {
        Self::KBPS_333_AT_48MHZ
    }
}
