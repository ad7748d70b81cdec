use embedded_hal::can::{ExtendedId, Id, StandardId};
use ufmt::derive::uDebug;

use crate::{mailbox::IdentReg, regs::FILTER_BANK_BASE};

/// Standard identifier accepted by the default standard-format filter.
pub const STANDARD_FILTER_ID: u16 = 0x317;

/// Extended identifier accepted by the default extended-format filter.
pub const EXTENDED_FILTER_ID: u32 = 0x1212_4567;

/// Identifier format a filter is built for.
#[derive(uDebug, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameFormat {
    /// 11-bit identifiers.
    Standard,
    /// 29-bit identifiers.
    Extended,
}

/// Acceptance filter in 32-bit scale, identifier/mask mode.
///
/// A frame passes when every bit set in `mask` has the same value in the
/// frame's identifier register as in `id`. Bit 0 is never compared.
#[derive(uDebug, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Filter {
    /// `STID:EXID:IDE:RTR:0` value to match.
    pub id: u32,
    /// Bits of `id` that have to match.
    pub mask: u32,
}

impl Filter {
    /// Identifier bits, `IDE` and `RTR` of a standard frame.
    const MASK_STANDARD: u32 = 0xFFE0_0006;
    /// Identifier bits, `IDE` and `RTR` of an extended frame.
    const MASK_EXTENDED: u32 = 0xFFFF_FFFE;

    /// Creates a filter from raw register values.
    pub const fn new(id: u32, mask: u32) -> Self {
        Self { id, mask }
    }

    /// Accepts data frames carrying exactly `id`.
    pub fn exact(id: Id) -> Self {
        let mask = match id {
            Id::Standard(_) => Self::MASK_STANDARD,
            Id::Extended(_) => Self::MASK_EXTENDED,
        };
        Self {
            id: IdentReg::from_id(id).to_raw(),
            mask,
        }
    }

    /// Accepts every frame.
    pub const fn accept_all() -> Self {
        Self { id: 0, mask: 0 }
    }

    /// The fixed filter used for `format`: standard 0x317 or extended
    /// 0x12124567.
    pub fn for_format(format: FrameFormat) -> Self {
        match format {
            FrameFormat::Standard => Self::exact(Id::Standard(
                StandardId::new(STANDARD_FILTER_ID).unwrap_or(StandardId::ZERO),
            )),
            FrameFormat::Extended => Self::exact(Id::Extended(
                ExtendedId::new(EXTENDED_FILTER_ID).unwrap_or(ExtendedId::ZERO),
            )),
        }
    }

    /// Whether a frame with the raw identifier register `ident` passes.
    pub fn matches(&self, ident: u32) -> bool {
        (ident ^ self.id) & self.mask & !1 == 0
    }
}

impl Default for Filter {
    fn default() -> Self {
        Self::for_format(FrameFormat::Standard)
    }
}

/// One of the controller's filter banks.
#[derive(uDebug, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FilterBank(u8);

impl FilterBank {
    /// Number of banks on single-CAN parts.
    pub const COUNT: u8 = 14;

    /// Bank 0, the one installed by [`crate::Can::init`].
    pub const B0: Self = Self(0);

    /// Returns bank `n`, or `None` when the part has no such bank.
    pub const fn new(n: u8) -> Option<Self> {
        if n < Self::COUNT {
            Some(Self(n))
        } else {
            None
        }
    }

    /// Bit of this bank in the `FMCFGR`, `FSCFGR`, `FAFIFOR` and `FWR`
    /// registers.
    #[inline]
    pub const fn bit(self) -> u32 {
        1 << self.0
    }

    /// Offset of `FnR1`, which holds the identifier.
    #[inline]
    pub const fn r1(self) -> u16 {
        FILTER_BANK_BASE + 8 * self.0 as u16
    }

    /// Offset of `FnR2`, which holds the mask.
    #[inline]
    pub const fn r2(self) -> u16 {
        self.r1() + 4
    }
}
