//! CAN controller registers.
//!
//! Offsets are relative to the start of the CAN register block. The layout is
//! the one shared by the bxCAN controller and its WCH clone.

use modular_bitfield::prelude::*;
use ufmt::derive::uDebug;

#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Register {
    CTLR = 0x000,
    STATR = 0x004,
    TSTATR = 0x008,
    RFIFO0 = 0x00C,
    RFIFO1 = 0x010,
    BTIMR = 0x01C,
    TXMIR0 = 0x180,
    TXMDTR0 = 0x184,
    TXMDLR0 = 0x188,
    TXMDHR0 = 0x18C,
    TXMIR1 = 0x190,
    TXMDTR1 = 0x194,
    TXMDLR1 = 0x198,
    TXMDHR1 = 0x19C,
    TXMIR2 = 0x1A0,
    TXMDTR2 = 0x1A4,
    TXMDLR2 = 0x1A8,
    TXMDHR2 = 0x1AC,
    RXMIR0 = 0x1B0,
    RXMDTR0 = 0x1B4,
    RXMDLR0 = 0x1B8,
    RXMDHR0 = 0x1BC,
    RXMIR1 = 0x1C0,
    RXMDTR1 = 0x1C4,
    RXMDLR1 = 0x1C8,
    RXMDHR1 = 0x1CC,
    FCTLR = 0x200,
    FMCFGR = 0x204,
    FSCFGR = 0x20C,
    FAFIFOR = 0x214,
    FWR = 0x21C,
}

impl Register {
    /// Byte offset of the register inside the CAN block.
    #[inline]
    pub const fn addr(self) -> u16 {
        self as u16
    }
}

/// Offset of the first filter bank register (`F0R1`).
pub const FILTER_BANK_BASE: u16 = 0x240;

/// Filter initialization mode bit of `FCTLR`.
pub const FCTLR_FINIT: u32 = 1 << 0;

pub trait Reg: Copy {
    /// Register this type is read from and written to.
    const REGISTER: Register;

    /// Read the register into itself from its raw value.
    fn read(content: u32) -> Self;

    /// Write the register to its raw value.
    fn write(self) -> u32;
}

/// Control register.
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Ctlr {
    /// Initialization request.
    pub inrq: bool,
    /// Sleep mode request.
    pub sleep: bool,
    /// Transmit FIFO priority (chronological instead of by identifier).
    pub txfp: bool,
    /// Receive FIFO locked mode.
    pub rflm: bool,
    /// No automatic retransmission.
    pub nart: bool,
    /// Automatic wakeup mode.
    pub awum: bool,
    /// Automatic bus-off management.
    pub abom: bool,
    /// Time triggered communication mode.
    pub ttcm: bool,
    #[skip]
    __: B7,
    /// Software master reset.
    pub reset: bool,
    /// Debug freeze.
    pub dbf: bool,
    #[skip]
    __: B15,
}

/// Status register.
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Statr {
    /// Initialization acknowledge.
    #[skip(setters)]
    pub inak: bool,
    /// Sleep acknowledge.
    #[skip(setters)]
    pub slak: bool,
    pub erri: bool,
    pub wkui: bool,
    pub slaki: bool,
    #[skip]
    __: B3,
    #[skip(setters)]
    pub txm: bool,
    #[skip(setters)]
    pub rxm: bool,
    #[skip(setters)]
    pub samp: bool,
    #[skip(setters)]
    pub rx: bool,
    #[skip]
    __: B20,
}

/// Status bits of a single transmit mailbox inside `TSTATR`.
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq, BitfieldSpecifier)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MailboxStat {
    /// Request completed.
    pub rqcp: bool,
    /// Transmission OK.
    pub txok: bool,
    /// Arbitration lost.
    pub alst: bool,
    /// Transmission error.
    pub terr: bool,
    #[skip]
    __: B3,
    /// Abort request.
    pub abrq: bool,
}

/// Transmit status register.
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Tstatr {
    pub mb0: MailboxStat,
    pub mb1: MailboxStat,
    pub mb2: MailboxStat,
    /// Next empty mailbox.
    #[skip(setters)]
    pub code: B2,
    /// Mailbox 0 empty.
    #[skip(setters)]
    pub tme0: bool,
    /// Mailbox 1 empty.
    #[skip(setters)]
    pub tme1: bool,
    /// Mailbox 2 empty.
    #[skip(setters)]
    pub tme2: bool,
    #[skip(setters)]
    pub low0: bool,
    #[skip(setters)]
    pub low1: bool,
    #[skip(setters)]
    pub low2: bool,
}

/// Receive FIFO register (`RFIFO0`/`RFIFO1`).
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Rfifo {
    /// Number of pending messages, 0-3.
    #[skip(setters)]
    pub fmp: B2,
    #[skip]
    __: B1,
    /// FIFO full.
    pub full: bool,
    /// FIFO overrun.
    pub fovr: bool,
    /// Release output mailbox.
    pub rfom: bool,
    #[skip]
    __: B26,
}

/// Bit timing register.
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Btimr {
    /// Baud rate prescaler, minus one.
    pub brp: B10,
    #[skip]
    __: B6,
    /// Time segment 1, minus one.
    pub ts1: B4,
    /// Time segment 2, minus one.
    pub ts2: B3,
    #[skip]
    __: B1,
    /// Resynchronization jump width, minus one.
    pub sjw: B2,
    #[skip]
    __: B4,
    /// Loopback and silent mode bits.
    pub mode: Mode,
}

/// Data length and time stamp register of a mailbox (`TXMDTRx`/`RXMDTRx`).
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Mdtr {
    /// Data length code.
    pub dlc: B4,
    #[skip]
    __: B4,
    /// Index of the filter that accepted the frame. Receive side only.
    #[skip(setters)]
    pub fmi: B8,
    #[skip]
    __: B16,
}

///////////////////
/// Enums
///////////////////

/// Operating mode of the controller. The discriminants are the
/// `LBKM`/`SILM` bits of `BTIMR`.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, BitfieldSpecifier, uDebug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[bits = 2]
pub enum Mode {
    Normal,
    /// Transmitted frames are looped back into the receive path.
    Loopback,
    /// Listen only, the controller never drives the bus.
    Silent,
    SilentLoopback,
}

macro_rules! reg {
    ($($s:ty => $reg:expr),*) => {
        $(
            impl Reg for $s {
                const REGISTER: Register = $reg;

                #[inline]
                fn read(content: u32) -> Self {
                    Self::from_bytes(content.to_le_bytes())
                }

                #[inline]
                fn write(self) -> u32 {
                    u32::from_le_bytes(self.into_bytes())
                }
            }
        )*
    };
}

reg! {
    Ctlr => Register::CTLR,
    Statr => Register::STATR,
    Tstatr => Register::TSTATR,
    Btimr => Register::BTIMR
}

impl Rfifo {
    #[inline]
    pub fn from_raw(content: u32) -> Self {
        Self::from_bytes(content.to_le_bytes())
    }

    #[inline]
    pub fn to_raw(self) -> u32 {
        u32::from_le_bytes(self.into_bytes())
    }
}

impl Mdtr {
    #[inline]
    pub fn from_raw(content: u32) -> Self {
        Self::from_bytes(content.to_le_bytes())
    }

    #[inline]
    pub fn to_raw(self) -> u32 {
        u32::from_le_bytes(self.into_bytes())
    }
}
