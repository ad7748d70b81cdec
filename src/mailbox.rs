use embedded_hal::can::{ExtendedId, Id, StandardId};
use modular_bitfield::prelude::*;
use ufmt::derive::uDebug;

use crate::regs::Register;

/// Identifier register of a mailbox (`TXMIRx`/`RXMIRx`).
///
/// Filter bank registers in 32-bit scale share this layout, with bit 0 unused.
#[bitfield]
#[derive(uDebug, Clone, Copy, PartialEq, Eq)]
pub struct IdentReg {
    /// Transmit request. Transmit mailboxes only.
    pub txrq: bool,
    /// Remote transmission request.
    pub rtr: bool,
    /// Identifier extension.
    pub ide: bool,
    /// Extended identifier, lower 18 bits.
    pub exid: B18,
    /// Standard identifier, or upper 11 bits of an extended identifier.
    pub stid: B11,
}

impl IdentReg {
    /// Creates an identifier register from a CAN bus ID.
    pub fn from_id(id: Id) -> Self {
        // Standard: `ide == false` and the identifier goes into `stid`.
        // Extended: `ide == true`, the lower 18 bits go into `exid` and the upper
        // 11 bits into `stid`.
        match id {
            Id::Standard(id) => IdentReg::new().with_ide(false).with_stid(id.as_raw()),
            Id::Extended(id) => IdentReg::new()
                .with_ide(true)
                .with_exid(id.as_raw() & 0x3FFFF) // Lower 18 bits in EXID
                .with_stid((id.as_raw() >> 18) as u16), // Upper 11 bits in STID
        }
    }

    /// Decodes the CAN bus ID held in the register.
    pub fn id(&self) -> Id {
        if self.ide() {
            let raw = (u32::from(self.stid()) << 18) | self.exid();
            // 11 + 18 bits always fit in an extended identifier.
            Id::Extended(ExtendedId::new(raw).unwrap_or(ExtendedId::MAX))
        } else {
            Id::Standard(StandardId::new(self.stid()).unwrap_or(StandardId::MAX))
        }
    }

    #[inline]
    pub fn from_raw(content: u32) -> Self {
        Self::from_bytes(content.to_le_bytes())
    }

    #[inline]
    pub fn to_raw(self) -> u32 {
        u32::from_le_bytes(self.into_bytes())
    }
}

/// Packs up to 8 data bytes into the `MDLR`/`MDHR` register pair.
pub fn pack_data(data: &[u8]) -> (u32, u32) {
    let mut bytes = [0u8; 8];
    let n = data.len().min(8);
    bytes[..n].copy_from_slice(&data[..n]);
    (
        u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
        u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
    )
}

/// Unpacks the `MDLR`/`MDHR` register pair into 8 data bytes.
pub fn unpack_data(low: u32, high: u32) -> [u8; 8] {
    let mut bytes = [0u8; 8];
    bytes[..4].copy_from_slice(&low.to_le_bytes());
    bytes[4..].copy_from_slice(&high.to_le_bytes());
    bytes
}

crate::mailbox_def! {
    /// Transmit mailbox.
    TxMailbox => {
        /// Tx mailbox 0.
        M0 => [Register::TXMIR0, Register::TXMDTR0, Register::TXMDLR0, Register::TXMDHR0],
        /// Tx mailbox 1.
        M1 => [Register::TXMIR1, Register::TXMDTR1, Register::TXMDLR1, Register::TXMDHR1],
        /// Tx mailbox 2.
        M2 => [Register::TXMIR2, Register::TXMDTR2, Register::TXMDLR2, Register::TXMDHR2]
    }
}

crate::mailbox_def! {
    /// Receive FIFO output mailbox.
    RxFifo => {
        /// FIFO 0.
        Fifo0 => [Register::RXMIR0, Register::RXMDTR0, Register::RXMDLR0, Register::RXMDHR0],
        /// FIFO 1.
        Fifo1 => [Register::RXMIR1, Register::RXMDTR1, Register::RXMDLR1, Register::RXMDHR1]
    }
}

impl RxFifo {
    /// Returns the `RFIFOx` register of the selected FIFO.
    pub const fn rfifo(self) -> Register {
        match self {
            RxFifo::Fifo0 => Register::RFIFO0,
            RxFifo::Fifo1 => Register::RFIFO1,
        }
    }
}
