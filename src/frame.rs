use embedded_hal::can::{Frame, Id};

use crate::mailbox::{pack_data, unpack_data, IdentReg};
use crate::regs::Mdtr;

/// Classic CAN frame as held in a controller mailbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanFrame {
    pub(crate) id: Id,
    pub(crate) rtr: bool,
    /// Number of valid bytes in `data`, never above 8.
    pub(crate) dlc: u8,
    pub(crate) data: [u8; 8],
}

impl CanFrame {
    fn build(id: Id, rtr: bool, len: usize) -> Option<Self> {
        (len <= 8).then(|| CanFrame {
            id,
            rtr,
            dlc: len as u8,
            data: [0; 8],
        })
    }

    /// Builds a frame from the four registers of a receive FIFO mailbox.
    ///
    /// A data length code above 8 is clamped to 8.
    pub fn from_registers(ident: IdentReg, mdtr: Mdtr, low: u32, high: u32) -> Self {
        CanFrame {
            id: ident.id(),
            rtr: ident.rtr(),
            dlc: mdtr.dlc().min(8),
            data: unpack_data(low, high),
        }
    }

    /// Encodes the frame for a transmit mailbox: identifier register, data
    /// length code, then the low and high data words.
    ///
    /// `txrq` is left clear in the identifier register.
    pub fn to_registers(&self) -> (IdentReg, u8, u32, u32) {
        let (low, high) = pack_data(self.data());
        (
            IdentReg::from_id(self.id).with_rtr(self.rtr),
            self.dlc,
            low,
            high,
        )
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for CanFrame {
    fn format(&self, fmt: defmt::Formatter) {
        match self.id {
            Id::Standard(id) => defmt::write!(fmt, "std {=u16:#X}", id.as_raw()),
            Id::Extended(id) => defmt::write!(fmt, "ext {=u32:#X}", id.as_raw()),
        }
        if self.rtr {
            defmt::write!(fmt, " remote, dlc {}", self.dlc);
        } else {
            defmt::write!(fmt, " {=[u8]}", self.data());
        }
    }
}

impl Frame for CanFrame {
    fn new(id: impl Into<Id>, data: &[u8]) -> Option<Self> {
        let mut frame = Self::build(id.into(), false, data.len())?;
        frame.data[..data.len()].copy_from_slice(data);
        Some(frame)
    }

    fn new_remote(id: impl Into<Id>, dlc: usize) -> Option<Self> {
        Self::build(id.into(), true, dlc)
    }

    #[inline]
    fn is_extended(&self) -> bool {
        matches!(self.id, Id::Extended(_))
    }

    #[inline]
    fn is_remote_frame(&self) -> bool {
        self.rtr
    }

    #[inline]
    fn id(&self) -> Id {
        self.id
    }

    #[inline]
    fn dlc(&self) -> usize {
        usize::from(self.dlc)
    }

    /// Valid payload bytes. Empty for remote frames.
    #[inline]
    fn data(&self) -> &[u8] {
        if self.rtr {
            &[]
        } else {
            &self.data[..self.dlc()]
        }
    }
}
