// Test double simulating the CAN controller behind the `Peripheral` trait.
//
// Register values are modeled bit by bit from the controller's reference
// layout, independently of the driver's own register types.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};

use ch32_can::periph::{Peripheral, PinMode};

pub const CTLR: u16 = 0x000;
pub const STATR: u16 = 0x004;
pub const TSTATR: u16 = 0x008;
pub const RFIFO0: u16 = 0x00C;
pub const BTIMR: u16 = 0x01C;
pub const TXMIR0: u16 = 0x180;
pub const RXMIR0: u16 = 0x1B0;
pub const RXMDTR0: u16 = 0x1B4;
pub const RXMDLR0: u16 = 0x1B8;
pub const RXMDHR0: u16 = 0x1BC;
pub const FCTLR: u16 = 0x200;
pub const FMCFGR: u16 = 0x204;
pub const FSCFGR: u16 = 0x20C;
pub const FAFIFOR: u16 = 0x214;
pub const FWR: u16 = 0x21C;
pub const F0R1: u16 = 0x240;
pub const F0R2: u16 = 0x244;

const TME_SHIFT: u32 = 26;
const FIFO_DEPTH: usize = 3;

/// What the simulated controller does with a transmit request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxBehavior {
    /// Completes immediately with `TXOK`.
    Complete,
    /// Never completes; the mailbox stays occupied.
    Stall,
    /// Completes without `TXOK`, flagging a transmission error.
    Error,
    /// Completes without `TXOK`, flagging lost arbitration.
    LoseArbitration,
}

/// Frame as seen on the wire by the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireFrame {
    /// Raw identifier register, `STID:EXID:IDE:RTR:0`.
    pub ident: u32,
    pub dlc: u8,
    pub data: [u8; 8],
}

impl WireFrame {
    pub fn standard(id: u16, data: &[u8]) -> Self {
        let mut bytes = [0u8; 8];
        bytes[..data.len()].copy_from_slice(data);
        Self {
            ident: u32::from(id) << 21,
            dlc: data.len() as u8,
            data: bytes,
        }
    }

    pub fn extended(id: u32, data: &[u8]) -> Self {
        let mut frame = Self::standard(0, data);
        frame.ident = (id << 3) | 0b100;
        frame
    }
}

/// Simulated controller with 3 mailboxes, one 3-deep receive FIFO and one
/// filter bank.
pub struct SimCan {
    regs: HashMap<u16, u32>,
    fifo: VecDeque<WireFrame>,
    pub tx_behavior: TxBehavior,
    /// When set, the controller ignores initialization requests.
    pub stuck_in_init: bool,
    pub clocks_enabled: bool,
    pub pins: Option<(PinMode, PinMode)>,
    /// Frames that left a mailbox successfully.
    pub sent: Vec<WireFrame>,
    /// `TSTATR` reads since the last transmit request.
    pub tstatr_polls: u32,
    /// Frames dropped because the FIFO was full.
    pub overruns: u32,
}

impl SimCan {
    pub fn new() -> Self {
        let mut regs = HashMap::new();
        // Reset state: sleep requested and acknowledged, all mailboxes empty.
        regs.insert(CTLR, 0b10);
        regs.insert(STATR, 0b10);
        regs.insert(TSTATR, 0b111 << TME_SHIFT);
        regs.insert(FCTLR, 1);
        Self {
            regs,
            fifo: VecDeque::new(),
            tx_behavior: TxBehavior::Complete,
            stuck_in_init: false,
            clocks_enabled: false,
            pins: None,
            sent: Vec::new(),
            tstatr_polls: 0,
            overruns: 0,
        }
    }

    pub fn reg(&self, addr: u16) -> u32 {
        self.regs.get(&addr).copied().unwrap_or(0)
    }

    fn set(&mut self, addr: u16, value: u32) {
        self.regs.insert(addr, value);
    }

    pub fn loopback(&self) -> bool {
        self.reg(BTIMR) & (1 << 30) != 0
    }

    pub fn in_init(&self) -> bool {
        self.reg(STATR) & 1 != 0
    }

    pub fn fifo_len(&self) -> usize {
        self.fifo.len()
    }

    /// Whether the bank 0 filter would pass `ident`, following the controller:
    /// frames are dropped unless an active 32-bit mask filter matches.
    pub fn accepts(&self, ident: u32) -> bool {
        let active = self.reg(FWR) & 1 != 0;
        let init = self.reg(FCTLR) & 1 != 0;
        let mask_mode = self.reg(FMCFGR) & 1 == 0;
        let scale32 = self.reg(FSCFGR) & 1 != 0;
        let to_fifo0 = self.reg(FAFIFOR) & 1 == 0;
        if !active || init || !mask_mode || !scale32 || !to_fifo0 {
            return false;
        }
        let id = self.reg(F0R1);
        let mask = self.reg(F0R2);
        (ident ^ id) & mask & !1 == 0
    }

    /// Puts a frame on the bus towards this controller. It only reaches the
    /// FIFO when the filter accepts it.
    pub fn deliver(&mut self, frame: WireFrame) -> bool {
        if !self.accepts(frame.ident) {
            return false;
        }
        if self.fifo.len() == FIFO_DEPTH {
            self.overruns += 1;
            return false;
        }
        self.fifo.push_back(frame);
        true
    }

    fn handle_ctlr(&mut self, value: u32) {
        self.set(CTLR, value);
        if self.stuck_in_init {
            return;
        }
        let inrq = value & 1 != 0;
        let sleep = value & 0b10 != 0;
        let mut statr = self.reg(STATR) & !0b11;
        if inrq {
            statr |= 1;
        } else if sleep {
            statr |= 0b10;
        }
        self.set(STATR, statr);
    }

    fn handle_tx_request(&mut self, mailbox: u16, value: u32) {
        let shift = 8 * u32::from(mailbox);
        let tme = 1 << (TME_SHIFT + u32::from(mailbox));
        let base = TXMIR0 + 0x10 * mailbox;

        // A new request clears RQCP, TXOK, ALST and TERR.
        let mut tstatr = self.reg(TSTATR) & !(0xF << shift) & !tme;
        self.tstatr_polls = 0;

        let frame = WireFrame {
            ident: value & !1,
            dlc: (self.reg(base + 4) & 0xF) as u8,
            data: {
                let mut bytes = [0u8; 8];
                bytes[..4].copy_from_slice(&self.reg(base + 8).to_le_bytes());
                bytes[4..].copy_from_slice(&self.reg(base + 12).to_le_bytes());
                bytes
            },
        };

        match self.tx_behavior {
            TxBehavior::Complete => {
                tstatr |= (0b11 << shift) | tme;
                self.set(base, value & !1);
                self.sent.push(frame);
                if self.loopback() {
                    self.deliver(frame);
                }
            }
            TxBehavior::Stall => self.set(base, value),
            TxBehavior::Error => {
                tstatr |= (0b1001 << shift) | tme;
                self.set(base, value & !1);
            }
            TxBehavior::LoseArbitration => {
                tstatr |= (0b0101 << shift) | tme;
                self.set(base, value & !1);
            }
        }
        self.set(TSTATR, tstatr);
    }

    fn fifo_register(&self, addr: u16) -> u32 {
        let Some(front) = self.fifo.front() else {
            return 0;
        };
        match addr {
            RXMIR0 => front.ident,
            RXMDTR0 => u32::from(front.dlc),
            RXMDLR0 => u32::from_le_bytes([front.data[0], front.data[1], front.data[2], front.data[3]]),
            RXMDHR0 => u32::from_le_bytes([front.data[4], front.data[5], front.data[6], front.data[7]]),
            _ => 0,
        }
    }
}

impl Peripheral for SimCan {
    fn enable_clocks(&mut self) {
        self.clocks_enabled = true;
    }

    fn configure_pins(&mut self, tx: PinMode, rx: PinMode) {
        self.pins = Some((tx, rx));
    }

    fn read(&mut self, addr: u16) -> u32 {
        match addr {
            TSTATR => {
                self.tstatr_polls += 1;
                self.reg(TSTATR)
            }
            RFIFO0 => self.fifo.len() as u32 | (u32::from(self.fifo.len() == FIFO_DEPTH) << 3),
            RXMIR0 | RXMDTR0 | RXMDLR0 | RXMDHR0 => self.fifo_register(addr),
            _ => self.reg(addr),
        }
    }

    fn write(&mut self, addr: u16, value: u32) {
        match addr {
            CTLR => self.handle_ctlr(value),
            STATR | TSTATR => {}
            RFIFO0 => {
                if value & (1 << 5) != 0 {
                    self.fifo.pop_front();
                }
            }
            BTIMR if !self.in_init() => {}
            a if (TXMIR0..TXMIR0 + 0x30).contains(&a) && (a - TXMIR0) % 0x10 == 0 => {
                if value & 1 != 0 {
                    self.handle_tx_request((a - TXMIR0) / 0x10, value);
                } else {
                    self.set(a, value);
                }
            }
            _ => self.set(addr, value),
        }
    }
}

/// Console capturing everything written by the demo.
#[derive(Default)]
pub struct Console {
    pub text: String,
}

impl ufmt::uWrite for Console {
    type Error = std::convert::Infallible;

    fn write_str(&mut self, s: &str) -> Result<(), Self::Error> {
        self.text.push_str(s);
        Ok(())
    }
}

/// Delay that records requested sleeps instead of sleeping.
#[derive(Default)]
pub struct NoDelay {
    pub total_ms: u64,
}

impl embedded_hal::blocking::delay::DelayMs<u16> for NoDelay {
    fn delay_ms(&mut self, ms: u16) {
        self.total_ms += u64::from(ms);
    }
}
