#![no_std]

pub mod demo;
pub mod error;
pub mod filter;
pub mod frame;
pub(crate) mod macros;
pub mod mailbox;
#[cfg(feature = "ch32v203")]
pub mod mmio;
pub mod periph;
pub mod regs;
pub mod stat;
pub mod timer;
pub mod timing;

use embedded_hal::{
    can::{Frame, StandardId},
    timer::CountDown,
};
use filter::{Filter, FilterBank, FrameFormat};
use frame::CanFrame;
use mailbox::{IdentReg, RxFifo, TxMailbox};
use periph::{Peripheral, PinMode};
use regs::{Mode, Register};
use stat::TxStatus;
use timing::BitTiming;

use crate::{
    error::{Error, Result},
    regs::{Ctlr, Mdtr, Reg, Rfifo, Statr, FCTLR_FINIT},
};

/// Polls allowed for the controller to acknowledge entering or leaving
/// initialization mode.
const INAK_TIMEOUT: u32 = 0xFFFF;

/// Settings used to initialize the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Settings {
    /// Bus bit timing.
    pub timing: BitTiming,
    /// Device operation mode.
    pub mode: Mode,
    /// Acceptance filter installed in bank 0, feeding FIFO 0.
    pub filter: Filter,
    /// Time triggered communication mode.
    pub time_triggered: bool,
    /// Leave bus-off automatically once the bus recovers.
    pub auto_bus_off: bool,
    /// Wake up from sleep on bus activity.
    pub auto_wakeup: bool,
    /// Retransmit frames until they succeed. When disabled, each frame is
    /// tried exactly once.
    pub auto_retransmit: bool,
    /// Drop new frames instead of overwriting the last one when a FIFO is
    /// full.
    pub rx_fifo_locked: bool,
    /// Send mailboxes in request order instead of identifier priority.
    pub tx_fifo_priority: bool,
}

impl Settings {
    /// Settings with the fixed filter for `format` and every option flag
    /// off, including automatic retransmission.
    pub fn new(timing: BitTiming, mode: Mode, format: FrameFormat) -> Self {
        Self {
            timing,
            mode,
            filter: Filter::for_format(format),
            time_triggered: false,
            auto_bus_off: false,
            auto_wakeup: false,
            auto_retransmit: false,
            rx_fifo_locked: false,
            tx_fifo_priority: false,
        }
    }

    /// Replaces the acceptance filter.
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new(BitTiming::default(), Mode::Normal, FrameFormat::Standard)
    }
}

/// CAN controller driver.
pub struct Can<P, T: CountDown> {
    /// Hardware the driver talks to.
    periph: P,
    /// Time source bounding the wait for transmit completion.
    timer: T,
    /// Count loaded into `timer` for each transmission.
    tx_timeout: T::Time,
}

impl<P, T> Can<P, T>
where
    P: Peripheral,
    T: CountDown,
    T::Time: Copy,
{
    /// Creates a new driver. Nothing is touched until [`Can::init`].
    ///
    /// # Parameters
    ///
    /// * `periph` - Controller instance, `mmio::Can1` on hardware.
    /// * `timer` - Time source for transmit timeouts, see
    ///   [`timer::SpinTimer`].
    /// * `tx_timeout` - How long [`Can::send`] waits for completion, in units
    ///   of `timer`.
    pub fn new(periph: P, timer: T, tx_timeout: T::Time) -> Self {
        Self {
            periph,
            timer,
            tx_timeout,
        }
    }

    /// Initializes the controller. This should be called once, before any
    /// frame is sent or received.
    ///
    /// Bit timing and filter are written as given, without validation.
    ///
    /// # Returns
    ///
    /// Nothing on success, [`Error::InitTimeout`] if the controller did not
    /// acknowledge entering or leaving initialization mode.
    pub fn init(&mut self, settings: Settings) -> Result<()> {
        self.periph.enable_clocks();
        self.periph
            .configure_pins(PinMode::AlternatePushPull, PinMode::InputPullUp);

        self.request_init_mode(true)?;

        let ctlr: Ctlr = self.read_register();
        self.write_register(
            ctlr.with_ttcm(settings.time_triggered)
                .with_abom(settings.auto_bus_off)
                .with_awum(settings.auto_wakeup)
                .with_nart(!settings.auto_retransmit)
                .with_rflm(settings.rx_fifo_locked)
                .with_txfp(settings.tx_fifo_priority),
        );
        self.write_register(settings.timing.to_register(settings.mode));

        self.request_init_mode(false)?;

        self.set_filter(FilterBank::B0, settings.filter, RxFifo::Fifo0);

        #[cfg(feature = "defmt")]
        defmt::debug!("CAN initialized: {}", settings);

        Ok(())
    }

    /// Programs an acceptance filter bank in 32-bit identifier/mask mode and
    /// activates it.
    ///
    /// # Parameters
    ///
    /// * `bank` - Filter bank to program.
    /// * `filter` - Identifier and mask to match.
    /// * `fifo` - FIFO that receives the frames passing the filter.
    pub fn set_filter(&mut self, bank: FilterBank, filter: Filter, fifo: RxFifo) {
        let bit = bank.bit();
        self.periph
            .modify(Register::FCTLR.addr(), |v| v | FCTLR_FINIT);
        self.periph.modify(Register::FWR.addr(), |v| v & !bit);

        self.periph.modify(Register::FSCFGR.addr(), |v| v | bit);
        self.periph.write(bank.r1(), filter.id);
        self.periph.write(bank.r2(), filter.mask);
        self.periph.modify(Register::FMCFGR.addr(), |v| v & !bit);
        self.periph.modify(Register::FAFIFOR.addr(), |v| match fifo {
            RxFifo::Fifo0 => v & !bit,
            RxFifo::Fifo1 => v | bit,
        });

        self.periph.modify(Register::FWR.addr(), |v| v | bit);
        self.periph
            .modify(Register::FCTLR.addr(), |v| v & !FCTLR_FINIT);

        #[cfg(feature = "defmt")]
        defmt::debug!("filter bank {} set to {}", bank, filter);
    }

    /// Sends `payload` as a data frame with a standard identifier and waits
    /// for the controller to report the outcome.
    ///
    /// The wait is bounded by the driver's timer. There is no retry.
    ///
    /// # Parameters
    ///
    /// * `payload` - Frame data, 0-8 bytes.
    /// * `id` - Standard identifier of the frame.
    ///
    /// # Returns
    ///
    /// Nothing once the frame went out. [`Error::PayloadTooLong`] for more
    /// than 8 bytes, [`Error::TxBusy`] when no mailbox is free,
    /// [`Error::TxTimeout`] when the timer expires first and
    /// [`Error::ArbitrationLost`]/[`Error::TxFailed`] when the controller
    /// gave up on the frame.
    pub fn send(&mut self, payload: &[u8], id: StandardId) -> Result<()> {
        let frame = CanFrame::new(id, payload).ok_or(Error::PayloadTooLong(payload.len()))?;
        let mailbox = self.find_free_mailbox()?;

        #[cfg(feature = "defmt")]
        defmt::trace!("sending {} via {}", frame, mailbox);

        self.write_mailbox(mailbox, &frame);
        self.wait_transmitted(mailbox)
    }

    /// Reads one frame from FIFO 0 if one is pending. Never blocks.
    ///
    /// Reading releases the FIFO slot. Further pending frames stay queued in
    /// hardware for later calls.
    pub fn try_receive(&mut self) -> Option<CanFrame> {
        self.receive_from(RxFifo::Fifo0)
    }

    /// Reads one frame from a specific FIFO if one is pending.
    pub fn receive_from(&mut self, fifo: RxFifo) -> Option<CanFrame> {
        if self.pending_in(fifo) == 0 {
            return None;
        }

        let ident = IdentReg::from_raw(self.periph.read(fifo.mir().addr()));
        let mdtr = Mdtr::from_raw(self.periph.read(fifo.mdtr().addr()));
        let low = self.periph.read(fifo.mdlr().addr());
        let high = self.periph.read(fifo.mdhr().addr());
        let frame = CanFrame::from_registers(ident, mdtr, low, high);

        // Release the output mailbox
        self.periph.write(
            fifo.rfifo().addr(),
            Rfifo::new().with_rfom(true).to_raw(),
        );

        #[cfg(feature = "defmt")]
        defmt::trace!("received {} (filter {})", frame, mdtr.fmi());

        Some(frame)
    }

    /// Number of frames waiting in FIFO 0, 0-3.
    pub fn pending(&mut self) -> u8 {
        self.pending_in(RxFifo::Fifo0)
    }

    /// Number of frames waiting in a specific FIFO, 0-3.
    pub fn pending_in(&mut self, fifo: RxFifo) -> u8 {
        Rfifo::from_raw(self.periph.read(fifo.rfifo().addr())).fmp()
    }

    /// Changes how long [`Can::send`] waits for completion.
    pub fn set_tx_timeout(&mut self, tx_timeout: T::Time) {
        self.tx_timeout = tx_timeout;
    }

    /// Returns the underlying peripheral.
    pub fn peripheral(&self) -> &P {
        &self.periph
    }

    /// Returns the underlying peripheral mutably.
    pub fn peripheral_mut(&mut self) -> &mut P {
        &mut self.periph
    }

    /// Releases the peripheral and the timer.
    pub fn free(self) -> (P, T) {
        (self.periph, self.timer)
    }

    /// Attempts to find a free Tx mailbox.
    ///
    /// # Returns
    ///
    /// An empty mailbox on success, [`Error::TxBusy`] if all of them are
    /// occupied.
    pub fn find_free_mailbox(&mut self) -> Result<TxMailbox> {
        stat::free_mailbox(self.read_register()).ok_or(Error::TxBusy)
    }

    /// Loads `frame` into `mailbox` and requests transmission.
    fn write_mailbox(&mut self, mailbox: TxMailbox, frame: &CanFrame) {
        let (ident, dlc, low, high) = frame.to_registers();
        self.periph.write(mailbox.mir().addr(), ident.to_raw());
        self.periph.modify(mailbox.mdtr().addr(), |v| {
            Mdtr::from_raw(v).with_dlc(dlc).to_raw()
        });
        self.periph.write(mailbox.mdlr().addr(), low);
        self.periph.write(mailbox.mdhr().addr(), high);

        // Set `txrq` last, the controller owns the mailbox from here on.
        self.periph
            .write(mailbox.mir().addr(), ident.with_txrq(true).to_raw());
    }

    /// Polls the status of `mailbox` until it completes or the timer expires.
    fn wait_transmitted(&mut self, mailbox: TxMailbox) -> Result<()> {
        self.timer.start(self.tx_timeout);
        loop {
            match TxStatus::of(self.read_register(), mailbox) {
                TxStatus::Ok => return Ok(()),
                TxStatus::Failed {
                    arbitration_lost: true,
                } => return Err(Error::ArbitrationLost),
                TxStatus::Failed { .. } => return Err(Error::TxFailed),
                TxStatus::Pending => {}
            }

            match self.timer.wait() {
                Ok(()) => {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("transmit timeout on {}", mailbox);
                    return Err(Error::TxTimeout);
                }
                Err(nb::Error::WouldBlock) => {}
                Err(nb::Error::Other(e)) => return Err(Error::from(e)),
            }
        }
    }

    /// Sets or clears the initialization request and waits for the
    /// acknowledge bit to follow.
    fn request_init_mode(&mut self, enter: bool) -> Result<()> {
        let ctlr: Ctlr = self.read_register();
        let ctlr = if enter {
            ctlr.with_sleep(false).with_inrq(true)
        } else {
            ctlr.with_inrq(false)
        };
        self.write_register(ctlr);

        for _ in 0..INAK_TIMEOUT {
            let statr: Statr = self.read_register();
            if statr.inak() == enter {
                return Ok(());
            }
        }

        #[cfg(feature = "defmt")]
        defmt::warn!("no initialization acknowledge (enter: {})", enter);
        Err(Error::InitTimeout)
    }

    /// Read a register via a register object.
    #[inline]
    pub fn read_register<R: Reg>(&mut self) -> R {
        R::read(self.periph.read(R::REGISTER.addr()))
    }

    /// Write to a register using a register object.
    #[inline]
    pub fn write_register<R: Reg>(&mut self, reg: R) {
        self.periph.write(R::REGISTER.addr(), reg.write());
    }
}
