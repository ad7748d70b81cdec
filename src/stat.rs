use ufmt::derive::uDebug;

use crate::{
    mailbox::TxMailbox,
    regs::{MailboxStat, Tstatr},
};

/// Outcome of a transmit request, as reported by `TSTATR`.
#[derive(uDebug, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TxStatus {
    /// Frame sent and acknowledged.
    Ok,
    /// Request completed without success.
    Failed {
        /// Arbitration was lost to another node.
        arbitration_lost: bool,
    },
    /// Request still in progress.
    Pending,
}

impl TxStatus {
    /// Reads the status of `mailbox` out of a `TSTATR` value.
    ///
    /// Completion needs `RQCP`, `TXOK` and `TME`. `RQCP` and `TME` without
    /// `TXOK` is a failed request.
    pub fn of(tstatr: Tstatr, mailbox: TxMailbox) -> Self {
        let (stat, empty): (MailboxStat, bool) = match mailbox {
            TxMailbox::M0 => (tstatr.mb0(), tstatr.tme0()),
            TxMailbox::M1 => (tstatr.mb1(), tstatr.tme1()),
            TxMailbox::M2 => (tstatr.mb2(), tstatr.tme2()),
        };
        match (stat.rqcp(), stat.txok(), empty) {
            (true, true, true) => TxStatus::Ok,
            (true, false, true) => TxStatus::Failed {
                arbitration_lost: stat.alst(),
            },
            _ => TxStatus::Pending,
        }
    }
}

/// Returns the first empty transmit mailbox, if any.
pub fn free_mailbox(tstatr: Tstatr) -> Option<TxMailbox> {
    if tstatr.tme0() {
        Some(TxMailbox::M0)
    } else if tstatr.tme1() {
        Some(TxMailbox::M1)
    } else if tstatr.tme2() {
        Some(TxMailbox::M2)
    } else {
        None
    }
}
