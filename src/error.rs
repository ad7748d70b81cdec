use core::convert::Infallible;

use ufmt::derive::uDebug;
use void::Void;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(uDebug, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The controller did not acknowledge entering or leaving initialization
    /// mode.
    InitTimeout,
    /// The timeout expired before the mailbox reported completion.
    TxTimeout,
    /// All transmit mailboxes are occupied.
    TxBusy,
    /// The request completed with a transmission error.
    TxFailed,
    /// Another node won arbitration and retransmission is disabled.
    ArbitrationLost,
    /// Payload longer than 8 bytes. Holds the rejected length.
    PayloadTooLong(usize),
    /// Bit timing parameters out of the register's range.
    InvalidTiming,
}

impl From<Infallible> for Error {
    fn from(e: Infallible) -> Self {
        match e {}
    }
}

impl From<Void> for Error {
    fn from(e: Void) -> Self {
        match e {}
    }
}
