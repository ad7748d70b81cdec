use embedded_hal::timer::CountDown;
use void::Void;

/// Default transmit timeout of [`SpinTimer`], in polls.
pub const TIMEOUT_LIMIT: u32 = 0xFFF;

/// Count-down measured in [`CountDown::wait`] calls rather than time.
///
/// Each `wait` is one iteration of the caller's polling loop, so the wall
/// clock length of a timeout depends on the CPU clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpinTimer {
    budget: u32,
    elapsed: u32,
}

impl SpinTimer {
    pub const fn new() -> Self {
        Self {
            budget: 0,
            elapsed: 0,
        }
    }

    /// Number of `wait` calls since the last `start`.
    pub const fn elapsed(&self) -> u32 {
        self.elapsed
    }
}

impl CountDown for SpinTimer {
    type Time = u32;

    fn start<T>(&mut self, count: T)
    where
        T: Into<Self::Time>,
    {
        self.budget = count.into();
        self.elapsed = 0;
    }

    fn wait(&mut self) -> nb::Result<(), Void> {
        if self.elapsed >= self.budget {
            return Ok(());
        }
        self.elapsed += 1;
        if self.elapsed >= self.budget {
            Ok(())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }
}
