//! Blocking delays backed by the operating system scheduler
//!
//! The GPIO block needs fixed settle times between some register writes. The controller takes
//! any [`DelayUs<u32>`] implementation so that tests can observe these waits. [`StdDelay`] is the
//! default and simply puts the calling thread to sleep.
//!
//! A sleep is never shorter than requested, which is the only property the settle times need.
use crate::time::{MicroSeconds, MilliSeconds};
use embedded_hal::blocking::delay::{DelayMs, DelayUs};

/// Delay provider using [`std::thread::sleep`]
#[derive(Debug, Default, Clone, Copy)]
pub struct StdDelay;

impl StdDelay {
    pub fn new() -> Self {
        StdDelay
    }

    #[inline]
    pub fn sleep(&self, time: impl Into<core::time::Duration>) {
        std::thread::sleep(time.into());
    }
}

macro_rules! delays {
    ($($ty:ty,)+) => {
        $(
            impl DelayUs<$ty> for StdDelay {
                #[inline]
                fn delay_us(&mut self, us: $ty) {
                    self.sleep(MicroSeconds(us as u32));
                }
            }

            impl DelayMs<$ty> for StdDelay {
                #[inline]
                fn delay_ms(&mut self, ms: $ty) {
                    self.sleep(MilliSeconds(ms as u32));
                }
            }
        )+
    }
}

delays! {
    u8,
    u16,
    u32,
}
