//! # Late-bound GPIO pins
//!
//! A [`DynPin`] only stores its validated index. It is not tied to a controller at
//! construction time. Instead, every operation looks up the process-wide controller created by
//! [`initialize`](super::initialize) and forwards to the corresponding [`Pin`] operation.
//!
//! Because the controller might not exist yet, all operations are fallible and return
//! [`Error::NotInitialized`] with the name of the operation until initialization succeeded.
//!
//! ```no_run
//! # use bcm283x_hal::gpio::{self, DynPin, Mode};
//! # fn main() -> bcm283x_hal::Result<()> {
//! let button = DynPin::new(27)?;
//! gpio::initialize()?;
//! button.set_mode(Mode::Input)?;
//! button.set_falling_edge_detect(true)?;
//! if button.event()? {
//!     // pressed since the last call
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Embedded HAL traits
//!
//! [`DynPin`] implements [`InputPin`] and [`OutputPin`]. Unlike [`Pin`], the error type is
//! [`Error`], which is returned when the controller is not initialized.

use super::global;
use super::pins::{detect_setters, Detect, Mode, Pin, PinId, PinState, PullMode};
use crate::error::{Error, Result};
use crate::memory::{MemoryMap, RegisterWindow};
use core::fmt;
use embedded_hal::blocking::delay::DelayUs;
use embedded_hal::digital::v2::{InputPin, OutputPin};
use paste::paste;

/// A pin which resolves the process-wide controller on every call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DynPin {
    id: PinId,
}

impl DynPin {
    /// Returns [`Error::InvalidPinIndex`] for indices above
    /// [`MAX_PIN`](super::pins::MAX_PIN). Does not need an initialized controller.
    pub fn new(index: u32) -> Result<Self> {
        Ok(DynPin {
            id: PinId::new(index)?,
        })
    }

    #[inline]
    pub fn id(&self) -> PinId {
        self.id
    }

    /// Raw GPIO index
    #[inline]
    pub fn index(&self) -> u32 {
        self.id.index()
    }

    #[inline]
    pub fn is(&self, index: u32) -> bool {
        self.id.is(index)
    }

    #[inline]
    fn bound(&self, operation: &'static str) -> Result<Pin<'static, MemoryMap>> {
        global::controller()
            .map(|gpio| gpio.pin_by_id(self.id))
            .map_err(|_| Error::NotInitialized(operation))
    }

    /// See [`Pin::set_mode`]
    pub fn set_mode(&self, mode: Mode) -> Result<()> {
        self.bound("pin mode")?.set_mode(mode);
        Ok(())
    }

    /// See [`Pin::mode`]
    pub fn mode(&self) -> Result<Mode> {
        Ok(self.bound("pin get mode")?.mode())
    }

    /// See [`Pin::set_level`]
    pub fn set_level(&self, state: impl Into<PinState>) -> Result<()> {
        self.bound("pin set")?.set_level(state);
        Ok(())
    }

    /// See [`Pin::level`]
    pub fn level(&self) -> Result<bool> {
        Ok(self.bound("pin get")?.level())
    }

    /// See [`Pin::set_pull`]
    pub fn set_pull(&self, pull: PullMode) -> Result<()> {
        self.bound("pin pull")?.set_pull(pull);
        Ok(())
    }

    /// See [`Pin::event`]. Auto-clearing is controlled by
    /// [`set_suppress_event_clear`](super::set_suppress_event_clear).
    pub fn event(&self) -> Result<bool> {
        Ok(self.bound("pin event")?.event())
    }

    /// See [`Pin::clear_event`]
    pub fn clear_event(&self) -> Result<()> {
        self.bound("pin clear event")?.clear_event();
        Ok(())
    }

    /// See [`Pin::set_detect`]
    pub fn set_detect(&self, detect: Detect, enabled: bool) -> Result<()> {
        self.bound("pin detect")?.set_detect(detect, enabled);
        Ok(())
    }

    /// See [`Pin::detect_enabled`]
    pub fn detect_enabled(&self, detect: Detect) -> Result<bool> {
        Ok(self.bound("pin get detect")?.detect_enabled(detect))
    }

    detect_setters!(Result<()>);
}

impl TryFrom<u32> for DynPin {
    type Error = Error;

    fn try_from(index: u32) -> Result<Self> {
        DynPin::new(index)
    }
}

impl From<PinId> for DynPin {
    fn from(id: PinId) -> Self {
        DynPin { id }
    }
}

impl<W: RegisterWindow, D: DelayUs<u32> + Clone> From<Pin<'_, W, D>> for DynPin {
    /// Forget the controller of a [`Pin`]. The resulting [`DynPin`] uses the process-wide
    /// controller instead.
    fn from(pin: Pin<'_, W, D>) -> Self {
        DynPin { id: pin.id() }
    }
}

impl PartialEq<u32> for DynPin {
    fn eq(&self, index: &u32) -> bool {
        self.is(*index)
    }
}

impl fmt::Display for DynPin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.id, f)
    }
}

//==================================================================================================
// Embedded HAL traits
//==================================================================================================

impl OutputPin for DynPin {
    type Error = Error;

    #[inline]
    fn set_high(&mut self) -> Result<()> {
        self.set_level(PinState::High)
    }

    #[inline]
    fn set_low(&mut self) -> Result<()> {
        self.set_level(PinState::Low)
    }
}

impl InputPin for DynPin {
    type Error = Error;

    #[inline]
    fn is_high(&self) -> Result<bool> {
        self.level()
    }

    #[inline]
    fn is_low(&self) -> Result<bool> {
        self.level().map(|v| !v)
    }
}
