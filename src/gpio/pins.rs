//! # Controller-bound GPIO pins
//!
//! A [`Gpio`] controller owns the [`RegisterWindow`] of the GPIO block. [`Pin`]s borrow the
//! controller, so a pin can only exist while its registers are mapped and none of the pin
//! operations can fail.
//!
//! ```no_run
//! # use bcm283x_hal::gpio::{Gpio, Mode, PinState};
//! # use bcm283x_hal::memory::{page_size, MemDevice, MemoryMap};
//! # fn main() -> bcm283x_hal::Result<()> {
//! let gpio = Gpio::new(MemoryMap::open(MemDevice::GpioMem, 0, page_size())?)?;
//! let led = gpio.pin(17)?;
//! led.set_mode(Mode::Output);
//! led.set_level(PinState::High);
//! # Ok(())
//! # }
//! ```
//!
//! A pin is nothing more than its index and a reference to the controller. Several [`Pin`]
//! values for the same index may exist at the same time.
//!
//! # Concurrency
//!
//! No locking is performed. Most registers hold the fields of 10 or 32 pins, and configuration
//! changes are read-modify-write sequences on those words. Modifying pins which share a
//! register word from different threads without external synchronization can lose updates.
//! Writes to the set, clear and event status registers only affect the written pin and are
//! not subject to this race.
//!
//! # Embedded HAL traits
//!
//! [`Pin`] implements [`InputPin`] and [`OutputPin`] with `Error = core::convert::Infallible`.
//! The traits do not check the pin mode, just like the registers themselves.

use super::reg::{RegisterFamily, RegisterInterface, GPIO_BLOCK_LEN};
use crate::{delay::StdDelay, error::Error, memory::RegisterWindow, time::MicroSeconds};
use core::convert::Infallible;
use core::fmt;
use core::sync::atomic::{AtomicBool, Ordering};
use std::io;
use embedded_hal::blocking::delay::DelayUs;
use embedded_hal::digital::v2::{InputPin, OutputPin};
use paste::paste;

//==================================================================================================
//  Errors and Definitions
//==================================================================================================

/// Highest GPIO index of the BCM283x
pub const MAX_PIN: u32 = 53;

/// Wait between the pull control writes. The datasheet asks for 150 cycles of the peripheral
/// clock, which is well below 2 us for every supported clock setting.
pub const PULL_SETTLE: MicroSeconds = MicroSeconds(2);

/// Wait after clearing an event flag
pub const EVENT_SETTLE: MicroSeconds = MicroSeconds(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinState {
    Low = 0,
    High = 1,
}

impl From<bool> for PinState {
    #[inline]
    fn from(high: bool) -> Self {
        if high {
            PinState::High
        } else {
            PinState::Low
        }
    }
}

/// Every value other than 0 is high
impl From<u32> for PinState {
    #[inline]
    fn from(value: u32) -> Self {
        PinState::from(value != 0)
    }
}

impl From<PinState> for bool {
    #[inline]
    fn from(state: PinState) -> Self {
        state == PinState::High
    }
}

/// Function select codes
///
/// Note that the alternate functions are not numbered in code order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Input = 0b000,
    Output = 0b001,
    Alt0 = 0b100,
    Alt1 = 0b101,
    Alt2 = 0b110,
    Alt3 = 0b111,
    Alt4 = 0b011,
    Alt5 = 0b010,
}

impl Mode {
    pub const ALL: [Mode; 8] = [
        Mode::Input,
        Mode::Output,
        Mode::Alt0,
        Mode::Alt1,
        Mode::Alt2,
        Mode::Alt3,
        Mode::Alt4,
        Mode::Alt5,
    ];

    #[inline]
    pub const fn bits(self) -> u32 {
        self as u32
    }

    /// Decode a function select field. Only the lowest three bits are considered, all eight
    /// codes are valid.
    pub const fn from_bits(bits: u32) -> Mode {
        match bits & 0b111 {
            0b000 => Mode::Input,
            0b001 => Mode::Output,
            0b100 => Mode::Alt0,
            0b101 => Mode::Alt1,
            0b110 => Mode::Alt2,
            0b111 => Mode::Alt3,
            0b011 => Mode::Alt4,
            _ => Mode::Alt5,
        }
    }
}

/// Pull resistor control codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullMode {
    Off = 0b00,
    Down = 0b01,
    Up = 0b10,
}

/// Edge and level detectors. Each detector which is enabled for a pin sets the pin's event flag
/// when its condition is met.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detect {
    /// Synchronous rising edge, sampled with the system clock
    RisingEdge,
    /// Synchronous falling edge, sampled with the system clock
    FallingEdge,
    /// Rising edge without sampling, catches very short pulses
    AsyncRisingEdge,
    /// Falling edge without sampling, catches very short pulses
    AsyncFallingEdge,
    High,
    Low,
}

impl Detect {
    pub const ALL: [Detect; 6] = [
        Detect::RisingEdge,
        Detect::FallingEdge,
        Detect::AsyncRisingEdge,
        Detect::AsyncFallingEdge,
        Detect::High,
        Detect::Low,
    ];

    pub const fn family(self) -> RegisterFamily {
        match self {
            Detect::RisingEdge => RegisterFamily::RISING_EDGE,
            Detect::FallingEdge => RegisterFamily::FALLING_EDGE,
            Detect::AsyncRisingEdge => RegisterFamily::ASYNC_RISING_EDGE,
            Detect::AsyncFallingEdge => RegisterFamily::ASYNC_FALLING_EDGE,
            Detect::High => RegisterFamily::HIGH_DETECT,
            Detect::Low => RegisterFamily::LOW_DETECT,
        }
    }
}

//==================================================================================================
//  Pin IDs
//==================================================================================================

/// Validated GPIO index in `0..=53`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PinId(u8);

impl PinId {
    /// Returns [`Error::InvalidPinIndex`] for indices above [`MAX_PIN`]
    pub fn new(index: u32) -> Result<Self, Error> {
        if index > MAX_PIN {
            return Err(Error::InvalidPinIndex(index));
        }
        Ok(PinId(index as u8))
    }

    /// Raw GPIO index. This is the BCM number, not the header pin.
    #[inline]
    pub const fn index(&self) -> u32 {
        self.0 as u32
    }

    #[inline]
    pub const fn is(&self, index: u32) -> bool {
        self.0 as u32 == index
    }
}

impl TryFrom<u32> for PinId {
    type Error = Error;

    fn try_from(index: u32) -> Result<Self, Error> {
        PinId::new(index)
    }
}

impl From<PinId> for u32 {
    fn from(id: PinId) -> Self {
        id.index()
    }
}

impl fmt::Display for PinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GPIO{}", self.0)
    }
}

//==================================================================================================
//  Gpio
//==================================================================================================

/// Owner of the GPIO register block
///
/// The controller holds the register window, the delay provider used for the settle times and
/// the auto-clear setting for event flags. It is `Sync` whenever the window and the delay are,
/// so it can be shared between threads or stored in a `static`.
#[derive(Debug)]
pub struct Gpio<W: RegisterWindow, D = StdDelay> {
    regs: W,
    delay: D,
    suppress_event_clear: AtomicBool,
}

impl<W: RegisterWindow> Gpio<W> {
    /// Returns [`Error::MapFailure`] if `regs` can not hold the GPIO block
    pub fn new(regs: W) -> Result<Self, Error> {
        Gpio::with_delay(regs, StdDelay)
    }
}

impl<W: RegisterWindow, D: DelayUs<u32> + Clone> Gpio<W, D> {
    /// Like [`Gpio::new`], with a custom delay provider for the settle times
    pub fn with_delay(regs: W, delay: D) -> Result<Self, Error> {
        if regs.len() < GPIO_BLOCK_LEN {
            return Err(Error::MapFailure(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "register window of {:#x} bytes, the GPIO block needs {:#x}",
                    regs.len(),
                    GPIO_BLOCK_LEN
                ),
            )));
        }
        Ok(Gpio {
            regs,
            delay,
            suppress_event_clear: AtomicBool::new(false),
        })
    }

    /// Returns [`Error::InvalidPinIndex`] for indices above [`MAX_PIN`]
    #[inline]
    pub fn pin(&self, index: u32) -> Result<Pin<'_, W, D>, Error> {
        Ok(self.pin_by_id(PinId::new(index)?))
    }

    #[inline]
    pub fn pin_by_id(&self, id: PinId) -> Pin<'_, W, D> {
        Pin { id, gpio: self }
    }

    /// Access the underlying register window
    pub fn window(&self) -> &W {
        &self.regs
    }

    /// When set, [`Pin::event`] only reads the event flag and leaves clearing it to
    /// [`Pin::clear_event`]. Can be changed at any time.
    pub fn set_suppress_event_clear(&self, suppress: bool) {
        self.suppress_event_clear.store(suppress, Ordering::Relaxed);
    }

    pub fn suppress_event_clear(&self) -> bool {
        self.suppress_event_clear.load(Ordering::Relaxed)
    }

    /// Consumes the controller and returns the register window
    pub fn release(self) -> W {
        self.regs
    }

    #[inline]
    fn settle(&self, time: MicroSeconds) {
        self.delay.clone().delay_us(time.0);
    }
}

//==================================================================================================
//  Pin
//==================================================================================================

macro_rules! detect_setters {
    (@list $Ret:ty; $($name:ident: $Detect:ident,)+) => {
        paste!(
            $(
                #[doc = "Shorthand for [`set_detect`](Self::set_detect) with [`Detect::" $Detect "`]"]
                #[inline]
                pub fn [<set_ $name _detect>](&self, enabled: bool) -> $Ret {
                    self.set_detect(Detect::$Detect, enabled)
                }
            )+
        );
    };
    ($Ret:ty) => {
        detect_setters!(@list $Ret;
            rising_edge: RisingEdge,
            falling_edge: FallingEdge,
            async_rising_edge: AsyncRisingEdge,
            async_falling_edge: AsyncFallingEdge,
            high: High,
            low: Low,
        );
    };
}

pub(crate) use detect_setters;

/// A GPIO pin bound to a [`Gpio`] controller
pub struct Pin<'a, W: RegisterWindow, D = StdDelay> {
    id: PinId,
    gpio: &'a Gpio<W, D>,
}

impl<W: RegisterWindow, D> Clone for Pin<'_, W, D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<W: RegisterWindow, D> Copy for Pin<'_, W, D> {}

impl<W: RegisterWindow, D> fmt::Debug for Pin<'_, W, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pin").field("id", &self.id).finish()
    }
}

impl<W: RegisterWindow, D> RegisterInterface for Pin<'_, W, D> {
    type Window = W;

    #[inline]
    fn id(&self) -> PinId {
        self.id
    }

    #[inline]
    fn window(&self) -> &W {
        &self.gpio.regs
    }
}

impl<'a, W: RegisterWindow, D: DelayUs<u32> + Clone> Pin<'a, W, D> {
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

    /// Select the function of the pin. The fields of the other pins in the same function select
    /// register are preserved.
    pub fn set_mode(&self, mode: Mode) {
        log::trace!("{} mode {:#05b}", self.id, mode.bits());
        self.write_field(RegisterFamily::MODE, mode.bits());
    }

    /// Read back the current function of the pin
    pub fn mode(&self) -> Mode {
        Mode::from_bits(self.read_field(RegisterFamily::MODE))
    }

    /// Drive the output latch of the pin. Only has a visible effect in [`Mode::Output`].
    pub fn set_level(&self, state: impl Into<PinState>) {
        let state = state.into();
        log::trace!("{} set {:?}", self.id, state);
        // Writing 0 to the set and clear registers has no effect, so other pins need no masking
        match state {
            PinState::High => self.write_bit(RegisterFamily::SET),
            PinState::Low => self.write_bit(RegisterFamily::CLEAR),
        }
    }

    /// Current logic level on the pin, `true` for high
    pub fn level(&self) -> bool {
        let level = self.read_field(RegisterFamily::LEVEL) != 0;
        log::trace!("{} get {}", self.id, level);
        level
    }

    /// Configure the pull resistor
    ///
    /// The control signal is written to the shared pull type register and clocked into this pin
    /// only. The order of the three writes and both waits is mandatory.
    ///
    /// The clock bit of the pin is left set after the sequence. The datasheet also suggests
    /// clearing it, which has not been verified against hardware yet.
    pub fn set_pull(&self, pull: PullMode) {
        log::trace!("{} pull {:?}", self.id, pull);
        let pull_type = RegisterFamily::PULL_TYPE.base();
        self.window().write(pull_type, pull as u32);
        self.gpio.settle(PULL_SETTLE);
        self.write_bit(RegisterFamily::PULL_CLOCK);
        self.gpio.settle(PULL_SETTLE);
        self.window().write(pull_type, 0);
    }

    /// Returns whether an event was latched for this pin
    ///
    /// Unless [`Gpio::set_suppress_event_clear`] is set, the flag is cleared right after reading
    /// it. In that case this call waits [`EVENT_SETTLE`] before returning. If the detected
    /// condition is still present, the flag is set again immediately.
    pub fn event(&self) -> bool {
        let latched = self.read_field(RegisterFamily::EVENT_DETECT) != 0;
        log::trace!("{} event {}", self.id, latched);
        if !self.gpio.suppress_event_clear() {
            self.write_bit(RegisterFamily::EVENT_DETECT);
            self.gpio.settle(EVENT_SETTLE);
        }
        latched
    }

    /// Clear the event flag of this pin. Has no effect if no event is latched or the
    /// condition is still present.
    pub fn clear_event(&self) {
        log::trace!("{} clear event", self.id);
        self.write_bit(RegisterFamily::EVENT_DETECT);
    }

    /// Enable or disable one of the edge and level detectors for this pin
    pub fn set_detect(&self, detect: Detect, enabled: bool) {
        log::trace!("{} {:?} detect {}", self.id, detect, enabled);
        self.modify_bit(detect.family(), enabled);
    }

    pub fn detect_enabled(&self, detect: Detect) -> bool {
        self.read_field(detect.family()) != 0
    }

    detect_setters!(());
}

impl<W: RegisterWindow, D: DelayUs<u32> + Clone> PartialEq<u32> for Pin<'_, W, D> {
    fn eq(&self, index: &u32) -> bool {
        self.is(*index)
    }
}

//==================================================================================================
//  Embedded HAL traits
//==================================================================================================

impl<W: RegisterWindow, D: DelayUs<u32> + Clone> OutputPin for Pin<'_, W, D> {
    type Error = Infallible;

    #[inline]
    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.set_level(PinState::High);
        Ok(())
    }

    #[inline]
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.set_level(PinState::Low);
        Ok(())
    }
}

impl<W: RegisterWindow, D: DelayUs<u32> + Clone> InputPin for Pin<'_, W, D> {
    type Error = Infallible;

    #[inline]
    fn is_high(&self) -> Result<bool, Self::Error> {
        Ok(self.level())
    }

    #[inline]
    fn is_low(&self) -> Result<bool, Self::Error> {
        Ok(!self.level())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pin_ids_in_range() {
        for index in 0..=MAX_PIN {
            let id = PinId::new(index).unwrap();
            assert_eq!(id.index(), index);
            assert!(id.is(index));
        }
    }

    #[test]
    fn pin_ids_out_of_range() {
        for index in [54, 55, 64, 255, 256, u32::MAX] {
            assert!(matches!(PinId::new(index), Err(Error::InvalidPinIndex(i)) if i == index));
        }
        assert!(PinId::try_from(54).is_err());
    }

    #[test]
    fn pin_id_display() {
        assert_eq!(PinId::new(4).unwrap().to_string(), "GPIO4");
    }

    #[test]
    fn mode_codes_decode_to_themselves() {
        for mode in Mode::ALL {
            assert_eq!(Mode::from_bits(mode.bits()), mode);
        }
        assert_eq!(Mode::Alt4.bits(), 0b011);
        assert_eq!(Mode::Alt5.bits(), 0b010);
        assert_eq!(Mode::from_bits(0b1_001), Mode::Output);
    }

    #[test]
    fn pin_state_conversions() {
        assert_eq!(PinState::from(0_u32), PinState::Low);
        assert_eq!(PinState::from(1_u32), PinState::High);
        assert_eq!(PinState::from(0xdead_u32), PinState::High);
        assert!(bool::from(PinState::High));
        assert!(!bool::from(PinState::from(false)));
    }

    #[test]
    fn detect_families_are_distinct() {
        for (i, a) in Detect::ALL.iter().enumerate() {
            for b in &Detect::ALL[i + 1..] {
                assert_ne!(a.family().base(), b.family().base());
            }
        }
    }
}
