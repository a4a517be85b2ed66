//! Time units
//!
//! See [`MicroSeconds`] and [`MilliSeconds`] for expressing the settle times of the GPIO block.
//!
//! The [`U32Ext`] trait adds the methods `.us()` and `.ms()` to the `u32` primitive type,
//! allowing it to be converted into durations.
use core::time::Duration;

/// Time unit
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
pub struct MilliSeconds(pub u32);

/// Time unit
///
/// # Examples
///
/// ## Create the settle time required between the pull control writes
///
/// ```rust
/// use bcm283x_hal::time::U32Ext;
///
/// let settle = 2.us();
/// ```
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
pub struct MicroSeconds(pub u32);

/// Extension trait that adds convenience methods to the `u32` type
pub trait U32Ext {
    /// Wrap in `MilliSeconds`
    fn ms(self) -> MilliSeconds;

    /// Wrap in `MicroSeconds`
    fn us(self) -> MicroSeconds;
}

impl U32Ext for u32 {
    fn ms(self) -> MilliSeconds {
        MilliSeconds(self)
    }

    fn us(self) -> MicroSeconds {
        MicroSeconds(self)
    }
}

impl From<MilliSeconds> for MicroSeconds {
    fn from(val: MilliSeconds) -> Self {
        Self(val.0.saturating_mul(1_000))
    }
}

impl From<MicroSeconds> for Duration {
    fn from(val: MicroSeconds) -> Self {
        Duration::from_micros(val.0 as u64)
    }
}

impl From<MilliSeconds> for Duration {
    fn from(val: MilliSeconds) -> Self {
        Duration::from_millis(val.0 as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn millis_convert_to_micros() {
        assert_eq!(MicroSeconds::from(3.ms()), 3_000.us());
        assert_eq!(MicroSeconds::from(u32::MAX.ms()), MicroSeconds(u32::MAX));
    }

    #[test]
    fn units_convert_to_duration() {
        assert_eq!(Duration::from(10.us()), Duration::from_micros(10));
        assert_eq!(Duration::from(200.ms()), Duration::from_millis(200));
    }
}
