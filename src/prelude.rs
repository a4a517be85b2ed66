//! Traits needed to drive pins and register windows
//!
//! ```
//! use bcm283x_hal::prelude::*;
//! ```
pub use embedded_hal::prelude::*;

// The embedded-hal prelude still exports the deprecated v1 digital traits
pub use embedded_hal::digital::v2::InputPin as _embedded_hal_digital_v2_InputPin;
pub use embedded_hal::digital::v2::OutputPin as _embedded_hal_digital_v2_OutputPin;

pub use crate::hardware::HardwareDetector as _bcm283x_hal_hardware_HardwareDetector;
pub use crate::memory::RegisterWindow as _bcm283x_hal_memory_RegisterWindow;
pub use crate::time::U32Ext as _bcm283x_hal_time_U32Ext;
