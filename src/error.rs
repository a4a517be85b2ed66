//! Error type shared by all modules of this crate
use thiserror::Error;

/// Crate error type
///
/// None of these errors are retried internally. Recovery always needs caller action: supply a
/// valid pin index, initialize the process-wide controller or run on supported hardware.
#[derive(Error, Debug)]
pub enum Error {
    /// Pin indices are limited to `0..=53`
    #[error("invalid pin index {0}, the highest GPIO is 53")]
    InvalidPinIndex(u32),
    /// A pin operation was attempted before [`initialize`](crate::gpio::initialize) succeeded.
    /// Contains the name of the operation.
    #[error("{0}: GPIO not initialized")]
    NotInitialized(&'static str),
    /// The board or SoC is not supported. Contains what the detector found.
    #[error("unsupported hardware: {0}")]
    UnsupportedHardware(String),
    /// The GPIO register block could not be mapped into the process
    #[error("mapping the GPIO registers failed")]
    MapFailure(#[source] std::io::Error),
}

pub type Result<T> = core::result::Result<T, Error>;
