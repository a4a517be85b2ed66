//! # Register-level GPIO HAL for the Broadcom BCM283x family
//!
//! This crate drives the GPIO block of the SoCs found on the Raspberry Pi directly through its
//! memory-mapped registers. All operations are plain volatile reads and writes into a
//! [`RegisterWindow`](memory::RegisterWindow), so no kernel driver is involved.
//!
//! There are two ways to obtain pins:
//!
//! - Build a [`Gpio`](gpio::Gpio) controller from any register window and borrow
//!   [`Pin`](gpio::Pin)s from it. This is the preferred API and the one used by the tests.
//! - Call [`gpio::initialize`] once per process and create [`DynPin`](gpio::DynPin)s which look
//!   up the process-wide controller on every call.
//!
//! ## Examples
//!
//! The `demos` directory contains a blinky and an event polling example. Both need to run on a
//! Raspberry Pi with access to `/dev/gpiomem`.
pub mod delay;
pub mod error;
pub mod gpio;
pub mod hardware;
pub mod memory;
pub mod prelude;
pub mod time;

pub use error::{Error, Result};
