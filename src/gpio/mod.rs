//! # GPIO module
//!
//! The GPIO block of the BCM283x controls 54 pins through a set of register families. Each
//! family is a row of 32-bit registers holding one field per pin, either 3 bits wide with 10
//! pins per register (function select) or 1 bit wide with 32 pins per register (everything
//! else). [`locate`] computes where the field of a pin lives, and all pin operations are
//! built on top of this single computation.
//!
//! This API provides two different submodules, [`pins`] and [`dynpins`], representing two
//! different ways to reach the registers:
//!
//! - [`Pin`]s borrow an explicitly constructed [`Gpio`] controller. The controller is passed
//!   around like any other resource, and pin operations can not fail.
//! - [`DynPin`]s look up the controller stored by [`initialize`] on every call. They can be
//!   created before initialization and report [`Error::NotInitialized`](crate::Error) until
//!   the registers are mapped.
//!
//! Event detection is poll based. The detectors latch a sticky flag per pin which is read with
//! [`Pin::event`]. Interrupt driven notification is not provided.
pub mod dynpins;
pub use dynpins::*;

pub mod global;
pub use global::{
    controller, initialize, initialize_from, initialize_with, set_suppress_event_clear,
};

pub mod pins;
pub use pins::*;

mod reg;
pub use reg::{locate, FieldLocation, RegisterFamily, GPIO_BLOCK_LEN, GPIO_OFFSET};
