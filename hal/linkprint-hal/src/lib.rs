//! linkprint Hardware Abstraction Layer
//!
//! This crate defines the pin traits the link cable glue is written
//! against, so the same bit-level code runs on any chip that can sample two
//! inputs and drive one output.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  linkprint-core (LinkPort, BitReceiver) │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  linkprint-hal (this crate - traits)    │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  chip glue (linkprint-firmware, mocks)  │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::OutputPin`], [`gpio::InputPin`] - Digital I/O
//! - [`gpio::LinkLines`] - the three link cable signals as one bundle

#![no_std]
#![deny(unsafe_code)]

pub mod gpio;

// Re-export key traits at crate root for convenience
pub use gpio::{InputPin, Lines, LinkLines, OutputPin};
