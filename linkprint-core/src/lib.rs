//! Board-agnostic core of the printer emulator
//!
//! Everything between the link cable pins and decoded packets that does not
//! depend on a specific chip:
//!
//! - Receive ring shared between interrupt and main context
//! - Bit receiver and response policies (interrupt context)
//! - Pin binding for the bit receiver
//! - Session engine: packet parsing, tile decoding, timeouts (main context)
//! - Configuration type definitions
//!
//! ```text
//!  SC/SI edge ─► LinkPort ─► BitReceiver ─► FrameBuffer ─► PrinterSession ─► SessionSink
//!                   ▲             │                              │
//!                   └── SO bit ◄──┘ ResponsePolicy               └─ TimeoutMonitor
//! ```

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod config;
pub mod link;
pub mod session;
