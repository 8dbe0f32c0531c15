//! Link cable receive path
//!
//! Everything here except the [`ring::Consumer`] runs in interrupt context.
//! The ring is the only state shared with the main loop.

pub mod port;
pub mod receiver;
pub mod response;
pub mod ring;

pub use port::LinkPort;
pub use receiver::{BitReceiver, ClockMode, ReceiverStats};
pub use response::{FixedResponse, PrinterResponder, Responder, ResponsePolicy, DEVICE_ID};
pub use ring::{Consumer, FrameBuffer, Overflow, Producer, DEFAULT_CAPACITY};
