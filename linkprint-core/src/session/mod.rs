//! Main-context session processing

pub mod engine;
pub mod timeout;

pub use engine::{PollOutcome, PrinterSession, SessionSink, SessionStats};
pub use timeout::{TimeoutMonitor, DEFAULT_TIMEOUT_MS};
