//! Configuration type definitions
//!
//! Runtime options of the emulated printer. Stored in flash as
//! postcard-serialized binary data (see [`super::store`]) or generated at
//! build time from `printer.toml`.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use linkprint_protocol::printer::DEFAULT_BUSY_INQUIRIES;

use crate::link::ClockMode;
use crate::session::timeout::DEFAULT_TIMEOUT_MS;

/// Clock gap after which bit alignment is reset (µs)
///
/// The Game Boy clocks a byte in ~120 µs at 8 kHz and leaves well over a
/// millisecond between bytes, so a few milliseconds of silence always falls
/// between bytes.
pub const DEFAULT_CLOCK_GAP_US: u32 = 2_000;

/// Longest accepted session timeout
pub const MAX_SESSION_TIMEOUT_MS: u32 = 60_000;

/// Response policy selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ResponseKind {
    /// Device id and status, like a real printer
    #[default]
    Printer,
    /// Same byte for everything
    Fixed(u8),
}

/// Printer configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PrinterConfig {
    /// Which clock edges the link glue reports
    pub clock_mode: ClockMode,
    /// Idle time before an in-flight packet is abandoned (ms)
    pub session_timeout_ms: u32,
    /// Clock silence that resets bit alignment (µs)
    pub clock_gap_reset_us: u32,
    /// INQUIRY packets answered busy after PRINT
    pub busy_inquiries: u8,
    /// What the printer answers on SO
    pub response: ResponseKind,
    /// Report every received byte, not just parsed packets
    pub capture_raw: bool,
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl PrinterConfig {
    pub const fn new() -> Self {
        Self {
            clock_mode: ClockMode::RisingEdge,
            session_timeout_ms: DEFAULT_TIMEOUT_MS,
            clock_gap_reset_us: DEFAULT_CLOCK_GAP_US,
            busy_inquiries: DEFAULT_BUSY_INQUIRIES,
            response: ResponseKind::Printer,
            capture_raw: false,
        }
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session_timeout_ms == 0 || self.session_timeout_ms > MAX_SESSION_TIMEOUT_MS {
            return Err(ConfigError::InvalidTimeout);
        }
        if self.clock_gap_reset_us == 0 {
            return Err(ConfigError::InvalidClockGap);
        }
        Ok(())
    }
}

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Serialization failed (buffer too small)
    Serialize,
    /// Deserialization failed
    Deserialize,
    /// Stored record is not a printer configuration
    BadMagic,
    /// Stored record has an unsupported version
    VersionMismatch,
    /// Stored record is corrupt
    CrcMismatch,
    /// Session timeout is zero or out of range
    InvalidTimeout,
    /// Clock gap reset interval is zero
    InvalidClockGap,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = PrinterConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.session_timeout_ms, 500);
        assert_eq!(config.response, ResponseKind::Printer);
    }

    #[test]
    fn test_timeout_range() {
        let mut config = PrinterConfig::new();
        config.session_timeout_ms = 0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidTimeout));

        config.session_timeout_ms = MAX_SESSION_TIMEOUT_MS + 1;
        assert_eq!(config.validate(), Err(ConfigError::InvalidTimeout));

        config.session_timeout_ms = MAX_SESSION_TIMEOUT_MS;
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_zero_clock_gap_rejected() {
        let config = PrinterConfig {
            clock_gap_reset_us: 0,
            ..PrinterConfig::new()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidClockGap));
    }
}
