//! Binary configuration records
//!
//! A stored record is the postcard encoding of the configuration wrapped in
//! a magic number, a format version and a CRC32 over the encoded
//! configuration.

use serde::{Deserialize, Serialize};

use super::types::{ConfigError, PrinterConfig};

/// Magic number identifying a printer configuration record
pub const CONFIG_MAGIC: u32 = 0x4C505254; // "LPRT"

/// Current record version
pub const CONFIG_VERSION: u8 = 1;

/// Upper bound on an encoded record
pub const MAX_RECORD_SIZE: usize = 48;

#[derive(Debug, Serialize, Deserialize)]
struct StoredConfig {
    magic: u32,
    version: u8,
    config: PrinterConfig,
    crc: u32,
}

impl PrinterConfig {
    /// Encode as a stored record into `buffer`
    ///
    /// Returns the used part of the buffer.
    pub fn to_bytes<'b>(&self, buffer: &'b mut [u8]) -> Result<&'b mut [u8], ConfigError> {
        let record = StoredConfig {
            magic: CONFIG_MAGIC,
            version: CONFIG_VERSION,
            config: *self,
            crc: config_crc(self)?,
        };
        postcard::to_slice(&record, buffer).map_err(|_| ConfigError::Serialize)
    }

    /// Decode and check a stored record
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        let record: StoredConfig =
            postcard::from_bytes(bytes).map_err(|_| ConfigError::Deserialize)?;

        if record.magic != CONFIG_MAGIC {
            return Err(ConfigError::BadMagic);
        }
        if record.version != CONFIG_VERSION {
            return Err(ConfigError::VersionMismatch);
        }
        if record.crc != config_crc(&record.config)? {
            return Err(ConfigError::CrcMismatch);
        }

        record.config.validate()?;
        Ok(record.config)
    }
}

fn config_crc(config: &PrinterConfig) -> Result<u32, ConfigError> {
    let mut buffer = [0u8; MAX_RECORD_SIZE];
    let bytes = postcard::to_slice(config, &mut buffer).map_err(|_| ConfigError::Serialize)?;
    Ok(!crc32_update(0xFFFF_FFFF, bytes))
}

/// CRC32 update (IEEE 802.3 polynomial)
fn crc32_update(crc: u32, data: &[u8]) -> u32 {
    const POLY: u32 = 0xEDB88320;
    let mut crc = crc;

    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ POLY;
            } else {
                crc >>= 1;
            }
        }
    }

    crc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResponseKind;
    use crate::link::ClockMode;

    fn custom() -> PrinterConfig {
        PrinterConfig {
            clock_mode: ClockMode::BothEdges,
            session_timeout_ms: 1_500,
            clock_gap_reset_us: 750,
            busy_inquiries: 2,
            response: ResponseKind::Fixed(0x81),
            capture_raw: true,
        }
    }

    #[test]
    fn test_record_roundtrip() {
        let mut buffer = [0u8; MAX_RECORD_SIZE];
        let len = custom().to_bytes(&mut buffer).unwrap().len();
        assert_eq!(PrinterConfig::from_bytes(&buffer[..len]), Ok(custom()));
    }

    #[test]
    fn test_crc32_check_value() {
        assert_eq!(!crc32_update(0xFFFF_FFFF, b"123456789"), 0xCBF4_3926);
    }

    #[test]
    fn test_wrong_magic() {
        let record = StoredConfig {
            magic: 0x50494443,
            version: CONFIG_VERSION,
            config: PrinterConfig::new(),
            crc: config_crc(&PrinterConfig::new()).unwrap(),
        };
        let mut buffer = [0u8; MAX_RECORD_SIZE];
        let bytes = postcard::to_slice(&record, &mut buffer).unwrap();
        assert_eq!(PrinterConfig::from_bytes(bytes), Err(ConfigError::BadMagic));
    }

    #[test]
    fn test_future_version_rejected() {
        let record = StoredConfig {
            magic: CONFIG_MAGIC,
            version: CONFIG_VERSION + 1,
            config: PrinterConfig::new(),
            crc: config_crc(&PrinterConfig::new()).unwrap(),
        };
        let mut buffer = [0u8; MAX_RECORD_SIZE];
        let bytes = postcard::to_slice(&record, &mut buffer).unwrap();
        assert_eq!(
            PrinterConfig::from_bytes(bytes),
            Err(ConfigError::VersionMismatch)
        );
    }

    #[test]
    fn test_corrupt_record() {
        let record = StoredConfig {
            magic: CONFIG_MAGIC,
            version: CONFIG_VERSION,
            config: custom(),
            crc: config_crc(&PrinterConfig::new()).unwrap(),
        };
        let mut buffer = [0u8; MAX_RECORD_SIZE];
        let bytes = postcard::to_slice(&record, &mut buffer).unwrap();
        assert_eq!(PrinterConfig::from_bytes(bytes), Err(ConfigError::CrcMismatch));
    }

    #[test]
    fn test_truncated_record() {
        let mut buffer = [0u8; MAX_RECORD_SIZE];
        let len = custom().to_bytes(&mut buffer).unwrap().len();
        assert_eq!(
            PrinterConfig::from_bytes(&buffer[..len - 3]),
            Err(ConfigError::Deserialize)
        );
    }

    #[test]
    fn test_buffer_too_small() {
        let mut buffer = [0u8; 4];
        assert_eq!(
            PrinterConfig::new().to_bytes(&mut buffer).map(|b| b.len()),
            Err(ConfigError::Serialize)
        );
    }
}
