//! Printer status byte
//!
//! The status byte is sent back to the Game Boy in the last byte of every
//! exchange. Bit layout, most significant first:
//!
//! ```text
//! bit 7  low battery
//! bit 6  other error
//! bit 5  paper jam
//! bit 4  packet error
//! bit 3  unprocessed data
//! bit 2  print buffer full
//! bit 1  printer busy
//! bit 0  checksum error
//! ```

/// Packed status byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Status(u8);

impl Status {
    pub const CHECKSUM_ERROR: u8 = 1 << 0;
    pub const PRINTER_BUSY: u8 = 1 << 1;
    pub const PRINT_BUFFER_FULL: u8 = 1 << 2;
    pub const UNPROCESSED_DATA: u8 = 1 << 3;
    pub const PACKET_ERROR: u8 = 1 << 4;
    pub const PAPER_JAM: u8 = 1 << 5;
    pub const ERROR_OTHER: u8 = 1 << 6;
    pub const LOW_BATTERY: u8 = 1 << 7;

    /// All flags clear
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Wrap a raw status byte
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Raw status byte
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Check whether every bit of `mask` is set
    pub const fn contains(self, mask: u8) -> bool {
        self.0 & mask == mask
    }

    /// Set or clear the bits of `mask`
    pub fn set(&mut self, mask: u8, value: bool) {
        if value {
            self.0 |= mask;
        } else {
            self.0 &= !mask;
        }
    }

    /// Copy of this status with the bits of `mask` set or cleared
    pub const fn with(self, mask: u8, value: bool) -> Self {
        if value {
            Self(self.0 | mask)
        } else {
            Self(self.0 & !mask)
        }
    }

    pub const fn checksum_error(self) -> bool {
        self.contains(Self::CHECKSUM_ERROR)
    }

    pub const fn printer_busy(self) -> bool {
        self.contains(Self::PRINTER_BUSY)
    }

    pub const fn print_buffer_full(self) -> bool {
        self.contains(Self::PRINT_BUFFER_FULL)
    }

    pub const fn unprocessed_data(self) -> bool {
        self.contains(Self::UNPROCESSED_DATA)
    }

    pub const fn packet_error(self) -> bool {
        self.contains(Self::PACKET_ERROR)
    }

    pub const fn paper_jam(self) -> bool {
        self.contains(Self::PAPER_JAM)
    }

    pub const fn error_other(self) -> bool {
        self.contains(Self::ERROR_OTHER)
    }

    pub const fn low_battery(self) -> bool {
        self.contains(Self::LOW_BATTERY)
    }

    /// True if any of the error bits (checksum, packet, jam, other, battery) is set
    pub const fn has_error(self) -> bool {
        self.0
            & (Self::CHECKSUM_ERROR
                | Self::PACKET_ERROR
                | Self::PAPER_JAM
                | Self::ERROR_OTHER
                | Self::LOW_BATTERY)
            != 0
    }
}

impl From<u8> for Status {
    fn from(bits: u8) -> Self {
        Self(bits)
    }
}

impl From<Status> for u8 {
    fn from(status: Status) -> Self {
        status.0
    }
}

/// Status byte unpacked into named flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusFlags {
    pub low_battery: bool,
    pub error_other: bool,
    pub paper_jam: bool,
    pub packet_error: bool,
    pub unprocessed_data: bool,
    pub print_buffer_full: bool,
    pub printer_busy: bool,
    pub checksum_error: bool,
}

impl StatusFlags {
    /// Decode a status byte
    pub const fn decode(status: Status) -> Self {
        Self {
            low_battery: status.low_battery(),
            error_other: status.error_other(),
            paper_jam: status.paper_jam(),
            packet_error: status.packet_error(),
            unprocessed_data: status.unprocessed_data(),
            print_buffer_full: status.print_buffer_full(),
            printer_busy: status.printer_busy(),
            checksum_error: status.checksum_error(),
        }
    }

    /// Encode into a status byte
    pub const fn encode(&self) -> Status {
        Status::empty()
            .with(Status::LOW_BATTERY, self.low_battery)
            .with(Status::ERROR_OTHER, self.error_other)
            .with(Status::PAPER_JAM, self.paper_jam)
            .with(Status::PACKET_ERROR, self.packet_error)
            .with(Status::UNPROCESSED_DATA, self.unprocessed_data)
            .with(Status::PRINT_BUFFER_FULL, self.print_buffer_full)
            .with(Status::PRINTER_BUSY, self.printer_busy)
            .with(Status::CHECKSUM_ERROR, self.checksum_error)
    }
}

impl From<Status> for StatusFlags {
    fn from(status: Status) -> Self {
        Self::decode(status)
    }
}

impl From<StatusFlags> for Status {
    fn from(flags: StatusFlags) -> Self {
        flags.encode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_positions() {
        let flags = StatusFlags {
            low_battery: true,
            ..Default::default()
        };
        assert_eq!(flags.encode().bits(), 0x80);

        let flags = StatusFlags {
            checksum_error: true,
            ..Default::default()
        };
        assert_eq!(flags.encode().bits(), 0x01);

        let flags = StatusFlags {
            unprocessed_data: true,
            printer_busy: true,
            ..Default::default()
        };
        assert_eq!(flags.encode().bits(), 0x0A);
    }

    #[test]
    fn test_decode_every_byte() {
        for bits in 0..=u8::MAX {
            let status = Status::from_bits(bits);
            assert_eq!(StatusFlags::decode(status).encode(), status);
        }
    }

    #[test]
    fn test_set_and_clear() {
        let mut status = Status::empty();
        status.set(Status::PACKET_ERROR, true);
        assert!(status.packet_error());
        assert!(status.has_error());

        status.set(Status::PACKET_ERROR, false);
        assert_eq!(status, Status::empty());
        assert!(!status.has_error());
    }

    #[test]
    fn test_busy_is_not_an_error() {
        let status = Status::from_bits(Status::PRINTER_BUSY | Status::UNPROCESSED_DATA);
        assert!(status.printer_busy());
        assert!(!status.has_error());
    }
}
