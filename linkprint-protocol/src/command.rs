//! Printer command codes carried in the COMMAND byte of a packet

/// Command sent by the Game Boy in a packet header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Reset the printer and discard buffered image data
    Init,
    /// Print the buffered image data
    Print,
    /// Image data (possibly run-length compressed)
    Data,
    /// Abort the current print job
    Break,
    /// Status request
    Inquiry,
    /// Unrecognized command byte, retained verbatim
    Unknown(u8),
}

// Wire format values
const CMD_INIT: u8 = 0x01;
const CMD_PRINT: u8 = 0x02;
/// Image data is 0x04 on real printers; 0x02 is PRINT, not DATA
const CMD_DATA: u8 = 0x04;
const CMD_BREAK: u8 = 0x08;
const CMD_INQUIRY: u8 = 0x0F;

impl Default for Command {
    fn default() -> Self {
        Command::Unknown(0)
    }
}

impl Command {
    /// Parse a command from its wire format byte
    ///
    /// Never fails: unknown values are kept as [`Command::Unknown`].
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            CMD_INIT => Command::Init,
            CMD_PRINT => Command::Print,
            CMD_DATA => Command::Data,
            CMD_BREAK => Command::Break,
            CMD_INQUIRY => Command::Inquiry,
            other => Command::Unknown(other),
        }
    }

    /// Convert to wire format byte
    pub fn to_byte(self) -> u8 {
        match self {
            Command::Init => CMD_INIT,
            Command::Print => CMD_PRINT,
            Command::Data => CMD_DATA,
            Command::Break => CMD_BREAK,
            Command::Inquiry => CMD_INQUIRY,
            Command::Unknown(raw) => raw,
        }
    }

    /// Short uppercase name, as printed in packet dumps
    pub fn name(self) -> &'static str {
        match self {
            Command::Init => "INIT",
            Command::Print => "PRNT",
            Command::Data => "DATA",
            Command::Break => "BREK",
            Command::Inquiry => "INQY",
            Command::Unknown(_) => "?",
        }
    }

    /// Returns true for commands the printer understands
    pub fn is_known(&self) -> bool {
        !matches!(self, Command::Unknown(_))
    }
}
