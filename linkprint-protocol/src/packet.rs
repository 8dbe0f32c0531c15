//! Packet framing, encoding and the incremental parser.
//!
//! Packet format (bytes in the order the Game Boy sends them):
//! - SYNC (2 bytes): 0x88 0x33
//! - COMMAND (1 byte): see [`Command`]
//! - COMPRESSION (1 byte): bit 0 set for run-length compressed DATA
//! - LENGTH (2 bytes): payload length, low byte first
//! - PAYLOAD (LENGTH bytes)
//! - CHECKSUM (2 bytes): 16-bit wrapping sum of COMMAND..PAYLOAD, low byte first
//! - KEEPALIVE (1 byte): turnaround byte, value ignored

use heapless::Vec;

use crate::command::Command;
use crate::print::PrintParams;
use crate::printer::{Event, PrinterState};
use crate::status::Status;

/// First synchronization byte
pub const SYNC_0: u8 = 0x88;

/// Second synchronization byte
pub const SYNC_1: u8 = 0x33;

/// Largest payload a Game Boy sends (one band of 40 tiles)
pub const MAX_PAYLOAD_SIZE: usize = 0x280;

/// Bytes around the payload: SYNC(2) + header(4) + CHECKSUM(2) + KEEPALIVE(1)
pub const PACKET_OVERHEAD: usize = 9;

/// Errors that can occur when encoding a packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EncodeError {
    /// Payload does not fit the 16-bit length field
    PayloadTooLarge,
    /// Buffer too small for encoding
    BufferTooSmall,
}

/// 16-bit wrapping checksum over the header fields and payload
pub fn checksum(command: u8, compression: u8, payload: &[u8]) -> u16 {
    let len = payload.len() as u16;
    let header = [command, compression, len as u8, (len >> 8) as u8];
    header
        .iter()
        .chain(payload)
        .fold(0u16, |sum, &byte| sum.wrapping_add(byte as u16))
}

/// Encode a packet into a byte buffer
///
/// Returns the number of bytes written.
pub fn encode(
    command: Command,
    compressed: bool,
    payload: &[u8],
    buffer: &mut [u8],
) -> Result<usize, EncodeError> {
    if payload.len() > u16::MAX as usize {
        return Err(EncodeError::PayloadTooLarge);
    }
    let packet_len = PACKET_OVERHEAD + payload.len();
    if buffer.len() < packet_len {
        return Err(EncodeError::BufferTooSmall);
    }

    let command = command.to_byte();
    let compression = compressed as u8;
    let len = payload.len() as u16;
    let sum = checksum(command, compression, payload);

    buffer[..6].copy_from_slice(&[
        SYNC_0,
        SYNC_1,
        command,
        compression,
        len as u8,
        (len >> 8) as u8,
    ]);
    buffer[6..6 + payload.len()].copy_from_slice(payload);
    let tail = 6 + payload.len();
    buffer[tail] = sum as u8;
    buffer[tail + 1] = (sum >> 8) as u8;
    buffer[tail + 2] = 0x00;

    Ok(packet_len)
}

/// Encode a packet into a heapless Vec
pub fn encode_to_vec<const N: usize>(
    command: Command,
    compressed: bool,
    payload: &[u8],
) -> Result<Vec<u8, N>, EncodeError> {
    let mut vec = Vec::new();
    vec.resize(PACKET_OVERHEAD + payload.len(), 0)
        .map_err(|_| EncodeError::BufferTooSmall)?;
    encode(command, compressed, payload, &mut vec)?;
    Ok(vec)
}

/// One decoded packet
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Packet<const P: usize = MAX_PAYLOAD_SIZE> {
    /// Command from the header
    pub command: Command,
    /// Compression flag; only meaningful for DATA
    pub compression: bool,
    /// Length declared in the header
    pub payload_length: u16,
    /// Stored payload, at most `P` bytes
    pub payload: Vec<u8, P>,
    /// Status echoed to the Game Boy for this packet
    pub status: Status,
    /// Checksum received in the trailer
    pub checksum: u16,
    /// Whether the trailer checksum matched the computed one
    pub checksum_ok: bool,
}

impl<const P: usize> Packet<P> {
    /// True for DATA packets with the compression flag set
    pub fn is_compressed(&self) -> bool {
        self.command == Command::Data && self.compression
    }

    /// True when the declared payload did not fit in storage
    pub fn is_truncated(&self) -> bool {
        self.payload.len() < self.payload_length as usize
    }

    /// PRINT parameters, if this is a PRINT packet
    pub fn print_params(&self) -> Option<PrintParams> {
        match self.command {
            Command::Print => Some(PrintParams::from_payload(&self.payload)),
            _ => None,
        }
    }
}

#[cfg(feature = "defmt")]
impl<const P: usize> defmt::Format for Packet<P> {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "{} compression={} len={} stored={} status={=u8:#x} checksum_ok={}",
            self.command,
            self.compression,
            self.payload_length,
            self.payload.len(),
            self.status.bits(),
            self.checksum_ok
        )
    }
}

/// Parser states, in wire order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseState {
    /// Waiting for 0x88
    AwaitSync0,
    /// Got 0x88, waiting for 0x33
    AwaitSync1,
    Command,
    Compression,
    LengthLow,
    LengthHigh,
    /// Reading payload bytes
    Payload,
    ChecksumLow,
    ChecksumHigh,
    /// Waiting for the turnaround byte
    Keepalive,
    /// Packet ready; the next byte starts a new search
    Done,
}

/// View of the DATA payload received so far, for incremental decoding
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PayloadStream<'a> {
    /// Packet sequence number, changes every time a new packet starts
    pub sequence: u32,
    /// Run-length compressed
    pub compressed: bool,
    /// Stored payload bytes received so far
    pub bytes: &'a [u8],
    /// Length declared in the header
    pub declared_len: u16,
    /// Payload bytes consumed so far, including any that were not stored
    pub received: u16,
}

impl PayloadStream<'_> {
    /// True once every declared payload byte has been consumed from the stream
    pub fn is_complete(&self) -> bool {
        self.received >= self.declared_len
    }
}

/// State machine for parsing incoming packets
///
/// Fed one byte at a time from the receive buffer. Owns exactly one
/// in-flight [`Packet`]; a ready packet is overwritten once the next one
/// starts.
#[derive(Debug, Clone)]
pub struct PacketParser<const P: usize = MAX_PAYLOAD_SIZE> {
    state: ParseState,
    packet: Packet<P>,
    /// Payload bytes consumed from the stream, stored or not
    received: u16,
    running_sum: u16,
    printer: PrinterState,
    sequence: u32,
    ready: bool,
}

impl<const P: usize> Default for PacketParser<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const P: usize> PacketParser<P> {
    /// Create a new packet parser with a default printer
    pub fn new() -> Self {
        Self::with_printer(PrinterState::default())
    }

    /// Create a new packet parser around the given printer state
    pub fn with_printer(printer: PrinterState) -> Self {
        Self {
            state: ParseState::AwaitSync0,
            packet: Packet::default(),
            received: 0,
            running_sum: 0,
            printer,
            sequence: 0,
            ready: false,
        }
    }

    /// Abandon any in-flight packet and search for sync again
    ///
    /// The printer state is kept: an aborted session is not a reset of the
    /// printer.
    pub fn reset(&mut self) {
        self.state = ParseState::AwaitSync0;
        self.packet = Packet::default();
        self.received = 0;
        self.running_sum = 0;
        self.ready = false;
    }

    /// Current parser state
    pub fn state(&self) -> ParseState {
        self.state
    }

    /// Printer state driving the status byte
    pub fn printer(&self) -> &PrinterState {
        &self.printer
    }

    /// Number of packets started so far
    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    /// Returns true if a packet is ready to be read
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Borrow the ready packet
    pub fn packet(&self) -> Option<&Packet<P>> {
        self.ready.then_some(&self.packet)
    }

    /// Take the ready packet
    ///
    /// Returns `None` if no packet is ready or it was already taken.
    pub fn take_packet(&mut self) -> Option<Packet<P>> {
        if !self.ready {
            return None;
        }
        self.ready = false;
        Some(core::mem::take(&mut self.packet))
    }

    /// In-flight DATA payload, once its header has been parsed
    pub fn payload_stream(&self) -> Option<PayloadStream<'_>> {
        let past_header = !matches!(
            self.state,
            ParseState::AwaitSync0
                | ParseState::AwaitSync1
                | ParseState::Command
                | ParseState::Compression
                | ParseState::LengthLow
                | ParseState::LengthHigh
        );
        if !past_header || self.packet.command != Command::Data {
            return None;
        }

        Some(PayloadStream {
            sequence: self.sequence,
            compressed: self.packet.compression,
            bytes: &self.packet.payload,
            declared_len: self.packet.payload_length,
            received: self.received,
        })
    }

    /// Feed a single byte to the parser
    ///
    /// Returns true exactly when a packet becomes ready on this byte.
    pub fn process_byte(&mut self, byte: u8) -> bool {
        if self.state == ParseState::Done {
            // A ready packet stays readable until the next byte arrives
            self.ready = false;
            self.state = ParseState::AwaitSync0;
        }

        match self.state {
            ParseState::AwaitSync0 => {
                if byte == SYNC_0 {
                    self.state = ParseState::AwaitSync1;
                }
                // Silently ignore non-sync bytes while waiting
            }
            ParseState::AwaitSync1 => {
                self.state = match byte {
                    SYNC_1 => {
                        self.begin_packet();
                        ParseState::Command
                    }
                    // The mismatching byte may itself be the first sync byte
                    SYNC_0 => ParseState::AwaitSync1,
                    _ => ParseState::AwaitSync0,
                };
            }
            ParseState::Command => {
                self.accumulate(byte);
                self.packet.command = Command::from_byte(byte);
                self.state = ParseState::Compression;
            }
            ParseState::Compression => {
                self.accumulate(byte);
                self.packet.compression = byte & 0x01 != 0;
                self.state = ParseState::LengthLow;
            }
            ParseState::LengthLow => {
                self.accumulate(byte);
                self.packet.payload_length = byte as u16;
                self.state = ParseState::LengthHigh;
            }
            ParseState::LengthHigh => {
                self.accumulate(byte);
                self.packet.payload_length |= (byte as u16) << 8;
                self.state = if self.packet.payload_length == 0 {
                    ParseState::ChecksumLow
                } else {
                    ParseState::Payload
                };
            }
            ParseState::Payload => {
                self.accumulate(byte);
                // Bytes past capacity are consumed to keep framing aligned
                let _ = self.packet.payload.push(byte);
                self.received += 1;
                if self.received == self.packet.payload_length {
                    self.state = ParseState::ChecksumLow;
                }
            }
            ParseState::ChecksumLow => {
                self.packet.checksum = byte as u16;
                self.state = ParseState::ChecksumHigh;
            }
            ParseState::ChecksumHigh => {
                self.packet.checksum |= (byte as u16) << 8;
                self.packet.checksum_ok = self.packet.checksum == self.running_sum;
                self.state = ParseState::Keepalive;
            }
            ParseState::Keepalive => {
                self.finish_packet();
                self.state = ParseState::Done;
                self.ready = true;
                return true;
            }
            ParseState::Done => {}
        }

        false
    }

    /// Feed multiple bytes to the parser
    ///
    /// Stops after the first byte that completes a packet and returns how
    /// many bytes were consumed, so the caller can read the packet before
    /// feeding the rest.
    pub fn process_bytes(&mut self, bytes: &[u8]) -> (usize, bool) {
        for (i, &byte) in bytes.iter().enumerate() {
            if self.process_byte(byte) {
                return (i + 1, true);
            }
        }
        (bytes.len(), false)
    }

    fn begin_packet(&mut self) {
        self.packet = Packet::default();
        self.received = 0;
        self.running_sum = 0;
        self.ready = false;
        self.sequence = self.sequence.wrapping_add(1);
    }

    fn accumulate(&mut self, byte: u8) {
        self.running_sum = self.running_sum.wrapping_add(byte as u16);
    }

    fn finish_packet(&mut self) {
        if self.packet.checksum_ok {
            if let Some(event) =
                Event::from_command(self.packet.command, self.packet.payload_length)
            {
                self.printer.apply(event);
            }
        }

        self.packet.status = self
            .printer
            .status()
            .with(Status::CHECKSUM_ERROR, !self.packet.checksum_ok)
            .with(Status::PACKET_ERROR, self.packet.is_truncated());
    }
}
