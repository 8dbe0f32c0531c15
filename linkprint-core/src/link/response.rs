//! Response byte policies
//!
//! While the Game Boy clocks a byte out on SO, the printer clocks one back on
//! its own line. The bit receiver asks a [`ResponsePolicy`] for the next
//! outgoing byte every time it completes an incoming one. Policies run in
//! interrupt context, so they must be quick and must not block.

use linkprint_protocol::{
    PacketParser, ParseState, PrinterState, Status, MAX_PAYLOAD_SIZE,
};

use crate::config::ResponseKind;

/// Byte a Game Boy Printer answers with while the first trailer byte is
/// clocked
pub const DEVICE_ID: u8 = 0x81;

/// Strategy for the byte sent back while the next byte is received
pub trait ResponsePolicy {
    /// Called with each completed incoming byte; returns the byte to shift
    /// out while the next one is received
    fn next_response(&mut self, received: u8) -> u8;

    /// Byte driven before anything has been received, and after a reset
    fn idle_response(&self) -> u8 {
        0x00
    }

    /// Forget any framing state
    fn reset(&mut self) {}
}

/// Answers every byte with the same value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FixedResponse(pub u8);

impl ResponsePolicy for FixedResponse {
    fn next_response(&mut self, _received: u8) -> u8 {
        self.0
    }

    fn idle_response(&self) -> u8 {
        self.0
    }
}

/// Answers like a real printer: device id, then the packet status
///
/// Tracks framing with its own payload-less parser and printer state, so
/// nothing but the receive buffer is shared with the main context. Because
/// both sides see the same byte stream they agree on the status byte. `P`
/// must match the payload capacity of the session parser.
#[derive(Debug, Clone)]
pub struct PrinterResponder<const P: usize = MAX_PAYLOAD_SIZE> {
    tracker: PacketParser<0>,
}

impl<const P: usize> Default for PrinterResponder<P> {
    fn default() -> Self {
        Self::new(PrinterState::default())
    }
}

impl<const P: usize> PrinterResponder<P> {
    pub fn new(printer: PrinterState) -> Self {
        Self {
            tracker: PacketParser::with_printer(printer),
        }
    }

    /// Printer state as seen by the responder
    pub fn printer(&self) -> &PrinterState {
        self.tracker.printer()
    }
}

impl<const P: usize> ResponsePolicy for PrinterResponder<P> {
    fn next_response(&mut self, received: u8) -> u8 {
        if self.tracker.process_byte(received) {
            let Some(packet) = self.tracker.packet() else {
                return 0x00;
            };
            // The tracker stores no payload; only real overruns are errors
            let overrun = usize::from(packet.payload_length) > P;
            return packet.status.with(Status::PACKET_ERROR, overrun).bits();
        }

        match self.tracker.state() {
            ParseState::Keepalive => DEVICE_ID,
            _ => 0x00,
        }
    }

    fn reset(&mut self) {
        self.tracker.reset();
    }
}

/// Policy selected at runtime from configuration
#[derive(Debug, Clone)]
pub enum Responder<const P: usize = MAX_PAYLOAD_SIZE> {
    Fixed(FixedResponse),
    Printer(PrinterResponder<P>),
}

impl<const P: usize> Responder<P> {
    /// Build the policy described by `kind`
    pub fn new(kind: ResponseKind, busy_inquiries: u8) -> Self {
        match kind {
            ResponseKind::Fixed(byte) => Responder::Fixed(FixedResponse(byte)),
            ResponseKind::Printer => {
                Responder::Printer(PrinterResponder::new(PrinterState::new(busy_inquiries)))
            }
        }
    }
}

impl<const P: usize> ResponsePolicy for Responder<P> {
    fn next_response(&mut self, received: u8) -> u8 {
        match self {
            Responder::Fixed(policy) => policy.next_response(received),
            Responder::Printer(policy) => policy.next_response(received),
        }
    }

    fn idle_response(&self) -> u8 {
        match self {
            Responder::Fixed(policy) => policy.idle_response(),
            Responder::Printer(policy) => policy.idle_response(),
        }
    }

    fn reset(&mut self) {
        match self {
            Responder::Fixed(policy) => policy.reset(),
            Responder::Printer(policy) => policy.reset(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkprint_protocol::{encode, Command};

    /// Feed a whole frame plus the two trailer bytes and collect the replies
    fn exchange(policy: &mut impl ResponsePolicy, frame: &[u8]) -> std::vec::Vec<u8> {
        frame.iter().map(|&b| policy.next_response(b)).collect()
    }

    fn frame(command: Command, payload: &[u8]) -> std::vec::Vec<u8> {
        let mut buffer = [0u8; 64];
        let len = encode(command, false, payload, &mut buffer).unwrap();
        // encode writes one trailer byte; the Game Boy clocks a second one
        let mut bytes = buffer[..len].to_vec();
        bytes.push(0x00);
        bytes
    }

    #[test]
    fn test_fixed_response() {
        let mut policy = FixedResponse(0x5A);
        assert_eq!(policy.idle_response(), 0x5A);
        assert_eq!(policy.next_response(0x88), 0x5A);
        assert_eq!(policy.next_response(0x00), 0x5A);
    }

    #[test]
    fn test_printer_answers_device_id_then_status() {
        let mut policy: PrinterResponder = PrinterResponder::default();
        let replies = exchange(&mut policy, &frame(Command::Inquiry, &[]));

        // Reply to byte i is shifted out while byte i + 1 is received
        let checksum_high = replies.len() - 3;
        assert_eq!(replies[checksum_high], DEVICE_ID);
        assert_eq!(replies[checksum_high + 1], 0x00);
        assert!(replies[..checksum_high].iter().all(|&b| b == 0x00));
    }

    #[test]
    fn test_printer_reports_unprocessed_data() {
        let mut policy: PrinterResponder = PrinterResponder::default();
        exchange(&mut policy, &frame(Command::Init, &[]));
        let replies = exchange(&mut policy, &frame(Command::Data, &[0x11; 32]));

        let status = Status::from_bits(replies[replies.len() - 2]);
        assert!(status.unprocessed_data());
        assert!(!status.packet_error());
        assert!(!status.checksum_error());
    }

    #[test]
    fn test_printer_reports_checksum_error() {
        let mut policy: PrinterResponder = PrinterResponder::default();
        let mut bytes = frame(Command::Data, &[0x11; 4]);
        let checksum_low = bytes.len() - 4;
        bytes[checksum_low] ^= 0xFF;

        let replies = exchange(&mut policy, &bytes);
        let status = Status::from_bits(replies[replies.len() - 2]);
        assert!(status.checksum_error());
        // Corrupt data is not buffered
        assert_eq!(policy.printer().buffered(), 0);
    }

    #[test]
    fn test_packet_error_follows_capacity() {
        let bytes = frame(Command::Data, &[0x11; 12]);

        let mut small: PrinterResponder<8> = PrinterResponder::default();
        let replies = exchange(&mut small, &bytes);
        assert!(Status::from_bits(replies[replies.len() - 2]).packet_error());

        let mut full: PrinterResponder = PrinterResponder::default();
        let replies = exchange(&mut full, &bytes);
        assert!(!Status::from_bits(replies[replies.len() - 2]).packet_error());
    }

    #[test]
    fn test_responder_dispatch() {
        let mut fixed: Responder = Responder::new(ResponseKind::Fixed(0xFF), 4);
        assert_eq!(fixed.idle_response(), 0xFF);
        assert_eq!(fixed.next_response(0x88), 0xFF);

        let mut printer: Responder = Responder::new(ResponseKind::Printer, 4);
        assert_eq!(printer.idle_response(), 0x00);
        let replies = exchange(&mut printer, &frame(Command::Init, &[]));
        assert_eq!(replies[replies.len() - 3], DEVICE_ID);
    }

    #[test]
    fn test_reset_drops_partial_frame() {
        let mut policy: PrinterResponder = PrinterResponder::default();
        let bytes = frame(Command::Inquiry, &[]);

        // Cut the frame just before the checksum, then resync
        exchange(&mut policy, &bytes[..6]);
        policy.reset();
        let replies = exchange(&mut policy, &bytes);
        assert_eq!(replies[replies.len() - 3], DEVICE_ID);
    }
}
