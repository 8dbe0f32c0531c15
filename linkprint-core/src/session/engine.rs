//! Printer session engine
//!
//! Main-context side of the emulator. Each poll drains the receive ring in
//! order, runs every byte through the packet parser and the tile decoder, and
//! hands results to a [`SessionSink`]. Never waits for input: whatever is
//! buffered is processed and partial state is kept for the next poll.

use linkprint_protocol::{
    Packet, PacketParser, PrinterState, Tile, TileAccumulator, TileDecompressor, MAX_PAYLOAD_SIZE,
};

use super::timeout::TimeoutMonitor;
use crate::config::PrinterConfig;
use crate::link::Consumer;

/// Receiver of session output
///
/// Only `on_packet` is required; raw bytes, tiles and link events are
/// optional.
pub trait SessionSink {
    /// A packet was received (checksum good or bad)
    fn on_packet<const P: usize>(&mut self, packet: &Packet<P>);

    /// A 16-byte tile was decoded from DATA payload
    ///
    /// Tiles are produced as payload arrives, before the packet checksum is
    /// known.
    fn on_tile(&mut self, _tile: &Tile) {}

    /// The Game Boy went quiet mid-session; in-flight state was discarded
    fn on_timeout(&mut self) {}

    /// Bytes were lost because the receive ring was full
    fn on_overflow(&mut self, _dropped: usize) {}

    /// Every received byte, in order, before parsing
    fn on_raw_byte(&mut self, _byte: u8) {}
}

/// Running totals since the session was created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SessionStats {
    pub bytes: u32,
    pub packets: u32,
    pub checksum_errors: u32,
    pub truncated_packets: u32,
    pub tiles: u32,
    pub timeouts: u32,
    pub dropped_bytes: u32,
}

/// What one poll did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PollOutcome {
    pub bytes: usize,
    pub packets: usize,
    pub tiles: usize,
    pub timed_out: bool,
}

/// Packet and tile decoding over a receive ring
pub struct PrinterSession<'a, const N: usize, const P: usize = MAX_PAYLOAD_SIZE> {
    rx: Consumer<'a, N>,
    timeout: TimeoutMonitor,
    parser: PacketParser<P>,
    decompressor: TileDecompressor,
    tile: TileAccumulator,
    stats: SessionStats,
}

impl<'a, const N: usize, const P: usize> PrinterSession<'a, N, P> {
    pub fn new(rx: Consumer<'a, N>, config: &PrinterConfig) -> Self {
        Self {
            rx,
            timeout: TimeoutMonitor::new(config.session_timeout_ms),
            parser: PacketParser::with_printer(PrinterState::new(config.busy_inquiries)),
            decompressor: TileDecompressor::new(),
            tile: TileAccumulator::new(),
            stats: SessionStats::default(),
        }
    }

    /// Process everything buffered, then advance the timeout by `elapsed_ms`
    pub fn poll<S: SessionSink>(&mut self, elapsed_ms: u32, sink: &mut S) -> PollOutcome {
        let mut outcome = PollOutcome::default();

        while let Some(byte) = self.rx.pop() {
            outcome.bytes += 1;
            sink.on_raw_byte(byte);

            let ready = self.parser.process_byte(byte);
            outcome.tiles += self.drain_tiles(sink);

            if ready {
                if let Some(packet) = self.parser.take_packet() {
                    self.record_packet(&packet);
                    sink.on_packet(&packet);
                    outcome.packets += 1;
                }
            }
        }
        self.stats.bytes = self.stats.bytes.wrapping_add(outcome.bytes as u32);

        let dropped = self.rx.clear_overflow();
        if dropped > 0 {
            self.stats.dropped_bytes = self.stats.dropped_bytes.wrapping_add(dropped as u32);
            sink.on_overflow(dropped);
        }

        if outcome.bytes > 0 {
            self.timeout.byte_received();
        } else if self.timeout.tick(elapsed_ms) {
            self.abort();
            self.stats.timeouts = self.stats.timeouts.wrapping_add(1);
            sink.on_timeout();
            outcome.timed_out = true;
        }

        outcome
    }

    /// Discard the in-flight packet and partial tile
    ///
    /// The printer state is kept; only the transfer is abandoned. Bytes still
    /// in the receive ring arrived after the gap and belong to the next
    /// packet, so they stay queued.
    pub fn abort(&mut self) {
        self.parser.reset();
        self.decompressor.reset();
        self.tile.clear();
    }

    pub fn parser(&self) -> &PacketParser<P> {
        &self.parser
    }

    pub fn printer(&self) -> &PrinterState {
        self.parser.printer()
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Bytes waiting in the receive ring
    pub fn buffered(&self) -> usize {
        self.rx.count()
    }

    /// Highest receive ring fill level seen
    pub fn max_buffered(&self) -> usize {
        self.rx.max_count()
    }

    /// Bytes of the current partial tile
    pub fn partial_tile_len(&self) -> usize {
        self.tile.len()
    }

    fn drain_tiles<S: SessionSink>(&mut self, sink: &mut S) -> usize {
        let Some(stream) = self.parser.payload_stream() else {
            return 0;
        };

        let mut count = 0;
        while self.decompressor.feed(&stream, &mut self.tile) {
            if let Some(tile) = self.tile.take() {
                sink.on_tile(&tile);
                count += 1;
            }
        }
        self.stats.tiles = self.stats.tiles.wrapping_add(count as u32);
        count
    }

    fn record_packet(&mut self, packet: &Packet<P>) {
        self.stats.packets = self.stats.packets.wrapping_add(1);
        if !packet.checksum_ok {
            self.stats.checksum_errors = self.stats.checksum_errors.wrapping_add(1);
        }
        if packet.is_truncated() {
            self.stats.truncated_packets = self.stats.truncated_packets.wrapping_add(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::{FrameBuffer, Producer};
    use linkprint_protocol::{compress, encode, Command, ParseState, SYNC_0, SYNC_1, TILE_SIZE};
    use std::vec::Vec;

    #[derive(Default)]
    struct Recorder {
        packets: Vec<(Command, bool, bool, u8)>,
        payloads: Vec<Vec<u8>>,
        tiles: Vec<Tile>,
        raw: Vec<u8>,
        timeouts: usize,
        overflows: Vec<usize>,
    }

    impl SessionSink for Recorder {
        fn on_packet<const P: usize>(&mut self, packet: &Packet<P>) {
            self.packets.push((
                packet.command,
                packet.compression,
                packet.checksum_ok,
                packet.status.bits(),
            ));
            self.payloads.push(packet.payload.to_vec());
        }

        fn on_tile(&mut self, tile: &Tile) {
            self.tiles.push(*tile);
        }

        fn on_timeout(&mut self) {
            self.timeouts += 1;
        }

        fn on_overflow(&mut self, dropped: usize) {
            self.overflows.push(dropped);
        }

        fn on_raw_byte(&mut self, byte: u8) {
            self.raw.push(byte);
        }
    }

    fn frame(command: Command, compressed: bool, payload: &[u8]) -> Vec<u8> {
        let mut buffer = std::vec![0u8; payload.len() + 16];
        let len = encode(command, compressed, payload, &mut buffer).unwrap();
        buffer.truncate(len);
        buffer
    }

    fn new_session<const N: usize>(rx: Consumer<'_, N>) -> PrinterSession<'_, N> {
        PrinterSession::new(rx, &PrinterConfig::new())
    }

    fn push_all<const N: usize>(tx: &mut Producer<'_, N>, bytes: &[u8]) {
        for &byte in bytes {
            tx.push(byte).unwrap();
        }
    }

    #[test]
    fn test_data_example_packet() {
        // DATA, compressed, four zero bytes
        let bytes = [
            0x88, 0x33, 0x04, 0x01, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x09, 0x00, 0x00,
        ];
        let mut ring = FrameBuffer::<32>::new();
        let (mut tx, rx) = ring.split();
        let mut session = new_session(rx);
        let mut sink = Recorder::default();

        push_all(&mut tx, &bytes);
        let outcome = session.poll(1, &mut sink);

        assert_eq!(outcome.bytes, bytes.len());
        assert_eq!(outcome.packets, 1);
        let (command, compression, checksum_ok, _) = sink.packets[0];
        assert_eq!(command, Command::Data);
        assert!(compression);
        assert!(checksum_ok);
        assert_eq!(sink.raw, bytes);
    }

    #[test]
    fn test_print_job_with_tiles() {
        let mut image = Vec::new();
        for tile in 0..4u8 {
            image.extend_from_slice(&[tile; 8]);
            image.extend((0..8).map(|i| i * tile));
        }
        let mut compressed = heapless::Vec::<u8, 128>::new();
        compress(&image, &mut compressed).unwrap();

        let mut ring = FrameBuffer::<256>::new();
        let (mut tx, rx) = ring.split();
        let mut session = new_session(rx);
        let mut sink = Recorder::default();

        push_all(&mut tx, &frame(Command::Init, false, &[]));
        push_all(&mut tx, &frame(Command::Data, true, &compressed));
        push_all(&mut tx, &frame(Command::Data, false, &[]));
        session.poll(1, &mut sink);

        assert_eq!(sink.packets.len(), 3);
        assert_eq!(sink.tiles.len(), 4);
        let decoded: Vec<u8> = sink.tiles.iter().flatten().copied().collect();
        assert_eq!(decoded, image);
        // Unprocessed data reported once the image is buffered
        assert_eq!(sink.packets[1].3 & 0x08, 0x08);

        push_all(&mut tx, &frame(Command::Print, false, &[1, 0x13, 0xE4, 0x40]));
        session.poll(1, &mut sink);
        assert_eq!(sink.packets[3].0, Command::Print);
        assert!(session.printer().status().printer_busy());
        assert_eq!(session.stats().tiles, 4);
    }

    #[test]
    fn test_tiles_across_polls() {
        let payload: Vec<u8> = (0..(TILE_SIZE as u8 * 2)).collect();
        let bytes = frame(Command::Data, false, &payload);

        let mut ring = FrameBuffer::<8>::new();
        let (mut tx, rx) = ring.split();
        let mut session = new_session(rx);
        let mut sink = Recorder::default();

        for chunk in bytes.chunks(5) {
            push_all(&mut tx, chunk);
            session.poll(1, &mut sink);
        }

        assert_eq!(sink.tiles.len(), 2);
        assert_eq!(sink.tiles[1][0], TILE_SIZE as u8);
        assert_eq!(sink.payloads[0], payload);
    }

    #[test]
    fn test_corrupt_checksum_still_delivered() {
        let mut bytes = frame(Command::Data, false, &[0xAA; 16]);
        let checksum_low = bytes.len() - 3;
        bytes[checksum_low] ^= 0x01;

        let mut ring = FrameBuffer::<64>::new();
        let (mut tx, rx) = ring.split();
        let mut session = new_session(rx);
        let mut sink = Recorder::default();

        push_all(&mut tx, &bytes);
        session.poll(1, &mut sink);

        let (_, _, checksum_ok, status) = sink.packets[0];
        assert!(!checksum_ok);
        assert_eq!(status & 0x01, 0x01);
        assert_eq!(session.stats().checksum_errors, 1);
        assert_eq!(session.printer().buffered(), 0);
    }

    #[test]
    fn test_timeout_aborts_partial_frame() {
        let mut ring = FrameBuffer::<32>::new();
        let (mut tx, rx) = ring.split();
        let mut session = new_session(rx);
        let mut sink = Recorder::default();

        // Sync, header and three payload bytes of an 8-byte DATA packet
        push_all(&mut tx, &[0x88, 0x33, 0x04, 0x00, 0x08, 0x00, 1, 2, 3]);
        session.poll(1, &mut sink);
        assert_eq!(session.parser().state(), ParseState::Payload);

        assert!(!session.poll(500, &mut sink).timed_out);
        assert!(session.poll(1, &mut sink).timed_out);
        assert_eq!(session.parser().state(), ParseState::AwaitSync0);
        assert_eq!(sink.timeouts, 1);

        // Fires once per idle period
        assert!(!session.poll(10_000, &mut sink).timed_out);

        // Next session starts clean
        push_all(&mut tx, &frame(Command::Inquiry, false, &[]));
        session.poll(1, &mut sink);
        assert_eq!(sink.packets.len(), 1);
        assert_eq!(sink.packets[0].0, Command::Inquiry);
        assert!(sink.tiles.is_empty());
        assert_eq!(session.stats().timeouts, 1);
    }

    #[test]
    fn test_abort_keeps_bytes_of_next_packet() {
        let mut ring = FrameBuffer::<32>::new();
        let (mut tx, rx) = ring.split();
        let mut session = new_session(rx);
        let mut sink = Recorder::default();

        // Half a DATA packet, then the Game Boy goes quiet
        push_all(&mut tx, &[0x88, 0x33, 0x04, 0x00, 0x08, 0x00, 1, 2]);
        session.poll(1, &mut sink);

        // It reconnects just as the session is abandoned
        push_all(&mut tx, &[SYNC_0, SYNC_1]);
        session.abort();
        assert_eq!(session.buffered(), 2);
        assert_eq!(session.parser().state(), ParseState::AwaitSync0);

        let inquiry = frame(Command::Inquiry, false, &[]);
        push_all(&mut tx, &inquiry[2..]);
        session.poll(1, &mut sink);

        assert_eq!(sink.packets.len(), 1);
        assert_eq!(sink.packets[0].0, Command::Inquiry);
        assert!(sink.packets[0].2);
        assert!(sink.overflows.is_empty());
        assert_eq!(session.stats().dropped_bytes, 0);
    }

    #[test]
    fn test_overflow_reported_once() {
        let mut ring = FrameBuffer::<4>::new();
        let (mut tx, rx) = ring.split();
        let mut session = new_session(rx);
        let mut sink = Recorder::default();

        for byte in 0..6 {
            let _ = tx.push(byte);
        }
        session.poll(1, &mut sink);
        session.poll(1, &mut sink);

        assert_eq!(sink.overflows, [2]);
        assert_eq!(sink.raw, [0, 1, 2, 3]);
        assert_eq!(session.stats().dropped_bytes, 2);
        assert_eq!(session.max_buffered(), 4);
    }

    #[test]
    fn test_garbage_then_packet() {
        let mut ring = FrameBuffer::<64>::new();
        let (mut tx, rx) = ring.split();
        let mut session = new_session(rx);
        let mut sink = Recorder::default();

        push_all(&mut tx, &[0x00, 0x33, 0x88, 0x88, 0x12]);
        push_all(&mut tx, &frame(Command::Break, false, &[]));
        session.poll(1, &mut sink);

        assert_eq!(sink.packets.len(), 1);
        assert_eq!(sink.packets[0].0, Command::Break);
        assert!(sink.packets[0].2);
    }
}
