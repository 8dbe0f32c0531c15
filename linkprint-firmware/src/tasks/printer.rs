//! Printer session task
//!
//! Drains the receive ring every tick and logs what the Game Boy sent.

use defmt::*;

use linkprint_core::config::PrinterConfig;
use linkprint_core::link::{Consumer, DEFAULT_CAPACITY};
use linkprint_core::session::{PrinterSession, SessionSink};
use linkprint_protocol::{Command, Packet, Tile};

use super::tick::TICK_SIGNAL;

/// Ticks between statistics reports
const STATS_INTERVAL_TICKS: u32 = 1000;

/// Session output sent to the defmt log
struct LogSink {
    capture_raw: bool,
    tiles_in_image: u32,
}

impl SessionSink for LogSink {
    fn on_packet<const P: usize>(&mut self, packet: &Packet<P>) {
        if !packet.checksum_ok {
            warn!("Checksum mismatch: {}", packet);
            return;
        }
        if packet.is_truncated() {
            warn!("Payload truncated: {}", packet);
        }

        match packet.command {
            Command::Init => {
                info!("INIT");
                self.tiles_in_image = 0;
            }
            Command::Data if packet.payload_length == 0 => {
                info!("End of image data, {} tiles", self.tiles_in_image);
            }
            Command::Print => {
                if let Some(params) = packet.print_params() {
                    info!("PRINT {}", params);
                }
            }
            Command::Inquiry => trace!("{}", packet),
            _ => debug!("{}", packet),
        }
    }

    fn on_tile(&mut self, tile: &Tile) {
        self.tiles_in_image = self.tiles_in_image.wrapping_add(1);
        debug!("tile {}: {=[u8]:x}", self.tiles_in_image, tile.as_slice());
    }

    fn on_timeout(&mut self) {
        warn!("Game Boy went quiet, session aborted");
    }

    fn on_overflow(&mut self, dropped: usize) {
        warn!("Receive ring overflow, {} bytes dropped", dropped);
    }

    fn on_raw_byte(&mut self, byte: u8) {
        if self.capture_raw {
            trace!("rx {=u8:#x}", byte);
        }
    }
}

/// Printer task
#[embassy_executor::task]
pub async fn printer_task(rx: Consumer<'static, DEFAULT_CAPACITY>, config: PrinterConfig) {
    info!("Printer task started");

    let mut session: PrinterSession<'static, DEFAULT_CAPACITY> = PrinterSession::new(rx, &config);
    let mut sink = LogSink {
        capture_raw: config.capture_raw,
        tiles_in_image: 0,
    };
    let mut last_ms = 0u32;
    let mut ticks = 0u32;

    loop {
        let now_ms = TICK_SIGNAL.wait().await;
        let elapsed_ms = now_ms.wrapping_sub(last_ms);
        last_ms = now_ms;

        let outcome = session.poll(elapsed_ms, &mut sink);
        if outcome.bytes > 0 {
            trace!("{}", outcome);
        }

        ticks = ticks.wrapping_add(1);
        if ticks % STATS_INTERVAL_TICKS == 0 {
            debug!(
                "{} printer={} ring max={}",
                session.stats(),
                session.printer().status().bits(),
                session.max_buffered()
            );
        }
    }
}
