//! linkprint - Game Boy Printer emulator firmware
//!
//! Main firmware binary for RP2040-based boards. Sits on the link cable,
//! answers the Game Boy as its printer and logs the packets and image tiles
//! it receives over defmt.
//!
//! Link cable wiring (3.3 V side of a level shifter):
//!
//! | GPIO | cable | direction |
//! |------|-------|-----------|
//! | 2    | SC    | in        |
//! | 3    | SO    | in (Game Boy data) |
//! | 4    | SI    | out (printer data) |

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use linkprint_core::link::{BitReceiver, FrameBuffer, LinkPort, Responder, DEFAULT_CAPACITY};
use linkprint_hal::Lines;

use crate::config::PRINTER_CONFIG;
use crate::pins::{LinkInput, LinkOutput};

mod config;
mod pins;
mod tasks;

// Receive ring shared by the link and printer tasks (must live forever)
static RX_RING: StaticCell<FrameBuffer<DEFAULT_CAPACITY>> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("linkprint firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config = PRINTER_CONFIG;
    info!("{}", config);

    // The Game Boy drives SC and its SO; both idle high
    let clock = Input::new(p.PIN_2, Pull::Up);
    let data_in = Input::new(p.PIN_3, Pull::Up);
    let data_out = Output::new(p.PIN_4, Level::Low);
    let lines = Lines::new(LinkInput(clock), LinkInput(data_in), LinkOutput(data_out));

    let ring = RX_RING.init(FrameBuffer::new());
    let (producer, consumer) = ring.split();

    let responder: Responder = Responder::new(config.response, config.busy_inquiries);
    let receiver = BitReceiver::new(producer, responder, config.clock_mode);
    let port = LinkPort::new(lines, receiver);

    info!("Link port initialized");

    // Spawn tasks
    spawner.spawn(tasks::tick_task()).unwrap();
    spawner
        .spawn(tasks::printer_task(consumer, config))
        .unwrap();
    spawner
        .spawn(tasks::link_task(
            port,
            config.clock_mode,
            config.clock_gap_reset_us,
        ))
        .unwrap();

    info!("All tasks spawned, waiting for a Game Boy");

    // Main task has nothing else to do - all work happens in spawned tasks
    loop {
        embassy_time::Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}
