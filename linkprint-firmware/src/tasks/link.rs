//! Link cable task
//!
//! Follows the Game Boy's clock: samples SI, drives SO and pushes completed
//! bytes into the receive ring. A partial byte followed by a long clock gap
//! means bit alignment was lost; the port is reset so the next byte starts
//! clean.

use defmt::*;
use embassy_time::{with_timeout, Duration};

use linkprint_core::link::ClockMode;

use crate::pins::Port;

/// Link task
#[embassy_executor::task]
pub async fn link_task(mut port: Port, mode: ClockMode, gap_us: u32) {
    info!("Link task started ({} mode)", mode);

    let gap = Duration::from_micros(gap_us as u64);

    loop {
        let mid_byte = port.receiver().bit_count() != 0;
        let clock = &mut port.lines_mut().clock.0;

        let edge = match (mode, mid_byte) {
            // Between bytes there is no alignment to lose: wait indefinitely
            (ClockMode::RisingEdge, false) => {
                clock.wait_for_rising_edge().await;
                Ok(())
            }
            (ClockMode::BothEdges, false) => {
                clock.wait_for_any_edge().await;
                Ok(())
            }
            (ClockMode::RisingEdge, true) => with_timeout(gap, clock.wait_for_rising_edge()).await,
            (ClockMode::BothEdges, true) => with_timeout(gap, clock.wait_for_any_edge()).await,
        };

        match edge {
            Ok(()) => match mode {
                ClockMode::RisingEdge => {
                    port.on_rising_edge();
                }
                ClockMode::BothEdges => {
                    port.on_edge();
                }
            },
            Err(_) => {
                debug!(
                    "Clock gap after {} bits, realigning",
                    port.receiver().bit_count()
                );
                port.reset();
            }
        }
    }
}
