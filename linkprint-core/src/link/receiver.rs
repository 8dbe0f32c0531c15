//! Clocked serial bit receiver
//!
//! Runs in interrupt context on every clock edge. Shifts SI in MSB first,
//! pushes each completed byte to the receive ring and shifts the response
//! byte out on SO. The Game Boy samples SO on the rising edge, so the next
//! output bit must be on the line before then.

use super::response::ResponsePolicy;
use super::ring::Producer;

/// Which clock edges the glue reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ClockMode {
    /// Only rising edges; the output shifts right after sampling
    #[default]
    RisingEdge,
    /// Rising edges sample, falling edges shift the output
    BothEdges,
}

/// Receiver diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReceiverStats {
    /// Bytes assembled, including dropped ones
    pub bytes_received: u32,
    /// Bytes lost because the ring was full
    pub bytes_dropped: u32,
}

/// Bit-to-byte assembler with a response shift register
#[derive(Debug)]
pub struct BitReceiver<'a, const N: usize, R> {
    producer: Producer<'a, N>,
    policy: R,
    mode: ClockMode,
    /// Bits sampled so far
    rx_shift: u8,
    /// Number of bits in `rx_shift` (0..8)
    bit_count: u8,
    /// Outgoing byte; bit 7 is the bit on the line
    tx_shift: u8,
    /// A sampled bit is waiting for its falling edge to shift the output
    shift_pending: bool,
    stats: ReceiverStats,
}

impl<'a, const N: usize, R: ResponsePolicy> BitReceiver<'a, N, R> {
    pub fn new(producer: Producer<'a, N>, policy: R, mode: ClockMode) -> Self {
        let tx_shift = policy.idle_response();
        Self {
            producer,
            policy,
            mode,
            rx_shift: 0,
            bit_count: 0,
            tx_shift,
            shift_pending: false,
            stats: ReceiverStats::default(),
        }
    }

    /// Handle one clock edge
    ///
    /// `clock` is the SC level after the edge, `data` the SI level. Returns
    /// the level to drive on SO until the next edge.
    pub fn on_clock_edge(&mut self, clock: bool, data: bool) -> bool {
        match (self.mode, clock) {
            (ClockMode::RisingEdge, true) => {
                if !self.sample(data) {
                    self.tx_shift <<= 1;
                }
            }
            (ClockMode::BothEdges, true) => {
                self.shift_pending = !self.sample(data);
            }
            (ClockMode::BothEdges, false) => {
                if self.shift_pending {
                    self.tx_shift <<= 1;
                    self.shift_pending = false;
                }
            }
            // Spurious falling edge in rising-edge mode
            (ClockMode::RisingEdge, false) => {}
        }

        self.output_bit()
    }

    /// Level currently driven on SO
    pub fn output_bit(&self) -> bool {
        self.tx_shift & 0x80 != 0
    }

    /// Drop any partial byte and restart framing
    ///
    /// Called after a long clock gap, when bit alignment can no longer be
    /// trusted.
    pub fn reset(&mut self) {
        self.rx_shift = 0;
        self.bit_count = 0;
        self.shift_pending = false;
        self.policy.reset();
        self.tx_shift = self.policy.idle_response();
    }

    /// Bits of the current byte received so far
    pub fn bit_count(&self) -> u8 {
        self.bit_count
    }

    pub fn mode(&self) -> ClockMode {
        self.mode
    }

    pub fn stats(&self) -> ReceiverStats {
        self.stats
    }

    pub fn policy(&self) -> &R {
        &self.policy
    }

    /// Shift one bit in; returns true when it completed a byte
    fn sample(&mut self, data: bool) -> bool {
        self.rx_shift = (self.rx_shift << 1) | data as u8;
        self.bit_count += 1;
        if self.bit_count < 8 {
            return false;
        }

        let byte = self.rx_shift;
        self.rx_shift = 0;
        self.bit_count = 0;

        self.stats.bytes_received = self.stats.bytes_received.wrapping_add(1);
        if self.producer.push(byte).is_err() {
            self.stats.bytes_dropped = self.stats.bytes_dropped.wrapping_add(1);
        }
        self.tx_shift = self.policy.next_response(byte);
        true
    }
}
