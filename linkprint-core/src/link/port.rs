//! Link port: bit receiver bound to real pins

use linkprint_hal::{InputPin, LinkLines, OutputPin};

use super::receiver::{BitReceiver, ReceiverStats};
use super::response::ResponsePolicy;

/// Printer side of the link cable
///
/// Reads SC/SI and drives SO around a [`BitReceiver`]. The glue calls one of
/// the edge handlers from the clock interrupt.
pub struct LinkPort<'a, L, const N: usize, R> {
    lines: L,
    receiver: BitReceiver<'a, N, R>,
}

impl<'a, L: LinkLines, const N: usize, R: ResponsePolicy> LinkPort<'a, L, N, R> {
    /// Bind a receiver to the lines and drive its idle bit
    pub fn new(lines: L, receiver: BitReceiver<'a, N, R>) -> Self {
        let mut port = Self { lines, receiver };
        port.drive();
        port
    }

    /// Any clock edge: read both input levels from the pins
    pub fn on_edge(&mut self) -> bool {
        let clock = self.lines.clock().is_high();
        let data = self.lines.data_in().is_high();
        self.handle(clock, data)
    }

    /// Rising clock edge: SC is known to be high
    pub fn on_rising_edge(&mut self) -> bool {
        let data = self.lines.data_in().is_high();
        self.handle(true, data)
    }

    /// Resynchronize after a clock gap
    pub fn reset(&mut self) {
        self.receiver.reset();
        self.drive();
    }

    pub fn receiver(&self) -> &BitReceiver<'a, N, R> {
        &self.receiver
    }

    pub fn stats(&self) -> ReceiverStats {
        self.receiver.stats()
    }

    pub fn lines_mut(&mut self) -> &mut L {
        &mut self.lines
    }

    fn handle(&mut self, clock: bool, data: bool) -> bool {
        let bit = self.receiver.on_clock_edge(clock, data);
        self.lines.data_out().set_state(bit);
        bit
    }

    fn drive(&mut self) {
        let bit = self.receiver.output_bit();
        self.lines.data_out().set_state(bit);
    }
}
