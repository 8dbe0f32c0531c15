//! GPIO pin abstractions
//!
//! Provides traits for digital input and output pins that can be implemented
//! by chip-specific glue.

/// Digital output pin
///
/// Implementations should handle the actual hardware register manipulation
/// for the specific chip. Must be callable from interrupt context.
pub trait OutputPin {
    /// Set the pin high (logic 1)
    fn set_high(&mut self);

    /// Set the pin low (logic 0)
    fn set_low(&mut self);

    /// Set the pin to a specific state
    fn set_state(&mut self, high: bool) {
        if high {
            self.set_high();
        } else {
            self.set_low();
        }
    }

    /// Check if the pin is currently set high
    fn is_set_high(&self) -> bool;
}

/// Digital input pin
///
/// Implementations should handle the actual hardware register reading
/// for the specific chip.
pub trait InputPin {
    /// Check if the pin reads high (logic 1)
    fn is_high(&self) -> bool;

    /// Check if the pin reads low (logic 0)
    fn is_low(&self) -> bool {
        !self.is_high()
    }
}

/// The link cable signals seen from the printer side
///
/// - SC: serial clock, driven by the Game Boy
/// - SI: serial data from the Game Boy (its SO)
/// - SO: serial data to the Game Boy (its SI)
pub trait LinkLines {
    type Clock: InputPin;
    type DataIn: InputPin;
    type DataOut: OutputPin;

    fn clock(&self) -> &Self::Clock;
    fn data_in(&self) -> &Self::DataIn;
    fn data_out(&mut self) -> &mut Self::DataOut;
}

/// Plain bundle of three pins
#[derive(Debug)]
pub struct Lines<C, I, O> {
    pub clock: C,
    pub data_in: I,
    pub data_out: O,
}

impl<C, I, O> Lines<C, I, O> {
    pub fn new(clock: C, data_in: I, data_out: O) -> Self {
        Self {
            clock,
            data_in,
            data_out,
        }
    }
}

impl<C: InputPin, I: InputPin, O: OutputPin> LinkLines for Lines<C, I, O> {
    type Clock = C;
    type DataIn = I;
    type DataOut = O;

    fn clock(&self) -> &C {
        &self.clock
    }

    fn data_in(&self) -> &I {
        &self.data_in
    }

    fn data_out(&mut self) -> &mut O {
        &mut self.data_out
    }
}
