//! Link cable pins
//!
//! Embassy GPIO wrapped in the pin traits the core is written against.

use embassy_rp::gpio::{Input, Output};
use linkprint_core::link::{LinkPort, Responder, DEFAULT_CAPACITY};
use linkprint_hal::{InputPin, Lines, OutputPin};

/// SC or SI line
pub struct LinkInput(pub Input<'static>);

impl InputPin for LinkInput {
    fn is_high(&self) -> bool {
        self.0.is_high()
    }
}

/// SO line
pub struct LinkOutput(pub Output<'static>);

impl OutputPin for LinkOutput {
    fn set_high(&mut self) {
        self.0.set_high();
    }

    fn set_low(&mut self) {
        self.0.set_low();
    }

    fn is_set_high(&self) -> bool {
        self.0.is_set_high()
    }
}

pub type LinkPins = Lines<LinkInput, LinkInput, LinkOutput>;

/// The port driven by the link task
pub type Port = LinkPort<'static, LinkPins, DEFAULT_CAPACITY, Responder>;
