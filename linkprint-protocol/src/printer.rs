//! Emulated printer state
//!
//! The status byte echoed to the Game Boy is a function of what the printer
//! has been asked to do so far. The transitions are explicit and
//! deterministic, mirroring the behavior games expect from real hardware:
//! data makes the printer report unprocessed data, PRINT makes it busy for a
//! few status polls, INIT and BREAK return it to idle.

use crate::command::Command;
use crate::status::Status;

/// Printer RAM size: 9 bands of 2 tile rows (20 tiles × 16 bytes × 2)
pub const IMAGE_BUFFER_SIZE: u32 = 0x280 * 9;

/// Number of INQUIRY packets answered with "busy" after a PRINT
pub const DEFAULT_BUSY_INQUIRIES: u8 = 4;

/// Printer phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// Nothing buffered
    #[default]
    Idle,
    /// Image data buffered, waiting for PRINT
    Receiving,
    /// Printing; busy until `remaining` more inquiries have been answered
    Printing { remaining: u8 },
}

/// Events derived from completed, checksum-valid packets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    Init,
    /// DATA packet; zero length marks the end of the image
    Data { len: u16 },
    Print,
    Inquiry,
    Break,
}

impl Event {
    /// Map a packet command to a printer event
    ///
    /// Unknown commands produce no event.
    pub fn from_command(command: Command, payload_length: u16) -> Option<Self> {
        match command {
            Command::Init => Some(Event::Init),
            Command::Data => Some(Event::Data {
                len: payload_length,
            }),
            Command::Print => Some(Event::Print),
            Command::Inquiry => Some(Event::Inquiry),
            Command::Break => Some(Event::Break),
            Command::Unknown(_) => None,
        }
    }
}

impl Phase {
    /// Process an event and return the next phase
    pub fn transition(self, event: Event, busy_inquiries: u8) -> Self {
        use Event::*;
        use Phase::*;

        match (self, event) {
            (_, Init) | (_, Break) => Idle,

            // End-of-data marker leaves the phase untouched
            (phase, Data { len: 0 }) => phase,
            (Idle, Data { .. }) | (Receiving, Data { .. }) => Receiving,

            (Receiving, Print) if busy_inquiries == 0 => Idle,
            (Receiving, Print) => Printing {
                remaining: busy_inquiries,
            },

            (Printing { remaining }, Inquiry) if remaining <= 1 => Idle,
            (Printing { remaining }, Inquiry) => Printing {
                remaining: remaining - 1,
            },

            // Default: stay in current phase
            (phase, _) => phase,
        }
    }
}

/// Printer state owned by whoever answers the Game Boy
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PrinterState {
    phase: Phase,
    /// Image bytes received since the last INIT/PRINT/BREAK
    buffered: u32,
    busy_inquiries: u8,
}

impl Default for PrinterState {
    fn default() -> Self {
        Self::new(DEFAULT_BUSY_INQUIRIES)
    }
}

impl PrinterState {
    /// Create an idle printer that stays busy for `busy_inquiries` polls after PRINT
    pub const fn new(busy_inquiries: u8) -> Self {
        Self {
            phase: Phase::Idle,
            buffered: 0,
            busy_inquiries,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Image bytes buffered since the last INIT, PRINT or BREAK
    pub fn buffered(&self) -> u32 {
        self.buffered
    }

    /// Back to power-on state
    pub fn reset(&mut self) {
        self.phase = Phase::Idle;
        self.buffered = 0;
    }

    /// Apply an event
    pub fn apply(&mut self, event: Event) {
        match event {
            Event::Init | Event::Break => self.buffered = 0,
            Event::Data { len } if !matches!(self.phase, Phase::Printing { .. }) => {
                self.buffered = self.buffered.saturating_add(u32::from(len));
            }
            Event::Print if self.phase == Phase::Receiving => self.buffered = 0,
            _ => {}
        }
        self.phase = self.phase.transition(event, self.busy_inquiries);
    }

    /// Status bits describing the current state
    pub fn status(&self) -> Status {
        let mut status = Status::empty();
        match self.phase {
            Phase::Idle => {}
            Phase::Receiving => status.set(Status::UNPROCESSED_DATA, true),
            Phase::Printing { .. } => status.set(Status::PRINTER_BUSY, true),
        }
        status.set(Status::PRINT_BUFFER_FULL, self.buffered >= IMAGE_BUFFER_SIZE);
        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typical_print_job() {
        let mut printer = PrinterState::new(2);
        assert_eq!(printer.status(), Status::empty());

        printer.apply(Event::Init);
        printer.apply(Event::Data { len: 0x280 });
        assert!(printer.status().unprocessed_data());
        assert_eq!(printer.buffered(), 0x280);

        printer.apply(Event::Data { len: 0 });
        assert_eq!(printer.phase(), Phase::Receiving);

        printer.apply(Event::Print);
        assert!(printer.status().printer_busy());
        assert!(!printer.status().unprocessed_data());

        printer.apply(Event::Inquiry);
        assert!(printer.status().printer_busy());
        printer.apply(Event::Inquiry);
        assert_eq!(printer.phase(), Phase::Idle);
        assert_eq!(printer.status(), Status::empty());
    }

    #[test]
    fn test_print_without_data_stays_idle() {
        let next = Phase::Idle.transition(Event::Print, 3);
        assert_eq!(next, Phase::Idle);
    }

    #[test]
    fn test_break_from_any_phase() {
        let phases = [
            Phase::Idle,
            Phase::Receiving,
            Phase::Printing { remaining: 3 },
        ];

        for phase in phases {
            assert_eq!(phase.transition(Event::Break, 3), Phase::Idle);
        }
    }

    #[test]
    fn test_zero_busy_inquiries_finishes_immediately() {
        let next = Phase::Receiving.transition(Event::Print, 0);
        assert_eq!(next, Phase::Idle);
    }

    #[test]
    fn test_buffer_full() {
        let mut printer = PrinterState::default();
        for _ in 0..9 {
            printer.apply(Event::Data { len: 0x280 });
        }
        assert!(printer.status().print_buffer_full());

        printer.apply(Event::Init);
        assert!(!printer.status().print_buffer_full());
        assert_eq!(printer.buffered(), 0);
    }

    #[test]
    fn test_unknown_command_has_no_event() {
        assert_eq!(Event::from_command(Command::Unknown(0x7E), 0), None);
        assert_eq!(
            Event::from_command(Command::Data, 12),
            Some(Event::Data { len: 12 })
        );
    }
}
