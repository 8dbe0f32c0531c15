//! Tile reconstruction from DATA payloads
//!
//! DATA payloads carry Game Boy tiles (16 bytes, 2 bits per pixel), either
//! raw or run-length compressed. Each compression unit starts with a
//! control byte:
//!
//! ```text
//! 0xxxxxxx  literal run: the next (x + 1) bytes are copied verbatim
//! 1xxxxxxx  repeat run:  the next byte is repeated (x + 2) times
//! ```
//!
//! The decompressor runs incrementally against the payload as it arrives, so
//! a run may be split across any number of calls.

use heapless::Vec;

use crate::packet::PayloadStream;

/// Bytes per tile
pub const TILE_SIZE: usize = 16;

/// Longest literal run a control byte can describe
pub const MAX_LITERAL_RUN: usize = 128;

/// Longest repeat run a control byte can describe
pub const MAX_REPEAT_RUN: usize = 129;

const REPEAT_FLAG: u8 = 0x80;
const COUNT_MASK: u8 = 0x7F;

/// One decoded tile
pub type Tile = [u8; TILE_SIZE];

/// Collects output bytes into 16-byte tiles
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TileAccumulator {
    data: Tile,
    cursor: usize,
}

impl TileAccumulator {
    pub const fn new() -> Self {
        Self {
            data: [0; TILE_SIZE],
            cursor: 0,
        }
    }

    /// Append a byte; returns true when the tile just became complete
    ///
    /// Bytes pushed into a complete tile are ignored; take the tile first.
    pub fn push(&mut self, byte: u8) -> bool {
        if self.cursor >= TILE_SIZE {
            return false;
        }
        self.data[self.cursor] = byte;
        self.cursor += 1;
        self.cursor == TILE_SIZE
    }

    /// Returns true if a complete tile is waiting
    pub fn is_ready(&self) -> bool {
        self.cursor == TILE_SIZE
    }

    /// Bytes collected towards the current tile
    pub fn len(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.cursor == 0
    }

    /// Take the complete tile and start a new one
    pub fn take(&mut self) -> Option<Tile> {
        if !self.is_ready() {
            return None;
        }
        self.cursor = 0;
        Some(self.data)
    }

    /// Drop a partially collected tile
    pub fn clear(&mut self) {
        self.cursor = 0;
    }
}

/// Position inside the current compression unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum Run {
    /// Next input byte is a control byte
    Control,
    /// Copying `remaining` more input bytes
    Literal { remaining: u8 },
    /// Next input byte is the value to repeat `count` times
    RepeatValue { count: u8 },
    /// Emitting `value` `remaining` more times, no input needed
    Repeat { value: u8, remaining: u8 },
}

/// Incremental DATA payload decoder
#[derive(Debug, Clone)]
pub struct TileDecompressor {
    run: Run,
    /// Payload bytes already consumed from the current packet
    cursor: usize,
    /// Packet the cursor belongs to
    sequence: Option<u32>,
}

impl Default for TileDecompressor {
    fn default() -> Self {
        Self::new()
    }
}

impl TileDecompressor {
    pub const fn new() -> Self {
        Self {
            run: Run::Control,
            cursor: 0,
            sequence: None,
        }
    }

    /// Forget the current packet and run state
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Payload bytes consumed from the current packet
    pub fn consumed(&self) -> usize {
        self.cursor
    }

    /// Returns true when a run is in progress (more input or output pending)
    pub fn in_run(&self) -> bool {
        self.run != Run::Control
    }

    /// Decode as much of `stream` as is available
    ///
    /// Returns true as soon as `tile` holds a complete tile; the caller takes
    /// it and calls again to continue. Returns false when the available input
    /// is exhausted. A new packet sequence restarts the run state, while a
    /// partial tile carries over.
    pub fn feed(&mut self, stream: &PayloadStream<'_>, tile: &mut TileAccumulator) -> bool {
        if self.sequence != Some(stream.sequence) {
            self.run = Run::Control;
            self.cursor = 0;
            self.sequence = Some(stream.sequence);
        }

        self.feed_bytes(stream.bytes, stream.compressed, tile)
    }

    /// Same as [`feed`](Self::feed) for a payload slice not owned by a parser
    ///
    /// `payload` must be the same growing slice on every call.
    pub fn feed_bytes(
        &mut self,
        payload: &[u8],
        compressed: bool,
        tile: &mut TileAccumulator,
    ) -> bool {
        if tile.is_ready() {
            return true;
        }

        loop {
            let output = match self.run {
                Run::Repeat { value, remaining } => {
                    self.run = if remaining > 1 {
                        Run::Repeat {
                            value,
                            remaining: remaining - 1,
                        }
                    } else {
                        Run::Control
                    };
                    Some(value)
                }
                _ => {
                    let Some(&input) = payload.get(self.cursor) else {
                        return false;
                    };
                    self.cursor += 1;

                    if compressed {
                        self.step(input)
                    } else {
                        Some(input)
                    }
                }
            };

            if let Some(byte) = output {
                if tile.push(byte) {
                    return true;
                }
            }
        }
    }

    /// Consume one compressed input byte, returning an output byte if any
    fn step(&mut self, input: u8) -> Option<u8> {
        match self.run {
            Run::Control => {
                let count = input & COUNT_MASK;
                self.run = if input & REPEAT_FLAG != 0 {
                    Run::RepeatValue { count: count + 2 }
                } else {
                    Run::Literal {
                        remaining: count + 1,
                    }
                };
                None
            }
            Run::Literal { remaining } => {
                self.run = if remaining > 1 {
                    Run::Literal {
                        remaining: remaining - 1,
                    }
                } else {
                    Run::Control
                };
                Some(input)
            }
            Run::RepeatValue { count } => {
                self.run = if count > 1 {
                    Run::Repeat {
                        value: input,
                        remaining: count - 1,
                    }
                } else {
                    Run::Control
                };
                Some(input)
            }
            // Repeats never consume input
            Run::Repeat { .. } => None,
        }
    }
}

/// Decode a complete payload, calling `on_tile` for every finished tile
///
/// Returns the number of trailing bytes left in `tile` (a partial tile).
pub fn decode_payload<F>(
    payload: &[u8],
    compressed: bool,
    tile: &mut TileAccumulator,
    mut on_tile: F,
) -> usize
where
    F: FnMut(Tile),
{
    let mut decompressor = TileDecompressor::new();
    while decompressor.feed_bytes(payload, compressed, tile) {
        if let Some(done) = tile.take() {
            on_tile(done);
        }
    }
    tile.len()
}

/// Errors that can occur when compressing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CompressError {
    /// Output buffer too small
    BufferTooSmall,
}

/// Run-length compress `input` in the printer's format
///
/// Runs of three or more equal bytes become repeat runs, everything else is
/// emitted as literal runs.
pub fn compress<const N: usize>(
    input: &[u8],
    out: &mut Vec<u8, N>,
) -> Result<(), CompressError> {
    let mut literal_start = 0;
    let mut i = 0;

    while i < input.len() {
        let value = input[i];
        let run = input[i..]
            .iter()
            .take(MAX_REPEAT_RUN)
            .take_while(|&&b| b == value)
            .count();

        if run >= 3 {
            flush_literals(&input[literal_start..i], out)?;
            push_all(out, &[REPEAT_FLAG | (run - 2) as u8, value])?;
            i += run;
            literal_start = i;
        } else {
            i += 1;
            if i - literal_start == MAX_LITERAL_RUN {
                flush_literals(&input[literal_start..i], out)?;
                literal_start = i;
            }
        }
    }

    flush_literals(&input[literal_start..], out)
}

fn flush_literals<const N: usize>(
    literals: &[u8],
    out: &mut Vec<u8, N>,
) -> Result<(), CompressError> {
    for chunk in literals.chunks(MAX_LITERAL_RUN) {
        push_all(out, &[(chunk.len() - 1) as u8])?;
        push_all(out, chunk)?;
    }
    Ok(())
}

fn push_all<const N: usize>(out: &mut Vec<u8, N>, bytes: &[u8]) -> Result<(), CompressError> {
    out.extend_from_slice(bytes)
        .map_err(|_| CompressError::BufferTooSmall)
}
