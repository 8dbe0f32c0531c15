//! Receive ring buffer shared between the clock-edge handler and the main loop
//!
//! Single producer (interrupt context) and single consumer (main context).
//! Every cell and index is an atomic with exactly one writer, so neither side
//! ever waits for the other and no lock or critical section is needed. Only
//! atomic loads and stores are used, which keeps it usable on cores without
//! compare-and-swap (Cortex-M0+).
//!
//! Indices run over `0..2N` so a full buffer and an empty one are
//! distinguishable without sacrificing a slot.

use core::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

/// Default capacity for the receive buffer
///
/// The main loop drains the buffer every poll, so a few dozen bytes covers
/// several milliseconds of link traffic.
pub const DEFAULT_CAPACITY: usize = 64;

/// Push failed because the buffer was full; the byte was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Overflow;

/// Fixed-capacity byte ring
#[derive(Debug)]
pub struct FrameBuffer<const N: usize> {
    cells: [AtomicU8; N],
    /// Written by the consumer only
    head: AtomicUsize,
    /// Written by the producer only
    tail: AtomicUsize,
    /// Bytes dropped on overflow since creation; producer only
    dropped: AtomicUsize,
    /// Highest fill level seen; producer only
    max_count: AtomicUsize,
}

impl<const N: usize> Default for FrameBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> FrameBuffer<N> {
    /// Create an empty buffer
    pub const fn new() -> Self {
        Self {
            cells: [const { AtomicU8::new(0) }; N],
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
            dropped: AtomicUsize::new(0),
            max_count: AtomicUsize::new(0),
        }
    }

    /// Split into the producer and consumer handles
    ///
    /// The mutable borrow guarantees there is only ever one of each.
    pub fn split(&mut self) -> (Producer<'_, N>, Consumer<'_, N>) {
        let buf: &Self = self;
        let acknowledged = buf.dropped.load(Ordering::Relaxed);
        (
            Producer { buf },
            Consumer { buf, acknowledged },
        )
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    fn count(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        distance(head, tail, N)
    }
}

/// Number of slots from `head` to `tail` with indices in `0..2N`
fn distance(head: usize, tail: usize, n: usize) -> usize {
    if tail >= head {
        tail - head
    } else {
        tail + 2 * n - head
    }
}

/// Advance an index in `0..2N` by `by` (`by <= N`)
fn advance(index: usize, by: usize, n: usize) -> usize {
    let next = index + by;
    if next >= 2 * n {
        next - 2 * n
    } else {
        next
    }
}

fn slot(index: usize, n: usize) -> usize {
    if index >= n {
        index - n
    } else {
        index
    }
}

/// Write side; owned by the clock-edge handler
#[derive(Debug)]
pub struct Producer<'a, const N: usize> {
    buf: &'a FrameBuffer<N>,
}

impl<const N: usize> Producer<'_, N> {
    /// Append a byte
    ///
    /// Never blocks. When full the byte is dropped (the newest data is lost,
    /// retained bytes keep their order) and the drop is recorded for the
    /// consumer.
    pub fn push(&mut self, byte: u8) -> Result<(), Overflow> {
        let buf = self.buf;
        let tail = buf.tail.load(Ordering::Relaxed);
        let head = buf.head.load(Ordering::Acquire);
        let count = distance(head, tail, N);

        if count >= N {
            let dropped = buf.dropped.load(Ordering::Relaxed);
            buf.dropped.store(dropped.wrapping_add(1), Ordering::Release);
            return Err(Overflow);
        }

        buf.cells[slot(tail, N)].store(byte, Ordering::Relaxed);
        buf.tail.store(advance(tail, 1, N), Ordering::Release);

        if count + 1 > buf.max_count.load(Ordering::Relaxed) {
            buf.max_count.store(count + 1, Ordering::Relaxed);
        }
        Ok(())
    }

    /// Returns true if a push would overflow right now
    pub fn is_full(&self) -> bool {
        self.buf.count() >= N
    }
}

/// Read side; owned by the main loop
#[derive(Debug)]
pub struct Consumer<'a, const N: usize> {
    buf: &'a FrameBuffer<N>,
    /// Drop counter value at the last `clear_overflow`
    acknowledged: usize,
}

impl<const N: usize> Consumer<'_, N> {
    /// Remove the oldest byte
    pub fn pop(&mut self) -> Option<u8> {
        let buf = self.buf;
        let head = buf.head.load(Ordering::Relaxed);
        let tail = buf.tail.load(Ordering::Acquire);
        if head == tail {
            return None;
        }

        let byte = buf.cells[slot(head, N)].load(Ordering::Relaxed);
        buf.head.store(advance(head, 1, N), Ordering::Release);
        Some(byte)
    }

    /// Read the byte `offset` positions after the oldest without removing it
    pub fn peek(&self, offset: usize) -> Option<u8> {
        let buf = self.buf;
        let head = buf.head.load(Ordering::Relaxed);
        let tail = buf.tail.load(Ordering::Acquire);
        if offset >= distance(head, tail, N) {
            return None;
        }
        Some(buf.cells[slot(advance(head, offset, N), N)].load(Ordering::Relaxed))
    }

    /// Bytes waiting to be read
    pub fn count(&self) -> usize {
        self.buf.count()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Highest fill level reached since creation
    pub fn max_count(&self) -> usize {
        self.buf.max_count.load(Ordering::Relaxed)
    }

    /// Discard everything currently buffered
    pub fn clear(&mut self) {
        let tail = self.buf.tail.load(Ordering::Acquire);
        self.buf.head.store(tail, Ordering::Release);
    }

    /// Sticky overflow flag: set when a byte was dropped since the last clear
    pub fn overflowed(&self) -> bool {
        self.dropped() != 0
    }

    /// Bytes dropped since the last [`clear_overflow`](Self::clear_overflow)
    pub fn dropped(&self) -> usize {
        self.buf
            .dropped
            .load(Ordering::Acquire)
            .wrapping_sub(self.acknowledged)
    }

    /// Clear the overflow flag, returning how many bytes were dropped
    pub fn clear_overflow(&mut self) -> usize {
        let total = self.buf.dropped.load(Ordering::Acquire);
        let dropped = total.wrapping_sub(self.acknowledged);
        self.acknowledged = total;
        dropped
    }
}
