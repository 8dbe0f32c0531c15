//! Session timeout
//!
//! Detects a Game Boy that stopped talking in the middle of a packet
//! (unplugged cable, reset, game switched off).

/// Default idle time before an in-flight session is abandoned
pub const DEFAULT_TIMEOUT_MS: u32 = 500;

/// Idle watchdog fed with wall-clock deltas
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimeoutMonitor {
    threshold_ms: u32,
    /// Time since the last byte (ms)
    idle_ms: u32,
    /// A byte has arrived since the last timeout
    armed: bool,
}

impl Default for TimeoutMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT_MS)
    }
}

impl TimeoutMonitor {
    pub const fn new(threshold_ms: u32) -> Self {
        Self {
            threshold_ms,
            idle_ms: 0,
            armed: false,
        }
    }

    /// Record that a byte arrived
    pub fn byte_received(&mut self) {
        self.idle_ms = 0;
        self.armed = true;
    }

    /// Advance time
    ///
    /// Returns true once when the idle time exceeds the threshold. Further
    /// calls return false until the next [`byte_received`](Self::byte_received).
    pub fn tick(&mut self, elapsed_ms: u32) -> bool {
        if !self.armed {
            return false;
        }

        self.idle_ms = self.idle_ms.saturating_add(elapsed_ms);
        if self.idle_ms > self.threshold_ms {
            self.armed = false;
            return true;
        }
        false
    }

    pub fn threshold_ms(&self) -> u32 {
        self.threshold_ms
    }

    pub fn idle_ms(&self) -> u32 {
        self.idle_ms
    }

    /// True while a session is in progress
    pub fn is_armed(&self) -> bool {
        self.armed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_once_per_idle_period() {
        let mut monitor = TimeoutMonitor::new(500);
        monitor.byte_received();

        assert!(!monitor.tick(300));
        assert!(!monitor.tick(200));
        assert!(monitor.tick(1));
        assert!(!monitor.tick(10_000));

        monitor.byte_received();
        assert!(monitor.tick(501));
    }

    #[test]
    fn test_never_fires_before_first_byte() {
        let mut monitor = TimeoutMonitor::default();
        assert!(!monitor.tick(u32::MAX));
        assert!(!monitor.is_armed());
    }

    #[test]
    fn test_byte_restarts_idle_time() {
        let mut monitor = TimeoutMonitor::new(100);
        monitor.byte_received();
        assert!(!monitor.tick(90));
        monitor.byte_received();
        assert!(!monitor.tick(90));
        assert_eq!(monitor.idle_ms(), 90);
    }

    #[test]
    fn test_saturating_time() {
        let mut monitor = TimeoutMonitor::new(u32::MAX - 1);
        monitor.byte_received();
        assert!(!monitor.tick(u32::MAX - 1));
        assert!(monitor.tick(u32::MAX));
    }
}
