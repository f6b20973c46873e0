//! Chipset timer for Hollywood and Latte
//!
//! Provides the busy-wait delay used between register polls

use super::mmio::RegisterBus;
use super::TIMER_BASE;
use crate::platform::Platform;

/// Hollywood timer rate: 243 MHz / 128
pub const HOLLYWOOD_TIMER_HZ: u32 = 243_000_000 / 128;

/// Latte timer rate: 248.625 MHz / 128
pub const LATTE_TIMER_HZ: u32 = 248_625_000 / 128;

/// Busy-wait delay source
pub trait Delay {
    /// Block for at least `ms` milliseconds
    fn delay_ms(&self, ms: u32);
}

/// Free-running 32-bit chipset timer
pub struct SystemTimer<'a> {
    bus: &'a dyn RegisterBus,
    base: u32,
    ticks_per_ms: u32,
}

impl<'a> SystemTimer<'a> {
    /// Create a timer counting at `freq_hz`
    pub fn new(bus: &'a dyn RegisterBus, freq_hz: u32) -> Self {
        Self {
            bus,
            base: TIMER_BASE,
            ticks_per_ms: (freq_hz / 1000).max(1),
        }
    }

    /// Timer running at the rate of the detected chipset
    pub fn for_platform(bus: &'a dyn RegisterBus, platform: Platform) -> Self {
        Self::new(bus, platform.timer_frequency())
    }

    /// Current raw counter value
    pub fn ticks(&self) -> u32 {
        self.bus.read32(self.base)
    }

    /// Check if `timeout_ms` has elapsed since `start` ticks
    pub fn is_timeout(&self, start: u32, timeout_ms: u32) -> bool {
        // The counter wraps roughly every 37 minutes
        self.ticks().wrapping_sub(start) >= timeout_ms.saturating_mul(self.ticks_per_ms)
    }
}

impl Delay for SystemTimer<'_> {
    fn delay_ms(&self, ms: u32) {
        let start = self.ticks();
        while !self.is_timeout(start, ms) {
            core::hint::spin_loop();
        }
    }
}
