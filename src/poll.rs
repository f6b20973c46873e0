//! Register polling with an explicit retry policy
//!
//! Bring-up runs before any interrupt or scheduler support exists, so the
//! only way to wait on hardware is to re-read a register with a fixed delay
//! in between. Whether that wait may give up is a property of the policy,
//! not of the loop.

use crate::error::{BringupError, Result};
use crate::hal::timer::Delay;

/// How long to keep polling and how often
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PollPolicy {
    /// Delay between two reads
    pub interval_ms: u32,
    /// Failed reads tolerated before giving up; `None` waits forever
    pub max_polls: Option<u32>,
}

impl PollPolicy {
    /// Poll every millisecond and never give up. A controller that never
    /// answers hangs the boot.
    pub const UNBOUNDED: Self = Self {
        interval_ms: 1,
        max_polls: None,
    };

    /// Give up after `max_polls` failed reads
    pub const fn bounded(max_polls: u32, interval_ms: u32) -> Self {
        Self {
            interval_ms,
            max_polls: Some(max_polls),
        }
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::UNBOUNDED
    }
}

/// Call `ready` until it returns true, sleeping `interval_ms` after every
/// negative answer. Returns the number of negative answers.
pub fn poll_until<F>(delay: &dyn Delay, policy: &PollPolicy, mut ready: F) -> Result<u32>
where
    F: FnMut() -> bool,
{
    let mut polls: u32 = 0;
    loop {
        if ready() {
            return Ok(polls);
        }
        if let Some(max) = policy.max_polls {
            if polls >= max {
                return Err(BringupError::PollTimeout { polls });
            }
        }
        delay.delay_ms(policy.interval_ms);
        polls = polls.saturating_add(1);
    }
}
