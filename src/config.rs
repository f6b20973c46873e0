//! Bring-up configuration

use crate::poll::PollPolicy;

/// Tunables for one bring-up pass. `Default` gives the production values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BringupConfig {
    /// Alias resolved into `input-device`
    pub stdin_alias: &'static str,
    /// Alias resolved into `output-device`
    pub stdout_alias: &'static str,
    /// Bytes claimed at `load-base` for the client program
    pub load_region_size: u32,
    /// How long the disc slot LED stays lit on RVL
    pub led_pulse_ms: u32,
    /// Waiting on EHCI halt and reset
    pub reset_policy: PollPolicy,
    /// Waiting on the Latte IPC acknowledge
    pub ipc_policy: PollPolicy,
}

impl Default for BringupConfig {
    fn default() -> Self {
        Self {
            stdin_alias: "keyboard",
            stdout_alias: "screen",
            load_region_size: 0x0080_0000,
            led_pulse_ms: 2000,
            reset_policy: PollPolicy::UNBOUNDED,
            ipc_policy: PollPolicy::UNBOUNDED,
        }
    }
}
