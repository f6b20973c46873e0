//! Latte PPC→ARM IPC command channel
//!
//! Power-off and reboot on Wii U are requested from the security processor
//! by posting a command word and raising the request bit.

use super::mmio::RegisterBus;
use super::{LATTE_IPC_PPCCTRL, LATTE_IPC_PPCMSG};
use bitflags::bitflags;

bitflags! {
    /// PPCCTRL bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct IpcCtrl: u32 {
        /// Message pending; cleared by the ARM side once consumed
        const X1 = 1 << 0;
    }
}

/// Commands understood by the Latte firmware
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u32)]
pub enum IpcCommand {
    /// Cut power
    PowerOff = 0xCAFE_0001,
    /// Full system reboot
    Reboot = 0xCAFE_0002,
}

/// Handle on the command channel registers
pub struct IpcChannel<'a> {
    bus: &'a dyn RegisterBus,
    msg: u32,
    ctrl: u32,
}

impl<'a> IpcChannel<'a> {
    /// Channel for PPC core 0
    pub const fn new(bus: &'a dyn RegisterBus) -> Self {
        Self {
            bus,
            msg: LATTE_IPC_PPCMSG,
            ctrl: LATTE_IPC_PPCCTRL,
        }
    }

    /// Write the command word and raise the request bit
    pub fn post(&self, command: IpcCommand) {
        self.bus.write32(self.msg, command as u32);
        self.bus.write32(self.ctrl, IpcCtrl::X1.bits());
    }

    /// True while the ARM side has not consumed the last message
    pub fn is_busy(&self) -> bool {
        IpcCtrl::from_bits_truncate(self.bus.read32(self.ctrl)).contains(IpcCtrl::X1)
    }
}
