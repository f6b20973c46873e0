//! EHCI host controller handle
//!
//! Only the operational registers needed to stop and reset a controller are
//! modelled here; everything else belongs to the OS driver.

use super::mmio::RegisterBus;
use bitflags::bitflags;

/// USBCMD register offset
const EHCI_USBCMD: u32 = 0x10;
/// USBSTS register offset
const EHCI_USBSTS: u32 = 0x14;

bitflags! {
    /// EHCI USBCMD bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct UsbCmd: u32 {
        /// Run/Stop
        const RUN = 1 << 0;
        /// Host controller reset, self-clearing
        const HCRESET = 1 << 1;
    }
}

bitflags! {
    /// EHCI USBSTS bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct UsbSts: u32 {
        /// Controller has stopped after Run/Stop was cleared
        const HCHALTED = 1 << 12;
    }
}

/// One EHCI controller at a fixed base address
pub struct EhciController<'a> {
    bus: &'a dyn RegisterBus,
    base: u32,
}

impl<'a> EhciController<'a> {
    /// Wrap the controller at `base`
    pub const fn new(bus: &'a dyn RegisterBus, base: u32) -> Self {
        Self { bus, base }
    }

    /// Base address of the register window
    pub const fn base(&self) -> u32 {
        self.base
    }

    /// Clear Run/Stop
    pub fn request_halt(&self) {
        self.bus
            .modify32(self.base + EHCI_USBCMD, &|cmd| cmd & !UsbCmd::RUN.bits());
    }

    /// True once USBSTS reports the controller halted
    pub fn is_halt_confirmed(&self) -> bool {
        UsbSts::from_bits_truncate(self.bus.read32(self.base + EHCI_USBSTS))
            .contains(UsbSts::HCHALTED)
    }

    /// Set HCRESET
    pub fn request_reset(&self) {
        self.bus
            .modify32(self.base + EHCI_USBCMD, &|cmd| cmd | UsbCmd::HCRESET.bits());
    }

    /// True once the controller has cleared HCRESET
    pub fn is_reset_complete(&self) -> bool {
        !UsbCmd::from_bits_truncate(self.bus.read32(self.base + EHCI_USBCMD))
            .contains(UsbCmd::HCRESET)
    }
}
