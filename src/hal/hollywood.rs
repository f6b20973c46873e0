//! Hollywood GPIO and USB glue registers
//!
//! Both only exist in the RVL bring-up path.

use super::mmio::RegisterBus;
use super::{EHCI_CHICKEN_BITS, GPIO_OUT};
use bitflags::bitflags;

bitflags! {
    /// GPIO output pins driven from the PPC
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct GpioOut: u32 {
        /// Disc slot LED
        const SLOT_LED = 1 << 5;
    }
}

/// Interrupt enables in the EHCI glue register. Taken from NetBSD/Linux/ppcskel.
pub const EHCI_INTERRUPT_ENABLE: u32 = 0x000E_9800;

/// Disc slot LED on the front of the console
pub struct SlotLed<'a> {
    bus: &'a dyn RegisterBus,
}

impl<'a> SlotLed<'a> {
    /// LED handle
    pub const fn new(bus: &'a dyn RegisterBus) -> Self {
        Self { bus }
    }

    /// Switch the LED on
    pub fn on(&self) {
        self.bus
            .modify32(GPIO_OUT, &|val| val | GpioOut::SLOT_LED.bits());
    }

    /// Switch the LED off
    pub fn off(&self) {
        self.bus
            .modify32(GPIO_OUT, &|val| val & !GpioOut::SLOT_LED.bits());
    }
}

/// Let the host controllers raise interrupts so OS drivers find them in a
/// normal state whatever order they load in.
pub fn enable_ehci_interrupts(bus: &dyn RegisterBus) {
    bus.modify32(EHCI_CHICKEN_BITS, &|val| val | EHCI_INTERRUPT_ENABLE);
}
