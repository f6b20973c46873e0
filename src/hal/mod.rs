//! Hardware Abstraction Layer for Hollywood (Wii) and Latte (Wii U)
//!
//! This module provides low-level register access for the PowerPC side of
//! both chipsets, plus typed handles for the few devices the bring-up pass
//! touches directly: the EHCI host controllers, the Latte IPC command
//! channel and the Hollywood GPIO/USB glue registers.

pub mod ehci;
pub mod hollywood;
pub mod ipc;
pub mod mmio;
pub mod timer;

/// Base address of the Hollywood/Latte register block as seen from the PPC
pub const HOLLYWOOD_BASE: u32 = 0x0D00_0000;

/// Free-running chipset timer
pub const TIMER_BASE: u32 = HOLLYWOOD_BASE + 0x10;

/// GPIO output register carrying the disc slot LED
pub const GPIO_OUT: u32 = HOLLYWOOD_BASE + 0xC0;

/// EHCI controller shared by both platforms
pub const EHCI0_BASE: u32 = 0x0D04_0000;
/// Second EHCI controller, Latte only
pub const EHCI1_BASE: u32 = 0x0D12_0000;
/// Third EHCI controller, Latte only
pub const EHCI2_BASE: u32 = 0x0D14_0000;

/// Hollywood EHCI glue register holding the interrupt "chicken bits"
pub const EHCI_CHICKEN_BITS: u32 = EHCI0_BASE + 0xCC;

/// Latte IPC message register for PPC core 0
pub const LATTE_IPC_PPCMSG: u32 = 0x0D80_0400;
/// Latte IPC control register for PPC core 0
pub const LATTE_IPC_PPCCTRL: u32 = 0x0D80_0404;

/// External framebuffer used by the Flipper video interface on RVL
pub const RVL_XFB_BASE: u32 = 0x0160_0000;
/// Linear framebuffer handed to the console on RVL
pub const RVL_FB_BASE: u32 = 0x0170_0000;

/// Spin forever. Used when bring-up cannot continue.
pub fn halt() -> ! {
    loop {
        core::hint::spin_loop();
    }
}

/// Landing point for exception vectors nobody claimed.
pub fn unexpected_exception(vector: u32) -> ! {
    error!("firmware panic: unexpected exception {:#x}", vector);
    halt()
}
