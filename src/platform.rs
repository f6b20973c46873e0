//! Platform detection and the boot context
//!
//! The variant is decided once from the processor version register and
//! carried in an immutable [`BootContext`] for the rest of the pass.

use crate::hal::{EHCI0_BASE, EHCI1_BASE, EHCI2_BASE};
use crate::hal::timer::{HOLLYWOOD_TIMER_HZ, LATTE_TIMER_HZ};

/// High half of the PVR reported by Espresso
pub const ESPRESSO_PVR_HIGH: u32 = 0x7001_0000;

/// ISA I/O window base
pub const ISA_IO_BASE: u32 = 0x8000_0000;

/// Bus clock estimate, not measured
pub const BUS_FREQUENCY_HZ: u32 = 248_625_000;
/// CPU clock estimate, not measured
pub const CPU_FREQUENCY_HZ: u32 = 1_243_125_000;
/// The timebase ticks at a quarter of the bus clock
pub const TIMEBASE_FREQUENCY_HZ: u32 = BUS_FREQUENCY_HZ / 4;

/// Hardware variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Platform {
    /// Wii: Hollywood + Broadway
    Rvl,
    /// Wii U: Latte + Espresso
    Cafe,
}

impl Platform {
    /// Classify a PVR. Anything that is not Espresso is treated as RVL.
    pub const fn from_pvr(pvr: u32) -> Self {
        if pvr & 0xFFFF_0000 == ESPRESSO_PVR_HIGH {
            Self::Cafe
        } else {
            Self::Rvl
        }
    }

    /// Forth word that applies the per-platform device tree fixups
    pub const fn fixup_word(self) -> &'static str {
        match self {
            Self::Rvl => "fixup-device-tree-rvl",
            Self::Cafe => "fixup-device-tree-cafe",
        }
    }

    /// EHCI controllers to force into reset
    pub const fn ehci_bases(self) -> &'static [u32] {
        match self {
            Self::Rvl => &[EHCI0_BASE],
            Self::Cafe => &[EHCI0_BASE, EHCI1_BASE, EHCI2_BASE],
        }
    }

    /// OHCI companion nodes to bring up once EHCI is out of the way
    pub const fn ohci_nodes(self) -> &'static [&'static str] {
        match self {
            Self::Rvl => &["/usb@0d050000", "/usb@0d060000"],
            Self::Cafe => &[
                "/usb@0d050000",
                "/usb@0d060000",
                "/usb@0d130000",
                "/usb@0d150000",
            ],
        }
    }

    /// Whether power-off and reset go through the Latte IPC channel
    pub const fn has_ipc_power_control(self) -> bool {
        match self {
            Self::Rvl => false,
            Self::Cafe => true,
        }
    }

    /// Rate of the chipset timer used for delays
    pub const fn timer_frequency(self) -> u32 {
        match self {
            Self::Rvl => HOLLYWOOD_TIMER_HZ,
            Self::Cafe => LATTE_TIMER_HZ,
        }
    }
}

/// State fixed at entry and read by every later step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BootContext {
    platform: Platform,
    pvr: u32,
    isa_io_base: u32,
    timebase_frequency: u32,
    cpu_frequency: u32,
    bus_frequency: u32,
}

impl BootContext {
    /// Build the context for the processor reporting `pvr`
    pub const fn new(pvr: u32) -> Self {
        Self {
            platform: Platform::from_pvr(pvr),
            pvr,
            isa_io_base: ISA_IO_BASE,
            timebase_frequency: TIMEBASE_FREQUENCY_HZ,
            cpu_frequency: CPU_FREQUENCY_HZ,
            bus_frequency: BUS_FREQUENCY_HZ,
        }
    }

    /// Detected variant
    pub const fn platform(&self) -> Platform {
        self.platform
    }

    /// Raw processor version register
    pub const fn pvr(&self) -> u32 {
        self.pvr
    }

    /// ISA I/O window base
    pub const fn isa_io_base(&self) -> u32 {
        self.isa_io_base
    }

    /// Timebase frequency reported in the CPU node
    pub const fn timebase_frequency(&self) -> u32 {
        self.timebase_frequency
    }

    /// Core clock estimate
    pub const fn cpu_frequency(&self) -> u32 {
        self.cpu_frequency
    }

    /// Bus clock estimate
    pub const fn bus_frequency(&self) -> u32 {
        self.bus_frequency
    }

    /// Running on a Wii
    pub const fn is_rvl(&self) -> bool {
        matches!(self.platform, Platform::Rvl)
    }

    /// Running on a Wii U
    pub const fn is_cafe(&self) -> bool {
        matches!(self.platform, Platform::Cafe)
    }
}

/// Earliest entry point: classify the hardware from the PVR the start
/// stub read with `mfpvr`.
pub fn entry(pvr: u32) -> BootContext {
    let ctx = BootContext::new(pvr);
    info!("PVR {:#x}, platform {:?}", pvr, ctx.platform());
    ctx
}
