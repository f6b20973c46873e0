//! # Wii / Wii U Open Firmware bring-up
//!
//! Platform layer that takes a PowerPC Wii (RVL) or Wii U (Cafe) from a
//! freshly started Forth environment to a state where a client program can
//! be loaded and booted.
//!
//! The pass covers:
//! - CPU identification from the PVR
//! - CPU and memory nodes in the device tree
//! - boot device and console configuration
//! - EHCI shutdown, OHCI/SD/video driver start
//! - native words for DMA, power control, fills and Adler-32
//!
//! ## Features
//!
//! - `defmt`: log through defmt
//! - `log`: log through the `log` facade
//!
//! ## Example
//!
//! ```rust,no_run
//! use wii_bringup::{arch_of_init, entry, BringupConfig, Machine, Result};
//!
//! fn boot(pvr: u32, m: &mut Machine<'_>) -> Result<()> {
//!     let ctx = entry(pvr);
//!     let region = arch_of_init(&ctx, &BringupConfig::default(), m)?;
//!     assert_eq!(region.size, 0x0080_0000);
//!     Ok(())
//! }
//! ```

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]
#![warn(
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::cargo
)]

#[macro_use]
mod fmt;

pub mod bringup;
pub mod config;
pub mod cpu;
pub mod devtree;
pub mod error;
pub mod firmware;
pub mod hal;
pub mod payload;
pub mod platform;
pub mod poll;
pub mod reset;
pub mod words;

#[cfg(test)]
mod sim;

pub use bringup::{arch_of_init, dispatch, LoadRegion};
pub use config::BringupConfig;
pub use cpu::{CpuDescriptor, CpuModel};
pub use error::{BringupError, Result};
pub use firmware::{
    Board, DeviceTree, Interpreter, Machine, MemoryManager, OpenFirmware, Phandle, PhysMemory,
};
pub use platform::{entry, BootContext, Platform};
pub use poll::PollPolicy;
pub use words::Word;

// Re-export HAL components for board support packages
pub use hal::{
    ehci::EhciController,
    hollywood::SlotLed,
    ipc::{IpcChannel, IpcCommand},
    mmio::{MmioBus, RegisterBus},
    timer::{Delay, SystemTimer},
};
