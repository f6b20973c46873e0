//! Memory-Mapped I/O abstraction for big-endian hardware register access

#![allow(unsafe_code)]

use core::ptr::{read_volatile, write_volatile};

/// Memory-mapped I/O register wrapper for raw hardware access
pub struct Mmio<T> {
    addr: *mut T,
}

impl<T> Mmio<T> {
    /// Create a new MMIO register at the given address
    ///
    /// # Safety
    /// The caller must ensure the address is valid and points to a hardware register
    pub const unsafe fn new(addr: u32) -> Self {
        Self {
            addr: addr as usize as *mut T,
        }
    }

    /// Read from the register
    pub fn read(&self) -> T
    where
        T: Copy,
    {
        unsafe { read_volatile(self.addr) }
    }

    /// Write to the register
    pub fn write(&self, value: T) {
        unsafe { write_volatile(self.addr, value) }
    }
}

unsafe impl<T> Send for Mmio<T> {}
unsafe impl<T> Sync for Mmio<T> {}

/// 32-bit register access by physical address.
///
/// Everything above the HAL talks to hardware through this trait so a
/// simulated register file can stand in for the chipset.
pub trait RegisterBus {
    /// Read the 32-bit register at `addr`
    fn read32(&self, addr: u32) -> u32;

    /// Write the 32-bit register at `addr`
    fn write32(&self, addr: u32, value: u32);

    /// Read-modify-write the register at `addr`
    fn modify32(&self, addr: u32, f: &dyn Fn(u32) -> u32) {
        let value = self.read32(addr);
        self.write32(addr, f(value));
    }
}

/// Direct volatile access to the chipset registers (`in_be32`/`out_be32`).
#[derive(Debug, Clone, Copy)]
pub struct MmioBus;

impl MmioBus {
    /// Create a bus over the live register space
    ///
    /// # Safety
    /// Only valid when running on the console with the register block
    /// mapped at its physical address.
    pub const unsafe fn new() -> Self {
        Self
    }
}

impl RegisterBus for MmioBus {
    fn read32(&self, addr: u32) -> u32 {
        let reg = unsafe { Mmio::<u32>::new(addr) };
        u32::from_be(reg.read())
    }

    fn write32(&self, addr: u32, value: u32) {
        let reg = unsafe { Mmio::<u32>::new(addr) };
        reg.write(value.to_be());
    }
}
