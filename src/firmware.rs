//! Interfaces to the collaborators bring-up drives but does not own
//!
//! The Forth environment, the memory manager and the device drivers are
//! provided by the surrounding firmware. Bring-up only talks to them
//! through these traits.

use crate::hal::mmio::RegisterBus;
use crate::hal::timer::Delay;
use crate::words::Word;
use core::fmt;
use heapless::String;

/// Longest device path or Forth string handled during bring-up
pub const PATH_MAX: usize = 256;

/// Owned device path
pub type NodePath = String<PATH_MAX>;

/// Forth data stack cell
pub type Cell = u32;

/// Opaque node reference handed out by the environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Phandle(pub u32);

/// Typed property value, encoded by the environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropValue<'a> {
    /// `encode-int`
    Int(u32),
    /// `encode-string`
    Str(&'a str),
    /// `encode-phys` followed by `encode-int` and `encode+`
    Reg {
        /// Physical base
        phys: u32,
        /// Region length
        size: u32,
    },
}

/// Device tree property protocol
pub trait DeviceTree {
    /// `find-device`: make `path` the current node
    fn find_device(&mut self, path: &str) -> Option<Phandle>;
    /// `new-device`: open a child of the current node and make it current
    fn new_device(&mut self);
    /// `device-name` on the current node
    fn device_name(&mut self, name: &str);
    /// `device-type` on the current node
    fn device_type(&mut self, ty: &str);
    /// `property` on the current node
    fn property(&mut self, name: &str, value: PropValue<'_>);
    /// `finish-device`: close the current node, its parent becomes current
    fn finish_device(&mut self);
    /// `device-end`: leave the tree with no current node
    fn device_end(&mut self);
    /// Look up a node without changing the current one
    fn find_dev(&self, path: &str) -> Option<Phandle>;
    /// First cell of an integer property
    fn int_property(&self, node: Phandle, name: &str) -> Option<u32>;
    /// Full path of a node
    fn path_of(&self, node: Phandle) -> Option<NodePath>;
    /// Install the generic IEEE 1275 methods on the node at `path`
    fn init_node_methods(&mut self, path: &str);
}

/// Forth interpreter protocol
pub trait Interpreter {
    /// Push a cell
    fn push(&mut self, value: Cell);
    /// Pop a cell
    fn pop(&mut self) -> Cell;
    /// Push a string as `( addr len )`
    fn push_str(&mut self, s: &str);
    /// Pop `( addr len )` and copy the string out; `None` for a null string
    fn pop_string(&mut self) -> Option<String<PATH_MAX>>;
    /// Execute a single word
    fn fword(&mut self, word: &str);
    /// Evaluate a line of Forth source
    fn feval(&mut self, source: &str);
    /// Make `word` callable from Forth as `name`
    fn bind(&mut self, name: &str, word: Word);
}

/// The complete Open Firmware environment
pub trait OpenFirmware: DeviceTree + Interpreter {}

impl<T: DeviceTree + Interpreter> OpenFirmware for T {}

/// Physical memory manager (`ofmem`)
pub trait MemoryManager {
    /// Installed RAM in bytes
    fn ram_size(&self) -> u64;
    /// Record that `cpu` accesses the memory described by `memory`
    fn register(&mut self, memory: Phandle, cpu: Phandle);
    /// Allocate `size` bytes aligned to `align`
    fn alloc_aligned(&mut self, size: u32, align: u32) -> Option<u32>;
    /// Claim a physical range
    fn claim_phys(&mut self, base: u32, size: u32) -> bool;
    /// Claim a virtual range
    fn claim_virt(&mut self, base: u32, size: u32) -> bool;
    /// Map `size` bytes of `phys` at `virt`
    fn map(&mut self, phys: u32, virt: u32, size: u32, mode: u32);
}

/// Byte access to memory addressed by Forth cells
pub trait PhysMemory {
    /// Borrow `len` bytes at `addr`; `None` if the range is not RAM
    fn bytes(&self, addr: u32, len: u32) -> Option<&[u8]>;
    /// Mutably borrow `len` bytes at `addr`
    fn bytes_mut(&mut self, addr: u32, len: u32) -> Option<&mut [u8]>;
}

/// Board services and driver entry points. The console is the `Write` impl.
pub trait Board: fmt::Write {
    /// Core Open Firmware initialisation
    fn openbios_init(&mut self);
    /// Register built-in packages
    fn modules_init(&mut self);
    /// Start the decrementer/timebase services
    fn setup_timers(&mut self);
    /// Bring up the framebuffer console
    fn setup_video(&mut self);
    /// Flipper video interface driver (RVL)
    fn init_video_interface(&mut self, path: &str, xfb: u32, fb: u32);
    /// OHCI driver for the controller at `path`
    fn init_ohci(&mut self, path: &str, reg: u32);
    /// SD host driver for the controller at `path`
    fn init_sdhc(&mut self, path: &str, reg: u32);
    /// Write back the data cache over `[start, end)`
    fn flush_dcache_range(&mut self, start: u32, end: u32);
    /// Invalidate the instruction cache over `[start, end)`
    fn flush_icache_range(&mut self, start: u32, end: u32);
    /// Load and start the configured boot image
    fn boot(&mut self);
}

/// Everything the bring-up pass and the bound words operate on
pub struct Machine<'a> {
    /// Chipset registers
    pub bus: &'a dyn RegisterBus,
    /// Delay between polls
    pub delay: &'a dyn Delay,
    /// Forth environment and device tree
    pub of: &'a mut dyn OpenFirmware,
    /// Memory manager
    pub mem: &'a mut dyn MemoryManager,
    /// RAM visible to the payload words
    pub ram: &'a mut dyn PhysMemory,
    /// Drivers and console
    pub board: &'a mut dyn Board,
}

/// Identity-mapped RAM on the console
pub struct IdentityRam {
    limit: u32,
}

#[allow(unsafe_code)]
impl IdentityRam {
    /// RAM below `limit` is directly addressable
    ///
    /// # Safety
    /// The range `[1, limit)` must be mapped and not aliased by Rust objects
    /// while the payload words run.
    pub const unsafe fn new(limit: u32) -> Self {
        Self { limit }
    }

    fn in_range(&self, addr: u32, len: u32) -> bool {
        addr != 0 && addr.checked_add(len).is_some_and(|end| end <= self.limit)
    }
}

#[allow(unsafe_code)]
impl PhysMemory for IdentityRam {
    fn bytes(&self, addr: u32, len: u32) -> Option<&[u8]> {
        if !self.in_range(addr, len) {
            return None;
        }
        Some(unsafe { core::slice::from_raw_parts(addr as usize as *const u8, len as usize) })
    }

    fn bytes_mut(&mut self, addr: u32, len: u32) -> Option<&mut [u8]> {
        if !self.in_range(addr, len) {
            return None;
        }
        Some(unsafe { core::slice::from_raw_parts_mut(addr as usize as *mut u8, len as usize) })
    }
}
