//! Firmware words bound into the Forth dictionary
//!
//! The interpreter calls back into [`execute`] whenever one of these runs.
//! Stack effects are given in the usual `( before -- after )` notation.

use crate::firmware::{Cell, Machine};
use crate::hal::ipc::{IpcChannel, IpcCommand};
use crate::payload;
use crate::poll::{poll_until, PollPolicy};

/// Page size used for DMA allocations
pub const PAGE_SIZE: u32 = 4096;

/// Returned by `(adler32)` when the buffer pointer is null
pub const ADLER32_FAILURE: Cell = -1i32 as Cell;

/// Native words provided by the bring-up layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Word {
    /// `( size -- virt )`
    DmaAlloc,
    /// `( virt size cacheable? -- devaddr )`
    DmaMapIn,
    /// `( virt devaddr size -- )`
    DmaSync,
    /// `( -- )` Latte power-off
    PowerOff,
    /// `( -- )` Latte reboot
    ResetAll,
    /// `( addr bytes quad -- )`
    Fill,
    /// `( adler buf len -- checksum )`
    Adler32,
    /// `( -- )` hand over to the board boot path
    PlatformBoot,
    /// `( -- )` last hook before the client program starts
    ArchGo,
}

impl Word {
    /// Dictionary name
    pub const fn name(self) -> &'static str {
        match self {
            Self::DmaAlloc => "ppc-dma-alloc",
            Self::DmaMapIn => "ppc-dma-map-in",
            Self::DmaSync => "ppc-dma-sync",
            Self::PowerOff => "ppc32-power-off",
            Self::ResetAll => "ppc32-reset-all",
            Self::Fill => "filll",
            Self::Adler32 => "(adler32)",
            Self::PlatformBoot => "platform-boot",
            Self::ArchGo => "(arch-go)",
        }
    }

    /// Deferred word this implementation is installed into, if any
    pub const fn hook(self) -> Option<&'static str> {
        match self {
            Self::DmaAlloc => Some("['] ppc-dma-alloc to (dma-alloc)"),
            Self::DmaMapIn => Some("['] ppc-dma-map-in to (dma-map-in)"),
            Self::DmaSync => Some("['] ppc-dma-sync to (dma-sync)"),
            Self::PowerOff => Some("['] ppc32-power-off to power-off"),
            Self::ResetAll => Some("['] ppc32-reset-all to reset-all"),
            Self::Fill | Self::Adler32 | Self::PlatformBoot | Self::ArchGo => None,
        }
    }
}

/// Bind `word` and install it into its deferred hook
pub fn install(m: &mut Machine<'_>, word: Word) {
    m.of.bind(word.name(), word);
    if let Some(hook) = word.hook() {
        m.of.feval(hook);
    }
    trace!("bound {}", word.name());
}

/// Run a bound word against the machine
pub fn execute(word: Word, m: &mut Machine<'_>, ipc_policy: &PollPolicy) {
    match word {
        Word::DmaAlloc => dma_alloc(m),
        Word::DmaMapIn => dma_map_in(m),
        Word::DmaSync => dma_sync(m),
        Word::PowerOff => ipc_command(m, IpcCommand::PowerOff, ipc_policy),
        Word::ResetAll => ipc_command(m, IpcCommand::Reboot, ipc_policy),
        Word::Fill => fill(m),
        Word::Adler32 => adler32(m),
        Word::PlatformBoot => m.board.boot(),
        Word::ArchGo => arch_go(m),
    }
}

fn dma_alloc(m: &mut Machine<'_>) {
    let size = m.of.pop();
    let addr = m.mem.alloc_aligned(size, PAGE_SIZE).unwrap_or(0);
    m.of.push(addr);
}

fn dma_map_in(m: &mut Machine<'_>) {
    let _cacheable = m.of.pop();
    let _size = m.of.pop();
    let virt = m.of.pop();
    // RAM is identity mapped for devices
    m.of.push(virt);
}

fn dma_sync(m: &mut Machine<'_>) {
    let size = m.of.pop();
    let _devaddr = m.of.pop();
    let virt = m.of.pop();
    let end = virt.wrapping_add(size);
    m.board.flush_dcache_range(virt, end);
    m.board.flush_icache_range(virt, end);
}

fn ipc_command(m: &mut Machine<'_>, command: IpcCommand, policy: &PollPolicy) {
    info!("IPC {:?}", command);
    let ipc = IpcChannel::new(m.bus);
    ipc.post(command);
    if let Err(e) = poll_until(m.delay, policy, || !ipc.is_busy()) {
        error!("IPC {:?} not acknowledged: {:?}", command, e);
    }
}

fn fill(m: &mut Machine<'_>) {
    let value = m.of.pop();
    let bytes = m.of.pop();
    let addr = m.of.pop();
    match m.ram.bytes_mut(addr, bytes) {
        Some(buf) => payload::fill_words(buf, value),
        None => warn!("filll: {:#x}+{:#x} is not RAM", addr, bytes),
    }
}

fn adler32(m: &mut Machine<'_>) {
    let len = m.of.pop();
    let buf = m.of.pop();
    let seed = m.of.pop();
    let data = if buf == 0 { None } else { m.ram.bytes(buf, len) };
    let result = payload::adler32(seed, data).unwrap_or(ADLER32_FAILURE);
    m.of.push(result);
}

fn arch_go(m: &mut Machine<'_>) {
    // Mac OS 9 and earlier look for the ROM copyright
    if m.of.find_dev("/rom/macos").is_some() {
        m.of.fword("insert-copyright-property");
    }
}
