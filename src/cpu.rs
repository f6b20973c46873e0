//! CPU identification table
//!
//! Maps the high half of the PVR to cache and TLB geometry. The geometry
//! for everything but Broadway is borrowed from the 750 until measured.

/// Known processor models
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CpuModel {
    /// Wii CPU
    Broadway,
    /// 750CL
    Ppc750Cl,
    /// 750FX
    Ppc750Fx,
    /// 750GX
    Ppc750Gx,
    /// Wii U CPU
    Espresso,
}

/// How the CPU node is finished after the generic properties
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NodeBuilder {
    /// Generic properties, `reg = 0`, then finish the node
    Ppc750,
}

/// Static description of one processor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuDescriptor {
    /// Model tag
    pub model: CpuModel,
    /// Expected value of `pvr & 0xFFFF_0000`
    pub version: u32,
    /// Node name under `/cpus`
    pub name: &'static str,
    /// Instruction cache size in bytes
    pub icache_size: u32,
    /// Data cache size in bytes
    pub dcache_size: u32,
    /// Instruction cache sets
    pub icache_sets: u32,
    /// Data cache sets
    pub dcache_sets: u32,
    /// Instruction cache line size
    pub icache_block_size: u32,
    /// Data cache line size
    pub dcache_block_size: u32,
    /// TLB sets
    pub tlb_sets: u32,
    /// TLB entries
    pub tlb_size: u32,
    /// Node construction routine
    pub builder: NodeBuilder,
}

impl CpuDescriptor {
    const fn ppc750(model: CpuModel, version: u32, name: &'static str) -> Self {
        Self {
            model,
            version,
            name,
            icache_size: 0x8000,
            dcache_size: 0x8000,
            icache_sets: 0x80,
            dcache_sets: 0x80,
            icache_block_size: 0x20,
            dcache_block_size: 0x20,
            tlb_sets: 0x40,
            tlb_size: 0x80,
            builder: NodeBuilder::Ppc750,
        }
    }
}

/// Every processor the firmware knows how to describe
pub static CPU_TABLE: [CpuDescriptor; 5] = [
    CpuDescriptor::ppc750(CpuModel::Broadway, 0x0008_0000, "PowerPC,750"),
    // TODO: measure 750CL/FX/GX geometry instead of reusing Broadway's
    CpuDescriptor::ppc750(CpuModel::Ppc750Cl, 0x1008_0000, "PowerPC,750"),
    CpuDescriptor::ppc750(CpuModel::Ppc750Fx, 0x7000_0000, "PowerPC,750"),
    CpuDescriptor::ppc750(CpuModel::Ppc750Gx, 0x7002_0000, "PowerPC,750"),
    CpuDescriptor::ppc750(CpuModel::Espresso, 0x7001_0000, "PowerPC,Espresso"),
];

/// Look up the processor reporting `pvr`
pub fn identify(pvr: u32) -> Option<&'static CpuDescriptor> {
    let version = pvr & 0xFFFF_0000;
    CPU_TABLE.iter().find(|cpu| cpu.version == version)
}
