//! Device tree synthesis
//!
//! Builds the CPU and memory nodes, links them in the memory manager and
//! fills in `/options` and `/chosen`. Every property write goes to the
//! node made current just before it; no two node contexts are ever open.

use crate::cpu::{CpuDescriptor, NodeBuilder};
use crate::error::{BringupError, Result};
use crate::firmware::{MemoryManager, NodePath, OpenFirmware, PropValue};
use crate::platform::BootContext;
use core::fmt::Write;

/// Device the bootstrap loader reads from when `boot-device` says `disk`
const OPTICAL_BOOT_PATH: &str = "cd";

/// Reservation granule of the 750 family
const RESERVATION_GRANULE: u32 = 0x20;

/// Path of the CPU node for `cpu`
pub fn cpu_node_path(cpu: &CpuDescriptor) -> Result<NodePath> {
    let mut path = NodePath::new();
    write!(path, "/cpus/{}", cpu.name).map_err(|_| BringupError::PathTooLong)?;
    Ok(path)
}

/// Create `/cpus/<name>` and describe the processor in it.
///
/// Returns the path of the finished node.
pub fn build_cpu_node(
    of: &mut dyn OpenFirmware,
    ctx: &BootContext,
    cpu: &CpuDescriptor,
) -> Result<NodePath> {
    of.find_device("/cpus").ok_or(BringupError::NodeNotFound)?;
    of.new_device();
    of.device_name(cpu.name);
    of.device_type("cpu");

    of.property("cpu-version", PropValue::Int(ctx.pvr()));
    of.property("d-cache-size", PropValue::Int(cpu.dcache_size));
    of.property("i-cache-size", PropValue::Int(cpu.icache_size));
    of.property("d-cache-sets", PropValue::Int(cpu.dcache_sets));
    of.property("i-cache-sets", PropValue::Int(cpu.icache_sets));
    of.property("d-cache-block-size", PropValue::Int(cpu.dcache_block_size));
    of.property("i-cache-block-size", PropValue::Int(cpu.icache_block_size));
    of.property("tlb-sets", PropValue::Int(cpu.tlb_sets));
    of.property("tlb-size", PropValue::Int(cpu.tlb_size));

    // Estimates until the clocks are measured
    of.property("timebase-frequency", PropValue::Int(ctx.timebase_frequency()));
    of.property("clock-frequency", PropValue::Int(ctx.cpu_frequency()));
    of.property("bus-frequency", PropValue::Int(ctx.bus_frequency()));

    of.property("state", PropValue::Str("running"));
    of.property("reservation-granule-size", PropValue::Int(RESERVATION_GRANULE));

    match cpu.builder {
        NodeBuilder::Ppc750 => {
            of.property("reg", PropValue::Int(0));
            of.finish_device();
        }
    }

    debug!("CPU node {} built", cpu.name);
    cpu_node_path(cpu)
}

/// Describe all of RAM as one region at physical 0.
///
/// Only one size cell is written; more than 4 GiB would need several
/// `(base, size)` pairs.
pub fn build_memory_node(of: &mut dyn OpenFirmware, ram_size: u64) -> Result<()> {
    of.find_device("/memory").ok_or(BringupError::NodeNotFound)?;
    let size = (ram_size & 0xFFFF_FFFF) as u32;
    of.property("reg", PropValue::Reg { phys: 0, size });
    debug!("memory node: {:#x} bytes", size);
    Ok(())
}

/// Register the CPU node against the memory node and give it the generic
/// node methods. Both nodes must already exist.
pub fn cross_link(
    of: &mut dyn OpenFirmware,
    mem: &mut dyn MemoryManager,
    cpu_path: &str,
) -> Result<()> {
    let memory = of.find_dev("/memory").ok_or(BringupError::NodeNotFound)?;
    let cpu = of.find_dev(cpu_path).ok_or(BringupError::NodeNotFound)?;
    mem.register(memory, cpu);
    of.init_node_methods(cpu_path);
    Ok(())
}

/// Expand the `disk` keyword into the three-clause path the legacy
/// bootstrap understands: raw `tbxi` load, `bootinfo.txt`, then `%BOOT`.
/// Anything else is left to the environment.
pub fn rewrite_boot_device(device: &str) -> Option<NodePath> {
    if device != "disk" {
        return None;
    }
    let p = OPTICAL_BOOT_PATH;
    let mut spec = NodePath::new();
    write!(spec, "{p}:,\\\\:tbxi {p}:,\\ppc\\bootinfo.txt {p}:,%BOOT").ok()?;
    Some(spec)
}

/// Rewrite `/options/boot-device` when it names the optical drive
pub fn configure_boot_device(of: &mut dyn OpenFirmware) -> Result<()> {
    of.find_device("/options").ok_or(BringupError::NodeNotFound)?;

    of.fword("boot-device");
    let Some(device) = of.pop_string() else {
        return Ok(());
    };

    if let Some(spec) = rewrite_boot_device(&device) {
        info!("boot-device {} -> {}", device.as_str(), spec.as_str());
        of.property("boot-device", PropValue::Str(&spec));
    }
    Ok(())
}

/// Bind the console input and output devices and start the tty interface
pub fn configure_chosen(of: &mut dyn OpenFirmware, stdin: &str, stdout: &str) -> Result<()> {
    of.find_device("/chosen").ok_or(BringupError::NodeNotFound)?;

    of.push_str(stdin);
    of.fword("pathres-resolve-aliases");
    of.push_str("input-device");
    of.fword("$setenv");

    of.push_str(stdout);
    of.fword("pathres-resolve-aliases");
    of.push_str("output-device");
    of.fword("$setenv");

    of.fword("activate-tty-interface");
    Ok(())
}
