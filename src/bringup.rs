//! Bring-up orchestrator
//!
//! One pass, in a fixed order, from a freshly initialised Forth environment
//! to an 8 MiB load region ready for the client program. After
//! [`arch_of_init`] returns, the interpreter owns the machine; bring-up code
//! only runs again through the words it bound.

use crate::config::BringupConfig;
use crate::cpu::{self, CpuDescriptor};
use crate::devtree;
use crate::error::{BringupError, Result};
use crate::firmware::{Board, Machine};
use crate::hal;
use crate::hal::hollywood::SlotLed;
use crate::platform::{BootContext, Platform};
use crate::reset;
use crate::words::{self, Word};

/// Name printed in the banner
pub const PROGRAM_NAME: &str = env!("CARGO_PKG_NAME");
/// Version printed in the banner
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Range claimed for the client program
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LoadRegion {
    /// `load-base`
    pub base: u32,
    /// Length in bytes
    pub size: u32,
}

/// Run the whole bring-up pass
pub fn arch_of_init(
    ctx: &BootContext,
    config: &BringupConfig,
    m: &mut Machine<'_>,
) -> Result<LoadRegion> {
    let platform = ctx.platform();

    init_environment(m.board);

    for word in [Word::DmaAlloc, Word::DmaMapIn, Word::DmaSync] {
        words::install(m, word);
    }

    pulse_disc_led(m, platform, config.led_pulse_ms);
    print_banner(m.board);

    let ram_size = m.mem.ram_size();
    let _ = writeln!(m.board, "Memory: {}M", ram_size / 1024 / 1024);

    m.of.fword(platform.fixup_word());

    let cpu = identify_or_halt(ctx, m.board);
    let cpu_path = devtree::build_cpu_node(m.of, ctx, cpu)?;
    let _ = writeln!(m.board, "CPU type {}", cpu.name);
    devtree::build_memory_node(m.of, ram_size)?;
    devtree::cross_link(m.of, m.mem, &cpu_path)?;
    devtree::configure_boot_device(m.of)?;
    devtree::configure_chosen(m.of, config.stdin_alias, config.stdout_alias)?;

    reset::bring_up_video(m, platform)?;
    reset::reset_controllers(m, platform, &config.reset_policy)?;

    install_power_words(m, platform);
    for word in [Word::Fill, Word::Adler32, Word::PlatformBoot, Word::ArchGo] {
        words::install(m, word);
    }

    let region = claim_load_region(m, config.load_region_size)?;
    info!("bring-up complete, load region {:#x}+{:#x}", region.base, region.size);
    Ok(region)
}

/// Entry point for words bound during bring-up
pub fn dispatch(word: Word, config: &BringupConfig, m: &mut Machine<'_>) {
    words::execute(word, m, &config.ipc_policy);
}

fn init_environment(board: &mut dyn Board) {
    board.openbios_init();
    board.modules_init();
    board.setup_timers();
    board.setup_video();
}

fn pulse_disc_led(m: &mut Machine<'_>, platform: Platform, duration_ms: u32) {
    match platform {
        Platform::Rvl => {
            let led = SlotLed::new(m.bus);
            led.on();
            m.delay.delay_ms(duration_ms);
            led.off();
        }
        Platform::Cafe => {}
    }
}

fn print_banner(board: &mut dyn Board) {
    let build_date = option_env!("BUILD_DATE").unwrap_or("unknown");
    let _ = writeln!(board);
    let _ = writeln!(
        board,
        "============================================================="
    );
    let _ = writeln!(board, "{PROGRAM_NAME} {VERSION} [{build_date}]");
}

fn identify_or_halt(ctx: &BootContext, board: &mut dyn Board) -> &'static CpuDescriptor {
    match cpu::identify(ctx.pvr()) {
        Some(cpu) => {
            debug!("CPU model {:?}", cpu.model);
            cpu
        }
        None => {
            report_unknown_cpu(ctx.pvr(), board);
            // Cache maintenance is wrong without the right geometry
            hal::halt()
        }
    }
}

fn report_unknown_cpu(pvr: u32, board: &mut dyn Board) {
    let version = pvr & 0xFFFF_0000;
    if writeln!(board, "Unknown cpu (pvr {version:x}), freezing!").is_err() {
        error!("unknown cpu, pvr {:#x}", version);
    }
}

fn install_power_words(m: &mut Machine<'_>, platform: Platform) {
    match platform {
        Platform::Cafe => {
            words::install(m, Word::PowerOff);
            words::install(m, Word::ResetAll);
        }
        // RVL power control lives in the board support package
        Platform::Rvl => {}
    }
}

fn claim_load_region(m: &mut Machine<'_>, size: u32) -> Result<LoadRegion> {
    m.of.fword("load-base");
    let base = m.of.pop();

    if !m.mem.claim_phys(base, size) || !m.mem.claim_virt(base, size) {
        return Err(BringupError::ClaimFailed { base, size });
    }
    m.mem.map(base, base, size, 0);
    Ok(LoadRegion { base, size })
}
