//! Controller reset sequencing
//!
//! EHCI controllers are stopped and reset so every device falls back to
//! the OHCI companions, which are then handed to their drivers together
//! with the SD host. The video step runs first because the console needs
//! it before USB is touched.

use crate::error::{BringupError, Result};
use crate::firmware::{Machine, NodePath, OpenFirmware};
use crate::hal::ehci::EhciController;
use crate::hal::hollywood;
use crate::hal::timer::Delay;
use crate::hal::{RVL_FB_BASE, RVL_XFB_BASE};
use crate::platform::Platform;
use crate::poll::{poll_until, PollPolicy};

/// Where an EHCI controller is in its shutdown sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EhciState {
    /// Run/Stop may still be set
    Running,
    /// USBSTS reported HCHALTED
    Halted,
    /// HCRESET cleared itself
    Reset,
}

/// Stop `ehci` and reset it: `Running → Halted → Reset`.
///
/// With [`PollPolicy::UNBOUNDED`] a controller that never answers hangs
/// here forever.
pub fn reset_ehci(
    ehci: &EhciController<'_>,
    delay: &dyn Delay,
    policy: &PollPolicy,
) -> Result<EhciState> {
    let mut state = EhciState::Running;

    ehci.request_halt();
    poll_until(delay, policy, || ehci.is_halt_confirmed())?;
    state = advance(ehci, state, EhciState::Halted);

    ehci.request_reset();
    poll_until(delay, policy, || ehci.is_reset_complete())?;
    state = advance(ehci, state, EhciState::Reset);

    Ok(state)
}

fn advance(ehci: &EhciController<'_>, from: EhciState, to: EhciState) -> EhciState {
    debug!("EHCI {:#x}: {:?} -> {:?}", ehci.base(), from, to);
    to
}

/// Controller resolved from the device tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerHandle {
    /// Full node path
    pub path: NodePath,
    /// Base of the register window, first cell of `reg`
    pub reg: u32,
}

impl ControllerHandle {
    /// Select the node at `path` and read its `reg` property
    pub fn resolve(of: &mut dyn OpenFirmware, path: &str) -> Result<Self> {
        let node = of.find_device(path).ok_or(BringupError::NodeNotFound)?;
        let path = of.path_of(node).ok_or(BringupError::NodeNotFound)?;
        let reg = of
            .int_property(node, "reg")
            .ok_or(BringupError::MissingProperty)?;
        Ok(Self { path, reg })
    }
}

/// Hand the OHCI controller at `node_path` to its driver
pub fn bring_up_ohci(m: &mut Machine<'_>, node_path: &str) -> Result<()> {
    let handle = ControllerHandle::resolve(m.of, node_path)?;
    info!("OHCI {} at {:#x}", handle.path.as_str(), handle.reg);
    m.board.init_ohci(&handle.path, handle.reg);
    Ok(())
}

/// Hand the SD host controller to its driver
pub fn bring_up_sdhc(m: &mut Machine<'_>) -> Result<()> {
    let handle = ControllerHandle::resolve(m.of, "/sdhc")?;
    info!("SDHC {} at {:#x}", handle.path.as_str(), handle.reg);
    m.board.init_sdhc(&handle.path, handle.reg);
    Ok(())
}

/// Load the display driver for the platform
pub fn bring_up_video(m: &mut Machine<'_>, platform: Platform) -> Result<()> {
    match platform {
        Platform::Cafe => {
            m.of.find_device("/gx2").ok_or(BringupError::NodeNotFound)?;
            m.of.feval("['] wii-gx2-driver-fcode 2 cells + 1 byte-load");
        }
        Platform::Rvl => {
            let node = m.of.find_device("/video").ok_or(BringupError::NodeNotFound)?;
            let path = m.of.path_of(node).ok_or(BringupError::NodeNotFound)?;
            m.board.init_video_interface(&path, RVL_XFB_BASE, RVL_FB_BASE);
            m.of.feval("['] flipper-vi-driver-fcode 2 cells + 1 byte-load");
            hollywood::enable_ehci_interrupts(m.bus);
        }
    }
    Ok(())
}

/// Reset every EHCI controller, then start OHCI and SD
pub fn reset_controllers(
    m: &mut Machine<'_>,
    platform: Platform,
    policy: &PollPolicy,
) -> Result<()> {
    for &base in platform.ehci_bases() {
        let ehci = EhciController::new(m.bus, base);
        reset_ehci(&ehci, m.delay, policy)?;
    }

    for path in platform.ohci_nodes() {
        bring_up_ohci(m, path)?;
    }

    bring_up_sdhc(m)?;
    m.of.device_end();
    Ok(())
}
