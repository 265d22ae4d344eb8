//! USB subsystem
//!
//! The stages of a port power request, run strictly in order:
//! - [`session`]: libusb context lifetime
//! - [`locator`]: find and open the hub
//! - [`configuration`]: best-effort set-configuration
//! - [`port_power`]: SET/CLEAR_FEATURE(PORT_POWER) with retries
//!
//! A failure in the locator or port power stage aborts the run; everything
//! else is absorbed where it happens.

pub mod backend;
pub mod configuration;
pub mod locator;
pub mod port_power;
pub mod retry;
pub mod session;

pub use backend::{HubHandle, UsbCandidate, UsbSession};
pub use configuration::{ConfigurationOutcome, HUB_DEVICE_CONFIGURATION, ensure_configuration};
pub use locator::{DeviceLocator, LocatedHub, LocatorPolicy, Sleep, ThreadSleep};
pub use port_power::{PortPowerController, TransferPolicy};
pub use retry::{Classifier, PowerState, RetryOutcome, classify_transfer};
pub use session::Session;

use crate::console::Console;
use common::{HubIdentity, PortRequest};
use tracing::info;

/// Tunables for one run, normally taken from the config file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerPlan {
    pub locator: LocatorPolicy,
    pub configuration: u8,
    pub transfer: TransferPolicy,
}

impl Default for PowerPlan {
    fn default() -> Self {
        Self {
            locator: LocatorPolicy::default(),
            configuration: HUB_DEVICE_CONFIGURATION,
            transfer: TransferPolicy::default(),
        }
    }
}

/// What a successful run did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerReport {
    pub entry: usize,
    pub configuration: ConfigurationOutcome,
    pub attempts: u32,
}

/// Locate the hub, normalize its configuration and switch the port
///
/// The session is only borrowed; the caller keeps it alive for the whole
/// run and releases it afterwards, whatever this returns.
pub fn switch_port_power<U: UsbSession, S: Sleep>(
    session: &U,
    identity: &HubIdentity,
    request: &PortRequest,
    plan: &PowerPlan,
    sleeper: S,
    console: &Console,
) -> common::Result<PowerReport> {
    let mut locator = DeviceLocator::new(plan.locator, sleeper, console);
    let LocatedHub {
        mut handle, entry, ..
    } = locator.locate(session, identity)?;

    let configuration = ensure_configuration(&mut handle, plan.configuration, console);

    let controller = PortPowerController::new(plan.transfer, console);
    let attempts = controller.set_port_power(&handle, request)?;

    info!(
        "Hub {} port {} power {}",
        identity,
        request.port,
        if request.power_on { "on" } else { "off" }
    );

    Ok(PowerReport {
        entry,
        configuration,
        attempts,
    })
}
