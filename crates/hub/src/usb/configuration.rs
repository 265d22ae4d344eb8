//! Hub configuration
//!
//! Best effort only: a failed set-configuration is reported and then
//! ignored, because the hub class requests issued afterwards go to the
//! default control pipe and work without it.

use crate::console::Console;
use crate::usb::backend::HubHandle;
use tracing::{debug, warn};

/// Configuration value selected on hubs before switching port power
pub const HUB_DEVICE_CONFIGURATION: u8 = 1;

/// What [`ensure_configuration`] ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigurationOutcome {
    /// Device was already in the desired configuration
    Unchanged,
    /// Set-configuration was issued and succeeded
    Applied,
    /// Set-configuration was issued and failed; execution continues
    Failed(rusb::Error),
}

/// Put the hub in `desired` configuration if it is not there already
pub fn ensure_configuration<H: HubHandle>(
    handle: &mut H,
    desired: u8,
    console: &Console,
) -> ConfigurationOutcome {
    match handle.active_configuration() {
        Ok(current) if current == desired => {
            debug!("Hub already in configuration {}", desired);
            return ConfigurationOutcome::Unchanged;
        }
        Ok(current) => {
            debug!("Hub in configuration {}, want {}", current, desired);
        }
        Err(e) => {
            // Unknown current value: fall through and set it
            warn!("Could not read hub configuration: {}", e);
        }
    }

    console.progress(format_args!(
        "Setting USB device configuration to {}",
        desired
    ));

    match handle.set_active_configuration(desired) {
        Ok(()) => ConfigurationOutcome::Applied,
        Err(e) => {
            console.diagnostic(format_args!(
                "Could not set configuration on USB device: {}",
                e
            ));
            ConfigurationOutcome::Failed(e)
        }
    }
}
