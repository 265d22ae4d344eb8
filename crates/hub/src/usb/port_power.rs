//! Port power controller
//!
//! Sets or clears PORT_POWER on one downstream port with a hub class
//! SET_FEATURE / CLEAR_FEATURE request, retrying transient bus errors.

use crate::console::Console;
use crate::usb::backend::HubHandle;
use crate::usb::retry::{Classifier, PowerState, RetryOutcome, classify_transfer};
use common::{Error, PortRequest};
use std::time::Duration;
use tracing::{debug, info, warn};

/// bmRequestType: host-to-device, class request, "other" (port) recipient
pub const USB_RT_PORT: u8 = 0x23;

pub const REQUEST_CLEAR_FEATURE: u8 = 0x01;
pub const REQUEST_SET_FEATURE: u8 = 0x03;

/// Hub class feature selector for port power
pub const USB_PORT_FEAT_POWER: u16 = 8;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

pub const DEFAULT_TRANSFER_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferPolicy {
    pub max_attempts: u32,
    pub timeout: Duration,
}

impl Default for TransferPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            timeout: DEFAULT_TRANSFER_TIMEOUT,
        }
    }
}

pub struct PortPowerController<'a> {
    policy: TransferPolicy,
    classifier: Classifier,
    console: &'a Console,
}

impl<'a> PortPowerController<'a> {
    pub fn new(policy: TransferPolicy, console: &'a Console) -> Self {
        Self::with_classifier(policy, classify_transfer, console)
    }

    pub fn with_classifier(
        policy: TransferPolicy,
        classifier: Classifier,
        console: &'a Console,
    ) -> Self {
        Self {
            policy,
            classifier,
            console,
        }
    }

    /// Apply `request` to the hub, returning how many transfers it took
    pub fn set_port_power<H: HubHandle>(
        &self,
        handle: &H,
        request: &PortRequest,
    ) -> common::Result<u32> {
        let feature = if request.power_on {
            REQUEST_SET_FEATURE
        } else {
            REQUEST_CLEAR_FEATURE
        };
        let mut last_error: Option<rusb::Error> = None;
        let mut state = PowerState::Idle;

        while !state.is_terminal() {
            state = match state {
                PowerState::Attempting { attempt } => {
                    let result = handle.write_control(
                        USB_RT_PORT,
                        feature,
                        USB_PORT_FEAT_POWER,
                        u16::from(request.port),
                        &[],
                        self.policy.timeout,
                    );
                    if let Err(e) = result {
                        last_error = Some(e);
                    }

                    let outcome = (self.classifier)(&result);
                    match &outcome {
                        RetryOutcome::Success => {}
                        RetryOutcome::Retryable(reason) | RetryOutcome::Fatal(reason) => {
                            self.console.diagnostic(format_args!("{}", reason));
                        }
                    }
                    PowerState::Attempting { attempt }.record(outcome, self.policy.max_attempts)
                }
                other => other.begin(),
            };
            debug!(
                "Port {} power {}: {}",
                request.port,
                request.feature_action(),
                state
            );
        }

        match state {
            PowerState::Success { attempts } => {
                info!(
                    "Port {} power feature {} after {} attempt(s)",
                    request.port,
                    request.feature_action(),
                    attempts
                );
                self.console.progress(format_args!(
                    "Hub port {} power Port-{}-Feature",
                    request.port,
                    request.feature_action()
                ));
                Ok(attempts)
            }
            PowerState::Exhausted { attempts, reason } => {
                let detail = last_error.map_or(reason, |e| e.to_string());
                warn!("Port {} power request gave up: {}", request.port, detail);
                Err(Error::Transfer {
                    port: request.port,
                    attempts,
                    reason: detail,
                })
            }
            other => unreachable!("port power loop left in state {}", other),
        }
    }
}
