//! Device locator
//!
//! Resolves a [`HubIdentity`] to an opened hub. The device list is scanned
//! from its last entry backwards, so with `instance = 1` the most recently
//! enumerated matching hub wins. That order is whatever the host's USB stack
//! reports; it is not something this crate controls.

use crate::console::Console;
use crate::usb::backend::{UsbCandidate, UsbSession};
use common::{Error, HubIdentity};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Number of enumeration passes before giving up
pub const DEFAULT_FIND_PASSES: u32 = 2;

/// Pause between passes, giving the OS time to finish enumerating a hub
/// that was only just plugged in
pub const DEFAULT_FIND_RETRY_DELAY: Duration = Duration::from_secs(4);

/// Blocking pause between enumeration passes
pub trait Sleep {
    fn sleep(&mut self, duration: Duration);
}

/// [`Sleep`] backed by `std::thread::sleep`
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleep;

impl Sleep for ThreadSleep {
    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocatorPolicy {
    pub passes: u32,
    pub retry_delay: Duration,
}

impl Default for LocatorPolicy {
    fn default() -> Self {
        Self {
            passes: DEFAULT_FIND_PASSES,
            retry_delay: DEFAULT_FIND_RETRY_DELAY,
        }
    }
}

/// An opened hub together with where it was found
#[derive(Debug)]
pub struct LocatedHub<H> {
    pub handle: H,
    /// 1-based position in the device list
    pub entry: usize,
    /// Length of the device list it was found in
    pub list_len: usize,
    /// 0-based enumeration pass that found it
    pub pass: u32,
}

pub struct DeviceLocator<'a, S: Sleep = ThreadSleep> {
    policy: LocatorPolicy,
    sleeper: S,
    console: &'a Console,
}

impl<'a, S: Sleep> DeviceLocator<'a, S> {
    pub fn new(policy: LocatorPolicy, sleeper: S, console: &'a Console) -> Self {
        Self {
            policy,
            sleeper,
            console,
        }
    }

    pub fn sleeper(&self) -> &S {
        &self.sleeper
    }

    /// Find and open the requested hub
    ///
    /// Failing to read the device list, a descriptor, or to open the
    /// candidate only fails the current pass. Running out of passes is
    /// [`Error::DeviceNotFound`].
    pub fn locate<U: UsbSession>(
        &mut self,
        session: &U,
        identity: &HubIdentity,
    ) -> common::Result<LocatedHub<<U::Candidate as UsbCandidate>::Handle>> {
        for pass in 0..self.policy.passes {
            if pass > 0 {
                debug!(
                    "Waiting {:?} before enumeration pass {}",
                    self.policy.retry_delay,
                    pass + 1
                );
                self.sleeper.sleep(self.policy.retry_delay);
            }

            let devices = match session.devices() {
                Ok(devices) => devices,
                Err(e) => {
                    self.console
                        .diagnostic(format_args!("Could not get USB device list: {}", e));
                    continue;
                }
            };

            if let Some(found) = self.scan(&devices, identity, pass) {
                return Ok(found);
            }

            self.console.diagnostic(format_args!(
                "No device matching vid 0x{:04X}, pid 0x{:04X}, instance {} found\n  in list of {} devices",
                identity.vendor_id,
                identity.product_id,
                identity.instance,
                devices.len()
            ));
        }

        Err(Error::DeviceNotFound {
            vendor_id: identity.vendor_id,
            product_id: identity.product_id,
            instance: identity.instance,
            passes: self.policy.passes,
        })
    }

    /// Walk one device list from the back, opening the instance'th match
    fn scan<C: UsbCandidate>(
        &self,
        devices: &[C],
        identity: &HubIdentity,
        pass: u32,
    ) -> Option<LocatedHub<C::Handle>> {
        let list_len = devices.len();
        let wanted = u32::from(identity.instance);
        let mut matches = 0u32;

        for (index, device) in devices.iter().enumerate().rev() {
            let (vendor_id, product_id) = match device.vendor_product() {
                Ok(ids) => ids,
                Err(e) => {
                    self.console.diagnostic(format_args!(
                        "Could not get USB device descriptor ({} of {}): {}",
                        index, list_len, e
                    ));
                    continue;
                }
            };

            if !identity.matches(vendor_id, product_id) {
                continue;
            }
            matches += 1;
            if matches != wanted {
                debug!(
                    "Skipping match {} at bus={}, addr={}",
                    matches,
                    device.bus_number(),
                    device.address()
                );
                continue;
            }

            // Only one candidate can be the requested instance, so an open
            // failure ends this pass.
            return match device.open() {
                Ok(handle) => {
                    info!(
                        "Opened hub {} at bus={}, addr={}",
                        identity,
                        device.bus_number(),
                        device.address()
                    );
                    self.console.progress(format_args!(
                        "Found matching device instance {} at list entry {} of {}",
                        matches,
                        index + 1,
                        list_len
                    ));
                    Some(LocatedHub {
                        handle,
                        entry: index + 1,
                        list_len,
                        pass,
                    })
                }
                Err(e) => {
                    warn!(
                        "Failed to open hub at bus={}, addr={}: {}",
                        device.bus_number(),
                        device.address(),
                        e
                    );
                    self.console.diagnostic(format_args!(
                        "Could not open USB device ({} of {}): {}",
                        index, list_len, e
                    ));
                    None
                }
            };
        }

        None
    }
}
