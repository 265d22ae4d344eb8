//! Seams between the hub logic and the USB access library
//!
//! The locator, configuration and port power stages only talk to these
//! traits. `rusb` types implement them for real hardware; `crate::testing`
//! implements them in memory.

use rusb::{Device, DeviceHandle, UsbContext};
use std::time::Duration;

/// Source of the host's current device list
pub trait UsbSession {
    type Candidate: UsbCandidate;

    /// Snapshot of all attached devices, in the host's enumeration order
    fn devices(&self) -> Result<Vec<Self::Candidate>, rusb::Error>;
}

/// One entry of the device list
pub trait UsbCandidate {
    type Handle: HubHandle;

    /// Read the device descriptor and return its (VID, PID)
    fn vendor_product(&self) -> Result<(u16, u16), rusb::Error>;

    fn bus_number(&self) -> u8;

    fn address(&self) -> u8;

    fn open(&self) -> Result<Self::Handle, rusb::Error>;
}

/// An opened hub
pub trait HubHandle {
    fn active_configuration(&self) -> Result<u8, rusb::Error>;

    fn set_active_configuration(&mut self, config: u8) -> Result<(), rusb::Error>;

    /// Host-to-device control transfer, returning the number of bytes written
    fn write_control(
        &self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        data: &[u8],
        timeout: Duration,
    ) -> Result<usize, rusb::Error>;
}

impl<T: UsbContext> UsbCandidate for Device<T> {
    type Handle = DeviceHandle<T>;

    fn vendor_product(&self) -> Result<(u16, u16), rusb::Error> {
        let desc = self.device_descriptor()?;
        Ok((desc.vendor_id(), desc.product_id()))
    }

    fn bus_number(&self) -> u8 {
        Device::bus_number(self)
    }

    fn address(&self) -> u8 {
        Device::address(self)
    }

    fn open(&self) -> Result<Self::Handle, rusb::Error> {
        Device::open(self)
    }
}

impl<T: UsbContext> HubHandle for DeviceHandle<T> {
    fn active_configuration(&self) -> Result<u8, rusb::Error> {
        DeviceHandle::active_configuration(self)
    }

    fn set_active_configuration(&mut self, config: u8) -> Result<(), rusb::Error> {
        DeviceHandle::set_active_configuration(self, config)
    }

    fn write_control(
        &self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        data: &[u8],
        timeout: Duration,
    ) -> Result<usize, rusb::Error> {
        DeviceHandle::write_control(self, request_type, request, value, index, data, timeout)
    }
}
