//! In-memory USB fakes
//!
//! Scriptable stand-ins for the [`crate::usb::backend`] traits so the
//! locator, configuration and port power stages can be exercised without a
//! hub on the bus. Every control transfer and every sleep is recorded.
//!
//! # Example
//!
//! ```
//! use hub_port_power::testing::{FakeDevice, FakeSession};
//!
//! let session = FakeSession::repeating(vec![FakeDevice::new("hub", 0x110a, 0x0407)]);
//! assert_eq!(session.enumerations(), 0);
//! ```

use crate::usb::backend::{HubHandle, UsbCandidate, UsbSession};
use crate::usb::locator::Sleep;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

/// One recorded control transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlRecord {
    pub request_type: u8,
    pub request: u8,
    pub value: u16,
    pub index: u16,
    pub length: usize,
    pub timeout: Duration,
}

#[derive(Debug)]
struct HubState {
    configuration: Result<u8, rusb::Error>,
    set_configuration_result: Result<(), rusb::Error>,
    set_configuration_calls: Vec<u8>,
    transfer_outcomes: VecDeque<Result<usize, rusb::Error>>,
    transfers: Vec<ControlRecord>,
}

/// Opened hub; clones share state, so a test can keep one to inspect
#[derive(Debug, Clone)]
pub struct FakeHub {
    label: String,
    state: Rc<RefCell<HubState>>,
}

impl FakeHub {
    /// Hub in configuration 1 whose transfers all succeed
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            state: Rc::new(RefCell::new(HubState {
                configuration: Ok(1),
                set_configuration_result: Ok(()),
                set_configuration_calls: Vec::new(),
                transfer_outcomes: VecDeque::new(),
                transfers: Vec::new(),
            })),
        }
    }

    pub fn with_configuration(self, configuration: Result<u8, rusb::Error>) -> Self {
        self.state.borrow_mut().configuration = configuration;
        self
    }

    pub fn with_set_configuration_result(self, result: Result<(), rusb::Error>) -> Self {
        self.state.borrow_mut().set_configuration_result = result;
        self
    }

    /// Outcomes returned by successive transfers; `Ok(0)` once they run out
    pub fn with_transfer_outcomes(self, outcomes: Vec<Result<usize, rusb::Error>>) -> Self {
        self.state.borrow_mut().transfer_outcomes = outcomes.into();
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn configuration(&self) -> Result<u8, rusb::Error> {
        self.state.borrow().configuration
    }

    pub fn set_configuration_calls(&self) -> Vec<u8> {
        self.state.borrow().set_configuration_calls.clone()
    }

    pub fn transfers(&self) -> Vec<ControlRecord> {
        self.state.borrow().transfers.clone()
    }
}

impl HubHandle for FakeHub {
    fn active_configuration(&self) -> Result<u8, rusb::Error> {
        self.state.borrow().configuration
    }

    fn set_active_configuration(&mut self, config: u8) -> Result<(), rusb::Error> {
        let mut state = self.state.borrow_mut();
        state.set_configuration_calls.push(config);
        let result = state.set_configuration_result;
        if result.is_ok() {
            state.configuration = Ok(config);
        }
        result
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
        let mut state = self.state.borrow_mut();
        state.transfers.push(ControlRecord {
            request_type,
            request,
            value,
            index,
            length: data.len(),
            timeout,
        });
        state.transfer_outcomes.pop_front().unwrap_or(Ok(data.len()))
    }
}

/// Device list entry
#[derive(Debug, Clone)]
pub struct FakeDevice {
    descriptor: Result<(u16, u16), rusb::Error>,
    open_error: Option<rusb::Error>,
    bus_number: u8,
    address: u8,
    hub: FakeHub,
}

impl FakeDevice {
    pub fn new(label: impl Into<String>, vendor_id: u16, product_id: u16) -> Self {
        Self {
            descriptor: Ok((vendor_id, product_id)),
            open_error: None,
            bus_number: 1,
            address: 1,
            hub: FakeHub::new(label),
        }
    }

    /// Entry whose descriptor cannot be read
    pub fn unreadable(label: impl Into<String>, error: rusb::Error) -> Self {
        Self {
            descriptor: Err(error),
            ..Self::new(label, 0, 0)
        }
    }

    pub fn with_open_error(mut self, error: rusb::Error) -> Self {
        self.open_error = Some(error);
        self
    }

    pub fn with_hub(mut self, hub: FakeHub) -> Self {
        self.hub = hub;
        self
    }

    /// Handle this device hands out when opened
    pub fn hub(&self) -> FakeHub {
        self.hub.clone()
    }
}

impl UsbCandidate for FakeDevice {
    type Handle = FakeHub;

    fn vendor_product(&self) -> Result<(u16, u16), rusb::Error> {
        self.descriptor
    }

    fn bus_number(&self) -> u8 {
        self.bus_number
    }

    fn address(&self) -> u8 {
        self.address
    }

    fn open(&self) -> Result<FakeHub, rusb::Error> {
        match self.open_error {
            Some(e) => Err(e),
            None => Ok(self.hub.clone()),
        }
    }
}

/// Scripted enumeration results
#[derive(Debug)]
pub struct FakeSession {
    script: RefCell<VecDeque<Result<Vec<FakeDevice>, rusb::Error>>>,
    fallback: Result<Vec<FakeDevice>, rusb::Error>,
    enumerations: Cell<u32>,
}

impl FakeSession {
    /// Every enumeration returns the same list
    pub fn repeating(devices: Vec<FakeDevice>) -> Self {
        Self::scripted(Vec::new(), Ok(devices))
    }

    /// Enumerations return `script` in order, then `fallback` forever
    pub fn scripted(
        script: Vec<Result<Vec<FakeDevice>, rusb::Error>>,
        fallback: Result<Vec<FakeDevice>, rusb::Error>,
    ) -> Self {
        Self {
            script: RefCell::new(script.into()),
            fallback,
            enumerations: Cell::new(0),
        }
    }

    /// How many times the device list was requested
    pub fn enumerations(&self) -> u32 {
        self.enumerations.get()
    }
}

impl UsbSession for FakeSession {
    type Candidate = FakeDevice;

    fn devices(&self) -> Result<Vec<FakeDevice>, rusb::Error> {
        self.enumerations.set(self.enumerations.get() + 1);
        match self.script.borrow_mut().pop_front() {
            Some(result) => result,
            None => self.fallback.clone(),
        }
    }
}

/// [`Sleep`] that records instead of blocking
#[derive(Debug, Default, Clone)]
pub struct RecordingSleep {
    pub sleeps: Vec<Duration>,
}

impl Sleep for RecordingSleep {
    fn sleep(&mut self, duration: Duration) {
        self.sleeps.push(duration);
    }
}

impl Sleep for &mut RecordingSleep {
    fn sleep(&mut self, duration: Duration) {
        self.sleeps.push(duration);
    }
}
