//! Validated inputs for a single hub port power request

use crate::{Error, Result};
use std::fmt;

/// Highest hub instance that may be requested
pub const MAX_HUB_INSTANCE: u8 = 15;

/// Highest downstream port number that may be requested
pub const MAX_HUB_PORT: u8 = 7;

/// Which physical hub to target
///
/// `instance` picks among several hubs sharing the same VID:PID. Instances
/// are counted from the end of the host's device list, whose order is
/// platform-defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HubIdentity {
    pub vendor_id: u16,
    pub product_id: u16,
    pub instance: u8,
}

impl HubIdentity {
    pub fn new(vendor_id: u16, product_id: u16, instance: u8) -> Result<Self> {
        if vendor_id == 0 {
            return Err(Error::Usage(
                "VendorID must be a hexadecimal value between 1 and ffff".to_string(),
            ));
        }
        if product_id == 0 {
            return Err(Error::Usage(
                "ProductID must be a hexadecimal value between 1 and ffff".to_string(),
            ));
        }
        if instance == 0 || instance > MAX_HUB_INSTANCE {
            return Err(Error::Usage(format!(
                "Instance must be between 1 and {}",
                MAX_HUB_INSTANCE
            )));
        }

        Ok(Self {
            vendor_id,
            product_id,
            instance,
        })
    }

    /// True if a device descriptor's VID:PID matches this hub
    pub fn matches(&self, vendor_id: u16, product_id: u16) -> bool {
        self.vendor_id == vendor_id && self.product_id == product_id
    }
}

impl fmt::Display for HubIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04x}:{:04x} #{}",
            self.vendor_id, self.product_id, self.instance
        )
    }
}

/// Desired state of one downstream port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortRequest {
    pub port: u8,
    pub power_on: bool,
}

impl PortRequest {
    pub fn new(port: u8, power_on: bool) -> Result<Self> {
        if port == 0 || port > MAX_HUB_PORT {
            return Err(Error::Usage(format!(
                "PortNum must be between 1 and {}",
                MAX_HUB_PORT
            )));
        }
        Ok(Self { port, power_on })
    }

    /// "Set" or "Clear", as reported after the feature request succeeds
    pub fn feature_action(&self) -> &'static str {
        if self.power_on { "Set" } else { "Clear" }
    }
}

/// Parse a VID or PID given in hex, with or without a `0x` prefix
pub fn parse_hex_id(s: &str) -> Result<u16> {
    let digits = s
        .trim()
        .trim_start_matches("0x")
        .trim_start_matches("0X");

    if digits.is_empty() || digits.len() > 4 {
        return Err(Error::Usage(format!(
            "'{}' is not a hexadecimal value between 1 and ffff",
            s
        )));
    }

    match u16::from_str_radix(digits, 16) {
        Ok(0) | Err(_) => Err(Error::Usage(format!(
            "'{}' is not a hexadecimal value between 1 and ffff",
            s
        ))),
        Ok(id) => Ok(id),
    }
}
