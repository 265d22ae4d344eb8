//! Common utilities for hub-port-power
//!
//! This crate provides the pieces shared between the hub control library and
//! the command line front end: validated input types, the error taxonomy,
//! and logging setup.

pub mod error;
pub mod logging;
pub mod usb_types;

pub use error::{Error, Result};
pub use logging::setup_logging;
pub use usb_types::{HubIdentity, MAX_HUB_INSTANCE, MAX_HUB_PORT, PortRequest, parse_hex_id};
