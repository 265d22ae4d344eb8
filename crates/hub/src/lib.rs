//! hub-port-power library
//!
//! Finds one physical USB hub by VID:PID and instance, puts it in a known
//! configuration and sets or clears the power feature on one of its
//! downstream ports. The binary in `main.rs` is a thin CLI over [`usb`].

pub mod config;
pub mod console;
pub mod testing;
pub mod usb;

pub use config::HubPowerConfig;
pub use console::Console;
