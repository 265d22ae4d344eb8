//! Common error types

use thiserror::Error;

/// Failures that end a run
///
/// Enumeration hiccups and configuration warnings are absorbed where they
/// happen and never show up here.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Usage error: {0}")]
    Usage(String),

    #[error("Unable to initialize libusb: {0}")]
    Session(String),

    #[error(
        "hub not found after {passes} attempts (vid 0x{vendor_id:04X}, pid 0x{product_id:04X}, instance {instance})"
    )]
    DeviceNotFound {
        vendor_id: u16,
        product_id: u16,
        instance: u8,
        passes: u32,
    },

    #[error("port {port} power request failed after {attempts} attempt(s): {reason}")]
    Transfer {
        port: u8,
        attempts: u32,
        reason: String,
    },

    #[error("Logging setup error: {0}")]
    Logging(String),
}

impl Error {
    /// Name of the stage that produced the error, for the final diagnostic
    pub fn stage(&self) -> &'static str {
        match self {
            Error::Usage(_) => "usage",
            Error::Session(_) => "session",
            Error::DeviceNotFound { .. } => "device locator",
            Error::Transfer { .. } => "port power",
            Error::Logging(_) => "logging setup",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
