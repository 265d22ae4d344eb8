//! USB session lifecycle
//!
//! A [`Session`] owns the libusb context. It is opened once before any other
//! USB operation and released when it is dropped, which covers the normal
//! path and every early return alike.

use crate::console::Console;
use crate::usb::backend::UsbSession;
use common::Error;
use rusb::{Context, Device, LogLevel, UsbContext};
use tracing::debug;

pub struct Session {
    context: Context,
}

impl Session {
    /// Initialize libusb and report which library version is in use
    pub fn open(log_level: LogLevel, console: &Console) -> common::Result<Self> {
        let mut context = Context::new().map_err(|e| Error::Session(e.to_string()))?;
        context.set_log_level(log_level);

        let version = rusb::version();
        console.progress(format_args!(
            "Opened libusb: version {}.{}.{}.{}{}",
            version.major(),
            version.minor(),
            version.micro(),
            version.nano(),
            version.rc().unwrap_or("")
        ));

        debug!("USB session opened");
        Ok(Self { context })
    }
}

impl UsbSession for Session {
    type Candidate = Device<Context>;

    fn devices(&self) -> Result<Vec<Self::Candidate>, rusb::Error> {
        Ok(self.context.devices()?.iter().collect())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        debug!("Closing USB session");
    }
}
