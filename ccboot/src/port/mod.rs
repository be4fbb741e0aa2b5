//! Port abstraction for the serial link to the bootloader.
//!
//! The protocol layer is generic over a [`Port`], keeping it independent
//! of how the byte channel is opened and configured:
//!
//! ```text
//! +------------------+
//! |  Protocol layer  |
//! |  (link, device)  |
//! +--------+---------+
//!          |
//!          v
//! +--------+---------+
//! |    Port trait    |
//! +--------+---------+
//!          |
//!          v
//! +--------+---------+
//! | Native SerialPort|
//! |   (serialport)   |
//! +------------------+
//! ```
//!
//! ## Contract
//!
//! A `Port` is a blocking duplex byte channel with a pre-configured
//! per-read timeout. `read` must return within that timeout, reporting an
//! expired wait either as `Ok(0)` or as an `io::ErrorKind::TimedOut`
//! error; it must never block indefinitely. The protocol layer assumes
//! the timeout is short relative to the byte cadence of the device.

#[cfg(feature = "native")]
pub mod native;

use std::io::{Read, Write};
use std::time::Duration;

use crate::error::Result;

/// Serial port configuration.
///
/// The ROM bootloader link is always 8 data bits, no parity, one stop
/// bit; only the parameters that actually vary are exposed.
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Port name/path (e.g., "/dev/ttyUSB0", "COM3").
    pub port_name: String,
    /// Baud rate.
    pub baud_rate: u32,
    /// Per-read timeout.
    pub timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port_name: String::new(),
            baud_rate: 115200,
            timeout: Duration::from_millis(1000),
        }
    }
}

impl SerialConfig {
    /// Create a new configuration with port name and baud rate.
    pub fn new(port_name: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            port_name: port_name.into(),
            baud_rate,
            ..Default::default()
        }
    }

    /// Set the per-read timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Blocking byte channel to the bootloader.
pub trait Port: Read + Write + Send {
    /// The port name/path, for diagnostics.
    fn name(&self) -> &str;

    /// Close the port and release resources.
    ///
    /// After calling this method, the port cannot be used for further I/O.
    fn close(&mut self) -> Result<()>;
}

// Re-export the appropriate implementation based on features
#[cfg(feature = "native")]
pub use native::NativePort;
