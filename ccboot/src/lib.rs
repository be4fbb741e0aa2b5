//! # ccboot
//!
//! A client library for the serial ROM bootloader built into TI
//! CC13xx/CC26xx microcontrollers (SWCU117 §8.2).
//!
//! This crate provides the core functionality for talking to the
//! bootloader over a serial port, including:
//!
//! - The sync handshake and the ACK/NACK frame retry protocol
//! - Packet framing with size/checksum validation
//! - Typed builders for every bootloader command, with per-command
//!   parameter constraints checked before any I/O
//!
//! The protocol layer is generic over a [`Port`], so it runs against
//! anything that provides a blocking byte channel with a bounded
//! per-read timeout.
//!
//! ## Features
//!
//! - `native` (default): serial port support via the `serialport` crate
//! - `serde`: serialization support for the protocol value types
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use ccboot::{Bootloader, NativePort, SerialConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config =
//!         SerialConfig::new("/dev/ttyUSB0", 115200).with_timeout(Duration::from_millis(100));
//!     let port = NativePort::open(&config)?;
//!
//!     let mut device = Bootloader::new(port);
//!     device.synchronize()?;
//!
//!     let chip_id = device.get_chip_id()?;
//!     println!("Chip ID: {chip_id:#010x}");
//!
//!     // Flash mutations report their outcome via GetStatus.
//!     device.sector_erase(0x0000_1000)?;
//!     let status = device.get_status()?;
//!     println!("Erase: {status}");
//!
//!     device.reset()?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod device;
pub mod error;
pub mod link;
pub mod port;
pub mod protocol;

#[cfg(test)]
pub(crate) mod testutil;

// Re-exports for convenience
// Native-specific re-exports
#[cfg(feature = "native")]
pub use port::NativePort;
pub use {
    device::Bootloader,
    error::{Error, Result},
    link::Link,
    port::{Port, SerialConfig},
    protocol::{
        command::SEND_DATA_MAX_LEN,
        packet::{ACK, MAX_PAYLOAD_LEN, NACK, SYNC},
        AccessWidth, CcfgField, Command, CommandKind, Status,
    },
};
