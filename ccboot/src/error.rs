//! Error types for ccboot.

use std::io;
use thiserror::Error;

/// Result type for ccboot operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for ccboot operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error surfaced by the underlying transport.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serial port error.
    #[cfg(feature = "native")]
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// No byte arrived within the bounded tick budget.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// A received frame failed size or checksum validation.
    #[error("Malformed packet: {0}")]
    BadPacket(String),

    /// The retry budget was exhausted without a successful exchange.
    #[error("Device unresponsive: {0}")]
    Unresponsive(String),

    /// A parameter violates a command's size or alignment constraint.
    #[error("Invalid arguments: {0}")]
    BadArguments(String),

    /// A reply did not match the command's expected shape.
    #[error("Protocol error: {0}")]
    Protocol(String),
}
