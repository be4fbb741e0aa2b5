//! Wire protocol: packet framing and command encoding.

pub mod command;
pub mod packet;

// Re-export common types
pub use command::{AccessWidth, CcfgField, Command, CommandKind, Status};
pub use packet::{ACK, MAX_PAYLOAD_LEN, NACK, SYNC};
