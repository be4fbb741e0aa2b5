//! Bootloader commands and value types.
//!
//! A command travels as the payload of a packet frame:
//!
//! ```text
//! +------+---------------------------+
//! | Kind |        Parameters         |
//! +------+---------------------------+
//! | 1    |   command-specific bytes  |
//! +------+---------------------------+
//! ```
//!
//! All multi-byte parameter fields are big-endian, matching the
//! bootloader's register layout. Constructors that take caller data
//! enforce the per-command size and alignment constraints, so an
//! oversized request is rejected before anything is written to the wire.

use std::fmt;

use byteorder::{BigEndian, WriteBytesExt};

use crate::error::{Error, Result};
use crate::protocol::packet::MAX_PAYLOAD_LEN;

/// Maximum data bytes a single SendData command can carry.
///
/// One payload byte is consumed by the command kind.
pub const SEND_DATA_MAX_LEN: usize = MAX_PAYLOAD_LEN - 1;

/// Command type bytes understood by the ROM bootloader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum CommandKind {
    /// Probe that the bootloader is alive (ACK only).
    Ping = 0x20,
    /// Announce a flash program address and total byte count.
    Download = 0x21,
    /// Query the status of the last command.
    GetStatus = 0x23,
    /// Transfer the next chunk of a programming sequence.
    SendData = 0x24,
    /// Execute a system reset.
    Reset = 0x25,
    /// Erase one flash sector.
    SectorErase = 0x26,
    /// Compute a CRC32 over a memory range.
    Crc32 = 0x27,
    /// Read the chip identifier.
    GetChipId = 0x28,
    /// Read device memory.
    MemoryRead = 0x2A,
    /// Write device memory.
    MemoryWrite = 0x2B,
    /// Erase all unprotected flash banks.
    BankErase = 0x2C,
    /// Program one customer-configuration field.
    SetCcfg = 0x2D,
}

impl CommandKind {
    /// Look up a command kind from its wire byte.
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0x20 => Some(Self::Ping),
            0x21 => Some(Self::Download),
            0x23 => Some(Self::GetStatus),
            0x24 => Some(Self::SendData),
            0x25 => Some(Self::Reset),
            0x26 => Some(Self::SectorErase),
            0x27 => Some(Self::Crc32),
            0x28 => Some(Self::GetChipId),
            0x2A => Some(Self::MemoryRead),
            0x2B => Some(Self::MemoryWrite),
            0x2C => Some(Self::BankErase),
            0x2D => Some(Self::SetCcfg),
            _ => None,
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ping => "PING",
            Self::Download => "DOWNLOAD",
            Self::GetStatus => "GET_STATUS",
            Self::SendData => "SEND_DATA",
            Self::Reset => "RESET",
            Self::SectorErase => "SECTOR_ERASE",
            Self::Crc32 => "CRC32",
            Self::GetChipId => "GET_CHIP_ID",
            Self::MemoryRead => "MEMORY_READ",
            Self::MemoryWrite => "MEMORY_WRITE",
            Self::BankErase => "BANK_ERASE",
            Self::SetCcfg => "SET_CCFG",
        };
        f.write_str(name)
    }
}

/// Status byte returned by the GetStatus command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Status {
    /// Last command completed successfully.
    Success,
    /// Command byte was not recognized.
    UnknownCmd,
    /// Command was recognized but malformed.
    InvalidCmd,
    /// Address parameter was out of range.
    InvalidAddr,
    /// Flash programming or erase failed.
    FlashFail,
    /// Raw value outside the documented set.
    Other(u8),
}

impl Status {
    /// Whether this status reports success.
    pub fn is_success(self) -> bool {
        self == Self::Success
    }
}

impl From<u8> for Status {
    fn from(raw: u8) -> Self {
        match raw {
            0x40 => Self::Success,
            0x41 => Self::UnknownCmd,
            0x42 => Self::InvalidCmd,
            0x43 => Self::InvalidAddr,
            0x44 => Self::FlashFail,
            other => Self::Other(other),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("SUCCESS"),
            Self::UnknownCmd => f.write_str("UNKNOWN_CMD"),
            Self::InvalidCmd => f.write_str("INVALID_CMD"),
            Self::InvalidAddr => f.write_str("INVALID_ADDR"),
            Self::FlashFail => f.write_str("FLASH_FAIL"),
            Self::Other(raw) => write!(f, "{raw:#04x}"),
        }
    }
}

/// Memory access granularity for MemoryRead and MemoryWrite.
///
/// Each width has its own element-count ceiling because the whole frame
/// is capped at 255 bytes and the command header consumes the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum AccessWidth {
    /// Byte-wise access.
    Bits8 = 0,
    /// Word-wise (32-bit) access.
    Bits32 = 1,
}

impl AccessWidth {
    /// Maximum element count for an 8-bit MemoryRead.
    pub const MAX_READ_COUNT_8BIT: u8 = 253;
    /// Maximum element count for a 32-bit MemoryRead.
    pub const MAX_READ_COUNT_32BIT: u8 = 63;
    /// Maximum data bytes for an 8-bit MemoryWrite.
    pub const MAX_WRITE_LEN_8BIT: usize = 247;
    /// Maximum data bytes for a 32-bit MemoryWrite.
    pub const MAX_WRITE_LEN_32BIT: usize = 244;

    fn max_read_count(self) -> u8 {
        match self {
            Self::Bits8 => Self::MAX_READ_COUNT_8BIT,
            Self::Bits32 => Self::MAX_READ_COUNT_32BIT,
        }
    }

    fn max_write_len(self) -> usize {
        match self {
            Self::Bits8 => Self::MAX_WRITE_LEN_8BIT,
            Self::Bits32 => Self::MAX_WRITE_LEN_32BIT,
        }
    }

    /// Size in bytes of one element at this width.
    pub fn element_size(self) -> usize {
        match self {
            Self::Bits8 => 1,
            Self::Bits32 => 4,
        }
    }
}

impl fmt::Display for AccessWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bits8 => f.write_str("8BIT"),
            Self::Bits32 => f.write_str("32BIT"),
        }
    }
}

/// Customer-configuration fields programmable via SetCCFG.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u32)]
pub enum CcfgField {
    /// Flash sector write protection.
    SectorProt = 0,
    /// Image-valid marker.
    ImageValid = 1,
    /// Test TAP lock.
    TestTapLck = 2,
    /// PRCM TAP lock.
    PrcmTapLck = 3,
    /// CPU DAP lock.
    CpuDapLck = 4,
    /// WUC TAP lock.
    WucTapLck = 5,
    /// PBIST1 TAP lock.
    Pbist1TapLck = 6,
    /// PBIST2 TAP lock.
    Pbist2TapLck = 7,
    /// Disable the BankErase command.
    BankEraseDis = 8,
    /// Disable chip erase.
    ChipEraseDis = 9,
    /// TI failure-analysis access.
    TiFaEnable = 10,
    /// Bootloader backdoor enable.
    BlBackdoorEn = 11,
    /// Bootloader backdoor pin number.
    BlBackdoorPin = 12,
    /// Bootloader backdoor active level.
    BlBackdoorLevel = 13,
    /// Bootloader enable.
    BlEnable = 14,
}

/// A bootloader command: kind byte plus its parameter bytes.
///
/// Built via the per-command constructors and serialized with
/// [`Command::encode`] into a packet payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    kind: CommandKind,
    parameters: Vec<u8>,
}

impl Command {
    fn new(kind: CommandKind) -> Self {
        Self {
            kind,
            parameters: Vec::new(),
        }
    }

    /// Build a Ping command.
    pub fn ping() -> Self {
        Self::new(CommandKind::Ping)
    }

    /// Build a Download command announcing a program address and size.
    #[allow(clippy::unwrap_used)] // Writing to Vec<u8> cannot fail
    pub fn download(address: u32, size: u32) -> Self {
        let mut cmd = Self::new(CommandKind::Download);
        cmd.parameters.write_u32::<BigEndian>(address).unwrap();
        cmd.parameters.write_u32::<BigEndian>(size).unwrap();
        cmd
    }

    /// Build a SendData command carrying the next program chunk.
    ///
    /// At most [`SEND_DATA_MAX_LEN`] bytes fit in one command.
    pub fn send_data(data: &[u8]) -> Result<Self> {
        if data.len() > SEND_DATA_MAX_LEN {
            return Err(Error::BadArguments(format!(
                "SendData carries at most {SEND_DATA_MAX_LEN} bytes, got {}",
                data.len()
            )));
        }
        let mut cmd = Self::new(CommandKind::SendData);
        cmd.parameters.extend_from_slice(data);
        Ok(cmd)
    }

    /// Build a SectorErase command for the sector containing `address`.
    #[allow(clippy::unwrap_used)] // Writing to Vec<u8> cannot fail
    pub fn sector_erase(address: u32) -> Self {
        let mut cmd = Self::new(CommandKind::SectorErase);
        cmd.parameters.write_u32::<BigEndian>(address).unwrap();
        cmd
    }

    /// Build a GetStatus command.
    pub fn get_status() -> Self {
        Self::new(CommandKind::GetStatus)
    }

    /// Build a Reset command.
    pub fn reset() -> Self {
        Self::new(CommandKind::Reset)
    }

    /// Build a GetChipId command.
    pub fn get_chip_id() -> Self {
        Self::new(CommandKind::GetChipId)
    }

    /// Build a CRC32 command over `size` bytes starting at `address`.
    ///
    /// `repeat_count` is the number of times the bootloader re-reads each
    /// location before accumulating it (0 for a plain read).
    #[allow(clippy::unwrap_used)] // Writing to Vec<u8> cannot fail
    pub fn crc32(address: u32, size: u32, repeat_count: u32) -> Self {
        let mut cmd = Self::new(CommandKind::Crc32);
        cmd.parameters.write_u32::<BigEndian>(address).unwrap();
        cmd.parameters.write_u32::<BigEndian>(size).unwrap();
        cmd.parameters.write_u32::<BigEndian>(repeat_count).unwrap();
        cmd
    }

    /// Build a BankErase command.
    pub fn bank_erase() -> Self {
        Self::new(CommandKind::BankErase)
    }

    /// Build a MemoryRead command for `count` elements of `width`.
    #[allow(clippy::unwrap_used)] // Writing to Vec<u8> cannot fail
    pub fn memory_read(address: u32, width: AccessWidth, count: u8) -> Result<Self> {
        if count > width.max_read_count() {
            return Err(Error::BadArguments(format!(
                "MemoryRead in {width} mode reads at most {} elements, got {count}",
                width.max_read_count()
            )));
        }
        let mut cmd = Self::new(CommandKind::MemoryRead);
        cmd.parameters.write_u32::<BigEndian>(address).unwrap();
        cmd.parameters.push(width as u8);
        cmd.parameters.push(count);
        Ok(cmd)
    }

    /// Build a MemoryWrite command carrying `data` at `width` granularity.
    ///
    /// In 32-bit mode the data length must be a multiple of 4; an
    /// unaligned word write is undefined on the device side.
    #[allow(clippy::unwrap_used)] // Writing to Vec<u8> cannot fail
    pub fn memory_write(address: u32, width: AccessWidth, data: &[u8]) -> Result<Self> {
        if data.len() > width.max_write_len() {
            return Err(Error::BadArguments(format!(
                "MemoryWrite in {width} mode carries at most {} bytes, got {}",
                width.max_write_len(),
                data.len()
            )));
        }
        if width == AccessWidth::Bits32 && data.len() % 4 != 0 {
            return Err(Error::BadArguments(format!(
                "MemoryWrite in 32BIT mode needs a multiple of 4 bytes, got {}",
                data.len()
            )));
        }
        let mut cmd = Self::new(CommandKind::MemoryWrite);
        cmd.parameters.write_u32::<BigEndian>(address).unwrap();
        cmd.parameters.push(width as u8);
        cmd.parameters.extend_from_slice(data);
        Ok(cmd)
    }

    /// Build a SetCCFG command programming `field` to `value`.
    #[allow(clippy::unwrap_used)] // Writing to Vec<u8> cannot fail
    pub fn set_ccfg(field: CcfgField, value: u32) -> Self {
        let mut cmd = Self::new(CommandKind::SetCcfg);
        cmd.parameters.write_u32::<BigEndian>(field as u32).unwrap();
        cmd.parameters.write_u32::<BigEndian>(value).unwrap();
        cmd
    }

    /// The command kind.
    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    /// The raw parameter bytes.
    pub fn parameters(&self) -> &[u8] {
        &self.parameters
    }

    /// Serialize into a packet payload: `[kind] ++ parameters`.
    pub fn encode(&self) -> Vec<u8> {
        let mut payload = Vec::with_capacity(1 + self.parameters.len());
        payload.push(self.kind as u8);
        payload.extend_from_slice(&self.parameters);
        payload
    }

    /// Deserialize a packet payload back into a typed command.
    ///
    /// An empty payload, or a kind byte outside the command enumeration,
    /// fails with [`Error::BadPacket`].
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let (&raw, parameters) = payload
            .split_first()
            .ok_or_else(|| Error::BadPacket("empty command payload".into()))?;
        let kind = CommandKind::from_raw(raw).ok_or_else(|| {
            Error::BadPacket(format!("unknown command kind {raw:#04x}"))
        })?;
        Ok(Self {
            kind,
            parameters: parameters.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_roundtrip() {
        for kind in [
            CommandKind::Ping,
            CommandKind::Download,
            CommandKind::GetStatus,
            CommandKind::SendData,
            CommandKind::Reset,
            CommandKind::SectorErase,
            CommandKind::Crc32,
            CommandKind::GetChipId,
            CommandKind::MemoryRead,
            CommandKind::MemoryWrite,
            CommandKind::BankErase,
            CommandKind::SetCcfg,
        ] {
            assert_eq!(CommandKind::from_raw(kind as u8), Some(kind));
        }
        assert_eq!(CommandKind::from_raw(0x22), None);
        assert_eq!(CommandKind::from_raw(0xFF), None);
    }

    #[test]
    fn test_download_layout() {
        let cmd = Command::download(0x00201000, 0x2000);
        let payload = cmd.encode();
        assert_eq!(
            payload,
            vec![0x21, 0x00, 0x20, 0x10, 0x00, 0x00, 0x00, 0x20, 0x00]
        );
    }

    #[test]
    fn test_sector_erase_layout() {
        let cmd = Command::sector_erase(0xDEADBEEF);
        assert_eq!(cmd.encode(), vec![0x26, 0xDE, 0xAD, 0xBE, 0xEF]);
    }

    #[test]
    fn test_crc32_layout() {
        let cmd = Command::crc32(0x1000, 0x200, 3);
        assert_eq!(
            cmd.encode(),
            vec![
                0x27, 0x00, 0x00, 0x10, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00,
                0x00, 0x00, 0x03
            ]
        );
    }

    #[test]
    fn test_parameterless_commands() {
        assert_eq!(Command::ping().encode(), vec![0x20]);
        assert_eq!(Command::get_status().encode(), vec![0x23]);
        assert_eq!(Command::reset().encode(), vec![0x25]);
        assert_eq!(Command::get_chip_id().encode(), vec![0x28]);
        assert_eq!(Command::bank_erase().encode(), vec![0x2C]);
    }

    #[test]
    fn test_send_data_limits() {
        assert!(Command::send_data(&[0xAB; SEND_DATA_MAX_LEN]).is_ok());
        assert!(matches!(
            Command::send_data(&[0xAB; SEND_DATA_MAX_LEN + 1]),
            Err(Error::BadArguments(_))
        ));
    }

    #[test]
    fn test_memory_read_limits() {
        assert!(Command::memory_read(0, AccessWidth::Bits8, 253).is_ok());
        assert!(matches!(
            Command::memory_read(0, AccessWidth::Bits8, 254),
            Err(Error::BadArguments(_))
        ));
        assert!(Command::memory_read(0, AccessWidth::Bits32, 63).is_ok());
        assert!(matches!(
            Command::memory_read(0, AccessWidth::Bits32, 64),
            Err(Error::BadArguments(_))
        ));
    }

    #[test]
    fn test_memory_read_layout() {
        let cmd = Command::memory_read(0x40001234, AccessWidth::Bits32, 2).unwrap();
        assert_eq!(cmd.encode(), vec![0x2A, 0x40, 0x00, 0x12, 0x34, 0x01, 0x02]);
    }

    #[test]
    fn test_memory_write_limits() {
        assert!(Command::memory_write(0, AccessWidth::Bits8, &[0u8; 247]).is_ok());
        assert!(matches!(
            Command::memory_write(0, AccessWidth::Bits8, &[0u8; 248]),
            Err(Error::BadArguments(_))
        ));
        assert!(Command::memory_write(0, AccessWidth::Bits32, &[0u8; 244]).is_ok());
        assert!(matches!(
            Command::memory_write(0, AccessWidth::Bits32, &[0u8; 245]),
            Err(Error::BadArguments(_))
        ));
    }

    #[test]
    fn test_memory_write_32bit_alignment() {
        assert!(matches!(
            Command::memory_write(0, AccessWidth::Bits32, &[0u8; 6]),
            Err(Error::BadArguments(_))
        ));
        assert!(Command::memory_write(0, AccessWidth::Bits32, &[0u8; 8]).is_ok());
        // 8-bit mode has no alignment requirement.
        assert!(Command::memory_write(0, AccessWidth::Bits8, &[0u8; 6]).is_ok());
    }

    #[test]
    fn test_set_ccfg_uses_own_kind_byte() {
        let cmd = Command::set_ccfg(CcfgField::BlEnable, 0xC5);
        let payload = cmd.encode();
        assert_eq!(payload[0], CommandKind::SetCcfg as u8);
        assert_eq!(
            payload,
            vec![0x2D, 0x00, 0x00, 0x00, 0x0E, 0x00, 0x00, 0x00, 0xC5]
        );
    }

    #[test]
    fn test_decode() {
        let cmd = Command::decode(&[0x21, 0x00, 0x00, 0x10, 0x00]).unwrap();
        assert_eq!(cmd.kind(), CommandKind::Download);
        assert_eq!(cmd.parameters(), &[0x00, 0x00, 0x10, 0x00]);
    }

    #[test]
    fn test_decode_empty_payload() {
        assert!(matches!(Command::decode(&[]), Err(Error::BadPacket(_))));
    }

    #[test]
    fn test_decode_unknown_kind() {
        assert!(matches!(
            Command::decode(&[0x99, 0x01]),
            Err(Error::BadPacket(_))
        ));
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let cmd = Command::memory_write(0x2000_0000, AccessWidth::Bits8, &[1, 2, 3]).unwrap();
        assert_eq!(Command::decode(&cmd.encode()).unwrap(), cmd);
    }

    #[test]
    fn test_status_from_raw() {
        assert_eq!(Status::from(0x40), Status::Success);
        assert_eq!(Status::from(0x41), Status::UnknownCmd);
        assert_eq!(Status::from(0x42), Status::InvalidCmd);
        assert_eq!(Status::from(0x43), Status::InvalidAddr);
        assert_eq!(Status::from(0x44), Status::FlashFail);
        assert_eq!(Status::from(0x7F), Status::Other(0x7F));
        assert!(Status::from(0x40).is_success());
        assert!(!Status::from(0x44).is_success());
    }

    #[test]
    fn test_display_rendering() {
        assert_eq!(CommandKind::GetChipId.to_string(), "GET_CHIP_ID");
        assert_eq!(Status::Success.to_string(), "SUCCESS");
        assert_eq!(Status::Other(0x7F).to_string(), "0x7f");
        assert_eq!(AccessWidth::Bits32.to_string(), "32BIT");
    }

    #[test]
    fn test_ccfg_field_values() {
        assert_eq!(CcfgField::SectorProt as u32, 0);
        assert_eq!(CcfgField::BlBackdoorEn as u32, 11);
        assert_eq!(CcfgField::BlEnable as u32, 14);
    }
}
