//! Bootloader session: one method per protocol command.
//!
//! A [`Bootloader`] composes the command codec with the link layer. It
//! holds no state beyond the port itself; every call is an independent
//! request/reply exchange. [`Bootloader::synchronize`] must be the first
//! call of a session. Nothing enforces this in software; an
//! unsynchronized device simply never acknowledges.

use byteorder::{BigEndian, ByteOrder};
use log::debug;

use crate::error::{Error, Result};
use crate::link::Link;
use crate::port::Port;
use crate::protocol::command::{AccessWidth, CcfgField, Command, Status};

/// A session with the ROM bootloader over an exclusively owned port.
///
/// Created over an already-open, already-configured port; torn down by
/// dropping the session (or [`Bootloader::into_port`] to reclaim the
/// port and close it).
pub struct Bootloader<P: Port> {
    link: Link<P>,
}

impl<P: Port> Bootloader<P> {
    /// Create a session over an already-open port.
    ///
    /// The port's read timeout must already be configured; the link
    /// layer counts its bounded retries on top of it.
    pub fn new(port: P) -> Self {
        Self {
            link: Link::new(port),
        }
    }

    /// Get a reference to the underlying port.
    pub fn port(&self) -> &P {
        self.link.port()
    }

    /// Get a mutable reference to the underlying port.
    pub fn port_mut(&mut self) -> &mut P {
        self.link.port_mut()
    }

    /// Consume the session and return the underlying port.
    pub fn into_port(self) -> P {
        self.link.into_port()
    }

    /// Perform the sync handshake. Must be the first call of a session.
    pub fn synchronize(&mut self) -> Result<()> {
        self.link.synchronize()
    }

    /// Probe that the bootloader is alive.
    pub fn ping(&mut self) -> Result<()> {
        self.execute(&Command::ping())
    }

    /// Announce where the following [`Self::send_data`] bytes go in
    /// flash and how many will arrive in total.
    ///
    /// Follow with [`Self::get_status`] to confirm the address and size
    /// are valid for the device.
    pub fn download(&mut self, address: u32, size: u32) -> Result<()> {
        self.execute(&Command::download(address, size))
    }

    /// Transfer the next chunk of a programming sequence.
    ///
    /// Must follow a [`Self::download`] or a prior `send_data`; the
    /// device advances the program address itself and ends programming
    /// once the announced byte count has arrived. Follow each chunk with
    /// [`Self::get_status`] to confirm it was programmed.
    pub fn send_data(&mut self, data: &[u8]) -> Result<()> {
        self.execute(&Command::send_data(data)?)
    }

    /// Erase the flash sector containing `address`.
    pub fn sector_erase(&mut self, address: u32) -> Result<()> {
        self.execute(&Command::sector_erase(address))
    }

    /// Erase all unprotected flash banks.
    pub fn bank_erase(&mut self) -> Result<()> {
        self.execute(&Command::bank_erase())
    }

    /// Query the status of the last command.
    pub fn get_status(&mut self) -> Result<Status> {
        let reply = self.execute_with_reply(&Command::get_status())?;
        if reply.len() != 1 {
            return Err(Error::Protocol(format!(
                "status reply should be 1 byte, got {}",
                reply.len()
            )));
        }
        let status = Status::from(reply[0]);
        debug!("Device status: {status}");
        Ok(status)
    }

    /// Execute a system reset. The device leaves the bootloader.
    pub fn reset(&mut self) -> Result<()> {
        self.execute(&Command::reset())
    }

    /// Read the chip identifier.
    pub fn get_chip_id(&mut self) -> Result<u32> {
        let reply = self.execute_with_reply(&Command::get_chip_id())?;
        if reply.len() != 4 {
            return Err(Error::Protocol(format!(
                "chip id reply should be 4 bytes, got {}",
                reply.len()
            )));
        }
        Ok(BigEndian::read_u32(&reply))
    }

    /// Compute a CRC32 over `size` bytes of memory starting at
    /// `address`, re-reading each location `repeat_count` times.
    pub fn crc32(&mut self, address: u32, size: u32, repeat_count: u32) -> Result<u32> {
        let reply = self.execute_with_reply(&Command::crc32(address, size, repeat_count))?;
        if reply.len() != 4 {
            return Err(Error::Protocol(format!(
                "CRC32 reply should be 4 bytes, got {}",
                reply.len()
            )));
        }
        Ok(BigEndian::read_u32(&reply))
    }

    /// Read `count` elements of `width` from memory at `address`.
    pub fn memory_read(
        &mut self,
        address: u32,
        width: AccessWidth,
        count: u8,
    ) -> Result<Vec<u8>> {
        let cmd = Command::memory_read(address, width, count)?;
        let reply = self.execute_with_reply(&cmd)?;
        let expected = usize::from(count) * width.element_size();
        if reply.len() != expected {
            return Err(Error::Protocol(format!(
                "memory read reply should be {expected} bytes, got {}",
                reply.len()
            )));
        }
        Ok(reply)
    }

    /// Write `data` to memory at `address` with `width` granularity.
    pub fn memory_write(&mut self, address: u32, width: AccessWidth, data: &[u8]) -> Result<()> {
        self.execute(&Command::memory_write(address, width, data)?)
    }

    /// Program one customer-configuration field.
    ///
    /// CCFG writes go through the flash controller; follow with
    /// [`Self::get_status`] like any other flash mutation.
    pub fn set_ccfg(&mut self, field: CcfgField, value: u32) -> Result<()> {
        self.execute(&Command::set_ccfg(field, value))
    }

    fn execute(&mut self, cmd: &Command) -> Result<()> {
        debug!("Issuing {}", cmd.kind());
        self.link.send_packet(&cmd.encode())
    }

    fn execute_with_reply(&mut self, cmd: &Command) -> Result<Vec<u8>> {
        self.execute(cmd)?;
        self.link.receive_packet()
    }
}
