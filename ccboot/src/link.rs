//! Link layer: synchronization handshake and ACK/NACK retry protocol.
//!
//! The bootloader pads idle time with zero bytes and may itself retry a
//! transmission, so byte-level reception has to tolerate arbitrary zero
//! padding ahead of a frame and spurious acknowledgment bytes. Recovery
//! is always a full-frame resend; the bootloader has no notion of
//! resuming a partial frame.
//!
//! Every operation here is blocking and half-duplex. Timeouts are
//! delegated to the port's configured per-read timeout; this layer only
//! counts bounded retry attempts on top of it.

use std::io::ErrorKind;
use std::thread;
use std::time::Duration;

use log::{debug, trace};

use crate::error::{Error, Result};
use crate::port::Port;
use crate::protocol::packet::{self, ACK, NACK, SYNC};

/// Retry budget shared by every link operation.
///
/// The link is a local point-to-point serial connection with known low
/// latency; a fixed small budget is the prescribed recovery, not backoff.
const MAX_ATTEMPTS: usize = 3;

/// Settle delay between writing the sync words and reading the reply.
const SYNC_SETTLE_DELAY: Duration = Duration::from_millis(10);

/// Reliable packet channel over a raw [`Port`].
///
/// Owns the port exclusively for its lifetime. Each logical exchange
/// (synchronize, send, receive) runs its own bounded retry loop.
pub struct Link<P: Port> {
    port: P,
}

impl<P: Port> Link<P> {
    /// Create a link over an already-open, already-configured port.
    pub fn new(port: P) -> Self {
        Self { port }
    }

    /// Get a reference to the underlying port.
    pub fn port(&self) -> &P {
        &self.port
    }

    /// Get a mutable reference to the underlying port.
    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    /// Consume the link and return the underlying port.
    pub fn into_port(self) -> P {
        self.port
    }

    /// Perform the sync handshake.
    ///
    /// Writes the `0x55 0x55` sync words and expects the two-byte reply
    /// `[0x00, ACK]`. A reply with the wrong byte count or wrong content
    /// consumes one attempt and the handshake restarts.
    pub fn synchronize(&mut self) -> Result<()> {
        for attempt in 1..=MAX_ATTEMPTS {
            trace!("Sync attempt {attempt}/{MAX_ATTEMPTS}");
            self.port.write_all(&SYNC)?;
            self.port.flush()?;
            thread::sleep(SYNC_SETTLE_DELAY);

            let mut reply = [0u8; 2];
            let n = self.read_once(&mut reply)?;
            if n != 2 {
                debug!("Sync reply was {n} bytes, retrying");
                continue;
            }
            if reply == [0x00, ACK] {
                debug!("Device synchronized on {}", self.port.name());
                return Ok(());
            }
            debug!("Unexpected sync reply {reply:02X?}, retrying");
        }

        Err(Error::Unresponsive(format!(
            "no sync reply after {MAX_ATTEMPTS} attempts"
        )))
    }

    /// Send one frame and wait for its acknowledgment.
    ///
    /// The whole frame is resent on NACK, on garbage in the ack position,
    /// and on an ack timeout. Transport errors are not retried.
    pub fn send_packet(&mut self, payload: &[u8]) -> Result<()> {
        let frame = packet::encode(payload);
        for attempt in 1..=MAX_ATTEMPTS {
            trace!(
                "Sending frame of {} bytes, attempt {attempt}/{MAX_ATTEMPTS}",
                frame.len()
            );
            self.port.write_all(&frame)?;
            self.port.flush()?;

            match self.recv_nonzero_byte() {
                Ok(ACK) => return Ok(()),
                Ok(NACK) => debug!("Frame NACKed, resending"),
                Ok(other) => debug!("Unexpected ack byte {other:#04x}, resending"),
                Err(Error::Timeout(_)) => debug!("No ack within budget, resending"),
                Err(e) => return Err(e),
            }
        }

        Err(Error::Unresponsive(format!(
            "frame not acknowledged after {MAX_ATTEMPTS} attempts"
        )))
    }

    /// Receive one frame and return its validated payload.
    ///
    /// Zero padding ahead of the leading size byte is discarded. A frame
    /// that fails size or checksum validation is NACKed and the receive
    /// restarts; a valid frame is ACKed.
    pub fn receive_packet(&mut self) -> Result<Vec<u8>> {
        for attempt in 1..=MAX_ATTEMPTS {
            let size = self.recv_nonzero_byte()?;
            let mut frame = vec![0u8; usize::from(size)];
            frame[0] = size;
            for slot in frame.iter_mut().skip(1) {
                *slot = self.recv_byte()?;
            }

            match packet::decode(&frame) {
                Ok(payload) => {
                    let payload = payload.to_vec();
                    self.send_ack(ACK)?;
                    trace!("Received frame of {} bytes", frame.len());
                    return Ok(payload);
                },
                Err(e) => {
                    debug!("Dropping frame (attempt {attempt}/{MAX_ATTEMPTS}): {e}");
                    self.send_ack(NACK)?;
                },
            }
        }

        Err(Error::Unresponsive(format!(
            "no valid frame after {MAX_ATTEMPTS} attempts"
        )))
    }

    /// One read call against the port's configured timeout.
    ///
    /// An expired timeout surfaces as `Ok(0)` whether the port reports it
    /// as a zero-length read or as `ErrorKind::TimedOut` (the `serialport`
    /// crate does the latter).
    fn read_once(&mut self, buf: &mut [u8]) -> Result<usize> {
        match self.port.read(buf) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(Error::Io(e)),
        }
    }

    /// Read one byte, allowing up to the tick budget of empty reads.
    fn recv_byte(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        let mut ticks = 0;
        loop {
            if ticks > MAX_ATTEMPTS {
                return Err(Error::Timeout("no byte within tick budget".into()));
            }
            if self.read_once(&mut buf)? == 0 {
                ticks += 1;
                continue;
            }
            return Ok(buf[0]);
        }
    }

    /// As [`Self::recv_byte`], but discard zero padding bytes.
    fn recv_nonzero_byte(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        let mut ticks = 0;
        loop {
            if ticks > MAX_ATTEMPTS {
                return Err(Error::Timeout("no nonzero byte within tick budget".into()));
            }
            if self.read_once(&mut buf)? == 0 {
                ticks += 1;
                continue;
            }
            if buf[0] == 0x00 {
                // idle padding
                continue;
            }
            return Ok(buf[0]);
        }
    }

    fn send_ack(&mut self, ack: u8) -> Result<()> {
        self.port.write_all(&[ack])?;
        self.port.flush()?;
        Ok(())
    }
}
