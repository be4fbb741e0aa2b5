//! Test doubles shared by the link and device tests.

use std::collections::VecDeque;
use std::io::{Read, Write};

use crate::error::Result;
use crate::port::Port;

/// Scripted serial port double.
///
/// Reads pop from a pre-loaded buffer; once it is drained, reads return
/// zero bytes the way a real port reports an expired read timeout.
/// Writes are captured for assertions.
pub(crate) struct MockSerial {
    read_buf: VecDeque<u8>,
    write_buf: Vec<u8>,
    broken: bool,
}

impl MockSerial {
    pub(crate) fn new(response: &[u8]) -> Self {
        Self {
            read_buf: response.iter().copied().collect(),
            write_buf: Vec::new(),
            broken: false,
        }
    }

    /// A port whose every operation fails with an I/O error.
    pub(crate) fn broken() -> Self {
        Self {
            read_buf: VecDeque::new(),
            write_buf: Vec::new(),
            broken: true,
        }
    }

    pub(crate) fn written(&self) -> &[u8] {
        &self.write_buf
    }
}

impl Read for MockSerial {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if self.broken {
            return Err(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "broken port",
            ));
        }
        let n = buf.len().min(self.read_buf.len());
        for b in buf.iter_mut().take(n) {
            *b = self.read_buf.pop_front().unwrap();
        }
        Ok(n)
    }
}

impl Write for MockSerial {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if self.broken {
            return Err(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "broken port",
            ));
        }
        self.write_buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Port for MockSerial {
    fn name(&self) -> &str {
        "mock"
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}
