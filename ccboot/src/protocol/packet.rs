//! Bootloader packet framing.
//!
//! Every exchange with the ROM bootloader is wrapped in the same frame:
//!
//! ```text
//! +------+----------+----------------------+
//! | Size | Checksum |       Payload        |
//! +------+----------+----------------------+
//! | 1    | 1        |   (size - 2) bytes   |
//! +------+----------+----------------------+
//! ```
//!
//! The size byte counts the whole frame (modulo 256), which caps the
//! payload at 253 bytes. The checksum is the 8-bit wrapping sum of the
//! payload bytes only; the size byte is not covered.

use crate::error::{Error, Result};

/// Sync words written by the host to start the handshake.
pub const SYNC: [u8; 2] = [0x55, 0x55];

/// Acknowledgment byte.
pub const ACK: u8 = 0xCC;

/// Negative acknowledgment byte.
pub const NACK: u8 = 0x33;

/// Maximum payload a single frame can carry.
///
/// The size byte covers itself and the checksum byte, so 255 - 2.
pub const MAX_PAYLOAD_LEN: usize = 253;

/// 8-bit wrapping sum over `data`.
pub fn checksum(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |sum, &b| sum.wrapping_add(b))
}

/// Wrap `payload` into a `[size][checksum][payload]` frame.
///
/// Payloads up to [`MAX_PAYLOAD_LEN`] are representable; there is no
/// error path. The size byte is the frame length modulo 256.
#[allow(clippy::cast_possible_truncation)]
pub fn encode(payload: &[u8]) -> Vec<u8> {
    let size = 2 + payload.len();
    let mut frame = Vec::with_capacity(size);
    frame.push(size as u8);
    frame.push(checksum(payload));
    frame.extend_from_slice(payload);
    frame
}

/// Validate a received frame and return its payload.
///
/// Fails with [`Error::BadPacket`] if the frame is shorter than the
/// 3-byte minimum, if the declared size byte does not match the frame
/// length (modulo 256), or if the checksum does not match.
#[allow(clippy::cast_possible_truncation)]
pub fn decode(frame: &[u8]) -> Result<&[u8]> {
    if frame.len() < 3 {
        return Err(Error::BadPacket(format!(
            "frame too short: {} bytes",
            frame.len()
        )));
    }
    if frame[0] != frame.len() as u8 {
        return Err(Error::BadPacket(format!(
            "size byte {:#04x} does not match frame length {}",
            frame[0],
            frame.len()
        )));
    }
    let sum = checksum(&frame[2..]);
    if sum != frame[1] {
        return Err(Error::BadPacket(format!(
            "checksum mismatch: expected {:#04x}, got {:#04x}",
            frame[1], sum
        )));
    }
    Ok(&frame[2..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_layout() {
        let frame = encode(&[0x20]);
        assert_eq!(frame, vec![0x03, 0x20, 0x20]);
    }

    #[test]
    fn test_encode_empty_payload() {
        let frame = encode(&[]);
        assert_eq!(frame, vec![0x02, 0x00]);
    }

    #[test]
    fn test_roundtrip() {
        let payloads: [&[u8]; 4] = [
            &[0x20],
            &[0x28, 0x01, 0x02, 0x03],
            &[0xFF; 253],
            &[0x00; 10],
        ];
        for payload in payloads {
            let frame = encode(payload);
            assert_eq!(decode(&frame).unwrap(), payload);
        }
    }

    #[test]
    fn test_decode_too_short() {
        assert!(matches!(decode(&[]), Err(Error::BadPacket(_))));
        assert!(matches!(decode(&[0x02, 0x00]), Err(Error::BadPacket(_))));
    }

    #[test]
    fn test_decode_corrupted_size() {
        let mut frame = encode(&[0x20, 0x21]);
        frame[0] = frame[0].wrapping_add(1);
        assert!(matches!(decode(&frame), Err(Error::BadPacket(_))));
    }

    #[test]
    fn test_decode_corrupted_checksum() {
        let mut frame = encode(&[0x20, 0x21]);
        frame[1] ^= 0xFF;
        assert!(matches!(decode(&frame), Err(Error::BadPacket(_))));
    }

    #[test]
    fn test_checksum_wraps_mod_256() {
        let data = vec![0x01; 256];
        assert_eq!(checksum(&data), 0x00);
    }

    #[test]
    fn test_checksum_ignores_header() {
        // Only the payload is summed; size and checksum bytes are not.
        let frame = encode(&[0x10, 0x20]);
        assert_eq!(frame[1], 0x30);
    }

    #[test]
    fn test_max_payload_size_byte() {
        let frame = encode(&[0xAA; MAX_PAYLOAD_LEN]);
        assert_eq!(frame[0], 0xFF);
        assert_eq!(frame.len(), 255);
    }
}
