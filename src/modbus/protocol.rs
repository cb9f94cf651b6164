//! Request framing and response decoding for the single holding-register read
//! the sensor answers to.
//!
//! Responses are located by scanning for the `address, function, byte count`
//! header rather than by trusting the buffer start, since a read may begin in
//! the middle of a frame or carry leftover bytes from an earlier cycle.

use std::fmt;

use super::crc::crc16_modbus;

/// Response header: slave 1, function 3, 4 data bytes.
pub const FRAME_MARKER: [u8; 3] = [0x01, 0x03, 0x04];

/// Smallest buffer the decoder accepts (marker + payload + CRC).
pub const MIN_FRAME_LEN: usize = 9;

/// Q16.16 scale factor.
pub const Q16_SCALE: f64 = 65536.0;

/// Fixed 8-byte Modbus RTU request written to the sensor every poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestCommand([u8; 8]);

impl RequestCommand {
    /// Address 1, read holding registers, start 0, count 2.
    pub const READ_LENGTH: RequestCommand =
        RequestCommand([0x01, 0x03, 0x00, 0x00, 0x00, 0x02, 0xC4, 0x0B]);

    pub fn read_holding_registers(slave_id: u8, start_addr: u16, count: u16) -> Self {
        let mut frame = [0u8; 8];
        frame[0] = slave_id;
        frame[1] = 0x03;
        frame[2..4].copy_from_slice(&start_addr.to_be_bytes());
        frame[4..6].copy_from_slice(&count.to_be_bytes());

        let crc = crc16_modbus(&frame[..6]);
        frame[6..8].copy_from_slice(&crc.to_le_bytes());
        RequestCommand(frame)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Default for RequestCommand {
    fn default() -> Self {
        Self::READ_LENGTH
    }
}

impl fmt::Display for RequestCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode_upper(self.0))
    }
}

/// Where the decoder took its payload from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerSearch {
    /// The marker starts at this index.
    Found(usize),
    /// No marker in the buffer; decoding uses the last scanned index (`len - 8`).
    Fallback(usize),
}

impl MarkerSearch {
    pub fn offset(self) -> usize {
        match self {
            MarkerSearch::Found(i) | MarkerSearch::Fallback(i) => i,
        }
    }

    pub fn is_found(self) -> bool {
        matches!(self, MarkerSearch::Found(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodedFrame {
    pub search: MarkerSearch,
    pub raw: u32,
    pub length: f64,
}

/// Scans `0..=len-8` for the response header. `None` when the buffer is too short.
pub fn find_marker(buffer: &[u8]) -> Option<MarkerSearch> {
    if buffer.len() < MIN_FRAME_LEN {
        return None;
    }

    let last = buffer.len() - 8;
    let found = buffer[..last + FRAME_MARKER.len()]
        .windows(FRAME_MARKER.len())
        .position(|w| w == FRAME_MARKER);

    Some(match found {
        Some(i) => MarkerSearch::Found(i),
        None => MarkerSearch::Fallback(last),
    })
}

pub fn q16_16_to_f64(raw: u32) -> f64 {
    raw as f64 / Q16_SCALE
}

/// Decodes the big-endian Q16.16 payload following the marker.
///
/// Once the buffer holds at least [`MIN_FRAME_LEN`] bytes this always yields a
/// value, even when the marker was never seen.
pub fn decode_frame(buffer: &[u8]) -> Option<DecodedFrame> {
    let search = find_marker(buffer)?;
    let i = search.offset();

    let raw = u32::from_be_bytes([
        buffer[i + 3],
        buffer[i + 4],
        buffer[i + 5],
        buffer[i + 6],
    ]);

    Some(DecodedFrame {
        search,
        raw,
        length: q16_16_to_f64(raw),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn padded(bytes: &[u8], len: usize) -> Vec<u8> {
        let mut buf = bytes.to_vec();
        buf.resize(len, 0xAA);
        buf
    }

    #[test]
    fn test_request_matches_crc_builder() {
        assert_eq!(
            RequestCommand::read_holding_registers(1, 0, 2),
            RequestCommand::READ_LENGTH
        );
        assert_eq!(RequestCommand::default().to_string(), "010300000002C40B");
    }

    #[test]
    fn test_short_buffer_fails() {
        for len in 0..MIN_FRAME_LEN {
            let buf = padded(&FRAME_MARKER, len);
            assert!(decode_frame(&buf[..len]).is_none(), "len {}", len);
        }
    }

    #[test]
    fn test_decode_one() {
        let buf = padded(&[0x01, 0x03, 0x04, 0x00, 0x01, 0x00, 0x00], 9);
        let frame = decode_frame(&buf).unwrap();
        assert_eq!(frame.search, MarkerSearch::Found(0));
        assert_eq!(frame.raw, 0x0001_0000);
        assert_eq!(frame.length, 1.0);
    }

    #[test]
    fn test_decode_zero_payload() {
        let buf = padded(&[0x01, 0x03, 0x04, 0x00, 0x00, 0x00, 0x00], 9);
        assert_eq!(decode_frame(&buf).unwrap().length, 0.0);
    }

    #[test]
    fn test_decode_fractional() {
        // 0x00018000 = 1.5 in Q16.16
        let buf = padded(&[0x01, 0x03, 0x04, 0x00, 0x01, 0x80, 0x00], 9);
        assert_eq!(decode_frame(&buf).unwrap().length, 1.5);
    }

    #[test]
    fn test_marker_after_junk() {
        let buf = [
            0xFF, 0x7E, 0x10, 0x01, 0x03, 0x04, 0x00, 0x02, 0x00, 0x00, 0x5A, 0x5A,
        ];
        let frame = decode_frame(&buf).unwrap();
        assert_eq!(frame.search, MarkerSearch::Found(3));
        assert_eq!(frame.length, 2.0);
    }

    #[test]
    fn test_first_marker_wins() {
        let buf = [
            0x01, 0x03, 0x04, 0x00, 0x03, 0x00, 0x00, 0xAA, 0xBB, 0x01, 0x03, 0x04, 0x00,
            0x07, 0x00, 0x00, 0xAA, 0xBB,
        ];
        let frame = decode_frame(&buf).unwrap();
        assert_eq!(frame.search, MarkerSearch::Found(0));
        assert_eq!(frame.length, 3.0);
    }

    #[test]
    fn test_missing_marker_uses_fallback_offset() {
        for len in MIN_FRAME_LEN..64 {
            let buf: Vec<u8> = (0..len).map(|i| (i as u8).wrapping_mul(7) | 0x80).collect();
            let frame = decode_frame(&buf).unwrap();
            assert_eq!(frame.search, MarkerSearch::Fallback(len - 8));
            let i = len - 8;
            let expected = u32::from_be_bytes([buf[i + 3], buf[i + 4], buf[i + 5], buf[i + 6]]);
            assert_eq!(frame.raw, expected);
        }
    }

    #[test]
    fn test_marker_at_last_scanned_index() {
        let mut buf = vec![0x00; 16];
        buf[8..11].copy_from_slice(&FRAME_MARKER);
        buf[11..15].copy_from_slice(&0x0004_0000u32.to_be_bytes());
        let frame = decode_frame(&buf).unwrap();
        assert_eq!(frame.search, MarkerSearch::Found(8));
        assert_eq!(frame.length, 4.0);
    }

    #[test]
    fn test_marker_too_close_to_end_is_ignored() {
        let mut buf = vec![0x00; 12];
        buf[5..8].copy_from_slice(&FRAME_MARKER);
        let search = find_marker(&buf).unwrap();
        assert_eq!(search, MarkerSearch::Fallback(4));
        assert!(!search.is_found());
    }

    #[test]
    fn test_scaling_doubles() {
        for raw in [1u32, 0x0001_0000, 0x1234_5678, 0x7FFF_FFFF] {
            assert_eq!(q16_16_to_f64(raw * 2), q16_16_to_f64(raw) * 2.0);
        }
    }
}
