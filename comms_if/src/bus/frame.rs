//! # Channel frame codec
//!
//! Every channel message is a single 64 bit frame holding one little-endian IEEE-754 double.

use byteorder::{ByteOrder, LittleEndian};

/// Number of bytes in a channel frame
pub const FRAME_LEN: usize = 8;

/// Encode a value into a channel frame.
pub fn encode(value: f64) -> [u8; FRAME_LEN] {
    let mut buf = [0u8; FRAME_LEN];
    LittleEndian::write_f64(&mut buf, value);
    buf
}

/// Decode a channel frame.
///
/// Frames shorter than [`FRAME_LEN`] yield `None`, any trailing bytes are ignored.
pub fn decode(bytes: &[u8]) -> Option<f64> {
    if bytes.len() < FRAME_LEN {
        return None;
    }

    Some(LittleEndian::read_f64(&bytes[..FRAME_LEN]))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_short_frame_is_no_data() {
        assert_eq!(decode(&[]), None);
        assert_eq!(decode(&[0u8; 7]), None);
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        let mut bytes = encode(-3.25).to_vec();
        bytes.extend_from_slice(&[0xff, 0xff]);

        assert_eq!(decode(&bytes), Some(-3.25));
    }

    #[test]
    fn test_little_endian_layout() {
        assert_eq!(encode(1.0), [0, 0, 0, 0, 0, 0, 0xf0, 0x3f]);
    }
}
