//! Zig-zag varints as used for the first timestamp and the first delta

use crate::config::MAX_VARINT_LEN;

/// Decode an unsigned LEB128 varint from the start of `buf`.
///
/// Returns the value and the number of bytes consumed, or `None` when the
/// input ends mid-varint or the value overflows 64 bits.
pub fn decode_uvarint(buf: &[u8]) -> Option<(u64, usize)> {
    let mut value = 0u64;
    let mut shift = 0u32;

    for (i, &byte) in buf.iter().take(MAX_VARINT_LEN).enumerate() {
        if byte < 0x80 {
            if i == MAX_VARINT_LEN - 1 && byte > 1 {
                return None;
            }
            return Some((value | (byte as u64) << shift, i + 1));
        }
        value |= ((byte & 0x7f) as u64) << shift;
        shift += 7;
    }

    None
}

/// Decode a zig-zag signed varint from the start of `buf`
pub fn decode_varint(buf: &[u8]) -> Option<(i64, usize)> {
    let (ux, len) = decode_uvarint(buf)?;
    let mut x = (ux >> 1) as i64;
    if ux & 1 != 0 {
        x = !x;
    }
    Some((x, len))
}

/// Append `value` as an unsigned varint
pub fn encode_uvarint(mut value: u64, out: &mut Vec<u8>) {
    while value >= 0x80 {
        out.push(value as u8 | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

/// Append `value` as a zig-zag signed varint
pub fn encode_varint(value: i64, out: &mut Vec<u8>) {
    let mut ux = (value as u64) << 1;
    if value < 0 {
        ux = !ux;
    }
    encode_uvarint(ux, out);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(value: i64) -> Vec<u8> {
        let mut out = Vec::new();
        encode_varint(value, &mut out);
        out
    }

    #[test]
    fn test_known_encodings() {
        assert_eq!(encoded(0), vec![0x00]);
        assert_eq!(encoded(-1), vec![0x01]);
        assert_eq!(encoded(1), vec![0x02]);
        assert_eq!(encoded(-64), vec![0x7f]);
        assert_eq!(encoded(64), vec![0x80, 0x01]);
        // 7200000 ms, as written by Prometheus for its first timestamp
        assert_eq!(encoded(7_200_000), vec![0x80, 0xF4, 0xEE, 0x06]);
    }

    #[test]
    fn test_extremes() {
        for value in [i64::MIN, i64::MAX, i64::MIN + 1, -1_000_000_007] {
            let bytes = encoded(value);
            assert!(bytes.len() <= MAX_VARINT_LEN);
            assert_eq!(decode_varint(&bytes), Some((value, bytes.len())));
        }
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        let mut bytes = encoded(300);
        bytes.extend_from_slice(&[0xFF, 0xFF]);
        assert_eq!(decode_varint(&bytes), Some((300, 2)));
    }

    #[test]
    fn test_unterminated() {
        assert_eq!(decode_uvarint(&[]), None);
        assert_eq!(decode_uvarint(&[0x80, 0x80]), None);
    }

    #[test]
    fn test_overflow_rejected() {
        let mut bytes = vec![0xFF; 9];
        bytes.push(0x02);
        assert_eq!(decode_uvarint(&bytes), None);

        let mut bytes = vec![0xFF; 9];
        bytes.push(0x01);
        assert_eq!(decode_uvarint(&bytes), Some((u64::MAX, 10)));
    }
}
