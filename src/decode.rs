// FrameDecoder - SpikerBox serial frame decoding
//
// The amplifier streams 16-bit samples as pairs of bytes. The high byte of a
// pair has its most significant bit set (value > 127) and carries the upper
// 7 bits of the sample; the following byte carries the lower 7 bits. Bytes
// between recognized frames are discarded, which is how the decoder
// resynchronizes after a partial read.
//
// Two quirks of the wire format are preserved deliberately because the
// device's actual framing is only known from observed behavior:
// - Index 0 of every chunk is skipped; it may be the tail of a frame split
//   across the previous read boundary.
// - The final byte of a chunk is never examined as a frame start, so a high
//   byte arriving last in a chunk is dropped along with its sample.

/// Maximum value a decoded sample can take (7 + 7 payload bits).
pub const MAX_SAMPLE: u16 = 16_383;

/// Decode a raw byte chunk into 16-bit samples.
///
/// Malformed input never fails; it only yields fewer samples. Garbage bytes
/// between frames are skipped silently.
pub fn decode_frames(bytes: &[u8]) -> Vec<u16> {
    let mut samples = Vec::with_capacity(bytes.len() / 2);
    let mut i = 1usize;

    // The upper bound excludes the last byte: a frame start there would have
    // no low byte to pair with.
    while i + 1 < bytes.len() {
        if bytes[i] > 127 {
            let high = (bytes[i] & 127) as u16 * 128;
            i += 1;
            samples.push(high + bytes[i] as u16);
        }
        i += 1;
    }

    samples
}

/// Encode a sample as a {high, low} frame pair.
///
/// Inverse of [`decode_frames`] for sample values `0..=MAX_SAMPLE`. Used by
/// tests and replay-fixture generation.
pub fn encode_sample(sample: u16) -> [u8; 2] {
    debug_assert!(sample <= MAX_SAMPLE);
    [(sample / 128) as u8 | 0x80, (sample % 128) as u8]
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a chunk with a leading pad byte so that index 0 (always skipped)
    /// does not eat the first frame.
    fn chunk_of(samples: &[u16]) -> Vec<u8> {
        let mut bytes = vec![0u8];
        for &s in samples {
            bytes.extend_from_slice(&encode_sample(s));
        }
        bytes
    }

    #[test]
    fn test_round_trip() {
        let values = [0u16, 1, 127, 128, 500, 1000, 1500, 8191, MAX_SAMPLE];
        let bytes = chunk_of(&values);
        assert_eq!(decode_frames(&bytes), values);
    }

    #[test]
    fn test_index_zero_is_skipped() {
        // A valid frame starting at index 0 must not be decoded.
        let mut bytes = encode_sample(1000).to_vec();
        bytes.push(0);
        assert!(decode_frames(&bytes).is_empty());
    }

    #[test]
    fn test_no_marker_yields_empty() {
        let bytes: Vec<u8> = (0..=127).collect();
        assert!(decode_frames(&bytes).is_empty());
    }

    #[test]
    fn test_garbage_between_frames_is_discarded() {
        let mut bytes = vec![0u8];
        bytes.extend_from_slice(&encode_sample(500));
        bytes.push(17); // garbage
        bytes.extend_from_slice(&encode_sample(1000));
        bytes.push(99); // garbage
        bytes.extend_from_slice(&encode_sample(1500));
        bytes.push(0); // pad so the last frame is not at the chunk boundary
        assert_eq!(decode_frames(&bytes), vec![500, 1000, 1500]);
    }

    #[test]
    fn test_trailing_high_byte_is_dropped() {
        let mut bytes = vec![0u8];
        bytes.extend_from_slice(&encode_sample(2000));
        bytes.push(0x85); // frame start with no low byte
        assert_eq!(decode_frames(&bytes), vec![2000]);
    }

    #[test]
    fn test_empty_and_tiny_chunks() {
        assert!(decode_frames(&[]).is_empty());
        assert!(decode_frames(&[0x90]).is_empty());
        assert!(decode_frames(&[0x90, 0x10]).is_empty());
    }

    #[test]
    fn test_low_byte_never_reinterpreted_as_marker() {
        // Low byte 0x7F followed by another frame: scanning must jump past
        // the low byte, not inspect it.
        let mut bytes = vec![0u8, 0x80 | 0x01, 0x7F];
        bytes.extend_from_slice(&encode_sample(42));
        bytes.push(0);
        assert_eq!(decode_frames(&bytes), vec![128 + 127, 42]);
    }
}
