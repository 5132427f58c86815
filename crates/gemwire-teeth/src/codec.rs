use bytes::{BufMut, BytesMut};

use crate::error::{Result, TeethError};
use crate::{BYTES_PER_GROUP, GROUP_SIZE};

/// Encoded length for a source buffer of `src_len` bytes.
///
/// Always a multiple of [`GROUP_SIZE`]: `ceil(src_len / 4) * 5`.
pub fn encoded_length(src_len: usize) -> usize {
    src_len.div_ceil(BYTES_PER_GROUP) * GROUP_SIZE
}

/// Upper bound on the decoded length of an encoded buffer.
///
/// The exact length depends on the length markers of the final group.
pub fn decoded_capacity(encoded_len: usize) -> usize {
    encoded_len / GROUP_SIZE * BYTES_PER_GROUP
}

/// Teeth-encode `src` into a freshly allocated buffer.
pub fn encode(src: &[u8]) -> Vec<u8> {
    let mut dst = BytesMut::with_capacity(encoded_length(src.len()));
    encode_into(src, &mut dst);
    dst.to_vec()
}

/// Teeth-encode `src`, appending exactly [`encoded_length`] bytes to `dst`.
///
/// A trailing group with fewer than four source bytes is zero padded so the
/// output stays a whole number of groups.
pub fn encode_into(src: &[u8], dst: &mut BytesMut) {
    dst.reserve(encoded_length(src.len()));

    for chunk in src.chunks(BYTES_PER_GROUP) {
        // Upper nibble: meaningful byte count. Lower nibble: stripped MSBs,
        // first byte in bit 3.
        let mut header = (chunk.len() as u8) << 4;
        for (i, byte) in chunk.iter().enumerate() {
            header |= (byte & 0x80) >> (4 + i);
        }

        dst.put_u8(header);
        for byte in chunk {
            dst.put_u8(byte & 0x7F);
        }
        dst.put_bytes(0, BYTES_PER_GROUP - chunk.len());
    }
}

/// Decode a Teeth-encoded buffer.
///
/// Fails with [`TeethError::InvalidEncodedLength`] unless `src` is made of
/// whole 5-byte groups. Each group contributes as many bytes as its length
/// marker says (clamped to four); a zero marker contributes nothing.
pub fn decode(src: &[u8]) -> Result<Vec<u8>> {
    if src.len() % GROUP_SIZE != 0 {
        return Err(TeethError::InvalidEncodedLength { len: src.len() });
    }

    let mut dst = Vec::with_capacity(decoded_capacity(src.len()));

    for group in src.chunks_exact(GROUP_SIZE) {
        let header = group[0];
        let len_marker = usize::from(header >> 4).min(BYTES_PER_GROUP);

        for (i, byte) in group[1..=len_marker].iter().enumerate() {
            let msb = ((header >> (3 - i)) & 0x01) << 7;
            dst.push(msb | byte);
        }
    }

    Ok(dst)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic xorshift so the tests don't need an RNG crate.
    fn noise(len: usize, seed: u32) -> Vec<u8> {
        let mut state = seed.max(1);
        (0..len)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                (state >> 24) as u8
            })
            .collect()
    }

    #[test]
    fn empty_roundtrip() {
        assert!(encode(&[]).is_empty());
        assert!(decode(&[]).unwrap().is_empty());
    }

    #[test]
    fn full_group_layout() {
        let encoded = encode(&[0xFF, 0x00, 0x80, 0x7F]);
        assert_eq!(encoded.len(), 5);
        assert_eq!(encoded[0] >> 4, 4);
        assert_eq!(encoded[0] & 0x0F, 0b1010);
        assert_eq!(&encoded[1..], &[0x7F, 0x00, 0x00, 0x7F]);
    }

    #[test]
    fn single_byte_group() {
        let encoded = encode(&[0x81]);
        assert_eq!(encoded, vec![0x18, 0x01, 0x00, 0x00, 0x00]);
        assert_eq!(decode(&encoded).unwrap(), vec![0x81]);
    }

    #[test]
    fn partial_groups_use_leading_header_bits() {
        assert_eq!(encode(&[0x80, 0x80]), vec![0x2C, 0x00, 0x00, 0x00, 0x00]);
        assert_eq!(
            encode(&[0x01, 0x82, 0x83]),
            vec![0x36, 0x01, 0x02, 0x03, 0x00]
        );
    }

    #[test]
    fn roundtrip_every_length() {
        for len in 0..=320 {
            let pattern: Vec<u8> = (0..len).map(|x| ((x % 16) << 4 | (x % 16)) as u8).collect();
            assert_eq!(decode(&encode(&pattern)).unwrap(), pattern, "pattern len {len}");

            let random = noise(len, len as u32 + 7);
            assert_eq!(decode(&encode(&random)).unwrap(), random, "random len {len}");
        }
    }

    #[test]
    fn length_law() {
        for len in 0..=320 {
            let encoded = encode(&noise(len, 99));
            assert_eq!(encoded.len(), encoded_length(len));
            assert_eq!(encoded_length(len), len.div_ceil(4) * 5);
        }
        assert_eq!(encoded_length(80), 100);
    }

    #[test]
    fn output_is_seven_bit_clean() {
        for len in 0..=64 {
            let all_high = vec![0xFF; len];
            assert!(encode(&all_high).iter().all(|b| b & 0x80 == 0));
            assert!(encode(&noise(len, 3)).iter().all(|b| b & 0x80 == 0));
        }
    }

    #[test]
    fn decode_rejects_partial_groups() {
        for len in [1usize, 2, 3, 4, 6, 9, 11, 99] {
            let err = decode(&vec![0x40; len]).unwrap_err();
            assert_eq!(err, TeethError::InvalidEncodedLength { len });
        }
    }

    #[test]
    fn zero_length_marker_contributes_nothing() {
        let mut encoded = encode(&[1, 2, 3, 4]);
        encoded.extend_from_slice(&[0x00, 0x11, 0x22, 0x33, 0x44]);
        assert_eq!(decode(&encoded).unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn oversized_length_marker_is_clamped() {
        let decoded = decode(&[0x7F, 0x01, 0x02, 0x03, 0x04]).unwrap();
        assert_eq!(decoded, vec![0x81, 0x82, 0x83, 0x84]);
    }

    #[test]
    fn encode_into_appends() {
        let mut dst = BytesMut::from(&[0xF0, 0x77][..]);
        encode_into(&[0xAA, 0xBB], &mut dst);
        assert_eq!(dst.len(), 2 + encoded_length(2));
        assert_eq!(&dst[..2], &[0xF0, 0x77]);
        assert_eq!(decode(&dst[2..]).unwrap(), vec![0xAA, 0xBB]);
    }

    #[test]
    fn decoded_capacity_bounds_output() {
        for len in 0..=40 {
            let encoded = encode(&noise(len, 5));
            assert!(decoded_capacity(encoded.len()) >= len);
            assert!(decoded_capacity(encoded.len()) < len + 4);
        }
    }
}
