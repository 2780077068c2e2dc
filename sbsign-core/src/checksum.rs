//! PE checksum engine: the one's-complement 16-bit fold-sum used as the
//! on-disk `CheckSum` field.

/// Folds `word` into `sum`, carrying any overflow back into the low 16 bits.
fn fold(sum: u32, word: u16) -> u32 {
    let new = sum + word as u32;
    (new >> 16) + (new & 0xffff)
}

/// Fold-sums `data` as a sequence of little-endian 16-bit words, starting
/// from `checksum`. An odd trailing byte is folded in as the low byte of
/// one more 16-bit word.
fn fold_bytes(mut checksum: u32, data: &[u8]) -> u32 {
    let mut chunks = data.chunks_exact(2);
    for pair in &mut chunks {
        let word = u16::from_le_bytes([pair[0], pair[1]]);
        checksum = fold(checksum, word);
    }
    if let [last] = chunks.remainder() {
        checksum = fold(checksum, *last as u16);
    }
    checksum
}

/// Computes the PE checksum over `bytes[..data_size]`, skipping the 4
/// bytes at `checksum_offset`, and additionally over `sig_bytes` if a
/// signature is being written.
///
/// `bytes` must be at least `data_size` long and `checksum_offset + 4`
/// must fall within `[0, data_size)`.
pub fn compute(bytes: &[u8], checksum_offset: usize, data_size: usize, sig_bytes: &[u8]) -> u32 {
    let mut sum = 0u32;
    sum = fold_bytes(sum, &bytes[..checksum_offset]);
    sum = fold_bytes(sum, &bytes[checksum_offset + 4..data_size]);
    if !sig_bytes.is_empty() {
        sum = fold_bytes(sum, sig_bytes);
    }
    sum = sum.wrapping_add(data_size as u32);
    if !sig_bytes.is_empty() {
        sum = sum.wrapping_add(sig_bytes.len() as u32);
    }
    sum
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_is_ones_complement_style() {
        // 0xffff + 0x0001 carries out and folds back to 0x0002.
        assert_eq!(fold(0xffff, 0x0001), 0x0002);
        assert_eq!(fold(0, 0x1234), 0x1234);
    }

    #[test]
    fn checksum_independent_of_stored_value() {
        let mut bytes = vec![0u8; 16];
        for i in 0..16u8 {
            bytes[i as usize] = i;
        }
        let checksum_offset = 4;
        let a = compute(&bytes, checksum_offset, bytes.len(), &[]);
        bytes[checksum_offset..checksum_offset + 4].copy_from_slice(&[0xff, 0xff, 0xff, 0xff]);
        let b = compute(&bytes, checksum_offset, bytes.len(), &[]);
        assert_eq!(a, b);
    }

    #[test]
    fn odd_trailing_byte_is_folded() {
        // checksum field occupies [3..7); the 3 leading bytes have an odd
        // trailing byte (0x03) that must be folded in as a lone low byte.
        let mut buf = vec![0u8; 7];
        buf[..3].copy_from_slice(&[0x01, 0x02, 0x03]);
        let sum = compute(&buf, 3, 7, &[]);
        assert_eq!(sum, 0x020b);
    }

    #[test]
    fn signature_bytes_included_when_signing() {
        let bytes = vec![0u8; 8];
        let sig = [0xaa, 0xbb, 0xcc];
        let without = compute(&bytes, 4, 8, &[]);
        let with = compute(&bytes, 4, 8, &sig);
        assert_ne!(without, with);
    }
}
