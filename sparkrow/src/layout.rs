//! Byte-level layout math shared by the length and write passes.
//!
//! Every helper here mirrors a quantity in the target row format: rows open
//! with a word-aligned null bitmap, each column owns an 8-byte slot, and
//! variable-length payloads round up to 8-byte words. Keeping the math in
//! one place is what lets the two passes agree byte-for-byte.

/// Width in bytes of a null bitmap covering `num_fields` entries, rounded
/// up to whole 64-bit words.
#[inline]
pub fn bitset_width_bytes(num_fields: usize) -> i64 {
    ((num_fields as i64 + 63) / 64) * 8
}

/// Fixed per-row header size: null bitmap plus one 8-byte slot per column.
#[inline]
pub fn fixed_size_per_row(num_cols: usize) -> i64 {
    bitset_width_bytes(num_cols) + 8 * num_cols as i64
}

/// Round `num_bytes` up to the next multiple of 8.
#[inline]
pub fn round_up_to_word(num_bytes: i64) -> i64 {
    (num_bytes + 7) & !7
}

/// Set bit `index` in a little-endian bitmap.
#[inline]
pub fn bit_set(bitmap: &mut [u8], index: usize) {
    bitmap[index >> 3] |= 1 << (index & 7);
}

/// Test bit `index` in a little-endian bitmap.
#[inline]
pub fn is_bit_set(bitmap: &[u8], index: usize) -> bool {
    bitmap[index >> 3] & (1 << (index & 7)) != 0
}

/// Pack a variable-length value's position into the 8-byte descriptor the
/// row format stores in column and element slots.
///
/// The offset is relative to the enclosing composite (or the row start for
/// top-level columns); the low 32 bits carry the payload size in bytes.
#[inline]
pub fn pack_offset_and_size(offset: i64, size: i64) -> i64 {
    (offset << 32) | size
}

/// Extract the offset half of a packed descriptor.
#[inline]
pub fn unpack_offset(offset_and_size: i64) -> i64 {
    offset_and_size >> 32
}

/// Extract the size half of a packed descriptor.
#[inline]
pub fn unpack_size(offset_and_size: i64) -> i64 {
    offset_and_size & 0xffff_ffff
}

/// Convert a little-endian 16-byte decimal into the fully big-endian form
/// the row format stores: each 64-bit half is byte-swapped and the halves
/// trade places, yielding one big-endian 128-bit integer.
#[inline]
pub fn swap_decimal128_endianness(buf: &mut [u8; 16]) {
    let lo = u64::from_le_bytes(buf[0..8].try_into().unwrap());
    let hi = u64::from_le_bytes(buf[8..16].try_into().unwrap());
    buf[0..8].copy_from_slice(&hi.to_be_bytes());
    buf[8..16].copy_from_slice(&lo.to_be_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bitset_width_rounds_to_words() {
        assert_eq!(bitset_width_bytes(0), 0);
        assert_eq!(bitset_width_bytes(1), 8);
        assert_eq!(bitset_width_bytes(64), 8);
        assert_eq!(bitset_width_bytes(65), 16);
        assert_eq!(bitset_width_bytes(128), 16);
        assert_eq!(bitset_width_bytes(129), 24);
    }

    #[test]
    fn word_rounding() {
        assert_eq!(round_up_to_word(0), 0);
        assert_eq!(round_up_to_word(1), 8);
        assert_eq!(round_up_to_word(8), 8);
        assert_eq!(round_up_to_word(9), 16);
    }

    #[test]
    fn bit_set_matches_word_layout() {
        let mut bitmap = [0u8; 16];
        bit_set(&mut bitmap, 0);
        bit_set(&mut bitmap, 7);
        bit_set(&mut bitmap, 63);
        bit_set(&mut bitmap, 64);
        assert_eq!(bitmap[0], 0b1000_0001);
        assert_eq!(bitmap[7], 0b1000_0000);
        assert_eq!(bitmap[8], 0b0000_0001);
        assert!(is_bit_set(&bitmap, 0));
        assert!(!is_bit_set(&bitmap, 1));
        assert!(is_bit_set(&bitmap, 64));
    }

    #[test]
    fn descriptor_round_trip() {
        let packed = pack_offset_and_size(16, 24);
        assert_eq!(packed, 0x0000_0010_0000_0018);
        assert_eq!(unpack_offset(packed), 16);
        assert_eq!(unpack_size(packed), 24);
    }

    #[test]
    fn decimal_swap_produces_big_endian_integer() {
        let value: i128 = 0x0102_0304_0506_0708_090A_0B0C_0D0E_0F10;
        let mut buf = value.to_le_bytes();
        swap_decimal128_endianness(&mut buf);
        assert_eq!(buf, value.to_be_bytes());
    }
}
