/// Maximum encoded size of a base-128 varint carrying a `u64`.
pub(crate) const MAX_UVARINT_LEN: usize = 10;

/// Maps a signed integer onto the unsigned varint space so that values of
/// small magnitude encode short regardless of sign.
///
/// The same transform is used by encode and decode; the two functions are
/// exact inverses over the full `i64` range.
pub fn zigzag_encode(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

/// Inverse of [`zigzag_encode`].
pub fn zigzag_decode(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}
