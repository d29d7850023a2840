//! Stable integer IDs derived from site slugs.

/// Largest signed 32-bit integer. IDs are reduced modulo this value so they
/// fit the app's `INTEGER` primary keys on every platform.
pub const ID_MODULUS: u64 = 2_147_483_647;

/// Map a slug to a stable surrogate ID.
///
/// Takes the first four bytes (eight hex digits) of the slug's MD5 digest as a
/// big-endian unsigned integer and reduces it modulo [`ID_MODULUS`]. The result
/// depends only on the slug's UTF-8 bytes, so it is identical across runs,
/// processes and machines.
pub fn deterministic_id(slug: &str) -> i64 {
    let digest = md5::compute(slug.as_bytes());
    let prefix = u32::from_be_bytes([digest.0[0], digest.0[1], digest.0[2], digest.0[3]]);
    (u64::from(prefix) % ID_MODULUS) as i64
}
