//! Content fingerprints for revisioned filenames.
//!
//! Uses blake3 over the full content and keeps the first [`HASH_LEN`] hex
//! characters. The length is fixed, not configurable.

/// Number of hex characters embedded in revisioned filenames.
pub const HASH_LEN: usize = 8;

/// Compute the fingerprint of a byte sequence (lowercase hex, [`HASH_LEN`] chars).
#[inline]
pub fn fingerprint<T: AsRef<[u8]> + ?Sized>(data: &T) -> String {
    let hash = blake3::hash(data.as_ref());
    hex::encode(&hash.as_bytes()[..HASH_LEN / 2])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_deterministic() {
        let a = fingerprint("body { color: red; }");
        let b = fingerprint("body { color: red; }");
        assert_eq!(a, b);
        assert_eq!(a.len(), HASH_LEN);
        assert!(a.bytes().all(|c| matches!(c, b'0'..=b'9' | b'a'..=b'f')));
    }

    #[test]
    fn test_fingerprint_single_byte_change() {
        let a = fingerprint(b"body { color: red; }");
        let b = fingerprint(b"body { color: ree; }");
        assert_ne!(a, b);
    }

    #[test]
    fn test_fingerprint_empty_input() {
        // blake3("") = af1349b9...
        assert_eq!(fingerprint(""), "af1349b9");
    }
}
