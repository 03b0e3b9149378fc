//! Content fingerprints for exact-match grouping.
//!
//! A fingerprint is the BLAKE3 digest of a unit's normalized key. Digest
//! equality is treated as text equality: the collision risk of a
//! collision-resistant 256-bit hash is the accepted trade-off that lets
//! exact grouping run in amortized O(1) per unit instead of deep string
//! comparison.

/// A 32-byte BLAKE3 digest of a normalized key.
pub type Fingerprint = [u8; 32];

/// Fingerprint a normalized key.
#[must_use]
pub fn fingerprint(key: &str) -> Fingerprint {
    *blake3::hash(key.as_bytes()).as_bytes()
}

/// Render a fingerprint as lowercase hex.
#[must_use]
pub fn fingerprint_hex(fp: &Fingerprint) -> String {
    fp.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_keys_equal_fingerprints() {
        assert_eq!(fingerprint("same text"), fingerprint("same text"));
    }

    #[test]
    fn test_different_keys_differ() {
        assert_ne!(fingerprint("one text"), fingerprint("other text"));
    }

    #[test]
    fn test_hex_rendering() {
        let hex = fingerprint_hex(&fingerprint("x"));
        assert_eq!(hex.len(), 64);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
