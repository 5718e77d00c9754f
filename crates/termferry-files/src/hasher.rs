//! SHA-256 content checksums.

use sha2::{Digest, Sha256};

/// Hash content and return the digest as lowercase hex
pub fn checksum_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Verify content against an expected hex digest.
///
/// Hex comparison is case-insensitive; surrounding whitespace in
/// `expected` is ignored.
pub fn verify_checksum(data: &[u8], expected: &str) -> bool {
    checksum_hex(data).eq_ignore_ascii_case(expected.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_known_digest() {
        assert_eq!(
            checksum_hex(b"hello"),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        assert_eq!(
            checksum_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_verify_is_case_insensitive() {
        let upper = checksum_hex(b"hello").to_uppercase();
        assert!(verify_checksum(b"hello", &upper));
        assert!(verify_checksum(b"hello", &format!(" {upper}\n")));
        assert!(!verify_checksum(b"hello!", &upper));
        assert!(!verify_checksum(b"hello", "abc123"));
    }

    proptest! {
        #[test]
        fn checksum_is_lowercase_hex(data in proptest::collection::vec(any::<u8>(), 0..512)) {
            let sum = checksum_hex(&data);
            prop_assert_eq!(sum.len(), 64);
            prop_assert!(sum.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
            prop_assert!(verify_checksum(&data, &sum));
        }
    }
}
