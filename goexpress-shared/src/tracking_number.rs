/// Tracking number generation and validation
///
/// Tracking numbers are the externally visible shipment identifier:
/// the prefix `GEX` followed by the uppercase hex encoding of four
/// cryptographically random bytes (`GEX1A2B3C4D`).
///
/// # Example
///
/// ```
/// use goexpress_shared::tracking_number::{generate, is_valid};
///
/// let number = generate();
/// assert!(is_valid(&number));
/// assert!(!is_valid("BAD"));
/// ```

use rand::{rngs::OsRng, RngCore};

/// Prefix carried by every tracking number
pub const PREFIX: &str = "GEX";

/// Total length of a tracking number (prefix + 8 hex digits)
pub const LENGTH: usize = 11;

/// Number of random bytes encoded after the prefix
const RANDOM_BYTES: usize = 4;

/// Generates a new random tracking number
///
/// Uniqueness is enforced by the store; callers retry on collision.
pub fn generate() -> String {
    let mut bytes = [0u8; RANDOM_BYTES];
    OsRng.fill_bytes(&mut bytes);

    format!("{}{}", PREFIX, hex::encode_upper(bytes))
}

/// Checks the shape of a tracking number supplied by a caller
///
/// Only the prefix and total length are checked, so lookups for numbers
/// issued under an older alphabet still reach the store.
pub fn is_valid(tracking_number: &str) -> bool {
    tracking_number.starts_with(PREFIX) && tracking_number.len() == LENGTH
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_format() {
        for _ in 0..100 {
            let number = generate();
            assert_eq!(number.len(), LENGTH);
            assert!(number.starts_with(PREFIX));
            assert!(number[PREFIX.len()..]
                .chars()
                .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
        }
    }

    #[test]
    fn test_generate_is_random() {
        let first = generate();
        let second = generate();
        assert_ne!(first, second);
    }

    #[test]
    fn test_is_valid() {
        assert!(is_valid("GEX00000000"));
        assert!(is_valid("GEX1A2B3C4D"));

        assert!(!is_valid("BAD"));
        assert!(!is_valid("GEX"));
        assert!(!is_valid("GEX000000000"));
        assert!(!is_valid("ABC00000000"));
        assert!(!is_valid(""));
    }
}
