use rand::Rng;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Exact, constant-time comparison of the stored and supplied parent email.
/// An absent stored value never matches.
pub fn parent_matches(stored: Option<&str>, supplied: &str) -> bool {
    match stored {
        Some(stored) => bool::from(stored.as_bytes().ct_eq(supplied.as_bytes())),
        None => false,
    }
}

/// Random 8-digit confirmation code, zero padded.
pub fn generate_deletion_code() -> String {
    let n: u32 = rand::thread_rng().gen_range(0..100_000_000);
    format!("{:08}", n)
}

pub fn hash_code(code: &str) -> String {
    hex::encode(Sha256::digest(code.trim().as_bytes()))
}

pub fn code_matches(stored_hash: &str, supplied: &str) -> bool {
    let supplied_hash = hash_code(supplied);
    bool::from(stored_hash.as_bytes().ct_eq(supplied_hash.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent_match_is_exact() {
        assert!(parent_matches(Some("p@t.com"), "p@t.com"));
        assert!(!parent_matches(Some("p@t.com"), "P@t.com"));
        assert!(!parent_matches(Some("p@t.com"), "p@t.com "));
        assert!(!parent_matches(Some("p@t.com"), "wrong@t.com"));
    }

    #[test]
    fn test_absent_stored_parent_never_matches() {
        assert!(!parent_matches(None, ""));
        assert!(!parent_matches(None, "p@t.com"));
    }

    #[test]
    fn test_generated_code_shape() {
        for _ in 0..50 {
            let code = generate_deletion_code();
            assert_eq!(code.len(), 8);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_code_hash_roundtrip() {
        let hash = hash_code("01234567");
        assert_eq!(hash.len(), 64);
        assert!(code_matches(&hash, "01234567"));
        assert!(code_matches(&hash, " 01234567 "));
        assert!(!code_matches(&hash, "01234568"));
    }
}
