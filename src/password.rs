use once_cell::sync::Lazy;

/// bcrypt work factor for newly stored hashes
pub const HASH_COST: u32 = 10;

/// Hash checked when a login names no existing user, so both paths cost one bcrypt verify
static DUMMY_HASH: Lazy<Option<String>> =
    Lazy::new(|| bcrypt::hash("not a real password", HASH_COST).ok());

/// Hash a password with bcrypt and a random salt
pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, HASH_COST)
}

/// Check a password against a stored hash. Malformed hashes never verify.
pub fn verify_password(password: &str, stored: &str) -> bool {
    bcrypt::verify(password, stored).unwrap_or_else(|e| {
        tracing::warn!("Stored password hash could not be checked: {}", e);
        false
    })
}

/// Spend the time of a real verification for a user that doesn't exist. Always false.
pub fn verify_unknown_user(password: &str) -> bool {
    if let Some(hash) = DUMMY_HASH.as_deref() {
        let _ = bcrypt::verify(password, hash);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("hunter2").unwrap();
        assert!(hash.starts_with(&format!("$2b${}$", HASH_COST)));
        assert!(verify_password("hunter2", &hash));
        assert!(!verify_password("hunter3", &hash));
    }

    #[test]
    fn test_salts_differ() {
        let first = hash_password("same").unwrap();
        let second = hash_password("same").unwrap();
        assert_ne!(first, second);
        assert!(verify_password("same", &first));
        assert!(verify_password("same", &second));
    }

    #[test]
    fn test_malformed_hashes_never_verify() {
        for stored in [
            "",
            "plaintext",
            "sha256$10000$AAAA$AAAA",
            "$2b$10$tooshort",
        ] {
            assert!(!verify_password("anything", stored), "{:?} verified", stored);
        }
    }

    #[test]
    fn test_unknown_user_never_verifies() {
        assert!(DUMMY_HASH.is_some());
        assert!(!verify_unknown_user("not a real password"));
        assert!(!verify_unknown_user(""));
    }
}
