/// Password hashing with Argon2id
///
/// One-way, salted, and deliberately expensive. The work factor is
/// Argon2's tunable memory/iteration parameters; defaults are used
/// unless a deployment overrides them here.
use crate::error::{GalleryError, GalleryResult};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Hash a plaintext password; used only at registration
pub fn hash_password(plaintext: &str) -> GalleryResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map_err(|e| GalleryError::Internal(format!("Password hashing failed: {}", e)))?;
    Ok(hash.to_string())
}

/// Verify a plaintext password against a stored hash
///
/// Comparison goes through Argon2's own verifier, which is safe
/// against timing attacks. A malformed stored hash verifies false.
pub fn verify_password(plaintext: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(plaintext.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse battery staple").unwrap();
        assert!(verify_password("correct horse battery staple", &hash));
        assert!(!verify_password("wrong password", &hash));
    }

    #[test]
    fn test_hashes_are_salted() {
        let h1 = hash_password("same input").unwrap();
        let h2 = hash_password("same input").unwrap();
        assert_ne!(h1, h2);
    }

    #[test]
    fn test_malformed_hash_verifies_false() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }
}
