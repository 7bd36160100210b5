/// Signed session tokens (HS256 JWT)
use crate::{
    error::{GalleryError, GalleryResult},
    models::{Role, User},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Token payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub username: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// Issue a signed token for a user
///
/// The signing secret is process-wide configuration, loaded once at
/// startup.
pub fn issue_token(user: &User, secret: &str, ttl_days: i64) -> GalleryResult<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: user.id.clone(),
        username: user.username.clone(),
        role: user.role,
        iat: now.timestamp(),
        exp: (now + Duration::days(ttl_days)).timestamp(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| GalleryError::Internal(format!("Token signing failed: {}", e)))
}

/// Verify a token's signature and expiry
///
/// Never fails loudly: invalid, expired, and malformed tokens are all
/// indistinguishable `None` to the caller.
pub fn verify_token(token: &str, secret: &str) -> Option<Claims> {
    let validation = Validation::new(Algorithm::HS256);
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .ok()
    .map(|data| data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-chars!!";

    fn test_user() -> User {
        User::new("alice".to_string(), "hash".to_string(), Role::Admin)
    }

    #[test]
    fn test_issue_and_verify_round_trip() {
        let user = test_user();
        let token = issue_token(&user, SECRET, 7).unwrap();

        let claims = verify_token(&token, SECRET).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.role, Role::Admin);
    }

    #[test]
    fn test_wrong_secret_yields_none() {
        let token = issue_token(&test_user(), SECRET, 7).unwrap();
        assert!(verify_token(&token, "another-secret-of-sufficient-len").is_none());
    }

    #[test]
    fn test_tampered_token_yields_none() {
        let token = issue_token(&test_user(), SECRET, 7).unwrap();
        let tampered = format!("{}x", token);
        assert!(verify_token(&tampered, SECRET).is_none());
    }

    #[test]
    fn test_expired_token_yields_none() {
        // Issued 10 days in the past relative to its own expiry
        let token = issue_token(&test_user(), SECRET, -10).unwrap();
        assert!(verify_token(&token, SECRET).is_none());
    }

    #[test]
    fn test_garbage_token_yields_none() {
        assert!(verify_token("not.a.jwt", SECRET).is_none());
        assert!(verify_token("", SECRET).is_none());
    }
}
