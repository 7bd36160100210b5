/// Authentication extractors
///
/// The session token travels either in the `auth_token` cookie
/// (browser clients) or an `Authorization: Bearer` header
/// (non-browser callers). Extractors verify it against the
/// process-wide signing key; role gating for mutations happens here,
/// once, rather than per handler.
use crate::{
    auth::{verify_token, Claims},
    context::AppContext,
    error::GalleryError,
    models::Role,
};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use axum_extra::extract::cookie::CookieJar;

/// Cookie carrying the session token
pub const COOKIE_NAME: &str = "auth_token";

/// Verified requester identity
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub username: String,
    pub role: Role,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            username: claims.username,
            role: claims.role,
        }
    }
}

/// Pull a bearer token from the Authorization header
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(String::from)
}

/// Pull the session token from the auth cookie
fn extract_cookie_token(headers: &HeaderMap) -> Option<String> {
    CookieJar::from_headers(headers)
        .get(COOKIE_NAME)
        .map(|cookie| cookie.value().to_string())
}

fn verified_user(parts: &Parts, state: &AppContext) -> Option<AuthUser> {
    // Bearer header first, cookie as fallback
    let token = extract_bearer_token(&parts.headers).or_else(|| extract_cookie_token(&parts.headers))?;
    verify_token(&token, &state.config.authentication.jwt_secret).map(AuthUser::from)
}

/// Required authentication; rejects when no valid token is presented
#[async_trait]
impl FromRequestParts<AppContext> for AuthUser {
    type Rejection = GalleryError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        verified_user(parts, state).ok_or_else(|| {
            GalleryError::Authentication("Missing or invalid credentials".to_string())
        })
    }
}

/// Optional authentication; does not fail when no auth is provided
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<AuthUser>);

impl MaybeUser {
    pub fn id(&self) -> Option<&str> {
        self.0.as_ref().map(|u| u.id.as_str())
    }
}

#[async_trait]
impl FromRequestParts<AppContext> for MaybeUser {
    type Rejection = GalleryError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(verified_user(parts, state)))
    }
}

/// Admin authentication; every create/update/delete goes through this
/// single gate
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

#[async_trait]
impl FromRequestParts<AppContext> for AdminUser {
    type Rejection = GalleryError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role != Role::Admin {
            return Err(GalleryError::Forbidden("Admin access required".to_string()));
        }
        Ok(AdminUser(user))
    }
}
