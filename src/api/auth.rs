/// Registration, login, and logout
use crate::{
    api::{
        extract::{AuthUser, MaybeUser, COOKIE_NAME},
        PublicUser,
    },
    auth::issue_token,
    context::AppContext,
    error::{GalleryError, GalleryResult},
    models::{Role, User},
};
use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/me", get(me))
}

#[derive(Debug, Deserialize)]
struct RegisterRequest {
    username: String,
    password: String,
    role: Option<Role>,
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

/// Set-Cookie value for a session token
fn auth_cookie(token: &str, max_age_secs: i64) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        COOKIE_NAME, token, max_age_secs
    )
}

fn clear_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", COOKIE_NAME)
}

fn session_response(
    ctx: &AppContext,
    user: &User,
    extra: serde_json::Value,
) -> GalleryResult<impl IntoResponse> {
    let ttl_days = ctx.config.authentication.token_ttl_days;
    let token = issue_token(user, &ctx.config.authentication.jwt_secret, ttl_days)?;

    let mut headers = HeaderMap::new();
    headers.insert(
        SET_COOKIE,
        auth_cookie(&token, ttl_days * 24 * 60 * 60)
            .parse()
            .map_err(|_| GalleryError::Internal("Invalid cookie value".to_string()))?,
    );

    let mut data = json!({
        "user": PublicUser::from(user),
        "token": token,
    });
    if let (Some(obj), Some(extra_obj)) = (data.as_object_mut(), extra.as_object()) {
        for (k, v) in extra_obj {
            obj.insert(k.clone(), v.clone());
        }
    }

    Ok((headers, Json(json!({ "success": true, "data": data }))))
}

/// Register a new user
///
/// The first-ever registration needs no credentials and yields an
/// admin; afterwards only admins may create users.
async fn register(
    State(ctx): State<AppContext>,
    requester: MaybeUser,
    Json(req): Json<RegisterRequest>,
) -> GalleryResult<impl IntoResponse> {
    if req.username.trim().is_empty() || req.password.is_empty() {
        return Err(GalleryError::Validation(
            "Username and password are required".to_string(),
        ));
    }
    if req.password.len() < 8 {
        return Err(GalleryError::Validation(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    let is_first_user = !ctx.gallery.has_users().await?;
    if !is_first_user {
        match requester.0 {
            Some(user) if user.role == Role::Admin => {}
            _ => {
                return Err(GalleryError::Forbidden(
                    "Only admins can register new users".to_string(),
                ))
            }
        }
    }

    let user = ctx
        .gallery
        .register_user(
            req.username,
            &req.password,
            req.role.unwrap_or(Role::Viewer),
        )
        .await?;

    session_response(&ctx, &user, json!({ "isFirstUser": is_first_user }))
}

/// Log in with username and password
async fn login(
    State(ctx): State<AppContext>,
    Json(req): Json<LoginRequest>,
) -> GalleryResult<impl IntoResponse> {
    if req.username.is_empty() || req.password.is_empty() {
        return Err(GalleryError::Validation(
            "Username and password are required".to_string(),
        ));
    }

    let user = ctx
        .gallery
        .authenticate_user(&req.username, &req.password)
        .await?
        .ok_or_else(|| {
            GalleryError::Authentication("Invalid username or password".to_string())
        })?;

    session_response(&ctx, &user, json!({}))
}

/// The authenticated requester, re-read from the store so a deleted
/// account with a still-valid token answers 401
async fn me(
    State(ctx): State<AppContext>,
    requester: AuthUser,
) -> GalleryResult<impl IntoResponse> {
    let user = ctx
        .gallery
        .user_by_id(&requester.id)
        .await?
        .ok_or_else(|| GalleryError::Authentication("Account no longer exists".to_string()))?;

    Ok(Json(
        json!({ "success": true, "data": { "user": PublicUser::from(&user) } }),
    ))
}

/// Clear the auth cookie
async fn logout() -> GalleryResult<impl IntoResponse> {
    let mut headers = HeaderMap::new();
    headers.insert(
        SET_COOKIE,
        clear_cookie()
            .parse()
            .map_err(|_| GalleryError::Internal("Invalid cookie value".to_string()))?,
    );

    Ok((
        StatusCode::OK,
        headers,
        Json(json!({ "success": true, "data": { "message": "Logged out" } })),
    ))
}
