use axum::{Json, extract::State, response::IntoResponse};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::{SESSION_COOKIE, SessionUser};
use crate::extractors::json::AppJson;
use crate::models::auth::{
    IsAdminResponse, LoginRequest, LoginResponse, MeResponse, validate_login_request,
};
use crate::state::AppState;
use crate::utils::jwt;

#[utoipa::path(
    post,
    path = "/login",
    tag = "Auth",
    operation_id = "login",
    summary = "Log in with an identity-provider token",
    description = "Verifies the ID token with the identity provider, enforces the allowed \
        email domain, and issues the session cookie. A valid assertion from outside the \
        domain is still rejected and no cookie is set.",
    responses(
        (status = 200, description = "Session issued", body = LoginResponse),
        (status = 400, description = "Missing ID token (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Invalid or expired ID token (TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Email domain not allowed (DOMAIN_NOT_ALLOWED)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, jar, payload))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_login_request(&payload)?;

    let claims = state.identity.verify(&payload.id_token).await?;

    // The client-side restriction is advisory only; this check is the one
    // that counts.
    if !claims.email.ends_with(&state.config.auth.allowed_email_domain) {
        tracing::warn!(email = %claims.email, "blocked login attempt from unauthorized domain");
        return Err(AppError::DomainNotAllowed);
    }

    let token = jwt::sign(
        &claims.sub,
        &claims.email,
        &claims.name,
        &claims.picture,
        &state.config.auth.jwt_secret,
    )
    .map_err(|e| AppError::Internal(format!("JWT sign error: {e}")))?;

    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .max_age(Duration::days(jwt::SESSION_TTL_DAYS))
        .build();

    tracing::info!(email = %claims.email, "user logged in");

    let admin = state.config.is_admin(&claims.email);
    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            message: "Login successful".into(),
            email: claims.email,
            name: claims.name,
            picture: claims.picture,
            admin,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/isAdmin",
    tag = "Auth",
    operation_id = "isAdmin",
    summary = "Report whether the caller is an admin",
    responses(
        (status = 200, description = "Admin status", body = IsAdminResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("session" = [])),
)]
#[instrument(skip(user), fields(email = %user.email))]
pub async fn is_admin(user: SessionUser) -> Json<IsAdminResponse> {
    Json(IsAdminResponse {
        is_admin: user.is_admin,
    })
}

#[utoipa::path(
    get,
    path = "/me",
    tag = "Auth",
    operation_id = "me",
    summary = "Return the caller's identity and admin flag",
    responses(
        (status = 200, description = "Caller profile", body = MeResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("session" = [])),
)]
#[instrument(skip(user), fields(email = %user.email))]
pub async fn me(user: SessionUser) -> Json<MeResponse> {
    Json(MeResponse {
        email: user.email,
        name: user.name,
        picture: user.picture,
        is_admin: user.is_admin,
    })
}
