use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::CookieJar;

use crate::error::AppError;
use crate::state::AppState;
use crate::utils::jwt;

/// Name of the session cookie issued at login.
pub const SESSION_COOKIE: &str = "token";

/// Authenticated identity extracted from the session cookie.
///
/// Add this as a handler parameter to require a valid session.
pub struct SessionUser {
    pub uid: String,
    pub email: String,
    pub name: String,
    pub picture: String,
    pub is_admin: bool,
}

impl FromRequestParts<AppState> for SessionUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_owned())
            .ok_or(AppError::TokenMissing)?;

        let claims = jwt::verify(&token, &state.config.auth.jwt_secret)
            .map_err(|_| AppError::TokenInvalid)?;

        let is_admin = state.config.is_admin(&claims.email);

        Ok(SessionUser {
            uid: claims.sub,
            email: claims.email,
            name: claims.name,
            picture: claims.picture,
            is_admin,
        })
    }
}

/// Session identity that is also on the admin allow-list.
///
/// Moderation routes gate on this extractor; the workflow bodies themselves
/// perform no authorization checks.
pub struct AdminUser(pub SessionUser);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = SessionUser::from_request_parts(parts, state).await?;
        if !user.is_admin {
            return Err(AppError::PermissionDenied);
        }
        Ok(AdminUser(user))
    }
}
