use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Request body for login with an identity-provider assertion.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    /// ID token obtained from the identity provider by the client.
    #[serde(rename = "idToken")]
    #[schema(example = "eyJhbGciOiJSUzI1NiIsImtpZCI6...")]
    pub id_token: String,
}

pub fn validate_login_request(payload: &LoginRequest) -> Result<(), AppError> {
    if payload.id_token.trim().is_empty() {
        return Err(AppError::Validation("ID token is required".into()));
    }
    Ok(())
}

/// Successful login response. The session itself travels in the cookie.
#[derive(Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    #[schema(example = "Login successful")]
    pub message: String,
    #[schema(example = "alice@students.example.edu")]
    pub email: String,
    #[schema(example = "Alice")]
    pub name: String,
    /// Avatar URL.
    pub picture: String,
    /// Whether the caller is on the admin allow-list.
    pub admin: bool,
}

/// Admin-status probe response.
#[derive(Serialize, utoipa::ToSchema)]
pub struct IsAdminResponse {
    #[serde(rename = "isAdmin")]
    pub is_admin: bool,
}

/// Current authenticated user's profile.
#[derive(Serialize, utoipa::ToSchema)]
pub struct MeResponse {
    #[schema(example = "alice@students.example.edu")]
    pub email: String,
    #[schema(example = "Alice")]
    pub name: String,
    pub picture: String,
    #[serde(rename = "isAdmin")]
    pub is_admin: bool,
}
