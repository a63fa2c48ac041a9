use anyhow::Result;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// Session lifetime. Logout only clears the client-held cookie; there is no
/// server-side revocation.
pub const SESSION_TTL_DAYS: i64 = 7;

/// JWT Claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Identity provider user id.
    pub sub: String,
    pub email: String,
    pub name: String,
    /// Avatar URL.
    pub picture: String,
    /// Expiration timestamp.
    pub exp: usize,
}

/// Sign a new session token for a verified identity.
pub fn sign(uid: &str, email: &str, name: &str, picture: &str, secret: &str) -> Result<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::days(SESSION_TTL_DAYS))
        .expect("valid timestamp")
        .timestamp();

    let claims = Claims {
        sub: uid.to_owned(),
        email: email.to_owned(),
        name: name.to_owned(),
        picture: picture.to_owned(),
        exp: expiration as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Verify and decode a session token.
pub fn verify(token: &str, secret: &str) -> Result<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}
