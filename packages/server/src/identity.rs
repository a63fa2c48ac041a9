use async_trait::async_trait;
use serde::Deserialize;
use tracing::instrument;

/// Claims extracted from a verified identity assertion.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityClaims {
    /// Provider-unique user id.
    pub sub: String,
    pub email: String,
    #[serde(default)]
    pub name: String,
    /// Avatar URL.
    #[serde(default)]
    pub picture: String,
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("invalid identity token: {0}")]
    InvalidToken(String),
    #[error("identity provider unreachable: {0}")]
    Transport(String),
}

/// Verifies an identity assertion obtained by the client from the external
/// identity provider. Domain restrictions are enforced by the caller, not
/// here.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, id_token: &str) -> Result<IdentityClaims, IdentityError>;
}

/// Verifies tokens against the provider's tokeninfo-style endpoint:
/// `GET {url}?id_token=...` returns the token's claims if and only if the
/// signature and expiry check out on the provider side.
pub struct HttpIdentityVerifier {
    http: reqwest::Client,
    verify_url: String,
}

impl HttpIdentityVerifier {
    pub fn new(verify_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            verify_url,
        }
    }
}

#[async_trait]
impl IdentityVerifier for HttpIdentityVerifier {
    #[instrument(skip(self, id_token))]
    async fn verify(&self, id_token: &str) -> Result<IdentityClaims, IdentityError> {
        let response = self
            .http
            .get(&self.verify_url)
            .query(&[("id_token", id_token)])
            .send()
            .await
            .map_err(|e| IdentityError::Transport(e.to_string()))?;

        // The provider answers 4xx for bad/expired assertions.
        if response.status().is_client_error() {
            let detail = response.text().await.unwrap_or_default();
            return Err(IdentityError::InvalidToken(detail));
        }
        let response = response
            .error_for_status()
            .map_err(|e| IdentityError::Transport(e.to_string()))?;

        response
            .json::<IdentityClaims>()
            .await
            .map_err(|e| IdentityError::InvalidToken(e.to_string()))
    }
}
