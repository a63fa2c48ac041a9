use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// Emails permitted to moderate. Exact string match, no wildcards.
    pub admins: Vec<String>,
    /// Required email suffix for login, e.g. "@students.example.edu".
    pub allowed_email_domain: String,
    /// Identity provider endpoint that verifies an ID token and returns its
    /// claims (tokeninfo-style: GET {url}?id_token=...).
    pub identity_verify_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Root directory for the filesystem blob store.
    pub path: String,
    /// Maximum size of a single stored blob, in bytes.
    pub max_blob_size: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScanConfig {
    pub api_key: String,
    pub base_url: String,
    /// How many times to poll an analysis before giving up.
    pub poll_attempts: u32,
    /// Delay between polls, in milliseconds.
    pub poll_interval_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    pub scan: ScanConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 5000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("auth.admins", Vec::<String>::new())?
            .set_default(
                "auth.identity_verify_url",
                "https://oauth2.googleapis.com/tokeninfo",
            )?
            .set_default("storage.path", "./data/blobs")?
            .set_default("storage.max_blob_size", 64 * 1024 * 1024)?
            .set_default("scan.base_url", "https://www.virustotal.com/api/v3")?
            .set_default("scan.poll_attempts", 10)?
            .set_default("scan.poll_interval_ms", 2000)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., DARKROOM__AUTH__JWT_SECRET)
            .add_source(Environment::with_prefix("DARKROOM").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    /// Returns true if the email is on the admin allow-list.
    pub fn is_admin(&self, email: &str) -> bool {
        self.auth.admins.iter().any(|a| a == email)
    }
}
