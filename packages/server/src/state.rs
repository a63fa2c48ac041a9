use std::sync::Arc;

use common::storage::BlobStore;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::identity::IdentityVerifier;
use crate::scan::MalwareScanner;

/// Shared application context, constructed once at startup and cloned into
/// every handler. External collaborators sit behind trait objects so tests
/// can substitute them.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<AppConfig>,
    pub blob_store: Arc<dyn BlobStore>,
    pub scanner: Arc<dyn MalwareScanner>,
    pub identity: Arc<dyn IdentityVerifier>,
}
