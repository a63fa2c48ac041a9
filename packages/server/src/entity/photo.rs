use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "photo")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Identifier of the stored blob. One blob per photo record.
    #[sea_orm(unique)]
    pub blob_id: Uuid,

    /// Original upload filename.
    pub file_name: String,

    /// MIME type declared by the uploader.
    pub content_type: String,

    /// Compressed size in bytes.
    pub file_size: i64,

    pub uploaded_at: DateTimeUtc,

    /// Uploader display name.
    pub uploader: String,

    /// Uploader identity (email).
    pub uploader_email: String,

    pub title: String,

    pub description: Option<String>,

    /// Free-text event tag, may be empty.
    pub event: String,

    /// Gates public visibility. Defaults to false.
    pub approval: bool,

    pub likes: i32,

    /// JSON array of emails that have liked this photo. Kept in sync with
    /// `likes`: both are written by the same single-row update.
    pub liked_by: Json,
}

impl Model {
    /// Decode the `liked_by` column into a list of emails.
    ///
    /// A malformed or missing value decodes as empty rather than failing the
    /// request.
    pub fn liked_by_list(&self) -> Vec<String> {
        serde_json::from_value(self.liked_by.clone()).unwrap_or_default()
    }

    pub fn has_liked(&self, email: &str) -> bool {
        self.liked_by_list().iter().any(|e| e == email)
    }
}

impl ActiveModelBehavior for ActiveModel {}
