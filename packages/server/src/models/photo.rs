use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::photo;
use crate::error::AppError;

/// One photo record as returned by listing endpoints.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PhotoResponse {
    /// Blob identifier; also the photo's external id in every route.
    #[schema(example = "0190cb1c-7e3a-7cc3-ba2e-9f4f3f0a41b2")]
    pub file_id: String,
    #[schema(example = "sunset.jpg")]
    pub file_name: String,
    #[schema(example = "image/jpeg")]
    pub content_type: String,
    /// Compressed size in bytes.
    pub file_size: i64,
    pub uploaded_at: DateTime<Utc>,
    #[schema(example = "Alice")]
    pub uploader: String,
    #[schema(example = "alice@students.example.edu")]
    pub uploader_email: String,
    pub title: String,
    pub description: Option<String>,
    #[schema(example = "Orientation Week")]
    pub event: String,
    pub approval: bool,
    pub likes: i32,
    pub liked_by: Vec<String>,
}

impl From<photo::Model> for PhotoResponse {
    fn from(model: photo::Model) -> Self {
        let liked_by = model.liked_by_list();
        Self {
            file_id: model.blob_id.to_string(),
            file_name: model.file_name,
            content_type: model.content_type,
            file_size: model.file_size,
            uploaded_at: model.uploaded_at,
            uploader: model.uploader,
            uploader_email: model.uploader_email,
            title: model.title,
            description: model.description,
            event: model.event,
            approval: model.approval,
            likes: model.likes,
            liked_by,
        }
    }
}

/// One successfully stored file in an upload batch.
#[derive(Serialize, utoipa::ToSchema)]
pub struct UploadedPhoto {
    #[schema(example = "sunset.jpg")]
    pub filename: String,
    /// Assigned blob identifier.
    #[serde(rename = "fileId")]
    pub file_id: String,
}

/// Response for a fully successful upload batch, in input order.
#[derive(Serialize, utoipa::ToSchema)]
pub struct UploadResponse {
    #[schema(example = "Files uploaded successfully")]
    pub message: String,
    pub files: Vec<UploadedPhoto>,
}

/// Response for the filtered photo listing.
#[derive(Serialize, utoipa::ToSchema)]
pub struct FilterResponse {
    #[schema(example = "Files fetched successfully")]
    pub message: String,
    pub files: Vec<PhotoResponse>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct LikeResponse {
    #[schema(example = "Photo liked successfully")]
    pub message: String,
    pub likes: i32,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct LikesResponse {
    pub likes: i32,
}

/// Query parameters for `GET /photos`. All optional; combined conjunctively.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct PhotoFilterQuery {
    pub event: Option<String>,
    pub uploader: Option<String>,
    /// Inclusive lower bound, RFC 3339 or `YYYY-MM-DD`.
    #[serde(rename = "startDate")]
    pub start_date: Option<String>,
    /// Inclusive upper bound, RFC 3339 or `YYYY-MM-DD`.
    #[serde(rename = "endDate")]
    pub end_date: Option<String>,
    /// "true" selects approved records; any other value selects unapproved.
    pub approved: Option<String>,
}

/// Parse a date-bound query parameter. Bare dates mean midnight UTC.
pub fn parse_date_bound(value: &str) -> Result<DateTime<Utc>, AppError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        let midnight = date.and_hms_opt(0, 0, 0).expect("midnight is valid");
        return Ok(DateTime::from_naive_utc_and_offset(midnight, Utc));
    }
    Err(AppError::Validation(format!("Invalid date: {value}")))
}
