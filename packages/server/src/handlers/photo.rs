use std::io::Cursor;

use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::Response;
use axum::{Json, body::Body};
use chrono::Utc;
use common::storage::{BlobId, BoxReader};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use tokio_util::io::ReaderStream;
use tracing::instrument;

use crate::entity::photo;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::SessionUser;
use crate::models::photo::{
    FilterResponse, LikeResponse, LikesResponse, PhotoFilterQuery, UploadResponse, UploadedPhoto,
    parse_date_bound,
};
use crate::scan::ScanVerdict;
use crate::state::AppState;
use crate::utils::filename::{Disposition, content_disposition};
use crate::utils::image;

pub fn upload_body_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(64 * 1024 * 1024) // 64 MB
}

/// One file pulled out of the multipart body.
struct UploadedFile {
    file_name: String,
    content_type: String,
    data: Vec<u8>,
}

/// Common form fields accompanying an upload batch.
#[derive(Default)]
struct UploadForm {
    title: String,
    uploader: String,
    uploader_email: String,
    event: String,
    approved: bool,
}

#[utoipa::path(
    post,
    path = "/upload",
    tag = "Photos",
    operation_id = "uploadPhotos",
    summary = "Upload a batch of photos",
    description = "Accepts repeated `files` fields plus `title`, `uploaderName`, `userEmail`, \
        `event` and `approved` form fields. Each file is scanned for malware, compressed, \
        stored, and recorded, strictly in order. An infected file or a failing scan aborts \
        the rest of the batch; files stored before the abort are kept.",
    request_body(content_type = "multipart/form-data", description = "Photo batch with metadata"),
    responses(
        (status = 200, description = "All files stored", body = UploadResponse),
        (status = 400, description = "Empty batch, unreadable image, or infected file \
            (VALIDATION_ERROR, INFECTED_FILE)", body = ErrorBody),
        (status = 502, description = "Scan service failure (UPSTREAM_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, multipart))]
pub async fn upload_photos(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut files: Vec<UploadedFile> = Vec::new();
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        match field.name() {
            Some("files") => {
                let file_name = field.file_name().unwrap_or("file").to_string();
                let content_type = match field.content_type() {
                    Some(ct) => ct.to_string(),
                    None => mime_guess::from_path(&file_name)
                        .first()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "application/octet-stream".into()),
                };
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?
                    .to_vec();
                files.push(UploadedFile {
                    file_name,
                    content_type,
                    data,
                });
            }
            Some("title") => form.title = read_text_field(field).await?,
            Some("uploaderName") => form.uploader = read_text_field(field).await?,
            Some("userEmail") => form.uploader_email = read_text_field(field).await?,
            Some("event") => form.event = read_text_field(field).await?,
            Some("approved") => form.approved = read_text_field(field).await? == "true",
            _ => {} // Ignore unknown fields.
        }
    }

    if files.is_empty() {
        return Err(AppError::Validation("No files uploaded".into()));
    }

    if form.uploader.is_empty() {
        form.uploader = "unknown".into();
    }
    if form.uploader_email.is_empty() {
        form.uploader_email = "unknown".into();
    }

    tracing::info!(count = files.len(), "received files for upload");

    let mut uploaded = Vec::with_capacity(files.len());

    // Files are processed strictly sequentially. A failure aborts the rest of
    // the batch but does not roll back files already persisted.
    for file in files {
        let file_id = store_one(&state, &form, &file).await?;
        uploaded.push(UploadedPhoto {
            filename: file.file_name,
            file_id,
        });
    }

    tracing::info!(count = uploaded.len(), "all files uploaded");

    Ok(Json(UploadResponse {
        message: "Files uploaded successfully".into(),
        files: uploaded,
    }))
}

/// Run the scan → transform → blob write → metadata write pipeline for one
/// file, returning the assigned blob id.
async fn store_one(
    state: &AppState,
    form: &UploadForm,
    file: &UploadedFile,
) -> Result<String, AppError> {
    tracing::debug!(file = %file.file_name, size = file.data.len(), "processing file");

    let scan_id = state.scanner.submit(file.data.clone()).await?;
    let verdict = state.scanner.verdict(&scan_id).await?;
    if verdict == ScanVerdict::Infected {
        tracing::warn!(file = %file.file_name, "virus detected");
        return Err(AppError::Infected {
            filename: file.file_name.clone(),
        });
    }

    let compressed = image::compress(file.data.clone())
        .await
        .map_err(|e| AppError::Validation(format!("Failed to process {}: {e}", file.file_name)))?;
    let file_size = compressed.len() as i64;

    let reader: BoxReader = Box::new(Cursor::new(compressed));
    let blob_id = state.blob_store.put_stream(reader).await?;

    let record = photo::ActiveModel {
        blob_id: Set(blob_id.as_uuid()),
        file_name: Set(file.file_name.clone()),
        content_type: Set(file.content_type.clone()),
        file_size: Set(file_size),
        uploaded_at: Set(Utc::now()),
        uploader: Set(form.uploader.clone()),
        uploader_email: Set(form.uploader_email.clone()),
        title: Set(form.title.clone()),
        description: Set(None),
        event: Set(form.event.clone()),
        approval: Set(form.approved),
        likes: Set(0),
        liked_by: Set(serde_json::json!([])),
        ..Default::default()
    };
    record.insert(&state.db).await?;

    Ok(blob_id.to_string())
}

async fn read_text_field(field: axum::extract::multipart::Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read form field: {e}")))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Photos",
    operation_id = "filterPhotos",
    summary = "Filtered photo listing",
    description = "Conjunctive filter over event, uploader, upload date range (inclusive) \
        and approval flag, sorted by likes then upload time, both descending. An empty \
        result is a 404, not an empty list.",
    params(PhotoFilterQuery),
    responses(
        (status = 200, description = "Matching photos", body = FilterResponse),
        (status = 400, description = "Malformed date bound (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "No matches (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, params))]
pub async fn filter_photos(
    State(state): State<AppState>,
    Query(params): Query<PhotoFilterQuery>,
) -> Result<Json<FilterResponse>, AppError> {
    let mut query = photo::Entity::find();

    if let Some(event) = &params.event {
        query = query.filter(photo::Column::Event.eq(event));
    }
    if let Some(uploader) = &params.uploader {
        query = query.filter(photo::Column::Uploader.eq(uploader));
    }
    if let Some(start) = &params.start_date {
        query = query.filter(photo::Column::UploadedAt.gte(parse_date_bound(start)?));
    }
    if let Some(end) = &params.end_date {
        query = query.filter(photo::Column::UploadedAt.lte(parse_date_bound(end)?));
    }
    if let Some(approved) = &params.approved {
        query = query.filter(photo::Column::Approval.eq(approved == "true"));
    }

    let files = query
        .order_by_desc(photo::Column::Likes)
        .order_by_desc(photo::Column::UploadedAt)
        .all(&state.db)
        .await?;

    if files.is_empty() {
        return Err(AppError::NotFound(
            "No files found matching the filters".into(),
        ));
    }

    Ok(Json(FilterResponse {
        message: "Files fetched successfully".into(),
        files: files.into_iter().map(Into::into).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/{id}/like",
    tag = "Photos",
    operation_id = "likePhoto",
    summary = "Like a photo",
    description = "Registers one like per identity. The like count and the liker set are \
        written by a single row update, so they never diverge.",
    params(("id" = String, Path, description = "Photo blob identifier")),
    responses(
        (status = 200, description = "Like registered", body = LikeResponse),
        (status = 400, description = "Malformed identifier (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Photo not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Caller already liked this photo (ALREADY_LIKED)", body = ErrorBody),
    ),
    security(("session" = [])),
)]
#[instrument(skip(user, state), fields(email = %user.email, id))]
pub async fn like_photo(
    user: SessionUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<LikeResponse>, AppError> {
    let blob_id = parse_photo_id(&id)?;
    let record = find_photo(&state, &blob_id).await?;

    let mut liked_by = record.liked_by_list();
    if liked_by.iter().any(|e| *e == user.email) {
        return Err(AppError::AlreadyLiked);
    }

    liked_by.push(user.email.clone());
    let likes = record.likes + 1;

    let mut active: photo::ActiveModel = record.into();
    active.likes = Set(likes);
    active.liked_by = Set(serde_json::json!(liked_by));
    active.update(&state.db).await?;

    Ok(Json(LikeResponse {
        message: "Photo liked successfully".into(),
        likes,
    }))
}

#[utoipa::path(
    get,
    path = "/{id}/likes",
    tag = "Photos",
    operation_id = "getLikes",
    summary = "Current like count",
    params(("id" = String, Path, description = "Photo blob identifier")),
    responses(
        (status = 200, description = "Like count", body = LikesResponse),
        (status = 400, description = "Malformed identifier (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Photo not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn get_likes(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<LikesResponse>, AppError> {
    let blob_id = parse_photo_id(&id)?;
    let record = find_photo(&state, &blob_id).await?;

    Ok(Json(LikesResponse {
        likes: record.likes,
    }))
}

#[utoipa::path(
    get,
    path = "/{id}/download",
    tag = "Photos",
    operation_id = "downloadPhoto",
    summary = "Download a photo as an attachment",
    params(("id" = String, Path, description = "Photo blob identifier")),
    responses(
        (status = 200, description = "Photo bytes"),
        (status = 400, description = "Malformed identifier (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Photo or blob missing (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn download_photo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let blob_id = parse_photo_id(&id)?;
    let record = find_photo(&state, &blob_id).await?;

    let reader = state
        .blob_store
        .get_stream(&blob_id)
        .await
        .map_err(|_| AppError::NotFound("File stream error".into()))?;

    blob_response(
        reader,
        "image/jpeg",
        record.file_size,
        Disposition::Attachment,
        &record.file_name,
    )
}

#[utoipa::path(
    get,
    path = "/{id}/view",
    tag = "Photos",
    operation_id = "viewPhoto",
    summary = "Stream a photo inline",
    description = "Streams the stored bytes with the recorded content type. If the blob \
        turns out to be missing or corrupt, the dangling metadata record and blob are \
        removed opportunistically and the caller gets a 404.",
    params(("id" = String, Path, description = "Photo blob identifier")),
    responses(
        (status = 200, description = "Photo bytes"),
        (status = 400, description = "Malformed identifier (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Photo missing, or blob corrupt and cleaned up \
            (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn view_photo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let blob_id = parse_photo_id(&id)?;
    let record = find_photo(&state, &blob_id).await?;

    match state.blob_store.get_stream(&blob_id).await {
        Ok(reader) => blob_response(
            reader,
            &record.content_type,
            record.file_size,
            Disposition::Inline,
            &record.file_name,
        ),
        Err(err) => {
            // Opportunistic repair: the metadata points at a blob that cannot
            // be read, so drop both sides and report not-found.
            tracing::warn!(blob_id = %blob_id, error = %err, "blob unreadable, deleting record");
            let _ = state.blob_store.delete(&blob_id).await;
            photo::Entity::delete_many()
                .filter(photo::Column::BlobId.eq(blob_id.as_uuid()))
                .exec(&state.db)
                .await?;
            Err(AppError::NotFound(
                "File was corrupt or missing. Deleted from database.".into(),
            ))
        }
    }
}

/// Parse a path identifier, mapping malformed input to a validation error.
pub(crate) fn parse_photo_id(id: &str) -> Result<BlobId, AppError> {
    BlobId::parse(id).map_err(|_| AppError::Validation("Invalid ID format".into()))
}

/// Look up the photo record owning a blob.
pub(crate) async fn find_photo(
    state: &AppState,
    blob_id: &BlobId,
) -> Result<photo::Model, AppError> {
    photo::Entity::find()
        .filter(photo::Column::BlobId.eq(blob_id.as_uuid()))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Photo not found".into()))
}

/// Build a streaming response for blob bytes.
fn blob_response(
    reader: BoxReader,
    content_type: &str,
    size: i64,
    disposition: Disposition,
    file_name: &str,
) -> Result<Response, AppError> {
    let stream = ReaderStream::new(reader);
    let body = Body::from_stream(stream);

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, size.to_string())
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition(disposition, file_name),
        )
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}
