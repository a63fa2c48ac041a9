use axum::Json;
use axum::extract::{Path, State};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use tracing::instrument;

use crate::entity::photo;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AdminUser;
use crate::handlers::photo::{find_photo, parse_photo_id};
use crate::models::approval::{ModerationResponse, RejectResponse};
use crate::models::photo::PhotoResponse;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/",
    tag = "Approvals",
    operation_id = "listUnapproved",
    summary = "List unapproved photos",
    description = "Returns all photos awaiting moderation, newest first.",
    responses(
        (status = 200, description = "Unapproved photos", body = Vec<PhotoResponse>),
    ),
)]
#[instrument(skip(state))]
pub async fn list_unapproved(
    State(state): State<AppState>,
) -> Result<Json<Vec<PhotoResponse>>, AppError> {
    let records = photo::Entity::find()
        .filter(photo::Column::Approval.eq(false))
        .order_by_desc(photo::Column::UploadedAt)
        .all(&state.db)
        .await?;

    Ok(Json(records.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/{id}",
    tag = "Approvals",
    operation_id = "approvePhoto",
    summary = "Approve a photo",
    params(("id" = String, Path, description = "Photo blob identifier")),
    responses(
        (status = 200, description = "Photo approved", body = ModerationResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not an admin (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Photo not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("session" = [])),
)]
#[instrument(skip(admin, state), fields(admin = %admin.0.email, id))]
pub async fn approve_photo(
    admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ModerationResponse>, AppError> {
    set_approval(&state, &id, true, "Photo approved successfully").await
}

#[utoipa::path(
    post,
    path = "/{id}/disapprove",
    tag = "Approvals",
    operation_id = "disapprovePhoto",
    summary = "Disapprove a photo",
    params(("id" = String, Path, description = "Photo blob identifier")),
    responses(
        (status = 200, description = "Photo disapproved", body = ModerationResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not an admin (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Photo not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("session" = [])),
)]
#[instrument(skip(admin, state), fields(admin = %admin.0.email, id))]
pub async fn disapprove_photo(
    admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ModerationResponse>, AppError> {
    set_approval(&state, &id, false, "Photo disapproved successfully").await
}

async fn set_approval(
    state: &AppState,
    id: &str,
    approved: bool,
    message: &str,
) -> Result<Json<ModerationResponse>, AppError> {
    let blob_id = parse_photo_id(id)?;
    let record = find_photo(state, &blob_id).await?;

    let mut active: photo::ActiveModel = record.into();
    active.approval = Set(approved);
    let updated = active.update(&state.db).await?;

    Ok(Json(ModerationResponse {
        message: message.into(),
        photo: updated.into(),
    }))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Approvals",
    operation_id = "rejectPhoto",
    summary = "Reject a photo and delete it",
    description = "Deletes the blob, then the metadata record. The two deletes are not \
        transactional; a failure between them leaves a dangling metadata record.",
    params(("id" = String, Path, description = "Photo blob identifier")),
    responses(
        (status = 200, description = "Photo deleted", body = RejectResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not an admin (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Photo not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("session" = [])),
)]
#[instrument(skip(admin, state), fields(admin = %admin.0.email, id))]
pub async fn reject_photo(
    admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RejectResponse>, AppError> {
    let blob_id = parse_photo_id(&id)?;
    let record = find_photo(&state, &blob_id).await?;

    // Blob first, metadata second.
    state.blob_store.delete(&blob_id).await?;
    photo::Entity::delete_by_id(record.id)
        .exec(&state.db)
        .await?;

    tracing::info!(blob_id = %blob_id, "photo rejected and deleted");

    Ok(Json(RejectResponse {
        message: "Photo deleted successfully".into(),
    }))
}
