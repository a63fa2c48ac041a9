use serde::Serialize;

use crate::models::photo::PhotoResponse;

/// Response for approve/disapprove, echoing the updated record.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ModerationResponse {
    #[schema(example = "Photo approved successfully")]
    pub message: String,
    pub photo: PhotoResponse,
}

/// Response for reject-and-delete.
#[derive(Serialize, utoipa::ToSchema)]
pub struct RejectResponse {
    #[schema(example = "Photo deleted successfully")]
    pub message: String,
}
