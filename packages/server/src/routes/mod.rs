use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers;
use crate::state::AppState;

pub fn api_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/photos", photo_routes())
        .nest("/approvals", approval_routes())
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::auth::login))
        .routes(routes!(handlers::auth::is_admin))
        .routes(routes!(handlers::auth::me))
}

fn photo_routes() -> OpenApiRouter<AppState> {
    let upload = OpenApiRouter::new()
        .routes(routes!(handlers::photo::upload_photos))
        .layer(handlers::photo::upload_body_limit());

    OpenApiRouter::new()
        .routes(routes!(handlers::photo::filter_photos))
        .routes(routes!(handlers::photo::like_photo))
        .routes(routes!(handlers::photo::get_likes))
        .routes(routes!(handlers::photo::download_photo))
        .routes(routes!(handlers::photo::view_photo))
        .merge(upload)
}

fn approval_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        // The unapproved listing is deliberately left open; only the
        // mutating routes go through the admin extractor.
        .routes(routes!(handlers::approval::list_unapproved))
        .routes(routes!(
            handlers::approval::approve_photo,
            handlers::approval::reject_photo
        ))
        .routes(routes!(handlers::approval::disapprove_photo))
}
