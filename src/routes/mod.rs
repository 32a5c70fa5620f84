use axum::http::HeaderValue;
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::{auth::AuthenticatedUser, state::AppState};

pub mod auth;
pub mod categories;
pub mod departments;
pub mod files;
pub mod folders;
pub mod health;
pub mod tracker;

pub fn create_router(state: AppState) -> Router<()> {
    let cors = if let Some(origins) = state.config.cors_allowed_origin.as_ref() {
        let headers: Vec<HeaderValue> = origins
            .split(',')
            .filter_map(|value| {
                let trimmed = value.trim();
                (!trimmed.is_empty()).then(|| {
                    trimmed
                        .parse::<HeaderValue>()
                        .expect("invalid CORS allowed origin")
                })
            })
            .collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(headers))
            .allow_methods(tower_http::cors::AllowMethods::mirror_request())
            .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
            .allow_credentials(true)
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::mirror_request())
            .allow_methods(tower_http::cors::AllowMethods::mirror_request())
            .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
            .allow_credentials(true)
    };

    let auth_routes = Router::new()
        .route("/login", post(auth::login))
        .route("/me", get(auth::me));

    let files_routes = Router::new()
        .route("/", post(files::upload_files))
        .route("/:id", delete(files::delete_file))
        .route("/:id/download", get(files::download_file))
        .route("/:id/favorite", post(files::toggle_favorite));

    let folders_routes = Router::new()
        .route("/resolve", post(folders::resolve_folder))
        .route("/:id/files", get(folders::list_folder_files));

    let tracker_routes = Router::new().route("/matrix", get(tracker::submission_matrix));

    let protected_state = state.clone();
    let protected_routes = Router::new()
        .nest("/api/files", files_routes)
        .nest("/api/folders", folders_routes)
        .nest("/api/tracker", tracker_routes)
        .route("/api/departments", get(departments::list_departments))
        .route("/api/categories", get(categories::list_categories))
        .layer(middleware::from_extractor_with_state::<AuthenticatedUser, _>(protected_state));

    Router::new()
        .merge(protected_routes)
        .nest("/api/auth", auth_routes)
        .route("/api/health", get(health::health_check))
        .with_state(state)
        .layer(cors)
        .layer(DefaultBodyLimit::max(1024 * 1024 * 256))
}
