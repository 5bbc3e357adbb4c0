use std::path::PathBuf;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use axum::Json;
use doodle_shared::GameConfig;

use crate::state::AppState;

pub async fn ping_handler() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}

pub async fn root_handler(
    axum::Extension(index_file): axum::Extension<PathBuf>,
) -> impl IntoResponse {
    match tokio::fs::read_to_string(&index_file).await {
        Ok(contents) => Html(contents).into_response(),
        Err(error) => {
            tracing::error!(path = %index_file.display(), %error, "failed to read index page");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub async fn config_handler(State(state): State<AppState>) -> Json<GameConfig> {
    Json(*state.config)
}
