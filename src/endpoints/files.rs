use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tokio_util::io::ReaderStream;

use crate::error::Result;
use crate::middleware::{Authenticated, ClientMeta};
use crate::models::book_file;
use crate::models::user;
use crate::services::access::{authorize_file, record_download, AccessMode};
use crate::state::AppState;

pub fn file_routes(state: AppState) -> Router {
    Router::new()
        .route("/download/{file_id}", get(download_file))
        .route("/preview/{file_id}", get(preview_file))
        .with_state(state)
}

/// Quote-safe file name for `Content-Disposition`
fn disposition_name(file_name: &str) -> String {
    file_name
        .chars()
        .filter(|c| !c.is_control() && *c != '"' && *c != '\\')
        .collect()
}

/// Open the stored bytes, then log the access. Missing files are never logged.
async fn stream_file(
    state: &AppState,
    current: &user::Model,
    client: &ClientMeta,
    file: &book_file::Model,
    content_type: &str,
    disposition: &str,
) -> Result<Response> {
    let handle = state.storage.open(&file.stored_path).await?;
    record_download(&state.db, file, current, client).await;
    let body = Body::from_stream(ReaderStream::new(handle));

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!(
                    "{}; filename=\"{}\"",
                    disposition,
                    disposition_name(&file.file_name)
                ),
            ),
        ],
        body,
    )
        .into_response())
}

/// Download a book file as an attachment
async fn download_file(
    State(state): State<AppState>,
    Authenticated(current): Authenticated,
    client: ClientMeta,
    Path(file_id): Path<i64>,
) -> Result<Response> {
    let file = authorize_file(&state.db, &current, file_id, AccessMode::Download).await?;
    stream_file(
        &state,
        &current,
        &client,
        &file,
        "application/octet-stream",
        "attachment",
    )
    .await
}

/// Render a previewable book file inline
async fn preview_file(
    State(state): State<AppState>,
    Authenticated(current): Authenticated,
    client: ClientMeta,
    Path(file_id): Path<i64>,
) -> Result<Response> {
    let file = authorize_file(&state.db, &current, file_id, AccessMode::Preview).await?;
    let content_type = file
        .extension()
        .and_then(|ext| book_file::preview_content_type(&ext))
        .unwrap_or("application/octet-stream");
    stream_file(&state, &current, &client, &file, content_type, "inline").await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disposition_name_strips_quotes() {
        assert_eq!(disposition_name("a\"b\\c\n.pdf"), "abc.pdf");
        assert_eq!(disposition_name("Thesis 2026.pdf"), "Thesis 2026.pdf");
    }
}
