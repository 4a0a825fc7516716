use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, State},
    routing::post,
    Json, Router,
};
use tracing::{debug, instrument, warn};

use super::services::{upload_blog_image, UploadItem, UploadedImage, MAX_IMAGE_BYTES};
use crate::{
    auth::extractors::RequireAdmin,
    error::{ApiError, ApiResult},
    state::AppState,
};

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/upload/blog-image", post(upload_image))
        // Room for multipart framing so oversize files reach validation and get a clear message.
        .layer(DefaultBodyLimit::max(2 * MAX_IMAGE_BYTES))
}

/// POST /upload/blog-image (multipart, field `file`)
#[instrument(skip(state, admin, mp))]
pub async fn upload_image(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    mp: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<UploadedImage>> {
    debug!(uploaded_by = %admin.email, "blog image upload");
    let mut mp = mp.map_err(|e| ApiError::invalid(e.body_text()))?;
    while let Some(field) = mp.next_field().await.map_err(|e| {
        warn!(error = %e, "malformed multipart body");
        ApiError::invalid("Malformed upload")
    })? {
        if field.name() != Some("file") {
            continue;
        }
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let body = field.bytes().await.map_err(|e| {
            warn!(error = %e, "failed reading upload");
            ApiError::invalid("Malformed upload")
        })?;
        let item = UploadItem {
            body,
            content_type: &content_type,
        };
        return Ok(Json(upload_blog_image(state.storage.as_ref(), item).await?));
    }
    Err(ApiError::invalid("No file provided"))
}
