/// Post ingest handler
use actix_web::{web, HttpResponse};

use super::AppState;
use crate::error::{AppError, Result};
use crate::models::Post;

/// Decode a post from the request body and index it.
///
/// The body is read as raw bytes so that any content type is accepted and a
/// malformed payload maps to a 400 with the decoder's message.
pub async fn create_post(state: web::Data<AppState>, body: web::Bytes) -> Result<HttpResponse> {
    tracing::info!("Received one post request");

    let post: Post = serde_json::from_slice(&body).map_err(|e| {
        tracing::warn!(error = %e, "Rejected malformed post body");
        AppError::BadRequest(format!("malformed post: {e}"))
    })?;

    let index = &state.config.elasticsearch.post_index;
    let id = state.index.index_post(index, &post).await.map_err(|e| {
        tracing::error!(error = %e, index = %index, "Failed to save post to Elasticsearch");
        AppError::IndexBackend
    })?;

    tracing::info!(id = %id, user = %post.user, "Post indexed");

    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(format!("Post received: {}\n", post.message)))
}
