use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use blogapi_core::{NewPost, PostId};

use crate::app::dto::{PostResponse, PostWrittenResponse, PostsResponse};
use crate::app::errors;
use crate::app::services::{AppServices, ServiceError};

const POST_NOT_FOUND: &str = "post not found";
const INVALID_PAYLOAD: &str = "invalid request payload";
const MISSING_FIELDS: &str = "missing required fields";

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_posts).post(create_post))
        .route("/:id", get(get_post).put(update_post))
}

pub async fn list_posts(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.posts.list().await {
        Ok(posts) => (StatusCode::OK, Json(PostsResponse { posts })).into_response(),
        // An empty store surfaces here too; listing does not distinguish it.
        Err(e) => {
            tracing::error!(error = %e, "failed to list posts");
            errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, "failed to get posts")
        }
    }
}

pub async fn get_post(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let Ok(id) = id.parse::<PostId>() else {
        return errors::json_error(StatusCode::NOT_FOUND, POST_NOT_FOUND);
    };

    match services.posts.get(id).await {
        Ok(post) => (StatusCode::OK, Json(PostResponse { post })).into_response(),
        Err(ServiceError::PostNotFound) => {
            errors::json_error(StatusCode::NOT_FOUND, POST_NOT_FOUND)
        }
        Err(e) => {
            tracing::error!(error = %e, post_id = %id, "failed to get post");
            errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

pub async fn create_post(
    Extension(services): Extension<Arc<AppServices>>,
    body: Bytes,
) -> axum::response::Response {
    let draft = match decode_and_validate(&services, &body) {
        Ok(draft) => draft,
        Err(response) => return response,
    };

    match services.posts.create(draft).await {
        Ok(post) => {
            tracing::info!(post_id = %post.id, "post created");
            (StatusCode::CREATED, Json(PostWrittenResponse::created(post))).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to create post");
            errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, "failed to create post")
        }
    }
}

pub async fn update_post(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Bytes,
) -> axum::response::Response {
    let Ok(id) = id.parse::<PostId>() else {
        return errors::json_error(StatusCode::NOT_FOUND, POST_NOT_FOUND);
    };

    let draft = match decode_and_validate(&services, &body) {
        Ok(draft) => draft,
        Err(response) => return response,
    };

    match services.posts.update(id, draft).await {
        Ok(post) => {
            tracing::info!(post_id = %post.id, "post updated");
            (StatusCode::OK, Json(PostWrittenResponse::updated(post))).into_response()
        }
        Err(ServiceError::PostNotFound) => {
            errors::json_error(StatusCode::NOT_FOUND, POST_NOT_FOUND)
        }
        Err(e) => {
            tracing::error!(error = %e, post_id = %id, "failed to update post");
            errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, "failed to update post")
        }
    }
}

/// Decode the JSON body and apply the shared validator.
///
/// The `Content-Type` header is not consulted. A body that does not decode
/// (bad JSON, empty body, wrong field types) is a 400 "invalid request
/// payload"; a decoded draft with an empty title or body is a 400 "missing
/// required fields".
fn decode_and_validate(
    services: &AppServices,
    body: &[u8],
) -> Result<NewPost, axum::response::Response> {
    let draft = serde_json::from_slice::<NewPost>(body).map_err(|e| {
        tracing::debug!(error = %e, "rejected post payload");
        errors::json_error(StatusCode::BAD_REQUEST, INVALID_PAYLOAD)
    })?;

    services
        .validator
        .validate(&draft)
        .map_err(|_| errors::json_error(StatusCode::BAD_REQUEST, MISSING_FIELDS))?;

    Ok(draft)
}
