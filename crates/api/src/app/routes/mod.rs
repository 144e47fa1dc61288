use axum::Router;

pub mod posts;
pub mod system;

/// Router for the post resource.
pub fn router() -> Router {
    Router::new().nest("/posts", posts::router())
}
