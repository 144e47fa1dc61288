use std::sync::Arc;

use thiserror::Error;

use blogapi_core::{NewPost, Post, PostId};

/// Storage operation error.
///
/// Every driver translates its backend's failures into this vocabulary.
/// `NotFound` and `ConnectionFailure` are the signals callers branch on;
/// everything else is carried opaquely.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No matching record (or, for listings, no records at all).
    #[error("entity not found")]
    NotFound,

    #[error("failed to connect to the database: {0}")]
    ConnectionFailure(String),

    #[error("storage operation '{operation}' timed out")]
    Timeout { operation: &'static str },

    #[error("storage error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionFailure(msg.into())
    }

    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

/// Post persistence contract shared by every driver.
///
/// ## Semantics
///
/// - `list` returns every stored post in the order the backend yields them.
///   An empty collection is reported as `StoreError::NotFound`.
/// - `get_by_id` and `update` report a missing id as `StoreError::NotFound`.
/// - `create` assigns `id`, `created_at` and `updated_at`.
/// - `update` replaces `title` and `body` and refreshes `updated_at`;
///   `created_at` is left untouched.
/// - `close` releases the underlying client/pool. Calls made after `close`
///   fail with a driver-specific error.
///
/// The network drivers (`postgres`, `mongo`) bound each operation by
/// [`OPERATION_TIMEOUT`](super::OPERATION_TIMEOUT); the in-memory driver
/// never blocks on I/O and is not bounded.
#[async_trait::async_trait]
pub trait PostStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Post>, StoreError>;

    async fn get_by_id(&self, id: PostId) -> Result<Post, StoreError>;

    async fn create(&self, draft: NewPost) -> Result<Post, StoreError>;

    async fn update(&self, id: PostId, draft: NewPost) -> Result<Post, StoreError>;

    async fn close(&self) -> Result<(), StoreError>;
}

#[async_trait::async_trait]
impl<S> PostStore for Arc<S>
where
    S: PostStore + ?Sized,
{
    async fn list(&self) -> Result<Vec<Post>, StoreError> {
        (**self).list().await
    }

    async fn get_by_id(&self, id: PostId) -> Result<Post, StoreError> {
        (**self).get_by_id(id).await
    }

    async fn create(&self, draft: NewPost) -> Result<Post, StoreError> {
        (**self).create(draft).await
    }

    async fn update(&self, id: PostId, draft: NewPost) -> Result<Post, StoreError> {
        (**self).update(id, draft).await
    }

    async fn close(&self) -> Result<(), StoreError> {
        (**self).close().await
    }
}
