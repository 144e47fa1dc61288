//! Service wiring: the post service over the configured store, plus the
//! validator shared by every handler.

use std::sync::Arc;

use thiserror::Error;

use blogapi_core::{NewPost, Post, PostId, PostValidator};
use blogapi_infra::config::DatabaseConfig;
use blogapi_infra::post_store::{self, PostStore, StoreError};

/// Service-level error.
///
/// The only translation performed: storage `NotFound` becomes `PostNotFound`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("the requested post was not found")]
    PostNotFound,

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => Self::PostNotFound,
            other => Self::Store(other),
        }
    }
}

/// Pass-through service over a [`PostStore`].
#[derive(Clone)]
pub struct PostService {
    store: Arc<dyn PostStore>,
}

impl PostService {
    pub fn new(store: Arc<dyn PostStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Result<Vec<Post>, ServiceError> {
        Ok(self.store.list().await?)
    }

    pub async fn get(&self, id: PostId) -> Result<Post, ServiceError> {
        Ok(self.store.get_by_id(id).await?)
    }

    pub async fn create(&self, draft: NewPost) -> Result<Post, ServiceError> {
        Ok(self.store.create(draft).await?)
    }

    pub async fn update(&self, id: PostId, draft: NewPost) -> Result<Post, ServiceError> {
        Ok(self.store.update(id, draft).await?)
    }

    /// Release the underlying store. Called once at shutdown.
    pub async fn close(&self) -> Result<(), ServiceError> {
        Ok(self.store.close().await?)
    }
}

/// Everything the handlers need, shared read-only across requests.
#[derive(Clone)]
pub struct AppServices {
    pub posts: PostService,
    pub validator: PostValidator,
}

impl AppServices {
    pub fn new(store: Arc<dyn PostStore>) -> Self {
        Self {
            posts: PostService::new(store),
            validator: PostValidator::new(),
        }
    }
}

/// Connect the configured store and wire the services around it.
pub async fn build_services(database: &DatabaseConfig) -> Result<AppServices, StoreError> {
    tracing::info!(db_type = database.kind(), "initializing post store");
    let store = post_store::connect(database).await?;
    Ok(AppServices::new(store))
}
