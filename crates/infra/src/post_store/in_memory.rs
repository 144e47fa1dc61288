use std::collections::BTreeMap;
use std::sync::RwLock;

use chrono::Utc;

use blogapi_core::{NewPost, Post, PostId};

use super::r#trait::{PostStore, StoreError};

#[derive(Debug, Default)]
struct Inner {
    last_id: i64,
    posts: BTreeMap<PostId, Post>,
    closed: bool,
}

/// In-memory post store.
///
/// Intended for tests/dev. Ids are assigned sequentially from 1 and listings
/// come back in id order.
#[derive(Debug, Default)]
pub struct InMemoryPostStore {
    inner: RwLock<Inner>,
}

impl InMemoryPostStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with `posts`.
    ///
    /// The id sequence continues after the highest seeded id.
    pub fn with_posts(posts: impl IntoIterator<Item = Post>) -> Self {
        let mut inner = Inner::default();
        for post in posts {
            inner.last_id = inner.last_id.max(post.id.get());
            inner.posts.insert(post.id, post);
        }
        Self {
            inner: RwLock::new(inner),
        }
    }

    fn poisoned() -> StoreError {
        StoreError::backend("lock poisoned")
    }

    fn closed() -> StoreError {
        StoreError::connection("store is closed")
    }
}

#[async_trait::async_trait]
impl PostStore for InMemoryPostStore {
    async fn list(&self) -> Result<Vec<Post>, StoreError> {
        let inner = self.inner.read().map_err(|_| Self::poisoned())?;
        if inner.closed {
            return Err(Self::closed());
        }
        if inner.posts.is_empty() {
            return Err(StoreError::NotFound);
        }
        Ok(inner.posts.values().cloned().collect())
    }

    async fn get_by_id(&self, id: PostId) -> Result<Post, StoreError> {
        let inner = self.inner.read().map_err(|_| Self::poisoned())?;
        if inner.closed {
            return Err(Self::closed());
        }
        inner.posts.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    async fn create(&self, draft: NewPost) -> Result<Post, StoreError> {
        let mut inner = self.inner.write().map_err(|_| Self::poisoned())?;
        if inner.closed {
            return Err(Self::closed());
        }

        let id = inner
            .last_id
            .checked_add(1)
            .ok_or_else(|| StoreError::backend("post id sequence exhausted"))?;
        inner.last_id = id;
        let now = Utc::now();
        let post = Post {
            id: PostId::new(id),
            title: draft.title,
            body: draft.body,
            created_at: now,
            updated_at: now,
        };
        inner.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn update(&self, id: PostId, draft: NewPost) -> Result<Post, StoreError> {
        let mut inner = self.inner.write().map_err(|_| Self::poisoned())?;
        if inner.closed {
            return Err(Self::closed());
        }

        let post = inner.posts.get_mut(&id).ok_or(StoreError::NotFound)?;
        post.title = draft.title;
        post.body = draft.body;
        post.updated_at = Utc::now().max(post.created_at);
        Ok(post.clone())
    }

    async fn close(&self) -> Result<(), StoreError> {
        let mut inner = self.inner.write().map_err(|_| Self::poisoned())?;
        inner.closed = true;
        Ok(())
    }
}
