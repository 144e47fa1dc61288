//! Postgres-backed post store.
//!
//! ## Error Mapping
//!
//! | SQLx Error | StoreError |
//! |------------|------------|
//! | `RowNotFound` | `NotFound` |
//! | `PoolClosed`, `PoolTimedOut`, `Io`, `Tls` | `ConnectionFailure` |
//! | `Database` and anything else | `Backend` |
//!
//! `fetch_optional` returning `None` (unknown id on read or update) is also
//! reported as `NotFound`.
//!
//! The schema lives in `sql/posts.sql`; this driver does not create it.

use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{FromRow, PgPool, Row};
use tracing::instrument;

use blogapi_core::{NewPost, Post, PostId};

use super::r#trait::{PostStore, StoreError};
use super::{bounded, bounded_by, CONNECT_TIMEOUT};

const MAX_CONNECTIONS: u32 = 10;

const SELECT_ALL: &str = r#"
    SELECT id, title, body, created_at, updated_at
    FROM posts
    ORDER BY id ASC
"#;

const SELECT_BY_ID: &str = r#"
    SELECT id, title, body, created_at, updated_at
    FROM posts
    WHERE id = $1
"#;

const INSERT: &str = r#"
    INSERT INTO posts (title, body)
    VALUES ($1, $2)
    RETURNING id, title, body, created_at, updated_at
"#;

const UPDATE: &str = r#"
    UPDATE posts
    SET title = $1, body = $2, updated_at = now()
    WHERE id = $3
    RETURNING id, title, body, created_at, updated_at
"#;

/// Postgres-backed post store.
///
/// Uses the SQLx connection pool, which is `Send + Sync` and handles
/// connection management for concurrent requests.
#[derive(Debug, Clone)]
pub struct PostgresPostStore {
    pool: PgPool,
}

#[derive(Debug)]
struct PostRow {
    id: i64,
    title: String,
    body: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for PostRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            body: row.try_get("body")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Post {
            id: PostId::new(row.id),
            title: row.title,
            body: row.body,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl PostgresPostStore {
    /// Wrap an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool against `url` and verify that one connection succeeds.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let options = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(CONNECT_TIMEOUT);

        let pool = bounded_by(CONNECT_TIMEOUT, "connect", async move {
            options
                .connect(url)
                .await
                .map_err(|e| StoreError::connection(e.to_string()))
        })
        .await
        .inspect_err(|e| tracing::error!(error = %e, "postgres connection failed"))?;

        tracing::info!("connected to postgres");
        Ok(Self::new(pool))
    }
}

#[async_trait::async_trait]
impl PostStore for PostgresPostStore {
    #[instrument(skip(self), err)]
    async fn list(&self) -> Result<Vec<Post>, StoreError> {
        let rows = bounded("list", async {
            sqlx::query_as::<_, PostRow>(SELECT_ALL)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("list", e))
        })
        .await?;

        if rows.is_empty() {
            return Err(StoreError::NotFound);
        }
        Ok(rows.into_iter().map(Post::from).collect())
    }

    #[instrument(skip(self), fields(post_id = %id), err)]
    async fn get_by_id(&self, id: PostId) -> Result<Post, StoreError> {
        bounded("get_by_id", async {
            sqlx::query_as::<_, PostRow>(SELECT_BY_ID)
                .bind(id.get())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("get_by_id", e))
        })
        .await?
        .map(Post::from)
        .ok_or(StoreError::NotFound)
    }

    #[instrument(skip(self, draft), err)]
    async fn create(&self, draft: NewPost) -> Result<Post, StoreError> {
        let row = bounded("create", async {
            sqlx::query_as::<_, PostRow>(INSERT)
                .bind(&draft.title)
                .bind(&draft.body)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("create", e))
        })
        .await?;

        Ok(row.into())
    }

    #[instrument(skip(self, draft), fields(post_id = %id), err)]
    async fn update(&self, id: PostId, draft: NewPost) -> Result<Post, StoreError> {
        bounded("update", async {
            sqlx::query_as::<_, PostRow>(UPDATE)
                .bind(&draft.title)
                .bind(&draft.body)
                .bind(id.get())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("update", e))
        })
        .await?
        .map(Post::from)
        .ok_or(StoreError::NotFound)
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.pool.close().await;
        tracing::info!("postgres pool closed");
        Ok(())
    }
}

/// Map SQLx errors onto the shared storage vocabulary.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::RowNotFound => StoreError::NotFound,
        sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut => {
            StoreError::connection(format!("connection pool unavailable in {operation}: {err}"))
        }
        sqlx::Error::Io(_) | sqlx::Error::Tls(_) => {
            StoreError::connection(format!("connection error in {operation}: {err}"))
        }
        sqlx::Error::Database(db_err) => {
            StoreError::backend(format!("database error in {operation}: {}", db_err.message()))
        }
        other => StoreError::backend(format!("sqlx error in {operation}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_decodable<T: for<'r> FromRow<'r, PgRow>>() {}

    #[test]
    fn post_row_decodes_from_postgres_rows() {
        assert_decodable::<PostRow>();
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        assert_eq!(
            map_sqlx_error("get_by_id", sqlx::Error::RowNotFound),
            StoreError::NotFound
        );
    }

    #[test]
    fn pool_errors_map_to_connection_failure() {
        assert!(matches!(
            map_sqlx_error("list", sqlx::Error::PoolClosed),
            StoreError::ConnectionFailure(_)
        ));
        assert!(matches!(
            map_sqlx_error("list", sqlx::Error::PoolTimedOut),
            StoreError::ConnectionFailure(_)
        ));
    }

    #[test]
    fn other_errors_are_opaque_backend_errors() {
        let err = map_sqlx_error("create", sqlx::Error::Protocol("bad frame".to_string()));
        let StoreError::Backend(msg) = err else {
            panic!("expected backend error");
        };
        assert!(msg.contains("create"));
        assert!(msg.contains("bad frame"));
    }

    /// Requires a live database with `sql/posts.sql` applied:
    /// `POSTGRESQL_URL=postgres://... cargo test -p blogapi-infra -- --ignored`
    #[tokio::test]
    #[ignore]
    async fn round_trip_against_live_postgres() {
        let url = std::env::var("POSTGRESQL_URL").expect("POSTGRESQL_URL not set");
        let store = PostgresPostStore::connect(&url).await.unwrap();

        let created = store.create(NewPost::new("pg title", "pg body")).await.unwrap();
        assert_eq!(store.get_by_id(created.id).await.unwrap(), created);

        let updated = store
            .update(created.id, NewPost::new("pg title 2", "pg body 2"))
            .await
            .unwrap();
        assert_eq!(updated.title, "pg title 2");
        assert!(updated.updated_at >= created.updated_at);

        assert!(store.list().await.unwrap().iter().any(|p| p.id == created.id));
        assert_eq!(
            store.get_by_id(PostId::new(i64::MAX)).await,
            Err(StoreError::NotFound)
        );

        store.close().await.unwrap();
    }
}
