//! MongoDB-backed post store.
//!
//! Posts live in the `blog` database, `posts` collection. Besides Mongo's own
//! `_id`, every document carries an integer `id` allocated from the
//! `counters` collection with an atomic upsert-and-increment, so both drivers
//! expose the same integer identifiers.
//!
//! ## Error Mapping
//!
//! | Driver signal | StoreError |
//! |---------------|------------|
//! | `find_one` / `find_one_and_update` returning `None` | `NotFound` |
//! | server selection, I/O, DNS, pool cleared | `ConnectionFailure` |
//! | anything else | `Backend` |

use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use bson::{doc, Document};
use chrono::{DateTime, Utc};
use mongodb::error::ErrorKind;
use mongodb::options::{ClientOptions, FindOneAndUpdateOptions, FindOptions, ReturnDocument};
use mongodb::{Client, Collection};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use blogapi_core::{NewPost, Post, PostId};

use super::r#trait::{PostStore, StoreError};
use super::{bounded, bounded_by, CONNECT_TIMEOUT};

const DATABASE_NAME: &str = "blog";
const POSTS_COLLECTION: &str = "posts";
const COUNTERS_COLLECTION: &str = "counters";
const POSTS_COUNTER: &str = "posts";
const APP_NAME: &str = "blogapi";

/// On-wire shape of a post document.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PostDocument {
    id: i64,
    title: String,
    body: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    updated_at: DateTime<Utc>,
}

impl From<PostDocument> for Post {
    fn from(doc: PostDocument) -> Self {
        Post {
            id: PostId::new(doc.id),
            title: doc.title,
            body: doc.body,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        }
    }
}

/// MongoDB-backed post store.
///
/// `mongodb::Client` pools connections internally and is cheap to clone.
#[derive(Debug, Clone)]
pub struct MongoPostStore {
    client: Client,
    posts: Collection<PostDocument>,
    counters: Collection<Document>,
}

impl MongoPostStore {
    /// Connect to `url` and ping the server before returning.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = bounded_by(CONNECT_TIMEOUT, "connect", async move {
            let mut options = ClientOptions::parse(url)
                .await
                .map_err(|e| StoreError::connection(e.to_string()))?;
            options.connect_timeout = Some(CONNECT_TIMEOUT);
            options.server_selection_timeout = Some(CONNECT_TIMEOUT);
            if options.app_name.is_none() {
                options.app_name = Some(APP_NAME.to_string());
            }

            let client =
                Client::with_options(options).map_err(|e| StoreError::connection(e.to_string()))?;

            // The client connects lazily; force a round trip so bad URLs fail here.
            client
                .database(DATABASE_NAME)
                .run_command(doc! { "ping": 1 }, None)
                .await
                .map_err(|e| StoreError::connection(e.to_string()))?;

            Ok(client)
        })
        .await
        .inspect_err(|e| tracing::error!(error = %e, "mongodb connection failed"))?;

        tracing::info!(database = DATABASE_NAME, "connected to mongodb");
        Ok(Self::from_client(client))
    }

    /// Wrap an already-connected client.
    pub fn from_client(client: Client) -> Self {
        let db = client.database(DATABASE_NAME);
        Self {
            posts: db.collection(POSTS_COLLECTION),
            counters: db.collection(COUNTERS_COLLECTION),
            client,
        }
    }

    /// Allocate the next integer post id.
    async fn next_id(&self) -> Result<i64, StoreError> {
        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();

        let counter = self
            .counters
            .find_one_and_update(
                doc! { "_id": POSTS_COUNTER },
                doc! { "$inc": { "seq": 1_i64 } },
                options,
            )
            .await
            .map_err(|e| map_mongo_error("next_id", e))?
            .ok_or_else(|| StoreError::backend("post id counter missing after upsert"))?;

        counter
            .get_i64("seq")
            .map_err(|e| StoreError::backend(format!("malformed post id counter: {e}")))
    }
}

#[async_trait::async_trait]
impl PostStore for MongoPostStore {
    #[instrument(skip(self), err)]
    async fn list(&self) -> Result<Vec<Post>, StoreError> {
        let posts = bounded("list", async {
            let options = FindOptions::builder().sort(doc! { "id": 1 }).build();
            let mut cursor = self
                .posts
                .find(doc! {}, options)
                .await
                .map_err(|e| map_mongo_error("list", e))?;

            let mut posts = Vec::new();
            while cursor
                .advance()
                .await
                .map_err(|e| map_mongo_error("list", e))?
            {
                let document = cursor
                    .deserialize_current()
                    .map_err(|e| map_mongo_error("list", e))?;
                posts.push(Post::from(document));
            }
            Ok(posts)
        })
        .await?;

        if posts.is_empty() {
            return Err(StoreError::NotFound);
        }
        Ok(posts)
    }

    #[instrument(skip(self), fields(post_id = %id), err)]
    async fn get_by_id(&self, id: PostId) -> Result<Post, StoreError> {
        bounded("get_by_id", async {
            self.posts
                .find_one(doc! { "id": id.get() }, None)
                .await
                .map_err(|e| map_mongo_error("get_by_id", e))
        })
        .await?
        .map(Post::from)
        .ok_or(StoreError::NotFound)
    }

    #[instrument(skip(self, draft), err)]
    async fn create(&self, draft: NewPost) -> Result<Post, StoreError> {
        bounded("create", async move {
            let id = self.next_id().await?;
            // Round through bson so the returned timestamps carry the stored
            // (millisecond) precision.
            let now = bson::DateTime::now().to_chrono();
            let document = PostDocument {
                id,
                title: draft.title,
                body: draft.body,
                created_at: now,
                updated_at: now,
            };

            self.posts
                .insert_one(&document, None)
                .await
                .map_err(|e| map_mongo_error("create", e))?;

            Ok(Post::from(document))
        })
        .await
    }

    #[instrument(skip(self, draft), fields(post_id = %id), err)]
    async fn update(&self, id: PostId, draft: NewPost) -> Result<Post, StoreError> {
        bounded("update", async move {
            let options = FindOneAndUpdateOptions::builder()
                .return_document(ReturnDocument::After)
                .build();
            let changes = doc! {
                "$set": {
                    "title": draft.title,
                    "body": draft.body,
                    "updated_at": bson::DateTime::now(),
                }
            };

            self.posts
                .find_one_and_update(doc! { "id": id.get() }, changes, options)
                .await
                .map_err(|e| map_mongo_error("update", e))
        })
        .await?
        .map(Post::from)
        .ok_or(StoreError::NotFound)
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.client.clone().shutdown().await;
        tracing::info!("mongodb client shut down");
        Ok(())
    }
}

/// Map driver errors onto the shared storage vocabulary.
fn map_mongo_error(operation: &str, err: mongodb::error::Error) -> StoreError {
    match err.kind.as_ref() {
        ErrorKind::ServerSelection { .. }
        | ErrorKind::Io(_)
        | ErrorKind::DnsResolve { .. }
        | ErrorKind::ConnectionPoolCleared { .. } => {
            StoreError::connection(format!("connection error in {operation}: {err}"))
        }
        _ => StoreError::backend(format!("mongodb error in {operation}: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_maps_onto_post() {
        let now = bson::DateTime::now().to_chrono();
        let post = Post::from(PostDocument {
            id: 3,
            title: "t".to_string(),
            body: "b".to_string(),
            created_at: now,
            updated_at: now,
        });

        assert_eq!(post.id, PostId::new(3));
        assert_eq!(post.created_at, now);
    }

    #[test]
    fn document_round_trips_through_bson() {
        let now = bson::DateTime::now().to_chrono();
        let original = PostDocument {
            id: 5,
            title: "title".to_string(),
            body: "body".to_string(),
            created_at: now,
            updated_at: now,
        };

        let raw = bson::to_document(&original).unwrap();
        assert!(matches!(raw.get("created_at"), Some(bson::Bson::DateTime(_))));
        assert_eq!(raw.get_i64("id").unwrap(), 5);

        let back: PostDocument = bson::from_document(raw).unwrap();
        assert_eq!(back.created_at, now);
    }

    #[test]
    fn io_errors_map_to_connection_failure() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = map_mongo_error("list", mongodb::error::Error::from(io));

        let StoreError::ConnectionFailure(msg) = err else {
            panic!("expected connection failure");
        };
        assert!(msg.contains("list"));
        assert!(msg.contains("refused"));
    }

    #[test]
    fn decode_errors_are_opaque_backend_errors() {
        let decode = bson::from_document::<PostDocument>(doc! { "id": "not a number" })
            .unwrap_err();
        let err = map_mongo_error("get_by_id", mongodb::error::Error::from(decode));

        let StoreError::Backend(msg) = err else {
            panic!("expected backend error");
        };
        assert!(msg.contains("get_by_id"));
    }

    /// Requires a live server:
    /// `MONGODB_URL=mongodb://... cargo test -p blogapi-infra -- --ignored`
    #[tokio::test]
    #[ignore]
    async fn round_trip_against_live_mongodb() {
        let url = std::env::var("MONGODB_URL").expect("MONGODB_URL not set");
        let store = MongoPostStore::connect(&url).await.unwrap();

        let created = store.create(NewPost::new("mongo title", "mongo body")).await.unwrap();
        assert_eq!(store.get_by_id(created.id).await.unwrap(), created);

        let updated = store
            .update(created.id, NewPost::new("mongo title 2", "mongo body 2"))
            .await
            .unwrap();
        assert_eq!(updated.title, "mongo title 2");
        assert_eq!(updated.created_at, created.created_at);

        assert!(store.list().await.unwrap().iter().any(|p| p.id == created.id));
        assert_eq!(
            store.get_by_id(PostId::new(i64::MAX)).await,
            Err(StoreError::NotFound)
        );

        store.close().await.unwrap();
    }
}
