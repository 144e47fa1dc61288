//! Post storage boundary.
//!
//! [`PostStore`] is the contract; `postgres`, `mongo` and `in_memory` are the
//! drivers. [`connect`] picks one from configuration at startup.

pub mod in_memory;
pub mod mongo;
pub mod postgres;
pub mod r#trait;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

pub use in_memory::InMemoryPostStore;
pub use mongo::MongoPostStore;
pub use postgres::PostgresPostStore;
pub use r#trait::{PostStore, StoreError};

use crate::config::DatabaseConfig;

/// Upper bound for establishing a database connection.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Upper bound for a single storage operation.
pub const OPERATION_TIMEOUT: Duration = Duration::from_secs(5);

/// Connect the driver named by `config`.
///
/// Connection failures are returned as `StoreError::ConnectionFailure`; the
/// caller treats them as fatal.
pub async fn connect(config: &DatabaseConfig) -> Result<Arc<dyn PostStore>, StoreError> {
    let store: Arc<dyn PostStore> = match config {
        DatabaseConfig::Postgres { url } => Arc::new(PostgresPostStore::connect(url).await?),
        DatabaseConfig::Mongo { url } => Arc::new(MongoPostStore::connect(url).await?),
        DatabaseConfig::Memory => {
            tracing::warn!("using in-memory post store; data is lost on restart");
            Arc::new(InMemoryPostStore::new())
        }
    };
    Ok(store)
}

/// Run `fut` under [`OPERATION_TIMEOUT`].
pub(crate) async fn bounded<T, F>(operation: &'static str, fut: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    bounded_by(OPERATION_TIMEOUT, operation, fut).await
}

pub(crate) async fn bounded_by<T, F>(
    limit: Duration,
    operation: &'static str,
    fut: F,
) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(
                operation,
                timeout_ms = limit.as_millis() as u64,
                "storage operation timed out"
            );
            Err(StoreError::Timeout { operation })
        }
    }
}
