//! Connection management. Grounded on the teacher's `TursoClient`: the
//! same libSQL driver serves an in-process file, an in-memory database,
//! or a remote Turso/libSQL endpoint, so tests and production share one
//! code path.

use crate::errors::StoreError;
use crate::schema::apply_schema;
use libsql::{Builder, Connection, Database};
use std::sync::Arc;
use tracing::{info, instrument};

#[derive(Clone)]
pub struct Store {
    database: Arc<Database>,
    /// For `:memory:` databases, libSQL drops the schema once every
    /// connection handle is closed; holding one open for the process
    /// lifetime keeps the in-memory database alive.
    memory_anchor: Option<Arc<Connection>>,
}

impl Store {
    #[instrument(skip(auth_token))]
    pub async fn connect(url: &str, auth_token: Option<String>) -> Result<Self, StoreError> {
        if url.is_empty() {
            return Err(StoreError::Connection("store url must not be empty".into()));
        }

        let is_remote = url.starts_with("libsql://") || url.starts_with("https://");
        let is_memory = url == ":memory:" || url.contains("mode=memory");

        let database = if is_remote {
            let token = auth_token
                .ok_or_else(|| StoreError::Connection("remote store requires an auth token".into()))?;
            Builder::new_remote(url.to_string(), token)
                .build()
                .await
                .map_err(|e| StoreError::Connection(e.to_string()))?
        } else {
            Builder::new_local(url)
                .build()
                .await
                .map_err(|e| StoreError::Connection(e.to_string()))?
        };

        let database = Arc::new(database);

        let memory_anchor = if is_memory {
            let anchor = database.connect().map_err(|e| StoreError::Connection(e.to_string()))?;
            apply_schema(&anchor).await?;
            info!("store connected (in-memory, schema anchored)");
            Some(Arc::new(anchor))
        } else {
            let bootstrap = database.connect().map_err(|e| StoreError::Connection(e.to_string()))?;
            apply_schema(&bootstrap).await?;
            info!(url, "store connected");
            None
        };

        Ok(Self { database, memory_anchor })
    }

    pub fn connection(&self) -> Result<Connection, StoreError> {
        self.database.connect().map_err(|e| StoreError::Connection(e.to_string()))
    }
}
