use std::future::Future;

use serde_json::Value;
use sqlx::PgPool;
use sqlx::postgres::{PgListener, PgPoolOptions};
use tokio::sync::broadcast;

use super::{BatchOp, CHANGE_BUFFER, Change, Document, DocumentStore, WriteMode};
use crate::error::GuildError;

/// Channel the `documents` trigger notifies on (see `sql/schema.sql`).
pub const CHANGE_CHANNEL: &str = "document_changes";

const SELECT_ONE: &str = "SELECT body FROM documents WHERE collection = $1 AND id = $2";
const SELECT_ALL: &str = "SELECT id, body FROM documents WHERE collection = $1 ORDER BY id";
const UPSERT_REPLACE: &str = "INSERT INTO documents (collection, id, body) VALUES ($1, $2, $3) \
     ON CONFLICT (collection, id) DO UPDATE SET body = EXCLUDED.body, updated_at = now()";
const UPSERT_MERGE: &str = "INSERT INTO documents (collection, id, body) VALUES ($1, $2, $3) \
     ON CONFLICT (collection, id) DO UPDATE SET body = documents.body || EXCLUDED.body, updated_at = now()";
const UPDATE_MERGE: &str = "UPDATE documents SET body = body || $3, updated_at = now() \
     WHERE collection = $1 AND id = $2";
const DELETE_ONE: &str = "DELETE FROM documents WHERE collection = $1 AND id = $2";

/// Documents stored as JSONB rows. Changes arrive through `LISTEN/NOTIFY` and
/// are fanned out to subscribers.
///
/// The forwarding task owns the only sender, so subscriptions end once the
/// listener connection is lost.
pub struct PgStore {
    pool: PgPool,
    feed: broadcast::Receiver<Change>,
}

impl PgStore {
    /// Connect and start forwarding change notifications.
    pub async fn connect(database_url: &str) -> Result<Self, GuildError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(|e| GuildError::Configuration(format!("cannot reach database: {e}")))?;
        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: PgPool) -> Result<Self, GuildError> {
        let (changes, feed) = broadcast::channel(CHANGE_BUFFER);
        let mut listener = PgListener::connect_with(&pool).await?;
        listener.listen(CHANGE_CHANNEL).await?;
        tokio::spawn(forward_notifications(listener, changes));
        Ok(Self { pool, feed })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Where raw change payloads come from.
trait NotificationSource: Send {
    fn next_payload(&mut self) -> impl Future<Output = Result<String, GuildError>> + Send;
}

impl NotificationSource for PgListener {
    async fn next_payload(&mut self) -> Result<String, GuildError> {
        Ok(self.recv().await?.payload().to_string())
    }
}

async fn forward_notifications(mut source: impl NotificationSource, changes: broadcast::Sender<Change>) {
    loop {
        match source.next_payload().await {
            Ok(payload) => match serde_json::from_str::<Change>(&payload) {
                Ok(change) => {
                    let _ = changes.send(change);
                }
                Err(e) => tracing::warn!(error = %e, "ignoring malformed change notification"),
            },
            Err(e) => {
                tracing::warn!(error = %e, "change listener stopped");
                return;
            }
        }
    }
}

impl DocumentStore for PgStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, GuildError> {
        let body = sqlx::query_scalar::<_, Value>(SELECT_ONE)
            .bind(collection)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(body)
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>, GuildError> {
        let rows = sqlx::query_as::<_, (String, Value)>(SELECT_ALL)
            .bind(collection)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(id, body)| Document { id, body })
            .collect())
    }

    async fn put(
        &self,
        collection: &str,
        id: &str,
        body: Value,
        mode: WriteMode,
    ) -> Result<(), GuildError> {
        let statement = match mode {
            WriteMode::Replace => UPSERT_REPLACE,
            WriteMode::Merge => UPSERT_MERGE,
            WriteMode::Update => UPDATE_MERGE,
        };
        let result = sqlx::query(statement)
            .bind(collection)
            .bind(id)
            .bind(body)
            .execute(&self.pool)
            .await?;
        if mode == WriteMode::Update && result.rows_affected() == 0 {
            return Err(GuildError::not_found("document", format!("{collection}/{id}")));
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), GuildError> {
        sqlx::query(DELETE_ONE)
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn batch(&self, ops: Vec<BatchOp>) -> Result<(), GuildError> {
        let mut tx = self.pool.begin().await?;
        for op in ops {
            match op {
                BatchOp::Put {
                    collection,
                    id,
                    body,
                } => {
                    sqlx::query(UPSERT_REPLACE)
                        .bind(collection)
                        .bind(id)
                        .bind(body)
                        .execute(&mut *tx)
                        .await?;
                }
                BatchOp::Delete { collection, id } => {
                    sqlx::query(DELETE_ONE)
                        .bind(collection)
                        .bind(id)
                        .execute(&mut *tx)
                        .await?;
                }
            }
        }
        tx.commit().await?;
        Ok(())
    }

    fn changes(&self) -> broadcast::Receiver<Change> {
        self.feed.resubscribe()
    }
}
