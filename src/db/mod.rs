mod memory;
mod migrate;
mod postgres;

use std::future::Future;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use crate::error::GuildError;

pub use memory::MemoryStore;
pub use migrate::migrate;
pub use postgres::PgStore;

/// Collection names shared with every client of the document database.
pub mod collections {
    pub const USERS: &str = "users";
    pub const MASTER_DATA: &str = "masterData";
    pub const BATTLE_PLANS: &str = "battlePlans";
    pub const TITLE_ASSIGNMENTS: &str = "titleAssignments";

    /// The single document in `masterData` holding the whole catalog.
    pub const MASTER_DATA_DOC: &str = "singleton";

    pub const ALL: &[&str] = &[USERS, MASTER_DATA, BATTLE_PLANS, TITLE_ASSIGNMENTS];
}

/// Capacity of the change fan-out channel.
pub const CHANGE_BUFFER: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Overwrite the whole document.
    Replace,
    /// Overwrite only the top-level keys present in the new value.
    Merge,
    /// Like `Merge`, but the document must already exist; `NotFound` otherwise.
    Update,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub body: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Upsert,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    pub collection: String,
    pub id: String,
    pub kind: ChangeKind,
}

/// One write in an atomic batch.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOp {
    Put {
        collection: String,
        id: String,
        body: Value,
    },
    Delete {
        collection: String,
        id: String,
    },
}

/// Keyed JSON documents grouped into collections, with push notifications
/// for every change. Writes are last-write-wins.
pub trait DocumentStore: Send + Sync {
    fn get(
        &self,
        collection: &str,
        id: &str,
    ) -> impl Future<Output = Result<Option<Value>, GuildError>> + Send;

    /// Every document in `collection`, ordered by id.
    fn list(&self, collection: &str)
    -> impl Future<Output = Result<Vec<Document>, GuildError>> + Send;

    fn put(
        &self,
        collection: &str,
        id: &str,
        body: Value,
        mode: WriteMode,
    ) -> impl Future<Output = Result<(), GuildError>> + Send;

    /// Deleting a missing document succeeds.
    fn delete(&self, collection: &str, id: &str)
    -> impl Future<Output = Result<(), GuildError>> + Send;

    /// Apply every op or none of them.
    fn batch(&self, ops: Vec<BatchOp>) -> impl Future<Output = Result<(), GuildError>> + Send;

    /// Raw change feed for every collection.
    fn changes(&self) -> broadcast::Receiver<Change>;

    fn subscribe_collection(&self, collection: &str) -> Subscription {
        Subscription {
            receiver: self.changes(),
            collection: collection.to_string(),
            document: None,
        }
    }

    fn subscribe_document(&self, collection: &str, id: &str) -> Subscription {
        Subscription {
            receiver: self.changes(),
            collection: collection.to_string(),
            document: Some(id.to_string()),
        }
    }
}

/// A filtered view of a store's change feed.
pub struct Subscription {
    receiver: broadcast::Receiver<Change>,
    collection: String,
    document: Option<String>,
}

impl Subscription {
    fn matches(&self, change: &Change) -> bool {
        change.collection == self.collection
            && self.document.as_ref().is_none_or(|id| *id == change.id)
    }

    /// Wait for the next matching change. `None` once the store is gone.
    pub async fn next(&mut self) -> Option<Change> {
        loop {
            match self.receiver.recv().await {
                Ok(change) if self.matches(&change) => return Some(change),
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(collection = %self.collection, skipped, "subscriber fell behind");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

/// Shallow merge: keys of `patch` overwrite keys of `base`. Non-object values replace.
pub(crate) fn merge_top_level(base: &mut Value, patch: Value) {
    match (base, patch) {
        (Value::Object(base), Value::Object(patch)) => base.extend(patch),
        (base, patch) => *base = patch,
    }
}
