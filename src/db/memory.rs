use std::collections::BTreeMap;

use serde_json::Value;
use tokio::sync::{RwLock, broadcast};

use super::{BatchOp, CHANGE_BUFFER, Change, ChangeKind, Document, DocumentStore, WriteMode, merge_top_level};
use crate::error::GuildError;

type Collections = BTreeMap<String, BTreeMap<String, Value>>;

/// Process-local store. Used by tests and as a scratch backend for the CLI.
pub struct MemoryStore {
    collections: RwLock<Collections>,
    changes: broadcast::Sender<Change>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_BUFFER);
        Self {
            collections: RwLock::new(BTreeMap::new()),
            changes,
        }
    }

    fn notify(&self, collection: &str, id: &str, kind: ChangeKind) {
        // No receivers is fine.
        let _ = self.changes.send(Change {
            collection: collection.to_string(),
            id: id.to_string(),
            kind,
        });
    }
}

fn write(
    collections: &mut Collections,
    collection: &str,
    id: &str,
    body: Value,
    mode: WriteMode,
) -> Result<(), GuildError> {
    let existing = collections.get_mut(collection).and_then(|docs| docs.get_mut(id));
    match (existing, mode) {
        (Some(existing), WriteMode::Merge | WriteMode::Update) => merge_top_level(existing, body),
        (None, WriteMode::Update) => {
            return Err(GuildError::not_found("document", format!("{collection}/{id}")));
        }
        _ => {
            collections
                .entry(collection.to_string())
                .or_default()
                .insert(id.to_string(), body);
        }
    }
    Ok(())
}

fn remove(collections: &mut Collections, collection: &str, id: &str) {
    if let Some(docs) = collections.get_mut(collection) {
        docs.remove(id);
    }
}

impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, GuildError> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection).and_then(|docs| docs.get(id)).cloned())
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>, GuildError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, body)| Document {
                        id: id.clone(),
                        body: body.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn put(
        &self,
        collection: &str,
        id: &str,
        body: Value,
        mode: WriteMode,
    ) -> Result<(), GuildError> {
        write(&mut *self.collections.write().await, collection, id, body, mode)?;
        self.notify(collection, id, ChangeKind::Upsert);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), GuildError> {
        remove(&mut *self.collections.write().await, collection, id);
        self.notify(collection, id, ChangeKind::Delete);
        Ok(())
    }

    async fn batch(&self, ops: Vec<BatchOp>) -> Result<(), GuildError> {
        {
            let mut collections = self.collections.write().await;
            for op in &ops {
                match op {
                    BatchOp::Put {
                        collection,
                        id,
                        body,
                    } => write(&mut collections, collection, id, body.clone(), WriteMode::Replace)?,
                    BatchOp::Delete { collection, id } => remove(&mut collections, collection, id),
                }
            }
        }
        for op in ops {
            match op {
                BatchOp::Put { collection, id, .. } => {
                    self.notify(&collection, &id, ChangeKind::Upsert)
                }
                BatchOp::Delete { collection, id } => {
                    self.notify(&collection, &id, ChangeKind::Delete)
                }
            }
        }
        Ok(())
    }

    fn changes(&self) -> broadcast::Receiver<Change> {
        self.changes.subscribe()
    }
}
