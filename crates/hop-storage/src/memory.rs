use async_trait::async_trait;
use hop_core::store::{LinkStore, ReadLinkStore, Result};
use hop_core::{LinkId, LinkRecord, NewLink, Owner, StorageError};
use jiff::Timestamp;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Default)]
struct Tables {
    last_id: i64,
    records: HashMap<LinkId, LinkRecord>,
    /// Unique index over short codes and aliases, which share one namespace.
    keys: HashMap<String, LinkId>,
}

impl Tables {
    fn lookup(&self, code_or_alias: &str) -> Option<&LinkRecord> {
        self.keys
            .get(code_or_alias)
            .and_then(|id| self.records.get(id))
    }
}

/// In-memory implementation of the link store.
///
/// All tables sit behind a single lock so that every mutation, together with
/// its index maintenance, is applied atomically. Clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLinkStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryLinkStore {
    /// Creates a new in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored links.
    pub fn len(&self) -> usize {
        self.tables.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ReadLinkStore for InMemoryLinkStore {
    async fn code_exists(&self, code_or_alias: &str) -> Result<bool> {
        Ok(self.tables.read().keys.contains_key(code_or_alias))
    }

    async fn find_active(
        &self,
        code_or_alias: &str,
        now: Timestamp,
    ) -> Result<Option<LinkRecord>> {
        let tables = self.tables.read();
        Ok(tables
            .lookup(code_or_alias)
            .filter(|record| record.is_active_at(now))
            .cloned())
    }

    async fn find_any(&self, code_or_alias: &str) -> Result<Option<LinkRecord>> {
        Ok(self.tables.read().lookup(code_or_alias).cloned())
    }

    async fn find_by_code(&self, short_code: &str) -> Result<Option<LinkRecord>> {
        let tables = self.tables.read();
        Ok(tables
            .lookup(short_code)
            .filter(|record| record.short_code == short_code)
            .cloned())
    }

    async fn search_by_url(&self, original_url: &str, owner: &Owner) -> Result<Vec<LinkRecord>> {
        let tables = self.tables.read();
        let mut found: Vec<LinkRecord> = tables
            .records
            .values()
            .filter(|record| record.original_url == original_url && record.is_owned_by(owner))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(found)
    }
}

#[async_trait]
impl LinkStore for InMemoryLinkStore {
    async fn insert(&self, link: NewLink) -> Result<LinkRecord> {
        let mut tables = self.tables.write();

        let code = link.code.as_str().to_owned();
        if tables.keys.contains_key(&code) {
            return Err(StorageError::Conflict(code));
        }

        tables.last_id += 1;
        let id = LinkId(tables.last_id);
        let record = link.into_record(id, Timestamp::now());

        tables.keys.insert(record.short_code.clone(), id);
        if let Some(alias) = &record.custom_alias {
            tables.keys.insert(alias.clone(), id);
        }
        tables.records.insert(id, record.clone());

        Ok(record)
    }

    async fn record_access(&self, id: LinkId, at: Timestamp) -> Result<bool> {
        let mut tables = self.tables.write();
        let Some(record) = tables.records.get_mut(&id) else {
            return Ok(false);
        };

        record.access_count += 1;
        record.last_accessed = Some(at);
        Ok(true)
    }

    async fn update_url(&self, id: LinkId, original_url: &str) -> Result<Option<LinkRecord>> {
        let mut tables = self.tables.write();
        let Some(record) = tables.records.get_mut(&id) else {
            return Ok(None);
        };

        record.original_url = original_url.to_owned();
        Ok(Some(record.clone()))
    }

    async fn delete(&self, id: LinkId) -> Result<bool> {
        let mut tables = self.tables.write();
        let Some(record) = tables.records.remove(&id) else {
            return Ok(false);
        };

        tables.keys.remove(&record.short_code);
        if let Some(alias) = &record.custom_alias {
            tables.keys.remove(alias);
        }
        Ok(true)
    }
}
