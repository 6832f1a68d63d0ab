use super::newest_first;
use async_trait::async_trait;
use dreammap_core::{CompletedDreamRecord, PersistenceGateway, StoreError};
use parking_lot::RwLock;
use uuid::Uuid;

/// Process-local store. Contents are lost on exit.
#[derive(Debug, Default)]
pub struct InMemoryDreamStore {
    records: RwLock<Vec<CompletedDreamRecord>>,
}

impl InMemoryDreamStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl PersistenceGateway for InMemoryDreamStore {
    async fn save(&self, record: &CompletedDreamRecord) -> Result<(), StoreError> {
        let mut records = self.records.write();
        match records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record.clone(),
            None => records.push(record.clone()),
        }
        Ok(())
    }

    async fn list_recent(&self) -> Result<Vec<CompletedDreamRecord>, StoreError> {
        Ok(newest_first(&self.records.read()))
    }

    async fn get(&self, id: Uuid) -> Result<Option<CompletedDreamRecord>, StoreError> {
        Ok(self.records.read().iter().find(|r| r.id == id).cloned())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut records = self.records.write();
        let before = records.len();
        records.retain(|r| r.id != id);
        Ok(records.len() != before)
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}
