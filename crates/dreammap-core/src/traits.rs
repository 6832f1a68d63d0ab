use crate::{CompletedDreamRecord, StoreError};
use async_trait::async_trait;
use uuid::Uuid;

/// Durable storage for completed analyses.
///
/// A record's motifs and next steps are owned by the record, so deleting
/// the record removes them too.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    async fn save(&self, record: &CompletedDreamRecord) -> Result<(), StoreError>;

    /// All stored records, newest first.
    async fn list_recent(&self) -> Result<Vec<CompletedDreamRecord>, StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<CompletedDreamRecord>, StoreError>;

    /// Returns `false` when no record had that id.
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;

    fn backend_name(&self) -> &str;
}
