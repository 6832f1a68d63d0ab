use super::newest_first;
use async_trait::async_trait;
use dreammap_core::{CompletedDreamRecord, PersistenceGateway, StoreError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    dreams: Vec<CompletedDreamRecord>,
}

/// Store backed by a single JSON document.
///
/// Every mutation rewrites the whole file through a temp file and a rename,
/// so a crash mid-write leaves the previous contents intact. A failed write
/// leaves the in-memory view unchanged.
pub struct JsonFileDreamStore {
    path: PathBuf,
    records: Mutex<Vec<CompletedDreamRecord>>,
}

impl JsonFileDreamStore {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let records = match fs::read(&path).await {
            Ok(bytes) => {
                let file: StoreFile = serde_json::from_slice(&bytes)?;
                if file.version != FORMAT_VERSION {
                    return Err(StoreError::Unavailable(format!(
                        "unsupported store format version {} in {}",
                        file.version,
                        path.display()
                    )));
                }
                file.dreams
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        info!(
            path = %path.display(),
            dreams = records.len(),
            "Opened dream store"
        );

        Ok(Self {
            path,
            records: Mutex::new(records),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn write_all(&self, records: &[CompletedDreamRecord]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let body = serde_json::to_vec_pretty(&StoreFile {
            version: FORMAT_VERSION,
            dreams: records.to_vec(),
        })?;

        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, body).await?;
        if let Err(e) = fs::rename(&temp_path, &self.path).await {
            if let Err(cleanup) = fs::remove_file(&temp_path).await {
                warn!(path = %temp_path.display(), error = %cleanup, "Stale temp file left behind");
            }
            return Err(e.into());
        }

        debug!(path = %self.path.display(), dreams = records.len(), "Dream store written");
        Ok(())
    }
}

#[async_trait]
impl PersistenceGateway for JsonFileDreamStore {
    async fn save(&self, record: &CompletedDreamRecord) -> Result<(), StoreError> {
        let mut records = self.records.lock().await;
        let mut next = records.clone();
        match next.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record.clone(),
            None => next.push(record.clone()),
        }

        self.write_all(&next).await?;
        *records = next;
        Ok(())
    }

    async fn list_recent(&self) -> Result<Vec<CompletedDreamRecord>, StoreError> {
        Ok(newest_first(&self.records.lock().await))
    }

    async fn get(&self, id: Uuid) -> Result<Option<CompletedDreamRecord>, StoreError> {
        Ok(self
            .records
            .lock()
            .await
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut records = self.records.lock().await;
        if !records.iter().any(|r| r.id == id) {
            return Ok(false);
        }

        let next: Vec<CompletedDreamRecord> =
            records.iter().filter(|r| r.id != id).cloned().collect();
        self.write_all(&next).await?;
        *records = next;
        Ok(true)
    }

    fn backend_name(&self) -> &str {
        "json-file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dreammap_core::{Motif, Sentiment, ValidatedAnalysis};
    use tempfile::TempDir;

    fn record(title: &str) -> CompletedDreamRecord {
        CompletedDreamRecord::new(
            title,
            "I was flying over a quiet town",
            ValidatedAnalysis {
                summary: "Flight".into(),
                motifs: vec![Motif::new("flight", "freedom")],
                personal_interpretation: "You want space".into(),
                what_to_do_next: vec!["Take a walk".into()],
                sentiment: Some(Sentiment::Joyful),
            },
            "Waxing Gibbous",
        )
    }

    #[tokio::test]
    async fn test_records_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dreams").join("store.json");

        let saved = record("Flying");
        {
            let store = JsonFileDreamStore::open(&path).await.unwrap();
            assert!(store.list_recent().await.unwrap().is_empty());
            store.save(&saved).await.unwrap();
        }

        let reopened = JsonFileDreamStore::open(&path).await.unwrap();
        let records = reopened.list_recent().await.unwrap();
        assert_eq!(records, vec![saved]);
    }

    #[tokio::test]
    async fn test_delete_is_persisted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");

        let store = JsonFileDreamStore::open(&path).await.unwrap();
        let a = record("A");
        let b = record("B");
        store.save(&a).await.unwrap();
        store.save(&b).await.unwrap();
        assert!(store.delete(a.id).await.unwrap());
        assert!(!store.delete(a.id).await.unwrap());

        let reopened = JsonFileDreamStore::open(&path).await.unwrap();
        assert!(reopened.get(a.id).await.unwrap().is_none());
        assert!(reopened.get(b.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, b"not json").unwrap();

        assert!(matches!(
            JsonFileDreamStore::open(&path).await,
            Err(StoreError::Serialization(_))
        ));
    }

    #[tokio::test]
    async fn test_failed_write_keeps_memory_view() {
        let dir = TempDir::new().unwrap();
        // The store path is a directory, so the final rename fails.
        let path = dir.path().join("occupied");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("child"), b"x").unwrap();

        let store = JsonFileDreamStore {
            path: path.clone(),
            records: Mutex::new(Vec::new()),
        };
        assert!(store.save(&record("lost")).await.is_err());
        assert!(store.list_recent().await.unwrap().is_empty());
        assert!(!dir.path().join("occupied.json.tmp").exists());
    }
}
