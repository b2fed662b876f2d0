//! Result slots holding at most one measurement record each.
//!
//! A slot that already holds a record is trusted indefinitely: the
//! orchestrator returns it instead of measuring again.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, warn};

use crate::error::MeasureError;
use crate::record::MeasurementRecord;

/// Storage backend for measurement records.
///
/// There is no locking between writers; every scenario owns its slot name.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Short name of the backend, for logs.
    fn store_type(&self) -> &'static str;

    /// Human-readable location of a slot.
    fn location(&self, slot: &str) -> String;

    /// Load the record in `slot`, `None` if the slot is empty.
    async fn load(&self, slot: &str) -> Result<Option<MeasurementRecord>, MeasureError>;

    /// Store `record` in `slot`. Readers never see a partially written record.
    async fn save(&self, slot: &str, record: &MeasurementRecord) -> Result<(), MeasureError>;
}

/// One JSON file per slot inside a measurement directory.
pub struct FileResultStore {
    /// Measurement directory
    dir: PathBuf,
}

impl FileResultStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Path of the file backing `slot`.
    pub fn slot_path(&self, slot: &str) -> PathBuf {
        self.dir.join(format!("{slot}.json"))
    }

    fn temp_path(&self, slot: &str) -> PathBuf {
        self.dir.join(format!(".{slot}.json.tmp"))
    }
}

#[async_trait]
impl ResultStore for FileResultStore {
    fn store_type(&self) -> &'static str {
        "file"
    }

    fn location(&self, slot: &str) -> String {
        self.slot_path(slot).display().to_string()
    }

    async fn load(&self, slot: &str) -> Result<Option<MeasurementRecord>, MeasureError> {
        let path = self.slot_path(slot);

        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => {
                warn!(path = %path.display(), "Result path is not a regular file, ignoring it");
                return Ok(None);
            }
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(MeasureError::io(&path, e)),
        }

        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                warn!(path = %path.display(), "Result file is not readable, ignoring it");
                return Ok(None);
            }
            Err(e) => return Err(MeasureError::io(&path, e)),
        };

        let record = serde_json::from_str(&content).map_err(|source| {
            MeasureError::CacheCorruption {
                path: path.display().to_string(),
                source,
            }
        })?;
        Ok(Some(record))
    }

    async fn save(&self, slot: &str, record: &MeasurementRecord) -> Result<(), MeasureError> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| MeasureError::io(&self.dir, e))?;

        let path = self.slot_path(slot);
        let tmp = self.temp_path(slot);
        let content = serde_json::to_string(record)?;

        let written = match fs::write(&tmp, content).await {
            Ok(()) => fs::rename(&tmp, &path)
                .await
                .map_err(|e| MeasureError::io(&path, e)),
            Err(e) => Err(MeasureError::io(&tmp, e)),
        };
        if let Err(e) = written {
            if let Err(cleanup) = fs::remove_file(&tmp).await {
                if cleanup.kind() != ErrorKind::NotFound {
                    warn!(path = %tmp.display(), error = %cleanup, "Failed to remove temporary result file");
                }
            }
            return Err(e);
        }

        debug!(path = %path.display(), "Result file written");
        Ok(())
    }
}

/// Keeps slots in memory as raw JSON text.
#[derive(Default)]
pub struct MemoryResultStore {
    slots: Mutex<HashMap<String, String>>,
}

impl MemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put arbitrary text into a slot, bypassing validation.
    pub fn insert_raw(&self, slot: &str, content: impl Into<String>) {
        self.lock().insert(slot.to_string(), content.into());
    }

    /// Raw text of a slot.
    pub fn raw(&self, slot: &str) -> Option<String> {
        self.lock().get(slot).cloned()
    }

    pub fn contains(&self, slot: &str) -> bool {
        self.lock().contains_key(slot)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A poisoned map still holds complete entries.
        self.slots.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl ResultStore for MemoryResultStore {
    fn store_type(&self) -> &'static str {
        "memory"
    }

    fn location(&self, slot: &str) -> String {
        format!("memory://{slot}")
    }

    async fn load(&self, slot: &str) -> Result<Option<MeasurementRecord>, MeasureError> {
        let Some(content) = self.raw(slot) else {
            return Ok(None);
        };
        let record = serde_json::from_str(&content).map_err(|source| {
            MeasureError::CacheCorruption {
                path: self.location(slot),
                source,
            }
        })?;
        Ok(Some(record))
    }

    async fn save(&self, slot: &str, record: &MeasurementRecord) -> Result<(), MeasureError> {
        let content = serde_json::to_string(record)?;
        self.insert_raw(slot, content);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Alert;
    use serde_json::json;
    use tempfile::TempDir;

    fn sample_record() -> MeasurementRecord {
        MeasurementRecord {
            start: 100.5,
            stop: 460.25,
            result: json!("rook-ceph-mgr-a"),
            metadata: Some(serde_json::Map::from_iter([(
                "status".to_string(),
                json!("success"),
            )])),
            alerts: vec![Alert::new(json!({"labels": {"alertname": "CephMgrIsAbsent"}}))],
        }
    }

    #[tokio::test]
    async fn test_load_missing_slot() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileResultStore::new(temp_dir.path());

        assert!(store.load("measure_stop_ceph_mgr").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileResultStore::new(temp_dir.path());
        let record = sample_record();

        store.save("measure_stop_ceph_mgr", &record).await.unwrap();

        assert!(temp_dir.path().join("measure_stop_ceph_mgr.json").exists());
        assert!(!temp_dir.path().join(".measure_stop_ceph_mgr.json.tmp").exists());

        let loaded = store.load("measure_stop_ceph_mgr").await.unwrap().unwrap();
        assert_eq!(loaded, record);
    }

    #[tokio::test]
    async fn test_save_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileResultStore::new(temp_dir.path().join("measurement_results"));

        store.save("slot", &sample_record()).await.unwrap();

        assert!(temp_dir.path().join("measurement_results/slot.json").exists());
    }

    #[tokio::test]
    async fn test_corrupted_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileResultStore::new(temp_dir.path());
        std::fs::write(store.slot_path("broken"), "{\"start\": 1.0,").unwrap();

        let err = store.load("broken").await.unwrap_err();
        assert!(matches!(err, MeasureError::CacheCorruption { .. }));
    }

    #[tokio::test]
    async fn test_missing_required_key_is_corruption() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileResultStore::new(temp_dir.path());
        std::fs::write(
            store.slot_path("partial"),
            r#"{"start": 1.0, "stop": 2.0, "result": null, "metadata": null}"#,
        )
        .unwrap();

        let err = store.load("partial").await.unwrap_err();
        assert!(matches!(err, MeasureError::CacheCorruption { .. }));
    }

    #[tokio::test]
    async fn test_failed_save_removes_temporary_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileResultStore::new(temp_dir.path());
        let blocked = store.slot_path("blocked");
        std::fs::create_dir(&blocked).unwrap();
        std::fs::write(blocked.join("keep"), "x").unwrap();

        let err = store.save("blocked", &sample_record()).await.unwrap_err();

        assert!(matches!(err, MeasureError::Io { .. }));
        assert!(!temp_dir.path().join(".blocked.json.tmp").exists());
        assert!(blocked.join("keep").exists());
    }

    #[tokio::test]
    async fn test_directory_in_place_of_slot_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileResultStore::new(temp_dir.path());
        std::fs::create_dir(store.slot_path("dir")).unwrap();

        assert!(store.load("dir").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryResultStore::new();
        assert!(store.load("slot").await.unwrap().is_none());

        store.save("slot", &sample_record()).await.unwrap();
        assert!(store.contains("slot"));
        assert_eq!(store.load("slot").await.unwrap().unwrap(), sample_record());

        store.insert_raw("slot", "not json");
        assert!(matches!(
            store.load("slot").await,
            Err(MeasureError::CacheCorruption { .. })
        ));
    }
}
