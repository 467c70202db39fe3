//! In-memory storage engine with best-effort snapshot persistence.
//!
//! The collection lives in a `BTreeMap` behind an `RwLock`. Every mutation sets a dirty flag
//! while still holding the write lock. A background task started by
//! [`InMemoryStorage::initialize`] wakes on a fixed interval and, when the flag is set, writes
//! the whole collection to a JSON snapshot file.
//!
//! ## Persistence rules
//!
//! - The snapshot copy is taken under the read lock; the lock is released before any file I/O.
//! - The dirty flag is cleared when the copy is taken and restored if the write fails, so a
//!   failed write is retried on the next tick and a mutation racing the write is never lost.
//! - Snapshot load and write failures are logged and swallowed. CRUD callers never see them.
//! - [`InMemoryStorage::close`] stops the task and performs one last write if dirty.

use crate::config::CoreConfig;
use crate::storage::{Entity, StorageEngine};
use crate::{ReportError, ReportResult};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Keyed in-memory collection with periodic whole-collection snapshots.
pub struct InMemoryStorage<T: Entity> {
    shared: Arc<Shared<T>>,
    persist_interval: Duration,
    persister: Mutex<Option<Persister>>,
}

struct Shared<T> {
    items: RwLock<BTreeMap<String, T>>,
    dirty: AtomicBool,
    snapshot_path: PathBuf,
    persistence_enabled: bool,
}

struct Persister {
    stop_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl<T: Entity> InMemoryStorage<T> {
    /// Creates an empty store whose snapshot lives at `<data_dir>/<filename>`.
    ///
    /// Nothing is read from disk until [`initialize`](Self::initialize) is called.
    pub fn new(cfg: &CoreConfig, filename: impl AsRef<Path>) -> Self {
        Self {
            shared: Arc::new(Shared {
                items: RwLock::new(BTreeMap::new()),
                dirty: AtomicBool::new(false),
                snapshot_path: cfg.data_dir().join(filename),
                persistence_enabled: cfg.persistence_enabled(),
            }),
            persist_interval: cfg.persist_interval(),
            persister: Mutex::new(None),
        }
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.shared.snapshot_path
    }

    /// True when the collection changed since the last successful snapshot.
    pub fn is_dirty(&self) -> bool {
        self.shared.dirty.load(Ordering::Acquire)
    }

    /// Loads the snapshot file, if any, and starts the persistence task.
    ///
    /// A missing file leaves the store empty. Any other read or parse failure is logged and
    /// also leaves the store empty.
    pub async fn initialize(&self) {
        match load_snapshot::<T>(&self.shared.snapshot_path).await {
            Ok(Some(items)) => {
                let count = items.len();
                {
                    let mut map = self.shared.write();
                    map.clear();
                    map.extend(items.into_iter().map(|item| (item.id().to_string(), item)));
                }
                tracing::info!(
                    "Loaded {} items from {}",
                    count,
                    self.shared.snapshot_path.display()
                );
            }
            Ok(None) => {
                tracing::debug!(
                    "No snapshot at {}, starting empty",
                    self.shared.snapshot_path.display()
                );
            }
            Err(e) => {
                tracing::error!(
                    "Error loading data from {}: {}",
                    self.shared.snapshot_path.display(),
                    e
                );
            }
        }

        if self.shared.persistence_enabled {
            self.start_persister();
        }
    }

    fn start_persister(&self) {
        let mut slot = self.persister.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return;
        }

        let shared = Arc::clone(&self.shared);
        let period = self.persist_interval;
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        shared.persist().await;
                    }
                }
            }
        });

        *slot = Some(Persister { stop_tx, handle });
    }

    /// Writes a snapshot now if the collection is dirty. Returns whether a file was written.
    pub async fn persist(&self) -> bool {
        self.shared.persist().await
    }

    /// Stops the persistence task and performs a final snapshot if dirty.
    pub async fn close(&self) {
        let persister = self
            .persister
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(Persister { stop_tx, handle }) = persister {
            let _ = stop_tx.send(());
            if let Err(e) = handle.await {
                tracing::warn!("persistence task ended abnormally: {}", e);
            }
        }

        self.shared.persist().await;
    }
}

impl<T: Entity> Drop for InMemoryStorage<T> {
    fn drop(&mut self) {
        let persister = self
            .persister
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(persister) = persister {
            persister.handle.abort();
        }
    }
}

impl<T: Entity> Shared<T> {
    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, T>> {
        self.items.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, T>> {
        self.items.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::Release);
    }

    async fn persist(&self) -> bool {
        if !self.persistence_enabled {
            return false;
        }

        let snapshot: Vec<T> = {
            let items = self.read();
            if !self.dirty.swap(false, Ordering::AcqRel) {
                return false;
            }
            items.values().cloned().collect()
        };

        match write_snapshot(&self.snapshot_path, &snapshot).await {
            Ok(()) => {
                tracing::info!(
                    "Persisted {} items to {}",
                    snapshot.len(),
                    self.snapshot_path.display()
                );
                true
            }
            Err(e) => {
                self.mark_dirty();
                tracing::error!(
                    "Error persisting data to {}: {}",
                    self.snapshot_path.display(),
                    e
                );
                false
            }
        }
    }
}

impl<T: Entity> StorageEngine<T> for InMemoryStorage<T> {
    fn get_all(&self) -> Vec<T> {
        self.shared.read().values().cloned().collect()
    }

    fn get_by_id(&self, id: &str) -> Option<T> {
        self.shared.read().get(id).cloned()
    }

    fn create(&self, item: T) -> T {
        let mut items = self.shared.write();
        items.insert(item.id().to_string(), item.clone());
        self.shared.mark_dirty();
        item
    }

    fn update(&self, id: &str, patch: T::Patch) -> Option<T> {
        let mut items = self.shared.write();
        let existing = items.get_mut(id)?;
        existing.merge(patch);
        let merged = existing.clone();
        self.shared.mark_dirty();
        Some(merged)
    }

    fn delete(&self, id: &str) -> bool {
        let mut items = self.shared.write();
        let removed = items.remove(id).is_some();
        if removed {
            self.shared.mark_dirty();
        }
        removed
    }

    fn query(&self, predicate: &dyn Fn(&T) -> bool) -> Vec<T> {
        self.shared
            .read()
            .values()
            .filter(|item| predicate(item))
            .cloned()
            .collect()
    }

    fn count(&self, predicate: Option<&dyn Fn(&T) -> bool>) -> usize {
        let items = self.shared.read();
        match predicate {
            None => items.len(),
            Some(predicate) => items.values().filter(|item| predicate(item)).count(),
        }
    }
}

async fn load_snapshot<T: Entity>(path: &Path) -> ReportResult<Option<Vec<T>>> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(ReportError::FileRead(e)),
    };

    let items = serde_json::from_str(&raw).map_err(ReportError::Deserialization)?;
    Ok(Some(items))
}

async fn write_snapshot<T: Entity>(path: &Path, items: &[T]) -> ReportResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(ReportError::StorageDirCreation)?;
    }

    let json = serde_json::to_vec_pretty(items).map_err(ReportError::Serialization)?;

    // Write beside the target and rename so readers never see a half-written file.
    let staging = path.with_extension("json.tmp");
    tokio::fs::write(&staging, json)
        .await
        .map_err(ReportError::FileWrite)?;
    tokio::fs::rename(&staging, path)
        .await
        .map_err(ReportError::FileWrite)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::REPORTS_FILENAME;
    use crate::report::{Report, ReportPatch};
    use crate::test_support::{sample_report, sample_reports};
    use std::fs;
    use tempfile::TempDir;

    fn test_cfg(data_dir: &Path, persistence_enabled: bool, interval: Duration) -> CoreConfig {
        CoreConfig::new(data_dir.to_path_buf(), persistence_enabled, interval)
            .expect("CoreConfig::new should succeed")
    }

    fn test_store(data_dir: &Path) -> InMemoryStorage<Report> {
        InMemoryStorage::new(
            &test_cfg(data_dir, true, Duration::from_secs(3600)),
            REPORTS_FILENAME,
        )
    }

    fn read_snapshot(path: &Path) -> Vec<Report> {
        let raw = fs::read_to_string(path).expect("snapshot should exist");
        serde_json::from_str(&raw).expect("snapshot should parse")
    }

    #[tokio::test]
    async fn test_initialize_without_snapshot_starts_empty() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = test_store(temp_dir.path());

        store.initialize().await;

        assert_eq!(store.count(None), 0);
        assert!(!store.is_dirty());
        store.close().await;
        assert!(!store.snapshot_path().exists(), "clean store must not write");
    }

    #[tokio::test]
    async fn test_initialize_loads_existing_snapshot() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join(REPORTS_FILENAME);
        fs::write(&path, serde_json::to_string(&sample_reports()).unwrap()).unwrap();

        let store = test_store(temp_dir.path());
        store.initialize().await;

        assert_eq!(store.count(None), 5);
        assert_eq!(
            store.get_by_id("2").map(|r| r.patient_name),
            Some("Jane Doe".to_string())
        );
        assert!(!store.is_dirty(), "loading is not a mutation");
        store.close().await;
    }

    #[tokio::test]
    async fn test_initialize_swallows_corrupt_snapshot() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        fs::write(temp_dir.path().join(REPORTS_FILENAME), "{ not json").unwrap();

        let store = test_store(temp_dir.path());
        store.initialize().await;

        assert_eq!(store.count(None), 0);
        store.close().await;
    }

    #[tokio::test]
    async fn test_crud_contract() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = test_store(temp_dir.path());

        let created = store.create(sample_report("a", "Alice Example", "2025-01-01T00:00:00Z"));
        assert_eq!(store.get_by_id("a"), Some(created.clone()));
        assert!(store.is_dirty());

        // create overwrites by id
        let mut replacement = created.clone();
        replacement.summary = "Replaced summary.".into();
        store.create(replacement);
        assert_eq!(store.count(None), 1);
        assert_eq!(store.get_by_id("a").unwrap().summary, "Replaced summary.");

        assert!(store.update("missing", ReportPatch::default()).is_none());
        let updated = store
            .update(
                "a",
                ReportPatch {
                    report_type: Some("Lab".into()),
                    ..Default::default()
                },
            )
            .expect("update should find the report");
        assert_eq!(updated.report_type, "Lab");
        assert_eq!(updated.patient_name, "Alice Example");

        assert!(store.delete("a"));
        assert!(!store.delete("a"));
        assert!(store.get_by_id("a").is_none());
    }

    #[tokio::test]
    async fn test_delete_of_missing_id_does_not_dirty() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = test_store(temp_dir.path());

        assert!(!store.delete("ghost"));
        assert!(!store.is_dirty());
    }

    #[tokio::test]
    async fn test_returned_values_are_copies() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = test_store(temp_dir.path());
        store.create(sample_report("a", "Alice Example", "2025-01-01T00:00:00Z"));

        let mut copy = store.get_by_id("a").unwrap();
        copy.patient_name = "Mallory".into();
        let mut all = store.get_all();
        all[0].summary = "tampered".into();

        let stored = store.get_by_id("a").unwrap();
        assert_eq!(stored.patient_name, "Alice Example");
        assert_ne!(stored.summary, "tampered");
    }

    #[tokio::test]
    async fn test_query_and_count_agree() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = test_store(temp_dir.path());
        for report in sample_reports() {
            store.create(report);
        }

        let is_john = |r: &Report| r.patient_name == "John Smith";
        assert_eq!(store.query(&is_john).len(), 2);
        assert_eq!(store.count(Some(&is_john)), 2);
        assert_eq!(store.count(None), 5);
    }

    #[tokio::test]
    async fn test_close_writes_final_snapshot() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = test_store(temp_dir.path());
        store.initialize().await;

        for report in sample_reports() {
            store.create(report);
        }
        store.close().await;

        assert!(!store.is_dirty());
        let persisted = read_snapshot(store.snapshot_path());
        assert_eq!(persisted.len(), 5);

        let reopened = test_store(temp_dir.path());
        reopened.initialize().await;
        assert_eq!(reopened.get_all(), store.get_all());
        reopened.close().await;
    }

    #[tokio::test]
    async fn test_periodic_task_persists_dirty_collection() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = InMemoryStorage::<Report>::new(
            &test_cfg(temp_dir.path(), true, Duration::from_millis(20)),
            REPORTS_FILENAME,
        );
        store.initialize().await;

        store.create(sample_report("a", "Alice Example", "2025-01-01T00:00:00Z"));

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while store.is_dirty() && std::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert!(!store.is_dirty(), "ticker should have flushed the store");
        assert_eq!(read_snapshot(store.snapshot_path()).len(), 1);
        store.close().await;
    }

    #[tokio::test]
    async fn test_failed_write_keeps_store_dirty() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        // A regular file where the data directory should be makes every write fail.
        let blocked = temp_dir.path().join("blocked");
        fs::write(&blocked, "").unwrap();

        let store = test_store(&blocked);
        store.create(sample_report("a", "Alice Example", "2025-01-01T00:00:00Z"));

        assert!(!store.persist().await);
        assert!(store.is_dirty());
        assert_eq!(store.count(None), 1, "in-memory state is unaffected");
    }

    #[tokio::test]
    async fn test_persistence_disabled_never_writes() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = InMemoryStorage::<Report>::new(
            &test_cfg(temp_dir.path(), false, Duration::from_millis(10)),
            REPORTS_FILENAME,
        );
        store.initialize().await;
        store.create(sample_report("a", "Alice Example", "2025-01-01T00:00:00Z"));

        store.close().await;

        assert!(!store.snapshot_path().exists());
    }
}
