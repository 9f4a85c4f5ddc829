//! Generic file-backed record collection.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use staffdesk_config::CorruptPolicy;

use crate::error::{StoreError, StoreResult};

/// A record with a store-assigned integer identity.
///
/// Ids are allocated exclusively by the store at insertion time; callers
/// never pick their own.
pub trait Record {
    fn id(&self) -> i64;
    fn set_id(&mut self, id: i64);
}

/// A collection of records persisted as one pretty-printed JSON array.
///
/// Every operation is a full load-mutate-save cycle against the backing
/// file; there is no cache between calls. Mutations are serialized through
/// an internal per-store lock so concurrent callers within one process
/// cannot lose each other's writes. Saves go through a sibling temp file
/// and a rename, so a concurrent load never observes a partial collection.
///
/// The handle is cheap to clone; clones share the same lock and backing
/// file.
pub struct JsonStore<T> {
    inner: Arc<StoreInner>,
    _marker: PhantomData<fn() -> T>,
}

struct StoreInner {
    path: PathBuf,
    on_corrupt: CorruptPolicy,
    write_lock: Mutex<()>,
}

impl<T> Clone for JsonStore<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            _marker: PhantomData,
        }
    }
}

impl<T> JsonStore<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    /// Create a store over `path`. The file does not need to exist yet.
    pub fn new(path: impl Into<PathBuf>, on_corrupt: CorruptPolicy) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                path: path.into(),
                on_corrupt,
                write_lock: Mutex::new(()),
            }),
            _marker: PhantomData,
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Read the whole collection.
    ///
    /// A missing file is an empty collection, not an error. Unparseable
    /// content degrades to an empty collection or fails depending on the
    /// configured [`CorruptPolicy`].
    pub async fn load_all(&self) -> StoreResult<Vec<T>> {
        let path = &self.inner.path;

        let raw = match fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(source) if source.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "store file absent, treating as empty");
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: path.clone(),
                    source,
                })
            }
        };

        match serde_json::from_str(&raw) {
            Ok(records) => Ok(records),
            Err(source) => match self.inner.on_corrupt {
                CorruptPolicy::EmptyCollection => {
                    warn!(
                        path = %path.display(),
                        error = %source,
                        "store file is corrupt, falling back to an empty collection"
                    );
                    Ok(Vec::new())
                }
                CorruptPolicy::Fail => Err(StoreError::Corrupt {
                    path: path.clone(),
                    source,
                }),
            },
        }
    }

    /// Overwrite the backing file with the full collection.
    pub async fn save_all(&self, records: &[T]) -> StoreResult<()> {
        let path = &self.inner.path;

        let json = serde_json::to_string_pretty(records).map_err(|source| StoreError::Encode {
            path: path.clone(),
            source,
        })?;

        let tmp_path = path.with_extension("tmp");
        fs::write(&tmp_path, json.as_bytes())
            .await
            .map_err(|source| StoreError::Io {
                path: tmp_path.clone(),
                source,
            })?;

        fs::rename(&tmp_path, path)
            .await
            .map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })
    }

    /// Append a record as-is, without touching identities.
    pub async fn insert(&self, record: T) -> StoreResult<()> {
        let _guard = self.inner.write_lock.lock().await;

        let mut records = self.load_all().await?;
        records.push(record);
        self.save_all(&records).await
    }

    /// All records matching `predicate`, in file order.
    pub async fn find<P>(&self, predicate: P) -> StoreResult<Vec<T>>
    where
        P: Fn(&T) -> bool,
    {
        let records = self.load_all().await?;
        Ok(records.into_iter().filter(|r| predicate(r)).collect())
    }
}

impl<T> JsonStore<T>
where
    T: Record + Serialize + DeserializeOwned + Clone,
{
    /// Next free identity: `max(id) + 1`, or `1` for an empty collection.
    pub fn next_id(existing: &[T]) -> i64 {
        existing
            .iter()
            .map(Record::id)
            .max()
            .map_or(1, |max| max + 1)
    }

    /// Append `record`, assigning it the next free id.
    ///
    /// The assigned id is written back into `record` so the caller can see
    /// it after the call returns.
    pub async fn add(&self, record: &mut T) -> StoreResult<()> {
        let _guard = self.inner.write_lock.lock().await;

        let mut records = self.load_all().await?;
        record.set_id(Self::next_id(&records));
        records.push(record.clone());
        self.save_all(&records).await
    }

    /// Replace the first record with a matching id.
    ///
    /// An unknown id is a silent no-op; callers that care should look the
    /// record up first.
    pub async fn update(&self, record: &T) -> StoreResult<()> {
        let _guard = self.inner.write_lock.lock().await;

        let mut records = self.load_all().await?;
        if let Some(slot) = records.iter_mut().find(|r| r.id() == record.id()) {
            *slot = record.clone();
            self.save_all(&records).await?;
        }
        Ok(())
    }

    /// Remove every record with the given id.
    ///
    /// Deliberately plural: tolerates duplicate ids that should never occur
    /// under store-assigned allocation.
    pub async fn remove(&self, id: i64) -> StoreResult<()> {
        let _guard = self.inner.write_lock.lock().await;

        let mut records = self.load_all().await?;
        records.retain(|r| r.id() != id);
        self.save_all(&records).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Widget {
        id: i64,
        label: String,
    }

    impl Record for Widget {
        fn id(&self) -> i64 {
            self.id
        }

        fn set_id(&mut self, id: i64) {
            self.id = id;
        }
    }

    fn widget(label: &str) -> Widget {
        Widget {
            id: 0,
            label: label.to_string(),
        }
    }

    fn test_store(dir: &TempDir, policy: CorruptPolicy) -> JsonStore<Widget> {
        JsonStore::new(dir.path().join("widgets.json"), policy)
    }

    #[test]
    fn next_id_is_max_plus_one_or_one_when_empty() {
        assert_eq!(JsonStore::<Widget>::next_id(&[]), 1);

        let existing = vec![
            Widget { id: 3, label: "a".into() },
            Widget { id: 7, label: "b".into() },
            Widget { id: 2, label: "c".into() },
        ];
        assert_eq!(JsonStore::next_id(&existing), 8);
    }

    #[tokio::test]
    async fn missing_file_loads_as_empty() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir, CorruptPolicy::Fail);

        let records = store.load_all().await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn add_assigns_monotonic_ids_starting_at_one() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir, CorruptPolicy::EmptyCollection);

        for expected in 1..=3 {
            let mut w = widget("w");
            store.add(&mut w).await.unwrap();
            assert_eq!(w.id, expected);
        }

        let ids: Vec<i64> = store.load_all().await.unwrap().iter().map(|w| w.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn id_allocation_survives_a_gap() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir, CorruptPolicy::EmptyCollection);

        let mut a = widget("a");
        let mut b = widget("b");
        store.add(&mut a).await.unwrap();
        store.add(&mut b).await.unwrap();
        store.remove(a.id).await.unwrap();

        let mut c = widget("c");
        store.add(&mut c).await.unwrap();
        // max + 1, not first-free: id 1 is never reused while 2 exists.
        assert_eq!(c.id, 3);
    }

    #[tokio::test]
    async fn save_and_load_round_trip_preserves_order() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir, CorruptPolicy::Fail);

        let records = vec![
            Widget { id: 5, label: "five".into() },
            Widget { id: 2, label: "two".into() },
            Widget { id: 9, label: "nine".into() },
        ];
        store.save_all(&records).await.unwrap();

        let loaded = store.load_all().await.unwrap();
        assert_eq!(loaded, records);
    }

    #[tokio::test]
    async fn update_replaces_in_place_and_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir, CorruptPolicy::EmptyCollection);

        let mut a = widget("before");
        let mut b = widget("other");
        store.add(&mut a).await.unwrap();
        store.add(&mut b).await.unwrap();

        a.label = "after".into();
        store.update(&a).await.unwrap();
        let once = store.load_all().await.unwrap();

        store.update(&a).await.unwrap();
        let twice = store.load_all().await.unwrap();

        assert_eq!(once, twice);
        assert_eq!(once[0].label, "after");
        assert_eq!(once[1].label, "other");
    }

    #[tokio::test]
    async fn update_of_unknown_id_is_a_silent_no_op() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir, CorruptPolicy::EmptyCollection);

        let mut a = widget("a");
        store.add(&mut a).await.unwrap();

        let ghost = Widget { id: 42, label: "ghost".into() };
        store.update(&ghost).await.unwrap();

        let records = store.load_all().await.unwrap();
        assert_eq!(records, vec![a]);
    }

    #[tokio::test]
    async fn remove_drops_every_matching_id() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir, CorruptPolicy::Fail);

        // Duplicate ids cannot be produced through add; write them directly
        // to prove remove is defensively plural.
        let records = vec![
            Widget { id: 1, label: "a".into() },
            Widget { id: 2, label: "b".into() },
            Widget { id: 1, label: "a-again".into() },
        ];
        store.save_all(&records).await.unwrap();

        store.remove(1).await.unwrap();

        let remaining = store.load_all().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, 2);

        let matches = store.find(|w| w.id == 1).await.unwrap();
        assert!(matches.is_empty());
    }

    #[tokio::test]
    async fn find_filters_in_file_order() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir, CorruptPolicy::Fail);

        let records = vec![
            Widget { id: 1, label: "keep".into() },
            Widget { id: 2, label: "drop".into() },
            Widget { id: 3, label: "keep".into() },
        ];
        store.save_all(&records).await.unwrap();

        let kept = store.find(|w| w.label == "keep").await.unwrap();
        let ids: Vec<i64> = kept.iter().map(|w| w.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn corrupt_file_degrades_to_empty_under_permissive_policy() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("widgets.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store: JsonStore<Widget> = JsonStore::new(&path, CorruptPolicy::EmptyCollection);
        let records = store.load_all().await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn corrupt_file_fails_under_strict_policy() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("widgets.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store: JsonStore<Widget> = JsonStore::new(&path, CorruptPolicy::Fail);
        let err = store.load_all().await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[tokio::test]
    async fn insert_appends_without_assigning_ids() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir, CorruptPolicy::EmptyCollection);

        store.insert(Widget { id: 0, label: "first".into() }).await.unwrap();
        store.insert(Widget { id: 0, label: "second".into() }).await.unwrap();

        let records = store.load_all().await.unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|w| w.id == 0));
        assert_eq!(records[0].label, "first");
        assert_eq!(records[1].label, "second");
    }

    #[tokio::test]
    async fn concurrent_adds_never_collide() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir, CorruptPolicy::EmptyCollection);

        let mut handles = Vec::new();
        for n in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let mut w = widget(&format!("w{n}"));
                store.add(&mut w).await.unwrap();
                w.id
            }));
        }

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap());
        }
        ids.sort_unstable();
        assert_eq!(ids, (1..=8).collect::<Vec<i64>>());

        assert_eq!(store.load_all().await.unwrap().len(), 8);
    }

    #[tokio::test]
    async fn saved_file_is_a_pretty_printed_json_array() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir, CorruptPolicy::Fail);

        let mut w = widget("w");
        store.add(&mut w).await.unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.trim_start().starts_with('['));
        // Pretty printing puts fields on their own lines.
        assert!(raw.contains("\n  "));
    }
}
