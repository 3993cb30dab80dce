use crate::errors::StoreError;
use serde::{Serialize, de::DeserializeOwned};
use std::{
    collections::{BTreeMap, BTreeSet},
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};
use tokio::{
    fs,
    sync::{Mutex, broadcast},
    task::JoinHandle,
    time::MissedTickBehavior,
};
use tracing::{debug, error, info, warn};

pub const USER_KEY: &str = "wellness-user";
pub const SIGNUP_KEY: &str = "wellness-signup-data";
pub const ENTRIES_KEY: &str = "wellness-entries";

const EVENT_CAPACITY: usize = 64;

/// Origin of changes picked up from the store file rather than made through
/// a context of this process.
pub const EXTERNAL_ORIGIN: u64 = u64::MAX;

/// A write made through one storage context, as seen by the others.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: String,
    pub new_value: Option<String>,
    pub origin: u64,
}

struct Shared {
    path: Option<PathBuf>,
    items: Mutex<BTreeMap<String, String>>,
    events: broadcast::Sender<StorageEvent>,
    next_context: AtomicU64,
}

/// String records keyed by name, optionally mirrored to a JSON file.
///
/// Clones share the same context. Use [`LocalStorage::context`] to open a
/// second context over the same records; its writes are delivered to the
/// subscribers of every other context.
#[derive(Clone)]
pub struct LocalStorage {
    shared: Arc<Shared>,
    context: u64,
}

impl LocalStorage {
    pub fn in_memory() -> Self {
        Self::with_items(None, BTreeMap::new())
    }

    /// Opens the store file at `path`. A missing file starts empty, and so
    /// does one that cannot be read or parsed.
    pub async fn load(path: &Path) -> Self {
        let items = match fs::read(path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(items) => items,
                Err(err) => {
                    error!("failed to parse storage file: {err}");
                    BTreeMap::new()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => {
                error!("failed to read storage file: {err}");
                BTreeMap::new()
            }
        };

        Self::with_items(Some(path.to_path_buf()), items)
    }

    fn with_items(path: Option<PathBuf>, items: BTreeMap<String, String>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            shared: Arc::new(Shared {
                path,
                items: Mutex::new(items),
                events,
                next_context: AtomicU64::new(1),
            }),
            context: 0,
        }
    }

    /// A new context over the same records.
    pub fn context(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            context: self.shared.next_context.fetch_add(1, Ordering::Relaxed),
        }
    }

    pub fn context_id(&self) -> u64 {
        self.context
    }

    pub fn path(&self) -> Option<&Path> {
        self.shared.path.as_deref()
    }

    /// Changes made by other contexts.
    pub fn subscribe(&self) -> StorageEvents {
        StorageEvents {
            receiver: self.shared.events.subscribe(),
            context: self.context,
        }
    }

    pub async fn get_item(&self, key: &str) -> Option<String> {
        self.shared.items.lock().await.get(key).cloned()
    }

    pub async fn set_item(&self, key: &str, value: String) -> Result<(), StoreError> {
        let mut items = self.shared.items.lock().await;
        let mut next = items.clone();
        next.insert(key.to_string(), value.clone());
        self.persist(&next).await?;
        *items = next;
        self.publish(key, Some(value));
        Ok(())
    }

    pub async fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        let mut items = self.shared.items.lock().await;
        if !items.contains_key(key) {
            return Ok(());
        }
        let mut next = items.clone();
        next.remove(key);
        self.persist(&next).await?;
        *items = next;
        self.publish(key, None);
        Ok(())
    }

    pub async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        match self.get_item(key).await {
            Some(raw) => decode(key, &raw).map(Some),
            None => Ok(None),
        }
    }

    pub async fn write_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let raw = serde_json::to_string(value).map_err(|source| StoreError::Malformed {
            key: key.to_string(),
            source,
        })?;
        self.set_item(key, raw).await
    }

    async fn persist(&self, items: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let Some(path) = self.shared.path.as_deref() else {
            return Ok(());
        };
        let payload = serde_json::to_vec_pretty(items).map_err(|source| StoreError::Malformed {
            key: path.display().to_string(),
            source,
        })?;
        fs::write(path, payload).await.map_err(|err| {
            error!("failed to write storage file: {err}");
            StoreError::Io(err)
        })
    }

    fn publish(&self, key: &str, new_value: Option<String>) {
        publish_from(&self.shared, self.context, key, new_value);
    }

    /// Polls the store file every `period` and takes in records changed by
    /// another process. Each changed key is published with
    /// [`EXTERNAL_ORIGIN`]. Memory-only stores have nothing to watch.
    pub fn watch_file(&self, period: Duration) -> Option<JoinHandle<()>> {
        let path = self.shared.path.clone()?;
        let shared = Arc::clone(&self.shared);
        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                reload_external(&shared, &path).await;
            }
        }))
    }
}

async fn reload_external(shared: &Shared, path: &Path) {
    let mut items = shared.items.lock().await;
    let on_disk: BTreeMap<String, String> = match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(on_disk) => on_disk,
            Err(err) => {
                debug!("skipping unparseable storage file: {err}");
                return;
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return,
        Err(err) => {
            warn!("failed to poll storage file: {err}");
            return;
        }
    };
    if *items == on_disk {
        return;
    }

    let changed: Vec<(String, Option<String>)> = items
        .keys()
        .chain(on_disk.keys())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .filter(|key| items.get(*key) != on_disk.get(*key))
        .map(|key| (key.clone(), on_disk.get(key).cloned()))
        .collect();
    *items = on_disk;
    drop(items);

    for (key, new_value) in changed {
        info!(key, "storage record changed on disk");
        publish_from(shared, EXTERNAL_ORIGIN, &key, new_value);
    }
}

fn publish_from(shared: &Shared, origin: u64, key: &str, new_value: Option<String>) {
    let event = StorageEvent {
        key: key.to_string(),
        new_value,
        origin,
    };
    if shared.events.send(event).is_err() {
        debug!(key, "no storage subscribers");
    }
}

pub fn decode<T: DeserializeOwned>(key: &str, raw: &str) -> Result<T, StoreError> {
    serde_json::from_str(raw).map_err(|source| StoreError::Malformed {
        key: key.to_string(),
        source,
    })
}

pub struct StorageEvents {
    receiver: broadcast::Receiver<StorageEvent>,
    context: u64,
}

impl StorageEvents {
    /// Next change from another context, or `None` once the store is gone.
    /// Events missed by a lagging receiver are skipped.
    pub async fn recv(&mut self) -> Option<StorageEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if event.origin == self.context => continue,
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(missed, "storage subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unique_path() -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let mut path = std::env::temp_dir();
        path.push(format!("wellness_storage_{}_{}.json", std::process::id(), nanos));
        path
    }

    #[tokio::test]
    async fn items_survive_reload() {
        let path = unique_path();
        let storage = LocalStorage::load(&path).await;
        storage.set_item("a", "1".to_string()).await.unwrap();
        storage.set_item("b", "2".to_string()).await.unwrap();
        storage.remove_item("a").await.unwrap();

        let reloaded = LocalStorage::load(&path).await;
        assert_eq!(reloaded.get_item("a").await, None);
        assert_eq!(reloaded.get_item("b").await.as_deref(), Some("2"));
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn garbage_file_starts_empty() {
        let path = unique_path();
        std::fs::write(&path, b"not json").unwrap();
        let storage = LocalStorage::load(&path).await;
        assert_eq!(storage.get_item(USER_KEY).await, None);
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn events_only_reach_other_contexts() {
        let first = LocalStorage::in_memory();
        let second = first.context();
        let mut first_events = first.subscribe();
        let mut second_events = second.subscribe();

        first.set_item(USER_KEY, "x".to_string()).await.unwrap();
        second.remove_item(USER_KEY).await.unwrap();

        let seen_by_second = second_events.recv().await.unwrap();
        assert_eq!(seen_by_second.key, USER_KEY);
        assert_eq!(seen_by_second.new_value.as_deref(), Some("x"));
        assert_eq!(seen_by_second.origin, first.context_id());

        let seen_by_first = first_events.recv().await.unwrap();
        assert_eq!(seen_by_first.new_value, None);
        assert_eq!(seen_by_first.origin, second.context_id());
    }

    #[tokio::test]
    async fn malformed_record_is_reported() {
        let storage = LocalStorage::in_memory();
        storage.set_item(ENTRIES_KEY, "{".to_string()).await.unwrap();
        let result = storage.read_json::<Vec<u32>>(ENTRIES_KEY).await;
        assert!(matches!(result, Err(StoreError::Malformed { .. })));
    }

    #[tokio::test]
    async fn failed_write_leaves_records_unchanged() {
        let mut dir = std::env::temp_dir();
        dir.push(format!("wellness_storage_dir_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let storage = LocalStorage::load(&dir.join("store.json")).await;
        storage.set_item(USER_KEY, "kept".to_string()).await.unwrap();
        let mut events = storage.context().subscribe();

        std::fs::remove_dir_all(&dir).unwrap();
        assert!(matches!(
            storage.set_item(USER_KEY, "lost".to_string()).await,
            Err(StoreError::Io(_))
        ));
        assert!(matches!(
            storage.set_item(SIGNUP_KEY, "lost".to_string()).await,
            Err(StoreError::Io(_))
        ));
        assert!(storage.remove_item(USER_KEY).await.is_err());

        assert_eq!(storage.get_item(USER_KEY).await.as_deref(), Some("kept"));
        assert_eq!(storage.get_item(SIGNUP_KEY).await, None);
        assert!(
            tokio::time::timeout(Duration::from_millis(50), events.recv())
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn file_changes_from_another_process_are_published() {
        let path = unique_path();
        let storage = LocalStorage::load(&path).await;
        storage.set_item("a", "1".to_string()).await.unwrap();
        storage.set_item("c", "gone".to_string()).await.unwrap();
        let mut events = storage.subscribe();
        let watcher = storage.watch_file(Duration::from_millis(10)).unwrap();

        let external = serde_json::json!({ "a": "2", "b": "3" });
        std::fs::write(&path, serde_json::to_vec(&external).unwrap()).unwrap();

        let mut seen = Vec::new();
        for _ in 0..3 {
            let event = tokio::time::timeout(Duration::from_secs(2), events.recv())
                .await
                .expect("change was not observed")
                .unwrap();
            assert_eq!(event.origin, EXTERNAL_ORIGIN);
            seen.push((event.key, event.new_value));
        }
        seen.sort();
        assert_eq!(
            seen,
            vec![
                ("a".to_string(), Some("2".to_string())),
                ("b".to_string(), Some("3".to_string())),
                ("c".to_string(), None),
            ]
        );
        assert_eq!(storage.get_item("a").await.as_deref(), Some("2"));
        assert_eq!(storage.get_item("c").await, None);

        watcher.abort();
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn memory_store_has_no_file_to_watch() {
        assert!(LocalStorage::in_memory().watch_file(Duration::from_millis(10)).is_none());
    }
}
