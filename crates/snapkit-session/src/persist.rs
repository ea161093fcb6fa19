//! Photo persistence: slots, stores, and the mirrored-write contract.
//!
//! A [`Slot`] names the logical home of a persisted photo (for example
//! `"captured"`), optionally mirrored into a second key (the profile
//! avatar cache). Both keys are updated in one transactional index write
//! so they can never diverge. Writes are last-write-wins per key.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex as StdMutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use snapkit_core::{encode_jpeg, CapturedImage, EncodeError};

/// The logical destination of a persisted photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    /// Primary index key.
    pub primary: String,
    /// Optional mirror key updated in the same write.
    pub mirror: Option<String>,
}

impl Slot {
    pub fn new(primary: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            mirror: None,
        }
    }

    pub fn with_mirror(primary: impl Into<String>, mirror: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            mirror: Some(mirror.into()),
        }
    }
}

/// A persisted photo reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedPhoto {
    /// Where the final image lives (file path or store URI).
    pub uri: String,
    /// When it was saved.
    pub saved_at: DateTime<Utc>,
}

/// Errors from the persistence sink.
#[derive(Debug, Error)]
pub enum PersistError {
    /// Filesystem error while writing the photo or index.
    #[error("Failed to write photo: {0}")]
    Io(String),

    /// The final image could not be encoded.
    #[error("Failed to encode photo: {0}")]
    Encode(#[from] EncodeError),

    /// The store rejected the write.
    #[error("Store rejected the write: {0}")]
    Store(String),
}

/// A persistence sink for final images.
#[allow(async_fn_in_trait)]
pub trait PhotoStore {
    /// Persist a final image under `slot`, updating the mirror key (when
    /// present) in the same logical operation.
    async fn persist(
        &self,
        image: &CapturedImage,
        slot: &Slot,
        quality: u8,
    ) -> Result<PersistedPhoto, PersistError>;

    /// Look up the current reference for a key.
    async fn lookup(&self, key: &str) -> Result<Option<PersistedPhoto>, PersistError>;
}

// ============================================================================
// In-memory store
// ============================================================================

/// An in-memory store. Used in tests and as the fallback sink when no
/// storage directory is configured; supports failure injection so retry
/// paths can be exercised.
#[derive(Debug, Default)]
pub struct MemoryPhotoStore {
    entries: StdMutex<HashMap<String, PersistedPhoto>>,
    images: StdMutex<HashMap<String, CapturedImage>>,
    fail_remaining: AtomicU32,
}

impl MemoryPhotoStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` persist calls fail with a store error.
    pub fn fail_times(&self, n: u32) {
        self.fail_remaining.store(n, Ordering::SeqCst);
    }

    /// Copy of the current index, for assertions.
    pub fn snapshot(&self) -> HashMap<String, PersistedPhoto> {
        self.entries.lock().expect("store mutex poisoned").clone()
    }

    /// The image currently stored under a key, for assertions.
    pub fn image_for(&self, key: &str) -> Option<CapturedImage> {
        self.images
            .lock()
            .expect("store mutex poisoned")
            .get(key)
            .cloned()
    }
}

impl PhotoStore for MemoryPhotoStore {
    async fn persist(
        &self,
        image: &CapturedImage,
        slot: &Slot,
        quality: u8,
    ) -> Result<PersistedPhoto, PersistError> {
        if self
            .fail_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(PersistError::Store("injected failure".to_string()));
        }

        // Validate the image the same way a real sink would
        let _ = encode_jpeg(image, quality)?;

        let entry = PersistedPhoto {
            uri: format!("mem://{}", slot.primary),
            saved_at: Utc::now(),
        };

        let mut entries = self.entries.lock().expect("store mutex poisoned");
        let mut images = self.images.lock().expect("store mutex poisoned");
        entries.insert(slot.primary.clone(), entry.clone());
        images.insert(slot.primary.clone(), image.clone());
        if let Some(mirror) = &slot.mirror {
            entries.insert(mirror.clone(), entry.clone());
            images.insert(mirror.clone(), image.clone());
        }
        Ok(entry)
    }

    async fn lookup(&self, key: &str) -> Result<Option<PersistedPhoto>, PersistError> {
        Ok(self
            .entries
            .lock()
            .expect("store mutex poisoned")
            .get(key)
            .cloned())
    }
}

// ============================================================================
// Filesystem store
// ============================================================================

/// A filesystem store: one JPEG file per primary slot plus a JSON index
/// mapping every key to its current reference.
///
/// The index is replaced atomically (write-temp-then-rename), so the
/// primary and mirror keys always change together.
#[derive(Debug)]
pub struct FsPhotoStore {
    root: PathBuf,
    /// Serializes read-modify-write cycles on the index.
    write_lock: tokio::sync::Mutex<()>,
}

impl FsPhotoStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    fn index_path(&self) -> PathBuf {
        self.root.join("index.json")
    }

    async fn load_index(&self) -> Result<HashMap<String, PersistedPhoto>, PersistError> {
        match tokio::fs::read_to_string(self.index_path()).await {
            Ok(contents) => serde_json::from_str(&contents)
                .map_err(|e| PersistError::Store(format!("corrupt index: {e}"))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(PersistError::Io(e.to_string())),
        }
    }

    async fn store_index(
        &self,
        index: &HashMap<String, PersistedPhoto>,
    ) -> Result<(), PersistError> {
        let contents = serde_json::to_string_pretty(index)
            .map_err(|e| PersistError::Store(e.to_string()))?;
        let tmp = self.root.join("index.json.tmp");
        tokio::fs::write(&tmp, contents)
            .await
            .map_err(|e| PersistError::Io(e.to_string()))?;
        tokio::fs::rename(&tmp, self.index_path())
            .await
            .map_err(|e| PersistError::Io(e.to_string()))
    }
}

impl PhotoStore for FsPhotoStore {
    async fn persist(
        &self,
        image: &CapturedImage,
        slot: &Slot,
        quality: u8,
    ) -> Result<PersistedPhoto, PersistError> {
        let _guard = self.write_lock.lock().await;

        let bytes = encode_jpeg(image, quality)?;

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| PersistError::Io(e.to_string()))?;

        // One file per primary slot; rewriting it is the last-write-wins
        let photo_path = self.root.join(format!("{}.jpg", slot.primary));
        let photo_tmp = self.root.join(format!("{}.jpg.tmp", slot.primary));
        tokio::fs::write(&photo_tmp, &bytes)
            .await
            .map_err(|e| PersistError::Io(e.to_string()))?;
        tokio::fs::rename(&photo_tmp, &photo_path)
            .await
            .map_err(|e| PersistError::Io(e.to_string()))?;

        let entry = PersistedPhoto {
            uri: photo_path.to_string_lossy().into_owned(),
            saved_at: Utc::now(),
        };

        // Primary and mirror land in a single index replacement
        let mut index = self.load_index().await.unwrap_or_else(|e| {
            warn!(error = %e, "index unreadable; rebuilding");
            HashMap::new()
        });
        index.insert(slot.primary.clone(), entry.clone());
        if let Some(mirror) = &slot.mirror {
            index.insert(mirror.clone(), entry.clone());
        }
        self.store_index(&index).await?;

        debug!(uri = %entry.uri, primary = %slot.primary, "photo persisted");
        Ok(entry)
    }

    async fn lookup(&self, key: &str) -> Result<Option<PersistedPhoto>, PersistError> {
        Ok(self.load_index().await?.get(key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_image() -> CapturedImage {
        CapturedImage::new(8, 8, vec![90u8; 8 * 8 * 3])
    }

    fn temp_root(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("snapkit-store-{}-{}", name, std::process::id()))
    }

    #[tokio::test]
    async fn test_memory_store_persist_and_lookup() {
        let store = MemoryPhotoStore::new();
        let slot = Slot::new("captured");

        let persisted = store.persist(&test_image(), &slot, 90).await.unwrap();
        assert_eq!(persisted.uri, "mem://captured");

        let found = store.lookup("captured").await.unwrap().unwrap();
        assert_eq!(found, persisted);
    }

    #[tokio::test]
    async fn test_memory_store_mirror_never_diverges() {
        let store = MemoryPhotoStore::new();
        let slot = Slot::with_mirror("captured", "profile.avatar");

        store.persist(&test_image(), &slot, 90).await.unwrap();
        store.persist(&test_image(), &slot, 90).await.unwrap();

        let primary = store.lookup("captured").await.unwrap().unwrap();
        let mirror = store.lookup("profile.avatar").await.unwrap().unwrap();
        assert_eq!(primary, mirror);
    }

    #[tokio::test]
    async fn test_memory_store_last_write_wins() {
        let store = MemoryPhotoStore::new();
        let slot = Slot::new("captured");

        let first = store.persist(&test_image(), &slot, 90).await.unwrap();
        let second = store.persist(&test_image(), &slot, 90).await.unwrap();

        let current = store.lookup("captured").await.unwrap().unwrap();
        assert_eq!(current, second);
        assert!(current.saved_at >= first.saved_at);
    }

    #[tokio::test]
    async fn test_memory_store_failure_injection() {
        let store = MemoryPhotoStore::new();
        store.fail_times(1);
        let slot = Slot::new("captured");

        let err = store.persist(&test_image(), &slot, 90).await.unwrap_err();
        assert!(matches!(err, PersistError::Store(_)));
        assert!(store.lookup("captured").await.unwrap().is_none());

        // Next write succeeds
        assert!(store.persist(&test_image(), &slot, 90).await.is_ok());
    }

    #[tokio::test]
    async fn test_memory_store_rejects_invalid_image() {
        let store = MemoryPhotoStore::new();
        let bad = CapturedImage {
            width: 4,
            height: 4,
            pixels: vec![0u8; 5],
        };
        let err = store
            .persist(&bad, &Slot::new("captured"), 90)
            .await
            .unwrap_err();
        assert!(matches!(err, PersistError::Encode(_)));
    }

    #[tokio::test]
    async fn test_fs_store_round_trip() {
        let root = temp_root("round-trip");
        let store = FsPhotoStore::new(&root);
        let slot = Slot::new("captured");

        let persisted = store.persist(&test_image(), &slot, 90).await.unwrap();

        // The file exists and is a JPEG
        let bytes = tokio::fs::read(&persisted.uri).await.unwrap();
        assert_eq!(&bytes[0..2], &[0xFF, 0xD8]);

        let found = store.lookup("captured").await.unwrap().unwrap();
        assert_eq!(found, persisted);

        let _ = tokio::fs::remove_dir_all(&root).await;
    }

    #[tokio::test]
    async fn test_fs_store_mirror_in_single_index() {
        let root = temp_root("mirror");
        let store = FsPhotoStore::new(&root);
        let slot = Slot::with_mirror("captured", "profile.avatar");

        store.persist(&test_image(), &slot, 90).await.unwrap();

        let primary = store.lookup("captured").await.unwrap().unwrap();
        let mirror = store.lookup("profile.avatar").await.unwrap().unwrap();
        assert_eq!(primary.uri, mirror.uri);
        assert_eq!(primary.saved_at, mirror.saved_at);

        let _ = tokio::fs::remove_dir_all(&root).await;
    }

    #[tokio::test]
    async fn test_fs_store_overwrites_slot() {
        let root = temp_root("overwrite");
        let store = FsPhotoStore::new(&root);
        let slot = Slot::new("captured");

        let first = store.persist(&test_image(), &slot, 90).await.unwrap();
        let second = store.persist(&test_image(), &slot, 90).await.unwrap();

        // Same file, newer entry
        assert_eq!(first.uri, second.uri);
        let current = store.lookup("captured").await.unwrap().unwrap();
        assert_eq!(current, second);

        let _ = tokio::fs::remove_dir_all(&root).await;
    }

    #[tokio::test]
    async fn test_fs_store_lookup_missing_key() {
        let root = temp_root("missing");
        let store = FsPhotoStore::new(&root);
        assert!(store.lookup("nothing").await.unwrap().is_none());

        let _ = tokio::fs::remove_dir_all(&root).await;
    }
}
