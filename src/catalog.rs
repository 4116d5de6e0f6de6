use std::{
    collections::HashSet,
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use futures::future::join_all;
use uuid::Uuid;

use crate::{
    domain::ObjectStore,
    errors::StorageError,
    models::{Image, ImageMeta, OrderLedger},
};

/// Key of the ledger document recording display order.
pub const LEDGER_KEY: &str = ".gallery/order.json";
/// Prefix for per-image metadata side-car documents.
pub const META_PREFIX: &str = ".gallery/meta/";
/// Objects under this prefix are bookkeeping, never gallery images.
pub const RESERVED_PREFIX: &str = ".gallery/";

/// Merged, ordered view of the images in the bucket.
///
/// The ledger document is the single source of truth for display order; raw
/// listing order is only used as a fallback when the ledger is absent or
/// unreadable. Binary writes and ledger writes are separate, non-atomic
/// store calls: a crash between them leaves an orphaned object (invisible
/// until reconciled) or a dangling ledger entry (pruned on the next read).
#[derive(Clone)]
pub struct Catalog {
    store: Arc<dyn ObjectStore>,
    public_base_url: String,
}

impl Catalog {
    pub fn new(store: Arc<dyn ObjectStore>, public_base_url: String) -> Self {
        Self {
            store,
            public_base_url,
        }
    }

    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }

    /// Lists the gallery in display order.
    pub async fn list_images(&self) -> Result<Vec<Image>, StorageError> {
        let listed = self.store.list().await?;
        let candidates: Vec<String> = listed
            .into_iter()
            .filter(|key| !key.starts_with(RESERVED_PREFIX))
            .collect();

        // Re-check every listed key against concurrent deletes. A failed
        // check drops that key only, never the whole listing.
        let checks = join_all(candidates.iter().map(|key| self.store.head(key))).await;
        let verified: Vec<String> = candidates
            .into_iter()
            .zip(checks)
            .filter_map(|(key, check)| match check {
                Ok(true) => Some(key),
                Ok(false) => {
                    tracing::warn!(key = %key, "listed object vanished before verification");
                    None
                }
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "existence check failed, dropping key");
                    None
                }
            })
            .collect();

        let ordered = match self.load_ledger().await {
            Ok(Some(ledger)) => merge_order(&ledger.order, &verified),
            Ok(None) => verified,
            Err(e) => {
                tracing::warn!(error = %e, "order ledger unreadable, using raw listing order");
                verified
            }
        };

        let mut images = Vec::with_capacity(ordered.len());
        for key in ordered {
            let metadata = self.load_metadata(&key).await;
            images.push(Image {
                url: self.public_url(&key),
                metadata,
                key,
            });
        }
        Ok(images)
    }

    /// Stores a new photograph and makes it immediately visible at the
    /// front of the gallery order. The ledger update is explicit, not left
    /// to the read-path fallback.
    pub async fn store_image(
        &self,
        filename: Option<&str>,
        data: Vec<u8>,
        content_type: Option<String>,
        metadata: ImageMeta,
    ) -> Result<Image, StorageError> {
        let key = generate_key(filename);
        let content_type = content_type
            .or_else(|| mime_guess::from_path(&key).first_raw().map(|s| s.to_string()));

        self.store.put(&key, data, content_type).await?;

        if !metadata.is_empty() {
            let doc = serde_json::to_vec(&metadata).map_err(|e| {
                StorageError::Backend(
                    anyhow::Error::new(e).context("failed to encode metadata document"),
                )
            })?;
            self.store
                .put(
                    &format!("{META_PREFIX}{key}"),
                    doc,
                    Some("application/json".to_string()),
                )
                .await?;
        }

        let mut ledger = self.load_ledger().await?.unwrap_or_default();
        ledger.order.retain(|k| k != &key);
        ledger.order.insert(0, key.clone());
        self.write_ledger(&ledger).await?;

        tracing::info!(key = %key, "image stored and prepended to gallery order");
        Ok(Image {
            url: self.public_url(&key),
            metadata,
            key,
        })
    }

    /// Overwrites the display order from a client-submitted sequence.
    ///
    /// Read-modify-write at this boundary rather than a blind overwrite of
    /// client state: submitted keys that no longer exist are dropped, and
    /// live keys the client omitted are kept at the front so a stale admin
    /// view cannot hide newer uploads. Concurrent reorders remain
    /// last-writer-wins.
    pub async fn save_order(&self, submitted: Vec<String>) -> Result<(), StorageError> {
        let listed = self.store.list().await?;
        let live: HashSet<String> = listed
            .into_iter()
            .filter(|key| !key.starts_with(RESERVED_PREFIX))
            .collect();

        let mut seen: HashSet<String> = HashSet::new();
        let mut order: Vec<String> = submitted
            .into_iter()
            .filter(|key| live.contains(key) && seen.insert(key.clone()))
            .collect();

        let mut omitted: Vec<String> = live
            .iter()
            .filter(|key| !seen.contains(*key))
            .cloned()
            .collect();
        // Millis-prefixed keys: reverse lexicographic puts newest first.
        omitted.sort();
        omitted.reverse();

        let mut full = omitted;
        full.append(&mut order);

        tracing::debug!(count = full.len(), "persisting gallery order");
        self.write_ledger(&OrderLedger { order: full }).await
    }

    /// Removes a photograph, its metadata side-car, and its ledger entry.
    ///
    /// The binary goes first. If the ledger update is then lost, the read
    /// path prunes the dangling entry on the next listing.
    pub async fn delete_image(&self, key: &str) -> Result<(), StorageError> {
        self.store.delete(key).await?;

        if let Err(e) = self.store.delete(&format!("{META_PREFIX}{key}")).await {
            tracing::warn!(key = %key, error = %e, "failed to delete metadata document");
        }

        let mut ledger = self.load_ledger().await?.unwrap_or_default();
        ledger.order.retain(|k| k != key);
        self.write_ledger(&ledger).await?;

        tracing::info!(key = %key, "image deleted");
        Ok(())
    }

    /// Raw object fetch for the image-serving route. Bookkeeping documents
    /// are never served.
    pub async fn fetch_image(&self, key: &str) -> Result<(Vec<u8>, Option<String>), StorageError> {
        if key.starts_with(RESERVED_PREFIX) {
            return Err(StorageError::NotFound(key.to_string()));
        }
        self.store.get(key).await
    }

    /// Ok(None) when the ledger is absent or unparseable; Err only on a
    /// backend failure. Mutating paths propagate the Err rather than
    /// rebuilding the order from a failed read.
    async fn load_ledger(&self) -> Result<Option<OrderLedger>, StorageError> {
        match self.store.get(LEDGER_KEY).await {
            Ok((bytes, _)) => match OrderLedger::parse(&bytes) {
                Some(ledger) => Ok(Some(ledger)),
                None => {
                    tracing::warn!("order ledger document is unreadable, treating as absent");
                    Ok(None)
                }
            },
            Err(StorageError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn write_ledger(&self, ledger: &OrderLedger) -> Result<(), StorageError> {
        let doc = serde_json::to_vec(ledger).map_err(|e| {
            StorageError::Backend(anyhow::Error::new(e).context("failed to encode order ledger"))
        })?;
        self.store
            .put(LEDGER_KEY, doc, Some("application/json".to_string()))
            .await
    }

    /// Metadata absence is never an error; a missing or corrupt side-car
    /// just yields an empty record.
    async fn load_metadata(&self, key: &str) -> ImageMeta {
        match self.store.get(&format!("{META_PREFIX}{key}")).await {
            Ok((bytes, _)) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                tracing::warn!(key = %key, error = %e, "metadata document is unreadable");
                ImageMeta::default()
            }),
            Err(StorageError::NotFound(_)) => ImageMeta::default(),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "failed to fetch metadata document");
                ImageMeta::default()
            }
        }
    }
}

/// Applies ledger order to the verified key set: ledger entries whose keys
/// still exist keep their positions, dangling entries are dropped, and keys
/// the ledger does not know yet are prepended newest-first so fresh uploads
/// are never invisible.
fn merge_order(ledger: &[String], verified: &[String]) -> Vec<String> {
    let live: HashSet<&str> = verified.iter().map(String::as_str).collect();
    let in_ledger: HashSet<&str> = ledger.iter().map(String::as_str).collect();

    let mut unlisted: Vec<String> = verified
        .iter()
        .filter(|key| !in_ledger.contains(key.as_str()))
        .cloned()
        .collect();
    // Millis-prefixed keys: reverse lexicographic puts newest first.
    unlisted.sort();
    unlisted.reverse();

    let mut seen: HashSet<&str> = HashSet::new();
    let mut ordered = unlisted;
    ordered.extend(
        ledger
            .iter()
            .filter(|key| live.contains(key.as_str()) && seen.insert(key.as_str()))
            .cloned(),
    );
    ordered
}

/// Builds a collision-resistant storage key: unix-millis prefix plus the
/// sanitized original filename, with a uuid stem when the filename yields
/// nothing usable.
fn generate_key(filename: Option<&str>) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();

    let name = filename
        .map(sanitize_filename)
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    format!("{millis}-{name}")
}

/// Keeps a filename safe for key use: alphanumerics, dot, dash and
/// underscore survive, anything else becomes a dash.
fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '-'
            }
        })
        .collect();
    cleaned
        .trim_matches(|c| c == '-' || c == '.')
        .chars()
        .take(120)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MemoryStore;

    fn keys(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn merge_keeps_ledger_order() {
        let ordered = merge_order(&keys(&["b", "a", "c"]), &keys(&["a", "b", "c"]));
        assert_eq!(ordered, keys(&["b", "a", "c"]));
    }

    #[test]
    fn merge_drops_dangling_ledger_entries() {
        let ordered = merge_order(&keys(&["d", "a"]), &keys(&["a"]));
        assert_eq!(ordered, keys(&["a"]));
    }

    #[test]
    fn merge_prepends_unledgered_keys_newest_first() {
        let ordered = merge_order(
            &keys(&["1000-old.jpg"]),
            &keys(&["1000-old.jpg", "2000-new.jpg", "3000-newest.jpg"]),
        );
        assert_eq!(
            ordered,
            keys(&["3000-newest.jpg", "2000-new.jpg", "1000-old.jpg"])
        );
    }

    #[test]
    fn merge_ignores_duplicate_ledger_entries() {
        let ordered = merge_order(&keys(&["a", "b", "a"]), &keys(&["a", "b"]));
        assert_eq!(ordered, keys(&["a", "b"]));
    }

    #[test]
    fn merge_of_empty_ledger_is_newest_first_listing() {
        let ordered = merge_order(&[], &keys(&["1000-a.jpg", "2000-b.jpg"]));
        assert_eq!(ordered, keys(&["2000-b.jpg", "1000-a.jpg"]));
    }

    #[test]
    fn sanitize_strips_path_and_odd_characters() {
        assert_eq!(sanitize_filename("my photo (1).jpg"), "my-photo--1-.jpg");
        assert_eq!(sanitize_filename("../../etc/passwd"), "etc-passwd");
        assert_eq!(sanitize_filename(".hidden"), "hidden");
    }

    #[test]
    fn generated_keys_are_millis_prefixed() {
        let key = generate_key(Some("dawn.jpg"));
        let (prefix, rest) = key.split_once('-').unwrap();
        assert!(prefix.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(rest, "dawn.jpg");
    }

    #[test]
    fn unusable_filename_falls_back_to_uuid_stem() {
        let key = generate_key(Some("???"));
        let (_, rest) = key.split_once('-').unwrap();
        assert!(!rest.is_empty());
        let key = generate_key(None);
        assert!(key.contains('-'));
    }

    fn catalog(store: &MemoryStore) -> Catalog {
        Catalog::new(
            Arc::new(store.clone()),
            "https://photos.test".to_string(),
        )
    }

    #[tokio::test]
    async fn upload_prepends_key_to_ledger() {
        let store = MemoryStore::new();
        store.seed(LEDGER_KEY, br#"{"order":["1000-old.jpg"]}"#, None);
        store.seed("1000-old.jpg", b"old", Some("image/jpeg"));

        let image = catalog(&store)
            .store_image(Some("new.jpg"), b"new".to_vec(), None, ImageMeta::default())
            .await
            .unwrap();

        let ledger = OrderLedger::parse(&store.read(LEDGER_KEY).unwrap()).unwrap();
        assert_eq!(ledger.order.first(), Some(&image.key));
        assert_eq!(ledger.order.len(), 2);
        assert_eq!(image.url, format!("https://photos.test/{}", image.key));
    }

    #[tokio::test]
    async fn upload_writes_metadata_sidecar() {
        let store = MemoryStore::new();
        let meta = ImageMeta {
            title: Some("Dawn".into()),
            ..ImageMeta::default()
        };

        let image = catalog(&store)
            .store_image(Some("dawn.jpg"), b"bytes".to_vec(), None, meta.clone())
            .await
            .unwrap();

        let sidecar = store.read(&format!("{META_PREFIX}{}", image.key)).unwrap();
        assert_eq!(serde_json::from_slice::<ImageMeta>(&sidecar).unwrap(), meta);
    }

    #[tokio::test]
    async fn delete_removes_binary_sidecar_and_ledger_entry() {
        let store = MemoryStore::new();
        store.seed("1000-a.jpg", b"a", None);
        store.seed(&format!("{META_PREFIX}1000-a.jpg"), b"{}", None);
        store.seed(LEDGER_KEY, br#"{"order":["1000-a.jpg","2000-b.jpg"]}"#, None);
        store.seed("2000-b.jpg", b"b", None);

        catalog(&store).delete_image("1000-a.jpg").await.unwrap();

        assert!(!store.contains("1000-a.jpg"));
        assert!(!store.contains(&format!("{META_PREFIX}1000-a.jpg")));
        let ledger = OrderLedger::parse(&store.read(LEDGER_KEY).unwrap()).unwrap();
        assert_eq!(ledger.order, keys(&["2000-b.jpg"]));
    }

    #[tokio::test]
    async fn list_attaches_sidecar_metadata() {
        let store = MemoryStore::new();
        store.seed("1000-a.jpg", b"a", None);
        store.seed(
            &format!("{META_PREFIX}1000-a.jpg"),
            br#"{"title":"Dawn","location":"London"}"#,
            None,
        );

        let images = catalog(&store).list_images().await.unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].metadata.title.as_deref(), Some("Dawn"));
        assert_eq!(images[0].metadata.location.as_deref(), Some("London"));
    }

    #[tokio::test]
    async fn corrupt_ledger_falls_back_to_listing_order() {
        let store = MemoryStore::new();
        store.seed(LEDGER_KEY, b"not json at all", None);
        store.seed("a.jpg", b"a", None);
        store.seed("b.jpg", b"b", None);

        let images = catalog(&store).list_images().await.unwrap();
        let listed: Vec<&str> = images.iter().map(|i| i.key.as_str()).collect();
        assert_eq!(listed, vec!["a.jpg", "b.jpg"]);
    }

    #[tokio::test]
    async fn reserved_documents_never_listed() {
        let store = MemoryStore::new();
        store.seed(LEDGER_KEY, br#"{"order":[]}"#, None);
        store.seed(&format!("{META_PREFIX}gone.jpg"), b"{}", None);

        let images = catalog(&store).list_images().await.unwrap();
        assert!(images.is_empty());
    }

    #[tokio::test]
    async fn fetch_refuses_reserved_keys() {
        let store = MemoryStore::new();
        store.seed(LEDGER_KEY, br#"{"order":[]}"#, None);

        let err = catalog(&store).fetch_image(LEDGER_KEY).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }
}
