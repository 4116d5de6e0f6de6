use crate::errors::StorageError;
use async_trait::async_trait;

/// Operations against the key-addressed object store backing the gallery.
///
/// Every call is a fallible network operation with no implicit retry.
/// Callers issuing batches must tolerate partial success; nothing here is
/// atomic across calls.
#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    /// Stores `data` under `key`, overwriting any existing object.
    async fn put(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: Option<String>,
    ) -> Result<(), StorageError>;

    /// Fetches an object's bytes and stored content type.
    async fn get(&self, key: &str) -> Result<(Vec<u8>, Option<String>), StorageError>;

    /// Lists every key in the bucket, in the backend's listing order.
    async fn list(&self) -> Result<Vec<String>, StorageError>;

    /// Removes an object. Deleting an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Cheap existence check for `key`.
    async fn head(&self, key: &str) -> Result<bool, StorageError>;
}
