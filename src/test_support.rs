//! Shared test utilities: an in-memory [`ObjectStore`] double plus state
//! builders for the unit and integration suites.

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;

use crate::{AppState, catalog::Catalog, config::Config, domain::ObjectStore, errors::StorageError};

/// In-memory object store. A `BTreeMap` keeps listing order lexicographic,
/// matching what S3 returns.
#[derive(Default, Clone)]
pub struct MemoryStore {
    objects: Arc<Mutex<BTreeMap<String, (Vec<u8>, Option<String>)>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an object directly, bypassing the trait.
    pub fn seed(&self, key: &str, data: &[u8], content_type: Option<&str>) {
        self.objects.lock().unwrap().insert(
            key.to_string(),
            (data.to_vec(), content_type.map(str::to_string)),
        );
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    pub fn read(&self, key: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .map(|(data, _)| data.clone())
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: Option<String>,
    ) -> Result<(), StorageError> {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (data, content_type));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<(Vec<u8>, Option<String>), StorageError> {
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn list(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.objects.lock().unwrap().keys().cloned().collect())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }

    async fn head(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.objects.lock().unwrap().contains_key(key))
    }
}

/// Config pointed at nothing real, for router-level tests.
pub fn test_config() -> Config {
    Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        bucket_name: "test-bucket".to_string(),
        aws_region: "us-east-1".to_string(),
        endpoint_url: None,
        public_base_url: Some("https://photos.test".to_string()),
        admin_password: "correct-horse".to_string(),
        allowed_origins: vec!["https://gallery.test".to_string()],
        max_upload_bytes: 1024 * 1024,
        credential_ttl_secs: 3600,
    }
}

/// Full application state over a fresh [`MemoryStore`]. Returns the store
/// too so tests can seed and inspect it directly.
pub fn test_state() -> (Arc<AppState>, MemoryStore) {
    let store = MemoryStore::new();
    let config = test_config();
    let catalog = Catalog::new(Arc::new(store.clone()), config.public_image_base());
    (Arc::new(AppState { catalog, config }), store)
}
