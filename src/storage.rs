use crate::{domain::ObjectStore, errors::StorageError};
use anyhow::Context;
use async_trait::async_trait;
use aws_sdk_s3::{Client as S3Client, error::SdkError, primitives::ByteStream};

#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: S3Client,
    bucket_name: String,
}

impl S3ObjectStore {
    pub fn new(client: S3Client, bucket_name: String) -> Self {
        Self {
            client,
            bucket_name,
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    /// Uploads data to S3 using PutObject. Sets Content-Type.
    async fn put(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: Option<String>,
    ) -> Result<(), StorageError> {
        let ct = content_type.unwrap_or_else(|| "application/octet-stream".to_string());
        tracing::debug!(s3_key = %key, bucket = %self.bucket_name, content_type = %ct, "S3: uploading object");

        self.client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            .body(ByteStream::from(data))
            .content_type(ct)
            .send()
            .await
            .context(format!("S3: failed to upload object with key '{key}'"))
            .map_err(StorageError::Backend)?;

        tracing::debug!(s3_key = %key, bucket = %self.bucket_name, "S3: upload successful");
        Ok(())
    }

    /// Downloads object bytes and the stored content type using GetObject.
    async fn get(&self, key: &str) -> Result<(Vec<u8>, Option<String>), StorageError> {
        tracing::debug!(s3_key = %key, bucket = %self.bucket_name, "S3: downloading object");

        let output = self
            .client
            .get_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await
            .map_err(|sdk_err| {
                // Check specifically for NoSuchKey
                if let SdkError::ServiceError(service_err) = &sdk_err {
                    if service_err.err().meta().code() == Some("NoSuchKey") {
                        tracing::warn!(s3_key = %key, bucket = %self.bucket_name, "S3: NoSuchKey downloading object");
                        return StorageError::NotFound(key.to_string());
                    }
                }
                tracing::error!(s3_key = %key, bucket = %self.bucket_name, error = %sdk_err, "S3: error downloading object");
                StorageError::Backend(anyhow::Error::new(sdk_err).context(format!(
                    "S3: failed to download object with key '{key}'"
                )))
            })?;

        let content_type = output.content_type().map(|s| s.to_string());
        let data = output
            .body
            .collect()
            .await
            .context(format!("S3: failed to collect body for key '{key}'"))
            .map_err(StorageError::Backend)?
            .into_bytes()
            .to_vec();

        Ok((data, content_type))
    }

    /// Lists every key in the bucket, following continuation tokens.
    async fn list(&self) -> Result<Vec<String>, StorageError> {
        let mut keys: Vec<String> = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut request = self.client.list_objects_v2().bucket(&self.bucket_name);
            if let Some(token) = &continuation_token {
                request = request.continuation_token(token);
            }

            let resp = request
                .send()
                .await
                .context(format!("S3: failed to list bucket '{}'", self.bucket_name))
                .map_err(StorageError::Backend)?;

            for object in resp.contents() {
                if let Some(key) = object.key() {
                    keys.push(key.to_string());
                }
            }

            match resp.next_continuation_token() {
                Some(token) => continuation_token = Some(token.to_string()),
                None => break,
            }
        }

        tracing::debug!(bucket = %self.bucket_name, count = keys.len(), "S3: listing complete");
        Ok(keys)
    }

    /// Deletes an object using DeleteObject.
    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        tracing::debug!(s3_key = %key, bucket = %self.bucket_name, "S3: deleting object");

        self.client
            .delete_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await
            .map_err(|sdk_err| {
                // DeleteObject succeeds even if the object doesn't exist, so
                // anything surfacing here is a real backend/permission error.
                tracing::error!(s3_key = %key, bucket = %self.bucket_name, error = %sdk_err, "S3: error deleting object");
                StorageError::Backend(anyhow::Error::new(sdk_err).context(format!(
                    "S3: failed to delete object with key '{key}'"
                )))
            })?;

        tracing::debug!(s3_key = %key, bucket = %self.bucket_name, "S3: delete request successful");
        Ok(())
    }

    /// Existence check via HeadObject.
    async fn head(&self, key: &str) -> Result<bool, StorageError> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(sdk_err) => {
                if let SdkError::ServiceError(service_err) = &sdk_err {
                    if service_err.err().is_not_found() {
                        return Ok(false);
                    }
                }
                tracing::error!(s3_key = %key, bucket = %self.bucket_name, error = %sdk_err, "S3: error checking object");
                Err(StorageError::Backend(anyhow::Error::new(sdk_err).context(
                    format!("S3: failed to check object with key '{key}'"),
                )))
            }
        }
    }
}
