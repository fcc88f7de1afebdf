/// Media relay: uploads buffered file bytes to an S3-compatible bucket and
/// returns the durable public URL; deletes by URL when media is replaced
/// or its owning row is removed.
///
/// Every call runs under a bounded timeout. Upload failures surface before
/// any database row references the object, so a failed relay never leaves
/// a dangling URL in the store.
use crate::config::MediaConfig;
use crate::error::{AppError, Result};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

#[derive(Clone)]
pub struct MediaStore {
    client: Arc<Client>,
    bucket: String,
    public_base_url: String,
    operation_timeout: Duration,
}

impl MediaStore {
    pub fn new(client: Arc<Client>, config: &MediaConfig) -> Self {
        Self {
            client,
            bucket: config.bucket.clone(),
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
            operation_timeout: Duration::from_secs(config.operation_timeout_secs),
        }
    }

    /// Build a client from the ambient AWS environment (credentials,
    /// region, endpoint override for MinIO-style deployments).
    pub async fn connect(config: &MediaConfig) -> Self {
        let aws_cfg = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(Arc::new(Client::new(&aws_cfg)), config)
    }

    async fn bounded<T, F>(&self, what: &str, fut: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, AppError>>,
    {
        tokio::time::timeout(self.operation_timeout, fut)
            .await
            .map_err(|_| AppError::Media(format!("{what} timed out")))?
    }

    /// Derive a fresh object key; the original filename only contributes
    /// its extension.
    pub fn object_key(prefix: &str, filename: &str) -> String {
        let ext = std::path::Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| e.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or("bin");
        format!("{prefix}/{}.{ext}", Uuid::new_v4())
    }

    /// Upload a buffered file and return its public URL.
    pub async fn upload(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<String> {
        let put = async {
            self.client
                .put_object()
                .bucket(&self.bucket)
                .key(key)
                .content_type(content_type)
                .body(ByteStream::from(body))
                .send()
                .await
                .map_err(|e| AppError::Media(format!("upload of {key} failed: {e}")))?;
            Ok(())
        };
        self.bounded("media upload", put).await?;

        Ok(format!("{}/{}", self.public_base_url, key))
    }

    /// Delete an object by key.
    pub async fn delete(&self, key: &str) -> Result<()> {
        let del = async {
            self.client
                .delete_object()
                .bucket(&self.bucket)
                .key(key)
                .send()
                .await
                .map_err(|e| AppError::Media(format!("delete of {key} failed: {e}")))?;
            Ok(())
        };
        self.bounded("media delete", del).await
    }

    /// Delete an object identified by the public URL stored in a row.
    /// Unknown URLs (different host, hand-edited rows) are ignored.
    pub async fn delete_by_url(&self, url: &str) -> Result<()> {
        match self.key_from_url(url) {
            Some(key) => self.delete(&key).await,
            None => {
                tracing::warn!("not deleting media with foreign url: {url}");
                Ok(())
            }
        }
    }

    fn key_from_url(&self, url: &str) -> Option<String> {
        url.strip_prefix(self.public_base_url.as_str())
            .map(|rest| rest.trim_start_matches('/').to_string())
            .filter(|key| !key.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_keys_keep_only_safe_extensions() {
        let key = MediaStore::object_key("videos", "holiday.MP4");
        assert!(key.starts_with("videos/"));
        assert!(key.ends_with(".MP4"));

        let key = MediaStore::object_key("avatars", "no-extension");
        assert!(key.ends_with(".bin"));

        let key = MediaStore::object_key("avatars", "weird.t@r");
        assert!(key.ends_with(".bin"));
    }

    #[test]
    fn object_keys_are_unique_per_call() {
        let a = MediaStore::object_key("videos", "same.mp4");
        let b = MediaStore::object_key("videos", "same.mp4");
        assert_ne!(a, b);
    }
}
