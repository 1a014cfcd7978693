//! Attachment storage backends.
//!
//! Contact-request attachments are stored under a collision-resistant key
//! (uuid + original extension) in one of two backends: the local filesystem
//! (development/testing, served under `/uploads`) or S3.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::{
    api::models::contact_requests::DocumentInfo,
    config::{Config, StorageConfig},
    errors::{Error, Result},
};

/// One uploaded file, buffered and ready to store
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub original_name: String,
    pub mime_type: String,
    pub content: Vec<u8>,
}

/// Trait for attachment storage backends
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Store file content and return its document metadata
    async fn store(&self, file: StoredFile) -> Result<DocumentInfo>;

    /// Retrieve file content using storage key
    async fn retrieve(&self, storage_key: &str) -> Result<Vec<u8>>;

    /// Delete file content using storage key
    async fn delete(&self, storage_key: &str) -> Result<()>;

    /// Check if file exists using storage key
    async fn exists(&self, storage_key: &str) -> Result<bool>;
}

/// Build the configured storage backend
pub async fn from_config(config: &Config) -> Result<Arc<dyn FileStorage>> {
    match &config.storage {
        StorageConfig::Local { path, public_base_url } => {
            let base_url = public_base_url
                .clone()
                .unwrap_or_else(|| format!("{}/uploads", config.app_url.trim_end_matches('/')));
            Ok(Arc::new(LocalFileStorage::new(PathBuf::from(path), base_url)))
        }
        StorageConfig::S3 {
            bucket,
            region,
            prefix,
            public_base_url,
        } => {
            let storage = S3FileStorage::new(bucket.clone(), region.clone(), prefix.clone(), public_base_url.clone()).await;
            Ok(Arc::new(storage))
        }
    }
}

/// Storage key: fresh uuid plus the original file's extension, so concurrent
/// uploads of identically-named files never collide.
fn storage_key_for(original_name: &str) -> String {
    let extension = Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| e.chars().all(|c| c.is_ascii_alphanumeric()));

    match extension {
        Some(ext) => format!("{}.{}", Uuid::new_v4(), ext.to_lowercase()),
        None => Uuid::new_v4().to_string(),
    }
}

// ============================================================================
// Local Filesystem Storage Implementation
// ============================================================================

/// Local filesystem storage backend - stores files in a directory
/// Useful for development and testing
pub struct LocalFileStorage {
    base_path: PathBuf,
    public_base_url: String,
}

impl LocalFileStorage {
    pub fn new(base_path: PathBuf, public_base_url: String) -> Self {
        Self {
            base_path,
            public_base_url,
        }
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn store(&self, file: StoredFile) -> Result<DocumentInfo> {
        let storage_key = storage_key_for(&file.original_name);
        let full_path = self.base_path.join(&storage_key);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| Error::Internal {
                operation: format!("create uploads directory: {e}"),
            })?;
        }

        let mut out = fs::File::create(&full_path).await.map_err(|e| Error::Internal {
            operation: format!("create upload file: {e}"),
        })?;
        out.write_all(&file.content).await.map_err(|e| Error::Internal {
            operation: format!("write upload file: {e}"),
        })?;
        out.sync_all().await.map_err(|e| Error::Internal {
            operation: format!("sync upload file: {e}"),
        })?;

        Ok(DocumentInfo {
            url: format!("{}/{}", self.public_base_url.trim_end_matches('/'), storage_key),
            filename: storage_key,
            original_name: file.original_name,
            size: file.content.len() as u64,
            mime_type: file.mime_type,
        })
    }

    async fn retrieve(&self, storage_key: &str) -> Result<Vec<u8>> {
        let full_path = self.base_path.join(storage_key);

        if !full_path.exists() {
            return Err(Error::NotFound {
                resource: "Attachment".to_string(),
                id: storage_key.to_string(),
            });
        }

        fs::read(&full_path).await.map_err(|e| Error::Internal {
            operation: format!("read upload file: {e}"),
        })
    }

    async fn delete(&self, storage_key: &str) -> Result<()> {
        let full_path = self.base_path.join(storage_key);

        if full_path.exists() {
            fs::remove_file(&full_path).await.map_err(|e| Error::Internal {
                operation: format!("delete upload file: {e}"),
            })?;
        }

        Ok(())
    }

    async fn exists(&self, storage_key: &str) -> Result<bool> {
        Ok(self.base_path.join(storage_key).exists())
    }
}

// ============================================================================
// S3 Storage Implementation
// ============================================================================

/// S3-compatible object storage backend
pub struct S3FileStorage {
    client: aws_sdk_s3::Client,
    bucket: String,
    prefix: Option<String>,
    public_base_url: Option<String>,
}

impl S3FileStorage {
    pub async fn new(bucket: String, region: Option<String>, prefix: Option<String>, public_base_url: Option<String>) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(aws_config::Region::new(region));
        }
        let sdk_config = loader.load().await;

        Self {
            client: aws_sdk_s3::Client::new(&sdk_config),
            bucket,
            prefix,
            public_base_url,
        }
    }

    fn object_key(&self, storage_key: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}/{}", prefix.trim_end_matches('/'), storage_key),
            None => storage_key.to_string(),
        }
    }

    fn public_url(&self, storage_key: &str) -> String {
        match &self.public_base_url {
            Some(base) => format!("{}/{}", base.trim_end_matches('/'), storage_key),
            None => format!("https://{}.s3.amazonaws.com/{}", self.bucket, self.object_key(storage_key)),
        }
    }

    fn upstream(operation: &str) -> Error {
        Error::Upstream {
            service: "object storage".to_string(),
            operation: operation.to_string(),
        }
    }
}

#[async_trait]
impl FileStorage for S3FileStorage {
    async fn store(&self, file: StoredFile) -> Result<DocumentInfo> {
        let storage_key = storage_key_for(&file.original_name);
        let size = file.content.len() as u64;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(self.object_key(&storage_key))
            .content_type(&file.mime_type)
            .body(aws_sdk_s3::primitives::ByteStream::from(file.content))
            .send()
            .await
            .map_err(|e| {
                tracing::error!("S3 put_object failed: {e}");
                Self::upstream("store attachment")
            })?;

        Ok(DocumentInfo {
            url: self.public_url(&storage_key),
            filename: storage_key,
            original_name: file.original_name,
            size,
            mime_type: file.mime_type,
        })
    }

    async fn retrieve(&self, storage_key: &str) -> Result<Vec<u8>> {
        let object = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(self.object_key(storage_key))
            .send()
            .await
            .map_err(|e| {
                if matches!(e.as_service_error(), Some(err) if err.is_no_such_key()) {
                    Error::NotFound {
                        resource: "Attachment".to_string(),
                        id: storage_key.to_string(),
                    }
                } else {
                    tracing::error!("S3 get_object failed: {e}");
                    Self::upstream("retrieve attachment")
                }
            })?;

        let data = object.body.collect().await.map_err(|e| {
            tracing::error!("S3 body read failed: {e}");
            Self::upstream("retrieve attachment")
        })?;

        Ok(data.into_bytes().to_vec())
    }

    async fn delete(&self, storage_key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(self.object_key(storage_key))
            .send()
            .await
            .map_err(|e| {
                tracing::error!("S3 delete_object failed: {e}");
                Self::upstream("delete attachment")
            })?;

        Ok(())
    }

    async fn exists(&self, storage_key: &str) -> Result<bool> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(self.object_key(storage_key))
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if matches!(e.as_service_error(), Some(err) if err.is_not_found()) => Ok(false),
            Err(e) => {
                tracing::error!("S3 head_object failed: {e}");
                Err(Self::upstream("check attachment"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_file(name: &str) -> StoredFile {
        StoredFile {
            original_name: name.to_string(),
            mime_type: "application/pdf".to_string(),
            content: b"file-content".to_vec(),
        }
    }

    #[test]
    fn test_storage_key_keeps_extension() {
        let key = storage_key_for("requirements.PDF");
        assert!(key.ends_with(".pdf"));
        assert_ne!(key, "requirements.PDF");

        // No extension, no trailing dot
        let key = storage_key_for("README");
        assert!(!key.contains('.'));

        // Suspicious extensions are dropped
        let key = storage_key_for("evil.p/df");
        assert!(!key.contains('/'));
    }

    #[test]
    fn test_storage_keys_unique() {
        assert_ne!(storage_key_for("a.txt"), storage_key_for("a.txt"));
    }

    #[tokio::test]
    async fn test_local_store_retrieve_delete() {
        let dir = TempDir::new().unwrap();
        let storage = LocalFileStorage::new(dir.path().to_path_buf(), "http://localhost:8080/uploads".to_string());

        let doc = storage.store(sample_file("requirements.pdf")).await.unwrap();
        assert_eq!(doc.original_name, "requirements.pdf");
        assert_eq!(doc.size, 12);
        assert!(doc.url.starts_with("http://localhost:8080/uploads/"));

        assert!(storage.exists(&doc.filename).await.unwrap());
        assert_eq!(storage.retrieve(&doc.filename).await.unwrap(), b"file-content");

        storage.delete(&doc.filename).await.unwrap();
        assert!(!storage.exists(&doc.filename).await.unwrap());
        assert!(storage.retrieve(&doc.filename).await.is_err());
    }
}
