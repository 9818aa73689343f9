use crate::traits::{Listing, ObjectEntry, ProgressSink, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::Error as ObjectStoreError;
use object_store::{
    Attribute, AttributeValue, Attributes, MultipartUpload, ObjectStore, ObjectStoreExt, PutMultipartOptions,
    PutOptions, PutPayload, Result as ObjectResult,
};

/// S3 storage implementation
///
/// Bodies up to `part_size` go out in a single PUT. Larger bodies use a
/// multipart upload and report progress after every completed part.
#[derive(Clone)]
pub struct S3Storage {
    store: AmazonS3,
    bucket: String,
    region: String,
    endpoint_url: Option<String>, // Custom endpoint for S3-compatible providers
    part_size: usize,
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    /// * `part_size` - Multipart chunk size in bytes
    pub async fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
        part_size: usize,
    ) -> StorageResult<Self> {
        // Credentials come from the environment (AWS_ACCESS_KEY_ID, etc.).
        Self::with_builder(
            AmazonS3Builder::from_env(),
            bucket,
            region,
            endpoint_url,
            part_size,
        )
    }

    fn with_builder(
        builder: AmazonS3Builder,
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
        part_size: usize,
    ) -> StorageResult<Self> {
        let mut builder = builder
            .with_region(region.clone())
            .with_bucket_name(bucket.clone());

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        if part_size == 0 {
            return Err(StorageError::ConfigError(
                "S3 part size must be positive".to_string(),
            ));
        }

        Ok(S3Storage {
            store,
            bucket,
            region,
            endpoint_url,
            part_size,
        })
    }

    /// Generate public URL for S3 object
    ///
    /// For AWS S3, uses the standard format: https://{bucket}.s3.{region}.amazonaws.com/{key}
    /// For S3-compatible providers, uses path-style: {endpoint}/{bucket}/{key}
    fn generate_url(&self, key: &str) -> String {
        if let Some(ref endpoint) = self.endpoint_url {
            let base_url = endpoint.trim_end_matches('/');
            format!("{}/{}/{}", base_url, self.bucket, key)
        } else {
            format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.bucket, self.region, key
            )
        }
    }

    async fn put_multipart_parts(
        &self,
        location: &Path,
        data: &Bytes,
        attributes: Attributes,
        progress: &dyn ProgressSink,
    ) -> ObjectResult<()> {
        let total = data.len() as u64;
        let opts = PutMultipartOptions {
            attributes,
            ..Default::default()
        };
        let mut upload = self.store.put_multipart_opts(location, opts).await?;

        let mut sent = 0usize;
        while sent < data.len() {
            let end = (sent + self.part_size).min(data.len());
            let part = PutPayload::from(data.slice(sent..end));
            if let Err(e) = upload.put_part(part).await {
                abort_upload(upload.as_mut(), location).await;
                return Err(e);
            }
            sent = end;
            progress.on_progress(sent as u64, total);
        }

        if let Err(e) = upload.complete().await {
            abort_upload(upload.as_mut(), location).await;
            return Err(e);
        }
        Ok(())
    }
}

async fn abort_upload(upload: &mut dyn MultipartUpload, location: &Path) {
    if let Err(e) = upload.abort().await {
        tracing::warn!(error = %e, key = %location, "Failed to abort multipart upload");
    }
}

fn content_type_attributes(content_type: &str) -> Attributes {
    Attributes::from_iter([(Attribute::ContentType, AttributeValue::from(content_type.to_string()))])
}

/// `photos/` and `""` become `Some("photos")` and `None`.
fn prefix_path(prefix: &str) -> Option<Path> {
    let trimmed = prefix.trim_end_matches('/');
    if trimmed.is_empty() {
        None
    } else {
        Some(Path::from(trimmed))
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn put_stream(
        &self,
        key: &str,
        content_type: &str,
        data: Bytes,
        progress: &dyn ProgressSink,
    ) -> StorageResult<()> {
        crate::keys::validate_key(key)?;

        let size = data.len() as u64;
        let location = Path::from(key);
        let start = std::time::Instant::now();
        let attributes = content_type_attributes(content_type);

        progress.on_progress(0, size);

        let result: ObjectResult<()> = if data.len() <= self.part_size {
            let opts = PutOptions {
                attributes,
                ..Default::default()
            };
            self.store
                .put_opts(&location, PutPayload::from(data), opts)
                .await
                .map(|_| progress.on_progress(size, size))
        } else {
            self.put_multipart_parts(&location, &data, attributes, progress)
                .await
        };

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %key,
                content_type = %content_type,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 upload failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            content_type = %content_type,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(())
    }

    async fn get(&self, key: &str) -> StorageResult<Bytes> {
        let start = std::time::Instant::now();
        let location = Path::from(key);

        let result = self.store.get(&location).await.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(key.to_string()),
            other => {
                tracing::error!(
                    error = %other,
                    bucket = %self.bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 download failed"
                );
                StorageError::DownloadFailed(other.to_string())
            }
        })?;

        let bytes = result
            .bytes()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = bytes.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 download successful"
        );

        Ok(bytes)
    }

    async fn list(&self, prefix: &str) -> StorageResult<Listing> {
        let location = prefix_path(prefix);

        let result = self
            .store
            .list_with_delimiter(location.as_ref())
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    prefix = %prefix,
                    "S3 list failed"
                );
                StorageError::BackendError(e.to_string())
            })?;

        let common_prefixes = result
            .common_prefixes
            .into_iter()
            .map(|p| format!("{}/", p))
            .collect();

        let objects = result
            .objects
            .into_iter()
            .map(|meta| ObjectEntry {
                key: meta.location.to_string(),
                size: meta.size,
                last_modified: Some(meta.last_modified),
            })
            .collect();

        Ok(Listing {
            common_prefixes,
            objects,
        })
    }

    async fn copy(&self, from_key: &str, to_key: &str) -> StorageResult<()> {
        let start = std::time::Instant::now();
        let from = Path::from(from_key);
        let to = Path::from(to_key);

        self.store.copy(&from, &to).await.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(from_key.to_string()),
            other => StorageError::BackendError(other.to_string()),
        })?;

        tracing::info!(
            from_key = %from_key,
            to_key = %to_key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 copy successful"
        );

        Ok(())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let start = std::time::Instant::now();
        let location = Path::from(key);

        let result: ObjectResult<_> = self.store.delete(&location).await;

        match result {
            Ok(()) | Err(ObjectStoreError::NotFound { .. }) => {}
            Err(e) => {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 delete failed"
                );
                return Err(StorageError::DeleteFailed(e.to_string()));
            }
        }

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 delete successful"
        );

        Ok(())
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let location = Path::from(key);
        match self.store.head(&location).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    fn object_url(&self, key: &str) -> String {
        self.generate_url(key)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}
