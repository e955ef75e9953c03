use crate::{
    domain::{ImageHost, ImageUpload},
    errors::StorageError,
};
use anyhow::Context;
use async_trait::async_trait;
use aws_sdk_s3::{primitives::ByteStream, Client as S3Client};
use uuid::Uuid;

/// Image host that stores custom uploads as S3 objects.
#[derive(Debug, Clone)]
pub struct S3ImageHost {
    client: S3Client,
    bucket_name: String,
    public_base_url: String,
}

impl S3ImageHost {
    /// `endpoint` is the LocalStack override when set; objects are then addressed path-style.
    pub fn new(client: S3Client, bucket_name: String, region: &str, endpoint: Option<&str>) -> Self {
        let public_base_url = match endpoint {
            Some(endpoint) => format!("{}/{}", endpoint.trim_end_matches('/'), bucket_name),
            None => format!("https://{}.s3.{}.amazonaws.com", bucket_name, region),
        };
        Self {
            client,
            bucket_name,
            public_base_url,
        }
    }

    pub fn object_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }
}

/// Object key for an upload: a fresh UUID plus the lowercased original extension.
pub fn object_key(file_name: Option<&str>) -> String {
    let extension = file_name
        .and_then(|name| name.rsplit_once('.').map(|(_, ext)| ext.to_lowercase()))
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| "bin".to_string());
    format!("{}.{}", Uuid::new_v4(), extension)
}

#[async_trait]
impl ImageHost for S3ImageHost {
    /// Uploads data to S3 using PutObject and returns the object URL.
    async fn upload(&self, image: ImageUpload) -> Result<String, StorageError> {
        let key = object_key(image.file_name.as_deref());
        let content_type = image
            .content_type
            .or_else(|| mime_guess::from_path(&key).first_raw().map(|s| s.to_string()))
            .unwrap_or_else(|| "application/octet-stream".to_string());
        tracing::debug!(s3_key = %key, bucket = %self.bucket_name, %content_type, "S3: Uploading image");

        self.client
            .put_object()
            .bucket(&self.bucket_name)
            .key(&key)
            .body(ByteStream::from(image.data))
            .content_type(content_type)
            .send()
            .await
            .context(format!("S3: Failed to upload object with key '{}'", key))
            .map_err(|e| StorageError::UploadFailed(format!("{:#}", e)))?;

        let url = self.object_url(&key);
        tracing::debug!(s3_key = %key, bucket = %self.bucket_name, %url, "S3: Upload successful");
        Ok(url)
    }
}
