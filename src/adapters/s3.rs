use crate::domain::model::StoredImage;
use crate::domain::ports::ImageStorage;
use crate::utils::error::{CatalogueError, Result};
use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use aws_sdk_s3::Client as S3Client;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Product images in one bucket, addressed by their public virtual-hosted URL.
#[derive(Debug, Clone)]
pub struct S3ImageStore {
    client: S3Client,
    bucket: String,
    /// `https://{bucket}.s3.{region}.amazonaws.com`
    base_url: String,
}

impl S3ImageStore {
    pub fn new(client: S3Client, bucket: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url_for(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }
}

#[async_trait]
impl ImageStorage for S3ImageStore {
    async fn upload(&self, key: &str, content_type: &str, bytes: Vec<u8>) -> Result<String> {
        let size = bytes.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .acl(ObjectCannedAcl::PublicRead)
            .send()
            .await
            .map_err(|e| CatalogueError::storage("PutObject", DisplayErrorContext(&e)))?;

        tracing::debug!(bucket = %self.bucket, key = %key, size, "Uploaded image");
        Ok(self.url_for(key))
    }

    async fn delete(&self, url: &str) -> Result<()> {
        let key = self.key_for(url).ok_or_else(|| {
            CatalogueError::storage("DeleteObject", format!("{} is not in bucket {}", url, self.bucket))
        })?;

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|e| CatalogueError::storage("DeleteObject", DisplayErrorContext(&e)))?;

        tracing::debug!(bucket = %self.bucket, key = %key, "Deleted image");
        Ok(())
    }

    async fn fetch(&self, url: &str) -> Result<Option<StoredImage>> {
        let Some(key) = self.key_for(url) else {
            return Ok(None);
        };

        let response = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) if e.as_service_error().is_some_and(|se| se.is_no_such_key()) => {
                return Ok(None);
            }
            Err(e) => {
                return Err(CatalogueError::storage("GetObject", DisplayErrorContext(&e)));
            }
        };

        let content_type = response
            .content_type
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());
        let bytes = response
            .body
            .collect()
            .await
            .map_err(|e| CatalogueError::storage("GetObject", e))?
            .into_bytes()
            .to_vec();

        Ok(Some(StoredImage {
            content_type,
            bytes,
        }))
    }

    fn key_for(&self, url: &str) -> Option<String> {
        url.strip_prefix(&self.base_url)?
            .strip_prefix('/')
            .filter(|key| !key.is_empty())
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> S3ImageStore {
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(aws_sdk_s3::config::BehaviorVersion::latest())
            .region(aws_sdk_s3::config::Region::new("ap-south-1"))
            .build();
        S3ImageStore::new(
            S3Client::from_conf(config),
            "kalakala-images",
            "https://kalakala-images.s3.ap-south-1.amazonaws.com/",
        )
    }

    #[test]
    fn test_key_for_bucket_urls() {
        let store = store();

        assert_eq!(
            store.key_for("https://kalakala-images.s3.ap-south-1.amazonaws.com/p-1/front.png"),
            Some("p-1/front.png".to_string())
        );
        assert_eq!(
            store.url_for("p-1/front.png"),
            "https://kalakala-images.s3.ap-south-1.amazonaws.com/p-1/front.png"
        );
    }

    #[test]
    fn test_key_for_rejects_foreign_urls() {
        let store = store();

        assert_eq!(store.key_for("https://example.com/p-1/front.png"), None);
        assert_eq!(
            store.key_for("https://kalakala-images.s3.ap-south-1.amazonaws.com"),
            None
        );
        assert_eq!(
            store.key_for("https://kalakala-images.s3.ap-south-1.amazonaws.com.evil.io/x.png"),
            None
        );
    }
}
