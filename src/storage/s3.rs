use std::time::Duration;

use async_trait::async_trait;
use aws_config::timeout::TimeoutConfig;
use aws_config::BehaviorVersion;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;
use tracing::info;

use crate::config::STORAGE_TIMEOUT;
use crate::error::{BoxError, OptimizerError};
use crate::storage::ObjectStore;

/// SDK timeouts where `operation_timeout` bounds a whole call, retries
/// included.
pub fn timeout_config(operation_timeout: Duration) -> TimeoutConfig {
    TimeoutConfig::builder()
        .operation_timeout(operation_timeout)
        .build()
}

pub struct S3Store {
    client: Client,
    bucket: String,
}

impl S3Store {
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Build a client from the default AWS credential chain, bounding every
    /// operation by [`STORAGE_TIMEOUT`].
    pub async fn from_env(bucket: impl Into<String>) -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest())
            .timeout_config(timeout_config(STORAGE_TIMEOUT))
            .load()
            .await;

        Self::new(Client::new(&config), bucket)
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn download(&self, key: &str) -> Result<Bytes, OptimizerError> {
        info!(key, bucket = %self.bucket, "downloading image from s3");

        let read_error = |source: BoxError| OptimizerError::StorageRead {
            key: key.to_owned(),
            source,
        };

        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| read_error(e.into()))?;
        let body = resp
            .body
            .collect()
            .await
            .map_err(|e| read_error(e.into()))?;

        Ok(body.into_bytes())
    }

    async fn upload(&self, key: &str, payload: Bytes) -> Result<(), OptimizerError> {
        info!(key, bucket = %self.bucket, size = payload.len(), "uploading image to s3");

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(payload))
            .send()
            .await
            .map_err(|e| OptimizerError::StorageWrite {
                key: key.to_owned(),
                source: e.into(),
            })?;

        Ok(())
    }
}
