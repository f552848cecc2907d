use async_trait::async_trait;
use bytes::Bytes;

use crate::error::OptimizerError;

pub mod memory;
pub mod s3;

pub use memory::MemoryStore;
pub use s3::S3Store;

/// Whole-object access to the images bucket.
///
/// A download either yields the complete object or an error; an upload
/// either completes or leaves the previous object state in place.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn download(&self, key: &str) -> Result<Bytes, OptimizerError>;

    async fn upload(&self, key: &str, payload: Bytes) -> Result<(), OptimizerError>;
}
