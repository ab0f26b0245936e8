use std::time::Duration;

use async_trait::async_trait;

use crate::error::ImageError;

/// Object-storage operations the image resolver needs: listing keys under a
/// prefix and issuing time-limited signed GET URLs.
///
/// [`crate::S3Gateway`] is the production implementation; tests substitute
/// in-memory fakes.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Lists object keys starting with `prefix`, in the store's listing order.
    async fn list_objects(&self, prefix: &str) -> Result<Vec<String>, ImageError>;

    /// Generates a presigned GET URL for `key`, valid for `expires_in`.
    async fn presign_get(&self, key: &str, expires_in: Duration) -> Result<String, ImageError>;
}
