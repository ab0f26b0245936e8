pub mod cache;
pub mod error;
pub mod resolver;
pub mod s3;
pub mod store;

pub use cache::{CacheKey, Clock, SystemClock, UrlCache};
pub use error::ImageError;
pub use resolver::{ImageResolver, ImageSet, PlaceholderReason, Resolution};
pub use s3::S3Gateway;
pub use store::BlobStore;
