//! Folder-to-signed-URLs resolution.
//!
//! Given a product's image-folder URL, lists the matching blob store
//! objects, picks the cover image, and presigns a URL for every image.
//! The resolver never fails: any listing or signing error collapses into a
//! placeholder result so callers always have something displayable.

use std::sync::Arc;
use std::time::Duration;

use crate::store::BlobStore;

/// File extensions treated as product images. Compared case-insensitively.
const IMAGE_EXTENSIONS: [&str; 5] = [".jpg", ".jpeg", ".png", ".gif", ".webp"];

/// Substring (lowercased) marking a key as the cover image.
const COVER_MARKER: &str = "portada";

/// Signed URLs for one product folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSet {
    /// Always populated; the placeholder path when nothing could be resolved.
    pub main_url: String,
    /// Remaining images in blob-store listing order.
    pub additional_urls: Vec<String>,
}

/// Outcome of a folder resolution.
///
/// Distinguishes "folder genuinely has no images" from "the blob store
/// call failed", which the storefront renders identically but the cache
/// treats differently (errors are never cached).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(ImageSet),
    Placeholder(PlaceholderReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaceholderReason {
    NoImages,
    StoreError(String),
}

impl Resolution {
    /// Collapses either outcome into a displayable [`ImageSet`], using
    /// `placeholder` as the main URL for placeholder outcomes.
    #[must_use]
    pub fn into_image_set(self, placeholder: &str) -> ImageSet {
        match self {
            Resolution::Resolved(set) => set,
            Resolution::Placeholder(_) => ImageSet {
                main_url: placeholder.to_owned(),
                additional_urls: Vec::new(),
            },
        }
    }
}

/// Resolves a folder reference into presigned image URLs via a [`BlobStore`].
pub struct ImageResolver {
    store: Arc<dyn BlobStore>,
    url_expiration: Duration,
}

impl ImageResolver {
    #[must_use]
    pub fn new(store: Arc<dyn BlobStore>, url_expiration: Duration) -> Self {
        Self {
            store,
            url_expiration,
        }
    }

    /// Resolves all images under `folder_ref`.
    ///
    /// The first listed key containing `"portada"` (case-insensitive)
    /// becomes the cover; the remaining image keys become additional URLs
    /// in listing order. Errors never propagate — they become
    /// [`Resolution::Placeholder`].
    pub async fn resolve(&self, folder_ref: &str) -> Resolution {
        let folder = normalize_folder(folder_ref);
        let prefix = object_prefix(&folder);

        let keys = match self.store.list_objects(&prefix).await {
            Ok(keys) => keys,
            Err(e) => {
                tracing::warn!(folder = %folder, error = %e, "blob store listing failed");
                return Resolution::Placeholder(PlaceholderReason::StoreError(e.to_string()));
            }
        };

        let image_keys: Vec<&String> = keys.iter().filter(|k| is_image_key(k)).collect();
        if image_keys.is_empty() {
            return Resolution::Placeholder(PlaceholderReason::NoImages);
        }

        let cover_idx = image_keys
            .iter()
            .position(|k| k.to_lowercase().contains(COVER_MARKER))
            .unwrap_or(0);

        let mut main_url = String::new();
        let mut additional_urls = Vec::with_capacity(image_keys.len() - 1);
        for (idx, key) in image_keys.iter().enumerate() {
            let url = match self.store.presign_get(key, self.url_expiration).await {
                Ok(url) => url,
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "presigning failed");
                    return Resolution::Placeholder(PlaceholderReason::StoreError(e.to_string()));
                }
            };
            if idx == cover_idx {
                main_url = url;
            } else {
                additional_urls.push(url);
            }
        }

        Resolution::Resolved(ImageSet {
            main_url,
            additional_urls,
        })
    }
}

/// Ensures a folder reference ends with a single `/`.
#[must_use]
pub fn normalize_folder(folder_ref: &str) -> String {
    if folder_ref.ends_with('/') {
        folder_ref.to_owned()
    } else {
        format!("{folder_ref}/")
    }
}

/// Derives the object-key prefix from a folder reference. URLs have their
/// scheme and host stripped, e.g.
/// `https://venta-garage.s3.amazonaws.com/tesla/` → `tesla/`; a bare host
/// yields the empty prefix. Scheme-less references like `tesla/` are
/// already prefixes and pass through unchanged.
fn object_prefix(folder: &str) -> String {
    let Some(without_scheme) = folder
        .strip_prefix("https://")
        .or_else(|| folder.strip_prefix("http://"))
    else {
        return folder.to_owned();
    };
    match without_scheme.split_once('/') {
        Some((_host, rest)) => rest.to_owned(),
        None => String::new(),
    }
}

fn is_image_key(key: &str) -> bool {
    let lower = key.to_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::error::ImageError;

    /// In-memory blob store returning a fixed key listing and
    /// `signed:{key}` URLs, counting listing calls.
    pub(crate) struct FakeBlobStore {
        pub keys: Vec<String>,
        pub list_calls: AtomicUsize,
        pub fail_listing: bool,
    }

    impl FakeBlobStore {
        pub(crate) fn with_keys(keys: &[&str]) -> Self {
            Self {
                keys: keys.iter().map(|k| (*k).to_string()).collect(),
                list_calls: AtomicUsize::new(0),
                fail_listing: false,
            }
        }
    }

    #[async_trait]
    impl BlobStore for FakeBlobStore {
        async fn list_objects(&self, prefix: &str) -> Result<Vec<String>, ImageError> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_listing {
                return Err(ImageError::UnexpectedStatus {
                    status: 503,
                    url: prefix.to_owned(),
                });
            }
            Ok(self
                .keys
                .iter()
                .filter(|k| k.starts_with(prefix))
                .cloned()
                .collect())
        }

        async fn presign_get(
            &self,
            key: &str,
            _expires_in: Duration,
        ) -> Result<String, ImageError> {
            Ok(format!("signed:{key}"))
        }
    }

    fn resolver(store: FakeBlobStore) -> ImageResolver {
        ImageResolver::new(Arc::new(store), Duration::from_secs(10_800))
    }

    const FOLDER: &str = "https://venta-garage.s3.amazonaws.com/tesla";

    #[tokio::test]
    async fn cover_key_takes_precedence() {
        let store = FakeBlobStore::with_keys(&[
            "tesla/a.jpg",
            "tesla/PORTADA.png",
            "tesla/b.jpg",
        ]);
        let resolution = resolver(store).resolve(FOLDER).await;
        assert_eq!(
            resolution,
            Resolution::Resolved(ImageSet {
                main_url: "signed:tesla/PORTADA.png".to_string(),
                additional_urls: vec![
                    "signed:tesla/a.jpg".to_string(),
                    "signed:tesla/b.jpg".to_string(),
                ],
            })
        );
    }

    #[tokio::test]
    async fn first_image_becomes_cover_without_portada() {
        let store = FakeBlobStore::with_keys(&["tesla/a.jpg", "tesla/b.jpg"]);
        let resolution = resolver(store).resolve(FOLDER).await;
        assert_eq!(
            resolution,
            Resolution::Resolved(ImageSet {
                main_url: "signed:tesla/a.jpg".to_string(),
                additional_urls: vec!["signed:tesla/b.jpg".to_string()],
            })
        );
    }

    #[tokio::test]
    async fn non_image_keys_are_filtered_out() {
        let store = FakeBlobStore::with_keys(&[
            "tesla/notas.txt",
            "tesla/a.JPG",
            "tesla/video.mp4",
            "tesla/b.webp",
            "tesla/c.jpeg.bak",
        ]);
        let resolution = resolver(store).resolve(FOLDER).await;
        let Resolution::Resolved(set) = resolution else {
            panic!("expected resolved set");
        };
        assert_eq!(set.main_url, "signed:tesla/a.JPG");
        assert_eq!(set.additional_urls, vec!["signed:tesla/b.webp".to_string()]);
    }

    #[tokio::test]
    async fn empty_folder_yields_no_images_placeholder() {
        let store = FakeBlobStore::with_keys(&["tesla/notas.txt"]);
        let resolution = resolver(store).resolve(FOLDER).await;
        assert_eq!(
            resolution,
            Resolution::Placeholder(PlaceholderReason::NoImages)
        );
    }

    #[tokio::test]
    async fn listing_failure_yields_store_error_placeholder() {
        let mut store = FakeBlobStore::with_keys(&["tesla/a.jpg"]);
        store.fail_listing = true;
        let resolution = resolver(store).resolve(FOLDER).await;
        assert!(matches!(
            resolution,
            Resolution::Placeholder(PlaceholderReason::StoreError(_))
        ));
    }

    #[tokio::test]
    async fn folder_without_trailing_slash_is_normalized() {
        let store = FakeBlobStore::with_keys(&["tesla/a.jpg", "teslamodel/b.jpg"]);
        let resolution = resolver(store).resolve(FOLDER).await;
        let Resolution::Resolved(set) = resolution else {
            panic!("expected resolved set");
        };
        // Prefix is "tesla/", so "teslamodel/b.jpg" must not match.
        assert_eq!(set.main_url, "signed:tesla/a.jpg");
        assert!(set.additional_urls.is_empty());
    }

    #[test]
    fn object_prefix_strips_scheme_and_host() {
        assert_eq!(
            object_prefix("https://venta-garage.s3.amazonaws.com/tesla/"),
            "tesla/"
        );
        assert_eq!(
            object_prefix("https://bucket.s3.amazonaws.com/a/b/"),
            "a/b/"
        );
        assert_eq!(object_prefix("https://bucket.s3.amazonaws.com"), "");
    }

    #[test]
    fn object_prefix_passes_bare_prefixes_through() {
        assert_eq!(object_prefix("tesla/"), "tesla/");
        assert_eq!(object_prefix("a/b/"), "a/b/");
    }

    #[tokio::test]
    async fn bare_prefix_reference_lists_only_that_folder() {
        let store = FakeBlobStore::with_keys(&["tesla/a.jpg", "otros/b.jpg"]);
        let resolution = resolver(store).resolve("tesla").await;
        assert_eq!(
            resolution,
            Resolution::Resolved(ImageSet {
                main_url: "signed:tesla/a.jpg".to_string(),
                additional_urls: Vec::new(),
            })
        );
    }

    #[test]
    fn into_image_set_uses_placeholder_for_both_reasons() {
        let placeholder = "/static/img/placeholder.jpg";
        let set =
            Resolution::Placeholder(PlaceholderReason::NoImages).into_image_set(placeholder);
        assert_eq!(set.main_url, placeholder);
        assert!(set.additional_urls.is_empty());

        let set = Resolution::Placeholder(PlaceholderReason::StoreError("boom".into()))
            .into_image_set(placeholder);
        assert_eq!(set.main_url, placeholder);
    }
}
