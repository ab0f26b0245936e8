use thiserror::Error;

use vitrina_store::StoreError;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("product store error: {0}")]
    Store(#[from] StoreError),

    #[error("state store HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("state deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid state store base URL \"{url}\": {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}
