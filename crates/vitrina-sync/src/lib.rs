pub mod engine;
pub mod error;
pub mod hash;
pub mod report;
pub mod state;

pub use engine::{sync_products, SyncStats, DEFAULT_SYNC_ID};
pub use error::SyncError;
pub use hash::product_hash;
pub use report::SyncReport;
pub use state::{MemoryStateStore, SupabaseStateStore, SyncStateStore};
