pub mod airtable;
pub mod error;
pub mod store;
pub mod supabase;

pub use airtable::AirtableStore;
pub use error::StoreError;
pub use store::{ProductFilter, ProductStore};
pub use supabase::SupabaseStore;
