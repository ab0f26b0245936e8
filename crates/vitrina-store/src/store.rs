use async_trait::async_trait;

use vitrina_core::Product;

use crate::error::StoreError;

/// Server-side (or adapter-side) filtering for product listings.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Only products with the active flag set.
    pub active_only: bool,
    /// Only products in this category.
    pub category: Option<String>,
    /// Only products with a discounted price (the `Ofertas` pseudo-category).
    pub discounted_only: bool,
}

impl ProductFilter {
    /// Filter matching every product. Used by the sync engine, which must
    /// see inactive records too.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Filter for storefront listings: active products only.
    #[must_use]
    pub fn active() -> Self {
        Self {
            active_only: true,
            ..Self::default()
        }
    }

    /// Returns `true` if `product` passes this filter. Used by adapters
    /// whose backend cannot filter server-side.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        if self.active_only && !product.active {
            return false;
        }
        if let Some(category) = &self.category {
            if &product.category != category {
                return false;
            }
        }
        if self.discounted_only && !product.is_discounted() {
            return false;
        }
        true
    }
}

/// Uniform interface over the two product backends.
///
/// All methods speak the canonical (Supabase-shaped) [`Product`]; the
/// Airtable adapter normalizes on the way in and out.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Lists products matching `filter`, newest first where the backend
    /// supports ordering.
    async fn list_all(&self, filter: ProductFilter) -> Result<Vec<Product>, StoreError>;

    /// Fetches a single product by store-assigned id.
    async fn get_by_id(&self, id: &str) -> Result<Option<Product>, StoreError>;

    /// Inserts a new product and returns the stored record (with its id).
    async fn insert(&self, product: &Product) -> Result<Product, StoreError>;

    /// Updates the product with store-assigned `id` and returns the stored
    /// record.
    async fn update(&self, id: &str, product: &Product) -> Result<Product, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    use vitrina_core::ProductStatus;

    fn make_product(active: bool, category: &str, discounted: bool) -> Product {
        Product {
            id: None,
            name: "Silla".to_string(),
            description: String::new(),
            original_price: Some("100000".parse().unwrap()),
            discounted_price: discounted.then(|| "80000".parse().unwrap()),
            category: category.to_string(),
            status: ProductStatus::Available,
            active,
            image_folder: None,
            created_at: None,
        }
    }

    #[test]
    fn all_filter_matches_everything() {
        let filter = ProductFilter::all();
        assert!(filter.matches(&make_product(false, "Hogar", false)));
        assert!(filter.matches(&make_product(true, "Hogar", true)));
    }

    #[test]
    fn active_filter_rejects_inactive() {
        let filter = ProductFilter::active();
        assert!(!filter.matches(&make_product(false, "Hogar", false)));
        assert!(filter.matches(&make_product(true, "Hogar", false)));
    }

    #[test]
    fn category_filter_matches_exact_category() {
        let filter = ProductFilter {
            active_only: true,
            category: Some("Deportes".to_string()),
            discounted_only: false,
        };
        assert!(filter.matches(&make_product(true, "Deportes", false)));
        assert!(!filter.matches(&make_product(true, "Hogar", false)));
    }

    #[test]
    fn discounted_filter_requires_discount() {
        let filter = ProductFilter {
            active_only: true,
            category: None,
            discounted_only: true,
        };
        assert!(filter.matches(&make_product(true, "Hogar", true)));
        assert!(!filter.matches(&make_product(true, "Hogar", false)));
    }
}
