//! Content hashing for change detection.
//!
//! A product's hash covers a fixed, explicit field subset; anything outside
//! it (store ids, creation timestamps) is invisible to the sync engine's
//! diffing. The digest input is the canonical JSON of that subset —
//! `serde_json` maps keep keys in sorted order, so the serialization is
//! stable across runs.

use sha2::{Digest, Sha256};

use vitrina_core::Product;

/// Computes the change-detection hash for a product.
///
/// Missing image folders hash as the empty string, so adding an empty
/// folder reference later does not register as a change.
#[must_use]
pub fn product_hash(product: &Product) -> String {
    let subset = serde_json::json!({
        "nombre_producto": product.name,
        "descripcion": product.description,
        "precio_original": product.original_price,
        "precio_rebajado": product.discounted_price,
        "categoria": product.category,
        "status": product.status.as_wire(),
        "activo": product.active,
        "imagenes_s3": product.image_folder.as_deref().unwrap_or(""),
    });
    let canonical =
        serde_json::to_string(&subset).expect("JSON value serialization cannot fail");
    format!("{:x}", Sha256::digest(canonical.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Utc;
    use vitrina_core::ProductStatus;

    fn make_product() -> Product {
        Product {
            id: Some("rec123".to_string()),
            name: "Widget".to_string(),
            description: "Un widget".to_string(),
            original_price: Some("45000".parse().unwrap()),
            discounted_price: None,
            category: "Hogar".to_string(),
            status: ProductStatus::Available,
            active: true,
            image_folder: Some("https://venta-garage.s3.amazonaws.com/widget/".to_string()),
            created_at: None,
        }
    }

    #[test]
    fn hash_is_stable_across_calls() {
        let product = make_product();
        assert_eq!(product_hash(&product), product_hash(&product));
    }

    #[test]
    fn untracked_fields_do_not_affect_hash() {
        let product = make_product();
        let mut shuffled = product.clone();
        shuffled.id = Some("other-id".to_string());
        shuffled.created_at = Some(Utc::now());
        assert_eq!(product_hash(&product), product_hash(&shuffled));
    }

    #[test]
    fn tracked_field_change_changes_hash() {
        let product = make_product();

        let mut renamed = product.clone();
        renamed.name = "Widget Pro".to_string();
        assert_ne!(product_hash(&product), product_hash(&renamed));

        let mut repriced = product.clone();
        repriced.discounted_price = Some("40000".parse().unwrap());
        assert_ne!(product_hash(&product), product_hash(&repriced));

        let mut deactivated = product.clone();
        deactivated.active = false;
        assert_ne!(product_hash(&product), product_hash(&deactivated));

        let mut sold = product;
        sold.status = ProductStatus::Sold;
        assert_ne!(product_hash(&make_product()), product_hash(&sold));
    }

    #[test]
    fn missing_folder_hashes_like_empty_string() {
        let mut without = make_product();
        without.image_folder = None;
        let mut empty = make_product();
        empty.image_folder = Some(String::new());
        assert_eq!(product_hash(&without), product_hash(&empty));
    }

    #[test]
    fn hash_is_hex_sha256() {
        let digest = product_hash(&make_product());
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
