use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A storefront product in its canonical (Supabase-shaped) form.
///
/// Wire field names are the Spanish column names used by both backing
/// stores; Airtable-shaped records are normalized into this shape by the
/// store adapter before anything else sees them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Product {
    /// Store-assigned identifier. `None` for records not yet inserted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Product name, used as the business key when correlating records
    /// across stores.
    #[serde(rename = "nombre_producto", default)]
    pub name: String,
    #[serde(rename = "descripcion", default)]
    pub description: String,
    /// List price. Stored as a decimal string on the wire to avoid float
    /// precision loss.
    #[serde(rename = "precio_original", default)]
    pub original_price: Option<Decimal>,
    /// Discounted price, if the product is on offer.
    #[serde(rename = "precio_rebajado", default)]
    pub discounted_price: Option<Decimal>,
    #[serde(rename = "categoria", default)]
    pub category: String,
    #[serde(default)]
    pub status: ProductStatus,
    /// Whether the product is visible on the storefront.
    #[serde(rename = "activo", default)]
    pub active: bool,
    /// Folder-like URL grouping this product's images in the blob store,
    /// e.g. `https://venta-garage.s3.amazonaws.com/tesla/`.
    #[serde(rename = "imagenes_s3", default)]
    pub image_folder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Returns `true` if this product has a discounted price set.
    #[must_use]
    pub fn is_discounted(&self) -> bool {
        self.discounted_price.is_some()
    }

    /// The price shown to buyers: the discounted price when present,
    /// otherwise the original price.
    #[must_use]
    pub fn display_price(&self) -> Option<Decimal> {
        self.discounted_price.or(self.original_price)
    }
}

/// Sale status of a product.
///
/// Wire values are the Spanish strings stored in both backends. Unknown
/// values are mapped to [`ProductStatus::Available`] at the adapter
/// boundary rather than failing the whole record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductStatus {
    #[default]
    #[serde(rename = "Disponible")]
    Available,
    #[serde(rename = "Vendido")]
    Sold,
    #[serde(rename = "Reservado")]
    Reserved,
}

impl ProductStatus {
    /// Parses a wire status string, defaulting unknowns to `Available`.
    #[must_use]
    pub fn from_wire(s: &str) -> Self {
        match s {
            "Vendido" => ProductStatus::Sold,
            "Reservado" => ProductStatus::Reserved,
            _ => ProductStatus::Available,
        }
    }

    /// The wire string this status serializes to.
    #[must_use]
    pub fn as_wire(&self) -> &'static str {
        match self {
            ProductStatus::Available => "Disponible",
            ProductStatus::Sold => "Vendido",
            ProductStatus::Reserved => "Reservado",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_product(discounted: Option<&str>) -> Product {
        Product {
            id: Some("rec123".to_string()),
            name: "Bicicleta Trek".to_string(),
            description: "Bicicleta de montaña, poco uso".to_string(),
            original_price: Some("450000".parse().expect("valid decimal")),
            discounted_price: discounted.map(|d| d.parse().expect("valid decimal")),
            category: "Deportes".to_string(),
            status: ProductStatus::Available,
            active: true,
            image_folder: Some("https://venta-garage.s3.amazonaws.com/bici/".to_string()),
            created_at: None,
        }
    }

    #[test]
    fn is_discounted_false_without_discount() {
        assert!(!make_product(None).is_discounted());
    }

    #[test]
    fn is_discounted_true_with_discount() {
        assert!(make_product(Some("380000")).is_discounted());
    }

    #[test]
    fn display_price_prefers_discount() {
        let product = make_product(Some("380000"));
        assert_eq!(product.display_price(), Some("380000".parse().unwrap()));
    }

    #[test]
    fn display_price_falls_back_to_original() {
        let product = make_product(None);
        assert_eq!(product.display_price(), Some("450000".parse().unwrap()));
    }

    #[test]
    fn status_from_wire_known_values() {
        assert_eq!(ProductStatus::from_wire("Disponible"), ProductStatus::Available);
        assert_eq!(ProductStatus::from_wire("Vendido"), ProductStatus::Sold);
        assert_eq!(ProductStatus::from_wire("Reservado"), ProductStatus::Reserved);
    }

    #[test]
    fn status_from_wire_unknown_defaults_to_available() {
        assert_eq!(ProductStatus::from_wire("Apartado"), ProductStatus::Available);
        assert_eq!(ProductStatus::from_wire(""), ProductStatus::Available);
    }

    #[test]
    fn serde_uses_spanish_wire_names() {
        let product = make_product(Some("380000"));
        let json = serde_json::to_value(&product).expect("serialization failed");
        assert_eq!(json["nombre_producto"], "Bicicleta Trek");
        assert_eq!(json["precio_original"], "450000");
        assert_eq!(json["precio_rebajado"], "380000");
        assert_eq!(json["status"], "Disponible");
        assert_eq!(json["activo"], true);
    }

    #[test]
    fn serde_roundtrip_product() {
        let product = make_product(None);
        let json = serde_json::to_string(&product).expect("serialization failed");
        let decoded: Product = serde_json::from_str(&json).expect("deserialization failed");
        assert_eq!(decoded.name, product.name);
        assert_eq!(decoded.original_price, product.original_price);
        assert_eq!(decoded.status, product.status);
        assert_eq!(decoded.image_folder, product.image_folder);
    }

    #[test]
    fn missing_optional_fields_deserialize_to_defaults() {
        let decoded: Product =
            serde_json::from_str(r#"{"nombre_producto":"Mesa"}"#).expect("should deserialize");
        assert_eq!(decoded.name, "Mesa");
        assert!(!decoded.active);
        assert_eq!(decoded.status, ProductStatus::Available);
        assert!(decoded.original_price.is_none());
        assert!(decoded.image_folder.is_none());
    }
}
