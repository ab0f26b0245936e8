//! Airtable REST client and Airtable→canonical normalization.
//!
//! Airtable records nest their columns under a `fields` key, encode the
//! active flag as `"SI"`/`"NO"`, and return prices as JSON numbers. The
//! adapter normalizes everything into the canonical [`Product`] on the way
//! in and re-encodes on the way out, so nothing outside this module ever
//! sees the Airtable shape.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;

use vitrina_core::{Product, ProductStatus};

use crate::error::StoreError;
use crate::store::{ProductFilter, ProductStore};

const DEFAULT_BASE_URL: &str = "https://api.airtable.com/";

/// Listing pages are capped to catch an offset loop; at 100 records per
/// page this allows 10k products, far beyond the storefront's scale.
const MAX_PAGES: usize = 100;

/// Client for the Airtable REST API.
pub struct AirtableStore {
    http: Client,
    base_url: Url,
    api_key: String,
    base_id: String,
    table_name: String,
}

/// One Airtable record: id plus columns nested under `fields`.
#[derive(Debug, Deserialize)]
struct AirtableRecord {
    id: String,
    #[serde(default)]
    fields: AirtableFields,
}

/// The product columns as Airtable stores them.
#[derive(Debug, Default, Deserialize)]
struct AirtableFields {
    #[serde(default)]
    nombre_producto: Option<String>,
    #[serde(default)]
    descripcion: Option<String>,
    #[serde(default)]
    precio_original: Option<f64>,
    #[serde(default)]
    precio_rebajado: Option<f64>,
    #[serde(default)]
    categoria: Option<String>,
    #[serde(default)]
    status: Option<String>,
    /// `"SI"` or `"NO"`.
    #[serde(default)]
    activo: Option<String>,
    #[serde(default)]
    imagenes_s3: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    records: Vec<AirtableRecord>,
    #[serde(default)]
    offset: Option<String>,
}

impl AirtableStore {
    /// Creates a client pointed at the production Airtable API.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Http`] if the HTTP client cannot be built.
    pub fn new(
        api_key: &str,
        base_id: &str,
        table_name: &str,
        timeout_secs: u64,
    ) -> Result<Self, StoreError> {
        Self::with_base_url(api_key, base_id, table_name, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Http`] if the HTTP client cannot be built, or
    /// [`StoreError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        api_key: &str,
        base_id: &str,
        table_name: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, StoreError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| StoreError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            http,
            base_url,
            api_key: api_key.to_owned(),
            base_id: base_id.to_owned(),
            table_name: table_name.to_owned(),
        })
    }

    fn table_url(&self) -> Result<Url, StoreError> {
        self.base_url
            .join(&format!("v0/{}/{}", self.base_id, self.table_name))
            .map_err(|e| StoreError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })
    }

    fn record_url(&self, id: &str) -> Result<Url, StoreError> {
        self.base_url
            .join(&format!("v0/{}/{}/{id}", self.base_id, self.table_name))
            .map_err(|e| StoreError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })
    }

    async fn fetch_page(&self, offset: Option<&str>) -> Result<ListResponse, StoreError> {
        let mut url = self.table_url()?;
        if let Some(offset) = offset {
            url.query_pairs_mut().append_pair("offset", offset);
        }

        let response = self
            .http
            .get(url.clone())
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| StoreError::Deserialize {
            context: url.to_string(),
            source: e,
        })
    }
}

#[async_trait]
impl ProductStore for AirtableStore {
    /// Lists all records across pages, then applies `filter` client-side —
    /// Airtable's formula filters are not worth the escaping hazards for a
    /// table this small.
    async fn list_all(&self, filter: ProductFilter) -> Result<Vec<Product>, StoreError> {
        let mut products = Vec::new();
        let mut offset: Option<String> = None;
        let mut pages = 0;

        loop {
            let page = self.fetch_page(offset.as_deref()).await?;
            products.extend(page.records.into_iter().map(normalize_record));

            pages += 1;
            match page.offset {
                Some(next) if pages < MAX_PAGES => offset = Some(next),
                Some(_) => {
                    return Err(StoreError::PaginationLimit {
                        table: self.table_name.clone(),
                        max_pages: MAX_PAGES,
                    })
                }
                None => break,
            }
        }

        products.retain(|p| filter.matches(p));
        Ok(products)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Product>, StoreError> {
        let url = self.record_url(id)?;
        let response = self
            .http
            .get(url.clone())
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(StoreError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let body = response.text().await?;
        let record: AirtableRecord =
            serde_json::from_str(&body).map_err(|e| StoreError::Deserialize {
                context: url.to_string(),
                source: e,
            })?;
        Ok(Some(normalize_record(record)))
    }

    async fn insert(&self, product: &Product) -> Result<Product, StoreError> {
        let url = self.table_url()?;
        let body = serde_json::json!({ "fields": denormalize_product(product) });
        let response = self
            .http
            .post(url.clone())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        parse_record_response(response, &url).await
    }

    async fn update(&self, id: &str, product: &Product) -> Result<Product, StoreError> {
        let url = self.record_url(id)?;
        let body = serde_json::json!({ "fields": denormalize_product(product) });
        let response = self
            .http
            .patch(url.clone())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        parse_record_response(response, &url).await
    }
}

async fn parse_record_response(
    response: reqwest::Response,
    url: &Url,
) -> Result<Product, StoreError> {
    let status = response.status();
    if !status.is_success() {
        return Err(StoreError::UnexpectedStatus {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }
    let body = response.text().await?;
    let record: AirtableRecord =
        serde_json::from_str(&body).map_err(|e| StoreError::Deserialize {
            context: url.to_string(),
            source: e,
        })?;
    Ok(normalize_record(record))
}

/// Converts an Airtable record into the canonical product shape.
fn normalize_record(record: AirtableRecord) -> Product {
    let fields = record.fields;
    Product {
        id: Some(record.id),
        name: fields.nombre_producto.unwrap_or_default(),
        description: fields.descripcion.unwrap_or_default(),
        original_price: fields.precio_original.and_then(Decimal::from_f64_retain),
        discounted_price: fields.precio_rebajado.and_then(Decimal::from_f64_retain),
        category: fields.categoria.unwrap_or_default(),
        status: fields
            .status
            .as_deref()
            .map_or(ProductStatus::Available, ProductStatus::from_wire),
        active: fields.activo.as_deref() == Some("SI"),
        image_folder: fields.imagenes_s3,
        created_at: None,
    }
}

/// Re-encodes a canonical product as Airtable `fields`, restoring the
/// `"SI"`/`"NO"` active encoding and numeric prices.
fn denormalize_product(product: &Product) -> serde_json::Value {
    serde_json::json!({
        "nombre_producto": product.name,
        "descripcion": product.description,
        "precio_original": product.original_price.and_then(|d| d.to_f64()),
        "precio_rebajado": product.discounted_price.and_then(|d| d.to_f64()),
        "categoria": product.category,
        "status": product.status.as_wire(),
        "activo": if product.active { "SI" } else { "NO" },
        "imagenes_s3": product.image_folder,
    })
}
