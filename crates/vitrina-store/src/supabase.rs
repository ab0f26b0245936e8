//! PostgREST client for the Supabase-backed product table.
//!
//! Speaks the canonical product shape directly; the only massaging needed
//! is numeric/id coercion, since PostgREST returns numerics as JSON numbers
//! while [`Product`] carries prices as decimal strings.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::Value;

use vitrina_core::{Product, ProductStatus};

use crate::error::StoreError;
use crate::store::{ProductFilter, ProductStore};

const TABLE: &str = "productos";

/// Client for the Supabase REST API (PostgREST conventions).
///
/// Reads use the anon key; the sync path constructs a second instance with
/// the service-role key. Use [`SupabaseStore::new`] for production or point
/// `base_url` at a mock server in tests.
pub struct SupabaseStore {
    http: Client,
    base_url: Url,
    api_key: String,
}

impl SupabaseStore {
    /// Creates a client for the Supabase project at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Http`] if the HTTP client cannot be built, or
    /// [`StoreError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn new(base_url: &str, api_key: &str, timeout_secs: u64) -> Result<Self, StoreError> {
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
        })
    }

    fn table_url(&self) -> Result<Url, StoreError> {
        self.base_url
            .join(&format!("rest/v1/{TABLE}"))
            .map_err(|e| StoreError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn fetch_rows(&self, url: Url) -> Result<Vec<Value>, StoreError> {
        let response = self.authed(self.http.get(url.clone())).send().await?;
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

    /// Sends a write request and parses the representation PostgREST
    /// returns (an array with the affected row).
    async fn write(
        &self,
        req: reqwest::RequestBuilder,
        url: &Url,
        body: &Value,
    ) -> Result<Product, StoreError> {
        let response = self
            .authed(req)
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let text = response.text().await?;
        let rows: Vec<Value> = serde_json::from_str(&text).map_err(|e| StoreError::Deserialize {
            context: url.to_string(),
            source: e,
        })?;
        let row = rows.into_iter().next().ok_or_else(|| StoreError::EmptyRecord {
            id: url.to_string(),
        })?;
        parse_row(row, &url.to_string())
    }
}

#[async_trait]
impl ProductStore for SupabaseStore {
    async fn list_all(&self, filter: ProductFilter) -> Result<Vec<Product>, StoreError> {
        let mut url = self.table_url()?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("select", "*");
            pairs.append_pair("order", "created_at.desc");
            if filter.active_only {
                pairs.append_pair("activo", "eq.true");
            }
            if let Some(category) = &filter.category {
                pairs.append_pair("categoria", &format!("eq.{category}"));
            }
            if filter.discounted_only {
                pairs.append_pair("precio_rebajado", "not.is.null");
            }
        }

        let context = url.to_string();
        let rows = self.fetch_rows(url).await?;
        // Rows that fail to parse are skipped rather than failing the whole
        // listing; a single malformed record must not blank the storefront.
        let products = rows
            .into_iter()
            .filter_map(|row| match parse_row(row, &context) {
                Ok(product) => Some(product),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unparseable product row");
                    None
                }
            })
            .collect();
        Ok(products)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Product>, StoreError> {
        let mut url = self.table_url()?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("select", "*");
            pairs.append_pair("id", &format!("eq.{id}"));
            pairs.append_pair("limit", "1");
        }

        let context = url.to_string();
        let rows = self.fetch_rows(url).await?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(parse_row(row, &context)?)),
            None => Ok(None),
        }
    }

    async fn insert(&self, product: &Product) -> Result<Product, StoreError> {
        let url = self.table_url()?;
        let body = write_body(product, &url)?;
        self.write(self.http.post(url.clone()), &url, &body).await
    }

    async fn update(&self, id: &str, product: &Product) -> Result<Product, StoreError> {
        let mut url = self.table_url()?;
        url.query_pairs_mut().append_pair("id", &format!("eq.{id}"));
        let body = write_body(product, &url)?;
        self.write(self.http.patch(url.clone()), &url, &body).await
    }
}

/// Serializes a product for writing, dropping store-owned columns.
fn write_body(product: &Product, url: &Url) -> Result<Value, StoreError> {
    let mut body = serde_json::to_value(product).map_err(|e| StoreError::Deserialize {
        context: url.to_string(),
        source: e,
    })?;
    if let Value::Object(map) = &mut body {
        map.remove("id");
        map.remove("created_at");
    }
    Ok(body)
}

/// Coerces a PostgREST row into the canonical [`Product`].
///
/// Ids and prices arrive as JSON numbers; both are stringified before
/// deserialization. Unknown status strings collapse to `Disponible`.
fn parse_row(row: Value, context: &str) -> Result<Product, StoreError> {
    let Value::Object(mut map) = row else {
        return Err(StoreError::Deserialize {
            context: context.to_owned(),
            source: serde::de::Error::custom("expected a JSON object row"),
        });
    };

    let id = map.remove("id").and_then(|v| match v {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    });

    for price_field in ["precio_original", "precio_rebajado"] {
        if let Some(Value::Number(n)) = map.get(price_field) {
            let as_string = Value::String(n.to_string());
            map.insert(price_field.to_owned(), as_string);
        }
    }

    if let Some(Value::String(s)) = map.get("status") {
        let canonical = ProductStatus::from_wire(s).as_wire();
        map.insert("status".to_owned(), Value::String(canonical.to_owned()));
    }

    let mut product: Product =
        serde_json::from_value(Value::Object(map)).map_err(|e| StoreError::Deserialize {
            context: context.to_owned(),
            source: e,
        })?;
    product.id = id;
    Ok(product)
}
