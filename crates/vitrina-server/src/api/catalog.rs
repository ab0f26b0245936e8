use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use vitrina_core::Product;
use vitrina_store::ProductFilter;

use crate::middleware::RequestId;

use super::{map_store_error, ApiError, ApiResponse, AppState, ResponseMeta};

/// Pseudo-category listing every discounted product.
const OFFERS_CATEGORY: &str = "Ofertas";

#[derive(Debug, Serialize)]
pub(super) struct ListingItem {
    id: Option<String>,
    name: String,
    category: String,
    status: String,
    display_price: String,
    discounted: bool,
    main_image: String,
}

#[derive(Debug, Serialize)]
pub(super) struct HomeData {
    products: Vec<ListingItem>,
    categories: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct ProductDetail {
    id: Option<String>,
    name: String,
    description: String,
    category: String,
    status: String,
    original_price: String,
    display_price: String,
    discounted: bool,
    main_image: String,
    additional_images: Vec<String>,
    created_at: Option<DateTime<Utc>>,
}

/// `GET /` — active products, newest first, with their cover image and
/// the distinct category names for the navigation.
pub(super) async fn home(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<HomeData>>, ApiError> {
    let products = state
        .products
        .list_all(ProductFilter::active())
        .await
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?;

    let mut items = Vec::with_capacity(products.len());
    for product in products {
        items.push(listing_item(&state, product).await);
    }

    let categories = state.categories.get(state.products.as_ref()).await;

    Ok(Json(ApiResponse {
        data: HomeData {
            products: items,
            categories,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// `GET /producto/{id}` — one active product with its full image set.
pub(super) async fn product_detail(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ProductDetail>>, ApiError> {
    let product = state
        .products
        .get_by_id(&id)
        .await
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?
        .filter(|p| p.active)
        .ok_or_else(|| ApiError::new(req_id.0.clone(), "not_found", "no such product"))?;

    let images = match product.image_folder.as_deref() {
        Some(folder) if !folder.is_empty() => state.images.get_full(folder).await,
        _ => vitrina_images::ImageSet {
            main_url: state.placeholder.clone(),
            additional_urls: Vec::new(),
        },
    };

    Ok(Json(ApiResponse {
        data: ProductDetail {
            id: product.id.clone(),
            name: product.name.clone(),
            description: product.description.clone(),
            category: product.category.clone(),
            status: product.status.as_wire().to_string(),
            original_price: format_price(product.original_price),
            display_price: format_price(product.display_price()),
            discounted: product.is_discounted(),
            main_image: images.main_url,
            additional_images: images.additional_urls,
            created_at: product.created_at,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// `GET /categorias/{category}` — active products in a category.
/// `Ofertas` lists discounted products instead. A backend failure
/// degrades to an empty listing rather than an error page.
pub(super) async fn category_listing(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(category): Path<String>,
) -> Json<ApiResponse<HomeData>> {
    let filter = if category == OFFERS_CATEGORY {
        ProductFilter {
            active_only: true,
            discounted_only: true,
            ..ProductFilter::default()
        }
    } else {
        ProductFilter {
            active_only: true,
            category: Some(category.clone()),
            ..ProductFilter::default()
        }
    };

    let products = match state.products.list_all(filter).await {
        Ok(products) => products,
        Err(e) => {
            tracing::warn!(category = %category, error = %e, "category listing failed; serving empty page");
            Vec::new()
        }
    };

    let mut items = Vec::with_capacity(products.len());
    for product in products {
        items.push(listing_item(&state, product).await);
    }

    let categories = state.categories.get(state.products.as_ref()).await;

    Json(ApiResponse {
        data: HomeData {
            products: items,
            categories,
        },
        meta: ResponseMeta::new(req_id.0),
    })
}

async fn listing_item(state: &AppState, product: Product) -> ListingItem {
    let main_image = match product.image_folder.as_deref() {
        Some(folder) if !folder.is_empty() => state.images.get_main(folder).await,
        _ => state.placeholder.clone(),
    };

    let display_price = format_price(product.display_price());
    ListingItem {
        id: product.id,
        name: product.name,
        category: product.category,
        status: product.status.as_wire().to_string(),
        display_price,
        discounted: product.discounted_price.is_some(),
        main_image,
    }
}

/// Formats a peso amount for display: integer part only, `.` as the
/// thousands separator, leading `$`. A missing price renders as `"$0"`.
fn format_price(price: Option<Decimal>) -> String {
    let Some(price) = price else {
        return "$0".to_string();
    };

    let whole = price.trunc().to_string();
    let (sign, digits) = match whole.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", whole.as_str()),
    };

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 2);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }

    format!("{sign}${grouped}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_price_groups_thousands_with_dots() {
        assert_eq!(format_price(Some(Decimal::from(1_234_567))), "$1.234.567");
        assert_eq!(format_price(Some(Decimal::from(450_000))), "$450.000");
        assert_eq!(format_price(Some(Decimal::from(999))), "$999");
        assert_eq!(format_price(Some(Decimal::from(1_000))), "$1.000");
    }

    #[test]
    fn format_price_drops_fractional_part() {
        assert_eq!(
            format_price(Some("380000.50".parse().expect("decimal"))),
            "$380.000"
        );
    }

    #[test]
    fn format_price_none_is_zero() {
        assert_eq!(format_price(None), "$0");
    }

    #[test]
    fn format_price_handles_negative_amounts() {
        assert_eq!(format_price(Some(Decimal::from(-1_234))), "-$1.234");
    }
}
