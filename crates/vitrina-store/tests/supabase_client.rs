//! Integration tests for `SupabaseStore` using wiremock HTTP mocks.

use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vitrina_store::{ProductFilter, ProductStore, StoreError, SupabaseStore};

fn test_store(base_url: &str) -> SupabaseStore {
    SupabaseStore::new(base_url, "test-key", 30).expect("client construction should not fail")
}

fn product_row(id: u64, name: &str, active: bool) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "nombre_producto": name,
        "descripcion": "desc",
        "precio_original": 100000,
        "precio_rebajado": null,
        "categoria": "Hogar",
        "status": "Disponible",
        "activo": active,
        "imagenes_s3": "https://venta-garage.s3.amazonaws.com/carpeta/"
    })
}

#[tokio::test]
async fn list_all_sends_auth_and_parses_rows() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/productos"))
        .and(header("apikey", "test-key"))
        .and(query_param("select", "*"))
        .and(query_param("order", "created_at.desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            product_row(1, "Mesa", true),
            product_row(2, "Silla", false),
        ])))
        .mount(&server)
        .await;

    let store = test_store(&server.uri());
    let products = store
        .list_all(ProductFilter::all())
        .await
        .expect("should list products");

    assert_eq!(products.len(), 2);
    assert_eq!(products[0].id.as_deref(), Some("1"));
    assert_eq!(products[0].name, "Mesa");
    assert_eq!(products[1].name, "Silla");
    assert!(!products[1].active);
}

#[tokio::test]
async fn list_all_pushes_active_filter_to_query() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/productos"))
        .and(query_param("activo", "eq.true"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([product_row(1, "Mesa", true)])),
        )
        .mount(&server)
        .await;

    let store = test_store(&server.uri());
    let products = store
        .list_all(ProductFilter::active())
        .await
        .expect("should list products");
    assert_eq!(products.len(), 1);
}

#[tokio::test]
async fn list_all_category_and_offers_filters() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/productos"))
        .and(query_param("categoria", "eq.Deportes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/productos"))
        .and(query_param("precio_rebajado", "not.is.null"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    let store = test_store(&server.uri());
    let by_category = store
        .list_all(ProductFilter {
            active_only: false,
            category: Some("Deportes".to_string()),
            discounted_only: false,
        })
        .await;
    assert!(by_category.is_ok());

    let offers = store
        .list_all(ProductFilter {
            active_only: false,
            category: None,
            discounted_only: true,
        })
        .await;
    assert!(offers.is_ok());
}

#[tokio::test]
async fn get_by_id_returns_none_for_empty_result() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/productos"))
        .and(query_param("id", "eq.99"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    let store = test_store(&server.uri());
    let result = store.get_by_id("99").await.expect("should not error");
    assert!(result.is_none());
}

#[tokio::test]
async fn insert_posts_body_and_parses_representation() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/productos"))
        .and(header("Prefer", "return=representation"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(serde_json::json!([product_row(42, "Nueva mesa", true)])),
        )
        .mount(&server)
        .await;

    let store = test_store(&server.uri());
    let mut product = vitrina_core::Product {
        id: None,
        name: "Nueva mesa".to_string(),
        description: "desc".to_string(),
        original_price: Some("100000".parse().unwrap()),
        discounted_price: None,
        category: "Hogar".to_string(),
        status: vitrina_core::ProductStatus::Available,
        active: true,
        image_folder: None,
        created_at: None,
    };
    let stored = store.insert(&product).await.expect("insert should succeed");
    assert_eq!(stored.id.as_deref(), Some("42"));

    product.name = "Otra".to_string();
    // Update hits the same table path with an id filter.
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/productos"))
        .and(query_param("id", "eq.42"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([product_row(42, "Otra", true)])),
        )
        .mount(&server)
        .await;
    let updated = store
        .update("42", &product)
        .await
        .expect("update should succeed");
    assert_eq!(updated.name, "Otra");
}

#[tokio::test]
async fn server_error_surfaces_as_unexpected_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/productos"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let store = test_store(&server.uri());
    let result = store.list_all(ProductFilter::all()).await;
    assert!(
        matches!(result, Err(StoreError::UnexpectedStatus { status: 500, .. })),
        "expected UnexpectedStatus(500), got: {result:?}"
    );
}
