//! Integration tests for `S3Gateway` listing against a mock HTTP endpoint.

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vitrina_images::{BlobStore, ImageError, S3Gateway};

fn test_gateway(endpoint: &str) -> S3Gateway {
    S3Gateway::with_endpoint("venta-garage", "us-east-1", "AKIATEST", "secret", 30, endpoint)
        .expect("gateway construction should not fail")
}

const LISTING: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ListBucketResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/">
  <Name>venta-garage</Name>
  <Prefix>tesla/</Prefix>
  <KeyCount>2</KeyCount>
  <Contents><Key>tesla/portada.jpg</Key><Size>1024</Size></Contents>
  <Contents><Key>tesla/b.png</Key><Size>2048</Size></Contents>
</ListBucketResult>"#;

#[tokio::test]
async fn list_objects_sends_signed_request_and_parses_keys() {
    let server = MockServer::start().await;

    // Path-style addressing against the override endpoint, with the
    // ListObjectsV2 and SigV4 query parameters on the request.
    Mock::given(method("GET"))
        .and(path("/venta-garage/"))
        .and(query_param("list-type", "2"))
        .and(query_param("prefix", "tesla/"))
        .and(query_param("X-Amz-Algorithm", "AWS4-HMAC-SHA256"))
        .and(query_param("X-Amz-SignedHeaders", "host"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LISTING))
        .mount(&server)
        .await;

    let keys = test_gateway(&server.uri())
        .list_objects("tesla/")
        .await
        .expect("listing should succeed");

    assert_eq!(keys, vec!["tesla/portada.jpg", "tesla/b.png"]);
}

#[tokio::test]
async fn list_objects_surfaces_non_success_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/venta-garage/"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let result = test_gateway(&server.uri()).list_objects("tesla/").await;

    match result {
        Err(ImageError::UnexpectedStatus { status, .. }) => assert_eq!(status, 403),
        other => panic!("expected UnexpectedStatus, got {other:?}"),
    }
}

#[tokio::test]
async fn list_objects_rejects_malformed_xml() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/venta-garage/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<ListBucketResult><Contents><Key>a</Wrong></Contents>"),
        )
        .mount(&server)
        .await;

    let result = test_gateway(&server.uri()).list_objects("tesla/").await;

    assert!(matches!(result, Err(ImageError::Xml { .. })));
}
