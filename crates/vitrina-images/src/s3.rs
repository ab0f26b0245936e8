//! S3 REST gateway with SigV4 query presigning.
//!
//! Implements [`BlobStore`] against the S3 API directly: `ListObjectsV2`
//! over plain HTTPS and query-string presigned GET URLs. The same signing
//! path authenticates both — a presigned list URL is fetched with `reqwest`,
//! while presigned object URLs are handed to browsers as-is.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use quick_xml::events::Event;
use quick_xml::Reader;
use sha2::{Digest, Sha256};

use crate::error::ImageError;
use crate::store::BlobStore;

type HmacSha256 = Hmac<Sha256>;

/// RFC 3986 unreserved characters stay literal; everything else is encoded.
const QUERY_ENCODE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Path encoding additionally keeps `/` so object keys stay segmented.
const PATH_ENCODE: &AsciiSet = &QUERY_ENCODE.remove(b'/');

/// S3 client for listing a bucket prefix and presigning object GETs.
///
/// Uses virtual-host addressing (`{bucket}.s3.{region}.amazonaws.com`)
/// against AWS, and path-style addressing when an endpoint override is set
/// (wiremock, MinIO).
pub struct S3Gateway {
    http: reqwest::Client,
    bucket: String,
    region: String,
    access_key_id: String,
    secret_access_key: String,
    /// `(scheme, authority)` of an endpoint override, when set.
    endpoint: Option<(String, String)>,
}

impl S3Gateway {
    /// Creates a gateway pointed at AWS S3.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        bucket: &str,
        region: &str,
        access_key_id: &str,
        secret_access_key: &str,
        timeout_secs: u64,
    ) -> Result<Self, ImageError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            bucket: bucket.to_owned(),
            region: region.to_owned(),
            access_key_id: access_key_id.to_owned(),
            secret_access_key: secret_access_key.to_owned(),
            endpoint: None,
        })
    }

    /// Creates a gateway pointed at a custom endpoint (for testing with
    /// wiremock or an S3-compatible store). Switches to path-style
    /// addressing.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::InvalidEndpoint`] if `endpoint` is not a valid
    /// URL, or [`ImageError::Http`] if the HTTP client cannot be built.
    pub fn with_endpoint(
        bucket: &str,
        region: &str,
        access_key_id: &str,
        secret_access_key: &str,
        timeout_secs: u64,
        endpoint: &str,
    ) -> Result<Self, ImageError> {
        let url = reqwest::Url::parse(endpoint).map_err(|e| ImageError::InvalidEndpoint {
            endpoint: endpoint.to_owned(),
            reason: e.to_string(),
        })?;
        let host = url
            .host_str()
            .ok_or_else(|| ImageError::InvalidEndpoint {
                endpoint: endpoint.to_owned(),
                reason: "missing host".to_owned(),
            })?
            .to_owned();
        let authority = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host,
        };

        let mut gateway = Self::new(bucket, region, access_key_id, secret_access_key, timeout_secs)?;
        gateway.endpoint = Some((url.scheme().to_owned(), authority));
        Ok(gateway)
    }

    /// The authority the request is addressed to, and whether path-style
    /// addressing is in effect.
    fn host(&self) -> (String, String, bool) {
        match &self.endpoint {
            Some((scheme, authority)) => (scheme.clone(), authority.clone(), true),
            None => (
                "https".to_owned(),
                format!("{}.s3.{}.amazonaws.com", self.bucket, self.region),
                false,
            ),
        }
    }

    /// Canonical URI for an object GET (empty `key` means the bucket root,
    /// used by `ListObjectsV2`).
    fn canonical_uri(&self, key: &str, path_style: bool) -> String {
        let encoded_key = utf8_percent_encode(key, PATH_ENCODE).to_string();
        if path_style {
            format!("/{}/{encoded_key}", self.bucket)
        } else {
            format!("/{encoded_key}")
        }
    }

    /// Builds a SigV4 query-presigned URL for a GET of `canonical_uri` with
    /// `extra_query` parameters, valid for `expires_in` starting at `now`.
    fn presign_at(
        &self,
        scheme: &str,
        host: &str,
        canonical_uri: &str,
        extra_query: &[(&str, &str)],
        expires_in: Duration,
        now: DateTime<Utc>,
    ) -> String {
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let datestamp = now.format("%Y%m%d").to_string();
        let scope = format!("{datestamp}/{}/s3/aws4_request", self.region);
        let credential = format!("{}/{scope}", self.access_key_id);
        let expires = expires_in.as_secs().to_string();

        let mut query: Vec<(String, String)> = vec![
            encode_pair("X-Amz-Algorithm", "AWS4-HMAC-SHA256"),
            encode_pair("X-Amz-Credential", &credential),
            encode_pair("X-Amz-Date", &amz_date),
            encode_pair("X-Amz-Expires", &expires),
            encode_pair("X-Amz-SignedHeaders", "host"),
        ];
        for (k, v) in extra_query {
            query.push(encode_pair(k, v));
        }
        // Canonical form requires the encoded pairs in byte order.
        query.sort();
        let canonical_query = query
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");

        let canonical_request = format!(
            "GET\n{canonical_uri}\n{canonical_query}\nhost:{host}\n\nhost\nUNSIGNED-PAYLOAD"
        );
        let request_hash = format!("{:x}", Sha256::digest(canonical_request.as_bytes()));
        let string_to_sign =
            format!("AWS4-HMAC-SHA256\n{amz_date}\n{scope}\n{request_hash}");

        let date_key = hmac_sha256(
            format!("AWS4{}", self.secret_access_key).as_bytes(),
            datestamp.as_bytes(),
        );
        let region_key = hmac_sha256(&date_key, self.region.as_bytes());
        let service_key = hmac_sha256(&region_key, b"s3");
        let signing_key = hmac_sha256(&service_key, b"aws4_request");
        let signature = hex_string(&hmac_sha256(&signing_key, string_to_sign.as_bytes()));

        format!("{scheme}://{host}{canonical_uri}?{canonical_query}&X-Amz-Signature={signature}")
    }
}

#[async_trait]
impl BlobStore for S3Gateway {
    async fn list_objects(&self, prefix: &str) -> Result<Vec<String>, ImageError> {
        let (scheme, host, path_style) = self.host();
        let uri = self.canonical_uri("", path_style);
        // Keys beyond the first listing page are ignored; product folders
        // hold a handful of images, nowhere near the 1000-key page size.
        let url = self.presign_at(
            &scheme,
            &host,
            &uri,
            &[("list-type", "2"), ("prefix", prefix)],
            Duration::from_secs(60),
            Utc::now(),
        );

        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ImageError::UnexpectedStatus {
                status: status.as_u16(),
                url: format!("{scheme}://{host}{uri}"),
            });
        }
        let body = response.text().await?;
        parse_list_keys(&body, prefix)
    }

    async fn presign_get(&self, key: &str, expires_in: Duration) -> Result<String, ImageError> {
        let (scheme, host, path_style) = self.host();
        let uri = self.canonical_uri(key, path_style);
        Ok(self.presign_at(&scheme, &host, &uri, &[], expires_in, Utc::now()))
    }
}

/// Percent-encodes a query pair for the canonical query string.
fn encode_pair(key: &str, value: &str) -> (String, String) {
    (
        utf8_percent_encode(key, QUERY_ENCODE).to_string(),
        utf8_percent_encode(value, QUERY_ENCODE).to_string(),
    )
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

fn hex_string(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Extracts `<Contents><Key>` values from a `ListObjectsV2` response, in
/// document order.
fn parse_list_keys(xml: &str, context: &str) -> Result<Vec<String>, ImageError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut keys = Vec::new();
    let mut in_contents = false;
    let mut in_key = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"Contents" => in_contents = true,
                b"Key" if in_contents => in_key = true,
                _ => {}
            },
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"Contents" => in_contents = false,
                b"Key" => in_key = false,
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if in_key {
                    keys.push(e.unescape().unwrap_or_default().into_owned());
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(source) => {
                return Err(ImageError::Xml {
                    context: format!("ListObjectsV2(prefix={context})"),
                    source,
                })
            }
        }
    }

    Ok(keys)
}
