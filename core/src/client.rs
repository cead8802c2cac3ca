//! Request builder, response parser and fail-soft fetches for the catalog.
//!
//! # Design
//! `CatalogClient` holds the base URL and credentials and carries no
//! mutable state between calls. Each operation is split into a `build_*`
//! method that produces an `HttpRequest` and a `parse_*` method that
//! consumes an `HttpResponse`, so signing and normalization are testable
//! without I/O. The `fetch_*` methods glue the two around a `Transport`
//! and swallow every failure into the empty result.

use serde::de::DeserializeOwned;
use tracing::{debug, error};

use crate::auth::{AuthParams, Credentials};
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::Transport;
use crate::types::{Character, Page, PageQuery, WireCharacterData, WireEnvelope, WireTotal};

const CHARACTERS_ENDPOINT: &str = "/characters";

#[derive(Debug, Clone)]
pub struct CatalogClient {
    base_url: String,
    credentials: Credentials,
}

impl CatalogClient {
    pub fn new(base_url: &str, credentials: Credentials) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    fn endpoint(&self, path: &str, auth: &AuthParams) -> HttpRequest {
        let mut request = HttpRequest::get(format!("{}{path}", self.base_url));
        request.query = auth.clone().into_pairs();
        request
    }

    pub fn build_characters(&self, query: &PageQuery, auth: &AuthParams) -> HttpRequest {
        let mut request = self.endpoint(CHARACTERS_ENDPOINT, auth);
        request
            .query
            .push(("offset".to_string(), query.offset.to_string()));
        request
            .query
            .push(("limit".to_string(), query.limit.to_string()));
        if let Some(prefix) = &query.name_starts_with {
            request
                .query
                .push(("nameStartsWith".to_string(), prefix.clone()));
        }
        request
    }

    pub fn build_total_count(&self, auth: &AuthParams) -> HttpRequest {
        self.endpoint(CHARACTERS_ENDPOINT, auth)
    }

    pub fn parse_characters(&self, response: HttpResponse) -> Result<Page, ApiError> {
        let envelope: WireEnvelope<WireCharacterData> = parse_envelope(response)?;
        Ok(Page {
            characters: envelope
                .data
                .results
                .into_iter()
                .map(Character::from)
                .collect(),
            total: envelope.data.total,
        })
    }

    pub fn parse_total_count(&self, response: HttpResponse) -> Result<u64, ApiError> {
        let envelope: WireEnvelope<WireTotal> = parse_envelope(response)?;
        Ok(envelope.data.total)
    }

    /// Fetch one page of characters. Never fails: any transport or parse
    /// error is logged and replaced by `Page::empty()`.
    pub async fn fetch_characters<T: Transport>(&self, transport: &T, query: &PageQuery) -> Page {
        let request = self.build_characters(query, &self.credentials.sign_now());
        debug!(url = %request.redacted_url(), "fetching characters");
        let result = match transport.execute(request).await {
            Ok(response) => self.parse_characters(response),
            Err(e) => Err(e),
        };
        result.unwrap_or_else(|e| {
            error!("Error fetching characters: {e}");
            Page::empty()
        })
    }

    /// Fetch the unfiltered total. Resolves to 0 on any failure.
    pub async fn fetch_total_count<T: Transport>(&self, transport: &T) -> u64 {
        let request = self.build_total_count(&self.credentials.sign_now());
        debug!(url = %request.redacted_url(), "fetching total count");
        let result = match transport.execute(request).await {
            Ok(response) => self.parse_total_count(response),
            Err(e) => Err(e),
        };
        result.unwrap_or_else(|e| {
            error!("Error fetching total characters: {e}");
            0
        })
    }
}

fn parse_envelope<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    if !response.is_success() {
        return Err(ApiError::HttpError {
            status: response.status,
            body: response.body,
        });
    }
    serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::http::HttpMethod;

    const ONE_CHARACTER: &str = r#"{"data":{"results":[{"id":1,"name":"Character 1","description":"Description 1","thumbnail":{"path":"path1","extension":"ext1"}}],"total":1}}"#;

    fn client() -> CatalogClient {
        CatalogClient::new("http://localhost:3000/v1/public", Credentials::new("1234", "abcd"))
    }

    fn ok(body: &str) -> HttpResponse {
        HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    /// Replays one canned outcome and records the request it saw.
    struct Canned {
        outcome: fn() -> Result<HttpResponse, ApiError>,
        seen: Mutex<Vec<HttpRequest>>,
    }

    impl Canned {
        fn new(outcome: fn() -> Result<HttpResponse, ApiError>) -> Self {
            Self {
                outcome,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl Transport for Canned {
        async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
            self.seen.lock().unwrap().push(request);
            (self.outcome)()
        }
    }

    #[test]
    fn build_characters_orders_auth_then_pagination() {
        let auth = client().credentials().sign("1");
        let req = client().build_characters(&PageQuery::new(40, 20, ""), &auth);
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.path, "http://localhost:3000/v1/public/characters");
        let keys: Vec<&str> = req.query.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["apikey", "ts", "hash", "offset", "limit"]);
        assert_eq!(req.query_value("offset"), Some("40"));
        assert_eq!(req.query_value("limit"), Some("20"));
        assert_eq!(req.query_value("hash"), Some("ffd275c5130566a2916217b101f26150"));
    }

    #[test]
    fn build_characters_appends_name_filter() {
        let auth = client().credentials().sign("1");
        let req = client().build_characters(&PageQuery::new(0, 20, "Spi"), &auth);
        assert_eq!(req.query_value("nameStartsWith"), Some("Spi"));
    }

    #[test]
    fn build_total_count_has_only_auth_params() {
        let auth = client().credentials().sign("1");
        let req = client().build_total_count(&auth);
        assert_eq!(req.query, auth.into_pairs());
    }

    #[test]
    fn private_key_never_appears_in_request() {
        let c = CatalogClient::new("http://h", Credentials::new("pub", "topsecret"));
        let req = c.build_characters(&PageQuery::new(0, 20, ""), &c.credentials().sign("5"));
        assert!(!format!("{req:?}").contains("topsecret"));
        assert!(!req.redacted_url().contains("topsecret"));
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let c = CatalogClient::new("http://localhost:3000/", Credentials::new("a", "b"));
        let req = c.build_total_count(&c.credentials().sign("1"));
        assert_eq!(req.path, "http://localhost:3000/characters");
    }

    #[test]
    fn parse_characters_maps_results() {
        let page = client().parse_characters(ok(ONE_CHARACTER)).unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.characters.len(), 1);
        assert_eq!(page.characters[0].name, "Character 1");
        assert_eq!(page.characters[0].thumbnail, "path1.ext1");
    }

    #[test]
    fn parse_characters_rejects_error_status() {
        let response = HttpResponse {
            status: 500,
            headers: Vec::new(),
            body: "Internal Server Error".to_string(),
        };
        let err = client().parse_characters(response).unwrap_err();
        assert!(matches!(err, ApiError::HttpError { status: 500, .. }));
    }

    #[test]
    fn parse_characters_rejects_unexpected_shape() {
        let err = client().parse_characters(ok(r#"{"data":{}}"#)).unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(_)));
    }

    #[test]
    fn parse_total_count_reads_total() {
        assert_eq!(client().parse_total_count(ok(r#"{"data":{"total":100}}"#)).unwrap(), 100);
    }

    #[tokio::test]
    async fn fetch_characters_returns_page() {
        let transport = Canned::new(|| Ok(ok(ONE_CHARACTER)));
        let page = client()
            .fetch_characters(&transport, &PageQuery::new(0, 20, ""))
            .await;
        assert_eq!(page.total, 1);
        assert_eq!(page.characters[0].id, 1);
        let seen = transport.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].query_value("apikey"), Some("1234"));
    }

    #[tokio::test]
    async fn fetch_characters_is_fail_soft_on_transport_error() {
        let transport = Canned::new(|| Err(ApiError::Transport("connection refused".into())));
        let page = client()
            .fetch_characters(&transport, &PageQuery::new(0, 20, ""))
            .await;
        assert_eq!(page, Page::empty());
    }

    #[tokio::test]
    async fn fetch_characters_is_fail_soft_on_server_error() {
        let transport = Canned::new(|| {
            Ok(HttpResponse {
                status: 500,
                headers: Vec::new(),
                body: r#"{"error":"Error fetching characters"}"#.to_string(),
            })
        });
        let page = client()
            .fetch_characters(&transport, &PageQuery::new(0, 20, ""))
            .await;
        assert_eq!(page, Page::empty());
        assert_eq!(transport.seen.lock().unwrap().len(), 1, "no retries");
    }

    #[tokio::test]
    async fn fetch_total_count_reads_total() {
        let transport = Canned::new(|| Ok(ok(r#"{"data":{"total":100}}"#)));
        assert_eq!(client().fetch_total_count(&transport).await, 100);
    }

    #[tokio::test]
    async fn fetch_total_count_is_fail_soft() {
        let transport = Canned::new(|| Err(ApiError::Transport("timeout".into())));
        assert_eq!(client().fetch_total_count(&transport).await, 0);
    }
}
