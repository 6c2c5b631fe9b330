//! services/api/src/adapters/backend.rs
//!
//! This module contains the adapter for the remote Dream University backend.
//! It implements both the `CatalogService` and `CounsellorService` ports from
//! the `core` crate over plain HTTP.

use async_trait::async_trait;
use dream_university_core::{
    fallback::DEFAULT_IMAGE_URL,
    ports::{CatalogService, CounsellorService, PortError, PortResult},
    University,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

//=========================================================================================
// Wire Types
//=========================================================================================

/// One catalog row as the backend serializes it.
#[derive(Debug, Deserialize)]
struct UniversityRecord {
    id: u32,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    tuition_fees_usd: Option<f64>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default, rename = "type")]
    institution_type: Option<String>,
    #[serde(default)]
    tags: Option<Vec<String>>,
    #[serde(default)]
    ranking_global: Option<u32>,
    #[serde(default)]
    acceptance_rate_percent: Option<f64>,
}

impl From<UniversityRecord> for University {
    fn from(record: UniversityRecord) -> Self {
        let tuition_usd = record
            .tuition_fees_usd
            .filter(|fee| fee.is_finite() && *fee > 0.0)
            .map(|fee| fee.round() as u64)
            .unwrap_or(0);
        let image_url = record
            .image_url
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_IMAGE_URL.to_string());

        University {
            id: record.id,
            name: record.name.unwrap_or_default(),
            country: record.country.unwrap_or_default(),
            tuition_usd,
            image_url,
            institution_type: record.institution_type,
            tags: record.tags.unwrap_or_default(),
            global_rank: record.ranking_global,
            acceptance_rate_percent: record.acceptance_rate_percent,
        }
    }
}

/// `GET /universities` answers either `{ "data": [...] }` or a bare array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CatalogEnvelope {
    Wrapped { data: Vec<UniversityRecord> },
    Bare(Vec<UniversityRecord>),
}

impl CatalogEnvelope {
    fn into_records(self) -> Vec<UniversityRecord> {
        match self {
            CatalogEnvelope::Wrapped { data } => data,
            CatalogEnvelope::Bare(records) => records,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    response: String,
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that talks to the backend's `/universities` and `/chat` endpoints.
#[derive(Clone)]
pub struct HttpBackendAdapter {
    client: Client,
    base_url: String,
}

impl HttpBackendAdapter {
    /// Creates a new `HttpBackendAdapter` rooted at `base_url`.
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn transport_error(e: reqwest::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn status_error(status: reqwest::StatusCode, url: &str) -> PortError {
    if status == reqwest::StatusCode::NOT_FOUND {
        return PortError::NotFound(url.to_string());
    }
    PortError::Unexpected(format!("backend answered with status {}", status))
}

//=========================================================================================
// Port Implementations
//=========================================================================================

#[async_trait]
impl CatalogService for HttpBackendAdapter {
    async fn fetch_universities(&self) -> PortResult<Vec<University>> {
        let url = self.url("/universities");
        let response = self.client.get(&url).send().await.map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, &url));
        }

        let body = response.bytes().await.map_err(transport_error)?;
        let envelope: CatalogEnvelope = serde_json::from_slice(&body)
            .map_err(|e| PortError::Malformed(e.to_string()))?;

        let universities: Vec<University> =
            envelope.into_records().into_iter().map(University::from).collect();
        debug!("Backend returned {} catalog entries.", universities.len());
        Ok(universities)
    }
}

#[async_trait]
impl CounsellorService for HttpBackendAdapter {
    async fn send_message(&self, message: &str) -> PortResult<String> {
        let url = self.url("/chat");
        let response = self
            .client
            .post(&url)
            .json(&ChatRequest { message })
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, &url));
        }

        let body = response.bytes().await.map_err(transport_error)?;
        let reply: ChatResponse = serde_json::from_slice(&body)
            .map_err(|e| PortError::Malformed(e.to_string()))?;
        Ok(reply.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn adapter(server: &MockServer) -> HttpBackendAdapter {
        HttpBackendAdapter::new(Client::new(), format!("{}/", server.uri()))
    }

    #[tokio::test]
    async fn catalog_accepts_wrapped_shape() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/universities"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{
                    "id": 7,
                    "name": "ETH Zurich",
                    "country": "Switzerland",
                    "tuition_fees_usd": 1500.4,
                    "image_url": "",
                    "type": "Public",
                    "tags": ["STEM"],
                    "ranking_global": 7,
                    "acceptance_rate_percent": 27.0
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let universities = adapter(&server).fetch_universities().await.expect("catalog parses");

        assert_eq!(universities.len(), 1);
        let eth = &universities[0];
        assert_eq!(eth.id, 7);
        assert_eq!(eth.tuition_usd, 1500);
        assert_eq!(eth.image_url, DEFAULT_IMAGE_URL);
        assert_eq!(eth.institution_type.as_deref(), Some("Public"));
        assert_eq!(eth.global_rank, Some(7));
    }

    #[tokio::test]
    async fn catalog_accepts_bare_array_with_sparse_rows() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/universities"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": 1, "name": "A", "country": "USA", "tuition_fees_usd": 50000 },
                { "id": 2, "name": "B", "country": "UK" }
            ])))
            .mount(&server)
            .await;

        let universities = adapter(&server).fetch_universities().await.expect("catalog parses");

        assert_eq!(universities.len(), 2);
        assert_eq!(universities[1].tuition_usd, 0);
        assert_eq!(universities[1].global_rank, None);
        assert!(universities[1].tags.is_empty());
    }

    #[tokio::test]
    async fn catalog_keeps_rows_with_null_columns() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/universities"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    { "id": 1, "name": "McGill University", "country": "Canada", "tuition_fees_usd": 30000 },
                    {
                        "id": 2,
                        "name": "Somewhere",
                        "country": null,
                        "tuition_fees_usd": null,
                        "image_url": null,
                        "type": null,
                        "tags": null,
                        "ranking_global": null
                    }
                ]
            })))
            .mount(&server)
            .await;

        let universities = adapter(&server).fetch_universities().await.expect("catalog parses");

        assert_eq!(universities.len(), 2);
        assert_eq!(universities[0].name, "McGill University");
        let sparse = &universities[1];
        assert_eq!(sparse.name, "Somewhere");
        assert_eq!(sparse.country, "");
        assert_eq!(sparse.tuition_usd, 0);
        assert_eq!(sparse.image_url, DEFAULT_IMAGE_URL);
        assert!(sparse.tags.is_empty());
    }

    #[tokio::test]
    async fn catalog_error_body_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/universities"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "error": "db down" })))
            .mount(&server)
            .await;

        let result = adapter(&server).fetch_universities().await;
        assert!(matches!(result, Err(PortError::Malformed(_))));
    }

    #[tokio::test]
    async fn catalog_non_success_status_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/universities"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let result = adapter(&server).fetch_universities().await;
        assert!(matches!(result, Err(PortError::Unexpected(_))));
    }

    #[tokio::test]
    async fn missing_endpoint_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/universities"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let result = adapter(&server).fetch_universities().await;
        assert!(matches!(result, Err(PortError::NotFound(url)) if url.ends_with("/universities")));
    }

    #[tokio::test]
    async fn chat_posts_message_and_returns_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .and(body_json(json!({ "message": "Profile: 0 budget, 0 GPA. Query: hi" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": "Hello!" })))
            .expect(1)
            .mount(&server)
            .await;

        let reply = adapter(&server)
            .send_message("Profile: 0 budget, 0 GPA. Query: hi")
            .await
            .expect("chat succeeds");
        assert_eq!(reply, "Hello!");
    }

    #[tokio::test]
    async fn chat_server_error_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(
                ResponseTemplate::new(500).set_body_json(json!({ "detail": "AI Error: quota" })),
            )
            .mount(&server)
            .await;

        assert!(adapter(&server).send_message("hi").await.is_err());
    }
}
