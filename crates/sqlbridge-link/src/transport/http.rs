//! Blocking HTTP transports: a chunked delimited-text endpoint and a JSON
//! statement API with polling, partitions and pages.

use super::auth::AuthProvider;
use super::chunked::{ChunkSource, ChunkStream};
use crate::fetch::StatementApi;
use crate::models::{Page, PartitionData, QueryRequest, StatementResponse};
use bytes::Bytes;
use log::{debug, warn};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::WWW_AUTHENTICATE;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use sqlbridge_commons::{BridgeError, BridgeTimeouts, Result};
use std::io::Read;
use std::time::Instant;

/// Read size for streamed response bodies.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Build a blocking client honoring the configured timeouts.
pub fn build_client(timeouts: &BridgeTimeouts, user_agent: &str) -> Result<Client> {
    let mut builder = Client::builder()
        .user_agent(user_agent.to_string())
        .connect_timeout(timeouts.connection_timeout)
        .pool_max_idle_per_host(4);

    builder = if BridgeTimeouts::is_no_timeout(timeouts.request_timeout) {
        builder.timeout(None)
    } else {
        builder.timeout(timeouts.request_timeout)
    };

    builder.build().map_err(|e| BridgeError::ConfigurationError(e.to_string()))
}

/// Map a non-success status to the error taxonomy.
///
/// 401 and 403 are credential failures; a body or `WWW-Authenticate` challenge
/// mentioning expiry means the token must be refreshed. Everything else is an
/// execution error carrying the status and the engine's message.
pub fn status_error(status: u16, www_authenticate: Option<&str>, body: &str) -> BridgeError {
    let message = extract_error_message(body);
    if status == 401 || status == 403 {
        let expired = [Some(body), www_authenticate]
            .into_iter()
            .flatten()
            .any(|text| text.to_ascii_lowercase().contains("expired"));
        return if expired {
            BridgeError::TokenExpired(message)
        } else {
            BridgeError::AuthenticationError(message)
        };
    }
    BridgeError::execution_with_status(status.to_string(), message)
}

/// Pull a message out of a JSON error envelope, falling back to the raw body.
fn extract_error_message(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "Unknown error".to_string();
    }
    let Ok(json) = serde_json::from_str::<JsonValue>(trimmed) else {
        return trimmed.to_string();
    };
    let message = json
        .pointer("/error/message")
        .or_else(|| json.get("message"))
        .or_else(|| json.get("error"))
        .and_then(JsonValue::as_str);
    message.map(str::to_string).unwrap_or_else(|| trimmed.to_string())
}

/// Base URL, client and credentials shared by both HTTP transports.
#[derive(Debug, Clone)]
pub struct HttpEndpoint {
    base_url: String,
    client: Client,
    auth: AuthProvider,
}

impl HttpEndpoint {
    pub fn new(base_url: impl Into<String>, client: Client, auth: AuthProvider) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, client, auth }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn auth_mut(&mut self) -> &mut AuthProvider {
        &mut self.auth
    }

    pub fn url(&self, path: &str) -> Result<Url> {
        Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| BridgeError::ConfigurationError(format!("Invalid URL {}{}: {}", self.base_url, path, e)))
    }

    fn send(&self, request: RequestBuilder, what: &str) -> Result<Response> {
        let request = self.auth.apply_to_request(request)?;
        let start = Instant::now();
        let response = request.send()?;
        let status = response.status();
        debug!(
            "[HTTP] {} -> status={} duration_ms={}",
            what,
            status,
            start.elapsed().as_millis()
        );
        if status.is_success() {
            return Ok(response);
        }

        let challenge = response
            .headers()
            .get(WWW_AUTHENTICATE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.text().unwrap_or_default();
        let err = status_error(status.as_u16(), challenge.as_deref(), &body);
        warn!("[HTTP] {} failed: {}", what, err);
        Err(err)
    }

    fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let what = format!("GET {}", url.path());
        let response = self.send(self.client.get(url), &what)?;
        Ok(response.json::<T>()?)
    }

    fn post_json<T: DeserializeOwned>(&self, url: Url, body: &QueryRequest) -> Result<T> {
        let what = format!("POST {}", url.path());
        let response = self.send(self.client.post(url).json(body), &what)?;
        Ok(response.json::<T>()?)
    }
}

/// Streams delimited text from `POST {base}{path}`.
#[derive(Debug, Clone)]
pub struct HttpChunkSource {
    endpoint: HttpEndpoint,
    path: String,
    chunk_size: usize,
}

impl HttpChunkSource {
    pub fn new(endpoint: HttpEndpoint) -> Self {
        Self {
            endpoint,
            path: "/v1/query".to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }
}

impl ChunkSource for HttpChunkSource {
    fn open(&mut self, sql: &str) -> Result<ChunkStream<'_>> {
        let url = self.endpoint.url(&self.path)?;
        let request = QueryRequest::new(sql).with_format("csv");
        let what = format!("POST {}", url.path());
        let response = self
            .endpoint
            .send(self.endpoint.client.post(url).json(&request), &what)?;
        Ok(Box::new(ResponseChunks {
            response,
            chunk_size: self.chunk_size,
            done: false,
        }))
    }
}

/// Reads a response body in fixed-size pieces.
struct ResponseChunks {
    response: Response,
    chunk_size: usize,
    done: bool,
}

impl Iterator for ResponseChunks {
    type Item = Result<Bytes>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let mut buf = vec![0u8; self.chunk_size];
        match self.response.read(&mut buf) {
            Ok(0) => {
                self.done = true;
                None
            },
            Ok(n) => {
                buf.truncate(n);
                Some(Ok(Bytes::from(buf)))
            },
            Err(e) => {
                self.done = true;
                Some(Err(BridgeError::ConnectionError(format!("Response body read failed: {}", e))))
            },
        }
    }
}

/// JSON statement API:
///
/// ```text
/// POST {base}/v1/statements                         submit
/// GET  {base}/v1/statements/{handle}                status
/// GET  {base}/v1/statements/{handle}/partitions/{i} partition i
/// GET  {base}/v1/statements/{handle}/pages?token=t  next page
/// ```
#[derive(Debug, Clone)]
pub struct HttpStatementApi {
    endpoint: HttpEndpoint,
}

impl HttpStatementApi {
    pub fn new(endpoint: HttpEndpoint) -> Self {
        Self { endpoint }
    }

    pub fn statement_url(&self, handle: &str) -> Result<Url> {
        self.endpoint.url(&format!("/v1/statements/{}", handle))
    }

    pub fn partition_url(&self, handle: &str, index: usize) -> Result<Url> {
        self.endpoint
            .url(&format!("/v1/statements/{}/partitions/{}", handle, index))
    }

    pub fn page_url(&self, handle: &str, token: &str) -> Result<Url> {
        let mut url = self.endpoint.url(&format!("/v1/statements/{}/pages", handle))?;
        url.query_pairs_mut().append_pair("token", token);
        Ok(url)
    }
}

impl StatementApi for HttpStatementApi {
    fn submit(&mut self, sql: &str) -> Result<StatementResponse> {
        let url = self.endpoint.url("/v1/statements")?;
        self.endpoint.post_json(url, &QueryRequest::new(sql))
    }

    fn poll(&mut self, handle: &str) -> Result<StatementResponse> {
        let url = self.statement_url(handle)?;
        self.endpoint.get_json(url)
    }

    fn fetch_partition(&mut self, handle: &str, index: usize) -> Result<PartitionData> {
        let url = self.partition_url(handle, index)?;
        self.endpoint.get_json(url)
    }

    fn fetch_page(&mut self, handle: &str, token: &str) -> Result<Page> {
        let url = self.page_url(handle, token)?;
        self.endpoint.get_json(url)
    }
}
