//! The HTTP transport that performs one streaming request attempt.

use std::pin::Pin;

use bytes::Bytes;
use futures::Stream;
use futures::stream::StreamExt;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client as ReqwestClient, Response};
use serde_json::json;
use url::Url;

use crate::config::StreamConfig;
use crate::error::{Error, Result};
use crate::logging::LogContext;
use crate::types::StreamRequest;

/// A response body delivered as raw byte chunks.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// A successful response to one request attempt.
pub struct TransportResponse {
    /// The message id announced by the server, if any.
    pub message_id: Option<String>,
    /// The streamed response body.
    pub body: ByteStream,
}

impl std::fmt::Debug for TransportResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportResponse")
            .field("message_id", &self.message_id)
            .finish_non_exhaustive()
    }
}

/// Performs a single attempt at opening a response stream.
///
/// Implementations must report a non-success status as
/// [`Error::Connection`] carrying the status, so the retry policy can decide
/// whether to try again.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Sends `request` and returns the response once headers have arrived.
    async fn open(&self, request: &StreamRequest) -> Result<TransportResponse>;
}

/// [`Transport`] that POSTs JSON over HTTP and reads an event-stream body.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: ReqwestClient,
    endpoint: Url,
    message_id_header: HeaderName,
    log: LogContext,
}

impl HttpTransport {
    /// Creates a transport from a config.
    pub fn new(config: &StreamConfig, log: LogContext) -> Result<Self> {
        let endpoint = config.endpoint_url()?;
        let message_id_header = HeaderName::from_bytes(config.message_id_header.as_bytes())
            .map_err(|e| {
                Error::config(format!(
                    "invalid message id header {:?}: {e}",
                    config.message_id_header
                ))
            })?;

        let mut builder = ReqwestClient::builder().connect_timeout(config.connect_timeout());
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| {
            Error::http_client(
                format!("Failed to build HTTP client: {e}"),
                Some(Box::new(e)),
            )
        })?;

        Ok(Self {
            client,
            endpoint,
            message_id_header,
            log,
        })
    }

    /// The endpoint requests are sent to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Create and return default headers for streaming requests.
    fn default_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("text/event-stream"),
        );
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        headers
    }

    /// Convert a non-success response into a connection error.
    async fn process_error_response(response: Response) -> Error {
        let status = response.status();
        let reason = status.canonical_reason().unwrap_or("unknown status");
        let body = response.text().await.unwrap_or_default();
        let message = if body.trim().is_empty() {
            format!("API error: {} {reason}", status.as_u16())
        } else {
            format!("API error: {} {reason}: {}", status.as_u16(), body.trim())
        };
        Error::connection(message, Some(status.as_u16()), None)
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn open(&self, request: &StreamRequest) -> Result<TransportResponse> {
        self.log.debug(
            "CONNECTION",
            "Sending API request with payload",
            Some(&json!({"endpoint": self.endpoint.as_str(), "payload": request})),
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .headers(Self::default_headers())
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::process_error_response(response).await);
        }

        let message_id = response
            .headers()
            .get(&self.message_id_header)
            .and_then(|val| val.to_str().ok())
            .map(str::trim)
            .filter(|val| !val.is_empty())
            .map(String::from);

        let body = response.bytes_stream().map(|chunk| {
            chunk.map_err(|e| {
                Error::streaming(format!("Error in HTTP stream: {e}"), Some(Box::new(e)))
            })
        });

        Ok(TransportResponse {
            message_id,
            body: Box::pin(body),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_creation() {
        let config = StreamConfig::new().with_endpoint("https://chat.example.com/api/run_sse");
        let transport = HttpTransport::new(&config, LogContext::disabled()).unwrap();
        assert_eq!(
            transport.endpoint().as_str(),
            "https://chat.example.com/api/run_sse"
        );
        assert_eq!(transport.message_id_header, "x-message-id");
    }

    #[test]
    fn rejects_invalid_header_name() {
        let config = StreamConfig::new().with_message_id_header("bad header");
        let err = HttpTransport::new(&config, LogContext::disabled()).unwrap_err();
        assert!(err.to_string().contains("message id header"));
    }

    #[test]
    fn default_headers_request_event_stream() {
        let headers = HttpTransport::default_headers();
        assert_eq!(headers[header::ACCEPT], "text/event-stream");
        assert_eq!(headers[header::CONTENT_TYPE], "application/json");
    }
}
