use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::Stream;
use futures::stream::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response, header};
use serde::Deserialize;

use crate::client_logger::ClientLogger;
use crate::error::{Error, Result};
use crate::observability::{
    CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS, STREAM_CHUNKS,
};
use crate::sse::process_sse;
use crate::types::{GenerateContentRequest, GenerateContentResponse};

/// Base URL of the generative language REST API.
pub const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Client for the Gemini generative language API.
#[derive(Clone)]
pub struct Gemini {
    api_key: String,
    client: ReqwestClient,
    base_url: String,
    timeout: Duration,
    logger: Option<Arc<dyn ClientLogger>>,
}

impl Gemini {
    /// Create a new Gemini client.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_options(api_key, None, None)
    }

    /// Create a new client with custom settings.
    ///
    /// The base URL must end with a slash; one is appended when missing.
    pub fn with_options(
        api_key: impl Into<String>,
        base_url: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(Error::authentication("API key not provided"));
        }
        if HeaderValue::from_str(&api_key).is_err() {
            return Err(Error::authentication(
                "API key contains characters not allowed in a request header",
            ));
        }

        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {}", e),
                    Some(Box::new(e)),
                )
            })?;

        let mut base_url = base_url.unwrap_or_else(|| DEFAULT_API_URL.to_string());
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Ok(Self {
            api_key,
            client,
            base_url,
            timeout,
            logger: None,
        })
    }

    /// Attach a logger that sees every request and streamed chunk.
    pub fn with_logger(mut self, logger: Arc<dyn ClientLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// The base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn logger(&self) -> Option<&Arc<dyn ClientLogger>> {
        self.logger.as_ref()
    }

    /// Create and return default headers for API requests.
    fn default_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("text/event-stream"),
        );
        let key = HeaderValue::from_str(&self.api_key)
            .map_err(|_| Error::authentication("API key is not a valid header value"))?;
        headers.insert("x-goog-api-key", key);
        Ok(headers)
    }

    /// Process API response errors and convert to our Error type
    async fn process_error_response(response: Response) -> Error {
        let status = response.status();
        let status_code = status.as_u16();

        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|val| val.to_str().ok())
            .and_then(|val| val.parse::<u64>().ok());

        // Google wraps failures as {"error": {"code": .., "message": .., "status": ..}}
        #[derive(Deserialize)]
        struct ErrorResponse {
            error: Option<ErrorDetail>,
        }

        #[derive(Deserialize)]
        struct ErrorDetail {
            message: Option<String>,
            status: Option<String>,
        }

        let error_body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::http_client(
                    format!("Failed to read error response: {}", e),
                    Some(Box::new(e)),
                );
            }
        };

        let detail = serde_json::from_str::<ErrorResponse>(&error_body)
            .ok()
            .and_then(|e| e.error);
        let error_status = detail.as_ref().and_then(|d| d.status.clone());
        let error_message = detail
            .and_then(|d| d.message)
            .unwrap_or_else(|| error_body.clone());

        match status_code {
            400 => Error::bad_request(error_message),
            401 => Error::authentication(error_message),
            403 => Error::permission(error_message),
            404 => Error::not_found(error_message, None),
            408 => Error::timeout(error_message, None),
            429 => Error::rate_limit(error_message, retry_after),
            500 => Error::internal_server(error_message),
            502..=504 => Error::service_unavailable(error_message, retry_after),
            _ => Error::api(status_code, error_status, error_message),
        }
    }

    /// Open a streaming conversation turn.
    ///
    /// Returns a stream of response chunks that can be processed incrementally.
    /// The stream ends when the server closes the response.
    pub async fn stream(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<impl Stream<Item = Result<GenerateContentResponse>>> {
        let url = format!(
            "{}models/{}:streamGenerateContent?alt=sse",
            self.base_url, model
        );

        if let Some(logger) = &self.logger {
            logger.log_request(model, request);
        }

        CLIENT_REQUESTS.click();
        let start = Instant::now();
        let response = self
            .client
            .post(&url)
            .headers(self.default_headers()?)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                CLIENT_REQUEST_ERRORS.click();
                if e.is_timeout() {
                    Error::timeout(
                        format!("Request timed out: {}", e),
                        Some(self.timeout.as_secs_f64()),
                    )
                } else if e.is_connect() {
                    Error::connection(format!("Connection error: {}", e), Some(Box::new(e)))
                } else {
                    Error::http_client(format!("Request failed: {}", e), Some(Box::new(e)))
                }
            })?;
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());

        if !response.status().is_success() {
            CLIENT_REQUEST_ERRORS.click();
            return Err(Self::process_error_response(response).await);
        }

        let logger = self.logger.clone();
        let event_stream = process_sse(response.bytes_stream()).inspect(move |chunk| {
            if let Ok(chunk) = chunk {
                STREAM_CHUNKS.click();
                if let Some(logger) = &logger {
                    logger.log_stream_chunk(chunk);
                }
            }
        });

        Ok(event_stream)
    }
}

impl fmt::Debug for Gemini {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gemini")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("logger", &self.logger.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Content;
    use std::sync::Mutex;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SSE_BODY: &str = concat!(
        "data: {\"candidates\": [{\"content\": {\"parts\": [{\"text\": \"Hello\"}], \"role\": \"model\"}}]}\r\n\r\n",
        "data: {\"candidates\": [{\"content\": {\"parts\": [{\"text\": \", world\"}], \"role\": \"model\"}, \"finishReason\": \"STOP\"}]}\r\n\r\n",
    );

    #[derive(Default)]
    struct RecordingLogger {
        requests: Mutex<Vec<String>>,
        chunks: Mutex<Vec<String>>,
    }

    impl ClientLogger for RecordingLogger {
        fn log_request(&self, model: &str, _: &GenerateContentRequest) {
            self.requests.lock().unwrap().push(model.to_string());
        }

        fn log_stream_chunk(&self, chunk: &GenerateContentResponse) {
            self.chunks.lock().unwrap().push(chunk.text());
        }

        fn log_stream_complete(&self, _: &str) {}
    }

    #[test]
    fn client_creation() {
        let client = Gemini::new("test-key").unwrap();
        assert_eq!(client.api_key, "test-key");
        assert_eq!(client.base_url, DEFAULT_API_URL);
        assert_eq!(client.timeout, DEFAULT_TIMEOUT);

        let client = Gemini::with_options(
            "test-key",
            Some("http://localhost:8080/v1".to_string()),
            Some(Duration::from_secs(30)),
        )
        .unwrap();
        assert_eq!(client.base_url, "http://localhost:8080/v1/");
        assert_eq!(client.timeout, Duration::from_secs(30));
    }

    #[test]
    fn empty_key_is_an_authentication_error() {
        let err = Gemini::new("  ").unwrap_err();
        assert!(err.is_authentication());
        let err = Gemini::new("bad\nkey").unwrap_err();
        assert!(err.is_authentication());
    }

    #[test]
    fn debug_redacts_key() {
        let client = Gemini::new("secret-value").unwrap();
        let debug = format!("{client:?}");
        assert!(!debug.contains("secret-value"));
    }

    #[tokio::test]
    async fn stream_yields_chunks_in_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-pro:streamGenerateContent"))
            .and(query_param("alt", "sse"))
            .and(header("x-goog-api-key", "test-key"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(SSE_BODY),
            )
            .expect(1)
            .mount(&server)
            .await;

        let logger = Arc::new(RecordingLogger::default());
        let client = Gemini::with_options("test-key", Some(server.uri()), None)
            .unwrap()
            .with_logger(logger.clone());
        let request = GenerateContentRequest::new(vec![Content::user("hi")]);
        let stream = client.stream("gemini-pro", &request).await.unwrap();
        let texts: Vec<String> = stream.map(|chunk| chunk.unwrap().text()).collect().await;

        assert_eq!(texts, vec!["Hello".to_string(), ", world".to_string()]);
        assert_eq!(*logger.requests.lock().unwrap(), vec!["gemini-pro"]);
        assert_eq!(logger.chunks.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn error_statuses_are_mapped() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/denied:streamGenerateContent"))
            .respond_with(ResponseTemplate::new(403).set_body_string(
                r#"{"error": {"code": 403, "message": "API key not valid", "status": "PERMISSION_DENIED"}}"#,
            ))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/models/busy:streamGenerateContent"))
            .respond_with(
                ResponseTemplate::new(429)
                    .insert_header("retry-after", "7")
                    .set_body_string("slow down"),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/models/odd:streamGenerateContent"))
            .respond_with(ResponseTemplate::new(418).set_body_string(
                r#"{"error": {"code": 418, "message": "short and stout", "status": "TEAPOT"}}"#,
            ))
            .mount(&server)
            .await;

        let client = Gemini::with_options("test-key", Some(server.uri()), None).unwrap();
        let request = GenerateContentRequest::new(vec![Content::user("hi")]);

        let err = client.stream("denied", &request).await.err().unwrap();
        assert!(matches!(err, Error::Permission { ref message } if message == "API key not valid"));

        let err = client.stream("busy", &request).await.err().unwrap();
        assert!(matches!(
            err,
            Error::RateLimit {
                retry_after: Some(7),
                ..
            }
        ));

        let err = client.stream("odd", &request).await.err().unwrap();
        assert_eq!(err.status_code(), Some(418));
        assert_eq!(err.to_string(), "TEAPOT: short and stout");
    }

    #[tokio::test]
    async fn unreachable_server_is_a_connection_error() {
        // Nothing listens on the discard port.
        let client =
            Gemini::with_options("test-key", Some("http://127.0.0.1:9/".to_string()), None)
                .unwrap();
        let request = GenerateContentRequest::new(vec![Content::user("hi")]);
        let err = client.stream("gemini-pro", &request).await.err().unwrap();
        assert!(err.is_connection());
    }
}
