use std::env;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response, header};
use serde::Deserialize;
use url::Url;

use crate::client_logger::ClientLogger;
use crate::error::{Error, Result};
use crate::observability::{CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS};
use crate::types::{Content, GenerateContentRequest, GenerateContentResponse, Model};

const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Environment variable consulted when no key is given explicitly.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Client for the Gemini generative-language REST API.
///
/// There is no request timeout unless one is set with [`Gemini::with_options`];
/// a call stays outstanding until the server answers or the connection fails.
#[derive(Clone)]
pub struct Gemini {
    client: ReqwestClient,
    headers: HeaderMap,
    base_url: Url,
    timeout: Option<Duration>,
    logger: Option<Arc<dyn ClientLogger>>,
}

impl fmt::Debug for Gemini {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gemini")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Gemini {
    /// Create a new Gemini client.
    ///
    /// The API key can be provided directly or read from the GEMINI_API_KEY
    /// environment variable.
    pub fn new(api_key: Option<String>) -> Result<Self> {
        Self::with_options(api_key, None, None)
    }

    /// Create a new client with custom settings.
    pub fn with_options(
        api_key: Option<String>,
        base_url: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let api_key = match api_key {
            Some(key) => key,
            None => env::var(API_KEY_ENV).map_err(|_| {
                Error::authentication(format!(
                    "API key not provided and {API_KEY_ENV} environment variable not set"
                ))
            })?,
        };
        let headers = default_headers(&api_key)?;

        let base_url = base_url.as_deref().unwrap_or(DEFAULT_API_URL);
        let base_url = if base_url.ends_with('/') {
            Url::parse(base_url)?
        } else {
            Url::parse(&format!("{base_url}/"))?
        };

        let mut builder = ReqwestClient::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| {
            Error::http_client(
                format!("Failed to build HTTP client: {}", e),
                Some(Box::new(e)),
            )
        })?;

        Ok(Self {
            client,
            headers,
            base_url,
            timeout,
            logger: None,
        })
    }

    /// Attach a logger that sees every request and parsed response.
    pub fn with_logger(mut self, logger: Arc<dyn ClientLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// The endpoint used for `model`.
    pub fn endpoint(&self, model: &Model) -> Result<Url> {
        let model = model.to_string();
        let model = model.trim();
        if model.is_empty() {
            return Err(Error::configuration("model id must not be empty"));
        }
        let path = if model.contains('/') {
            format!("{model}:generateContent")
        } else {
            format!("models/{model}:generateContent")
        };
        Ok(self.base_url.join(&path)?)
    }

    /// Send the full conversation and return the model's response.
    pub async fn generate(
        &self,
        model: &Model,
        contents: Vec<Content>,
    ) -> Result<GenerateContentResponse> {
        let url = self.endpoint(model)?;
        let request = GenerateContentRequest::new(contents);
        if let Some(logger) = &self.logger {
            logger.log_request(model, &request);
        }

        CLIENT_REQUESTS.click();
        let start = Instant::now();
        let result = self.post(url, &request).await;
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());
        if result.is_err() {
            CLIENT_REQUEST_ERRORS.click();
        }

        let response = result?;
        if let Some(logger) = &self.logger {
            logger.log_response(model, &response);
        }
        Ok(response)
    }

    async fn post(
        &self,
        url: Url,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let response = self
            .client
            .post(url)
            .headers(self.headers.clone())
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::timeout(
                        format!("Request timed out: {}", e),
                        self.timeout.map(|t| t.as_secs_f64()),
                    )
                } else if e.is_connect() {
                    Error::connection(format!("Connection error: {}", e), Some(Box::new(e)))
                } else {
                    Error::http_client(format!("Request failed: {}", e), Some(Box::new(e)))
                }
            })?;

        if !response.status().is_success() {
            return Err(Self::process_error_response(response).await);
        }

        response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|e| {
                Error::serialization(
                    format!("Failed to parse response: {}", e),
                    Some(Box::new(e)),
                )
            })
    }

    /// Process API response errors and convert to our Error type
    async fn process_error_response(response: Response) -> Error {
        let status_code = response.status().as_u16();
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|val| val.to_str().ok())
            .and_then(|val| val.parse::<u64>().ok());

        let error_body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::http_client(
                    format!("Failed to read error response: {}", e),
                    Some(Box::new(e)),
                );
            }
        };
        error_from_body(status_code, &error_body, retry_after)
    }
}

fn default_headers(api_key: &str) -> Result<HeaderMap> {
    if api_key.trim().is_empty() {
        return Err(Error::authentication("API key is empty"));
    }
    let mut key = HeaderValue::from_str(api_key.trim()).map_err(|_| {
        Error::authentication("API key contains characters not allowed in a header")
    })?;
    key.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(API_KEY_HEADER, key);
    Ok(headers)
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: Option<ErrorDetail>,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: Option<String>,
    status: Option<String>,
}

/// Map a non-success status and its body onto an [`Error`].
fn error_from_body(status_code: u16, body: &str, retry_after: Option<u64>) -> Error {
    let detail = serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .and_then(|parsed| parsed.error);
    let status = detail.as_ref().and_then(|d| d.status.clone());
    let message = detail
        .and_then(|d| d.message)
        .unwrap_or_else(|| body.to_string());

    match status_code {
        400 => Error::bad_request(message),
        401 => Error::authentication(message),
        403 => Error::permission(message),
        404 => Error::not_found(message),
        408 => Error::timeout(message, None),
        429 => Error::rate_limit(message, retry_after),
        500 => Error::internal_server(message),
        502..=504 => Error::service_unavailable(message, retry_after),
        _ => Error::api(status_code, status, message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::KnownModel;

    #[test]
    fn empty_key_is_rejected() {
        let err = Gemini::new(Some(String::new())).unwrap_err();
        assert!(err.is_authentication());
        let err = Gemini::new(Some("   ".to_string())).unwrap_err();
        assert!(err.is_authentication());
    }

    #[test]
    fn key_with_newline_is_rejected() {
        let err = Gemini::new(Some("abc\ndef".to_string())).unwrap_err();
        assert!(err.is_authentication());
    }

    #[test]
    fn endpoint_for_known_and_custom_models() {
        let client = Gemini::new(Some("test-key".to_string())).unwrap();
        assert_eq!(
            client
                .endpoint(&Model::Known(KnownModel::Gemini25Flash))
                .unwrap()
                .as_str(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
        assert_eq!(
            client
                .endpoint(&Model::Custom("tunedModels/bro-7".to_string()))
                .unwrap()
                .as_str(),
            "https://generativelanguage.googleapis.com/v1beta/tunedModels/bro-7:generateContent"
        );
        assert!(
            client
                .endpoint(&Model::Custom(" ".to_string()))
                .unwrap_err()
                .is_configuration()
        );
    }

    #[test]
    fn base_url_without_trailing_slash() {
        let client = Gemini::with_options(
            Some("test-key".to_string()),
            Some("http://localhost:8080/v1".to_string()),
            Some(Duration::from_secs(5)),
        )
        .unwrap();
        assert_eq!(
            client.endpoint(&Model::default()).unwrap().as_str(),
            "http://localhost:8080/v1/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn debug_hides_key() {
        let client = Gemini::new(Some("super-secret".to_string())).unwrap();
        assert!(!format!("{client:?}").contains("super-secret"));
    }

    #[tokio::test]
    async fn unreachable_server_is_a_connection_error() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        #[derive(Default)]
        struct Counting {
            requests: AtomicUsize,
            responses: AtomicUsize,
        }

        impl ClientLogger for Counting {
            fn log_request(&self, _: &Model, request: &GenerateContentRequest) {
                assert_eq!(request.contents.len(), 1);
                self.requests.fetch_add(1, Ordering::SeqCst);
            }

            fn log_response(&self, _: &Model, _: &GenerateContentResponse) {
                self.responses.fetch_add(1, Ordering::SeqCst);
            }
        }

        let logger = Arc::new(Counting::default());
        let client = Gemini::with_options(
            Some("test-key".to_string()),
            Some("http://127.0.0.1:1/v1beta".to_string()),
            None,
        )
        .unwrap()
        .with_logger(logger.clone());

        let contents = vec![Content::from(&crate::types::Message::user("hi"))];
        let err = client.generate(&Model::default(), contents).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Connection { .. } | Error::HttpClient { .. }
        ));
        assert_eq!(logger.requests.load(Ordering::SeqCst), 1);
        assert_eq!(logger.responses.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn error_body_mapping() {
        let body = r#"{"error": {"code": 400, "message": "API key not valid.", "status": "INVALID_ARGUMENT"}}"#;
        let err = error_from_body(400, body, None);
        assert!(matches!(err, Error::BadRequest { .. }));
        assert_eq!(err.message(), "API key not valid.");

        let err = error_from_body(429, r#"{"error": {"message": "slow down"}}"#, Some(7));
        assert!(err.is_rate_limit());
        assert!(err.to_string().contains("retry after 7 seconds"));

        let err = error_from_body(418, "not json", None);
        assert_eq!(err.status_code(), Some(418));
        assert_eq!(err.message(), "not json");

        let err = error_from_body(503, "{}", None);
        assert!(err.is_server_error());
        assert_eq!(err.message(), "{}");
    }
}
