//! Request execution: header injection, retries, response decoding.

use std::sync::Arc;

use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, USER_AGENT};
use reqwest::Method;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};

use crate::config::{ClientConfig, ClientOptions};
use crate::error::BillingClientError;
use crate::log::{access_line, RequestLogger};
use crate::retry::{should_retry, AttemptOutcome};
use crate::transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};

/// Longest part of an error response body quoted in an error message.
const BODY_SUMMARY_LIMIT: usize = 120;

/// A request relative to the configured base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: Method,
    path: String,
    body: Option<Vec<u8>>,
}

impl Request {
    /// Create a request without a body.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
        }
    }

    /// `GET` request.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// `POST` request with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error if the body cannot be serialized.
    pub fn post_json<T: Serialize + ?Sized>(
        path: impl Into<String>,
        body: &T,
    ) -> Result<Self, BillingClientError> {
        Self::new(Method::POST, path).with_json(body)
    }

    /// `PUT` request with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error if the body cannot be serialized.
    pub fn put_json<T: Serialize + ?Sized>(
        path: impl Into<String>,
        body: &T,
    ) -> Result<Self, BillingClientError> {
        Self::new(Method::PUT, path).with_json(body)
    }

    /// Attach a JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error if the body cannot be serialized.
    pub fn with_json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, BillingClientError> {
        let bytes = serde_json::to_vec(body)
            .map_err(|e| BillingClientError::InvalidRequest(e.to_string()))?;
        self.body = Some(bytes);
        Ok(self)
    }

    /// HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Path relative to the base URL.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Serialized body, if any.
    #[must_use]
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }
}

/// Sends requests to the billing service.
///
/// Every request gets the `User-Agent`, auth and `Content-Type` headers.
/// 5xx responses and transport failures are retried per
/// [`should_retry`]; 4xx responses fail immediately.
///
/// Cloning is cheap and clones share the transport's connection pool.
#[derive(Debug, Clone)]
pub struct RequestExecutor {
    config: Arc<ClientConfig>,
    transport: Arc<dyn Transport>,
    logger: Option<Arc<dyn RequestLogger>>,
}

impl RequestExecutor {
    /// Validate the parameters and build an executor.
    ///
    /// # Errors
    ///
    /// Returns [`BillingClientError::Configuration`] listing every invalid
    /// parameter, or [`BillingClientError::Transport`] if the default HTTP
    /// client cannot be built.
    pub fn new(
        base_url: &str,
        auth_header: &str,
        auth_token: &str,
        options: ClientOptions,
    ) -> Result<Self, BillingClientError> {
        let config = ClientConfig::validate(base_url, auth_header, auth_token, &options)?;
        let transport: Arc<dyn Transport> = match options.transport() {
            Some(transport) => Arc::clone(transport),
            None => Arc::new(ReqwestTransport::new(
                config.connect_timeout(),
                config.timeout(),
            )?),
        };

        debug!(
            base_url = %config.base_url(),
            auth_header = %config.auth_header(),
            max_retries = config.max_retries(),
            "Billing client configured"
        );

        Ok(Self {
            config: Arc::new(config),
            transport,
            logger: options.logger().cloned(),
        })
    }

    /// The validated configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Send the request and decode the response body into a JSON object.
    ///
    /// An empty body, `null` or `false` decode to an empty map. Arrays and
    /// other scalars are keyed by position (`"0"`, `"1"`, ...).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails after retries, the service
    /// answers with a 4xx/5xx status, or the body is not valid JSON.
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    pub async fn send_request(
        &self,
        request: &Request,
    ) -> Result<Map<String, Value>, BillingClientError> {
        let response = self.dispatch(request).await?;
        decode_body(&response.body)
    }

    /// Send the request and ignore the response body.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails after retries or the service
    /// answers with a 4xx/5xx status.
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    pub async fn send_request_without_response(
        &self,
        request: &Request,
    ) -> Result<(), BillingClientError> {
        self.dispatch(request).await.map(|_| ())
    }

    /// Run the attempt loop until a final response or error.
    async fn dispatch(&self, request: &Request) -> Result<HttpResponse, BillingClientError> {
        let prepared = self.prepare(request)?;
        let max_retries = self.config.max_retries();
        let mut retries = 0;

        loop {
            let result = self.transport.send(prepared.clone()).await;
            self.log_attempt(&prepared, result.as_ref().ok());

            let outcome = match &result {
                Ok(response) => AttemptOutcome::Response(response.status.as_u16()),
                Err(_) => AttemptOutcome::TransportFailure,
            };

            if should_retry(retries, max_retries, outcome) {
                retries += 1;
                let delay = self.config.backoff().delay(retries);
                match &result {
                    Ok(response) => warn!(
                        status = response.status.as_u16(),
                        retry = retries,
                        max_retries,
                        delay = ?delay,
                        "Billing request failed, retrying"
                    ),
                    Err(error) => warn!(
                        error = %error,
                        retry = retries,
                        max_retries,
                        delay = ?delay,
                        "Billing request failed, retrying"
                    ),
                }
                tokio::time::sleep(delay).await;
                continue;
            }

            let response = result?;
            if response.status.is_client_error() || response.status.is_server_error() {
                return Err(status_error(&prepared, &response));
            }
            return Ok(response);
        }
    }

    /// Resolve the path and attach the default headers.
    fn prepare(&self, request: &Request) -> Result<HttpRequest, BillingClientError> {
        let url = self
            .config
            .base_url()
            .join(&request.path)
            .map_err(|e| BillingClientError::InvalidRequest(format!("{}: {e}", request.path)))?;

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, self.config.user_agent().clone());
        headers.insert(
            self.config.auth_header().clone(),
            self.config.auth_token().clone(),
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Ok(HttpRequest {
            method: request.method.clone(),
            url,
            headers,
            body: request.body.clone(),
        })
    }

    fn log_attempt(&self, request: &HttpRequest, response: Option<&HttpResponse>) {
        if let Some(logger) = &self.logger {
            logger.info(&access_line(request, response, Utc::now()));
        }
    }
}

/// Decode a response body into a JSON object.
fn decode_body(body: &[u8]) -> Result<Map<String, Value>, BillingClientError> {
    if body.is_empty() {
        return Ok(Map::new());
    }

    let value: Value = serde_json::from_slice(body).map_err(BillingClientError::json_parse)?;
    Ok(match value {
        Value::Object(map) => map,
        Value::Null | Value::Bool(false) => Map::new(),
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(index, item)| (index.to_string(), item))
            .collect(),
        scalar => Map::from_iter([("0".to_string(), scalar)]),
    })
}

/// Build the terminal error for a 4xx/5xx response.
fn status_error(request: &HttpRequest, response: &HttpResponse) -> BillingClientError {
    let status = response.status;
    let label = if status.is_server_error() {
        "Server error"
    } else {
        "Client error"
    };

    let mut message = format!(
        "{label}: `{} {}` resulted in a `{status}` response",
        request.method, request.url
    );
    if let Some(summary) = summarize_body(&response.body) {
        message.push_str(":\n");
        message.push_str(&summary);
    }

    if status.is_server_error() {
        BillingClientError::Server {
            status: status.as_u16(),
            message,
        }
    } else {
        BillingClientError::Client {
            status: status.as_u16(),
            message,
        }
    }
}

fn summarize_body(body: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if text.chars().count() <= BODY_SUMMARY_LIMIT {
        return Some(text.to_string());
    }
    let mut summary: String = text.chars().take(BODY_SUMMARY_LIMIT).collect();
    summary.push_str(" (truncated...)");
    Some(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::Backoff;
    use crate::testing::MockTransport;
    use crate::transport::TransportErrorKind;
    use reqwest::StatusCode;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct CapturingLogger {
        lines: Mutex<Vec<String>>,
    }

    impl RequestLogger for CapturingLogger {
        fn info(&self, line: &str) {
            self.lines.lock().unwrap().push(line.to_string());
        }
    }

    fn executor(transport: &MockTransport, options: ClientOptions) -> RequestExecutor {
        RequestExecutor::new(
            "https://example.com/",
            "authHeader",
            "authToken",
            options
                .with_backoff(Backoff::none())
                .with_transport(Arc::new(transport.clone())),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn attaches_default_headers() {
        let transport = MockTransport::new();
        transport.push_json(StatusCode::OK, &json!({ "remaining": "123", "consumed": "456" }));

        let data = executor(&transport, ClientOptions::default())
            .send_request(&Request::get("credits"))
            .await
            .unwrap();

        assert_eq!(data.get("remaining"), Some(&json!("123")));
        assert_eq!(data.get("consumed"), Some(&json!("456")));

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        let sent = &requests[0];
        assert_eq!(sent.method, Method::GET);
        assert_eq!(sent.url.as_str(), "https://example.com/credits");
        assert_eq!(sent.headers["authHeader"], "authToken");
        assert_eq!(sent.headers[USER_AGENT], "Billing Client");
        assert_eq!(sent.headers[CONTENT_TYPE], "application/json");
    }

    #[tokio::test]
    async fn sends_json_body_unchanged_on_retry() {
        let transport = MockTransport::new();
        transport.push_status(StatusCode::BAD_GATEWAY);
        transport.push_json(StatusCode::OK, &json!({}));

        let request = Request::put_json("duration/job", &json!({ "jobId": "1" })).unwrap();
        executor(&transport, ClientOptions::default())
            .send_request(&request)
            .await
            .unwrap();

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        for sent in requests {
            assert_eq!(sent.method, Method::PUT);
            assert_eq!(sent.body.as_deref(), Some(br#"{"jobId":"1"}"#.as_slice()));
        }
    }

    #[tokio::test]
    async fn empty_and_falsy_bodies_decode_to_empty_map() {
        for body in ["", "null", "false"] {
            let transport = MockTransport::new();
            transport.push_response(StatusCode::OK, body);

            let data = executor(&transport, ClientOptions::default())
                .send_request(&Request::get("credits"))
                .await
                .unwrap();
            assert!(data.is_empty(), "body {body:?}");
        }
    }

    #[tokio::test]
    async fn non_object_bodies_are_keyed_by_position() {
        let transport = MockTransport::new();
        transport.push_response(StatusCode::OK, r#"["a","b"]"#);
        transport.push_response(StatusCode::OK, "12.5");
        let executor = executor(&transport, ClientOptions::default());

        let data = executor.send_request(&Request::get("x")).await.unwrap();
        assert_eq!(data.get("0"), Some(&json!("a")));
        assert_eq!(data.get("1"), Some(&json!("b")));

        let data = executor.send_request(&Request::get("x")).await.unwrap();
        assert_eq!(data.get("0"), Some(&json!(12.5)));
    }

    #[tokio::test]
    async fn malformed_body_is_decode_error() {
        let transport = MockTransport::new();
        transport.push_response(StatusCode::OK, "{not json");

        let err = executor(&transport, ClientOptions::default())
            .send_request(&Request::get("credits"))
            .await
            .unwrap_err();

        assert!(err.is_decode());
        assert!(err
            .to_string()
            .starts_with("Unable to parse response body into JSON: "));
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn zero_retries_means_single_attempt() {
        let transport = MockTransport::new();
        transport.push_status(StatusCode::INTERNAL_SERVER_ERROR);
        transport.push_json(StatusCode::OK, &json!({}));

        let err = executor(&transport, ClientOptions::new().with_max_retries(0))
            .send_request(&Request::get("credits"))
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), 500);
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn server_errors_exhaust_retries() {
        let transport = MockTransport::new();
        for _ in 0..5 {
            transport.push_status(StatusCode::INTERNAL_SERVER_ERROR);
        }

        let err = executor(&transport, ClientOptions::new().with_max_retries(3))
            .send_request(&Request::get("credits"))
            .await
            .unwrap_err();

        assert!(matches!(err, BillingClientError::Server { status: 500, .. }));
        assert!(err.to_string().contains("500 Internal Server Error"), "{err}");
        assert_eq!(transport.requests().len(), 4);
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let transport = MockTransport::new();
        transport.push_response(StatusCode::NOT_FOUND, r#"{"error":"Project not found"}"#);
        transport.push_json(StatusCode::OK, &json!({}));

        let err = executor(&transport, ClientOptions::default())
            .send_request(&Request::get("credits"))
            .await
            .unwrap_err();

        let BillingClientError::Client { status, message } = err else {
            panic!("expected a client error");
        };
        assert_eq!(status, 404);
        assert!(message.contains("404 Not Found"), "{message}");
        assert!(message.contains("Project not found"), "{message}");
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn transport_failures_are_retried() {
        let transport = MockTransport::new();
        transport.push_error(TransportErrorKind::Connect, "connection refused");
        transport.push_error(TransportErrorKind::Timeout, "operation timed out");
        transport.push_json(StatusCode::OK, &json!({ "remaining": 1 }));

        let data = executor(&transport, ClientOptions::default())
            .send_request(&Request::get("credits"))
            .await
            .unwrap();

        assert_eq!(data.get("remaining"), Some(&json!(1)));
        assert_eq!(transport.requests().len(), 3);
    }

    #[tokio::test]
    async fn transport_failure_surfaces_after_retries() {
        let transport = MockTransport::new();
        transport.push_error(TransportErrorKind::Timeout, "operation timed out");
        transport.push_error(TransportErrorKind::Timeout, "operation timed out");

        let err = executor(&transport, ClientOptions::new().with_max_retries(1))
            .send_request_without_response(&Request::get("credits"))
            .await
            .unwrap_err();

        assert!(matches!(err, BillingClientError::Transport(_)));
        assert_eq!(err.status_code(), 0);
        assert_eq!(err.to_string(), "timeout error: operation timed out");
    }

    #[tokio::test]
    async fn without_response_ignores_malformed_body() {
        let transport = MockTransport::new();
        transport.push_response(StatusCode::OK, "not json");

        executor(&transport, ClientOptions::default())
            .send_request_without_response(&Request::get("marketplaces/confirm-subscription"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn logs_one_line_per_attempt() {
        let transport = MockTransport::new();
        transport.push_status(StatusCode::SERVICE_UNAVAILABLE);
        transport.push_json(StatusCode::OK, &json!({ "remaining": "123" }));
        let logger = Arc::new(CapturingLogger::default());

        executor(
            &transport,
            ClientOptions::new()
                .with_user_agent("test agent")
                .with_logger(logger.clone()),
        )
        .send_request(&Request::get("credits"))
        .await
        .unwrap();

        let lines = logger.lines.lock().unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("example.com test agent - ["), "{}", lines[0]);
        assert!(lines[0].contains("\"GET /credits HTTP/1.1\" 503 "), "{}", lines[0]);
        assert!(lines[1].contains("\"GET /credits HTTP/1.1\" 200 "), "{}", lines[1]);
        assert_eq!(transport.requests()[0].headers[USER_AGENT], "test agent");
    }

    #[test]
    fn long_error_bodies_are_truncated() {
        let body = "x".repeat(500);
        let summary = summarize_body(body.as_bytes()).unwrap();
        assert!(summary.ends_with(" (truncated...)"));
        assert_eq!(summary.chars().filter(|c| *c == 'x').count(), BODY_SUMMARY_LIMIT);
        assert_eq!(summarize_body(b"  "), None);
    }
}
