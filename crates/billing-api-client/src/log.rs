//! Per-attempt access log lines.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::header::{CONTENT_LENGTH, USER_AGENT};
use reqwest::Version;

use crate::transport::{HttpRequest, HttpResponse};

/// Receives one informational line per HTTP attempt.
pub trait RequestLogger: Send + Sync + fmt::Debug {
    /// Record an informational line.
    fn info(&self, line: &str);
}

/// Forwards access lines to `tracing` at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingRequestLogger;

impl RequestLogger for TracingRequestLogger {
    fn info(&self, line: &str) {
        tracing::info!(target: "billing_api_client::http", "{line}");
    }
}

/// Format a combined-log style line for one attempt.
///
/// `<host> <user-agent> - [<timestamp>] "<METHOD> <path> HTTP/<version>" <status> <length>`
///
/// Status and length are `-` when the attempt produced no response.
pub(crate) fn access_line(
    request: &HttpRequest,
    response: Option<&HttpResponse>,
    at: DateTime<Utc>,
) -> String {
    let host = request.url.host_str().unwrap_or("-");
    let user_agent = request
        .headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");
    let resource = match request.url.query() {
        Some(query) => format!("{}?{query}", request.url.path()),
        None => request.url.path().to_string(),
    };
    let version = response.map_or("1.1", |r| version_label(r.version));
    let (status, length) = match response {
        Some(r) => (r.status.as_u16().to_string(), content_length(r)),
        None => ("-".to_string(), "-".to_string()),
    };

    format!(
        "{host} {user_agent} - [{}] \"{} {resource} HTTP/{version}\" {status} {length}",
        at.to_rfc3339_opts(SecondsFormat::Secs, true),
        request.method,
    )
}

fn content_length(response: &HttpResponse) -> String {
    response
        .headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| response.body.len().to_string(), str::to_string)
}

fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io;
    use std::sync::{Arc, Mutex};
    use reqwest::header::{HeaderMap, HeaderValue};
    use reqwest::{Method, StatusCode, Url};

    fn request() -> HttpRequest {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("test agent"));
        HttpRequest {
            method: Method::GET,
            url: Url::parse("https://example.com/credits?x=1").unwrap(),
            headers,
            body: None,
        }
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn formats_successful_attempt() {
        let response = HttpResponse::new(StatusCode::OK, r#"{"remaining":"1"}"#);
        let line = access_line(&request(), Some(&response), at());

        assert_eq!(
            line,
            "example.com test agent - [2024-05-01T12:00:00Z] \"GET /credits?x=1 HTTP/1.1\" 200 17"
        );
    }

    #[test]
    fn prefers_content_length_header() {
        let mut response = HttpResponse::new(StatusCode::OK, "");
        response.version = Version::HTTP_2;
        response
            .headers
            .insert(CONTENT_LENGTH, HeaderValue::from_static("42"));

        let line = access_line(&request(), Some(&response), at());
        assert!(line.ends_with("\"GET /credits?x=1 HTTP/2\" 200 42"), "{line}");
    }

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn tracing_logger_emits_info_event() {
        let buffer = SharedBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let line = access_line(&request(), None, at());
        tracing::subscriber::with_default(subscriber, || TracingRequestLogger.info(&line));

        let output = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("INFO"), "{output}");
        assert!(output.contains("billing_api_client::http"), "{output}");
        assert!(output.contains(&line), "{output}");
    }

    #[test]
    fn formats_failed_attempt() {
        let line = access_line(&request(), None, at());
        assert!(line.ends_with("HTTP/1.1\" - -"), "{line}");
    }
}
