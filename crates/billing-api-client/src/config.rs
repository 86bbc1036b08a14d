//! Client options and construction-time validation.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderName, HeaderValue};
use reqwest::Url;

use crate::error::{ConfigurationError, Violation};
use crate::log::RequestLogger;
use crate::retry::Backoff;
use crate::transport::Transport;

/// User agent sent when none is configured.
pub const DEFAULT_USER_AGENT: &str = "Billing Client";
/// Retries allowed when none are configured.
pub const DEFAULT_MAX_RETRIES: u32 = 10;
/// Upper bound accepted for `max_retries`.
pub const MAX_RETRIES_LIMIT: i64 = 100;
/// Connect-phase timeout per attempt.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Total transfer timeout per attempt.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

const NOT_A_URL: &str = "This value is not a valid URL.";
const BLANK: &str = "This value should not be blank.";
const NOT_A_NUMBER: &str = "This value should be a valid number.";
const OUT_OF_RANGE: &str = "This value should be between 0 and 100.";
const NOT_A_HEADER_NAME: &str = "This value is not a valid HTTP header name.";
const NOT_A_HEADER_VALUE: &str = "This value is not a valid HTTP header value.";
const NOT_POSITIVE: &str = "This value should be positive.";

/// Retry bound as supplied by the caller, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
enum RawMaxRetries {
    Count(i64),
    Text(String),
}

/// Timeout in seconds as supplied by the caller, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
enum RawTimeout {
    Duration(Duration),
    Text(String),
}

/// Optional client settings; anything left unset falls back to a default.
#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    max_retries: Option<RawMaxRetries>,
    user_agent: Option<String>,
    timeout: Option<RawTimeout>,
    connect_timeout: Option<RawTimeout>,
    backoff: Option<Backoff>,
    transport: Option<Arc<dyn Transport>>,
    logger: Option<Arc<dyn RequestLogger>>,
}

impl ClientOptions {
    /// Create options with every setting at its default.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load options from `BILLING_*` environment variables.
    ///
    /// Values are taken as-is and checked when the client is built, so a
    /// malformed `BILLING_MAX_RETRIES` or timeout surfaces as a configuration
    /// error.
    #[must_use]
    pub fn from_env() -> Self {
        let seconds = |name: &str| std::env::var(name).ok().map(RawTimeout::Text);

        Self {
            max_retries: std::env::var("BILLING_MAX_RETRIES")
                .ok()
                .map(RawMaxRetries::Text),
            user_agent: std::env::var("BILLING_USER_AGENT").ok(),
            timeout: seconds("BILLING_TIMEOUT_SECONDS"),
            connect_timeout: seconds("BILLING_CONNECT_TIMEOUT_SECONDS"),
            ..Self::default()
        }
    }

    /// Set how many times a failed attempt may be retried (0..=100).
    #[must_use]
    pub fn with_max_retries(mut self, retries: i64) -> Self {
        self.max_retries = Some(RawMaxRetries::Count(retries));
        self
    }

    /// Set the retry bound from unparsed text, e.g. a config file value.
    #[must_use]
    pub fn with_max_retries_text(mut self, retries: impl Into<String>) -> Self {
        self.max_retries = Some(RawMaxRetries::Text(retries.into()));
        self
    }

    /// Set the `User-Agent` header value.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Set the total transfer timeout per attempt.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(RawTimeout::Duration(timeout));
        self
    }

    /// Set the connect-phase timeout per attempt.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(RawTimeout::Duration(timeout));
        self
    }

    /// Set the delay schedule between retries.
    #[must_use]
    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = Some(backoff);
        self
    }

    /// Send requests through a custom transport instead of `reqwest`.
    ///
    /// Timeouts are then the transport's responsibility.
    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Emit one access line per attempt to the given sink.
    #[must_use]
    pub fn with_logger(mut self, logger: Arc<dyn RequestLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub(crate) fn transport(&self) -> Option<&Arc<dyn Transport>> {
        self.transport.as_ref()
    }

    pub(crate) fn logger(&self) -> Option<&Arc<dyn RequestLogger>> {
        self.logger.as_ref()
    }
}

/// Validated, immutable client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    base_url: Url,
    auth_header: HeaderName,
    auth_token: HeaderValue,
    user_agent: HeaderValue,
    max_retries: u32,
    connect_timeout: Duration,
    timeout: Duration,
    backoff: Backoff,
}

impl ClientConfig {
    /// Validate raw construction parameters.
    ///
    /// Every check runs; all violations are reported together, in the order
    /// URL syntax, URL presence, auth header, auth token, retry bound,
    /// user agent, connect timeout, transfer timeout.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] listing every invalid parameter.
    pub fn validate(
        base_url: &str,
        auth_header: &str,
        auth_token: &str,
        options: &ClientOptions,
    ) -> Result<Self, ConfigurationError> {
        let mut violations = Vec::new();

        let parsed_url = parse_base_url(base_url);
        if parsed_url.is_none() && !base_url.is_empty() {
            violations.push(Violation::new(base_url, NOT_A_URL));
        }
        if is_blank(base_url) {
            violations.push(Violation::new(base_url, BLANK));
        }

        let header_name = if is_blank(auth_header) {
            violations.push(Violation::new(auth_header, BLANK));
            None
        } else {
            let name = HeaderName::from_bytes(auth_header.as_bytes()).ok();
            if name.is_none() {
                violations.push(Violation::new(auth_header, NOT_A_HEADER_NAME));
            }
            name
        };

        let token = if is_blank(auth_token) {
            violations.push(Violation::new(auth_token, BLANK));
            None
        } else {
            let value = HeaderValue::from_str(auth_token).ok().map(|mut v| {
                v.set_sensitive(true);
                v
            });
            if value.is_none() {
                // never echo the token itself
                violations.push(Violation::new("[redacted]", NOT_A_HEADER_VALUE));
            }
            value
        };

        let max_retries = match validate_max_retries(options.max_retries.as_ref()) {
            Ok(retries) => retries,
            Err(violation) => {
                violations.push(violation);
                DEFAULT_MAX_RETRIES
            }
        };

        let user_agent = match options.user_agent.as_deref() {
            Some(agent) if !is_blank(agent) => {
                let value = HeaderValue::from_str(agent).ok();
                if value.is_none() {
                    violations.push(Violation::new(agent, NOT_A_HEADER_VALUE));
                }
                value
            }
            _ => Some(HeaderValue::from_static(DEFAULT_USER_AGENT)),
        };

        let mut timeout_or_default = |raw: Option<&RawTimeout>, default: Duration| {
            validate_timeout(raw, default).unwrap_or_else(|violation| {
                violations.push(violation);
                default
            })
        };
        let connect_timeout =
            timeout_or_default(options.connect_timeout.as_ref(), DEFAULT_CONNECT_TIMEOUT);
        let timeout = timeout_or_default(options.timeout.as_ref(), DEFAULT_TIMEOUT);

        match (parsed_url, header_name, token, user_agent) {
            (Some(base_url), Some(auth_header), Some(auth_token), Some(user_agent))
                if violations.is_empty() =>
            {
                Ok(Self {
                    base_url,
                    auth_header,
                    auth_token,
                    user_agent,
                    max_retries,
                    connect_timeout,
                    timeout,
                    backoff: options.backoff.unwrap_or_default(),
                })
            }
            _ => Err(ConfigurationError::new(violations)),
        }
    }

    /// Base URL every request path is resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Name of the header carrying the auth token.
    #[must_use]
    pub fn auth_header(&self) -> &HeaderName {
        &self.auth_header
    }

    pub(crate) fn auth_token(&self) -> &HeaderValue {
        &self.auth_token
    }

    /// `User-Agent` header value.
    #[must_use]
    pub fn user_agent(&self) -> &HeaderValue {
        &self.user_agent
    }

    /// How many times a failed attempt may be retried.
    #[must_use]
    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Connect-phase timeout per attempt.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Total transfer timeout per attempt.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Delay schedule between retries.
    #[must_use]
    pub const fn backoff(&self) -> Backoff {
        self.backoff
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Parse an absolute `http(s)` URL with a host.
fn parse_base_url(value: &str) -> Option<Url> {
    let url = Url::parse(value.trim()).ok()?;
    let supported = matches!(url.scheme(), "http" | "https");
    (supported && url.has_host()).then_some(url)
}

fn validate_max_retries(raw: Option<&RawMaxRetries>) -> Result<u32, Violation> {
    let count = match raw {
        None => return Ok(DEFAULT_MAX_RETRIES),
        Some(RawMaxRetries::Text(text)) if is_blank(text) => return Ok(DEFAULT_MAX_RETRIES),
        Some(RawMaxRetries::Text(text)) => text
            .trim()
            .parse::<i64>()
            .map_err(|_| Violation::new(text.as_str(), NOT_A_NUMBER))?,
        Some(RawMaxRetries::Count(count)) => *count,
    };

    if (0..=MAX_RETRIES_LIMIT).contains(&count) {
        u32::try_from(count).map_err(|_| Violation::new(count.to_string(), OUT_OF_RANGE))
    } else {
        Err(Violation::new(count.to_string(), OUT_OF_RANGE))
    }
}

fn validate_timeout(raw: Option<&RawTimeout>, default: Duration) -> Result<Duration, Violation> {
    let text = match raw {
        None => return Ok(default),
        Some(RawTimeout::Duration(duration)) if duration.is_zero() => {
            return Err(Violation::new("0", NOT_POSITIVE));
        }
        Some(RawTimeout::Duration(duration)) => return Ok(*duration),
        Some(RawTimeout::Text(text)) if is_blank(text) => return Ok(default),
        Some(RawTimeout::Text(text)) => text,
    };

    let seconds = text
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|s| s.is_finite())
        .ok_or_else(|| Violation::new(text.as_str(), NOT_A_NUMBER))?;
    if seconds <= 0.0 {
        return Err(Violation::new(text.as_str(), NOT_POSITIVE));
    }
    Duration::try_from_secs_f64(seconds).map_err(|_| Violation::new(text.as_str(), NOT_A_NUMBER))
}
