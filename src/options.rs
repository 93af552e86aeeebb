use std::collections::BTreeMap;

use reqwest::Method;

/// Process-wide endpoint, timeout and retry defaults.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClientOptions {
    /// Prefix for relative endpoints.
    pub base_url: String,
    /// Per-attempt timeout in milliseconds.
    pub timeout_ms: u64,
    /// Maximum number of retries after the initial attempt.
    pub max_retries: usize,
    /// Base retry delay in milliseconds (linear strategy).
    pub retry_delay_ms: u64,
}

impl ClientOptions {
    pub const DEFAULT_BASE_URL: &'static str = "http://localhost:3000/api";

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn retry_delay_ms(mut self, retry_delay_ms: u64) -> Self {
        self.retry_delay_ms = retry_delay_ms;
        self
    }

    /// Reads defaults from the environment.
    ///
    /// Reads:
    /// - `API_URL` — base URL for relative endpoints
    /// - `API_TIMEOUT_MS` — per-attempt timeout
    /// - `API_RETRY_ATTEMPTS` — retries after the first attempt
    /// - `API_RETRY_DELAY_MS` — base backoff delay
    ///
    /// Unset variables keep their defaults. Empty or malformed values are
    /// rejected.
    ///
    /// **Not available on `wasm32` targets.**
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_env() -> std::result::Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> std::result::Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut options = Self::default();
        if let Some(url) = lookup("API_URL") {
            if url.trim().is_empty() {
                return Err("API_URL is set but empty".to_owned());
            }
            options.base_url = url.trim().to_owned();
        }
        if let Some(value) = lookup("API_TIMEOUT_MS") {
            options.timeout_ms = parse_var("API_TIMEOUT_MS", &value)?;
            if options.timeout_ms == 0 {
                return Err("API_TIMEOUT_MS must be positive".to_owned());
            }
        }
        if let Some(value) = lookup("API_RETRY_ATTEMPTS") {
            options.max_retries = parse_var("API_RETRY_ATTEMPTS", &value)?;
        }
        if let Some(value) = lookup("API_RETRY_DELAY_MS") {
            options.retry_delay_ms = parse_var("API_RETRY_DELAY_MS", &value)?;
        }
        Ok(options)
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> std::result::Result<T, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(format!("{key} is set but empty"));
    }
    trimmed
        .parse()
        .map_err(|_| format!("{key} must be a non-negative integer, got '{trimmed}'"))
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: Self::DEFAULT_BASE_URL.to_owned(),
            timeout_ms: 30_000,
            max_retries: 3,
            retry_delay_ms: 1_000,
        }
    }
}

/// Per-call settings. Unset fields fall back to [`ClientOptions`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RequestOptions {
    pub method: Option<Method>,
    pub headers: BTreeMap<String, String>,
    /// Serialized request body.
    pub body: Option<String>,
    pub query: Vec<(String, String)>,
    pub timeout_ms: Option<u64>,
    pub max_retries: Option<usize>,
    pub retry_delay_ms: Option<u64>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Adds a header. Later values for the same name replace earlier ones.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Sets a pre-serialized body.
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Appends a query-string pair.
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    pub fn retry_delay_ms(mut self, retry_delay_ms: u64) -> Self {
        self.retry_delay_ms = Some(retry_delay_ms);
        self
    }
}

impl From<()> for RequestOptions {
    fn from(_: ()) -> Self {
        Self::default()
    }
}
