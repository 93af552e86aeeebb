use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use reqwest::{
    header::{self, HeaderMap, HeaderName, HeaderValue},
    Method, StatusCode,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{error::Category, Value as JsonValue};

// tokio::time::sleep is only available on non-WASM targets.
#[cfg(not(target_arch = "wasm32"))]
use tokio::time::sleep;

use crate::{
    schema::Schema,
    wire::{is_json_content_type, Envelope, ErrorBody},
    ApiError, ClientOptions, FetchError, RequestOptions, Result, SchemaError,
};

const FALLBACK_ERROR_MESSAGE: &str = "An error occurred";

/// Resolves an endpoint against the configured base URL.
///
/// Absolute URLs (`scheme://...`) are returned unchanged:
///
/// `("http://localhost:3000/api", "/orders/42")` → `"http://localhost:3000/api/orders/42"`
pub fn resolve_url(base_url: &str, endpoint: &str) -> String {
    if has_scheme(endpoint) {
        return endpoint.to_owned();
    }
    let base = base_url.trim_end_matches('/');
    if endpoint.is_empty() || endpoint.starts_with('/') || endpoint.starts_with('?') {
        format!("{base}{endpoint}")
    } else {
        format!("{base}/{endpoint}")
    }
}

fn has_scheme(endpoint: &str) -> bool {
    let Some((scheme, _)) = endpoint.split_once("://") else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Delay before the retry that follows attempt `attempt` (0-based).
pub(crate) fn backoff_delay(retry_delay_ms: u64, attempt: usize) -> Duration {
    let multiplier = u64::try_from(attempt).unwrap_or(u64::MAX).saturating_add(1);
    Duration::from_millis(retry_delay_ms.saturating_mul(multiplier))
}

/// Outcome of a single attempt, consumed by the retry loop.
enum Attempt<T> {
    Success(T),
    Recoverable(FetchError),
    Terminal(FetchError),
}

/// Fully resolved request. Not modified once the first attempt starts.
#[derive(Debug)]
struct Plan {
    url: String,
    method: Method,
    headers: HeaderMap,
    body: Option<String>,
    query: Vec<(String, String)>,
    timeout: Duration,
    max_retries: usize,
    retry_delay_ms: u64,
}

/// HTTP client with per-attempt timeouts and linear-backoff retries.
#[derive(Clone)]
pub struct FetchClient {
    http: reqwest::Client,
    options: ClientOptions,
}

impl fmt::Debug for FetchClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchClient")
            .field("options", &self.options)
            .finish()
    }
}

impl Default for FetchClient {
    fn default() -> Self {
        Self::new(ClientOptions::default())
    }
}

impl FetchClient {
    /// Creates a client with the given defaults.
    pub fn new(options: ClientOptions) -> Self {
        Self {
            http: reqwest::Client::new(),
            options,
        }
    }

    /// Creates a client configured from `API_*` environment variables.
    ///
    /// See [`ClientOptions::from_env`].
    ///
    /// # Example
    ///
    /// ```no_run
    /// use bistro_http::FetchClient;
    ///
    /// let api = FetchClient::from_env().expect("invalid API_* env vars");
    /// ```
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_env() -> std::result::Result<Self, String> {
        ClientOptions::from_env().map(Self::new)
    }

    /// Replaces the underlying `reqwest` client.
    pub fn with_http(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Sends a request and decodes the response.
    ///
    /// JSON responses are unwrapped from their `{ "data": ... }` envelope;
    /// any other body is handed to `T` as a JSON string, so `String` receives
    /// the raw text.
    ///
    /// Timeouts, 4xx responses and success bodies that do not fit `T` fail
    /// immediately. Server errors, transport failures and malformed JSON
    /// bodies are retried up to `max_retries` times,
    /// waiting `retry_delay_ms * n` before the n-th retry.
    pub async fn request<T, O>(&self, endpoint: &str, options: O) -> Result<T>
    where
        T: DeserializeOwned,
        O: Into<RequestOptions>,
    {
        let plan = self.plan(endpoint, options.into())?;
        self.run(&plan).await
    }

    pub async fn get<T, O>(&self, endpoint: &str, options: O) -> Result<T>
    where
        T: DeserializeOwned,
        O: Into<RequestOptions>,
    {
        self.request(endpoint, options.into().method(Method::GET)).await
    }

    /// Serializes `body` as JSON and sends it with `POST`.
    pub async fn post<T, B, O>(&self, endpoint: &str, body: &B, options: O) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
        O: Into<RequestOptions>,
    {
        self.send_json(Method::POST, endpoint, body, options.into()).await
    }

    pub async fn put<T, B, O>(&self, endpoint: &str, body: &B, options: O) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
        O: Into<RequestOptions>,
    {
        self.send_json(Method::PUT, endpoint, body, options.into()).await
    }

    pub async fn patch<T, B, O>(&self, endpoint: &str, body: &B, options: O) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
        O: Into<RequestOptions>,
    {
        self.send_json(Method::PATCH, endpoint, body, options.into()).await
    }

    pub async fn delete<T, O>(&self, endpoint: &str, options: O) -> Result<T>
    where
        T: DeserializeOwned,
        O: Into<RequestOptions>,
    {
        self.request(endpoint, options.into().method(Method::DELETE)).await
    }

    /// Sends a request and runs the decoded payload through `schema`.
    ///
    /// Schema failures come back as [`SchemaError::Validation`] exactly as the
    /// schema produced them.
    pub async fn request_with_schema<S, O>(
        &self,
        endpoint: &str,
        schema: &S,
        options: O,
    ) -> std::result::Result<S::Output, SchemaError<S::Error>>
    where
        S: Schema,
        O: Into<RequestOptions>,
    {
        let value: JsonValue = self.request(endpoint, options).await?;
        schema.parse(value).map_err(SchemaError::Validation)
    }

    async fn send_json<T, B>(
        &self,
        method: Method,
        endpoint: &str,
        body: &B,
        options: RequestOptions,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_string(body).map_err(|err| {
            FetchError::InvalidRequest(format!("request body is not serializable: {err}"))
        })?;
        self.request(endpoint, options.method(method).body(body)).await
    }

    fn plan(&self, endpoint: &str, options: RequestOptions) -> Result<Plan> {
        let timeout_ms = options.timeout_ms.unwrap_or(self.options.timeout_ms);
        if timeout_ms == 0 {
            return Err(FetchError::InvalidRequest(
                "timeout must be positive".to_owned(),
            ));
        }

        Ok(Plan {
            url: resolve_url(&self.options.base_url, endpoint),
            method: options.method.unwrap_or(Method::GET),
            headers: build_headers(&options.headers)?,
            body: options.body,
            query: options.query,
            timeout: Duration::from_millis(timeout_ms),
            max_retries: options.max_retries.unwrap_or(self.options.max_retries),
            retry_delay_ms: options.retry_delay_ms.unwrap_or(self.options.retry_delay_ms),
        })
    }

    async fn run<T: DeserializeOwned>(&self, plan: &Plan) -> Result<T> {
        let mut attempt = 0usize;
        loop {
            #[cfg(feature = "tracing")]
            tracing::debug!(method = %plan.method, url = %plan.url, attempt, "sending request");

            match self.attempt(plan).await {
                Attempt::Success(value) => return Ok(value),
                Attempt::Recoverable(_err) if attempt < plan.max_retries => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(url = %plan.url, attempt, error = %_err, "attempt failed, retrying");

                    wait_before_retry(plan.retry_delay_ms, attempt).await;
                    attempt += 1;
                }
                Attempt::Recoverable(err) | Attempt::Terminal(err) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(method = %plan.method, url = %plan.url, attempts = attempt + 1, error = %err, "request failed");
                    return Err(err);
                }
            }
        }
    }

    async fn attempt<T: DeserializeOwned>(&self, plan: &Plan) -> Attempt<T> {
        // On WASM, reqwest uses AbortController for timeout; the `.timeout()`
        // method is available on both targets and also bounds the body read.
        let mut builder = self
            .http
            .request(plan.method.clone(), &plan.url)
            .headers(plan.headers.clone())
            .timeout(plan.timeout);
        if !plan.query.is_empty() {
            builder = builder.query(&plan.query);
        }
        if let Some(body) = &plan.body {
            builder = builder.body(body.clone());
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(err) => return classify_transport(err, &plan.url),
        };

        let status = response.status();
        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => return classify_transport(err, &plan.url),
        };

        if !status.is_success() {
            let err = build_api_error(status, final_url, &body);
            return if err.is_client_error() {
                Attempt::Terminal(FetchError::Http(err))
            } else {
                Attempt::Recoverable(FetchError::Http(err))
            };
        }

        match decode_success(content_type.as_deref(), body) {
            Ok(value) => Attempt::Success(value),
            Err(err) if err.is_retryable() => Attempt::Recoverable(err),
            Err(err) => Attempt::Terminal(err),
        }
    }
}

/// Waits before the next attempt.
///
/// On native targets via `tokio::time::sleep`; on WASM via `futures-timer`,
/// which schedules on the browser event loop.
async fn wait_before_retry(retry_delay_ms: u64, attempt: usize) {
    let delay = backoff_delay(retry_delay_ms, attempt);

    #[cfg(feature = "tracing")]
    tracing::debug!("retrying request after {} ms", delay.as_millis());

    #[cfg(not(target_arch = "wasm32"))]
    sleep(delay).await;

    #[cfg(target_arch = "wasm32")]
    futures_timer::Delay::new(delay).await;
}

fn classify_transport<T>(err: reqwest::Error, url: &str) -> Attempt<T> {
    if err.is_timeout() {
        Attempt::Terminal(FetchError::Timeout {
            url: url.to_owned(),
        })
    } else if err.is_builder() {
        Attempt::Terminal(FetchError::InvalidRequest(err.to_string()))
    } else {
        Attempt::Recoverable(FetchError::Transport(err))
    }
}

/// `Content-Type: application/json` plus caller headers; caller values win.
fn build_headers(custom: &BTreeMap<String, String>) -> Result<HeaderMap> {
    let mut headers = HeaderMap::with_capacity(custom.len() + 1);
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    for (name, value) in custom {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| FetchError::InvalidRequest(format!("invalid header name '{name}'")))?;
        let value = HeaderValue::from_str(value).map_err(|_| {
            FetchError::InvalidRequest(format!("invalid value for header '{}'", name.as_str()))
        })?;
        headers.insert(name, value);
    }
    Ok(headers)
}

fn build_api_error(status: StatusCode, url: String, body: &str) -> ApiError {
    let parsed = ErrorBody::parse(body);
    let status_text = status.canonical_reason().unwrap_or_default().to_owned();
    let message = parsed
        .message
        .or_else(|| (!status_text.is_empty()).then(|| status_text.clone()))
        .unwrap_or_else(|| FALLBACK_ERROR_MESSAGE.to_owned());

    ApiError {
        message,
        status: status.as_u16(),
        status_text,
        url,
        field_errors: parsed.field_errors,
    }
}

/// Malformed JSON is recoverable; a well-formed body that does not fit `T`
/// is final.
fn decode_success<T: DeserializeOwned>(content_type: Option<&str>, body: String) -> Result<T> {
    if is_json_content_type(content_type) {
        return serde_json::from_str::<Envelope<T>>(&body)
            .map(|envelope| envelope.data)
            .map_err(|err| match err.classify() {
                Category::Syntax | Category::Eof | Category::Io => {
                    FetchError::Decode(format!("invalid response JSON: {err}; body: {body}"))
                }
                Category::Data => FetchError::UnexpectedShape(format!("{err}; body: {body}")),
            });
    }

    serde_json::from_value(JsonValue::String(body))
        .map_err(|err| FetchError::UnexpectedShape(format!("text response: {err}")))
}
