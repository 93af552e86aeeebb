use std::collections::BTreeMap;
use std::fmt;

/// Per-field validation messages reported by the API.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Structured description of a non-success HTTP response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiError {
    /// Server-reported message, or the status text when none was given.
    pub message: String,
    /// HTTP status code.
    pub status: u16,
    /// Canonical reason phrase for `status`.
    pub status_text: String,
    /// Final URL of the response, after redirects.
    pub url: String,
    /// Field-level validation errors, when the body carried any.
    pub field_errors: Option<FieldErrors>,
}

impl ApiError {
    /// `true` for 4xx statuses.
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.status, self.message, self.url)
    }
}

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Attempt exceeded its timeout. Never retried.
    #[error("Request timeout: {url}")]
    Timeout { url: String },
    /// Non-success HTTP status.
    #[error("http error {0}")]
    Http(ApiError),
    /// Network or request execution error from `reqwest`.
    #[error("transport error: {0}")]
    Transport(reqwest::Error),
    /// Success response whose body is not well-formed JSON.
    #[error("decode error: {0}")]
    Decode(String),
    /// Success response that parsed but does not fit the requested type.
    /// Not retried: the server already acted on the request.
    #[error("unexpected response shape: {0}")]
    UnexpectedShape(String),
    /// Request could not be built (bad header, unserializable body).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl FetchError {
    pub const TIMEOUT_STATUS: u16 = 408;
    pub const TIMEOUT_MESSAGE: &'static str = "Request timeout";
    pub const TIMEOUT_STATUS_TEXT: &'static str = "Request Timeout";

    /// HTTP status associated with the error, if any.
    ///
    /// Timeouts report `408`.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Timeout { .. } => Some(Self::TIMEOUT_STATUS),
            Self::Http(err) => Some(err.status),
            Self::Transport(err) => err.status().map(|status| status.as_u16()),
            Self::Decode(_) | Self::UnexpectedShape(_) | Self::InvalidRequest(_) => None,
        }
    }

    /// Reason phrase matching [`FetchError::status`].
    pub fn status_text(&self) -> Option<&str> {
        match self {
            Self::Timeout { .. } => Some(Self::TIMEOUT_STATUS_TEXT),
            Self::Http(err) => Some(&err.status_text),
            _ => None,
        }
    }

    /// Human-readable message suitable for display.
    pub fn message(&self) -> String {
        match self {
            Self::Timeout { .. } => Self::TIMEOUT_MESSAGE.to_owned(),
            Self::Http(err) => err.message.clone(),
            other => other.to_string(),
        }
    }

    /// Field-level errors from a 4xx/5xx body.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Http(err) => err.field_errors.as_ref(),
            _ => None,
        }
    }

    /// URL the failing attempt targeted.
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Timeout { url } => Some(url),
            Self::Http(err) => Some(&err.url),
            Self::Transport(err) => err.url().map(|url| url.as_str()),
            Self::Decode(_) | Self::UnexpectedShape(_) | Self::InvalidRequest(_) => None,
        }
    }

    /// Whether another attempt may succeed.
    ///
    /// Timeouts, 4xx responses, mistyped success bodies and malformed
    /// requests are final.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::UnexpectedShape(_) | Self::InvalidRequest(_) => false,
            Self::Http(err) => !err.is_client_error(),
            Self::Transport(_) | Self::Decode(_) => true,
        }
    }
}

/// Error returned by [`crate::FetchClient::request_with_schema`].
#[derive(Debug, thiserror::Error)]
pub enum SchemaError<E> {
    #[error(transparent)]
    Fetch(FetchError),
    /// The schema rejected the payload; carried through untouched.
    #[error("validation failed: {0}")]
    Validation(E),
}

impl<E> From<FetchError> for SchemaError<E> {
    fn from(err: FetchError) -> Self {
        Self::Fetch(err)
    }
}

/// A single rejected input.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}
