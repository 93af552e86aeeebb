//! `bistro-http` is a resilient async HTTP client for restaurant site APIs
//! (menu, reservations, orders).
//!
//! [`FetchClient`] resolves endpoints against a base URL, bounds each attempt
//! with a timeout and retries server-side failures with linear backoff:
//! - [`FetchClient::request`]
//! - [`FetchClient::get`], [`FetchClient::post`], [`FetchClient::put`],
//!   [`FetchClient::patch`], [`FetchClient::delete`]
//! - [`FetchClient::request_with_schema`]

mod client;
mod error;
mod options;
mod query;
pub mod schema;
mod wire;

pub use client::{resolve_url, FetchClient};
pub use error::{ApiError, FetchError, FieldErrors, SchemaError, ValidationError};
pub use options::{ClientOptions, RequestOptions};
pub use query::{Pagination, Sort, SortOrder};
pub use reqwest::Method;
pub use schema::Schema;

pub type Result<T> = std::result::Result<T, FetchError>;
