//! Response validation for [`crate::FetchClient::request_with_schema`].

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::ValidationError;

/// Validates or coerces a decoded payload.
pub trait Schema {
    type Output;
    type Error;

    fn parse(&self, value: JsonValue) -> Result<Self::Output, Self::Error>;
}

impl<F, T, E> Schema for F
where
    F: Fn(JsonValue) -> Result<T, E>,
{
    type Output = T;
    type Error = E;

    fn parse(&self, value: JsonValue) -> Result<T, E> {
        self(value)
    }
}

/// Schema that deserializes into `T`.
#[derive(Debug)]
pub struct Typed<T>(PhantomData<fn() -> T>);

/// Builds a [`Typed`] schema for `T`.
pub fn typed<T: DeserializeOwned>() -> Typed<T> {
    Typed(PhantomData)
}

impl<T: DeserializeOwned> Schema for Typed<T> {
    type Output = T;
    type Error = ValidationError;

    fn parse(&self, value: JsonValue) -> Result<T, ValidationError> {
        serde_json::from_value(value).map_err(|err| ValidationError::new("data", err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::{typed, Schema};
    use crate::ValidationError;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Dish {
        name: String,
        price_cents: u32,
    }

    #[test]
    fn typed_schema_accepts_matching_shape() {
        let dish = typed::<Dish>()
            .parse(json!({"name": "Risotto", "price_cents": 1850}))
            .expect("dish must parse");
        assert_eq!(dish.name, "Risotto");
    }

    #[test]
    fn typed_schema_reports_mismatch() {
        let err = typed::<Dish>()
            .parse(json!({"name": "Risotto"}))
            .expect_err("missing price must fail");
        assert_eq!(err.field, "data");
        assert!(err.message.contains("price_cents"));
    }

    #[test]
    fn closures_are_schemas() {
        let non_empty = |value: serde_json::Value| match value.as_array() {
            Some(items) if !items.is_empty() => Ok(items.len()),
            _ => Err(ValidationError::new("data", "expected a non-empty list")),
        };
        assert_eq!(non_empty.parse(json!([1, 2])), Ok(2));
        assert!(non_empty.parse(json!([])).is_err());
    }
}
