use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::error::FieldErrors;

/// Success envelope: `{ "data": T, ...metadata }`.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

/// Fields pulled out of an error body. Any shape is tolerated.
#[derive(Debug, Default, PartialEq)]
pub struct ErrorBody {
    pub message: Option<String>,
    pub field_errors: Option<FieldErrors>,
}

impl ErrorBody {
    pub fn parse(body: &str) -> Self {
        let Ok(JsonValue::Object(mut map)) = serde_json::from_str::<JsonValue>(body) else {
            return Self::default();
        };

        let message = match map.remove("message") {
            Some(JsonValue::String(message)) if !message.is_empty() => Some(message),
            _ => None,
        };
        let field_errors = map
            .remove("fieldErrors")
            .or_else(|| map.remove("errors"))
            .and_then(|value| serde_json::from_value::<FieldErrors>(value).ok());

        Self {
            message,
            field_errors,
        }
    }
}

pub fn is_json_content_type(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|value| value.to_ascii_lowercase().contains("application/json"))
}

#[cfg(test)]
mod tests {
    use super::{is_json_content_type, Envelope, ErrorBody};

    #[test]
    fn error_body_reads_message_and_field_errors() {
        let body = ErrorBody::parse(
            r#"{"message":"Invalid reservation","fieldErrors":{"partySize":["must be at least 1"]}}"#,
        );
        assert_eq!(body.message.as_deref(), Some("Invalid reservation"));
        let fields = body.field_errors.expect("field errors must parse");
        assert_eq!(fields["partySize"], vec!["must be at least 1".to_owned()]);
    }

    #[test]
    fn error_body_accepts_errors_key() {
        let body = ErrorBody::parse(r#"{"errors":{"email":["taken","invalid"]}}"#);
        assert_eq!(body.message, None);
        assert_eq!(body.field_errors.expect("must parse")["email"].len(), 2);
    }

    #[test]
    fn error_body_tolerates_any_shape() {
        assert_eq!(ErrorBody::parse("<html>502</html>"), ErrorBody::default());
        assert_eq!(ErrorBody::parse("[1,2]"), ErrorBody::default());
        let body = ErrorBody::parse(r#"{"message":7,"fieldErrors":"nope"}"#);
        assert_eq!(body, ErrorBody::default());
    }

    #[test]
    fn envelope_with_optional_data() {
        let envelope: Envelope<Option<u32>> =
            serde_json::from_str(r#"{"meta":{}}"#).expect("missing optional data must parse");
        assert_eq!(envelope.data, None);
    }

    #[test]
    fn json_content_type_detection() {
        assert!(is_json_content_type(Some("application/json; charset=utf-8")));
        assert!(is_json_content_type(Some("Application/JSON")));
        assert!(!is_json_content_type(Some("text/plain")));
        assert!(!is_json_content_type(None));
    }
}
