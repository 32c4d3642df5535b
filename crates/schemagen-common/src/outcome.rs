//! Tagged success/error values
//!
//! Payloads crossing a wire boundary often arrive either as a record or as an
//! `{ "error": ... }` object. [`is_error`] is the structural check on raw
//! JSON; [`Outcome`] is the typed form callers should work with once decoded.

use crate::binding::SchemaBinding;
use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// True iff `value` is an object with a present, non-null `error` field
pub fn is_error(value: &Value) -> bool {
    value.get("error").is_some_and(|error| !error.is_null())
}

/// The error half of an [`Outcome`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Contents of the `error` field
    pub error: Value,
}

/// Either a validated record or an error payload
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Ok(T),
    Err(ErrorDetail),
}

impl<T> Outcome<T> {
    /// Decode a raw value through binding `B`.
    ///
    /// Error-shaped values become [`Outcome::Err`] without touching the
    /// validator; anything else must validate against `B`'s schema.
    pub fn from_value<B>(value: Value) -> Result<Self, ValidationError>
    where
        B: SchemaBinding<Output = T> + ?Sized,
    {
        if is_error(&value) {
            let error = match value {
                Value::Object(mut map) => map.remove("error").unwrap_or(Value::Null),
                _ => Value::Null,
            };
            return Ok(Outcome::Err(ErrorDetail { error }));
        }
        B::get(value).map(Outcome::Ok)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Outcome::Err(_))
    }

    pub fn is_ok(&self) -> bool {
        !self.is_error()
    }

    pub fn ok(self) -> Option<T> {
        match self {
            Outcome::Ok(value) => Some(value),
            Outcome::Err(_) => None,
        }
    }

    pub fn into_result(self) -> Result<T, ErrorDetail> {
        self.into()
    }
}

impl<T> From<Outcome<T>> for Result<T, ErrorDetail> {
    fn from(outcome: Outcome<T>) -> Self {
        match outcome {
            Outcome::Ok(value) => Ok(value),
            Outcome::Err(detail) => Err(detail),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::CompiledValidator;
    use serde_json::json;

    static COUNTER: CompiledValidator = CompiledValidator::embedded(
        "counter",
        r#"{ "$id": "counter", "type": "object", "properties": { "count": { "type": "integer" } }, "required": ["count"] }"#,
        &[],
    );

    #[derive(Debug, PartialEq, Deserialize)]
    struct Counter {
        count: i64,
    }

    struct CounterSchema;

    impl SchemaBinding for CounterSchema {
        const ID: &'static str = "counter";
        type Output = Counter;

        fn validator() -> &'static CompiledValidator {
            &COUNTER
        }
    }

    #[test]
    fn is_error_checks_presence_and_non_null() {
        assert!(is_error(&json!({ "error": "x" })));
        assert!(is_error(&json!({ "error": { "code": 4 } })));
        assert!(!is_error(&json!({})));
        assert!(!is_error(&json!({ "error": null })));
        assert!(!is_error(&json!("error")));
        assert!(!is_error(&json!([{ "error": 1 }])));
    }

    #[test]
    fn outcome_from_error_payload() {
        let outcome = Outcome::<Counter>::from_value::<CounterSchema>(json!({ "error": "boom" }))
            .expect("error payloads are not validated");
        assert!(outcome.is_error());
        assert_eq!(
            outcome.into_result(),
            Err(ErrorDetail {
                error: json!("boom")
            })
        );
    }

    #[test]
    fn outcome_from_record() {
        let outcome = Outcome::<Counter>::from_value::<CounterSchema>(json!({ "count": 2 }))
            .expect("valid");
        assert_eq!(outcome.ok(), Some(Counter { count: 2 }));
    }

    #[test]
    fn outcome_null_error_is_validated_as_record() {
        let err = Outcome::<Counter>::from_value::<CounterSchema>(json!({ "error": null }))
            .expect_err("missing count");
        assert!(matches!(err, ValidationError::Invalid { .. }));
    }
}
