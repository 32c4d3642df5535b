//! The `integer` type of generated modules

use serde::{Deserialize, Serialize};
use serde_json::Number;
use std::fmt;

/// A JSON Schema `integer`.
///
/// The `integer` type accepts any number with a zero fractional part, so
/// `1.0` and values past `i64::MAX` validate. This keeps the number as given
/// and decodes whatever the validator let through; use the accessors to get
/// a machine integer out.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Integer(Number);

impl Integer {
    /// The value as an `i64`, if it is integral and in range
    pub fn as_i64(&self) -> Option<i64> {
        self.0.as_i64().or_else(|| {
            let f = self.0.as_f64()?;
            // i64::MIN as f64 is exact, i64::MAX as f64 rounds up to 2^63
            (f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64).then_some(f as i64)
        })
    }

    /// The value as a `u64`, if it is integral and in range
    pub fn as_u64(&self) -> Option<u64> {
        self.0.as_u64().or_else(|| {
            let f = self.0.as_f64()?;
            (f.fract() == 0.0 && f >= 0.0 && f < u64::MAX as f64).then_some(f as u64)
        })
    }

    /// The value as an `f64`, possibly losing precision
    pub fn as_f64(&self) -> Option<f64> {
        self.0.as_f64()
    }

    pub fn as_number(&self) -> &Number {
        &self.0
    }
}

impl From<i64> for Integer {
    fn from(value: i64) -> Self {
        Self(Number::from(value))
    }
}

impl From<u64> for Integer {
    fn from(value: u64) -> Self {
        Self(Number::from(value))
    }
}

impl From<Integer> for Number {
    fn from(value: Integer) -> Self {
        value.0
    }
}

impl fmt::Display for Integer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::CompiledValidator;
    use serde_json::json;

    static COUNTER: CompiledValidator = CompiledValidator::embedded(
        "counter",
        r#"{ "$id": "counter", "type": "object", "properties": { "n": { "type": "integer" } }, "required": ["n"] }"#,
        &[],
    );

    #[derive(Debug, Deserialize)]
    struct Counter {
        n: Integer,
    }

    #[test]
    fn decodes_every_value_the_validator_accepts() {
        for value in [json!({ "n": 1.0 }), json!({ "n": u64::MAX }), json!({ "n": i64::MIN }), json!({ "n": 7 })] {
            assert!(COUNTER.validate(&value), "{value} should validate");
            COUNTER
                .get::<Counter>(value.clone())
                .unwrap_or_else(|e| panic!("{value} should decode: {e}"));
        }
        assert!(!COUNTER.validate(&json!({ "n": 1.5 })));
    }

    #[test]
    fn accessors() {
        let one: Counter = COUNTER.get(json!({ "n": 1.0 })).expect("integral float");
        assert_eq!(one.n.as_i64(), Some(1));
        assert_eq!(one.n.as_u64(), Some(1));

        let max: Counter = COUNTER.get(json!({ "n": u64::MAX })).expect("u64 range");
        assert_eq!(max.n.as_u64(), Some(u64::MAX));
        assert_eq!(max.n.as_i64(), None);

        assert_eq!(Integer::from(-3i64).as_u64(), None);
        assert_eq!(Integer::from(42u64).to_string(), "42");
    }
}
