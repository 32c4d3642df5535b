//! Lazily compiled validator over a schema embedded in a generated module

use crate::error::{ValidationError, ValidationIssue};
use jsonschema::{Retrieve, Uri, Validator};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock, PoisonError};

/// Base URI `jsonschema` resolves relative `$id`s against
const DEFAULT_BASE: &str = "json-schema:///";

/// Resolves cross-schema `$ref`s against the schemas embedded next to the
/// main one. Never touches the network.
pub struct EmbeddedRetriever {
    schemas: HashMap<String, Value>,
}

impl EmbeddedRetriever {
    pub fn new(schemas: impl IntoIterator<Item = (String, Value)>) -> Self {
        Self {
            schemas: schemas.into_iter().collect(),
        }
    }

    pub fn lookup(&self, uri: &str) -> Option<&Value> {
        if let Some(value) = self.schemas.get(uri) {
            return Some(value);
        }

        let relative = uri.strip_prefix(DEFAULT_BASE).unwrap_or(uri);
        let relative = relative.split('#').next().unwrap_or(relative);
        if let Some(value) = self.schemas.get(relative) {
            return Some(value);
        }

        // Bare last segment, for ids written as paths or URLs
        let last = relative.rsplit('/').next().unwrap_or(relative);
        self.schemas.get(last)
    }
}

impl Retrieve for EmbeddedRetriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        self.lookup(uri.as_str())
            .cloned()
            .ok_or_else(|| format!("schema `{}` is not embedded in this module", uri.as_str()).into())
    }
}

/// A validator compiled on first use from embedded schema text.
///
/// Failures populate a shared "last errors" slot, readable through
/// [`CompiledValidator::last_errors`]. The slot is overwritten by every call,
/// so concurrent callers should prefer the issue list carried by
/// [`ValidationError`] from [`CompiledValidator::get`].
pub struct CompiledValidator {
    id: &'static str,
    schema: &'static str,
    related: &'static [(&'static str, &'static str)],
    compiled: OnceLock<Result<Validator, String>>,
    last_errors: Mutex<Option<Vec<ValidationIssue>>>,
}

impl CompiledValidator {
    /// Declare a validator over `schema`, with `related` holding
    /// `($id, schema text)` pairs for every schema reachable via `$ref`.
    pub const fn embedded(
        id: &'static str,
        schema: &'static str,
        related: &'static [(&'static str, &'static str)],
    ) -> Self {
        Self {
            id,
            schema,
            related,
            compiled: OnceLock::new(),
            last_errors: Mutex::new(None),
        }
    }

    /// `$id` of the main schema
    pub fn id(&self) -> &'static str {
        self.id
    }

    /// Raw embedded schema text
    pub fn schema_text(&self) -> &'static str {
        self.schema
    }

    fn compiled(&self) -> &Result<Validator, String> {
        self.compiled.get_or_init(|| compile(self.schema, self.related))
    }

    /// Validate `value` and return the issue list on failure.
    ///
    /// The last-errors slot is updated either way.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip(self, value), fields(schema = self.id)))]
    pub fn check(&self, value: &Value) -> Result<(), Vec<ValidationIssue>> {
        let issues = match self.compiled() {
            Ok(validator) => validator
                .iter_errors(value)
                .map(ValidationIssue::from)
                .collect::<Vec<_>>(),
            Err(reason) => vec![ValidationIssue::root(reason.clone())],
        };

        let mut slot = self.last_errors.lock().unwrap_or_else(PoisonError::into_inner);
        if issues.is_empty() {
            *slot = None;
            Ok(())
        } else {
            #[cfg(feature = "tracing")]
            tracing::debug!(count = issues.len(), "value rejected");
            *slot = Some(issues.clone());
            Err(issues)
        }
    }

    /// Boolean validation; see [`CompiledValidator::last_errors`] for details
    pub fn validate(&self, value: &Value) -> bool {
        self.check(value).is_ok()
    }

    /// Issues recorded by the most recent failed validation, `None` if the
    /// last validation passed or none has run yet
    pub fn last_errors(&self) -> Option<Vec<ValidationIssue>> {
        self.last_errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Validate and hand `value` back unchanged
    pub fn accept(&self, value: Value) -> Result<Value, ValidationError> {
        if let Err(reason) = self.compiled() {
            return Err(ValidationError::Schema {
                schema_id: self.id.to_string(),
                reason: reason.clone(),
            });
        }
        match self.check(&value) {
            Ok(()) => Ok(value),
            Err(issues) => Err(ValidationError::invalid(self.id, issues)),
        }
    }

    /// Validate and decode `value` into the generated type
    pub fn get<T: DeserializeOwned>(&self, value: Value) -> Result<T, ValidationError> {
        let value = self.accept(value)?;
        serde_json::from_value(value).map_err(|source| ValidationError::Decode {
            schema_id: self.id.to_string(),
            source,
        })
    }
}

impl std::fmt::Debug for CompiledValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledValidator")
            .field("id", &self.id)
            .field("related", &self.related.len())
            .field("compiled", &self.compiled.get().map(|r| r.is_ok()))
            .finish()
    }
}

fn compile(schema: &str, related: &[(&str, &str)]) -> Result<Validator, String> {
    let schema: Value = serde_json::from_str(schema).map_err(|e| e.to_string())?;

    let mut embedded = Vec::with_capacity(related.len());
    for (id, text) in related {
        let value: Value =
            serde_json::from_str(text).map_err(|e| format!("related schema `{id}`: {e}"))?;
        embedded.push((id.to_string(), value));
    }

    build_validator(&schema, embedded)
}

/// Compile `schema`, resolving `$ref`s to other schemas only against
/// `related` (`$id`, schema) pairs
pub fn build_validator(
    schema: &Value,
    related: impl IntoIterator<Item = (String, Value)>,
) -> Result<Validator, String> {
    jsonschema::options()
        .with_retriever(EmbeddedRetriever::new(related))
        .build(schema)
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    const TOKEN: &str = r#"{
        "$id": "token",
        "type": "object",
        "properties": {
            "mint": { "type": "string" },
            "amount": { "type": "integer", "minimum": 0 }
        },
        "required": ["mint", "amount"],
        "additionalProperties": false
    }"#;

    const HOLDER: &str = r#"{
        "$id": "holder",
        "type": "object",
        "properties": {
            "owner": { "type": "string" },
            "token": { "$ref": "token" }
        },
        "required": ["owner", "token"]
    }"#;

    static TOKEN_VALIDATOR: CompiledValidator = CompiledValidator::embedded("token", TOKEN, &[]);
    static HOLDER_VALIDATOR: CompiledValidator =
        CompiledValidator::embedded("holder", HOLDER, &[("token", TOKEN)]);
    static BROKEN: CompiledValidator =
        CompiledValidator::embedded("broken", r#"{ "type": 12 }"#, &[]);

    #[derive(Debug, Deserialize, PartialEq)]
    struct Token {
        mint: String,
        amount: i64,
    }

    #[test]
    fn validate_records_last_errors() {
        let validator = CompiledValidator::embedded("token", TOKEN, &[]);
        assert!(validator.last_errors().is_none());

        assert!(!validator.validate(&json!({ "mint": "abc", "amount": -1 })));
        let errors = validator.last_errors().expect("errors recorded");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].instance_path, "/amount");
        assert_eq!(errors[0].keyword, "minimum");

        assert!(validator.validate(&json!({ "mint": "abc", "amount": 3 })));
        assert!(validator.last_errors().is_none());
    }

    #[test]
    fn get_returns_typed_value_or_serialized_errors() {
        let token: Token = TOKEN_VALIDATOR
            .get(json!({ "mint": "abc", "amount": 3 }))
            .expect("valid token");
        assert_eq!(
            token,
            Token {
                mint: "abc".into(),
                amount: 3
            }
        );

        let err = TOKEN_VALIDATOR
            .get::<Token>(json!({ "mint": "abc" }))
            .expect_err("missing amount");
        let issues: Vec<ValidationIssue> =
            serde_json::from_str(&err.to_string()).expect("json message");
        assert_eq!(issues, err.issues());
        assert!(issues.iter().any(|i| i.keyword == "required"));
    }

    #[test]
    fn accept_returns_value_unchanged() {
        let value = json!({ "mint": "abc", "amount": 0 });
        assert_eq!(TOKEN_VALIDATOR.accept(value.clone()).expect("valid"), value);
    }

    #[test]
    fn closed_schema_rejects_unknown_keys() {
        assert!(!TOKEN_VALIDATOR.validate(&json!({ "mint": "abc", "amount": 1, "extra": true })));
    }

    #[test]
    fn cross_schema_refs_resolve_from_embedded_schemas() {
        assert!(HOLDER_VALIDATOR.validate(&json!({
            "owner": "me",
            "token": { "mint": "abc", "amount": 1 }
        })));
        assert!(!HOLDER_VALIDATOR.validate(&json!({
            "owner": "me",
            "token": { "mint": "abc" }
        })));
    }

    #[test]
    fn broken_schema_surfaces_as_schema_error() {
        assert!(!BROKEN.validate(&json!(1)));
        assert!(BROKEN.last_errors().is_some());
        let err = BROKEN.accept(json!(1)).expect_err("schema does not compile");
        assert!(matches!(err, ValidationError::Schema { .. }));
    }

    #[test]
    fn retriever_lookup_variants() {
        let retriever = EmbeddedRetriever::new([("token".to_string(), json!({ "$id": "token" }))]);
        assert!(retriever.lookup("token").is_some());
        assert!(retriever.lookup("json-schema:///token").is_some());
        assert!(retriever.lookup("https://example.com/schemas/token").is_some());
        assert!(retriever.lookup("json-schema:///other").is_none());
    }
}
