//! Validation error types shared by every generated module

use serde::{Deserialize, Serialize};

/// One schema violation, shaped after the error objects JSON Schema
/// validators conventionally report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    /// JSON pointer to the offending part of the instance (`""` for the root)
    pub instance_path: String,
    /// JSON pointer to the schema keyword that rejected the instance
    pub schema_path: String,
    /// Keyword that failed, taken from the last schema path segment
    pub keyword: String,
    /// Human readable description
    pub message: String,
}

impl ValidationIssue {
    /// Build an issue that is not tied to a location in the instance
    pub fn root(message: impl Into<String>) -> Self {
        Self {
            instance_path: String::new(),
            schema_path: String::new(),
            keyword: String::new(),
            message: message.into(),
        }
    }
}

impl<'a> From<jsonschema::ValidationError<'a>> for ValidationIssue {
    fn from(err: jsonschema::ValidationError<'a>) -> Self {
        let schema_path = err.schema_path.to_string();
        let keyword = schema_path
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();
        Self {
            instance_path: err.instance_path.to_string(),
            schema_path,
            keyword,
            message: err.to_string(),
        }
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.instance_path, self.message)
        }
    }
}

/// Error returned by `get` and friends when a value does not conform
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum ValidationError {
    /// The value failed schema validation.
    ///
    /// `message` is the JSON serialization of `issues`, so the error text can
    /// be parsed back by tooling that only sees the rendered error.
    #[error("{message}")]
    #[diagnostic(
        code(schemagen::validation),
        help("The value does not conform to schema `{schema_id}`")
    )]
    Invalid {
        /// `$id` of the schema the value was checked against
        schema_id: String,
        /// Serialized issue list
        message: String,
        /// Structured issue list
        issues: Vec<ValidationIssue>,
    },

    /// Validation passed but the value did not fit the generated type
    #[error("value accepted by schema `{schema_id}` could not be decoded: {source}")]
    #[diagnostic(
        code(schemagen::decode),
        help("The generated types are out of date with the embedded schema; regenerate them")
    )]
    Decode {
        schema_id: String,
        #[source]
        source: serde_json::Error,
    },

    /// The embedded schema itself failed to compile
    #[error("schema `{schema_id}` failed to compile: {reason}")]
    #[diagnostic(code(schemagen::schema))]
    Schema { schema_id: String, reason: String },
}

impl ValidationError {
    /// Create an `Invalid` error from a list of issues
    pub fn invalid(schema_id: impl Into<String>, issues: Vec<ValidationIssue>) -> Self {
        // Serializing a Vec of plain string structs cannot fail.
        let message = serde_json::to_string(&issues).unwrap_or_default();
        Self::Invalid {
            schema_id: schema_id.into(),
            message,
            issues,
        }
    }

    /// Structured issues for `Invalid`, empty otherwise
    pub fn issues(&self) -> &[ValidationIssue] {
        match self {
            Self::Invalid { issues, .. } => issues,
            _ => &[],
        }
    }
}
