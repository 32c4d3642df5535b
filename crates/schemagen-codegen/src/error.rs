use miette::{Diagnostic, SourceSpan};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while generating validator modules
#[derive(Debug, Error, Diagnostic)]
pub enum CodegenError {
    /// IO error when reading schemas or writing generated modules
    #[error("IO error: {0}")]
    #[diagnostic(code(schemagen::io))]
    Io(#[from] io::Error),

    /// Failed to parse schema JSON
    #[error("Failed to parse schema JSON in {}", path.display())]
    #[diagnostic(
        code(schemagen::parse_error),
        help("Check that the file is valid JSON holding a schema object or an array of schemas")
    )]
    ParseError {
        #[source]
        source: serde_json::Error,
        /// Path to the file that failed to parse
        path: PathBuf,
        /// Source text that failed to parse
        #[source_code]
        src: Option<String>,
        /// Location of the error in the source
        #[label("parse error here")]
        span: Option<SourceSpan>,
    },

    /// A schema document without a string `$id`
    #[error("Schema document has no string `$id` ({origin})")]
    #[diagnostic(
        code(schemagen::missing_id),
        help("Every schema needs a unique `$id`; it names the generated module and its export")
    )]
    MissingId {
        /// Where the document came from (file path or array position)
        origin: String,
    },

    /// The schema failed to compile as JSON Schema
    #[error("Invalid schema `{schema_id}`: {message}")]
    #[diagnostic(code(schemagen::invalid_schema))]
    InvalidSchema { schema_id: String, message: String },

    /// Reference to a schema or definition that is not registered
    #[error("Reference to unknown schema: {ref_string}")]
    #[diagnostic(
        code(schemagen::unknown_ref),
        help("Add the referenced schema to the input set, or check the definitions pointer")
    )]
    UnknownRef {
        /// The `$ref` string that couldn't be resolved
        ref_string: String,
        /// `$id` of the schema containing the ref
        schema_id: String,
    },

    /// Unsupported schema feature
    #[error("Unsupported feature: {feature}")]
    #[diagnostic(
        code(schemagen::unsupported),
        help("This schema feature is not yet supported by the code generator")
    )]
    Unsupported {
        /// Description of the unsupported feature
        feature: String,
        /// `$id` of the schema containing the feature
        schema_id: String,
        /// Optional suggestion for workaround
        suggestion: Option<String>,
    },

    /// Two schemas would be written to the same module file
    #[error("Name collision: {name}")]
    #[diagnostic(
        code(schemagen::name_collision),
        help("Distinct `$id`s sanitize to the same module name; rename one of them")
    )]
    NameCollision {
        /// The colliding module name
        name: String,
        /// `$id`s that would generate this name
        ids: Vec<String>,
    },

    /// Code formatting error
    #[error("Failed to format generated code for `{schema_id}`")]
    #[diagnostic(code(schemagen::format_error))]
    FormatError {
        schema_id: String,
        #[source]
        source: syn::Error,
    },

    /// Generic error with context
    #[error("{message}")]
    #[diagnostic(code(schemagen::error))]
    Other {
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl CodegenError {
    /// Create a parse error with context
    pub fn parse_error(source: serde_json::Error, path: impl Into<PathBuf>) -> Self {
        Self::ParseError {
            source,
            path: path.into(),
            src: None,
            span: None,
        }
    }

    /// Create a parse error with source text
    pub fn parse_error_with_source(
        source: serde_json::Error,
        path: impl Into<PathBuf>,
        src: String,
    ) -> Self {
        let span = offset_of(&src, source.line(), source.column()).map(|offset| (offset, 1).into());

        Self::ParseError {
            source,
            path: path.into(),
            src: Some(src),
            span,
        }
    }

    /// Create an invalid schema error
    pub fn invalid_schema(schema_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSchema {
            schema_id: schema_id.into(),
            message: message.into(),
        }
    }

    /// Create an unknown ref error
    pub fn unknown_ref(ref_string: impl Into<String>, schema_id: impl Into<String>) -> Self {
        Self::UnknownRef {
            ref_string: ref_string.into(),
            schema_id: schema_id.into(),
        }
    }

    /// Create an unsupported feature error
    pub fn unsupported(
        feature: impl Into<String>,
        schema_id: impl Into<String>,
        suggestion: Option<impl Into<String>>,
    ) -> Self {
        Self::Unsupported {
            feature: feature.into(),
            schema_id: schema_id.into(),
            suggestion: suggestion.map(|s| s.into()),
        }
    }

    /// Wrap any message as an [`CodegenError::Other`]
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
            source: None,
        }
    }
}

/// Byte offset of a 1-based serde_json line/column pair
fn offset_of(src: &str, line: usize, column: usize) -> Option<usize> {
    let line_start: usize = src
        .split_inclusive('\n')
        .take(line.checked_sub(1)?)
        .map(str::len)
        .sum();
    Some((line_start + column.saturating_sub(1)).min(src.len()))
}

/// Result type for codegen operations
pub type Result<T> = std::result::Result<T, CodegenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_span_points_at_failure() {
        let src = "{\n  \"$id\": \"a\",\n  oops\n}".to_string();
        let err = serde_json::from_str::<serde_json::Value>(&src).expect_err("invalid json");
        let CodegenError::ParseError { span, .. } =
            CodegenError::parse_error_with_source(err, "a.json", src.clone())
        else {
            panic!("expected parse error");
        };
        let span = span.expect("span");
        let line_three = src.find("  oops").expect("line three");
        assert!((line_three..line_three + "  oops".len()).contains(&span.offset()));
    }
}
