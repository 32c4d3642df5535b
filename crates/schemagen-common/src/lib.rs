//! # Runtime support for schemagen-generated validator modules
//!
//! Every module emitted by the Rust backend of `schemagen-codegen` embeds its
//! JSON Schema and leans on this crate for everything that happens at runtime:
//!
//! - [`CompiledValidator`] - lazily compiled validator over an embedded schema,
//!   with a shared "last errors" slot
//! - [`SchemaBinding`] - the named export of a generated module, bundling
//!   `validate`, `get` and `is_error`
//! - [`Outcome`] - tagged success/error value replacing duck-typed
//!   `{ "error": ... }` objects
//! - [`ValidationError`] - the one user-facing error kind
//! - [`Integer`] - the type of JSON Schema `integer` values
//!
//! A generated module looks roughly like this:
//!
//! ```ignore
//! static VALIDATOR: CompiledValidator = CompiledValidator::embedded(SCHEMA_ID, SCHEMA, RELATED);
//!
//! pub struct TokenSchema;
//!
//! impl SchemaBinding for TokenSchema {
//!     const ID: &'static str = SCHEMA_ID;
//!     type Output = Token;
//!
//!     fn validator() -> &'static CompiledValidator {
//!         &VALIDATOR
//!     }
//! }
//! ```

pub mod binding;
pub mod error;
pub mod integer;
pub mod outcome;
pub mod validator;

pub use binding::SchemaBinding;
pub use error::{ValidationError, ValidationIssue};
pub use integer::Integer;
pub use outcome::{ErrorDetail, Outcome, is_error};
pub use validator::{CompiledValidator, EmbeddedRetriever, build_validator};

// Generated modules name these through the runtime crate so they only need a
// single dependency path.
pub use serde;
pub use serde_json;
