//! # JSON Schema to typed validator modules
//!
//! Takes an ordered set of JSON Schema documents and writes one module per
//! schema, holding the types derived from the schema, an embedded validator
//! and a binding bundling `validate`, `get` and `isError`, plus an index
//! module re-exporting every binding.
//!
//! ## Usage
//!
//! ### Generate modules
//!
//! The `schemagen` binary can be pointed at a directory or a JSON file of
//! schemas:
//!
//! ```bash
//! cargo run -p schemagen-codegen --bin schemagen -- \
//!     -i ./schemas \
//!     -o ./src/generated
//! ```
//!
//! or at a KDL config listing several sources:
//!
//! ```bash
//! cargo run -p schemagen-codegen --bin schemagen -- -c schemagen.kdl
//! ```
//!
//! ### From a build script
//!
//! ```no_run
//! use schemagen_codegen::backend::RustBackend;
//! use schemagen_codegen::codegen::generate_to_disk;
//! use schemagen_codegen::corpus::SchemaSet;
//! use std::sync::Arc;
//!
//! let schemas = SchemaSet::load_from_dir("schemas")?;
//! generate_to_disk(Arc::new(RustBackend::new()), schemas.into_documents(), "src/generated")?;
//! # Ok::<(), schemagen_codegen::error::CodegenError>(())
//! ```
//!
//! ## Modules
//!
//! - [`sanitize`] - `$id` to identifier sanitization
//! - [`schema`] - schema documents
//! - [`registry`] - per-run schema registry and `$ref` resolution
//! - [`typegen`] - schema-to-type compiler and the index-signature closure pass
//! - [`backend`] - Rust and TypeScript renderers
//! - [`codegen`] - the generation driver
//! - [`corpus`] - loading schemas from files and directories
//! - [`fetch`] - KDL-configured schema sources

pub mod backend;
pub mod cli;
pub mod codegen;
pub mod corpus;
pub mod error;
pub mod fetch;
pub mod registry;
pub mod sanitize;
pub mod schema;
pub mod typegen;
