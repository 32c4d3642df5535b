//! Registry of the schema documents taking part in one generator run
//!
//! The registry is built once per run and handed to every compilation step
//! explicitly. It owns the documents, resolves `$ref`s between them and
//! checks that each document compiles as JSON Schema.

use crate::error::{CodegenError, Result};
use crate::sanitize::sanitize_identifier;
use crate::schema::SchemaDocument;
use smol_str::SmolStr;
use std::collections::{HashMap, HashSet, VecDeque};

/// Base URI `jsonschema` resolves relative `$id`s against
const DEFAULT_BASE: &str = "json-schema:///";

/// Fallback type name for ids that sanitize to nothing
const FALLBACK_TYPE_NAME: &str = "Schema";

/// Where a `$ref` points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefTarget<'r> {
    /// Document holding the target
    pub document: &'r SchemaDocument,
    /// JSON pointer inside `document`, `""` for its root
    pub pointer: &'r str,
}

/// Ordered set of schema documents keyed by `$id`
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    docs: Vec<SchemaDocument>,
    index: HashMap<SmolStr, usize>,
}

impl SchemaRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every document, then check that each compiles
    pub fn from_documents(docs: impl IntoIterator<Item = SchemaDocument>) -> Result<Self> {
        let mut registry = Self::new();
        for doc in docs {
            registry.register(doc);
        }
        registry.check_all()?;
        Ok(registry)
    }

    /// Add a document. A document with an `$id` that is already registered
    /// replaces the earlier one in place.
    pub fn register(&mut self, doc: SchemaDocument) {
        let id = SmolStr::new(doc.id());
        if let Some(&slot) = self.index.get(&id) {
            tracing::warn!(id = %id, "duplicate schema $id, later document replaces earlier one");
            self.docs[slot] = doc;
        } else {
            tracing::debug!(id = %id, "registered schema");
            self.index.insert(id, self.docs.len());
            self.docs.push(doc);
        }
    }

    /// Compile every registered document with the JSON Schema validator,
    /// resolving cross-schema refs against the registry only
    pub fn check_all(&self) -> Result<()> {
        for doc in &self.docs {
            self.check(doc)?;
        }
        Ok(())
    }

    /// Compile one document, see [`SchemaRegistry::check_all`]
    pub fn check(&self, doc: &SchemaDocument) -> Result<()> {
        // Unresolvable refs surface here with a better message than the
        // validator's retriever error
        for r in doc.refs() {
            self.resolve_ref(doc, r)?;
        }

        let related = self
            .related_schemas(doc.id())
            .into_iter()
            .map(|d| (d.id().to_string(), d.schema().clone()));
        schemagen_common::build_validator(doc.schema(), related)
            .map(|_| ())
            .map_err(|message| CodegenError::invalid_schema(doc.id(), message))
    }

    /// Get a document by `$id`
    pub fn get(&self, id: &str) -> Option<&SchemaDocument> {
        self.index.get(id).map(|&i| &self.docs[i])
    }

    /// Look up the document a `$ref` base names, relative to `from`
    fn lookup(&self, from: &SchemaDocument, base: &str) -> Option<&SchemaDocument> {
        if let Some(doc) = self.get(base) {
            return Some(doc);
        }

        // Relative to the referring document's own id
        if let Some((dir, _)) = from.id().rsplit_once('/') {
            if let Some(doc) = self.get(&format!("{dir}/{base}")) {
                return Some(doc);
            }
        }

        let relative = base.strip_prefix(DEFAULT_BASE).unwrap_or(base);
        if let Some(doc) = self.get(relative) {
            return Some(doc);
        }
        let last = relative.rsplit('/').next().unwrap_or(relative);
        self.get(last)
            .or_else(|| last.strip_suffix(".json").and_then(|stem| self.get(stem)))
    }

    /// Resolve a `$ref` found in `from`.
    ///
    /// - `#/definitions/Name` points into `from`
    /// - `other` points at the root of document `other`
    /// - `other#/definitions/Name` points into document `other`
    pub fn resolve_ref<'r>(&'r self, from: &'r SchemaDocument, ref_str: &'r str) -> Result<RefTarget<'r>> {
        let (base, pointer) = ref_str.split_once('#').unwrap_or((ref_str, ""));

        let document = if base.is_empty() {
            from
        } else {
            self.lookup(from, base)
                .ok_or_else(|| CodegenError::unknown_ref(ref_str, from.id()))?
        };

        if !pointer.is_empty() && !pointer.starts_with('/') {
            return Err(CodegenError::unsupported(
                format!("anchor reference `{ref_str}`"),
                from.id(),
                Some("Use a JSON pointer such as `#/definitions/Name`"),
            ));
        }
        if document.pointer(pointer).is_none() {
            return Err(CodegenError::unknown_ref(ref_str, from.id()));
        }

        Ok(RefTarget { document, pointer })
    }

    /// Documents reachable from `id` through `$ref`, excluding `id` itself,
    /// in discovery order
    pub fn related_schemas(&self, id: &str) -> Vec<&SchemaDocument> {
        let Some(root) = self.get(id) else {
            return Vec::new();
        };

        let mut seen: HashSet<&str> = HashSet::from([root.id()]);
        let mut related = Vec::new();
        let mut queue = VecDeque::from([root]);

        while let Some(doc) = queue.pop_front() {
            for r in doc.refs() {
                let Ok(target) = self.resolve_ref(doc, r) else {
                    continue;
                };
                if seen.insert(target.document.id()) {
                    related.push(target.document);
                    queue.push_back(target.document);
                }
            }
        }

        related
    }

    /// Name of the main generated type for `doc`.
    ///
    /// The sanitized `$id`, suffixed with `1` when the document declares
    /// definitions so a definition of the same name keeps its own.
    pub fn main_type_name(doc: &SchemaDocument) -> String {
        let mut name = sanitize_identifier(doc.id());
        if name.is_empty() {
            name.push_str(FALLBACK_TYPE_NAME);
        }
        if doc.has_definitions() {
            name.push('1');
        }
        name
    }

    /// Iterate documents in registration order
    pub fn iter(&self) -> impl Iterator<Item = &SchemaDocument> {
        self.docs.iter()
    }

    /// Number of registered documents
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> SchemaDocument {
        SchemaDocument::from_value(value).expect("schema has $id")
    }

    fn registry() -> SchemaRegistry {
        SchemaRegistry::from_documents([
            doc(json!({
                "$id": "token",
                "type": "object",
                "properties": { "mint": { "type": "string" } }
            })),
            doc(json!({
                "$id": "account",
                "type": "object",
                "properties": {
                    "token": { "$ref": "token" },
                    "state": { "$ref": "#/definitions/State" }
                },
                "definitions": { "State": { "enum": ["open", "frozen"] } }
            })),
            doc(json!({
                "$id": "wallet",
                "type": "array",
                "items": { "$ref": "account" }
            })),
        ])
        .expect("valid registry")
    }

    #[test]
    fn main_type_name_suffixes_when_definitions_present() {
        assert_eq!(SchemaRegistry::main_type_name(&doc(json!({ "$id": "token" }))), "Token");
        assert_eq!(
            SchemaRegistry::main_type_name(&doc(json!({ "$id": "token", "definitions": {} }))),
            "Token1"
        );
        assert_eq!(SchemaRegistry::main_type_name(&doc(json!({ "$id": "123" }))), "Schema");
    }

    #[test]
    fn resolves_local_and_cross_document_refs() {
        let registry = registry();
        let account = registry.get("account").expect("account");

        let local = registry
            .resolve_ref(account, "#/definitions/State")
            .expect("local ref");
        assert_eq!(local.document.id(), "account");
        assert_eq!(local.pointer, "/definitions/State");

        let external = registry.resolve_ref(account, "token").expect("external ref");
        assert_eq!(external.document.id(), "token");
        assert_eq!(external.pointer, "");

        let by_uri = registry
            .resolve_ref(account, "json-schema:///token#/properties/mint")
            .expect("uri ref");
        assert_eq!(by_uri.document.id(), "token");
        assert_eq!(by_uri.pointer, "/properties/mint");
    }

    #[test]
    fn unknown_refs_are_errors() {
        let registry = registry();
        let account = registry.get("account").expect("account");
        assert!(matches!(
            registry.resolve_ref(account, "missing"),
            Err(CodegenError::UnknownRef { .. })
        ));
        assert!(matches!(
            registry.resolve_ref(account, "#/definitions/Missing"),
            Err(CodegenError::UnknownRef { .. })
        ));
        assert!(matches!(
            registry.resolve_ref(account, "#anchor"),
            Err(CodegenError::Unsupported { .. })
        ));
    }

    #[test]
    fn related_schemas_are_transitive() {
        let registry = registry();
        let related: Vec<_> = registry
            .related_schemas("wallet")
            .into_iter()
            .map(SchemaDocument::id)
            .collect();
        assert_eq!(related, ["account", "token"]);
        assert!(registry.related_schemas("token").is_empty());
    }

    #[test]
    fn duplicate_ids_replace_in_place() {
        let mut registry = SchemaRegistry::new();
        registry.register(doc(json!({ "$id": "a", "type": "string" })));
        registry.register(doc(json!({ "$id": "b", "type": "string" })));
        registry.register(doc(json!({ "$id": "a", "type": "integer" })));

        assert_eq!(registry.len(), 2);
        let ids: Vec<_> = registry.iter().map(SchemaDocument::id).collect();
        assert_eq!(ids, ["a", "b"]);
        assert_eq!(registry.get("a").expect("a").schema()["type"], "integer");
    }

    #[test]
    fn register_accepts_forward_refs_and_check_reports_errors() {
        let mut registry = SchemaRegistry::new();
        registry.register(doc(json!({ "$id": "holder", "properties": { "t": { "$ref": "token" } } })));
        let holder = registry.get("holder").expect("holder").clone();
        assert!(matches!(registry.check(&holder), Err(CodegenError::UnknownRef { .. })));

        registry.register(doc(json!({ "$id": "token", "type": "string" })));
        registry.register(doc(json!({ "$id": "bad", "type": 12 })));
        registry.check(&holder).expect("ref resolves once token is registered");
        assert!(matches!(registry.check_all(), Err(CodegenError::InvalidSchema { .. })));
    }

    #[test]
    fn invalid_schema_fails_registration() {
        let result = SchemaRegistry::from_documents([doc(json!({ "$id": "bad", "type": 12 }))]);
        assert!(matches!(result, Err(CodegenError::InvalidSchema { .. })));

        let result = SchemaRegistry::from_documents([doc(json!({ "$id": "dangling", "$ref": "nowhere" }))]);
        assert!(matches!(result, Err(CodegenError::UnknownRef { .. })));
    }
}
