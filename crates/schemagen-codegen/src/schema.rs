use crate::error::{CodegenError, Result};
use serde_json::Value;
use smol_str::SmolStr;
use std::path::{Path, PathBuf};

/// Keys under which a schema may declare reusable definitions
pub const DEFINITION_KEYS: [&str; 2] = ["definitions", "$defs"];

/// One JSON Schema document, identified by its `$id`
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDocument {
    id: SmolStr,
    schema: Value,
    origin: Option<PathBuf>,
}

impl SchemaDocument {
    /// Wrap a schema value. Fails unless it is an object with a string `$id`.
    pub fn from_value(schema: Value) -> Result<Self> {
        Self::with_origin(schema, None)
    }

    /// Wrap a schema value loaded from `origin`
    pub fn from_file(schema: Value, origin: impl AsRef<Path>) -> Result<Self> {
        Self::with_origin(schema, Some(origin.as_ref().to_path_buf()))
    }

    fn with_origin(schema: Value, origin: Option<PathBuf>) -> Result<Self> {
        let Some(id) = schema.get("$id").and_then(Value::as_str) else {
            return Err(CodegenError::MissingId {
                origin: origin
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "in-memory schema".to_string()),
            });
        };
        Ok(Self {
            id: SmolStr::new(id),
            schema,
            origin,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn schema(&self) -> &Value {
        &self.schema
    }

    /// File the document was loaded from, if any
    pub fn origin(&self) -> Option<&Path> {
        self.origin.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.schema.get("title").and_then(Value::as_str)
    }

    pub fn description(&self) -> Option<&str> {
        self.schema.get("description").and_then(Value::as_str)
    }

    /// Whether the document declares a definitions map
    pub fn has_definitions(&self) -> bool {
        DEFINITION_KEYS
            .iter()
            .any(|key| self.schema.get(key).is_some_and(Value::is_object))
    }

    /// All `(key, pointer, schema)` definitions, in declaration order
    pub fn definitions(&self) -> Vec<(&str, String, &Value)> {
        let mut defs = Vec::new();
        for key in DEFINITION_KEYS {
            if let Some(map) = self.schema.get(key).and_then(Value::as_object) {
                for (name, schema) in map {
                    defs.push((name.as_str(), definition_pointer(key, name), schema));
                }
            }
        }
        defs
    }

    /// Resolve a JSON pointer (`""` for the root) inside this document
    pub fn pointer(&self, pointer: &str) -> Option<&Value> {
        if pointer.is_empty() {
            return Some(&self.schema);
        }
        self.schema.pointer(pointer)
    }

    /// Every `$ref` string in the document, depth first
    pub fn refs(&self) -> Vec<&str> {
        let mut refs = Vec::new();
        collect_refs(&self.schema, &mut refs);
        refs
    }
}

fn definition_pointer(key: &str, name: &str) -> String {
    format!("/{}/{}", escape_pointer(key), escape_pointer(name))
}

/// Escape one JSON pointer segment
pub fn escape_pointer(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

fn collect_refs<'v>(value: &'v Value, refs: &mut Vec<&'v str>) {
    match value {
        Value::Object(map) => {
            if let Some(r) = map.get("$ref").and_then(Value::as_str) {
                refs.push(r);
            }
            for (key, child) in map {
                // Literal payloads are data, not subschemas
                if key == "const" || key == "enum" || key == "default" || key == "examples" {
                    continue;
                }
                collect_refs(child, refs);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_refs(item, refs);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn requires_string_id() {
        assert!(SchemaDocument::from_value(json!({ "$id": "token" })).is_ok());
        assert!(matches!(
            SchemaDocument::from_value(json!({ "type": "object" })),
            Err(CodegenError::MissingId { .. })
        ));
        assert!(matches!(
            SchemaDocument::from_value(json!({ "$id": 4 })),
            Err(CodegenError::MissingId { .. })
        ));
    }

    #[test]
    fn definitions_and_pointers() {
        let doc = SchemaDocument::from_value(json!({
            "$id": "token",
            "definitions": { "Mint": { "type": "string" }, "a/b": { "type": "integer" } },
            "$defs": { "Extra": { "type": "boolean" } }
        }))
        .expect("doc");
        assert!(doc.has_definitions());

        let defs = doc.definitions();
        let pointers: Vec<_> = defs.iter().map(|(_, p, _)| p.as_str()).collect();
        assert_eq!(pointers, ["/definitions/Mint", "/definitions/a~1b", "/$defs/Extra"]);
        for (_, pointer, schema) in &defs {
            assert_eq!(doc.pointer(pointer), Some(*schema));
        }
        assert_eq!(doc.pointer(""), Some(doc.schema()));
    }

    #[test]
    fn refs_skip_literal_payloads() {
        let doc = SchemaDocument::from_value(json!({
            "$id": "holder",
            "properties": {
                "token": { "$ref": "token" },
                "list": { "type": "array", "items": { "$ref": "#/definitions/Item" } },
                "fixed": { "const": { "$ref": "not-a-ref" } }
            }
        }))
        .expect("doc");
        assert_eq!(doc.refs(), ["token", "#/definitions/Item"]);
    }
}
