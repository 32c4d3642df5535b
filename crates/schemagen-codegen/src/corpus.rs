use crate::error::{CodegenError, Result};
use crate::schema::SchemaDocument;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Ordered list of schema documents, the generator's input
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaSet {
    docs: Vec<SchemaDocument>,
}

impl SchemaSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap in-memory schemas, keeping their order. Every schema needs a
    /// string `$id`.
    pub fn from_values(values: Vec<Value>) -> Result<Self> {
        let docs = values
            .into_iter()
            .enumerate()
            .map(|(i, value)| {
                SchemaDocument::from_value(value).map_err(|_| CodegenError::MissingId {
                    origin: format!("schema #{i}"),
                })
            })
            .collect::<Result<_>>()?;
        Ok(Self { docs })
    }

    /// Load a JSON file holding either an array of schemas or a single
    /// schema object
    pub fn load_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let value: Value = serde_json::from_str(&content)
            .map_err(|e| CodegenError::parse_error_with_source(e, path, content.clone()))?;

        let docs = match value {
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| {
                    SchemaDocument::from_file(item, path).map_err(|_| CodegenError::MissingId {
                        origin: format!("{}[{i}]", path.display()),
                    })
                })
                .collect::<Result<_>>()?,
            other => vec![SchemaDocument::from_file(other, path)?],
        };

        tracing::debug!(path = %path.display(), count = docs.len(), "loaded schema file");
        Ok(Self { docs })
    }

    /// Load every `*.json` file below `path`, sorted by path. Files that do
    /// not parse or hold no `$id` are skipped.
    pub fn load_from_dir(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_dir() {
            return Err(CodegenError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("schema directory {} does not exist", path.display()),
            )));
        }

        let mut files: Vec<PathBuf> = walkdir::WalkDir::new(path)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .map(|e| e.into_path())
            .filter(|p| p.is_file() && p.extension().and_then(|s| s.to_str()) == Some("json"))
            .collect();
        files.sort();

        let mut set = Self::new();
        for file in files {
            let content = fs::read_to_string(&file)?;

            // Skip anything that isn't a schema
            let value: Value = match serde_json::from_str(&content) {
                Ok(value) => value,
                Err(e) => {
                    tracing::debug!(path = %file.display(), error = %e, "skipping non-JSON file");
                    continue;
                }
            };
            let items = match value {
                Value::Array(items) => items,
                other => vec![other],
            };
            for item in items {
                match SchemaDocument::from_file(item, &file) {
                    Ok(doc) => set.docs.push(doc),
                    Err(_) => {
                        tracing::debug!(path = %file.display(), "skipping value without $id");
                    }
                }
            }
        }

        tracing::debug!(path = %path.display(), count = set.len(), "loaded schema directory");
        Ok(set)
    }

    /// Load `path` as a directory or a JSON file, whichever it is
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.is_dir() {
            Self::load_from_dir(path)
        } else {
            Self::load_json_file(path)
        }
    }

    pub fn push(&mut self, doc: SchemaDocument) {
        self.docs.push(doc);
    }

    /// Append every document of `other`, after this set's own
    pub fn extend(&mut self, other: SchemaSet) {
        self.docs.extend(other.docs);
    }

    pub fn iter(&self) -> impl Iterator<Item = &SchemaDocument> {
        self.docs.iter()
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn into_documents(self) -> Vec<SchemaDocument> {
        self.docs
    }
}

impl IntoIterator for SchemaSet {
    type Item = SchemaDocument;
    type IntoIter = std::vec::IntoIter<SchemaDocument>;

    fn into_iter(self) -> Self::IntoIter {
        self.docs.into_iter()
    }
}
