//! Output backends
//!
//! A [`Backend`] turns the closed declarations of one schema into the text of
//! a Generated Module, and the [`ImportMap`] into the Index Module.

pub mod rust;
pub mod typescript;

pub use rust::RustBackend;
pub use typescript::TypeScriptBackend;

use crate::cli::Target;
use crate::error::Result;
use crate::registry::SchemaRegistry;
use crate::schema::SchemaDocument;
use crate::typegen::{ModuleTypes, NamePlan};
use std::path::PathBuf;
use std::sync::Arc;

/// Everything a backend needs to render one module
#[derive(Debug, Clone, Copy)]
pub struct ModuleContext<'a> {
    /// Every document of the run, for following references across modules
    pub registry: &'a SchemaRegistry,
    pub document: &'a SchemaDocument,
    /// Declarations with open index signatures already removed
    pub types: &'a ModuleTypes,
    pub plan: &'a NamePlan,
    /// Name the module exports its binding under
    pub export: &'a str,
    /// Schemas reachable through `$ref`, embedded so the runtime validator
    /// can resolve them
    pub related: &'a [&'a SchemaDocument],
}

/// One entry of the [`ImportMap`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportEntry {
    /// `$id` of the schema
    pub id: String,
    /// Module file, relative to the output directory
    pub path: PathBuf,
    /// Exported binding name
    pub export: String,
}

/// `$id -> module` mapping in the order modules were scheduled
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportMap {
    entries: Vec<ImportEntry>,
}

impl ImportMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a module. An entry with the same `$id` is replaced in place.
    pub fn insert(&mut self, entry: ImportEntry) {
        match self.entries.iter_mut().find(|e| e.id == entry.id) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    pub fn get(&self, id: &str) -> Option<&ImportEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImportEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Renderer for one output language
pub trait Backend: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// File the module for `id` is written to, relative to the output dir
    fn module_path(&self, id: &str) -> PathBuf;

    /// Index Module file, relative to the output dir
    fn index_path(&self) -> PathBuf;

    /// Extra files every run writes next to the modules
    fn support_files(&self) -> Vec<(PathBuf, String)> {
        Vec::new()
    }

    /// Name of the binding exported for `id`
    fn export_name(&self, id: &str, plan: &NamePlan) -> String;

    fn render_module(&self, ctx: &ModuleContext<'_>) -> Result<String>;

    fn render_index(&self, imports: &ImportMap) -> Result<String>;
}

/// Backend for `target`. `runtime_crate` is the path generated Rust uses to
/// reach the runtime crate; TypeScript ignores it.
pub fn backend_for(target: Target, runtime_crate: Option<&str>) -> Arc<dyn Backend> {
    match target {
        Target::Rust => Arc::new(match runtime_crate {
            Some(path) => RustBackend::with_runtime_crate(path),
            None => RustBackend::new(),
        }),
        Target::Typescript => Arc::new(TypeScriptBackend::new()),
    }
}
