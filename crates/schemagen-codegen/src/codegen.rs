//! Generation driver
//!
//! [`SchemaCompiler`] runs one generation: it registers the documents,
//! compiles and writes one module per schema concurrently, waits for every
//! module, then writes the backend's support files and the Index Module.

pub mod output;
pub(crate) mod utils;

use crate::backend::{Backend, ImportEntry, ImportMap, ModuleContext};
use crate::error::{CodegenError, Result};
use crate::registry::SchemaRegistry;
use crate::schema::SchemaDocument;
use crate::typegen::{NamePlan, close_objects, compile_document};
use itertools::Itertools;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinSet;

/// Files written by one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationReport {
    /// Module files, in input order
    pub modules: Vec<PathBuf>,
    /// Index Module file
    pub index: PathBuf,
    /// Backend support files
    pub support: Vec<PathBuf>,
}

/// Drives one backend over a set of schema documents
#[derive(Clone)]
pub struct SchemaCompiler {
    backend: Arc<dyn Backend>,
    output_dir: PathBuf,
}

impl std::fmt::Debug for SchemaCompiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaCompiler")
            .field("backend", &self.backend.name())
            .field("output_dir", &self.output_dir)
            .finish()
    }
}

impl SchemaCompiler {
    pub fn new(backend: Arc<dyn Backend>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Generate every module and the index.
    ///
    /// Modules are compiled and written concurrently. The index is written
    /// only after every module task has finished; if any task fails the
    /// first error is returned and no index is written.
    pub async fn run(&self, docs: Vec<SchemaDocument>) -> Result<GenerationReport> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| CodegenError::Other {
                message: format!("Failed to create output directory {}", self.output_dir.display()),
                source: Some(Box::new(e)),
            })?;

        let registry = Arc::new(SchemaRegistry::from_documents(docs)?);
        self.check_module_names(&registry)?;

        let mut imports = ImportMap::new();
        let mut tasks = JoinSet::new();

        for doc in registry.iter() {
            let plan = NamePlan::for_document(doc);
            let path = self.backend.module_path(doc.id());
            imports.insert(ImportEntry {
                id: doc.id().to_string(),
                path: path.clone(),
                export: self.backend.export_name(doc.id(), &plan),
            });

            let registry = Arc::clone(&registry);
            let backend = Arc::clone(&self.backend);
            let full_path = self.output_dir.join(&path);
            let id = doc.id().to_string();
            tasks.spawn(async move {
                let contents = render_module(backend.as_ref(), &registry, &id)?;
                output::write_file(&full_path, &contents).await?;
                tracing::debug!(schema = %id, path = %full_path.display(), "wrote module");
                Ok::<_, CodegenError>(full_path)
            });
        }

        // Completion barrier: drain every task before touching the index
        let mut written = HashSet::new();
        let mut first_error = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(path)) => {
                    written.insert(path);
                }
                Ok(Err(e)) => {
                    first_error.get_or_insert(e);
                }
                Err(join_error) => {
                    first_error.get_or_insert(CodegenError::Other {
                        message: "module generation task failed".to_string(),
                        source: Some(Box::new(join_error)),
                    });
                }
            }
        }
        if let Some(e) = first_error {
            return Err(e);
        }

        let mut support = Vec::new();
        for (path, contents) in self.backend.support_files() {
            let full_path = self.output_dir.join(path);
            output::write_file(&full_path, &contents).await?;
            support.push(full_path);
        }

        let index = self.output_dir.join(self.backend.index_path());
        let index_contents = self.backend.render_index(&imports)?;
        output::write_file(&index, &index_contents).await?;

        let modules: Vec<PathBuf> = imports
            .iter()
            .map(|entry| self.output_dir.join(&entry.path))
            .filter(|path| written.contains(path))
            .collect();

        tracing::info!(
            backend = self.backend.name(),
            modules = modules.len(),
            output = %self.output_dir.display(),
            "generation complete"
        );

        Ok(GenerationReport {
            modules,
            index,
            support,
        })
    }

    /// Fail if two schemas would be written to the same module file
    fn check_module_names(&self, registry: &SchemaRegistry) -> Result<()> {
        let collisions = registry
            .iter()
            .map(|doc| (self.backend.module_path(doc.id()), doc.id().to_string()))
            .into_group_map()
            .into_iter()
            .filter(|(_, ids)| ids.len() > 1)
            .sorted()
            .next();

        match collisions {
            Some((path, ids)) => Err(CodegenError::NameCollision {
                name: path.display().to_string(),
                ids,
            }),
            None => Ok(()),
        }
    }
}

/// Compile, close and render the module for `id`. Runs inside a task, so no
/// non-`Send` value may live across an await point; this stays synchronous.
fn render_module(backend: &dyn Backend, registry: &SchemaRegistry, id: &str) -> Result<String> {
    let doc = registry
        .get(id)
        .ok_or_else(|| CodegenError::other(format!("schema `{id}` vanished from the registry")))?;

    let plan = NamePlan::for_document(doc);
    let types = close_objects(compile_document(registry, doc)?);
    let related = registry.related_schemas(id);
    let export = backend.export_name(id, &plan);

    backend.render_module(&ModuleContext {
        registry,
        document: doc,
        types: &types,
        plan: &plan,
        export: &export,
        related: &related,
    })
}

/// Blocking wrapper around [`SchemaCompiler::run`] for callers without a
/// tokio runtime, such as build scripts
pub fn generate_to_disk(
    backend: Arc<dyn Backend>,
    docs: Vec<SchemaDocument>,
    output_dir: impl Into<PathBuf>,
) -> Result<GenerationReport> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .map_err(CodegenError::Io)?;
    runtime.block_on(SchemaCompiler::new(backend, output_dir).run(docs))
}
