use crate::corpus::SchemaSet;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    pub name: String,
    pub source_type: SourceType,
}

impl Source {
    pub async fn fetch(&self) -> Result<SchemaSet> {
        self.source_type.fetch().await
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SourceType {
    /// Every `*.json` schema below a directory
    Dir(DirSource),
    /// One file holding an array of schemas
    JsonFile(JsonFileSource),
}

pub trait SchemaSource {
    fn fetch(&self) -> impl Future<Output = Result<SchemaSet>> + Send;
}

impl SchemaSource for SourceType {
    async fn fetch(&self) -> Result<SchemaSet> {
        match self {
            SourceType::Dir(s) => s.fetch().await,
            SourceType::JsonFile(s) => s.fetch().await,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DirSource {
    pub path: PathBuf,
}

impl SchemaSource for DirSource {
    async fn fetch(&self) -> Result<SchemaSet> {
        let path = self.path.clone();
        let set = tokio::task::spawn_blocking(move || SchemaSet::load_from_dir(path))
            .await
            .into_diagnostic()??;
        Ok(set)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JsonFileSource {
    pub path: PathBuf,
}

impl SchemaSource for JsonFileSource {
    async fn fetch(&self) -> Result<SchemaSet> {
        let path = self.path.clone();
        let set = tokio::task::spawn_blocking(move || SchemaSet::load_json_file(path))
            .await
            .into_diagnostic()??;
        Ok(set)
    }
}
