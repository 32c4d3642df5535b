use super::sources::{DirSource, JsonFileSource, Source, SourceType};
use crate::cli::Target;
use clap::ValueEnum;
use miette::{IntoDiagnostic, Result, miette};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub output: OutputConfig,
    pub sources: Vec<Source>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub target: Target,
    pub runtime_crate: Option<String>,
}

impl Config {
    pub fn from_kdl(text: &str) -> Result<Self> {
        let doc = text
            .parse::<kdl::KdlDocument>()
            .map_err(|e| miette!("Failed to parse KDL: {}", e))?;

        let mut output: Option<OutputConfig> = None;
        let mut sources = Vec::new();

        for node in doc.nodes() {
            match node.name().value() {
                "output" => {
                    if output.is_some() {
                        return Err(miette!("Multiple output blocks found"));
                    }
                    output = Some(parse_output(node)?);
                }
                "source" => {
                    sources.push(parse_source(node)?);
                }
                other => {
                    return Err(miette!("Unknown config node: {}", other));
                }
            }
        }

        let output = output.ok_or_else(|| miette!("Missing output block"))?;

        Ok(Config { output, sources })
    }

    /// Read a config file. Relative paths inside it are taken relative to
    /// the file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).into_diagnostic()?;
        let config = Self::from_kdl(&text)?;
        match path.parent() {
            Some(base) if !base.as_os_str().is_empty() => Ok(config.relative_to(base)),
            _ => Ok(config),
        }
    }

    /// Resolve relative paths against `base`
    pub fn relative_to(mut self, base: &Path) -> Self {
        self.output.dir = base.join(&self.output.dir);
        for source in &mut self.sources {
            match &mut source.source_type {
                SourceType::Dir(s) => s.path = base.join(&s.path),
                SourceType::JsonFile(s) => s.path = base.join(&s.path),
            }
        }
        self
    }
}

/// First argument of `node` as a string
fn string_arg<'n>(node: &'n kdl::KdlNode, what: &str) -> Result<&'n str> {
    node.entries()
        .first()
        .and_then(|e| e.value().as_string())
        .ok_or_else(|| miette!("{} expects a string value", what))
}

fn parse_output(node: &kdl::KdlNode) -> Result<OutputConfig> {
    let children = node
        .children()
        .ok_or_else(|| miette!("output block has no children"))?;

    let mut dir: Option<PathBuf> = None;
    let mut target = Target::default();
    let mut runtime_crate: Option<String> = None;

    for child in children.nodes() {
        match child.name().value() {
            "dir" => {
                dir = Some(PathBuf::from(string_arg(child, "dir")?));
            }
            "target" => {
                let val = string_arg(child, "target")?;
                target = Target::from_str(val, true)
                    .map_err(|_| miette!("Unknown target: {} (expected rust or typescript)", val))?;
            }
            "runtime-crate" => {
                runtime_crate = Some(string_arg(child, "runtime-crate")?.to_string());
            }
            other => {
                return Err(miette!("Unknown output field: {}", other));
            }
        }
    }

    Ok(OutputConfig {
        dir: dir.ok_or_else(|| miette!("Missing output directory"))?,
        target,
        runtime_crate,
    })
}

fn parse_source(node: &kdl::KdlNode) -> Result<Source> {
    let name = string_arg(node, "source")
        .map_err(|_| miette!("source expects a name as first argument"))?
        .to_string();

    let type_str = node
        .get("type")
        .and_then(|v| v.as_string())
        .ok_or_else(|| miette!("source {} missing type attribute", name))?;

    let children = node
        .children()
        .ok_or_else(|| miette!("source {} has no children", name))?;

    let source_type = match type_str {
        "dir" => SourceType::Dir(DirSource {
            path: parse_path_field(children, &name)?,
        }),
        "jsonfile" => SourceType::JsonFile(JsonFileSource {
            path: parse_path_field(children, &name)?,
        }),
        other => return Err(miette!("Unknown source type: {}", other)),
    };

    Ok(Source { name, source_type })
}

fn parse_path_field(children: &kdl::KdlDocument, source: &str) -> Result<PathBuf> {
    let mut path: Option<PathBuf> = None;

    for child in children.nodes() {
        match child.name().value() {
            "path" => {
                path = Some(PathBuf::from(string_arg(child, "path")?));
            }
            other => {
                return Err(miette!("Unknown field {} in source {}", other, source));
            }
        }
    }

    path.ok_or_else(|| miette!("Missing path in source {}", source))
}
