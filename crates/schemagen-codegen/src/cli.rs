use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output language for generated modules
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Target {
    /// Rust modules using the schemagen-common runtime
    #[default]
    Rust,
    /// TypeScript modules using ajv
    Typescript,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Generate typed validator modules from JSON Schema")]
pub struct CodegenArgs {
    /// Directory of schema files, or a JSON file holding an array of schemas
    #[arg(short = 'i', long, required_unless_present = "config")]
    pub input: Option<PathBuf>,

    /// Output directory for generated modules
    #[arg(short = 'o', long, required_unless_present = "config")]
    pub output: Option<PathBuf>,

    /// Output language
    #[arg(short = 't', long, value_enum)]
    pub target: Option<Target>,

    /// Path generated Rust uses to reach the runtime crate
    #[arg(long)]
    pub runtime_crate: Option<String>,

    /// Path to KDL config file, used instead of --input/--output
    #[arg(short = 'c', long, conflicts_with_all = ["input", "output"])]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short = 'v', long)]
    pub verbose: bool,
}
