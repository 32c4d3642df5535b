//! Generate Rust modules from the codegen fixtures into `OUT_DIR`.
//!
//! The generator writes one file per schema plus a `mod.rs` index with
//! `pub mod` lines. Those are relative to the index, so each set gets a
//! wrapper that points every module at its generated file instead.

use schemagen_codegen::backend::RustBackend;
use schemagen_codegen::codegen::generate_to_disk;
use schemagen_codegen::corpus::SchemaSet;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const FIXTURES: &str = "../schemagen-codegen/tests/fixtures";

fn main() -> Result<(), Box<dyn Error>> {
    println!("cargo:rerun-if-changed={FIXTURES}");
    let out_dir = PathBuf::from(std::env::var("OUT_DIR")?);

    let fixtures = Path::new(FIXTURES);
    generate(
        "schemas",
        SchemaSet::load_from_dir(fixtures.join("schemas"))?,
        &out_dir,
    )?;
    generate(
        "cycle",
        SchemaSet::load_json_file(fixtures.join("cycle.json"))?,
        &out_dir,
    )?;
    Ok(())
}

fn generate(name: &str, set: SchemaSet, out_dir: &Path) -> Result<(), Box<dyn Error>> {
    let dir = out_dir.join(name);
    let report = generate_to_disk(Arc::new(RustBackend::new()), set.into_documents(), &dir)?;

    let index = fs::read_to_string(&report.index)?;
    let mut wrapper = String::new();
    for line in index.lines() {
        if let Some(module) = line.strip_prefix("pub mod ").and_then(|l| l.strip_suffix(';')) {
            let file = dir.join(format!("{}.rs", module.trim_start_matches("r#")));
            wrapper.push_str(&format!("#[path = {:?}]\npub mod {module};\n", file.display().to_string()));
        } else if line.starts_with("pub use ") {
            wrapper.push_str(line);
            wrapper.push('\n');
        }
    }
    fs::write(out_dir.join(format!("{name}.rs")), wrapper)?;
    Ok(())
}
