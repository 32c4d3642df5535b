use clap::Parser;
use miette::{IntoDiagnostic, Result, miette};
use schemagen_codegen::backend::backend_for;
use schemagen_codegen::cli::CodegenArgs;
use schemagen_codegen::codegen::SchemaCompiler;
use schemagen_codegen::corpus::SchemaSet;
use schemagen_codegen::fetch::{Config, Fetcher};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let args = CodegenArgs::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("SCHEMAGEN_LOG").unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    let (schemas, output, target, runtime_crate) = match &args.config {
        Some(path) => {
            tracing::info!(config = %path.display(), "reading config");
            let config = Config::load(path)?;
            let schemas = Fetcher::new(config.clone()).fetch_all().await?;
            (
                schemas,
                config.output.dir,
                args.target.unwrap_or(config.output.target),
                args.runtime_crate.clone().or(config.output.runtime_crate),
            )
        }
        None => {
            let input = args
                .input
                .as_ref()
                .ok_or_else(|| miette!("--input is required without --config"))?;
            let output = args
                .output
                .clone()
                .ok_or_else(|| miette!("--output is required without --config"))?;
            tracing::info!(input = %input.display(), "loading schemas");
            let input = input.clone();
            let schemas = tokio::task::spawn_blocking(move || SchemaSet::load(input))
                .await
                .into_diagnostic()??;
            (
                schemas,
                output,
                args.target.unwrap_or_default(),
                args.runtime_crate.clone(),
            )
        }
    };

    if schemas.is_empty() {
        return Err(miette!("no schemas found"));
    }
    tracing::info!(count = schemas.len(), "loaded schema documents");

    let backend = backend_for(target, runtime_crate.as_deref());
    let compiler = SchemaCompiler::new(backend, &output);
    let report = compiler.run(schemas.into_documents()).await?;

    println!(
        "✨ Generated {} modules to {}",
        report.modules.len(),
        output.display()
    );

    Ok(())
}
