use crate::error::{CodegenError, Result};
use proc_macro2::TokenStream;
use std::path::Path;

/// `@generated` banner placed at the top of every written file. Both
/// targets use `//` line comments, so the id is escaped to keep it on its
/// line.
pub(crate) fn generated_header(schema_id: Option<&str>) -> String {
    match schema_id {
        Some(id) => format!(
            "// @generated by schemagen. DO NOT EDIT.\n//\n// Schema: {}\n//\n// This file was automatically generated from JSON Schema.\n// Any manual changes will be overwritten on the next regeneration.\n\n",
            id.escape_debug()
        ),
        None => "// @generated by schemagen. DO NOT EDIT.\n//\n// This file was automatically generated from JSON Schema.\n// Any manual changes will be overwritten on the next regeneration.\n\n".to_string(),
    }
}

/// Parse and pretty-print generated Rust tokens, with the header prepended
pub(crate) fn format_rust(tokens: TokenStream, schema_id: Option<&str>) -> Result<String> {
    let file: syn::File = syn::parse2(tokens).map_err(|source| CodegenError::FormatError {
        schema_id: schema_id.unwrap_or("index").to_string(),
        source,
    })?;
    let formatted = prettyplease::unparse(&file);

    // Add blank lines between top-level items for better readability
    let lines: Vec<&str> = formatted.lines().collect();
    let mut result_lines = Vec::with_capacity(lines.len());

    for (i, line) in lines.iter().enumerate() {
        result_lines.push(*line);
        let next = lines.get(i + 1).copied();

        // Blank line after closing braces that are at column 0 (top-level items)
        if (*line == "}" || *line == "};") && next.is_some_and(|n| !n.is_empty()) {
            result_lines.push("");
        }

        // Blank line after the last `pub mod` before re-exports or items
        if line.starts_with("pub mod ") && next.is_some_and(|n| !n.starts_with("pub mod ") && !n.is_empty()) {
            result_lines.push("");
        }
    }

    let mut out = generated_header(schema_id);
    out.push_str(&result_lines.join("\n"));
    out.push('\n');
    Ok(out)
}

/// Raw string literal holding `text`, with enough `#`s to never terminate
/// early
pub(crate) fn raw_string_literal(text: &str) -> Result<TokenStream> {
    let mut hashes = 1;
    while text.contains(&format!("\"{}", "#".repeat(hashes))) {
        hashes += 1;
    }
    let fence = "#".repeat(hashes);
    format!("r{fence}\"{text}\"{fence}")
        .parse::<TokenStream>()
        .map_err(|e| CodegenError::other(format!("failed to embed schema text: {e}")))
}

/// Write a generated file, creating parent directories as needed.
/// Existing files are overwritten.
pub(crate) async fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| CodegenError::Other {
                message: format!("Failed to create directory {}", parent.display()),
                source: Some(Box::new(e)),
            })?;
    }
    tokio::fs::write(path, contents)
        .await
        .map_err(|e| CodegenError::Other {
            message: format!("Failed to write file {}", path.display()),
            source: Some(Box::new(e)),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use quote::quote;

    #[test]
    fn formats_with_header() {
        let out = format_rust(quote! { pub struct A {} pub struct B {} }, Some("a")).expect("formats");
        assert!(out.starts_with("// @generated by schemagen. DO NOT EDIT."));
        assert!(out.contains("// Schema: a\n"));
        assert!(out.contains("pub struct A {}\n"));
    }

    #[test]
    fn schema_id_stays_inside_the_comment() {
        let header = generated_header(Some("evil\npub fn injected() {}\rx"));
        assert!(header.contains("// Schema: evil\\npub fn injected() {}\\rx\n"));
        assert!(header.lines().all(|l| l.is_empty() || l.starts_with("//")));

        let out = format_rust(quote! { pub struct A {} }, Some("a\nb")).expect("formats");
        syn::parse_file(&out).expect("header stays a comment");
        assert!(!out.contains("\nb\n"));
    }

    #[test]
    fn raw_literal_survives_quotes_and_hashes() {
        let text = r##"{"a": "x\"#y"}"##;
        let tokens = raw_string_literal(text).expect("literal");
        let lit: syn::LitStr = syn::parse2(tokens).expect("string literal");
        assert_eq!(lit.value(), text);
    }
}
