use heck::ToPascalCase;
use proc_macro2::TokenStream;
use quote::quote;

/// Convert a value string to a valid variant name
pub(crate) fn value_to_variant_name(value: &str) -> String {
    // Remove leading special chars and convert to pascal case
    let clean = value.trim_start_matches(|c: char| !c.is_alphanumeric());
    let variant = clean.replace('-', "_").to_pascal_case();

    // Prefix with underscore if starts with digit
    if variant.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        format!("_{}", variant)
    } else if variant.is_empty() {
        "Unknown".to_string()
    } else {
        variant
    }
}

/// Sanitize a string to be safe for Rust identifiers and filenames
pub(crate) fn sanitize_name(s: &str) -> String {
    if s.is_empty() {
        return "unknown".to_string();
    }

    // Replace invalid characters with underscores
    let mut sanitized: String = s
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    // Ensure it doesn't start with a digit
    if sanitized.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        sanitized = format!("_{}", sanitized);
    }

    sanitized
}

/// Create an identifier, using raw identifier if necessary for keywords
pub(crate) fn make_ident(s: &str) -> syn::Ident {
    if s.is_empty() {
        tracing::warn!("empty identifier encountered, using 'unknown' as fallback");
        return syn::Ident::new("unknown", proc_macro2::Span::call_site());
    }

    let sanitized = sanitize_name(s);

    // `_` alone is not an identifier
    if sanitized.chars().all(|c| c == '_') {
        return syn::Ident::new(&format!("{sanitized}unknown"), proc_macro2::Span::call_site());
    }

    syn::parse_str::<syn::Ident>(&sanitized).unwrap_or_else(|_| {
        match sanitized.as_str() {
            // Keywords that cannot be raw identifiers
            "self" | "Self" | "super" | "crate" => {
                syn::Ident::new(&format!("{sanitized}_"), proc_macro2::Span::call_site())
            }
            _ => syn::Ident::new_raw(&sanitized, proc_macro2::Span::call_site()),
        }
    })
}

/// Generate doc comment from optional description
pub(crate) fn generate_doc_comment(desc: Option<&str>) -> TokenStream {
    if let Some(description) = desc {
        // Leading space so the rendered `///` comment reads naturally
        let doc = format!(" {}", description.trim());
        quote! {
            #[doc = #doc]
        }
    } else {
        quote! {}
    }
}

/// Whether `s` can be used as a JavaScript identifier as-is
pub(crate) fn is_js_identifier(s: &str) -> bool {
    const RESERVED: &[&str] = &[
        "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete",
        "do", "else", "enum", "export", "extends", "false", "finally", "for", "function", "if",
        "import", "in", "instanceof", "new", "null", "return", "super", "switch", "this", "throw",
        "true", "try", "typeof", "var", "void", "while", "with", "yield", "let", "static",
        "implements", "interface", "package", "private", "protected", "public", "await",
    ];

    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_' || first == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        && !RESERVED.contains(&s)
}

/// Quote `s` as a JavaScript/TypeScript string literal
pub(crate) fn js_string(s: &str) -> String {
    // JSON string syntax is valid JS
    serde_json::Value::String(s.to_string()).to_string()
}
