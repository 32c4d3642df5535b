//! Rust output: serde types plus a [`SchemaBinding`] per schema
//!
//! [`SchemaBinding`]: schemagen_common::SchemaBinding

use super::{Backend, ImportMap, ModuleContext};
use crate::codegen::output::{format_rust, raw_string_literal};
use crate::codegen::utils::{generate_doc_comment, make_ident};
use crate::error::{CodegenError, Result};
use crate::typegen::{
    DeclId, DeclKind, EnumVariant, ExtraFields, ModuleTypes, NamePlan, StructDecl, TypeDecl,
    TypeGraph, TypeRef, UnionVariant,
};
use heck::ToSnakeCase;
use proc_macro2::TokenStream;
use quote::quote;
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Default path generated code uses for the runtime crate
pub const DEFAULT_RUNTIME_CRATE: &str = "schemagen_common";

/// Module name for a schema `$id`, without any `r#` prefix
pub fn module_name(id: &str) -> String {
    let ident = make_ident(&id.to_snake_case()).to_string();
    ident.trim_start_matches("r#").to_string()
}

#[derive(Debug, Clone)]
pub struct RustBackend {
    runtime_crate: String,
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RustBackend {
    pub fn new() -> Self {
        Self::with_runtime_crate(DEFAULT_RUNTIME_CRATE)
    }

    /// Use `path` to reach the runtime crate, e.g. `crate::rt` when it is
    /// re-exported
    pub fn with_runtime_crate(path: impl Into<String>) -> Self {
        Self {
            runtime_crate: path.into(),
        }
    }

    fn runtime_path(&self) -> Result<syn::Path> {
        syn::parse_str(&self.runtime_crate).map_err(|e| CodegenError::Other {
            message: format!("invalid runtime crate path `{}`", self.runtime_crate),
            source: Some(Box::new(e)),
        })
    }
}

impl Backend for RustBackend {
    fn name(&self) -> &'static str {
        "rust"
    }

    fn module_path(&self, id: &str) -> PathBuf {
        PathBuf::from(format!("{}.rs", module_name(id)))
    }

    fn index_path(&self) -> PathBuf {
        PathBuf::from("mod.rs")
    }

    fn export_name(&self, _id: &str, plan: &NamePlan) -> String {
        make_ident(plan.binding()).to_string()
    }

    fn render_module(&self, ctx: &ModuleContext<'_>) -> Result<String> {
        let rt = self.runtime_path()?;
        let id = ctx.document.id();

        let mut graph = TypeGraph::new(ctx.registry);
        graph.insert(id, ctx.types.clone());
        let module = ModuleRenderer {
            rt: &rt,
            module_id: id,
            cyclic: graph.cyclic_refs(id)?,
            recursive_aliases: recursive_aliases(ctx.types),
        };

        let schema_text = serde_json::to_string_pretty(ctx.document.schema())
            .map_err(|e| CodegenError::other(format!("failed to serialize schema `{id}`: {e}")))?;
        let schema_lit = raw_string_literal(&schema_text)?;

        let mut related = Vec::with_capacity(ctx.related.len());
        for doc in ctx.related {
            let text = serde_json::to_string(doc.schema()).map_err(|e| {
                CodegenError::other(format!("failed to serialize schema `{}`: {e}", doc.id()))
            })?;
            let related_id = doc.id();
            let lit = raw_string_literal(&text)?;
            related.push(quote! { (#related_id, #lit) });
        }

        let module_doc = format!(
            " Types and validator for the `{id}` schema.{}",
            ctx.document
                .description()
                .or(ctx.document.title())
                .map(|d| format!("\n\n {}", d.trim()))
                .unwrap_or_default()
        );

        let decls = ctx
            .types
            .decls
            .iter()
            .map(|decl| module.render_decl(decl))
            .collect::<Result<Vec<_>>>()?;

        let main = make_ident(&ctx.types.main);
        let binding = make_ident(ctx.export);
        let binding_doc = format!(" Binding for the `{id}` schema");

        let tokens = quote! {
            #![doc = #module_doc]

            /// `$id` of the schema this module validates
            pub const SCHEMA_ID: &str = #id;

            /// The schema, as given to the generator
            pub const SCHEMA: &str = #schema_lit;

            const RELATED: &[(&str, &str)] = &[#(#related),*];

            static VALIDATOR: #rt::CompiledValidator =
                #rt::CompiledValidator::embedded(SCHEMA_ID, SCHEMA, RELATED);

            #(#decls)*

            /// Run the schema validator. Failures are kept for [`last_errors`].
            pub fn validate(value: &#rt::serde_json::Value) -> bool {
                VALIDATOR.validate(value)
            }

            /// Validate `value` and decode it as the main type
            pub fn get(value: #rt::serde_json::Value) -> ::std::result::Result<#main, #rt::ValidationError> {
                VALIDATOR.get(value)
            }

            /// Whether `value` is an object with a non-null `error` member
            pub fn is_error(value: &#rt::serde_json::Value) -> bool {
                #rt::is_error(value)
            }

            /// Issues from the most recent failed validation
            pub fn last_errors() -> ::std::option::Option<::std::vec::Vec<#rt::ValidationIssue>> {
                VALIDATOR.last_errors()
            }

            #[doc = #binding_doc]
            #[derive(::std::fmt::Debug, ::std::clone::Clone, ::std::marker::Copy, ::std::default::Default)]
            pub struct #binding;

            impl #rt::SchemaBinding for #binding {
                const ID: &'static str = SCHEMA_ID;
                type Output = #main;

                fn validator() -> &'static #rt::CompiledValidator {
                    &VALIDATOR
                }
            }
        };

        format_rust(tokens, Some(id))
    }

    fn render_index(&self, imports: &ImportMap) -> Result<String> {
        let mut mods = Vec::new();
        let mut uses = Vec::new();
        for entry in imports.iter() {
            let module = module_ident(&entry.path);
            let export = make_ident(&entry.export);
            mods.push(quote! { pub mod #module; });
            uses.push(quote! { pub use #module::#export; });
        }

        format_rust(
            quote! {
                #(#mods)*
                #(#uses)*
            },
            None,
        )
    }
}

fn module_ident(path: &Path) -> syn::Ident {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown");
    make_ident(stem)
}

/// Aliases whose type mentions themselves through other aliases; a Rust
/// `type` item cannot be recursive, so these become newtype structs
fn recursive_aliases(types: &ModuleTypes) -> HashSet<String> {
    fn mentions<'t>(ty: &'t TypeRef, out: &mut Vec<&'t str>) {
        match ty {
            TypeRef::Named(name) => out.push(name),
            TypeRef::Array(inner) | TypeRef::Map(inner) | TypeRef::Optional(inner) => {
                mentions(inner, out)
            }
            _ => {}
        }
    }

    let mut recursive = HashSet::new();
    for decl in &types.decls {
        let DeclKind::Alias(ty) = &decl.kind else {
            continue;
        };
        let mut stack = Vec::new();
        mentions(ty, &mut stack);
        let mut seen = HashSet::new();
        while let Some(name) = stack.pop() {
            if name == decl.name {
                recursive.insert(decl.name.clone());
                break;
            }
            if !seen.insert(name) {
                continue;
            }
            if let Some(TypeDecl {
                kind: DeclKind::Alias(next),
                ..
            }) = types.get(name)
            {
                mentions(next, &mut stack);
            }
        }
    }
    recursive
}

struct ModuleRenderer<'a> {
    rt: &'a syn::Path,
    /// `$id` of the module being rendered
    module_id: &'a str,
    /// `(holder, target)` references that must be boxed
    cyclic: HashSet<(String, DeclId)>,
    recursive_aliases: HashSet<String>,
}

impl ModuleRenderer<'_> {
    fn is_cyclic(&self, owner: Option<&str>, schema_id: &str, name: &str) -> bool {
        owner.is_some_and(|owner| {
            self.cyclic
                .contains(&(owner.to_string(), (schema_id.to_string(), name.to_string())))
        })
    }

    fn serde_attrs(&self) -> TokenStream {
        let rt = self.rt;
        let serde_crate = format!("{}::serde", quote!(#rt).to_string().replace(' ', ""));
        quote! {
            #[serde(crate = #serde_crate)]
        }
    }

    fn derives(&self, extra: TokenStream) -> TokenStream {
        let rt = self.rt;
        quote! {
            #[derive(
                ::std::fmt::Debug,
                ::std::clone::Clone,
                ::std::cmp::PartialEq,
                #extra
                #rt::serde::Serialize,
                #rt::serde::Deserialize
            )]
        }
    }

    fn render_decl(&self, decl: &TypeDecl) -> Result<TokenStream> {
        let doc = generate_doc_comment(decl.doc.as_deref());
        let ident = make_ident(&decl.name);

        let body = match &decl.kind {
            DeclKind::Struct(s) => self.render_struct(&decl.name, &ident, s),
            DeclKind::Enum(variants) => self.render_enum(&ident, variants),
            DeclKind::Union(variants) => self.render_union(&decl.name, &ident, variants),
            DeclKind::Alias(ty) if self.recursive_aliases.contains(&decl.name) => {
                let derives = self.derives(quote!());
                let serde = self.serde_attrs();
                let inner = self.rust_type(ty, Some(&decl.name));
                quote! {
                    #derives
                    #serde
                    #[serde(transparent)]
                    pub struct #ident(pub #inner);
                }
            }
            DeclKind::Alias(ty) => {
                let inner = self.rust_type(ty, None);
                quote! {
                    pub type #ident = #inner;
                }
            }
        };

        Ok(quote! {
            #doc
            #body
        })
    }

    fn render_struct(&self, name: &str, ident: &syn::Ident, s: &StructDecl) -> TokenStream {
        let derives = self.derives(quote!());
        let serde = self.serde_attrs();
        let deny = s.closed.then(|| quote! { #[serde(deny_unknown_fields)] });

        let mut used = HashSet::new();
        let mut fields = Vec::with_capacity(s.fields.len() + 1);

        for field in &s.fields {
            let field_ident = unique_field_ident(&field.name.to_snake_case(), &mut used);
            let doc = generate_doc_comment(field.doc.as_deref());
            let plain = field_ident.to_string();
            let rename = (plain.trim_start_matches("r#") != field.name).then(|| {
                let json_name = &field.name;
                quote! { #[serde(rename = #json_name)] }
            });

            let is_optional = matches!(field.ty, TypeRef::Optional(_));
            let ty = self.rust_type(&field.ty, Some(name));
            let (ty, attrs) = if field.required {
                (ty, quote!())
            } else if is_optional {
                (
                    ty,
                    quote! { #[serde(default, skip_serializing_if = "::std::option::Option::is_none")] },
                )
            } else {
                (
                    quote! { ::std::option::Option<#ty> },
                    quote! { #[serde(default, skip_serializing_if = "::std::option::Option::is_none")] },
                )
            };

            fields.push(quote! {
                #doc
                #rename
                #attrs
                pub #field_ident: #ty,
            });
        }

        match &s.extra {
            Some(ExtraFields::Typed(ty)) => {
                let extra_ident = unique_field_ident("extra", &mut used);
                let value = self.rust_type(ty, None);
                fields.push(quote! {
                    /// Members not listed in `properties`
                    #[serde(flatten)]
                    pub #extra_ident: ::std::collections::BTreeMap<::std::string::String, #value>,
                });
            }
            Some(ExtraFields::Open) => {
                // Open signatures are removed before rendering; keep them
                // representable anyway
                let extra_ident = unique_field_ident("extra", &mut used);
                let rt = self.rt;
                fields.push(quote! {
                    #[serde(flatten)]
                    pub #extra_ident: #rt::serde_json::Map<::std::string::String, #rt::serde_json::Value>,
                });
            }
            None => {}
        }

        quote! {
            #derives
            #serde
            #deny
            pub struct #ident {
                #(#fields)*
            }
        }
    }

    fn render_enum(&self, ident: &syn::Ident, variants: &[EnumVariant]) -> TokenStream {
        let derives = self.derives(quote! {
            ::std::marker::Copy,
            ::std::cmp::Eq,
            ::std::hash::Hash,
        });
        let serde = self.serde_attrs();

        let defs = variants.iter().map(|v| {
            let variant = make_ident(&v.name);
            let value = &v.value;
            quote! {
                #[serde(rename = #value)]
                #variant
            }
        });
        let arms = variants.iter().map(|v| {
            let variant = make_ident(&v.name);
            let value = &v.value;
            quote! { Self::#variant => #value }
        });

        quote! {
            #derives
            #serde
            pub enum #ident {
                #(#defs),*
            }

            impl #ident {
                /// JSON string value of the variant
                pub fn as_str(&self) -> &'static str {
                    match self {
                        #(#arms),*
                    }
                }
            }

            impl ::std::fmt::Display for #ident {
                fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                    f.write_str(self.as_str())
                }
            }
        }
    }

    fn render_union(&self, name: &str, ident: &syn::Ident, variants: &[UnionVariant]) -> TokenStream {
        let derives = self.derives(quote!());
        let serde = self.serde_attrs();

        let defs = variants.iter().map(|v| {
            let variant = make_ident(&v.name);
            let ty = self.rust_type(&v.ty, Some(name));
            quote! { #variant(#ty) }
        });

        quote! {
            #derives
            #serde
            #[serde(untagged)]
            pub enum #ident {
                #(#defs),*
            }
        }
    }

    /// Rust type for `ty`. With an `owner`, direct references that lead
    /// back to the owner, possibly through other modules, are boxed.
    fn rust_type(&self, ty: &TypeRef, owner: Option<&str>) -> TokenStream {
        let rt = self.rt;
        match ty {
            TypeRef::String => quote!(::std::string::String),
            TypeRef::Integer => quote!(#rt::Integer),
            TypeRef::Number => quote!(f64),
            TypeRef::Boolean => quote!(bool),
            TypeRef::Null => quote!(()),
            TypeRef::Any => quote!(#rt::serde_json::Value),
            TypeRef::Literal(value) => match value {
                Value::String(_) => quote!(::std::string::String),
                Value::Bool(_) => quote!(bool),
                Value::Null => quote!(()),
                Value::Number(n) if n.is_i64() || n.is_u64() => quote!(#rt::Integer),
                Value::Number(_) => quote!(f64),
                _ => quote!(#rt::serde_json::Value),
            },
            TypeRef::Array(inner) => {
                let inner = self.rust_type(inner, None);
                quote!(::std::vec::Vec<#inner>)
            }
            TypeRef::Map(inner) => {
                let inner = self.rust_type(inner, None);
                quote!(::std::collections::BTreeMap<::std::string::String, #inner>)
            }
            TypeRef::Optional(inner) => {
                let inner = self.rust_type(inner, owner);
                quote!(::std::option::Option<#inner>)
            }
            TypeRef::Named(name) => {
                let ident = make_ident(name);
                if self.is_cyclic(owner, self.module_id, name) {
                    quote!(::std::boxed::Box<#ident>)
                } else {
                    quote!(#ident)
                }
            }
            TypeRef::External { schema_id, name } => {
                let module = make_ident(&module_name(schema_id));
                let ident = make_ident(name);
                if self.is_cyclic(owner, schema_id, name) {
                    quote!(::std::boxed::Box<super::#module::#ident>)
                } else {
                    quote!(super::#module::#ident)
                }
            }
        }
    }
}

fn unique_field_ident(base: &str, used: &mut HashSet<String>) -> syn::Ident {
    let base = if base.is_empty() { "field" } else { base };
    let mut candidate = base.to_string();
    let mut n = 2;
    while !used.insert(make_ident(&candidate).to_string()) {
        candidate = format!("{base}_{n}");
        n += 1;
    }
    make_ident(&candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ImportEntry;
    use crate::registry::SchemaRegistry;
    use crate::schema::SchemaDocument;
    use crate::typegen::{close_objects, compile_document};
    use serde_json::json;

    fn render(schemas: Vec<Value>, id: &str) -> String {
        let registry = SchemaRegistry::from_documents(
            schemas
                .into_iter()
                .map(|s| SchemaDocument::from_value(s).expect("has $id")),
        )
        .expect("registry");
        let doc = registry.get(id).expect("doc");
        let plan = NamePlan::for_document(doc);
        let types = close_objects(compile_document(&registry, doc).expect("compiles"));
        let related = registry.related_schemas(id);
        let backend = RustBackend::new();
        let export = backend.export_name(id, &plan);
        backend
            .render_module(&ModuleContext {
                registry: &registry,
                document: doc,
                types: &types,
                plan: &plan,
                export: &export,
                related: &related,
            })
            .expect("renders")
    }

    #[test]
    fn module_names() {
        assert_eq!(module_name("token"), "token");
        assert_eq!(module_name("SolanaAccount"), "solana_account");
        assert_eq!(module_name("spl/token-2022"), "spl_token_2022");
        assert_eq!(module_name("type"), "type");
        assert_eq!(module_name("self"), "self_");
    }

    #[test]
    fn renders_parseable_module() {
        let out = render(
            vec![json!({
                "$id": "token",
                "description": "An SPL token",
                "type": "object",
                "properties": {
                    "mint": { "type": "string" },
                    "type": { "enum": ["fungible", "non-fungible"] },
                    "decimals": { "type": ["integer", "null"] }
                },
                "required": ["mint"]
            })],
            "token",
        );

        syn::parse_file(&out).expect("generated Rust parses");
        assert!(out.starts_with("// @generated by schemagen"));
        assert!(out.contains("pub struct Token {"));
        assert!(out.contains("pub r#type: ::std::option::Option<TokenType>"));
        assert!(out.contains("pub decimals: ::std::option::Option<schemagen_common::Integer>,"));
        assert!(out.contains("pub enum TokenType"));
        assert!(out.contains("#[serde(rename = \"non-fungible\")]"));
        assert!(out.contains("pub struct TokenSchema;"));
        assert!(out.contains("impl schemagen_common::SchemaBinding for TokenSchema"));
        assert!(out.contains("pub fn is_error("));
        // Open index signatures never reach the output
        assert!(!out.contains("flatten"));
        assert!(!out.contains("deny_unknown_fields"));
    }

    #[test]
    fn closed_and_recursive_types() {
        let out = render(
            vec![json!({
                "$id": "node",
                "type": "object",
                "additionalProperties": false,
                "properties": {
                    "next": { "$ref": "#" },
                    "children": { "type": "array", "items": { "$ref": "#" } }
                }
            })],
            "node",
        );

        syn::parse_file(&out).expect("generated Rust parses");
        assert!(out.contains("#[serde(deny_unknown_fields)]"));
        assert!(out.contains("::std::option::Option<::std::boxed::Box<Node>>"));
        assert!(out.contains("::std::vec::Vec<Node>"));
    }

    #[test]
    fn mutual_references_across_modules_are_boxed() {
        let schemas = vec![
            json!({ "$id": "a", "type": "object", "properties": { "b": { "$ref": "b" } } }),
            json!({ "$id": "b", "type": "object", "properties": { "a": { "$ref": "a" } } }),
        ];

        let a = render(schemas.clone(), "a");
        syn::parse_file(&a).expect("generated Rust parses");
        assert!(a.contains("pub b: ::std::option::Option<::std::boxed::Box<super::b::B>>,"));

        let b = render(schemas, "b");
        assert!(b.contains("pub a: ::std::option::Option<::std::boxed::Box<super::a::A>>,"));
    }

    #[test]
    fn references_behind_arrays_stay_unboxed() {
        let out = render(
            vec![
                json!({ "$id": "a", "type": "object", "properties": { "b": { "$ref": "b" } } }),
                json!({
                    "$id": "b",
                    "type": "object",
                    "properties": { "all": { "type": "array", "items": { "$ref": "a" } } }
                }),
            ],
            "a",
        );
        assert!(out.contains("pub b: ::std::option::Option<super::b::B>,"));
    }

    #[test]
    fn recursive_alias_becomes_newtype() {
        let out = render(
            vec![json!({
                "$id": "tree",
                "type": "array",
                "items": { "$ref": "#" }
            })],
            "tree",
        );
        syn::parse_file(&out).expect("generated Rust parses");
        assert!(out.contains("#[serde(transparent)]"));
        assert!(out.contains("pub struct Tree(pub ::std::vec::Vec<Tree>);"));
    }

    #[test]
    fn external_refs_and_related_schemas() {
        let out = render(
            vec![
                json!({ "$id": "token", "type": "object", "properties": { "mint": { "type": "string" } } }),
                json!({
                    "$id": "holder",
                    "type": "object",
                    "properties": { "token": { "$ref": "token" } },
                    "required": ["token"]
                }),
            ],
            "holder",
        );
        syn::parse_file(&out).expect("generated Rust parses");
        assert!(out.contains("pub token: super::token::Token,"));
        // The referenced schema is embedded for the runtime validator
        assert!(out.contains(r#"r#"{"$id":"token","#));
    }

    #[test]
    fn index_reexports_each_binding_once() {
        let backend = RustBackend::new();
        let mut imports = ImportMap::new();
        for (id, export) in [("a", "ASchema"), ("b", "BSchema")] {
            imports.insert(ImportEntry {
                id: id.into(),
                path: backend.module_path(id),
                export: export.into(),
            });
        }

        let out = backend.render_index(&imports).expect("renders");
        syn::parse_file(&out).expect("index parses");
        let reexports: Vec<_> = out.lines().filter(|l| l.starts_with("pub use ")).collect();
        assert_eq!(reexports, ["pub use a::ASchema;", "pub use b::BSchema;"]);
        assert!(out.find("pub mod a;") < out.find("pub mod b;"));
    }

    #[test]
    fn custom_runtime_crate_path() {
        let backend = RustBackend::with_runtime_crate("crate::rt");
        assert_eq!(backend.runtime_path().expect("path").segments.len(), 2);
        assert!(RustBackend::with_runtime_crate("not a path").runtime_path().is_err());
    }
}
