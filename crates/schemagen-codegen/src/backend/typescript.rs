//! TypeScript output: exact interfaces plus an `ajv` validator per schema

use super::{Backend, ImportMap, ModuleContext};
use crate::codegen::output::generated_header;
use crate::codegen::utils::{is_js_identifier, js_string};
use crate::error::{CodegenError, Result};
use crate::sanitize::sanitize_identifier;
use crate::typegen::{DeclKind, ExtraFields, NamePlan, StructDecl, TypeDecl, TypeRef};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::fmt::Write;
use std::path::{Path, PathBuf};

/// Names every module declares at top level; an export may not reuse them
const MODULE_LOCALS: &[&str] = &[
    "Ajv",
    "ValidationError",
    "ajv",
    "schema",
    "validator",
    "validate",
    "get",
    "isError",
];

const RUNTIME_MODULE: &str = "runtime";

const RUNTIME_TS: &str = r#"/** Thrown by `get` when a value does not satisfy its schema. */
export class ValidationError extends Error {
  constructor(message: string) {
    super(message);
    this.name = "ValidationError";
  }
}
"#;

/// File stem for a schema `$id`
pub fn module_stem(id: &str) -> String {
    let stem: String = id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '$') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let stem = stem.trim_start_matches('.');
    if stem.is_empty() {
        "schema".to_string()
    } else {
        stem.to_string()
    }
}

#[derive(Debug, Clone, Default)]
pub struct TypeScriptBackend;

impl TypeScriptBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Backend for TypeScriptBackend {
    fn name(&self) -> &'static str {
        "typescript"
    }

    fn module_path(&self, id: &str) -> PathBuf {
        PathBuf::from(format!("{}.ts", module_stem(id)))
    }

    fn index_path(&self) -> PathBuf {
        PathBuf::from("index.ts")
    }

    fn support_files(&self) -> Vec<(PathBuf, String)> {
        vec![(
            PathBuf::from(format!("{RUNTIME_MODULE}.ts")),
            format!("{}{RUNTIME_TS}", generated_header(None)),
        )]
    }

    /// The `$id` itself when it is a usable identifier, else its sanitized
    /// form
    fn export_name(&self, id: &str, plan: &NamePlan) -> String {
        if is_js_identifier(id) && !MODULE_LOCALS.contains(&id) {
            return id.to_string();
        }
        let sanitized = sanitize_identifier(id);
        if sanitized.is_empty() || MODULE_LOCALS.contains(&sanitized.as_str()) {
            format!("{}Schema", plan.main())
        } else {
            sanitized
        }
    }

    fn render_module(&self, ctx: &ModuleContext<'_>) -> Result<String> {
        let id = ctx.document.id();
        let mut out = generated_header(Some(id));
        let mut renderer = ModuleRenderer::new(ctx);

        let mut decls = String::new();
        for decl in &ctx.types.decls {
            renderer.render_decl(decl, &mut decls)?;
        }

        let fmt_err = |e: std::fmt::Error| CodegenError::Other {
            message: format!("failed to render module `{id}`"),
            source: Some(Box::new(e)),
        };

        writeln!(out, "import Ajv from \"ajv\";").map_err(fmt_err)?;
        writeln!(out, "import {{ ValidationError }} from \"./{RUNTIME_MODULE}\";").map_err(fmt_err)?;
        for (module, names) in &renderer.imports {
            let names: Vec<String> = names
                .iter()
                .map(|(name, local)| {
                    if name == local {
                        name.clone()
                    } else {
                        format!("{name} as {local}")
                    }
                })
                .collect();
            writeln!(out, "import type {{ {} }} from \"./{module}\";", names.join(", ")).map_err(fmt_err)?;
        }
        out.push('\n');

        writeln!(out, "const ajv = new Ajv({{ allErrors: true }});").map_err(fmt_err)?;
        for doc in ctx.related {
            writeln!(out, "ajv.addSchema({});", to_json(doc.schema(), doc.id())?).map_err(fmt_err)?;
        }
        writeln!(out, "const schema = {};", to_json(ctx.document.schema(), id)?).map_err(fmt_err)?;
        writeln!(out, "const validator = ajv.compile(schema);").map_err(fmt_err)?;
        out.push('\n');

        out.push_str(&decls);

        let main = &ctx.types.main;
        write!(
            out,
            r#"/** Run the schema validator. Failures are kept in `validator.errors`. */
function validate(value: unknown): value is {main} {{
  return validator(value) as boolean;
}}

/** Validate `value` and return it typed as `{main}`. */
function get(value: unknown): {main} {{
  if (!validate(value)) {{
    throw new ValidationError(JSON.stringify(validator.errors));
  }}
  return value;
}}

/** Whether `value` has a defined, non-null `error` member. */
function isError(value: unknown): value is {{ error: unknown }} {{
  return (
    typeof value === "object" &&
    value !== null &&
    (value as {{ error?: unknown }}).error !== undefined &&
    (value as {{ error?: unknown }}).error !== null
  );
}}

export const {export} = {{ validate, get, isError }};
"#,
            export = ctx.export,
        )
        .map_err(fmt_err)?;

        Ok(out)
    }

    fn render_index(&self, imports: &ImportMap) -> Result<String> {
        let mut out = generated_header(None);
        for entry in imports.iter() {
            let specifier = format!("./{}", import_specifier(&entry.path));
            out.push_str(&format!(
                "export {{ {} }} from {};\n",
                entry.export,
                js_string(&specifier)
            ));
        }
        Ok(out)
    }
}

/// Module specifier for a `.ts` file: the path without its extension
fn import_specifier(path: &Path) -> String {
    path.with_extension("")
        .to_string_lossy()
        .replace(std::path::MAIN_SEPARATOR, "/")
}

fn to_json(schema: &Value, id: &str) -> Result<String> {
    serde_json::to_string_pretty(schema)
        .map_err(|e| CodegenError::other(format!("failed to serialize schema `{id}`: {e}")))
}

fn doc_comment(doc: Option<&str>, indent: &str) -> String {
    let Some(doc) = doc else {
        return String::new();
    };
    let doc = doc.trim().replace("*/", "*\\/");
    if !doc.contains('\n') {
        return format!("{indent}/** {doc} */\n");
    }
    let mut out = format!("{indent}/**\n");
    for line in doc.lines() {
        out.push_str(&format!("{indent} * {}\n", line.trim_end()).replace(" * \n", " *\n"));
    }
    out.push_str(&format!("{indent} */\n"));
    out
}

fn property_key(name: &str) -> String {
    if is_js_identifier(name) {
        name.to_string()
    } else {
        js_string(name)
    }
}

struct ModuleRenderer {
    /// Local names of the module's own declarations
    locals: HashSet<String>,
    /// module specifier -> (exported name -> local name)
    imports: BTreeMap<String, BTreeMap<String, String>>,
}

impl ModuleRenderer {
    fn new(ctx: &ModuleContext<'_>) -> Self {
        Self {
            locals: ctx.types.decls.iter().map(|d| d.name.clone()).collect(),
            imports: BTreeMap::new(),
        }
    }

    /// Local name for a type declared in another module, importing it
    fn external(&mut self, schema_id: &str, name: &str) -> String {
        let module = module_stem(schema_id);
        if let Some(local) = self.imports.get(&module).and_then(|m| m.get(name)) {
            return local.clone();
        }

        let taken = |candidate: &str, imports: &BTreeMap<String, BTreeMap<String, String>>| {
            imports.values().any(|m| m.values().any(|l| l == candidate))
        };
        let mut local = name.to_string();
        if self.locals.contains(&local) || taken(&local, &self.imports) {
            local = format!("{name}From{}", sanitize_identifier(schema_id));
            let base = local.clone();
            let mut n = 2;
            while self.locals.contains(&local) || taken(&local, &self.imports) {
                local = format!("{base}{n}");
                n += 1;
            }
        }

        self.imports
            .entry(module)
            .or_default()
            .insert(name.to_string(), local.clone());
        local
    }

    fn ts_type(&mut self, ty: &TypeRef) -> String {
        match ty {
            TypeRef::String => "string".into(),
            TypeRef::Integer | TypeRef::Number => "number".into(),
            TypeRef::Boolean => "boolean".into(),
            TypeRef::Null => "null".into(),
            TypeRef::Any => "unknown".into(),
            TypeRef::Literal(value) => match value {
                Value::String(s) => js_string(s),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Null => "null".into(),
                _ => "unknown".into(),
            },
            TypeRef::Array(inner) => format!("Array<{}>", self.ts_type(inner)),
            TypeRef::Map(inner) => format!("Record<string, {}>", self.ts_type(inner)),
            TypeRef::Optional(inner) => format!("{} | null", self.ts_type(inner)),
            TypeRef::Named(name) => name.clone(),
            TypeRef::External { schema_id, name } => self.external(schema_id, name),
        }
    }

    fn render_decl(&mut self, decl: &TypeDecl, out: &mut String) -> Result<()> {
        out.push_str(&doc_comment(decl.doc.as_deref(), ""));
        let name = &decl.name;
        match &decl.kind {
            DeclKind::Struct(s) => {
                let body = self.object_body(s);
                match &s.extra {
                    Some(ExtraFields::Typed(ty)) => {
                        let value = self.ts_type(ty);
                        out.push_str(&format!(
                            "export type {name} = {body} & Record<string, {value}>;\n\n"
                        ));
                    }
                    // Open signatures are removed before rendering
                    Some(ExtraFields::Open) | None => {
                        out.push_str(&format!("export interface {name} {body}\n\n"));
                    }
                }
            }
            DeclKind::Enum(variants) => {
                let values: Vec<String> = variants.iter().map(|v| js_string(&v.value)).collect();
                out.push_str(&format!("export type {name} = {};\n\n", values.join(" | ")));
            }
            DeclKind::Union(variants) => {
                let tys: Vec<String> = variants.iter().map(|v| self.ts_type(&v.ty)).collect();
                out.push_str(&format!("export type {name} = {};\n\n", tys.join(" | ")));
            }
            DeclKind::Alias(ty) => {
                let ty = self.ts_type(ty);
                out.push_str(&format!("export type {name} = {ty};\n\n"));
            }
        }
        Ok(())
    }

    fn object_body(&mut self, s: &StructDecl) -> String {
        if s.fields.is_empty() {
            return "{}".to_string();
        }
        let mut body = String::from("{\n");
        for field in &s.fields {
            body.push_str(&doc_comment(field.doc.as_deref(), "  "));
            let optional = if field.required { "" } else { "?" };
            let ty = self.ts_type(&field.ty);
            body.push_str(&format!("  {}{optional}: {ty};\n", property_key(&field.name)));
        }
        body.push('}');
        body
    }
}
