//! Schema-to-type compiler
//!
//! Turns one [`SchemaDocument`] into [`ModuleTypes`]: the main declaration
//! for the document root, one declaration per definition, and any nested
//! inline objects, enums and unions hoisted into named declarations.
//!
//! Names are planned before compilation ([`NamePlan`]) so that references
//! between documents agree on what the target type is called.

pub mod closure;
pub mod graph;
pub mod ir;

pub use closure::close_objects;
pub use graph::{DeclId, TypeGraph};
pub use ir::{
    DeclKind, EnumVariant, ExtraFields, Field, ModuleTypes, StructDecl, TypeDecl, TypeRef,
    UnionVariant,
};

use crate::codegen::utils::value_to_variant_name;
use crate::error::{CodegenError, Result};
use crate::registry::SchemaRegistry;
use crate::sanitize::sanitize_identifier;
use crate::schema::SchemaDocument;
use heck::ToPascalCase;
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Names nothing may be called in any backend
const FORBIDDEN_NAMES: [&str; 1] = ["Self"];

/// Allocates unique declaration names within one module
#[derive(Debug, Clone, Default, PartialEq)]
struct Names {
    used: HashSet<String>,
}

impl Names {
    fn new() -> Self {
        Self {
            used: FORBIDDEN_NAMES.iter().map(|n| n.to_string()).collect(),
        }
    }

    /// Claim `base`, or `base2`, `base3`... if taken
    fn claim(&mut self, base: &str) -> String {
        let base = if base.is_empty() { "Type" } else { base };
        if self.used.insert(base.to_string()) {
            return base.to_string();
        }
        let mut n = 2;
        loop {
            let candidate = format!("{base}{n}");
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}

/// Type names decided for a document before its body is compiled
#[derive(Debug, Clone, PartialEq)]
pub struct NamePlan {
    main: String,
    binding: String,
    /// `(JSON pointer, type name)` per definition
    definitions: Vec<(String, String)>,
    names: Names,
}

impl NamePlan {
    pub fn for_document(doc: &SchemaDocument) -> Self {
        let mut names = Names::new();
        let main = names.claim(&SchemaRegistry::main_type_name(doc));
        let binding = names.claim(&format!("{main}Schema"));

        let definitions = doc
            .definitions()
            .into_iter()
            .map(|(key, pointer, _)| (pointer, names.claim(&sanitize_identifier(key))))
            .collect();

        Self {
            main,
            binding,
            definitions,
            names,
        }
    }

    /// Main type name
    pub fn main(&self) -> &str {
        &self.main
    }

    /// Name reserved for the binding that bundles the module's operations
    pub fn binding(&self) -> &str {
        &self.binding
    }

    /// Type name for a pointer into the document, if it names a declaration
    pub fn name_for_pointer(&self, pointer: &str) -> Option<&str> {
        if pointer.is_empty() {
            return Some(&self.main);
        }
        self.definitions
            .iter()
            .find(|(p, _)| p == pointer)
            .map(|(_, name)| name.as_str())
    }
}

/// Compile `doc` into its declarations. The open index signatures are still
/// present; run [`close_objects`] before rendering.
pub fn compile_document(registry: &SchemaRegistry, doc: &SchemaDocument) -> Result<ModuleTypes> {
    let plan = NamePlan::for_document(doc);
    let mut compiler = TypeCompiler {
        registry,
        doc,
        names: plan.names.clone(),
        decls: Vec::new(),
        inlining: HashSet::new(),
        plan,
    };

    let main = compiler.plan.main.clone();
    compiler.declare(&main, doc.schema())?;

    for (_, pointer, schema) in doc.definitions() {
        let name = compiler
            .plan
            .name_for_pointer(&pointer)
            .map(str::to_string)
            .ok_or_else(|| CodegenError::other(format!("no planned name for {pointer}")))?;
        compiler.declare(&name, schema)?;
    }

    Ok(ModuleTypes {
        main,
        decls: compiler.decls,
    })
}

struct TypeCompiler<'r> {
    registry: &'r SchemaRegistry,
    doc: &'r SchemaDocument,
    plan: NamePlan,
    names: Names,
    decls: Vec<TypeDecl>,
    /// Pointers currently being compiled inline, to stop ref cycles
    inlining: HashSet<String>,
}

fn describe(schema: &Value) -> Option<String> {
    schema
        .get("description")
        .or_else(|| schema.get("title"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// `type` keyword as a list, plus whether `"null"` was one of the entries
fn declared_types(map: &Map<String, Value>) -> (Vec<&str>, bool) {
    let types: Vec<&str> = match map.get("type") {
        Some(Value::String(t)) => vec![t.as_str()],
        Some(Value::Array(ts)) => ts.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    };
    let nullable = types.contains(&"null") && types.len() > 1;
    let types = if nullable {
        types.into_iter().filter(|t| *t != "null").collect()
    } else {
        types
    };
    (types, nullable)
}

fn is_object_like(map: &Map<String, Value>) -> bool {
    match declared_types(map).0.as_slice() {
        ["object"] => true,
        [] => map.contains_key("properties"),
        _ => false,
    }
}

fn is_null_schema(schema: &Value) -> bool {
    schema.get("type").and_then(Value::as_str) == Some("null")
        || schema.get("const").is_some_and(Value::is_null)
}

fn union_members(map: &Map<String, Value>) -> Option<&Vec<Value>> {
    map.get("oneOf")
        .or_else(|| map.get("anyOf"))
        .and_then(Value::as_array)
}

fn variant_name_for(ty: &TypeRef) -> String {
    match ty {
        TypeRef::Named(name) | TypeRef::External { name, .. } => name.clone(),
        TypeRef::String => "String".into(),
        TypeRef::Integer => "Integer".into(),
        TypeRef::Number => "Number".into(),
        TypeRef::Boolean => "Boolean".into(),
        TypeRef::Null => "Null".into(),
        TypeRef::Any => "Any".into(),
        TypeRef::Array(_) => "Array".into(),
        TypeRef::Map(_) => "Map".into(),
        TypeRef::Literal(Value::String(s)) => value_to_variant_name(s),
        TypeRef::Literal(_) => "Literal".into(),
        TypeRef::Optional(inner) => variant_name_for(inner),
    }
}

impl<'r> TypeCompiler<'r> {
    /// Compile `schema` into the declaration `name`, which must already be
    /// claimed. The declaration keeps its position ahead of anything hoisted
    /// while compiling it.
    fn declare(&mut self, name: &str, schema: &Value) -> Result<()> {
        self.declare_with(name, describe(schema), |this| this.decl_kind(name, schema))
    }

    fn declare_with(
        &mut self,
        name: &str,
        doc: Option<String>,
        build: impl FnOnce(&mut Self) -> Result<DeclKind>,
    ) -> Result<()> {
        let slot = self.decls.len();
        self.decls.push(TypeDecl {
            name: name.to_string(),
            doc,
            kind: DeclKind::Alias(TypeRef::Any),
        });
        let kind = build(self)?;
        self.decls[slot].kind = kind;
        Ok(())
    }

    /// Claim a name from `hint` and declare what `build` produces under it
    fn hoist(
        &mut self,
        hint: &str,
        doc: Option<String>,
        build: impl FnOnce(&mut Self, &str) -> Result<DeclKind>,
    ) -> Result<TypeRef> {
        let name = self.names.claim(hint);
        self.declare_with(&name, doc, |this| build(this, &name))?;
        Ok(TypeRef::Named(name))
    }

    fn decl_kind(&mut self, name: &str, schema: &Value) -> Result<DeclKind> {
        let Value::Object(map) = schema else {
            return Ok(DeclKind::Alias(TypeRef::Any));
        };

        if map.contains_key("$ref") || map.contains_key("const") {
            return Ok(DeclKind::Alias(self.type_ref(schema, name)?));
        }

        if let Some(values) = map.get("enum").and_then(Value::as_array) {
            if !values.is_empty() && values.iter().all(Value::is_string) {
                return Ok(DeclKind::Enum(self.enum_variants(values)));
            }
            return Ok(DeclKind::Alias(self.type_ref(schema, name)?));
        }

        if let Some(members) = union_members(map) {
            let mut variants = Vec::new();
            for (i, member) in members.iter().enumerate() {
                let ty = if is_null_schema(member) {
                    TypeRef::Null
                } else {
                    self.type_ref(member, &format!("{name}Variant{}", i + 1))?
                };
                variants.push(ty);
            }
            return Ok(DeclKind::Union(self.name_variants(variants)));
        }

        if let Some(merged) = self.merge_all_of(map)? {
            return self.decl_kind(name, &merged);
        }

        if is_object_like(map) {
            let has_properties = map
                .get("properties")
                .and_then(Value::as_object)
                .is_some_and(|p| !p.is_empty());
            let typed_map = map
                .get("additionalProperties")
                .and_then(Value::as_object)
                .is_some_and(|ap| !ap.is_empty());
            if has_properties || !typed_map {
                return Ok(DeclKind::Struct(self.struct_decl(name, map)?));
            }
        }

        Ok(DeclKind::Alias(self.type_ref(schema, name)?))
    }

    fn struct_decl(&mut self, name: &str, map: &Map<String, Value>) -> Result<StructDecl> {
        let required: HashSet<&str> = map
            .get("required")
            .and_then(Value::as_array)
            .map(|r| r.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        let mut fields = Vec::new();
        if let Some(properties) = map.get("properties").and_then(Value::as_object) {
            for (key, property) in properties {
                let hint = sanitize_identifier(&format!("{name}{}", key.to_pascal_case()));
                let ty = self.type_ref(property, &hint)?;
                fields.push(Field {
                    name: key.clone(),
                    ty,
                    required: required.contains(key.as_str()),
                    doc: describe(property),
                });
            }
        }

        let (extra, closed) = match map.get("additionalProperties") {
            Some(Value::Bool(false)) => (None, true),
            Some(ap) if ap.as_object().is_some_and(|m| !m.is_empty()) => {
                let ty = self.type_ref(ap, &format!("{name}Value"))?;
                (Some(ExtraFields::Typed(ty)), false)
            }
            _ => (Some(ExtraFields::Open), false),
        };

        Ok(StructDecl {
            fields,
            extra,
            closed,
        })
    }

    fn enum_variants(&self, values: &[Value]) -> Vec<EnumVariant> {
        let mut names = Names::new();
        values
            .iter()
            .filter_map(Value::as_str)
            .map(|value| EnumVariant {
                name: names.claim(&value_to_variant_name(value)),
                value: value.to_string(),
            })
            .collect()
    }

    fn name_variants(&self, variants: Vec<TypeRef>) -> Vec<UnionVariant> {
        let mut names = Names::new();
        variants
            .into_iter()
            .map(|ty| UnionVariant {
                name: names.claim(&variant_name_for(&ty)),
                ty,
            })
            .collect()
    }

    /// Merge `allOf` members into one object schema when every member is an
    /// object in this document. `None` when there is nothing to merge.
    fn merge_all_of(&self, map: &Map<String, Value>) -> Result<Option<Value>> {
        let Some(members) = map.get("allOf").and_then(Value::as_array) else {
            return Ok(None);
        };

        let mut properties = Map::new();
        let mut required: Vec<Value> = Vec::new();
        let mut closed = false;

        // Properties declared next to `allOf` merge like another member
        let own = map.contains_key("properties").then(|| {
            let mut own = map.clone();
            own.remove("allOf");
            own.remove("$id");
            Value::Object(own)
        });

        for member in members.iter().chain(own.as_ref()) {
            let member = match member.get("$ref").and_then(Value::as_str) {
                Some(r) => {
                    let target = self.registry.resolve_ref(self.doc, r)?;
                    if target.document.id() != self.doc.id() {
                        return Ok(Some(members[0].clone()));
                    }
                    target.document.pointer(target.pointer).unwrap_or(member)
                }
                None => member,
            };
            let Some(member_map) = member.as_object() else {
                continue;
            };
            if member_map.is_empty() {
                continue;
            }
            if !is_object_like(member_map) {
                return Ok(Some(members[0].clone()));
            }
            if let Some(props) = member_map.get("properties").and_then(Value::as_object) {
                for (k, v) in props {
                    properties.insert(k.clone(), v.clone());
                }
            }
            if let Some(req) = member_map.get("required").and_then(Value::as_array) {
                for r in req {
                    if !required.contains(r) {
                        required.push(r.clone());
                    }
                }
            }
            closed |= member_map.get("additionalProperties") == Some(&Value::Bool(false));
        }

        let mut merged = Map::new();
        merged.insert("type".into(), "object".into());
        if let Some(d) = map.get("description") {
            merged.insert("description".into(), d.clone());
        }
        merged.insert("properties".into(), Value::Object(properties));
        merged.insert("required".into(), Value::Array(required));
        if closed {
            merged.insert("additionalProperties".into(), Value::Bool(false));
        }
        Ok(Some(Value::Object(merged)))
    }

    fn ref_type(&mut self, ref_str: &str, hint: &str) -> Result<TypeRef> {
        let target = self.registry.resolve_ref(self.doc, ref_str)?;

        if target.document.id() == self.doc.id() {
            if let Some(name) = self.plan.name_for_pointer(target.pointer) {
                return Ok(TypeRef::Named(name.to_string()));
            }
            // Pointer into some other part of this document, compile inline
            let pointer = target.pointer.to_string();
            if !self.inlining.insert(pointer.clone()) {
                return Ok(TypeRef::Any);
            }
            let doc = self.doc;
            let schema = doc
                .pointer(&pointer)
                .ok_or_else(|| CodegenError::unknown_ref(ref_str, self.doc.id()))?;
            let ty = self.type_ref(schema, hint);
            self.inlining.remove(&pointer);
            return ty;
        }

        let other = NamePlan::for_document(target.document);
        match other.name_for_pointer(target.pointer) {
            Some(name) => Ok(TypeRef::External {
                schema_id: target.document.id().to_string(),
                name: name.to_string(),
            }),
            None => Err(CodegenError::unsupported(
                format!("reference `{ref_str}` into a non-definition location of another schema"),
                self.doc.id(),
                Some("Move the target under `definitions` in the referenced schema"),
            )),
        }
    }

    /// Type of a schema used in field, item or alias position. Objects,
    /// string enums and unions are hoisted into declarations named after
    /// `hint`.
    fn type_ref(&mut self, schema: &Value, hint: &str) -> Result<TypeRef> {
        let Value::Object(map) = schema else {
            return Ok(TypeRef::Any);
        };

        if let Some(r) = map.get("$ref").and_then(Value::as_str) {
            return self.ref_type(r, hint);
        }

        if let Some(value) = map.get("const") {
            return Ok(TypeRef::Literal(value.clone()));
        }

        if let Some(values) = map.get("enum").and_then(Value::as_array) {
            return self.enum_type(values, hint);
        }

        if let Some(members) = union_members(map) {
            let nullable = members.iter().any(is_null_schema);
            let non_null: Vec<&Value> = members.iter().filter(|m| !is_null_schema(m)).collect();
            let ty = match non_null.as_slice() {
                [] => TypeRef::Null,
                [single] => self.type_ref(single, hint)?,
                _ => self.hoist(hint, describe(schema), |this, name| {
                    let mut variants = Vec::new();
                    for (i, member) in non_null.iter().enumerate() {
                        variants.push(this.type_ref(member, &format!("{name}Variant{}", i + 1))?);
                    }
                    Ok(DeclKind::Union(this.name_variants(variants)))
                })?,
            };
            return Ok(if nullable { ty.nullable() } else { ty });
        }

        if let Some(merged) = self.merge_all_of(map)? {
            return self.type_ref(&merged, hint);
        }

        let (types, nullable) = declared_types(map);
        let ty = match types.as_slice() {
            ["string"] => TypeRef::String,
            ["integer"] => TypeRef::Integer,
            ["number"] => TypeRef::Number,
            ["boolean"] => TypeRef::Boolean,
            ["null"] => TypeRef::Null,
            ["array"] => self.array_type(map, hint)?,
            ["object"] => self.object_type(schema, map, hint)?,
            [] if map.contains_key("properties") => self.object_type(schema, map, hint)?,
            [] if map.contains_key("items") => self.array_type(map, hint)?,
            _ => TypeRef::Any,
        };
        Ok(if nullable { ty.nullable() } else { ty })
    }

    fn array_type(&mut self, map: &Map<String, Value>, hint: &str) -> Result<TypeRef> {
        let item = match map.get("items") {
            Some(items) if items.is_object() => self.type_ref(items, &format!("{hint}Item"))?,
            // Tuple forms have no single item type
            _ => TypeRef::Any,
        };
        Ok(TypeRef::array(item))
    }

    fn object_type(&mut self, schema: &Value, map: &Map<String, Value>, hint: &str) -> Result<TypeRef> {
        let has_properties = map
            .get("properties")
            .and_then(Value::as_object)
            .is_some_and(|p| !p.is_empty());

        if !has_properties {
            if let Some(ap) = map
                .get("additionalProperties")
                .filter(|ap| ap.as_object().is_some_and(|m| !m.is_empty()))
            {
                return Ok(TypeRef::map(self.type_ref(ap, &format!("{hint}Value"))?));
            }
        }

        self.hoist(hint, describe(schema), |this, name| {
            Ok(DeclKind::Struct(this.struct_decl(name, map)?))
        })
    }

    fn enum_type(&mut self, values: &[Value], hint: &str) -> Result<TypeRef> {
        let nullable = values.iter().any(Value::is_null);
        let non_null: Vec<Value> = values.iter().filter(|v| !v.is_null()).cloned().collect();

        let ty = if non_null.is_empty() {
            TypeRef::Null
        } else if non_null.iter().all(Value::is_string) {
            self.hoist(hint, None, |this, _| Ok(DeclKind::Enum(this.enum_variants(&non_null))))?
        } else if non_null.iter().all(|v| v.is_i64() || v.is_u64()) {
            TypeRef::Integer
        } else if non_null.iter().all(Value::is_number) {
            TypeRef::Number
        } else if non_null.iter().all(Value::is_boolean) {
            TypeRef::Boolean
        } else {
            TypeRef::Any
        };

        Ok(if nullable { ty.nullable() } else { ty })
    }
}
