//! Language-neutral type declarations produced from a schema

use serde_json::Value;

/// Reference to a type from a field, item or alias
#[derive(Debug, Clone, PartialEq)]
pub enum TypeRef {
    String,
    Integer,
    Number,
    Boolean,
    Null,
    /// Anything, the `{}` schema
    Any,
    /// Exact literal from `const`
    Literal(Value),
    Array(Box<TypeRef>),
    /// Object used as a string-keyed map
    Map(Box<TypeRef>),
    /// Nullable value
    Optional(Box<TypeRef>),
    /// Declaration in the same module
    Named(String),
    /// Declaration in another generated module
    External {
        /// `$id` of the schema whose module declares the type
        schema_id: String,
        name: String,
    },
}

impl TypeRef {
    pub fn array(item: TypeRef) -> Self {
        Self::Array(Box::new(item))
    }

    pub fn map(value: TypeRef) -> Self {
        Self::Map(Box::new(value))
    }

    /// Wrap in [`TypeRef::Optional`] unless already nullable
    pub fn nullable(self) -> Self {
        match self {
            Self::Optional(_) | Self::Null | Self::Any => self,
            other => Self::Optional(Box::new(other)),
        }
    }

    /// Declaration this refers to without indirection through a container,
    /// as `(schema $id, name)`. `module` is the `$id` of the module holding
    /// the reference.
    pub fn direct_target(&self, module: &str) -> Option<(String, String)> {
        match self {
            Self::Named(name) => Some((module.to_string(), name.clone())),
            Self::External { schema_id, name } => Some((schema_id.clone(), name.clone())),
            Self::Optional(inner) => inner.direct_target(module),
            _ => None,
        }
    }

    /// Every `External` reference inside this type
    pub fn externals(&self) -> Vec<(&str, &str)> {
        match self {
            Self::External { schema_id, name } => vec![(schema_id.as_str(), name.as_str())],
            Self::Array(inner) | Self::Map(inner) | Self::Optional(inner) => inner.externals(),
            _ => Vec::new(),
        }
    }
}

/// Extra, undeclared object members
#[derive(Debug, Clone, PartialEq)]
pub enum ExtraFields {
    /// Any key with any value; the open index signature a schema without
    /// `additionalProperties: false` implies
    Open,
    /// Any key with values of one type, from an `additionalProperties` schema
    Typed(TypeRef),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Property name as it appears in JSON
    pub name: String,
    pub ty: TypeRef,
    pub required: bool,
    pub doc: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructDecl {
    pub fields: Vec<Field>,
    pub extra: Option<ExtraFields>,
    /// `additionalProperties: false` was declared
    pub closed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumVariant {
    /// Identifier-safe variant name
    pub name: String,
    /// JSON string value
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnionVariant {
    pub name: String,
    pub ty: TypeRef,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeclKind {
    Struct(StructDecl),
    /// String enumeration
    Enum(Vec<EnumVariant>),
    /// Untagged alternatives from `oneOf`/`anyOf`
    Union(Vec<UnionVariant>),
    Alias(TypeRef),
}

/// A named type declaration
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDecl {
    pub name: String,
    pub doc: Option<String>,
    pub kind: DeclKind,
}

impl TypeDecl {
    /// Declarations this one refers to directly, by name
    pub fn references(&self) -> Vec<&TypeRef> {
        match &self.kind {
            DeclKind::Struct(s) => {
                let mut refs: Vec<&TypeRef> = s.fields.iter().map(|f| &f.ty).collect();
                if let Some(ExtraFields::Typed(ty)) = &s.extra {
                    refs.push(ty);
                }
                refs
            }
            DeclKind::Enum(_) => Vec::new(),
            DeclKind::Union(variants) => variants.iter().map(|v| &v.ty).collect(),
            DeclKind::Alias(ty) => vec![ty],
        }
    }
}

/// All declarations generated for one schema document
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleTypes {
    /// Name of the declaration for the document root
    pub main: String,
    /// Declarations in emission order, main first
    pub decls: Vec<TypeDecl>,
}

impl ModuleTypes {
    pub fn get(&self, name: &str) -> Option<&TypeDecl> {
        self.decls.iter().find(|d| d.name == name)
    }

    /// `(schema_id, type name)` pairs referenced from other modules, sorted
    /// and deduplicated
    pub fn externals(&self) -> Vec<(String, String)> {
        let mut externals: Vec<(String, String)> = self
            .decls
            .iter()
            .flat_map(|d| d.references())
            .flat_map(|ty| ty.externals())
            .map(|(id, name)| (id.to_string(), name.to_string()))
            .collect();
        externals.sort();
        externals.dedup();
        externals
    }
}
