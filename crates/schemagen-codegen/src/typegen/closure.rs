use super::ir::{DeclKind, ExtraFields, ModuleTypes};

/// Remove open index signatures from every struct.
///
/// Generated types are exact: a schema that merely fails to forbid extra
/// keys must not produce a type that carries `[k: string]: unknown` or a
/// catch-all map. Typed `additionalProperties` maps are kept.
pub fn close_objects(mut types: ModuleTypes) -> ModuleTypes {
    for decl in &mut types.decls {
        if let DeclKind::Struct(s) = &mut decl.kind {
            if matches!(s.extra, Some(ExtraFields::Open)) {
                s.extra = None;
            }
        }
    }
    types
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typegen::ir::{Field, StructDecl, TypeDecl, TypeRef};

    fn object(name: &str, extra: Option<ExtraFields>) -> TypeDecl {
        TypeDecl {
            name: name.to_string(),
            doc: None,
            kind: DeclKind::Struct(StructDecl {
                fields: vec![Field {
                    name: "id".into(),
                    ty: TypeRef::String,
                    required: true,
                    doc: None,
                }],
                extra,
                closed: false,
            }),
        }
    }

    #[test]
    fn strips_open_signature_keeps_typed_maps() {
        let types = ModuleTypes {
            main: "Open".into(),
            decls: vec![
                object("Open", Some(ExtraFields::Open)),
                object("Typed", Some(ExtraFields::Typed(TypeRef::Integer))),
            ],
        };

        let closed = close_objects(types);
        let extras: Vec<_> = closed
            .decls
            .iter()
            .map(|d| match &d.kind {
                DeclKind::Struct(s) => s.extra.clone(),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(extras, [None, Some(ExtraFields::Typed(TypeRef::Integer))]);
    }
}
