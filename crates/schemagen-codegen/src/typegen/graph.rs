//! Reachability between declarations across generated modules

use super::compile_document;
use super::ir::ModuleTypes;
use crate::error::Result;
use crate::registry::SchemaRegistry;
use std::collections::{HashMap, HashSet};

/// A declaration, as `(schema $id, declaration name)`
pub type DeclId = (String, String);

/// Declarations of every registered document, compiled on first use, linked
/// by their direct (unboxed) references.
///
/// Arrays and maps hold their items on the heap and break a chain; plain
/// fields, nullable fields, union variants and aliases do not.
pub struct TypeGraph<'r> {
    registry: &'r SchemaRegistry,
    modules: HashMap<String, ModuleTypes>,
}

impl<'r> TypeGraph<'r> {
    pub fn new(registry: &'r SchemaRegistry) -> Self {
        Self {
            registry,
            modules: HashMap::new(),
        }
    }

    /// Use already compiled declarations for `id`
    pub fn insert(&mut self, id: &str, types: ModuleTypes) {
        self.modules.insert(id.to_string(), types);
    }

    fn module(&mut self, id: &str) -> Result<Option<&ModuleTypes>> {
        if !self.modules.contains_key(id) {
            let Some(doc) = self.registry.get(id) else {
                return Ok(None);
            };
            let types = compile_document(self.registry, doc)?;
            self.modules.insert(id.to_string(), types);
        }
        Ok(self.modules.get(id))
    }

    /// Declarations `decl` refers to directly
    pub fn direct_targets(&mut self, decl: &DeclId) -> Result<Vec<DeclId>> {
        let (id, name) = decl;
        let Some(types) = self.module(id)? else {
            return Ok(Vec::new());
        };
        Ok(types
            .get(name)
            .map(|d| {
                d.references()
                    .into_iter()
                    .filter_map(|ty| ty.direct_target(id))
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Whether following direct references from `from` leads to `to`
    pub fn reaches(&mut self, from: &DeclId, to: &DeclId) -> Result<bool> {
        let mut stack = vec![from.clone()];
        let mut seen = HashSet::new();
        while let Some(node) = stack.pop() {
            if &node == to {
                return Ok(true);
            }
            if !seen.insert(node.clone()) {
                continue;
            }
            stack.extend(self.direct_targets(&node)?);
        }
        Ok(false)
    }

    /// Direct references held by the declarations of `id` that lead back to
    /// the declaration holding them, as `(holder name, target)` pairs. These
    /// need indirection for the types to have a finite size.
    pub fn cyclic_refs(&mut self, id: &str) -> Result<HashSet<(String, DeclId)>> {
        let names: Vec<String> = match self.module(id)? {
            Some(types) => types.decls.iter().map(|d| d.name.clone()).collect(),
            None => return Ok(HashSet::new()),
        };

        let mut cyclic = HashSet::new();
        for name in names {
            let holder = (id.to_string(), name);
            for target in self.direct_targets(&holder)? {
                if self.reaches(&target, &holder)? {
                    cyclic.insert((holder.1.clone(), target));
                }
            }
        }
        Ok(cyclic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaDocument;
    use serde_json::{Value, json};

    fn registry(schemas: Vec<Value>) -> SchemaRegistry {
        SchemaRegistry::from_documents(
            schemas
                .into_iter()
                .map(|s| SchemaDocument::from_value(s).expect("has $id")),
        )
        .expect("registry")
    }

    fn decl(id: &str, name: &str) -> DeclId {
        (id.to_string(), name.to_string())
    }

    #[test]
    fn self_reference_within_a_module() {
        let registry = registry(vec![json!({
            "$id": "node",
            "type": "object",
            "properties": {
                "next": { "$ref": "#" },
                "children": { "type": "array", "items": { "$ref": "#" } }
            }
        })]);
        let mut graph = TypeGraph::new(&registry);

        assert!(graph.reaches(&decl("node", "Node"), &decl("node", "Node")).expect("graph"));
        let cyclic = graph.cyclic_refs("node").expect("graph");
        assert_eq!(cyclic, HashSet::from([("Node".to_string(), decl("node", "Node"))]));
    }

    #[test]
    fn mutual_references_across_modules() {
        let registry = registry(vec![
            json!({ "$id": "a", "type": "object", "properties": { "b": { "$ref": "b" } } }),
            json!({ "$id": "b", "type": "object", "properties": { "a": { "$ref": "a" } } }),
        ]);
        let mut graph = TypeGraph::new(&registry);

        assert!(graph.reaches(&decl("a", "A"), &decl("a", "A")).expect("graph"));
        assert!(graph.cyclic_refs("a").expect("graph").contains(&("A".to_string(), decl("b", "B"))));
        assert!(graph.cyclic_refs("b").expect("graph").contains(&("B".to_string(), decl("a", "A"))));
    }

    #[test]
    fn arrays_break_cycles() {
        let registry = registry(vec![
            json!({
                "$id": "a",
                "type": "object",
                "properties": { "b": { "type": "array", "items": { "$ref": "b" } } }
            }),
            json!({ "$id": "b", "type": "object", "properties": { "a": { "$ref": "a" } } }),
        ]);
        let mut graph = TypeGraph::new(&registry);

        assert!(graph.cyclic_refs("a").expect("graph").is_empty());
        assert!(graph.cyclic_refs("b").expect("graph").is_empty());
    }
}
