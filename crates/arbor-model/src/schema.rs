//! Static per-node-kind schemas.
//!
//! A [`NodeSchema`] is a descriptor table for one node kind: which properties
//! it carries, which child slots it owns (with cardinality), and which
//! reference slots it declares (with permitted target kinds). Schemas are
//! ordinary
//! values registered up front; no runtime reflection is involved. A
//! [`SchemaSet`] validates an entire arena against its schemas before any
//! semantic evaluation runs, so structurally broken models fail at setup.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::arena::NodeArena;
use crate::error::ModelError;
use crate::node::{NodeKind, PropertyValue};

/// Declared value type of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyType {
    Str,
    Int,
    Float,
    Bool,
}

impl PropertyType {
    fn matches(self, value: &PropertyValue) -> bool {
        matches!(
            (self, value),
            (PropertyType::Str, PropertyValue::Str(_))
                | (PropertyType::Int, PropertyValue::Int(_))
                | (PropertyType::Float, PropertyValue::Float(_))
                | (PropertyType::Bool, PropertyValue::Bool(_))
        )
    }
}

/// How many children a slot may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cardinality {
    /// Exactly one child.
    One,
    /// Zero or one children.
    Optional,
    /// Any number of children, ordered.
    Many,
}

impl Cardinality {
    fn permits(self, count: usize) -> bool {
        match self {
            Cardinality::One => count == 1,
            Cardinality::Optional => count <= 1,
            Cardinality::Many => true,
        }
    }
}

/// Declaration of one property slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertySpec {
    pub name: String,
    pub ty: PropertyType,
    pub required: bool,
}

/// Declaration of one child slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChildSpec {
    pub name: String,
    pub cardinality: Cardinality,
}

/// Declaration of one reference slot and the kinds it may resolve to.
/// An empty kind list leaves the slot unconstrained.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefSpec {
    pub name: String,
    pub target_kinds: Vec<NodeKind>,
}

/// Descriptor table for a single node kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSchema {
    pub kind: NodeKind,
    pub properties: Vec<PropertySpec>,
    pub children: Vec<ChildSpec>,
    pub references: Vec<RefSpec>,
}

impl NodeSchema {
    pub fn new(kind: impl Into<NodeKind>) -> Self {
        NodeSchema {
            kind: kind.into(),
            properties: Vec::new(),
            children: Vec::new(),
            references: Vec::new(),
        }
    }

    pub fn property(mut self, name: &str, ty: PropertyType) -> Self {
        self.properties.push(PropertySpec {
            name: name.to_string(),
            ty,
            required: true,
        });
        self
    }

    pub fn optional_property(mut self, name: &str, ty: PropertyType) -> Self {
        self.properties.push(PropertySpec {
            name: name.to_string(),
            ty,
            required: false,
        });
        self
    }

    pub fn child(mut self, name: &str, cardinality: Cardinality) -> Self {
        self.children.push(ChildSpec {
            name: name.to_string(),
            cardinality,
        });
        self
    }

    pub fn reference<K: Into<NodeKind>>(
        mut self,
        name: &str,
        target_kinds: impl IntoIterator<Item = K>,
    ) -> Self {
        self.references.push(RefSpec {
            name: name.to_string(),
            target_kinds: target_kinds.into_iter().map(Into::into).collect(),
        });
        self
    }

    fn property_spec(&self, name: &str) -> Option<&PropertySpec> {
        self.properties.iter().find(|p| p.name == name)
    }

    fn child_spec(&self, name: &str) -> Option<&ChildSpec> {
        self.children.iter().find(|c| c.name == name)
    }

    /// The declaration of a reference slot, if the kind has one.
    pub fn reference_spec(&self, name: &str) -> Option<&RefSpec> {
        self.references.iter().find(|r| r.name == name)
    }
}

/// The registered schemas of a language's node kinds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaSet {
    schemas: IndexMap<NodeKind, NodeSchema>,
}

impl SchemaSet {
    pub fn new() -> Self {
        SchemaSet::default()
    }

    /// Registers a schema; a second schema for the same kind is rejected.
    pub fn register(&mut self, schema: NodeSchema) -> Result<(), ModelError> {
        if self.schemas.contains_key(&schema.kind) {
            return Err(ModelError::DuplicateSchema {
                kind: schema.kind.to_string(),
            });
        }
        self.schemas.insert(schema.kind.clone(), schema);
        Ok(())
    }

    pub fn get(&self, kind: &NodeKind) -> Option<&NodeSchema> {
        self.schemas.get(kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = &NodeKind> {
        self.schemas.keys()
    }

    /// Whether a reference slot on a node of `kind` may name a node of
    /// `target`. References can only be checked once resolution has picked
    /// a target, so this is a predicate for resolvers rather than part of
    /// [`SchemaSet::validate`]. Undeclared slots and empty kind lists are
    /// unconstrained.
    pub fn permits_reference_target(
        &self,
        kind: &NodeKind,
        slot: &str,
        target: &NodeKind,
    ) -> bool {
        match self.get(kind).and_then(|schema| schema.reference_spec(slot)) {
            Some(spec) => spec.target_kinds.is_empty() || spec.target_kinds.contains(target),
            None => true,
        }
    }

    /// Validates every node in the arena against its kind's schema.
    ///
    /// Does not stop at the first problem; all structural errors are
    /// collected and returned so a model author sees everything at once.
    pub fn validate(&self, arena: &NodeArena) -> Vec<ModelError> {
        let mut errors = Vec::new();
        for id in arena.ids() {
            let node = match arena.node(id) {
                Some(node) => node,
                None => continue,
            };
            let schema = match self.get(node.kind()) {
                Some(schema) => schema,
                None => {
                    errors.push(ModelError::UnknownKind {
                        node: id,
                        kind: node.kind().to_string(),
                    });
                    continue;
                }
            };

            for (name, value) in node.properties() {
                match schema.property_spec(name) {
                    Some(spec) => {
                        if !spec.ty.matches(value) {
                            errors.push(ModelError::PropertyTypeMismatch {
                                node: id,
                                name: name.clone(),
                                expected: spec.ty,
                            });
                        }
                    }
                    None => errors.push(ModelError::UndeclaredProperty {
                        node: id,
                        kind: node.kind().to_string(),
                        name: name.clone(),
                    }),
                }
            }
            for spec in &schema.properties {
                if spec.required && node.property(&spec.name).is_none() {
                    errors.push(ModelError::MissingProperty {
                        node: id,
                        kind: node.kind().to_string(),
                        name: spec.name.clone(),
                    });
                }
            }

            for (slot, children) in node.children() {
                match schema.child_spec(slot) {
                    Some(spec) => {
                        if !spec.cardinality.permits(children.len()) {
                            errors.push(ModelError::CardinalityViolation {
                                node: id,
                                slot: slot.clone(),
                                expected: spec.cardinality,
                                actual: children.len(),
                            });
                        }
                    }
                    None => errors.push(ModelError::UndeclaredChildSlot {
                        node: id,
                        kind: node.kind().to_string(),
                        slot: slot.clone(),
                    }),
                }
            }
            // Slots with cardinality One must be present at all.
            for spec in &schema.children {
                if spec.cardinality == Cardinality::One
                    && node.children_in(&spec.name).is_empty()
                {
                    errors.push(ModelError::CardinalityViolation {
                        node: id,
                        slot: spec.name.clone(),
                        expected: spec.cardinality,
                        actual: 0,
                    });
                }
            }

            for slot in node.references().keys() {
                if schema.reference_spec(slot).is_none() {
                    errors.push(ModelError::UndeclaredReference {
                        node: id,
                        kind: node.kind().to_string(),
                        slot: slot.clone(),
                    });
                }
            }
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn val_schema() -> NodeSchema {
        NodeSchema::new("val")
            .property("name", PropertyType::Str)
            .child("expression", Cardinality::One)
    }

    #[test]
    fn duplicate_schema_is_rejected() {
        let mut set = SchemaSet::new();
        set.register(val_schema()).unwrap();
        let result = set.register(val_schema());
        assert!(matches!(result, Err(ModelError::DuplicateSchema { .. })));
    }

    #[test]
    fn valid_tree_passes() {
        let mut set = SchemaSet::new();
        set.register(val_schema()).unwrap();
        set.register(NodeSchema::new("number").property("value", PropertyType::Int))
            .unwrap();

        let mut arena = NodeArena::new();
        let decl = arena.add_root("val");
        arena.set_property(decl, "name", "x").unwrap();
        let number = arena.add_child(decl, "expression", "number").unwrap();
        arena.set_property(number, "value", 1i64).unwrap();

        assert!(set.validate(&arena).is_empty());
    }

    #[test]
    fn unknown_kind_is_reported() {
        let set = SchemaSet::new();
        let mut arena = NodeArena::new();
        arena.add_root("mystery");
        let errors = set.validate(&arena);
        assert!(errors
            .iter()
            .any(|e| matches!(e, ModelError::UnknownKind { .. })));
    }

    #[test]
    fn undeclared_reference_slot_is_reported() {
        let mut set = SchemaSet::new();
        set.register(NodeSchema::new("ref")).unwrap();
        let mut arena = NodeArena::new();
        let reference = arena.add_root("ref");
        arena.set_reference(reference, "target", "x").unwrap();
        let errors = set.validate(&arena);
        assert!(errors
            .iter()
            .any(|e| matches!(e, ModelError::UndeclaredReference { .. })));
    }

    #[test]
    fn reference_targets_are_checked_against_declared_kinds() {
        let mut set = SchemaSet::new();
        set.register(NodeSchema::new("ref").reference("target", ["val", "parameter"]))
            .unwrap();
        set.register(NodeSchema::new("loose").reference("to", Vec::<NodeKind>::new()))
            .unwrap();

        let ref_kind = NodeKind::new("ref");
        assert!(set.permits_reference_target(&ref_kind, "target", &NodeKind::new("val")));
        assert!(set.permits_reference_target(&ref_kind, "target", &NodeKind::new("parameter")));
        assert!(!set.permits_reference_target(&ref_kind, "target", &NodeKind::new("function")));
        // Empty kind lists and undeclared slots constrain nothing.
        assert!(set.permits_reference_target(
            &NodeKind::new("loose"),
            "to",
            &NodeKind::new("function")
        ));
        assert!(set.permits_reference_target(&ref_kind, "other", &NodeKind::new("function")));
    }

    #[test]
    fn cardinality_one_requires_exactly_one_child() {
        let mut set = SchemaSet::new();
        set.register(val_schema()).unwrap();

        let mut arena = NodeArena::new();
        let decl = arena.add_root("val");
        arena.set_property(decl, "name", "x").unwrap();
        // No expression child at all.
        let errors = set.validate(&arena);
        assert!(errors
            .iter()
            .any(|e| matches!(e, ModelError::CardinalityViolation { actual: 0, .. })));
    }

    #[test]
    fn property_type_mismatch_is_reported() {
        let mut set = SchemaSet::new();
        set.register(val_schema()).unwrap();

        let mut arena = NodeArena::new();
        let decl = arena.add_root("val");
        arena.set_property(decl, "name", 3i64).unwrap();
        arena.add_child(decl, "expression", "val").unwrap();

        let errors = set.validate(&arena);
        assert!(errors
            .iter()
            .any(|e| matches!(e, ModelError::PropertyTypeMismatch { .. })));
    }

    #[test]
    fn collects_every_error_not_just_the_first() {
        let set = SchemaSet::new();
        let mut arena = NodeArena::new();
        arena.add_root("alpha");
        arena.add_root("beta");
        assert_eq!(set.validate(&arena).len(), 2);
    }
}
