//! Node-kind schemas of the sample language.

use arbor_model::{Cardinality, ModelError, NodeSchema, PropertyType, SchemaSet};

/// Every node kind the sample language knows, with its descriptor table.
pub fn schema_set() -> Result<SchemaSet, ModelError> {
    let mut set = SchemaSet::new();
    set.register(
        NodeSchema::new("function")
            .property("name", PropertyType::Str)
            .child("parameters", Cardinality::Many)
            .child("body", Cardinality::One),
    )?;
    set.register(
        NodeSchema::new("parameter")
            .property("name", PropertyType::Str)
            .optional_property("type", PropertyType::Str),
    )?;
    set.register(NodeSchema::new("block").child("statements", Cardinality::Many))?;
    set.register(
        NodeSchema::new("val")
            .property("name", PropertyType::Str)
            .child("expression", Cardinality::One),
    )?;
    set.register(NodeSchema::new("number").property("value", PropertyType::Float))?;
    set.register(NodeSchema::new("integer").property("value", PropertyType::Int))?;
    set.register(NodeSchema::new("string").property("value", PropertyType::Str))?;
    set.register(
        NodeSchema::new("binary")
            .property("op", PropertyType::Str)
            .child("left", Cardinality::One)
            .child("right", Cardinality::One),
    )?;
    set.register(NodeSchema::new("ref").reference("target", ["val", "parameter"]))?;
    Ok(set)
}
