//! Inference rules of the sample language.
//!
//! Literals pin their variable to a concrete type. `val` equates with its
//! initializer, `ref` equates with whatever its reference resolves to
//! (blocking until scopes are built), and the arithmetic operators bound
//! their operands against `Num`. Rules demand queries before appending any
//! constraint, so a blocked attempt leaves no partial state behind.

use arbor_model::{NodeId, RefSlot, SchemaSet};
use arbor_query::QueryErr;
use arbor_sem::{InferenceRule, InferenceRuleSet, SemError, SemKey, Ty, TypeCx};

use crate::types::ArborTypes;

fn only_child(cx: &TypeCx<'_>, node: NodeId, slot: &str) -> Result<NodeId, QueryErr<SemKey>> {
    cx.node(node)?
        .children_in(slot)
        .first()
        .copied()
        .ok_or_else(|| QueryErr::fail(format!("missing '{slot}' child")))
}

/// Pins the node's variable to one concrete type.
struct LiteralRule {
    ty: Ty,
}

impl InferenceRule for LiteralRule {
    fn apply(&self, node: NodeId, cx: &mut TypeCx<'_>) -> Result<(), QueryErr<SemKey>> {
        let var = cx.var_of(node);
        cx.equate(var, self.ty);
        Ok(())
    }
}

struct ValRule;

impl InferenceRule for ValRule {
    fn apply(&self, node: NodeId, cx: &mut TypeCx<'_>) -> Result<(), QueryErr<SemKey>> {
        let expression = only_child(cx, node, "expression")?;
        let val_var = cx.var_of(node);
        let expr_var = cx.var_of(expression);
        cx.equate(val_var, expr_var);
        Ok(())
    }
}

/// Equates a `ref` with its resolved declaration, checking the target
/// against the kinds the schema's reference slot declares.
struct RefRule {
    schemas: SchemaSet,
}

impl InferenceRule for RefRule {
    fn apply(&self, node: NodeId, cx: &mut TypeCx<'_>) -> Result<(), QueryErr<SemKey>> {
        match cx.resolve(RefSlot::new(node, "target"))? {
            Some(declaration) => {
                let target_kind = cx.node(declaration)?.kind().clone();
                if !self
                    .schemas
                    .permits_reference_target(cx.node(node)?.kind(), "target", &target_kind)
                {
                    return Err(QueryErr::fail(format!(
                        "'{target_kind}' is not a permitted target for reference 'target'"
                    )));
                }
                let ref_var = cx.var_of(node);
                let decl_var = cx.var_of(declaration);
                cx.equate(ref_var, decl_var);
                Ok(())
            }
            None => {
                let name = cx
                    .node(node)?
                    .reference("target")
                    .map(|reference| reference.target.clone())
                    .unwrap_or_default();
                Err(QueryErr::fail(format!("unresolved reference '{name}'")))
            }
        }
    }
}

struct BinaryRule {
    types: ArborTypes,
}

impl InferenceRule for BinaryRule {
    fn apply(&self, node: NodeId, cx: &mut TypeCx<'_>) -> Result<(), QueryErr<SemKey>> {
        let op = cx
            .node(node)?
            .property("op")
            .and_then(|value| value.as_str())
            .map(str::to_string)
            .ok_or_else(|| QueryErr::fail("binary node without an 'op' property"))?;
        let left = only_child(cx, node, "left")?;
        let right = only_child(cx, node, "right")?;
        let left_var = cx.var_of(left);
        let right_var = cx.var_of(right);
        let result_var = cx.var_of(node);
        match op.as_str() {
            "-" => {
                cx.equate(result_var, self.types.num);
                cx.require_subtype(left_var, self.types.num);
                cx.require_subtype(right_var, self.types.num);
            }
            // Addition only bounds the result from below; it gets a
            // concrete type when something else equates it.
            "+" => {
                cx.require_subtype(left_var, result_var);
                cx.require_subtype(right_var, result_var);
            }
            other => {
                return Err(QueryErr::fail(format!("unsupported operator '{other}'")));
            }
        }
        Ok(())
    }
}

/// A parameter with a `type` annotation is pinned to it.
struct ParameterRule {
    types: ArborTypes,
}

impl InferenceRule for ParameterRule {
    fn apply(&self, node: NodeId, cx: &mut TypeCx<'_>) -> Result<(), QueryErr<SemKey>> {
        let annotation = cx
            .node(node)?
            .property("type")
            .and_then(|value| value.as_str())
            .map(str::to_string);
        let Some(annotation) = annotation else {
            return Ok(());
        };
        let ty = match annotation.as_str() {
            "Any" => self.types.any,
            "Num" => self.types.num,
            "Int" => self.types.int,
            "Str" => self.types.string,
            other => {
                return Err(QueryErr::fail(format!("unknown type annotation '{other}'")));
            }
        };
        let var = cx.var_of(node);
        cx.equate(var, ty);
        Ok(())
    }
}

/// The sample language's inference rule table. Kinds without a rule
/// contribute no constraints. The schemas feed the ref rule's target-kind
/// check.
pub fn inference_rules(
    types: ArborTypes,
    schemas: &SchemaSet,
) -> Result<InferenceRuleSet, SemError> {
    let mut rules = InferenceRuleSet::new();
    rules.register("number", Box::new(LiteralRule { ty: types.num }))?;
    rules.register("integer", Box::new(LiteralRule { ty: types.int }))?;
    rules.register("string", Box::new(LiteralRule { ty: types.string }))?;
    rules.register("val", Box::new(ValRule))?;
    rules.register(
        "ref",
        Box::new(RefRule {
            schemas: schemas.clone(),
        }),
    )?;
    rules.register("binary", Box::new(BinaryRule { types }))?;
    rules.register("parameter", Box::new(ParameterRule { types }))?;
    Ok(rules)
}
