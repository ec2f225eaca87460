//! Scope rules of the sample language.
//!
//! Functions and variables live in separate namespaces. A function declares
//! itself in its enclosing scope and opens an inheriting scope for its
//! parameters and body, so nothing inside a function leaks to its siblings.
//! Blocks chain one scope per `val` statement: a declaration is visible to
//! the statements after it, never to the ones before it or to its own
//! initializer.

use arbor_model::NodeId;
use arbor_sem::{Namespace, ScopeCx, ScopeId, ScopeRule, ScopeRuleSet, SemError};

pub const VARS: Namespace = Namespace("variables");
pub const FUNCS: Namespace = Namespace("functions");

struct FunctionRule;

impl ScopeRule for FunctionRule {
    fn apply(&self, node: NodeId, scope: ScopeId, cx: &mut ScopeCx<'_>) -> Result<(), SemError> {
        let name = cx.name_property(node, "name")?;
        cx.declare(scope, FUNCS, name.clone(), node);
        let inner = cx.new_scope(format!("function {name}"), scope, "parent");
        cx.traverse_children(node, inner);
        Ok(())
    }
}

struct ParameterRule;

impl ScopeRule for ParameterRule {
    fn apply(&self, node: NodeId, scope: ScopeId, cx: &mut ScopeCx<'_>) -> Result<(), SemError> {
        let name = cx.name_property(node, "name")?;
        cx.declare(scope, VARS, name, node);
        Ok(())
    }
}

struct BlockRule;

impl ScopeRule for BlockRule {
    fn apply(&self, node: NodeId, scope: ScopeId, cx: &mut ScopeCx<'_>) -> Result<(), SemError> {
        let mut current = cx.new_scope("block", scope, "parent");
        let statements: Vec<NodeId> = cx.node(node)?.children_in("statements").to_vec();
        for statement in statements {
            // The statement itself, its initializer included, sees the
            // scope as it was before the statement.
            cx.traverse(statement, current);
            if cx.node(statement)?.kind().as_str() == "val" {
                let name = cx.name_property(statement, "name")?;
                let next = cx.new_scope(format!("after {name}"), current, "parent");
                cx.declare(next, VARS, name, statement);
                current = next;
            }
        }
        Ok(())
    }
}

struct RefRule;

impl ScopeRule for RefRule {
    fn apply(&self, node: NodeId, scope: ScopeId, cx: &mut ScopeCx<'_>) -> Result<(), SemError> {
        cx.reference(node, "target", VARS, scope)
    }
}

/// The sample language's scope rule table. Kinds without a rule (`val`,
/// literals, `binary`) traverse their children under the incoming scope.
pub fn scope_rules() -> Result<ScopeRuleSet, SemError> {
    let mut rules = ScopeRuleSet::new();
    rules.register("function", Box::new(FunctionRule))?;
    rules.register("parameter", Box::new(ParameterRule))?;
    rules.register("block", Box::new(BlockRule))?;
    rules.register("ref", Box::new(RefRule))?;
    Ok(rules)
}
