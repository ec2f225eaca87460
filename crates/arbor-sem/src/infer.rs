//! The inference context: variables, constraints, and propagation.
//!
//! Every node of interest gets exactly one inference variable. Rules append
//! constraints; nothing is ever retracted. Propagation pushes concrete
//! assignments along equality edges to a fixpoint and then checks subtype
//! bounds against the lattice once both sides are concrete. There is no
//! search and no backtracking: a conflict is reported to the diagnostics
//! sink and the contradicting constraint is retired, while the rest of the
//! program keeps its answers.

use std::collections::BTreeSet;
use std::fmt;

use indexmap::IndexMap;

use arbor_model::{Node, NodeArena, NodeId, NodeKind, RefSlot};
use arbor_query::{QueryEngine, QueryErr, QueryStatus};

use crate::diag::Diagnostics;
use crate::lattice::TypeLattice;
use crate::queries::{Facts, SemKey, SemValue, RESOLVE};
use crate::table::Ty;

/// Handle to one inference variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarId(pub u32);

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Either side of a constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Term {
    Var(VarId),
    Ty(Ty),
}

impl From<VarId> for Term {
    fn from(var: VarId) -> Self {
        Term::Var(var)
    }
}

impl From<Ty> for Term {
    fn from(ty: Ty) -> Self {
        Term::Ty(ty)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    Equal(Term, Term),
    Subtype { sub: Term, sup: Term },
}

/// Append-only constraint store with one variable per node.
#[derive(Debug, Clone, Default)]
pub struct InferCx {
    vars: IndexMap<NodeId, VarId>,
    assignments: Vec<Option<Ty>>,
    constraints: Vec<Constraint>,
    /// Indices of constraints already reported as conflicts; retired from
    /// propagation so one contradiction is one diagnostic.
    reported: BTreeSet<usize>,
}

impl InferCx {
    pub fn new() -> Self {
        InferCx::default()
    }

    /// The node's inference variable, created on first access.
    pub fn var_of(&mut self, node: NodeId) -> VarId {
        if let Some(&var) = self.vars.get(&node) {
            return var;
        }
        let var = VarId(self.vars.len() as u32);
        self.vars.insert(node, var);
        self.assignments.push(None);
        var
    }

    pub fn node_of(&self, var: VarId) -> Option<NodeId> {
        self.vars.get_index(var.0 as usize).map(|(&node, _)| node)
    }

    pub fn assignment(&self, var: VarId) -> Option<Ty> {
        self.assignments.get(var.0 as usize).copied().flatten()
    }

    pub fn constrain(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    pub fn equal(&mut self, a: impl Into<Term>, b: impl Into<Term>) {
        self.constrain(Constraint::Equal(a.into(), b.into()));
    }

    pub fn subtype(&mut self, sub: impl Into<Term>, sup: impl Into<Term>) {
        self.constrain(Constraint::Subtype {
            sub: sub.into(),
            sup: sup.into(),
        });
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    fn term_ty(&self, term: Term) -> Option<Ty> {
        match term {
            Term::Ty(ty) => Some(ty),
            Term::Var(var) => self.assignment(var),
        }
    }

    fn term_node(&self, term: Term) -> Option<NodeId> {
        match term {
            Term::Var(var) => self.node_of(var),
            Term::Ty(_) => None,
        }
    }

    fn assign(&mut self, var: VarId, ty: Ty) {
        self.assignments[var.0 as usize] = Some(ty);
    }

    /// Runs propagation to a fixpoint. Returns whether any variable gained
    /// an assignment; once the store stops changing, further calls return
    /// false until new constraints arrive.
    pub fn propagate(&mut self, lattice: &mut TypeLattice, diagnostics: &mut Diagnostics) -> bool {
        let mut changed_any = false;
        loop {
            let mut changed = false;
            for index in 0..self.constraints.len() {
                if self.reported.contains(&index) {
                    continue;
                }
                let Constraint::Equal(a, b) = self.constraints[index] else {
                    continue;
                };
                match (self.term_ty(a), self.term_ty(b)) {
                    (Some(left), Some(right)) if left != right => {
                        self.report_conflict(index, a, b, left, right, lattice, diagnostics);
                    }
                    (Some(ty), None) => {
                        if let Term::Var(var) = b {
                            self.assign(var, ty);
                            changed = true;
                        }
                    }
                    (None, Some(ty)) => {
                        if let Term::Var(var) = a {
                            self.assign(var, ty);
                            changed = true;
                        }
                    }
                    _ => {}
                }
            }
            changed_any |= changed;
            if !changed {
                break;
            }
        }
        self.check_bounds(lattice, diagnostics);
        changed_any
    }

    fn report_conflict(
        &mut self,
        index: usize,
        a: Term,
        b: Term,
        left: Ty,
        right: Ty,
        lattice: &TypeLattice,
        diagnostics: &mut Diagnostics,
    ) {
        self.reported.insert(index);
        let node = self.term_node(a).or_else(|| self.term_node(b));
        diagnostics.error(
            format!(
                "conflicting types: {} is not {}",
                lattice.ty_name(left),
                lattice.ty_name(right)
            ),
            node,
        );
    }

    fn check_bounds(&mut self, lattice: &mut TypeLattice, diagnostics: &mut Diagnostics) {
        for index in 0..self.constraints.len() {
            if self.reported.contains(&index) {
                continue;
            }
            let Constraint::Subtype { sub, sup } = self.constraints[index] else {
                continue;
            };
            let (Some(sub_ty), Some(sup_ty)) = (self.term_ty(sub), self.term_ty(sup)) else {
                continue;
            };
            if !lattice.is_subtype_of(sub_ty, sup_ty) {
                self.reported.insert(index);
                let node = self.term_node(sub).or_else(|| self.term_node(sup));
                diagnostics.error(
                    format!(
                        "{} is not a subtype of {}",
                        lattice.ty_name(sub_ty),
                        lattice.ty_name(sup_ty)
                    ),
                    node,
                );
            }
        }
    }

    /// Final assignments in variable order. Variables without any concluded
    /// assignment get `default`; the caller chooses the policy explicitly.
    pub fn conclude(&self, default: Ty) -> Vec<(NodeId, Ty)> {
        self.vars
            .iter()
            .map(|(&node, &var)| {
                (node, self.assignment(var).unwrap_or(default))
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Inference rules
// ---------------------------------------------------------------------------

/// One node kind's contribution of constraints.
///
/// A rule may demand queries through the context and return
/// `Err(QueryErr::Blocked)` to be re-attempted once they resolve; the
/// attempt must leave no partial constraints behind, so rules demand first
/// and constrain last.
pub trait InferenceRule {
    fn apply(&self, node: NodeId, cx: &mut TypeCx<'_>) -> Result<(), QueryErr<SemKey>>;
}

/// Handle given to a running inference rule.
pub struct TypeCx<'a> {
    engine: &'a mut QueryEngine<Facts, SemKey, SemValue>,
    facts: &'a Facts,
    infer: &'a mut InferCx,
}

impl<'a> TypeCx<'a> {
    pub(crate) fn new(
        engine: &'a mut QueryEngine<Facts, SemKey, SemValue>,
        facts: &'a Facts,
        infer: &'a mut InferCx,
    ) -> Self {
        TypeCx {
            engine,
            facts,
            infer,
        }
    }

    pub fn arena(&self) -> &NodeArena {
        &self.facts.arena
    }

    pub fn node(&self, id: NodeId) -> Result<&Node, QueryErr<SemKey>> {
        self.facts
            .arena
            .node(id)
            .ok_or_else(|| QueryErr::fail(format!("no node {id} in the arena")))
    }

    pub fn var_of(&mut self, node: NodeId) -> VarId {
        self.infer.var_of(node)
    }

    pub fn equate(&mut self, a: impl Into<Term>, b: impl Into<Term>) {
        self.infer.equal(a, b);
    }

    pub fn require_subtype(&mut self, sub: impl Into<Term>, sup: impl Into<Term>) {
        self.infer.subtype(sub, sup);
    }

    /// The target of a reference, through the `resolve` query. Blocks until
    /// the scope solver has finished the reference's tree.
    pub fn resolve(&mut self, slot: RefSlot) -> Result<Option<NodeId>, QueryErr<SemKey>> {
        match self.engine.get(self.facts, RESOLVE, SemKey::Ref(slot)) {
            QueryStatus::Resolved(SemValue::Target(target)) => Ok(target),
            QueryStatus::Resolved(other) => Err(QueryErr::fail(format!(
                "resolve returned a non-target value {other:?}"
            ))),
            QueryStatus::Waiting(on) => Err(QueryErr::Blocked(on)),
            QueryStatus::Failed(failure) => Err(QueryErr::Failed(failure)),
        }
    }
}

/// Kind-keyed dispatch table for inference rules.
#[derive(Default)]
pub struct InferenceRuleSet {
    rules: IndexMap<NodeKind, Box<dyn InferenceRule>>,
}

impl InferenceRuleSet {
    pub fn new() -> Self {
        InferenceRuleSet::default()
    }

    pub fn register(
        &mut self,
        kind: impl Into<NodeKind>,
        rule: Box<dyn InferenceRule>,
    ) -> Result<(), crate::error::SemError> {
        let kind = kind.into();
        if self.rules.contains_key(&kind) {
            return Err(crate::error::SemError::DuplicateRule {
                kind: kind.as_str().to_string(),
            });
        }
        self.rules.insert(kind, rule);
        Ok(())
    }

    /// Dispatches to the kind's rule; kinds without one contribute nothing.
    pub fn apply(
        &self,
        kind: &NodeKind,
        node: NodeId,
        cx: &mut TypeCx<'_>,
    ) -> Result<(), QueryErr<SemKey>> {
        match self.rules.get(kind) {
            Some(rule) => rule.apply(node, cx),
            None => Ok(()),
        }
    }
}
