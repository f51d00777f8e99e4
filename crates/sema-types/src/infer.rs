//! Constraint system for call-site type inference, built on union-find.
//!
//! Each type parameter of a candidate gets an inference variable. Argument
//! and expected types contribute bounds (`L <: α`, `α <: U`); invariant
//! positions unify a variable with a type outright. Solving picks, per
//! variable:
//! 1. the type it was unified with, if any
//! 2. otherwise the common supertype of its lower bounds
//! 3. otherwise the most specific of its upper bounds
//! 4. otherwise its declared upper bound
//!
//! and then validates every bound against the solution.

use crate::intern::TypeInterner;
use crate::lub::common_supertype;
use crate::recursion::{RecursionGuard, RecursionProfile, RecursionResult};
use crate::subst::Substitution;
use crate::subtype::SubtypeChecker;
use crate::types::{InferenceVar, TypeData, TypeId, Variance};
use ena::unify::{InPlaceUnificationTable, NoError, UnifyKey, UnifyValue};
use sema_common::DefId;
use tracing::trace;

/// Wrapper for TypeId to implement UnifyValue (avoiding orphan rule)
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct InferenceValue(pub Option<TypeId>);

impl UnifyKey for InferenceVar {
    type Value = InferenceValue;

    fn index(&self) -> u32 {
        self.0
    }

    fn from_index(u: u32) -> Self {
        InferenceVar(u)
    }

    fn tag() -> &'static str {
        "InferenceVar"
    }
}

impl UnifyValue for InferenceValue {
    type Error = NoError;

    fn unify_values(a: &Self, b: &Self) -> Result<Self, Self::Error> {
        match (a.0, b.0) {
            (None, None) => Ok(InferenceValue(None)),
            (Some(t), None) | (None, Some(t)) => Ok(InferenceValue(Some(t))),
            // Conflicts are rejected before unifying.
            (Some(a), Some(_)) => Ok(InferenceValue(Some(a))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InferenceError {
    /// A variable was fixed to two different types.
    Conflict(TypeId, TypeId),
    /// The solution for `var` violates one of its bounds.
    BoundsViolation {
        var: InferenceVar,
        lower: TypeId,
        upper: TypeId,
    },
}

/// Lower and upper bounds collected for one variable.
#[derive(Clone, Debug, Default)]
pub struct ConstraintSet {
    pub lower_bounds: Vec<TypeId>,
    pub upper_bounds: Vec<TypeId>,
}

impl ConstraintSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_lower_bound(&mut self, ty: TypeId) {
        if !self.lower_bounds.contains(&ty) {
            self.lower_bounds.push(ty);
        }
    }

    pub fn add_upper_bound(&mut self, ty: TypeId) {
        if !self.upper_bounds.contains(&ty) {
            self.upper_bounds.push(ty);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lower_bounds.is_empty() && self.upper_bounds.is_empty()
    }

    pub fn merge_from(&mut self, other: ConstraintSet) {
        for ty in other.lower_bounds {
            self.add_lower_bound(ty);
        }
        for ty in other.upper_bounds {
            self.add_upper_bound(ty);
        }
    }
}

struct VarInfo {
    param: DefId,
    /// Declared upper bound with the candidate's parameters already
    /// replaced by variables.
    declared_bound: Option<TypeId>,
}

/// Inference state for one candidate at one call site.
pub struct ConstraintSystem<'a> {
    interner: &'a TypeInterner,
    table: InPlaceUnificationTable<InferenceVar>,
    vars: Vec<VarInfo>,
    constraints: Vec<ConstraintSet>,
    guard: RecursionGuard<(TypeId, TypeId)>,
}

impl<'a> ConstraintSystem<'a> {
    pub fn new(interner: &'a TypeInterner) -> Self {
        ConstraintSystem {
            interner,
            table: InPlaceUnificationTable::new(),
            vars: Vec::new(),
            constraints: Vec::new(),
            guard: RecursionGuard::with_profile(RecursionProfile::ConstraintCollection),
        }
    }

    /// Create a variable standing for type parameter `param`.
    pub fn fresh_var(&mut self, param: DefId) -> InferenceVar {
        let var = self.table.new_key(InferenceValue(None));
        debug_assert_eq!(var.0 as usize, self.constraints.len());
        self.constraints.push(ConstraintSet::new());
        self.vars.push(VarInfo {
            param,
            declared_bound: None,
        });
        var
    }

    pub fn set_declared_bound(&mut self, var: InferenceVar, bound: TypeId) {
        if let Some(info) = self.vars.get_mut(var.0 as usize) {
            info.declared_bound = Some(bound);
        }
    }

    pub fn var_type(&self, var: InferenceVar) -> TypeId {
        self.interner.infer(var, false)
    }

    pub fn vars(&self) -> Vec<InferenceVar> {
        (0..self.vars.len() as u32).map(InferenceVar).collect()
    }

    pub fn param_of(&self, var: InferenceVar) -> Option<DefId> {
        self.vars.get(var.0 as usize).map(|info| info.param)
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn probe(&mut self, var: InferenceVar) -> Option<TypeId> {
        self.table.probe_value(var).0
    }

    pub fn unify_var_type(&mut self, var: InferenceVar, ty: TypeId) -> Result<(), InferenceError> {
        let root = self.table.find(var);
        match self.table.probe_value(root).0 {
            None => {
                self.table.union_value(root, InferenceValue(Some(ty)));
                Ok(())
            }
            Some(existing) if existing == ty || existing.is_error() || ty.is_error() => Ok(()),
            Some(existing) => Err(InferenceError::Conflict(existing, ty)),
        }
    }

    pub fn unify_vars(&mut self, a: InferenceVar, b: InferenceVar) -> Result<(), InferenceError> {
        let root_a = self.table.find(a);
        let root_b = self.table.find(b);
        if root_a == root_b {
            return Ok(());
        }
        let value_a = self.table.probe_value(root_a).0;
        let value_b = self.table.probe_value(root_b).0;
        if let (Some(a_ty), Some(b_ty)) = (value_a, value_b)
            && a_ty != b_ty
        {
            return Err(InferenceError::Conflict(a_ty, b_ty));
        }
        self.table
            .unify_var_var(root_a, root_b)
            .map_err(|_| InferenceError::Conflict(TypeId::ERROR, TypeId::ERROR))?;

        let new_root = self.table.find(root_a);
        let mut merged = ConstraintSet::new();
        merged.merge_from(std::mem::take(&mut self.constraints[root_a.0 as usize]));
        merged.merge_from(std::mem::take(&mut self.constraints[root_b.0 as usize]));
        self.constraints[new_root.0 as usize] = merged;
        Ok(())
    }

    pub fn add_lower_bound(&mut self, var: InferenceVar, ty: TypeId) {
        let root = self.table.find(var);
        self.constraints[root.0 as usize].add_lower_bound(ty);
    }

    pub fn add_upper_bound(&mut self, var: InferenceVar, ty: TypeId) {
        let root = self.table.find(var);
        self.constraints[root.0 as usize].add_upper_bound(ty);
    }

    pub fn constraints(&mut self, var: InferenceVar) -> &ConstraintSet {
        let root = self.table.find(var);
        &self.constraints[root.0 as usize]
    }

    // =========================================================================
    // Constraint collection
    // =========================================================================

    /// Record `sub <: sup`, where either side may mention variables.
    /// Returns `false` when the relation cannot hold whatever the variables
    /// turn out to be.
    pub fn add_subtype_constraint(
        &mut self,
        checker: &mut SubtypeChecker<'_>,
        sub: TypeId,
        sup: TypeId,
    ) -> bool {
        if sub == sup || sub.is_error() || sup.is_error() {
            return true;
        }
        let interner = self.interner;
        if let TypeData::Infer { var, nullable } = interner.lookup(sup) {
            let bound = if nullable {
                interner.make_non_null(sub)
            } else {
                sub
            };
            self.add_lower_bound(var, bound);
            return true;
        }
        if let TypeData::Infer { var, nullable } = interner.lookup(sub) {
            if nullable && !checker.accepts_null(sup) {
                return false;
            }
            self.add_upper_bound(var, sup);
            return true;
        }
        if !interner.contains_inference_vars(sub) && !interner.contains_inference_vars(sup) {
            return checker.is_subtype(sub, sup);
        }
        if let TypeData::Flexible { lower, .. } = interner.lookup(sub) {
            return self.add_subtype_constraint(checker, lower, sup);
        }
        if let TypeData::Flexible { upper, .. } = interner.lookup(sup) {
            return self.add_subtype_constraint(checker, sub, upper);
        }
        if sub == TypeId::NOTHING {
            return true;
        }
        if checker.may_be_null(sub) && !checker.accepts_null(sup) {
            return false;
        }

        let sub = interner.make_non_null(sub);
        let sup = interner.make_non_null(sup);
        match self.guard.enter((sub, sup)) {
            RecursionResult::Entered => {
                let result = self.collect_structural(checker, sub, sup);
                self.guard.leave((sub, sup));
                result
            }
            RecursionResult::Cycle => true,
            RecursionResult::DepthExceeded | RecursionResult::IterationExceeded => false,
        }
    }

    fn collect_structural(
        &mut self,
        checker: &mut SubtypeChecker<'_>,
        sub: TypeId,
        sup: TypeId,
    ) -> bool {
        let interner = self.interner;
        let env = checker.env();
        match (interner.lookup(sub), interner.lookup(sup)) {
            (_, TypeData::Class { def, .. }) if Some(def) == env.any_class() => true,
            (TypeData::Class { .. }, TypeData::Class { def: t_def, args: t_args, .. }) => {
                let Some(view) = checker.as_supertype(sub, t_def) else {
                    return false;
                };
                let TypeData::Class { args: s_args, .. } = interner.lookup(view) else {
                    return false;
                };
                if s_args.len() != t_args.len() {
                    return false;
                }
                let params = env.type_parameters(t_def);
                s_args.iter().zip(&t_args).enumerate().all(|(i, (&s, &t))| {
                    let variance = params
                        .get(i)
                        .map_or(Variance::Invariant, |&p| env.variance(p));
                    match variance {
                        Variance::Out => self.add_subtype_constraint(checker, s, t),
                        Variance::In => self.add_subtype_constraint(checker, t, s),
                        Variance::Invariant => self.add_equality_constraint(checker, s, t),
                    }
                })
            }
            (
                TypeData::Function {
                    params: s_params,
                    ret: s_ret,
                    ..
                },
                TypeData::Function {
                    params: t_params,
                    ret: t_ret,
                    ..
                },
            ) => {
                s_params.len() == t_params.len()
                    && t_params
                        .iter()
                        .zip(&s_params)
                        .all(|(&t, &s)| self.add_subtype_constraint(checker, t, s))
                    && self.add_subtype_constraint(checker, s_ret, t_ret)
            }
            (TypeData::TypeParam { def, .. }, _) => {
                let bound = interner.make_non_null(env.upper_bound(def));
                self.add_subtype_constraint(checker, bound, sup)
            }
            _ => false,
        }
    }

    /// Record `a == b` for an invariant position.
    pub fn add_equality_constraint(
        &mut self,
        checker: &mut SubtypeChecker<'_>,
        a: TypeId,
        b: TypeId,
    ) -> bool {
        let interner = self.interner;
        match (interner.lookup(a), interner.lookup(b)) {
            (TypeData::Infer { var: x, .. }, TypeData::Infer { var: y, .. }) => {
                self.unify_vars(x, y).is_ok()
            }
            (TypeData::Infer { var, nullable }, _) => self.unify_with(checker, var, nullable, b),
            (_, TypeData::Infer { var, nullable }) => self.unify_with(checker, var, nullable, a),
            _ => {
                self.add_subtype_constraint(checker, a, b) && self.add_subtype_constraint(checker, b, a)
            }
        }
    }

    fn unify_with(
        &mut self,
        checker: &mut SubtypeChecker<'_>,
        var: InferenceVar,
        nullable: bool,
        ty: TypeId,
    ) -> bool {
        if !nullable {
            return self.unify_var_type(var, ty).is_ok();
        }
        if !checker.accepts_null(ty) {
            return false;
        }
        let core = self.interner.make_non_null(ty);
        self.unify_var_type(var, core).is_ok()
    }

    // =========================================================================
    // Solving
    // =========================================================================

    /// Solution for the variables fixed so far: unified ones and those with
    /// variable-free lower bounds. Used to type lambda parameters before all
    /// arguments have been seen.
    pub fn partial_solution(&mut self, checker: &mut SubtypeChecker<'_>) -> Substitution {
        let mut subst = Substitution::new();
        for var in self.vars() {
            if let Some(ty) = self.probe(var) {
                subst.insert_var(var, ty);
                continue;
            }
            let lowers = self.closed_lower_bounds(var);
            if !lowers.is_empty() {
                subst.insert_var(var, common_supertype(checker, &lowers));
            }
        }
        subst
    }

    fn closed_lower_bounds(&mut self, var: InferenceVar) -> Vec<TypeId> {
        let interner = self.interner;
        self.constraints(var)
            .lower_bounds
            .iter()
            .copied()
            .filter(|&t| !interner.contains_inference_vars(t))
            .collect()
    }

    /// Fix every variable and validate all bounds against the result.
    pub fn solve(&mut self, checker: &mut SubtypeChecker<'_>) -> Result<Substitution, InferenceError> {
        let interner = self.interner;
        let mut subst = self.partial_solution(checker);

        for var in self.vars() {
            if subst.var(var).is_some() {
                continue;
            }
            let uppers: Vec<TypeId> = self
                .constraints(var)
                .upper_bounds
                .iter()
                .map(|&u| subst.apply(interner, u))
                .filter(|&u| !interner.contains_inference_vars(u))
                .collect();
            let result = match uppers.as_slice() {
                [] => {
                    let declared = self.vars[var.0 as usize].declared_bound;
                    match declared {
                        Some(bound) => self.close_over(checker, &subst, bound),
                        None => checker.any_type(true).unwrap_or(TypeId::ERROR),
                    }
                }
                [only] => *only,
                _ => uppers
                    .iter()
                    .copied()
                    .find(|&u| uppers.iter().all(|&o| checker.is_subtype(u, o)))
                    .unwrap_or(uppers[0]),
            };
            subst.insert_var(var, result);
        }

        for var in self.vars() {
            let Some(value) = subst.var(var) else {
                continue;
            };
            let set = self.constraints(var).clone();
            for lower in set.lower_bounds {
                let lower = self.close_over(checker, &subst, lower);
                if !checker.is_subtype(lower, value) {
                    trace!(var = var.0, "lower bound violated");
                    return Err(InferenceError::BoundsViolation {
                        var,
                        lower,
                        upper: value,
                    });
                }
            }
            let declared = self.vars[var.0 as usize].declared_bound;
            for upper in set.upper_bounds.into_iter().chain(declared) {
                let upper = self.close_over(checker, &subst, upper);
                if !checker.is_subtype(value, upper) {
                    trace!(var = var.0, "upper bound violated");
                    return Err(InferenceError::BoundsViolation {
                        var,
                        lower: value,
                        upper,
                    });
                }
            }
        }

        let mut solution = Substitution::new();
        for var in self.vars() {
            if let Some(value) = subst.var(var) {
                solution.insert_var(var, self.close_over(checker, &subst, value));
            }
        }
        Ok(solution)
    }

    /// Apply `subst`, replacing variables it does not cover with `Any?`.
    fn close_over(&self, checker: &SubtypeChecker<'_>, subst: &Substitution, ty: TypeId) -> TypeId {
        let applied = subst.apply(self.interner, ty);
        if !self.interner.contains_inference_vars(applied) {
            return applied;
        }
        let fallback = checker.any_type(true).unwrap_or(TypeId::ERROR);
        let mut rest = Substitution::new();
        for var in self.vars() {
            rest.insert_var(var, fallback);
        }
        rest.apply(self.interner, applied)
    }
}

#[cfg(test)]
#[path = "../tests/infer_tests.rs"]
mod infer_tests;
