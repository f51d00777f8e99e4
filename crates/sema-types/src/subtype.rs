//! Subtyping and assignability.
//!
//! Rules, in the order they are tried:
//! - identical types and the error type are always compatible
//! - a flexible source is compared through its lower bound, a flexible
//!   target through its upper bound
//! - `Nothing` is below everything; `Nothing?` is below every type that
//!   accepts `null`
//! - a source that may be null needs a target that accepts `null`
//! - every non-null type is below `Any`
//! - instantiations of the same class compare their arguments according to
//!   the declaration-site variance of each parameter; otherwise the source's
//!   supertypes are searched with its type arguments substituted in
//! - a type parameter is below whatever its upper bound is below
//! - function types are contravariant in parameters and covariant in result

use crate::env::TypeEnvironment;
use crate::intern::TypeInterner;
use crate::recursion::{RecursionGuard, RecursionProfile, RecursionResult};
use crate::subst::Substitution;
use crate::types::{TypeData, TypeId, Variance};
use rustc_hash::FxHashSet;
use sema_common::DefId;
use sema_common::limits::MAX_COMMON_SUPERTYPE_CANDIDATES;
use std::collections::VecDeque;

/// Outcome of an assignability check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Compatibility {
    Compatible,
    /// Only the non-null bound of a platform type fits; a runtime null check
    /// is needed.
    CompatibleWithNullCheck,
    Incompatible,
}

impl Compatibility {
    pub fn is_compatible(self) -> bool {
        !matches!(self, Compatibility::Incompatible)
    }
}

pub struct SubtypeChecker<'a> {
    interner: &'a TypeInterner,
    env: &'a dyn TypeEnvironment,
    guard: RecursionGuard<(TypeId, TypeId)>,
}

impl<'a> SubtypeChecker<'a> {
    pub fn new(interner: &'a TypeInterner, env: &'a dyn TypeEnvironment) -> Self {
        SubtypeChecker {
            interner,
            env,
            guard: RecursionGuard::with_profile(RecursionProfile::SubtypeCheck),
        }
    }

    pub fn interner(&self) -> &'a TypeInterner {
        self.interner
    }

    pub fn env(&self) -> &'a dyn TypeEnvironment {
        self.env
    }

    /// `Any` as a type, if the built-ins are loaded.
    pub fn any_type(&self, nullable: bool) -> Option<TypeId> {
        self.env
            .any_class()
            .map(|any| self.interner.class(any, [], nullable))
    }

    pub fn is_subtype(&mut self, source: TypeId, target: TypeId) -> bool {
        if source == target || source.is_error() || target.is_error() {
            return true;
        }
        if let TypeData::Flexible { lower, .. } = self.interner.lookup(source) {
            return self.is_subtype(lower, target);
        }
        if let TypeData::Flexible { upper, .. } = self.interner.lookup(target) {
            return self.is_subtype(source, upper);
        }
        if source == TypeId::NOTHING {
            return true;
        }
        if self.may_be_null(source) && !self.accepts_null(target) {
            return false;
        }
        if source == TypeId::NULLABLE_NOTHING {
            return true;
        }

        let source = self.interner.make_non_null(source);
        let target = self.interner.make_non_null(target);
        match self.guard.enter((source, target)) {
            RecursionResult::Entered => {
                let result = self.check_non_null(source, target);
                self.guard.leave((source, target));
                result
            }
            // Assume the pair holds while it is being proven.
            RecursionResult::Cycle => true,
            RecursionResult::DepthExceeded | RecursionResult::IterationExceeded => false,
        }
    }

    fn check_non_null(&mut self, source: TypeId, target: TypeId) -> bool {
        if source == target {
            return true;
        }
        let target_data = self.interner.lookup(target);
        if target_data.class_def().is_some() && target_data.class_def() == self.env.any_class() {
            return true;
        }
        match (self.interner.lookup(source), target_data) {
            (_, TypeData::Nothing { .. }) => false,
            (TypeData::TypeParam { def: s, .. }, TypeData::TypeParam { def: t, .. }) if s == t => {
                true
            }
            (TypeData::TypeParam { def, .. }, _) => {
                let bound = self.interner.make_non_null(self.env.upper_bound(def));
                self.is_subtype(bound, target)
            }
            (
                TypeData::Class {
                    def: s_def,
                    args: s_args,
                    ..
                },
                TypeData::Class {
                    def: t_def,
                    args: t_args,
                    ..
                },
            ) => {
                if s_def == t_def {
                    return self.arguments_conform(t_def, &s_args, &t_args);
                }
                self.direct_supertypes(source)
                    .into_iter()
                    .any(|sup| self.is_subtype(sup, target))
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
                        .all(|(&t, &s)| self.is_subtype(t, s))
                    && self.is_subtype(s_ret, t_ret)
            }
            _ => false,
        }
    }

    /// Compare type arguments of two instantiations of `class`.
    pub fn arguments_conform(&mut self, class: DefId, source: &[TypeId], target: &[TypeId]) -> bool {
        if source.len() != target.len() {
            return false;
        }
        let params = self.env.type_parameters(class);
        source.iter().zip(target).enumerate().all(|(i, (&s, &t))| {
            let variance = params
                .get(i)
                .map_or(Variance::Invariant, |&p| self.env.variance(p));
            match variance {
                Variance::Out => self.is_subtype(s, t),
                Variance::In => self.is_subtype(t, s),
                Variance::Invariant => self.is_equivalent(s, t),
            }
        })
    }

    pub fn is_equivalent(&mut self, a: TypeId, b: TypeId) -> bool {
        a == b || (self.is_subtype(a, b) && self.is_subtype(b, a))
    }

    /// Assignability of a value of type `source` to a slot of type `target`.
    pub fn assignability(&mut self, source: TypeId, target: TypeId) -> Compatibility {
        if self.interner.is_dynamic(source) || self.interner.is_dynamic(target) {
            return Compatibility::Compatible;
        }
        match self.interner.lookup(source) {
            TypeData::Flexible { lower, upper } => {
                if self.is_subtype(upper, target) {
                    Compatibility::Compatible
                } else if self.is_subtype(lower, target) {
                    Compatibility::CompatibleWithNullCheck
                } else {
                    Compatibility::Incompatible
                }
            }
            _ if self.is_subtype(source, target) => Compatibility::Compatible,
            _ => Compatibility::Incompatible,
        }
    }

    /// Whether a value of this type may be `null`. Unmarked type parameters
    /// answer for their upper bound.
    pub fn may_be_null(&self, ty: TypeId) -> bool {
        let mut current = ty;
        for _ in 0..32 {
            match self.interner.lookup(current) {
                TypeData::Flexible { lower, .. } => current = lower,
                TypeData::TypeParam {
                    def,
                    nullable: false,
                } => current = self.env.upper_bound(def),
                data => return data.is_marked_nullable(),
            }
        }
        false
    }

    /// Whether a slot of this type accepts `null`. Unmarked type parameters
    /// never do.
    pub fn accepts_null(&self, ty: TypeId) -> bool {
        match self.interner.lookup(ty) {
            TypeData::Error => true,
            TypeData::Flexible { upper, .. } => self.interner.is_marked_nullable(upper),
            data => data.is_marked_nullable(),
        }
    }

    /// Direct supertypes of a non-null type, with type arguments substituted.
    pub fn direct_supertypes(&self, ty: TypeId) -> Vec<TypeId> {
        match self.interner.lookup(ty) {
            TypeData::Class { def, args, .. } => {
                let params = self.env.type_parameters(def);
                let subst = Substitution::from_params(&params, &args);
                self.env
                    .supertypes(def)
                    .into_iter()
                    .map(|sup| self.interner.make_non_null(subst.apply(self.interner, sup)))
                    .collect()
            }
            TypeData::TypeParam { def, .. } => {
                vec![self.interner.make_non_null(self.env.upper_bound(def))]
            }
            TypeData::Function { .. } => self.any_type(false).into_iter().collect(),
            TypeData::Flexible { lower, .. } => self.direct_supertypes(lower),
            _ => Vec::new(),
        }
    }

    /// Supertype closure of `ty` (itself first) in breadth-first order.
    pub fn supertype_closure(&self, ty: TypeId) -> Vec<TypeId> {
        let start = self.interner.make_non_null(self.interner.lower_bound(ty));
        let mut seen = FxHashSet::default();
        let mut order = Vec::new();
        let mut queue = VecDeque::from([start]);
        while let Some(current) = queue.pop_front() {
            if order.len() >= MAX_COMMON_SUPERTYPE_CANDIDATES {
                break;
            }
            if !seen.insert(current) {
                continue;
            }
            order.push(current);
            queue.extend(self.direct_supertypes(current));
        }
        order
    }

    /// The instantiation of `class` among the supertypes of `ty`.
    pub fn as_supertype(&self, ty: TypeId, class: DefId) -> Option<TypeId> {
        self.supertype_closure(ty)
            .into_iter()
            .find(|&t| self.interner.lookup(t).class_def() == Some(class))
    }
}

#[cfg(test)]
#[path = "../tests/subtype_tests.rs"]
mod subtype_tests;
