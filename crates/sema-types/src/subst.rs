//! Type substitution.
//!
//! A [`Substitution`] maps type parameters (by `DefId`) and inference
//! variables to types. Applying it rebuilds the type bottom-up; a nullable
//! occurrence `T?` of a substituted parameter becomes the nullable form of
//! the replacement.

use crate::intern::TypeInterner;
use crate::types::{InferenceVar, TypeData, TypeId};
use rustc_hash::FxHashMap;
use sema_common::DefId;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Substitution {
    params: FxHashMap<DefId, TypeId>,
    vars: FxHashMap<InferenceVar, TypeId>,
}

impl Substitution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pairs `params[i]` with `args[i]`. Extra entries on either side are
    /// ignored; arity errors are reported by whoever built the arguments.
    pub fn from_params(params: &[DefId], args: &[TypeId]) -> Self {
        let mut subst = Self::new();
        for (&param, &arg) in params.iter().zip(args) {
            subst.insert_param(param, arg);
        }
        subst
    }

    pub fn insert_param(&mut self, param: DefId, ty: TypeId) {
        self.params.insert(param, ty);
    }

    pub fn insert_var(&mut self, var: InferenceVar, ty: TypeId) {
        self.vars.insert(var, ty);
    }

    pub fn param(&self, param: DefId) -> Option<TypeId> {
        self.params.get(&param).copied()
    }

    pub fn var(&self, var: InferenceVar) -> Option<TypeId> {
        self.vars.get(&var).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty() && self.vars.is_empty()
    }

    /// Compose: apply `self` to every replacement of `inner`, keeping
    /// entries of `self` that `inner` does not mention.
    pub fn then(&self, interner: &TypeInterner, inner: &Substitution) -> Substitution {
        let mut result = self.clone();
        for (&param, &ty) in &inner.params {
            result.params.insert(param, self.apply(interner, ty));
        }
        for (&var, &ty) in &inner.vars {
            result.vars.insert(var, self.apply(interner, ty));
        }
        result
    }

    pub fn apply(&self, interner: &TypeInterner, ty: TypeId) -> TypeId {
        if self.is_empty() {
            return ty;
        }
        match interner.lookup(ty) {
            TypeData::TypeParam { def, nullable } => match self.params.get(&def) {
                Some(&replacement) => nullable_if(interner, replacement, nullable),
                None => ty,
            },
            TypeData::Infer { var, nullable } => match self.vars.get(&var) {
                Some(&replacement) => nullable_if(interner, replacement, nullable),
                None => ty,
            },
            TypeData::Class {
                def,
                args,
                nullable,
            } => {
                if args.is_empty() {
                    return ty;
                }
                let args: Vec<TypeId> = args.iter().map(|&a| self.apply(interner, a)).collect();
                interner.class(def, args, nullable)
            }
            TypeData::Function {
                params,
                ret,
                nullable,
            } => {
                let params: Vec<TypeId> =
                    params.iter().map(|&p| self.apply(interner, p)).collect();
                let ret = self.apply(interner, ret);
                interner.function(params, ret, nullable)
            }
            TypeData::Flexible { lower, upper } => {
                interner.flexible(self.apply(interner, lower), self.apply(interner, upper))
            }
            TypeData::Error | TypeData::Nothing { .. } => ty,
        }
    }
}

fn nullable_if(interner: &TypeInterner, ty: TypeId, nullable: bool) -> TypeId {
    if nullable {
        interner.make_nullable(ty)
    } else {
        ty
    }
}
