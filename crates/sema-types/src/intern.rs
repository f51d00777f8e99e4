//! Type interning for structural deduplication.
//!
//! Converts [`TypeData`] structures into lightweight [`TypeId`] handles.
//! Interning goes through `&self`: the resolution core is single-threaded
//! and shares one interner by reference across every component of a
//! session, so the tables live behind `RefCell`s.

use crate::types::*;
use rustc_hash::FxHashMap;
use sema_common::DefId;
use std::cell::RefCell;

pub struct TypeInterner {
    map: RefCell<FxHashMap<TypeData, TypeId>>,
    types: RefCell<Vec<TypeData>>,
}

impl Default for TypeInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeInterner {
    pub fn new() -> Self {
        let interner = TypeInterner {
            map: RefCell::new(FxHashMap::default()),
            types: RefCell::new(Vec::with_capacity(256)),
        };
        let error = interner.intern(TypeData::Error);
        let nothing = interner.intern(TypeData::Nothing { nullable: false });
        let null = interner.intern(TypeData::Nothing { nullable: true });
        debug_assert_eq!(
            (error, nothing, null),
            (TypeId::ERROR, TypeId::NOTHING, TypeId::NULLABLE_NOTHING)
        );
        interner
    }

    pub fn intern(&self, data: TypeData) -> TypeId {
        if let Some(&id) = self.map.borrow().get(&data) {
            return id;
        }
        let mut types = self.types.borrow_mut();
        let id = TypeId(types.len() as u32);
        types.push(data.clone());
        self.map.borrow_mut().insert(data, id);
        id
    }

    /// Structural payload of `id`. Unknown ids read as [`TypeData::Error`].
    pub fn lookup(&self, id: TypeId) -> TypeData {
        self.types
            .borrow()
            .get(id.0 as usize)
            .cloned()
            .unwrap_or(TypeData::Error)
    }

    pub fn len(&self) -> usize {
        self.types.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // =========================================================================
    // Constructors
    // =========================================================================

    pub fn class(&self, def: DefId, args: impl IntoIterator<Item = TypeId>, nullable: bool) -> TypeId {
        self.intern(TypeData::Class {
            def,
            args: args.into_iter().collect(),
            nullable,
        })
    }

    pub fn type_param(&self, def: DefId, nullable: bool) -> TypeId {
        self.intern(TypeData::TypeParam { def, nullable })
    }

    pub fn function(&self, params: impl IntoIterator<Item = TypeId>, ret: TypeId, nullable: bool) -> TypeId {
        self.intern(TypeData::Function {
            params: params.into_iter().collect(),
            ret,
            nullable,
        })
    }

    pub fn infer(&self, var: InferenceVar, nullable: bool) -> TypeId {
        self.intern(TypeData::Infer { var, nullable })
    }

    /// Flexible type `lower..upper`. Degenerate pairs collapse to one bound;
    /// nested flexible bounds are flattened.
    pub fn flexible(&self, lower: TypeId, upper: TypeId) -> TypeId {
        let lower = self.lower_bound(lower);
        let upper = self.upper_bound(upper);
        if lower == upper || lower.is_error() || upper.is_error() {
            return lower;
        }
        self.intern(TypeData::Flexible { lower, upper })
    }

    /// Platform view of a type mention: `T` becomes `T..T?`.
    pub fn platform(&self, ty: TypeId) -> TypeId {
        if ty.is_error() || self.is_marked_nullable(ty) {
            return ty;
        }
        self.flexible(ty, self.make_nullable(ty))
    }

    /// `dynamic`: the flexible pair `Nothing..Any?`.
    pub fn dynamic(&self, nullable_any: TypeId) -> TypeId {
        self.intern(TypeData::Flexible {
            lower: TypeId::NOTHING,
            upper: nullable_any,
        })
    }

    pub fn is_dynamic(&self, ty: TypeId) -> bool {
        matches!(
            self.lookup(ty),
            TypeData::Flexible {
                lower: TypeId::NOTHING,
                ..
            }
        )
    }

    // =========================================================================
    // Nullability
    // =========================================================================

    pub fn is_marked_nullable(&self, ty: TypeId) -> bool {
        self.lookup(ty).is_marked_nullable()
    }

    pub fn is_flexible(&self, ty: TypeId) -> bool {
        matches!(self.lookup(ty), TypeData::Flexible { .. })
    }

    /// `T?`. For flexible types this is the upper bound.
    pub fn make_nullable(&self, ty: TypeId) -> TypeId {
        self.with_nullability(ty, true)
    }

    /// `T!!`. For flexible types this is the lower bound.
    pub fn make_non_null(&self, ty: TypeId) -> TypeId {
        self.with_nullability(ty, false)
    }

    fn with_nullability(&self, ty: TypeId, value: bool) -> TypeId {
        match self.lookup(ty) {
            TypeData::Error => ty,
            TypeData::Nothing { .. } => {
                if value {
                    TypeId::NULLABLE_NOTHING
                } else {
                    TypeId::NOTHING
                }
            }
            TypeData::Class { def, args, .. } => self.intern(TypeData::Class {
                def,
                args,
                nullable: value,
            }),
            TypeData::TypeParam { def, .. } => self.type_param(def, value),
            TypeData::Function { params, ret, .. } => self.intern(TypeData::Function {
                params,
                ret,
                nullable: value,
            }),
            TypeData::Infer { var, .. } => self.infer(var, value),
            TypeData::Flexible { lower, upper } => {
                if value {
                    self.make_nullable(upper)
                } else {
                    self.make_non_null(lower)
                }
            }
        }
    }

    /// The lower bound of a flexible type, or the type itself.
    pub fn lower_bound(&self, ty: TypeId) -> TypeId {
        match self.lookup(ty) {
            TypeData::Flexible { lower, .. } => lower,
            _ => ty,
        }
    }

    /// The upper bound of a flexible type, or the type itself.
    pub fn upper_bound(&self, ty: TypeId) -> TypeId {
        match self.lookup(ty) {
            TypeData::Flexible { upper, .. } => upper,
            _ => ty,
        }
    }

    /// Whether any inference variable occurs in `ty`.
    pub fn contains_inference_vars(&self, ty: TypeId) -> bool {
        match self.lookup(ty) {
            TypeData::Infer { .. } => true,
            TypeData::Class { args, .. } => args.iter().any(|&a| self.contains_inference_vars(a)),
            TypeData::Function { params, ret, .. } => {
                params.iter().any(|&p| self.contains_inference_vars(p))
                    || self.contains_inference_vars(ret)
            }
            TypeData::Flexible { lower, upper } => {
                self.contains_inference_vars(lower) || self.contains_inference_vars(upper)
            }
            TypeData::Error | TypeData::Nothing { .. } | TypeData::TypeParam { .. } => false,
        }
    }
}

#[cfg(test)]
#[path = "../tests/intern_tests.rs"]
mod intern_tests;
