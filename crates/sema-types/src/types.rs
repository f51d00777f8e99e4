//! Semantic type representation.
//!
//! Types are interned: a [`TypeId`] is a `u32` handle into a
//! [`TypeInterner`](crate::TypeInterner), and two types are equal iff their
//! ids are equal. [`TypeData`] is the structural payload behind an id.
//!
//! Classes and type parameters are referred to by [`DefId`]; the type model
//! knows nothing about declarations beyond what a
//! [`TypeEnvironment`](crate::TypeEnvironment) tells it.

use sema_common::DefId;
use serde::Serialize;
use smallvec::SmallVec;

/// Handle to an interned type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TypeId(pub u32);

impl TypeId {
    /// The error/unknown sentinel. Compatible with everything so that one
    /// error does not cascade into more.
    pub const ERROR: TypeId = TypeId(0);
    /// `Nothing`, the bottom type.
    pub const NOTHING: TypeId = TypeId(1);
    /// `Nothing?`, the type of `null`.
    pub const NULLABLE_NOTHING: TypeId = TypeId(2);

    #[inline]
    pub fn is_error(self) -> bool {
        self == Self::ERROR
    }
}

pub type TypeList = SmallVec<[TypeId; 4]>;

/// An inference variable standing for a type parameter of a call candidate.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct InferenceVar(pub u32);

/// Declaration-site variance of a type parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Variance {
    Invariant,
    In,
    Out,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeData {
    Error,
    Nothing {
        nullable: bool,
    },
    /// A class or interface applied to type arguments.
    Class {
        def: DefId,
        args: TypeList,
        nullable: bool,
    },
    TypeParam {
        def: DefId,
        nullable: bool,
    },
    /// Platform type with uncertain nullability: any value of `lower..upper`.
    Flexible {
        lower: TypeId,
        upper: TypeId,
    },
    Function {
        params: TypeList,
        ret: TypeId,
        nullable: bool,
    },
    /// Placeholder for a type being inferred at a call site.
    Infer {
        var: InferenceVar,
        nullable: bool,
    },
}

impl TypeData {
    /// The `?` marker of the type itself. Flexible types answer for their
    /// lower bound; type parameters do not consult their bound.
    pub fn is_marked_nullable(&self) -> bool {
        match self {
            TypeData::Nothing { nullable }
            | TypeData::Class { nullable, .. }
            | TypeData::TypeParam { nullable, .. }
            | TypeData::Function { nullable, .. }
            | TypeData::Infer { nullable, .. } => *nullable,
            TypeData::Error | TypeData::Flexible { .. } => false,
        }
    }

    pub fn class_def(&self) -> Option<DefId> {
        match self {
            TypeData::Class { def, .. } => Some(*def),
            _ => None,
        }
    }
}
