//! The declaration-side facts the type model needs.
//!
//! The type model never sees syntax or descriptors. Whatever owns them (the
//! resolver, or a fixture in tests) answers these queries, computing them
//! lazily if it likes. Implementations use interior mutability for their
//! caches, so every query goes through `&self`.

use crate::types::{TypeId, Variance};
use sema_common::DefId;

pub trait TypeEnvironment {
    /// Direct supertypes of `class`, expressed in terms of its own type
    /// parameters. Classes without an explicit supertype list report `Any`.
    fn supertypes(&self, class: DefId) -> Vec<TypeId>;

    /// Type parameters of `class`, in declaration order.
    fn type_parameters(&self, class: DefId) -> Vec<DefId>;

    fn variance(&self, type_param: DefId) -> Variance;

    /// Declared upper bound of a type parameter; `Any?` when none is given.
    fn upper_bound(&self, type_param: DefId) -> TypeId;

    /// The root class `Any`, when the built-ins are loaded.
    fn any_class(&self) -> Option<DefId>;

    /// Simple name used when rendering types.
    fn name_of(&self, def: DefId) -> String;
}
