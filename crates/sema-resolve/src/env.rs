//! Declaration facts for the type model.
//!
//! The subtype checker and the constraint system ask for supertypes, type
//! parameters, variance and bounds through [`TypeEnvironment`]. The context
//! answers from its lazy cells. Queries cannot fail: a cancelled token makes
//! them answer with defaults, and the next liveness check surfaces the
//! cancellation to the caller.

use crate::context::ResolveContext;
use sema_common::DefId;
use sema_types::{TypeEnvironment, TypeId, Variance};

impl TypeEnvironment for ResolveContext {
    fn supertypes(&self, class: DefId) -> Vec<TypeId> {
        self.class_supertypes(class)
            .map(|supertypes| supertypes.as_ref().clone())
            .unwrap_or_default()
    }

    fn type_parameters(&self, class: DefId) -> Vec<DefId> {
        self.class_by_def(class)
            .map(|c| c.type_parameters.clone())
            .unwrap_or_default()
    }

    fn variance(&self, type_param: DefId) -> Variance {
        self.type_parameter_by_def(type_param)
            .map(|p| p.variance)
            .unwrap_or(Variance::Invariant)
    }

    fn upper_bound(&self, type_param: DefId) -> TypeId {
        self.type_parameter_bound(type_param)
            .or_else(|_| self.builtins().nullable_any_type())
            .unwrap_or(TypeId::ERROR)
    }

    fn any_class(&self) -> Option<DefId> {
        self.builtins().class("Any").ok().flatten()
    }

    fn name_of(&self, def: DefId) -> String {
        match self.descriptor_by_def(def) {
            Some(descriptor) => self.text(descriptor.name()).to_string(),
            None => format!("<def {}>", def.0),
        }
    }
}
