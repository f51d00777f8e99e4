//! Member lookup on types.
//!
//! Each class gets a [`MemberIndex`] of its own declared members, built on
//! first use. Lookups on a type walk its supertype closure, substituting the
//! class's type arguments into every member signature found on the way.

use crate::context::ResolveContext;
use crate::descriptors::{FunctionDescriptor, PropertyDescriptor};
use crate::error::ResolveResult;
use rustc_hash::FxHashMap;
use sema_common::{Atom, DefId};
use sema_syntax::{NodeIndex, NodeKind};
use sema_types::{Substitution, TypeData, TypeId};
use std::rc::Rc;

/// Declared members of one class, by name.
#[derive(Default)]
pub struct MemberIndex {
    functions: FxHashMap<Atom, Vec<NodeIndex>>,
    /// Includes `val`/`var` constructor parameters.
    properties: FxHashMap<Atom, NodeIndex>,
    classifiers: FxHashMap<Atom, NodeIndex>,
}

/// A member function seen through a receiver type.
#[derive(Clone)]
pub(crate) struct MemberFunction {
    pub descriptor: Rc<FunctionDescriptor>,
    /// Class type parameters to the receiver's type arguments.
    pub substitution: Substitution,
}

#[derive(Clone)]
pub(crate) struct MemberProperty {
    pub descriptor: Rc<PropertyDescriptor>,
    /// Declared type with the receiver's type arguments substituted.
    pub ty: TypeId,
}

impl ResolveContext {
    pub(crate) fn member_index(&self, class: DefId) -> ResolveResult<Rc<MemberIndex>> {
        let index = self.memoized_collection(&self.cells.members, class, || {
            self.build_member_index(class).map(|index| Some(Rc::new(index)))
        })?;
        Ok(index.unwrap_or_default())
    }

    fn build_member_index(&self, class: DefId) -> ResolveResult<MemberIndex> {
        let mut index = MemberIndex::default();
        let Some(descriptor) = self.class_by_def(class) else {
            return Ok(index);
        };
        let NodeKind::Class(data) = self.kind(descriptor.node)? else {
            return Err(self.unexpected(descriptor.node, "class"));
        };
        for &param in &data.constructor_params {
            if let NodeKind::Parameter(p) = self.kind(param)?
                && p.property.is_some()
            {
                index.properties.entry(p.name).or_insert(param);
            }
        }
        for &member in &data.members {
            match self.kind(member)? {
                // Member extensions need two receivers; they are not callable
                // through a single receiver lookup.
                NodeKind::Function(f) if f.receiver.is_none() => {
                    index.functions.entry(f.name).or_default().push(member);
                }
                NodeKind::Property(p) => {
                    index.properties.entry(p.name).or_insert(member);
                }
                NodeKind::Class(c) => {
                    index.classifiers.entry(c.name).or_insert(member);
                }
                NodeKind::TypeAlias(a) => {
                    index.classifiers.entry(a.name).or_insert(member);
                }
                _ => {}
            }
        }
        Ok(index)
    }

    /// Classes of the receiver's supertype closure with the substitution
    /// that maps each one's type parameters to the receiver's view of them.
    fn receiver_classes(&self, receiver: TypeId) -> Vec<(DefId, Substitution)> {
        let checker = self.checker();
        checker
            .supertype_closure(receiver)
            .into_iter()
            .filter_map(|ty| match self.types.lookup(ty) {
                TypeData::Class { def, args, .. } => {
                    let params = self
                        .class_by_def(def)
                        .map(|c| c.type_parameters.clone())
                        .unwrap_or_default();
                    Some((def, Substitution::from_params(&params, &args)))
                }
                _ => None,
            })
            .collect()
    }

    /// Member functions named `name` callable on `receiver`, most derived
    /// first. A member overridden lower in the hierarchy hides the
    /// inherited one with the same substituted parameter types.
    pub(crate) fn member_functions(
        &self,
        receiver: TypeId,
        name: Atom,
    ) -> ResolveResult<Vec<MemberFunction>> {
        let mut found = Vec::new();
        let mut signatures: Vec<Vec<TypeId>> = Vec::new();
        for (class, substitution) in self.receiver_classes(receiver) {
            let index = self.member_index(class)?;
            let Some(nodes) = index.functions.get(&name) else {
                continue;
            };
            for &node in nodes {
                let descriptor = self.function_descriptor_of(node)?;
                let signature: Vec<TypeId> = descriptor
                    .value_parameters
                    .iter()
                    .map(|p| substitution.apply(&self.types, p.ty))
                    .collect();
                if signatures.contains(&signature) {
                    continue;
                }
                signatures.push(signature);
                found.push(MemberFunction {
                    descriptor,
                    substitution: substitution.clone(),
                });
            }
        }
        Ok(found)
    }

    /// The property `name` visible on `receiver`.
    pub(crate) fn member_property(
        &self,
        receiver: TypeId,
        name: Atom,
    ) -> ResolveResult<Option<MemberProperty>> {
        for (class, substitution) in self.receiver_classes(receiver) {
            let index = self.member_index(class)?;
            let Some(&node) = index.properties.get(&name) else {
                continue;
            };
            let Some(descriptor) = self.descriptor_of(node)?.as_property().cloned() else {
                continue;
            };
            let declared = self.property_type(&descriptor)?;
            return Ok(Some(MemberProperty {
                ty: substitution.apply(&self.types, declared),
                descriptor,
            }));
        }
        Ok(None)
    }

    /// Nested class or type alias declared directly in `class`.
    pub(crate) fn nested_classifier(
        &self,
        class: DefId,
        name: Atom,
    ) -> ResolveResult<Option<NodeIndex>> {
        Ok(self.member_index(class)?.classifiers.get(&name).copied())
    }
}
