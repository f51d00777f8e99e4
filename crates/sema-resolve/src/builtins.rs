//! Typed accessors for the built-ins catalogue.
//!
//! Built-in classes are ordinary declarations of the `builtins` package.
//! They are looked up by name on first use and their `DefId`s cached on the
//! context. A source set loaded without the catalogue answers `None` for
//! every class and the error type for every type accessor. Failures of the
//! underlying descriptor query (cancellation included) propagate.

use crate::context::ResolveContext;
use crate::error::ResolveResult;
use sema_common::DefId;
use sema_syntax::{DeclarationProvider, NodeIndex};
use sema_types::TypeId;

pub struct BuiltIns<'a> {
    ctx: &'a ResolveContext,
}

impl ResolveContext {
    pub(crate) fn builtins(&self) -> BuiltIns<'_> {
        BuiltIns { ctx: self }
    }
}

impl BuiltIns<'_> {
    /// `DefId` of the built-in class `name`.
    pub fn class(&self, name: &'static str) -> ResolveResult<Option<DefId>> {
        if let Some(&def) = self.ctx.builtin_cache().borrow().get(name) {
            return Ok(Some(def));
        }
        let Some(node) = self.catalogue_node(name) else {
            return Ok(None);
        };
        let Some(def) = self.ctx.descriptor_of(node)?.as_class().map(|c| c.def) else {
            return Ok(None);
        };
        self.ctx.builtin_cache().borrow_mut().insert(name, def);
        Ok(Some(def))
    }

    fn catalogue_node(&self, name: &str) -> Option<NodeIndex> {
        let sources = &self.ctx.sources;
        let root = sources.file(sources.builtins_file()?)?.root;
        let atom = self.ctx.atom(name)?;
        sources
            .classes(root)
            .into_iter()
            .find(|&c| sources.arena().declaration_name(c) == atom)
    }

    pub fn is(&self, def: DefId, name: &'static str) -> ResolveResult<bool> {
        Ok(self.class(name)? == Some(def))
    }

    fn simple(&self, name: &'static str) -> ResolveResult<TypeId> {
        Ok(match self.class(name)? {
            Some(def) => self.ctx.types.class(def, [], false),
            None => TypeId::ERROR,
        })
    }

    pub fn any_type(&self) -> ResolveResult<TypeId> {
        self.simple("Any")
    }

    pub fn nullable_any_type(&self) -> ResolveResult<TypeId> {
        Ok(self.ctx.types.make_nullable(self.any_type()?))
    }

    pub fn unit_type(&self) -> ResolveResult<TypeId> {
        self.simple("Unit")
    }

    pub fn boolean_type(&self) -> ResolveResult<TypeId> {
        self.simple("Boolean")
    }

    pub fn int_type(&self) -> ResolveResult<TypeId> {
        self.simple("Int")
    }

    pub fn long_type(&self) -> ResolveResult<TypeId> {
        self.simple("Long")
    }

    pub fn double_type(&self) -> ResolveResult<TypeId> {
        self.simple("Double")
    }

    pub fn string_type(&self) -> ResolveResult<TypeId> {
        self.simple("String")
    }

    /// `Array<element>`, the parameter type of a `vararg` seen from the body.
    pub fn array_of(&self, element: TypeId) -> ResolveResult<TypeId> {
        Ok(match self.class("Array")? {
            Some(def) => self.ctx.types.class(def, [element], false),
            None => TypeId::ERROR,
        })
    }

    /// The `dynamic` type.
    pub fn dynamic_type(&self) -> ResolveResult<TypeId> {
        Ok(self.ctx.types.dynamic(self.nullable_any_type()?))
    }
}

#[cfg(test)]
#[path = "../tests/builtins_tests.rs"]
mod builtins_tests;
