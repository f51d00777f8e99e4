//! Type reference resolution.
//!
//! Turns type mentions into semantic types: the head name is looked up in
//! the scope visible at the mention, arguments are resolved recursively,
//! arity is validated and aliases are expanded. Mentions inside platform
//! code without an explicit `?` become flexible types.
//!
//! The lazy cells that hang off classifiers (class supertypes, type
//! parameter bounds, alias expansions) are computed here too.

use crate::context::ResolveContext;
use crate::error::ResolveResult;
use crate::scope::{Namespace, Scope};
use sema_common::limits::MAX_ALIAS_EXPANSION_DEPTH;
use sema_common::{Atom, DefId, DiagnosticKind};
use sema_syntax::ast::TypeReferenceData;
use sema_syntax::{DeclarationProvider, Modifiers, NodeIndex, NodeKind, Origin};
use sema_types::{Substitution, TypeData, TypeId};
use std::rc::Rc;
use tracing::trace;

impl ResolveContext {
    /// Resolve the type mention `node` in the scope visible at it.
    pub(crate) fn resolve_type(&self, node: NodeIndex) -> ResolveResult<TypeId> {
        if node.is_none() {
            return Ok(TypeId::ERROR);
        }
        let scope = self.scope_at(node)?;
        let platform = self.is_platform_context(node);
        self.resolve_type_in(node, &scope, platform)
    }

    /// Whether type mentions under `node` come from platform signatures.
    pub(crate) fn is_platform_context(&self, node: NodeIndex) -> bool {
        self.sources.origin_of(node) == Origin::Platform
            || self
                .sources
                .arena()
                .ancestors(node)
                .any(|a| self.modifiers_of(a).contains(Modifiers::PLATFORM))
    }

    pub(crate) fn resolve_type_in(
        &self,
        node: NodeIndex,
        scope: &Scope,
        platform: bool,
    ) -> ResolveResult<TypeId> {
        match self.kind(node)? {
            NodeKind::TypeReference(data) => self.resolve_reference(node, data, scope, platform),
            NodeKind::FunctionType(data) => {
                let mut params = Vec::with_capacity(data.params.len());
                for &param in &data.params {
                    params.push(self.resolve_type_in(param, scope, platform)?);
                }
                let ret = self.resolve_type_in(data.return_type, scope, platform)?;
                let ty = self.types.function(params, ret, data.nullable);
                Ok(if platform && !data.nullable {
                    self.types.platform(ty)
                } else {
                    ty
                })
            }
            NodeKind::DynamicType => {
                if self.options.dynamic_types {
                    self.builtins().dynamic_type()
                } else {
                    self.report(DiagnosticKind::UnsupportedDynamic, node, &[]);
                    Ok(TypeId::ERROR)
                }
            }
            _ => Err(self.unexpected(node, "type mention")),
        }
    }

    fn resolve_reference(
        &self,
        node: NodeIndex,
        data: &TypeReferenceData,
        scope: &Scope,
        platform: bool,
    ) -> ResolveResult<TypeId> {
        let at = self.span(node).start;
        let Some(target) = self.lookup_type_path(scope, &data.path, at)? else {
            let path = self.sources.interner().join(&data.path);
            self.report(DiagnosticKind::UnresolvedReference, node, &[&path]);
            return Ok(TypeId::ERROR);
        };

        let mut args = Vec::with_capacity(data.args.len());
        for &arg in &data.args {
            args.push(self.resolve_type_in(arg, scope, platform)?);
        }

        let base = match self.kind(target)? {
            NodeKind::TypeParameter(tp) => {
                if !args.is_empty() {
                    self.report_arity(node, 0, tp.name, args.len());
                    return Ok(TypeId::ERROR);
                }
                // Owners register their type parameters before resolving
                // their own signature, so this never re-enters the owner.
                let def = match self.registered_def(target) {
                    Some(def) => def,
                    None => self.descriptor_of(target)?.def(),
                };
                self.types.type_param(def, false)
            }
            NodeKind::Class(_) => {
                let class = self.class_descriptor_of(target)?;
                if args.len() != class.type_parameters.len() {
                    self.report_arity(node, class.type_parameters.len(), class.name, args.len());
                    return Ok(TypeId::ERROR);
                }
                if self.builtins().is(class.def, "Nothing")? {
                    TypeId::NOTHING
                } else {
                    self.types.class(class.def, args, false)
                }
            }
            NodeKind::TypeAlias(_) => {
                let alias = self.type_alias_descriptor_of(target)?;
                if args.len() != alias.type_parameters.len() {
                    self.report_arity(node, alias.type_parameters.len(), alias.name, args.len());
                    return Ok(TypeId::ERROR);
                }
                let expansion = self.alias_expansion(alias.def)?;
                Substitution::from_params(&alias.type_parameters, &args).apply(&self.types, expansion)
            }
            _ => return Err(self.unexpected(target, "classifier")),
        };

        let ty = if base.is_error() {
            base
        } else if data.nullable {
            self.types.make_nullable(base)
        } else if platform {
            self.types.platform(base)
        } else {
            base
        };
        trace!(node = node.0, ty = %self.render_type(ty), "resolved type mention");
        Ok(ty)
    }

    fn report_arity(&self, node: NodeIndex, expected: usize, name: Atom, given: usize) {
        self.report(
            DiagnosticKind::WrongTypeArgumentCount,
            node,
            &[&expected.to_string(), self.text(name), &given.to_string()],
        );
    }

    /// Resolve a possibly qualified classifier path. Nested classes of a
    /// visible class are tried first, then package-qualified names with the
    /// longest matching package prefix.
    pub(crate) fn lookup_type_path(
        &self,
        scope: &Scope,
        path: &[Atom],
        at: u32,
    ) -> ResolveResult<Option<NodeIndex>> {
        let Some((&head, rest)) = path.split_first() else {
            return Ok(None);
        };
        if let Some(found) = self.lookup_classifier(scope, head, at)? {
            if let Some(found) = self.nested_path(found, rest)? {
                return Ok(Some(found));
            }
        }
        for split in (1..path.len()).rev() {
            let (package, names) = path.split_at(split);
            for file in self.sources.package_files(package) {
                let Some(&top) = self
                    .top_level_named(file, names[0], Some(Namespace::Type), false)
                    .first()
                else {
                    continue;
                };
                if let Some(found) = self.nested_path(top, &names[1..])? {
                    return Ok(Some(found));
                }
            }
        }
        Ok(None)
    }

    fn nested_path(&self, mut current: NodeIndex, rest: &[Atom]) -> ResolveResult<Option<NodeIndex>> {
        for &segment in rest {
            let NodeKind::Class(_) = self.kind(current)? else {
                return Ok(None);
            };
            let class = self.class_descriptor_of(current)?;
            match self.nested_classifier(class.def, segment)? {
                Some(next) => current = next,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }

    // =========================================================================
    // Lazy cells of classifiers
    // =========================================================================

    /// Direct supertypes of a class. Classes without a supertype list extend
    /// `Any`. Supertypes of supertypes are forced so that inheritance cycles
    /// surface here, reported once at the class that closes the cycle.
    pub(crate) fn class_supertypes(&self, def: DefId) -> ResolveResult<Rc<Vec<TypeId>>> {
        let Some(class) = self.class_by_def(def) else {
            return Ok(Rc::default());
        };
        let any = self.builtins().any_type()?;
        self.memoized(
            &self.cells.supertypes,
            def,
            || {
                let NodeKind::Class(data) = self.kind(class.node)? else {
                    return Err(self.unexpected(class.node, "class"));
                };
                let mut supertypes = Vec::with_capacity(data.supertypes.len());
                for &mention in &data.supertypes {
                    let ty = self.resolve_type(mention)?;
                    let ty = self.types.make_non_null(self.types.lower_bound(ty));
                    if let TypeData::Class { def: sup, .. } = self.types.lookup(ty) {
                        self.class_supertypes(sup)?;
                        supertypes.push(ty);
                    }
                }
                if supertypes.is_empty() && !self.builtins().is(def, "Any")? {
                    if !any.is_error() {
                        supertypes.push(any);
                    }
                }
                Ok(Rc::new(supertypes))
            },
            || {
                self.report_cycle(class.node);
                Rc::new(if any.is_error() { Vec::new() } else { vec![any] })
            },
        )
    }

    /// Upper bound of a type parameter, `Any?` when none is declared.
    pub(crate) fn type_parameter_bound(&self, def: DefId) -> ResolveResult<TypeId> {
        let Some(param) = self.type_parameter_by_def(def) else {
            return self.builtins().nullable_any_type();
        };
        self.memoized(
            &self.cells.upper_bounds,
            def,
            || match self.kind(param.node)? {
                NodeKind::TypeParameter(data) if data.bound.is_some() => {
                    self.resolve_type(data.bound)
                }
                _ => self.builtins().nullable_any_type(),
            },
            || {
                self.report_cycle(param.node);
                TypeId::ERROR
            },
        )
    }

    /// The aliased type of a type alias, mentioning the alias's own type
    /// parameters.
    pub(crate) fn alias_expansion(&self, def: DefId) -> ResolveResult<TypeId> {
        let Some(alias) = self.alias_by_def(def) else {
            return Ok(TypeId::ERROR);
        };
        self.memoized(
            &self.cells.alias_expansions,
            def,
            || {
                let depth = self.alias_depth.get();
                if depth >= MAX_ALIAS_EXPANSION_DEPTH {
                    self.report_cycle(alias.node);
                    return Ok(TypeId::ERROR);
                }
                let NodeKind::TypeAlias(data) = self.kind(alias.node)? else {
                    return Err(self.unexpected(alias.node, "type alias"));
                };
                self.alias_depth.set(depth + 1);
                let result = self.resolve_type(data.aliased);
                self.alias_depth.set(depth);
                result
            },
            || {
                self.report_cycle(alias.node);
                TypeId::ERROR
            },
        )
    }
}
