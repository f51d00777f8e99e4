//! Candidate collection and prioritization.
//!
//! Candidates are grouped by tier, then by the depth of the scope link
//! they were found in (innermost first). Within a group nothing is
//! pre-resolved; the candidate resolver decides between them.

use super::{CallReceiver, CallSite, Callee, Candidate, Tier};
use crate::context::ResolveContext;
use crate::error::ResolveResult;
use crate::scope::{Namespace, Scope, ValueHit};
use rustc_hash::FxHashSet;
use sema_common::{Atom, DefId};
use sema_syntax::{NodeIndex, NodeKind};
use sema_types::{Substitution, TypeData, TypeId};
use tracing::trace;

/// Members of an explicit receiver all sit in one group.
const RECEIVER_DEPTH: u32 = u32::MAX;

impl ResolveContext {
    pub(crate) fn collect_candidates(&self, site: &CallSite<'_>) -> ResolveResult<Vec<Vec<Candidate>>> {
        let scope = self.scope_at(site.node)?;
        let at = self.span(site.node).start;
        let mut candidates = Vec::new();
        match site.receiver {
            CallReceiver::Value(receiver) => {
                self.collect_receiver_members(site, receiver, &mut candidates)?;
                self.collect_extensions(site, &scope, receiver, at, &mut candidates)?;
            }
            CallReceiver::None => {
                for link in scope.links() {
                    if let Some(receiver) = link.implicit_receiver {
                        self.collect_implicit_members(site.callee, receiver, link.depth, &mut candidates)?;
                    }
                }
                if let Some(receiver) = scope.innermost_receiver() {
                    self.collect_extensions(site, &scope, receiver, at, &mut candidates)?;
                }
                self.collect_top_level(site.callee, &scope, at, &mut candidates)?;
            }
        }
        Ok(group_candidates(candidates))
    }

    fn collect_receiver_members(
        &self,
        site: &CallSite<'_>,
        receiver: TypeId,
        out: &mut Vec<Candidate>,
    ) -> ResolveResult<()> {
        let core = self.types.make_non_null(self.types.lower_bound(receiver));
        let unsafe_receiver = !site.safe && self.checker().may_be_null(receiver);

        for member in self.member_functions(core, site.callee)? {
            let mut candidate = Candidate::new(
                Callee::Function(member.descriptor),
                Tier::Member,
                RECEIVER_DEPTH,
            );
            candidate.class_subst = member.substitution;
            candidate.dispatch_receiver = Some(receiver);
            candidate.unsafe_receiver = unsafe_receiver;
            out.push(candidate);
        }

        if let Some(property) = self.member_property(core, site.callee)?
            && let Some(fn_type) = self.function_type_of(property.ty)
        {
            let mut candidate = Candidate::new(
                Callee::Invoke {
                    value: property.descriptor.def,
                    fn_type,
                },
                Tier::Member,
                RECEIVER_DEPTH,
            );
            candidate.unsafe_receiver = unsafe_receiver;
            out.push(candidate);
        }

        if self.text(site.callee) == "invoke"
            && let Some(fn_type) = self.function_type_of(core)
        {
            let mut candidate =
                Candidate::new(Callee::Invoke { value: DefId::INVALID, fn_type }, Tier::Member, RECEIVER_DEPTH);
            candidate.dispatch_receiver = Some(receiver);
            candidate.unsafe_receiver = unsafe_receiver;
            out.push(candidate);
        }
        Ok(())
    }

    fn collect_implicit_members(
        &self,
        name: Atom,
        receiver: TypeId,
        depth: u32,
        out: &mut Vec<Candidate>,
    ) -> ResolveResult<()> {
        for member in self.member_functions(receiver, name)? {
            let mut candidate = Candidate::new(Callee::Function(member.descriptor), Tier::Member, depth);
            candidate.class_subst = member.substitution;
            candidate.dispatch_receiver = Some(receiver);
            out.push(candidate);
        }
        if let Some(property) = self.member_property(receiver, name)?
            && let Some(fn_type) = self.function_type_of(property.ty)
        {
            out.push(Candidate::new(
                Callee::Invoke {
                    value: property.descriptor.def,
                    fn_type,
                },
                Tier::Member,
                depth,
            ));
        }
        Ok(())
    }

    /// Extension functions visible in the scope, applied to `receiver`.
    fn collect_extensions(
        &self,
        site: &CallSite<'_>,
        scope: &Scope,
        receiver: TypeId,
        at: u32,
        out: &mut Vec<Candidate>,
    ) -> ResolveResult<()> {
        let checker = self.checker();
        let core = self.types.make_non_null(self.types.lower_bound(receiver));
        for (depth, node) in self.lookup_functions(scope, site.callee, at)? {
            let function = self.function_descriptor_of(node)?;
            let Some(declared) = function.extension_receiver else {
                continue;
            };
            let needs_core = site.safe
                || (checker.may_be_null(receiver) && !checker.accepts_null(declared));
            let mut candidate = Candidate::new(Callee::Function(function), Tier::Extension, depth);
            candidate.extension_receiver = Some(if needs_core { core } else { receiver });
            candidate.unsafe_receiver = needs_core && !site.safe;
            out.push(candidate);
        }
        Ok(())
    }

    /// Non-extension functions, constructors and function-typed values.
    fn collect_top_level(
        &self,
        name: Atom,
        scope: &Scope,
        at: u32,
        out: &mut Vec<Candidate>,
    ) -> ResolveResult<()> {
        for (depth, node) in self.lookup_functions(scope, name, at)? {
            let function = self.function_descriptor_of(node)?;
            if !function.is_extension() {
                out.push(Candidate::new(Callee::Function(function), Tier::TopLevel, depth));
            }
        }
        for link in scope.links() {
            for node in self.link_declarations(link, name, Namespace::Type, at)? {
                if let Some(candidate) = self.constructor_candidate(node, link.depth)? {
                    out.push(candidate);
                }
            }
            for node in self.link_declarations(link, name, Namespace::Value, at)? {
                if let Some(candidate) = self.invoke_candidate(node, link.depth)? {
                    out.push(candidate);
                }
            }
        }
        Ok(())
    }

    fn constructor_candidate(&self, node: NodeIndex, depth: u32) -> ResolveResult<Option<Candidate>> {
        match self.kind(node)? {
            NodeKind::Class(_) => {
                let class = self.class_descriptor_of(node)?;
                Ok(self
                    .class_constructor(class.def)?
                    .map(|ctor| Candidate::new(Callee::Function(ctor), Tier::TopLevel, depth)))
            }
            NodeKind::TypeAlias(_) => {
                let alias = self.type_alias_descriptor_of(node)?;
                let expansion = self.alias_expansion(alias.def)?;
                let TypeData::Class { def, args, .. } = self.types.lookup(expansion) else {
                    return Ok(None);
                };
                let (Some(class), Some(ctor)) = (self.class_by_def(def), self.class_constructor(def)?) else {
                    return Ok(None);
                };
                let mut candidate = Candidate::new(
                    Callee::AliasConstructor { ctor, alias },
                    Tier::TopLevel,
                    depth,
                );
                candidate.class_subst = Substitution::from_params(&class.type_parameters, &args);
                Ok(Some(candidate))
            }
            _ => Ok(None),
        }
    }

    fn invoke_candidate(&self, node: NodeIndex, depth: u32) -> ResolveResult<Option<Candidate>> {
        match self.kind(node)? {
            // `it` has no type before its lambda is typed.
            NodeKind::Lambda(_) if self.trace.borrow().variable_type(node).is_none() => {
                return Ok(None);
            }
            NodeKind::Property(_) => {
                let property = self.property_descriptor_of(node)?;
                if self.is_property_type_computing(&property) {
                    return Ok(None);
                }
            }
            _ => {}
        }
        let (ty, def) = self.value_type(&ValueHit::Declaration(node))?;
        let Some(fn_type) = self.function_type_of(ty) else {
            return Ok(None);
        };
        Ok(Some(Candidate::new(
            Callee::Invoke {
                value: def.unwrap_or(DefId::INVALID),
                fn_type,
            },
            Tier::TopLevel,
            depth,
        )))
    }

    /// The function type behind `ty`, looking through flexible bounds.
    pub(crate) fn function_type_of(&self, ty: TypeId) -> Option<TypeId> {
        let core = self.types.make_non_null(self.types.lower_bound(ty));
        matches!(self.types.lookup(core), TypeData::Function { .. }).then_some(core)
    }
}

/// Deduplicate by callee, sort by tier and proximity, and split into
/// groups of equal priority.
fn group_candidates(mut candidates: Vec<Candidate>) -> Vec<Vec<Candidate>> {
    let mut seen = FxHashSet::default();
    candidates.retain(|c| match &c.callee {
        Callee::Invoke { value, .. } if !value.is_valid() => true,
        callee => seen.insert(callee.def()),
    });
    candidates.sort_by(|a, b| a.tier.cmp(&b.tier).then(b.depth.cmp(&a.depth)));

    let mut groups: Vec<Vec<Candidate>> = Vec::new();
    for candidate in candidates {
        match groups.last_mut() {
            Some(group)
                if group[0].tier == candidate.tier && group[0].depth == candidate.depth =>
            {
                group.push(candidate);
            }
            _ => groups.push(vec![candidate]),
        }
    }
    trace!(groups = groups.len(), "prioritized candidates");
    groups
}
