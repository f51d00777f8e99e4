//! Call resolution.
//!
//! A call site goes through four stages:
//!
//! 1. [`arguments`]: arguments are typed once without expectation, each in
//!    its own speculation layer, and mapped onto parameter lists.
//! 2. [`tasks`]: candidates are gathered from the receiver and the scope
//!    chain and grouped by tier (member, extension, top level) and
//!    proximity.
//! 3. [`candidates`]: every candidate of a group is evaluated against the
//!    arguments with a fresh constraint system; the most specific
//!    applicable one wins.
//! 4. [`completer`]: the winner's return type is computed, arguments are
//!    re-checked with their final parameter types, the call is committed
//!    to the trace and the [`checkers`] run.
//!
//! Groups are tried in order; the first group with an applicable
//! candidate decides the call.

pub(crate) mod arguments;
pub(crate) mod candidates;
pub mod checkers;
pub(crate) mod completer;
pub(crate) mod tasks;

use crate::context::ResolveContext;
use crate::descriptors::{FunctionDescriptor, TypeAliasDescriptor};
use crate::error::ResolveResult;
use crate::trace::CallRole;
use arguments::ArgumentTypes;
use candidates::Choice;
use sema_common::{Atom, DefId, Span};
use sema_syntax::ast::CallData;
use sema_syntax::NodeIndex;
use sema_types::{Substitution, TypeId};
use std::rc::Rc;
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CallReceiver {
    /// Unqualified call; implicit receivers come from the scope.
    None,
    Value(TypeId),
}

/// One call to resolve: a syntactic call, an operator, a convention call
/// of a `for` loop or a superclass constructor delegation.
pub(crate) struct CallSite<'a> {
    pub node: NodeIndex,
    pub callee: Atom,
    pub callee_span: Span,
    pub receiver: CallReceiver,
    pub safe: bool,
    pub type_args: &'a [NodeIndex],
    pub args: &'a [NodeIndex],
    pub role: CallRole,
    /// Superclass constructor call of a class header.
    pub delegating: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Tier {
    Member,
    Extension,
    TopLevel,
}

#[derive(Clone)]
pub(crate) enum Callee {
    Function(Rc<FunctionDescriptor>),
    /// Constructor of the class a type alias expands to.
    AliasConstructor {
        ctor: Rc<FunctionDescriptor>,
        alias: Rc<TypeAliasDescriptor>,
    },
    /// `invoke` of a value of function type.
    Invoke { value: DefId, fn_type: TypeId },
}

impl Callee {
    pub fn def(&self) -> DefId {
        match self {
            Callee::Function(f) => f.def,
            Callee::AliasConstructor { ctor, .. } => ctor.def,
            Callee::Invoke { value, .. } => *value,
        }
    }
}

#[derive(Clone)]
pub(crate) struct Candidate {
    pub callee: Callee,
    pub tier: Tier,
    /// Depth of the scope link the candidate was found in.
    pub depth: u32,
    /// Type arguments fixed before inference: the receiver's view of the
    /// declaring class, or the expansion of an alias.
    pub class_subst: Substitution,
    pub dispatch_receiver: Option<TypeId>,
    /// Actual receiver passed to an extension.
    pub extension_receiver: Option<TypeId>,
    /// Member reached through a nullable receiver without `?.`.
    pub unsafe_receiver: bool,
}

impl Candidate {
    pub fn new(callee: Callee, tier: Tier, depth: u32) -> Self {
        Candidate {
            callee,
            tier,
            depth,
            class_subst: Substitution::new(),
            dispatch_receiver: None,
            extension_receiver: None,
            unsafe_receiver: false,
        }
    }

    pub fn receiver_type(&self) -> Option<TypeId> {
        self.dispatch_receiver.or(self.extension_receiver)
    }
}

impl ResolveContext {
    /// Type a call expression.
    pub(crate) fn type_call(
        &self,
        node: NodeIndex,
        data: &CallData,
        expected: Option<TypeId>,
    ) -> ResolveResult<TypeId> {
        let receiver = match data.receiver.to_option() {
            Some(receiver) => CallReceiver::Value(self.type_expression(receiver, None)?),
            None => CallReceiver::None,
        };
        let site = CallSite {
            node,
            callee: data.callee,
            callee_span: data.callee_span,
            receiver,
            safe: data.safe,
            type_args: &data.type_args,
            args: &data.args,
            role: CallRole::Direct,
            delegating: false,
        };
        self.resolve_call(&site, expected)
    }

    /// Desugared operator: `lhs op rhs` calls `lhs.name(rhs)`.
    pub(crate) fn resolve_operator_call(
        &self,
        node: NodeIndex,
        receiver: TypeId,
        name: &str,
        args: &[NodeIndex],
        expected: Option<TypeId>,
    ) -> ResolveResult<TypeId> {
        let site = CallSite {
            node,
            callee: self.sources.interner().known(name),
            callee_span: self.span(node),
            receiver: CallReceiver::Value(receiver),
            safe: false,
            type_args: &[],
            args,
            role: CallRole::Direct,
            delegating: false,
        };
        self.resolve_call(&site, expected)
    }

    pub(crate) fn resolve_call(&self, site: &CallSite<'_>, expected: Option<TypeId>) -> ResolveResult<TypeId> {
        self.check_cancelled()?;
        let mut args = self.preliminary_argument_types(site.args)?;

        if let CallReceiver::Value(receiver) = site.receiver {
            if receiver.is_error() {
                self.type_arguments_without_candidate(site, &mut args)?;
                return Ok(TypeId::ERROR);
            }
            if self.types.is_dynamic(receiver) {
                return self.complete_dynamic_call(site, receiver, &mut args);
            }
        }

        let explicit = self.explicit_type_arguments(site.type_args)?;
        let groups = self.collect_candidates(site)?;
        debug!(
            callee = self.text(site.callee),
            groups = groups.len(),
            candidates = groups.iter().map(Vec::len).sum::<usize>(),
            "resolving call"
        );

        let mut evaluated = Vec::new();
        for group in groups {
            let mut evaluations = Vec::with_capacity(group.len());
            for candidate in group {
                evaluations.push(self.evaluate_candidate(candidate, site, &args, &explicit, None)?);
            }
            match self.choose_most_specific(&evaluations, site.args) {
                Choice::Winner(index) => {
                    let winner = evaluations.swap_remove(index);
                    return self.complete_call(site, winner, &mut args, &explicit, expected);
                }
                Choice::Ambiguous(tied) => {
                    return self.report_ambiguity(site, &evaluations, &tied, &mut args);
                }
                Choice::NoneApplicable => evaluated.extend(evaluations),
            }
        }
        self.report_inapplicable(site, evaluated, &mut args)
    }

    /// Silent resolution of a no-argument convention member (`iterator`,
    /// `hasNext`, `next`). Returns `None` when nothing applicable exists;
    /// no diagnostic is reported for the missing member.
    pub(crate) fn resolve_convention_call(
        &self,
        node: NodeIndex,
        receiver: TypeId,
        name: &str,
        role: CallRole,
    ) -> ResolveResult<Option<TypeId>> {
        if receiver.is_error() {
            return Ok(Some(TypeId::ERROR));
        }
        if self.types.is_dynamic(receiver) {
            return Ok(Some(receiver));
        }
        let site = CallSite {
            node,
            callee: self.sources.interner().known(name),
            callee_span: self.span(node),
            receiver: CallReceiver::Value(receiver),
            safe: false,
            type_args: &[],
            args: &[],
            role,
            delegating: false,
        };
        let mut args = ArgumentTypes::default();
        for group in self.collect_candidates(&site)? {
            let mut evaluations = Vec::with_capacity(group.len());
            for candidate in group {
                evaluations.push(self.evaluate_candidate(candidate, &site, &args, &[], None)?);
            }
            match self.choose_most_specific(&evaluations, &[]) {
                Choice::Winner(index) => {
                    let winner = evaluations.swap_remove(index);
                    let ty = self.complete_call(&site, winner, &mut args, &[], None)?;
                    return Ok(Some(ty));
                }
                Choice::Ambiguous(_) => return Ok(None),
                Choice::NoneApplicable => {}
            }
        }
        Ok(None)
    }

    /// Superclass constructor call in a class header: `class B : A(args)`.
    pub(crate) fn resolve_delegation(
        &self,
        class_node: NodeIndex,
        mention: NodeIndex,
        supertype: TypeId,
        args: &[NodeIndex],
    ) -> ResolveResult<TypeId> {
        let Some(def) = self.types.lookup(supertype).class_def() else {
            return Ok(TypeId::ERROR);
        };
        let (Some(class), Some(ctor)) = (self.class_by_def(def), self.class_constructor(def)?) else {
            return Ok(TypeId::ERROR);
        };
        debug!(class = class_node.0, superclass = self.text(class.name), "resolving delegation");
        let sema_types::TypeData::Class { args: type_args, .. } = self.types.lookup(supertype) else {
            return Ok(TypeId::ERROR);
        };
        let mut candidate = Candidate::new(Callee::Function(ctor), Tier::TopLevel, 0);
        candidate.class_subst = Substitution::from_params(&class.type_parameters, &type_args);

        let site = CallSite {
            node: mention,
            callee: class.name,
            callee_span: self.span(mention),
            receiver: CallReceiver::None,
            safe: false,
            type_args: &[],
            args,
            role: CallRole::Direct,
            delegating: true,
        };
        let mut arg_types = self.preliminary_argument_types(args)?;
        let evaluation = self.evaluate_candidate(candidate, &site, &arg_types, &[], None)?;
        if evaluation.is_applicable() {
            self.complete_call(&site, evaluation, &mut arg_types, &[], None)
        } else {
            self.report_inapplicable(&site, vec![evaluation], &mut arg_types)
        }
    }

    fn explicit_type_arguments(&self, nodes: &[NodeIndex]) -> ResolveResult<Vec<TypeId>> {
        nodes.iter().map(|&node| self.resolve_type(node)).collect()
    }
}
