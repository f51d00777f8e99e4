//! Call checkers.
//!
//! A [`CallChecker`] runs once for every call committed with
//! [`CallStatus::Success`](crate::trace::CallStatus::Success). Checkers only
//! observe: they read the resolved call and the context and may report
//! diagnostics at the callee. The session runs the default set below plus
//! whatever the builder registered.

use super::CallSite;
use crate::context::ResolveContext;
use crate::descriptors::Descriptor;
use crate::options::ResolveOptions;
use crate::scope::Scope;
use crate::trace::{BindingTrace, ResolvedCall};
use sema_common::{Atom, DefId, DiagnosticKind, Span};
use sema_syntax::NodeIndex;
use sema_types::{TypeData, TypeId, TypeInterner};
use std::cell::Ref;
use std::rc::Rc;
use tracing::trace;

pub trait CallChecker {
    fn name(&self) -> &'static str;

    fn check(&self, call: &ResolvedCall, ctx: &CallCheckerContext<'_>);
}

/// What a checker may look at for one call.
pub struct CallCheckerContext<'a> {
    ctx: &'a ResolveContext,
    scope: Rc<Scope>,
    node: NodeIndex,
    callee: Atom,
    callee_span: Span,
    safe: bool,
    delegating: bool,
}

impl<'a> CallCheckerContext<'a> {
    pub(crate) fn new(ctx: &'a ResolveContext, site: &CallSite<'_>, scope: Rc<Scope>) -> Self {
        CallCheckerContext {
            ctx,
            scope,
            node: site.node,
            callee: site.callee,
            callee_span: site.callee_span,
            safe: site.safe,
            delegating: site.delegating,
        }
    }

    pub fn options(&self) -> &ResolveOptions {
        &self.ctx.options
    }

    pub fn types(&self) -> &TypeInterner {
        &self.ctx.types
    }

    pub fn trace(&self) -> Ref<'_, BindingTrace> {
        self.ctx.trace.borrow()
    }

    /// Scope chain visible at the call.
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn descriptor(&self, def: DefId) -> Option<Descriptor> {
        self.ctx.descriptor_by_def(def)
    }

    /// Whether the return type of `function` is being inferred further up
    /// the stack. Asking for it now would only yield the cycle sentinel.
    pub fn is_computing_return_type(&self, function: DefId) -> bool {
        self.ctx
            .function_by_def(function)
            .is_some_and(|f| self.ctx.is_return_type_computing(&f))
    }

    pub fn render_type(&self, ty: TypeId) -> String {
        self.ctx.render_type(ty)
    }

    pub fn name(&self, atom: Atom) -> &str {
        self.ctx.text(atom)
    }

    pub fn callee_name(&self) -> &str {
        self.ctx.text(self.callee)
    }

    pub fn node(&self) -> NodeIndex {
        self.node
    }

    pub fn callee_span(&self) -> Span {
        self.callee_span
    }

    /// The call was written with `?.`.
    pub fn is_safe(&self) -> bool {
        self.safe
    }

    /// The call is the superclass constructor call of a class header.
    pub fn is_delegating(&self) -> bool {
        self.delegating
    }

    /// Report at the callee.
    pub fn report(&self, kind: DiagnosticKind, args: &[&str]) {
        self.ctx.report_at(kind, self.node, self.callee_span, args);
    }
}

/// Constructing an abstract class or an interface. A subclass delegating
/// to an abstract superclass constructor is fine.
pub struct AbstractInstantiationChecker;

impl CallChecker for AbstractInstantiationChecker {
    fn name(&self) -> &'static str {
        "abstract-instantiation"
    }

    fn check(&self, call: &ResolvedCall, ctx: &CallCheckerContext<'_>) {
        if ctx.is_delegating() {
            return;
        }
        let Some(function) = ctx.descriptor(call.callee).and_then(|d| d.as_function().cloned()) else {
            return;
        };
        let Some(class) = function
            .constructed_class
            .and_then(|def| ctx.descriptor(def))
            .and_then(|d| d.as_class().cloned())
        else {
            return;
        };
        if class.is_abstract() {
            trace!(class = ctx.name(class.name), "abstract instantiation");
            ctx.report(DiagnosticKind::AbstractInstantiation, &[ctx.name(class.name)]);
        }
    }
}

/// A member called through a platform-typed receiver that may be null at
/// run time.
pub struct PlatformReceiverChecker;

impl CallChecker for PlatformReceiverChecker {
    fn name(&self) -> &'static str {
        "platform-receiver"
    }

    fn check(&self, call: &ResolvedCall, ctx: &CallCheckerContext<'_>) {
        if !ctx.options().report_platform_nullability || ctx.is_safe() {
            return;
        }
        let Some(receiver) = call.receiver_type else {
            return;
        };
        let types = ctx.types();
        if types.is_dynamic(receiver) {
            return;
        }
        if let TypeData::Flexible { upper, .. } = types.lookup(receiver)
            && types.is_marked_nullable(upper)
        {
            ctx.report(
                DiagnosticKind::PlatformReceiver,
                &[ctx.callee_name(), &ctx.render_type(receiver)],
            );
        }
    }
}

pub fn default_call_checkers() -> Vec<Box<dyn CallChecker>> {
    vec![
        Box::new(AbstractInstantiationChecker),
        Box::new(PlatformReceiverChecker),
    ]
}
