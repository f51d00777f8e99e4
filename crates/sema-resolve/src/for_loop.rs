//! `for` loop convention checking.
//!
//! `for (x in e)` needs `e.iterator()`, then `hasNext(): Boolean` and
//! `next()` on the iterator. Each convention call is resolved silently and
//! recorded on the loop node under its own [`CallRole`]; a missing piece is
//! reported once at the iterable.

use crate::context::ResolveContext;
use crate::error::ResolveResult;
use crate::trace::CallRole;
use sema_common::DiagnosticKind;
use sema_syntax::ast::ForData;
use sema_syntax::{NodeIndex, NodeKind};
use sema_types::TypeId;
use tracing::debug;

#[derive(Clone, Copy, Debug, Default)]
pub struct ForLoopConventionChecker;

impl ForLoopConventionChecker {
    pub(crate) fn check(&self, ctx: &ResolveContext, node: NodeIndex, data: &ForData) -> ResolveResult<()> {
        ctx.check_cancelled()?;
        let iterable = ctx.type_expression(data.iterable, None)?;
        let element = self.element_type(ctx, node, data.iterable, iterable)?;
        debug!(
            node = node.0,
            element = %ctx.render_type(element),
            "checked for-loop conventions"
        );

        let NodeKind::Parameter(variable) = ctx.kind(data.variable)? else {
            return Err(ctx.unexpected(data.variable, "loop variable"));
        };
        let descriptor = ctx.descriptor_of(data.variable)?;
        let ty = if variable.type_ref.is_some() {
            let declared = descriptor.as_value_parameter().map_or(TypeId::ERROR, |p| p.ty);
            ctx.check_assignable(data.variable, element, declared);
            declared
        } else {
            element
        };
        ctx.record_variable(data.variable, ty);

        ctx.type_expression(data.body, None)?;
        Ok(())
    }

    /// The type `next()` yields, or the error type after reporting what is
    /// missing.
    fn element_type(
        &self,
        ctx: &ResolveContext,
        node: NodeIndex,
        iterable_node: NodeIndex,
        iterable: TypeId,
    ) -> ResolveResult<TypeId> {
        if iterable.is_error() {
            return Ok(TypeId::ERROR);
        }
        let Some(iterator) = ctx.resolve_convention_call(node, iterable, "iterator", CallRole::Iterator)? else {
            ctx.report(
                DiagnosticKind::IteratorMissing,
                iterable_node,
                &[&ctx.render_type(iterable)],
            );
            return Ok(TypeId::ERROR);
        };
        if iterator.is_error() {
            return Ok(TypeId::ERROR);
        }

        let boolean = ctx.builtins().boolean_type()?;
        let has_next = ctx.resolve_convention_call(node, iterator, "hasNext", CallRole::HasNext)?;
        let has_next_ok = has_next.is_some_and(|ty| {
            ty.is_error() || ctx.types.is_dynamic(ty) || ctx.checker().is_subtype(ty, boolean)
        });
        if !has_next_ok {
            ctx.report(
                DiagnosticKind::HasNextMissing,
                iterable_node,
                &[&ctx.render_type(iterator)],
            );
        }

        match ctx.resolve_convention_call(node, iterator, "next", CallRole::Next)? {
            Some(element) => Ok(element),
            None => {
                ctx.report(
                    DiagnosticKind::NextMissing,
                    iterable_node,
                    &[&ctx.render_type(iterator)],
                );
                Ok(TypeId::ERROR)
            }
        }
    }
}
