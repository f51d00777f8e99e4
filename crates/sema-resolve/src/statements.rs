//! Statements: blocks, local declarations, assignments and `return`.

use crate::context::ResolveContext;
use crate::descriptors::Descriptor;
use crate::error::ResolveResult;
use crate::scope::ValueHit;
use sema_common::{Atom, DefId, DiagnosticKind};
use sema_syntax::ast::AssignmentData;
use sema_syntax::{NodeIndex, NodeKind};
use sema_types::TypeId;

/// What an assignment writes to.
struct AssignTarget {
    name: Atom,
    ty: TypeId,
    def: Option<DefId>,
    mutable: bool,
}

impl ResolveContext {
    /// A block yields the value of its last statement, or `Unit` when that
    /// statement is a declaration or there is none.
    pub(crate) fn type_block(&self, statements: &[NodeIndex], expected: Option<TypeId>) -> ResolveResult<TypeId> {
        let Some((&last, init)) = statements.split_last() else {
            return self.builtins().unit_type();
        };
        for &statement in init {
            self.check_cancelled()?;
            self.type_expression(statement, None)?;
        }
        self.check_cancelled()?;
        self.type_expression(last, expected)
    }

    pub(crate) fn type_local_declaration(&self, node: NodeIndex) -> ResolveResult<()> {
        match self.kind(node)? {
            NodeKind::Property(data) => {
                let property = self.property_descriptor_of(node)?;
                let ty = if data.type_ref.is_some() {
                    let declared = self.property_type(&property)?;
                    if data.initializer.is_some() {
                        self.check_expression(data.initializer, declared)?;
                    }
                    declared
                } else if data.initializer.is_some() {
                    self.type_expression(data.initializer, None)?
                } else {
                    TypeId::ERROR
                };
                self.record_variable(node, ty);
            }
            _ => {
                self.descriptor_of(node)?;
                self.ensure_body(node)?;
            }
        }
        Ok(())
    }

    pub(crate) fn type_assignment(&self, data: &AssignmentData) -> ResolveResult<TypeId> {
        let unit = self.builtins().unit_type()?;
        let Some(target) = self.assignment_target(data.target)? else {
            self.type_expression(data.value, None)?;
            return Ok(unit);
        };
        if let Some(def) = target.def {
            self.record_reference(data.target, def);
        }
        self.record_type(data.target, target.ty);
        if !target.mutable {
            self.report(DiagnosticKind::ValReassignment, data.target, &[self.text(target.name)]);
        }
        self.check_expression(data.value, target.ty)?;
        Ok(unit)
    }

    fn assignment_target(&self, target: NodeIndex) -> ResolveResult<Option<AssignTarget>> {
        match self.kind(target)? {
            NodeKind::Name(name) => {
                let Some(hit) = self.lookup_name(target, *name)? else {
                    self.report(DiagnosticKind::UnresolvedReference, target, &[self.text(*name)]);
                    return Ok(None);
                };
                let mutable = self.is_mutable(&hit)?;
                let (ty, def) = self.value_type(&hit)?;
                Ok(Some(AssignTarget {
                    name: *name,
                    ty,
                    def,
                    mutable,
                }))
            }
            NodeKind::MemberAccess(access) => {
                let receiver = self.type_expression(access.receiver, None)?;
                if receiver.is_error() {
                    return Ok(None);
                }
                if self.types.is_dynamic(receiver) {
                    return Ok(Some(AssignTarget {
                        name: access.name,
                        ty: receiver,
                        def: None,
                        mutable: true,
                    }));
                }
                let core = self.types.make_non_null(self.types.lower_bound(receiver));
                let Some(member) = self.member_property(core, access.name)? else {
                    self.report_at(
                        DiagnosticKind::UnresolvedReference,
                        target,
                        access.name_span,
                        &[self.text(access.name)],
                    );
                    return Ok(None);
                };
                if !access.safe && self.checker().may_be_null(receiver) {
                    self.report_at(
                        DiagnosticKind::UnsafeCall,
                        target,
                        access.name_span,
                        &[&self.render_type(receiver)],
                    );
                }
                Ok(Some(AssignTarget {
                    name: access.name,
                    ty: member.ty,
                    def: Some(member.descriptor.def),
                    mutable: member.descriptor.mutable,
                }))
            }
            _ => Err(self.unexpected(target, "assignment target")),
        }
    }

    /// Parameters, loop variables and `it` are read-only.
    fn is_mutable(&self, hit: &ValueHit) -> ResolveResult<bool> {
        let node = match hit {
            ValueHit::Member(member) => return Ok(member.descriptor.mutable),
            ValueHit::Declaration(node) => *node,
        };
        match self.kind(node)? {
            NodeKind::Property(_) | NodeKind::Parameter(_) => Ok(match self.descriptor_of(node)? {
                Descriptor::Property(property) => property.mutable,
                _ => false,
            }),
            _ => Ok(false),
        }
    }

    /// `return` belongs to the nearest enclosing function. Lambdas, class
    /// bodies and top-level initializers have nothing to return from.
    pub(crate) fn type_return(&self, node: NodeIndex, value: NodeIndex) -> ResolveResult<TypeId> {
        let mut target = None;
        for ancestor in self.sources.arena().ancestors(node) {
            match self.kind(ancestor)? {
                NodeKind::Function(_) => {
                    target = Some(ancestor);
                    break;
                }
                NodeKind::Lambda(_) | NodeKind::Class(_) | NodeKind::SourceFile(_) => break,
                _ => {}
            }
        }
        let function = match target {
            Some(function) => self.function_descriptor_of(function)?,
            None => return self.reject_return(node, value),
        };
        let NodeKind::Function(data) = self.kind(function.node)? else {
            return Err(self.unexpected(function.node, "function"));
        };
        let expected = if data.return_type.is_some() {
            self.return_type(&function)?
        } else if data.expression_body {
            return self.reject_return(node, value);
        } else {
            self.builtins().unit_type()?
        };
        if value.is_some() {
            self.check_expression(value, expected)?;
        }
        Ok(TypeId::NOTHING)
    }

    fn reject_return(&self, node: NodeIndex, value: NodeIndex) -> ResolveResult<TypeId> {
        self.report(DiagnosticKind::ReturnNotAllowed, node, &[]);
        if value.is_some() {
            self.type_expression(value, None)?;
        }
        Ok(TypeId::NOTHING)
    }
}
