//! Expression typing.
//!
//! [`type_expression`](ResolveContext::type_expression) is the single entry
//! point: it guards nesting depth, dispatches on the node kind and records
//! the resulting type once. Subexpressions are typed first; calls go
//! through the call resolver, which types arguments back through this
//! module. Statement forms live in `statements.rs` and `for_loop.rs`.

use crate::context::ResolveContext;
use crate::error::ResolveResult;
use crate::scope::ValueHit;
use sema_common::limits::{STACK_RED_ZONE, STACK_SEGMENT_SIZE};
use sema_common::{Atom, DiagnosticKind};
use sema_syntax::ast::{BinaryData, BinaryOp, IfData, LambdaData, MemberAccessData, UnaryData, UnaryOp};
use sema_syntax::{NodeIndex, NodeKind};
use sema_types::{Compatibility, TypeData, TypeId, TypeList, common_supertype};
use tracing::trace;

impl ResolveContext {
    /// Type `node`, using `expected` only where it drives inference
    /// (lambdas, generic calls, integer literals). No assignability check
    /// against `expected` is made here.
    pub(crate) fn type_expression(&self, node: NodeIndex, expected: Option<TypeId>) -> ResolveResult<TypeId> {
        if node.is_none() {
            return self.builtins().unit_type();
        }
        if let Some(recorded) = self.trace.borrow().type_of(node) {
            return Ok(recorded);
        }

        let depth = self.expr_depth.get() + 1;
        if depth > self.options.max_expression_depth {
            if !self.depth_reported.replace(true) {
                self.report(DiagnosticKind::ExpressionTooDeep, node, &[]);
            }
            return Ok(TypeId::ERROR);
        }
        self.expr_depth.set(depth);
        let result = stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT_SIZE, || {
            self.compute_expression_type(node, expected)
        });
        self.expr_depth.set(depth - 1);

        let ty = result?;
        self.record_type(node, ty);
        Ok(ty)
    }

    /// Type `node` against `expected` and report when it does not fit.
    pub(crate) fn check_expression(&self, node: NodeIndex, expected: TypeId) -> ResolveResult<TypeId> {
        let actual = self.type_expression(node, Some(expected))?;
        self.check_assignable(node, actual, expected);
        Ok(actual)
    }

    /// Report `TypeMismatch`, or the platform nullability warning when only
    /// the non-null bound of a flexible type fits.
    pub(crate) fn check_assignable(&self, node: NodeIndex, actual: TypeId, expected: TypeId) {
        if actual.is_error() || expected.is_error() {
            return;
        }
        match self.checker().assignability(actual, expected) {
            Compatibility::Compatible => {}
            Compatibility::CompatibleWithNullCheck => {
                if self.options.report_platform_nullability {
                    self.report(
                        DiagnosticKind::PlatformNullability,
                        node,
                        &[&self.render_type(actual), &self.render_type(expected)],
                    );
                }
            }
            Compatibility::Incompatible => {
                self.report(
                    DiagnosticKind::TypeMismatch,
                    node,
                    &[&self.render_type(actual), &self.render_type(expected)],
                );
            }
        }
    }

    fn compute_expression_type(&self, node: NodeIndex, expected: Option<TypeId>) -> ResolveResult<TypeId> {
        let builtins = self.builtins();
        let ty = match self.kind(node)? {
            NodeKind::IntLiteral(_) => {
                let long = builtins.long_type()?;
                match expected {
                    Some(expected) if self.types.make_non_null(self.types.lower_bound(expected)) == long => long,
                    _ => builtins.int_type()?,
                }
            }
            NodeKind::LongLiteral(_) => builtins.long_type()?,
            NodeKind::DoubleLiteral(_) => builtins.double_type()?,
            NodeKind::StringLiteral(_) => builtins.string_type()?,
            NodeKind::BooleanLiteral(_) => builtins.boolean_type()?,
            NodeKind::NullLiteral => TypeId::NULLABLE_NOTHING,
            NodeKind::This => self.type_this(node)?,
            NodeKind::Name(name) => self.type_name(node, *name)?,
            NodeKind::Call(data) => self.type_call(node, data, expected)?,
            NodeKind::MemberAccess(data) => self.type_member_access(node, data)?,
            NodeKind::Binary(data) => self.type_binary(node, data)?,
            NodeKind::Unary(data) => self.type_unary(node, data, expected)?,
            NodeKind::If(data) => self.type_if(data, expected)?,
            NodeKind::Lambda(data) => self.type_lambda(node, data, expected)?,
            NodeKind::IsCheck(data) => {
                self.type_expression(data.expr, None)?;
                self.resolve_type(data.type_ref)?;
                builtins.boolean_type()?
            }
            NodeKind::Cast(data) => {
                self.type_expression(data.expr, None)?;
                let target = self.resolve_type(data.type_ref)?;
                if data.safe {
                    self.types.make_nullable(target)
                } else {
                    target
                }
            }
            NodeKind::Elvis(data) => {
                let lhs = self.type_expression(data.lhs, None)?;
                let rhs = self.type_expression(data.rhs, expected)?;
                let lhs = self.types.make_non_null(lhs);
                self.join_types(&[lhs, rhs])
            }
            NodeKind::Block(data) => self.type_block(&data.statements, expected)?,
            NodeKind::Assignment(data) => self.type_assignment(data)?,
            NodeKind::Return(data) => self.type_return(node, data.value)?,
            NodeKind::While(data) => {
                self.check_expression(data.condition, builtins.boolean_type()?)?;
                self.type_expression(data.body, None)?;
                builtins.unit_type()?
            }
            NodeKind::For(data) => {
                self.loop_checker.check(self, node, data)?;
                builtins.unit_type()?
            }
            NodeKind::Class(_)
            | NodeKind::Function(_)
            | NodeKind::Property(_)
            | NodeKind::TypeAlias(_) => {
                self.type_local_declaration(node)?;
                builtins.unit_type()?
            }
            _ => return Err(self.unexpected(node, "expression")),
        };
        Ok(ty)
    }

    /// Common supertype of branch types, ignoring branches that failed.
    pub(crate) fn join_types(&self, types: &[TypeId]) -> TypeId {
        let valid: Vec<TypeId> = types.iter().copied().filter(|t| !t.is_error()).collect();
        if valid.is_empty() {
            return TypeId::ERROR;
        }
        common_supertype(&mut self.checker(), &valid)
    }

    fn type_this(&self, node: NodeIndex) -> ResolveResult<TypeId> {
        let scope = self.scope_at(node)?;
        match scope.innermost_receiver() {
            Some(receiver) => Ok(receiver),
            None => {
                self.report(DiagnosticKind::UnresolvedReference, node, &["this"]);
                Ok(TypeId::ERROR)
            }
        }
    }

    pub(crate) fn lookup_name(&self, node: NodeIndex, name: Atom) -> ResolveResult<Option<ValueHit>> {
        let scope = self.scope_at(node)?;
        self.lookup_value(&scope, name, self.span(node).start)
    }

    fn type_name(&self, node: NodeIndex, name: Atom) -> ResolveResult<TypeId> {
        let Some(hit) = self.lookup_name(node, name)? else {
            self.report(DiagnosticKind::UnresolvedReference, node, &[self.text(name)]);
            return Ok(TypeId::ERROR);
        };
        let (ty, def) = self.value_type(&hit)?;
        if let Some(def) = def {
            self.record_reference(node, def);
        }
        Ok(ty)
    }

    fn type_member_access(&self, node: NodeIndex, data: &MemberAccessData) -> ResolveResult<TypeId> {
        let receiver = self.type_expression(data.receiver, None)?;
        if receiver.is_error() {
            return Ok(TypeId::ERROR);
        }
        if self.types.is_dynamic(receiver) {
            return Ok(receiver);
        }
        let core = self.types.make_non_null(self.types.lower_bound(receiver));
        let Some(member) = self.member_property(core, data.name)? else {
            self.report_at(
                DiagnosticKind::UnresolvedReference,
                node,
                data.name_span,
                &[self.text(data.name)],
            );
            return Ok(TypeId::ERROR);
        };
        self.record_reference(node, member.descriptor.def);
        if !data.safe && self.checker().may_be_null(receiver) {
            self.report_at(
                DiagnosticKind::UnsafeCall,
                node,
                data.name_span,
                &[&self.render_type(receiver)],
            );
        }
        Ok(if data.safe {
            self.types.make_nullable(member.ty)
        } else {
            member.ty
        })
    }

    fn type_binary(&self, node: NodeIndex, data: &BinaryData) -> ResolveResult<TypeId> {
        let boolean = self.builtins().boolean_type()?;
        match data.op {
            BinaryOp::And | BinaryOp::Or => {
                self.check_expression(data.lhs, boolean)?;
                self.check_expression(data.rhs, boolean)?;
                Ok(boolean)
            }
            BinaryOp::Eq | BinaryOp::NotEq => {
                self.type_expression(data.lhs, None)?;
                self.type_expression(data.rhs, None)?;
                Ok(boolean)
            }
            op => {
                let Some(name) = op.convention_name() else {
                    return Ok(TypeId::ERROR);
                };
                let lhs = self.type_expression(data.lhs, None)?;
                let result =
                    self.resolve_operator_call(node, lhs, name, std::slice::from_ref(&data.rhs), None)?;
                if op.is_comparison() {
                    Ok(boolean)
                } else {
                    Ok(result)
                }
            }
        }
    }

    fn type_unary(&self, node: NodeIndex, data: &UnaryData, expected: Option<TypeId>) -> ResolveResult<TypeId> {
        // `-1` against `Long` is a `Long` literal.
        let operand_expected = match data.op {
            UnaryOp::Minus => expected,
            UnaryOp::Not => None,
        };
        let operand = self.type_expression(data.operand, operand_expected)?;
        self.resolve_operator_call(node, operand, data.op.convention_name(), &[], None)
    }

    fn type_if(&self, data: &IfData, expected: Option<TypeId>) -> ResolveResult<TypeId> {
        self.check_expression(data.condition, self.builtins().boolean_type()?)?;
        if data.else_branch.is_none() {
            self.type_expression(data.then_branch, None)?;
            return self.builtins().unit_type();
        }
        let then_type = self.type_expression(data.then_branch, expected)?;
        let else_type = self.type_expression(data.else_branch, expected)?;
        Ok(self.join_types(&[then_type, else_type]))
    }

    /// Type a lambda. Parameter types come from declarations or from the
    /// expected function type; the body is checked against the expected
    /// return type when that is fully known. A `Unit` return accepts any
    /// body.
    fn type_lambda(&self, node: NodeIndex, data: &LambdaData, expected: Option<TypeId>) -> ResolveResult<TypeId> {
        let (expected_params, expected_ret) = match expected
            .and_then(|e| self.function_type_of(e))
            .map(|f| self.types.lookup(f))
        {
            Some(TypeData::Function { params, ret, .. }) => (params, Some(ret)),
            _ => (TypeList::new(), None),
        };
        let known = |ty: &TypeId| !ty.is_error() && !self.types.contains_inference_vars(*ty);

        let mut params = Vec::with_capacity(data.params.len().max(expected_params.len()));
        if data.params.is_empty() {
            if let [it] = expected_params.as_slice() {
                let ty = if known(it) { *it } else { TypeId::ERROR };
                self.implicit_parameter(node)?;
                self.record_variable(node, ty);
                params.push(ty);
            }
        } else {
            for (index, &param) in data.params.iter().enumerate() {
                let NodeKind::Parameter(declared) = self.kind(param)? else {
                    return Err(self.unexpected(param, "parameter"));
                };
                let descriptor = self.descriptor_of(param)?;
                let ty = if declared.type_ref.is_some() {
                    descriptor.as_value_parameter().map_or(TypeId::ERROR, |p| p.ty)
                } else {
                    match expected_params.get(index).filter(|t| known(*t)) {
                        Some(&ty) => ty,
                        None => {
                            self.report(
                                DiagnosticKind::CannotInferParameterType,
                                param,
                                &[self.text(declared.name)],
                            );
                            TypeId::ERROR
                        }
                    }
                };
                self.record_variable(param, ty);
                params.push(ty);
            }
        }

        let unit = self.builtins().unit_type()?;
        let ret = match expected_ret.filter(known) {
            Some(ret) if ret == unit => {
                self.type_expression(data.body, None)?;
                unit
            }
            Some(ret) => {
                let body = self.type_expression(data.body, Some(ret))?;
                self.check_assignable(self.result_node(data.body), body, ret);
                ret
            }
            None => self.type_expression(data.body, None)?,
        };
        trace!(lambda = node.0, params = params.len(), "typed lambda");
        Ok(self.types.function(params, ret, false))
    }

    /// The node whose value a block yields.
    fn result_node(&self, body: NodeIndex) -> NodeIndex {
        match self.kind(body) {
            Ok(NodeKind::Block(block)) => block.statements.last().copied().unwrap_or(body),
            _ => body,
        }
    }
}
