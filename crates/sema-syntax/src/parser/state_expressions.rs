//! Parser state - expression and statement parsing methods

use super::ParserState;
use crate::ast::*;
use crate::error::ParseError;
use crate::scanner::{SyntaxKind, unescape_string};

impl ParserState<'_> {
    // =========================================================================
    // Parse Methods - Statements
    // =========================================================================

    /// `{ statements }`
    pub(crate) fn parse_block(&mut self) -> Result<NodeIndex, ParseError> {
        let start = self.token_pos();
        self.parse_expected(SyntaxKind::OpenBraceToken)?;
        let statements = self.parse_statements()?;
        self.parse_expected(SyntaxKind::CloseBraceToken)?;
        Ok(self.finish_node(NodeKind::Block(BlockData { statements }), start))
    }

    /// Statements up to (not including) the closing `}`.
    fn parse_statements(&mut self) -> Result<Vec<NodeIndex>, ParseError> {
        let mut statements = Vec::new();
        self.skip_semicolons();
        while !self.is_token(SyntaxKind::CloseBraceToken) {
            if self.is_token(SyntaxKind::EndOfFileToken) {
                return Err(self.error_here("expected '}'"));
            }
            statements.push(self.parse_statement()?);
            self.expect_statement_end()?;
            self.skip_semicolons();
        }
        Ok(statements)
    }

    fn parse_statement(&mut self) -> Result<NodeIndex, ParseError> {
        if self.is_declaration_start() {
            return self.parse_declaration();
        }
        match self.token() {
            SyntaxKind::WhileKeyword => return self.parse_while(),
            SyntaxKind::ForKeyword => return self.parse_for(),
            _ => {}
        }

        let start = self.token_pos();
        let expr = self.parse_expression()?;
        if !self.is_token(SyntaxKind::EqualsToken) {
            return Ok(expr);
        }
        if !matches!(
            self.arena.kind(expr),
            Some(NodeKind::Name(_)) | Some(NodeKind::MemberAccess(_))
        ) {
            return Err(self.error_here("invalid assignment target"));
        }
        self.next_token();
        let value = self.parse_expression()?;
        Ok(self.finish_node(
            NodeKind::Assignment(AssignmentData {
                target: expr,
                value,
            }),
            start,
        ))
    }

    /// Body of `if`/`while`/`for`: a block or a single statement.
    fn parse_control_body(&mut self) -> Result<NodeIndex, ParseError> {
        if self.is_token(SyntaxKind::OpenBraceToken) {
            self.parse_block()
        } else {
            self.parse_statement()
        }
    }

    fn parse_while(&mut self) -> Result<NodeIndex, ParseError> {
        let start = self.token_pos();
        self.parse_expected(SyntaxKind::WhileKeyword)?;
        self.parse_expected(SyntaxKind::OpenParenToken)?;
        let condition = self.parse_expression()?;
        self.parse_expected(SyntaxKind::CloseParenToken)?;
        let body = self.parse_control_body()?;
        Ok(self.finish_node(NodeKind::While(WhileData { condition, body }), start))
    }

    fn parse_for(&mut self) -> Result<NodeIndex, ParseError> {
        let start = self.token_pos();
        self.parse_expected(SyntaxKind::ForKeyword)?;
        self.parse_expected(SyntaxKind::OpenParenToken)?;
        let variable_start = self.token_pos();
        let (name, _) = self.parse_identifier()?;
        let type_ref = if self.parse_optional(SyntaxKind::ColonToken) {
            self.parse_type()?
        } else {
            NodeIndex::NONE
        };
        let variable = self.finish_node(
            NodeKind::Parameter(ParameterData {
                name,
                type_ref,
                default: NodeIndex::NONE,
                vararg: false,
                property: None,
            }),
            variable_start,
        );
        self.parse_expected(SyntaxKind::InKeyword)?;
        let iterable = self.parse_expression()?;
        self.parse_expected(SyntaxKind::CloseParenToken)?;
        let body = self.parse_control_body()?;
        Ok(self.finish_node(
            NodeKind::For(ForData {
                variable,
                iterable,
                body,
            }),
            start,
        ))
    }

    // =========================================================================
    // Parse Methods - Binary Expressions
    // =========================================================================

    /// Parse an expression.
    ///
    /// Precedence from loosest to tightest: `||`, `&&`, equality, comparison,
    /// `is`, `?:`, additive, multiplicative, `as`, prefix, postfix.
    pub(crate) fn parse_expression(&mut self) -> Result<NodeIndex, ParseError> {
        self.parse_disjunction()
    }

    fn make_binary(&mut self, op: BinaryOp, lhs: NodeIndex, rhs: NodeIndex) -> NodeIndex {
        let start = self.arena.span(lhs).start;
        self.finish_node(NodeKind::Binary(BinaryData { op, lhs, rhs }), start)
    }

    fn parse_disjunction(&mut self) -> Result<NodeIndex, ParseError> {
        let mut lhs = self.parse_conjunction()?;
        while self.parse_optional(SyntaxKind::BarBarToken) {
            let rhs = self.parse_conjunction()?;
            lhs = self.make_binary(BinaryOp::Or, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_conjunction(&mut self) -> Result<NodeIndex, ParseError> {
        let mut lhs = self.parse_equality()?;
        while self.parse_optional(SyntaxKind::AmpersandAmpersandToken) {
            let rhs = self.parse_equality()?;
            lhs = self.make_binary(BinaryOp::And, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_equality(&mut self) -> Result<NodeIndex, ParseError> {
        let mut lhs = self.parse_comparison()?;
        loop {
            let op = if self.is_token_same_line(SyntaxKind::EqualsEqualsToken) {
                BinaryOp::Eq
            } else if self.is_token_same_line(SyntaxKind::ExclamationEqualsToken) {
                BinaryOp::NotEq
            } else {
                return Ok(lhs);
            };
            self.next_token();
            let rhs = self.parse_comparison()?;
            lhs = self.make_binary(op, lhs, rhs);
        }
    }

    fn parse_comparison(&mut self) -> Result<NodeIndex, ParseError> {
        let mut lhs = self.parse_named_check()?;
        loop {
            if self.current().newline_before {
                return Ok(lhs);
            }
            let op = match self.token() {
                SyntaxKind::LessThanToken => BinaryOp::Lt,
                SyntaxKind::GreaterThanToken => BinaryOp::Gt,
                SyntaxKind::LessThanEqualsToken => BinaryOp::LtEq,
                SyntaxKind::GreaterThanEqualsToken => BinaryOp::GtEq,
                _ => return Ok(lhs),
            };
            self.next_token();
            let rhs = self.parse_named_check()?;
            lhs = self.make_binary(op, lhs, rhs);
        }
    }

    fn parse_named_check(&mut self) -> Result<NodeIndex, ParseError> {
        let mut expr = self.parse_elvis()?;
        loop {
            let negated = if self.is_token_same_line(SyntaxKind::IsKeyword) {
                false
            } else if self.is_token_same_line(SyntaxKind::ExclamationToken)
                && self.nth(1).kind == SyntaxKind::IsKeyword
            {
                self.next_token();
                true
            } else {
                return Ok(expr);
            };
            self.next_token();
            let type_ref = self.parse_type()?;
            let start = self.arena.span(expr).start;
            expr = self.finish_node(
                NodeKind::IsCheck(IsCheckData {
                    expr,
                    type_ref,
                    negated,
                }),
                start,
            );
        }
    }

    fn parse_elvis(&mut self) -> Result<NodeIndex, ParseError> {
        let mut lhs = self.parse_additive()?;
        while self.parse_optional(SyntaxKind::QuestionColonToken) {
            let rhs = self.parse_additive()?;
            let start = self.arena.span(lhs).start;
            lhs = self.finish_node(NodeKind::Elvis(ElvisData { lhs, rhs }), start);
        }
        Ok(lhs)
    }

    fn parse_additive(&mut self) -> Result<NodeIndex, ParseError> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = if self.is_token_same_line(SyntaxKind::PlusToken) {
                BinaryOp::Add
            } else if self.is_token_same_line(SyntaxKind::MinusToken) {
                BinaryOp::Sub
            } else {
                return Ok(lhs);
            };
            self.next_token();
            let rhs = self.parse_multiplicative()?;
            lhs = self.make_binary(op, lhs, rhs);
        }
    }

    fn parse_multiplicative(&mut self) -> Result<NodeIndex, ParseError> {
        let mut lhs = self.parse_as()?;
        loop {
            if self.current().newline_before {
                return Ok(lhs);
            }
            let op = match self.token() {
                SyntaxKind::AsteriskToken => BinaryOp::Mul,
                SyntaxKind::SlashToken => BinaryOp::Div,
                SyntaxKind::PercentToken => BinaryOp::Rem,
                _ => return Ok(lhs),
            };
            self.next_token();
            let rhs = self.parse_as()?;
            lhs = self.make_binary(op, lhs, rhs);
        }
    }

    fn parse_as(&mut self) -> Result<NodeIndex, ParseError> {
        let mut expr = self.parse_prefix()?;
        while self.is_token_same_line(SyntaxKind::AsKeyword) {
            self.next_token();
            let safe = self.is_token_same_line(SyntaxKind::QuestionToken);
            if safe {
                self.next_token();
            }
            let type_ref = self.parse_type()?;
            let start = self.arena.span(expr).start;
            expr = self.finish_node(
                NodeKind::Cast(CastData {
                    expr,
                    type_ref,
                    safe,
                }),
                start,
            );
        }
        Ok(expr)
    }

    fn parse_prefix(&mut self) -> Result<NodeIndex, ParseError> {
        let op = match self.token() {
            SyntaxKind::ExclamationToken => UnaryOp::Not,
            SyntaxKind::MinusToken => UnaryOp::Minus,
            _ => return self.parse_postfix(),
        };
        let start = self.token_pos();
        self.next_token();
        let operand = self.parse_prefix()?;
        Ok(self.finish_node(NodeKind::Unary(UnaryData { op, operand }), start))
    }

    // =========================================================================
    // Parse Methods - Postfix and Primary Expressions
    // =========================================================================

    fn parse_postfix(&mut self) -> Result<NodeIndex, ParseError> {
        let start = self.token_pos();
        let mut expr = self.parse_primary()?;
        loop {
            match self.token() {
                SyntaxKind::OpenParenToken if !self.current().newline_before => {
                    expr = self.finish_call(expr, Vec::new(), start)?;
                }
                SyntaxKind::LessThanToken
                    if !self.current().newline_before && self.is_callable_head(expr) =>
                {
                    let checkpoint = self.checkpoint();
                    match self.parse_type_argument_list() {
                        Ok(type_args)
                            if self.is_token_same_line(SyntaxKind::OpenParenToken)
                                || self.is_token_same_line(SyntaxKind::OpenBraceToken) =>
                        {
                            expr = self.finish_call(expr, type_args, start)?;
                        }
                        _ => {
                            self.rewind(checkpoint);
                            return Ok(expr);
                        }
                    }
                }
                SyntaxKind::OpenBraceToken
                    if !self.current().newline_before && self.is_callable_head(expr) =>
                {
                    expr = self.finish_call(expr, Vec::new(), start)?;
                }
                SyntaxKind::DotToken | SyntaxKind::QuestionDotToken => {
                    let safe = self.is_token(SyntaxKind::QuestionDotToken);
                    self.next_token();
                    let (name, name_span) = self.parse_identifier()?;
                    expr = self.finish_node(
                        NodeKind::MemberAccess(MemberAccessData {
                            receiver: expr,
                            safe,
                            name,
                            name_span,
                        }),
                        start,
                    );
                }
                _ => return Ok(expr),
            }
        }
    }

    fn is_callable_head(&self, expr: NodeIndex) -> bool {
        matches!(
            self.arena.kind(expr),
            Some(NodeKind::Name(_)) | Some(NodeKind::MemberAccess(_))
        )
    }

    /// Turn `callee` into a call, consuming `(args)` and a trailing lambda.
    ///
    /// A name or member access becomes a named call; any other callee
    /// expression becomes a call of `invoke` on that value.
    fn finish_call(
        &mut self,
        callee: NodeIndex,
        type_args: Vec<NodeIndex>,
        start: u32,
    ) -> Result<NodeIndex, ParseError> {
        let mut args = if self.is_token(SyntaxKind::OpenParenToken) {
            self.parse_argument_list()?
        } else {
            Vec::new()
        };
        if self.is_token_same_line(SyntaxKind::OpenBraceToken) {
            args.push(self.parse_lambda()?);
        }

        let callee_span = self.arena.span(callee);
        let data = match self.arena.kind(callee) {
            Some(NodeKind::Name(name)) => CallData {
                receiver: NodeIndex::NONE,
                safe: false,
                callee: *name,
                callee_span,
                type_args,
                args,
            },
            Some(NodeKind::MemberAccess(access)) => CallData {
                receiver: access.receiver,
                safe: access.safe,
                callee: access.name,
                callee_span: access.name_span,
                type_args,
                args,
            },
            _ => CallData {
                receiver: callee,
                safe: false,
                callee: self.interner.intern("invoke"),
                callee_span,
                type_args,
                args,
            },
        };
        Ok(self.finish_node(NodeKind::Call(data), start))
    }

    pub(crate) fn parse_argument_list(&mut self) -> Result<Vec<NodeIndex>, ParseError> {
        self.parse_expected(SyntaxKind::OpenParenToken)?;
        let mut args = Vec::new();
        while !self.is_token(SyntaxKind::CloseParenToken) {
            args.push(self.parse_expression()?);
            if !self.parse_optional(SyntaxKind::CommaToken) {
                break;
            }
        }
        self.parse_expected(SyntaxKind::CloseParenToken)?;
        Ok(args)
    }

    fn parse_primary(&mut self) -> Result<NodeIndex, ParseError> {
        let start = self.token_pos();
        let token = self.current();
        let kind = match token.kind {
            SyntaxKind::IntLiteral | SyntaxKind::LongLiteral => {
                let text = self.token_text(token).trim_end_matches('L').replace('_', "");
                let Ok(value) = text.parse::<i64>() else {
                    return Err(self.error_here("integer literal is out of range"));
                };
                if token.kind == SyntaxKind::LongLiteral {
                    NodeKind::LongLiteral(value)
                } else {
                    NodeKind::IntLiteral(value)
                }
            }
            SyntaxKind::DoubleLiteral => {
                let Ok(value) = self.token_text(token).parse::<f64>() else {
                    return Err(self.error_here("malformed floating-point literal"));
                };
                NodeKind::DoubleLiteral(value)
            }
            SyntaxKind::StringLiteral => {
                let value = unescape_string(self.token_text(token));
                NodeKind::StringLiteral(self.interner.intern(&value))
            }
            SyntaxKind::TrueKeyword => NodeKind::BooleanLiteral(true),
            SyntaxKind::FalseKeyword => NodeKind::BooleanLiteral(false),
            SyntaxKind::NullKeyword => NodeKind::NullLiteral,
            SyntaxKind::ThisKeyword => NodeKind::This,
            SyntaxKind::Identifier => {
                let text = self.token_text(token);
                NodeKind::Name(self.interner.intern(text))
            }
            SyntaxKind::OpenParenToken => {
                self.next_token();
                let inner = self.parse_expression()?;
                self.parse_expected(SyntaxKind::CloseParenToken)?;
                return Ok(inner);
            }
            SyntaxKind::OpenBraceToken => return self.parse_lambda(),
            SyntaxKind::IfKeyword => return self.parse_if(),
            SyntaxKind::ReturnKeyword => return self.parse_return(),
            _ => return Err(self.error_here("expected an expression")),
        };
        self.next_token();
        Ok(self.finish_node(kind, start))
    }

    fn parse_if(&mut self) -> Result<NodeIndex, ParseError> {
        let start = self.token_pos();
        self.parse_expected(SyntaxKind::IfKeyword)?;
        self.parse_expected(SyntaxKind::OpenParenToken)?;
        let condition = self.parse_expression()?;
        self.parse_expected(SyntaxKind::CloseParenToken)?;
        let then_branch = self.parse_control_body()?;
        let checkpoint = self.checkpoint();
        self.skip_semicolons();
        let else_branch = if self.parse_optional(SyntaxKind::ElseKeyword) {
            self.parse_control_body()?
        } else {
            self.rewind(checkpoint);
            NodeIndex::NONE
        };
        Ok(self.finish_node(
            NodeKind::If(IfData {
                condition,
                then_branch,
                else_branch,
            }),
            start,
        ))
    }

    fn parse_return(&mut self) -> Result<NodeIndex, ParseError> {
        let start = self.token_pos();
        self.parse_expected(SyntaxKind::ReturnKeyword)?;
        let ends_here = self.current().newline_before
            || matches!(
                self.token(),
                SyntaxKind::CloseBraceToken
                    | SyntaxKind::CloseParenToken
                    | SyntaxKind::SemicolonToken
                    | SyntaxKind::EndOfFileToken
                    | SyntaxKind::ElseKeyword
                    | SyntaxKind::CommaToken
            );
        let value = if ends_here {
            NodeIndex::NONE
        } else {
            self.parse_expression()?
        };
        Ok(self.finish_node(NodeKind::Return(ReturnData { value }), start))
    }

    /// `{ a: Int, b -> body }` or `{ body }`.
    fn parse_lambda(&mut self) -> Result<NodeIndex, ParseError> {
        let start = self.token_pos();
        self.parse_expected(SyntaxKind::OpenBraceToken)?;
        let params = self.try_parse_lambda_parameters();
        let body_start = self.token_pos();
        let statements = self.parse_statements()?;
        let body = self.finish_node(NodeKind::Block(BlockData { statements }), body_start);
        self.parse_expected(SyntaxKind::CloseBraceToken)?;
        Ok(self.finish_node(NodeKind::Lambda(LambdaData { params, body }), start))
    }

    /// Speculatively parse `a, b: T ->`; rewinds and returns nothing when the
    /// lambda has no parameter list.
    fn try_parse_lambda_parameters(&mut self) -> Vec<NodeIndex> {
        if self.parse_optional(SyntaxKind::ArrowToken) {
            return Vec::new();
        }
        let checkpoint = self.checkpoint();
        let mut params = Vec::new();
        loop {
            let param_start = self.token_pos();
            let Ok((name, _)) = self.parse_identifier() else {
                break;
            };
            let mut type_ref = NodeIndex::NONE;
            if self.parse_optional(SyntaxKind::ColonToken) {
                match self.parse_type() {
                    Ok(parsed) => type_ref = parsed,
                    Err(_) => break,
                }
            }
            params.push(self.finish_node(
                NodeKind::Parameter(ParameterData {
                    name,
                    type_ref,
                    default: NodeIndex::NONE,
                    vararg: false,
                    property: None,
                }),
                param_start,
            ));
            if self.parse_optional(SyntaxKind::CommaToken) {
                continue;
            }
            if self.parse_optional(SyntaxKind::ArrowToken) {
                return params;
            }
            break;
        }
        self.rewind(checkpoint);
        Vec::new()
    }
}
