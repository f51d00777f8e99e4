//! Parser state - type mention parsing methods

use super::ParserState;
use crate::ast::*;
use crate::error::ParseError;
use crate::scanner::SyntaxKind;

impl ParserState<'_> {
    /// Parse a type mention: `a.b.C<T>?`, `(A, B) -> R`, `((A) -> R)?`, `dynamic`.
    pub(crate) fn parse_type(&mut self) -> Result<NodeIndex, ParseError> {
        let start = self.token_pos();
        if self.is_token(SyntaxKind::OpenParenToken) {
            return self.parse_function_or_parenthesized_type(start);
        }
        if self.is_identifier_text("dynamic")
            && !matches!(
                self.nth(1).kind,
                SyntaxKind::DotToken | SyntaxKind::LessThanToken
            )
        {
            self.next_token();
            return Ok(self.finish_node(NodeKind::DynamicType, start));
        }
        let path = self.parse_qualified_name()?;
        self.finish_type_reference(start, path)
    }

    /// Single-segment type reference, used for extension receivers where a
    /// `.` ends the type.
    pub(crate) fn parse_simple_type_reference(&mut self) -> Result<NodeIndex, ParseError> {
        let start = self.token_pos();
        let (name, _) = self.parse_identifier()?;
        self.finish_type_reference(start, vec![name])
    }

    fn finish_type_reference(
        &mut self,
        start: u32,
        path: Vec<sema_common::Atom>,
    ) -> Result<NodeIndex, ParseError> {
        let args = if self.is_token_same_line(SyntaxKind::LessThanToken) {
            self.parse_type_argument_list()?
        } else {
            Vec::new()
        };
        let nullable = self.is_token_same_line(SyntaxKind::QuestionToken);
        if nullable {
            self.next_token();
        }
        Ok(self.finish_node(
            NodeKind::TypeReference(TypeReferenceData {
                path,
                args,
                nullable,
            }),
            start,
        ))
    }

    /// `<A, B>`; the caller has checked that the current token is `<`.
    pub(crate) fn parse_type_argument_list(&mut self) -> Result<Vec<NodeIndex>, ParseError> {
        self.parse_expected(SyntaxKind::LessThanToken)?;
        let mut args = Vec::new();
        loop {
            args.push(self.parse_type()?);
            if !self.parse_optional(SyntaxKind::CommaToken) {
                break;
            }
        }
        self.parse_expected(SyntaxKind::GreaterThanToken)?;
        Ok(args)
    }

    fn parse_function_or_parenthesized_type(&mut self, start: u32) -> Result<NodeIndex, ParseError> {
        self.parse_expected(SyntaxKind::OpenParenToken)?;
        let mut params = Vec::new();
        while !self.is_token(SyntaxKind::CloseParenToken) {
            params.push(self.parse_type()?);
            if !self.parse_optional(SyntaxKind::CommaToken) {
                break;
            }
        }
        self.parse_expected(SyntaxKind::CloseParenToken)?;

        if self.parse_optional(SyntaxKind::ArrowToken) {
            let return_type = self.parse_type()?;
            return Ok(self.finish_node(
                NodeKind::FunctionType(FunctionTypeData {
                    params,
                    return_type,
                    nullable: false,
                }),
                start,
            ));
        }

        // `((A) -> R)?`: a parenthesized function type made nullable.
        let [inner] = params.as_slice() else {
            return Err(self.error_here("expected '->'"));
        };
        let inner = *inner;
        if !self.is_token_same_line(SyntaxKind::QuestionToken) {
            return Ok(inner);
        }
        self.next_token();
        let Some(NodeKind::FunctionType(function)) = self.arena.kind(inner).cloned() else {
            return Err(self.error_here("only function types may be parenthesized"));
        };
        Ok(self.finish_node(
            NodeKind::FunctionType(FunctionTypeData {
                nullable: true,
                ..function
            }),
            start,
        ))
    }
}
