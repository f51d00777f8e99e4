//! Parser state - file, import and declaration parsing methods

use super::ParserState;
use crate::ast::*;
use crate::error::ParseError;
use crate::scanner::SyntaxKind;
use sema_common::Atom;

impl ParserState<'_> {
    // =========================================================================
    // Parse Methods - Files
    // =========================================================================

    pub(crate) fn parse_source_file(&mut self) -> Result<NodeIndex, ParseError> {
        let start = self.token_pos();
        let mut package = Vec::new();
        self.skip_semicolons();
        if self.parse_optional(SyntaxKind::PackageKeyword) {
            package = self.parse_qualified_name()?;
            self.expect_statement_end()?;
        }

        let mut imports = Vec::new();
        self.skip_semicolons();
        while self.is_token(SyntaxKind::ImportKeyword) {
            imports.push(self.parse_import()?);
            self.expect_statement_end()?;
            self.skip_semicolons();
        }

        let mut declarations = Vec::new();
        while !self.is_token(SyntaxKind::EndOfFileToken) {
            if !self.is_declaration_start() {
                return Err(self.error_here("expected a declaration"));
            }
            declarations.push(self.parse_declaration()?);
            self.expect_statement_end()?;
            self.skip_semicolons();
        }

        let end = self.prev_end;
        let data = SourceFileData {
            package,
            imports,
            declarations,
        };
        Ok(self.alloc_node(
            NodeKind::SourceFile(data),
            sema_common::Span::new(start.min(end), end),
        ))
    }

    fn parse_import(&mut self) -> Result<NodeIndex, ParseError> {
        let start = self.token_pos();
        self.parse_expected(SyntaxKind::ImportKeyword)?;
        let path = self.parse_qualified_name()?;
        let mut all_under = false;
        let mut alias = Atom::NONE;
        if self.is_token(SyntaxKind::DotToken) && self.nth(1).kind == SyntaxKind::AsteriskToken {
            self.next_token();
            self.next_token();
            all_under = true;
        } else if self.parse_optional(SyntaxKind::AsKeyword) {
            alias = self.parse_identifier()?.0;
        }
        Ok(self.finish_node(
            NodeKind::Import(ImportData {
                path,
                all_under,
                alias,
            }),
            start,
        ))
    }

    // =========================================================================
    // Parse Methods - Declarations
    // =========================================================================

    fn parse_modifiers(&mut self) -> Modifiers {
        let mut modifiers = Modifiers::empty();
        while self.is_modifier() {
            let token = self.next_token();
            modifiers |= match self.token_text(token) {
                "open" => Modifiers::OPEN,
                "abstract" => Modifiers::ABSTRACT,
                "override" => Modifiers::OVERRIDE,
                "private" => Modifiers::PRIVATE,
                "platform" => Modifiers::PLATFORM,
                _ => Modifiers::empty(),
            };
        }
        modifiers
    }

    /// Parse a declaration at the current position, modifiers included.
    pub(crate) fn parse_declaration(&mut self) -> Result<NodeIndex, ParseError> {
        let start = self.token_pos();
        let modifiers = self.parse_modifiers();
        match self.token() {
            SyntaxKind::ClassKeyword | SyntaxKind::InterfaceKeyword => {
                self.parse_class(start, modifiers)
            }
            SyntaxKind::FunKeyword => self.parse_function(start, modifiers),
            SyntaxKind::ValKeyword | SyntaxKind::VarKeyword => {
                self.parse_property(start, modifiers)
            }
            SyntaxKind::TypeAliasKeyword => self.parse_type_alias(start, modifiers),
            _ => Err(self.error_here("expected a declaration")),
        }
    }

    fn parse_class(&mut self, start: u32, modifiers: Modifiers) -> Result<NodeIndex, ParseError> {
        let kind = if self.parse_optional(SyntaxKind::InterfaceKeyword) {
            ClassKind::Interface
        } else {
            self.parse_expected(SyntaxKind::ClassKeyword)?;
            ClassKind::Class
        };
        let (name, name_span) = self.parse_identifier()?;
        let type_params = self.parse_type_parameters_opt()?;

        let mut has_primary_constructor = false;
        let mut constructor_params = Vec::new();
        if self.is_token_same_line(SyntaxKind::OpenParenToken) {
            has_primary_constructor = true;
            constructor_params = self.parse_parameter_list(true)?;
        }

        let mut supertypes = Vec::new();
        let mut super_call_args = Vec::new();
        if self.parse_optional(SyntaxKind::ColonToken) {
            loop {
                supertypes.push(self.parse_type()?);
                if self.is_token_same_line(SyntaxKind::OpenParenToken) {
                    super_call_args = self.parse_argument_list()?;
                }
                if !self.parse_optional(SyntaxKind::CommaToken) {
                    break;
                }
            }
        }

        let mut members = Vec::new();
        if self.is_token_same_line(SyntaxKind::OpenBraceToken) {
            self.next_token();
            self.skip_semicolons();
            while !self.is_token(SyntaxKind::CloseBraceToken) {
                if !self.is_declaration_start() {
                    return Err(self.error_here("expected a member declaration"));
                }
                members.push(self.parse_declaration()?);
                self.expect_statement_end()?;
                self.skip_semicolons();
            }
            self.parse_expected(SyntaxKind::CloseBraceToken)?;
        }

        Ok(self.finish_node(
            NodeKind::Class(ClassData {
                name,
                name_span,
                kind,
                modifiers,
                type_params,
                has_primary_constructor,
                constructor_params,
                supertypes,
                super_call_args,
                members,
            }),
            start,
        ))
    }

    fn parse_function(&mut self, start: u32, modifiers: Modifiers) -> Result<NodeIndex, ParseError> {
        self.parse_expected(SyntaxKind::FunKeyword)?;
        let type_params = self.parse_type_parameters_opt()?;
        let receiver = self.try_parse_receiver_type()?;
        let (name, name_span) = self.parse_identifier()?;
        let params = self.parse_parameter_list(false)?;
        let return_type = if self.parse_optional(SyntaxKind::ColonToken) {
            self.parse_type()?
        } else {
            NodeIndex::NONE
        };

        let mut body = NodeIndex::NONE;
        let mut expression_body = false;
        if self.parse_optional(SyntaxKind::EqualsToken) {
            body = self.parse_expression()?;
            expression_body = true;
        } else if self.is_token_same_line(SyntaxKind::OpenBraceToken) {
            body = self.parse_block()?;
        }

        Ok(self.finish_node(
            NodeKind::Function(FunctionData {
                name,
                name_span,
                modifiers,
                type_params,
                receiver,
                params,
                return_type,
                body,
                expression_body,
            }),
            start,
        ))
    }

    /// `fun Recv.name(...)` / `fun <T> List<T>.name(...)`. Only simple
    /// (unqualified, non-null) receiver types are recognized.
    fn try_parse_receiver_type(&mut self) -> Result<NodeIndex, ParseError> {
        if !self.is_token(SyntaxKind::Identifier) {
            return Ok(NodeIndex::NONE);
        }
        let next = self.nth(1).kind;
        if !matches!(next, SyntaxKind::DotToken | SyntaxKind::LessThanToken) {
            return Ok(NodeIndex::NONE);
        }
        let checkpoint = self.checkpoint();
        let receiver = match self.parse_simple_type_reference() {
            Ok(receiver) => receiver,
            Err(_) => {
                self.rewind(checkpoint);
                return Ok(NodeIndex::NONE);
            }
        };
        if self.parse_optional(SyntaxKind::DotToken) {
            Ok(receiver)
        } else {
            self.rewind(checkpoint);
            Ok(NodeIndex::NONE)
        }
    }

    fn parse_property(&mut self, start: u32, modifiers: Modifiers) -> Result<NodeIndex, ParseError> {
        let mutable = self.is_token(SyntaxKind::VarKeyword);
        self.next_token();
        let (name, name_span) = self.parse_identifier()?;
        let type_ref = if self.parse_optional(SyntaxKind::ColonToken) {
            self.parse_type()?
        } else {
            NodeIndex::NONE
        };
        let initializer = if self.parse_optional(SyntaxKind::EqualsToken) {
            self.parse_expression()?
        } else {
            NodeIndex::NONE
        };
        Ok(self.finish_node(
            NodeKind::Property(PropertyData {
                name,
                name_span,
                modifiers,
                mutable,
                type_ref,
                initializer,
            }),
            start,
        ))
    }

    fn parse_type_alias(&mut self, start: u32, modifiers: Modifiers) -> Result<NodeIndex, ParseError> {
        self.parse_expected(SyntaxKind::TypeAliasKeyword)?;
        let (name, name_span) = self.parse_identifier()?;
        let type_params = self.parse_type_parameters_opt()?;
        self.parse_expected(SyntaxKind::EqualsToken)?;
        let aliased = self.parse_type()?;
        Ok(self.finish_node(
            NodeKind::TypeAlias(TypeAliasData {
                name,
                name_span,
                modifiers,
                type_params,
                aliased,
            }),
            start,
        ))
    }

    fn parse_type_parameters_opt(&mut self) -> Result<Vec<NodeIndex>, ParseError> {
        if !self.is_token(SyntaxKind::LessThanToken) {
            return Ok(Vec::new());
        }
        self.next_token();
        let mut params = Vec::new();
        loop {
            params.push(self.parse_type_parameter()?);
            if !self.parse_optional(SyntaxKind::CommaToken) {
                break;
            }
        }
        self.parse_expected(SyntaxKind::GreaterThanToken)?;
        Ok(params)
    }

    fn parse_type_parameter(&mut self) -> Result<NodeIndex, ParseError> {
        let start = self.token_pos();
        let variance = if self.parse_optional(SyntaxKind::InKeyword) {
            Variance::In
        } else if self.is_identifier_text("out") && self.nth(1).kind == SyntaxKind::Identifier {
            self.next_token();
            Variance::Out
        } else {
            Variance::Invariant
        };
        let (name, _) = self.parse_identifier()?;
        let bound = if self.parse_optional(SyntaxKind::ColonToken) {
            self.parse_type()?
        } else {
            NodeIndex::NONE
        };
        Ok(self.finish_node(
            NodeKind::TypeParameter(TypeParameterData {
                name,
                variance,
                bound,
            }),
            start,
        ))
    }

    /// `(a: Int, vararg b: String = "")`. Constructor lists also accept
    /// `val`/`var` prefixes that promote parameters to properties.
    fn parse_parameter_list(&mut self, constructor: bool) -> Result<Vec<NodeIndex>, ParseError> {
        self.parse_expected(SyntaxKind::OpenParenToken)?;
        let mut params = Vec::new();
        while !self.is_token(SyntaxKind::CloseParenToken) {
            params.push(self.parse_parameter(constructor)?);
            if !self.parse_optional(SyntaxKind::CommaToken) {
                break;
            }
        }
        self.parse_expected(SyntaxKind::CloseParenToken)?;
        Ok(params)
    }

    fn parse_parameter(&mut self, constructor: bool) -> Result<NodeIndex, ParseError> {
        let start = self.token_pos();
        let vararg = if self.is_identifier_text("vararg") && self.nth(1).kind == SyntaxKind::Identifier {
            self.next_token();
            true
        } else {
            false
        };
        let property = match self.token() {
            SyntaxKind::ValKeyword if constructor => {
                self.next_token();
                Some(false)
            }
            SyntaxKind::VarKeyword if constructor => {
                self.next_token();
                Some(true)
            }
            _ => None,
        };
        let (name, _) = self.parse_identifier()?;
        self.parse_expected(SyntaxKind::ColonToken)?;
        let type_ref = self.parse_type()?;
        let default = if self.parse_optional(SyntaxKind::EqualsToken) {
            self.parse_expression()?
        } else {
            NodeIndex::NONE
        };
        Ok(self.finish_node(
            NodeKind::Parameter(ParameterData {
                name,
                type_ref,
                default,
                vararg,
                property,
            }),
            start,
        ))
    }
}
