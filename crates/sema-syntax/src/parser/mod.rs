//! Recursive-descent parser for the surface language.
//!
//! `ParserState` owns the token vector of one file and appends nodes to the
//! shared arena of the source set. Parsing methods are split by syntactic
//! category across `state_declarations`, `state_types` and
//! `state_expressions`, all as `impl ParserState` blocks.

mod state_declarations;
mod state_expressions;
mod state_types;

use crate::ast::{NodeArena, NodeIndex, NodeKind};
use crate::error::ParseError;
use crate::scanner::{ScannerState, SyntaxKind, Token, punctuation_to_text};
use sema_common::{Atom, FileId, Interner, Span};

pub(crate) struct ParserState<'a> {
    file_name: &'a str,
    text: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    prev_end: u32,
    file: FileId,
    arena: &'a mut NodeArena,
    interner: &'a mut Interner,
}

/// Snapshot used to backtrack out of a speculative parse.
#[derive(Clone, Copy)]
struct Checkpoint {
    pos: usize,
    prev_end: u32,
    arena_len: usize,
}

const MODIFIER_NAMES: &[&str] = &["open", "abstract", "override", "private", "platform"];

impl<'a> ParserState<'a> {
    pub(crate) fn new(
        file_name: &'a str,
        text: &'a str,
        file: FileId,
        arena: &'a mut NodeArena,
        interner: &'a mut Interner,
    ) -> Result<Self, ParseError> {
        let tokens = ScannerState::new(file_name, text).tokenize()?;
        Ok(ParserState {
            file_name,
            text,
            tokens,
            pos: 0,
            prev_end: 0,
            file,
            arena,
            interner,
        })
    }

    // =========================================================================
    // Token access
    // =========================================================================

    fn current(&self) -> Token {
        self.nth(0)
    }

    fn nth(&self, n: usize) -> Token {
        let last = self.tokens.len().saturating_sub(1);
        self.tokens[(self.pos + n).min(last)]
    }

    fn token(&self) -> SyntaxKind {
        self.current().kind
    }

    fn token_pos(&self) -> u32 {
        self.current().span.start
    }

    fn is_token(&self, kind: SyntaxKind) -> bool {
        self.token() == kind
    }

    /// Current token is `kind` and sits on the same line as the previous one.
    fn is_token_same_line(&self, kind: SyntaxKind) -> bool {
        self.is_token(kind) && !self.current().newline_before
    }

    fn token_text(&self, token: Token) -> &'a str {
        &self.text[token.span.start as usize..token.span.end as usize]
    }

    fn is_identifier_text(&self, text: &str) -> bool {
        self.is_token(SyntaxKind::Identifier) && self.token_text(self.current()) == text
    }

    fn next_token(&mut self) -> Token {
        let token = self.current();
        if token.kind != SyntaxKind::EndOfFileToken {
            self.pos += 1;
            self.prev_end = token.span.end;
        }
        token
    }

    fn parse_optional(&mut self, kind: SyntaxKind) -> bool {
        if self.is_token(kind) {
            self.next_token();
            true
        } else {
            false
        }
    }

    fn parse_expected(&mut self, kind: SyntaxKind) -> Result<Token, ParseError> {
        if self.is_token(kind) {
            return Ok(self.next_token());
        }
        let expected = punctuation_to_text(kind)
            .map(|t| format!("'{t}'"))
            .unwrap_or_else(|| format!("{kind:?}"));
        Err(self.error_here(format!("expected {expected}")))
    }

    fn parse_identifier(&mut self) -> Result<(Atom, Span), ParseError> {
        if !self.is_token(SyntaxKind::Identifier) {
            return Err(self.error_here("expected identifier"));
        }
        let token = self.next_token();
        let text = self.token_text(token);
        Ok((self.interner.intern(text), token.span))
    }

    /// `a.b.c`; stops before `.*`.
    fn parse_qualified_name(&mut self) -> Result<Vec<Atom>, ParseError> {
        let mut path = vec![self.parse_identifier()?.0];
        while self.is_token(SyntaxKind::DotToken) && self.nth(1).kind == SyntaxKind::Identifier {
            self.next_token();
            path.push(self.parse_identifier()?.0);
        }
        Ok(path)
    }

    fn skip_semicolons(&mut self) {
        while self.parse_optional(SyntaxKind::SemicolonToken) {}
    }

    /// A statement or declaration must end at `;`, a line break, `}` or EOF.
    fn expect_statement_end(&mut self) -> Result<(), ParseError> {
        let token = self.current();
        match token.kind {
            SyntaxKind::SemicolonToken => {
                self.next_token();
                Ok(())
            }
            SyntaxKind::CloseBraceToken | SyntaxKind::EndOfFileToken => Ok(()),
            _ if token.newline_before => Ok(()),
            _ => Err(self.error_here("expected ';' or a line break")),
        }
    }

    fn error_here(&self, message: impl Into<String>) -> ParseError {
        let token = self.current();
        let message = if token.kind == SyntaxKind::EndOfFileToken {
            format!("{} (found end of file)", message.into())
        } else {
            format!("{} (found '{}')", message.into(), self.token_text(token))
        };
        ParseError::at(self.file_name, self.text, token.span.start, message)
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            pos: self.pos,
            prev_end: self.prev_end,
            arena_len: self.arena.len(),
        }
    }

    fn rewind(&mut self, checkpoint: Checkpoint) {
        self.pos = checkpoint.pos;
        self.prev_end = checkpoint.prev_end;
        self.arena.truncate(checkpoint.arena_len);
    }

    // =========================================================================
    // Node construction
    // =========================================================================

    /// Allocate a node spanning from `start` to the end of the last consumed
    /// token and adopt its children.
    fn finish_node(&mut self, kind: NodeKind, start: u32) -> NodeIndex {
        let end = self.prev_end.max(start);
        self.alloc_node(kind, Span::new(start, end))
    }

    fn alloc_node(&mut self, kind: NodeKind, span: Span) -> NodeIndex {
        let idx = self.arena.alloc(kind, span, self.file);
        for child in self.arena.children(idx) {
            self.arena.set_parent(child, idx);
        }
        idx
    }

    fn is_modifier(&self) -> bool {
        if !self.is_token(SyntaxKind::Identifier) {
            return false;
        }
        if !MODIFIER_NAMES.contains(&self.token_text(self.current())) {
            return false;
        }
        let next = self.nth(1);
        matches!(
            next.kind,
            SyntaxKind::ClassKeyword
                | SyntaxKind::InterfaceKeyword
                | SyntaxKind::FunKeyword
                | SyntaxKind::ValKeyword
                | SyntaxKind::VarKeyword
                | SyntaxKind::TypeAliasKeyword
        ) || (next.kind == SyntaxKind::Identifier
            && MODIFIER_NAMES.contains(&self.token_text(next)))
    }

    fn is_declaration_start(&self) -> bool {
        self.is_modifier()
            || matches!(
                self.token(),
                SyntaxKind::ClassKeyword
                    | SyntaxKind::InterfaceKeyword
                    | SyntaxKind::FunKeyword
                    | SyntaxKind::ValKeyword
                    | SyntaxKind::VarKeyword
                    | SyntaxKind::TypeAliasKeyword
            )
    }
}

#[cfg(test)]
#[path = "../../tests/parser_tests.rs"]
mod parser_tests;
