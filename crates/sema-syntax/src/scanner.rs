//! Tokenizer for the surface language.
//!
//! The scanner turns a file into a flat token vector up front. The parser
//! backtracks by saving and restoring its index into that vector, which is
//! simpler than re-scanning and cheap for the file sizes this layer sees.

use crate::error::ParseError;
use sema_common::Span;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SyntaxKind {
    Unknown,
    EndOfFileToken,
    Identifier,
    IntLiteral,
    LongLiteral,
    DoubleLiteral,
    StringLiteral,
    // Punctuation
    OpenParenToken,
    CloseParenToken,
    OpenBraceToken,
    CloseBraceToken,
    LessThanToken,
    GreaterThanToken,
    LessThanEqualsToken,
    GreaterThanEqualsToken,
    EqualsToken,
    EqualsEqualsToken,
    ExclamationEqualsToken,
    ExclamationToken,
    PlusToken,
    MinusToken,
    AsteriskToken,
    SlashToken,
    PercentToken,
    AmpersandAmpersandToken,
    BarBarToken,
    DotToken,
    QuestionDotToken,
    QuestionColonToken,
    QuestionToken,
    ColonToken,
    CommaToken,
    SemicolonToken,
    ArrowToken,
    // Keywords
    PackageKeyword,
    ImportKeyword,
    ClassKeyword,
    InterfaceKeyword,
    FunKeyword,
    ValKeyword,
    VarKeyword,
    TypeAliasKeyword,
    IfKeyword,
    ElseKeyword,
    WhileKeyword,
    ForKeyword,
    InKeyword,
    IsKeyword,
    AsKeyword,
    ReturnKeyword,
    ThisKeyword,
    NullKeyword,
    TrueKeyword,
    FalseKeyword,
}

pub fn text_to_keyword(text: &str) -> Option<SyntaxKind> {
    Some(match text {
        "package" => SyntaxKind::PackageKeyword,
        "import" => SyntaxKind::ImportKeyword,
        "class" => SyntaxKind::ClassKeyword,
        "interface" => SyntaxKind::InterfaceKeyword,
        "fun" => SyntaxKind::FunKeyword,
        "val" => SyntaxKind::ValKeyword,
        "var" => SyntaxKind::VarKeyword,
        "typealias" => SyntaxKind::TypeAliasKeyword,
        "if" => SyntaxKind::IfKeyword,
        "else" => SyntaxKind::ElseKeyword,
        "while" => SyntaxKind::WhileKeyword,
        "for" => SyntaxKind::ForKeyword,
        "in" => SyntaxKind::InKeyword,
        "is" => SyntaxKind::IsKeyword,
        "as" => SyntaxKind::AsKeyword,
        "return" => SyntaxKind::ReturnKeyword,
        "this" => SyntaxKind::ThisKeyword,
        "null" => SyntaxKind::NullKeyword,
        "true" => SyntaxKind::TrueKeyword,
        "false" => SyntaxKind::FalseKeyword,
        _ => return None,
    })
}

pub fn token_is_keyword(kind: SyntaxKind) -> bool {
    (kind as u16) >= (SyntaxKind::PackageKeyword as u16)
}

pub fn punctuation_to_text(kind: SyntaxKind) -> Option<&'static str> {
    Some(match kind {
        SyntaxKind::OpenParenToken => "(",
        SyntaxKind::CloseParenToken => ")",
        SyntaxKind::OpenBraceToken => "{",
        SyntaxKind::CloseBraceToken => "}",
        SyntaxKind::LessThanToken => "<",
        SyntaxKind::GreaterThanToken => ">",
        SyntaxKind::LessThanEqualsToken => "<=",
        SyntaxKind::GreaterThanEqualsToken => ">=",
        SyntaxKind::EqualsToken => "=",
        SyntaxKind::EqualsEqualsToken => "==",
        SyntaxKind::ExclamationEqualsToken => "!=",
        SyntaxKind::ExclamationToken => "!",
        SyntaxKind::PlusToken => "+",
        SyntaxKind::MinusToken => "-",
        SyntaxKind::AsteriskToken => "*",
        SyntaxKind::SlashToken => "/",
        SyntaxKind::PercentToken => "%",
        SyntaxKind::AmpersandAmpersandToken => "&&",
        SyntaxKind::BarBarToken => "||",
        SyntaxKind::DotToken => ".",
        SyntaxKind::QuestionDotToken => "?.",
        SyntaxKind::QuestionColonToken => "?:",
        SyntaxKind::QuestionToken => "?",
        SyntaxKind::ColonToken => ":",
        SyntaxKind::CommaToken => ",",
        SyntaxKind::SemicolonToken => ";",
        SyntaxKind::ArrowToken => "->",
        _ => return None,
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: SyntaxKind,
    pub span: Span,
    /// A line break separates this token from the previous one.
    pub newline_before: bool,
}

pub struct ScannerState<'a> {
    file_name: &'a str,
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ScannerState<'a> {
    pub fn new(file_name: &'a str, text: &'a str) -> Self {
        ScannerState {
            file_name,
            text,
            bytes: text.as_bytes(),
            pos: 0,
        }
    }

    /// Scan the whole file. The last token is always `EndOfFileToken`.
    pub fn tokenize(mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::with_capacity(self.text.len() / 3 + 1);
        loop {
            let newline_before = self.skip_trivia()?;
            let start = self.pos;
            let kind = self.scan_token()?;
            tokens.push(Token {
                kind,
                span: Span::new(start as u32, self.pos as u32),
                newline_before,
            });
            if kind == SyntaxKind::EndOfFileToken {
                return Ok(tokens);
            }
        }
    }

    fn peek(&self, ahead: usize) -> u8 {
        self.bytes.get(self.pos + ahead).copied().unwrap_or(0)
    }

    fn error(&self, offset: usize, message: impl Into<String>) -> ParseError {
        ParseError::at(self.file_name, self.text, offset as u32, message)
    }

    /// Skip whitespace and comments; report whether a newline was crossed.
    fn skip_trivia(&mut self) -> Result<bool, ParseError> {
        let mut newline = false;
        loop {
            match self.peek(0) {
                b'\n' => {
                    newline = true;
                    self.pos += 1;
                }
                b' ' | b'\t' | b'\r' => self.pos += 1,
                b'/' if self.peek(1) == b'/' => {
                    match memchr::memchr(b'\n', &self.bytes[self.pos..]) {
                        Some(offset) => self.pos += offset,
                        None => self.pos = self.bytes.len(),
                    }
                }
                b'/' if self.peek(1) == b'*' => {
                    let start = self.pos;
                    self.pos += 2;
                    loop {
                        if self.pos >= self.bytes.len() {
                            return Err(self.error(start, "unterminated block comment"));
                        }
                        if self.peek(0) == b'*' && self.peek(1) == b'/' {
                            self.pos += 2;
                            break;
                        }
                        if self.peek(0) == b'\n' {
                            newline = true;
                        }
                        self.pos += 1;
                    }
                }
                _ => return Ok(newline),
            }
        }
    }

    fn scan_token(&mut self) -> Result<SyntaxKind, ParseError> {
        let start = self.pos;
        let ch = self.peek(0);
        if self.pos >= self.bytes.len() {
            return Ok(SyntaxKind::EndOfFileToken);
        }
        if ch.is_ascii_alphabetic() || ch == b'_' {
            while self.peek(0).is_ascii_alphanumeric() || self.peek(0) == b'_' {
                self.pos += 1;
            }
            let text = &self.text[start..self.pos];
            return Ok(text_to_keyword(text).unwrap_or(SyntaxKind::Identifier));
        }
        if ch.is_ascii_digit() {
            return Ok(self.scan_number());
        }
        if ch == b'"' {
            return self.scan_string();
        }

        let (kind, len) = match (ch, self.peek(1)) {
            (b'(', _) => (SyntaxKind::OpenParenToken, 1),
            (b')', _) => (SyntaxKind::CloseParenToken, 1),
            (b'{', _) => (SyntaxKind::OpenBraceToken, 1),
            (b'}', _) => (SyntaxKind::CloseBraceToken, 1),
            (b'<', b'=') => (SyntaxKind::LessThanEqualsToken, 2),
            (b'<', _) => (SyntaxKind::LessThanToken, 1),
            (b'>', b'=') => (SyntaxKind::GreaterThanEqualsToken, 2),
            (b'>', _) => (SyntaxKind::GreaterThanToken, 1),
            (b'=', b'=') => (SyntaxKind::EqualsEqualsToken, 2),
            (b'=', _) => (SyntaxKind::EqualsToken, 1),
            (b'!', b'=') => (SyntaxKind::ExclamationEqualsToken, 2),
            (b'!', _) => (SyntaxKind::ExclamationToken, 1),
            (b'+', _) => (SyntaxKind::PlusToken, 1),
            (b'-', b'>') => (SyntaxKind::ArrowToken, 2),
            (b'-', _) => (SyntaxKind::MinusToken, 1),
            (b'*', _) => (SyntaxKind::AsteriskToken, 1),
            (b'/', _) => (SyntaxKind::SlashToken, 1),
            (b'%', _) => (SyntaxKind::PercentToken, 1),
            (b'&', b'&') => (SyntaxKind::AmpersandAmpersandToken, 2),
            (b'|', b'|') => (SyntaxKind::BarBarToken, 2),
            (b'.', _) => (SyntaxKind::DotToken, 1),
            (b'?', b'.') => (SyntaxKind::QuestionDotToken, 2),
            (b'?', b':') => (SyntaxKind::QuestionColonToken, 2),
            (b'?', _) => (SyntaxKind::QuestionToken, 1),
            (b':', _) => (SyntaxKind::ColonToken, 1),
            (b',', _) => (SyntaxKind::CommaToken, 1),
            (b';', _) => (SyntaxKind::SemicolonToken, 1),
            _ => {
                let found = self.text[start..].chars().next().unwrap_or('?');
                return Err(self.error(start, format!("unexpected character '{found}'")));
            }
        };
        self.pos += len;
        Ok(kind)
    }

    fn scan_number(&mut self) -> SyntaxKind {
        while self.peek(0).is_ascii_digit() || self.peek(0) == b'_' {
            self.pos += 1;
        }
        if self.peek(0) == b'.' && self.peek(1).is_ascii_digit() {
            self.pos += 1;
            while self.peek(0).is_ascii_digit() {
                self.pos += 1;
            }
            return SyntaxKind::DoubleLiteral;
        }
        if self.peek(0) == b'L' {
            self.pos += 1;
            return SyntaxKind::LongLiteral;
        }
        SyntaxKind::IntLiteral
    }

    fn scan_string(&mut self) -> Result<SyntaxKind, ParseError> {
        let start = self.pos;
        self.pos += 1;
        loop {
            match self.peek(0) {
                b'"' => {
                    self.pos += 1;
                    return Ok(SyntaxKind::StringLiteral);
                }
                b'\\' => self.pos += 2,
                b'\n' | 0 if self.pos >= self.bytes.len() || self.peek(0) == b'\n' => {
                    return Err(self.error(start, "unterminated string literal"));
                }
                _ => self.pos += 1,
            }
        }
    }
}

/// Decode the body of a string literal token (quotes included).
pub fn unescape_string(raw: &str) -> String {
    let inner = raw
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(raw);
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

#[cfg(test)]
#[path = "../tests/scanner_tests.rs"]
mod scanner_tests;
