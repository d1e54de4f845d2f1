use thiserror::Error;

use crate::lexer::{LexError, Token, TokenKind};
use crate::string_storage::StringStorage;

/// What went wrong, independent of where
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    /// The lexer could not produce a token
    LexicalGap,
    /// The next token starts none of the valid alternatives
    UnexpectedToken,
    /// Input ended while a construct was still open
    UnexpectedEndOfInput,
    /// Nesting deeper than the configured maximum
    RecursionLimitExceeded,
    /// A numeric literal that does not fit its type
    InvalidLiteral,
    /// Too many AST nodes for one file
    LimitExceeded,
}

// Parse error
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Parse error at {line}:{column}: {message}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    pub line: usize,
    pub column: usize,
    pub offset: usize,
    /// Description of the offending token, when there is one
    pub found: Option<String>,
    /// Grammar symbols that would have been accepted
    pub expected: Vec<&'static str>,
}

impl ParseError {
    pub(super) fn from_token(kind: ParseErrorKind, message: String, token: &Token) -> Self {
        Self {
            kind,
            message,
            line: token.line(),
            column: token.column(),
            offset: token.span.start.offset,
            found: None,
            expected: Vec::new(),
        }
    }

    pub(super) fn unexpected_token(
        expected: &[&'static str],
        token: &Token,
        storage: &StringStorage,
    ) -> Self {
        let (kind, found) = match token.kind {
            TokenKind::Eof => (ParseErrorKind::UnexpectedEndOfInput, "end of file".to_string()),
            TokenKind::Identifier => (
                ParseErrorKind::UnexpectedToken,
                format!("identifier '{}'", token.text(storage).unwrap_or_default()),
            ),
            other => (ParseErrorKind::UnexpectedToken, other.describe().to_string()),
        };

        let wanted = match expected {
            [] => "more input".to_string(),
            [single] => single.to_string(),
            many => format!("one of {}", many.join(", ")),
        };

        let mut err = Self::from_token(kind, format!("Expected {}, found {}", wanted, found), token);
        err.found = Some(found);
        err.expected = expected.to_vec();
        err
    }
}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        Self {
            kind: ParseErrorKind::LexicalGap,
            message: err.message,
            line: err.line,
            column: err.column,
            offset: err.offset,
            found: None,
            expected: Vec::new(),
        }
    }
}
