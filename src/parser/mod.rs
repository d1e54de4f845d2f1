// Recursive-descent parser for Golo source files, split by grammar area
mod case;
mod collections;
mod error;
mod expressions;
mod helpers;
mod module;
mod statements;

// Public exports
pub use error::{ParseError, ParseErrorKind};

use log::debug;

use crate::ast::Ast;
use crate::lexer::{self, Token, TokenKind, Tokens};
use crate::limits::ParseLimits;
use crate::span::{Position, Span};

// Parser structure
pub struct Parser<'a> {
    tokens: Vec<Token>,
    current: usize,
    ast: Ast,
    limits: &'a ParseLimits,
    // End of the last consumed token, newlines excluded
    last_end: Position,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: Tokens, limits: &'a ParseLimits) -> Self {
        let Tokens {
            mut list,
            string_storage,
        } = tokens;

        // Lookahead relies on a trailing Eof token
        if list.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let end = list.last().map_or(Position::START, |t| t.span.end);
            list.push(Token {
                kind: TokenKind::Eof,
                span: Span::empty(end),
                string_id: None,
            });
        }

        Self {
            tokens: list,
            current: 0,
            ast: Ast::new(string_storage, Span::empty(Position::START)),
            limits,
            last_end: Position::START,
        }
    }

    /// Main parsing entry point: the whole token stream as one compilation unit.
    ///
    /// The tree is only handed out when every rule succeeded.
    pub fn parse_compilation_unit(mut self) -> Result<Ast, ParseError> {
        debug!("parsing {} tokens", self.tokens.len());

        self.parse_unit(0)?;

        let end = self.current_token().span.end;
        let root = self.ast.root();
        self.ast.set_span(root, Span::new(Position::START, end));

        debug!("built {} AST nodes", self.ast.len());
        Ok(self.ast)
    }
}

// Public API

/// Parse an already lexed token stream
pub fn parse(tokens: Tokens, limits: &ParseLimits) -> Result<Ast, ParseError> {
    Parser::new(tokens, limits).parse_compilation_unit()
}

/// Lex and parse `source` with default limits
pub fn parse_source(source: &str) -> Result<Ast, ParseError> {
    parse_source_with_limits(source, &ParseLimits::default())
}

pub fn parse_source_with_limits(source: &str, limits: &ParseLimits) -> Result<Ast, ParseError> {
    let tokens = lexer::lex(source, limits)?;
    parse(tokens, limits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NodeKind;

    #[test]
    fn test_minimal_unit() {
        let ast = parse_source("module hello").unwrap();
        let root = ast.root();

        assert_eq!(*ast.kind(root), NodeKind::CompilationUnit);
        let children: Vec<_> = ast.children(root).collect();
        assert_eq!(children.len(), 1);
        assert_eq!(ast.text(children[0]), Some("hello"));

        // The single declaration covers the whole file
        assert_eq!(ast.span(children[0]), ast.span(root));
        assert_eq!(ast.span(root).end.offset, "module hello".len());
    }

    #[test]
    fn test_lex_error_is_lexical_gap() {
        let err = parse_source("module hello\nfunction main = { let s = \"open }\n").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::LexicalGap);
        assert_eq!(err.line, 2);
    }

    #[test]
    fn test_missing_module_declaration() {
        let err = parse_source("function main = {}\n").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnexpectedToken);
        assert_eq!(err.expected, vec!["'module'"]);
        assert_eq!(err.found.as_deref(), Some("'function'"));
        assert_eq!((err.line, err.column), (1, 1));
    }

    #[test]
    fn test_empty_input() {
        let err = parse_source("").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnexpectedEndOfInput);
    }

    #[test]
    fn test_node_limit() {
        let mut limits = ParseLimits::default();
        limits.max_ast_nodes = 3;
        let err =
            parse_source_with_limits("module m\nimport a\nimport b\nimport c\n", &limits).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::LimitExceeded);
    }

    #[test]
    fn test_display_is_one_line() {
        let err = parse_source("module hello\nfunction main = {\n").unwrap_err();
        let rendered = err.to_string();
        assert!(rendered.starts_with("Parse error at 3:1: Expected"));
        assert!(!rendered.contains('\n'));
    }
}
