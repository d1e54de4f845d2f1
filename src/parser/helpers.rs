use super::error::{ParseError, ParseErrorKind};
use crate::ast::{BinaryOp, NodeId, NodeKind};
use crate::lexer::{Token, TokenKind};
use crate::span::{Position, Span};
use crate::string_storage::StringId;

// Binary operator precedence levels, loosest first
pub(super) fn binary_operator(token_kind: TokenKind) -> Option<(BinaryOp, u8)> {
    let op = match token_kind {
        TokenKind::OrIfNull => (BinaryOp::OrIfNull, 1),
        TokenKind::Or => (BinaryOp::Or, 2),
        TokenKind::And => (BinaryOp::And, 3),
        TokenKind::EqEq => (BinaryOp::Equals, 4),
        TokenKind::NotEq => (BinaryOp::NotEquals, 4),
        TokenKind::Is => (BinaryOp::Is, 4),
        TokenKind::Isnt => (BinaryOp::IsNot, 4),
        TokenKind::Oftype => (BinaryOp::OfType, 4),
        TokenKind::Lt => (BinaryOp::Less, 5),
        TokenKind::Le => (BinaryOp::LessOrEquals, 5),
        TokenKind::Gt => (BinaryOp::More, 5),
        TokenKind::Ge => (BinaryOp::MoreOrEquals, 5),
        TokenKind::Plus => (BinaryOp::Plus, 6),
        TokenKind::Minus => (BinaryOp::Minus, 6),
        TokenKind::Star => (BinaryOp::Times, 7),
        TokenKind::Slash => (BinaryOp::Divide, 7),
        TokenKind::Percent => (BinaryOp::Modulo, 7),
        _ => return None,
    };
    Some(op)
}

// Unary operators bind tighter than every binary operator
pub(super) const UNARY_PRECEDENCE: u8 = 8;

// Token source and node building helpers
impl super::Parser<'_> {
    pub(super) fn new_unexpected_token(&self, expected: &[&'static str]) -> ParseError {
        ParseError::unexpected_token(expected, self.current_token(), self.ast.strings())
    }

    // Check recursion depth limit
    pub(super) fn check_depth(&self, depth: usize) -> Result<(), ParseError> {
        if depth >= self.limits.max_nesting_depth {
            return Err(ParseError::from_token(
                ParseErrorKind::RecursionLimitExceeded,
                format!(
                    "Nesting too deep: {} levels (max {})",
                    depth, self.limits.max_nesting_depth
                ),
                self.current_token(),
            ));
        }
        Ok(())
    }

    /// Fail fast when a loop iteration consumed nothing
    pub(super) fn check_progress(&self, before: usize) -> Result<(), ParseError> {
        if self.current == before {
            return Err(ParseError::from_token(
                ParseErrorKind::UnexpectedToken,
                format!(
                    "Parser made no progress at {}",
                    self.current_token().kind.describe()
                ),
                self.current_token(),
            ));
        }
        Ok(())
    }

    /// Consume a specific token kind or error
    pub(super) fn consume(
        &mut self,
        kind: TokenKind,
        expected: &'static str,
    ) -> Result<Token, ParseError> {
        if self.peek_kind() != kind {
            return Err(self.new_unexpected_token(&[expected]));
        }
        Ok(self.advance())
    }

    /// Consume an identifier and return its interned name
    pub(super) fn consume_identifier(
        &mut self,
        expected: &'static str,
    ) -> Result<StringId, ParseError> {
        let token = self.consume(TokenKind::Identifier, expected)?;
        match token.string_id {
            Some(id) => Ok(id),
            None => Err(ParseError::unexpected_token(&[expected], &token, self.ast.strings())),
        }
    }

    /// Consume and return the next token
    pub(super) fn advance(&mut self) -> Token {
        let token = *self.current_token();
        if self.current < self.tokens.len() {
            self.current += 1;
        }
        if token.kind != TokenKind::Newline && token.kind != TokenKind::Eof {
            self.last_end = token.span.end;
        }
        token
    }

    /// Look at the k-th unconsumed token (0 is the current one)
    pub(super) fn peek(&self, k: usize) -> &Token {
        let index = (self.current + k).min(self.tokens.len() - 1);
        &self.tokens[index]
    }

    pub(crate) fn peek_kind(&self) -> TokenKind {
        self.peek(0).kind
    }

    pub(crate) fn peek_next_kind(&self, n: usize) -> TokenKind {
        self.peek(n).kind
    }

    pub(crate) fn peek_kind_is(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    pub(super) fn at_end(&self) -> bool {
        self.peek_kind_is(TokenKind::Eof)
    }

    pub(super) fn current_token(&self) -> &Token {
        self.peek(0)
    }

    // Skip consecutive newlines
    pub(super) fn skip_newlines(&mut self) {
        while self.peek_kind_is(TokenKind::Newline) {
            self.advance();
        }
    }

    /// After a statement or declaration: a newline, or a closing brace / end of
    /// file that the enclosing rule consumes
    pub(super) fn expect_terminator(&mut self, allow_rbrace: bool) -> Result<(), ParseError> {
        match self.peek_kind() {
            TokenKind::Newline => {
                self.skip_newlines();
                Ok(())
            }
            TokenKind::Eof => Ok(()),
            TokenKind::RBrace if allow_rbrace => Ok(()),
            _ if allow_rbrace => Err(self.new_unexpected_token(&["newline", "'}'"])),
            _ => Err(self.new_unexpected_token(&["newline", "end of file"])),
        }
    }

    // Node construction

    /// Start position of the next token
    pub(super) fn start(&self) -> Position {
        self.current_token().span.start
    }

    /// Allocate a node; its span is fixed later by `finish`
    pub(super) fn open_node(&mut self, kind: NodeKind, start: Position) -> Result<NodeId, ParseError> {
        if self.ast.len() >= self.limits.max_ast_nodes {
            return Err(ParseError::from_token(
                ParseErrorKind::LimitExceeded,
                format!(
                    "AST node limit exceeded: {} nodes (max {})",
                    self.ast.len(),
                    self.limits.max_ast_nodes
                ),
                self.current_token(),
            ));
        }
        Ok(self.ast.add_node(kind, Span::empty(start)))
    }

    /// Close a node: its span runs from `start` to the last consumed token
    pub(super) fn finish(&mut self, id: NodeId, start: Position) -> NodeId {
        self.ast.set_span(id, Span::new(start, self.last_end));
        id
    }

    /// A node made of exactly one already consumed token
    pub(super) fn leaf(&mut self, kind: NodeKind, token: &Token) -> Result<NodeId, ParseError> {
        let id = self.open_node(kind, token.span.start)?;
        self.ast.set_span(id, token.span);
        Ok(id)
    }

    pub(super) fn attach(&mut self, parent: NodeId, child: NodeId) {
        self.ast.add_child(parent, child);
    }

    /// `IDENT ('.' IDENT)*`, interned as one dotted name
    pub(super) fn parse_qualified_name(&mut self, expected: &'static str) -> Result<StringId, ParseError> {
        let first = self.consume_identifier(expected)?;
        if self.peek_kind() != TokenKind::Dot {
            return Ok(first);
        }

        let mut name = self.ast.resolve(first).to_string();
        while self.peek_kind() == TokenKind::Dot && self.peek_next_kind(1) == TokenKind::Identifier {
            self.advance(); // '.'
            let segment = self.consume_identifier("identifier")?;
            name.push('.');
            name.push_str(self.ast.resolve(segment));
        }

        Ok(self.ast.intern(&name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence_levels() {
        let level = |kind| binary_operator(kind).map(|(_, p)| p);

        assert!(level(TokenKind::OrIfNull) < level(TokenKind::Or));
        assert!(level(TokenKind::Or) < level(TokenKind::And));
        assert!(level(TokenKind::And) < level(TokenKind::EqEq));
        assert_eq!(level(TokenKind::EqEq), level(TokenKind::Oftype));
        assert!(level(TokenKind::Lt) < level(TokenKind::Plus));
        assert!(level(TokenKind::Plus) < level(TokenKind::Star));
        assert!(level(TokenKind::Percent) < Some(UNARY_PRECEDENCE));
        assert_eq!(level(TokenKind::Not), None);
        assert_eq!(level(TokenKind::Identifier), None);
    }
}
