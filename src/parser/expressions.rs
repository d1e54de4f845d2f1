use super::error::ParseErrorKind;
use super::helpers::{UNARY_PRECEDENCE, binary_operator};
use super::{ParseError, Parser};
use crate::ast::{CollectionKind, Literal, NodeId, NodeKind, UnaryOp};
use crate::lexer::{NumberKind, Token, TokenKind};
use crate::span::Position;
use crate::string_storage::StringId;

// Expression parsing methods
impl Parser<'_> {
    /// Parse expression with precedence climbing
    pub(super) fn parse_expression(
        &mut self,
        depth: usize,
        min_precedence: u8,
    ) -> Result<NodeId, ParseError> {
        self.check_depth(depth)?;
        let start = self.start();

        let mut left = self.parse_unary(depth + 1)?;

        while let Some((op, precedence)) = binary_operator(self.peek_kind()) {
            if precedence < min_precedence {
                break;
            }
            self.advance(); // operator
            self.skip_newlines();

            // Left associative: the right side only takes tighter operators
            let right = self.parse_expression(depth + 1, precedence + 1)?;

            let binary_idx = self.open_node(NodeKind::Binary(op), start)?;
            self.attach(binary_idx, left);
            self.attach(binary_idx, right);
            left = self.finish(binary_idx, start);
        }

        Ok(left)
    }

    /// Parse unary expression: not x, -x
    fn parse_unary(&mut self, depth: usize) -> Result<NodeId, ParseError> {
        self.check_depth(depth)?;
        let start = self.start();

        let op = match self.peek_kind() {
            TokenKind::Not => UnaryOp::Not,
            TokenKind::Minus => UnaryOp::Minus,
            _ => return self.parse_postfix(depth + 1),
        };
        self.advance();

        let unary_idx = self.open_node(NodeKind::Unary(op), start)?;
        let operand_idx = self.parse_expression(depth + 1, UNARY_PRECEDENCE)?;
        self.attach(unary_idx, operand_idx);

        Ok(self.finish(unary_idx, start))
    }

    /// Parse a primary followed by method invocations and anonymous calls:
    /// receiver: method(args)  /  callee(args)(args)
    fn parse_postfix(&mut self, depth: usize) -> Result<NodeId, ParseError> {
        self.check_depth(depth)?;
        let start = self.start();

        let mut expr = self.parse_primary(depth + 1)?;

        loop {
            match self.peek_kind() {
                TokenKind::Colon => {
                    self.advance();
                    let name = self.consume_identifier("method name")?;
                    let call_idx = self.open_node(NodeKind::MethodInvocation { name }, start)?;
                    self.attach(call_idx, expr);
                    self.parse_arguments(depth + 1, call_idx)?;
                    expr = self.finish(call_idx, start);
                }
                TokenKind::LParen => {
                    let call_idx = self.open_node(NodeKind::AnonymousCall, start)?;
                    self.attach(call_idx, expr);
                    self.parse_arguments(depth + 1, call_idx)?;
                    expr = self.finish(call_idx, start);
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    /// Parse call arguments: (a, b, c), attached to `call_idx`
    fn parse_arguments(&mut self, depth: usize, call_idx: NodeId) -> Result<(), ParseError> {
        self.check_depth(depth)?;
        self.consume(TokenKind::LParen, "'('")?;
        self.skip_newlines();

        if self.peek_kind_is(TokenKind::RParen) {
            self.advance();
            return Ok(());
        }

        loop {
            let arg_idx = self.parse_expression(depth + 1, 0)?;
            self.attach(call_idx, arg_idx);
            self.skip_newlines();

            match self.peek_kind() {
                TokenKind::Comma => {
                    self.advance();
                    self.skip_newlines();
                }
                TokenKind::RParen => {
                    self.advance();
                    return Ok(());
                }
                _ => return Err(self.new_unexpected_token(&["','", "')'"])),
            }
        }
    }

    /// Parse primary expression
    fn parse_primary(&mut self, depth: usize) -> Result<NodeId, ParseError> {
        self.check_depth(depth)?;
        let start = self.start();
        let token = *self.current_token();

        match token.kind {
            TokenKind::Number(kind) => {
                self.advance();
                let literal = self.number_literal(kind, &token)?;
                self.leaf(NodeKind::Literal(literal), &token)
            }
            TokenKind::String(_) => {
                self.advance();
                let id = self.text_id(&token)?;
                self.leaf(NodeKind::Literal(Literal::String(id)), &token)
            }
            TokenKind::Char => {
                self.advance();
                let id = self.text_id(&token)?;
                let value = self.ast.resolve(id).chars().next().unwrap_or_default();
                self.leaf(NodeKind::Literal(Literal::Char(value)), &token)
            }
            TokenKind::Null => {
                self.advance();
                self.leaf(NodeKind::Literal(Literal::Null), &token)
            }
            TokenKind::True | TokenKind::False => {
                self.advance();
                let value = token.kind == TokenKind::True;
                self.leaf(NodeKind::Literal(Literal::Boolean(value)), &token)
            }

            // Grouping: the parentheses add no node
            TokenKind::LParen => {
                self.advance();
                self.skip_newlines();
                let inner = self.parse_expression(depth + 1, 0)?;
                self.skip_newlines();
                self.consume(TokenKind::RParen, "')'")?;
                Ok(inner)
            }

            // Closures: |x| -> x + 1, -> 42
            TokenKind::Pipe | TokenKind::Arrow => self.parse_function(depth + 1),

            TokenKind::Caret => {
                self.advance();
                let name = self.parse_qualified_name("function name")?;
                let ref_idx = self.open_node(NodeKind::FunctionRef { name }, start)?;
                Ok(self.finish(ref_idx, start))
            }

            TokenKind::Match => self.parse_match(depth + 1),

            TokenKind::LBracket => self.parse_collection(depth + 1, CollectionKind::Tuple, start),

            TokenKind::Identifier => {
                let prefix = token
                    .text(self.ast.strings())
                    .and_then(CollectionKind::from_prefix);
                match prefix {
                    Some(kind) if self.peek_next_kind(1) == TokenKind::LBracket => {
                        self.advance(); // prefix
                        self.parse_collection(depth + 1, kind, start)
                    }
                    _ => self.parse_named(depth + 1, start),
                }
            }

            _ => Err(self.new_unexpected_token(&["expression"])),
        }
    }

    /// Names in expression position: invocation, class literal or reference
    fn parse_named(&mut self, depth: usize, start: Position) -> Result<NodeId, ParseError> {
        self.check_depth(depth)?;
        let name = self.parse_qualified_name("identifier")?;

        if self.peek_kind_is(TokenKind::LParen) {
            let call_idx = self.open_node(NodeKind::FunctionInvocation { name }, start)?;
            self.parse_arguments(depth + 1, call_idx)?;
            return Ok(self.finish(call_idx, start));
        }

        let text = self.ast.resolve(name);
        if let Some(class_name) = text.strip_suffix(".class") {
            let class_name = class_name.to_string();
            let name = self.ast.intern(&class_name);
            let class_idx = self.open_node(NodeKind::ClassLiteral { name }, start)?;
            return Ok(self.finish(class_idx, start));
        }

        // A dotted name on its own must be called
        if text.contains('.') {
            return Err(self.new_unexpected_token(&["'('"]));
        }

        let ref_idx = self.open_node(NodeKind::Reference { name }, start)?;
        Ok(self.finish(ref_idx, start))
    }

    fn text_id(&self, token: &Token) -> Result<StringId, ParseError> {
        token.string_id.ok_or_else(|| {
            ParseError::from_token(
                ParseErrorKind::InvalidLiteral,
                format!("Literal {} without text", token.kind.describe()),
                token,
            )
        })
    }

    /// Convert numeric literal text (`1_000`, `3_L`, `1.5_F`) to its value
    fn number_literal(&self, kind: NumberKind, token: &Token) -> Result<Literal, ParseError> {
        let id = self.text_id(token)?;
        let text = self.ast.resolve(id);
        let digits: String = text
            .trim_end_matches(['L', 'F'])
            .chars()
            .filter(|c| *c != '_')
            .collect();

        let literal = match kind {
            NumberKind::Integer => digits.parse().ok().map(Literal::Integer),
            NumberKind::Long => digits.parse().ok().map(Literal::Long),
            NumberKind::Float => digits.parse().ok().map(Literal::Float),
            NumberKind::Double => digits.parse().ok().map(Literal::Double),
        };

        literal.ok_or_else(|| {
            let type_name = match kind {
                NumberKind::Integer => "integer",
                NumberKind::Long => "long",
                NumberKind::Float => "float",
                NumberKind::Double => "double",
            };
            ParseError::from_token(
                ParseErrorKind::InvalidLiteral,
                format!("Invalid {} literal '{}'", type_name, text),
                token,
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::*;

    // Dump of the compact body of `function f = -> <expression>`, unindented
    fn expr(source: &str) -> Result<String, ParseError> {
        let ast = parse_source(&format!("module m\nfunction f = -> {}\n", source))?;
        let dump = ast.to_string();
        let lines: Vec<&str> = dump
            .lines()
            .skip(4)
            .map(|line| line.strip_prefix("      ").unwrap_or(line))
            .collect();
        Ok(lines.join("\n") + "\n")
    }

    #[test]
    fn test_precedence() {
        let expected = "\
Binary +
  Literal 1
  Binary *
    Literal 2
    Literal 3
";
        assert_eq!(expr("1 + 2 * 3").unwrap(), expected);
    }

    #[test]
    fn test_left_associativity() {
        let expected = "\
Binary -
  Binary -
    Literal 10
    Literal 4
  Literal 3
";
        assert_eq!(expr("10 - 4 - 3").unwrap(), expected);
    }

    #[test]
    fn test_logical_operators() {
        let expected = "\
Binary orIfNull
  Reference 'a'
  Binary or
    Binary and
      Reference 'b'
      Binary ==
        Reference 'c'
        Literal 1
    Unary not
      Reference 'd'
";
        assert_eq!(expr("a orIfNull b and c == 1 or not d").unwrap(), expected);
    }

    #[test]
    fn test_type_operators() {
        let expected = "\
Binary and
  Binary oftype
    Reference 'x'
    ClassLiteral 'java.lang.String'
  Binary isnt
    Reference 'y'
    Literal null
";
        assert_eq!(
            expr("x oftype java.lang.String.class and y isnt null").unwrap(),
            expected
        );
    }

    #[test]
    fn test_grouping_and_unary_minus() {
        let expected = "\
Binary *
  Unary -
    Reference 'a'
  Binary +
    Reference 'b'
    Reference 'c'
";
        assert_eq!(expr("-a * (b + c)").unwrap(), expected);
    }

    #[test]
    fn test_newline_after_operator() {
        let expected = "\
Binary +
  Literal 1
  Literal 2
";
        assert_eq!(expr("1 +\n  2").unwrap(), expected);
    }

    #[test]
    fn test_invocations() {
        let expected = "\
MethodInvocation 'size'
  MethodInvocation 'add'
    FunctionInvocation 'java.util.LinkedList'
    Literal \"a\"
";
        assert_eq!(expr("java.util.LinkedList(): add(\"a\"): size()").unwrap(), expected);
    }

    #[test]
    fn test_anonymous_call() {
        let expected = "\
AnonymousCall
  FunctionInvocation 'adder'
    Literal 1
  Literal 2
";
        assert_eq!(expr("adder(1)(2)").unwrap(), expected);
    }

    #[test]
    fn test_arguments_across_lines() {
        let expected = "\
FunctionInvocation 'f'
  Literal 1
  Literal 2
";
        assert_eq!(expr("f(\n  1,\n  2\n)").unwrap(), expected);
    }

    #[test]
    fn test_closure_and_function_ref() {
        let expected = "\
FunctionInvocation 'map'
  Function [compact]
    Parameter 'x'
    Binary *
      Reference 'x'
      Literal 2
  FunctionRef 'samples.Util.twice'
";
        assert_eq!(expr("map(|x| -> x * 2, ^samples.Util.twice)").unwrap(), expected);
    }

    #[test]
    fn test_numeric_literals() {
        let expected = "\
Collection list
  Literal 1000000
  Literal 9000000000_L
  Literal 0.5_F
  Literal 1500.0
";
        assert_eq!(expr("list[1_000_000, 9_000_000_000_L, 0.5_F, 1.5e3]").unwrap(), expected);
    }

    #[test]
    fn test_integer_overflow_is_invalid_literal() {
        let err = parse_source("module m\nfunction f = -> 3000000000\n").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidLiteral);
        assert_eq!((err.line, err.column), (2, 17));
        assert!(err.message.contains("3000000000"));
    }

    #[test]
    fn test_dotted_reference_without_call() {
        let err = parse_source("module m\nfunction f = -> a.b\n").unwrap_err();
        assert_eq!(err.expected, vec!["'('"]);
    }

    #[test]
    fn test_missing_operand() {
        let err = parse_source("module m\nfunction f = -> 1 +\n").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnexpectedEndOfInput);
        assert_eq!(err.expected, vec!["expression"]);
    }

    #[test]
    fn test_unclosed_arguments() {
        let err = parse_source("module m\nfunction f = -> g(1 2)\n").unwrap_err();
        assert_eq!(err.expected, vec!["','", "')'"]);
        assert_eq!(err.found.as_deref(), Some("number"));
    }

    #[test]
    fn test_recursion_limit() {
        let nested = format!("{}1{}", "(".repeat(300), ")".repeat(300));
        let err = parse_source(&format!("module m\nfunction f = -> {}\n", nested)).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::RecursionLimitExceeded);
    }

    #[test]
    fn test_custom_nesting_limit() {
        let nested = format!("{}1{}", "(".repeat(100), ")".repeat(100));
        let source = format!("module m\nfunction f = -> {}\n", nested);
        assert!(parse_source(&source).is_err());

        let limits = ParseLimits::default().with_nesting_depth(1_000);
        assert!(parse_source_with_limits(&source, &limits).is_ok());
    }
}
