use super::{ParseError, Parser};
use crate::ast::{CollectionKind, NodeId, NodeKind};
use crate::lexer::TokenKind;
use crate::span::Position;

impl Parser<'_> {
    /// Parse a collection literal: [a, b], list[a, b], map[[k, v]], ...
    /// `start` is where the literal begins, prefix included.
    /// Supports empty collections, trailing commas, and newlines
    pub(super) fn parse_collection(
        &mut self,
        depth: usize,
        kind: CollectionKind,
        start: Position,
    ) -> Result<NodeId, ParseError> {
        self.check_depth(depth)?;

        self.consume(TokenKind::LBracket, "'['")?;
        let collection_idx = self.open_node(NodeKind::Collection(kind), start)?;

        loop {
            // Newlines are just whitespace in collections
            self.skip_newlines();

            // Empty collection, or trailing comma
            if self.peek_kind_is(TokenKind::RBracket) {
                self.advance();
                break;
            }

            let elem_idx = self.parse_expression(depth + 1, 0)?;
            self.attach(collection_idx, elem_idx);
            self.skip_newlines();

            match self.peek_kind() {
                TokenKind::Comma => {
                    self.advance();
                }
                TokenKind::RBracket => {
                    self.advance();
                    break;
                }
                _ => return Err(self.new_unexpected_token(&["','", "']'"])),
            }
        }

        Ok(self.finish(collection_idx, start))
    }
}

#[cfg(test)]
mod tests {
    use super::super::*;

    fn to_ast_string(source: &str) -> Result<String, ParseError> {
        Ok(parse_source(source)?.to_string())
    }

    fn collection(literal: &str) -> Result<String, ParseError> {
        let dump = to_ast_string(&format!("module m\nfunction f = -> {}\n", literal))?;
        let lines: Vec<&str> = dump
            .lines()
            .skip(4)
            .map(|line| line.strip_prefix("      ").unwrap_or(line))
            .collect();
        Ok(lines.join("\n") + "\n")
    }

    #[test]
    fn test_empty_collections() {
        assert_eq!(collection("[]").unwrap(), "Collection tuple\n");
        assert_eq!(collection("set[]").unwrap(), "Collection set\n");
    }

    #[test]
    fn test_prefixed_collections() {
        for prefix in ["tuple", "list", "set", "vector", "array"] {
            let expected = format!("Collection {}\n  Literal 1\n  Literal 2\n", prefix);
            assert_eq!(collection(&format!("{}[1, 2]", prefix)).unwrap(), expected);
        }
    }

    #[test]
    fn test_map_entries() {
        let expected = "\
Collection map
  Collection tuple
    Literal \"a\"
    Literal 1
  Collection tuple
    Literal \"b\"
    Literal 2
";
        assert_eq!(collection("map[[\"a\", 1], [\"b\", 2]]").unwrap(), expected);
    }

    #[test]
    fn test_multiline_with_trailing_comma() {
        let expected = "\
Collection list
  Reference 'a'
  Reference 'b'
";
        assert_eq!(collection("list[\n  a,\n  b,\n]").unwrap(), expected);
    }

    #[test]
    fn test_span_includes_prefix() {
        let ast = parse_source("module m\nfunction f = -> list[1]\n").unwrap();
        let decl = ast.children(ast.root()).nth(1).unwrap();
        let function = ast.children(decl).next().unwrap();
        let list = ast.children(function).next().unwrap();

        let span = ast.span(list);
        assert_eq!((span.start.line, span.start.column), (2, 17));
        assert_eq!(span.end.column, 24);
    }

    #[test]
    fn test_prefix_name_without_bracket_is_a_reference() {
        assert_eq!(collection("list").unwrap(), "Reference 'list'\n");
    }

    #[test]
    fn test_missing_separator() {
        let err = parse_source("module m\nfunction f = -> [1 2]\n").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnexpectedToken);
        assert_eq!(err.expected, vec!["','", "']'"]);
    }

    #[test]
    fn test_unclosed_collection() {
        let err = parse_source("module m\nfunction f = -> [1,\n").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnexpectedEndOfInput);
    }
}
