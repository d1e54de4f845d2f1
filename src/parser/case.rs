use super::{ParseError, Parser};
use crate::ast::{NodeId, NodeKind};
use crate::lexer::TokenKind;

// Branch selection: `case` statements and `match` expressions share one shape,
// `when` clauses followed by a mandatory `otherwise`
#[derive(Clone, Copy)]
enum Arms {
    /// case: when cond { ... } / otherwise { ... }
    Blocks,
    /// match: when cond then value / otherwise value
    Values,
}

impl Parser<'_> {
    /// Parse case statement:
    /// case {
    ///   when x < 0 { ... }
    ///   otherwise { ... }
    /// }
    pub(super) fn parse_case(&mut self, depth: usize) -> Result<NodeId, ParseError> {
        self.check_depth(depth)?;
        let start = self.start();

        self.consume(TokenKind::Case, "'case'")?;
        let case_idx = self.open_node(NodeKind::Case, start)?;
        self.parse_arms(depth + 1, case_idx, Arms::Blocks)?;

        Ok(self.finish(case_idx, start))
    }

    /// Parse match expression:
    /// match {
    ///   when x < 0 then "negative"
    ///   otherwise "positive"
    /// }
    pub(super) fn parse_match(&mut self, depth: usize) -> Result<NodeId, ParseError> {
        self.check_depth(depth)?;
        let start = self.start();

        self.consume(TokenKind::Match, "'match'")?;
        let match_idx = self.open_node(NodeKind::Match, start)?;
        self.parse_arms(depth + 1, match_idx, Arms::Values)?;

        Ok(self.finish(match_idx, start))
    }

    /// '{' when+ otherwise '}'
    fn parse_arms(&mut self, depth: usize, parent: NodeId, arms: Arms) -> Result<(), ParseError> {
        self.check_depth(depth)?;
        self.consume(TokenKind::LBrace, "'{'")?;

        let mut when_count = 0;
        loop {
            self.skip_newlines();

            match self.peek_kind() {
                TokenKind::When => {
                    let when_idx = self.parse_when(depth + 1, arms)?;
                    self.attach(parent, when_idx);
                    when_count += 1;
                }
                TokenKind::Otherwise if when_count > 0 => {
                    let otherwise_idx = self.parse_otherwise(depth + 1, arms)?;
                    self.attach(parent, otherwise_idx);
                    break;
                }
                _ if when_count > 0 => {
                    return Err(self.new_unexpected_token(&["'when'", "'otherwise'"]));
                }
                _ => return Err(self.new_unexpected_token(&["'when'"])),
            }
        }

        self.skip_newlines();
        self.consume(TokenKind::RBrace, "'}'")?;
        Ok(())
    }

    fn parse_when(&mut self, depth: usize, arms: Arms) -> Result<NodeId, ParseError> {
        self.check_depth(depth)?;
        let start = self.start();

        self.consume(TokenKind::When, "'when'")?;
        let when_idx = self.open_node(NodeKind::When, start)?;

        let condition_idx = self.parse_expression(depth + 1, 0)?;
        self.attach(when_idx, condition_idx);

        let branch_idx = self.parse_branch(depth + 1, arms)?;
        self.attach(when_idx, branch_idx);

        Ok(self.finish(when_idx, start))
    }

    fn parse_otherwise(&mut self, depth: usize, arms: Arms) -> Result<NodeId, ParseError> {
        self.check_depth(depth)?;
        let start = self.start();

        self.consume(TokenKind::Otherwise, "'otherwise'")?;
        let otherwise_idx = self.open_node(NodeKind::Otherwise, start)?;

        let branch_idx = match arms {
            Arms::Blocks => self.parse_block(depth + 1)?,
            Arms::Values => {
                self.skip_newlines();
                self.parse_expression(depth + 1, 0)?
            }
        };
        self.attach(otherwise_idx, branch_idx);

        Ok(self.finish(otherwise_idx, start))
    }

    fn parse_branch(&mut self, depth: usize, arms: Arms) -> Result<NodeId, ParseError> {
        match arms {
            Arms::Blocks => self.parse_block(depth),
            Arms::Values => {
                self.skip_newlines();
                self.consume(TokenKind::Then, "'then'")?;
                self.skip_newlines();
                self.parse_expression(depth, 0)
            }
        }
    }
}
