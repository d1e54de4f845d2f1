use super::{ParseError, Parser};
use crate::ast::{NodeId, NodeKind};
use crate::lexer::TokenKind;

// Recursive statement parsing methods
impl Parser<'_> {
    /// Parse a block: { statements }
    pub(super) fn parse_block(&mut self, depth: usize) -> Result<NodeId, ParseError> {
        self.check_depth(depth)?;
        let start = self.start();

        self.consume(TokenKind::LBrace, "'{'")?;
        let block_idx = self.open_node(NodeKind::Block, start)?;

        loop {
            self.skip_newlines();

            if self.peek_kind_is(TokenKind::RBrace) {
                self.advance();
                break;
            }

            // Unclosed block
            if self.at_end() {
                return Err(self.new_unexpected_token(&["'}'"]));
            }

            let before = self.current;
            let stmt_idx = self.parse_statement(depth + 1)?;
            self.attach(block_idx, stmt_idx);
            self.check_progress(before)?;

            self.expect_terminator(true)?;
        }

        Ok(self.finish(block_idx, start))
    }

    /// Parse a single statement
    pub(super) fn parse_statement(&mut self, depth: usize) -> Result<NodeId, ParseError> {
        self.check_depth(depth)?;

        match self.peek_kind() {
            TokenKind::Let | TokenKind::Var => self.parse_let_or_var(depth + 1),
            TokenKind::Identifier if self.peek_next_kind(1) == TokenKind::Assign => {
                self.parse_assignment(depth + 1)
            }
            TokenKind::Return => self.parse_return(depth + 1),
            TokenKind::Throw => self.parse_throw(depth + 1),
            TokenKind::If => self.parse_if(depth + 1),
            TokenKind::While => self.parse_while(depth + 1),
            TokenKind::For => self.parse_for(depth + 1),
            TokenKind::Foreach => self.parse_foreach(depth + 1),
            TokenKind::Try => self.parse_try(depth + 1),
            TokenKind::Case => self.parse_case(depth + 1),
            TokenKind::Break => {
                let token = self.advance();
                self.leaf(NodeKind::Break, &token)
            }
            TokenKind::Continue => {
                let token = self.advance();
                self.leaf(NodeKind::Continue, &token)
            }
            _ => self.parse_expression(depth + 1, 0),
        }
    }

    /// Parse a variable declaration: let x = expr / var x = expr
    fn parse_let_or_var(&mut self, depth: usize) -> Result<NodeId, ParseError> {
        self.check_depth(depth)?;
        let start = self.start();

        let mutable = match self.peek_kind() {
            TokenKind::Let => false,
            TokenKind::Var => true,
            _ => return Err(self.new_unexpected_token(&["'let'", "'var'"])),
        };
        self.advance();

        let name = self.consume_identifier("variable name")?;
        self.consume(TokenKind::Assign, "'='")?;
        self.skip_newlines();

        let decl_idx = self.open_node(NodeKind::LetOrVar { name, mutable }, start)?;
        let value_idx = self.parse_expression(depth + 1, 0)?;
        self.attach(decl_idx, value_idx);

        Ok(self.finish(decl_idx, start))
    }

    /// Parse an assignment to an existing variable: x = expr
    fn parse_assignment(&mut self, depth: usize) -> Result<NodeId, ParseError> {
        self.check_depth(depth)?;
        let start = self.start();

        let name = self.consume_identifier("variable name")?;
        self.consume(TokenKind::Assign, "'='")?;
        self.skip_newlines();

        let assign_idx = self.open_node(NodeKind::Assignment { name }, start)?;
        let value_idx = self.parse_expression(depth + 1, 0)?;
        self.attach(assign_idx, value_idx);

        Ok(self.finish(assign_idx, start))
    }

    /// Parse a return statement: return or return expr
    fn parse_return(&mut self, depth: usize) -> Result<NodeId, ParseError> {
        self.check_depth(depth)?;
        let start = self.start();

        self.consume(TokenKind::Return, "'return'")?;
        let return_idx = self.open_node(NodeKind::Return, start)?;

        // Void return: the value would have to start on the same line
        if !matches!(
            self.peek_kind(),
            TokenKind::Newline | TokenKind::RBrace | TokenKind::Eof
        ) {
            let value_idx = self.parse_expression(depth + 1, 0)?;
            self.attach(return_idx, value_idx);
        }

        Ok(self.finish(return_idx, start))
    }

    fn parse_throw(&mut self, depth: usize) -> Result<NodeId, ParseError> {
        self.check_depth(depth)?;
        let start = self.start();

        self.consume(TokenKind::Throw, "'throw'")?;
        let throw_idx = self.open_node(NodeKind::Throw, start)?;
        let value_idx = self.parse_expression(depth + 1, 0)?;
        self.attach(throw_idx, value_idx);

        Ok(self.finish(throw_idx, start))
    }

    /// Parse conditional: if cond { } else if cond { } else { }
    fn parse_if(&mut self, depth: usize) -> Result<NodeId, ParseError> {
        self.check_depth(depth)?;
        let start = self.start();

        self.consume(TokenKind::If, "'if'")?;
        let if_idx = self.open_node(NodeKind::If, start)?;

        let condition_idx = self.parse_expression(depth + 1, 0)?;
        self.attach(if_idx, condition_idx);
        let then_idx = self.parse_block(depth + 1)?;
        self.attach(if_idx, then_idx);

        if self.peek_kind_is(TokenKind::Else) {
            self.advance();
            let else_idx = match self.peek_kind() {
                TokenKind::If => self.parse_if(depth + 1)?,
                TokenKind::LBrace => self.parse_block(depth + 1)?,
                _ => return Err(self.new_unexpected_token(&["'if'", "'{'"])),
            };
            self.attach(if_idx, else_idx);
        }

        Ok(self.finish(if_idx, start))
    }

    fn parse_while(&mut self, depth: usize) -> Result<NodeId, ParseError> {
        self.check_depth(depth)?;
        let start = self.start();

        self.consume(TokenKind::While, "'while'")?;
        let while_idx = self.open_node(NodeKind::While, start)?;

        let condition_idx = self.parse_expression(depth + 1, 0)?;
        self.attach(while_idx, condition_idx);
        let body_idx = self.parse_block(depth + 1)?;
        self.attach(while_idx, body_idx);

        Ok(self.finish(while_idx, start))
    }

    /// Parse counting loop: for (var i = 0, i < n, i = i + 1) { }
    fn parse_for(&mut self, depth: usize) -> Result<NodeId, ParseError> {
        self.check_depth(depth)?;
        let start = self.start();

        self.consume(TokenKind::For, "'for'")?;
        self.consume(TokenKind::LParen, "'('")?;
        let for_idx = self.open_node(NodeKind::For, start)?;

        self.skip_newlines();
        let init_idx = self.parse_let_or_var(depth + 1)?;
        self.attach(for_idx, init_idx);
        self.for_separator()?;

        let condition_idx = self.parse_expression(depth + 1, 0)?;
        self.attach(for_idx, condition_idx);
        self.for_separator()?;

        let step_idx = self.parse_statement(depth + 1)?;
        self.attach(for_idx, step_idx);
        self.skip_newlines();
        self.consume(TokenKind::RParen, "')'")?;

        let body_idx = self.parse_block(depth + 1)?;
        self.attach(for_idx, body_idx);

        Ok(self.finish(for_idx, start))
    }

    fn for_separator(&mut self) -> Result<(), ParseError> {
        self.skip_newlines();
        self.consume(TokenKind::Comma, "','")?;
        self.skip_newlines();
        Ok(())
    }

    /// Parse iteration: foreach item in items { } / foreach (item in items) { }
    fn parse_foreach(&mut self, depth: usize) -> Result<NodeId, ParseError> {
        self.check_depth(depth)?;
        let start = self.start();

        self.consume(TokenKind::Foreach, "'foreach'")?;
        let parenthesized = self.peek_kind_is(TokenKind::LParen);
        if parenthesized {
            self.advance();
        }

        let variable = self.consume_identifier("loop variable")?;
        self.consume(TokenKind::In, "'in'")?;
        let foreach_idx = self.open_node(NodeKind::ForEach { variable }, start)?;

        let iterable_idx = self.parse_expression(depth + 1, 0)?;
        self.attach(foreach_idx, iterable_idx);
        if parenthesized {
            self.consume(TokenKind::RParen, "')'")?;
        }

        let body_idx = self.parse_block(depth + 1)?;
        self.attach(foreach_idx, body_idx);

        Ok(self.finish(foreach_idx, start))
    }

    /// Parse exception handling: try { } catch (e) { } finally { }
    fn parse_try(&mut self, depth: usize) -> Result<NodeId, ParseError> {
        self.check_depth(depth)?;
        let start = self.start();

        self.consume(TokenKind::Try, "'try'")?;
        let try_idx = self.open_node(NodeKind::Try, start)?;
        let body_idx = self.parse_block(depth + 1)?;
        self.attach(try_idx, body_idx);

        let mut handled = false;

        if self.peek_kind_is(TokenKind::Catch) {
            let catch_start = self.start();
            self.advance();
            self.consume(TokenKind::LParen, "'('")?;
            let variable = self.consume_identifier("exception variable")?;
            self.consume(TokenKind::RParen, "')'")?;

            let catch_idx = self.open_node(NodeKind::Catch { variable }, catch_start)?;
            let handler_idx = self.parse_block(depth + 1)?;
            self.attach(catch_idx, handler_idx);
            self.finish(catch_idx, catch_start);
            self.attach(try_idx, catch_idx);
            handled = true;
        }

        if self.peek_kind_is(TokenKind::Finally) {
            let finally_start = self.start();
            self.advance();

            let finally_idx = self.open_node(NodeKind::Finally, finally_start)?;
            let cleanup_idx = self.parse_block(depth + 1)?;
            self.attach(finally_idx, cleanup_idx);
            self.finish(finally_idx, finally_start);
            self.attach(try_idx, finally_idx);
            handled = true;
        }

        if !handled {
            return Err(self.new_unexpected_token(&["'catch'", "'finally'"]));
        }

        Ok(self.finish(try_idx, start))
    }
}
