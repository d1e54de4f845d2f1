use super::{ParseError, Parser};
use crate::ast::{FunctionFlags, NodeId, NodeKind};
use crate::lexer::TokenKind;

const TOPLEVEL_START: &[&str] = &[
    "'import'",
    "'function'",
    "'local'",
    "'augment'",
    "'struct'",
    "end of file",
];

// Compilation unit and top-level declarations
impl Parser<'_> {
    /// module, then imports, then functions / augmentations / structs until Eof
    pub(super) fn parse_unit(&mut self, depth: usize) -> Result<(), ParseError> {
        self.check_depth(depth)?;
        let root = self.ast.root();

        self.skip_newlines();
        let module_idx = self.parse_module_decl(depth + 1)?;
        self.attach(root, module_idx);
        self.expect_terminator(false)?;

        let mut in_imports = true;
        loop {
            self.skip_newlines();
            if self.at_end() {
                break;
            }

            let before = self.current;
            let decl_idx = match self.peek_kind() {
                TokenKind::Import if in_imports => self.parse_import_decl(depth + 1)?,
                TokenKind::Function | TokenKind::Local => {
                    in_imports = false;
                    self.parse_function_decl(depth + 1)?
                }
                TokenKind::Augment => {
                    in_imports = false;
                    self.parse_augmentation(depth + 1)?
                }
                TokenKind::Struct => {
                    in_imports = false;
                    self.parse_struct(depth + 1)?
                }
                _ if in_imports => return Err(self.new_unexpected_token(TOPLEVEL_START)),
                _ => return Err(self.new_unexpected_token(&TOPLEVEL_START[1..])),
            };
            self.check_progress(before)?;

            self.attach(root, decl_idx);
            self.expect_terminator(false)?;
        }

        Ok(())
    }

    /// Parse module declaration: module some.qualified.Name
    fn parse_module_decl(&mut self, depth: usize) -> Result<NodeId, ParseError> {
        self.check_depth(depth)?;
        let start = self.start();

        self.consume(TokenKind::Module, "'module'")?;
        let name = self.parse_qualified_name("module name")?;

        let module_idx = self.open_node(NodeKind::Module { name }, start)?;
        Ok(self.finish(module_idx, start))
    }

    /// Parse import declaration: import java.util.LinkedList
    fn parse_import_decl(&mut self, depth: usize) -> Result<NodeId, ParseError> {
        self.check_depth(depth)?;
        let start = self.start();

        self.consume(TokenKind::Import, "'import'")?;
        let name = self.parse_qualified_name("imported name")?;

        let import_idx = self.open_node(NodeKind::Import { name }, start)?;
        Ok(self.finish(import_idx, start))
    }

    /// Parse function declaration: local? function name = |params| { ... }
    pub(super) fn parse_function_decl(&mut self, depth: usize) -> Result<NodeId, ParseError> {
        self.check_depth(depth)?;
        let start = self.start();

        let mut flags = FunctionFlags::empty();
        if self.peek_kind_is(TokenKind::Local) {
            self.advance();
            flags |= FunctionFlags::LOCAL;
        }

        self.consume(TokenKind::Function, "'function'")?;
        let name = self.consume_identifier("function name")?;
        self.consume(TokenKind::Assign, "'='")?;

        let decl_idx = self.open_node(NodeKind::FunctionDeclaration { name, flags }, start)?;

        if !matches!(
            self.peek_kind(),
            TokenKind::Pipe | TokenKind::LBrace | TokenKind::Arrow
        ) {
            return Err(self.new_unexpected_token(&["'|'", "'{'", "'->'"]));
        }
        let function_idx = self.parse_function(depth + 1)?;
        self.attach(decl_idx, function_idx);

        Ok(self.finish(decl_idx, start))
    }

    /// Parse function body with optional parameters:
    /// |a, b, rest...| { ... }  or  |a| -> expression  or  { ... }
    pub(super) fn parse_function(&mut self, depth: usize) -> Result<NodeId, ParseError> {
        self.check_depth(depth)?;
        let start = self.start();

        let function_idx = self.open_node(NodeKind::Function { flags: FunctionFlags::empty() }, start)?;
        let mut flags = FunctionFlags::empty();

        if self.peek_kind_is(TokenKind::Pipe) {
            self.advance();
            if self.parse_parameters(function_idx)? {
                flags |= FunctionFlags::VARARGS;
            }
            self.consume(TokenKind::Pipe, "'|'")?;
        }

        match self.peek_kind() {
            TokenKind::LBrace => {
                let block_idx = self.parse_block(depth + 1)?;
                self.attach(function_idx, block_idx);
            }
            TokenKind::Arrow => {
                self.advance();
                self.skip_newlines();
                flags |= FunctionFlags::COMPACT;
                let body_idx = self.parse_expression(depth + 1, 0)?;
                self.attach(function_idx, body_idx);
            }
            _ => return Err(self.new_unexpected_token(&["'{'", "'->'"])),
        }

        self.ast.set_kind(function_idx, NodeKind::Function { flags });
        Ok(self.finish(function_idx, start))
    }

    /// Parameter names up to the closing '|'; returns true for varargs
    fn parse_parameters(&mut self, function_idx: NodeId) -> Result<bool, ParseError> {
        if self.peek_kind_is(TokenKind::Pipe) {
            return Ok(false);
        }

        loop {
            let token = *self.current_token();
            let name = self.consume_identifier("parameter name")?;
            let param_idx = self.leaf(NodeKind::Parameter { name }, &token)?;
            self.attach(function_idx, param_idx);

            match self.peek_kind() {
                TokenKind::Comma => {
                    self.advance();
                }
                TokenKind::Ellipsis => {
                    self.advance();
                    if !self.peek_kind_is(TokenKind::Pipe) {
                        return Err(self.new_unexpected_token(&["'|'"]));
                    }
                    return Ok(true);
                }
                TokenKind::Pipe => return Ok(false),
                _ => return Err(self.new_unexpected_token(&["','", "'...'", "'|'"])),
            }
        }
    }

    /// Parse augmentation: augment java.lang.String { function ... }
    fn parse_augmentation(&mut self, depth: usize) -> Result<NodeId, ParseError> {
        self.check_depth(depth)?;
        let start = self.start();

        self.consume(TokenKind::Augment, "'augment'")?;
        let target = self.parse_qualified_name("augmented type name")?;
        let augment_idx = self.open_node(NodeKind::Augmentation { target }, start)?;

        self.consume(TokenKind::LBrace, "'{'")?;
        loop {
            self.skip_newlines();

            if self.peek_kind_is(TokenKind::RBrace) {
                self.advance();
                break;
            }

            let before = self.current;
            match self.peek_kind() {
                TokenKind::Function | TokenKind::Local => {
                    let function_idx = self.parse_function_decl(depth + 1)?;
                    self.attach(augment_idx, function_idx);
                }
                _ => return Err(self.new_unexpected_token(&["'function'", "'local'", "'}'"])),
            }
            self.check_progress(before)?;
            self.expect_terminator(true)?;
        }

        Ok(self.finish(augment_idx, start))
    }

    /// Parse struct declaration: struct Point = { x, y }
    fn parse_struct(&mut self, depth: usize) -> Result<NodeId, ParseError> {
        self.check_depth(depth)?;
        let start = self.start();

        self.consume(TokenKind::Struct, "'struct'")?;
        let name = self.consume_identifier("struct name")?;
        self.consume(TokenKind::Assign, "'='")?;
        self.consume(TokenKind::LBrace, "'{'")?;

        let struct_idx = self.open_node(NodeKind::Struct { name }, start)?;

        loop {
            self.skip_newlines();
            let token = *self.current_token();
            let member = self.consume_identifier("member name")?;
            let member_idx = self.leaf(NodeKind::Member { name: member }, &token)?;
            self.attach(struct_idx, member_idx);

            self.skip_newlines();
            match self.peek_kind() {
                TokenKind::Comma => {
                    self.advance();
                }
                TokenKind::RBrace => {
                    self.advance();
                    break;
                }
                _ => return Err(self.new_unexpected_token(&["','", "'}'"])),
            }
        }

        Ok(self.finish(struct_idx, start))
    }
}

#[cfg(test)]
mod tests {
    use super::super::*;

    fn to_ast_string(source: &str) -> Result<String, ParseError> {
        Ok(parse_source(source)?.to_string())
    }

    #[test]
    fn test_module_and_imports() {
        let ast = to_ast_string("module samples.Hello\n\nimport java.util\nimport foo\n").unwrap();
        let expected = "\
CompilationUnit
  Module 'samples.Hello'
  Import 'java.util'
  Import 'foo'
";
        assert_eq!(ast, expected);
    }

    #[test]
    fn test_function_declarations() {
        let source = "\
module m

function main = |args| {
}

local function helper = |a, b, rest...| -> a

function noargs = {
}
";
        let expected = "\
CompilationUnit
  Module 'm'
  FunctionDeclaration 'main'
    Function
      Parameter 'args'
      Block
  FunctionDeclaration 'helper' [local]
    Function [varargs, compact]
      Parameter 'a'
      Parameter 'b'
      Parameter 'rest'
      Reference 'a'
  FunctionDeclaration 'noargs'
    Function
      Block
";
        assert_eq!(to_ast_string(source).unwrap(), expected);
    }

    #[test]
    fn test_augmentation() {
        let source = "\
module m

augment java.lang.String {

  function shout = |this| -> this: toUpperCase()

  local function whisper = |this| {
  }
}
";
        let expected = "\
CompilationUnit
  Module 'm'
  Augmentation 'java.lang.String'
    FunctionDeclaration 'shout'
      Function [compact]
        Parameter 'this'
        MethodInvocation 'toUpperCase'
          Reference 'this'
    FunctionDeclaration 'whisper' [local]
      Function
        Parameter 'this'
        Block
";
        assert_eq!(to_ast_string(source).unwrap(), expected);
    }

    #[test]
    fn test_struct() {
        let ast = to_ast_string("module m\nstruct Point = {\n  x,\n  y\n}\n").unwrap();
        let expected = "\
CompilationUnit
  Module 'm'
  Struct 'Point'
    Member 'x'
    Member 'y'
";
        assert_eq!(ast, expected);
    }

    #[test]
    fn test_import_after_function_is_rejected() {
        let err = parse_source("module m\nfunction f = {}\nimport foo\n").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnexpectedToken);
        assert_eq!(err.line, 3);
        assert!(!err.expected.contains(&"'import'"));
    }

    #[test]
    fn test_declarations_need_their_own_line() {
        let err = parse_source("module m function f = {}\n").unwrap_err();
        assert_eq!(err.expected, vec!["newline", "end of file"]);
    }

    #[test]
    fn test_varargs_must_be_last() {
        let err = parse_source("module m\nfunction f = |a..., b| {}\n").unwrap_err();
        assert_eq!(err.expected, vec!["'|'"]);
        assert_eq!(err.found.as_deref(), Some("','"));
    }

    #[test]
    fn test_missing_function_body() {
        let err = parse_source("module m\nfunction f = |a|\n").unwrap_err();
        assert_eq!(err.expected, vec!["'{'", "'->'"]);
    }

    #[test]
    fn test_unclosed_augmentation() {
        let err = parse_source("module m\naugment Foo {\n  function f = |this| {}\n").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnexpectedEndOfInput);
    }
}
