use std::iter::Peekable;
use std::str::CharIndices;

use log::trace;
use thiserror::Error;

use crate::limits::ParseLimits;
use crate::span::{Position, Span};
use crate::string_storage::{StringId, StringStorage};

// Token types

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Keywords
    Module,
    Import,
    Function,
    Local,
    Augment,
    Struct,
    Return,
    If,
    Else,
    While,
    For,
    Foreach,
    In,
    Throw,
    Try,
    Catch,
    Finally,
    Let,
    Var,
    Case,
    Match,
    When,
    Then,
    Otherwise,
    Break,
    Continue,
    Null,
    True,
    False,
    And,
    Or,
    Not,
    Is,
    Isnt,
    Oftype,
    OrIfNull,

    // Identifiers and literals
    Identifier,
    Number(NumberKind),
    String(StringKind),
    Char,

    // Punctuation
    LParen,   // (
    RParen,   // )
    LBrace,   // {
    RBrace,   // }
    LBracket, // [
    RBracket, // ]
    Comma,    // ,
    Dot,      // .
    Ellipsis, // ...
    Colon,    // :
    Pipe,     // |
    Caret,    // ^
    Assign,   // =
    Arrow,    // ->

    // Operators
    Plus,    // +
    Minus,   // -
    Star,    // *
    Slash,   // /
    Percent, // %
    Lt,      // <
    Le,      // <=
    Gt,      // >
    Ge,      // >=
    EqEq,    // ==
    NotEq,   // !=

    // Special
    Newline,
    Eof,
}

impl TokenKind {
    /// Human-readable name used in diagnostics
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::Module => "'module'",
            TokenKind::Import => "'import'",
            TokenKind::Function => "'function'",
            TokenKind::Local => "'local'",
            TokenKind::Augment => "'augment'",
            TokenKind::Struct => "'struct'",
            TokenKind::Return => "'return'",
            TokenKind::If => "'if'",
            TokenKind::Else => "'else'",
            TokenKind::While => "'while'",
            TokenKind::For => "'for'",
            TokenKind::Foreach => "'foreach'",
            TokenKind::In => "'in'",
            TokenKind::Throw => "'throw'",
            TokenKind::Try => "'try'",
            TokenKind::Catch => "'catch'",
            TokenKind::Finally => "'finally'",
            TokenKind::Let => "'let'",
            TokenKind::Var => "'var'",
            TokenKind::Case => "'case'",
            TokenKind::Match => "'match'",
            TokenKind::When => "'when'",
            TokenKind::Then => "'then'",
            TokenKind::Otherwise => "'otherwise'",
            TokenKind::Break => "'break'",
            TokenKind::Continue => "'continue'",
            TokenKind::Null => "'null'",
            TokenKind::True => "'true'",
            TokenKind::False => "'false'",
            TokenKind::And => "'and'",
            TokenKind::Or => "'or'",
            TokenKind::Not => "'not'",
            TokenKind::Is => "'is'",
            TokenKind::Isnt => "'isnt'",
            TokenKind::Oftype => "'oftype'",
            TokenKind::OrIfNull => "'orIfNull'",
            TokenKind::Identifier => "identifier",
            TokenKind::Number(_) => "number",
            TokenKind::String(_) => "string",
            TokenKind::Char => "character",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::Comma => "','",
            TokenKind::Dot => "'.'",
            TokenKind::Ellipsis => "'...'",
            TokenKind::Colon => "':'",
            TokenKind::Pipe => "'|'",
            TokenKind::Caret => "'^'",
            TokenKind::Assign => "'='",
            TokenKind::Arrow => "'->'",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Star => "'*'",
            TokenKind::Slash => "'/'",
            TokenKind::Percent => "'%'",
            TokenKind::Lt => "'<'",
            TokenKind::Le => "'<='",
            TokenKind::Gt => "'>'",
            TokenKind::Ge => "'>='",
            TokenKind::EqEq => "'=='",
            TokenKind::NotEq => "'!='",
            TokenKind::Newline => "newline",
            TokenKind::Eof => "end of file",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumberKind {
    Integer, // 42
    Long,    // 42_L
    Float,   // 1.5_F
    Double,  // 1.5, 1.5e3
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringKind {
    Standard,  // "..."
    MultiLine, // """..."""
}

/// The token stream handed to the parser, with the strings it interned
#[derive(Debug, Clone)]
pub struct Tokens {
    pub list: Vec<Token>,
    pub string_storage: StringStorage,
}

impl Tokens {
    pub fn new(tokens: Vec<Token>, storage: StringStorage) -> Self {
        Self {
            list: tokens,
            string_storage: storage,
        }
    }

    /// Token at `index`, or the trailing Eof token when out of range
    pub fn get(&self, index: usize) -> &Token {
        match self.list.get(index) {
            Some(token) => token,
            None => &self.list[self.list.len() - 1],
        }
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub string_id: Option<StringId>, // identifiers and literal text
}

impl Token {
    pub fn text<'a>(&self, storage: &'a StringStorage) -> Option<&'a str> {
        self.string_id.map(|id| storage.resolve(id))
    }

    pub fn line(&self) -> usize {
        self.span.start.line
    }

    pub fn column(&self) -> usize {
        self.span.start.column
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Lexical error at {line}:{column}: {message}")]
pub struct LexError {
    pub message: String,
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

// Lexer

pub struct Lexer<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
    pos: usize,
    line: usize,
    column: usize,
    limits: &'a ParseLimits,
    token_count: usize,
    string_storage: StringStorage,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str, limits: &'a ParseLimits) -> Result<Self, LexError> {
        if source.len() > limits.max_input_size {
            return Err(LexError {
                message: format!(
                    "Input too large: {} bytes (max: {} bytes)",
                    source.len(),
                    limits.max_input_size
                ),
                line: 1,
                column: 1,
                offset: 0,
            });
        }

        Ok(Self {
            source,
            chars: source.char_indices().peekable(),
            pos: 0,
            line: 1,
            column: 1,
            limits,
            token_count: 0,
            string_storage: StringStorage::new(),
        })
    }

    // Character navigation

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn peek_char_nth(&self, n: usize) -> Option<char> {
        self.chars.clone().nth(n).map(|(_, c)| c)
    }

    fn consume_char(&mut self) -> Option<char> {
        let (pos, ch) = self.chars.next()?;
        self.pos = pos + ch.len_utf8();

        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        Some(ch)
    }

    fn consume_if(&mut self, expected: char) -> bool {
        if self.peek_char() == Some(expected) {
            self.consume_char();
            true
        } else {
            false
        }
    }

    fn position(&self) -> Position {
        Position {
            offset: self.pos,
            line: self.line,
            column: self.column,
        }
    }

    fn error(&self, message: String) -> LexError {
        LexError {
            message,
            line: self.line,
            column: self.column,
            offset: self.pos,
        }
    }

    /// Skip blanks and `#` comments; newlines are tokens and stay put
    fn skip_trivia(&mut self) -> Result<(), LexError> {
        while let Some(c) = self.peek_char() {
            match c {
                ' ' | '\t' | '\r' => {
                    self.consume_char();
                }
                '#' => {
                    let start = self.pos;
                    while let Some(c) = self.peek_char() {
                        if c == '\n' {
                            break;
                        }
                        self.consume_char();
                    }

                    let comment_len = self.pos - start;
                    if comment_len > self.limits.max_comment_length {
                        return Err(self.error(format!(
                            "Comment too long: {} bytes (max: {} bytes)",
                            comment_len, self.limits.max_comment_length
                        )));
                    }
                }
                _ => break,
            }
        }
        Ok(())
    }

    // Main tokenization method

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        if self.token_count >= self.limits.max_token_count {
            return Err(self.error(format!(
                "Token limit exceeded: {} tokens (max: {})",
                self.token_count, self.limits.max_token_count
            )));
        }

        self.skip_trivia()?;
        let start = self.position();

        let (kind, string_id) = match self.peek_char() {
            None => (TokenKind::Eof, None),
            Some(c) if c.is_ascii_digit() => self.lex_number()?,
            Some(c) if is_ident_start(c) => self.lex_ident_or_keyword()?,
            Some('"') => self.lex_string()?,
            Some('\'') => self.lex_char()?,
            Some(_) => (self.lex_punctuation()?, None),
        };

        self.token_count += 1;

        let token = Token {
            kind,
            span: Span::new(start, self.position()),
            string_id,
        };
        trace!("token {:?} at {}", token.kind, token.span);
        Ok(token)
    }

    fn lex_punctuation(&mut self) -> Result<TokenKind, LexError> {
        let c = match self.consume_char() {
            Some(c) => c,
            None => return Ok(TokenKind::Eof),
        };

        let kind = match c {
            '\n' => TokenKind::Newline,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            '|' => TokenKind::Pipe,
            '^' => TokenKind::Caret,
            '+' => TokenKind::Plus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '.' => {
                if self.peek_char() == Some('.') && self.peek_char_nth(1) == Some('.') {
                    self.consume_char();
                    self.consume_char();
                    TokenKind::Ellipsis
                } else {
                    TokenKind::Dot
                }
            }
            '-' => {
                if self.consume_if('>') {
                    TokenKind::Arrow
                } else {
                    TokenKind::Minus
                }
            }
            '=' => {
                if self.consume_if('=') {
                    TokenKind::EqEq
                } else {
                    TokenKind::Assign
                }
            }
            '<' => {
                if self.consume_if('=') {
                    TokenKind::Le
                } else {
                    TokenKind::Lt
                }
            }
            '>' => {
                if self.consume_if('=') {
                    TokenKind::Ge
                } else {
                    TokenKind::Gt
                }
            }
            '!' => {
                if self.consume_if('=') {
                    TokenKind::NotEq
                } else {
                    return Err(self.error("Unexpected character: '!' (use 'not')".into()));
                }
            }
            c => return Err(self.error(format!("Unexpected character: '{}'", c))),
        };

        Ok(kind)
    }

    // Identifier and keyword lexing

    fn lex_ident_or_keyword(&mut self) -> Result<(TokenKind, Option<StringId>), LexError> {
        let start = self.pos;

        while let Some(c) = self.peek_char() {
            if is_ident_continue(c) {
                self.consume_char();
            } else {
                break;
            }
        }

        let text = &self.source[start..self.pos];

        if text.len() > self.limits.max_identifier_length {
            return Err(self.error(format!(
                "Identifier too long: {} bytes (max: {} bytes)",
                text.len(),
                self.limits.max_identifier_length
            )));
        }

        match keyword(text) {
            Some(kind) => Ok((kind, None)),
            None => Ok((TokenKind::Identifier, Some(self.string_storage.intern(text)))),
        }
    }

    // Number lexing

    /// Digits with `_` allowed only between two digits
    fn consume_digits(&mut self) -> bool {
        let mut consumed = false;
        loop {
            match self.peek_char() {
                Some(c) if c.is_ascii_digit() => {
                    self.consume_char();
                    consumed = true;
                }
                Some('_') if consumed && self.peek_char_nth(1).is_some_and(|c| c.is_ascii_digit()) => {
                    self.consume_char();
                }
                _ => return consumed,
            }
        }
    }

    fn lex_number(&mut self) -> Result<(TokenKind, Option<StringId>), LexError> {
        let start = self.pos;
        self.consume_digits();

        let mut fractional = false;
        if self.peek_char() == Some('.') && self.peek_char_nth(1).is_some_and(|c| c.is_ascii_digit()) {
            self.consume_char(); // '.'
            self.consume_digits();
            fractional = true;
        }

        if let Some('e') | Some('E') = self.peek_char() {
            self.consume_char();
            if let Some('+') | Some('-') = self.peek_char() {
                self.consume_char();
            }
            if !self.consume_digits() {
                return Err(self.error("Exponent must have digits".into()));
            }
            fractional = true;
        }

        let kind = match (self.peek_char(), self.peek_char_nth(1)) {
            (Some('_'), Some('L')) if !fractional => {
                self.consume_char();
                self.consume_char();
                NumberKind::Long
            }
            (Some('_'), Some('F')) if fractional => {
                self.consume_char();
                self.consume_char();
                NumberKind::Float
            }
            (Some('_'), Some(suffix @ ('L' | 'F'))) => {
                return Err(self.error(format!("Invalid numeric suffix '_{}'", suffix)));
            }
            _ if fractional => NumberKind::Double,
            _ => NumberKind::Integer,
        };

        if self.peek_char().is_some_and(is_ident_continue) {
            return Err(self.error("Invalid character in numeric literal".into()));
        }

        let text = &self.source[start..self.pos];
        Ok((TokenKind::Number(kind), Some(self.string_storage.intern(text))))
    }

    // String and character lexing

    fn lex_string(&mut self) -> Result<(TokenKind, Option<StringId>), LexError> {
        if self.peek_char_nth(1) == Some('"') && self.peek_char_nth(2) == Some('"') {
            return self.lex_multiline_string();
        }

        let start = self.pos;
        self.consume_char(); // opening quote
        let mut content = String::new();

        loop {
            match self.peek_char() {
                None => return Err(self.error("Unterminated string literal".into())),
                Some('\n') => return Err(self.error("Newline in string literal".into())),
                Some('"') => {
                    self.consume_char();
                    break;
                }
                Some('\\') => content.push(self.lex_escape()?),
                Some(c) => {
                    self.consume_char();
                    content.push(c);
                }
            }
        }

        self.check_string_length(start)?;
        let id = self.string_storage.intern(&content);
        Ok((TokenKind::String(StringKind::Standard), Some(id)))
    }

    fn lex_multiline_string(&mut self) -> Result<(TokenKind, Option<StringId>), LexError> {
        let start = self.pos;
        for _ in 0..3 {
            self.consume_char();
        }
        let content_start = self.pos;

        loop {
            match self.peek_char() {
                None => return Err(self.error("Unterminated multi-line string".into())),
                Some('"')
                    if self.peek_char_nth(1) == Some('"') && self.peek_char_nth(2) == Some('"') =>
                {
                    let content_end = self.pos;
                    for _ in 0..3 {
                        self.consume_char();
                    }
                    self.check_string_length(start)?;

                    let content = &self.source[content_start..content_end];
                    let id = self.string_storage.intern(content);
                    return Ok((TokenKind::String(StringKind::MultiLine), Some(id)));
                }
                Some(_) => {
                    self.consume_char();
                }
            }
        }
    }

    fn lex_char(&mut self) -> Result<(TokenKind, Option<StringId>), LexError> {
        self.consume_char(); // opening quote

        let value = match self.peek_char() {
            None | Some('\n') => return Err(self.error("Unterminated character literal".into())),
            Some('\'') => return Err(self.error("Empty character literal".into())),
            Some('\\') => self.lex_escape()?,
            Some(c) => {
                self.consume_char();
                c
            }
        };

        if !self.consume_if('\'') {
            return Err(self.error("Character literal must contain exactly one character".into()));
        }

        let mut buf = [0u8; 4];
        let id = self.string_storage.intern(value.encode_utf8(&mut buf));
        Ok((TokenKind::Char, Some(id)))
    }

    fn lex_escape(&mut self) -> Result<char, LexError> {
        self.consume_char(); // backslash
        let escaped = match self.consume_char() {
            Some('n') => '\n',
            Some('t') => '\t',
            Some('r') => '\r',
            Some('b') => '\u{8}',
            Some('f') => '\u{c}',
            Some('0') => '\0',
            Some('"') => '"',
            Some('\'') => '\'',
            Some('\\') => '\\',
            Some(c) => return Err(self.error(format!("Unknown escape sequence '\\{}'", c))),
            None => return Err(self.error("Unterminated escape sequence".into())),
        };
        Ok(escaped)
    }

    fn check_string_length(&self, start: usize) -> Result<(), LexError> {
        let len = self.pos - start;
        if len > self.limits.max_string_length {
            return Err(self.error(format!(
                "String literal too long: {} bytes (max: {} bytes)",
                len, self.limits.max_string_length
            )));
        }
        Ok(())
    }
}

// Helper functions

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

fn keyword(text: &str) -> Option<TokenKind> {
    let kind = match text {
        "module" => TokenKind::Module,
        "import" => TokenKind::Import,
        "function" => TokenKind::Function,
        "local" => TokenKind::Local,
        "augment" => TokenKind::Augment,
        "struct" => TokenKind::Struct,
        "return" => TokenKind::Return,
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "while" => TokenKind::While,
        "for" => TokenKind::For,
        "foreach" => TokenKind::Foreach,
        "in" => TokenKind::In,
        "throw" => TokenKind::Throw,
        "try" => TokenKind::Try,
        "catch" => TokenKind::Catch,
        "finally" => TokenKind::Finally,
        "let" => TokenKind::Let,
        "var" => TokenKind::Var,
        "case" => TokenKind::Case,
        "match" => TokenKind::Match,
        "when" => TokenKind::When,
        "then" => TokenKind::Then,
        "otherwise" => TokenKind::Otherwise,
        "break" => TokenKind::Break,
        "continue" => TokenKind::Continue,
        "null" => TokenKind::Null,
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        "and" => TokenKind::And,
        "or" => TokenKind::Or,
        "not" => TokenKind::Not,
        "is" => TokenKind::Is,
        "isnt" => TokenKind::Isnt,
        "oftype" => TokenKind::Oftype,
        "orIfNull" => TokenKind::OrIfNull,
        _ => return None,
    };
    Some(kind)
}

// Public API

pub fn lex(source: &str, limits: &ParseLimits) -> Result<Tokens, LexError> {
    let mut lexer = Lexer::new(source, limits)?;
    let mut tokens = Vec::new();

    loop {
        let token = lexer.next_token()?;
        let is_eof = token.kind == TokenKind::Eof;
        tokens.push(token);
        if is_eof {
            break;
        }
    }

    Ok(Tokens::new(tokens, lexer.string_storage))
}

// Tests
