// Parser safety limits
//
// Bounds the work a single parse may do so pathological input fails with a
// positioned error instead of exhausting the stack or memory:
// - nesting depth of grammar rules (recursion guard)
// - size of the input, the token stream and the produced tree
// - length of identifiers, string literals and comments
//
// Defaults are permissive; a `[limits]` table in golo.toml overrides them.

use serde::Deserialize;
use thiserror::Error;

/// Resource limits shared by the lexer and the parser
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLimits {
    // Lexer limits
    pub max_input_size: usize,        // bytes
    pub max_token_count: usize,       // tokens per file, Eof included
    pub max_identifier_length: usize, // bytes
    pub max_string_length: usize,     // bytes, delimiters included
    pub max_comment_length: usize,    // bytes

    // Parser limits
    pub max_nesting_depth: usize, // grammar rule recursion depth

    // AST limits
    pub max_ast_nodes: usize,
}

impl Default for ParseLimits {
    fn default() -> Self {
        Self {
            max_input_size: 10_000_000, // 10 MB
            max_token_count: 1_000_000,
            max_identifier_length: 1_000,
            max_string_length: 10_000_000, // 10 MB
            max_comment_length: 100_000,
            max_nesting_depth: 256,
            max_ast_nodes: 1_000_000,
        }
    }
}

/// Largest accepted `max_nesting_depth`
pub const MAX_NESTING_DEPTH: usize = 4_096;

// Upper bound on the stack one grammar rule frame needs, unoptimized builds included
const STACK_BYTES_PER_LEVEL: usize = 4 * 1024;
const STACK_BASE_BYTES: usize = 1024 * 1024;

impl ParseLimits {
    /// Builder-style override of the nesting depth, mostly for tests
    pub fn with_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    /// Check that every limit is positive and not absurdly large
    pub fn validate(&self) -> Result<(), LimitError> {
        const MAX_REASONABLE: usize = 100_000_000; // 100 MB

        check("max_input_size", self.max_input_size, MAX_REASONABLE)?;
        check("max_token_count", self.max_token_count, MAX_REASONABLE)?;
        check("max_identifier_length", self.max_identifier_length, 100_000)?;
        check("max_string_length", self.max_string_length, MAX_REASONABLE)?;
        check("max_comment_length", self.max_comment_length, MAX_REASONABLE)?;
        check("max_nesting_depth", self.max_nesting_depth, MAX_NESTING_DEPTH)?;
        check("max_ast_nodes", self.max_ast_nodes, 10_000_000)?;
        Ok(())
    }

    /// Stack a thread needs to parse up to `max_nesting_depth` without overflowing
    pub fn stack_size(&self) -> usize {
        STACK_BASE_BYTES + self.max_nesting_depth * STACK_BYTES_PER_LEVEL
    }
}

fn check(name: &'static str, value: usize, max: usize) -> Result<(), LimitError> {
    if value == 0 || value > max {
        return Err(LimitError { name, value, max });
    }
    Ok(())
}

/// Partial `[limits]` table: only the keys present override the defaults
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct LimitsTable {
    max_input_size: Option<usize>,
    max_token_count: Option<usize>,
    max_identifier_length: Option<usize>,
    max_string_length: Option<usize>,
    max_comment_length: Option<usize>,
    max_nesting_depth: Option<usize>,
    max_ast_nodes: Option<usize>,
}

impl LimitsTable {
    pub(crate) fn apply(self, limits: &mut ParseLimits) {
        let overrides = [
            (self.max_input_size, &mut limits.max_input_size),
            (self.max_token_count, &mut limits.max_token_count),
            (self.max_identifier_length, &mut limits.max_identifier_length),
            (self.max_string_length, &mut limits.max_string_length),
            (self.max_comment_length, &mut limits.max_comment_length),
            (self.max_nesting_depth, &mut limits.max_nesting_depth),
            (self.max_ast_nodes, &mut limits.max_ast_nodes),
        ];

        for (value, slot) in overrides {
            if let Some(v) = value {
                *slot = v;
            }
        }
    }
}

/// A limit outside its accepted range
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid limit '{name}': {value} (must be between 1 and {max})")]
pub struct LimitError {
    pub name: &'static str,
    pub value: usize,
    pub max: usize,
}
