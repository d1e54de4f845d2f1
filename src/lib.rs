//! Parser for the Golo language.
//!
//! Source text goes through the lexer into a token stream, the
//! recursive-descent parser turns that into an [`ast::Ast`], and
//! [`dump`] renders a tree as indented text lines.
//!
//! ```
//! use golo_parser::{parse_source, DumpOptions};
//!
//! let ast = parse_source("module hello\n").unwrap();
//! let options = DumpOptions::with_prefix("% ");
//! let lines: Vec<String> = ast.dump(ast.root(), &options).collect();
//! assert_eq!(lines, vec!["% CompilationUnit", "%   Module 'hello'"]);
//! ```

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub mod ast;
pub mod batch;
pub mod config;
pub mod dump;
pub mod lexer;
pub mod limits;
pub mod parser;
pub mod span;
pub mod string_storage;

pub use ast::{Ast, NodeId, NodeKind, Visitor, Walk};
pub use config::{Config, ConfigError};
pub use dump::DumpOptions;
pub use limits::ParseLimits;
pub use parser::{ParseError, ParseErrorKind, parse, parse_source, parse_source_with_limits};

/// Failures of file-level operations: reading, walking, parsing, configuring
#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to walk '{}': {source}", .path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("{}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },
    #[error("Failed to start parser thread: {0}")]
    Spawn(#[source] io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
