//! Structural dump of an AST subtree.
//!
//! Each node becomes one line: the caller's prefix, two spaces of
//! indentation per depth level, the node kind and its salient data.
//! The output only depends on the tree, never on the environment.

use std::fmt::{self, Write as _};
use std::io;

use serde::Deserialize;

use crate::ast::{Ast, FunctionFlags, Literal, NodeId, NodeKind};

/// How `Ast::dump` renders lines
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DumpOptions {
    /// Marker written at the start of every line
    pub prefix: String,
    /// Spaces per depth level
    pub indent: usize,
    /// Append `@line:col-line:col` to every line
    pub show_spans: bool,
}

impl Default for DumpOptions {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            indent: 2,
            show_spans: false,
        }
    }
}

impl DumpOptions {
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Self::default()
        }
    }

    pub fn spans(mut self, show: bool) -> Self {
        self.show_spans = show;
        self
    }
}

/// Lazy pre-order sequence of dump lines; clone it to restart
#[derive(Debug, Clone)]
pub struct DumpLines<'a> {
    ast: &'a Ast,
    options: &'a DumpOptions,
    stack: Vec<(NodeId, usize)>,
}

impl Iterator for DumpLines<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let (id, depth) = self.stack.pop()?;

        // Push children reversed so the first child is popped next
        let mark = self.stack.len();
        self.stack.extend(self.ast.children(id).map(|child| (child, depth + 1)));
        self.stack[mark..].reverse();

        Some(self.render(id, depth))
    }
}

impl DumpLines<'_> {
    fn render(&self, id: NodeId, depth: usize) -> String {
        let mut line = String::with_capacity(self.options.prefix.len() + 32);
        line.push_str(&self.options.prefix);
        line.extend(std::iter::repeat_n(' ', depth * self.options.indent));

        let kind = self.ast.kind(id);
        line.push_str(kind.name());
        // Writing into a String cannot fail
        let _ = write_details(&mut line, self.ast, kind);

        if self.options.show_spans {
            let _ = write!(line, " @{}", self.ast.span(id));
        }
        line
    }
}

fn write_details(out: &mut String, ast: &Ast, kind: &NodeKind) -> fmt::Result {
    if let Some(name) = kind.name_id() {
        write!(out, " '{}'", ast.resolve(name))?;
    }

    match *kind {
        NodeKind::FunctionDeclaration { flags, .. } | NodeKind::Function { flags } => {
            write_flags(out, flags)
        }
        NodeKind::Binary(op) => write!(out, " {}", op.symbol()),
        NodeKind::Unary(op) => write!(out, " {}", op.symbol()),
        NodeKind::Collection(collection) => write!(out, " {}", collection.name()),
        NodeKind::Literal(literal) => match literal {
            Literal::Null => out.write_str(" null"),
            Literal::Boolean(value) => write!(out, " {}", value),
            Literal::Integer(value) => write!(out, " {}", value),
            Literal::Long(value) => write!(out, " {}_L", value),
            Literal::Float(value) => write!(out, " {:?}_F", value),
            Literal::Double(value) => write!(out, " {:?}", value),
            Literal::Char(value) => write!(out, " {:?}", value),
            Literal::String(id) => write!(out, " {:?}", ast.resolve(id)),
        },
        _ => Ok(()),
    }
}

fn write_flags(out: &mut String, flags: FunctionFlags) -> fmt::Result {
    if flags.is_empty() {
        return Ok(());
    }

    let names: Vec<&str> = [
        (FunctionFlags::LOCAL, "local"),
        (FunctionFlags::VARARGS, "varargs"),
        (FunctionFlags::COMPACT, "compact"),
    ]
    .into_iter()
    .filter(|(flag, _)| flags.contains(*flag))
    .map(|(_, name)| name)
    .collect();

    write!(out, " [{}]", names.join(", "))
}

impl Ast {
    /// Dump the subtree rooted at `id`
    pub fn dump<'a>(&'a self, id: NodeId, options: &'a DumpOptions) -> DumpLines<'a> {
        DumpLines {
            ast: self,
            options,
            stack: vec![(id, 0)],
        }
    }

    /// Write the dump of `id` to `sink`, one line per node
    pub fn write_dump<W: io::Write>(
        &self,
        id: NodeId,
        options: &DumpOptions,
        sink: &mut W,
    ) -> io::Result<()> {
        for line in self.dump(id, options) {
            writeln!(sink, "{}", line)?;
        }
        Ok(())
    }
}

impl fmt::Display for Ast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let options = DumpOptions::default();
        for line in self.dump(self.root(), &options) {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}
