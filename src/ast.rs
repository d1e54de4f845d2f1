use bitflags::bitflags;

use crate::span::Span;
use crate::string_storage::{StringId, StringStorage};

// AST stored in a single vector as a first-child/next-sibling tree.
// Only the parser builds it; everything public is read-only.
#[derive(Debug, Clone)]
pub struct Ast {
    nodes: Vec<AstNode>,
    strings: StringStorage,
    root: NodeId,
}

/// Index of a node inside its `Ast`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

bitflags! {
    /// Modifiers of function declarations and function literals
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FunctionFlags: u8 {
        /// `local function`, only visible inside its module
        const LOCAL = 1 << 0;
        /// last parameter collects remaining arguments (`...`)
        const VARARGS = 1 << 1;
        /// body written as `-> expression` instead of a block
        const COMPACT = 1 << 2;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    OrIfNull,
    Or,
    And,
    Equals,
    NotEquals,
    Is,
    IsNot,
    OfType,
    Less,
    LessOrEquals,
    More,
    MoreOrEquals,
    Plus,
    Minus,
    Times,
    Divide,
    Modulo,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::OrIfNull => "orIfNull",
            BinaryOp::Or => "or",
            BinaryOp::And => "and",
            BinaryOp::Equals => "==",
            BinaryOp::NotEquals => "!=",
            BinaryOp::Is => "is",
            BinaryOp::IsNot => "isnt",
            BinaryOp::OfType => "oftype",
            BinaryOp::Less => "<",
            BinaryOp::LessOrEquals => "<=",
            BinaryOp::More => ">",
            BinaryOp::MoreOrEquals => ">=",
            BinaryOp::Plus => "+",
            BinaryOp::Minus => "-",
            BinaryOp::Times => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Not,
    Minus,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Not => "not",
            UnaryOp::Minus => "-",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    Tuple, // [a, b] without prefix
    List,
    Set,
    Vector,
    Array,
    Map,
}

impl CollectionKind {
    /// Collection prefix written before `[`, e.g. `list[1, 2]`
    pub fn from_prefix(name: &str) -> Option<Self> {
        match name {
            "tuple" => Some(CollectionKind::Tuple),
            "list" => Some(CollectionKind::List),
            "set" => Some(CollectionKind::Set),
            "vector" => Some(CollectionKind::Vector),
            "array" => Some(CollectionKind::Array),
            "map" => Some(CollectionKind::Map),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CollectionKind::Tuple => "tuple",
            CollectionKind::List => "list",
            CollectionKind::Set => "set",
            CollectionKind::Vector => "vector",
            CollectionKind::Array => "array",
            CollectionKind::Map => "map",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal {
    Null,
    Boolean(bool),
    Integer(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Char(char),
    String(StringId),
}

// Node kinds of the parse tree. Child layout per kind:
//   Module, Import, Parameter, Member, Reference, FunctionRef, ClassLiteral,
//   Break, Continue, Literal           -> leaves
//   FunctionDeclaration                -> Function
//   Function                           -> Parameter*, (Block | expression)
//   Augmentation                       -> FunctionDeclaration*
//   Struct                             -> Member+
//   Block                              -> statement*
//   LetOrVar, Assignment, Throw        -> expression
//   Return                             -> expression?
//   If                                 -> condition, Block, (Block | If)?
//   While                              -> condition, Block
//   For                                -> LetOrVar, condition, statement, Block
//   ForEach                            -> iterable, Block
//   Try                                -> Block, Catch?, Finally?
//   Catch, Finally                     -> Block
//   Case                               -> When+, Otherwise
//   Match                              -> When+, Otherwise
//   When                               -> condition, (Block | expression)
//   Otherwise                          -> Block | expression
//   Binary                             -> left, right
//   Unary                              -> operand
//   FunctionInvocation                 -> argument*
//   MethodInvocation                   -> receiver, argument*
//   AnonymousCall                      -> callee, argument*
//   Collection                         -> element*
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeKind {
    CompilationUnit,
    Module { name: StringId },
    Import { name: StringId },
    FunctionDeclaration { name: StringId, flags: FunctionFlags },
    Function { flags: FunctionFlags },
    Parameter { name: StringId },
    Augmentation { target: StringId },
    Struct { name: StringId },
    Member { name: StringId },

    // Statements
    Block,
    LetOrVar { name: StringId, mutable: bool },
    Assignment { name: StringId },
    Return,
    Throw,
    If,
    While,
    For,
    ForEach { variable: StringId },
    Try,
    Catch { variable: StringId },
    Finally,
    Case,
    When,
    Otherwise,
    Break,
    Continue,

    // Expressions
    Match,
    Binary(BinaryOp),
    Unary(UnaryOp),
    FunctionInvocation { name: StringId },
    MethodInvocation { name: StringId },
    AnonymousCall,
    Reference { name: StringId },
    FunctionRef { name: StringId },
    ClassLiteral { name: StringId },
    Collection(CollectionKind),
    Literal(Literal),
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::CompilationUnit => "CompilationUnit",
            NodeKind::Module { .. } => "Module",
            NodeKind::Import { .. } => "Import",
            NodeKind::FunctionDeclaration { .. } => "FunctionDeclaration",
            NodeKind::Function { .. } => "Function",
            NodeKind::Parameter { .. } => "Parameter",
            NodeKind::Augmentation { .. } => "Augmentation",
            NodeKind::Struct { .. } => "Struct",
            NodeKind::Member { .. } => "Member",
            NodeKind::Block => "Block",
            NodeKind::LetOrVar { mutable: false, .. } => "Let",
            NodeKind::LetOrVar { mutable: true, .. } => "Var",
            NodeKind::Assignment { .. } => "Assignment",
            NodeKind::Return => "Return",
            NodeKind::Throw => "Throw",
            NodeKind::If => "If",
            NodeKind::While => "While",
            NodeKind::For => "For",
            NodeKind::ForEach { .. } => "ForEach",
            NodeKind::Try => "Try",
            NodeKind::Catch { .. } => "Catch",
            NodeKind::Finally => "Finally",
            NodeKind::Case => "Case",
            NodeKind::When => "When",
            NodeKind::Otherwise => "Otherwise",
            NodeKind::Break => "Break",
            NodeKind::Continue => "Continue",
            NodeKind::Match => "Match",
            NodeKind::Binary(_) => "Binary",
            NodeKind::Unary(_) => "Unary",
            NodeKind::FunctionInvocation { .. } => "FunctionInvocation",
            NodeKind::MethodInvocation { .. } => "MethodInvocation",
            NodeKind::AnonymousCall => "AnonymousCall",
            NodeKind::Reference { .. } => "Reference",
            NodeKind::FunctionRef { .. } => "FunctionRef",
            NodeKind::ClassLiteral { .. } => "ClassLiteral",
            NodeKind::Collection(_) => "Collection",
            NodeKind::Literal(_) => "Literal",
        }
    }

    /// The identifier or qualified name a node carries, if any
    pub fn name_id(&self) -> Option<StringId> {
        match *self {
            NodeKind::Module { name }
            | NodeKind::Import { name }
            | NodeKind::FunctionDeclaration { name, .. }
            | NodeKind::Parameter { name }
            | NodeKind::Struct { name }
            | NodeKind::Member { name }
            | NodeKind::LetOrVar { name, .. }
            | NodeKind::Assignment { name }
            | NodeKind::FunctionInvocation { name }
            | NodeKind::MethodInvocation { name }
            | NodeKind::Reference { name }
            | NodeKind::FunctionRef { name }
            | NodeKind::ClassLiteral { name } => Some(name),
            NodeKind::Augmentation { target } => Some(target),
            NodeKind::ForEach { variable } | NodeKind::Catch { variable } => Some(variable),
            _ => None,
        }
    }
}

// One node of the tree with its links
#[derive(Debug, Clone)]
pub struct AstNode {
    kind: NodeKind,
    span: Span,
    parent: Option<NodeId>,
    first_child: Option<NodeId>,
    last_child: Option<NodeId>,
    next_sibling: Option<NodeId>,
}

impl AstNode {
    fn new(kind: NodeKind, span: Span) -> Self {
        Self {
            kind,
            span,
            parent: None,
            first_child: None,
            last_child: None,
            next_sibling: None,
        }
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn first_child(&self) -> Option<NodeId> {
        self.first_child
    }

    pub fn next_sibling(&self) -> Option<NodeId> {
        self.next_sibling
    }
}

/// Whether a visitor wants to descend into the children of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Walk {
    Continue,
    SkipChildren,
}

/// Pre-order traversal callbacks, see `Ast::accept`
pub trait Visitor {
    fn enter(&mut self, ast: &Ast, id: NodeId) -> Walk;

    fn leave(&mut self, _ast: &Ast, _id: NodeId) {}
}

impl Ast {
    // Building (parser only)

    pub(crate) fn new(strings: StringStorage, root_span: Span) -> Self {
        Self {
            nodes: vec![AstNode::new(NodeKind::CompilationUnit, root_span)],
            strings,
            root: NodeId(0),
        }
    }

    pub(crate) fn add_node(&mut self, kind: NodeKind, span: Span) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(AstNode::new(kind, span));
        id
    }

    /// Link `child` as the last child of `parent`
    pub(crate) fn add_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child.index()].parent = Some(parent);

        match self.nodes[parent.index()].last_child {
            Some(last) => self.nodes[last.index()].next_sibling = Some(child),
            None => self.nodes[parent.index()].first_child = Some(child),
        }
        self.nodes[parent.index()].last_child = Some(child);
    }

    pub(crate) fn set_span(&mut self, id: NodeId, span: Span) {
        self.nodes[id.index()].span = span;
    }

    pub(crate) fn set_kind(&mut self, id: NodeId, kind: NodeKind) {
        self.nodes[id.index()].kind = kind;
    }

    pub(crate) fn intern(&mut self, text: &str) -> StringId {
        self.strings.intern(text)
    }

    // Read access

    /// The CompilationUnit node
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &AstNode {
        &self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.nodes[id.index()].span
    }

    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            ast: self,
            next: self.nodes[id.index()].first_child,
        }
    }

    /// Name carried by the node (identifier, qualified name) if any
    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.kind(id).name_id().map(|name| self.strings.resolve(name))
    }

    pub fn resolve(&self, id: StringId) -> &str {
        self.strings.resolve(id)
    }

    pub fn strings(&self) -> &StringStorage {
        &self.strings
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Walk the subtree rooted at `id` in pre-order.
    ///
    /// Operator and method chains can nest far deeper than the grammar
    /// recursion limit, so the walk keeps its own stack of
    /// `(node, entered)` frames instead of recursing.
    pub fn accept<V: Visitor + ?Sized>(&self, id: NodeId, visitor: &mut V) {
        let mut stack = vec![(id, false)];

        while let Some((current, entered)) = stack.pop() {
            if entered {
                visitor.leave(self, current);
                continue;
            }

            stack.push((current, true));
            if visitor.enter(self, current) == Walk::Continue {
                // Reversed so the first child is popped next
                let mark = stack.len();
                stack.extend(self.children(current).map(|child| (child, false)));
                stack[mark..].reverse();
            }
        }
    }
}

/// Iterator over the direct children of a node, in source order
#[derive(Debug, Clone)]
pub struct Children<'a> {
    ast: &'a Ast,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.ast.node(current).next_sibling();
        Some(current)
    }
}
