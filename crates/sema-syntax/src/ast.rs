//! Arena-allocated syntax tree.
//!
//! Every node of every file in a [`SourceSet`](crate::SourceSet) lives in one
//! [`NodeArena`] and is addressed by a global [`NodeIndex`]. The tree is
//! immutable once a file is parsed; the resolution core only reads it.
//!
//! Optional children use [`NodeIndex::NONE`] instead of `Option<NodeIndex>`,
//! which keeps node payloads `Copy`-friendly and mirrors how the tree is
//! walked: `if idx.is_some() { ... }`.

use bitflags::bitflags;
use sema_common::{Atom, FileId, Span};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeIndex(pub u32);

impl NodeIndex {
    pub const NONE: NodeIndex = NodeIndex(u32::MAX);

    #[inline]
    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    #[inline]
    pub fn is_some(self) -> bool {
        self != Self::NONE
    }

    #[inline]
    pub fn to_option(self) -> Option<NodeIndex> {
        self.is_some().then_some(self)
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Modifiers: u16 {
        const OPEN = 1 << 0;
        const ABSTRACT = 1 << 1;
        const OVERRIDE = 1 << 2;
        const PRIVATE = 1 << 3;
        /// Signature comes from a foreign platform without nullability info.
        const PLATFORM = 1 << 4;
    }
}

/// Where the declarations of a file come from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Origin {
    Source,
    /// Foreign declarations: type mentions without `?` become flexible.
    Platform,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ClassKind {
    Class,
    Interface,
}

/// Declaration-site variance of a type parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Variance {
    Invariant,
    In,
    Out,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Eq,
    NotEq,
    And,
    Or,
}

impl BinaryOp {
    /// Name of the convention member an operator desugars to, if any.
    pub fn convention_name(self) -> Option<&'static str> {
        match self {
            BinaryOp::Add => Some("plus"),
            BinaryOp::Sub => Some("minus"),
            BinaryOp::Mul => Some("times"),
            BinaryOp::Div => Some("div"),
            BinaryOp::Rem => Some("rem"),
            BinaryOp::Lt | BinaryOp::Gt | BinaryOp::LtEq | BinaryOp::GtEq => Some("compareTo"),
            BinaryOp::Eq | BinaryOp::NotEq | BinaryOp::And | BinaryOp::Or => None,
        }
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Lt | BinaryOp::Gt | BinaryOp::LtEq | BinaryOp::GtEq
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum UnaryOp {
    Not,
    Minus,
}

impl UnaryOp {
    pub fn convention_name(self) -> &'static str {
        match self {
            UnaryOp::Not => "not",
            UnaryOp::Minus => "unaryMinus",
        }
    }
}

// =============================================================================
// Node payloads
// =============================================================================

#[derive(Clone, Debug)]
pub struct SourceFileData {
    pub package: Vec<Atom>,
    pub imports: Vec<NodeIndex>,
    pub declarations: Vec<NodeIndex>,
}

#[derive(Clone, Debug)]
pub struct ImportData {
    pub path: Vec<Atom>,
    /// `import a.b.*`
    pub all_under: bool,
    /// `import a.b.C as D`
    pub alias: Atom,
}

impl ImportData {
    /// The simple name this import introduces (`D` for `as D`, else the last segment).
    pub fn imported_name(&self) -> Atom {
        if !self.alias.is_none() {
            self.alias
        } else {
            self.path.last().copied().unwrap_or(Atom::NONE)
        }
    }
}

#[derive(Clone, Debug)]
pub struct ClassData {
    pub name: Atom,
    pub name_span: Span,
    pub kind: ClassKind,
    pub modifiers: Modifiers,
    pub type_params: Vec<NodeIndex>,
    pub has_primary_constructor: bool,
    /// `Parameter` nodes of the primary constructor.
    pub constructor_params: Vec<NodeIndex>,
    /// Type mentions of the supertype list.
    pub supertypes: Vec<NodeIndex>,
    /// Arguments of the superclass constructor call, e.g. `: Base(1)`.
    pub super_call_args: Vec<NodeIndex>,
    pub members: Vec<NodeIndex>,
}

#[derive(Clone, Debug)]
pub struct FunctionData {
    pub name: Atom,
    pub name_span: Span,
    pub modifiers: Modifiers,
    pub type_params: Vec<NodeIndex>,
    /// Extension receiver type mention.
    pub receiver: NodeIndex,
    pub params: Vec<NodeIndex>,
    pub return_type: NodeIndex,
    pub body: NodeIndex,
    /// `fun f() = expr` rather than `fun f() { ... }`.
    pub expression_body: bool,
}

#[derive(Clone, Debug)]
pub struct PropertyData {
    pub name: Atom,
    pub name_span: Span,
    pub modifiers: Modifiers,
    pub mutable: bool,
    pub type_ref: NodeIndex,
    pub initializer: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct TypeAliasData {
    pub name: Atom,
    pub name_span: Span,
    pub modifiers: Modifiers,
    pub type_params: Vec<NodeIndex>,
    pub aliased: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct TypeParameterData {
    pub name: Atom,
    pub variance: Variance,
    pub bound: NodeIndex,
}

/// A value parameter of a function, constructor, lambda or `for` loop.
#[derive(Clone, Debug)]
pub struct ParameterData {
    pub name: Atom,
    pub type_ref: NodeIndex,
    pub default: NodeIndex,
    pub vararg: bool,
    /// `Some(mutable)` for `val`/`var` primary constructor parameters.
    pub property: Option<bool>,
}

#[derive(Clone, Debug)]
pub struct TypeReferenceData {
    pub path: Vec<Atom>,
    pub args: Vec<NodeIndex>,
    pub nullable: bool,
}

#[derive(Clone, Debug)]
pub struct FunctionTypeData {
    pub params: Vec<NodeIndex>,
    pub return_type: NodeIndex,
    pub nullable: bool,
}

#[derive(Clone, Debug)]
pub struct CallData {
    /// Explicit receiver, `NONE` for `f(x)`.
    pub receiver: NodeIndex,
    pub safe: bool,
    pub callee: Atom,
    pub callee_span: Span,
    pub type_args: Vec<NodeIndex>,
    /// Positional arguments; a trailing lambda is the last one.
    pub args: Vec<NodeIndex>,
}

#[derive(Clone, Debug)]
pub struct MemberAccessData {
    pub receiver: NodeIndex,
    pub safe: bool,
    pub name: Atom,
    pub name_span: Span,
}

#[derive(Clone, Debug)]
pub struct BinaryData {
    pub op: BinaryOp,
    pub lhs: NodeIndex,
    pub rhs: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct UnaryData {
    pub op: UnaryOp,
    pub operand: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct IfData {
    pub condition: NodeIndex,
    pub then_branch: NodeIndex,
    pub else_branch: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct BlockData {
    pub statements: Vec<NodeIndex>,
}

#[derive(Clone, Debug)]
pub struct LambdaData {
    /// Declared parameters; empty means implicit `it` may apply.
    pub params: Vec<NodeIndex>,
    pub body: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct IsCheckData {
    pub expr: NodeIndex,
    pub type_ref: NodeIndex,
    pub negated: bool,
}

#[derive(Clone, Debug)]
pub struct CastData {
    pub expr: NodeIndex,
    pub type_ref: NodeIndex,
    pub safe: bool,
}

#[derive(Clone, Debug)]
pub struct ElvisData {
    pub lhs: NodeIndex,
    pub rhs: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct AssignmentData {
    pub target: NodeIndex,
    pub value: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct ReturnData {
    pub value: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct WhileData {
    pub condition: NodeIndex,
    pub body: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct ForData {
    /// `Parameter` node for the loop variable.
    pub variable: NodeIndex,
    pub iterable: NodeIndex,
    pub body: NodeIndex,
}

#[derive(Clone, Debug)]
pub enum NodeKind {
    SourceFile(SourceFileData),
    Import(ImportData),
    // Declarations
    Class(ClassData),
    Function(FunctionData),
    Property(PropertyData),
    TypeAlias(TypeAliasData),
    TypeParameter(TypeParameterData),
    Parameter(ParameterData),
    // Type mentions
    TypeReference(TypeReferenceData),
    FunctionType(FunctionTypeData),
    DynamicType,
    // Expressions
    IntLiteral(i64),
    LongLiteral(i64),
    DoubleLiteral(f64),
    StringLiteral(Atom),
    BooleanLiteral(bool),
    NullLiteral,
    This,
    Name(Atom),
    Call(CallData),
    MemberAccess(MemberAccessData),
    Binary(BinaryData),
    Unary(UnaryData),
    If(IfData),
    Block(BlockData),
    Lambda(LambdaData),
    IsCheck(IsCheckData),
    Cast(CastData),
    Elvis(ElvisData),
    // Statements
    Assignment(AssignmentData),
    Return(ReturnData),
    While(WhileData),
    For(ForData),
}

impl NodeKind {
    pub fn is_declaration(&self) -> bool {
        matches!(
            self,
            NodeKind::Class(_)
                | NodeKind::Function(_)
                | NodeKind::Property(_)
                | NodeKind::TypeAlias(_)
                | NodeKind::TypeParameter(_)
                | NodeKind::Parameter(_)
        )
    }

    pub fn is_type_mention(&self) -> bool {
        matches!(
            self,
            NodeKind::TypeReference(_) | NodeKind::FunctionType(_) | NodeKind::DynamicType
        )
    }

    /// Short name of the node kind for error messages.
    pub fn describe(&self) -> &'static str {
        match self {
            NodeKind::SourceFile(_) => "source file",
            NodeKind::Import(_) => "import",
            NodeKind::Class(_) => "class",
            NodeKind::Function(_) => "function",
            NodeKind::Property(_) => "property",
            NodeKind::TypeAlias(_) => "type alias",
            NodeKind::TypeParameter(_) => "type parameter",
            NodeKind::Parameter(_) => "parameter",
            NodeKind::TypeReference(_) | NodeKind::FunctionType(_) | NodeKind::DynamicType => {
                "type mention"
            }
            NodeKind::Assignment(_)
            | NodeKind::Return(_)
            | NodeKind::While(_)
            | NodeKind::For(_) => "statement",
            _ => "expression",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
    pub file: FileId,
    pub parent: NodeIndex,
}

/// Storage for all nodes of a source set.
#[derive(Default)]
pub struct NodeArena {
    nodes: Vec<Node>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn alloc(&mut self, kind: NodeKind, span: Span, file: FileId) -> NodeIndex {
        let idx = NodeIndex(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            span,
            file,
            parent: NodeIndex::NONE,
        });
        idx
    }

    /// Drop nodes allocated by an abandoned speculative parse.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.nodes.truncate(len);
    }

    pub(crate) fn set_parent(&mut self, child: NodeIndex, parent: NodeIndex) {
        if let Some(node) = self.nodes.get_mut(child.0 as usize) {
            node.parent = parent;
        }
    }

    #[inline]
    pub fn get(&self, idx: NodeIndex) -> Option<&Node> {
        self.nodes.get(idx.0 as usize)
    }

    #[inline]
    pub fn kind(&self, idx: NodeIndex) -> Option<&NodeKind> {
        self.get(idx).map(|n| &n.kind)
    }

    #[inline]
    pub fn span(&self, idx: NodeIndex) -> Span {
        self.get(idx).map(|n| n.span).unwrap_or(Span::DUMMY)
    }

    #[inline]
    pub fn parent(&self, idx: NodeIndex) -> NodeIndex {
        self.get(idx).map(|n| n.parent).unwrap_or(NodeIndex::NONE)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Declared name of a declaration node, `Atom::NONE` for anything else.
    pub fn declaration_name(&self, idx: NodeIndex) -> Atom {
        match self.kind(idx) {
            Some(NodeKind::Class(c)) => c.name,
            Some(NodeKind::Function(f)) => f.name,
            Some(NodeKind::Property(p)) => p.name,
            Some(NodeKind::TypeAlias(a)) => a.name,
            Some(NodeKind::TypeParameter(t)) => t.name,
            Some(NodeKind::Parameter(p)) => p.name,
            _ => Atom::NONE,
        }
    }

    /// Span best suited to point at a declaration: its name when known.
    pub fn name_span(&self, idx: NodeIndex) -> Span {
        match self.kind(idx) {
            Some(NodeKind::Class(c)) => c.name_span,
            Some(NodeKind::Function(f)) => f.name_span,
            Some(NodeKind::Property(p)) => p.name_span,
            Some(NodeKind::TypeAlias(a)) => a.name_span,
            Some(NodeKind::Call(c)) => c.callee_span,
            Some(NodeKind::MemberAccess(m)) => m.name_span,
            _ => self.span(idx),
        }
    }

    /// Direct children in source order.
    pub fn children(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let Some(kind) = self.kind(idx) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        let mut push = |n: NodeIndex| {
            if n.is_some() {
                out.push(n);
            }
        };
        match kind {
            NodeKind::SourceFile(f) => {
                f.imports.iter().copied().for_each(&mut push);
                f.declarations.iter().copied().for_each(&mut push);
            }
            NodeKind::Class(c) => {
                c.type_params.iter().copied().for_each(&mut push);
                c.constructor_params.iter().copied().for_each(&mut push);
                c.supertypes.iter().copied().for_each(&mut push);
                c.super_call_args.iter().copied().for_each(&mut push);
                c.members.iter().copied().for_each(&mut push);
            }
            NodeKind::Function(f) => {
                f.type_params.iter().copied().for_each(&mut push);
                push(f.receiver);
                f.params.iter().copied().for_each(&mut push);
                push(f.return_type);
                push(f.body);
            }
            NodeKind::Property(p) => {
                push(p.type_ref);
                push(p.initializer);
            }
            NodeKind::TypeAlias(a) => {
                a.type_params.iter().copied().for_each(&mut push);
                push(a.aliased);
            }
            NodeKind::TypeParameter(t) => push(t.bound),
            NodeKind::Parameter(p) => {
                push(p.type_ref);
                push(p.default);
            }
            NodeKind::TypeReference(t) => t.args.iter().copied().for_each(&mut push),
            NodeKind::FunctionType(t) => {
                t.params.iter().copied().for_each(&mut push);
                push(t.return_type);
            }
            NodeKind::Call(c) => {
                push(c.receiver);
                c.type_args.iter().copied().for_each(&mut push);
                c.args.iter().copied().for_each(&mut push);
            }
            NodeKind::MemberAccess(m) => push(m.receiver),
            NodeKind::Binary(b) => {
                push(b.lhs);
                push(b.rhs);
            }
            NodeKind::Unary(u) => push(u.operand),
            NodeKind::If(i) => {
                push(i.condition);
                push(i.then_branch);
                push(i.else_branch);
            }
            NodeKind::Block(b) => b.statements.iter().copied().for_each(&mut push),
            NodeKind::Lambda(l) => {
                l.params.iter().copied().for_each(&mut push);
                push(l.body);
            }
            NodeKind::IsCheck(i) => {
                push(i.expr);
                push(i.type_ref);
            }
            NodeKind::Cast(c) => {
                push(c.expr);
                push(c.type_ref);
            }
            NodeKind::Elvis(e) => {
                push(e.lhs);
                push(e.rhs);
            }
            NodeKind::Assignment(a) => {
                push(a.target);
                push(a.value);
            }
            NodeKind::Return(r) => push(r.value),
            NodeKind::While(w) => {
                push(w.condition);
                push(w.body);
            }
            NodeKind::For(f) => {
                push(f.variable);
                push(f.iterable);
                push(f.body);
            }
            NodeKind::Import(_)
            | NodeKind::DynamicType
            | NodeKind::IntLiteral(_)
            | NodeKind::LongLiteral(_)
            | NodeKind::DoubleLiteral(_)
            | NodeKind::StringLiteral(_)
            | NodeKind::BooleanLiteral(_)
            | NodeKind::NullLiteral
            | NodeKind::This
            | NodeKind::Name(_) => {}
        }
        out
    }

    /// All nodes of the subtree rooted at `idx`, pre-order.
    pub fn descendants(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut out = Vec::new();
        let mut stack = vec![idx];
        while let Some(next) = stack.pop() {
            out.push(next);
            let mut children = self.children(next);
            children.reverse();
            stack.extend(children);
        }
        out
    }

    /// Ancestors of `idx`, nearest first, excluding `idx` itself.
    pub fn ancestors(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        let mut current = self.parent(idx);
        std::iter::from_fn(move || {
            let next = current.to_option()?;
            current = self.parent(next);
            Some(next)
        })
    }
}
