//! Shared state of one resolve session.
//!
//! `ResolveContext` is the single cohesive type behind every component of
//! the core. Its methods are split across modules by concern (scopes,
//! type references, declarations, members, calls, expressions) the way one
//! large checker state is split across files. All state is behind `Cell`
//! and `RefCell` so every component works through `&self`: resolution is
//! re-entrant (typing a body may resolve another declaration, which may type
//! another body) and the borrow of any table is never held across such a
//! call.

use crate::calls::checkers::CallChecker;
use crate::cancel::CancellationToken;
use crate::descriptors::{
    ClassDescriptor, Descriptor, FunctionDescriptor, TypeAliasDescriptor,
    TypeParameterDescriptor, ValueParameterDescriptor,
};
use crate::error::{ResolveError, ResolveResult};
use crate::for_loop::ForLoopConventionChecker;
use crate::members::MemberIndex;
use crate::memo::MemoTable;
use crate::options::ResolveOptions;
use crate::scope::{Scope, ScopeKey};
use crate::trace::{BindingTrace, CallRole, ResolvedCall};
use rustc_hash::FxHashMap;
use sema_common::limits::{STACK_RED_ZONE, STACK_SEGMENT_SIZE};
use sema_common::{Atom, DefId, Diagnostic, DiagnosticKind, Span};
use sema_syntax::{NodeIndex, NodeKind, SourceSet};
use sema_types::{SubtypeChecker, TypeFormatter, TypeId, TypeInterner};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Lazy cells chained off descriptors.
pub(crate) struct LazyCells {
    pub descriptors: MemoTable<NodeIndex, Descriptor>,
    pub constructors: MemoTable<DefId, Option<Rc<FunctionDescriptor>>>,
    pub supertypes: MemoTable<DefId, Rc<Vec<TypeId>>>,
    pub return_types: MemoTable<DefId, TypeId>,
    pub property_types: MemoTable<DefId, TypeId>,
    pub upper_bounds: MemoTable<DefId, TypeId>,
    pub alias_expansions: MemoTable<DefId, TypeId>,
    pub bodies: MemoTable<NodeIndex, ()>,
    pub scopes: MemoTable<ScopeKey, Option<Rc<Scope>>>,
    pub members: MemoTable<DefId, Option<Rc<MemberIndex>>>,
    pub implicit_parameters: MemoTable<NodeIndex, Option<Rc<ValueParameterDescriptor>>>,
}

impl LazyCells {
    fn new() -> Self {
        LazyCells {
            descriptors: MemoTable::new("descriptors"),
            constructors: MemoTable::new("constructors"),
            supertypes: MemoTable::new("supertypes"),
            return_types: MemoTable::new("return_types"),
            property_types: MemoTable::new("property_types"),
            upper_bounds: MemoTable::new("upper_bounds"),
            alias_expansions: MemoTable::new("alias_expansions"),
            bodies: MemoTable::new("bodies"),
            scopes: MemoTable::new("scopes"),
            members: MemoTable::new("members"),
            implicit_parameters: MemoTable::new("implicit_parameters"),
        }
    }
}

pub struct ResolveContext {
    pub(crate) sources: Rc<SourceSet>,
    pub(crate) types: TypeInterner,
    pub(crate) options: ResolveOptions,
    pub(crate) call_checkers: Vec<Box<dyn CallChecker>>,
    pub(crate) loop_checker: ForLoopConventionChecker,
    pub(crate) trace: RefCell<BindingTrace>,
    pub(crate) cells: LazyCells,
    token: RefCell<CancellationToken>,
    defs: RefCell<FxHashMap<DefId, Descriptor>>,
    next_def: Cell<u32>,
    /// Declarations registered as part of their owner (type parameters,
    /// function parameters).
    node_defs: RefCell<FxHashMap<NodeIndex, DefId>>,
    builtin_classes: RefCell<FxHashMap<&'static str, DefId>>,
    pub(crate) expr_depth: Cell<u32>,
    /// The nesting limit is reported once per session.
    pub(crate) depth_reported: Cell<bool>,
    pub(crate) alias_depth: Cell<u32>,
}

impl ResolveContext {
    pub(crate) fn new(
        sources: Rc<SourceSet>,
        options: ResolveOptions,
        call_checkers: Vec<Box<dyn CallChecker>>,
        loop_checker: ForLoopConventionChecker,
        token: CancellationToken,
    ) -> Self {
        ResolveContext {
            sources,
            types: TypeInterner::new(),
            options,
            call_checkers,
            loop_checker,
            trace: RefCell::new(BindingTrace::new()),
            cells: LazyCells::new(),
            token: RefCell::new(token),
            defs: RefCell::new(FxHashMap::default()),
            next_def: Cell::new(DefId::FIRST_VALID),
            node_defs: RefCell::new(FxHashMap::default()),
            builtin_classes: RefCell::new(FxHashMap::default()),
            expr_depth: Cell::new(0),
            depth_reported: Cell::new(false),
            alias_depth: Cell::new(0),
        }
    }

    // =========================================================================
    // Cancellation
    // =========================================================================

    pub(crate) fn token(&self) -> CancellationToken {
        self.token.borrow().clone()
    }

    pub(crate) fn set_token(&self, token: CancellationToken) {
        *self.token.borrow_mut() = token;
    }

    pub(crate) fn check_cancelled(&self) -> ResolveResult<()> {
        self.token.borrow().check()
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.token.borrow().is_cancelled()
    }

    /// Run a memoized computation. Speculation layers are hidden while it
    /// runs so everything it records lands in the committed trace.
    pub(crate) fn memoized<K, V>(
        &self,
        table: &MemoTable<K, V>,
        key: K,
        compute: impl FnOnce() -> ResolveResult<V>,
        on_recursion: impl FnOnce() -> V,
    ) -> ResolveResult<V>
    where
        K: Copy + Eq + std::hash::Hash + std::fmt::Debug,
        V: Clone,
    {
        let token = self.token();
        table.get_or_compute(key, &token, || self.committed(compute), on_recursion)
    }

    pub(crate) fn memoized_collection<K, V>(
        &self,
        table: &MemoTable<K, V>,
        key: K,
        compute: impl FnOnce() -> ResolveResult<V>,
    ) -> ResolveResult<V>
    where
        K: Copy + Eq + std::hash::Hash + std::fmt::Debug,
        V: Clone + Default,
    {
        let token = self.token();
        table.get_or_default(key, &token, || self.committed(compute))
    }

    /// Declaration-level computations start a fresh expression nesting
    /// count: the depth limit applies to one expression, never to the chain
    /// of declarations that led to it.
    fn committed<V>(&self, compute: impl FnOnce() -> ResolveResult<V>) -> ResolveResult<V> {
        self.trace.borrow_mut().suspend_speculation();
        let outer_depth = self.expr_depth.replace(0);
        let result = stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT_SIZE, compute);
        self.expr_depth.set(outer_depth);
        self.trace.borrow_mut().resume_speculation();
        result
    }

    // =========================================================================
    // Descriptor storage
    // =========================================================================

    pub(crate) fn alloc_def(&self) -> DefId {
        let def = DefId(self.next_def.get());
        self.next_def.set(def.0 + 1);
        def
    }

    pub(crate) fn register(&self, descriptor: Descriptor) {
        self.defs.borrow_mut().insert(descriptor.def(), descriptor);
    }

    pub(crate) fn register_node(&self, node: NodeIndex, def: DefId) {
        self.node_defs.borrow_mut().insert(node, def);
    }

    pub(crate) fn registered_def(&self, node: NodeIndex) -> Option<DefId> {
        self.node_defs.borrow().get(&node).copied()
    }

    pub fn descriptor_by_def(&self, def: DefId) -> Option<Descriptor> {
        self.defs.borrow().get(&def).cloned()
    }

    pub(crate) fn class_by_def(&self, def: DefId) -> Option<Rc<ClassDescriptor>> {
        self.descriptor_by_def(def)?.as_class().cloned()
    }

    pub(crate) fn function_by_def(&self, def: DefId) -> Option<Rc<FunctionDescriptor>> {
        self.descriptor_by_def(def)?.as_function().cloned()
    }

    pub(crate) fn alias_by_def(&self, def: DefId) -> Option<Rc<TypeAliasDescriptor>> {
        self.descriptor_by_def(def)?.as_type_alias().cloned()
    }

    pub(crate) fn type_parameter_by_def(&self, def: DefId) -> Option<Rc<TypeParameterDescriptor>> {
        self.descriptor_by_def(def)?.as_type_parameter().cloned()
    }

    pub(crate) fn builtin_cache(&self) -> &RefCell<FxHashMap<&'static str, DefId>> {
        &self.builtin_classes
    }

    // =========================================================================
    // Syntax access
    // =========================================================================

    pub(crate) fn kind(&self, node: NodeIndex) -> ResolveResult<&NodeKind> {
        self.sources
            .arena()
            .kind(node)
            .ok_or(ResolveError::UnknownNode(node))
    }

    pub(crate) fn span(&self, node: NodeIndex) -> Span {
        self.sources.arena().span(node)
    }

    pub(crate) fn parent(&self, node: NodeIndex) -> NodeIndex {
        self.sources.arena().parent(node)
    }

    pub(crate) fn text(&self, atom: Atom) -> &str {
        self.sources.interner().resolve(atom)
    }

    pub(crate) fn atom(&self, text: &str) -> Option<Atom> {
        self.sources.interner().get(text)
    }

    pub(crate) fn unexpected(&self, node: NodeIndex, expected: &'static str) -> ResolveError {
        ResolveError::UnexpectedNodeKind {
            node,
            expected,
            found: self.kind(node).map(|k| k.describe()).unwrap_or("nothing"),
        }
    }

    // =========================================================================
    // Binding trace
    // =========================================================================

    pub(crate) fn record_type(&self, node: NodeIndex, ty: TypeId) {
        if !self.is_cancelled() {
            self.trace.borrow_mut().record_type(node, ty);
        }
    }

    pub(crate) fn record_reference(&self, node: NodeIndex, def: DefId) {
        if !self.is_cancelled() {
            self.trace.borrow_mut().record_reference(node, def);
        }
    }

    pub(crate) fn record_call(&self, node: NodeIndex, role: CallRole, call: ResolvedCall) {
        if !self.is_cancelled() {
            self.trace.borrow_mut().record_call(node, role, call);
        }
    }

    pub(crate) fn record_variable(&self, node: NodeIndex, ty: TypeId) {
        if !self.is_cancelled() {
            self.trace.borrow_mut().record_variable(node, ty);
        }
    }

    pub(crate) fn report(&self, kind: DiagnosticKind, node: NodeIndex, args: &[&str]) {
        self.report_at(kind, node, self.span(node), args);
    }

    pub(crate) fn report_at(&self, kind: DiagnosticKind, node: NodeIndex, span: Span, args: &[&str]) {
        self.emit(self.diagnostic(kind, node, span, args));
    }

    pub(crate) fn diagnostic(
        &self,
        kind: DiagnosticKind,
        node: NodeIndex,
        span: Span,
        args: &[&str],
    ) -> Diagnostic {
        let file = self
            .sources
            .file_of(node)
            .map(|f| f.name.clone())
            .unwrap_or_default();
        Diagnostic::new(kind, file, span.start, span.len(), args)
    }

    pub(crate) fn emit(&self, diagnostic: Diagnostic) {
        if !self.is_cancelled() {
            self.trace.borrow_mut().report(diagnostic);
        }
    }

    // =========================================================================
    // Types
    // =========================================================================

    pub(crate) fn checker(&self) -> SubtypeChecker<'_> {
        SubtypeChecker::new(&self.types, self)
    }

    pub fn render_type(&self, ty: TypeId) -> String {
        TypeFormatter::new(&self.types, self).format(ty)
    }

    pub fn types(&self) -> &TypeInterner {
        &self.types
    }

    pub fn sources(&self) -> &SourceSet {
        &self.sources
    }

    pub fn options(&self) -> &ResolveOptions {
        &self.options
    }
}
