//! The resolve session façade.
//!
//! A [`ResolveSession`] owns the context (memo tables, descriptor table,
//! binding trace) for one [`SourceSet`]. Every entry point is lazy: asking
//! for a descriptor resolves only that declaration's header, asking for the
//! bindings of an element resolves the body that contains it. Entry points
//! may be called in any order and any number of times.
//!
//! ```no_run
//! use sema_resolve::ResolveSession;
//! use sema_syntax::{Origin, SourceSet};
//!
//! let mut sources = SourceSet::with_builtins()?;
//! sources.add_file("main.sema", "fun main() { println(1) }", Origin::Source)?;
//! let session = ResolveSession::builder(sources).build();
//! session.resolve_all()?;
//! for diagnostic in session.diagnostics() {
//!     println!("{}", diagnostic.message_text);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::calls::checkers::{CallChecker, default_call_checkers};
use crate::cancel::CancellationToken;
use crate::context::ResolveContext;
use crate::descriptors::{
    ClassDescriptor, Descriptor, FunctionDescriptor, PropertyDescriptor, TypeAliasDescriptor,
};
use crate::error::ResolveResult;
use crate::for_loop::ForLoopConventionChecker;
use crate::memo::SlotState;
use crate::options::ResolveOptions;
use crate::trace::{CallRole, ResolvedCall};
use rustc_hash::FxHashSet;
use sema_common::{DefId, Diagnostic};
use sema_syntax::{NodeIndex, NodeKind, SourceSet};
use sema_types::{TypeId, TypeInterner};
use serde::Serialize;
use std::rc::Rc;
use tracing::{debug, info, instrument};

pub struct ResolveSessionBuilder {
    sources: Rc<SourceSet>,
    options: ResolveOptions,
    default_checkers: bool,
    call_checkers: Vec<Box<dyn CallChecker>>,
    token: CancellationToken,
}

impl ResolveSessionBuilder {
    pub fn options(mut self, options: ResolveOptions) -> Self {
        self.options = options;
        self
    }

    /// Run `checker` on every committed call, after the default checkers.
    pub fn call_checker(mut self, checker: impl CallChecker + 'static) -> Self {
        self.call_checkers.push(Box::new(checker));
        self
    }

    /// Leave out the checkers that ship with the core.
    pub fn without_default_checkers(mut self) -> Self {
        self.default_checkers = false;
        self
    }

    pub fn cancellation_token(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    pub fn build(self) -> ResolveSession {
        let mut checkers = if self.default_checkers {
            default_call_checkers()
        } else {
            Vec::new()
        };
        checkers.extend(self.call_checkers);
        debug!(
            files = self.sources.files().len(),
            checkers = checkers.len(),
            "building resolve session"
        );
        ResolveSession {
            ctx: ResolveContext::new(
                self.sources,
                self.options,
                checkers,
                ForLoopConventionChecker,
                self.token,
            ),
        }
    }
}

pub struct ResolveSession {
    ctx: ResolveContext,
}

impl ResolveSession {
    pub fn builder(sources: impl Into<Rc<SourceSet>>) -> ResolveSessionBuilder {
        ResolveSessionBuilder {
            sources: sources.into(),
            options: ResolveOptions::default(),
            default_checkers: true,
            call_checkers: Vec::new(),
            token: CancellationToken::new(),
        }
    }

    /// Replace the installed cancellation token. A cancelled session
    /// resumes once a fresh token is installed.
    pub fn set_cancellation_token(&self, token: CancellationToken) {
        self.ctx.set_token(token);
    }

    pub fn sources(&self) -> &SourceSet {
        self.ctx.sources()
    }

    pub fn types(&self) -> &TypeInterner {
        self.ctx.types()
    }

    pub fn options(&self) -> &ResolveOptions {
        self.ctx.options()
    }

    pub fn render_type(&self, ty: TypeId) -> String {
        self.ctx.render_type(ty)
    }

    pub fn name_of(&self, def: DefId) -> Option<String> {
        let descriptor = self.ctx.descriptor_by_def(def)?;
        Some(self.ctx.text(descriptor.name()).to_string())
    }

    // =========================================================================
    // Descriptors
    // =========================================================================

    #[instrument(level = "debug", skip(self), fields(node = node.0))]
    pub fn descriptor(&self, node: NodeIndex) -> ResolveResult<Descriptor> {
        self.ctx.check_cancelled()?;
        self.ctx.descriptor_of(node)
    }

    pub fn class_descriptor(&self, node: NodeIndex) -> ResolveResult<Rc<ClassDescriptor>> {
        self.ctx.check_cancelled()?;
        self.ctx.class_descriptor_of(node)
    }

    pub fn function_descriptor(&self, node: NodeIndex) -> ResolveResult<Rc<FunctionDescriptor>> {
        self.ctx.check_cancelled()?;
        self.ctx.function_descriptor_of(node)
    }

    pub fn property_descriptor(&self, node: NodeIndex) -> ResolveResult<Rc<PropertyDescriptor>> {
        self.ctx.check_cancelled()?;
        self.ctx.property_descriptor_of(node)
    }

    pub fn type_alias_descriptor(&self, node: NodeIndex) -> ResolveResult<Rc<TypeAliasDescriptor>> {
        self.ctx.check_cancelled()?;
        self.ctx.type_alias_descriptor_of(node)
    }

    pub fn descriptor_by_def(&self, def: DefId) -> Option<Descriptor> {
        self.ctx.descriptor_by_def(def)
    }

    /// Return type of a function, inferring it from an expression body.
    pub fn return_type(&self, function: &FunctionDescriptor) -> ResolveResult<TypeId> {
        self.ctx.check_cancelled()?;
        self.ctx.return_type(function)
    }

    pub fn property_type(&self, property: &PropertyDescriptor) -> ResolveResult<TypeId> {
        self.ctx.check_cancelled()?;
        self.ctx.property_type(property)
    }

    /// Supertypes of a class, `Any` when none are declared.
    pub fn supertypes(&self, class: &ClassDescriptor) -> ResolveResult<Vec<TypeId>> {
        self.ctx.check_cancelled()?;
        Ok(self.ctx.class_supertypes(class.def)?.as_ref().clone())
    }

    pub fn alias_expansion(&self, alias: &TypeAliasDescriptor) -> ResolveResult<TypeId> {
        self.ctx.check_cancelled()?;
        self.ctx.alias_expansion(alias.def)
    }

    /// Resolve a type mention node.
    pub fn resolve_type(&self, node: NodeIndex) -> ResolveResult<TypeId> {
        self.ctx.check_cancelled()?;
        self.ctx.resolve_type(node)
    }

    /// Where the descriptor of `node` is in its lifecycle. Type parameters
    /// and function parameters follow the declaration that creates them.
    pub fn resolution_state(&self, node: NodeIndex) -> SlotState {
        match self.ctx.owner_slot_state(node) {
            Some(SlotState::Resolved) if self.ctx.registered_def(node).is_none() => {
                self.ctx.cells.descriptors.state(node)
            }
            Some(state) => state,
            None => self.ctx.cells.descriptors.state(node),
        }
    }

    // =========================================================================
    // Bodies and bindings
    // =========================================================================

    /// Resolve the body containing `node` and return every committed fact
    /// about `node` and its descendants.
    #[instrument(level = "debug", skip(self), fields(node = node.0))]
    pub fn resolve_to_element(&self, node: NodeIndex) -> ResolveResult<BindingSlice> {
        self.ctx.check_cancelled()?;
        self.ensure_element(node)?;
        Ok(self.slice(node))
    }

    /// Committed type of the expression `node`.
    pub fn type_of(&self, node: NodeIndex) -> ResolveResult<Option<TypeId>> {
        self.ctx.check_cancelled()?;
        self.ensure_element(node)?;
        Ok(self.ctx.trace.borrow().type_of(node))
    }

    /// Resolve every declaration and body of every non-built-in file.
    #[instrument(level = "info", skip(self))]
    pub fn resolve_all(&self) -> ResolveResult<()> {
        let sources = self.ctx.sources.clone();
        let builtins = sources.builtins_file();
        for file in sources.files() {
            if Some(file.id) == builtins {
                continue;
            }
            self.ctx.check_cancelled()?;
            self.ctx.scope_at(file.root)?;
            for declaration in sources.declarations_of(file.root) {
                self.ctx.descriptor_of(declaration)?;
                self.ctx.ensure_body(declaration)?;
            }
        }
        info!(
            diagnostics = self.ctx.trace.borrow().diagnostics().len(),
            "resolved all declarations"
        );
        Ok(())
    }

    pub fn binding_context(&self) -> BindingContext<'_> {
        BindingContext { ctx: &self.ctx }
    }

    /// Committed diagnostics in report order.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.ctx.trace.borrow().diagnostics()
    }

    /// Resolve what `node` depends on: its own descriptor when it is a
    /// declaration, and the body of the outermost non-local declaration
    /// around it.
    fn ensure_element(&self, node: NodeIndex) -> ResolveResult<()> {
        let kind = self.ctx.kind(node)?;
        if let NodeKind::SourceFile(_) = kind {
            for declaration in self.ctx.sources.declarations_of(node) {
                self.ctx.descriptor_of(declaration)?;
                self.ctx.ensure_body(declaration)?;
            }
            return Ok(());
        }
        if matches!(
            kind,
            NodeKind::Class(_) | NodeKind::Function(_) | NodeKind::Property(_) | NodeKind::TypeAlias(_)
        ) {
            self.ctx.descriptor_of(node)?;
        }
        if let Some(owner) = self.body_owner(node) {
            self.ctx.ensure_body(owner)?;
        }
        Ok(())
    }

    /// Nearest declaration (inclusive) with a body that is not itself
    /// nested in a block.
    fn body_owner(&self, node: NodeIndex) -> Option<NodeIndex> {
        let arena = self.ctx.sources.arena();
        std::iter::once(node).chain(arena.ancestors(node)).find(|&n| {
            matches!(
                self.ctx.kind(n),
                Ok(NodeKind::Class(_) | NodeKind::Function(_) | NodeKind::Property(_) | NodeKind::TypeAlias(_))
            ) && !matches!(self.ctx.kind(self.ctx.parent(n)), Ok(NodeKind::Block(_)))
        })
    }

    fn slice(&self, node: NodeIndex) -> BindingSlice {
        let arena = self.ctx.sources.arena();
        let mut nodes: FxHashSet<NodeIndex> = arena.descendants(node).into_iter().collect();
        nodes.insert(node);

        let trace = self.ctx.trace.borrow();
        let mut types: Vec<_> = trace.committed_types().filter(|(n, _)| nodes.contains(n)).collect();
        let mut references: Vec<_> = trace
            .committed_references()
            .filter(|(n, _)| nodes.contains(n))
            .collect();
        let mut calls: Vec<_> = trace
            .committed_calls()
            .filter(|(n, _, _)| nodes.contains(n))
            .map(|(n, role, call)| (n, role, call.clone()))
            .collect();
        types.sort_by_key(|(n, _)| *n);
        references.sort_by_key(|(n, _)| *n);
        calls.sort_by_key(|(n, role, _)| (*n, *role));

        let span = self.ctx.span(node);
        let file = self.ctx.sources.file_of(node).map(|f| f.name.as_str());
        let diagnostics = trace
            .diagnostics()
            .into_iter()
            .filter(|d| {
                Some(d.file.as_str()) == file && d.start >= span.start && d.start + d.length <= span.end
            })
            .collect();

        BindingSlice {
            node,
            types,
            references,
            calls,
            diagnostics,
        }
    }
}

/// Committed facts about one element and everything under it.
#[derive(Clone, Debug, Serialize)]
pub struct BindingSlice {
    pub node: NodeIndex,
    pub types: Vec<(NodeIndex, TypeId)>,
    pub references: Vec<(NodeIndex, DefId)>,
    pub calls: Vec<(NodeIndex, CallRole, ResolvedCall)>,
    /// Diagnostics whose range lies inside the element.
    pub diagnostics: Vec<Diagnostic>,
}

impl BindingSlice {
    pub fn type_of(&self, node: NodeIndex) -> Option<TypeId> {
        self.types.iter().find(|(n, _)| *n == node).map(|(_, t)| *t)
    }

    pub fn reference(&self, node: NodeIndex) -> Option<DefId> {
        self.references.iter().find(|(n, _)| *n == node).map(|(_, d)| *d)
    }

    pub fn call(&self, node: NodeIndex) -> Option<&ResolvedCall> {
        self.calls
            .iter()
            .find(|(n, role, _)| *n == node && *role == CallRole::Direct)
            .map(|(_, _, call)| call)
    }
}

/// Read view of the committed binding trace.
pub struct BindingContext<'a> {
    ctx: &'a ResolveContext,
}

impl BindingContext<'_> {
    pub fn get_type(&self, node: NodeIndex) -> Option<TypeId> {
        self.ctx.trace.borrow().type_of(node)
    }

    /// Declaration a reference or call resolved to.
    pub fn get_reference(&self, node: NodeIndex) -> Option<DefId> {
        self.ctx.trace.borrow().reference(node)
    }

    pub fn get_descriptor(&self, node: NodeIndex) -> Option<Descriptor> {
        self.get_reference(node)
            .and_then(|def| self.ctx.descriptor_by_def(def))
    }

    pub fn get_call(&self, node: NodeIndex, role: CallRole) -> Option<ResolvedCall> {
        self.ctx.trace.borrow().call(node, role)
    }

    /// Type of a local variable, lambda parameter, loop variable or `it`.
    pub fn get_variable_type(&self, node: NodeIndex) -> Option<TypeId> {
        self.ctx.trace.borrow().variable_type(node)
    }

    pub fn get_diagnostics(&self) -> Vec<Diagnostic> {
        self.ctx.trace.borrow().diagnostics()
    }

    /// Contradictory writes ignored by the trace.
    pub fn contradictions(&self) -> u32 {
        self.ctx.trace.borrow().contradictions()
    }
}
