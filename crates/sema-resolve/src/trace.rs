//! Binding trace: the append-only record of resolution facts.
//!
//! Facts are keyed by syntax node and written at most once. A second write
//! of the same fact is a no-op; a contradictory write keeps the first value
//! and is counted so tests can assert none happened.
//!
//! Speculative typing (trying an argument against several candidates) runs
//! inside layers pushed on top of the root. Reads see the layers top-down,
//! then the root. A layer is either merged into the one below it or
//! dropped, so abandoned speculation leaves no trace. Declaration-level
//! computations suspend the layer stack entirely: what they learn is true
//! regardless of which candidate wins and always lands in the root.

use indexmap::IndexSet;
use rustc_hash::FxHashMap;
use sema_common::{DefId, Diagnostic};
use sema_syntax::NodeIndex;
use sema_types::TypeId;
use serde::Serialize;
use std::fmt::Debug;
use std::hash::Hash;
use tracing::debug;

/// Which convention call of a node a [`ResolvedCall`] belongs to. A `for`
/// loop records three calls on the same node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum CallRole {
    Direct,
    Iterator,
    HasNext,
    Next,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum CallStatus {
    Success,
    /// Resolved to the only candidate despite argument errors.
    Incomplete,
    /// Call on a `dynamic` receiver; no descriptor.
    Dynamic,
}

/// The committed outcome of a call site.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResolvedCall {
    pub callee: DefId,
    pub status: CallStatus,
    /// Inferred or explicit type arguments, one per callee type parameter.
    pub type_arguments: Vec<TypeId>,
    pub receiver_type: Option<TypeId>,
    pub return_type: TypeId,
    /// Parameter index of each argument.
    pub argument_map: Vec<usize>,
    pub safe: bool,
}

#[derive(Default)]
pub struct TraceLayer {
    types: FxHashMap<NodeIndex, TypeId>,
    references: FxHashMap<NodeIndex, DefId>,
    calls: FxHashMap<(NodeIndex, CallRole), ResolvedCall>,
    variables: FxHashMap<NodeIndex, TypeId>,
    diagnostics: Vec<Diagnostic>,
}

impl TraceLayer {
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
            && self.references.is_empty()
            && self.calls.is_empty()
            && self.variables.is_empty()
            && self.diagnostics.is_empty()
    }
}

#[derive(Default)]
pub struct BindingTrace {
    root: TraceLayer,
    root_diagnostics: IndexSet<Diagnostic>,
    layers: Vec<TraceLayer>,
    suspended: Vec<Vec<TraceLayer>>,
    contradictions: u32,
}

type Select<K, V> = fn(&TraceLayer) -> &FxHashMap<K, V>;
type SelectMut<K, V> = fn(&mut TraceLayer) -> &mut FxHashMap<K, V>;

impl BindingTrace {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Speculation
    // =========================================================================

    pub fn is_speculating(&self) -> bool {
        !self.layers.is_empty()
    }

    pub fn push_layer(&mut self) {
        self.layers.push(TraceLayer::default());
    }

    /// Detach the top layer. Dropping it discards its facts.
    pub fn take_layer(&mut self) -> TraceLayer {
        self.layers.pop().unwrap_or_default()
    }

    /// Merge a detached layer into the current top (or the root).
    pub fn merge_layer(&mut self, layer: TraceLayer) {
        for (node, ty) in layer.types {
            self.write(node, ty, |l| &l.types, |l| &mut l.types);
        }
        for (node, def) in layer.references {
            self.write(node, def, |l| &l.references, |l| &mut l.references);
        }
        for (key, call) in layer.calls {
            self.write(key, call, |l| &l.calls, |l| &mut l.calls);
        }
        for (node, ty) in layer.variables {
            self.write(node, ty, |l| &l.variables, |l| &mut l.variables);
        }
        for diagnostic in layer.diagnostics {
            self.report(diagnostic);
        }
    }

    /// Hide all speculation layers while a declaration-level fact is computed.
    pub fn suspend_speculation(&mut self) {
        let layers = std::mem::take(&mut self.layers);
        self.suspended.push(layers);
    }

    pub fn resume_speculation(&mut self) {
        if let Some(layers) = self.suspended.pop() {
            debug_assert!(self.layers.is_empty(), "unbalanced speculation layers");
            self.layers = layers;
        }
    }

    // =========================================================================
    // Writes
    // =========================================================================

    pub fn record_type(&mut self, node: NodeIndex, ty: TypeId) {
        self.write(node, ty, |l| &l.types, |l| &mut l.types);
    }

    pub fn record_reference(&mut self, node: NodeIndex, def: DefId) {
        self.write(node, def, |l| &l.references, |l| &mut l.references);
    }

    pub fn record_call(&mut self, node: NodeIndex, role: CallRole, call: ResolvedCall) {
        self.write((node, role), call, |l| &l.calls, |l| &mut l.calls);
    }

    /// Type of a local variable, lambda parameter or loop variable.
    pub fn record_variable(&mut self, node: NodeIndex, ty: TypeId) {
        self.write(node, ty, |l| &l.variables, |l| &mut l.variables);
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        match self.layers.last_mut() {
            Some(layer) => {
                if !layer.diagnostics.contains(&diagnostic) {
                    layer.diagnostics.push(diagnostic);
                }
            }
            None => {
                self.root_diagnostics.insert(diagnostic);
            }
        }
    }

    fn write<K, V>(&mut self, key: K, value: V, select: Select<K, V>, select_mut: SelectMut<K, V>)
    where
        K: Copy + Eq + Hash + Debug,
        V: Clone + PartialEq + Debug,
    {
        if let Some(existing) = self.read(key, select) {
            if existing != value {
                self.contradictions += 1;
                debug!(?key, ?existing, ?value, "contradictory trace write ignored");
            }
            return;
        }
        let layer = match self.layers.last_mut() {
            Some(layer) => layer,
            None => &mut self.root,
        };
        select_mut(layer).insert(key, value);
    }

    // =========================================================================
    // Reads
    // =========================================================================

    fn read<K, V>(&self, key: K, select: Select<K, V>) -> Option<V>
    where
        K: Eq + Hash,
        V: Clone,
    {
        self.layers
            .iter()
            .rev()
            .chain(std::iter::once(&self.root))
            .find_map(|layer| select(layer).get(&key).cloned())
    }

    pub fn type_of(&self, node: NodeIndex) -> Option<TypeId> {
        self.read(node, |l| &l.types)
    }

    pub fn reference(&self, node: NodeIndex) -> Option<DefId> {
        self.read(node, |l| &l.references)
    }

    pub fn call(&self, node: NodeIndex, role: CallRole) -> Option<ResolvedCall> {
        self.read((node, role), |l| &l.calls)
    }

    pub fn variable_type(&self, node: NodeIndex) -> Option<TypeId> {
        self.read(node, |l| &l.variables)
    }

    /// Committed diagnostics in first-report order.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.root_diagnostics.iter().cloned().collect()
    }

    pub fn contradictions(&self) -> u32 {
        self.contradictions
    }

    // Root-only views used to build binding slices.

    pub(crate) fn committed_types(&self) -> impl Iterator<Item = (NodeIndex, TypeId)> + '_ {
        self.root.types.iter().map(|(&n, &t)| (n, t))
    }

    pub(crate) fn committed_references(&self) -> impl Iterator<Item = (NodeIndex, DefId)> + '_ {
        self.root.references.iter().map(|(&n, &d)| (n, d))
    }

    pub(crate) fn committed_calls(
        &self,
    ) -> impl Iterator<Item = (NodeIndex, CallRole, &ResolvedCall)> + '_ {
        self.root
            .calls
            .iter()
            .map(|(&(node, role), call)| (node, role, call))
    }
}

#[cfg(test)]
#[path = "../tests/trace_tests.rs"]
mod trace_tests;
