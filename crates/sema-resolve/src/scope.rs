//! Lexical scopes.
//!
//! A [`Scope`] is a chain of links, innermost first. Each link has a
//! [`ScopeKind`], a depth (higher is more proximate) and the entries it
//! contributes. Chains are built lazily and memoized per [`ScopeKey`]; the
//! chain for any node is found by walking up to its nearest scope owner
//! with [`ResolveContext::scope_at`].
//!
//! File chains are layered, from the outside in:
//!
//! ```text
//! DefaultImports(0) <- StarImports(1) <- SamePackage(2) <- ExplicitImports(3) <- File(4)
//! ```
//!
//! Inner links (class bodies, parameters, blocks) continue the depth count
//! from their parent, so a name declared in a block always wins over the
//! same name in any outer link.

use crate::context::ResolveContext;
use crate::error::{ResolveError, ResolveResult};
use crate::members::MemberProperty;
use rustc_hash::FxHashMap;
use sema_common::{Atom, DefId, DiagnosticKind};
use sema_syntax::{DeclarationProvider, Modifiers, NodeIndex, NodeKind};
use sema_types::TypeId;
use serde::Serialize;
use std::rc::Rc;
use tracing::trace;

/// Which chain of an owner node a key names. A class owns four chains: the
/// header sees type parameters, the body also sees members, and
/// initializers additionally see constructor parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScopeRole {
    File,
    Block,
    Lambda,
    LoopBody,
    FunctionSignature,
    FunctionBody,
    ClassHeader,
    ClassBody,
    ClassInitializer,
    MemberInitializer,
    AliasParameters,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ScopeKey {
    pub owner: NodeIndex,
    pub role: ScopeRole,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ScopeKind {
    Local,
    FunctionParameters,
    TypeParameters,
    ClassMembers,
    File,
    ExplicitImports,
    SamePackage,
    StarImports,
    DefaultImports,
}

pub(crate) enum ScopeEntries {
    /// Declarations of a container. Block declarations are visible only
    /// after their position.
    Declarations {
        container: NodeIndex,
        sequential: bool,
    },
    /// Parameters, type parameters and the implicit `it` of a lambda.
    Bindings(FxHashMap<Atom, NodeIndex>),
    Imported(FxHashMap<Atom, Vec<NodeIndex>>),
    /// Top-level declarations of whole files.
    Files(Vec<NodeIndex>),
    ClassMembers(DefId),
    Empty,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Namespace {
    Type,
    Value,
    Function,
}

pub struct Scope {
    pub kind: ScopeKind,
    pub owner: NodeIndex,
    pub depth: u32,
    pub(crate) entries: ScopeEntries,
    /// Receiver available as `this` and for unqualified member access.
    pub implicit_receiver: Option<TypeId>,
    pub parent: Option<Rc<Scope>>,
}

impl Scope {
    fn empty(owner: NodeIndex) -> Self {
        Scope {
            kind: ScopeKind::Local,
            owner,
            depth: 0,
            entries: ScopeEntries::Empty,
            implicit_receiver: None,
            parent: None,
        }
    }

    /// The links of the chain, innermost first.
    pub fn links(&self) -> impl Iterator<Item = &Scope> {
        std::iter::successors(Some(self), |s| s.parent.as_deref())
    }

    pub fn innermost_receiver(&self) -> Option<TypeId> {
        self.links().find_map(|link| link.implicit_receiver)
    }

    pub fn kinds(&self) -> Vec<ScopeKind> {
        self.links().map(|link| link.kind).collect()
    }
}

/// A value found by name.
pub(crate) enum ValueHit {
    /// A property, a parameter, or a lambda standing for its implicit `it`.
    Declaration(NodeIndex),
    Member(MemberProperty),
}

fn link(kind: ScopeKind, owner: NodeIndex, entries: ScopeEntries, parent: Rc<Scope>) -> Scope {
    Scope {
        kind,
        owner,
        depth: parent.depth + 1,
        entries,
        implicit_receiver: None,
        parent: Some(parent),
    }
}

impl ResolveContext {
    // =========================================================================
    // Chains
    // =========================================================================

    pub(crate) fn scope(&self, key: ScopeKey) -> ResolveResult<Rc<Scope>> {
        let scope = self.memoized(
            &self.cells.scopes,
            key,
            || self.build_scope(key).map(|s| Some(Rc::new(s))),
            || None,
        )?;
        Ok(scope.unwrap_or_else(|| Rc::new(Scope::empty(key.owner))))
    }

    /// The chain visible at `node`.
    pub(crate) fn scope_at(&self, node: NodeIndex) -> ResolveResult<Rc<Scope>> {
        if let NodeKind::SourceFile(_) = self.kind(node)? {
            return self.scope(ScopeKey {
                owner: node,
                role: ScopeRole::File,
            });
        }
        let mut child = node;
        for container in self.sources.arena().ancestors(node) {
            if let Some(role) = self.scope_role(container, child)? {
                return self.scope(ScopeKey {
                    owner: container,
                    role,
                });
            }
            child = container;
        }
        Err(ResolveError::UnknownNode(node))
    }

    fn scope_role(&self, container: NodeIndex, child: NodeIndex) -> ResolveResult<Option<ScopeRole>> {
        let role = match self.kind(container)? {
            NodeKind::SourceFile(_) => Some(ScopeRole::File),
            NodeKind::Block(_) => Some(ScopeRole::Block),
            NodeKind::Lambda(_) => Some(ScopeRole::Lambda),
            NodeKind::For(f) => (child == f.body).then_some(ScopeRole::LoopBody),
            NodeKind::Function(f) if child == f.body => Some(ScopeRole::FunctionBody),
            NodeKind::Function(_) => Some(ScopeRole::FunctionSignature),
            NodeKind::Class(c) => {
                if c.super_call_args.contains(&child) || c.constructor_params.contains(&child) {
                    Some(ScopeRole::ClassInitializer)
                } else if c.members.contains(&child) {
                    match self.kind(child)? {
                        NodeKind::Property(_) => Some(ScopeRole::MemberInitializer),
                        _ => Some(ScopeRole::ClassBody),
                    }
                } else {
                    Some(ScopeRole::ClassHeader)
                }
            }
            NodeKind::TypeAlias(_) => Some(ScopeRole::AliasParameters),
            _ => None,
        };
        Ok(role)
    }

    fn build_scope(&self, key: ScopeKey) -> ResolveResult<Scope> {
        trace!(owner = key.owner.0, role = ?key.role, "building scope");
        let owner = key.owner;
        let scope = match (key.role, self.kind(owner)?) {
            (ScopeRole::File, _) => self.build_file_scope(owner)?,
            (ScopeRole::Block, _) => link(
                ScopeKind::Local,
                owner,
                ScopeEntries::Declarations {
                    container: owner,
                    sequential: true,
                },
                self.scope_at(owner)?,
            ),
            (ScopeRole::Lambda, NodeKind::Lambda(lambda)) => {
                let bindings = if lambda.params.is_empty() {
                    let it = self.sources.interner().known("it");
                    FxHashMap::from_iter([(it, owner)])
                } else {
                    self.bindings(&lambda.params)
                };
                link(
                    ScopeKind::FunctionParameters,
                    owner,
                    ScopeEntries::Bindings(bindings),
                    self.scope_at(owner)?,
                )
            }
            (ScopeRole::LoopBody, NodeKind::For(f)) => link(
                ScopeKind::FunctionParameters,
                owner,
                ScopeEntries::Bindings(self.bindings(&[f.variable])),
                self.scope_at(owner)?,
            ),
            (ScopeRole::FunctionSignature, NodeKind::Function(f)) => link(
                ScopeKind::TypeParameters,
                owner,
                ScopeEntries::Bindings(self.bindings(&f.type_params)),
                self.scope_at(owner)?,
            ),
            (ScopeRole::FunctionBody, NodeKind::Function(f)) => {
                let signature = self.scope(ScopeKey {
                    owner,
                    role: ScopeRole::FunctionSignature,
                })?;
                let mut scope = link(
                    ScopeKind::FunctionParameters,
                    owner,
                    ScopeEntries::Bindings(self.bindings(&f.params)),
                    signature,
                );
                scope.implicit_receiver = self.function_descriptor_of(owner)?.extension_receiver;
                scope
            }
            (ScopeRole::ClassHeader, NodeKind::Class(c)) => link(
                ScopeKind::TypeParameters,
                owner,
                ScopeEntries::Bindings(self.bindings(&c.type_params)),
                self.scope_at(owner)?,
            ),
            (ScopeRole::ClassBody, NodeKind::Class(_)) => {
                let class = self.class_descriptor_of(owner)?;
                let header = self.scope(ScopeKey {
                    owner,
                    role: ScopeRole::ClassHeader,
                })?;
                let mut scope = link(
                    ScopeKind::ClassMembers,
                    owner,
                    ScopeEntries::ClassMembers(class.def),
                    header,
                );
                scope.implicit_receiver = Some(self.class_self_type(&class)?);
                scope
            }
            (ScopeRole::ClassInitializer | ScopeRole::MemberInitializer, NodeKind::Class(c)) => {
                let parent_role = if key.role == ScopeRole::ClassInitializer {
                    ScopeRole::ClassHeader
                } else {
                    ScopeRole::ClassBody
                };
                let parent = self.scope(ScopeKey {
                    owner,
                    role: parent_role,
                })?;
                link(
                    ScopeKind::FunctionParameters,
                    owner,
                    ScopeEntries::Bindings(self.bindings(&c.constructor_params)),
                    parent,
                )
            }
            (ScopeRole::AliasParameters, NodeKind::TypeAlias(a)) => link(
                ScopeKind::TypeParameters,
                owner,
                ScopeEntries::Bindings(self.bindings(&a.type_params)),
                self.scope_at(owner)?,
            ),
            _ => return Err(self.unexpected(owner, "scope owner")),
        };
        Ok(scope)
    }

    fn bindings(&self, nodes: &[NodeIndex]) -> FxHashMap<Atom, NodeIndex> {
        let arena = self.sources.arena();
        let mut map = FxHashMap::default();
        for &node in nodes {
            map.entry(arena.declaration_name(node)).or_insert(node);
        }
        map
    }

    fn build_file_scope(&self, root: NodeIndex) -> ResolveResult<Scope> {
        let sources = &self.sources;
        let default_roots: Vec<NodeIndex> = sources
            .builtins_file()
            .and_then(|id| sources.file(id))
            .map(|f| vec![f.root])
            .unwrap_or_default();
        let defaults = Rc::new(Scope {
            kind: ScopeKind::DefaultImports,
            owner: root,
            depth: 0,
            entries: ScopeEntries::Files(default_roots),
            implicit_receiver: None,
            parent: None,
        });

        let mut star_roots = Vec::new();
        let mut explicit: FxHashMap<Atom, Vec<NodeIndex>> = FxHashMap::default();
        for import in sources.imports(root) {
            let NodeKind::Import(data) = self.kind(import)? else {
                continue;
            };
            if data.all_under {
                for file in sources.package_files(&data.path) {
                    if !star_roots.contains(&file) {
                        star_roots.push(file);
                    }
                }
                continue;
            }
            let Some((&name, package)) = data.path.split_last() else {
                continue;
            };
            let found: Vec<NodeIndex> = sources
                .package_files(package)
                .into_iter()
                .flat_map(|file| self.top_level_named(file, name, None, false))
                .collect();
            if found.is_empty() {
                let path = sources.interner().join(&data.path);
                self.report(DiagnosticKind::UnresolvedReference, import, &[&path]);
            }
            // A later import of the same simple name replaces the earlier one.
            explicit.insert(data.imported_name(), found);
        }
        let stars = Rc::new(link(
            ScopeKind::StarImports,
            root,
            ScopeEntries::Files(star_roots),
            defaults,
        ));

        let package = sources.package_of(root);
        let siblings: Vec<NodeIndex> = sources
            .package_files(&package)
            .into_iter()
            .filter(|&f| f != root)
            .collect();
        let same_package = Rc::new(link(
            ScopeKind::SamePackage,
            root,
            ScopeEntries::Files(siblings),
            stars,
        ));
        let imports = Rc::new(link(
            ScopeKind::ExplicitImports,
            root,
            ScopeEntries::Imported(explicit),
            same_package,
        ));
        Ok(link(
            ScopeKind::File,
            root,
            ScopeEntries::Declarations {
                container: root,
                sequential: false,
            },
            imports,
        ))
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Top-level declarations of `container` named `name`, optionally
    /// restricted to one namespace. Private declarations are skipped unless
    /// `include_private`.
    pub(crate) fn top_level_named(
        &self,
        container: NodeIndex,
        name: Atom,
        namespace: Option<Namespace>,
        include_private: bool,
    ) -> Vec<NodeIndex> {
        let sources = &self.sources;
        let mut nodes = Vec::new();
        if namespace.is_none_or(|ns| ns == Namespace::Type) {
            nodes.extend(sources.classes(container));
            nodes.extend(sources.type_aliases(container));
        }
        if namespace.is_none_or(|ns| ns == Namespace::Value) {
            nodes.extend(sources.properties(container));
        }
        if namespace.is_none_or(|ns| ns == Namespace::Function) {
            nodes.extend(sources.functions(container));
        }
        let arena = sources.arena();
        nodes.retain(|&node| {
            arena.declaration_name(node) == name
                && (include_private || !self.modifiers_of(node).contains(Modifiers::PRIVATE))
        });
        nodes
    }

    pub(crate) fn modifiers_of(&self, node: NodeIndex) -> Modifiers {
        match self.kind(node) {
            Ok(NodeKind::Class(c)) => c.modifiers,
            Ok(NodeKind::Function(f)) => f.modifiers,
            Ok(NodeKind::Property(p)) => p.modifiers,
            Ok(NodeKind::TypeAlias(a)) => a.modifiers,
            _ => Modifiers::empty(),
        }
    }

    fn namespace_of(&self, node: NodeIndex) -> Option<Namespace> {
        match self.kind(node).ok()? {
            NodeKind::Class(_) | NodeKind::TypeAlias(_) | NodeKind::TypeParameter(_) => {
                Some(Namespace::Type)
            }
            NodeKind::Property(_) | NodeKind::Parameter(_) | NodeKind::Lambda(_) => {
                Some(Namespace::Value)
            }
            NodeKind::Function(_) => Some(Namespace::Function),
            _ => None,
        }
    }

    /// Whether a block declaration is visible at offset `at`. Properties
    /// become visible after their initializer, everything else from its
    /// own start.
    fn visible_at(&self, node: NodeIndex, at: u32) -> bool {
        let span = self.span(node);
        match self.kind(node) {
            Ok(NodeKind::Property(_)) => span.end <= at,
            _ => span.start <= at,
        }
    }

    /// Declarations named `name` contributed by one link.
    pub(crate) fn link_declarations(
        &self,
        link: &Scope,
        name: Atom,
        namespace: Namespace,
        at: u32,
    ) -> ResolveResult<Vec<NodeIndex>> {
        let nodes = match &link.entries {
            ScopeEntries::Declarations {
                container,
                sequential,
            } => {
                let mut nodes = self.top_level_named(*container, name, Some(namespace), true);
                if *sequential {
                    nodes.retain(|&n| self.visible_at(n, at));
                }
                nodes
            }
            ScopeEntries::Bindings(map) => map
                .get(&name)
                .copied()
                .filter(|&n| self.namespace_of(n) == Some(namespace))
                .into_iter()
                .collect(),
            ScopeEntries::Imported(map) => map
                .get(&name)
                .map(|nodes| {
                    nodes
                        .iter()
                        .copied()
                        .filter(|&n| self.namespace_of(n) == Some(namespace))
                        .collect()
                })
                .unwrap_or_default(),
            ScopeEntries::Files(roots) => roots
                .iter()
                .flat_map(|&root| self.top_level_named(root, name, Some(namespace), false))
                .collect(),
            ScopeEntries::ClassMembers(class) if namespace == Namespace::Type => {
                self.nested_classifier(*class, name)?.into_iter().collect()
            }
            ScopeEntries::ClassMembers(_) | ScopeEntries::Empty => Vec::new(),
        };
        Ok(nodes)
    }

    /// Class, type alias or type parameter named `name`.
    pub(crate) fn lookup_classifier(
        &self,
        scope: &Scope,
        name: Atom,
        at: u32,
    ) -> ResolveResult<Option<NodeIndex>> {
        for link in scope.links() {
            if let Some(&node) = self
                .link_declarations(link, name, Namespace::Type, at)?
                .first()
            {
                return Ok(Some(node));
            }
        }
        Ok(None)
    }

    /// Value named `name`: locals and parameters, members of implicit
    /// receivers, then top-level properties.
    pub(crate) fn lookup_value(
        &self,
        scope: &Scope,
        name: Atom,
        at: u32,
    ) -> ResolveResult<Option<ValueHit>> {
        for link in scope.links() {
            for node in self.link_declarations(link, name, Namespace::Value, at)? {
                // `it` exists only once the lambda's parameter type is known.
                if let NodeKind::Lambda(_) = self.kind(node)?
                    && self.trace.borrow().variable_type(node).is_none()
                {
                    continue;
                }
                return Ok(Some(ValueHit::Declaration(node)));
            }
            if let Some(receiver) = link.implicit_receiver
                && let Some(member) = self.member_property(receiver, name)?
            {
                return Ok(Some(ValueHit::Member(member)));
            }
        }
        Ok(None)
    }

    /// Every function named `name` visible at `at`, innermost link first,
    /// paired with the depth of the link that contributed it. Overloads
    /// share a name, so nothing here shadows.
    pub(crate) fn lookup_functions(
        &self,
        scope: &Scope,
        name: Atom,
        at: u32,
    ) -> ResolveResult<Vec<(u32, NodeIndex)>> {
        let mut found = Vec::new();
        for link in scope.links() {
            for node in self.link_declarations(link, name, Namespace::Function, at)? {
                found.push((link.depth, node));
            }
        }
        Ok(found)
    }
}

#[cfg(test)]
#[path = "../tests/scope_tests.rs"]
mod scope_tests;
