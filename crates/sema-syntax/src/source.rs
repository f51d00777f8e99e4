//! A set of parsed files sharing one arena and one interner.

use crate::ast::{NodeArena, NodeIndex, NodeKind, Origin};
use crate::builtins::BUILTINS;
use crate::error::ParseError;
use crate::parser::ParserState;
use crate::provider::DeclarationProvider;
use indexmap::IndexMap;
use sema_common::{Atom, FileId, Interner, LineMap, Position};
use tracing::debug;

pub struct SourceFile {
    pub id: FileId,
    pub name: String,
    pub text: String,
    pub origin: Origin,
    pub root: NodeIndex,
    pub package: Vec<Atom>,
    line_map: LineMap,
}

impl SourceFile {
    pub fn position(&self, offset: u32) -> Position {
        self.line_map.position(offset)
    }
}

/// All files of one compilation unit set.
///
/// Files are added before resolution starts; the resolution core holds the
/// set behind an `Rc` and only reads it.
pub struct SourceSet {
    arena: NodeArena,
    interner: Interner,
    files: Vec<SourceFile>,
    packages: IndexMap<Vec<Atom>, Vec<FileId>>,
    builtins: Option<FileId>,
}

impl Default for SourceSet {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceSet {
    /// An empty set without the built-ins catalogue.
    pub fn new() -> Self {
        SourceSet {
            arena: NodeArena::new(),
            interner: Interner::new(),
            files: Vec::new(),
            packages: IndexMap::new(),
            builtins: None,
        }
    }

    /// A set preloaded with the embedded built-ins catalogue.
    pub fn with_builtins() -> Result<Self, ParseError> {
        let mut set = Self::new();
        let id = set.add_file(BUILTINS.file_name, BUILTINS.content, Origin::Source)?;
        set.builtins = Some(id);
        Ok(set)
    }

    pub fn add_file(
        &mut self,
        name: impl Into<String>,
        text: impl Into<String>,
        origin: Origin,
    ) -> Result<FileId, ParseError> {
        let name = name.into();
        let text = text.into();
        if self.files.iter().any(|f| f.name == name) {
            return Err(ParseError::DuplicateFile(name));
        }
        let id = FileId(self.files.len() as u32);
        let root = {
            let mut parser =
                ParserState::new(&name, &text, id, &mut self.arena, &mut self.interner)?;
            parser.parse_source_file()?
        };
        let package = match self.arena.kind(root) {
            Some(NodeKind::SourceFile(file)) => file.package.clone(),
            _ => Vec::new(),
        };
        debug!(file = %name, nodes = self.arena.len(), "parsed source file");
        self.packages.entry(package.clone()).or_default().push(id);
        let line_map = LineMap::new(&text);
        self.files.push(SourceFile {
            id,
            name,
            text,
            origin,
            root,
            package,
            line_map,
        });
        Ok(id)
    }

    #[inline]
    pub fn arena(&self) -> &NodeArena {
        &self.arena
    }

    #[inline]
    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    pub fn file(&self, id: FileId) -> Option<&SourceFile> {
        self.files.get(id.0 as usize)
    }

    pub fn file_by_name(&self, name: &str) -> Option<&SourceFile> {
        self.files.iter().find(|f| f.name == name)
    }

    /// The file a node belongs to.
    pub fn file_of(&self, node: NodeIndex) -> Option<&SourceFile> {
        self.arena.get(node).and_then(|n| self.file(n.file))
    }

    pub fn builtins_file(&self) -> Option<FileId> {
        self.builtins
    }

    pub fn is_builtin(&self, node: NodeIndex) -> bool {
        self.builtins.is_some() && self.arena.get(node).map(|n| n.file) == self.builtins
    }

    pub fn origin_of(&self, node: NodeIndex) -> Origin {
        self.file_of(node).map(|f| f.origin).unwrap_or(Origin::Source)
    }

    /// Source text covered by a node.
    pub fn text_of(&self, node: NodeIndex) -> &str {
        let Some(file) = self.file_of(node) else {
            return "";
        };
        let span = self.arena.span(node);
        file.text
            .get(span.start as usize..span.end as usize)
            .unwrap_or("")
    }

    /// Find a declaration by dotted path (`Outer.member`) in a file. With
    /// overloads, the first one in source order wins.
    pub fn find_declaration(&self, file_name: &str, path: &str) -> Option<NodeIndex> {
        let file = self.file_by_name(file_name)?;
        let mut container = file.root;
        let mut found = NodeIndex::NONE;
        for segment in path.split('.') {
            let name = self.interner.get(segment)?;
            found = self
                .declarations_of(container)
                .into_iter()
                .find(|&d| self.arena.declaration_name(d) == name)?;
            container = found;
        }
        found.to_option()
    }

    /// First node in pre-order whose source text is exactly `snippet`.
    pub fn find_by_text(&self, file_name: &str, snippet: &str) -> Option<NodeIndex> {
        let file = self.file_by_name(file_name)?;
        self.arena
            .descendants(file.root)
            .into_iter()
            .find(|&n| self.text_of(n) == snippet)
    }

    /// Direct child declarations of a container, in source order.
    pub fn declarations_of(&self, container: NodeIndex) -> Vec<NodeIndex> {
        match self.arena.kind(container) {
            Some(NodeKind::SourceFile(file)) => file.declarations.clone(),
            Some(NodeKind::Class(class)) => class.members.clone(),
            Some(NodeKind::Block(block)) => block
                .statements
                .iter()
                .copied()
                .filter(|&s| self.arena.kind(s).is_some_and(|k| k.is_declaration()))
                .collect(),
            Some(NodeKind::Function(function)) => self.declarations_of(function.body),
            _ => Vec::new(),
        }
    }

    fn declarations_matching(
        &self,
        container: NodeIndex,
        pred: impl Fn(&NodeKind) -> bool,
    ) -> Vec<NodeIndex> {
        self.declarations_of(container)
            .into_iter()
            .filter(|&d| self.arena.kind(d).is_some_and(&pred))
            .collect()
    }
}

impl DeclarationProvider for SourceSet {
    fn classes(&self, container: NodeIndex) -> Vec<NodeIndex> {
        self.declarations_matching(container, |k| matches!(k, NodeKind::Class(_)))
    }

    fn functions(&self, container: NodeIndex) -> Vec<NodeIndex> {
        self.declarations_matching(container, |k| matches!(k, NodeKind::Function(_)))
    }

    fn properties(&self, container: NodeIndex) -> Vec<NodeIndex> {
        self.declarations_matching(container, |k| matches!(k, NodeKind::Property(_)))
    }

    fn type_aliases(&self, container: NodeIndex) -> Vec<NodeIndex> {
        self.declarations_matching(container, |k| matches!(k, NodeKind::TypeAlias(_)))
    }

    fn imports(&self, file: NodeIndex) -> Vec<NodeIndex> {
        match self.arena.kind(file) {
            Some(NodeKind::SourceFile(data)) => data.imports.clone(),
            _ => Vec::new(),
        }
    }

    fn package_of(&self, file: NodeIndex) -> Vec<Atom> {
        match self.arena.kind(file) {
            Some(NodeKind::SourceFile(data)) => data.package.clone(),
            _ => Vec::new(),
        }
    }

    fn package_files(&self, package: &[Atom]) -> Vec<NodeIndex> {
        self.packages
            .get(package)
            .map(|ids| {
                ids.iter()
                    .filter_map(|&id| self.file(id).map(|f| f.root))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn file_roots(&self) -> Vec<NodeIndex> {
        self.files.iter().map(|f| f.root).collect()
    }
}

#[cfg(test)]
#[path = "../tests/source_tests.rs"]
mod source_tests;
