//! Declaration index consumed by the resolution core.
//!
//! The core never walks container bodies to discover declarations on its
//! own; it asks a `DeclarationProvider`. Every method returns syntax nodes
//! in source order, never descriptors.

use crate::ast::NodeIndex;
use sema_common::Atom;

/// Maps containers (files, class bodies, blocks) to their child declarations.
pub trait DeclarationProvider {
    fn classes(&self, container: NodeIndex) -> Vec<NodeIndex>;

    fn functions(&self, container: NodeIndex) -> Vec<NodeIndex>;

    fn properties(&self, container: NodeIndex) -> Vec<NodeIndex>;

    fn type_aliases(&self, container: NodeIndex) -> Vec<NodeIndex>;

    /// Import directives of a file, in declaration order.
    fn imports(&self, file: NodeIndex) -> Vec<NodeIndex>;

    /// Package path declared by a file (empty for the root package).
    fn package_of(&self, file: NodeIndex) -> Vec<Atom>;

    /// Root nodes of every file declaring `package`.
    fn package_files(&self, package: &[Atom]) -> Vec<NodeIndex>;

    /// Root nodes of all files, in the order they were added.
    fn file_roots(&self) -> Vec<NodeIndex>;
}
