//! Embedded built-in declarations.
//!
//! The built-ins catalogue is ordinary surface-language source compiled into
//! the binary with `include_str!` and parsed into package `builtins` when a
//! [`SourceSet`](crate::SourceSet) is created with
//! [`SourceSet::with_builtins`](crate::SourceSet::with_builtins). Every file
//! default-imports that package.

/// An embedded library file.
#[derive(Debug, Clone, Copy)]
pub struct EmbeddedLib {
    /// The file name used in diagnostics.
    pub file_name: &'static str,
    /// Package the file declares.
    pub package: &'static str,
    pub content: &'static str,
}

pub const BUILTINS: EmbeddedLib = EmbeddedLib {
    file_name: "builtins.sema",
    package: "builtins",
    content: include_str!("../lib/builtins.sema"),
};
