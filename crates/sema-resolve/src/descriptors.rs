//! Descriptors: semantic objects for resolved declarations.
//!
//! A descriptor holds what is known about a declaration once its header has
//! been read: name, modifiers, type parameters and the resolved value
//! parameter types of callables. Anything that may need expression typing
//! (return types, property types, bounds, supertypes, alias expansions)
//! lives in separate lazy cells keyed by the descriptor's [`DefId`].
//!
//! Descriptors are shared through `Rc`; asking twice for the descriptor of
//! a declaration returns the same allocation.

use sema_common::{Atom, DefId};
use sema_syntax::{ClassKind, Modifiers, NodeIndex};
use sema_types::{TypeId, Variance};
use std::rc::Rc;

#[derive(Clone, Debug)]
pub struct ClassDescriptor {
    pub def: DefId,
    pub node: NodeIndex,
    pub name: Atom,
    pub kind: ClassKind,
    pub modifiers: Modifiers,
    pub type_parameters: Vec<DefId>,
    pub is_local: bool,
    pub platform: bool,
}

impl ClassDescriptor {
    /// Abstract classes and interfaces cannot be instantiated.
    pub fn is_abstract(&self) -> bool {
        self.kind == ClassKind::Interface || self.modifiers.contains(Modifiers::ABSTRACT)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FunctionKind {
    Function,
    Constructor,
}

#[derive(Clone, Debug)]
pub struct FunctionDescriptor {
    pub def: DefId,
    /// The function declaration, or the class node for constructors.
    pub node: NodeIndex,
    pub name: Atom,
    pub kind: FunctionKind,
    pub modifiers: Modifiers,
    pub type_parameters: Vec<DefId>,
    pub extension_receiver: Option<TypeId>,
    /// Class declaring this member.
    pub dispatch_receiver: Option<DefId>,
    pub value_parameters: Vec<Rc<ValueParameterDescriptor>>,
    /// Known up front for constructors; everything else goes through the
    /// return-type cell.
    pub fixed_return_type: Option<TypeId>,
    /// Class a constructor instantiates.
    pub constructed_class: Option<DefId>,
    pub is_local: bool,
    pub platform: bool,
}

impl FunctionDescriptor {
    pub fn is_constructor(&self) -> bool {
        self.kind == FunctionKind::Constructor
    }

    pub fn is_extension(&self) -> bool {
        self.extension_receiver.is_some()
    }
}

#[derive(Clone, Debug)]
pub struct PropertyDescriptor {
    pub def: DefId,
    /// `Property` node, or the `Parameter` node of a `val`/`var` constructor
    /// parameter.
    pub node: NodeIndex,
    pub name: Atom,
    pub mutable: bool,
    pub modifiers: Modifiers,
    pub dispatch_receiver: Option<DefId>,
    pub is_local: bool,
    pub from_constructor: bool,
    pub platform: bool,
}

#[derive(Clone, Debug)]
pub struct TypeAliasDescriptor {
    pub def: DefId,
    pub node: NodeIndex,
    pub name: Atom,
    pub type_parameters: Vec<DefId>,
    pub platform: bool,
}

#[derive(Clone, Debug)]
pub struct TypeParameterDescriptor {
    pub def: DefId,
    pub node: NodeIndex,
    pub name: Atom,
    pub variance: Variance,
    pub owner: DefId,
    pub index: usize,
}

#[derive(Clone, Debug)]
pub struct ValueParameterDescriptor {
    pub def: DefId,
    /// `Parameter` node; the lambda node for an implicit `it`.
    pub node: NodeIndex,
    pub name: Atom,
    /// Declared type. For `vararg` parameters this is the element type.
    /// `ERROR` when the parameter has no type mention (lambda and loop
    /// variables get their type from the binding trace).
    pub ty: TypeId,
    pub declared: bool,
    pub has_default: bool,
    pub vararg: bool,
    pub index: usize,
    pub owner: DefId,
}

/// Sentinel for declarations whose resolution re-entered itself.
#[derive(Clone, Debug)]
pub struct ErrorDescriptor {
    pub def: DefId,
    pub node: NodeIndex,
    pub name: Atom,
}

#[derive(Clone, Debug)]
pub enum Descriptor {
    Class(Rc<ClassDescriptor>),
    Function(Rc<FunctionDescriptor>),
    Property(Rc<PropertyDescriptor>),
    TypeAlias(Rc<TypeAliasDescriptor>),
    TypeParameter(Rc<TypeParameterDescriptor>),
    ValueParameter(Rc<ValueParameterDescriptor>),
    Error(Rc<ErrorDescriptor>),
}

impl Descriptor {
    pub fn def(&self) -> DefId {
        match self {
            Descriptor::Class(d) => d.def,
            Descriptor::Function(d) => d.def,
            Descriptor::Property(d) => d.def,
            Descriptor::TypeAlias(d) => d.def,
            Descriptor::TypeParameter(d) => d.def,
            Descriptor::ValueParameter(d) => d.def,
            Descriptor::Error(d) => d.def,
        }
    }

    pub fn node(&self) -> NodeIndex {
        match self {
            Descriptor::Class(d) => d.node,
            Descriptor::Function(d) => d.node,
            Descriptor::Property(d) => d.node,
            Descriptor::TypeAlias(d) => d.node,
            Descriptor::TypeParameter(d) => d.node,
            Descriptor::ValueParameter(d) => d.node,
            Descriptor::Error(d) => d.node,
        }
    }

    pub fn name(&self) -> Atom {
        match self {
            Descriptor::Class(d) => d.name,
            Descriptor::Function(d) => d.name,
            Descriptor::Property(d) => d.name,
            Descriptor::TypeAlias(d) => d.name,
            Descriptor::TypeParameter(d) => d.name,
            Descriptor::ValueParameter(d) => d.name,
            Descriptor::Error(d) => d.name,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Descriptor::Class(_) => "class",
            Descriptor::Function(_) => "function",
            Descriptor::Property(_) => "property",
            Descriptor::TypeAlias(_) => "type alias",
            Descriptor::TypeParameter(_) => "type parameter",
            Descriptor::ValueParameter(_) => "value parameter",
            Descriptor::Error(_) => "error",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Descriptor::Error(_))
    }

    /// Same underlying allocation.
    pub fn ptr_eq(&self, other: &Descriptor) -> bool {
        match (self, other) {
            (Descriptor::Class(a), Descriptor::Class(b)) => Rc::ptr_eq(a, b),
            (Descriptor::Function(a), Descriptor::Function(b)) => Rc::ptr_eq(a, b),
            (Descriptor::Property(a), Descriptor::Property(b)) => Rc::ptr_eq(a, b),
            (Descriptor::TypeAlias(a), Descriptor::TypeAlias(b)) => Rc::ptr_eq(a, b),
            (Descriptor::TypeParameter(a), Descriptor::TypeParameter(b)) => Rc::ptr_eq(a, b),
            (Descriptor::ValueParameter(a), Descriptor::ValueParameter(b)) => Rc::ptr_eq(a, b),
            (Descriptor::Error(a), Descriptor::Error(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub fn as_class(&self) -> Option<&Rc<ClassDescriptor>> {
        match self {
            Descriptor::Class(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Rc<FunctionDescriptor>> {
        match self {
            Descriptor::Function(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_property(&self) -> Option<&Rc<PropertyDescriptor>> {
        match self {
            Descriptor::Property(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_type_alias(&self) -> Option<&Rc<TypeAliasDescriptor>> {
        match self {
            Descriptor::TypeAlias(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_type_parameter(&self) -> Option<&Rc<TypeParameterDescriptor>> {
        match self {
            Descriptor::TypeParameter(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_value_parameter(&self) -> Option<&Rc<ValueParameterDescriptor>> {
        match self {
            Descriptor::ValueParameter(d) => Some(d),
            _ => None,
        }
    }
}
