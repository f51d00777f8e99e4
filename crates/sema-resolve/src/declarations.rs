//! Lazy declaration resolution.
//!
//! Descriptors are created on first request and memoized per syntax node,
//! so asking twice yields the same `Rc`. Creating a descriptor reads only
//! the declaration header: type parameters are registered first, then
//! parameter and receiver types are resolved in the signature scope. Facts
//! that may need expression typing (return types, property types, bodies)
//! are separate lazy cells chained off the descriptor's `DefId`.
//!
//! Re-entering a cell whose computation is on the stack is a cycle. The
//! cell answers with the error type (or an error descriptor) and a single
//! `CyclicDependency` diagnostic at the declaration's name.

use crate::context::ResolveContext;
use crate::descriptors::{
    ClassDescriptor, Descriptor, ErrorDescriptor, FunctionDescriptor, FunctionKind,
    PropertyDescriptor, TypeAliasDescriptor, TypeParameterDescriptor, ValueParameterDescriptor,
};
use crate::error::ResolveResult;
use crate::memo::SlotState;
use crate::scope::ValueHit;
use sema_common::{DefId, DiagnosticKind};
use sema_syntax::{ClassKind, Modifiers, NodeIndex, NodeKind};
use sema_types::{TypeId, Variance};
use std::rc::Rc;
use tracing::{debug, trace};

fn map_variance(variance: sema_syntax::Variance) -> Variance {
    match variance {
        sema_syntax::Variance::Invariant => Variance::Invariant,
        sema_syntax::Variance::In => Variance::In,
        sema_syntax::Variance::Out => Variance::Out,
    }
}

impl ResolveContext {
    // =========================================================================
    // Descriptors
    // =========================================================================

    pub(crate) fn descriptor_of(&self, node: NodeIndex) -> ResolveResult<Descriptor> {
        match self.kind(node)? {
            NodeKind::TypeParameter(_) => self.owned_descriptor(node),
            NodeKind::Parameter(param) => {
                let owner = self.parent(node);
                match self.kind(owner)? {
                    NodeKind::Class(_) if param.property.is_some() => self.memoized_descriptor(node),
                    NodeKind::Lambda(_) | NodeKind::For(_) => self.memoized_descriptor(node),
                    _ => self.owned_descriptor(node),
                }
            }
            NodeKind::Class(_)
            | NodeKind::Function(_)
            | NodeKind::Property(_)
            | NodeKind::TypeAlias(_) => self.memoized_descriptor(node),
            _ => Err(self.unexpected(node, "declaration")),
        }
    }

    pub(crate) fn class_descriptor_of(&self, node: NodeIndex) -> ResolveResult<Rc<ClassDescriptor>> {
        self.descriptor_of(node)?
            .as_class()
            .cloned()
            .ok_or_else(|| self.unexpected(node, "class"))
    }

    pub(crate) fn function_descriptor_of(
        &self,
        node: NodeIndex,
    ) -> ResolveResult<Rc<FunctionDescriptor>> {
        self.descriptor_of(node)?
            .as_function()
            .cloned()
            .ok_or_else(|| self.unexpected(node, "function"))
    }

    pub(crate) fn property_descriptor_of(
        &self,
        node: NodeIndex,
    ) -> ResolveResult<Rc<PropertyDescriptor>> {
        self.descriptor_of(node)?
            .as_property()
            .cloned()
            .ok_or_else(|| self.unexpected(node, "property"))
    }

    pub(crate) fn type_alias_descriptor_of(
        &self,
        node: NodeIndex,
    ) -> ResolveResult<Rc<TypeAliasDescriptor>> {
        self.descriptor_of(node)?
            .as_type_alias()
            .cloned()
            .ok_or_else(|| self.unexpected(node, "type alias"))
    }

    fn memoized_descriptor(&self, node: NodeIndex) -> ResolveResult<Descriptor> {
        self.memoized(
            &self.cells.descriptors,
            node,
            || self.create_descriptor(node),
            || {
                self.report_cycle(node);
                self.error_descriptor(node)
            },
        )
    }

    /// Type parameters and function parameters are created by their owner.
    fn owned_descriptor(&self, node: NodeIndex) -> ResolveResult<Descriptor> {
        if self.registered_def(node).is_none() {
            let owner = self.parent(node);
            match self.kind(owner)? {
                NodeKind::Class(_) if matches!(self.kind(node)?, NodeKind::Parameter(_)) => {
                    let class = self.class_descriptor_of(owner)?;
                    self.class_constructor(class.def)?;
                }
                _ => {
                    self.descriptor_of(owner)?;
                }
            }
        }
        if let Some(descriptor) = self
            .registered_def(node)
            .and_then(|def| self.descriptor_by_def(def))
        {
            return Ok(descriptor);
        }
        // The owner collapsed into an error descriptor.
        self.memoized(
            &self.cells.descriptors,
            node,
            || Ok(self.error_descriptor(node)),
            || self.error_descriptor(node),
        )
    }

    /// Slot state of the declaration that creates `node` as part of itself:
    /// the owner of a type parameter or function parameter, the primary
    /// constructor for a plain class parameter. `None` for nodes with a
    /// slot of their own.
    pub(crate) fn owner_slot_state(&self, node: NodeIndex) -> Option<SlotState> {
        let arena = self.sources.arena();
        let owner = arena.parent(node);
        match (arena.kind(node)?, arena.kind(owner)?) {
            (NodeKind::TypeParameter(_), _) | (NodeKind::Parameter(_), NodeKind::Function(_)) => {
                Some(self.cells.descriptors.state(owner))
            }
            (NodeKind::Parameter(param), NodeKind::Class(_)) if param.property.is_none() => {
                match self.cells.descriptors.peek(owner) {
                    Some(class) => Some(self.cells.constructors.state(class.def())),
                    None => Some(self.cells.descriptors.state(owner)),
                }
            }
            _ => None,
        }
    }

    fn error_descriptor(&self, node: NodeIndex) -> Descriptor {
        let descriptor = Descriptor::Error(Rc::new(ErrorDescriptor {
            def: self.alloc_def(),
            node,
            name: self.sources.arena().declaration_name(node),
        }));
        self.register(descriptor.clone());
        descriptor
    }

    pub(crate) fn report_cycle(&self, node: NodeIndex) {
        let arena = self.sources.arena();
        let name = self.text(arena.declaration_name(node)).to_string();
        debug!(node = node.0, %name, "dependency cycle");
        self.report_at(
            DiagnosticKind::CyclicDependency,
            node,
            arena.name_span(node),
            &[&name],
        );
    }

    /// Declared directly in a block.
    fn is_local(&self, node: NodeIndex) -> bool {
        matches!(self.kind(self.parent(node)), Ok(NodeKind::Block(_)))
    }

    /// Class declaring a member, if `node` is a direct member.
    fn dispatch_class(&self, node: NodeIndex) -> ResolveResult<Option<DefId>> {
        let owner = self.parent(node);
        match self.kind(owner)? {
            NodeKind::Class(_) => Ok(Some(self.class_descriptor_of(owner)?.def)),
            _ => Ok(None),
        }
    }

    fn create_descriptor(&self, node: NodeIndex) -> ResolveResult<Descriptor> {
        self.check_cancelled()?;
        trace!(node = node.0, kind = self.kind(node)?.describe(), "creating descriptor");
        let descriptor = match self.kind(node)? {
            NodeKind::Class(data) => {
                let def = self.alloc_def();
                let type_parameters = self.create_type_parameters(&data.type_params, def)?;
                Descriptor::Class(Rc::new(ClassDescriptor {
                    def,
                    node,
                    name: data.name,
                    kind: data.kind,
                    modifiers: data.modifiers,
                    type_parameters,
                    is_local: self.is_local(node),
                    platform: self.is_platform_context(node),
                }))
            }
            NodeKind::Function(data) => {
                let def = self.alloc_def();
                let type_parameters = self.create_type_parameters(&data.type_params, def)?;
                let extension_receiver = match data.receiver.to_option() {
                    Some(receiver) => Some(self.resolve_type(receiver)?),
                    None => None,
                };
                let mut value_parameters = Vec::with_capacity(data.params.len());
                for (index, &param) in data.params.iter().enumerate() {
                    let descriptor = self.create_value_parameter(param, index, def)?;
                    self.register_node(param, descriptor.def);
                    value_parameters.push(descriptor);
                }
                Descriptor::Function(Rc::new(FunctionDescriptor {
                    def,
                    node,
                    name: data.name,
                    kind: FunctionKind::Function,
                    modifiers: data.modifiers,
                    type_parameters,
                    extension_receiver,
                    dispatch_receiver: self.dispatch_class(node)?,
                    value_parameters,
                    fixed_return_type: None,
                    constructed_class: None,
                    is_local: self.is_local(node),
                    platform: self.is_platform_context(node),
                }))
            }
            NodeKind::Property(data) => Descriptor::Property(Rc::new(PropertyDescriptor {
                def: self.alloc_def(),
                node,
                name: data.name,
                mutable: data.mutable,
                modifiers: data.modifiers,
                dispatch_receiver: self.dispatch_class(node)?,
                is_local: self.is_local(node),
                from_constructor: false,
                platform: self.is_platform_context(node),
            })),
            NodeKind::TypeAlias(data) => {
                let def = self.alloc_def();
                let type_parameters = self.create_type_parameters(&data.type_params, def)?;
                Descriptor::TypeAlias(Rc::new(TypeAliasDescriptor {
                    def,
                    node,
                    name: data.name,
                    type_parameters,
                    platform: self.is_platform_context(node),
                }))
            }
            NodeKind::Parameter(data) => {
                let owner = self.parent(node);
                if let NodeKind::Class(_) = self.kind(owner)? {
                    Descriptor::Property(Rc::new(PropertyDescriptor {
                        def: self.alloc_def(),
                        node,
                        name: data.name,
                        mutable: data.property == Some(true),
                        modifiers: Modifiers::empty(),
                        dispatch_receiver: Some(self.class_descriptor_of(owner)?.def),
                        is_local: false,
                        from_constructor: true,
                        platform: self.is_platform_context(node),
                    }))
                } else {
                    let index = self
                        .sources
                        .arena()
                        .children(owner)
                        .iter()
                        .position(|&c| c == node)
                        .unwrap_or(0);
                    Descriptor::ValueParameter(self.create_value_parameter(node, index, DefId::INVALID)?)
                }
            }
            _ => return Err(self.unexpected(node, "declaration")),
        };
        self.register(descriptor.clone());
        Ok(descriptor)
    }

    fn create_type_parameters(&self, nodes: &[NodeIndex], owner: DefId) -> ResolveResult<Vec<DefId>> {
        let mut defs = Vec::with_capacity(nodes.len());
        for (index, &node) in nodes.iter().enumerate() {
            let NodeKind::TypeParameter(data) = self.kind(node)? else {
                return Err(self.unexpected(node, "type parameter"));
            };
            let descriptor = Rc::new(TypeParameterDescriptor {
                def: self.alloc_def(),
                node,
                name: data.name,
                variance: map_variance(data.variance),
                owner,
                index,
            });
            self.register_node(node, descriptor.def);
            self.register(Descriptor::TypeParameter(descriptor.clone()));
            defs.push(descriptor.def);
        }
        Ok(defs)
    }

    fn create_value_parameter(
        &self,
        node: NodeIndex,
        index: usize,
        owner: DefId,
    ) -> ResolveResult<Rc<ValueParameterDescriptor>> {
        let NodeKind::Parameter(data) = self.kind(node)? else {
            return Err(self.unexpected(node, "parameter"));
        };
        let ty = if data.type_ref.is_some() {
            self.resolve_type(data.type_ref)?
        } else {
            TypeId::ERROR
        };
        let descriptor = Rc::new(ValueParameterDescriptor {
            def: self.alloc_def(),
            node,
            name: data.name,
            ty,
            declared: data.type_ref.is_some(),
            has_default: data.default.is_some(),
            vararg: data.vararg,
            index,
            owner,
        });
        self.register(Descriptor::ValueParameter(descriptor.clone()));
        Ok(descriptor)
    }

    /// `Foo<T1, .., Tn>` seen from inside `Foo`.
    pub(crate) fn class_self_type(&self, class: &ClassDescriptor) -> ResolveResult<TypeId> {
        if self.builtins().is(class.def, "Nothing")? {
            return Ok(TypeId::NOTHING);
        }
        let args: Vec<TypeId> = class
            .type_parameters
            .iter()
            .map(|&tp| self.types.type_param(tp, false))
            .collect();
        Ok(self.types.class(class.def, args, false))
    }

    /// The primary constructor of a class. Every class has one, even
    /// without a parameter list; interfaces and abstract classes too, so
    /// that instantiating them resolves and can be reported.
    pub(crate) fn class_constructor(&self, def: DefId) -> ResolveResult<Option<Rc<FunctionDescriptor>>> {
        let Some(class) = self.class_by_def(def) else {
            return Ok(None);
        };
        self.memoized(
            &self.cells.constructors,
            def,
            || {
                let NodeKind::Class(data) = self.kind(class.node)? else {
                    return Err(self.unexpected(class.node, "class"));
                };
                let ctor = self.alloc_def();
                let mut value_parameters = Vec::with_capacity(data.constructor_params.len());
                for (index, &param) in data.constructor_params.iter().enumerate() {
                    let descriptor = self.create_value_parameter(param, index, ctor)?;
                    if let NodeKind::Parameter(p) = self.kind(param)?
                        && p.property.is_none()
                    {
                        self.register_node(param, descriptor.def);
                    }
                    value_parameters.push(descriptor);
                }
                let descriptor = Rc::new(FunctionDescriptor {
                    def: ctor,
                    node: class.node,
                    name: class.name,
                    kind: FunctionKind::Constructor,
                    modifiers: class.modifiers,
                    type_parameters: class.type_parameters.clone(),
                    extension_receiver: None,
                    dispatch_receiver: None,
                    value_parameters,
                    fixed_return_type: Some(self.class_self_type(&class)?),
                    constructed_class: Some(def),
                    is_local: class.is_local,
                    platform: class.platform,
                });
                self.register(Descriptor::Function(descriptor.clone()));
                Ok(Some(descriptor))
            },
            || None,
        )
    }

    /// The implicit `it` parameter of a lambda without declared parameters.
    pub(crate) fn implicit_parameter(
        &self,
        lambda: NodeIndex,
    ) -> ResolveResult<Option<Rc<ValueParameterDescriptor>>> {
        self.memoized(
            &self.cells.implicit_parameters,
            lambda,
            || {
                let descriptor = Rc::new(ValueParameterDescriptor {
                    def: self.alloc_def(),
                    node: lambda,
                    name: self.sources.interner().known("it"),
                    ty: TypeId::ERROR,
                    declared: false,
                    has_default: false,
                    vararg: false,
                    index: 0,
                    owner: DefId::INVALID,
                });
                self.register(Descriptor::ValueParameter(descriptor.clone()));
                Ok(Some(descriptor))
            },
            || None,
        )
    }

    // =========================================================================
    // Lazy cells of callables and properties
    // =========================================================================

    /// Declared return type; inferred from an expression body; `Unit` for
    /// a block body without a declared type.
    pub(crate) fn return_type(&self, function: &FunctionDescriptor) -> ResolveResult<TypeId> {
        if let Some(fixed) = function.fixed_return_type {
            return Ok(fixed);
        }
        self.memoized(
            &self.cells.return_types,
            function.def,
            || {
                let NodeKind::Function(data) = self.kind(function.node)? else {
                    return Err(self.unexpected(function.node, "function"));
                };
                if data.return_type.is_some() {
                    self.resolve_type(data.return_type)
                } else if data.expression_body && data.body.is_some() {
                    self.type_expression(data.body, None)
                } else {
                    self.builtins().unit_type()
                }
            },
            || {
                self.report_cycle(function.node);
                TypeId::ERROR
            },
        )
    }

    /// Whether the return type of `function` is being computed right now.
    pub(crate) fn is_return_type_computing(&self, function: &FunctionDescriptor) -> bool {
        self.cells.return_types.is_computing(function.def)
    }

    pub(crate) fn property_type(&self, property: &PropertyDescriptor) -> ResolveResult<TypeId> {
        if property.is_local {
            return self.local_property_type(property);
        }
        self.memoized(
            &self.cells.property_types,
            property.def,
            || match self.kind(property.node)? {
                NodeKind::Parameter(data) => self.resolve_type(data.type_ref),
                NodeKind::Property(data) => {
                    if data.type_ref.is_some() {
                        self.resolve_type(data.type_ref)
                    } else if data.initializer.is_some() {
                        self.type_expression(data.initializer, None)
                    } else {
                        Ok(TypeId::ERROR)
                    }
                }
                _ => Err(self.unexpected(property.node, "property")),
            },
            || {
                self.report_cycle(property.node);
                TypeId::ERROR
            },
        )
    }

    pub(crate) fn is_property_type_computing(&self, property: &PropertyDescriptor) -> bool {
        self.cells.property_types.is_computing(property.def)
    }

    /// Locals are typed with their enclosing body; the type is read back
    /// from the trace.
    fn local_property_type(&self, property: &PropertyDescriptor) -> ResolveResult<TypeId> {
        let NodeKind::Property(data) = self.kind(property.node)? else {
            return Err(self.unexpected(property.node, "property"));
        };
        if data.type_ref.is_some() {
            return self.resolve_type(data.type_ref);
        }
        let recorded = self.trace.borrow().variable_type(property.node);
        if let Some(ty) = recorded {
            return Ok(ty);
        }
        if let Some(owner) = self.enclosing_body_owner(property.node)
            && !self.cells.bodies.is_computing(owner)
        {
            self.ensure_body(owner)?;
            let recorded = self.trace.borrow().variable_type(property.node);
            if let Some(ty) = recorded {
                return Ok(ty);
            }
        }
        Ok(TypeId::ERROR)
    }

    fn enclosing_body_owner(&self, node: NodeIndex) -> Option<NodeIndex> {
        self.sources.arena().ancestors(node).find(|&a| {
            matches!(
                self.kind(a),
                Ok(NodeKind::Function(_) | NodeKind::Property(_) | NodeKind::Class(_))
            )
        })
    }

    /// Type of a value found by name lookup.
    pub(crate) fn value_type(&self, hit: &ValueHit) -> ResolveResult<(TypeId, Option<DefId>)> {
        let node = match hit {
            ValueHit::Member(member) => return Ok((member.ty, Some(member.descriptor.def))),
            ValueHit::Declaration(node) => *node,
        };
        match self.kind(node)? {
            NodeKind::Lambda(_) => {
                let ty = self.trace.borrow().variable_type(node).unwrap_or(TypeId::ERROR);
                let def = self.implicit_parameter(node)?.map(|p| p.def);
                Ok((ty, def))
            }
            NodeKind::Property(_) => {
                let property = self.property_descriptor_of(node)?;
                Ok((self.property_type(&property)?, Some(property.def)))
            }
            NodeKind::Parameter(_) => match self.descriptor_of(node)? {
                Descriptor::Property(property) => {
                    Ok((self.property_type(&property)?, Some(property.def)))
                }
                Descriptor::ValueParameter(param) if !param.owner.is_valid() => {
                    // Lambda and loop parameters carry their type in the trace.
                    let recorded = self.trace.borrow().variable_type(node);
                    Ok((recorded.unwrap_or(param.ty), Some(param.def)))
                }
                Descriptor::ValueParameter(param) => {
                    let ty = if param.vararg {
                        self.builtins().array_of(param.ty)?
                    } else {
                        param.ty
                    };
                    Ok((ty, Some(param.def)))
                }
                descriptor => Ok((TypeId::ERROR, Some(descriptor.def()))),
            },
            _ => Err(self.unexpected(node, "value declaration")),
        }
    }

    // =========================================================================
    // Bodies
    // =========================================================================

    /// Type-check the body of a declaration once: default values,
    /// initializers, function bodies and, for classes, the delegating
    /// constructor call and every member.
    pub(crate) fn ensure_body(&self, node: NodeIndex) -> ResolveResult<()> {
        self.memoized_collection(&self.cells.bodies, node, || self.check_body(node))
    }

    fn check_body(&self, node: NodeIndex) -> ResolveResult<()> {
        self.check_cancelled()?;
        match self.kind(node)? {
            NodeKind::Function(data) => {
                let function = self.function_descriptor_of(node)?;
                self.check_parameter_defaults(&function)?;
                if data.body.is_none() {
                    return Ok(());
                }
                if data.expression_body && data.return_type.is_some() {
                    let ret = self.return_type(&function)?;
                    self.check_expression(data.body, ret)?;
                } else if data.expression_body {
                    self.return_type(&function)?;
                } else {
                    self.type_expression(data.body, None)?;
                }
            }
            NodeKind::Property(data) => {
                let property = self.property_descriptor_of(node)?;
                if data.type_ref.is_some() && data.initializer.is_some() {
                    let declared = self.property_type(&property)?;
                    self.check_expression(data.initializer, declared)?;
                } else {
                    self.property_type(&property)?;
                }
            }
            NodeKind::Class(data) => {
                let class = self.class_descriptor_of(node)?;
                self.class_supertypes(class.def)?;
                if let Some(ctor) = self.class_constructor(class.def)? {
                    self.check_parameter_defaults(&ctor)?;
                }
                for &param in &data.constructor_params {
                    self.descriptor_of(param)?;
                }
                self.check_delegation(node, &data.supertypes, &data.super_call_args)?;
                for &member in &data.members {
                    self.descriptor_of(member)?;
                    self.ensure_body(member)?;
                }
            }
            NodeKind::TypeAlias(_) => {
                let alias = self.type_alias_descriptor_of(node)?;
                self.alias_expansion(alias.def)?;
            }
            _ => return Err(self.unexpected(node, "declaration with a body")),
        }
        Ok(())
    }

    fn check_parameter_defaults(&self, function: &FunctionDescriptor) -> ResolveResult<()> {
        for param in &function.value_parameters {
            if let NodeKind::Parameter(data) = self.kind(param.node)?
                && data.default.is_some()
            {
                self.check_expression(data.default, param.ty)?;
            }
        }
        Ok(())
    }

    /// Resolve the superclass constructor call of a class header. The
    /// first supertype mention that names a class (not an interface) is
    /// the delegation target.
    fn check_delegation(
        &self,
        class_node: NodeIndex,
        mentions: &[NodeIndex],
        args: &[NodeIndex],
    ) -> ResolveResult<()> {
        for &mention in mentions {
            let ty = self.resolve_type(mention)?;
            let ty = self.types.make_non_null(self.types.lower_bound(ty));
            let Some(superclass) = self
                .types
                .lookup(ty)
                .class_def()
                .and_then(|def| self.class_by_def(def))
            else {
                continue;
            };
            if superclass.kind == ClassKind::Interface {
                continue;
            }
            self.resolve_delegation(class_node, mention, ty, args)?;
            break;
        }
        Ok(())
    }
}
