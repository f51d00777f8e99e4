//! Argument typing and argument-to-parameter mapping.

use crate::context::ResolveContext;
use crate::error::ResolveResult;
use crate::trace::TraceLayer;
use sema_common::{Atom, DefId};
use sema_syntax::{NodeIndex, NodeKind};
use sema_types::TypeId;

/// One value parameter as a candidate sees it: class type arguments are
/// already substituted, the candidate's own type parameters are not.
#[derive(Clone, Debug)]
pub(crate) struct SignatureParam {
    /// `None` for the parameters of a function type.
    pub name: Option<Atom>,
    /// Element type for a `vararg` parameter.
    pub ty: TypeId,
    pub vararg: bool,
    pub has_default: bool,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct Signature {
    /// Type parameters to infer at the call site.
    pub type_parameters: Vec<DefId>,
    pub params: Vec<SignatureParam>,
    pub extension_receiver: Option<TypeId>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ArgumentMapping {
    /// Parameter index of each argument.
    pub parameter_of: Vec<usize>,
    /// Some parameter without an argument takes its default value.
    pub uses_defaults: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum MappingError {
    /// Index of the first argument without a parameter.
    TooManyArguments { first_extra: usize },
    /// Index of a parameter without argument or default.
    NoValueFor(usize),
}

/// Map `count` positional arguments onto `params`. A `vararg` parameter
/// absorbs every remaining argument.
pub(crate) fn map_arguments(
    params: &[SignatureParam],
    count: usize,
) -> Result<ArgumentMapping, MappingError> {
    let mut parameter_of = Vec::with_capacity(count);
    let mut next = 0;
    for index in 0..count {
        match params.get(next) {
            Some(param) if param.vararg => parameter_of.push(next),
            Some(_) => {
                parameter_of.push(next);
                next += 1;
            }
            None => return Err(MappingError::TooManyArguments { first_extra: index }),
        }
    }

    let mut uses_defaults = false;
    for (index, param) in params.iter().enumerate() {
        if param.vararg || parameter_of.contains(&index) {
            continue;
        }
        if !param.has_default {
            return Err(MappingError::NoValueFor(index));
        }
        uses_defaults = true;
    }
    Ok(ArgumentMapping {
        parameter_of,
        uses_defaults,
    })
}

/// Types of the arguments of one call site, computed once without an
/// expected type. Each argument's facts are held in a detached layer until
/// the completer decides whether to keep them.
#[derive(Default)]
pub(crate) struct ArgumentTypes {
    /// `None` for lambdas: their type depends on the parameter they meet.
    pub prelim: Vec<Option<TypeId>>,
    pub layers: Vec<Option<TraceLayer>>,
}

impl ArgumentTypes {
    pub fn take_layer(&mut self, index: usize) -> Option<TraceLayer> {
        self.layers.get_mut(index).and_then(Option::take)
    }
}

impl ResolveContext {
    pub(crate) fn preliminary_argument_types(&self, args: &[NodeIndex]) -> ResolveResult<ArgumentTypes> {
        let mut types = ArgumentTypes {
            prelim: Vec::with_capacity(args.len()),
            layers: Vec::with_capacity(args.len()),
        };
        for &arg in args {
            if let NodeKind::Lambda(_) = self.kind(arg)? {
                types.prelim.push(None);
                types.layers.push(None);
                continue;
            }
            self.trace.borrow_mut().push_layer();
            let result = self.type_expression(arg, None);
            let layer = self.trace.borrow_mut().take_layer();
            types.prelim.push(Some(result?));
            types.layers.push(Some(layer));
        }
        Ok(types)
    }

    /// Commit the preliminary facts of every argument that still holds
    /// them. Lambdas without a parameter type to check against stay
    /// untyped.
    pub(crate) fn commit_preliminary(&self, args: &mut ArgumentTypes) {
        for index in 0..args.layers.len() {
            if let Some(layer) = args.take_layer(index) {
                self.merge_layer(layer);
            }
        }
    }

    pub(crate) fn merge_layer(&self, layer: TraceLayer) {
        if !self.is_cancelled() {
            self.trace.borrow_mut().merge_layer(layer);
        }
    }

    /// Arguments of a call whose receiver already failed.
    pub(crate) fn type_arguments_without_candidate(
        &self,
        site: &super::CallSite<'_>,
        args: &mut ArgumentTypes,
    ) -> ResolveResult<()> {
        for &type_arg in site.type_args {
            self.resolve_type(type_arg)?;
        }
        self.commit_preliminary(args);
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/arguments_tests.rs"]
mod arguments_tests;
