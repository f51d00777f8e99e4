//! Candidate evaluation and most-specific selection.
//!
//! Evaluating a candidate builds a fresh constraint system for its type
//! parameters and feeds it every argument: preliminary argument types as
//! lower bounds of their parameter types, lambdas once the parameter types
//! they need are fixed. A candidate whose constraints cannot hold is
//! discarded with the reason recorded for diagnostics.

use super::arguments::{
    map_arguments, ArgumentMapping, ArgumentTypes, MappingError, Signature, SignatureParam,
};
use super::{CallSite, Callee, Candidate};
use crate::context::ResolveContext;
use crate::error::ResolveResult;
use sema_common::limits::MAX_LAMBDA_INFERENCE_ROUNDS;
use sema_syntax::{NodeIndex, NodeKind};
use sema_types::{
    ConstraintSystem, InferenceError, InferenceVar, Substitution, TypeData, TypeEnvironment, TypeId,
};
use tracing::{debug, trace};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Applicability {
    Applicable,
    ArgumentMismatch {
        index: usize,
        actual: TypeId,
        expected: TypeId,
    },
    TooManyArguments {
        first_extra: usize,
    },
    NoValueFor(usize),
    WrongTypeArgumentCount {
        expected: usize,
        given: usize,
    },
    InferenceFailed(String),
    ReceiverMismatch {
        actual: TypeId,
        expected: TypeId,
    },
}

/// A candidate after evaluation against one call site.
#[derive(Clone)]
pub(crate) struct Evaluation {
    pub candidate: Candidate,
    pub signature: Signature,
    pub mapping: Option<ArgumentMapping>,
    pub applicability: Applicability,
    /// An `Int` literal was widened to `Long`.
    pub coerced: bool,
    /// Type parameters of the signature to their solved types.
    pub solution: Substitution,
    pub type_arguments: Vec<TypeId>,
}

impl Evaluation {
    pub fn is_applicable(&self) -> bool {
        self.applicability == Applicability::Applicable
    }

    /// Final type of parameter `param`, element type for a `vararg`.
    pub fn parameter_type(&self, ctx: &ResolveContext, param: usize) -> TypeId {
        self.signature
            .params
            .get(param)
            .map_or(TypeId::ERROR, |p| self.solution.apply(&ctx.types, p.ty))
    }
}

pub(crate) enum Choice {
    Winner(usize),
    /// Indices of the equally specific applicable candidates.
    Ambiguous(Vec<usize>),
    NoneApplicable,
}

/// Inference state of one evaluation.
struct Inference<'a> {
    system: ConstraintSystem<'a>,
    vars: Vec<InferenceVar>,
    /// Type parameters to their inference variables.
    to_vars: Substitution,
    /// First explicit type argument that could not be fixed.
    explicit_conflict: Option<InferenceError>,
}

impl ResolveContext {
    pub(crate) fn signature_of(&self, candidate: &Candidate) -> Signature {
        let subst = &candidate.class_subst;
        match &candidate.callee {
            Callee::Function(function) => Signature {
                type_parameters: function
                    .type_parameters
                    .iter()
                    .copied()
                    .filter(|&tp| subst.param(tp).is_none())
                    .collect(),
                params: function
                    .value_parameters
                    .iter()
                    .map(|p| SignatureParam {
                        name: Some(p.name),
                        ty: subst.apply(&self.types, p.ty),
                        vararg: p.vararg,
                        has_default: p.has_default,
                    })
                    .collect(),
                extension_receiver: function
                    .extension_receiver
                    .map(|r| subst.apply(&self.types, r)),
            },
            Callee::AliasConstructor { ctor, alias } => Signature {
                type_parameters: alias.type_parameters.clone(),
                params: ctor
                    .value_parameters
                    .iter()
                    .map(|p| SignatureParam {
                        name: Some(p.name),
                        ty: subst.apply(&self.types, p.ty),
                        vararg: p.vararg,
                        has_default: p.has_default,
                    })
                    .collect(),
                extension_receiver: None,
            },
            Callee::Invoke { fn_type, .. } => {
                let params = match self.types.lookup(*fn_type) {
                    TypeData::Function { params, .. } => params
                        .iter()
                        .map(|&ty| SignatureParam {
                            name: None,
                            ty,
                            vararg: false,
                            has_default: false,
                        })
                        .collect(),
                    _ => Vec::new(),
                };
                Signature {
                    type_parameters: Vec::new(),
                    params,
                    extension_receiver: None,
                }
            }
        }
    }

    /// Declared return type of the candidate with class type arguments
    /// substituted. Computed for winners only: it may need body typing.
    pub(crate) fn candidate_return_type(&self, candidate: &Candidate) -> ResolveResult<TypeId> {
        let declared = match &candidate.callee {
            Callee::Function(function) => self.return_type(function)?,
            Callee::AliasConstructor { ctor, .. } => ctor.fixed_return_type.unwrap_or(TypeId::ERROR),
            Callee::Invoke { fn_type, .. } => match self.types.lookup(*fn_type) {
                TypeData::Function { ret, .. } => ret,
                _ => TypeId::ERROR,
            },
        };
        Ok(candidate.class_subst.apply(&self.types, declared))
    }

    fn is_int_literal(&self, node: NodeIndex) -> bool {
        matches!(self.kind(node), Ok(NodeKind::IntLiteral(_)))
    }

    fn is_long(&self, ty: TypeId) -> ResolveResult<bool> {
        let long = self.builtins().long_type()?;
        Ok(!long.is_error() && self.types.make_non_null(self.types.lower_bound(ty)) == long)
    }

    /// Evaluate `candidate` against the arguments of `site`. With an
    /// `expected` type the return type takes part in inference as well.
    pub(crate) fn evaluate_candidate(
        &self,
        candidate: Candidate,
        site: &CallSite<'_>,
        args: &ArgumentTypes,
        explicit: &[TypeId],
        expected: Option<TypeId>,
    ) -> ResolveResult<Evaluation> {
        let signature = self.signature_of(&candidate);
        let mut evaluation = Evaluation {
            candidate,
            signature,
            mapping: None,
            applicability: Applicability::Applicable,
            coerced: false,
            solution: Substitution::new(),
            type_arguments: Vec::new(),
        };

        let type_params = evaluation.signature.type_parameters.len();
        if !explicit.is_empty() && explicit.len() != type_params {
            evaluation.applicability = Applicability::WrongTypeArgumentCount {
                expected: type_params,
                given: explicit.len(),
            };
            return Ok(evaluation);
        }
        let mapping = match map_arguments(&evaluation.signature.params, site.args.len()) {
            Ok(mapping) => mapping,
            Err(MappingError::TooManyArguments { first_extra }) => {
                evaluation.applicability = Applicability::TooManyArguments { first_extra };
                return Ok(evaluation);
            }
            Err(MappingError::NoValueFor(param)) => {
                evaluation.applicability = Applicability::NoValueFor(param);
                return Ok(evaluation);
            }
        };

        let mut inference = self.start_inference(&evaluation.signature, explicit)?;
        if let Some(error) = inference.explicit_conflict.take() {
            let message = self.describe_inference_error(&inference.system, &error);
            evaluation.applicability = Applicability::InferenceFailed(message);
            evaluation.mapping = Some(mapping);
            return Ok(evaluation);
        }
        let mut checker = self.checker();
        let to_vars = inference.to_vars.clone();

        if let (Some(declared), Some(actual)) = (
            evaluation.signature.extension_receiver,
            evaluation.candidate.extension_receiver,
        ) {
            let declared = to_vars.apply(&self.types, declared);
            if !inference.system.add_subtype_constraint(&mut checker, actual, declared) {
                evaluation.applicability = Applicability::ReceiverMismatch {
                    actual,
                    expected: declared,
                };
                evaluation.mapping = Some(mapping);
                return Ok(evaluation);
            }
        }

        let mut lambdas = Vec::new();
        for (index, &param) in mapping.parameter_of.iter().enumerate() {
            let Some(actual) = args.prelim.get(index).copied().flatten() else {
                lambdas.push(index);
                continue;
            };
            let expected_param = to_vars.apply(&self.types, evaluation.signature.params[param].ty);
            if self.is_int_literal(site.args[index])
                && actual == self.builtins().int_type()?
                && self.is_long(expected_param)?
            {
                evaluation.coerced = true;
                continue;
            }
            if !inference
                .system
                .add_subtype_constraint(&mut checker, actual, expected_param)
            {
                evaluation.applicability = Applicability::ArgumentMismatch {
                    index,
                    actual,
                    expected: expected_param,
                };
                evaluation.mapping = Some(mapping);
                return Ok(evaluation);
            }
        }

        let mut rounds = 0;
        while !lambdas.is_empty() && rounds < MAX_LAMBDA_INFERENCE_ROUNDS {
            rounds += 1;
            let before = lambdas.len();
            let partial = inference.system.partial_solution(&mut checker);
            let mut pending = Vec::new();
            for index in lambdas {
                let lambda = site.args[index];
                let param = mapping.parameter_of[index];
                let declared = to_vars.apply(&self.types, evaluation.signature.params[param].ty);
                let known = partial.apply(&self.types, declared);
                if !self.lambda_is_ready(lambda, known)? {
                    pending.push(index);
                    continue;
                }
                let expected_lambda = self.function_type_of(known);
                let lambda_type = self.speculative_type(lambda, expected_lambda)?;
                trace!(arg = index, lambda = %self.render_type(lambda_type), "typed lambda argument");
                if !inference
                    .system
                    .add_subtype_constraint(&mut checker, lambda_type, declared)
                {
                    evaluation.applicability = Applicability::ArgumentMismatch {
                        index,
                        actual: lambda_type,
                        expected: known,
                    };
                    evaluation.mapping = Some(mapping);
                    return Ok(evaluation);
                }
            }
            let stalled = pending.len() == before;
            lambdas = pending;
            if stalled {
                break;
            }
        }
        if !lambdas.is_empty() {
            evaluation.applicability = Applicability::InferenceFailed(
                "cannot infer the parameter types of a lambda argument".to_string(),
            );
            evaluation.mapping = Some(mapping);
            return Ok(evaluation);
        }

        if let Some(expected) = expected
            && !expected.is_error()
        {
            let ret = self.candidate_return_type(&evaluation.candidate)?;
            let ret = to_vars.apply(&self.types, ret);
            if self.types.contains_inference_vars(ret) {
                inference.system.add_subtype_constraint(&mut checker, ret, expected);
            }
        }

        match inference.system.solve(&mut checker) {
            Ok(solution) => {
                for (&param, &var) in evaluation.signature.type_parameters.iter().zip(&inference.vars) {
                    let ty = solution.apply(&self.types, inference.system.var_type(var));
                    evaluation.solution.insert_param(param, ty);
                    evaluation.type_arguments.push(ty);
                }
            }
            Err(error) => {
                let message = self.describe_inference_error(&inference.system, &error);
                debug!(%message, "candidate inference failed");
                evaluation.applicability = Applicability::InferenceFailed(message);
            }
        }
        evaluation.mapping = Some(mapping);
        Ok(evaluation)
    }

    fn start_inference(&self, signature: &Signature, explicit: &[TypeId]) -> ResolveResult<Inference<'_>> {
        let mut system = ConstraintSystem::new(&self.types);
        let mut to_vars = Substitution::new();
        let mut vars = Vec::with_capacity(signature.type_parameters.len());
        let mut explicit_conflict = None;
        for &param in &signature.type_parameters {
            let var = system.fresh_var(param);
            to_vars.insert_param(param, system.var_type(var));
            vars.push(var);
        }
        for (i, (&param, &var)) in signature.type_parameters.iter().zip(&vars).enumerate() {
            match explicit.get(i) {
                // Explicit arguments are checked against their bounds by the
                // completer.
                Some(&arg) => {
                    if let Err(error) = system.unify_var_type(var, arg) {
                        explicit_conflict.get_or_insert(error);
                    }
                }
                None => {
                    let bound = self.type_parameter_bound(param)?;
                    system.set_declared_bound(var, to_vars.apply(&self.types, bound));
                }
            }
        }
        Ok(Inference {
            system,
            vars,
            to_vars,
            explicit_conflict,
        })
    }

    /// A lambda can be typed once the parameter types it would take from
    /// `expected` contain no inference variables, or when it declares all
    /// of them itself.
    fn lambda_is_ready(&self, lambda: NodeIndex, expected: TypeId) -> ResolveResult<bool> {
        let TypeData::Function { params, .. } = self.types.lookup(self.types.lower_bound(expected)) else {
            return Ok(true);
        };
        if params.iter().all(|&p| !self.types.contains_inference_vars(p)) {
            return Ok(true);
        }
        let NodeKind::Lambda(data) = self.kind(lambda)? else {
            return Ok(true);
        };
        if data.params.is_empty() {
            return Ok(false);
        }
        for &param in &data.params {
            match self.kind(param)? {
                NodeKind::Parameter(p) if p.type_ref.is_some() => {}
                _ => return Ok(false),
            }
        }
        Ok(true)
    }

    /// Type an expression in a layer that is discarded afterwards.
    pub(crate) fn speculative_type(&self, node: NodeIndex, expected: Option<TypeId>) -> ResolveResult<TypeId> {
        self.trace.borrow_mut().push_layer();
        let result = self.type_expression(node, expected);
        drop(self.trace.borrow_mut().take_layer());
        result
    }

    fn describe_inference_error(&self, system: &ConstraintSystem<'_>, error: &InferenceError) -> String {
        match error {
            InferenceError::Conflict(a, b) => format!(
                "{} conflicts with {}",
                self.render_type(*a),
                self.render_type(*b)
            ),
            InferenceError::BoundsViolation { var, lower, upper } => {
                let name = system
                    .param_of(*var)
                    .and_then(|p| self.type_parameter_by_def(p))
                    .map_or_else(|| "?".to_string(), |p| self.text(p.name).to_string());
                format!(
                    "{name} cannot be both a supertype of {} and a subtype of {}",
                    self.render_type(*lower),
                    self.render_type(*upper)
                )
            }
        }
    }

    // =========================================================================
    // Most specific candidate
    // =========================================================================

    pub(crate) fn choose_most_specific(&self, evaluations: &[Evaluation], args: &[NodeIndex]) -> Choice {
        let applicable: Vec<usize> = (0..evaluations.len())
            .filter(|&i| evaluations[i].is_applicable())
            .collect();
        if applicable.is_empty() {
            return Choice::NoneApplicable;
        }
        let exact: Vec<usize> = applicable
            .iter()
            .copied()
            .filter(|&i| !evaluations[i].coerced)
            .collect();
        let pool = if exact.is_empty() { applicable } else { exact };
        if let [only] = pool.as_slice() {
            return Choice::Winner(*only);
        }

        let n = pool.len();
        let mut dominates = vec![vec![false; n]; n];
        for a in 0..n {
            for b in 0..n {
                if a != b {
                    dominates[a][b] = self.is_at_least_as_specific(
                        &evaluations[pool[a]],
                        &evaluations[pool[b]],
                        args.len(),
                    );
                }
            }
        }
        let best: Vec<usize> = (0..n)
            .filter(|&a| (0..n).all(|b| a == b || dominates[a][b]))
            .collect();
        if let [only] = best.as_slice() {
            return Choice::Winner(pool[*only]);
        }
        let maximal: Vec<usize> = (0..n)
            .filter(|&a| (0..n).all(|b| a == b || !dominates[b][a] || dominates[a][b]))
            .collect();
        let mut tied: Vec<usize> = maximal.into_iter().map(|i| pool[i]).collect();

        let policy = self.options.tie_break;
        if policy.prefer_non_default {
            narrow(&mut tied, |i| {
                evaluations[i].mapping.as_ref().is_some_and(|m| !m.uses_defaults)
            });
        }
        if policy.prefer_non_generic {
            narrow(&mut tied, |i| evaluations[i].signature.type_parameters.is_empty());
        }
        match tied.as_slice() {
            [only] => Choice::Winner(*only),
            _ => Choice::Ambiguous(tied),
        }
    }

    /// Whether `a` can be called with any arguments `b` accepts: each of
    /// `a`'s parameter types fits the corresponding one of `b`, with `b`'s
    /// type parameters free to be inferred.
    fn is_at_least_as_specific(&self, a: &Evaluation, b: &Evaluation, count: usize) -> bool {
        let (Some(map_a), Some(map_b)) = (&a.mapping, &b.mapping) else {
            return false;
        };
        let mut system = ConstraintSystem::new(&self.types);
        let mut checker = self.checker();
        let mut to_vars = Substitution::new();
        let mut vars = Vec::new();
        for &param in &b.signature.type_parameters {
            let var = system.fresh_var(param);
            to_vars.insert_param(param, system.var_type(var));
            vars.push((param, var));
        }
        for (param, var) in vars {
            let bound = TypeEnvironment::upper_bound(self, param);
            system.set_declared_bound(var, to_vars.apply(&self.types, bound));
        }

        if let (Some(ra), Some(rb)) = (a.signature.extension_receiver, b.signature.extension_receiver)
            && !system.add_subtype_constraint(&mut checker, ra, to_vars.apply(&self.types, rb))
        {
            return false;
        }
        for i in 0..count {
            let (Some(&pa), Some(&pb)) = (map_a.parameter_of.get(i), map_b.parameter_of.get(i)) else {
                return false;
            };
            let ta = a.signature.params[pa].ty;
            let tb = to_vars.apply(&self.types, b.signature.params[pb].ty);
            if !system.add_subtype_constraint(&mut checker, ta, tb) {
                return false;
            }
        }
        system.solve(&mut checker).is_ok()
    }
}

/// Keep the entries satisfying `keep`, unless none does.
fn narrow(tied: &mut Vec<usize>, keep: impl Fn(usize) -> bool) {
    if tied.iter().any(|&i| keep(i)) {
        tied.retain(|&i| keep(i));
    }
}
