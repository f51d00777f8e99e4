use super::*;
use crate::test_env::TestEnv;
use crate::TypeInterner;

#[test]
fn test_lower_bounds_solve_to_common_supertype() {
    let interner = TypeInterner::new();
    let (mut env, std) = TestEnv::standard(&interner);
    let param = env.type_param("T", Variance::Invariant);
    let int = env.ty(std.int);
    let number = env.ty(std.number);

    let mut checker = SubtypeChecker::new(&interner, &env);
    let mut cs = ConstraintSystem::new(&interner);
    let var = cs.fresh_var(param);
    let var_ty = cs.var_type(var);
    assert!(cs.add_subtype_constraint(&mut checker, int, var_ty));
    assert!(cs.add_subtype_constraint(&mut checker, number, var_ty));

    let solution = cs.solve(&mut checker).expect("solvable");
    assert_eq!(solution.var(var), Some(number));
}

#[test]
fn test_expected_type_gives_upper_bound() {
    let interner = TypeInterner::new();
    let (mut env, std) = TestEnv::standard(&interner);
    let param = env.type_param("T", Variance::Invariant);
    let number = env.ty(std.number);

    let mut checker = SubtypeChecker::new(&interner, &env);
    let mut cs = ConstraintSystem::new(&interner);
    let var = cs.fresh_var(param);
    let list_of_var = env.apply(std.list, &[cs.var_type(var)]);
    assert!(cs.add_subtype_constraint(&mut checker, list_of_var, env.apply(std.list, &[number])));
    assert_eq!(cs.constraints(var).upper_bounds, vec![number]);

    let solution = cs.solve(&mut checker).expect("solvable");
    assert_eq!(solution.var(var), Some(number));
}

#[test]
fn test_invariant_position_fixes_variable() {
    let interner = TypeInterner::new();
    let (mut env, std) = TestEnv::standard(&interner);
    let param = env.type_param("T", Variance::Invariant);
    let int = env.ty(std.int);
    let string = env.ty(std.string);

    let mut checker = SubtypeChecker::new(&interner, &env);
    let mut cs = ConstraintSystem::new(&interner);
    let var = cs.fresh_var(param);
    let var_ty = cs.var_type(var);
    let target = env.apply(std.mutable_list, &[var_ty]);
    assert!(cs.add_subtype_constraint(&mut checker, env.apply(std.mutable_list, &[int]), target));
    assert_eq!(cs.probe(var), Some(int));

    assert!(cs.add_subtype_constraint(&mut checker, string, var_ty));
    assert!(matches!(
        cs.solve(&mut checker),
        Err(InferenceError::BoundsViolation { .. })
    ));
}

#[test]
fn test_unconstrained_variable_defaults_to_declared_bound() {
    let interner = TypeInterner::new();
    let (mut env, std) = TestEnv::standard(&interner);
    let bounded = env.type_param("T", Variance::Invariant);
    let free = env.type_param("U", Variance::Invariant);
    let number = env.ty(std.number);

    let mut checker = SubtypeChecker::new(&interner, &env);
    let mut cs = ConstraintSystem::new(&interner);
    let t = cs.fresh_var(bounded);
    cs.set_declared_bound(t, number);
    let u = cs.fresh_var(free);

    let solution = cs.solve(&mut checker).expect("solvable");
    assert_eq!(solution.var(t), Some(number));
    assert_eq!(solution.var(u), Some(env.nullable(env.ty(std.any))));
    assert_eq!(cs.param_of(t), Some(bounded));
}

#[test]
fn test_nullable_parameter_strips_argument_nullability() {
    let interner = TypeInterner::new();
    let (mut env, std) = TestEnv::standard(&interner);
    let param = env.type_param("T", Variance::Invariant);
    let string = env.ty(std.string);

    let mut checker = SubtypeChecker::new(&interner, &env);
    let mut cs = ConstraintSystem::new(&interner);
    let var = cs.fresh_var(param);
    let nullable_var = interner.infer(var, true);
    assert!(cs.add_subtype_constraint(&mut checker, env.nullable(string), nullable_var));

    let solution = cs.solve(&mut checker).expect("solvable");
    assert_eq!(solution.var(var), Some(string));
    assert_eq!(solution.apply(&interner, nullable_var), env.nullable(string));
}

#[test]
fn test_conflicting_unification() {
    let interner = TypeInterner::new();
    let (mut env, std) = TestEnv::standard(&interner);
    let param = env.type_param("T", Variance::Invariant);
    let int = env.ty(std.int);
    let string = env.ty(std.string);

    let mut cs = ConstraintSystem::new(&interner);
    let var = cs.fresh_var(param);
    assert_eq!(cs.unify_var_type(var, int), Ok(()));
    assert_eq!(cs.unify_var_type(var, int), Ok(()));
    assert_eq!(
        cs.unify_var_type(var, string),
        Err(InferenceError::Conflict(int, string))
    );
}

#[test]
fn test_unify_vars_merges_constraints() {
    let interner = TypeInterner::new();
    let (mut env, std) = TestEnv::standard(&interner);
    let p = env.type_param("A", Variance::Invariant);
    let q = env.type_param("B", Variance::Invariant);
    let int = env.ty(std.int);
    let number = env.ty(std.number);

    let mut checker = SubtypeChecker::new(&interner, &env);
    let mut cs = ConstraintSystem::new(&interner);
    let a = cs.fresh_var(p);
    let b = cs.fresh_var(q);
    cs.add_lower_bound(a, int);
    cs.add_upper_bound(b, number);
    assert_eq!(cs.unify_vars(a, b), Ok(()));

    let merged = cs.constraints(b).clone();
    assert_eq!(merged.lower_bounds, vec![int]);
    assert_eq!(merged.upper_bounds, vec![number]);

    let solution = cs.solve(&mut checker).expect("solvable");
    assert_eq!(solution.var(a), Some(int));
    assert_eq!(solution.var(b), Some(int));
}

#[test]
fn test_function_type_constraints() {
    let interner = TypeInterner::new();
    let (mut env, std) = TestEnv::standard(&interner);
    let p = env.type_param("P", Variance::Invariant);
    let r = env.type_param("R", Variance::Invariant);
    let int = env.ty(std.int);
    let string = env.ty(std.string);

    let mut checker = SubtypeChecker::new(&interner, &env);
    let mut cs = ConstraintSystem::new(&interner);
    let pv = cs.fresh_var(p);
    let rv = cs.fresh_var(r);
    let generic = interner.function([cs.var_type(pv)], cs.var_type(rv), false);
    let concrete = interner.function([int], string, false);
    assert!(cs.add_subtype_constraint(&mut checker, concrete, generic));

    let solution = cs.solve(&mut checker).expect("solvable");
    assert_eq!(solution.var(pv), Some(int));
    assert_eq!(solution.var(rv), Some(string));
}

#[test]
fn test_structural_mismatch_is_rejected() {
    let interner = TypeInterner::new();
    let (mut env, std) = TestEnv::standard(&interner);
    let param = env.type_param("T", Variance::Invariant);

    let mut checker = SubtypeChecker::new(&interner, &env);
    let mut cs = ConstraintSystem::new(&interner);
    let var = cs.fresh_var(param);
    let list_of_var = env.apply(std.list, &[cs.var_type(var)]);
    assert!(!cs.add_subtype_constraint(&mut checker, env.ty(std.int), list_of_var));
}

#[test]
fn test_partial_solution_covers_constrained_variables_only() {
    let interner = TypeInterner::new();
    let (mut env, std) = TestEnv::standard(&interner);
    let p = env.type_param("A", Variance::Invariant);
    let q = env.type_param("B", Variance::Invariant);
    let int = env.ty(std.int);

    let mut checker = SubtypeChecker::new(&interner, &env);
    let mut cs = ConstraintSystem::new(&interner);
    let a = cs.fresh_var(p);
    let b = cs.fresh_var(q);
    let a_ty = cs.var_type(a);
    assert!(cs.add_subtype_constraint(&mut checker, int, a_ty));

    let partial = cs.partial_solution(&mut checker);
    assert_eq!(partial.var(a), Some(int));
    assert_eq!(partial.var(b), None);
}
