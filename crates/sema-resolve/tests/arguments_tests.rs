//! Tests for argument mapping

use super::*;

fn param(vararg: bool, has_default: bool) -> SignatureParam {
    SignatureParam {
        name: None,
        ty: TypeId::ERROR,
        vararg,
        has_default,
    }
}

#[test]
fn test_positional_arguments_map_in_order() {
    let params = [param(false, false), param(false, false)];
    let mapping = map_arguments(&params, 2).expect("applicable");
    assert_eq!(mapping.parameter_of, vec![0, 1]);
    assert!(!mapping.uses_defaults);
}

#[test]
fn test_missing_argument_uses_default() {
    let params = [param(false, false), param(false, true)];
    let mapping = map_arguments(&params, 1).expect("applicable");
    assert_eq!(mapping.parameter_of, vec![0]);
    assert!(mapping.uses_defaults);
}

#[test]
fn test_missing_argument_without_default() {
    let params = [param(false, true), param(false, false)];
    assert_eq!(map_arguments(&params, 1), Err(MappingError::NoValueFor(1)));
}

#[test]
fn test_too_many_arguments() {
    let params = [param(false, false)];
    assert_eq!(
        map_arguments(&params, 3),
        Err(MappingError::TooManyArguments { first_extra: 1 })
    );
    assert_eq!(
        map_arguments(&[], 1),
        Err(MappingError::TooManyArguments { first_extra: 0 })
    );
}

#[test]
fn test_vararg_absorbs_remaining_arguments() {
    let params = [param(false, false), param(true, false)];
    let mapping = map_arguments(&params, 4).expect("applicable");
    assert_eq!(mapping.parameter_of, vec![0, 1, 1, 1]);
    assert!(!mapping.uses_defaults);

    let mapping = map_arguments(&params, 1).expect("empty vararg");
    assert_eq!(mapping.parameter_of, vec![0]);
    assert!(!mapping.uses_defaults);
}

#[test]
fn test_argument_types_hand_out_layers_once() {
    let mut types = ArgumentTypes {
        prelim: vec![Some(TypeId::ERROR), None],
        layers: vec![Some(TraceLayer::default()), None],
    };
    assert!(types.take_layer(1).is_none());
    assert!(types.take_layer(0).is_some_and(|layer| layer.is_empty()));
    assert!(types.take_layer(0).is_none());
}
