//! Common supertype computation.
//!
//! Used for `if`/`else` and elvis results and for solving an inference
//! variable from its lower bounds. The search walks the supertype closure of
//! the first type breadth-first and picks the first candidate every other
//! type conforms to. Generic arguments are not merged: `List<Int>` and
//! `List<String>` meet at `Any`.

use crate::subtype::SubtypeChecker;
use crate::types::TypeId;
use tracing::trace;

pub fn common_supertype(checker: &mut SubtypeChecker<'_>, types: &[TypeId]) -> TypeId {
    let interner = checker.interner();
    if types.iter().any(|t| t.is_error()) {
        return TypeId::ERROR;
    }
    if let [single] = types {
        return *single;
    }

    let nullable = types.iter().any(|&t| checker.may_be_null(t));
    let all_flexible = !types.is_empty() && types.iter().all(|&t| interner.is_flexible(t));
    let mut cores: Vec<TypeId> = Vec::new();
    for &ty in types {
        if ty == TypeId::NOTHING || ty == TypeId::NULLABLE_NOTHING {
            continue;
        }
        let core = interner.make_non_null(interner.lower_bound(ty));
        if !cores.contains(&core) {
            cores.push(core);
        }
    }

    let core = match cores.as_slice() {
        [] => TypeId::NOTHING,
        [only] => *only,
        [first, rest @ ..] => {
            let rest = rest.to_vec();
            let found = checker
                .supertype_closure(*first)
                .into_iter()
                .find(|&candidate| rest.iter().all(|&t| checker.is_subtype(t, candidate)));
            match found {
                Some(found) => found,
                None => checker.any_type(false).unwrap_or(TypeId::ERROR),
            }
        }
    };
    trace!(inputs = types.len(), result = core.0, nullable, "common supertype");

    if all_flexible && core != TypeId::NOTHING {
        return interner.flexible(core, interner.make_nullable(core));
    }
    if nullable {
        interner.make_nullable(core)
    } else {
        core
    }
}
