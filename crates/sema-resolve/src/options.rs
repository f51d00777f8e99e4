//! Session configuration.

use crate::error::OptionsError;
use sema_common::limits::MAX_EXPR_CHECK_DEPTH;
use serde::{Deserialize, Serialize};

/// Refinements applied when several applicable candidates are equally
/// specific.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TieBreakPolicy {
    /// A candidate that needs no default argument values beats one that does.
    pub prefer_non_default: bool,
    /// A non-generic candidate beats a generic one.
    pub prefer_non_generic: bool,
}

impl Default for TieBreakPolicy {
    fn default() -> Self {
        TieBreakPolicy {
            prefer_non_default: true,
            prefer_non_generic: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolveOptions {
    /// Accept `dynamic` type mentions.
    pub dynamic_types: bool,
    /// Warn when platform-typed values are used where null is not accepted.
    pub report_platform_nullability: bool,
    pub tie_break: TieBreakPolicy,
    pub max_expression_depth: u32,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        ResolveOptions {
            dynamic_types: false,
            report_platform_nullability: true,
            tie_break: TieBreakPolicy::default(),
            max_expression_depth: MAX_EXPR_CHECK_DEPTH,
        }
    }
}

impl ResolveOptions {
    /// Parse options from JSON. Missing fields keep their defaults.
    pub fn from_json(text: &str) -> Result<Self, OptionsError> {
        Ok(serde_json::from_str(text)?)
    }
}

#[cfg(test)]
#[path = "../tests/options_tests.rs"]
mod options_tests;
