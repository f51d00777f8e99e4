//! Descriptor identifiers.
//!
//! A `DefId` names one semantic descriptor (class, function, property, type
//! alias, type parameter, value parameter) for the lifetime of a resolve
//! session. It is shared by the type model, which refers to classes and type
//! parameters by `DefId`, and by diagnostics, which list related descriptors.

use serde::Serialize;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DefId(pub u32);

impl DefId {
    /// Sentinel for "no descriptor".
    pub const INVALID: Self = Self(0);

    pub const FIRST_VALID: u32 = 1;

    pub const fn is_valid(self) -> bool {
        self.0 >= Self::FIRST_VALID
    }
}
