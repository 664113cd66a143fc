use core::fmt;

use serde::Deserialize;
use serde::Serialize;

/// A raw descriptor value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HandleId(i32);

impl HandleId {
    /// The id held by a handle that owns nothing.
    pub const INVALID: HandleId = HandleId(-1);

    /// Creates a handle ID from a raw integer.
    pub const fn from_raw(raw: i32) -> HandleId {
        HandleId(raw)
    }

    pub const fn as_raw(&self) -> i32 {
        self.0
    }

    pub const fn is_valid(&self) -> bool {
        self.0 >= 0
    }
}

impl Default for HandleId {
    fn default() -> HandleId {
        HandleId::INVALID
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
