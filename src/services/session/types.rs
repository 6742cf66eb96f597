use std::fmt;

use crate::model::Account;

/// Stamp identifying one particular binding of a session id.
///
/// Every `put` gets a fresh, strictly increasing generation, so a late removal
/// notification for an overwritten binding can be told apart from the binding
/// that replaced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(pub(crate) u64);

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionCause {
    /// TTL elapsed (lazy on read, or by the sweeper).
    Expired,
    /// Explicit invalidation (logout, revoke).
    Removed,
    /// A new `put` overwrote the binding.
    Replaced,
}

impl EvictionCause {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Expired => "expired",
            Self::Removed => "removed",
            Self::Replaced => "replaced",
        }
    }
}

/// Removal notification payload. Fired exactly once per removed binding.
#[derive(Debug, Clone)]
pub struct Eviction {
    pub session_id: String,
    pub account: Account,
    pub generation: Generation,
    pub cause: EvictionCause,
}

/// A live binding as seen in a store snapshot.
#[derive(Debug, Clone)]
pub struct LiveBinding {
    pub session_id: String,
    pub account: Account,
    pub generation: Generation,
}
