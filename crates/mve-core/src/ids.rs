//! Opaque identifiers used across the engine.
//!
//! `ClipId` is a UUID (clips are registered from arbitrary call sites and
//! must never collide). `Uid`, `OutputId`, `SliceId`, `SequenceId` are
//! newtype-wrapped strings: UIDs may be UUIDs or shorter monotonic ids per
//! the design notes, so the wire representation is left as a string rather
//! than baked to `Uuid`.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClipId(pub Uuid);

impl ClipId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClipId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub Uuid);

impl PlayerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

macro_rules! string_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

string_id!(Uid);
string_id!(OutputId);
string_id!(SliceId);
string_id!(SequenceId);

impl SliceId {
    /// The reserved identity slice that always exists and cannot be deleted.
    pub fn full() -> Self {
        Self("full".to_string())
    }

    pub fn is_full(&self) -> bool {
        self.0 == "full"
    }
}

/// Monotonic UID generator, used where a shorter id than a full UUID is
/// preferred for readability (e.g. in tests and logs).
#[derive(Debug, Default)]
pub struct UidGen {
    next: std::sync::atomic::AtomicU64,
}

impl UidGen {
    pub fn new() -> Self {
        Self {
            next: std::sync::atomic::AtomicU64::new(1),
        }
    }

    pub fn next(&self) -> Uid {
        let n = self.next.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        Uid::new(format!("u{n:08x}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_ids_are_unique() {
        assert_ne!(ClipId::new(), ClipId::new());
    }

    #[test]
    fn slice_full_is_reserved() {
        assert!(SliceId::full().is_full());
        assert!(!SliceId::new("other").is_full());
    }

    #[test]
    fn uid_gen_is_monotonic_and_unique() {
        let gen = UidGen::new();
        let a = gen.next();
        let b = gen.next();
        assert_ne!(a, b);
    }
}
