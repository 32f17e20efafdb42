//! `UIDRegistry` (§4.9): process-wide O(1) map from parameter UID to the
//! effect instance that owns it.
//!
//! Holds *data*, not live pointers — "weak reference" in the spec's sense
//! is realised by storing only identifying ids (clip, chain, index, player)
//! rather than a handle into the object itself. `ClipRegistry::remove_effect`
//! deletes the UIDRegistry entries before it drops the `EffectInstance`, so
//! a successful `resolve` is always either a live reference or `None`,
//! never dangling (the invariant this type exists to uphold).
//!
//! Modelled on the teacher's reader-majority `parking_lot::RwLock` usage for
//! shared engine state (e.g. `daw-backend::audio::pool::AudioPool`), since
//! resolve is the hot path invoked from the sequencer tick at up to 60Hz.

use mve_core::{ClipId, PlayerId, Uid};
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerRef {
    pub clip_id: ClipId,
    pub chain_type: String,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UidTarget {
    pub player: Option<PlayerId>,
    pub container: ContainerRef,
    pub param_name: String,
}

#[derive(Default)]
pub struct UidRegistry {
    map: RwLock<HashMap<Uid, UidTarget>>,
}

impl UidRegistry {
    pub fn new() -> Self {
        Self {
            map: RwLock::new(HashMap::new()),
        }
    }

    pub fn register(&self, uid: Uid, target: UidTarget) {
        self.map.write().insert(uid, target);
    }

    /// O(1) lookup. Returns `None` if the uid was never registered or has
    /// since been invalidated — never a reference to a destroyed effect.
    pub fn resolve(&self, uid: &Uid) -> Option<UidTarget> {
        self.map.read().get(uid).cloned()
    }

    pub fn invalidate(&self, uid: &Uid) {
        self.map.write().remove(uid);
    }

    /// Remove every UID owned by the given container (called when an
    /// effect is removed, before the `EffectInstance` itself is dropped).
    pub fn invalidate_by_container(&self, container: &ContainerRef) {
        self.map.write().retain(|_, t| &t.container != container);
    }

    /// Full rescan, used only on session load per the spec.
    pub fn rebuild<I: IntoIterator<Item = (Uid, UidTarget)>>(&self, entries: I) {
        let mut map = self.map.write();
        map.clear();
        map.extend(entries);
    }

    pub fn len(&self) -> usize {
        self.map.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(clip: ClipId, idx: usize) -> UidTarget {
        UidTarget {
            player: None,
            container: ContainerRef {
                clip_id: clip,
                chain_type: "video".into(),
                index: idx,
            },
            param_name: "amount".into(),
        }
    }

    #[test]
    fn resolve_is_none_after_invalidate() {
        let reg = UidRegistry::new();
        let clip = ClipId::new();
        let uid = Uid::new("u1");
        reg.register(uid.clone(), target(clip, 0));
        assert!(reg.resolve(&uid).is_some());
        reg.invalidate(&uid);
        assert!(reg.resolve(&uid).is_none());
    }

    #[test]
    fn invalidate_by_container_removes_all_its_uids() {
        let reg = UidRegistry::new();
        let clip = ClipId::new();
        let container = ContainerRef {
            clip_id: clip,
            chain_type: "video".into(),
            index: 2,
        };
        reg.register(
            Uid::new("a"),
            UidTarget {
                player: None,
                container: container.clone(),
                param_name: "x".into(),
            },
        );
        reg.register(
            Uid::new("b"),
            UidTarget {
                player: None,
                container: container.clone(),
                param_name: "y".into(),
            },
        );
        reg.register(Uid::new("c"), target(ClipId::new(), 0));

        reg.invalidate_by_container(&container);

        assert!(reg.resolve(&Uid::new("a")).is_none());
        assert!(reg.resolve(&Uid::new("b")).is_none());
        assert!(reg.resolve(&Uid::new("c")).is_some());
    }
}
