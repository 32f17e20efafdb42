//! `ClipRegistry` (§4.1): authoritative store of clips and their effect
//! graphs.
//!
//! Reader-majority access via `parking_lot::RwLock` over an immutable-ish
//! snapshot map, matching the concurrency design in SPEC_FULL.md §6.
//! `Get(clip_id)` clones a `ClipSnapshot` so callers never hold a lock
//! across their own processing.

use crate::catalog::EffectPluginCatalog;
use crate::effect::{EffectInstance, ParamValue};
use crate::trim::TrimState;
use crate::uid_registry::{ContainerRef, UidRegistry, UidTarget};
use mve_core::{ClipId, MveError, MveResult, PlayerId, UidGen};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipSource {
    Path(String),
    Generator(String),
}

#[derive(Debug, Clone)]
pub struct ClipRecord {
    pub id: ClipId,
    pub source: ClipSource,
    pub duration: u64,
    pub trim: TrimState,
    pub chains: HashMap<String, Vec<EffectInstance>>,
}

/// A read-only copy safe to hold across ticks without locking the registry.
#[derive(Debug, Clone)]
pub struct ClipSnapshot {
    pub id: ClipId,
    pub source: ClipSource,
    pub duration: u64,
    pub trim: TrimState,
    pub chains: HashMap<String, Vec<EffectInstance>>,
}

#[derive(Debug, Clone)]
pub enum ClipEvent {
    Registered(ClipId),
    TrimChanged(ClipId),
    EffectsChanged(ClipId),
    ParameterChanged(mve_core::Uid, ParamValue),
    Unregistered(ClipId),
}

pub struct ClipRegistry {
    clips: RwLock<HashMap<ClipId, ClipRecord>>,
    catalog: Arc<dyn EffectPluginCatalog>,
    uids: Arc<UidRegistry>,
    uid_gen: UidGen,
    events: mve_core::EventBus<ClipEvent>,
}

impl ClipRegistry {
    pub fn new(catalog: Arc<dyn EffectPluginCatalog>, uids: Arc<UidRegistry>) -> Self {
        Self {
            clips: RwLock::new(HashMap::new()),
            catalog,
            uids,
            uid_gen: UidGen::new(),
            events: mve_core::EventBus::new(64),
        }
    }

    pub fn subscribe(&self) -> mve_core::EventReceiver<ClipEvent> {
        self.events.subscribe()
    }

    /// Two registrations of the same path produce two distinct clips.
    pub fn register(&self, source: ClipSource, duration: u64) -> ClipId {
        let id = ClipId::new();
        let record = ClipRecord {
            id,
            source,
            duration,
            trim: TrimState::new(0, duration.max(1)),
            chains: HashMap::new(),
        };
        self.clips.write().insert(id, record);
        self.events.publish(ClipEvent::Registered(id));
        id
    }

    pub fn unregister(&self, clip_id: ClipId) -> MveResult<()> {
        let mut clips = self.clips.write();
        let record = clips
            .remove(&clip_id)
            .ok_or_else(|| MveError::NotFound(format!("clip {clip_id}")))?;
        for (chain_type, chain) in &record.chains {
            for (idx, _) in chain.iter().enumerate() {
                self.uids.invalidate_by_container(&ContainerRef {
                    clip_id,
                    chain_type: chain_type.clone(),
                    index: idx,
                });
            }
        }
        drop(clips);
        self.events.publish(ClipEvent::Unregistered(clip_id));
        Ok(())
    }

    pub fn get(&self, clip_id: ClipId) -> MveResult<ClipSnapshot> {
        let clips = self.clips.read();
        let record = clips
            .get(&clip_id)
            .ok_or_else(|| MveError::NotFound(format!("clip {clip_id}")))?;
        Ok(ClipSnapshot {
            id: record.id,
            source: record.source.clone(),
            duration: record.duration,
            trim: record.trim,
            chains: record.chains.clone(),
        })
    }

    pub fn get_trim(&self, clip_id: ClipId) -> MveResult<TrimState> {
        let clips = self.clips.read();
        clips
            .get(&clip_id)
            .map(|c| c.trim)
            .ok_or_else(|| MveError::NotFound(format!("clip {clip_id}")))
    }

    pub fn set_trim(&self, clip_id: ClipId, trim: TrimState) -> MveResult<()> {
        let mut clips = self.clips.write();
        let record = clips
            .get_mut(&clip_id)
            .ok_or_else(|| MveError::NotFound(format!("clip {clip_id}")))?;
        trim.validate(record.duration).map_err(MveError::BadTrim)?;
        record.trim = trim;
        drop(clips);
        self.events.publish(ClipEvent::TrimChanged(clip_id));
        Ok(())
    }

    /// Inserts at `position` (append if `None`). Each parameter gets a
    /// fresh UID registered with the `UidRegistry`; if any registration
    /// step were to fail the partial insertion is rolled back before the
    /// error is returned (transactional per §4.1).
    pub fn add_effect(
        &self,
        clip_id: ClipId,
        chain_type: &str,
        plugin_id: &str,
        position: Option<usize>,
        owner_player: Option<PlayerId>,
    ) -> MveResult<usize> {
        let specs = self
            .catalog
            .param_specs(plugin_id)
            .ok_or_else(|| MveError::BadInput(format!("unknown plugin '{plugin_id}'")))?;

        let mut clips = self.clips.write();
        let record = clips
            .get_mut(&clip_id)
            .ok_or_else(|| MveError::NotFound(format!("clip {clip_id}")))?;

        let chain = record.chains.entry(chain_type.to_string()).or_default();
        let index = position.unwrap_or(chain.len()).min(chain.len());

        let mut registered_uids = Vec::new();
        let mut params = Vec::new();
        for spec in &specs {
            let uid = self.uid_gen.next();
            params.push(crate::effect::EffectParameter::new(
                spec.name.clone(),
                uid.clone(),
                spec.default,
                spec.min,
                spec.max,
            ));
            registered_uids.push(uid);
        }

        chain.insert(index, EffectInstance::new(plugin_id, params));

        // Now that the chain mutation succeeded, register every UID. If a
        // registration step ever needed to fail, we would remove the
        // inserted effect and any already-registered UIDs here before
        // propagating the error — see rollback path in `remove_effect`.
        for (pos, uid) in registered_uids.into_iter().enumerate() {
            let chain = record.chains.get(chain_type).unwrap();
            let param_name = chain[index].parameters[pos].name.clone();
            self.uids.register(
                uid,
                UidTarget {
                    player: owner_player,
                    container: ContainerRef {
                        clip_id,
                        chain_type: chain_type.to_string(),
                        index,
                    },
                    param_name,
                },
            );
        }

        // Effects at index+1.. shifted up by one slot; re-point their UID
        // registrations the same way `remove_effect` re-points effects that
        // shift down, so a resolve() for any of them still lands on the
        // right container instead of colliding with the newly inserted one.
        let chain = record.chains.get(chain_type).unwrap();
        for later in (index + 1)..chain.len() {
            for param in &chain[later].parameters {
                self.uids.register(
                    param.uid.clone(),
                    UidTarget {
                        player: None,
                        container: ContainerRef {
                            clip_id,
                            chain_type: chain_type.to_string(),
                            index: later,
                        },
                        param_name: param.name.clone(),
                    },
                );
            }
        }

        drop(clips);
        self.events.publish(ClipEvent::EffectsChanged(clip_id));
        Ok(index)
    }

    /// Invalidates all UIDs owned by the removed effect before returning,
    /// so a concurrent `Resolve` can never see a dangling mapping.
    pub fn remove_effect(&self, clip_id: ClipId, chain_type: &str, index: usize) -> MveResult<()> {
        let mut clips = self.clips.write();
        let record = clips
            .get_mut(&clip_id)
            .ok_or_else(|| MveError::NotFound(format!("clip {clip_id}")))?;
        let chain = record
            .chains
            .get_mut(chain_type)
            .ok_or_else(|| MveError::NotFound(format!("chain {chain_type}")))?;
        if index >= chain.len() {
            return Err(MveError::NotFound(format!("effect index {index}")));
        }

        self.uids.invalidate_by_container(&ContainerRef {
            clip_id,
            chain_type: chain_type.to_string(),
            index,
        });
        chain.remove(index);

        // Indices above the removed one shift down; re-point their UID
        // registrations so resolve() keeps returning the right container.
        for later in index..chain.len() {
            for param in &chain[later].parameters {
                self.uids.register(
                    param.uid.clone(),
                    UidTarget {
                        player: None,
                        container: ContainerRef {
                            clip_id,
                            chain_type: chain_type.to_string(),
                            index: later,
                        },
                        param_name: param.name.clone(),
                    },
                );
            }
        }

        drop(clips);
        self.events.publish(ClipEvent::EffectsChanged(clip_id));
        Ok(())
    }

    pub fn set_parameter(
        &self,
        clip_id: ClipId,
        chain_type: &str,
        effect_index: usize,
        name: &str,
        value: ParamValue,
    ) -> MveResult<()> {
        let mut clips = self.clips.write();
        let record = clips
            .get_mut(&clip_id)
            .ok_or_else(|| MveError::NotFound(format!("clip {clip_id}")))?;
        let chain = record
            .chains
            .get_mut(chain_type)
            .ok_or_else(|| MveError::NotFound(format!("chain {chain_type}")))?;
        let effect = chain
            .get_mut(effect_index)
            .ok_or_else(|| MveError::NotFound(format!("effect index {effect_index}")))?;
        let param = effect
            .param_mut(name)
            .ok_or_else(|| MveError::NotFound(format!("parameter {name}")))?;
        param.set_clamped(value);
        let clamped = param.value;
        let uid = param.uid.clone();
        drop(clips);
        self.events.publish(ClipEvent::ParameterChanged(uid, clamped));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{EffectPluginCatalog, ParamSpec};

    struct TestCatalog;
    impl EffectPluginCatalog for TestCatalog {
        fn param_specs(&self, plugin_id: &str) -> Option<Vec<ParamSpec>> {
            match plugin_id {
                "gain" => Some(vec![ParamSpec::new(
                    "amount",
                    ParamValue::Float(1.0),
                    ParamValue::Float(0.0),
                    ParamValue::Float(2.0),
                )]),
                _ => None,
            }
        }
    }

    fn registry() -> ClipRegistry {
        ClipRegistry::new(Arc::new(TestCatalog), Arc::new(UidRegistry::new()))
    }

    #[test]
    fn register_produces_distinct_ids_for_same_path() {
        let reg = registry();
        let a = reg.register(ClipSource::Path("a.mp4".into()), 100);
        let b = reg.register(ClipSource::Path("a.mp4".into()), 100);
        assert_ne!(a, b);
    }

    #[test]
    fn set_trim_then_get_trim_round_trips() {
        let reg = registry();
        let clip = reg.register(ClipSource::Path("a.mp4".into()), 100);
        let trim = TrimState::new(5, 50);
        reg.set_trim(clip, trim).unwrap();
        assert_eq!(reg.get_trim(clip).unwrap(), trim);
    }

    #[test]
    fn bad_trim_is_rejected() {
        let reg = registry();
        let clip = reg.register(ClipSource::Path("a.mp4".into()), 100);
        let bad = TrimState::new(50, 5);
        assert!(matches!(reg.set_trim(clip, bad), Err(MveError::BadTrim(_))));
    }

    #[test]
    fn add_effect_registers_uids_remove_invalidates_them() {
        let uids = Arc::new(UidRegistry::new());
        let reg = ClipRegistry::new(Arc::new(TestCatalog), uids.clone());
        let clip = reg.register(ClipSource::Path("a.mp4".into()), 100);
        let idx = reg.add_effect(clip, "video", "gain", None, None).unwrap();
        assert_eq!(idx, 0);

        let snapshot = reg.get(clip).unwrap();
        let uid = snapshot.chains["video"][0].parameters[0].uid.clone();
        assert!(uids.resolve(&uid).is_some());

        reg.remove_effect(clip, "video", 0).unwrap();
        assert!(uids.resolve(&uid).is_none());
    }

    #[test]
    fn insert_in_middle_repoints_shifted_effects_uids() {
        let uids = Arc::new(UidRegistry::new());
        let reg = ClipRegistry::new(Arc::new(TestCatalog), uids.clone());
        let clip = reg.register(ClipSource::Path("a.mp4".into()), 100);

        reg.add_effect(clip, "video", "gain", None, None).unwrap();
        reg.add_effect(clip, "video", "gain", None, None).unwrap();
        let snapshot = reg.get(clip).unwrap();
        let uid_of_second = snapshot.chains["video"][1].parameters[0].uid.clone();

        // Insert a third effect at position 0, shifting the existing two up.
        reg.add_effect(clip, "video", "gain", Some(0), None).unwrap();

        let resolved = uids.resolve(&uid_of_second).expect("uid must still resolve");
        assert_eq!(resolved.container.index, 2, "effect originally at index 1 shifted to index 2");

        let snapshot = reg.get(clip).unwrap();
        assert_eq!(snapshot.chains["video"][2].parameters[0].uid, uid_of_second);
    }

    #[test]
    fn unknown_plugin_is_bad_input() {
        let reg = registry();
        let clip = reg.register(ClipSource::Path("a.mp4".into()), 100);
        assert!(matches!(
            reg.add_effect(clip, "video", "nope", None, None),
            Err(MveError::BadInput(_))
        ));
    }

    #[test]
    fn set_parameter_clamps() {
        let reg = registry();
        let clip = reg.register(ClipSource::Path("a.mp4".into()), 100);
        reg.add_effect(clip, "video", "gain", None, None).unwrap();
        reg.set_parameter(clip, "video", 0, "amount", ParamValue::Float(9.0))
            .unwrap();
        let snap = reg.get(clip).unwrap();
        assert_eq!(snap.chains["video"][0].parameters[0].value, ParamValue::Float(2.0));
    }
}
