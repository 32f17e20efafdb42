//! `SequenceEngine` (§4.10): evaluates every enabled sequence each tick,
//! resolves its target UID, writes the parameter through the same path a
//! UI write would use, and fans out a throttled, per-UID-batched
//! `ParameterChanged` event to external subscribers.

use crate::beat_clock::{AudioFeature, BeatClock, FreeRunningBeatClock, NullAudioFeature};
use crate::sequence::{as_param_value, Sequence, SequenceKind};
use mve_core::{EventBus, EventReceiver, SequenceId, Uid};
use mve_registry::{ClipRegistry, ParamValue, UidRegistry};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

struct Runtime {
    sequence: Sequence,
    playhead: f64,
}

pub struct SequenceEngine {
    sequences: RwLock<HashMap<SequenceId, Runtime>>,
    uids: Arc<UidRegistry>,
    clips: Arc<ClipRegistry>,
    beat_clock: Mutex<FreeRunningBeatClock>,
    audio_feature: Mutex<Box<dyn AudioFeature>>,
    pending: Mutex<HashMap<Uid, ParamValue>>,
    last_flush: Mutex<Instant>,
    throttle: Duration,
    events: EventBus<Vec<(Uid, ParamValue)>>,
}

const DEFAULT_THROTTLE_MS: u64 = 10;

impl SequenceEngine {
    pub fn new(clips: Arc<ClipRegistry>, uids: Arc<UidRegistry>) -> Self {
        Self {
            sequences: RwLock::new(HashMap::new()),
            uids,
            clips,
            beat_clock: Mutex::new(FreeRunningBeatClock::new(120.0)),
            audio_feature: Mutex::new(Box::new(NullAudioFeature)),
            pending: Mutex::new(HashMap::new()),
            last_flush: Mutex::new(Instant::now()),
            throttle: Duration::from_millis(DEFAULT_THROTTLE_MS),
            events: EventBus::new(256),
        }
    }

    /// Swaps in the analyser driving `SequenceKind::Audio` sequences;
    /// defaults to [`NullAudioFeature`] (always reads 0.0) when no analyser
    /// is wired in, per §4.14.
    pub fn set_audio_feature(&self, feature: Box<dyn AudioFeature>) {
        *self.audio_feature.lock() = feature;
    }

    pub fn subscribe(&self) -> EventReceiver<Vec<(Uid, ParamValue)>> {
        self.events.subscribe()
    }

    pub fn add(&self, sequence: Sequence) {
        self.sequences.write().insert(sequence.id.clone(), Runtime { sequence, playhead: 0.0 });
    }

    pub fn remove(&self, id: &SequenceId) {
        self.sequences.write().remove(id);
    }

    pub fn set_bpm(&self, bpm: f64) {
        self.beat_clock.lock().set_bpm(bpm);
    }

    /// One engine tick (§4.10 steps 1-4).
    pub fn tick(&self, dt: Duration) {
        let phase = self.beat_clock.lock().tick(dt);
        let audio_value = self.audio_feature.lock().read();
        let mut sequences = self.sequences.write();

        for runtime in sequences.values_mut() {
            if !runtime.sequence.enabled {
                continue;
            }
            let value = match &runtime.sequence.kind {
                SequenceKind::Timeline { keyframes } => {
                    runtime.playhead += dt.as_secs_f64() * runtime.sequence.rate;
                    Sequence::evaluate_timeline(keyframes, runtime.playhead)
                }
                SequenceKind::Audio => audio_value as f64,
                SequenceKind::Bpm { beats_per_cycle } => Sequence::evaluate_bpm(*beats_per_cycle * runtime.sequence.rate.max(0.01), phase),
            };

            let Some(target) = self.uids.resolve(&runtime.sequence.target) else {
                continue; // target removed; not an error per §4.10 step 2.
            };

            let param_value = as_param_value(value);
            if let Err(e) = self.clips.set_parameter(
                target.container.clip_id,
                &target.container.chain_type,
                target.container.index,
                &target.param_name,
                param_value,
            ) {
                log::warn!("sequence {} failed to write target parameter: {e}", runtime.sequence.id);
                continue;
            }

            self.pending.lock().insert(runtime.sequence.target.clone(), param_value);
        }
        drop(sequences);

        self.maybe_flush();
    }

    fn maybe_flush(&self) {
        let mut last_flush = self.last_flush.lock();
        if last_flush.elapsed() < self.throttle {
            return;
        }
        *last_flush = Instant::now();
        drop(last_flush);

        let mut pending = self.pending.lock();
        if pending.is_empty() {
            return;
        }
        let batch: Vec<(Uid, ParamValue)> = pending.drain().collect();
        drop(pending);
        self.events.publish(batch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::Keyframe;
    use mve_registry::{EmptyCatalog, UidRegistry as Uids};
    use std::thread::sleep;

    fn setup() -> (Arc<ClipRegistry>, Arc<UidRegistry>, mve_core::ClipId) {
        let uids = Arc::new(Uids::new());
        let clips = Arc::new(ClipRegistry::new(Arc::new(EmptyCatalog), uids.clone()));
        let clip = clips.register(mve_registry::ClipSource::Path("x.mp4".into()), 100);
        (clips, uids, clip)
    }

    struct TestCatalogWithGain;
    impl mve_registry::EffectPluginCatalog for TestCatalogWithGain {
        fn param_specs(&self, plugin_id: &str) -> Option<Vec<mve_registry::ParamSpec>> {
            match plugin_id {
                "gain" => Some(vec![mve_registry::ParamSpec::new(
                    "amount",
                    ParamValue::Float(1.0),
                    ParamValue::Float(0.0),
                    ParamValue::Float(2.0),
                )]),
                _ => None,
            }
        }
    }

    #[test]
    fn sequence_with_removed_target_is_skipped_without_error() {
        let (clips, uids, _clip) = setup();
        let engine = SequenceEngine::new(clips, uids);
        engine.add(Sequence {
            id: SequenceId::new("s1"),
            kind: SequenceKind::Timeline {
                keyframes: vec![Keyframe { time: 0.0, value: 5.0 }],
            },
            target: Uid::new("nonexistent"),
            rate: 1.0,
            enabled: true,
        });
        engine.tick(Duration::from_millis(16));
    }

    #[test]
    fn writes_flow_through_to_the_clip_registry() {
        let uids = Arc::new(Uids::new());
        let clips = Arc::new(ClipRegistry::new(Arc::new(TestCatalogWithGain), uids.clone()));
        let clip = clips.register(mve_registry::ClipSource::Path("x.mp4".into()), 100);
        clips.add_effect(clip, "video", "gain", None, None).unwrap();
        let target_uid = clips.get(clip).unwrap().chains["video"][0].parameters[0].uid.clone();

        let engine = SequenceEngine::new(clips.clone(), uids);
        engine.add(Sequence {
            id: SequenceId::new("s1"),
            kind: SequenceKind::Timeline {
                keyframes: vec![Keyframe { time: 0.0, value: 1.5 }, Keyframe { time: 10.0, value: 1.5 }],
            },
            target: target_uid,
            rate: 1.0,
            enabled: true,
        });
        engine.tick(Duration::from_millis(16));

        let snap = clips.get(clip).unwrap();
        assert_eq!(snap.chains["video"][0].parameters[0].value, ParamValue::Float(1.5));
    }

    struct FixedAudioFeature(f32);
    impl crate::beat_clock::AudioFeature for FixedAudioFeature {
        fn read(&mut self) -> f32 {
            self.0
        }
    }

    #[test]
    fn audio_sequence_writes_the_injected_feature_value() {
        let uids = Arc::new(Uids::new());
        let clips = Arc::new(ClipRegistry::new(Arc::new(TestCatalogWithGain), uids.clone()));
        let clip = clips.register(mve_registry::ClipSource::Path("x.mp4".into()), 100);
        clips.add_effect(clip, "video", "gain", None, None).unwrap();
        let target_uid = clips.get(clip).unwrap().chains["video"][0].parameters[0].uid.clone();

        let engine = SequenceEngine::new(clips.clone(), uids);
        engine.set_audio_feature(Box::new(FixedAudioFeature(0.75)));
        engine.add(Sequence {
            id: SequenceId::new("s1"),
            kind: SequenceKind::Audio,
            target: target_uid,
            rate: 1.0,
            enabled: true,
        });
        engine.tick(Duration::from_millis(16));

        let snap = clips.get(clip).unwrap();
        assert_eq!(snap.chains["video"][0].parameters[0].value, ParamValue::Float(0.75));
    }

    #[test]
    fn batched_events_are_throttled() {
        let (clips, uids, _clip) = setup();
        let engine = SequenceEngine::new(clips, uids);
        let rx = engine.subscribe();
        engine.add(Sequence {
            id: SequenceId::new("s1"),
            kind: SequenceKind::Timeline {
                keyframes: vec![Keyframe { time: 0.0, value: 1.0 }],
            },
            target: Uid::new("nonexistent"),
            rate: 1.0,
            enabled: true,
        });
        // No resolvable target, so nothing should ever be queued or flushed.
        engine.tick(Duration::from_millis(1));
        sleep(Duration::from_millis(15));
        engine.tick(Duration::from_millis(1));
        assert!(rx.is_empty());
    }
}
